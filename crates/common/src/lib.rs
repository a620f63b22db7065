//! Shared types used across the slate crates.

mod types;

pub use types::{LAYER_ALL, LAYER_DEFAULT, ObjectId, Rgba, Transform, is_visible};
