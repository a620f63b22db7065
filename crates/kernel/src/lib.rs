//! Scene kernel: the object tree, script lifecycle, scene-owned cameras and
//! scene manifests.
//!
//! # Invariants
//! - All structural mutations flow through [`Scene`] and are logged as
//!   [`SceneEvent`]s.
//! - The scene owns every camera; removing an object destroys its camera's
//!   render targets.
//! - A model load either fully succeeds or leaves its object untouched.

mod error;
pub mod manifest;
mod scene;
mod script;

pub use error::{ManifestError, SceneError};
pub use manifest::{CameraEntry, ObjectEntry, SceneManifest};
pub use scene::{GameObject, Scene, SceneEvent};
pub use script::{Script, ScriptContext, Spin};

pub fn crate_info() -> &'static str {
    "slate-kernel v0.1.0"
}
