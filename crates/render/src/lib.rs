//! Rendering core: cameras, render targets, projections and the GPU seam.
//!
//! # Invariants
//! - Exactly one render target is current at a time; every draw lands on the
//!   target most recently selected with [`Gpu::draw_on`].
//! - A camera owns its targets exclusively and destroys them with itself.
//! - Stereo frames are two full traversals: left eye, then right eye.
//!
//! # Workaround
//! The hardware graphics context sits behind the [`Gpu`] trait.
//! [`RecordingGpu`] implements it in memory and records every command, which
//! is what the tests and the CLI drive.

mod camera;
mod platform;
pub mod projection;
mod recording;
mod renderer;
mod target;

pub use camera::{Camera, CameraConfig, CameraTargets, FrameReport, IodMap, Projection, RenderMode, default_iod_map};
pub use platform::{Eye, Filter, Gpu, Program, Screen, TargetId, TextureId, TextureParams, Uniform, Wrap};
pub use recording::{GpuCommand, RecordingGpu};
pub use renderer::{RenderEntry, RenderSource, Renderer};
pub use target::{BOTTOM_SIZE, RenderTarget, TOP_SIZE, WIDE_SIZE};

pub fn crate_info() -> &'static str {
    "slate-render v0.1.0"
}
