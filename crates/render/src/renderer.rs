use glam::Mat4;
use slate_common::ObjectId;

use crate::platform::Gpu;

/// Anything that can draw itself for a camera pass.
///
/// A camera invokes `render` once per visible object per eye, so an
/// implementation sees zero, one or two calls per frame. The target is
/// already bound and cleared when it is called.
pub trait Renderer {
    fn render(&self, gpu: &mut dyn Gpu, view: &Mat4, projection: &Mat4);
}

/// What a camera needs to know about one object it was asked to draw.
#[derive(Clone, Copy)]
pub struct RenderEntry<'a> {
    pub layer: u16,
    /// `None` when the object has no renderer capability.
    pub renderer: Option<&'a dyn Renderer>,
}

/// Resolves a camera's object ids against whatever owns the objects.
pub trait RenderSource {
    /// `None` when the id no longer refers to a live object.
    fn lookup(&self, id: ObjectId) -> Option<RenderEntry<'_>>;
}
