use crate::platform::{Gpu, TargetId};

/// Framebuffer size of one top-screen eye, in the panel's native (rotated) order.
pub const TOP_SIZE: (u16, u16) = (240, 400);

/// Top screen in 800px wide mode.
pub const WIDE_SIZE: (u16, u16) = (240, 800);

pub const BOTTOM_SIZE: (u16, u16) = (240, 320);

/// A camera-owned render target.
///
/// Allocation may fail on the device; the slot is then kept empty and every
/// pass against it becomes a no-op.
#[derive(Debug, PartialEq, Eq)]
pub struct RenderTarget {
    id: Option<TargetId>,
    width: u16,
    height: u16,
}

impl RenderTarget {
    pub fn create(gpu: &mut dyn Gpu, (width, height): (u16, u16)) -> Self {
        let id = gpu.create_target(width, height);
        if id.is_none() {
            tracing::warn!(width, height, "could not create render target");
        }
        Self { id, width, height }
    }

    pub fn id(&self) -> Option<TargetId> {
        self.id
    }

    pub fn is_ready(&self) -> bool {
        self.id.is_some()
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn destroy(self, gpu: &mut dyn Gpu) {
        if let Some(id) = self.id {
            gpu.destroy_target(id);
        }
    }
}
