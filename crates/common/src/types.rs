use glam::{Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Layer mask that matches every object.
pub const LAYER_ALL: u16 = 0xFFFF;

/// Layer assigned to freshly spawned objects.
pub const LAYER_DEFAULT: u16 = 0x0001;

/// Returns true when an object on `layer` passes a camera's culling `mask`.
pub fn is_visible(layer: u16, mask: u16) -> bool {
    layer & mask != 0
}

/// Unique identifier for an object in a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Packed `0xRRGGBBAA` color, the layout the GPU clears with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgba(pub u32);

impl Rgba {
    pub const BLACK: Self = Self(0x0000_00FF);
    pub const WHITE: Self = Self(0xFFFF_FFFF);

    pub const fn from_bytes(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(u32::from_be_bytes([r, g, b, a]))
    }

    pub fn to_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Normalized `[r, g, b, a]` for shader uniforms.
    pub fn to_vec4(self) -> Vec4 {
        let [r, g, b, a] = self.to_bytes();
        Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Affine matrix: scale, then rotate, then translate.
    ///
    /// A camera object's transform is used directly as the view matrix, so
    /// scaling the camera shrinks everything it sees.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}
