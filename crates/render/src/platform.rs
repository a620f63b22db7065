use glam::{Mat4, Vec4};
use slate_common::Rgba;

/// Handle to a render target owned by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u32);

/// Handle to a decoded GPU texture owned by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Physical display a target is presented on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Top,
    Bottom,
}

/// Output channel of the top screen. The bottom screen only has `Left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

impl Filter {
    pub fn from_bit(bit: u8) -> Self {
        if bit & 1 == 0 { Self::Nearest } else { Self::Linear }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wrap {
    ClampToEdge,
    ClampToBorder,
    Repeat,
    MirroredRepeat,
}

impl Wrap {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::ClampToEdge,
            1 => Self::ClampToBorder,
            2 => Self::Repeat,
            _ => Self::MirroredRepeat,
        }
    }
}

/// Sampling state applied to a texture after it is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureParams {
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub wrap_s: Wrap,
    pub wrap_t: Wrap,
}

/// Shader programs the fixed pipeline knows how to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    Unlit,
    FragmentLit,
}

/// Uniform slots shared by the built-in programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniform {
    ModelView,
    Projection,
    Color,
    Diffuse,
    Specular,
}

/// Immediate-mode graphics context of the handheld.
///
/// Calls are synchronous. `draw_on` selects the target every following
/// `draw_arrays` writes into until the next `draw_on`.
pub trait Gpu {
    /// Whether the top screen can run in the 800px wide mode.
    fn wide_supported(&self) -> bool;

    /// Current position of the 3D depth slider, `0.0..=1.0`.
    fn slider_3d(&self) -> f32;

    /// Allocate a color+depth target. `None` when the platform is out of memory.
    fn create_target(&mut self, width: u16, height: u16) -> Option<TargetId>;

    fn destroy_target(&mut self, target: TargetId);

    /// Route a target's output to a screen channel at frame end.
    fn set_output(&mut self, target: TargetId, screen: Screen, eye: Eye);

    fn clear_target(&mut self, target: TargetId, color: Rgba);

    /// Make `target` the current draw target.
    fn draw_on(&mut self, target: TargetId);

    fn set_wide(&mut self, enabled: bool);

    fn set_3d(&mut self, enabled: bool);

    /// Decode a texture container into GPU memory.
    fn import_texture(&mut self, data: &[u8], vram: bool) -> Option<TextureId>;

    fn set_texture_params(&mut self, texture: TextureId, params: TextureParams);

    fn delete_texture(&mut self, texture: TextureId);

    fn bind_texture(&mut self, unit: u8, texture: Option<TextureId>);

    fn bind_program(&mut self, program: Program);

    fn set_uniform_mat4(&mut self, uniform: Uniform, value: &Mat4);

    fn set_uniform_vec4(&mut self, uniform: Uniform, value: Vec4);

    /// Draw `count` vertices of `stride` bytes each as a triangle list.
    fn draw_arrays(&mut self, vertices: &[u8], stride: u8, count: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_decodes_two_bits() {
        assert_eq!(Wrap::from_bits(0), Wrap::ClampToEdge);
        assert_eq!(Wrap::from_bits(2), Wrap::Repeat);
        assert_eq!(Wrap::from_bits(0b111), Wrap::MirroredRepeat);
    }

    #[test]
    fn filter_decodes_low_bit() {
        assert_eq!(Filter::from_bit(0), Filter::Nearest);
        assert_eq!(Filter::from_bit(1), Filter::Linear);
        assert_eq!(Filter::from_bit(2), Filter::Nearest);
    }
}
