//! Projection builders for the rotated handheld panels.
//!
//! Both LCDs are mounted sideways, so every projection is "tilted": clip
//! space is turned a quarter turn so that view-space up lands on the panel's
//! native x axis.

use glam::{Mat4, Vec4};

/// Top screen aspect ratio (400 / 240).
pub const ASPECT_TOP: f32 = 400.0 / 240.0;

/// Bottom screen aspect ratio (320 / 240).
pub const ASPECT_BOTTOM: f32 = 320.0 / 240.0;

/// Distance of the zero-parallax plane used for stereo projections.
pub const FOCAL_LENGTH: f32 = 2.0;

/// Clip-space quarter turn: `(x, y) -> (y, -x)`.
const TILT: Mat4 = Mat4::from_cols(
    Vec4::new(0.0, -1.0, 0.0, 0.0),
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::Z,
    Vec4::W,
);

pub fn ortho_tilt(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    TILT * Mat4::orthographic_rh(left, right, bottom, top, near, far)
}

pub fn perspective_tilt(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    TILT * Mat4::perspective_rh(fov_y, aspect, near, far)
}

/// Off-axis perspective for one eye.
///
/// The eye is displaced by `iod / 2` along x and the frustum is skewed so
/// geometry at `focal_length` has zero parallax. Left and right eyes pass the
/// same magnitude with opposite signs; `iod == 0` degenerates to
/// [`perspective_tilt`].
pub fn perspective_stereo_tilt(
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    iod: f32,
    focal_length: f32,
) -> Mat4 {
    let mut m = Mat4::perspective_rh(fov_y, aspect, near, far);
    let shift = m.x_axis.x * iod * 0.5;
    m.w_axis.x += shift;
    m.z_axis.x += shift / focal_length;
    TILT * m
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn ndc(m: &Mat4, p: Vec3) -> Vec3 {
        m.project_point3(p)
    }

    #[test]
    fn tilt_maps_view_up_to_clip_x() {
        let m = perspective_tilt(55f32.to_radians(), ASPECT_TOP, 0.1, 1000.0);
        let up = ndc(&m, Vec3::new(0.0, 1.0, -5.0));
        assert!(up.x > 0.0);
        assert!(up.y.abs() < 1e-6);
        let right = ndc(&m, Vec3::new(1.0, 0.0, -5.0));
        assert!(right.y < 0.0);
    }

    #[test]
    fn zero_iod_matches_plain_perspective() {
        let fov = 55f32.to_radians();
        let a = perspective_stereo_tilt(fov, ASPECT_TOP, 0.1, 1000.0, 0.0, FOCAL_LENGTH);
        let b = perspective_tilt(fov, ASPECT_TOP, 0.1, 1000.0);
        assert!(a.abs_diff_eq(b, 1e-6));
    }

    #[test]
    fn eyes_agree_at_focal_plane() {
        let fov = 55f32.to_radians();
        let left = perspective_stereo_tilt(fov, ASPECT_TOP, 0.1, 1000.0, -0.2, FOCAL_LENGTH);
        let right = perspective_stereo_tilt(fov, ASPECT_TOP, 0.1, 1000.0, 0.2, FOCAL_LENGTH);
        let on_plane = Vec3::new(0.3, 0.1, -FOCAL_LENGTH);
        assert!(ndc(&left, on_plane).abs_diff_eq(ndc(&right, on_plane), 1e-5));

        let far_point = Vec3::new(0.3, 0.1, -20.0);
        assert!(!ndc(&left, far_point).abs_diff_eq(ndc(&right, far_point), 1e-3));
    }

    #[test]
    fn ortho_is_symmetric() {
        let m = ortho_tilt(-20.0, 20.0, -12.0, 12.0, 0.1, 1000.0);
        let corner = ndc(&m, Vec3::new(20.0, 12.0, -1.0));
        assert!((corner.x - 1.0).abs() < 1e-5);
        assert!((corner.y + 1.0).abs() < 1e-5);
    }
}
