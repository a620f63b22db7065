use glam::Mat4;
use serde::{Deserialize, Serialize};
use slate_common::{LAYER_ALL, ObjectId, Rgba, Transform, is_visible};

use crate::platform::{Eye, Gpu, Screen, TargetId};
use crate::projection::{self, ASPECT_BOTTOM, ASPECT_TOP, FOCAL_LENGTH};
use crate::renderer::RenderSource;
use crate::target::{BOTTOM_SIZE, RenderTarget, TOP_SIZE, WIDE_SIZE};

/// Maps the raw depth-slider value to the interocular distance used for
/// the stereo projection.
pub type IodMap = fn(f32) -> f32;

/// Scales the slider down to a fifth; full-strength separation is hard on
/// the eyes.
pub fn default_iod_map(iod: f32) -> f32 {
    iod * 0.2
}

/// What a camera renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    #[default]
    TopScreen,
    BottomScreen,
    OffscreenTexture,
    /// A mode value this build does not know. Cameras built with it have no
    /// targets.
    #[serde(other)]
    Unknown,
}

impl RenderMode {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::TopScreen,
            1 => Self::BottomScreen,
            2 => Self::OffscreenTexture,
            _ => Self::Unknown,
        }
    }
}

/// Camera construction parameters. Every field has a default, so config
/// files only list what they change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Use the 800px top-screen mode when the platform supports it.
    pub wide: bool,
    pub mode: RenderMode,
    pub near_clip: f32,
    pub far_clip: f32,
    pub orthographic: bool,
    pub background: Rgba,
    pub culling_mask: u16,
    pub ortho_height: f32,
    pub ortho_width: f32,
    pub stereo: bool,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    #[serde(skip)]
    pub iod_map: Option<IodMap>,
    /// Side length of an offscreen target, 8..=1024.
    pub resolution: u16,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            wide: true,
            mode: RenderMode::TopScreen,
            near_clip: 0.1,
            far_clip: 1000.0,
            orthographic: false,
            background: Rgba(0x3477_EBFF),
            culling_mask: LAYER_ALL,
            ortho_height: 24.0,
            ortho_width: 40.0,
            stereo: true,
            fov_y: 55.0,
            iod_map: None,
            resolution: 256,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Orthographic { width: f32, height: f32 },
    /// Vertical field of view in degrees.
    Perspective { fov_y: f32 },
}

/// Render targets a camera owns, shaped by its render mode.
#[derive(Debug, PartialEq)]
pub enum CameraTargets {
    Top {
        left: RenderTarget,
        /// Present iff the camera renders in stereo.
        right: Option<RenderTarget>,
        /// Present iff wide mode was requested and the platform supports it.
        wide: Option<RenderTarget>,
    },
    Bottom {
        main: RenderTarget,
    },
    /// Render-to-texture. Target allocation is not implemented yet, so these
    /// cameras never draw.
    Offscreen {
        resolution: u16,
    },
    /// Built from an unknown render mode.
    Disabled,
}

/// Outcome of one [`Camera::render`] call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    /// Interocular distance after mapping; zero for mono cameras.
    pub iod: f32,
    pub use_wide: bool,
    /// Full traversals run: 0, 1, or 2 for a stereo frame.
    pub passes: u8,
    /// `Renderer::render` invocations across all passes.
    pub draws: usize,
}

pub struct Camera {
    owner: ObjectId,
    near_clip: f32,
    far_clip: f32,
    projection: Projection,
    aspect: f32,
    background: Rgba,
    culling_mask: u16,
    iod_map: IodMap,
    objects: Vec<ObjectId>,
    targets: CameraTargets,
}

impl std::fmt::Debug for Camera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Camera")
            .field("owner", &self.owner)
            .field("projection", &self.projection)
            .field("aspect", &self.aspect)
            .field("culling_mask", &format_args!("{:#06x}", self.culling_mask))
            .field("objects", &self.objects.len())
            .field("targets", &self.targets)
            .finish()
    }
}

impl Camera {
    /// Build a camera for `owner`, allocating the targets its mode needs.
    ///
    /// Never fails: allocation failures and unknown modes are logged and
    /// leave the affected targets empty.
    pub fn new(owner: ObjectId, config: &CameraConfig, gpu: &mut dyn Gpu) -> Self {
        let projection = if config.orthographic {
            Projection::Orthographic {
                width: config.ortho_width,
                height: config.ortho_height,
            }
        } else {
            Projection::Perspective {
                fov_y: config.fov_y,
            }
        };

        let (targets, aspect) = match config.mode {
            RenderMode::TopScreen => {
                let wide_supported = gpu.wide_supported();
                if config.wide && !wide_supported {
                    tracing::warn!("wide mode not supported");
                }
                let wide = config.wide && wide_supported;
                let stereo = config.stereo && !config.orthographic;
                let left = RenderTarget::create(gpu, TOP_SIZE);
                let right = stereo.then(|| RenderTarget::create(gpu, TOP_SIZE));
                let wide = wide.then(|| RenderTarget::create(gpu, WIDE_SIZE));
                (CameraTargets::Top { left, right, wide }, ASPECT_TOP)
            }
            RenderMode::BottomScreen => (
                CameraTargets::Bottom {
                    main: RenderTarget::create(gpu, BOTTOM_SIZE),
                },
                ASPECT_BOTTOM,
            ),
            RenderMode::OffscreenTexture => {
                tracing::warn!(
                    resolution = config.resolution,
                    "offscreen texture targets are not implemented; camera will not draw"
                );
                (
                    CameraTargets::Offscreen {
                        resolution: config.resolution,
                    },
                    1.0,
                )
            }
            RenderMode::Unknown => {
                tracing::warn!("invalid render type");
                (CameraTargets::Disabled, 1.0)
            }
        };

        Self {
            owner,
            near_clip: config.near_clip,
            far_clip: config.far_clip,
            projection,
            aspect,
            background: config.background,
            culling_mask: config.culling_mask,
            iod_map: config.iod_map.unwrap_or(default_iod_map),
            objects: Vec::new(),
            targets,
        }
    }

    pub fn owner(&self) -> ObjectId {
        self.owner
    }

    pub fn targets(&self) -> &CameraTargets {
        &self.targets
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn culling_mask(&self) -> u16 {
        self.culling_mask
    }

    pub fn set_culling_mask(&mut self, mask: u16) {
        self.culling_mask = mask;
    }

    pub fn background(&self) -> Rgba {
        self.background
    }

    pub fn set_background(&mut self, color: Rgba) {
        self.background = color;
    }

    pub fn is_stereo(&self) -> bool {
        matches!(self.targets, CameraTargets::Top { right: Some(_), .. })
    }

    pub fn is_wide(&self) -> bool {
        matches!(self.targets, CameraTargets::Top { wide: Some(_), .. })
    }

    /// Number of targets that were actually allocated.
    pub fn target_count(&self) -> usize {
        match &self.targets {
            CameraTargets::Top { left, right, wide } => [Some(left), right.as_ref(), wide.as_ref()]
                .into_iter()
                .flatten()
                .filter(|t| t.is_ready())
                .count(),
            CameraTargets::Bottom { main } => usize::from(main.is_ready()),
            CameraTargets::Offscreen { .. } | CameraTargets::Disabled => 0,
        }
    }

    /// Objects drawn by this camera, in render order.
    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }

    /// Append an object to the end of the render order.
    pub fn add_object(&mut self, id: ObjectId) {
        self.objects.push(id);
    }

    /// Insert an object so it is drawn before everything already registered.
    pub fn push_front(&mut self, id: ObjectId) {
        self.objects.insert(0, id);
    }

    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        let before = self.objects.len();
        self.objects.retain(|o| *o != id);
        self.objects.len() != before
    }

    /// Mapped interocular distance for a raw slider value. Mono cameras
    /// never sample the slider and always see zero.
    pub fn iod_for(&self, slider: f32) -> f32 {
        if self.is_stereo() {
            (self.iod_map)(slider)
        } else {
            0.0
        }
    }

    /// Projection for one eye. `eye_iod` carries the sign: the left eye uses
    /// `-iod`, the right eye `+iod`.
    pub fn projection_matrix(&self, eye_iod: f32) -> Mat4 {
        match self.projection {
            Projection::Orthographic { width, height } => projection::ortho_tilt(
                -width / 2.0,
                width / 2.0,
                -height / 2.0,
                height / 2.0,
                self.near_clip,
                self.far_clip,
            ),
            Projection::Perspective { fov_y } if self.is_stereo() => {
                projection::perspective_stereo_tilt(
                    fov_y.to_radians(),
                    self.aspect,
                    self.near_clip,
                    self.far_clip,
                    eye_iod,
                    FOCAL_LENGTH,
                )
            }
            Projection::Perspective { fov_y } => projection::perspective_tilt(
                fov_y.to_radians(),
                self.aspect,
                self.near_clip,
                self.far_clip,
            ),
        }
    }

    /// Render one frame.
    ///
    /// `view` is the owning object's transform; without one nothing is
    /// touched. Each pass binds and clears its target before drawing, and
    /// a pass whose target failed to allocate is skipped on its own.
    pub fn render(
        &self,
        gpu: &mut dyn Gpu,
        view: Option<&Transform>,
        source: &dyn RenderSource,
    ) -> FrameReport {
        let _span = tracing::debug_span!("camera_render", owner = %self.owner.0).entered();
        let mut report = FrameReport::default();

        let Some(view) = view else {
            return report;
        };

        let iod = if self.is_stereo() {
            (self.iod_map)(gpu.slider_3d())
        } else {
            0.0
        };
        let use_wide = self.is_wide() && !(iod > 0.0);
        let stereo_pass = self.is_stereo() && iod > 0.0;
        report.iod = iod;
        report.use_wide = use_wide;

        let primary = match &self.targets {
            CameraTargets::Top { left, wide, .. } => {
                let target = if use_wide { wide.as_ref() } else { Some(left) };
                target.and_then(RenderTarget::id).map(|id| (id, Screen::Top))
            }
            CameraTargets::Bottom { main } => main.id().map(|id| (id, Screen::Bottom)),
            CameraTargets::Offscreen { .. } => {
                tracing::debug!("offscreen camera skipped");
                return report;
            }
            CameraTargets::Disabled => return report,
        };

        if let Some((target, screen)) = primary {
            self.select(gpu, target, screen, Eye::Left);
        }

        let projection = self.projection_matrix(-iod);

        if matches!(self.targets, CameraTargets::Top { .. }) {
            gpu.set_wide(use_wide);
        }

        let view = view.to_matrix();

        if primary.is_some() {
            report.draws += self.draw_objects(gpu, &view, &projection, source);
            report.passes += 1;
        }

        if stereo_pass {
            gpu.set_3d(true);
            if let CameraTargets::Top {
                right: Some(right), ..
            } = &self.targets
            {
                if let Some(target) = right.id() {
                    let projection = self.projection_matrix(iod);
                    self.select(gpu, target, Screen::Top, Eye::Right);
                    report.draws += self.draw_objects(gpu, &view, &projection, source);
                    report.passes += 1;
                }
            }
        } else if self.is_stereo() {
            gpu.set_3d(false);
        }

        tracing::debug!(
            iod,
            use_wide,
            passes = report.passes,
            draws = report.draws,
            "camera frame"
        );
        report
    }

    /// Destroy every owned target. The camera is consumed.
    pub fn destroy(self, gpu: &mut dyn Gpu) {
        match self.targets {
            CameraTargets::Top { left, right, wide } => {
                left.destroy(gpu);
                if let Some(right) = right {
                    right.destroy(gpu);
                }
                if let Some(wide) = wide {
                    wide.destroy(gpu);
                }
            }
            CameraTargets::Bottom { main } => main.destroy(gpu),
            CameraTargets::Offscreen { .. } | CameraTargets::Disabled => {}
        }
    }

    fn select(&self, gpu: &mut dyn Gpu, target: TargetId, screen: Screen, eye: Eye) {
        gpu.set_output(target, screen, eye);
        gpu.clear_target(target, self.background);
        gpu.draw_on(target);
    }

    fn draw_objects(
        &self,
        gpu: &mut dyn Gpu,
        view: &Mat4,
        projection: &Mat4,
        source: &dyn RenderSource,
    ) -> usize {
        let mut drawn = 0;
        for &id in &self.objects {
            let Some(entry) = source.lookup(id) else {
                continue;
            };
            if !is_visible(entry.layer, self.culling_mask) {
                continue;
            }
            let Some(renderer) = entry.renderer else {
                continue;
            };
            renderer.render(gpu, view, projection);
            drawn += 1;
        }
        drawn
    }
}
