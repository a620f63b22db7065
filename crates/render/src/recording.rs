use std::collections::BTreeSet;
use std::fmt::Write as _;

use glam::{Mat4, Vec4};
use slate_common::Rgba;

use crate::platform::{Eye, Gpu, Program, Screen, TargetId, TextureId, TextureParams, Uniform};

/// One call made against a [`RecordingGpu`].
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    CreateTarget { target: TargetId, width: u16, height: u16 },
    DestroyTarget(TargetId),
    SetOutput { target: TargetId, screen: Screen, eye: Eye },
    Clear { target: TargetId, color: Rgba },
    DrawOn(TargetId),
    SetWide(bool),
    Set3d(bool),
    ImportTexture { texture: TextureId, bytes: usize, vram: bool },
    TextureParams { texture: TextureId, params: TextureParams },
    DeleteTexture(TextureId),
    BindTexture { unit: u8, texture: Option<TextureId> },
    BindProgram(Program),
    UniformMat4 { uniform: Uniform, value: Mat4 },
    UniformVec4 { uniform: Uniform, value: Vec4 },
    /// A draw, tagged with the target that was current when it was issued.
    Draw { target: Option<TargetId>, stride: u8, count: u32 },
}

/// In-memory GPU that records commands instead of talking to hardware.
///
/// Used by tests and the CLI. Every knob a real device exposes (wide-mode
/// support, slider position, allocation failure) can be set directly.
#[derive(Debug, Default)]
pub struct RecordingGpu {
    pub wide_supported: bool,
    pub slider: f32,
    /// Make every `create_target` call fail.
    pub fail_targets: bool,
    /// Number of upcoming `create_target` calls that succeed before failing.
    pub targets_before_failure: Option<usize>,
    next_id: u32,
    current: Option<TargetId>,
    live_targets: BTreeSet<TargetId>,
    live_textures: BTreeSet<TextureId>,
    commands: Vec<GpuCommand>,
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wide_support(mut self, supported: bool) -> Self {
        self.wide_supported = supported;
        self
    }

    pub fn with_slider(mut self, slider: f32) -> Self {
        self.slider = slider;
        self
    }

    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    pub fn drain_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of draws issued, regardless of target.
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, GpuCommand::Draw { .. }))
            .count()
    }

    /// Number of draws that landed on `target`.
    pub fn draws_on(&self, target: TargetId) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, GpuCommand::Draw { target: Some(t), .. } if *t == target))
            .count()
    }

    pub fn live_targets(&self) -> usize {
        self.live_targets.len()
    }

    pub fn live_textures(&self) -> usize {
        self.live_textures.len()
    }

    /// Projection matrices uploaded so far, in order.
    pub fn projections(&self) -> Vec<Mat4> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                GpuCommand::UniformMat4 {
                    uniform: Uniform::Projection,
                    value,
                } => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// Human-readable digest of the recorded commands.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let mut clears = 0;
        let mut binds = 0;
        for c in &self.commands {
            match c {
                GpuCommand::Clear { .. } => clears += 1,
                GpuCommand::DrawOn(_) => binds += 1,
                _ => {}
            }
        }
        let _ = writeln!(
            out,
            "=== GPU (commands={}, targets={}, textures={}) ===",
            self.commands.len(),
            self.live_targets.len(),
            self.live_textures.len()
        );
        let _ = writeln!(out, "Target binds: {binds}, clears: {clears}");
        for target in &self.live_targets {
            let _ = writeln!(out, "  target {} draws={}", target.0, self.draws_on(*target));
        }
        let _ = writeln!(out, "Draws: {}", self.draw_count());
        out
    }

    fn alloc_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl Gpu for RecordingGpu {
    fn wide_supported(&self) -> bool {
        self.wide_supported
    }

    fn slider_3d(&self) -> f32 {
        self.slider
    }

    fn create_target(&mut self, width: u16, height: u16) -> Option<TargetId> {
        if self.fail_targets {
            return None;
        }
        if let Some(remaining) = self.targets_before_failure.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        let target = TargetId(self.alloc_id());
        self.live_targets.insert(target);
        self.commands.push(GpuCommand::CreateTarget {
            target,
            width,
            height,
        });
        Some(target)
    }

    fn destroy_target(&mut self, target: TargetId) {
        self.live_targets.remove(&target);
        if self.current == Some(target) {
            self.current = None;
        }
        self.commands.push(GpuCommand::DestroyTarget(target));
    }

    fn set_output(&mut self, target: TargetId, screen: Screen, eye: Eye) {
        self.commands
            .push(GpuCommand::SetOutput { target, screen, eye });
    }

    fn clear_target(&mut self, target: TargetId, color: Rgba) {
        self.commands.push(GpuCommand::Clear { target, color });
    }

    fn draw_on(&mut self, target: TargetId) {
        self.current = Some(target);
        self.commands.push(GpuCommand::DrawOn(target));
    }

    fn set_wide(&mut self, enabled: bool) {
        self.commands.push(GpuCommand::SetWide(enabled));
    }

    fn set_3d(&mut self, enabled: bool) {
        self.commands.push(GpuCommand::Set3d(enabled));
    }

    fn import_texture(&mut self, data: &[u8], vram: bool) -> Option<TextureId> {
        // An empty container is the one input the recorder refuses to decode.
        if data.is_empty() {
            return None;
        }
        let texture = TextureId(self.alloc_id());
        self.live_textures.insert(texture);
        self.commands.push(GpuCommand::ImportTexture {
            texture,
            bytes: data.len(),
            vram,
        });
        Some(texture)
    }

    fn set_texture_params(&mut self, texture: TextureId, params: TextureParams) {
        self.commands
            .push(GpuCommand::TextureParams { texture, params });
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.live_textures.remove(&texture);
        self.commands.push(GpuCommand::DeleteTexture(texture));
    }

    fn bind_texture(&mut self, unit: u8, texture: Option<TextureId>) {
        self.commands
            .push(GpuCommand::BindTexture { unit, texture });
    }

    fn bind_program(&mut self, program: Program) {
        self.commands.push(GpuCommand::BindProgram(program));
    }

    fn set_uniform_mat4(&mut self, uniform: Uniform, value: &Mat4) {
        self.commands.push(GpuCommand::UniformMat4 {
            uniform,
            value: *value,
        });
    }

    fn set_uniform_vec4(&mut self, uniform: Uniform, value: Vec4) {
        self.commands
            .push(GpuCommand::UniformVec4 { uniform, value });
    }

    fn draw_arrays(&mut self, _vertices: &[u8], stride: u8, count: u32) {
        self.commands.push(GpuCommand::Draw {
            target: self.current,
            stride,
            count,
        });
    }
}
