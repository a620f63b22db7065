//! Materials and the name-keyed factory that builds them from `.slmtl` files.
//!
//! A material file starts with the null-terminated material type name; the
//! rest of the stream is the payload of that type.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use glam::{Mat4, Vec4};
use slate_common::Rgba;
use slate_render::{Gpu, Program, Uniform};

use crate::error::MaterialError;
use crate::reader::{ByteReader, MAX_NAME_LEN};
use crate::texture::{TextureCache, TextureHandle};

/// Render state applied around a mesh draw.
pub trait Material {
    /// Type name the factory knows this material by.
    fn kind(&self) -> &str;

    /// Undo whatever `set_material` bound that would leak into later draws.
    fn reset_material(&self, gpu: &mut dyn Gpu);

    /// Bind program, uniforms and textures for the next draw.
    fn set_material(&self, gpu: &mut dyn Gpu, model_view: &Mat4, projection: &Mat4);
}

/// What a material constructor may touch while parsing its payload.
pub struct MaterialContext<'a> {
    pub textures: &'a TextureCache,
    pub gpu: &'a mut dyn Gpu,
}

pub type MaterialStream<'r> = ByteReader<&'r mut dyn Read>;

/// Parses one material type's payload.
pub type MaterialMaker =
    fn(&mut MaterialStream<'_>, &mut MaterialContext<'_>) -> Result<Box<dyn Material>, MaterialError>;

/// Registry of material constructors keyed by type name.
pub struct MaterialFactory {
    makers: HashMap<String, MaterialMaker>,
}

impl Default for MaterialFactory {
    fn default() -> Self {
        let mut factory = Self::empty();
        factory.register(UnlitMaterial::KIND, UnlitMaterial::parse);
        factory.register(FragmentLitMaterial::KIND, FragmentLitMaterial::parse);
        factory
    }
}

impl MaterialFactory {
    /// Factory with the built-in material types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory that knows no material types.
    pub fn empty() -> Self {
        Self {
            makers: HashMap::new(),
        }
    }

    /// Register (or replace) the constructor for `kind`.
    pub fn register(&mut self, kind: &str, maker: MaterialMaker) {
        self.makers.insert(kind.to_string(), maker);
    }

    pub fn knows(&self, kind: &str) -> bool {
        self.makers.contains_key(kind)
    }

    /// Build a `kind` material from its payload. Unknown kinds are logged
    /// and yield `None`.
    pub fn make(
        &self,
        kind: &str,
        stream: &mut MaterialStream<'_>,
        ctx: &mut MaterialContext<'_>,
    ) -> Result<Option<Box<dyn Material>>, MaterialError> {
        let Some(maker) = self.makers.get(kind) else {
            tracing::warn!(kind, "unknown material type");
            return Ok(None);
        };
        maker(stream, ctx).map(Some)
    }

    /// Read a whole material stream: type name, then payload.
    pub fn parse<R: Read>(
        &self,
        mut reader: R,
        ctx: &mut MaterialContext<'_>,
    ) -> Result<Option<Box<dyn Material>>, MaterialError> {
        let inner: &mut dyn Read = &mut reader;
        let mut stream = ByteReader::new(inner);
        let kind = stream.read_name(MAX_NAME_LEN)?;
        self.make(&kind, &mut stream, ctx)
    }

    /// Open and parse a `.slmtl` file.
    pub fn parse_file(
        &self,
        path: &Path,
        ctx: &mut MaterialContext<'_>,
    ) -> Result<Option<Box<dyn Material>>, MaterialError> {
        let file = std::fs::File::open(path)?;
        self.parse(std::io::BufReader::new(file), ctx)
    }
}

fn read_vec4(stream: &mut MaterialStream<'_>) -> Result<Vec4, MaterialError> {
    Ok(Vec4::new(
        stream.read_f32()?,
        stream.read_f32()?,
        stream.read_f32()?,
        stream.read_f32()?,
    ))
}

fn upload_matrices(gpu: &mut dyn Gpu, model_view: &Mat4, projection: &Mat4) {
    gpu.set_uniform_mat4(Uniform::ModelView, model_view);
    gpu.set_uniform_mat4(Uniform::Projection, projection);
}

/// Flat color, no lighting. Payload: RGBA8.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnlitMaterial {
    pub color: Rgba,
}

impl UnlitMaterial {
    pub const KIND: &'static str = "unlit";

    fn parse(
        stream: &mut MaterialStream<'_>,
        _ctx: &mut MaterialContext<'_>,
    ) -> Result<Box<dyn Material>, MaterialError> {
        let [r, g, b, a] = stream.read_array::<4>()?;
        Ok(Box::new(Self {
            color: Rgba::from_bytes(r, g, b, a),
        }))
    }
}

impl Material for UnlitMaterial {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn reset_material(&self, _gpu: &mut dyn Gpu) {}

    fn set_material(&self, gpu: &mut dyn Gpu, model_view: &Mat4, projection: &Mat4) {
        gpu.bind_program(Program::Unlit);
        upload_matrices(gpu, model_view, projection);
        gpu.set_uniform_vec4(Uniform::Color, self.color.to_vec4());
    }
}

/// Textured, per-fragment lit. Payload: texture name (null-terminated),
/// diffuse `[f32; 4]`, specular `[f32; 4]`.
#[derive(Debug, Clone)]
pub struct FragmentLitMaterial {
    pub texture: Option<TextureHandle>,
    pub diffuse: Vec4,
    pub specular: Vec4,
}

impl FragmentLitMaterial {
    pub const KIND: &'static str = "fragmentlit";

    fn parse(
        stream: &mut MaterialStream<'_>,
        ctx: &mut MaterialContext<'_>,
    ) -> Result<Box<dyn Material>, MaterialError> {
        let texture_name = stream.read_name(MAX_NAME_LEN)?;
        let diffuse = read_vec4(stream)?;
        let specular = read_vec4(stream)?;
        let texture = match ctx.textures.load(&texture_name, &mut *ctx.gpu) {
            Ok(texture) => Some(texture),
            Err(e) => {
                tracing::warn!(texture = %texture_name, error = %e, "material texture unavailable");
                None
            }
        };
        Ok(Box::new(Self {
            texture,
            diffuse,
            specular,
        }))
    }
}

impl Material for FragmentLitMaterial {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn reset_material(&self, gpu: &mut dyn Gpu) {
        gpu.bind_texture(0, None);
    }

    fn set_material(&self, gpu: &mut dyn Gpu, model_view: &Mat4, projection: &Mat4) {
        gpu.bind_program(Program::FragmentLit);
        upload_matrices(gpu, model_view, projection);
        gpu.set_uniform_vec4(Uniform::Diffuse, self.diffuse);
        gpu.set_uniform_vec4(Uniform::Specular, self.specular);
        gpu.bind_texture(0, self.texture.as_ref().map(|t| t.gpu_id()));
    }
}

/// Encode an `unlit` material file.
pub fn encode_unlit_material(color: Rgba) -> Vec<u8> {
    let mut out = Vec::with_capacity(UnlitMaterial::KIND.len() + 5);
    out.extend_from_slice(UnlitMaterial::KIND.as_bytes());
    out.push(0);
    out.extend_from_slice(&color.to_bytes());
    out
}

/// Encode a `fragmentlit` material file.
pub fn encode_fragmentlit_material(texture: &str, diffuse: Vec4, specular: Vec4) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(FragmentLitMaterial::KIND.as_bytes());
    out.push(0);
    out.extend_from_slice(texture.as_bytes());
    out.push(0);
    for v in [diffuse, specular] {
        for c in v.to_array() {
            out.extend_from_slice(&c.to_le_bytes());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use slate_render::{GpuCommand, RecordingGpu};

    #[test]
    fn unlit_parses_color() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TextureCache::new(dir.path());
        let mut gpu = RecordingGpu::new();
        let mut ctx = MaterialContext {
            textures: &cache,
            gpu: &mut gpu,
        };
        let bytes = encode_unlit_material(Rgba(0xFF00_00FF));
        let material = MaterialFactory::new()
            .parse(&bytes[..], &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(material.kind(), "unlit");

        material.set_material(&mut gpu, &Mat4::IDENTITY, &Mat4::IDENTITY);
        assert!(gpu.commands().contains(&GpuCommand::UniformVec4 {
            uniform: Uniform::Color,
            value: Vec4::new(1.0, 0.0, 0.0, 1.0),
        }));
    }

    #[test]
    fn fragmentlit_loads_texture_through_cache() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tile.t3x"), b"T3X-tile").unwrap();
        let cache = TextureCache::new(dir.path());
        let mut gpu = RecordingGpu::new();

        let bytes = encode_fragmentlit_material("tile", Vec4::ONE, Vec4::splat(0.5));
        let material = {
            let mut ctx = MaterialContext {
                textures: &cache,
                gpu: &mut gpu,
            };
            MaterialFactory::new()
                .parse(&bytes[..], &mut ctx)
                .unwrap()
                .unwrap()
        };
        assert_eq!(material.kind(), "fragmentlit");
        assert!(cache.contains("tile"));

        material.set_material(&mut gpu, &Mat4::IDENTITY, &Mat4::IDENTITY);
        material.reset_material(&mut gpu);
        let binds: Vec<Option<slate_render::TextureId>> = gpu
            .commands()
            .iter()
            .filter_map(|c| match c {
                GpuCommand::BindTexture { unit: 0, texture } => Some(*texture),
                _ => None,
            })
            .collect();
        assert_eq!(binds.len(), 2);
        assert!(binds[0].is_some());
        assert!(binds[1].is_none());

        drop(material);
        assert_eq!(cache.collect(&mut gpu), 1);
    }

    #[test]
    fn unknown_kind_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TextureCache::new(dir.path());
        let mut gpu = RecordingGpu::new();
        let mut ctx = MaterialContext {
            textures: &cache,
            gpu: &mut gpu,
        };
        let made = MaterialFactory::new()
            .parse(&b"hologram\0\x01\x02"[..], &mut ctx)
            .unwrap();
        assert!(made.is_none());
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TextureCache::new(dir.path());
        let mut gpu = RecordingGpu::new();
        let mut ctx = MaterialContext {
            textures: &cache,
            gpu: &mut gpu,
        };
        let result = MaterialFactory::new().parse(&b"unlit\0\xFF"[..], &mut ctx);
        assert!(matches!(result, Err(MaterialError::Read(_))));
    }

    #[test]
    fn custom_kinds_can_be_registered() {
        #[derive(Debug)]
        struct Ink;
        impl Material for Ink {
            fn kind(&self) -> &str {
                "ink"
            }
            fn reset_material(&self, _gpu: &mut dyn Gpu) {}
            fn set_material(&self, _gpu: &mut dyn Gpu, _mv: &Mat4, _p: &Mat4) {}
        }
        fn make_ink(
            _s: &mut MaterialStream<'_>,
            _c: &mut MaterialContext<'_>,
        ) -> Result<Box<dyn Material>, MaterialError> {
            Ok(Box::new(Ink))
        }

        let mut factory = MaterialFactory::empty();
        assert!(!factory.knows("unlit"));
        factory.register("ink", make_ink);
        assert!(factory.knows("ink"));

        let dir = tempfile::tempdir().unwrap();
        let cache = TextureCache::new(dir.path());
        let mut gpu = RecordingGpu::new();
        let mut ctx = MaterialContext {
            textures: &cache,
            gpu: &mut gpu,
        };
        let made = factory.parse(&b"ink\0"[..], &mut ctx).unwrap().unwrap();
        assert_eq!(made.kind(), "ink");
    }
}
