//! `.slmdl` model files.
//!
//! Layout (little-endian):
//! `"mdl"` · material ref (cstr) · `"obj"` · bone count u8 · bones ·
//! mesh id u8 · vertex count u32 · stride u8 · radius f32 · vertex bytes.
//!
//! The material ref names a sibling `<ref>.slmtl` file.

use std::io::{BufReader, Read};
use std::path::Path;

use slate_render::Gpu;

use crate::error::{LoadError, MaterialError};
use crate::material::{Material, MaterialContext};
use crate::mesh::{BONE_RECORD_SIZE, Bone, Mesh};
use crate::reader::{ByteReader, MAX_NAME_LEN};
use crate::AssetLibrary;

pub const MODEL_MAGIC: [u8; 3] = *b"mdl";
pub const OBJECT_MAGIC: [u8; 3] = *b"obj";
pub const MODEL_EXTENSION: &str = "slmdl";
pub const MATERIAL_EXTENSION: &str = "slmtl";

/// A fully parsed model, ready to be attached to an object.
pub struct Model {
    pub material_ref: String,
    pub material: Option<Box<dyn Material>>,
    pub mesh: Mesh,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("material_ref", &self.material_ref)
            .field("material", &self.material.as_ref().map(|m| m.kind()))
            .field("mesh", &self.mesh)
            .finish()
    }
}

/// Load a model file. Its material is resolved next to it.
pub fn load_model(
    path: &Path,
    library: &AssetLibrary,
    gpu: &mut dyn Gpu,
) -> Result<Model, LoadError> {
    let _span = tracing::debug_span!("load_model", path = %path.display()).entered();
    let dir = path
        .parent()
        .ok_or_else(|| LoadError::NoParent(path.to_path_buf()))?;
    let file = std::fs::File::open(path)?;
    parse_model(BufReader::new(file), dir, library, gpu)
}

/// Parse a model stream, resolving the material file under `dir`.
pub fn parse_model<R: Read>(
    reader: R,
    dir: &Path,
    library: &AssetLibrary,
    gpu: &mut dyn Gpu,
) -> Result<Model, LoadError> {
    let mut r = ByteReader::new(reader);

    expect_magic(&mut r, MODEL_MAGIC)?;
    let material_ref = r.read_name(MAX_NAME_LEN)?;
    let material = load_material(&material_ref, dir, library, gpu)?;

    expect_magic(&mut r, OBJECT_MAGIC)?;
    let bones = read_bones(&mut r)?;

    let id = r.read_u8()?;
    let vertex_count = r.read_u32()?;
    let stride = r.read_u8()?;
    let radius = r.read_f32()?;
    let len = (vertex_count as usize)
        .checked_mul(stride as usize)
        .ok_or(LoadError::VertexDataTooLarge {
            count: vertex_count,
            stride,
        })?;
    let vertices = r.read_bytes(len)?;

    tracing::debug!(
        material = %material_ref,
        vertices = vertex_count,
        stride,
        bones = bones.len(),
        "model parsed"
    );
    Ok(Model {
        material_ref,
        material,
        mesh: Mesh::new(id, vertices, vertex_count, stride, radius).with_bones(bones),
    })
}

fn expect_magic<R: Read>(r: &mut ByteReader<R>, expected: [u8; 3]) -> Result<(), LoadError> {
    let offset = r.offset();
    let found = r.read_array::<3>()?;
    if found != expected {
        tracing::error!(
            found = %found.escape_ascii(),
            expected = %expected.escape_ascii(),
            offset,
            "wrong magic word"
        );
        return Err(LoadError::BadMagic {
            expected,
            found,
            offset,
        });
    }
    Ok(())
}

fn read_bones<R: Read>(r: &mut ByteReader<R>) -> Result<Vec<Bone>, LoadError> {
    let count = r.read_u8()? as usize;
    if count == 0 {
        return Ok(Vec::new());
    }
    let raw = r.read_bytes(count * BONE_RECORD_SIZE)?;
    Ok(raw
        .chunks_exact(BONE_RECORD_SIZE)
        .map(bytemuck::pod_read_unaligned::<Bone>)
        .collect())
}

/// A missing material file or unknown type leaves the model without a
/// material; a malformed payload fails the load.
fn load_material(
    name: &str,
    dir: &Path,
    library: &AssetLibrary,
    gpu: &mut dyn Gpu,
) -> Result<Option<Box<dyn Material>>, LoadError> {
    let path = dir.join(format!("{name}.{MATERIAL_EXTENSION}"));
    let mut ctx = MaterialContext {
        textures: &library.textures,
        gpu,
    };
    match library.materials.parse_file(&path, &mut ctx) {
        Ok(material) => Ok(material),
        Err(MaterialError::Io(e)) => {
            tracing::warn!(path = %path.display(), error = %e, "material file unavailable");
            Ok(None)
        }
        Err(source) => Err(LoadError::Material {
            name: name.to_string(),
            source,
        }),
    }
}
