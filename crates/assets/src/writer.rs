//! Encoders producing the byte layouts the loaders read.

use crate::error::EncodeError;
use crate::mesh::Mesh;
use crate::model::{MODEL_MAGIC, OBJECT_MAGIC};

/// Everything needed to write one `.slmdl` file.
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    pub material_ref: String,
    pub mesh: Mesh,
}

/// Fails when the skeleton has more bones than the count byte can hold.
pub fn encode_model(desc: &ModelDescriptor) -> Result<Vec<u8>, EncodeError> {
    let mesh = &desc.mesh;
    let bones = mesh.bones().unwrap_or_default();
    let bone_count = u8::try_from(bones.len())
        .map_err(|_| EncodeError::TooManyBones { count: bones.len() })?;
    let mut out = Vec::with_capacity(
        desc.material_ref.len() + 18 + std::mem::size_of_val(bones) + mesh.vertices().len(),
    );
    out.extend_from_slice(&MODEL_MAGIC);
    out.extend_from_slice(desc.material_ref.as_bytes());
    out.push(0);
    out.extend_from_slice(&OBJECT_MAGIC);
    out.push(bone_count);
    for bone in bones {
        out.extend_from_slice(bytemuck::bytes_of(bone));
    }
    out.push(mesh.id());
    out.extend_from_slice(&mesh.vertex_count().to_le_bytes());
    out.push(mesh.stride());
    out.extend_from_slice(&mesh.radius().to_le_bytes());
    out.extend_from_slice(mesh.vertices());
    Ok(out)
}
