//! Asset pipeline: binary models, materials, the shared texture cache and
//! the mesh renderer that draws loaded models.
//!
//! # Layout
//! Everything an object needs to be drawn is loaded from one directory:
//! `<name>.slmdl` models, `<name>.slmtl` materials next to them, and
//! `<name>.t3x` textures (plus optional `<name>.t3xcfg`) under the texture
//! root.

mod error;
mod material;
mod mesh;
mod mesh_renderer;
mod model;
pub mod reader;
mod texture;
mod writer;

use std::path::PathBuf;

pub use error::{EncodeError, LoadError, MaterialError, ReadError, TextureError};
pub use material::{
    FragmentLitMaterial, Material, MaterialContext, MaterialFactory, MaterialMaker,
    MaterialStream, UnlitMaterial, encode_fragmentlit_material, encode_unlit_material,
};
pub use mesh::{BONE_RECORD_SIZE, Bone, Mesh, VERTEX_STRIDE, Vertex, demo_triangle};
pub use mesh_renderer::MeshRenderer;
pub use model::{
    MATERIAL_EXTENSION, MODEL_EXTENSION, MODEL_MAGIC, Model, OBJECT_MAGIC, load_model,
    parse_model,
};
pub use texture::{
    BLANK_TEXTURE, FALLBACK_TEXTURE, Texture, TextureCache, TextureConfig, TextureHandle,
};
pub use writer::{ModelDescriptor, encode_model};

/// Material types and textures shared by every model load.
pub struct AssetLibrary {
    pub materials: MaterialFactory,
    pub textures: TextureCache,
}

impl AssetLibrary {
    /// Built-in material types, textures rooted at `texture_root`.
    pub fn new(texture_root: impl Into<PathBuf>) -> Self {
        Self {
            materials: MaterialFactory::new(),
            textures: TextureCache::new(texture_root),
        }
    }
}

pub fn crate_info() -> &'static str {
    "slate-assets v0.1.0"
}
