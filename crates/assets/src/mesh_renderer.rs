use glam::Mat4;
use slate_render::{Gpu, Renderer, Uniform};

use crate::material::Material;
use crate::mesh::Mesh;
use crate::model::Model;

/// Draws one mesh with its material at the owning object's transform.
pub struct MeshRenderer {
    mesh: Mesh,
    material: Option<Box<dyn Material>>,
    model: Mat4,
}

impl std::fmt::Debug for MeshRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshRenderer")
            .field("mesh", &self.mesh)
            .field("material", &self.material.as_ref().map(|m| m.kind()))
            .field("model", &self.model)
            .finish()
    }
}

impl MeshRenderer {
    pub fn new(mesh: Mesh, material: Option<Box<dyn Material>>) -> Self {
        Self {
            mesh,
            material,
            model: Mat4::IDENTITY,
        }
    }

    pub fn from_model(model: Model) -> Self {
        Self::new(model.mesh, model.material)
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn material(&self) -> Option<&dyn Material> {
        self.material.as_deref()
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }

    /// Kept in sync with the owning object's transform.
    pub fn set_model_matrix(&mut self, model: Mat4) {
        self.model = model;
    }
}

impl Renderer for MeshRenderer {
    fn render(&self, gpu: &mut dyn Gpu, view: &Mat4, projection: &Mat4) {
        let model_view = *view * self.model;
        match &self.material {
            Some(material) => material.set_material(gpu, &model_view, projection),
            None => {
                gpu.set_uniform_mat4(Uniform::ModelView, &model_view);
                gpu.set_uniform_mat4(Uniform::Projection, projection);
            }
        }
        gpu.draw_arrays(
            self.mesh.vertices(),
            self.mesh.stride(),
            self.mesh.vertex_count(),
        );
        if let Some(material) = &self.material {
            material.reset_material(gpu);
        }
    }
}
