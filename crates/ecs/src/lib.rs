//! Deterministic per-object component storage.
//!
//! Components are stored in BTreeMap for deterministic iteration order.
//! Each component type has its own storage keyed by ObjectId.
//!
//! # Invariants
//! - All component mutations produce events.
//! - Iteration order is deterministic (BTreeMap).
//! - A mesh renderer's model matrix always matches its object's transform.

use serde::{Deserialize, Serialize};
use slate_assets::MeshRenderer;
use slate_common::{ObjectId, Transform};
use std::collections::BTreeMap;

/// Events produced by component mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComponentEvent {
    TransformAdded { entity: ObjectId, transform: Transform },
    TransformUpdated { entity: ObjectId, old: Transform, new: Transform },
    TransformRemoved { entity: ObjectId, transform: Transform },
    MeshRendererAttached { entity: ObjectId, vertex_count: u32, replaced: bool },
    MeshRendererRemoved { entity: ObjectId },
}

/// Component storage for every object in a scene.
#[derive(Debug, Default)]
pub struct ComponentStore {
    transforms: BTreeMap<ObjectId, Transform>,
    mesh_renderers: BTreeMap<ObjectId, MeshRenderer>,
    events: Vec<ComponentEvent>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return all pending component events.
    pub fn drain_events(&mut self) -> Vec<ComponentEvent> {
        std::mem::take(&mut self.events)
    }

    /// Read-only access to pending events.
    pub fn events(&self) -> &[ComponentEvent] {
        &self.events
    }

    // --- Transform ---
    pub fn set_transform(&mut self, entity: ObjectId, transform: Transform) {
        if let Some(old) = self.transforms.insert(entity, transform) {
            self.events.push(ComponentEvent::TransformUpdated {
                entity,
                old,
                new: transform,
            });
        } else {
            self.events
                .push(ComponentEvent::TransformAdded { entity, transform });
        }
        if let Some(renderer) = self.mesh_renderers.get_mut(&entity) {
            renderer.set_model_matrix(transform.to_matrix());
        }
    }

    pub fn remove_transform(&mut self, entity: ObjectId) -> Option<Transform> {
        let removed = self.transforms.remove(&entity);
        if let Some(transform) = removed {
            self.events
                .push(ComponentEvent::TransformRemoved { entity, transform });
        }
        removed
    }

    pub fn get_transform(&self, entity: ObjectId) -> Option<&Transform> {
        self.transforms.get(&entity)
    }

    pub fn transforms(&self) -> &BTreeMap<ObjectId, Transform> {
        &self.transforms
    }

    // --- MeshRenderer ---
    /// Attach a renderer, replacing any previous one.
    pub fn attach_mesh_renderer(&mut self, entity: ObjectId, mut renderer: MeshRenderer) {
        if let Some(transform) = self.transforms.get(&entity) {
            renderer.set_model_matrix(transform.to_matrix());
        }
        let vertex_count = renderer.mesh().vertex_count();
        let replaced = self.mesh_renderers.insert(entity, renderer).is_some();
        tracing::debug!(?entity, vertex_count, replaced, "mesh renderer attached");
        self.events.push(ComponentEvent::MeshRendererAttached {
            entity,
            vertex_count,
            replaced,
        });
    }

    pub fn remove_mesh_renderer(&mut self, entity: ObjectId) -> Option<MeshRenderer> {
        let removed = self.mesh_renderers.remove(&entity);
        if removed.is_some() {
            self.events
                .push(ComponentEvent::MeshRendererRemoved { entity });
        }
        removed
    }

    pub fn get_mesh_renderer(&self, entity: ObjectId) -> Option<&MeshRenderer> {
        self.mesh_renderers.get(&entity)
    }

    pub fn mesh_renderers(&self) -> &BTreeMap<ObjectId, MeshRenderer> {
        &self.mesh_renderers
    }

    /// Remove all components for an entity.
    pub fn remove_entity(&mut self, entity: ObjectId) {
        self.remove_transform(entity);
        self.remove_mesh_renderer(entity);
    }
}

pub fn crate_info() -> &'static str {
    "slate-ecs v0.1.0"
}
