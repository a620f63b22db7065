use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use slate_assets::{AssetLibrary, MeshRenderer, load_model};
use slate_common::{LAYER_DEFAULT, ObjectId, Transform};
use slate_ecs::ComponentStore;
use slate_render::{
    Camera, CameraConfig, FrameReport, Gpu, RenderEntry, RenderSource, Renderer,
};

use crate::error::SceneError;
use crate::script::{Script, ScriptContext};

/// An event record produced by every structural change to the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    Spawned {
        id: ObjectId,
        parent: ObjectId,
        name: String,
    },
    /// Emitted once per removed object, children before parents.
    Despawned { id: ObjectId },
    Reparented {
        id: ObjectId,
        old_parent: ObjectId,
        new_parent: ObjectId,
    },
}

/// A node in the scene tree.
#[derive(Debug, Clone, PartialEq)]
pub struct GameObject {
    pub name: String,
    pub layer: u16,
    enabled: bool,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
}

impl GameObject {
    fn new(name: String, parent: Option<ObjectId>) -> Self {
        Self {
            name,
            layer: LAYER_DEFAULT,
            enabled: true,
            parent,
            children: Vec::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// `None` only for the root.
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }
}

/// Objects, their components and scripts, and the cameras that draw them.
///
/// The scene owns every camera; the main top and bottom cameras are
/// referenced by owning object id.
pub struct Scene {
    name: String,
    root: ObjectId,
    objects: BTreeMap<ObjectId, GameObject>,
    components: ComponentStore,
    scripts: BTreeMap<ObjectId, Vec<Box<dyn Script>>>,
    cameras: BTreeMap<ObjectId, Camera>,
    main_top: Option<ObjectId>,
    main_bottom: Option<ObjectId>,
    started: bool,
    events: Vec<SceneEvent>,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("objects", &self.objects.len())
            .field("cameras", &self.cameras.len())
            .field("main_top", &self.main_top)
            .field("main_bottom", &self.main_bottom)
            .finish()
    }
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        let root = ObjectId::new();
        let mut objects = BTreeMap::new();
        objects.insert(root, GameObject::new("root".into(), None));
        let mut components = ComponentStore::new();
        components.set_transform(root, Transform::default());
        components.drain_events();
        Self {
            name: name.into(),
            root,
            objects,
            components,
            scripts: BTreeMap::new(),
            cameras: BTreeMap::new(),
            main_top: None,
            main_bottom: None,
            started: false,
            events: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> ObjectId {
        self.root
    }

    /// Number of objects, root included.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn components(&self) -> &ComponentStore {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut ComponentStore {
        &mut self.components
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut GameObject, SceneError> {
        self.objects
            .get_mut(&id)
            .ok_or(SceneError::UnknownObject(id))
    }

    /// Spawn an object with an identity transform. `None` spawns under the root.
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        parent: Option<ObjectId>,
    ) -> Result<ObjectId, SceneError> {
        let parent = parent.unwrap_or(self.root);
        let id = ObjectId::new();
        let name = name.into();
        self.object_mut(parent)?.children.push(id);
        self.objects
            .insert(id, GameObject::new(name.clone(), Some(parent)));
        self.components.set_transform(id, Transform::default());
        self.events.push(SceneEvent::Spawned { id, parent, name });
        Ok(id)
    }

    /// Remove an object and its whole subtree, destroying any cameras they own.
    /// Textures only they referenced are deleted by the next
    /// `TextureCache::collect`.
    pub fn despawn(&mut self, id: ObjectId, gpu: &mut dyn Gpu) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RootObject);
        }
        let parent = self
            .objects
            .get(&id)
            .ok_or(SceneError::UnknownObject(id))?
            .parent;
        if let Some(parent) = parent.and_then(|p| self.objects.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }

        let mut subtree = Vec::new();
        self.collect_subtree(id, false, &mut subtree);
        for removed in subtree.into_iter().rev() {
            self.objects.remove(&removed);
            self.components.remove_entity(removed);
            self.scripts.remove(&removed);
            if let Some(camera) = self.cameras.remove(&removed) {
                camera.destroy(gpu);
            }
            if self.main_top == Some(removed) {
                self.main_top = None;
            }
            if self.main_bottom == Some(removed) {
                self.main_bottom = None;
            }
            for camera in self.cameras.values_mut() {
                camera.remove_object(removed);
            }
            self.events.push(SceneEvent::Despawned { id: removed });
        }
        Ok(())
    }

    /// Move `id` under `new_parent`, keeping its subtree.
    pub fn reparent(&mut self, id: ObjectId, new_parent: ObjectId) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RootObject);
        }
        if !self.contains(new_parent) {
            return Err(SceneError::UnknownObject(new_parent));
        }
        if self.is_ancestor_or_self(id, new_parent) {
            return Err(SceneError::Cycle {
                object: id,
                parent: new_parent,
            });
        }
        let object = self.object_mut(id)?;
        let old_parent = object.parent.unwrap_or(new_parent);
        if old_parent == new_parent {
            return Ok(());
        }
        object.parent = Some(new_parent);
        if let Some(old) = self.objects.get_mut(&old_parent) {
            old.children.retain(|c| *c != id);
        }
        self.object_mut(new_parent)?.children.push(id);
        self.events.push(SceneEvent::Reparented {
            id,
            old_parent,
            new_parent,
        });
        Ok(())
    }

    fn is_ancestor_or_self(&self, ancestor: ObjectId, mut node: ObjectId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.objects.get(&node).and_then(|o| o.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// First object named `name`, depth-first from the root.
    pub fn find(&self, name: &str) -> Option<ObjectId> {
        let mut order = Vec::new();
        self.collect_subtree(self.root, false, &mut order);
        order
            .into_iter()
            .find(|id| self.objects.get(id).is_some_and(|o| o.name == name))
    }

    /// Depth-first preorder of `id`'s subtree.
    fn collect_subtree(&self, id: ObjectId, skip_disabled: bool, out: &mut Vec<ObjectId>) {
        let Some(object) = self.objects.get(&id) else {
            return;
        };
        if skip_disabled && !object.enabled {
            return;
        }
        out.push(id);
        for child in &object.children {
            self.collect_subtree(*child, skip_disabled, out);
        }
    }

    /// True when `id` and every ancestor are enabled.
    pub fn active_in_hierarchy(&self, id: ObjectId) -> bool {
        active_in_hierarchy(&self.objects, id)
    }

    pub fn set_layer(&mut self, id: ObjectId, layer: u16) -> Result<(), SceneError> {
        self.object_mut(id)?.layer = layer;
        Ok(())
    }

    pub fn set_transform(&mut self, id: ObjectId, transform: Transform) -> Result<(), SceneError> {
        if !self.contains(id) {
            return Err(SceneError::UnknownObject(id));
        }
        self.components.set_transform(id, transform);
        Ok(())
    }

    /// Enable or disable an object. Disabled subtrees get no updates and
    /// are not drawn. Re-enabling after the awake pass calls `on_enable`.
    pub fn set_enabled(&mut self, id: ObjectId, enabled: bool) -> Result<(), SceneError> {
        let object = self.object_mut(id)?;
        let was = std::mem::replace(&mut object.enabled, enabled);
        if enabled && !was && self.started {
            self.dispatch(&[id], 0.0, |s, ctx| s.on_enable(ctx));
        }
        Ok(())
    }

    pub fn add_script(&mut self, id: ObjectId, script: Box<dyn Script>) -> Result<(), SceneError> {
        if !self.contains(id) {
            return Err(SceneError::UnknownObject(id));
        }
        self.scripts.entry(id).or_default().push(script);
        Ok(())
    }

    fn dispatch(
        &mut self,
        order: &[ObjectId],
        delta: f32,
        mut call: impl FnMut(&mut dyn Script, &mut ScriptContext<'_>),
    ) {
        for id in order {
            let Some(scripts) = self.scripts.get_mut(id) else {
                continue;
            };
            let mut ctx = ScriptContext {
                object: *id,
                components: &mut self.components,
                delta,
            };
            for script in scripts.iter_mut() {
                call(script.as_mut(), &mut ctx);
            }
        }
    }

    /// Enable every object, then run `awake` and `on_enable` followed by
    /// `start` on every script.
    pub fn awake(&mut self) {
        let mut order = Vec::new();
        self.collect_subtree(self.root, false, &mut order);
        for id in &order {
            if let Some(object) = self.objects.get_mut(id) {
                object.enabled = true;
            }
        }
        self.dispatch(&order, 0.0, |s, ctx| {
            s.awake(ctx);
            s.on_enable(ctx);
        });
        self.dispatch(&order, 0.0, |s, ctx| s.start(ctx));
        self.started = true;
        tracing::debug!(scene = %self.name, objects = order.len(), "scene awake");
    }

    /// One frame of script updates: every `update`, then every `late_update`.
    pub fn update(&mut self, delta: f32) {
        let _span = tracing::debug_span!("scene_update", scene = %self.name).entered();
        let mut order = Vec::new();
        self.collect_subtree(self.root, true, &mut order);
        self.dispatch(&order, delta, |s, ctx| s.update(ctx));
        self.dispatch(&order, delta, |s, ctx| s.late_update(ctx));
    }

    // --- Cameras ---

    /// Give `id` a camera, replacing (and destroying) any previous one.
    pub fn attach_camera(
        &mut self,
        id: ObjectId,
        config: &CameraConfig,
        gpu: &mut dyn Gpu,
    ) -> Result<(), SceneError> {
        if !self.contains(id) {
            return Err(SceneError::UnknownObject(id));
        }
        let camera = Camera::new(id, config, gpu);
        if let Some(old) = self.cameras.insert(id, camera) {
            old.destroy(gpu);
        }
        Ok(())
    }

    pub fn camera(&self, id: ObjectId) -> Option<&Camera> {
        self.cameras.get(&id)
    }

    pub fn camera_mut(&mut self, id: ObjectId) -> Option<&mut Camera> {
        self.cameras.get_mut(&id)
    }

    pub fn set_main_top(&mut self, id: ObjectId) -> Result<(), SceneError> {
        if !self.cameras.contains_key(&id) {
            return Err(SceneError::NoCamera(id));
        }
        self.main_top = Some(id);
        Ok(())
    }

    pub fn set_main_bottom(&mut self, id: ObjectId) -> Result<(), SceneError> {
        if !self.cameras.contains_key(&id) {
            return Err(SceneError::NoCamera(id));
        }
        self.main_bottom = Some(id);
        Ok(())
    }

    pub fn main_top(&self) -> Option<ObjectId> {
        self.main_top
    }

    pub fn main_bottom(&self) -> Option<ObjectId> {
        self.main_bottom
    }

    /// Render the main top-screen camera. `None` when there is none.
    pub fn draw_top(&self, gpu: &mut dyn Gpu) -> Option<FrameReport> {
        let Some(id) = self.main_top else {
            tracing::warn!(scene = %self.name, "no main top camera");
            return None;
        };
        self.draw_camera(id, gpu)
    }

    /// Render the main bottom-screen camera. `None` when there is none.
    pub fn draw_bottom(&self, gpu: &mut dyn Gpu) -> Option<FrameReport> {
        let Some(id) = self.main_bottom else {
            tracing::warn!(scene = %self.name, "no main bottom camera");
            return None;
        };
        self.draw_camera(id, gpu)
    }

    fn draw_camera(&self, id: ObjectId, gpu: &mut dyn Gpu) -> Option<FrameReport> {
        let camera = self.cameras.get(&id)?;
        if !self.active_in_hierarchy(id) {
            return None;
        }
        let source = SceneObjects {
            objects: &self.objects,
            components: &self.components,
        };
        Some(camera.render(gpu, self.components.get_transform(id), &source))
    }

    /// Tear the scene down, destroying every camera's render targets, then
    /// delete the GPU textures whose last handle the components held.
    /// Returns the number of textures deleted.
    pub fn shutdown(mut self, assets: &AssetLibrary, gpu: &mut dyn Gpu) -> usize {
        for (_, camera) in std::mem::take(&mut self.cameras) {
            camera.destroy(gpu);
        }
        drop(self.components);
        let released = assets.textures.collect(gpu);
        tracing::debug!(scene = %self.name, released, "scene shut down");
        released
    }

    // --- Models ---

    /// Load a model file and attach it to `id` as a mesh renderer.
    ///
    /// The object is only touched once the whole file parsed; a later
    /// successful load replaces the previous renderer, and textures only
    /// the old renderer held are deleted.
    pub fn add_model(
        &mut self,
        path: &Path,
        id: ObjectId,
        assets: &AssetLibrary,
        gpu: &mut dyn Gpu,
    ) -> Result<(), SceneError> {
        if !self.contains(id) {
            return Err(SceneError::UnknownObject(id));
        }
        let model = load_model(path, assets, gpu).map_err(|source| {
            tracing::error!(path = %path.display(), error = %source, "model load failed");
            SceneError::Load {
                path: path.to_path_buf(),
                source,
            }
        })?;
        self.components
            .attach_mesh_renderer(id, MeshRenderer::from_model(model));
        assets.textures.collect(gpu);
        Ok(())
    }
}

/// Camera-facing view of the scene's objects.
struct SceneObjects<'a> {
    objects: &'a BTreeMap<ObjectId, GameObject>,
    components: &'a ComponentStore,
}

fn active_in_hierarchy(objects: &BTreeMap<ObjectId, GameObject>, mut id: ObjectId) -> bool {
    loop {
        match objects.get(&id) {
            Some(object) if object.enabled => match object.parent {
                Some(parent) => id = parent,
                None => return true,
            },
            _ => return false,
        }
    }
}

impl RenderSource for SceneObjects<'_> {
    fn lookup(&self, id: ObjectId) -> Option<RenderEntry<'_>> {
        if !active_in_hierarchy(self.objects, id) {
            return None;
        }
        let object = self.objects.get(&id)?;
        Some(RenderEntry {
            layer: object.layer,
            renderer: self
                .components
                .get_mesh_renderer(id)
                .map(|r| r as &dyn Renderer),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slate_assets::{
        Mesh, ModelDescriptor, demo_triangle, encode_fragmentlit_material, encode_model,
        encode_unlit_material,
    };
    use slate_common::Rgba;
    use slate_render::RecordingGpu;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn mono_config() -> CameraConfig {
        CameraConfig {
            stereo: false,
            wide: false,
            ..CameraConfig::default()
        }
    }

    fn triangle_renderer() -> MeshRenderer {
        MeshRenderer::new(Mesh::from_vertices(0, &demo_triangle(), 1.0), None)
    }

    #[test]
    fn spawn_builds_a_tree() {
        let mut scene = Scene::new("test");
        let a = scene.spawn("a", None).unwrap();
        let b = scene.spawn("b", Some(a)).unwrap();
        assert_eq!(scene.object_count(), 3);
        assert_eq!(scene.get(b).unwrap().parent(), Some(a));
        assert_eq!(scene.get(a).unwrap().children(), &[b]);
        assert_eq!(scene.find("b"), Some(b));
        assert_eq!(scene.find("missing"), None);
        assert!(scene.components().get_transform(b).is_some());
        assert_eq!(scene.events().len(), 2);
    }

    #[test]
    fn spawn_under_unknown_parent_fails() {
        let mut scene = Scene::new("test");
        let ghost = ObjectId::new();
        assert!(matches!(
            scene.spawn("x", Some(ghost)),
            Err(SceneError::UnknownObject(id)) if id == ghost
        ));
        assert_eq!(scene.object_count(), 1);
    }

    #[test]
    fn despawn_is_recursive_and_frees_cameras() {
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new("test");
        let rig = scene.spawn("rig", None).unwrap();
        let eye = scene.spawn("eye", Some(rig)).unwrap();
        scene
            .attach_camera(eye, &CameraConfig::default(), &mut gpu)
            .unwrap();
        scene.set_main_top(eye).unwrap();
        assert_eq!(gpu.live_targets(), 2);

        scene.drain_events();
        scene.despawn(rig, &mut gpu).unwrap();
        assert_eq!(scene.object_count(), 1);
        assert!(scene.camera(eye).is_none());
        assert_eq!(scene.main_top(), None);
        assert_eq!(gpu.live_targets(), 0);
        assert!(scene.get(scene.root()).unwrap().children().is_empty());
        assert_eq!(
            scene.events(),
            &[
                SceneEvent::Despawned { id: eye },
                SceneEvent::Despawned { id: rig }
            ]
        );
    }

    #[test]
    fn root_cannot_be_despawned_or_moved() {
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new("test");
        let a = scene.spawn("a", None).unwrap();
        let root = scene.root();
        assert!(matches!(scene.despawn(root, &mut gpu), Err(SceneError::RootObject)));
        assert!(matches!(scene.reparent(root, a), Err(SceneError::RootObject)));
    }

    #[test]
    fn reparent_rejects_cycles() {
        let mut scene = Scene::new("test");
        let a = scene.spawn("a", None).unwrap();
        let b = scene.spawn("b", Some(a)).unwrap();
        let c = scene.spawn("c", None).unwrap();

        assert!(matches!(scene.reparent(a, b), Err(SceneError::Cycle { .. })));
        assert!(matches!(scene.reparent(a, a), Err(SceneError::Cycle { .. })));

        scene.drain_events();
        scene.reparent(b, c).unwrap();
        assert!(scene.get(a).unwrap().children().is_empty());
        assert_eq!(scene.get(c).unwrap().children(), &[b]);
        assert_eq!(
            scene.events(),
            &[SceneEvent::Reparented {
                id: b,
                old_parent: a,
                new_parent: c
            }]
        );
    }

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        tag: &'static str,
        log: Log,
    }

    impl Recorder {
        fn push(&self, what: &str) {
            self.log.borrow_mut().push(format!("{}:{what}", self.tag));
        }
    }

    impl Script for Recorder {
        fn awake(&mut self, _ctx: &mut ScriptContext<'_>) {
            self.push("awake");
        }
        fn on_enable(&mut self, _ctx: &mut ScriptContext<'_>) {
            self.push("enable");
        }
        fn start(&mut self, _ctx: &mut ScriptContext<'_>) {
            self.push("start");
        }
        fn update(&mut self, _ctx: &mut ScriptContext<'_>) {
            self.push("update");
        }
        fn late_update(&mut self, _ctx: &mut ScriptContext<'_>) {
            self.push("late");
        }
    }

    #[test]
    fn lifecycle_order_is_depth_first() {
        let log: Log = Rc::default();
        let mut scene = Scene::new("test");
        let a = scene.spawn("a", None).unwrap();
        let b = scene.spawn("b", Some(a)).unwrap();
        scene
            .add_script(a, Box::new(Recorder { tag: "a", log: log.clone() }))
            .unwrap();
        scene
            .add_script(b, Box::new(Recorder { tag: "b", log: log.clone() }))
            .unwrap();

        scene.awake();
        scene.update(0.016);
        assert_eq!(
            *log.borrow(),
            [
                "a:awake", "a:enable", "b:awake", "b:enable", "a:start", "b:start", "a:update",
                "b:update", "a:late", "b:late"
            ]
        );
    }

    #[test]
    fn disabled_subtree_is_skipped_until_reenabled() {
        let log: Log = Rc::default();
        let mut scene = Scene::new("test");
        let a = scene.spawn("a", None).unwrap();
        let b = scene.spawn("b", Some(a)).unwrap();
        scene
            .add_script(b, Box::new(Recorder { tag: "b", log: log.clone() }))
            .unwrap();
        scene.awake();
        log.borrow_mut().clear();

        scene.set_enabled(a, false).unwrap();
        scene.update(0.016);
        assert!(log.borrow().is_empty());

        scene.set_enabled(a, true).unwrap();
        scene.update(0.016);
        assert_eq!(*log.borrow(), ["b:update", "b:late"]);
    }

    struct Mover;

    impl Script for Mover {
        fn update(&mut self, ctx: &mut ScriptContext<'_>) {
            let mut t = ctx.transform();
            t.position.x += ctx.delta;
            ctx.set_transform(t);
        }
    }

    #[test]
    fn scripts_move_their_object() {
        let mut scene = Scene::new("test");
        let a = scene.spawn("a", None).unwrap();
        scene.add_script(a, Box::new(Mover)).unwrap();
        scene.awake();
        scene.update(0.5);
        scene.update(0.5);
        assert_eq!(scene.components().get_transform(a).unwrap().position.x, 1.0);
    }

    #[test]
    fn draw_top_culls_by_layer() {
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new("test");
        let cam = scene.spawn("camera", None).unwrap();
        scene.attach_camera(cam, &mono_config(), &mut gpu).unwrap();
        scene.set_main_top(cam).unwrap();

        let visible = scene.spawn("visible", None).unwrap();
        let hidden = scene.spawn("hidden", None).unwrap();
        let disabled = scene.spawn("disabled", None).unwrap();
        for id in [visible, hidden, disabled] {
            scene
                .components_mut()
                .attach_mesh_renderer(id, triangle_renderer());
        }
        scene.set_layer(visible, 0b01).unwrap();
        scene.set_layer(hidden, 0b10).unwrap();
        scene.set_enabled(disabled, false).unwrap();
        let camera = scene.camera_mut(cam).unwrap();
        camera.set_culling_mask(0b01);
        for id in [visible, hidden, disabled] {
            camera.add_object(id);
        }

        let report = scene.draw_top(&mut gpu).unwrap();
        assert_eq!(report.passes, 1);
        assert_eq!(report.draws, 1);
        assert_eq!(gpu.draw_count(), 1);
    }

    #[test]
    fn children_of_disabled_parents_are_not_drawn() {
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new("test");
        let cam = scene.spawn("camera", None).unwrap();
        scene.attach_camera(cam, &mono_config(), &mut gpu).unwrap();
        scene.set_main_top(cam).unwrap();

        let parent = scene.spawn("parent", None).unwrap();
        let child = scene.spawn("child", Some(parent)).unwrap();
        scene
            .components_mut()
            .attach_mesh_renderer(child, triangle_renderer());
        scene.camera_mut(cam).unwrap().add_object(child);
        scene.awake();

        assert_eq!(scene.draw_top(&mut gpu).unwrap().draws, 1);

        scene.set_enabled(parent, false).unwrap();
        assert!(!scene.active_in_hierarchy(child));
        assert!(scene.get(child).unwrap().enabled());
        assert_eq!(scene.draw_top(&mut gpu).unwrap().draws, 0);

        scene.set_enabled(parent, true).unwrap();
        assert_eq!(scene.draw_top(&mut gpu).unwrap().draws, 1);
    }

    #[test]
    fn camera_under_disabled_parent_does_not_draw() {
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new("test");
        let rig = scene.spawn("rig", None).unwrap();
        let cam = scene.spawn("camera", Some(rig)).unwrap();
        scene.attach_camera(cam, &mono_config(), &mut gpu).unwrap();
        scene.set_main_top(cam).unwrap();
        assert!(scene.draw_top(&mut gpu).is_some());

        scene.set_enabled(rig, false).unwrap();
        assert!(scene.draw_top(&mut gpu).is_none());
    }

    #[test]
    fn draw_without_main_camera_is_none() {
        let mut gpu = RecordingGpu::new();
        let scene = Scene::new("test");
        assert!(scene.draw_top(&mut gpu).is_none());
        assert!(scene.draw_bottom(&mut gpu).is_none());
        assert!(gpu.commands().is_empty());
    }

    #[test]
    fn main_camera_requires_a_camera() {
        let mut scene = Scene::new("test");
        let a = scene.spawn("a", None).unwrap();
        assert!(matches!(scene.set_main_top(a), Err(SceneError::NoCamera(_))));
        assert!(matches!(scene.set_main_bottom(a), Err(SceneError::NoCamera(_))));
    }

    #[test]
    fn shutdown_frees_every_target() {
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new("test");
        for name in ["top", "bottom"] {
            let id = scene.spawn(name, None).unwrap();
            scene
                .attach_camera(id, &CameraConfig::default(), &mut gpu)
                .unwrap();
        }
        assert_eq!(gpu.live_targets(), 4);
        let assets = AssetLibrary::new("unused");
        assert_eq!(scene.shutdown(&assets, &mut gpu), 0);
        assert_eq!(gpu.live_targets(), 0);
    }

    fn write_lit_model(dir: &Path, file: &str, texture: &str) -> std::path::PathBuf {
        std::fs::write(dir.join(format!("{texture}.t3x")), b"T3X").unwrap();
        std::fs::write(
            dir.join(format!("{texture}.slmtl")),
            encode_fragmentlit_material(texture, glam::Vec4::ONE, glam::Vec4::ZERO),
        )
        .unwrap();
        let path = dir.join(file);
        std::fs::write(
            &path,
            encode_model(&ModelDescriptor {
                material_ref: texture.into(),
                mesh: Mesh::from_vertices(0, &demo_triangle(), 1.0),
            })
            .unwrap(),
        )
        .unwrap();
        path
    }

    #[test]
    fn replaced_and_shut_down_models_free_their_textures() {
        let dir = tempfile::tempdir().unwrap();
        let stone = write_lit_model(dir.path(), "stone.slmdl", "stone");
        let moss = write_lit_model(dir.path(), "moss.slmdl", "moss");
        let assets = AssetLibrary::new(dir.path());
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new("test");
        let obj = scene.spawn("rock", None).unwrap();

        scene.add_model(&stone, obj, &assets, &mut gpu).unwrap();
        assert_eq!(gpu.live_textures(), 1);
        scene.add_model(&moss, obj, &assets, &mut gpu).unwrap();
        assert_eq!(gpu.live_textures(), 1);
        assert!(!assets.textures.contains("stone"));
        assert!(assets.textures.contains("moss"));

        assert_eq!(scene.shutdown(&assets, &mut gpu), 1);
        assert_eq!(gpu.live_textures(), 0);
    }

    #[test]
    fn reattaching_a_camera_frees_the_old_targets() {
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new("test");
        let cam = scene.spawn("camera", None).unwrap();
        scene
            .attach_camera(cam, &CameraConfig::default(), &mut gpu)
            .unwrap();
        assert_eq!(gpu.live_targets(), 2);
        scene.attach_camera(cam, &mono_config(), &mut gpu).unwrap();
        assert_eq!(gpu.live_targets(), 1);
    }

    fn write_model(dir: &Path, file: &str) -> std::path::PathBuf {
        std::fs::write(
            dir.join("flat.slmtl"),
            encode_unlit_material(Rgba::WHITE),
        )
        .unwrap();
        let path = dir.join(file);
        std::fs::write(
            &path,
            encode_model(&ModelDescriptor {
                material_ref: "flat".into(),
                mesh: Mesh::from_vertices(0, &demo_triangle(), 1.0),
            })
            .unwrap(),
        )
        .unwrap();
        path
    }

    #[test]
    fn add_model_attaches_a_renderer() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(dir.path(), "tri.slmdl");
        let assets = AssetLibrary::new(dir.path());
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new("test");
        let obj = scene.spawn("tri", None).unwrap();

        scene.add_model(&path, obj, &assets, &mut gpu).unwrap();
        let renderer = scene.components().get_mesh_renderer(obj).unwrap();
        assert_eq!(renderer.mesh().vertex_count(), 3);
        assert_eq!(renderer.material().map(|m| m.kind()), Some("unlit"));

        scene.add_model(&path, obj, &assets, &mut gpu).unwrap();
        assert_eq!(scene.components().mesh_renderers().len(), 1);
    }

    #[test]
    fn failed_load_leaves_the_object_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(dir.path(), "tri.slmdl");
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[..3].copy_from_slice(b"xyz");
        let broken = dir.path().join("broken.slmdl");
        std::fs::write(&broken, bytes).unwrap();

        let assets = AssetLibrary::new(dir.path());
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new("test");
        let obj = scene.spawn("tri", None).unwrap();
        scene.components_mut().drain_events();

        let err = scene.add_model(&broken, obj, &assets, &mut gpu).unwrap_err();
        assert!(matches!(
            err,
            SceneError::Load {
                source: slate_assets::LoadError::BadMagic { .. },
                ..
            }
        ));
        assert!(scene.components().get_mesh_renderer(obj).is_none());
        assert!(scene.components().events().is_empty());

        // An earlier successful load also survives a later failure.
        scene.add_model(&path, obj, &assets, &mut gpu).unwrap();
        assert!(scene.add_model(&broken, obj, &assets, &mut gpu).is_err());
        assert!(scene.components().get_mesh_renderer(obj).is_some());
    }

    #[test]
    fn add_model_to_unknown_object_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(dir.path(), "tri.slmdl");
        let assets = AssetLibrary::new(dir.path());
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new("test");
        assert!(matches!(
            scene.add_model(&path, ObjectId::new(), &assets, &mut gpu),
            Err(SceneError::UnknownObject(_))
        ));
    }
}
