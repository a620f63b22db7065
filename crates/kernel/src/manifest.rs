//! YAML scene manifests.
//!
//! ```yaml
//! name: demo
//! camera:
//!   name: Main Camera
//!   transform: { position: [0.0, 0.0, -3.0] }
//!   config: { stereo: true, fov_y: 60.0 }
//! objects:
//!   - name: triangle
//!     model: triangle.slmdl
//!     spin: 1.5
//! ```
//!
//! Model paths are relative to the manifest file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use slate_assets::AssetLibrary;
use slate_common::{LAYER_DEFAULT, Transform};
use slate_render::{CameraConfig, Gpu, RenderMode};

use crate::error::ManifestError;
use crate::scene::Scene;
use crate::script::Spin;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneManifest {
    pub name: String,
    pub camera: CameraEntry,
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraEntry {
    #[serde(default = "default_camera_name")]
    pub name: String,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub config: CameraConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    #[serde(default = "default_layer")]
    pub layer: u16,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Y-axis spin in radians per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spin: Option<f32>,
}

fn default_camera_name() -> String {
    "Main Camera".into()
}

fn default_layer() -> u16 {
    LAYER_DEFAULT
}

impl SceneManifest {
    pub fn from_yaml(text: &str) -> Result<Self, ManifestError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }
}

impl Scene {
    /// Read a manifest and build its scene.
    pub fn from_manifest(
        path: &Path,
        assets: &AssetLibrary,
        gpu: &mut dyn Gpu,
    ) -> Result<Scene, ManifestError> {
        let manifest = SceneManifest::load(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Scene::build(&manifest, base, assets, gpu)
    }

    /// Build a scene from a parsed manifest, resolving model paths under `base`.
    ///
    /// The camera becomes the main camera for its screen, and every
    /// model-bearing object is registered with it in manifest order.
    pub fn build(
        manifest: &SceneManifest,
        base: &Path,
        assets: &AssetLibrary,
        gpu: &mut dyn Gpu,
    ) -> Result<Scene, ManifestError> {
        let _span = tracing::info_span!("build_scene", scene = %manifest.name).entered();
        let mut scene = Scene::new(manifest.name.clone());

        let camera = scene.spawn(manifest.camera.name.clone(), None)?;
        scene.set_transform(camera, manifest.camera.transform)?;
        scene.attach_camera(camera, &manifest.camera.config, gpu)?;
        match manifest.camera.config.mode {
            RenderMode::BottomScreen => scene.set_main_bottom(camera)?,
            _ => scene.set_main_top(camera)?,
        }

        for entry in &manifest.objects {
            let id = scene.spawn(entry.name.clone(), None)?;
            scene.set_layer(id, entry.layer)?;
            scene.set_transform(id, entry.transform)?;
            if let Some(speed) = entry.spin {
                scene.add_script(id, Box::new(Spin { speed }))?;
            }
            let Some(model) = &entry.model else {
                continue;
            };
            scene.add_model(&base.join(model), id, assets, gpu)?;
            if let Some(camera) = scene.camera_mut(camera) {
                camera.add_object(id);
            }
        }

        tracing::info!(
            objects = scene.object_count(),
            models = scene.components().mesh_renderers().len(),
            "scene built"
        );
        Ok(scene)
    }
}
