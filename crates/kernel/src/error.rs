use std::path::PathBuf;

use slate_assets::LoadError;
use slate_common::ObjectId;

/// Errors from scene graph operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("no object {0:?} in the scene")]
    UnknownObject(ObjectId),
    #[error("the root object cannot be moved or removed")]
    RootObject,
    #[error("cannot parent {object:?} under its own descendant {parent:?}")]
    Cycle { object: ObjectId, parent: ObjectId },
    #[error("object {0:?} has no camera")]
    NoCamera(ObjectId),
    #[error("failed to load model {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: LoadError,
    },
}

/// Errors from reading and instantiating a scene manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Scene(#[from] SceneError),
}
