//! Shared texture cache.
//!
//! Textures are keyed by base name and shared through [`TextureHandle`]s.
//! When the last handle goes away the cache entry disappears and the GPU
//! texture is queued; [`TextureCache::collect`] deletes queued textures on
//! the GPU, each exactly once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use slate_render::{Filter, Gpu, TextureId, TextureParams, Wrap};

use crate::error::TextureError;

/// Loaded when a texture file cannot be opened.
pub const FALLBACK_TEXTURE: &str = "kitten";

/// Substituted for an empty texture name.
pub const BLANK_TEXTURE: &str = "blank";

pub const TEXTURE_EXTENSION: &str = "t3x";
pub const TEXTURE_CONFIG_EXTENSION: &str = "t3xcfg";

/// Per-texture sampling options from the optional one-byte sibling file.
///
/// Bit layout, least significant first: vram (1), mag filter (1),
/// min filter (1), wrap S (2), wrap T (2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureConfig {
    pub vram: bool,
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub wrap_s: Wrap,
    pub wrap_t: Wrap,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            vram: false,
            mag_filter: Filter::Linear,
            min_filter: Filter::Nearest,
            wrap_s: Wrap::Repeat,
            wrap_t: Wrap::Repeat,
        }
    }
}

impl TextureConfig {
    pub fn from_byte(b: u8) -> Self {
        Self {
            vram: b & 1 != 0,
            mag_filter: Filter::from_bit(b >> 1),
            min_filter: Filter::from_bit(b >> 2),
            wrap_s: Wrap::from_bits(b >> 3),
            wrap_t: Wrap::from_bits(b >> 5),
        }
    }

    pub fn to_byte(self) -> u8 {
        let filter = |f: Filter| u8::from(f == Filter::Linear);
        let wrap = |w: Wrap| match w {
            Wrap::ClampToEdge => 0,
            Wrap::ClampToBorder => 1,
            Wrap::Repeat => 2,
            Wrap::MirroredRepeat => 3,
        };
        u8::from(self.vram)
            | filter(self.mag_filter) << 1
            | filter(self.min_filter) << 2
            | wrap(self.wrap_s) << 3
            | wrap(self.wrap_t) << 5
    }

    pub fn params(self) -> TextureParams {
        TextureParams {
            mag_filter: self.mag_filter,
            min_filter: self.min_filter,
            wrap_s: self.wrap_s,
            wrap_t: self.wrap_t,
        }
    }
}

#[derive(Default)]
struct Registry {
    loaded: HashMap<String, Weak<Texture>>,
    released: Vec<TextureId>,
}

/// A decoded GPU texture shared by every material that uses it.
#[derive(Debug)]
pub struct Texture {
    name: String,
    gpu: TextureId,
    config: TextureConfig,
    registry: Weak<Mutex<Registry>>,
}

impl Texture {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gpu_id(&self) -> TextureId {
        self.gpu
    }

    pub fn config(&self) -> TextureConfig {
        self.config
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut reg = registry.lock().unwrap_or_else(PoisonError::into_inner);
        // A newer texture may already be registered under the same name.
        if reg
            .loaded
            .get(&self.name)
            .is_some_and(|w| w.strong_count() == 0)
        {
            reg.loaded.remove(&self.name);
        }
        reg.released.push(self.gpu);
    }
}

pub type TextureHandle = Arc<Texture>;

/// Name-keyed cache of shared GPU textures rooted at one directory.
#[derive(Clone)]
pub struct TextureCache {
    root: PathBuf,
    registry: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for TextureCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureCache")
            .field("root", &self.root)
            .field("loaded", &self.len())
            .finish()
    }
}

impl TextureCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            registry: Arc::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a shared handle to `name`, decoding it on first use.
    ///
    /// A missing `<name>.t3x` silently falls back to the kitten texture;
    /// only a missing fallback or a failed decode is an error. The cache
    /// entry is registered only after the decode succeeded.
    pub fn load(&self, name: &str, gpu: &mut dyn Gpu) -> Result<TextureHandle, TextureError> {
        let name = if name.is_empty() { BLANK_TEXTURE } else { name };
        let mut reg = self.lock();
        if let Some(texture) = reg.loaded.get(name).and_then(Weak::upgrade) {
            return Ok(texture);
        }

        let data = match std::fs::read(self.path_for(name, TEXTURE_EXTENSION)) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(name, error = %e, "texture missing, using fallback");
                std::fs::read(self.path_for(FALLBACK_TEXTURE, TEXTURE_EXTENSION)).map_err(
                    |_| TextureError::NotFound {
                        name: name.to_string(),
                    },
                )?
            }
        };

        let config = std::fs::read(self.path_for(name, TEXTURE_CONFIG_EXTENSION))
            .ok()
            .and_then(|bytes| bytes.first().copied())
            .map(TextureConfig::from_byte)
            .unwrap_or_default();

        let Some(id) = gpu.import_texture(&data, config.vram) else {
            tracing::warn!(name, "texture decode failed");
            return Err(TextureError::Decode {
                name: name.to_string(),
            });
        };
        gpu.set_texture_params(id, config.params());

        let texture = Arc::new(Texture {
            name: name.to_string(),
            gpu: id,
            config,
            registry: Arc::downgrade(&self.registry),
        });
        reg.loaded
            .insert(name.to_string(), Arc::downgrade(&texture));
        tracing::debug!(name, id = id.0, "texture loaded");
        Ok(texture)
    }

    /// Whether `name` is currently loaded and referenced.
    pub fn contains(&self, name: &str) -> bool {
        self.lock()
            .loaded
            .get(name)
            .is_some_and(|w| w.strong_count() > 0)
    }

    /// Number of live cached textures.
    pub fn len(&self) -> usize {
        self.lock()
            .loaded
            .values()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delete GPU textures whose last handle was dropped. Returns how many
    /// were deleted.
    pub fn collect(&self, gpu: &mut dyn Gpu) -> usize {
        let released = std::mem::take(&mut self.lock().released);
        for id in &released {
            gpu.delete_texture(*id);
            tracing::debug!(id = id.0, "texture deleted");
        }
        released.len()
    }

    fn path_for(&self, name: &str, extension: &str) -> PathBuf {
        self.root.join(format!("{name}.{extension}"))
    }
}
