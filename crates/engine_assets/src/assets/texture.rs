//! Texture pool
//!
//! CPU-side texture storage shared by the font and material registries.
//! The GPU upload happens behind the [`TextureLoader`] seam; [`TexturePool`]
//! decodes images into RGBA8 and keeps them by path or by name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::assets::{AssetResult, ImageData};

/// Where a texture's pixels came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSource {
    /// Loaded from an image file on disk
    File(PathBuf),
    /// Decoded in-process from bytes embedded in another asset
    Embedded,
}

/// A decoded 2D texture
#[derive(Debug)]
pub struct Texture {
    name: String,
    image: ImageData,
    source: TextureSource,
}

impl Texture {
    /// Create a texture from decoded image data
    pub fn new(name: impl Into<String>, image: ImageData, source: TextureSource) -> Self {
        Self {
            name: name.into(),
            image,
            source,
        }
    }

    /// Load a texture from an image file
    pub fn from_file(path: &Path) -> AssetResult<Self> {
        let image = ImageData::from_file(path)?;
        Ok(Self::new(
            path.to_string_lossy(),
            image,
            TextureSource::File(path.to_path_buf()),
        ))
    }

    /// Texture name (file path or the name it was stored under)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.image.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.image.height
    }

    /// RGBA8 pixel data
    pub fn pixels(&self) -> &[u8] {
        &self.image.data
    }

    /// Where the pixels came from
    pub fn source(&self) -> &TextureSource {
        &self.source
    }

    /// Whether this texture was decoded locally rather than loaded from a file
    pub fn is_embedded(&self) -> bool {
        self.source == TextureSource::Embedded
    }
}

/// Texture loading collaborator used by the font and material registries
pub trait TextureLoader: Send + Sync {
    /// Load a texture from `path`, replacing any cached copy
    fn load_texture(&self, path: &Path) -> AssetResult<Arc<Texture>>;

    /// Return the cached texture for `path`, loading it on first use
    fn get_texture_2d_lazy(&self, path: &Path) -> AssetResult<Arc<Texture>>;

    /// Store an externally created texture under `name`
    fn store_texture_manually(&self, texture: Arc<Texture>, name: &str);

    /// Look up a texture by path or stored name
    fn get_texture(&self, name: &str) -> Option<Arc<Texture>>;
}

/// Thread-safe texture cache keyed by path or manual name
///
/// Decoding always happens outside the lock; the lock only guards map
/// operations.
#[derive(Default)]
pub struct TexturePool {
    textures: Mutex<HashMap<String, Arc<Texture>>>,
}

impl TexturePool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached textures
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the pool's references to every texture
    pub fn flush(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Texture>>> {
        self.textures.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn key(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }
}

impl TextureLoader for TexturePool {
    fn load_texture(&self, path: &Path) -> AssetResult<Arc<Texture>> {
        let texture = Arc::new(Texture::from_file(path)?);
        self.lock().insert(Self::key(path), Arc::clone(&texture));
        log::info!("Loaded texture {:?} ({}x{})", path, texture.width(), texture.height());
        Ok(texture)
    }

    fn get_texture_2d_lazy(&self, path: &Path) -> AssetResult<Arc<Texture>> {
        let key = Self::key(path);
        if let Some(texture) = self.lock().get(&key) {
            return Ok(Arc::clone(texture));
        }

        let loaded = Arc::new(Texture::from_file(path)?);

        // Another caller may have loaded the same path meanwhile; keep theirs.
        let mut textures = self.lock();
        let texture = textures.entry(key).or_insert(loaded);
        Ok(Arc::clone(texture))
    }

    fn store_texture_manually(&self, texture: Arc<Texture>, name: &str) {
        if self.lock().insert(name.to_string(), texture).is_some() {
            log::warn!("Texture '{}' was already stored; replaced", name);
        } else {
            log::debug!("Stored texture '{}'", name);
        }
    }

    fn get_texture(&self, name: &str) -> Option<Arc<Texture>> {
        self.lock().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn embedded(name: &str, image: ImageData) -> Arc<Texture> {
        Arc::new(Texture::new(name, image, TextureSource::Embedded))
    }

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        image::RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_lazy_load_caches_by_path() {
        let dir = TempDir::new().unwrap();
        let path = write_png(dir.path(), "brick.png", 2, 2);
        let pool = TexturePool::new();

        let first = pool.get_texture_2d_lazy(&path).unwrap();
        let second = pool.get_texture_2d_lazy(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(pool.len(), 1);
        assert_eq!(first.source(), &TextureSource::File(path.clone()));
        assert!(!first.is_embedded());
    }

    #[test]
    fn test_load_texture_replaces_cached_copy() {
        let dir = TempDir::new().unwrap();
        let path = write_png(dir.path(), "brick.png", 2, 2);
        let pool = TexturePool::new();

        let lazy = pool.get_texture_2d_lazy(&path).unwrap();
        let reloaded = pool.load_texture(&path).unwrap();

        assert!(!Arc::ptr_eq(&lazy, &reloaded));
        let cached = pool.get_texture(&path.to_string_lossy()).unwrap();
        assert!(Arc::ptr_eq(&cached, &reloaded));
    }

    #[test]
    fn test_missing_file_is_resource_error() {
        let pool = TexturePool::new();
        let result = pool.get_texture_2d_lazy(Path::new("does/not/exist.png"));
        assert!(matches!(result, Err(crate::assets::AssetError::Resource(_))));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_manual_store_last_write_wins() {
        let pool = TexturePool::new();
        let a = embedded("a", ImageData::solid_color(1, 1, [0; 4]));
        let b = embedded("b", ImageData::solid_color(1, 1, [0; 4]));

        pool.store_texture_manually(Arc::clone(&a), "model.glb 0");
        pool.store_texture_manually(Arc::clone(&b), "model.glb 0");

        let stored = pool.get_texture("model.glb 0").unwrap();
        assert!(Arc::ptr_eq(&stored, &b));
        assert!(stored.is_embedded());
    }

    #[test]
    fn test_flush_keeps_outstanding_references_alive() {
        let pool = TexturePool::new();
        let texture = embedded("t", ImageData::solid_color(2, 2, [1, 2, 3, 4]));
        pool.store_texture_manually(Arc::clone(&texture), "t");

        pool.flush();

        assert!(pool.get_texture("t").is_none());
        assert_eq!(texture.pixels()[0..4], [1, 2, 3, 4]);
    }
}
