//! Asset manager
//!
//! Builds the texture and mesh pools once and hands them to the font and
//! material registries. Applications own one `AssetManager` and pass it (or
//! the registries) to whatever needs assets.

use std::path::Path;
use std::sync::Arc;

use crate::assets::{AssetResult, MeshPool, TexturePool};
use crate::config::AssetConfig;
use crate::materials::{CompositeMaterial, MaterialRegistry};
use crate::text::FontRegistry;

/// Owns every asset pool and registry
pub struct AssetManager {
    config: AssetConfig,
    textures: Arc<TexturePool>,
    meshes: Arc<MeshPool>,
    fonts: FontRegistry,
    materials: MaterialRegistry,
}

impl AssetManager {
    /// Create empty pools and registries for a configuration
    pub fn new(config: &AssetConfig) -> Self {
        let textures = Arc::new(TexturePool::new());
        let meshes = Arc::new(MeshPool::new());

        Self {
            config: config.clone(),
            fonts: FontRegistry::new(config, textures.clone()),
            materials: MaterialRegistry::new(textures.clone(), meshes.clone()),
            textures,
            meshes,
        }
    }

    /// Configuration the manager was built from
    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// Font registry
    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    /// Material registry
    pub fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    /// Shared texture pool
    pub fn textures(&self) -> &Arc<TexturePool> {
        &self.textures
    }

    /// Shared mesh pool
    pub fn meshes(&self) -> &Arc<MeshPool> {
        &self.meshes
    }

    /// Resolve a model path against the search paths and load it as a
    /// composite material
    ///
    /// An already loaded model is returned from the registry without
    /// decoding it again.
    pub fn load_model(&self, path: impl AsRef<Path>) -> AssetResult<CompositeMaterial> {
        let resolved = self.config.resolve_model_path(path);
        if let Ok(composite) = self.materials.get_composite_material_data(&resolved) {
            return Ok(composite);
        }
        self.materials.load_and_register_composite_material_from_glb(&resolved)
    }

    /// Release every cached asset held by the registries and pools
    pub fn flush(&self) {
        self.fonts.flush();
        self.materials.flush();
        self.meshes.flush();
        self.textures.flush();
        log::info!("Flushed all asset caches");
    }
}
