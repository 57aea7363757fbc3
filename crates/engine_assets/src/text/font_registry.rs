//! Named font registry
//!
//! Scans the configured fonts root for MSDF font directories and keeps the
//! parsed atlases by name. Parsing runs without holding the registry lock;
//! a font becomes visible only once it is complete.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::glyph_atlas::GlyphAtlas;
use super::msdf_parser::parse_font_directory;
use crate::assets::{AssetError, AssetResult, TextureLoader};
use crate::config::AssetConfig;

/// Fonts by name, loaded from a directory tree
pub struct FontRegistry {
    config: AssetConfig,
    textures: Arc<dyn TextureLoader>,
    fonts: Mutex<HashMap<String, Arc<GlyphAtlas>>>,
}

impl FontRegistry {
    /// Create an empty registry; atlas images load through `textures`
    pub fn new(config: &AssetConfig, textures: Arc<dyn TextureLoader>) -> Self {
        Self {
            config: config.clone(),
            textures,
            fonts: Mutex::new(HashMap::new()),
        }
    }

    /// Directory scanned by [`Self::load_all_recursively`]
    pub fn fonts_root(&self) -> &Path {
        &self.config.fonts_root
    }

    /// Load every font directory under the fonts root
    ///
    /// The root itself and every nested directory are candidates. A
    /// directory that fails to parse is logged and skipped; the others
    /// still load. A missing root loads nothing. Fonts already registered
    /// under the same name are replaced. Returns the number of fonts
    /// loaded by this call.
    pub fn load_all_recursively(&self) -> usize {
        let root = &self.config.fonts_root;
        if !root.is_dir() {
            log::warn!("Fonts root {:?} is not a directory; no fonts loaded", root);
            return 0;
        }

        let mut loaded = 0;
        for dir in collect_directories(root) {
            match parse_font_directory(&dir, &self.config, self.textures.as_ref()) {
                Ok(Some(atlas)) => {
                    let name = atlas.name().to_string();
                    if self.lock().insert(name.clone(), Arc::new(atlas)).is_some() {
                        log::warn!(
                            "Font '{}' from {:?} replaced an earlier font of the same name",
                            name,
                            dir
                        );
                    }
                    loaded += 1;
                }
                Ok(None) => log::trace!("Skipping {:?}: no font description", dir),
                Err(e) => log::error!("Failed to load font directory {:?}: {}", dir, e),
            }
        }

        log::info!("Loaded {} fonts from {:?}", loaded, root);
        loaded
    }

    /// Look up a font by name
    pub fn get_font_info(&self, name: &str) -> AssetResult<Arc<GlyphAtlas>> {
        self.lock()
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(format!("font '{name}'")))
    }

    /// Whether a font is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Names of all registered fonts, sorted
    pub fn font_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered fonts
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no fonts are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every font; atlases already handed out stay alive
    pub fn flush(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<GlyphAtlas>>> {
        self.fonts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `root` followed by every directory below it, depth first
fn collect_directories(root: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        match std::fs::read_dir(&dir) {
            Ok(entries) => {
                let mut children: Vec<PathBuf> = entries
                    .filter_map(Result::ok)
                    .map(|entry| entry.path())
                    .filter(|path| path.is_dir())
                    .collect();
                children.sort_by(|a, b| b.cmp(a));
                pending.extend(children);
            }
            Err(e) => log::warn!("Cannot read {:?}: {}", dir, e),
        }
        dirs.push(dir);
    }

    dirs
}
