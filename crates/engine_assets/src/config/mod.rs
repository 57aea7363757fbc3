//! Configuration system

use std::path::{Path, PathBuf};

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// # Asset Configuration
///
/// Where fonts and models live on disk and which files count as atlas images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Root directory scanned for MSDF font directories
    pub fonts_root: PathBuf,
    /// Directories tried, in order, when resolving a relative model path
    pub model_search_paths: Vec<PathBuf>,
    /// File extensions (lowercase, no dot) accepted as font atlas images
    pub image_extensions: Vec<String>,
    /// Default log filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl AssetConfig {
    /// Create a configuration rooted at the given fonts directory
    pub fn new(fonts_root: impl Into<PathBuf>) -> Self {
        Self {
            fonts_root: fonts_root.into(),
            ..Self::default()
        }
    }

    /// Add a model search path
    #[must_use]
    pub fn with_model_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_search_paths.push(path.into());
        self
    }

    /// Set the log level
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Whether `path` has one of the configured image extensions
    pub fn is_image_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.image_extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
    }

    /// Resolve a model path against the search paths
    ///
    /// Each search path is tried in order; if none contains the file the
    /// path is returned as given.
    pub fn resolve_model_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            return path.to_path_buf();
        }

        self.model_search_paths
            .iter()
            .map(|search_path| search_path.join(path))
            .find(|candidate| candidate.exists())
            .unwrap_or_else(|| path.to_path_buf())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.fonts_root.as_os_str().is_empty() {
            return Err("Fonts root cannot be empty".to_string());
        }

        if self.image_extensions.is_empty() {
            return Err("At least one image extension is required".to_string());
        }

        if self.image_extensions.iter().any(|ext| ext.starts_with('.')) {
            return Err("Image extensions must not include the leading dot".to_string());
        }

        Ok(())
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            fonts_root: PathBuf::from("resources/fonts"),
            model_search_paths: vec![PathBuf::from("resources/models")],
            image_extensions: ["png", "jpg", "jpeg", "bmp", "tga"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            log_level: "info".to_string(),
        }
    }
}

impl Config for AssetConfig {}
