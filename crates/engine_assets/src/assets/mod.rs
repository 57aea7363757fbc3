//! Asset management system
//!
//! Texture and mesh pools, GLB model decoding and the [`AssetManager`]
//! composition root that wires the font and material registries to them.

pub mod image_loader;
pub mod texture;
pub mod mesh;
pub mod glb_loader;
pub mod manager;

#[cfg(test)]
pub(crate) mod test_glb;

pub use image_loader::ImageData;
pub use texture::{Texture, TextureLoader, TexturePool, TextureSource};
pub use mesh::{Mesh, MeshPool, MeshRegistry, Vertex};
pub use glb_loader::{DecodedPrimitive, GlbLoader};
pub use manager::AssetManager;

use std::path::PathBuf;
use thiserror::Error;

/// Result type for asset operations
pub type AssetResult<T> = Result<T, AssetError>;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Nothing is registered under the requested name or path
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Malformed source data (description document, accessor layout, ...)
    #[error("Invalid format: {0}")]
    Format(String),

    /// A texture or other dependent resource failed to load or decode
    #[error("Resource error: {0}")]
    Resource(String),

    /// A model container failed to parse
    #[error("Failed to load {path:?}: {message}")]
    Load {
        /// Path of the container
        path: PathBuf,
        /// Message reported by the underlying parser
        message: String,
    },

    /// IO error during asset loading
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
