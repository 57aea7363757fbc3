//! # Engine Assets
//!
//! Asset loading and resource pooling for the rendering engine.
//!
//! ## Features
//!
//! - **MSDF Fonts**: Parses msdf-atlas-gen JSON atlases into shared glyph atlases
//! - **GLB Models**: Decodes binary glTF meshes into vertex/index streams and albedo textures
//! - **Resource Pools**: Thread-safe texture, mesh, font and material registries
//! - **Descriptor Bindings**: Lazily created per-material GPU binding handles
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use engine_assets::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AssetConfig::default();
//!     let assets = AssetManager::new(&config);
//!
//!     assets.fonts().load_all_recursively();
//!     let font = assets.fonts().get_font_info("Roboto")?;
//!     let layout = TextLayout::new(font);
//!     let quads = layout.layout_line("Hello", 32.0);
//!
//!     let ship = assets.load_model("ship.glb")?;
//!     println!("{} glyph quads, {} ship materials", quads.len(), ship.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::cast_precision_loss)]

pub mod config;
pub mod foundation;
pub mod assets;
pub mod text;
pub mod materials;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{
            AssetError, AssetManager, AssetResult, ImageData, Mesh, MeshPool, MeshRegistry,
            Texture, TextureLoader, TexturePool, TextureSource, Vertex,
        },
        config::{AssetConfig, Config, ConfigError},
        materials::{
            CompositeMaterial, DescriptorAllocator, DescriptorBinding, MaterialData,
            MaterialRegistry,
        },
        text::{FontRegistry, Glyph, GlyphAtlas, GlyphQuad, TextLayout, YOrigin},
    };
}
