//! MSDF text support
//!
//! Font directories produced by msdf-atlas-gen are parsed into
//! [`GlyphAtlas`] values, registered by name in a [`FontRegistry`] and laid
//! out with [`TextLayout`].

pub mod glyph_atlas;
pub mod msdf_parser;
pub mod font_registry;
pub mod layout;

pub use glyph_atlas::{
    kerning_key, unpack_kerning_key, AtlasParams, Bounds, FontMetrics, Glyph, GlyphAtlas, YOrigin,
};
pub use msdf_parser::{find_font_source, parse_font_directory, populate_from_json, FontSource};
pub use font_registry::FontRegistry;
pub use layout::{GlyphQuad, TextBounds, TextLayout};
