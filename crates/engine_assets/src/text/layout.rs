//! Text layout over an MSDF glyph atlas
//!
//! Positions glyph quads along a single baseline. Quads are in the same
//! units as the requested font size, with kerning applied between
//! consecutive codepoints.

use std::sync::Arc;

use nalgebra::Vector2;

use super::glyph_atlas::{Bounds, GlyphAtlas};

/// A positioned glyph quad
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphQuad {
    /// Codepoint the quad draws
    pub codepoint: u32,
    /// Bottom-left corner
    pub min: Vector2<f32>,
    /// Top-right corner
    pub max: Vector2<f32>,
    /// Atlas texture coordinates (bottom-origin)
    pub uv: Bounds,
}

impl GlyphQuad {
    /// Quad width
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Quad height
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

/// Bounding box for laid out text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBounds {
    /// Minimum X coordinate
    pub min_x: f32,
    /// Minimum Y coordinate
    pub min_y: f32,
    /// Maximum X coordinate
    pub max_x: f32,
    /// Maximum Y coordinate
    pub max_y: f32,
}

impl TextBounds {
    /// Calculate width of bounding box
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Calculate height of bounding box
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Lays out strings using one font's glyph atlas
#[derive(Debug, Clone)]
pub struct TextLayout {
    atlas: Arc<GlyphAtlas>,
}

impl TextLayout {
    /// Create a layout engine for a font
    pub fn new(atlas: Arc<GlyphAtlas>) -> Self {
        Self { atlas }
    }

    /// Get the atlas used by this layout engine
    pub fn atlas(&self) -> &Arc<GlyphAtlas> {
        &self.atlas
    }

    /// Position quads for a single line of text
    ///
    /// # Layout Coordinate System
    ///
    /// - Origin (0, 0) is the pen position on the baseline of the first character
    /// - +X axis points right
    /// - +Y axis points up
    ///
    /// Characters missing from the atlas advance the pen by the font's
    /// space advance and emit no quad. Invisible glyphs (space) advance
    /// without a quad.
    pub fn layout_line(&self, text: &str, font_size: f32) -> Vec<GlyphQuad> {
        let mut quads = Vec::with_capacity(text.len());
        self.walk(text, font_size, |quad| quads.push(quad));
        quads
    }

    /// Pen advance of a line of text at the given size
    pub fn measure(&self, text: &str, font_size: f32) -> f32 {
        self.walk(text, font_size, |_| {})
    }

    /// Bounding box of a line's quads, always including the origin
    pub fn bounds(&self, text: &str, font_size: f32) -> TextBounds {
        let mut bounds = TextBounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
        };

        self.walk(text, font_size, |quad| {
            bounds.min_x = bounds.min_x.min(quad.min.x);
            bounds.min_y = bounds.min_y.min(quad.min.y);
            bounds.max_x = bounds.max_x.max(quad.max.x);
            bounds.max_y = bounds.max_y.max(quad.max.y);
        });

        bounds
    }

    /// Walk the line, emitting each visible quad; returns the final pen x
    fn walk(&self, text: &str, font_size: f32, mut emit: impl FnMut(GlyphQuad)) -> f32 {
        let mut cursor_x = 0.0f32;
        let mut previous: Option<u32> = None;

        for ch in text.chars() {
            let codepoint = u32::from(ch);

            let Some(glyph) = self.atlas.get_glyph(codepoint) else {
                cursor_x += self.atlas.space_advance() * font_size;
                previous = None;
                continue;
            };

            if let Some(left) = previous {
                cursor_x += self.atlas.get_kerning(left, codepoint) * font_size;
            }

            if glyph.is_visible() {
                let plane = glyph.plane_bounds;
                emit(GlyphQuad {
                    codepoint,
                    min: Vector2::new(cursor_x + plane.left * font_size, plane.bottom * font_size),
                    max: Vector2::new(cursor_x + plane.right * font_size, plane.top * font_size),
                    uv: glyph.uv,
                });
            }

            cursor_x += glyph.advance * font_size;
            previous = Some(codepoint);
        }

        cursor_x
    }
}
