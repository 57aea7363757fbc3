//! MSDF glyph atlas data model
//!
//! One [`GlyphAtlas`] per named font: the uploaded atlas texture, the
//! generator parameters the text shader needs, font-wide metrics, and the
//! glyph and kerning tables. Atlases are built once by the parser and
//! shared read-only through `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::Texture;

/// Advance used for missing glyphs when the atlas has no space or advances
const FALLBACK_SPACE_ADVANCE: f32 = 0.5;

/// Pack a kerning pair into a single map key
///
/// The left codepoint occupies the high 32 bits, the right one the low 32.
pub const fn kerning_key(left: u32, right: u32) -> u64 {
    ((left as u64) << 32) | right as u64
}

/// Split a key produced by [`kerning_key`] back into `(left, right)`
pub const fn unpack_kerning_key(key: u64) -> (u32, u32) {
    ((key >> 32) as u32, key as u32)
}

/// Which edge of the atlas image pixel rows are measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YOrigin {
    /// Row 0 is the bottom edge (msdf-atlas-gen default)
    #[default]
    Bottom,
    /// Row 0 is the top edge
    Top,
}

impl YOrigin {
    /// Parse the `yOrigin` field; anything other than `"top"` means bottom
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("top") => Self::Top,
            _ => Self::Bottom,
        }
    }
}

/// Axis-aligned rectangle given by its four edges
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Deserialize)]
pub struct Bounds {
    /// Left edge
    pub left: f32,
    /// Bottom edge
    pub bottom: f32,
    /// Right edge
    pub right: f32,
    /// Top edge
    pub top: f32,
}

impl Bounds {
    /// Create bounds from edges
    pub const fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self { left, bottom, right, top }
    }

    /// Horizontal extent
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Vertical extent
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Whether the rectangle covers no area
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Normalize an atlas pixel rectangle into bottom-origin UV space
    ///
    /// `u = px / width`. With a bottom origin `v = py / height`; with a top
    /// origin rows count downwards, so `v = 1 - py / height` and the top and
    /// bottom edges swap.
    pub fn to_uv(&self, atlas_width: f32, atlas_height: f32, origin: YOrigin) -> Self {
        let left = self.left / atlas_width;
        let right = self.right / atlas_width;
        match origin {
            YOrigin::Bottom => Self::new(
                left,
                self.bottom / atlas_height,
                right,
                self.top / atlas_height,
            ),
            YOrigin::Top => Self::new(
                left,
                1.0 - self.top / atlas_height,
                right,
                1.0 - self.bottom / atlas_height,
            ),
        }
    }
}

/// One glyph of an atlas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    /// Unicode scalar value
    pub codepoint: u32,
    /// Horizontal advance in em units
    pub advance: f32,
    /// Quad bounds relative to the pen position, in em units
    pub plane_bounds: Bounds,
    /// Glyph rectangle in atlas pixels
    pub atlas_bounds: Bounds,
    /// Glyph rectangle in normalized, bottom-origin texture coordinates
    pub uv: Bounds,
}

impl Glyph {
    /// Build a glyph, deriving its UV rectangle from the atlas rectangle
    pub fn new(
        codepoint: u32,
        advance: f32,
        plane_bounds: Bounds,
        atlas_bounds: Bounds,
        atlas_size: (f32, f32),
        origin: YOrigin,
    ) -> Self {
        Self {
            codepoint,
            advance,
            plane_bounds,
            atlas_bounds,
            uv: atlas_bounds.to_uv(atlas_size.0, atlas_size.1, origin),
        }
    }

    /// Whether the glyph has a visible quad (space and control glyphs do not)
    pub fn is_visible(&self) -> bool {
        !self.plane_bounds.is_empty() && !self.atlas_bounds.is_empty()
    }
}

/// Font-wide vertical metrics in em units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FontMetrics {
    /// Distance between consecutive baselines
    pub line_height: f32,
    /// Height above the baseline
    pub ascender: f32,
    /// Depth below the baseline (usually negative)
    pub descender: f32,
    /// Underline position relative to the baseline
    pub underline_y: f32,
    /// Underline stroke thickness
    pub underline_thickness: f32,
}

/// Atlas generator parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasParams {
    /// Atlas width in pixels
    pub width: f32,
    /// Atlas height in pixels
    pub height: f32,
    /// Glyph EM size the atlas was generated at, in pixels
    pub em_size: f32,
    /// Signed distance range in pixels, fed to the text shader
    pub distance_range: f32,
    /// Pixel row convention of the atlas bounds
    pub y_origin: YOrigin,
}

/// A parsed MSDF font: atlas texture, metrics, glyphs and kerning
#[derive(Debug)]
pub struct GlyphAtlas {
    name: String,
    texture: Arc<Texture>,
    params: AtlasParams,
    metrics: FontMetrics,
    glyphs: HashMap<u32, Glyph>,
    kerning: HashMap<u64, f32>,
    space_advance: f32,
}

impl GlyphAtlas {
    /// Assemble an atlas from parsed parts
    pub fn new(
        name: impl Into<String>,
        texture: Arc<Texture>,
        params: AtlasParams,
        metrics: FontMetrics,
        glyphs: HashMap<u32, Glyph>,
        kerning: HashMap<u64, f32>,
    ) -> Self {
        let space_advance = glyphs
            .get(&u32::from(' '))
            .map(|g| g.advance)
            .or_else(|| {
                let advances: Vec<f32> = glyphs
                    .values()
                    .map(|g| g.advance)
                    .filter(|a| a.is_finite() && *a > 0.0)
                    .collect();
                (!advances.is_empty()).then(|| advances.iter().sum::<f32>() / advances.len() as f32)
            })
            .unwrap_or(FALLBACK_SPACE_ADVANCE);

        Self {
            name: name.into(),
            texture,
            params,
            metrics,
            glyphs,
            kerning,
            space_advance,
        }
    }

    /// Font name (registry key)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared atlas texture
    pub fn texture(&self) -> &Arc<Texture> {
        &self.texture
    }

    /// Generator parameters
    pub fn params(&self) -> &AtlasParams {
        &self.params
    }

    /// Atlas dimensions in pixels
    pub fn atlas_dimensions(&self) -> (f32, f32) {
        (self.params.width, self.params.height)
    }

    /// EM size the atlas was generated at
    pub fn em_size(&self) -> f32 {
        self.params.em_size
    }

    /// MSDF distance range in pixels
    pub fn distance_range(&self) -> f32 {
        self.params.distance_range
    }

    /// Pixel row convention of the source atlas
    pub fn y_origin(&self) -> YOrigin {
        self.params.y_origin
    }

    /// Font-wide metrics
    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    /// Glyph for `codepoint`, or `None` if the atlas does not contain it
    pub fn get_glyph(&self, codepoint: u32) -> Option<&Glyph> {
        self.glyphs.get(&codepoint)
    }

    /// Glyph for a `char`
    pub fn glyph_for_char(&self, ch: char) -> Option<&Glyph> {
        self.get_glyph(u32::from(ch))
    }

    /// Kerning adjustment between `left` and `right`; zero when none is defined
    pub fn get_kerning(&self, left: u32, right: u32) -> f32 {
        self.kerning
            .get(&kerning_key(left, right))
            .copied()
            .unwrap_or(0.0)
    }

    /// Advance of `left` when followed by `right`, including kerning
    ///
    /// Returns `None` if `left` is not in the atlas.
    pub fn advance_with_kerning(&self, left: u32, right: u32) -> Option<f32> {
        self.get_glyph(left)
            .map(|g| g.advance + self.get_kerning(left, right))
    }

    /// Advance used for missing glyphs
    pub fn space_advance(&self) -> f32 {
        self.space_advance
    }

    /// Number of glyphs
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Iterate over all glyphs in arbitrary order
    pub fn glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.glyphs.values()
    }

    /// Iterate over `((left, right), adjustment)` kerning entries
    pub fn kerning_pairs(&self) -> impl Iterator<Item = ((u32, u32), f32)> + '_ {
        self.kerning
            .iter()
            .map(|(&key, &value)| (unpack_kerning_key(key), value))
    }
}
