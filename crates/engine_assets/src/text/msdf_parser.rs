//! msdf-atlas-gen font directory parser
//!
//! A font directory holds a JSON description (atlas parameters, metrics,
//! glyphs, kerning) and the atlas image it describes. Parsing builds a
//! complete [`GlyphAtlas`]; nothing partial is ever returned.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use super::glyph_atlas::{kerning_key, AtlasParams, Bounds, FontMetrics, Glyph, GlyphAtlas, YOrigin};
use crate::assets::{AssetError, AssetResult, TextureLoader};
use crate::config::AssetConfig;

/* ======================= msdf-atlas-gen JSON ======================= */

#[derive(Deserialize)]
struct MsdfDocument {
    atlas: MsdfAtlas,
    #[serde(default)]
    metrics: MsdfMetrics,
    #[serde(default)]
    glyphs: Vec<MsdfGlyph>,
    // Two shapes in the wild, interpreted by `parse_kerning`
    #[serde(default)]
    kerning: Value,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct MsdfAtlas {
    distance_range: f32,
    size: f32,
    width: f32,
    height: f32,
    y_origin: Option<String>, // "bottom" (default in msdf-atlas-gen) or "top"
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct MsdfMetrics {
    line_height: f32,
    ascender: f32,
    descender: f32,
    underline_y: f32,
    underline_thickness: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MsdfGlyph {
    unicode: Option<u32>,
    #[serde(default)]
    advance: f32,
    plane_bounds: Option<Bounds>,
    atlas_bounds: Option<Bounds>,
}

/* ======================= Directory resolution ======================= */

/// The description/image pair chosen for a font directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSource {
    /// JSON description file
    pub description: PathBuf,
    /// Atlas image paired with it
    pub image: PathBuf,
}

impl FontSource {
    /// Font name: the description file's stem
    pub fn font_name(&self) -> String {
        file_stem(&self.description)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Pick the description and image files of a font directory
///
/// Returns `Ok(None)` when the directory has no `.json` file and so is not
/// a font directory. The description is the `.json` named after the
/// directory, else the first one found; the image is the one sharing the
/// description's stem, else the first image found. A description without
/// any image is an error.
pub fn find_font_source(dir: &Path, config: &AssetConfig) -> AssetResult<Option<FontSource>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    let is_json = |path: &&PathBuf| {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    };

    let dir_name = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    let description = files
        .iter()
        .filter(is_json)
        .find(|path| dir_name.as_deref() == Some(file_stem(path).as_str()))
        .or_else(|| files.iter().find(is_json));

    let Some(description) = description else {
        return Ok(None);
    };

    let stem = file_stem(description);
    let image = files
        .iter()
        .filter(|path| config.is_image_file(path))
        .find(|path| file_stem(path) == stem)
        .or_else(|| files.iter().find(|path| config.is_image_file(path)))
        .ok_or_else(|| {
            AssetError::NotFound(format!("no atlas image next to {}", description.display()))
        })?;

    Ok(Some(FontSource {
        description: description.clone(),
        image: image.clone(),
    }))
}

/// Parse one font directory into a glyph atlas
///
/// `Ok(None)` means the directory holds no font description.
pub fn parse_font_directory(
    dir: &Path,
    config: &AssetConfig,
    textures: &dyn TextureLoader,
) -> AssetResult<Option<GlyphAtlas>> {
    let Some(source) = find_font_source(dir, config)? else {
        return Ok(None);
    };

    log::debug!(
        "Font directory {:?}: description {:?}, image {:?}",
        dir,
        source.description,
        source.image
    );

    let json = std::fs::read(&source.description)?;
    populate_from_json(&source.font_name(), &json, &source.image, textures).map(Some)
}

/* ======================= Description parsing ======================= */

/// Build a glyph atlas from a description document and its atlas image
///
/// The image is loaded through `textures`; if that fails the whole font
/// fails. Missing metrics default to zero and an unknown `yOrigin` means
/// bottom. Atlas dimensions missing from the document fall back to the
/// image's.
pub fn populate_from_json(
    name: &str,
    json: &[u8],
    image_path: &Path,
    textures: &dyn TextureLoader,
) -> AssetResult<GlyphAtlas> {
    let document: MsdfDocument = serde_json::from_slice(json)
        .map_err(|e| AssetError::Format(format!("font '{name}' description: {e}")))?;

    let y_origin = YOrigin::from_name(document.atlas.y_origin.as_deref());
    let metrics = FontMetrics {
        line_height: document.metrics.line_height,
        ascender: document.metrics.ascender,
        descender: document.metrics.descender,
        underline_y: document.metrics.underline_y,
        underline_thickness: document.metrics.underline_thickness,
    };

    let texture = textures.load_texture(image_path).map_err(|e| {
        AssetError::Resource(format!("font '{name}' atlas image {}: {e}", image_path.display()))
    })?;

    let positive = |value: f32, fallback: u32| {
        if value.is_finite() && value > 0.0 { value } else { fallback as f32 }
    };
    let params = AtlasParams {
        width: positive(document.atlas.width, texture.width()),
        height: positive(document.atlas.height, texture.height()),
        em_size: document.atlas.size,
        distance_range: document.atlas.distance_range,
        y_origin,
    };
    if params.width <= 0.0 || params.height <= 0.0 {
        return Err(AssetError::Format(format!("font '{name}' has an empty atlas")));
    }

    let atlas_size = (params.width, params.height);
    let glyphs: HashMap<u32, Glyph> = document
        .glyphs
        .iter()
        .filter_map(|g| {
            let codepoint = g.unicode?;
            Some((
                codepoint,
                Glyph::new(
                    codepoint,
                    g.advance,
                    g.plane_bounds.unwrap_or_default(),
                    g.atlas_bounds.unwrap_or_default(),
                    atlas_size,
                    y_origin,
                ),
            ))
        })
        .collect();

    let kerning = parse_kerning(name, &document.kerning);

    log::info!(
        "Parsed font '{}': {} glyphs, {} kerning pairs, atlas {}x{}, distance range {}",
        name,
        glyphs.len(),
        kerning.len(),
        params.width,
        params.height,
        params.distance_range
    );

    Ok(GlyphAtlas::new(name, texture, params, metrics, glyphs, kerning))
}

/// Interpret the `kerning` field
///
/// Accepts an array of `{unicode1, unicode2, advance}` records or a nested
/// object `{"<left>": {"<right>": advance}}`. Malformed entries are skipped
/// one at a time.
fn parse_kerning(name: &str, kerning: &Value) -> HashMap<u64, f32> {
    let mut table = HashMap::new();

    match kerning {
        Value::Null => {}
        Value::Array(records) => {
            for record in records {
                let field = |key: &str| {
                    record
                        .get(key)
                        .and_then(Value::as_u64)
                        .and_then(|v| u32::try_from(v).ok())
                };
                let advance = record.get("advance").and_then(Value::as_f64);
                match (field("unicode1"), field("unicode2"), advance) {
                    (Some(left), Some(right), Some(advance)) => {
                        table.insert(kerning_key(left, right), advance as f32);
                    }
                    _ => log::debug!(
                        "Font '{}': skipping malformed kerning record {}",
                        name,
                        record
                    ),
                }
            }
        }
        Value::Object(lefts) => {
            for (left, rights) in lefts {
                let Ok(left_cp) = left.parse::<u32>() else {
                    log::warn!("Font '{}': skipping kerning key '{}'", name, left);
                    continue;
                };
                let Some(rights) = rights.as_object() else {
                    log::warn!("Font '{}': kerning entry '{}' is not an object", name, left);
                    continue;
                };
                for (right, advance) in rights {
                    match (right.parse::<u32>(), advance.as_f64()) {
                        (Ok(right_cp), Some(advance)) => {
                            table.insert(kerning_key(left_cp, right_cp), advance as f32);
                        }
                        _ => log::warn!(
                            "Font '{}': skipping kerning pair '{}'/'{}'",
                            name,
                            left,
                            right
                        ),
                    }
                }
            }
        }
        other => log::warn!("Font '{}': unsupported kerning shape {}", name, other),
    }

    table
}
