//! Asset probe
//!
//! Builds an asset manager, loads every font under the configured fonts
//! root and each GLB model named on the command line, then logs what got
//! registered.
//!
//! Usage: asset_probe [--config assets.toml] [model.glb ...]

use std::env;
use std::process::ExitCode;

use engine_assets::foundation::logging;
use engine_assets::prelude::*;
use engine_assets::materials::HeadlessDescriptorAllocator;

fn main() -> ExitCode {
    let mut args = env::args().skip(1).peekable();

    let config = if args.peek().map(String::as_str) == Some("--config") {
        args.next();
        let Some(path) = args.next() else {
            eprintln!("Usage: asset_probe [--config assets.toml] [model.glb ...]");
            return ExitCode::FAILURE;
        };
        match AssetConfig::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        AssetConfig::default()
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        return ExitCode::FAILURE;
    }

    logging::init_with_level(&config.log_level);
    let models: Vec<String> = args.collect();

    let assets = AssetManager::new(&config);
    let font_count = assets.fonts().load_all_recursively();
    for name in assets.fonts().font_names() {
        if let Ok(font) = assets.fonts().get_font_info(&name) {
            let (width, height) = font.atlas_dimensions();
            log::info!(
                "Font '{}': {} glyphs, {} kerning pairs, {}x{} atlas, space advance {}",
                name,
                font.glyph_count(),
                font.kerning_pairs().count(),
                width,
                height,
                font.space_advance()
            );
        }
    }

    let allocator = HeadlessDescriptorAllocator::new();
    let mut failures = 0;
    for model in &models {
        match assets.load_model(model) {
            Ok(composite) => {
                for material in composite.iter() {
                    let binding = material.descriptor_binding(&allocator).map(|b| b.raw());
                    log::info!(
                        "  {} -> mesh '{}' ({} vertices, {} triangles), albedo {:?}, binding {:?}",
                        material.name(),
                        material.mesh().name,
                        material.mesh().vertex_count(),
                        material.mesh().triangle_count(),
                        material.albedo().map(|t| t.name()),
                        binding.ok()
                    );
                }
            }
            Err(e) => {
                log::error!("Failed to load model {}: {}", model, e);
                failures += 1;
            }
        }
    }

    log::info!(
        "Probe finished: {} fonts, {} materials, {} composites, {} meshes, {} textures",
        font_count,
        assets.materials().material_count(),
        assets.materials().composite_count(),
        assets.meshes().len(),
        assets.textures().len()
    );

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
