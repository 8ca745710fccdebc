//! Loading an asset library directory into an [`AssetIndex`].
//!
//! The library root holds `assets.toml` plus the layer images it names.
//! Loading reads and decodes every image up front; a missing file or an
//! inconsistent manifest fails the whole load with every problem listed.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::{debug, info};

use super::schema::LibraryManifest;
use super::{AssetIndex, CatalogError, LayerAsset, Overlay, TraitCategory, TraitValue};

/// Manifest file name at the root of an asset library
pub const MANIFEST_FILE: &str = "assets.toml";

/// Load and validate the library rooted at `dir`.
///
/// # Example
/// ```ignore
/// let index = load_library(Path::new("assets/dragons"))?;
/// println!("{} categories", index.categories().len());
/// ```
pub fn load_library(dir: &Path) -> Result<AssetIndex, CatalogError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let contents = fs::read_to_string(&manifest_path)?;
    let manifest: LibraryManifest = toml::from_str(&contents)?;

    let name = manifest.name.clone().unwrap_or_else(|| {
        dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "library".to_string())
    });

    let index = build_index(dir, name, manifest)?;
    info!(
        library = index.name(),
        categories = index.categories().len(),
        assets = index.asset_count(),
        "asset library loaded"
    );
    Ok(index)
}

/// Read an image file relative to the library root.
///
/// Returns `Ok(None)` when the file does not exist so the caller can collect
/// it alongside other validation problems.
fn read_image(dir: &Path, file: &Path) -> Result<Option<RgbaImage>, CatalogError> {
    let path = dir.join(file);
    if !path.is_file() {
        return Ok(None);
    }
    debug!(path = %path.display(), "decoding layer image");
    let image = image::open(&path).map_err(|source| CatalogError::Image { path, source })?;
    Ok(Some(image.to_rgba8()))
}

/// Load `file` (if any) into `asset`, noting a missing file in `missing`.
fn attach_image(
    dir: &Path,
    asset: LayerAsset,
    file: Option<PathBuf>,
    missing: &mut Vec<String>,
) -> Result<LayerAsset, CatalogError> {
    let Some(file) = file else {
        return Ok(asset);
    };
    match read_image(dir, &file)? {
        Some(image) => Ok(asset.with_image(image, file.display().to_string())),
        None => {
            missing.push(format!("{}: file not found: {}", asset.label(), file.display()));
            Ok(asset)
        }
    }
}

fn build_index(
    dir: &Path,
    name: String,
    manifest: LibraryManifest,
) -> Result<AssetIndex, CatalogError> {
    let sheet = manifest.sheet;
    let mut missing = Vec::new();
    let mut categories = Vec::new();
    let mut assets = Vec::new();

    for def in manifest.categories {
        let mut category = TraitCategory::new(def.name, def.z).with_blend(def.blend, def.opacity);
        for value_def in &def.values {
            let mut value = TraitValue::new(value_def.name.clone(), value_def.weight);
            value.requires = value_def.requires.clone();
            category.values.push(value);
        }

        for value_def in def.values {
            let mut asset = LayerAsset::new(&category, &value_def.name, &sheet)
                .with_offset(value_def.offset[0], value_def.offset[1]);
            if let Some([w, h]) = value_def.frame {
                asset = asset.with_frame(w, h);
            }
            if let Some(rows) = value_def.rows {
                asset = asset.with_rows(rows);
            }
            if let Some(z) = value_def.z {
                asset = asset.with_z(z);
            }
            if let Some(blend) = value_def.blend {
                asset.blend = blend;
            }
            if let Some(opacity) = value_def.opacity {
                asset.opacity = opacity;
            }
            let mut parts = Vec::with_capacity(value_def.parts.len());
            for part_def in value_def.parts {
                let mut part = asset.clone().with_part(part_def.name);
                if let Some(rows) = part_def.rows {
                    part = part.with_rows(rows);
                }
                if let Some([x, y]) = part_def.offset {
                    part = part.with_offset(x, y);
                }
                if let Some(z) = part_def.z {
                    part = part.with_z(z);
                }
                if let Some(blend) = part_def.blend {
                    part.blend = blend;
                }
                if let Some(opacity) = part_def.opacity {
                    part.opacity = opacity;
                }
                parts.push((part, part_def.file));
            }
            assets.push(attach_image(dir, asset, value_def.file, &mut missing)?);
            for (part, file) in parts {
                assets.push(attach_image(dir, part, Some(file), &mut missing)?);
            }
        }
        categories.push(category);
    }

    let mut overlays = Vec::new();
    for def in manifest.overlays {
        let Some(row) = def.row.resolve(&sheet) else {
            missing.push(format!("overlay '{}': unknown row {:?}", def.name, def.row));
            continue;
        };
        let mut lift = Vec::with_capacity(def.lift.len());
        for &[frame, dy] in &def.lift {
            match u32::try_from(frame) {
                Ok(frame) => lift.push((frame, dy)),
                Err(_) => {
                    missing.push(format!("overlay '{}': lift frame {} is negative", def.name, frame))
                }
            }
        }
        match read_image(dir, &def.file)? {
            Some(image) => overlays.push(Overlay {
                name: def.name,
                source: def.file.display().to_string(),
                image,
                row,
                frames: (def.frames[0], def.frames[1]),
                lift,
                offset: (def.offset[0], def.offset[1]),
            }),
            None => missing.push(format!(
                "overlay '{}': file not found: {}",
                def.name,
                def.file.display()
            )),
        }
    }

    let mut builder = AssetIndex::builder(name, sheet);
    for category in categories {
        builder = builder.category(category);
    }
    for asset in assets {
        builder = builder.asset(asset);
    }
    for overlay in overlays {
        builder = builder.overlay(overlay);
    }

    let mut errors = missing;
    errors.extend(builder.validate());
    if !errors.is_empty() {
        return Err(CatalogError::Validation(errors));
    }
    builder.build()
}
