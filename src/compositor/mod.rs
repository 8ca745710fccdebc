//! Layer compositing onto a full sprite sheet canvas.
//!
//! Every resolved trait contributes its main layer plus any parts. All of
//! them are drawn in ascending z order (ties keep category order), each tile
//! clipped to its own frame, and index overlays are drawn last.

mod blend;

pub use blend::{blend_pixel, blit_tile, BlendMode, TileBlit};

use image::RgbaImage;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{AssetIndex, LayerAsset, LookupError, Overlay};
use crate::resolver::{GenerationLog, ResolvedTraitSet};
use crate::spritesheet::{blank_sheet, SheetGeometry};

/// Compositing failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositeError {
    /// Layer pixels disagree with the sheet's tile grid
    #[error("Geometry mismatch for {layer}: {what} expected {}x{}, found {}x{}", expected.0, expected.1, actual.0, actual.1)]
    GeometryMismatch {
        /// `category/value` or `category/value#part`
        layer: String,
        what: &'static str,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error(transparent)]
    AssetNotFound(#[from] LookupError),
}

/// Check that `asset` fits the sheet grid exactly.
///
/// The declared tile must equal the sheet tile, and the image must be one
/// tile per frame wide and one tile per mapped row high.
pub fn check_geometry(asset: &LayerAsset, geometry: &SheetGeometry) -> Result<(), CompositeError> {
    let mismatch = |what, expected, actual| CompositeError::GeometryMismatch {
        layer: asset.label(),
        what,
        expected,
        actual,
    };

    if asset.frame != geometry.tile() {
        return Err(mismatch("tile", geometry.tile(), asset.frame));
    }
    if let Some(image) = &asset.image {
        let height = u32::try_from(asset.row_map.len())
            .ok()
            .and_then(|rows| geometry.frame_height.checked_mul(rows));
        let expected = (geometry.sheet_width(), height.unwrap_or(u32::MAX));
        if height.is_none() || image.dimensions() != expected {
            return Err(mismatch("image", expected, image.dimensions()));
        }
    }
    Ok(())
}

/// Draw every row of `asset` onto the sheet rows its `row_map` names.
fn draw_layer(canvas: &mut RgbaImage, asset: &LayerAsset, image: &RgbaImage, geometry: &SheetGeometry) {
    let (fw, fh) = geometry.tile();
    for (src_row, &sheet_row) in asset.row_map.iter().enumerate() {
        for frame in 0..geometry.frames {
            let blit = TileBlit {
                src: (frame * fw, src_row as u32 * fh),
                dst: geometry.tile_origin(sheet_row, frame),
                size: (fw, fh),
                offset: asset.offset,
            };
            blit_tile(canvas, image, blit, asset.blend, asset.opacity);
        }
    }
}

fn draw_overlay(canvas: &mut RgbaImage, overlay: &Overlay, geometry: &SheetGeometry) {
    let (first, last) = overlay.frames;
    for frame in first..=last.min(geometry.frames.saturating_sub(1)) {
        let blit = TileBlit {
            src: (0, 0),
            dst: geometry.tile_origin(overlay.row, frame),
            size: geometry.tile(),
            offset: (overlay.offset.0, overlay.offset.1 + overlay.lift_for(frame)),
        };
        blit_tile(canvas, &overlay.image, blit, BlendMode::Normal, 1.0);
    }
}

/// Composite `traits` into a new canvas sized to the index's sheet geometry.
pub fn composite(
    index: &AssetIndex,
    traits: &ResolvedTraitSet,
    log: &mut GenerationLog,
) -> Result<RgbaImage, CompositeError> {
    let geometry = index.geometry();

    let mut layers = Vec::with_capacity(traits.len());
    for t in traits {
        for asset in index.layers(&t.category, &t.value)? {
            check_geometry(asset, geometry)?;
            layers.push(asset);
        }
    }
    // Stable: equal z keeps resolution order
    layers.sort_by_key(|asset| asset.z);

    let mut canvas = blank_sheet(geometry);
    for asset in layers {
        match &asset.image {
            Some(image) => {
                draw_layer(&mut canvas, asset, image, geometry);
                log.push(format!(
                    "layer {} z={}: {} ({} rows)",
                    asset.label(),
                    asset.z,
                    asset.source,
                    asset.row_map.len()
                ));
            }
            None => log.push(format!("layer {} z={}: blank", asset.label(), asset.z)),
        }
        debug!(layer = %asset.label(), z = asset.z, "layer drawn");
    }

    for overlay in index.overlays() {
        draw_overlay(&mut canvas, overlay, geometry);
        log.push(format!(
            "overlay {}: {} frames {}-{}",
            overlay.name,
            geometry.row_label(overlay.row),
            overlay.frames.0,
            overlay.frames.1
        ));
    }

    Ok(canvas)
}
