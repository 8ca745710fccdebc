//! Sprite sheet geometry - fixed tile grid where each row is one animation state

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transparent color used for empty cells
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Largest sheet (in pixels) a library may declare; 1 GiB of RGBA.
pub const MAX_SHEET_PIXELS: u64 = 1 << 28;

/// Grid layout shared by every sheet generated from one asset library.
///
/// Columns are animation frames, rows are animation/direction states.
///
/// # Examples
///
/// ```
/// use spriteforge::spritesheet::SheetGeometry;
///
/// let geometry = SheetGeometry::new(64, 64, 8, 10);
/// assert_eq!(geometry.sheet_width(), 512);
/// assert_eq!(geometry.sheet_height(), 640);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetGeometry {
    /// Tile width in pixels
    pub frame_width: u32,
    /// Tile height in pixels
    pub frame_height: u32,
    /// Number of frame columns
    pub frames: u32,
    /// Number of animation rows
    pub rows: u32,
    /// Optional name per row ("idle", "walk_south", ...)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub row_names: Vec<String>,
}

impl SheetGeometry {
    pub fn new(frame_width: u32, frame_height: u32, frames: u32, rows: u32) -> Self {
        Self { frame_width, frame_height, frames, rows, row_names: Vec::new() }
    }

    /// Attach row names, one per row.
    pub fn with_row_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.row_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn tile(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    /// Saturates on overflow; [`SheetGeometry::problems`] rejects such sheets.
    pub fn sheet_width(&self) -> u32 {
        self.frame_width.saturating_mul(self.frames)
    }

    pub fn sheet_height(&self) -> u32 {
        self.frame_height.saturating_mul(self.rows)
    }

    /// Display name for a row, falling back to `row N`.
    pub fn row_label(&self, row: u32) -> String {
        self.row_names
            .get(row as usize)
            .cloned()
            .unwrap_or_else(|| format!("row {}", row))
    }

    /// Find a row by name.
    pub fn row_index(&self, name: &str) -> Option<u32> {
        self.row_names.iter().position(|n| n == name).map(|i| i as u32)
    }

    /// Top-left pixel of a tile.
    pub fn tile_origin(&self, row: u32, col: u32) -> (u32, u32) {
        (col * self.frame_width, row * self.frame_height)
    }

    /// Problems with the geometry itself, empty when usable.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.frame_width == 0 || self.frame_height == 0 {
            problems.push(format!(
                "sheet: frame size must be non-zero (got {}x{})",
                self.frame_width, self.frame_height
            ));
        }
        if self.frames == 0 || self.rows == 0 {
            problems.push(format!(
                "sheet: frames and rows must be non-zero (got {} frames, {} rows)",
                self.frames, self.rows
            ));
        }
        match (
            self.frame_width.checked_mul(self.frames),
            self.frame_height.checked_mul(self.rows),
        ) {
            (Some(w), Some(h)) if u64::from(w) * u64::from(h) > MAX_SHEET_PIXELS => {
                problems.push(format!(
                    "sheet: {}x{} sheet exceeds the {} pixel limit",
                    w, h, MAX_SHEET_PIXELS
                ));
            }
            (Some(_), Some(_)) => {}
            _ => problems.push(format!(
                "sheet: {} frames of {}x{} in {} rows overflows the sheet size",
                self.frames, self.frame_width, self.frame_height, self.rows
            )),
        }
        if !self.row_names.is_empty() && self.row_names.len() != self.rows as usize {
            problems.push(format!(
                "sheet: {} row names given for {} rows",
                self.row_names.len(),
                self.rows
            ));
        }
        problems
    }
}

/// Create an empty, fully transparent sheet for the geometry.
pub fn blank_sheet(geometry: &SheetGeometry) -> RgbaImage {
    RgbaImage::from_pixel(geometry.sheet_width(), geometry.sheet_height(), TRANSPARENT)
}

/// Error when a requested tile lies outside the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SliceError {
    #[error("Tile (row {row}, frame {col}) is outside a {rows}x{cols} sheet")]
    OutOfBounds { row: u32, col: u32, rows: u32, cols: u32 },
    #[error("Sheet is {actual_w}x{actual_h}, not a whole number of {tile_w}x{tile_h} tiles")]
    NotTiled { actual_w: u32, actual_h: u32, tile_w: u32, tile_h: u32 },
}

/// Extract a single tile from a sheet.
///
/// The grid is derived from the sheet's own dimensions and the tile size, so
/// this works on any sheet read back from disk.
pub fn slice_frame(
    sheet: &RgbaImage,
    tile: (u32, u32),
    row: u32,
    col: u32,
) -> Result<RgbaImage, SliceError> {
    let (tile_w, tile_h) = tile;
    if tile_w == 0
        || tile_h == 0
        || sheet.width() % tile_w != 0
        || sheet.height() % tile_h != 0
    {
        return Err(SliceError::NotTiled {
            actual_w: sheet.width(),
            actual_h: sheet.height(),
            tile_w,
            tile_h,
        });
    }

    let cols = sheet.width() / tile_w;
    let rows = sheet.height() / tile_h;
    if row >= rows || col >= cols {
        return Err(SliceError::OutOfBounds { row, col, rows, cols });
    }

    Ok(image::imageops::crop_imm(sheet, col * tile_w, row * tile_h, tile_w, tile_h).to_image())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_checker_sheet() -> RgbaImage {
        // 2x2 tiles of 2x2 pixels, each tile a different color
        let colors = [
            Rgba([255, 0, 0, 255]),
            Rgba([0, 255, 0, 255]),
            Rgba([0, 0, 255, 255]),
            Rgba([255, 255, 0, 255]),
        ];
        RgbaImage::from_fn(4, 4, |x, y| colors[((y / 2) * 2 + x / 2) as usize])
    }

    #[test]
    fn test_dimensions() {
        let g = SheetGeometry::new(64, 64, 8, 10);
        assert_eq!(g.tile(), (64, 64));
        assert_eq!((g.sheet_width(), g.sheet_height()), (512, 640));
        assert_eq!(g.tile_origin(2, 3), (192, 128));
    }

    #[test]
    fn test_blank_sheet_is_transparent() {
        let g = SheetGeometry::new(4, 4, 2, 3);
        let sheet = blank_sheet(&g);
        assert_eq!(sheet.dimensions(), (8, 12));
        assert!(sheet.pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn test_row_labels() {
        let g = SheetGeometry::new(8, 8, 1, 2).with_row_names(["idle", "walk"]);
        assert_eq!(g.row_label(1), "walk");
        assert_eq!(g.row_label(5), "row 5");
        assert_eq!(g.row_index("idle"), Some(0));
        assert_eq!(g.row_index("swim"), None);
    }

    #[test]
    fn test_problems() {
        assert!(SheetGeometry::new(64, 64, 8, 10).problems().is_empty());
        assert_eq!(SheetGeometry::new(0, 64, 8, 10).problems().len(), 1);
        let named = SheetGeometry::new(8, 8, 1, 3).with_row_names(["a"]);
        assert!(named.problems()[0].contains("1 row names"));
    }

    #[test]
    fn test_oversized_geometry_rejected() {
        let overflow = SheetGeometry::new(65536, 1, 65536, 1);
        let problems = overflow.problems();
        assert_eq!(problems.len(), 1, "{:?}", problems);
        assert!(problems[0].contains("overflows"));
        assert_eq!(overflow.sheet_width(), u32::MAX);

        let too_many_pixels = SheetGeometry::new(64, 64, 1024, 1024);
        assert!(too_many_pixels.problems()[0].contains("pixel limit"));
    }

    #[test]
    fn test_slice_frame() {
        let sheet = make_checker_sheet();
        let tile = slice_frame(&sheet, (2, 2), 1, 0).unwrap();
        assert_eq!(tile.dimensions(), (2, 2));
        assert_eq!(*tile.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
        assert_eq!(*tile.get_pixel(1, 1), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_slice_frame_out_of_bounds() {
        let sheet = make_checker_sheet();
        let err = slice_frame(&sheet, (2, 2), 2, 0).unwrap_err();
        assert_eq!(err, SliceError::OutOfBounds { row: 2, col: 0, rows: 2, cols: 2 });
    }

    #[test]
    fn test_slice_frame_not_tiled() {
        let sheet = make_checker_sheet();
        assert!(matches!(slice_frame(&sheet, (3, 2), 0, 0), Err(SliceError::NotTiled { .. })));
    }
}
