//! Blend rules for layer compositing

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// How a layer's color combines with what is already on the canvas.
///
/// Every mode is followed by standard source-over alpha compositing, so a
/// `Normal` layer is plain "paint on top".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Source over destination
    #[default]
    Normal,
    /// base * layer; used for shading overlays
    Multiply,
    /// 1 - (1 - base) * (1 - layer); used for glows
    Screen,
    /// Multiply or screen depending on base brightness
    Overlay,
    /// min(1, base + layer)
    Add,
    /// min(base, layer)
    Darken,
    /// max(base, layer)
    Lighten,
}

impl BlendMode {
    /// Mix one normalized channel.
    fn mix(self, base: f32, layer: f32) -> f32 {
        match self {
            BlendMode::Normal => layer,
            BlendMode::Multiply => base * layer,
            BlendMode::Screen => 1.0 - (1.0 - base) * (1.0 - layer),
            BlendMode::Overlay if base < 0.5 => 2.0 * base * layer,
            BlendMode::Overlay => 1.0 - 2.0 * (1.0 - base) * (1.0 - layer),
            BlendMode::Add => (base + layer).min(1.0),
            BlendMode::Darken => base.min(layer),
            BlendMode::Lighten => base.max(layer),
        }
    }
}

impl std::fmt::Display for BlendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Add => "add",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
        };
        f.write_str(name)
    }
}

/// Composite one source pixel over one destination pixel.
///
/// `opacity` scales the source alpha. Fully transparent sources leave the
/// destination untouched.
pub fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>, mode: BlendMode, opacity: f32) -> Rgba<u8> {
    let src_a = (src[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return dst;
    }
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    let mut out = [0u8; 4];
    for c in 0..3 {
        let s = src[c] as f32 / 255.0;
        let d = dst[c] as f32 / 255.0;
        // Blend modes only make sense where there is something underneath.
        let mixed = if dst_a > 0.0 { mode.mix(d, s) } else { s };
        let value = (mixed * src_a + d * dst_a * (1.0 - src_a)) / out_a;
        out[c] = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    out[3] = (out_a * 255.0).round() as u8;
    Rgba(out)
}

/// A rectangle of source pixels and where it lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileBlit {
    /// Source top-left
    pub src: (u32, u32),
    /// Destination tile top-left on the canvas
    pub dst: (u32, u32),
    /// Tile size (source rect size and destination clip size)
    pub size: (u32, u32),
    /// Shift inside the destination tile
    pub offset: (i32, i32),
}

/// Draw one tile of `src` onto `canvas`.
///
/// Pixels shifted by `offset` past the edge of the destination tile are
/// dropped, so a layer can never bleed into the neighbouring frame.
pub fn blit_tile(
    canvas: &mut RgbaImage,
    src: &RgbaImage,
    blit: TileBlit,
    mode: BlendMode,
    opacity: f32,
) {
    let (tile_w, tile_h) = blit.size;
    for y in 0..tile_h {
        let sy = blit.src.1 + y;
        if sy >= src.height() {
            break;
        }
        let ty = y as i64 + blit.offset.1 as i64;
        if ty < 0 || ty >= tile_h as i64 {
            continue;
        }
        let dy = blit.dst.1 + ty as u32;
        if dy >= canvas.height() {
            continue;
        }

        for x in 0..tile_w {
            let sx = blit.src.0 + x;
            if sx >= src.width() {
                break;
            }
            let pixel = *src.get_pixel(sx, sy);
            if pixel[3] == 0 {
                continue;
            }
            let tx = x as i64 + blit.offset.0 as i64;
            if tx < 0 || tx >= tile_w as i64 {
                continue;
            }
            let dx = blit.dst.0 + tx as u32;
            if dx >= canvas.width() {
                continue;
            }

            let below = *canvas.get_pixel(dx, dy);
            canvas.put_pixel(dx, dy, blend_pixel(below, pixel, mode, opacity));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    #[test]
    fn test_opaque_source_replaces() {
        assert_eq!(blend_pixel(BLUE, RED, BlendMode::Normal, 1.0), RED);
    }

    #[test]
    fn test_transparent_source_is_noop() {
        assert_eq!(blend_pixel(BLUE, CLEAR, BlendMode::Normal, 1.0), BLUE);
        assert_eq!(blend_pixel(BLUE, RED, BlendMode::Normal, 0.0), BLUE);
    }

    #[test]
    fn test_half_alpha_over_opaque() {
        let half_red = Rgba([255, 0, 0, 128]);
        let out = blend_pixel(BLUE, half_red, BlendMode::Normal, 1.0);
        assert_eq!(out[3], 255);
        assert!(out[0] > 120 && out[0] < 136, "red channel {}", out[0]);
        assert!(out[2] > 120 && out[2] < 136, "blue channel {}", out[2]);
    }

    #[test]
    fn test_over_empty_keeps_source_color() {
        let half_red = Rgba([255, 0, 0, 128]);
        assert_eq!(blend_pixel(CLEAR, half_red, BlendMode::Multiply, 1.0), half_red);
    }

    #[test]
    fn test_multiply_darkens() {
        let grey = Rgba([128, 128, 128, 255]);
        let out = blend_pixel(Rgba([200, 200, 200, 255]), grey, BlendMode::Multiply, 1.0);
        assert_eq!(out, Rgba([100, 100, 100, 255]));
    }

    #[test]
    fn test_screen_and_add_lighten() {
        let base = Rgba([100, 100, 100, 255]);
        let layer = Rgba([100, 100, 100, 255]);
        assert!(blend_pixel(base, layer, BlendMode::Screen, 1.0)[0] > 100);
        assert_eq!(blend_pixel(base, layer, BlendMode::Add, 1.0)[0], 200);
    }

    #[test]
    fn test_blend_mode_serde_names() {
        let mode: BlendMode = serde_json::from_str("\"screen\"").unwrap();
        assert_eq!(mode, BlendMode::Screen);
        assert_eq!(BlendMode::Lighten.to_string(), "lighten");
    }

    #[test]
    fn test_blit_tile_copies_region() {
        let src = RgbaImage::from_pixel(4, 2, RED);
        let mut canvas = RgbaImage::from_pixel(4, 4, CLEAR);
        let blit = TileBlit { src: (2, 0), dst: (2, 2), size: (2, 2), offset: (0, 0) };
        blit_tile(&mut canvas, &src, blit, BlendMode::Normal, 1.0);
        assert_eq!(*canvas.get_pixel(2, 2), RED);
        assert_eq!(*canvas.get_pixel(3, 3), RED);
        assert_eq!(*canvas.get_pixel(1, 2), CLEAR);
        assert_eq!(*canvas.get_pixel(2, 1), CLEAR);
    }

    #[test]
    fn test_blit_tile_offset_clipped_to_tile() {
        let src = RgbaImage::from_pixel(2, 2, RED);
        let mut canvas = RgbaImage::from_pixel(4, 2, CLEAR);
        let blit = TileBlit { src: (0, 0), dst: (0, 0), size: (2, 2), offset: (1, 0) };
        blit_tile(&mut canvas, &src, blit, BlendMode::Normal, 1.0);
        assert_eq!(*canvas.get_pixel(0, 0), CLEAR);
        assert_eq!(*canvas.get_pixel(1, 0), RED);
        // Would land in the neighbouring tile; dropped
        assert_eq!(*canvas.get_pixel(2, 0), CLEAR);
    }

    #[test]
    fn test_blit_tile_negative_offset() {
        let src = RgbaImage::from_pixel(2, 2, RED);
        let mut canvas = RgbaImage::from_pixel(2, 2, CLEAR);
        let blit = TileBlit { src: (0, 0), dst: (0, 0), size: (2, 2), offset: (0, -1) };
        blit_tile(&mut canvas, &src, blit, BlendMode::Normal, 1.0);
        assert_eq!(*canvas.get_pixel(0, 0), RED);
        assert_eq!(*canvas.get_pixel(0, 1), CLEAR);
    }
}
