//! Shape rasterization and tile painting for procedurally drawn layers.
//!
//! Rasterizers return integer pixel coordinates; [`TilePainter`] plots them
//! into one tile of a larger image, clipping at the tile edge and optionally
//! mirroring horizontally (for west-facing poses drawn from east-facing ones).

use image::{Rgba, RgbaImage};

/// Rasterize a line using Bresenham's line algorithm.
///
/// # Examples
///
/// ```
/// use spriteforge::shapes::line;
///
/// let pixels = line((0, 0), (3, 3));
/// assert_eq!(pixels.len(), 4);
/// assert!(pixels.contains(&(3, 3)));
/// ```
pub fn line(p0: (i32, i32), p1: (i32, i32)) -> Vec<(i32, i32)> {
    let mut pixels = Vec::new();

    let (mut x0, mut y0) = p0;
    let (x1, y1) = p1;

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        pixels.push((x0, y0));
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }

    pixels
}

/// Thick line: the Bresenham line stamped with a square brush.
pub fn thick_line(p0: (i32, i32), p1: (i32, i32), width: i32) -> Vec<(i32, i32)> {
    let half = width.max(1) / 2;
    let mut pixels = Vec::new();
    for (x, y) in line(p0, p1) {
        pixels.extend(rect(x - half, y - half, width.max(1), width.max(1)));
    }
    pixels
}

/// Filled rectangle with top-left (x, y).
pub fn rect(x: i32, y: i32, w: i32, h: i32) -> Vec<(i32, i32)> {
    if w <= 0 || h <= 0 {
        return Vec::new();
    }
    let mut pixels = Vec::with_capacity((w * h) as usize);
    for dy in 0..h {
        for dx in 0..w {
            pixels.push((x + dx, y + dy));
        }
    }
    pixels
}

/// Filled ellipse centered at (cx, cy).
///
/// # Examples
///
/// ```
/// use spriteforge::shapes::ellipse;
///
/// let pixels = ellipse(5, 5, 3, 2);
/// assert!(pixels.contains(&(5, 5)));
/// assert!(pixels.contains(&(8, 5)));
/// assert!(!pixels.contains(&(8, 7)));
/// ```
pub fn ellipse(cx: i32, cy: i32, rx: i32, ry: i32) -> Vec<(i32, i32)> {
    if rx <= 0 || ry <= 0 {
        return Vec::new();
    }
    let (rx2, ry2) = ((rx * rx) as i64, (ry * ry) as i64);
    let mut pixels = Vec::new();
    for dy in -ry..=ry {
        for dx in -rx..=rx {
            // dx²/rx² + dy²/ry² <= 1, in integers
            if (dx as i64 * dx as i64) * ry2 + (dy as i64 * dy as i64) * rx2 <= rx2 * ry2 {
                pixels.push((cx + dx, cy + dy));
            }
        }
    }
    pixels
}

/// Filled polygon using an even-odd scanline fill.
///
/// # Examples
///
/// ```
/// use spriteforge::shapes::polygon;
///
/// let triangle = vec![(0, 0), (4, 0), (2, 3)];
/// assert!(polygon(&triangle).contains(&(2, 1)));
/// ```
pub fn polygon(vertices: &[(i32, i32)]) -> Vec<(i32, i32)> {
    let mut pixels = Vec::new();
    if vertices.len() < 3 {
        return pixels;
    }

    let min_y = vertices.iter().map(|(_, y)| *y).min().unwrap_or(0);
    let max_y = vertices.iter().map(|(_, y)| *y).max().unwrap_or(0);

    for y in min_y..=max_y {
        let mut crossings = Vec::new();
        for i in 0..vertices.len() {
            let (x1, y1) = vertices[i];
            let (x2, y2) = vertices[(i + 1) % vertices.len()];
            if y1 == y2 {
                continue;
            }
            // Half-open on the upper end so shared vertices count once
            let (lo, hi) = (y1.min(y2), y1.max(y2));
            if y >= lo && y < hi {
                crossings.push(x1 + (y - y1) * (x2 - x1) / (y2 - y1));
            }
        }
        crossings.sort_unstable();
        for pair in crossings.chunks(2) {
            if let [start, end] = pair {
                for x in *start..=*end {
                    pixels.push((x, y));
                }
            }
        }
    }

    pixels
}

/// Plots pixels into a single tile of an image.
pub struct TilePainter<'a> {
    image: &'a mut RgbaImage,
    origin: (u32, u32),
    size: (u32, u32),
    mirror: bool,
}

impl<'a> TilePainter<'a> {
    pub fn new(image: &'a mut RgbaImage, origin: (u32, u32), size: (u32, u32)) -> Self {
        Self { image, origin, size, mirror: false }
    }

    /// Flip every subsequent plot around the tile's vertical center line.
    pub fn mirrored(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// Paint tile-local pixels, dropping any outside the tile.
    pub fn plot<I>(&mut self, pixels: I, color: Rgba<u8>)
    where
        I: IntoIterator<Item = (i32, i32)>,
    {
        let (w, h) = (self.size.0 as i32, self.size.1 as i32);
        for (x, y) in pixels {
            let x = if self.mirror { w - 1 - x } else { x };
            if x < 0 || y < 0 || x >= w || y >= h {
                continue;
            }
            let px = self.origin.0 + x as u32;
            let py = self.origin.1 + y as u32;
            if px < self.image.width() && py < self.image.height() {
                self.image.put_pixel(px, py, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn test_line_horizontal_and_vertical() {
        assert_eq!(line((0, 0), (3, 0)), vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert_eq!(line((1, 2), (1, 0)), vec![(1, 2), (1, 1), (1, 0)]);
    }

    #[test]
    fn test_line_single_point() {
        assert_eq!(line((4, 4), (4, 4)), vec![(4, 4)]);
    }

    #[test]
    fn test_thick_line_is_wider() {
        let thin = line((0, 5), (10, 5)).len();
        let mut thick = thick_line((0, 5), (10, 5), 3);
        thick.sort_unstable();
        thick.dedup();
        // 3x3 brush widens by one pixel on each side and each end
        assert_eq!(thick.len(), (thin + 2) * 3);
    }

    #[test]
    fn test_rect() {
        let pixels = rect(1, 1, 3, 2);
        assert_eq!(pixels.len(), 6);
        assert!(pixels.contains(&(3, 2)));
        assert!(rect(0, 0, 0, 5).is_empty());
    }

    #[test]
    fn test_ellipse_symmetric() {
        let pixels = ellipse(10, 10, 4, 2);
        for &(x, y) in &pixels {
            assert!(pixels.contains(&(20 - x, y)));
            assert!(pixels.contains(&(x, 20 - y)));
        }
        assert!(ellipse(0, 0, 0, 3).is_empty());
    }

    #[test]
    fn test_polygon_square() {
        let square = vec![(0, 0), (3, 0), (3, 3), (0, 3)];
        let pixels = polygon(&square);
        assert!(pixels.contains(&(0, 0)));
        assert!(pixels.contains(&(3, 2)));
        assert!(polygon(&[(0, 0), (1, 1)]).is_empty());
    }

    #[test]
    fn test_painter_clips_to_tile() {
        let mut image = RgbaImage::new(8, 4);
        {
            let mut painter = TilePainter::new(&mut image, (4, 0), (4, 4));
            painter.plot(rect(-2, -2, 10, 10), RED);
        }
        assert_eq!(*image.get_pixel(3, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(*image.get_pixel(4, 0), RED);
        assert_eq!(*image.get_pixel(7, 3), RED);
    }

    #[test]
    fn test_painter_mirror() {
        let mut image = RgbaImage::new(4, 1);
        {
            let mut painter = TilePainter::new(&mut image, (0, 0), (4, 1)).mirrored(true);
            painter.plot([(0, 0)], RED);
        }
        assert_eq!(*image.get_pixel(3, 0), RED);
        assert_eq!(*image.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }
}
