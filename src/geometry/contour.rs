use crate::foundation::{
    core::Point,
    error::{EdgeFxError, EdgeFxResult},
};

/// Alpha values strictly above this count as "inside" the traced shape.
pub const ALPHA_THRESHOLD: u8 = 20;

/// Per-pixel alpha of an image, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlphaMask {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl AlphaMask {
    pub fn new(width: u32, height: u32, alpha: Vec<u8>) -> EdgeFxResult<Self> {
        let expected = (width as usize) * (height as usize);
        if alpha.len() != expected {
            return Err(EdgeFxError::validation(format!(
                "alpha mask of {width}x{height} needs {expected} values, got {}",
                alpha.len()
            )));
        }
        Ok(Self {
            width,
            height,
            alpha,
        })
    }

    /// Builds a mask from a string grid where `#` is opaque; handy for fixtures.
    pub fn from_ascii(rows: &[&str]) -> EdgeFxResult<Self> {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.chars().count()) as u32;
        let mut alpha = Vec::with_capacity((width * height) as usize);
        for row in rows {
            if row.chars().count() as u32 != width {
                return Err(EdgeFxError::validation("ragged ascii mask rows"));
            }
            alpha.extend(row.chars().map(|c| if c == '#' { 255 } else { 0 }));
        }
        Self::new(width, height, alpha)
    }

    pub fn from_image(img: &image::DynamicImage) -> EdgeFxResult<Self> {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let alpha = rgba.pixels().map(|p| p.0[3]).collect();
        Self::new(width, height, alpha)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Out-of-range coordinates are transparent.
    pub fn is_opaque(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return false;
        }
        self.alpha[(y as usize) * (self.width as usize) + (x as usize)] > ALPHA_THRESHOLD
    }

    /// First opaque pixel, scanning anti-diagonals outward from the origin.
    fn start(&self) -> Option<(i64, i64)> {
        let (w, h) = (i64::from(self.width), i64::from(self.height));
        for sum in 0..(w + h).saturating_sub(1) {
            let x_max = sum.min(w - 1);
            for x in (0..=x_max).rev() {
                let y = sum - x;
                if y >= h {
                    break;
                }
                if self.is_opaque(x, y) {
                    return Some((x, y));
                }
            }
        }
        None
    }
}

// Marching directions indexed by the 2x2 neighbourhood code; 6 and 9 (saddles) and 15 are
// handled separately.
const DX: [i64; 16] = [1, 0, 1, 1, -1, 0, -1, 1, 0, 0, 0, 0, -1, 0, -1, 0];
const DY: [i64; 16] = [0, -1, 0, 0, 0, -1, 0, 0, 1, -1, 1, 1, 0, -1, 0, 0];

/// Traces the boundary of the first opaque region of `mask` with marching squares.
///
/// Returns the corner points of the boundary polygon in pixel-grid coordinates; only
/// direction changes are emitted.
pub fn trace_contour(mask: &AlphaMask) -> EdgeFxResult<Vec<Point>> {
    let (sx, sy) = mask
        .start()
        .ok_or_else(|| EdgeFxError::geometry("alpha mask has no opaque pixels"))?;

    let limit = 4 * (u64::from(mask.width) + 1) * (u64::from(mask.height) + 1);
    let mut points = Vec::new();
    let (mut x, mut y) = (sx, sy);
    let (mut pdx, mut pdy): (Option<i64>, Option<i64>) = (None, None);

    for _ in 0..limit {
        let mut code = 0usize;
        if mask.is_opaque(x - 1, y - 1) {
            code += 1;
        }
        if mask.is_opaque(x, y - 1) {
            code += 2;
        }
        if mask.is_opaque(x - 1, y) {
            code += 4;
        }
        if mask.is_opaque(x, y) {
            code += 8;
        }

        let (dx, dy) = match code {
            0 | 15 => {
                return Err(EdgeFxError::geometry(format!(
                    "contour walk left the boundary at ({x}, {y})"
                )));
            }
            6 => (if pdy == Some(-1) { -1 } else { 1 }, 0),
            9 => (0, if pdx == Some(1) { -1 } else { 1 }),
            _ => (DX[code], DY[code]),
        };

        if pdx != Some(dx) && pdy != Some(dy) {
            points.push(Point::new(x as f64, y as f64));
            pdx = Some(dx);
            pdy = Some(dy);
        }

        x += dx;
        y += dy;
        if (x, y) == (sx, sy) {
            return Ok(points);
        }
    }

    Err(EdgeFxError::geometry("contour walk did not close"))
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/contour.rs"]
mod tests;
