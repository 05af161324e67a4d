//! The finished symbol: a square grid of [`Pixel`]s plus an integer render
//! scale, with the pixel-level accessors a renderer needs.

use crate::pixel::Pixel;

/// A finished QR symbol.
#[derive(Debug, Clone)]
pub struct Code {
    size: i32,
    scale: i32,
    grid: Vec<Pixel>,
}

impl Code {
    pub(crate) fn new(size: i32, grid: Vec<Pixel>) -> Self {
        debug_assert_eq!(grid.len(), (size * size) as usize);
        Code {
            size,
            scale: 8,
            grid,
        }
    }

    /// Module count per side, without scaling.
    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: i32) {
        assert!(scale > 0, "scale must be positive");
        self.scale = scale;
    }

    /// Number of quiet-zone modules padded on every side of the grid before
    /// scaling to image pixels.
    const QUIET_ZONE: i32 = 4;

    /// Image-space bounds: `(0, 0)` to `((size + 8) * scale, (size + 8) *
    /// scale)`, the grid plus a four-module quiet zone on every side.
    pub fn bounds(&self) -> (i32, i32) {
        let d = (self.size + 2 * Self::QUIET_ZONE) * self.scale;
        (d, d)
    }

    pub fn pixel(&self, row: i32, col: i32) -> Pixel {
        self.grid[(row * self.size + col) as usize]
    }

    pub(crate) fn pixel_mut(&mut self, row: i32, col: i32) -> &mut Pixel {
        let size = self.size;
        &mut self.grid[(row * size + col) as usize]
    }

    /// Whether the rendered color at an *image-space* `(x, y)` point is
    /// black, accounting for the render scale and the four-module quiet
    /// zone. Points in the quiet zone or outside `bounds()` are white.
    pub fn at(&self, x: i32, y: i32) -> bool {
        let (w, h) = self.bounds();
        if x < 0 || y < 0 || x >= w || y >= h {
            return false;
        }
        let col = x / self.scale - Self::QUIET_ZONE;
        let row = y / self.scale - Self::QUIET_ZONE;
        if col < 0 || col >= self.size || row < 0 || row >= self.size {
            return false;
        }
        self.pixel(row, col).is_black()
    }

    /// Iterates every module's `(row, col, pixel)`, in row-major order.
    pub fn modules(&self) -> impl Iterator<Item = (i32, i32, Pixel)> + '_ {
        let size = self.size;
        (0..size).flat_map(move |r| (0..size).map(move |c| (r, c, self.pixel(r, c))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::PixelRole;

    fn solid(size: i32, black: bool) -> Code {
        Code::new(size, vec![Pixel::new(PixelRole::Data, black); (size * size) as usize])
    }

    #[test]
    fn bounds_add_four_module_quiet_zone_on_every_side() {
        let mut code = solid(21, true);
        code.set_scale(1);
        assert_eq!(code.bounds(), (21 + 8, 21 + 8));
    }

    #[test]
    fn quiet_zone_renders_white_regardless_of_grid_content() {
        let mut code = solid(21, true);
        code.set_scale(1);
        assert!(!code.at(0, 0));
        assert!(!code.at(3, 10));
        assert!(code.at(4, 4));
    }

    #[test]
    fn at_scales_by_the_configured_factor() {
        let mut code = solid(21, true);
        code.set_scale(2);
        assert!(code.at(8, 8));
        assert!(!code.at(0, 0));
    }
}
