//! Tile geometry shared by both pixel-source variants.
//!
//! All ragged-edge arithmetic lives here. The two backends translate a tile
//! coordinate into a pixel window through one `TileGrid` so edge behavior can
//! never drift between them.

/// A rectangular pixel window within one resolution level.
///
/// Half-open on both axes: the window covers
/// `[x, x + width) x [y, y + height)` in level pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    /// Left edge in pixels
    pub x: usize,
    /// Top edge in pixels
    pub y: usize,
    /// Window width in pixels (always > 0)
    pub width: usize,
    /// Window height in pixels (always > 0)
    pub height: usize,
}

impl PixelWindow {
    /// Number of pixels covered by the window.
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// The tiling grid of one resolution level.
///
/// For tile coordinate `(x, y)` with nominal tile size `t` over an image of
/// extent `(W, H)`, the pixel window is
/// `[x*t, min((x+1)*t, W)) x [y*t, min((y+1)*t, H))`. Tiles in the final row
/// or column may be ragged (smaller than `t`); a zero-area window on either
/// axis means the coordinate is off the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_size: usize,
}

impl TileGrid {
    /// Create a grid over an image extent.
    ///
    /// # Panics
    /// Panics if `tile_size` is zero; an untiled source has no grid and must
    /// not construct one.
    pub fn new(width: usize, height: usize, tile_size: usize) -> Self {
        assert!(tile_size > 0, "tile grid requires a positive tile size");
        Self {
            width,
            height,
            tile_size,
        }
    }

    /// Nominal tile size in pixels.
    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    /// Number of tile columns: `ceil(width / tile_size)`.
    pub fn tiles_x(&self) -> usize {
        self.width.div_ceil(self.tile_size)
    }

    /// Number of tile rows: `ceil(height / tile_size)`.
    pub fn tiles_y(&self) -> usize {
        self.height.div_ceil(self.tile_size)
    }

    /// Whether a tile coordinate lies on the grid.
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.tiles_x() && y < self.tiles_y()
    }

    /// Pixel window for tile `(x, y)`, clipped to the image boundary.
    ///
    /// Returns `None` for coordinates entirely off the grid; callers map that
    /// to `TileError::OutOfBounds`.
    pub fn window(&self, x: usize, y: usize) -> Option<PixelWindow> {
        let x0 = x.checked_mul(self.tile_size)?;
        let y0 = y.checked_mul(self.tile_size)?;
        if x0 >= self.width || y0 >= self.height {
            return None;
        }
        let width = (x0 + self.tile_size).min(self.width) - x0;
        let height = (y0 + self.tile_size).min(self.height) - y0;
        Some(PixelWindow {
            x: x0,
            y: y0,
            width,
            height,
        })
    }
}
