//! `snapshot`: the whole table as a one-pixel-per-cell PNG or a summary.

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use pixelboard::grid::{Grid, Rgb};
use pixelboard::net::types::PixelRow;
use pixelboard::raster::RasterCache;
use pixelboard::transform::GridDims;

/// Rows laid onto a fresh grid, as the viewport would after its initial load.
pub struct Board {
    pub grid: Grid,
    pub skipped: usize,
}

impl Board {
    #[must_use]
    pub fn from_rows(rows: &[PixelRow], dims: GridDims) -> Self {
        let (grid, skipped) = Grid::from_cells(dims, rows.iter().map(|row| (row.cell(), row.pixel())));
        Self { grid, skipped }
    }

    /// Row-major RGBA texels, identical to the browser's raster cache.
    #[must_use]
    pub fn rgba(&self) -> Vec<u8> {
        let mut raster = RasterCache::new(self.grid.dims());
        raster.sync(&self.grid, 0);
        raster.rgba().to_vec()
    }

    /// Write the board as a PNG with one pixel per cell.
    ///
    /// # Errors
    ///
    /// Returns the encoder's error if the file cannot be written.
    pub fn write_png(&self, path: &Path) -> Result<(), image::ImageError> {
        let dims = self.grid.dims();
        image::save_buffer_with_format(
            path,
            &self.rgba(),
            dims.width,
            dims.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        let mut colors: HashMap<Rgb, usize> = HashMap::new();
        let mut placers = HashSet::new();
        let mut placed = 0;
        for (_, pixel) in self.grid.iter() {
            *colors.entry(pixel.color).or_default() += 1;
            if let Some(user) = &pixel.placed_by {
                placed += 1;
                placers.insert(user.clone());
            }
        }
        let mut colors: Vec<(Rgb, usize)> = colors.into_iter().collect();
        colors.sort_by_key(|(color, count)| (std::cmp::Reverse(*count), color.r, color.g, color.b));
        Summary { dims: self.grid.dims(), placed, placers: placers.len(), skipped: self.skipped, colors }
    }
}

/// Counts over a loaded board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub dims: GridDims,
    /// Cells with a recorded placer.
    pub placed: usize,
    /// Distinct placers.
    pub placers: usize,
    /// Rows outside the grid.
    pub skipped: usize,
    /// Cell count per colour, most frequent first.
    pub colors: Vec<(Rgb, usize)>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "grid: {}x{} ({} cells)", self.dims.width, self.dims.height, self.dims.area())?;
        writeln!(f, "placed: {} by {} users", self.placed, self.placers)?;
        if self.skipped > 0 {
            writeln!(f, "skipped: {} rows outside the grid", self.skipped)?;
        }
        for (color, count) in &self.colors {
            writeln!(f, "  {} {count}", color.to_css())?;
        }
        Ok(())
    }
}
