//! `seed`: turn an image into a full board of palette colours.

#[cfg(test)]
#[path = "seed_test.rs"]
mod seed_test;

use std::io::{self, Write};

use image::DynamicImage;
use image::imageops::FilterType;
use pixelboard::grid::{Rgb, UserId};
use pixelboard::net::types::PixelRow;
use pixelboard::transform::GridDims;

pub const DEFAULT_PLACED_BY: &str = "seed_script_import";
pub const DEFAULT_OUTPUT: &str = "pixels_seed.csv";

const CSV_HEADER: &str = "x,y,r,g,b,placed_by";

/// Resize `image` to `dims` with nearest-neighbour sampling and snap every
/// texel to the closest palette colour. One row per cell, top row first.
pub fn palette_rows(image: &DynamicImage, dims: GridDims, placed_by: &UserId) -> Vec<PixelRow> {
    let resized = image.resize_exact(dims.width, dims.height, FilterType::Nearest).to_rgb8();
    resized
        .enumerate_pixels()
        .filter_map(|(x, y, texel)| {
            let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) else {
                return None;
            };
            let [r, g, b] = texel.0;
            let color = Rgb::new(r, g, b).nearest_in_palette();
            Some(PixelRow { x, y, r: color.r, g: color.g, b: color.b, placed_by: Some(placed_by.clone()) })
        })
        .collect()
}

/// Write `rows` as `x,y,r,g,b,placed_by` CSV with a header line.
///
/// # Errors
///
/// Returns the writer's I/O error.
pub fn write_csv<W: Write>(rows: &[PixelRow], mut out: W) -> io::Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for row in rows {
        let placed_by = row.placed_by.as_ref().map_or(String::new(), |id| csv_field(id.as_str()));
        writeln!(out, "{},{},{},{},{},{placed_by}", row.x, row.y, row.r, row.g, row.b)?;
    }
    out.flush()
}

/// Quote a field when it holds a separator, a quote or a line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}
