use pixelboard::grid::UserId;

use super::*;

fn row(x: i32, y: i32, color: Rgb, by: &str) -> PixelRow {
    PixelRow { x, y, r: color.r, g: color.g, b: color.b, placed_by: Some(UserId::new(by)) }
}

fn red() -> Rgb {
    Rgb::new(255, 69, 0)
}

fn board() -> Board {
    Board::from_rows(
        &[
            row(0, 0, red(), "ada"),
            row(1, 0, red(), "bob"),
            row(2, 1, Rgb::new(0, 0, 0), "ada"),
            row(9, 9, red(), "eve"),
        ],
        GridDims::new(3, 2),
    )
}

#[test]
fn rows_outside_the_grid_are_skipped() {
    let board = board();
    assert_eq!(board.skipped, 1);
    assert_eq!(board.grid.get(pixelboard::transform::Cell::new(0, 0)).map(|p| p.color), Some(red()));
}

#[test]
fn rgba_is_row_major_and_opaque() {
    let rgba = board().rgba();
    assert_eq!(rgba.len(), 3 * 2 * 4);
    assert_eq!(&rgba[0..4], &[255, 69, 0, 255]);
    // (2, 0) was never placed.
    assert_eq!(&rgba[8..12], &[255, 255, 255, 255]);
    // (2, 1) is the last texel.
    assert_eq!(&rgba[20..24], &[0, 0, 0, 255]);
}

#[test]
fn summary_counts_cells_placers_and_colours() {
    let summary = board().summary();
    assert_eq!(summary.placed, 3);
    assert_eq!(summary.placers, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.colors, vec![(Rgb::WHITE, 3), (red(), 2), (Rgb::new(0, 0, 0), 1)]);
}

#[test]
fn summary_display_lists_colours() {
    let text = board().summary().to_string();
    assert!(text.starts_with("grid: 3x2 (6 cells)\n"));
    assert!(text.contains("placed: 3 by 2 users"));
    assert!(text.contains("skipped: 1 rows outside the grid"));
    assert!(text.contains("  rgb(255, 69, 0) 2"));
}

#[test]
fn png_round_trips_through_the_decoder() {
    let dir = std::env::temp_dir().join(format!("pixelboard-snapshot-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("board.png");
    board().write_png(&path).unwrap();

    let decoded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (3, 2));
    assert_eq!(decoded.get_pixel(2, 1).0, [0, 0, 0, 255]);
    std::fs::remove_dir_all(&dir).unwrap();
}
