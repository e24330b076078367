// Shared fixture builders for `icelane-lib` integration tests.
#![allow(dead_code)]

use icelane_lib::{CellState, Crs, GeoTransform, Geocoder, NavigabilityGrid, Raster};

/// Grid with every cell traversable.
pub fn open_grid(width: usize, height: usize) -> NavigabilityGrid {
    NavigabilityGrid::from_cells(width, height, vec![CellState::Traversable; width * height])
}

/// Grid from an ASCII sketch: `.` is open water, `#` is blocked.
pub fn grid_from_rows(rows: &[&str]) -> NavigabilityGrid {
    let height = rows.len();
    let width = rows[0].len();
    let mut cells = Vec::with_capacity(width * height);
    for row in rows {
        assert_eq!(row.len(), width, "ragged grid sketch");
        for ch in row.chars() {
            cells.push(match ch {
                '.' => CellState::Traversable,
                '#' => CellState::Blocked,
                other => panic!("unexpected sketch character: {other}"),
            });
        }
    }
    NavigabilityGrid::from_cells(width, height, cells)
}

/// One-degree WGS84 cells anchored at (-100 E, 60 N).
pub fn wgs84_geocoder(width: usize, height: usize) -> Geocoder {
    Geocoder::new(
        GeoTransform::north_up(-100.0, 60.0, 1.0, -1.0),
        Crs::Wgs84,
        width,
        height,
    )
}

/// Single-band palette raster over the same one-degree window.
pub fn palette_raster(width: usize, height: usize, codes: Vec<u8>) -> Raster {
    Raster::new(
        width,
        height,
        vec![codes],
        GeoTransform::north_up(-100.0, 60.0, 1.0, -1.0),
        Crs::Wgs84,
        "test_extent_v1",
    )
    .expect("valid fixture raster")
}

/// 25 km polar stereographic cells centered on the north pole, matching the
/// NSIDC grid layout.
pub fn polar_geocoder(width: usize, height: usize) -> Geocoder {
    Geocoder::new(
        GeoTransform::north_up(
            -(width as f64) / 2.0 * 25_000.0,
            (height as f64) / 2.0 * 25_000.0,
            25_000.0,
            -25_000.0,
        ),
        Crs::PolarStereoNorth,
        width,
        height,
    )
}
