use serde::Serialize;

use crate::crs::Crs;
use crate::raster::{extent_of, Extent, GeoTransform, GridCell, Raster};

/// Result of resolving a geographic point to a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellLookup {
    pub cell: GridCell,
    /// `false` when the requested point fell outside the raster extent and
    /// the cell is the nearest clamped edge cell instead.
    pub inside_bounds: bool,
}

/// Bidirectional mapping between WGS84 coordinates and grid cells, built from
/// a raster's affine georeference and coordinate reference.
#[derive(Debug, Clone)]
pub struct Geocoder {
    transform: GeoTransform,
    crs: Crs,
    width: usize,
    height: usize,
    extent: Extent,
}

impl Geocoder {
    pub fn new(transform: GeoTransform, crs: Crs, width: usize, height: usize) -> Self {
        let extent = extent_of(&transform, width, height);
        Self {
            transform,
            crs,
            width,
            height,
            extent,
        }
    }

    /// Geocoder for the grid a raster spans.
    pub fn for_raster(raster: &Raster) -> Self {
        Self::new(
            *raster.transform(),
            raster.crs(),
            raster.width(),
            raster.height(),
        )
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// Resolve a WGS84 (longitude, latitude) pair to the nearest grid cell.
    ///
    /// The point is reprojected into the raster reference, clamped to the
    /// raster extent, and quantized to the cell whose center is nearest.
    /// `inside_bounds` reports whether the original point was within the
    /// extent before clamping.
    pub fn to_cell(&self, lon: f64, lat: f64) -> CellLookup {
        let (x, y) = self.crs.forward(lon, lat);
        let inside_bounds = self.extent.contains(x, y);
        let (x, y) = self.extent.clamp(x, y);

        let (row, col) = self.transform.invert(x, y);
        let row = (row.floor() as i64).clamp(0, self.height as i64 - 1) as usize;
        let col = (col.floor() as i64).clamp(0, self.width as i64 - 1) as usize;

        CellLookup {
            cell: GridCell::new(row, col),
            inside_bounds,
        }
    }

    /// WGS84 (longitude, latitude) of a cell's center.
    pub fn to_lonlat(&self, cell: GridCell) -> (f64, f64) {
        let (x, y) = self.transform.cell_center(cell);
        self.crs.inverse(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wgs84_geocoder() -> Geocoder {
        // One-degree cells over a 20x10 window anchored at (-100, 60).
        Geocoder::new(
            GeoTransform::north_up(-100.0, 60.0, 1.0, -1.0),
            Crs::Wgs84,
            20,
            10,
        )
    }

    #[test]
    fn interior_point_resolves_in_bounds() {
        let lookup = wgs84_geocoder().to_cell(-97.4, 57.6);
        assert!(lookup.inside_bounds);
        assert_eq!(lookup.cell, GridCell::new(2, 2));
    }

    #[test]
    fn exterior_point_clamps_to_the_nearest_edge_cell() {
        let geocoder = wgs84_geocoder();

        let west = geocoder.to_cell(-120.0, 55.0);
        assert!(!west.inside_bounds);
        assert_eq!(west.cell.col, 0);

        let north = geocoder.to_cell(-90.0, 89.0);
        assert!(!north.inside_bounds);
        assert_eq!(north.cell.row, 0);
    }

    #[test]
    fn round_trip_is_within_one_cell() {
        let geocoder = wgs84_geocoder();
        for row in 0..10 {
            for col in 0..20 {
                let cell = GridCell::new(row, col);
                let (lon, lat) = geocoder.to_lonlat(cell);
                let lookup = geocoder.to_cell(lon, lat);
                assert!(lookup.inside_bounds);
                assert!(lookup.cell.chebyshev_distance(cell) <= 1);
            }
        }
    }

    #[test]
    fn polar_raster_round_trips_through_the_projection() {
        // 25 km cells centered on the north pole, the NSIDC grid layout.
        let geocoder = Geocoder::new(
            GeoTransform::north_up(-500_000.0, 500_000.0, 25_000.0, -25_000.0),
            Crs::PolarStereoNorth,
            40,
            40,
        );

        let cell = GridCell::new(5, 31);
        let (lon, lat) = geocoder.to_lonlat(cell);
        let lookup = geocoder.to_cell(lon, lat);
        assert!(lookup.inside_bounds);
        assert!(lookup.cell.chebyshev_distance(cell) <= 1);
    }
}
