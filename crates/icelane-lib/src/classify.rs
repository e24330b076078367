//! Raster navigability classification.
//!
//! Turns a georeferenced ice/water/land raster into a binary traversability
//! grid. Two strategies cover the two raster families in circulation:
//! palette-indexed extent products (one band of small category codes) and
//! true-color imagery (three channel intensities classified with a blue-ratio
//! heuristic). The strategy is selected once from the band count; per-cell
//! classification is a pure function of the raster and the configuration.

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::raster::{GridCell, Raster};

/// Category code for open water in the palette-indexed extent products.
pub const PALETTE_WATER: u8 = 0;
/// Category code for sea ice.
pub const PALETTE_ICE: u8 = 1;
/// Category code for the circular sensor border / no-data ring.
pub const PALETTE_BORDER: u8 = 253;
/// Category code for land.
pub const PALETTE_LAND: u8 = 254;

/// Navigability state of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    Blocked,
    Traversable,
}

/// Binary traversability grid derived from a classified raster.
///
/// Dimensions always equal the source raster's, and every cell carries a
/// defined state.
#[derive(Debug, Clone)]
pub struct NavigabilityGrid {
    width: usize,
    height: usize,
    cells: Vec<CellState>,
}

impl NavigabilityGrid {
    /// Assemble a grid from row-major cell states.
    ///
    /// # Panics
    ///
    /// Panics if `cells` does not hold exactly `width * height` entries.
    pub fn from_cells(width: usize, height: usize, cells: Vec<CellState>) -> Self {
        assert_eq!(cells.len(), width * height, "cell buffer must fill the grid");
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn state(&self, cell: GridCell) -> CellState {
        self.cells[cell.index(self.width)]
    }

    pub fn is_traversable(&self, cell: GridCell) -> bool {
        self.state(cell) == CellState::Traversable
    }

    /// Signed-coordinate bounds check used by neighbor expansion.
    pub fn in_bounds(&self, row: i64, col: i64) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.height && (col as usize) < self.width
    }

    /// Diagnostic cell counts.
    pub fn summary(&self) -> ClassSummary {
        let traversable = self
            .cells
            .iter()
            .filter(|state| **state == CellState::Traversable)
            .count();
        ClassSummary {
            traversable,
            blocked: self.cells.len() - traversable,
        }
    }
}

/// Traversable/blocked cell counts reported after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassSummary {
    pub traversable: usize,
    pub blocked: usize,
}

impl ClassSummary {
    pub fn total(&self) -> usize {
        self.traversable + self.blocked
    }
}

/// Configuration for palette-indexed rasters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaletteConfig {
    /// Category codes counted as traversable. Everything else is blocked.
    pub traversable_codes: Vec<u8>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        // Surface-vessel profile: open water only.
        Self {
            traversable_codes: vec![PALETTE_WATER],
        }
    }
}

impl PaletteConfig {
    /// Icebreaker profile: ice is traversable alongside open water.
    pub fn icebreaker() -> Self {
        Self {
            traversable_codes: vec![PALETTE_WATER, PALETTE_ICE],
        }
    }
}

/// Configuration for true-color rasters.
///
/// Calibration varies by sensor and season; the defaults match the values
/// used against mid-latitude autumn scenes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorRatioConfig {
    /// Minimum ratio of blue to the red/green mean for a water call.
    pub water_blue_ratio: f32,
    /// Minimum absolute blue intensity for a water call.
    pub blue_min: u8,
    /// Minimum per-channel intensity for an ice call.
    pub ice_brightness: u8,
}

impl Default for ColorRatioConfig {
    fn default() -> Self {
        Self {
            water_blue_ratio: 1.2,
            blue_min: 80,
            ice_brightness: 220,
        }
    }
}

/// Surface class assigned to a true-color pixel before the binary collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurfaceClass {
    Water,
    Ice,
    Land,
}

#[derive(Debug, Default, Clone, Copy)]
struct ColorCounts {
    water: usize,
    ice: usize,
    land: usize,
}

/// Classification strategy, selected once from the raster band layout.
#[derive(Debug, Clone)]
pub enum Classifier {
    Palette(PaletteConfig),
    ColorRatio(ColorRatioConfig),
}

impl Classifier {
    /// Select the default strategy matching a raster's band count.
    pub fn for_raster(raster: &Raster) -> Result<Self> {
        match raster.band_count() {
            1 => Ok(Classifier::Palette(PaletteConfig::default())),
            n if n >= 3 => Ok(Classifier::ColorRatio(ColorRatioConfig::default())),
            n => Err(Error::UnsupportedRasterFormat { bands: n }),
        }
    }

    /// Classify a raster into a navigability grid of identical dimensions.
    pub fn classify(&self, raster: &Raster) -> Result<NavigabilityGrid> {
        match self {
            Classifier::Palette(config) => classify_palette(raster, config),
            Classifier::ColorRatio(config) => classify_color(raster, config),
        }
    }
}

fn classify_palette(raster: &Raster, config: &PaletteConfig) -> Result<NavigabilityGrid> {
    if raster.band_count() != 1 {
        return Err(Error::UnsupportedRasterFormat {
            bands: raster.band_count(),
        });
    }

    let width = raster.width();
    let band = raster.band(0);

    // Rows are independent, so classification fans out across them.
    let rows: Vec<Vec<CellState>> = (0..raster.height())
        .into_par_iter()
        .map(|row| {
            band[row * width..(row + 1) * width]
                .iter()
                .map(|code| {
                    if config.traversable_codes.contains(code) {
                        CellState::Traversable
                    } else {
                        CellState::Blocked
                    }
                })
                .collect()
        })
        .collect();

    let grid = collect_rows(width, raster.height(), rows);
    let summary = grid.summary();
    debug!(
        traversable = summary.traversable,
        blocked = summary.blocked,
        "classified palette raster"
    );
    Ok(grid)
}

fn classify_color(raster: &Raster, config: &ColorRatioConfig) -> Result<NavigabilityGrid> {
    if raster.band_count() < 3 {
        return Err(Error::UnsupportedRasterFormat {
            bands: raster.band_count(),
        });
    }

    let width = raster.width();
    let (red, green, blue) = (raster.band(0), raster.band(1), raster.band(2));

    let rows: Vec<(Vec<CellState>, ColorCounts)> = (0..raster.height())
        .into_par_iter()
        .map(|row| {
            let mut counts = ColorCounts::default();
            let states = (row * width..(row + 1) * width)
                .map(|i| {
                    let class = classify_pixel(red[i], green[i], blue[i], config);
                    match class {
                        SurfaceClass::Water => counts.water += 1,
                        SurfaceClass::Ice => counts.ice += 1,
                        SurfaceClass::Land => counts.land += 1,
                    }
                    if class == SurfaceClass::Water {
                        CellState::Traversable
                    } else {
                        CellState::Blocked
                    }
                })
                .collect();
            (states, counts)
        })
        .collect();

    let mut totals = ColorCounts::default();
    let mut cells = Vec::with_capacity(width * raster.height());
    for (states, counts) in rows {
        cells.extend(states);
        totals.water += counts.water;
        totals.ice += counts.ice;
        totals.land += counts.land;
    }

    debug!(
        water = totals.water,
        ice = totals.ice,
        land = totals.land,
        "classified color raster"
    );
    Ok(NavigabilityGrid::from_cells(width, raster.height(), cells))
}

fn classify_pixel(red: u8, green: u8, blue: u8, config: &ColorRatioConfig) -> SurfaceClass {
    let (r, g, b) = (red as f32, green as f32, blue as f32);

    // Guard against a zero red/green mean on pure-blue pixels.
    let mean_rg = (r + g) / 2.0 + 1e-6;
    let blue_ratio = b / mean_rg;

    if blue_ratio >= config.water_blue_ratio && blue >= config.blue_min {
        SurfaceClass::Water
    } else if red >= config.ice_brightness
        && green >= config.ice_brightness
        && blue >= config.ice_brightness
    {
        SurfaceClass::Ice
    } else {
        SurfaceClass::Land
    }
}

fn collect_rows(width: usize, height: usize, rows: Vec<Vec<CellState>>) -> NavigabilityGrid {
    let mut cells = Vec::with_capacity(width * height);
    for row in rows {
        cells.extend(row);
    }
    NavigabilityGrid::from_cells(width, height, cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::Crs;
    use crate::raster::GeoTransform;

    fn raster_with_bands(width: usize, height: usize, bands: Vec<Vec<u8>>) -> Raster {
        Raster::new(
            width,
            height,
            bands,
            GeoTransform::north_up(0.0, height as f64, 1.0, -1.0),
            Crs::Wgs84,
            "fixture",
        )
        .expect("valid fixture raster")
    }

    #[test]
    fn palette_marks_water_traversable_and_the_rest_blocked() {
        let codes = vec![
            PALETTE_WATER,
            PALETTE_ICE,
            PALETTE_BORDER,
            PALETTE_LAND,
            PALETTE_WATER,
            PALETTE_WATER,
        ];
        let raster = raster_with_bands(3, 2, vec![codes]);
        let grid = Classifier::Palette(PaletteConfig::default())
            .classify(&raster)
            .unwrap();

        assert_eq!(grid.summary(), ClassSummary { traversable: 3, blocked: 3 });
        assert!(grid.is_traversable(GridCell::new(0, 0)));
        assert!(!grid.is_traversable(GridCell::new(0, 1)));
        assert!(!grid.is_traversable(GridCell::new(1, 0)));
    }

    #[test]
    fn icebreaker_profile_traverses_ice() {
        let codes = vec![PALETTE_WATER, PALETTE_ICE, PALETTE_LAND, PALETTE_BORDER];
        let raster = raster_with_bands(2, 2, vec![codes]);
        let grid = Classifier::Palette(PaletteConfig::icebreaker())
            .classify(&raster)
            .unwrap();

        assert!(grid.is_traversable(GridCell::new(0, 0)));
        assert!(grid.is_traversable(GridCell::new(0, 1)));
        assert!(!grid.is_traversable(GridCell::new(1, 0)));
        assert!(!grid.is_traversable(GridCell::new(1, 1)));
    }

    #[test]
    fn color_ratio_separates_water_ice_and_land() {
        // Pixels: deep water, bright ice, dark rock, and a blue pixel too dim
        // to pass the absolute blue floor.
        let red = vec![20, 240, 90, 10];
        let green = vec![40, 245, 80, 20];
        let blue = vec![200, 250, 70, 60];
        let raster = raster_with_bands(2, 2, vec![red, green, blue]);
        let grid = Classifier::ColorRatio(ColorRatioConfig::default())
            .classify(&raster)
            .unwrap();

        assert!(grid.is_traversable(GridCell::new(0, 0)));
        assert!(!grid.is_traversable(GridCell::new(0, 1)));
        assert!(!grid.is_traversable(GridCell::new(1, 0)));
        assert!(!grid.is_traversable(GridCell::new(1, 1)));
    }

    #[test]
    fn alpha_band_is_ignored_in_color_mode() {
        let red = vec![20; 4];
        let green = vec![40; 4];
        let blue = vec![200; 4];
        let alpha = vec![255; 4];
        let raster = raster_with_bands(2, 2, vec![red, green, blue, alpha]);
        let grid = Classifier::for_raster(&raster)
            .unwrap()
            .classify(&raster)
            .unwrap();

        assert_eq!(grid.summary().traversable, 4);
    }

    #[test]
    fn two_band_raster_is_rejected() {
        let raster = raster_with_bands(2, 2, vec![vec![0; 4], vec![0; 4]]);
        let err = Classifier::for_raster(&raster).unwrap_err();
        assert!(matches!(err, Error::UnsupportedRasterFormat { bands: 2 }));
    }

    #[test]
    fn grid_dimensions_match_the_raster() {
        let raster = raster_with_bands(5, 3, vec![vec![PALETTE_WATER; 15]]);
        let grid = Classifier::for_raster(&raster)
            .unwrap()
            .classify(&raster)
            .unwrap();
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.summary().total(), 15);
    }
}
