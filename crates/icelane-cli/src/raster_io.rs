//! File-backed raster and corridor loading.
//!
//! The library core works on in-memory rasters only; this module owns the
//! file formats the CLI accepts: PNG/TIFF pixel data via `image`, an ESRI
//! world-file sidecar for the affine georeference, and GeoJSON line layers
//! for shipping corridors.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use geojson::{GeoJson, Value};
use image::DynamicImage;
use tracing::{debug, warn};

use icelane_lib::{Crs, GeoTransform, GridCell, NavigabilityGrid, Raster};

/// Sidecar extensions tried for the world file, in order.
const WORLD_FILE_EXTENSIONS: [&str; 3] = ["wld", "pgw", "tfw"];

/// Load a georeferenced raster: pixel data from the image file, affine
/// transform from its world-file sidecar.
///
/// Grayscale images become single-band palette rasters; everything else is
/// decoded to RGB (dropping any alpha channel) for the color-ratio
/// classifier.
pub fn load_raster(path: &Path, epsg: u32) -> Result<Raster> {
    let crs = Crs::from_epsg(epsg)?;
    let transform = read_world_file(path)?;

    let img = image::open(path)
        .with_context(|| format!("failed to open raster image {}", path.display()))?;

    let (width, height, bands) = match img {
        DynamicImage::ImageLuma8(gray) => {
            let (width, height) = gray.dimensions();
            (width, height, vec![gray.into_raw()])
        }
        other => {
            let rgb = other.to_rgb8();
            let (width, height) = rgb.dimensions();
            let pixels = rgb.into_raw();
            let mut red = Vec::with_capacity(pixels.len() / 3);
            let mut green = Vec::with_capacity(pixels.len() / 3);
            let mut blue = Vec::with_capacity(pixels.len() / 3);
            for chunk in pixels.chunks_exact(3) {
                red.push(chunk[0]);
                green.push(chunk[1]);
                blue.push(chunk[2]);
            }
            (width, height, vec![red, green, blue])
        }
    };

    debug!(width, height, bands = bands.len(), "loaded raster image");
    let raster = Raster::new(
        width as usize,
        height as usize,
        bands,
        transform,
        crs,
        path.display().to_string(),
    )?;
    Ok(raster)
}

/// Parse the six-line ESRI world file next to the raster.
///
/// World files georeference the *center* of the top-left pixel; the values
/// are shifted by half a pixel to the corner convention used internally.
fn read_world_file(raster_path: &Path) -> Result<GeoTransform> {
    let path = find_world_file(raster_path).with_context(|| {
        format!(
            "no world file ({}) found next to {}",
            WORLD_FILE_EXTENSIONS.join("/"),
            raster_path.display()
        )
    })?;

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read world file {}", path.display()))?;
    let values: Vec<f64> = contents
        .split_whitespace()
        .map(|line| {
            line.parse::<f64>()
                .with_context(|| format!("invalid world file entry {line:?} in {}", path.display()))
        })
        .collect::<Result<_>>()?;

    if values.len() != 6 {
        bail!(
            "world file {} holds {} values, expected 6",
            path.display(),
            values.len()
        );
    }

    // Line order: pixel width, y rotation, x rotation, pixel height,
    // center x and center y of the top-left pixel.
    let [pixel_width, rotation_y, rotation_x, pixel_height, center_x, center_y] =
        [values[0], values[1], values[2], values[3], values[4], values[5]];

    Ok(GeoTransform {
        top_left_x: center_x - pixel_width / 2.0 - rotation_x / 2.0,
        pixel_width,
        rotation_x,
        top_left_y: center_y - rotation_y / 2.0 - pixel_height / 2.0,
        rotation_y,
        pixel_height,
    })
}

fn find_world_file(raster_path: &Path) -> Option<PathBuf> {
    WORLD_FILE_EXTENSIONS
        .iter()
        .map(|ext| raster_path.with_extension(ext))
        .find(|candidate| candidate.is_file())
}

/// Read WGS84 shipping-lane vertices from a GeoJSON file. `LineString` and
/// `MultiLineString` geometries contribute lanes; other geometry types are
/// skipped.
pub fn load_corridors(path: &Path) -> Result<Vec<Vec<(f64, f64)>>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read corridor file {}", path.display()))?;
    let geojson: GeoJson = raw
        .parse()
        .with_context(|| format!("failed to parse corridor GeoJSON {}", path.display()))?;

    let mut lanes = Vec::new();
    let mut skipped = 0usize;
    match geojson {
        GeoJson::FeatureCollection(collection) => {
            for feature in collection.features {
                if let Some(geometry) = feature.geometry {
                    collect_lanes(&geometry.value, &mut lanes, &mut skipped);
                }
            }
        }
        GeoJson::Feature(feature) => {
            if let Some(geometry) = feature.geometry {
                collect_lanes(&geometry.value, &mut lanes, &mut skipped);
            }
        }
        GeoJson::Geometry(geometry) => collect_lanes(&geometry.value, &mut lanes, &mut skipped),
    }

    if skipped > 0 {
        warn!(skipped, "ignored non-line corridor geometries");
    }
    if lanes.is_empty() {
        bail!("corridor file {} holds no line geometries", path.display());
    }
    Ok(lanes)
}

fn collect_lanes(value: &Value, lanes: &mut Vec<Vec<(f64, f64)>>, skipped: &mut usize) {
    match value {
        Value::LineString(line) => lanes.push(positions_to_lane(line)),
        Value::MultiLineString(lines) => {
            lanes.extend(lines.iter().map(|line| positions_to_lane(line)));
        }
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                collect_lanes(&geometry.value, lanes, skipped);
            }
        }
        _ => *skipped += 1,
    }
}

fn positions_to_lane(line: &[Vec<f64>]) -> Vec<(f64, f64)> {
    line.iter()
        .filter(|position| position.len() >= 2)
        .map(|position| (position[0], position[1]))
        .collect()
}

/// Write the navigability grid as a grayscale PNG: white for open water,
/// black for blocked cells.
pub fn write_navmap(grid: &NavigabilityGrid, path: &Path) -> Result<()> {
    let mut img = image::GrayImage::new(grid.width() as u32, grid.height() as u32);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let cell = GridCell::new(y as usize, x as usize);
        *pixel = image::Luma([if grid.is_traversable(cell) { 255 } else { 0 }]);
    }
    img.save(path)
        .with_context(|| format!("failed to write navigability map {}", path.display()))
}
