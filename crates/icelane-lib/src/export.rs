//! Geodetic route export.
//!
//! Maps a pixel path back into WGS84 and emits a GeoJSON feature collection
//! that renders correctly across the antimeridian. Longitudes are first
//! unwrapped as a continuous angular signal, renormalized into [-180, 180),
//! and only then split where a renormalized jump still exceeds 180 degrees,
//! the true seam crossings. A naive jump check without the unwrap stage
//! mis-splits routes whose intermediate points drift past the seam.

use chrono::{SecondsFormat, Utc};
use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::crs::normalize_lon;
use crate::error::{Error, Result};
use crate::geocode::Geocoder;
use crate::raster::GridCell;

/// Geodetic route: one or more contiguous WGS84 segments, none of which
/// crosses the antimeridian internally.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRoute {
    pub segments: Vec<Vec<(f64, f64)>>,
}

impl GeoRoute {
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Build the final vector artifact: a single multi-line feature with the
    /// route metadata attached once at the feature level.
    pub fn to_feature_collection(&self, metadata: &RouteMetadata) -> FeatureCollection {
        let lines: Vec<Vec<Vec<f64>>> = self
            .segments
            .iter()
            .map(|segment| segment.iter().map(|&(lon, lat)| vec![lon, lat]).collect())
            .collect();

        let mut properties = Map::new();
        properties.insert("source".to_string(), JsonValue::from(metadata.source.clone()));
        properties.insert(
            "cell_count".to_string(),
            JsonValue::from(metadata.cell_count),
        );
        properties.insert(
            "total_cost".to_string(),
            JsonValue::from(metadata.total_cost),
        );
        properties.insert(
            "generated_at".to_string(),
            JsonValue::from(metadata.generated_at.clone()),
        );

        let feature = Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::MultiLineString(lines))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        };

        FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        }
    }
}

/// Metadata attached once to the exported route feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteMetadata {
    /// Identifier of the raster the route was planned over.
    pub source: String,
    /// Number of cells in the pixel path.
    pub cell_count: usize,
    /// Accumulated traversal cost.
    pub total_cost: f64,
    /// Generation timestamp, RFC 3339.
    pub generated_at: String,
}

impl RouteMetadata {
    pub fn new(source: impl Into<String>, cell_count: usize, total_cost: f64) -> Self {
        Self {
            source: source.into(),
            cell_count,
            total_cost,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Map a pixel path to WGS84 and split it into antimeridian-safe segments.
pub fn trace_route(cells: &[GridCell], geocoder: &Geocoder) -> Result<GeoRoute> {
    if cells.is_empty() {
        return Err(Error::EmptyRoutePlan);
    }

    let track: Vec<(f64, f64)> = cells.iter().map(|&cell| geocoder.to_lonlat(cell)).collect();
    let lons: Vec<f64> = track.iter().map(|&(lon, _)| lon).collect();
    let lons = unwrap_longitudes(&lons);
    let coords: Vec<(f64, f64)> = lons
        .into_iter()
        .zip(track.iter().map(|&(_, lat)| lat))
        .collect();

    Ok(GeoRoute {
        segments: split_antimeridian(&coords),
    })
}

/// Remove apparent jumps greater than 180 degrees by carrying +-360 offsets
/// through the sequence, then fold every longitude back into [-180, 180).
/// Idempotent on an already-unwrapped sequence.
pub fn unwrap_longitudes(lons: &[f64]) -> Vec<f64> {
    let mut unwrapped = Vec::with_capacity(lons.len());
    let Some(&first) = lons.first() else {
        return unwrapped;
    };

    unwrapped.push(first);
    let mut offset = 0.0;
    for pair in lons.windows(2) {
        let delta = pair[1] - pair[0];
        if delta > 180.0 {
            offset -= 360.0;
        } else if delta < -180.0 {
            offset += 360.0;
        }
        unwrapped.push(pair[1] + offset);
    }

    unwrapped.into_iter().map(normalize_lon).collect()
}

/// Split a renormalized coordinate sequence at true antimeridian crossings.
/// Each new segment repeats the previous segment's last point so adjacent
/// segments stay contiguous at the seam.
pub fn split_antimeridian(coords: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let Some(&first) = coords.first() else {
        return segments;
    };

    let mut current = vec![first];
    for pair in coords.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if (curr.0 - prev.0).abs() > 180.0 {
            segments.push(current);
            current = vec![prev, curr];
        } else {
            current.push(curr);
        }
    }
    segments.push(current);
    segments
}
