//! Shipping-corridor proximity cost model.
//!
//! Known shipping lanes are projected once into a planar reference; the
//! model then answers pure distance and cost-multiplier queries for WGS84
//! points. The multiplier implements a soft preference: full bonus inside
//! the buffered corridor, decaying linearly back to neutral across an outer
//! band two buffer-widths wide.

use geo::{EuclideanDistance, LineString, Point};
use serde::Serialize;
use tracing::{debug, warn};

use crate::crs::Crs;
use crate::error::{Error, Result};

/// Buffer distance and bonus factor for corridor preference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorridorConfig {
    /// Corridor half-width in meters.
    pub buffer_m: f64,
    /// Cost multiplier applied inside the buffer; in (0, 1].
    pub max_bonus: f64,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            buffer_m: 5_000.0,
            max_bonus: 0.5,
        }
    }
}

/// Immutable set of reference shipping-lane geometries with precomputed
/// planar projection.
#[derive(Debug, Clone)]
pub struct CorridorModel {
    lanes: Vec<LineString<f64>>,
    crs: Crs,
    config: CorridorConfig,
}

impl CorridorModel {
    /// Build the model from WGS84 lane vertices, projecting each lane into
    /// `crs` once. Degree-based references are rejected: corridor distances
    /// are metric, and degrees are not uniform length.
    pub fn from_wgs84_lanes(
        lanes: &[Vec<(f64, f64)>],
        crs: Crs,
        config: CorridorConfig,
    ) -> Result<Self> {
        if !crs.is_planar() {
            return Err(Error::CorridorCrs {
                crs: crs.to_string(),
            });
        }

        let mut projected = Vec::with_capacity(lanes.len());
        for lane in lanes {
            if lane.len() < 2 {
                warn!(vertices = lane.len(), "skipping degenerate corridor lane");
                continue;
            }
            let coords: Vec<(f64, f64)> = lane
                .iter()
                .map(|&(lon, lat)| crs.forward(lon, lat))
                .collect();
            projected.push(LineString::from(coords));
        }

        debug!(lanes = projected.len(), %crs, "built corridor model");
        Ok(Self {
            lanes: projected,
            crs,
            config,
        })
    }

    pub fn config(&self) -> CorridorConfig {
        self.config
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Planar distance in meters from a WGS84 point to the closest lane.
    /// Infinite when the model holds no usable lanes.
    pub fn nearest_distance(&self, lon: f64, lat: f64) -> f64 {
        let (x, y) = self.crs.forward(lon, lat);
        let point = Point::new(x, y);
        self.lanes
            .iter()
            .map(|lane| point.euclidean_distance(lane))
            .fold(f64::INFINITY, f64::min)
    }

    /// `true` when the point lies within the buffered corridor zone.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.nearest_distance(lon, lat) <= self.config.buffer_m
    }

    /// Traversal cost multiplier for a WGS84 point: `max_bonus` inside the
    /// buffer, neutral beyond three buffer-widths, linear in between.
    pub fn cost_multiplier(&self, lon: f64, lat: f64) -> f64 {
        let distance = self.nearest_distance(lon, lat);
        let CorridorConfig { buffer_m, max_bonus } = self.config;

        if distance <= buffer_m {
            max_bonus
        } else if distance >= 3.0 * buffer_m {
            1.0
        } else {
            let decay = (distance - buffer_m) / (2.0 * buffer_m);
            max_bonus + (1.0 - max_bonus) * decay
        }
    }
}
