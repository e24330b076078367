//! Route planning orchestration.
//!
//! This module provides:
//! - [`RouteRequest`] - Geographic endpoints plus per-call tunables
//! - [`RoutePlan`] - Planned pixel route with warnings and diagnostics
//! - [`plan_route`] - Main entry point: resolve, snap, search
//! - [`export_route`] - Convert a plan into the geodetic output artifact
//!
//! Search-space failures are kept distinguishable from defects: an endpoint
//! outside the raster extent becomes a warning on the plan, and an exhausted
//! frontier becomes an empty plan, so callers can branch on "no maritime
//! route exists" without catching errors.

use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::NavigabilityGrid;
use crate::corridor::CorridorModel;
use crate::error::Result;
use crate::export::{trace_route, GeoRoute, RouteMetadata};
use crate::geocode::Geocoder;
use crate::raster::GridCell;
use crate::search::{find_path, snap_to_open, SearchLimits, TraversalCosts};

/// Default pixel radius used when snapping a blocked endpoint to open water.
pub const DEFAULT_SNAP_RADIUS: usize = 10;

/// Geographic endpoint pair and tunables for one planning call.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    /// Start point as (longitude, latitude) in WGS84 degrees.
    pub start: (f64, f64),
    /// Goal point as (longitude, latitude) in WGS84 degrees.
    pub goal: (f64, f64),
    /// Snap radius in pixels for endpoints that resolve onto blocked cells.
    pub snap_radius: usize,
    pub limits: SearchLimits,
}

impl RouteRequest {
    pub fn new(start_lon: f64, start_lat: f64, goal_lon: f64, goal_lat: f64) -> Self {
        Self {
            start: (start_lon, start_lat),
            goal: (goal_lon, goal_lat),
            snap_radius: DEFAULT_SNAP_RADIUS,
            limits: SearchLimits::default(),
        }
    }

    pub fn with_snap_radius(mut self, radius: usize) -> Self {
        self.snap_radius = radius;
        self
    }

    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.limits.max_expansions = Some(max_expansions);
        self
    }
}

/// Non-fatal conditions observed while resolving a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteWarning {
    /// The requested start fell outside the raster extent and was clamped.
    StartOutOfBounds,
    /// The requested goal fell outside the raster extent and was clamped.
    GoalOutOfBounds,
}

/// Planned route over a navigability grid.
#[derive(Debug, Clone, Serialize)]
pub struct RoutePlan {
    /// Start cell after snapping.
    pub start_cell: GridCell,
    /// Goal cell after snapping.
    pub goal_cell: GridCell,
    /// Cell sequence from start to goal; empty when no route exists.
    pub cells: Vec<GridCell>,
    pub total_cost: f64,
    /// Nodes expanded by the search, for observability.
    pub expanded: usize,
    pub warnings: Vec<RouteWarning>,
}

impl RoutePlan {
    /// `true` when the search ran to completion without connecting the
    /// endpoints, which is a domain outcome rather than a defect.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// Compute a route between two WGS84 points over a classified grid.
///
/// Steps:
/// 1. Resolve both endpoints to grid cells, collecting out-of-extent
///    warnings instead of failing.
/// 2. Snap endpoints that landed on blocked cells to the nearest open water
///    within the request's snap radius.
/// 3. Run the A* search, scaled by the corridor model when one is supplied.
pub fn plan_route(
    grid: &NavigabilityGrid,
    geocoder: &Geocoder,
    corridor: Option<&CorridorModel>,
    request: &RouteRequest,
) -> Result<RoutePlan> {
    let mut warnings = Vec::new();

    let start_lookup = geocoder.to_cell(request.start.0, request.start.1);
    if !start_lookup.inside_bounds {
        warn!(lon = request.start.0, lat = request.start.1, "start outside raster extent");
        warnings.push(RouteWarning::StartOutOfBounds);
    }
    let goal_lookup = geocoder.to_cell(request.goal.0, request.goal.1);
    if !goal_lookup.inside_bounds {
        warn!(lon = request.goal.0, lat = request.goal.1, "goal outside raster extent");
        warnings.push(RouteWarning::GoalOutOfBounds);
    }

    let start_cell = snap_to_open(grid, start_lookup.cell, request.snap_radius)?;
    let goal_cell = snap_to_open(grid, goal_lookup.cell, request.snap_radius)?;
    debug!(?start_cell, ?goal_cell, "resolved route endpoints");

    let costs = corridor
        .map(|model| TraversalCosts::new(model, geocoder, grid.width(), grid.height()));
    let path = find_path(grid, start_cell, goal_cell, costs.as_ref(), request.limits)?;

    if path.is_empty() {
        debug!(expanded = path.expanded, "no open-water route between endpoints");
    }

    Ok(RoutePlan {
        start_cell,
        goal_cell,
        cells: path.cells,
        total_cost: path.total_cost,
        expanded: path.expanded,
        warnings,
    })
}

/// Convert a plan into the geodetic route artifact and its metadata.
///
/// Fails with [`crate::Error::EmptyRoutePlan`] when the plan holds no cells;
/// check [`RoutePlan::is_empty`] first to branch on the no-route outcome.
pub fn export_route(
    plan: &RoutePlan,
    geocoder: &Geocoder,
    source: impl Into<String>,
) -> Result<(GeoRoute, RouteMetadata)> {
    let route = trace_route(&plan.cells, geocoder)?;
    let metadata = RouteMetadata::new(source, plan.cell_count(), plan.total_cost);
    Ok((route, metadata))
}
