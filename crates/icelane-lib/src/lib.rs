//! Icelane library entry points.
//!
//! This crate turns a georeferenced ice/water/land raster into a binary
//! navigability grid, finds a least-cost route between two geographic points
//! with an optional shipping-corridor preference, and re-projects the result
//! into an antimeridian-safe GeoJSON route. Higher-level consumers (the CLI,
//! services) should only depend on the functions exported here instead of
//! reimplementing behavior.
//!
//! Raster and corridor data are fully materialized in memory before any
//! search begins; file and network I/O belong to the caller.

#![deny(warnings)]

pub mod classify;
pub mod corridor;
pub mod crs;
pub mod error;
pub mod export;
pub mod geocode;
pub mod raster;
pub mod routing;
pub mod search;

pub use classify::{
    CellState, ClassSummary, Classifier, ColorRatioConfig, NavigabilityGrid, PaletteConfig,
};
pub use corridor::{CorridorConfig, CorridorModel};
pub use crs::Crs;
pub use error::{Error, Result};
pub use export::{split_antimeridian, trace_route, unwrap_longitudes, GeoRoute, RouteMetadata};
pub use geocode::{CellLookup, Geocoder};
pub use raster::{GeoTransform, GridCell, Raster};
pub use routing::{export_route, plan_route, RoutePlan, RouteRequest, RouteWarning};
pub use search::{find_path, snap_to_open, PixelPath, SearchLimits, TraversalCosts};
