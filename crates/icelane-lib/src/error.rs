use thiserror::Error;

/// Convenient result alias for the icelane library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
///
/// Search-space outcomes that are not defects are deliberately absent: an
/// exhausted frontier is reported as an empty path, and an out-of-extent
/// endpoint is reported as a warning on the route plan.
#[derive(Debug, Error)]
pub enum Error {
    /// Raster band layout not recognized by any classifier.
    #[error("unsupported raster format: {bands} band(s); expected 1 (palette) or 3+ (color)")]
    UnsupportedRasterFormat { bands: usize },

    /// Raised when a band buffer does not match the raster dimensions.
    #[error("raster band {band} holds {samples} samples, expected {expected}")]
    MalformedBand {
        band: usize,
        samples: usize,
        expected: usize,
    },

    /// Raised when the affine georeference cannot be inverted.
    #[error("degenerate affine transform: zero determinant")]
    DegenerateTransform,

    /// No traversable cell within the snap radius around a requested endpoint.
    #[error("no open water cell within {radius} px of ({row}, {col})")]
    NoOpenCellNearby {
        row: usize,
        col: usize,
        radius: usize,
    },

    /// Raised when the search exceeds its expansion budget.
    #[error("search exceeded the expansion budget of {max_expansions} nodes")]
    SearchTimedOut { max_expansions: usize },

    /// Raised when a route export was requested for a plan without any cells.
    #[error("route plan was empty")]
    EmptyRoutePlan,

    /// Raised when corridor geometries are supplied in a geographic reference.
    #[error("corridor model requires a planar CRS for metric distances; got {crs}")]
    CorridorCrs { crs: String },

    /// Raised when an EPSG code has no built-in projection support.
    #[error("unsupported EPSG code: {code}")]
    UnknownEpsg { code: u32 },
}
