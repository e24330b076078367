//! Built-in coordinate reference support.
//!
//! Rasters arrive either in geographic WGS84 coordinates or in one of the
//! NSIDC sea-ice polar stereographic projections. Both projections share the
//! same ellipsoidal formulation (Snyder, Map Projections: A Working Manual),
//! so this module implements the forward and inverse mappings directly
//! instead of binding a native projection library.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// WGS84 semi-major axis in meters.
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 first eccentricity squared.
const WGS84_E2: f64 = 0.006_694_379_990_141_3;

/// Iteration cutoff for the inverse latitude series.
const INVERSE_TOLERANCE: f64 = 1e-12;
const INVERSE_MAX_ITERATIONS: usize = 16;

/// Coordinate reference of a raster or corridor layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Crs {
    /// Geographic coordinates; projected axes are longitude/latitude degrees.
    Wgs84,
    /// NSIDC Sea Ice Polar Stereographic North (EPSG:3413).
    PolarStereoNorth,
    /// NSIDC Sea Ice Polar Stereographic South (EPSG:3976).
    PolarStereoSouth,
}

impl Crs {
    /// Resolve one of the supported EPSG codes.
    pub fn from_epsg(code: u32) -> Result<Self> {
        match code {
            4326 => Ok(Crs::Wgs84),
            3413 => Ok(Crs::PolarStereoNorth),
            3976 => Ok(Crs::PolarStereoSouth),
            _ => Err(Error::UnknownEpsg { code }),
        }
    }

    /// EPSG code of this reference.
    pub fn epsg(self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::PolarStereoNorth => 3413,
            Crs::PolarStereoSouth => 3976,
        }
    }

    /// `true` when projected distances are metric and uniform.
    pub fn is_planar(self) -> bool {
        !matches!(self, Crs::Wgs84)
    }

    /// Project a WGS84 (longitude, latitude) pair into this reference.
    pub fn forward(self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            Crs::Wgs84 => (lon, lat),
            Crs::PolarStereoNorth => NORTH.forward(lon, lat),
            Crs::PolarStereoSouth => SOUTH.forward(lon, lat),
        }
    }

    /// Invert projected coordinates back to a WGS84 (longitude, latitude) pair.
    pub fn inverse(self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Crs::Wgs84 => (x, y),
            Crs::PolarStereoNorth => NORTH.inverse(x, y),
            Crs::PolarStereoSouth => SOUTH.inverse(x, y),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Polar stereographic parameters: standard parallel and central meridian in
/// degrees, with `south` selecting the aspect.
struct PolarStereo {
    lat_ts_deg: f64,
    lon0_deg: f64,
    south: bool,
}

/// EPSG:3413: latitude of true scale 70 N, central meridian 45 W.
const NORTH: PolarStereo = PolarStereo {
    lat_ts_deg: 70.0,
    lon0_deg: -45.0,
    south: false,
};

/// EPSG:3976: latitude of true scale 70 S, central meridian 0.
const SOUTH: PolarStereo = PolarStereo {
    lat_ts_deg: -70.0,
    lon0_deg: 0.0,
    south: true,
};

impl PolarStereo {
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        if self.south {
            // South aspect: negate the inputs, run the north formulas with
            // mirrored parameters, negate the outputs (Snyder's sign rule).
            let (x, y) = north_forward(-lon, -lat, -self.lat_ts_deg, -self.lon0_deg);
            (-x, -y)
        } else {
            north_forward(lon, lat, self.lat_ts_deg, self.lon0_deg)
        }
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let (lon, lat) = if self.south {
            let (lon, lat) = north_inverse(-x, -y, -self.lat_ts_deg, -self.lon0_deg);
            (-lon, -lat)
        } else {
            north_inverse(x, y, self.lat_ts_deg, self.lon0_deg)
        };
        (normalize_lon(lon), lat)
    }
}

/// Fold a longitude into [-180, 180).
pub(crate) fn normalize_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Isometric colatitude term `t` (Snyder 15-9).
fn half_angle_t(lat: f64) -> f64 {
    let e = WGS84_E2.sqrt();
    let sin_lat = lat.sin();
    let es = e * sin_lat;
    (std::f64::consts::FRAC_PI_4 - lat / 2.0).tan() / ((1.0 - es) / (1.0 + es)).powf(e / 2.0)
}

/// Meridional scale factor `m` (Snyder 14-15).
fn scale_m(lat: f64) -> f64 {
    let sin_lat = lat.sin();
    lat.cos() / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt()
}

fn north_forward(lon: f64, lat: f64, lat_ts_deg: f64, lon0_deg: f64) -> (f64, f64) {
    let lat_ts = lat_ts_deg.to_radians();
    let lam = (lon - lon0_deg).to_radians();
    let phi = lat.to_radians();

    let rho = WGS84_A * scale_m(lat_ts) * half_angle_t(phi) / half_angle_t(lat_ts);
    (rho * lam.sin(), -rho * lam.cos())
}

fn north_inverse(x: f64, y: f64, lat_ts_deg: f64, lon0_deg: f64) -> (f64, f64) {
    let lat_ts = lat_ts_deg.to_radians();
    let rho = x.hypot(y);
    if rho == 0.0 {
        return (lon0_deg, 90.0);
    }

    let t = rho * half_angle_t(lat_ts) / (WGS84_A * scale_m(lat_ts));
    let e = WGS84_E2.sqrt();

    // Fixed-point iteration on the inverse of Snyder 15-9; converges in a
    // handful of rounds for any on-ellipsoid input.
    let mut phi = std::f64::consts::FRAC_PI_2 - 2.0 * t.atan();
    for _ in 0..INVERSE_MAX_ITERATIONS {
        let es = e * phi.sin();
        let next = std::f64::consts::FRAC_PI_2
            - 2.0 * (t * ((1.0 - es) / (1.0 + es)).powf(e / 2.0)).atan();
        if (next - phi).abs() < INVERSE_TOLERANCE {
            phi = next;
            break;
        }
        phi = next;
    }

    let lam = x.atan2(-y);
    (lon0_deg + lam.to_degrees(), phi.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() < tol, "{a} != {b} (tol {tol})");
    }

    #[test]
    fn from_epsg_resolves_supported_codes() {
        assert_eq!(Crs::from_epsg(4326).unwrap(), Crs::Wgs84);
        assert_eq!(Crs::from_epsg(3413).unwrap(), Crs::PolarStereoNorth);
        assert_eq!(Crs::from_epsg(3976).unwrap(), Crs::PolarStereoSouth);
        assert!(Crs::from_epsg(3857).is_err());
    }

    #[test]
    fn wgs84_is_identity() {
        assert_eq!(Crs::Wgs84.forward(-91.6, 62.2), (-91.6, 62.2));
        assert_eq!(Crs::Wgs84.inverse(-79.6, 52.77), (-79.6, 52.77));
    }

    #[test]
    fn north_round_trips_arctic_points() {
        for &(lon, lat) in &[(-91.6, 62.2), (-45.0, 70.0), (10.0, 85.0), (179.5, 75.0)] {
            let (x, y) = Crs::PolarStereoNorth.forward(lon, lat);
            let (lon2, lat2) = Crs::PolarStereoNorth.inverse(x, y);
            assert_close(lon2, lon, 1e-9);
            assert_close(lat2, lat, 1e-9);
        }
    }

    #[test]
    fn south_round_trips_antarctic_points() {
        for &(lon, lat) in &[(0.0, -70.0), (-60.0, -75.0), (170.0, -80.0)] {
            let (x, y) = Crs::PolarStereoSouth.forward(lon, lat);
            let (lon2, lat2) = Crs::PolarStereoSouth.inverse(x, y);
            assert_close(lon2, lon, 1e-9);
            assert_close(lat2, lat, 1e-9);
        }
    }

    #[test]
    fn pole_maps_to_origin() {
        let (x, y) = Crs::PolarStereoNorth.forward(30.0, 90.0);
        assert_close(x, 0.0, 1e-6);
        assert_close(y, 0.0, 1e-6);
    }

    #[test]
    fn central_meridian_lies_on_negative_y_axis() {
        let (x, y) = Crs::PolarStereoNorth.forward(-45.0, 70.0);
        assert_close(x, 0.0, 1e-6);
        assert!(y < 0.0);
    }

    #[test]
    fn points_closer_to_the_pole_project_closer_to_origin() {
        let (x1, y1) = Crs::PolarStereoNorth.forward(-45.0, 70.0);
        let (x2, y2) = Crs::PolarStereoNorth.forward(-45.0, 85.0);
        assert!(x2.hypot(y2) < x1.hypot(y1));
    }
}
