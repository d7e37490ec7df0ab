//! Conversion between geographic coordinates and spherical web mercator.
//!
//! Only two reference systems are meaningful to the pipeline: WGS84
//! longitude/latitude in degrees (EPSG:4326) and web mercator meters
//! (EPSG:3857). Anything else is rejected with [`Error::UnsupportedSrid`].

use std::f64::consts::PI;

use crate::geometry::{Geometry, G};
use crate::transform::{apply_to_points, clone_geometry};
use crate::{Error, Result};

/// Sphere radius used by EPSG:3857, in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude beyond which the projection is clamped (the square-world limit).
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Half the side of the projected world, in meters.
pub const WORLD_HALF_SIZE: f64 = PI * EARTH_RADIUS;

/// Spatial reference identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Srid {
    /// Longitude/latitude in degrees (EPSG:4326).
    Wgs84,
    /// Spherical web mercator meters (EPSG:3857).
    WebMercator,
    /// Any other code. Never valid for conversion.
    Other(u32),
}

impl Srid {
    pub const WGS84_CODE: u32 = 4326;
    pub const WEB_MERCATOR_CODE: u32 = 3857;

    pub fn code(self) -> u32 {
        match self {
            Srid::Wgs84 => Self::WGS84_CODE,
            Srid::WebMercator => Self::WEB_MERCATOR_CODE,
            Srid::Other(code) => code,
        }
    }
}

impl From<u32> for Srid {
    fn from(code: u32) -> Self {
        match code {
            Self::WGS84_CODE => Srid::Wgs84,
            Self::WEB_MERCATOR_CODE => Srid::WebMercator,
            other => Srid::Other(other),
        }
    }
}

impl std::fmt::Display for Srid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.code())
    }
}

/// Project one `[lon, lat, ...]` tuple to `[x, y, ...]` meters.
///
/// Latitude is clamped to ±[`MAX_LATITUDE`]. Ordinates after the first two
/// are copied through.
pub fn lon_lat_to_xy(c: &[f64]) -> Result<Vec<f64>> {
    if c.len() < 2 {
        return Err(Error::InsufficientCoordinates {
            expected: 2,
            got: c.len(),
        });
    }
    let lat = c[1].clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = EARTH_RADIUS * c[0].to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + lat / 2.0).tan().ln();

    let mut out = Vec::with_capacity(c.len());
    out.push(x);
    out.push(y);
    out.extend_from_slice(&c[2..]);
    Ok(out)
}

/// Inverse of [`lon_lat_to_xy`].
pub fn xy_to_lon_lat(c: &[f64]) -> Result<Vec<f64>> {
    if c.len() < 2 {
        return Err(Error::InsufficientCoordinates {
            expected: 2,
            got: c.len(),
        });
    }
    let lon = (c[0] / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (c[1] / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();

    let mut out = Vec::with_capacity(c.len());
    out.push(lon);
    out.push(lat);
    out.extend_from_slice(&c[2..]);
    Ok(out)
}

/// Convert `geometry` from `srid` into web mercator.
///
/// Geometry already in web mercator comes back as a deep copy.
pub fn to_web_mercator(srid: Srid, geometry: &Geometry) -> Result<G> {
    match srid {
        Srid::WebMercator => clone_geometry(geometry),
        Srid::Wgs84 => apply_to_points(geometry, lon_lat_to_xy),
        Srid::Other(code) => Err(Error::UnsupportedSrid(code)),
    }
}

/// Convert web mercator `geometry` into `srid`.
///
/// Asking for web mercator returns a deep copy.
pub fn from_web_mercator(srid: Srid, geometry: &Geometry) -> Result<G> {
    match srid {
        Srid::WebMercator => clone_geometry(geometry),
        Srid::Wgs84 => apply_to_points(geometry, xy_to_lon_lat),
        Srid::Other(code) => Err(Error::UnsupportedSrid(code)),
    }
}
