//! Douglas-Peucker simplification.
//!
//! Runs `geo::Simplify` (Ramer-Douglas-Peucker) on every line and every ring
//! independently, in whatever coordinate space the geometry is in. The
//! pipeline calls it on tile-pixel geometry with the tile's
//! [`Tile::z_epsilon`](crate::tile::Tile::z_epsilon) as tolerance, so the
//! reduction is one zoom-scaled pixel budget regardless of latitude.
//!
//! Rings are simplified closed. A ring left with fewer than three distinct
//! vertices is dropped, and a polygon whose exterior is dropped goes with it.

use geo::Simplify;

use crate::config::SimplifyConfig;
use crate::geometry::{Geometry, LineString, MultiLineString, MultiPolygon, Polygon, G};
use crate::tile::Tile;
use crate::transform::clone_geometry;
use crate::{Error, Result};

/// Simplify `geometry` with the given tolerance.
///
/// A tolerance of zero (or any non-positive or non-finite value) returns an
/// unchanged deep copy. Points pass through. Lines keep their endpoints.
pub fn simplify(geometry: &Geometry, tolerance: f64) -> Result<G> {
    if !(tolerance > 0.0 && tolerance.is_finite()) {
        return clone_geometry(geometry);
    }

    match geometry {
        Geometry::Point(_) | Geometry::Point3(_) | Geometry::MultiPoint(_) => {
            clone_geometry(geometry)
        }
        Geometry::LineString(line) => Ok(simplify_line(line, tolerance).into()),
        Geometry::MultiLineString(mls) => Ok(MultiLineString(
            mls.0.iter().map(|l| simplify_line(l, tolerance)).collect(),
        )
        .into()),
        Geometry::Polygon(poly) => Ok(simplify_polygon(poly, tolerance)
            .unwrap_or_default()
            .into()),
        Geometry::MultiPolygon(mp) => Ok(MultiPolygon(
            mp.0
                .iter()
                .filter_map(|p| simplify_polygon(p, tolerance))
                .collect(),
        )
        .into()),
        Geometry::Collection(_) => Err(Error::UnknownGeometry(format!(
            "cannot simplify {}",
            geometry.type_name()
        ))),
    }
}

/// Simplify for a tile, honouring the simplification switches.
///
/// When `config` does not apply at the tile's zoom the geometry comes back as
/// an unchanged copy.
pub fn simplify_for_tile(geometry: &Geometry, tile: &Tile, config: &SimplifyConfig) -> Result<G> {
    if !config.applies_to(tile.z()) {
        return clone_geometry(geometry);
    }
    simplify(geometry, tile.z_epsilon())
}

fn simplify_line(line: &LineString, tolerance: f64) -> LineString {
    // nothing to drop between two endpoints
    if line.len() < 3 {
        return line.clone();
    }
    let simplified = geo::LineString::from(line).simplify(&tolerance);
    LineString::from(&simplified)
}

fn simplify_ring(ring: &LineString, tolerance: f64) -> Option<LineString> {
    if ring.len() < 3 {
        return None;
    }
    let simplified = LineString::from_geo_ring(&ring.to_geo_ring().simplify(&tolerance));
    (simplified.len() >= 3).then_some(simplified)
}

fn simplify_polygon(poly: &Polygon, tolerance: f64) -> Option<Polygon> {
    let mut rings = poly.0.iter();
    let exterior = simplify_ring(rings.next()?, tolerance)?;

    let mut out = Vec::with_capacity(poly.0.len());
    out.push(exterior);
    out.extend(rings.filter_map(|r| simplify_ring(r, tolerance)));
    Some(Polygon(out))
}
