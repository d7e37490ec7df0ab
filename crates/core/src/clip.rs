//! Clipping of tile-pixel geometry to the buffered tile extent.
//!
//! Points are kept by containment and lines are cut with `geo`'s boolean
//! clip. Polygons are not clipped here: they go through
//! [`crate::makevalid::clean`], which clips and repairs in one pass.

use geo::BooleanOps;

use crate::extent::Extent;
use crate::geometry::{Geometry, LineString, MultiLineString, MultiPoint, G};
use crate::makevalid;
use crate::{Error, Result};

/// Clip `geometry` to `extent`.
///
/// Returns `None` when nothing of the geometry is left inside the extent.
pub fn clip_geometry(geometry: &Geometry, extent: &Extent) -> Result<Option<G>> {
    let clipped = match geometry {
        Geometry::Point(p) => extent.contains(p.coords()).then(|| (*p).into()),
        Geometry::Point3(p) => extent.contains([p.x, p.y]).then(|| (*p).into()),
        Geometry::MultiPoint(mp) => {
            let kept: Vec<_> = mp
                .0
                .iter()
                .copied()
                .filter(|p| extent.contains(p.coords()))
                .collect();
            (!kept.is_empty()).then(|| MultiPoint(kept).into())
        }
        Geometry::LineString(line) => clip_lines(std::slice::from_ref(line), extent).map(
            |mut lines| {
                if lines.len() == 1 {
                    lines.remove(0).into()
                } else {
                    MultiLineString(lines).into()
                }
            },
        ),
        Geometry::MultiLineString(mls) => {
            clip_lines(&mls.0, extent).map(|lines| MultiLineString(lines).into())
        }
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) => {
            let repaired = makevalid::clean(geometry, extent)?;
            (!repaired.is_empty()).then_some(repaired)
        }
        Geometry::Collection(_) => {
            return Err(Error::UnknownGeometryType(geometry.type_name().to_string()))
        }
    };
    Ok(clipped)
}

/// Clip lines with `geo`'s boolean clip.
///
/// Lines wholly inside the extent are returned untouched. `None` when no
/// piece of any line is left.
fn clip_lines(lines: &[LineString], extent: &Extent) -> Option<Vec<LineString>> {
    let lines: Vec<&LineString> = lines.iter().filter(|l| l.len() >= 2).collect();
    let mut bbox = Extent::empty();
    for p in lines.iter().flat_map(|l| l.0.iter()) {
        bbox.expand_to_include(*p);
    }

    // quick rejection test
    if !bbox.is_valid() || !extent.intersects(&bbox) {
        return None;
    }
    if extent.contains_extent(&bbox) {
        return Some(lines.into_iter().cloned().collect());
    }

    let clip_poly = extent.to_geo_rect().to_polygon();
    let mls = geo::MultiLineString::new(lines.into_iter().map(geo::LineString::from).collect());

    // polygon.clip(&multilinestring, invert): invert=false keeps the inside
    let clipped = clip_poly.clip(&mls, false);

    let pieces: Vec<LineString> = clipped
        .0
        .iter()
        .map(LineString::from)
        .filter(|l| l.len() >= 2)
        .collect();
    (!pieces.is_empty()).then_some(pieces)
}
