//! Degenerate-geometry filtering for processed tile geometry.
//!
//! After projection, simplification and clipping a feature can end up with
//! nothing worth encoding:
//! - lines with fewer than 2 points
//! - rings with fewer than 3 distinct vertices
//! - polygons with zero or near-zero area
//! - multi-geometries whose every member is degenerate
//!
//! Such features are dropped rather than repaired. Members of a
//! multi-geometry are filtered individually, as are degenerate holes of an
//! otherwise good polygon.
//!
//! ```
//! use tilegeom_core::geometry::{Geometry, LineString, Point};
//! use tilegeom_core::validate::is_valid_geometry;
//!
//! let line = LineString::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
//! assert!(is_valid_geometry(&Geometry::LineString(line)));
//! ```

use crate::geometry::{Geometry, LineString, MultiLineString, MultiPolygon, Polygon};

/// Minimum number of distinct vertices for a ring (rings are stored open)
pub const MIN_RING_POINTS: usize = 3;

/// Minimum number of points for a valid linestring
pub const MIN_LINESTRING_POINTS: usize = 2;

/// Polygons with area below this (in squared tile pixels) are degenerate.
pub const MIN_POLYGON_AREA: f64 = 1e-10;

/// Result of geometry validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(InvalidReason),
}

/// Reason why a geometry is invalid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// Ring has fewer than 3 distinct vertices
    RingTooFewPoints {
        ring_index: usize,
        point_count: usize,
    },
    LineStringTooFewPoints { point_count: usize },
    /// Polygon has zero or near-zero area
    ZeroAreaPolygon,
    /// Geometry has no coordinates
    EmptyGeometry,
    NoValidPolygons,
    NoValidLineStrings,
    /// Variant that never reaches an encoder
    UnsupportedType(&'static str),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn is_invalid(&self) -> bool {
        !self.is_valid()
    }
}

/// Check if a geometry can be encoded as is.
pub fn is_valid_geometry(geom: &Geometry) -> bool {
    validate_geometry(geom).is_valid()
}

/// Validate a geometry and return the reason it would be dropped, if any.
pub fn validate_geometry(geom: &Geometry) -> ValidationResult {
    match geom {
        Geometry::Point(_) | Geometry::Point3(_) => ValidationResult::Valid,
        Geometry::MultiPoint(mp) => {
            if mp.0.is_empty() {
                ValidationResult::Invalid(InvalidReason::EmptyGeometry)
            } else {
                ValidationResult::Valid
            }
        }
        Geometry::LineString(ls) => validate_linestring(ls),
        Geometry::MultiLineString(mls) => validate_multi_linestring(mls),
        Geometry::Polygon(poly) => validate_polygon(poly),
        Geometry::MultiPolygon(mp) => validate_multi_polygon(mp),
        Geometry::Collection(_) => {
            ValidationResult::Invalid(InvalidReason::UnsupportedType(geom.type_name()))
        }
    }
}

pub fn validate_linestring(ls: &LineString) -> ValidationResult {
    let point_count = ls.len();
    if point_count < MIN_LINESTRING_POINTS {
        ValidationResult::Invalid(InvalidReason::LineStringTooFewPoints { point_count })
    } else {
        ValidationResult::Valid
    }
}

pub fn validate_multi_linestring(mls: &MultiLineString) -> ValidationResult {
    if mls.0.is_empty() {
        return ValidationResult::Invalid(InvalidReason::EmptyGeometry);
    }
    if mls.0.iter().any(|ls| validate_linestring(ls).is_valid()) {
        ValidationResult::Valid
    } else {
        ValidationResult::Invalid(InvalidReason::NoValidLineStrings)
    }
}

/// Vertices of an open ring once consecutive duplicates (including the
/// wrap-around pair) are collapsed.
fn distinct_vertices(ring: &LineString) -> usize {
    let n = ring.len();
    (0..n).filter(|&i| ring.0[i] != ring.0[(i + 1) % n]).count()
}

fn validate_ring(ring: &LineString, ring_index: usize) -> ValidationResult {
    let point_count = distinct_vertices(ring);
    if point_count < MIN_RING_POINTS {
        ValidationResult::Invalid(InvalidReason::RingTooFewPoints {
            ring_index,
            point_count,
        })
    } else {
        ValidationResult::Valid
    }
}

/// Validate a polygon's exterior ring and area. Holes are not checked here;
/// [`filter_valid_geometry`] drops degenerate holes instead of the polygon.
pub fn validate_polygon(poly: &Polygon) -> ValidationResult {
    let Some(exterior) = poly.exterior() else {
        return ValidationResult::Invalid(InvalidReason::EmptyGeometry);
    };
    if let ValidationResult::Invalid(reason) = validate_ring(exterior, 0) {
        return ValidationResult::Invalid(reason);
    }
    if poly.area() < MIN_POLYGON_AREA {
        return ValidationResult::Invalid(InvalidReason::ZeroAreaPolygon);
    }
    ValidationResult::Valid
}

pub fn validate_multi_polygon(mp: &MultiPolygon) -> ValidationResult {
    if mp.0.is_empty() {
        return ValidationResult::Invalid(InvalidReason::EmptyGeometry);
    }
    if mp.0.iter().any(|poly| validate_polygon(poly).is_valid()) {
        ValidationResult::Valid
    } else {
        ValidationResult::Invalid(InvalidReason::NoValidPolygons)
    }
}

/// Keep the encodable part of `geom`, or `None` when nothing is left.
///
/// The variant is preserved: a multi-geometry with one surviving member is
/// still a multi-geometry.
pub fn filter_valid_geometry(geom: &Geometry) -> Option<Geometry> {
    match geom {
        Geometry::MultiLineString(mls) => {
            let lines: Vec<LineString> = mls
                .0
                .iter()
                .filter(|ls| validate_linestring(ls).is_valid())
                .cloned()
                .collect();
            (!lines.is_empty()).then(|| Geometry::MultiLineString(MultiLineString(lines)))
        }
        Geometry::Polygon(poly) => filter_polygon(poly).map(Geometry::Polygon),
        Geometry::MultiPolygon(mp) => {
            let polygons: Vec<Polygon> = mp.0.iter().filter_map(filter_polygon).collect();
            (!polygons.is_empty()).then(|| Geometry::MultiPolygon(MultiPolygon(polygons)))
        }
        other => is_valid_geometry(other).then(|| other.clone()),
    }
}

fn filter_polygon(poly: &Polygon) -> Option<Polygon> {
    if validate_polygon(poly).is_invalid() {
        return None;
    }
    let mut rings = Vec::with_capacity(poly.0.len());
    rings.extend(poly.exterior().cloned());
    for (i, hole) in poly.interiors().iter().enumerate() {
        match validate_ring(hole, i + 1) {
            ValidationResult::Valid => rings.push(hole.clone()),
            ValidationResult::Invalid(reason) => log::trace!("dropping hole: {:?}", reason),
        }
    }
    Some(Polygon(rings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{MultiPoint, Point};

    // =========================================================================
    // HELPER FUNCTIONS
    // =========================================================================

    fn make_linestring(coords: &[(f64, f64)]) -> LineString {
        LineString::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    fn make_polygon(exterior: &[(f64, f64)]) -> Polygon {
        Polygon::new(vec![make_linestring(exterior)])
    }

    // =========================================================================
    // POINTS AND LINES
    // =========================================================================

    #[test]
    fn test_points() {
        assert!(is_valid_geometry(&Geometry::Point(Point::new(0.0, 0.0))));
        assert_eq!(
            validate_geometry(&Geometry::MultiPoint(MultiPoint::default())),
            ValidationResult::Invalid(InvalidReason::EmptyGeometry)
        );
    }

    #[test]
    fn test_linestring_point_counts() {
        assert!(validate_linestring(&make_linestring(&[(0.0, 0.0), (1.0, 1.0)])).is_valid());
        assert_eq!(
            validate_linestring(&make_linestring(&[(0.0, 0.0)])),
            ValidationResult::Invalid(InvalidReason::LineStringTooFewPoints { point_count: 1 })
        );
    }

    #[test]
    fn test_multilinestring_keeps_valid_members() {
        let mls = Geometry::MultiLineString(MultiLineString::new(vec![
            make_linestring(&[(0.0, 0.0)]),
            make_linestring(&[(0.0, 0.0), (1.0, 1.0)]),
        ]));
        let filtered = filter_valid_geometry(&mls).expect("one line is valid");
        match filtered {
            Geometry::MultiLineString(m) => assert_eq!(m.0.len(), 1),
            other => panic!("variant must be kept, got {:?}", other),
        }

        let all_bad = Geometry::MultiLineString(MultiLineString::new(vec![make_linestring(&[])]));
        assert_eq!(
            validate_geometry(&all_bad),
            ValidationResult::Invalid(InvalidReason::NoValidLineStrings)
        );
        assert!(filter_valid_geometry(&all_bad).is_none());
    }

    // =========================================================================
    // POLYGONS
    // =========================================================================

    #[test]
    fn test_polygon_valid_triangle() {
        assert!(validate_polygon(&make_polygon(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)])).is_valid());
    }

    #[test]
    fn test_polygon_too_few_distinct_points() {
        let poly = make_polygon(&[(0.0, 0.0), (1.0, 0.0), (1.0, 0.0), (0.0, 0.0)]);
        assert_eq!(
            validate_polygon(&poly),
            ValidationResult::Invalid(InvalidReason::RingTooFewPoints {
                ring_index: 0,
                point_count: 2
            })
        );
    }

    #[test]
    fn test_polygon_zero_area_collinear() {
        let poly = make_polygon(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        assert_eq!(
            validate_polygon(&poly),
            ValidationResult::Invalid(InvalidReason::ZeroAreaPolygon)
        );
    }

    #[test]
    fn test_polygon_without_rings_is_empty() {
        assert_eq!(
            validate_polygon(&Polygon::default()),
            ValidationResult::Invalid(InvalidReason::EmptyGeometry)
        );
    }

    #[test]
    fn test_degenerate_hole_is_dropped_not_the_polygon() {
        let poly = Polygon::new(vec![
            make_linestring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]),
            make_linestring(&[(2.0, 2.0), (3.0, 3.0)]),
        ]);
        let filtered = filter_valid_geometry(&Geometry::Polygon(poly)).expect("shell is fine");
        match filtered {
            Geometry::Polygon(p) => assert_eq!(p.0.len(), 1),
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_multipolygon_filters_members() {
        let mp = Geometry::MultiPolygon(MultiPolygon::new(vec![
            make_polygon(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]),
            make_polygon(&[(5.0, 5.0), (6.0, 6.0), (7.0, 7.0)]),
        ]));
        match filter_valid_geometry(&mp) {
            Some(Geometry::MultiPolygon(m)) => assert_eq!(m.0.len(), 1),
            other => panic!("expected one surviving polygon, got {:?}", other),
        }

        let empty = Geometry::MultiPolygon(MultiPolygon::default());
        assert!(filter_valid_geometry(&empty).is_none());
    }

    #[test]
    fn test_polygon_near_zero_area_but_valid() {
        let poly = make_polygon(&[(0.0, 0.0), (1e-4, 0.0), (0.0, 1e-4)]);
        assert!(validate_polygon(&poly).is_valid());
    }

    #[test]
    fn test_collection_is_not_encodable() {
        assert!(filter_valid_geometry(&Geometry::Collection(vec![])).is_none());
    }

    #[test]
    fn test_validation_result_methods() {
        assert!(ValidationResult::Valid.is_valid());
        assert!(ValidationResult::Invalid(InvalidReason::ZeroAreaPolygon).is_invalid());
    }
}
