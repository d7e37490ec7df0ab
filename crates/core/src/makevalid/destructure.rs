//! Break polygon rings into a soup of segments clipped to an extent.

use crate::extent::Extent;
use crate::geometry::{Geometry, LineString, Polygon};
use crate::{Error, Result};

/// A line segment between two coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub a: [f64; 2],
    pub b: [f64; 2],
}

impl Segment {
    pub fn new(a: [f64; 2], b: [f64; 2]) -> Self {
        Self { a, b }
    }

    pub fn min_x(&self) -> f64 {
        self.a[0].min(self.b[0])
    }

    pub fn max_x(&self) -> f64 {
        self.a[0].max(self.b[0])
    }

    pub fn min_y(&self) -> f64 {
        self.a[1].min(self.b[1])
    }

    pub fn max_y(&self) -> f64 {
        self.a[1].max(self.b[1])
    }

    pub(crate) fn to_geo_line(self) -> geo::Line<f64> {
        geo::Line::new(
            geo::Coord {
                x: self.a[0],
                y: self.a[1],
            },
            geo::Coord {
                x: self.b[0],
                y: self.b[1],
            },
        )
    }
}

/// Every edge of every ring of a polygon or multipolygon, clipped to
/// `extent`. Edges wholly outside the extent and zero-length edges are
/// dropped. Rings are treated as closed.
pub fn destructure(geometry: &Geometry, extent: &Extent) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    match geometry {
        Geometry::Polygon(poly) => push_polygon(&mut segments, poly, extent),
        Geometry::MultiPolygon(mp) => {
            for poly in &mp.0 {
                push_polygon(&mut segments, poly, extent);
            }
        }
        other => return Err(Error::UnsupportedGeometryType(other.type_name().to_string())),
    }
    Ok(segments)
}

fn push_polygon(out: &mut Vec<Segment>, poly: &Polygon, extent: &Extent) {
    for ring in &poly.0 {
        push_ring(out, ring, extent);
    }
}

fn push_ring(out: &mut Vec<Segment>, ring: &LineString, extent: &Extent) {
    let n = ring.len();
    if n < 2 {
        return;
    }
    for i in 0..n {
        let a = ring.0[i].coords();
        let b = ring.0[(i + 1) % n].coords();
        if a == b {
            continue;
        }
        if let Some(segment) = clip_segment(a, b, extent) {
            out.push(segment);
        }
    }
}

/// Liang-Barsky clip of `a -> b` against `extent`.
///
/// Endpoints that are already inside are returned bit-for-bit, and a clipped
/// endpoint lies exactly on the boundary it was clipped against.
pub fn clip_segment(a: [f64; 2], b: [f64; 2], extent: &Extent) -> Option<Segment> {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    let mut enter = None;
    let mut exit = None;

    for (p, q, axis, bound) in [
        (-dx, a[0] - extent.min_x, 0, extent.min_x),
        (dx, extent.max_x - a[0], 0, extent.max_x),
        (-dy, a[1] - extent.min_y, 1, extent.min_y),
        (dy, extent.max_y - a[1], 1, extent.max_y),
    ] {
        if p == 0.0 {
            // parallel to this boundary
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            if r > t0 {
                t0 = r;
                enter = Some((axis, bound));
            }
        } else {
            if r < t0 {
                return None;
            }
            if r < t1 {
                t1 = r;
                exit = Some((axis, bound));
            }
        }
    }

    let start = match enter {
        None => a,
        Some(on) => point_at(a, dx, dy, t0, on, extent),
    };
    let end = match exit {
        None => b,
        Some(on) => point_at(a, dx, dy, t1, on, extent),
    };

    (start != end).then_some(Segment::new(start, end))
}

fn point_at(
    a: [f64; 2],
    dx: f64,
    dy: f64,
    t: f64,
    (axis, bound): (usize, f64),
    extent: &Extent,
) -> [f64; 2] {
    let mut p = [
        (a[0] + t * dx).clamp(extent.min_x, extent.max_x),
        (a[1] + t * dy).clamp(extent.min_y, extent.max_y),
    ];
    p[axis] = bound;
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{MultiPolygon, Point};

    fn extent() -> Extent {
        Extent::new(0.0, 0.0, 10.0, 10.0)
    }

    fn square(min: f64, max: f64) -> LineString {
        LineString::new(vec![
            Point::new(min, min),
            Point::new(max, min),
            Point::new(max, max),
            Point::new(min, max),
        ])
    }

    #[test]
    fn test_inside_segment_is_untouched() {
        let seg = clip_segment([1.0, 2.0], [3.0, 4.0], &extent()).unwrap();
        assert_eq!(seg, Segment::new([1.0, 2.0], [3.0, 4.0]));
    }

    #[test]
    fn test_crossing_segment_is_truncated() {
        let seg = clip_segment([-5.0, 5.0], [15.0, 5.0], &extent()).unwrap();
        assert_eq!(seg, Segment::new([0.0, 5.0], [10.0, 5.0]));

        let seg = clip_segment([5.0, 5.0], [5.0, 20.0], &extent()).unwrap();
        assert_eq!(seg, Segment::new([5.0, 5.0], [5.0, 10.0]));
    }

    #[test]
    fn test_outside_segment_is_dropped() {
        assert!(clip_segment([-5.0, -5.0], [-1.0, 20.0], &extent()).is_none());
        assert!(clip_segment([11.0, 0.0], [11.0, 10.0], &extent()).is_none());
        // passes the corner region without entering
        assert!(clip_segment([-5.0, 6.0], [6.0, 17.0], &extent()).is_none());
    }

    #[test]
    fn test_ring_is_closed_implicitly() {
        let poly = Geometry::Polygon(Polygon::new(vec![square(2.0, 4.0)]));
        let segments = destructure(&poly, &extent()).unwrap();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[3], Segment::new([2.0, 4.0], [2.0, 2.0]));
    }

    #[test]
    fn test_duplicate_vertices_and_empty_rings_are_skipped() {
        let ring = LineString::new(vec![
            Point::new(1.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(5.0, 1.0),
            Point::new(5.0, 5.0),
        ]);
        let poly = Geometry::MultiPolygon(MultiPolygon::new(vec![
            Polygon::new(vec![ring]),
            Polygon::new(vec![LineString::default()]),
        ]));
        assert_eq!(destructure(&poly, &extent()).unwrap().len(), 3);
    }

    #[test]
    fn test_polygon_outside_extent_yields_nothing() {
        let poly = Geometry::Polygon(Polygon::new(vec![square(20.0, 30.0)]));
        assert!(destructure(&poly, &extent()).unwrap().is_empty());
    }

    #[test]
    fn test_non_polygon_is_rejected() {
        let line = Geometry::LineString(square(1.0, 2.0));
        assert!(matches!(
            destructure(&line, &extent()),
            Err(Error::UnsupportedGeometryType(_))
        ));
    }
}
