//! Point-in-polygon oracle used to label triangles.

use crate::extent::Extent;
use crate::geometry::{Geometry, LineString, Polygon};
use crate::{Error, Result};

/// Which side of the input polygon a point falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Inside,
    Outside,
}

/// Classifies points against a fixed geometry.
pub trait PointOracle {
    fn classify(&self, pt: [f64; 2]) -> Label;
}

struct Ring {
    points: Vec<[f64; 2]>,
    bbox: Extent,
}

impl Ring {
    fn new(ring: &LineString) -> Option<Self> {
        if ring.len() < 3 {
            return None;
        }
        let points: Vec<[f64; 2]> = ring.0.iter().map(|p| p.coords()).collect();
        let mut bbox = Extent::empty();
        for p in &ring.0 {
            bbox.expand_to_include(*p);
        }
        Some(Self { points, bbox })
    }

    /// Even-odd crossing test.
    fn contains(&self, pt: [f64; 2]) -> bool {
        if !self.bbox.contains(pt) {
            return false;
        }
        let [x, y] = pt;
        let mut inside = false;
        let mut j = self.points.len() - 1;
        for i in 0..self.points.len() {
            let [xi, yi] = self.points[i];
            let [xj, yj] = self.points[j];
            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

struct Shape {
    exterior: Ring,
    holes: Vec<Ring>,
}

impl Shape {
    fn new(poly: &Polygon) -> Option<Self> {
        let exterior = Ring::new(poly.exterior()?)?;
        let holes = poly.interiors().iter().filter_map(Ring::new).collect();
        Some(Self { exterior, holes })
    }

    fn contains(&self, pt: [f64; 2]) -> bool {
        self.exterior.contains(pt) && !self.holes.iter().any(|h| h.contains(pt))
    }
}

/// Oracle built once per input geometry.
///
/// A point is inside a polygon when it is inside the exterior ring and
/// outside every hole, and inside a multipolygon when it is inside any of its
/// polygons. Each ring is tested with the even-odd rule, so the lobes of a
/// self-intersecting ring alternate.
pub struct Hitmap {
    shapes: Vec<Shape>,
}

impl Hitmap {
    pub fn new(geometry: &Geometry) -> Result<Self> {
        let shapes = match geometry {
            Geometry::Polygon(poly) => Shape::new(poly).into_iter().collect(),
            Geometry::MultiPolygon(mp) => mp.0.iter().filter_map(Shape::new).collect(),
            other => return Err(Error::UnsupportedGeometryType(other.type_name().to_string())),
        };
        Ok(Self { shapes })
    }
}

impl PointOracle for Hitmap {
    fn classify(&self, pt: [f64; 2]) -> Label {
        if self.shapes.iter().any(|s| s.contains(pt)) {
            Label::Inside
        } else {
            Label::Outside
        }
    }
}
