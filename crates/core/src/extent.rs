//! Axis-aligned rectangles.
//!
//! An [`Extent`] lives in the same coordinate space as the geometry it is
//! used with: web mercator meters for tile bounds, tile pixels for the clip
//! box handed to the repair stage.

use crate::geometry::{Geometry, LineString, Point, Polygon};

/// Axis-aligned bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    /// Create a new extent
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create an extent from two opposite corners, in any order.
    pub fn from_corners(a: [f64; 2], b: [f64; 2]) -> Self {
        Self::new(a[0].min(b[0]), a[1].min(b[1]), a[0].max(b[0]), a[1].max(b[1]))
    }

    /// Create an empty/invalid extent that any `expand` will overwrite
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Bounding extent of every coordinate in `geometry`, `None` if it has none.
    pub fn from_geometry(geometry: &Geometry) -> Option<Self> {
        let mut extent = Self::empty();
        geometry.for_each_point(&mut |p| extent.expand_to_include(p));
        extent.is_valid().then_some(extent)
    }

    /// Check if this is a valid extent
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Expand this extent to include another
    pub fn expand(&mut self, other: &Self) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn expand_to_include(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// Grow (or shrink, for negative `by`) every side.
    pub fn buffered(&self, by: f64) -> Self {
        Self::new(
            self.min_x - by,
            self.min_y - by,
            self.max_x + by,
            self.max_y + by,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        if self.is_valid() {
            self.width() * self.height()
        } else {
            0.0
        }
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        ]
    }

    /// Inclusive point containment.
    pub fn contains(&self, p: [f64; 2]) -> bool {
        p[0] >= self.min_x && p[0] <= self.max_x && p[1] >= self.min_y && p[1] <= self.max_y
    }

    pub fn contains_extent(&self, other: &Self) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    pub fn intersects(&self, other: &Self) -> bool {
        other.max_x >= self.min_x
            && other.min_x <= self.max_x
            && other.max_y >= self.min_y
            && other.min_y <= self.max_y
    }

    /// The rectangle as a counter-clockwise (positive area) polygon.
    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(vec![LineString::new(vec![
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ])])
    }

    pub(crate) fn to_geo_rect(self) -> geo::Rect<f64> {
        geo::Rect::new(
            geo::Coord {
                x: self.min_x,
                y: self.min_y,
            },
            geo::Coord {
                x: self.max_x,
                y: self.max_y,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MultiPoint;

    #[test]
    fn test_extent_expand() {
        let mut e1 = Extent::new(-10.0, -10.0, 10.0, 10.0);
        let e2 = Extent::new(-20.0, -5.0, 5.0, 15.0);

        e1.expand(&e2);

        assert_eq!(e1.min_x, -20.0);
        assert_eq!(e1.min_y, -10.0);
        assert_eq!(e1.max_x, 10.0);
        assert_eq!(e1.max_y, 15.0);
    }

    #[test]
    fn test_extent_empty() {
        let extent = Extent::empty();
        assert!(!extent.is_valid());
        assert_eq!(extent.area(), 0.0);

        let mut extent = Extent::empty();
        extent.expand(&Extent::new(-10.0, -10.0, 10.0, 10.0));
        assert!(extent.is_valid());
        assert_eq!(extent.min_x, -10.0);
    }

    #[test]
    fn test_from_corners_normalises() {
        let extent = Extent::from_corners([15.0, -5.0], [-5.0, 15.0]);
        assert_eq!(extent, Extent::new(-5.0, -5.0, 15.0, 15.0));
    }

    #[test]
    fn test_from_geometry() {
        let geom = Geometry::MultiPoint(MultiPoint::new(vec![
            Point::new(3.0, -1.0),
            Point::new(-2.0, 4.0),
        ]));
        assert_eq!(
            Extent::from_geometry(&geom),
            Some(Extent::new(-2.0, -1.0, 3.0, 4.0))
        );

        let empty = Geometry::MultiPoint(MultiPoint::default());
        assert_eq!(Extent::from_geometry(&empty), None);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let extent = Extent::new(0.0, 0.0, 10.0, 10.0);
        assert!(extent.contains([0.0, 10.0]));
        assert!(extent.contains([5.0, 5.0]));
        assert!(!extent.contains([10.1, 5.0]));
    }

    #[test]
    fn test_intersects_and_contains_extent() {
        let a = Extent::new(0.0, 0.0, 10.0, 10.0);
        let b = Extent::new(5.0, 5.0, 15.0, 15.0);
        let c = Extent::new(20.0, 20.0, 30.0, 30.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains_extent(&Extent::new(1.0, 1.0, 2.0, 2.0)));
        assert!(!a.contains_extent(&b));
    }

    #[test]
    fn test_buffered_and_polygon() {
        let extent = Extent::new(0.0, 0.0, 4096.0, 4096.0).buffered(64.0);
        assert_eq!(extent, Extent::new(-64.0, -64.0, 4160.0, 4160.0));

        let poly = Extent::new(0.0, 0.0, 2.0, 3.0).to_polygon();
        assert_eq!(poly.area(), 6.0);
        assert!(poly.exterior().map(LineString::signed_area).unwrap_or(0.0) > 0.0);
    }
}
