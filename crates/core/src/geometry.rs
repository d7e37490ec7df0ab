//! Geometry model shared by every stage of the pipeline.
//!
//! The set of variants is closed: `Point`, `Point3`, `MultiPoint`,
//! `LineString`, `MultiLineString`, `Polygon` and `MultiPolygon`. Providers may
//! also hand us a `Collection`; it is carried so that it can be rejected with a
//! proper error by the stage that receives it.
//!
//! Rings are stored open: the closing vertex is implied and never repeated.
//! Ring 0 of a polygon is the exterior, rings 1.. are holes.

use geo::Coord;

/// A 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn coords(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl From<[f64; 2]> for Point {
    fn from(c: [f64; 2]) -> Self {
        Point::new(c[0], c[1])
    }
}

/// A 3D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiPoint(pub Vec<Point>);

impl MultiPoint {
    pub fn new(points: Vec<Point>) -> Self {
        Self(points)
    }
}

/// An ordered sequence of points. Also used for polygon rings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineString(pub Vec<Point>);

impl LineString {
    pub fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Shoelace area of the line treated as a closed ring.
    ///
    /// Positive for counter-clockwise rings in a y-up frame (clockwise when
    /// drawn in a y-down pixel frame).
    pub fn signed_area(&self) -> f64 {
        let n = self.0.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice = 0.0;
        for i in 0..n {
            let a = self.0[i];
            let b = self.0[(i + 1) % n];
            twice += a.x * b.y - b.x * a.y;
        }
        twice / 2.0
    }

    /// Convert a ring to a closed `geo` line string.
    pub(crate) fn to_geo_ring(&self) -> geo::LineString<f64> {
        let mut ring = geo::LineString::from(self);
        ring.close();
        ring
    }

    /// Build a ring from a `geo` line string, dropping the closing vertex.
    pub(crate) fn from_geo_ring(ring: &geo::LineString<f64>) -> Self {
        let mut points: Vec<Point> = ring.coords().map(|c| Point::new(c.x, c.y)).collect();
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        LineString(points)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiLineString(pub Vec<LineString>);

impl MultiLineString {
    pub fn new(lines: Vec<LineString>) -> Self {
        Self(lines)
    }
}

/// Rings of a polygon; ring 0 is the exterior.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon(pub Vec<LineString>);

impl Polygon {
    pub fn new(rings: Vec<LineString>) -> Self {
        Self(rings)
    }

    pub fn rings(&self) -> &[LineString] {
        &self.0
    }

    pub fn exterior(&self) -> Option<&LineString> {
        self.0.first()
    }

    pub fn interiors(&self) -> &[LineString] {
        if self.0.is_empty() {
            &[]
        } else {
            &self.0[1..]
        }
    }

    /// Area of the exterior minus the area of the holes.
    pub fn area(&self) -> f64 {
        let Some(exterior) = self.exterior() else {
            return 0.0;
        };
        let holes: f64 = self.interiors().iter().map(|r| r.signed_area().abs()).sum();
        exterior.signed_area().abs() - holes
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiPolygon(pub Vec<Polygon>);

impl MultiPolygon {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self(polygons)
    }

    pub fn area(&self) -> f64 {
        self.0.iter().map(Polygon::area).sum()
    }
}

/// Any geometry a provider can hand to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    Point3(Point3),
    MultiPoint(MultiPoint),
    LineString(LineString),
    MultiLineString(MultiLineString),
    Polygon(Polygon),
    MultiPolygon(MultiPolygon),
    Collection(Vec<Geometry>),
}

impl Geometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::Point3(_) => "Point3",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
            Geometry::Collection(_) => "GeometryCollection",
        }
    }

    /// True when the geometry has no coordinates at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(_) | Geometry::Point3(_) => false,
            Geometry::MultiPoint(mp) => mp.0.is_empty(),
            Geometry::LineString(ls) => ls.0.is_empty(),
            Geometry::MultiLineString(mls) => mls.0.iter().all(LineString::is_empty),
            Geometry::Polygon(poly) => poly.0.iter().all(LineString::is_empty),
            Geometry::MultiPolygon(mp) => {
                mp.0.iter().all(|p| p.0.iter().all(LineString::is_empty))
            }
            Geometry::Collection(items) => items.iter().all(Geometry::is_empty),
        }
    }

    pub fn is_polygonal(&self) -> bool {
        matches!(self, Geometry::Polygon(_) | Geometry::MultiPolygon(_))
    }

    /// Borrowed view used by the recursive walks.
    pub fn view(&self) -> GeometryRef<'_> {
        match self {
            Geometry::Point(p) => GeometryRef::Point(p),
            Geometry::Point3(p) => GeometryRef::Point3(p),
            Geometry::MultiPoint(mp) => GeometryRef::MultiPoint(mp),
            Geometry::LineString(ls) => GeometryRef::LineString(ls),
            Geometry::MultiLineString(mls) => GeometryRef::MultiLineString(mls),
            Geometry::Polygon(poly) => GeometryRef::Polygon(poly),
            Geometry::MultiPolygon(mp) => GeometryRef::MultiPolygon(mp),
            Geometry::Collection(_) => GeometryRef::Other(self),
        }
    }

    /// Visit every x/y coordinate, including those nested in collections.
    pub fn for_each_point(&self, f: &mut impl FnMut(Point)) {
        match self {
            Geometry::Point(p) => f(*p),
            Geometry::Point3(p) => f(Point::new(p.x, p.y)),
            Geometry::MultiPoint(mp) => mp.0.iter().copied().for_each(f),
            Geometry::LineString(ls) => ls.0.iter().copied().for_each(f),
            Geometry::MultiLineString(mls) => {
                mls.0.iter().flat_map(|l| l.0.iter()).copied().for_each(f)
            }
            Geometry::Polygon(poly) => poly.0.iter().flat_map(|r| r.0.iter()).copied().for_each(f),
            Geometry::MultiPolygon(mp) => mp
                .0
                .iter()
                .flat_map(|p| p.0.iter())
                .flat_map(|r| r.0.iter())
                .copied()
                .for_each(f),
            Geometry::Collection(items) => {
                for item in items {
                    item.for_each_point(&mut *f);
                }
            }
        }
    }

    /// Number of x/y coordinates in the geometry.
    pub fn num_points(&self) -> usize {
        let mut count = 0;
        self.for_each_point(&mut |_| count += 1);
        count
    }

    /// Convert to the `geo` representation. The z of a `Point3` is dropped.
    pub fn to_geo(&self) -> geo::Geometry<f64> {
        match self {
            Geometry::Point(p) => geo::Geometry::Point(geo::Point::new(p.x, p.y)),
            Geometry::Point3(p) => geo::Geometry::Point(geo::Point::new(p.x, p.y)),
            Geometry::MultiPoint(mp) => geo::Geometry::MultiPoint(geo::MultiPoint::new(
                mp.0.iter().map(|p| geo::Point::new(p.x, p.y)).collect(),
            )),
            Geometry::LineString(ls) => geo::Geometry::LineString(ls.into()),
            Geometry::MultiLineString(mls) => geo::Geometry::MultiLineString(
                geo::MultiLineString::new(mls.0.iter().map(Into::into).collect()),
            ),
            Geometry::Polygon(poly) => geo::Geometry::Polygon(poly.into()),
            Geometry::MultiPolygon(mp) => geo::Geometry::MultiPolygon(geo::MultiPolygon::new(
                mp.0.iter().map(Into::into).collect(),
            )),
            Geometry::Collection(items) => geo::Geometry::GeometryCollection(
                geo::GeometryCollection::new_from(items.iter().map(Geometry::to_geo).collect()),
            ),
        }
    }
}

/// Borrowed view of a geometry, one arm per member of the closed set.
#[derive(Debug, Clone, Copy)]
pub enum GeometryRef<'a> {
    Point(&'a Point),
    Point3(&'a Point3),
    MultiPoint(&'a MultiPoint),
    LineString(&'a LineString),
    MultiLineString(&'a MultiLineString),
    Polygon(&'a Polygon),
    MultiPolygon(&'a MultiPolygon),
    /// Anything outside the closed set.
    Other(&'a Geometry),
}

macro_rules! impl_from_variant {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for Geometry {
                fn from(value: $ty) -> Self {
                    Geometry::$ty(value)
                }
            }

            impl From<$ty> for G {
                fn from(value: $ty) -> Self {
                    G(Geometry::$ty(value))
                }
            }
        )*
    };
}

impl_from_variant!(Point, Point3, MultiPoint, LineString, MultiLineString, Polygon, MultiPolygon);

/// Owned container for exactly one geometry value.
///
/// Every `G` handed out by the pipeline is a fresh value: mutating it never
/// affects the geometry it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct G(Geometry);

impl G {
    pub fn new(geometry: Geometry) -> Self {
        Self(geometry)
    }

    pub fn geometry(&self) -> &Geometry {
        &self.0
    }

    pub fn geometry_mut(&mut self) -> &mut Geometry {
        &mut self.0
    }

    pub fn into_geometry(self) -> Geometry {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_point(&self) -> bool {
        matches!(self.0, Geometry::Point(_))
    }

    pub fn is_point3(&self) -> bool {
        matches!(self.0, Geometry::Point3(_))
    }

    pub fn is_multi_point(&self) -> bool {
        matches!(self.0, Geometry::MultiPoint(_))
    }

    pub fn is_line(&self) -> bool {
        matches!(self.0, Geometry::LineString(_))
    }

    pub fn is_multi_line(&self) -> bool {
        matches!(self.0, Geometry::MultiLineString(_))
    }

    pub fn is_polygon(&self) -> bool {
        matches!(self.0, Geometry::Polygon(_))
    }

    pub fn is_multi_polygon(&self) -> bool {
        matches!(self.0, Geometry::MultiPolygon(_))
    }

    pub fn as_point(&self) -> Option<&Point> {
        match &self.0 {
            Geometry::Point(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_point3(&self) -> Option<&Point3> {
        match &self.0 {
            Geometry::Point3(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_multi_point(&self) -> Option<&MultiPoint> {
        match &self.0 {
            Geometry::MultiPoint(mp) => Some(mp),
            _ => None,
        }
    }

    pub fn as_line(&self) -> Option<&LineString> {
        match &self.0 {
            Geometry::LineString(ls) => Some(ls),
            _ => None,
        }
    }

    pub fn as_multi_line(&self) -> Option<&MultiLineString> {
        match &self.0 {
            Geometry::MultiLineString(mls) => Some(mls),
            _ => None,
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon> {
        match &self.0 {
            Geometry::Polygon(poly) => Some(poly),
            _ => None,
        }
    }

    pub fn as_multi_polygon(&self) -> Option<&MultiPolygon> {
        match &self.0 {
            Geometry::MultiPolygon(mp) => Some(mp),
            _ => None,
        }
    }
}

impl From<Geometry> for G {
    fn from(geometry: Geometry) -> Self {
        G(geometry)
    }
}

impl From<G> for Geometry {
    fn from(g: G) -> Self {
        g.0
    }
}

// ============================================================================
// Conversions to and from `geo`
// ============================================================================

impl From<&LineString> for geo::LineString<f64> {
    fn from(line: &LineString) -> Self {
        geo::LineString::new(line.0.iter().map(|p| Coord { x: p.x, y: p.y }).collect())
    }
}

impl From<&geo::LineString<f64>> for LineString {
    fn from(line: &geo::LineString<f64>) -> Self {
        LineString(line.coords().map(|c| Point::new(c.x, c.y)).collect())
    }
}

impl From<&Polygon> for geo::Polygon<f64> {
    fn from(poly: &Polygon) -> Self {
        let exterior = poly
            .exterior()
            .map(geo::LineString::from)
            .unwrap_or_else(|| geo::LineString::new(vec![]));
        let interiors = poly.interiors().iter().map(geo::LineString::from).collect();
        // geo::Polygon::new closes every ring
        geo::Polygon::new(exterior, interiors)
    }
}

impl From<&geo::Polygon<f64>> for Polygon {
    fn from(poly: &geo::Polygon<f64>) -> Self {
        let mut rings = Vec::with_capacity(1 + poly.interiors().len());
        rings.push(LineString::from_geo_ring(poly.exterior()));
        rings.extend(poly.interiors().iter().map(LineString::from_geo_ring));
        Polygon(rings)
    }
}

impl From<geo::Geometry<f64>> for Geometry {
    fn from(geom: geo::Geometry<f64>) -> Self {
        Geometry::from(&geom)
    }
}

impl From<&geo::Geometry<f64>> for Geometry {
    fn from(geom: &geo::Geometry<f64>) -> Self {
        match geom {
            geo::Geometry::Point(p) => Geometry::Point(Point::new(p.x(), p.y())),
            geo::Geometry::MultiPoint(mp) => Geometry::MultiPoint(MultiPoint(
                mp.0.iter().map(|p| Point::new(p.x(), p.y())).collect(),
            )),
            geo::Geometry::Line(line) => Geometry::LineString(LineString(vec![
                Point::new(line.start.x, line.start.y),
                Point::new(line.end.x, line.end.y),
            ])),
            geo::Geometry::LineString(ls) => Geometry::LineString(ls.into()),
            geo::Geometry::MultiLineString(mls) => Geometry::MultiLineString(MultiLineString(
                mls.0.iter().map(Into::into).collect(),
            )),
            geo::Geometry::Polygon(poly) => Geometry::Polygon(poly.into()),
            geo::Geometry::MultiPolygon(mp) => {
                Geometry::MultiPolygon(MultiPolygon(mp.0.iter().map(Into::into).collect()))
            }
            geo::Geometry::Rect(rect) => Geometry::Polygon((&rect.to_polygon()).into()),
            geo::Geometry::Triangle(tri) => Geometry::Polygon((&tri.to_polygon()).into()),
            geo::Geometry::GeometryCollection(gc) => {
                Geometry::Collection(gc.0.iter().map(Geometry::from).collect())
            }
        }
    }
}
