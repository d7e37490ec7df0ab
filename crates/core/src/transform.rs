//! Generic coordinate walk over every geometry variant.
//!
//! [`apply_to_points`] rebuilds a geometry of the same shape with every
//! coordinate passed through a caller-supplied function. [`clone_geometry`] is
//! the same walk with the identity function, which yields a deep copy that
//! shares no storage with its input.

use crate::geometry::{
    Geometry, GeometryRef, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Point3,
    Polygon, G,
};
use crate::{Error, Result};

/// Apply `f` to every coordinate of `geometry` and return the rebuilt geometry.
///
/// `f` receives the ordinates of one point (`[x, y]` or `[x, y, z]`) and
/// returns the transformed ordinates. It may return more values than it was
/// given; returning fewer than the variant needs fails with
/// [`Error::InsufficientCoordinates`].
///
/// A failure inside a child line or polygon is wrapped with the child's index
/// and fails the whole call; no partial geometry is returned.
///
/// # Example
///
/// ```
/// use tilegeom_core::geometry::{Geometry, Point};
/// use tilegeom_core::transform::apply_to_points;
///
/// let pt = Geometry::Point(Point::new(1.0, 2.0));
/// let moved = apply_to_points(&pt, |c| Ok(vec![c[0] + 1.0, c[1] * 2.0])).unwrap();
/// assert_eq!(moved.as_point(), Some(&Point::new(2.0, 4.0)));
/// ```
pub fn apply_to_points<F>(geometry: &Geometry, f: F) -> Result<G>
where
    F: Fn(&[f64]) -> Result<Vec<f64>>,
{
    walk(geometry.view(), &f)
}

/// Deep copy of `geometry`.
///
/// Fails with [`Error::UnknownGeometry`] for variants outside the closed set,
/// exactly like [`apply_to_points`].
pub fn clone_geometry(geometry: &Geometry) -> Result<G> {
    walk(geometry.view(), &|c: &[f64]| Ok(c.to_vec()))
}

fn walk<F>(view: GeometryRef<'_>, f: &F) -> Result<G>
where
    F: Fn(&[f64]) -> Result<Vec<f64>>,
{
    match view {
        GeometryRef::Point(pt) => Ok(apply_2d(pt, f)?.into()),
        GeometryRef::Point3(pt) => {
            let c = f(&[pt.x, pt.y, pt.z])?;
            require(&c, 3)?;
            Ok(Point3::new(c[0], c[1], c[2]).into())
        }
        GeometryRef::MultiPoint(mp) => {
            let points = mp
                .0
                .iter()
                .map(|pt| apply_2d(pt, f))
                .collect::<Result<Vec<_>>>()?;
            Ok(MultiPoint(points).into())
        }
        GeometryRef::LineString(line) => {
            let points = line
                .0
                .iter()
                .map(|pt| apply_2d(pt, f))
                .collect::<Result<Vec<_>>>()?;
            Ok(LineString(points).into())
        }
        GeometryRef::MultiLineString(mls) => {
            let mut lines = Vec::with_capacity(mls.0.len());
            for (i, line) in mls.0.iter().enumerate() {
                let g = walk(GeometryRef::LineString(line), f)
                    .map_err(|e| Error::child("line", "multiline", i, e))?;
                lines.push(expect_line(g, "multiline")?);
            }
            Ok(MultiLineString(lines).into())
        }
        GeometryRef::Polygon(poly) => {
            let mut rings = Vec::with_capacity(poly.0.len());
            for (i, ring) in poly.0.iter().enumerate() {
                let g = walk(GeometryRef::LineString(ring), f)
                    .map_err(|e| Error::child("line", "polygon", i, e))?;
                rings.push(expect_line(g, "polygon")?);
            }
            Ok(Polygon(rings).into())
        }
        GeometryRef::MultiPolygon(mp) => {
            let mut polygons = Vec::with_capacity(mp.0.len());
            for (i, poly) in mp.0.iter().enumerate() {
                let g = walk(GeometryRef::Polygon(poly), f)
                    .map_err(|e| Error::child("polygon", "multipolygon", i, e))?;
                polygons.push(expect_polygon(g)?);
            }
            Ok(MultiPolygon(polygons).into())
        }
        GeometryRef::Other(geometry) => Err(Error::UnknownGeometry(format!(
            "{} is not supported by the coordinate walk",
            geometry.type_name()
        ))),
    }
}

fn apply_2d<F>(pt: &Point, f: &F) -> Result<Point>
where
    F: Fn(&[f64]) -> Result<Vec<f64>>,
{
    let c = f(&[pt.x, pt.y])?;
    require(&c, 2)?;
    Ok(Point::new(c[0], c[1]))
}

fn require(coords: &[f64], expected: usize) -> Result<()> {
    if coords.len() < expected {
        return Err(Error::InsufficientCoordinates {
            expected,
            got: coords.len(),
        });
    }
    Ok(())
}

fn expect_line(g: G, parent: &str) -> Result<LineString> {
    match g.into_geometry() {
        Geometry::LineString(line) => Ok(line),
        other => Err(Error::invariant(format!(
            "child of {} came back as {}, expected LineString",
            parent,
            other.type_name()
        ))),
    }
}

fn expect_polygon(g: G) -> Result<Polygon> {
    match g.into_geometry() {
        Geometry::Polygon(poly) => Ok(poly),
        other => Err(Error::invariant(format!(
            "child of multipolygon came back as {}, expected Polygon",
            other.type_name()
        ))),
    }
}
