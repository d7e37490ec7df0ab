//! Polygon repair.
//!
//! Turns any polygon or multipolygon, however broken, into simple correctly
//! wound polygons covering the part of its interior that lies inside a clip
//! extent:
//!
//! 1. [`destructure`] the rings into segments clipped to the extent,
//! 2. triangulate the extent with those segments as constraints,
//! 3. label every triangle by asking the [`Hitmap`] about its centroid,
//! 4. [`reconstruct`] the inside triangles into polygons.
//!
//! Which side of a self-intersecting ring is "inside" follows the even-odd
//! rule, so the two lobes of a bowtie both survive.

pub mod destructure;
pub mod hitmap;
pub mod reconstruct;
pub mod triangulate;

pub use destructure::{destructure, Segment};
pub use hitmap::{Hitmap, Label, PointOracle};
pub use reconstruct::reconstruct;
pub use triangulate::{SlabTriangulator, Triangle, Triangulator};

use crate::extent::Extent;
use crate::geometry::{Geometry, MultiPolygon, G};
use crate::{Error, Result};

/// Repair driver with a pluggable triangulator.
#[derive(Debug, Clone, Default)]
pub struct Makevalid<T: Triangulator = SlabTriangulator> {
    triangulator: T,
}

impl Makevalid {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Triangulator> Makevalid<T> {
    pub fn with_triangulator(triangulator: T) -> Self {
        Self { triangulator }
    }

    /// Repair `geometry` against `extent`.
    ///
    /// The result is always a multipolygon. It is empty, without error, when
    /// nothing of the input lies inside the extent.
    pub fn make_valid(&self, geometry: &Geometry, extent: &Extent) -> Result<G> {
        check_extent(extent)?;
        let hitmap = Hitmap::new(geometry)?;

        let segments = destructure(geometry, extent)?;
        if segments.is_empty() {
            if hitmap.classify(extent.center()) == Label::Inside {
                log::debug!("polygon covers the whole extent {:?}", extent);
                return Ok(MultiPolygon(vec![extent.to_polygon()]).into());
            }
            log::debug!("polygon lies outside the extent {:?}", extent);
            return Ok(MultiPolygon::default().into());
        }

        let triangles = self.triangulator.triangulate(&segments, extent)?;
        let inside: Vec<Triangle> = triangles
            .iter()
            .filter(|t| hitmap.classify(t.centroid()) == Label::Inside)
            .copied()
            .collect();

        log::trace!(
            "make valid: {} segments, {} triangles, {} inside",
            segments.len(),
            triangles.len(),
            inside.len()
        );

        Ok(reconstruct(&inside)?.into())
    }
}

fn check_extent(extent: &Extent) -> Result<()> {
    let finite = [extent.min_x, extent.min_y, extent.max_x, extent.max_y]
        .iter()
        .all(|v| v.is_finite());
    if !finite || extent.width() <= 0.0 || extent.height() <= 0.0 {
        return Err(Error::InvalidExtent(format!("{:?}", extent)));
    }
    Ok(())
}

/// Repair `geometry` against `extent` with the default triangulator.
///
/// # Example
///
/// ```
/// use tilegeom_core::extent::Extent;
/// use tilegeom_core::geometry::{Geometry, LineString, Point, Polygon};
/// use tilegeom_core::makevalid::clean;
///
/// let bowtie = Geometry::Polygon(Polygon::new(vec![LineString::new(vec![
///     Point::new(0.0, 0.0),
///     Point::new(10.0, 10.0),
///     Point::new(10.0, 0.0),
///     Point::new(0.0, 10.0),
/// ])]));
/// let extent = Extent::new(-5.0, -5.0, 15.0, 15.0);
///
/// let repaired = clean(&bowtie, &extent).unwrap();
/// let mp = repaired.as_multi_polygon().unwrap();
/// assert_eq!(mp.0.len(), 2);
/// assert!((mp.area() - 50.0).abs() < 1e-9);
/// ```
pub fn clean(geometry: &Geometry, extent: &Extent) -> Result<G> {
    Makevalid::new().make_valid(geometry, extent)
}
