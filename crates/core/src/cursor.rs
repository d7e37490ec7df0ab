//! Projection of web mercator geometry into tile-pixel space.

use crate::geometry::{
    Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Point3, Polygon, G,
};
use crate::tile::Tile;
use crate::webmercator::Srid;
use crate::{Error, Result};

/// Maps web mercator coordinates onto one tile's pixel grid.
#[derive(Debug, Clone, Copy)]
pub struct TileCursor {
    tile: Tile,
}

impl TileCursor {
    pub fn new(tile: Tile) -> Self {
        Self { tile }
    }

    pub fn tile(&self) -> &Tile {
        &self.tile
    }

    /// Project every point, failing on the first point that cannot be mapped.
    pub fn project_points(&self, points: &[Point]) -> Result<Vec<Point>> {
        points
            .iter()
            .map(|p| {
                self.tile
                    .to_pixel(Srid::WebMercator, [p.x, p.y])
                    .map(Point::from)
            })
            .collect()
    }

    /// Project groups of points (rings of a polygon, lines of a multiline),
    /// keeping group order.
    pub fn project_point_groups(&self, groups: &[LineString]) -> Result<Vec<LineString>> {
        groups
            .iter()
            .map(|g| self.project_points(&g.0).map(LineString))
            .collect()
    }

    /// Project a whole geometry, variant by variant.
    pub fn project_geometry(&self, geometry: &Geometry) -> Result<G> {
        match geometry {
            Geometry::Point(p) => {
                let [x, y] = self.tile.to_pixel(Srid::WebMercator, [p.x, p.y])?;
                Ok(Point::new(x, y).into())
            }
            Geometry::Point3(p) => {
                let [x, y] = self.tile.to_pixel(Srid::WebMercator, [p.x, p.y])?;
                Ok(Point3::new(x, y, p.z).into())
            }
            Geometry::MultiPoint(mp) => Ok(MultiPoint(self.project_points(&mp.0)?).into()),
            Geometry::LineString(line) => Ok(LineString(self.project_points(&line.0)?).into()),
            Geometry::MultiLineString(mls) => {
                Ok(MultiLineString(self.project_point_groups(&mls.0)?).into())
            }
            Geometry::Polygon(poly) => Ok(Polygon(self.project_point_groups(&poly.0)?).into()),
            Geometry::MultiPolygon(mp) => {
                let polygons = mp
                    .0
                    .iter()
                    .map(|poly| self.project_point_groups(&poly.0).map(Polygon))
                    .collect::<Result<Vec<_>>>()?;
                Ok(MultiPolygon(polygons).into())
            }
            Geometry::Collection(_) => {
                Err(Error::UnknownGeometryType(geometry.type_name().to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webmercator::WORLD_HALF_SIZE;

    fn world_cursor() -> TileCursor {
        TileCursor::new(Tile::new(0, 0, 0).unwrap())
    }

    #[test]
    fn test_project_points_maps_world_corners() {
        let cursor = world_cursor();
        let pts = cursor
            .project_points(&[
                Point::new(-WORLD_HALF_SIZE, WORLD_HALF_SIZE),
                Point::new(0.0, 0.0),
                Point::new(WORLD_HALF_SIZE, -WORLD_HALF_SIZE),
            ])
            .unwrap();

        let expected = [[0.0, 0.0], [2048.0, 2048.0], [4096.0, 4096.0]];
        for (p, e) in pts.iter().zip(expected) {
            assert!((p.x - e[0]).abs() < 1e-6 && (p.y - e[1]).abs() < 1e-6, "{:?}", p);
        }
    }

    #[test]
    fn test_polygon_keeps_ring_order() {
        let cursor = world_cursor();
        let exterior = LineString::new(vec![
            Point::new(-1e6, -1e6),
            Point::new(1e6, -1e6),
            Point::new(1e6, 1e6),
            Point::new(-1e6, 1e6),
        ]);
        let hole = LineString::new(vec![
            Point::new(-1e5, -1e5),
            Point::new(-1e5, 1e5),
            Point::new(1e5, 1e5),
        ]);
        let geom = Geometry::Polygon(Polygon::new(vec![exterior, hole]));

        let projected = cursor.project_geometry(&geom).unwrap();
        let poly = projected.as_polygon().expect("polygon");
        assert_eq!(poly.0.len(), 2);
        assert_eq!(poly.0[0].len(), 4, "exterior must stay at index 0");
        assert_eq!(poly.0[1].len(), 3);
    }

    #[test]
    fn test_multipolygon_keeps_grouping() {
        let cursor = world_cursor();
        let ring = LineString::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1e6, 0.0),
            Point::new(1e6, 1e6),
        ]);
        let geom = Geometry::MultiPolygon(MultiPolygon::new(vec![
            Polygon::new(vec![ring.clone()]),
            Polygon::new(vec![ring.clone(), ring]),
        ]));

        let projected = cursor.project_geometry(&geom).unwrap();
        let mp = projected.as_multi_polygon().expect("multipolygon");
        assert_eq!(mp.0.len(), 2);
        assert_eq!(mp.0[1].0.len(), 2);
    }

    #[test]
    fn test_point3_keeps_z() {
        let projected = world_cursor()
            .project_geometry(&Geometry::Point3(Point3::new(0.0, 0.0, 12.5)))
            .unwrap();
        assert_eq!(projected.as_point3().map(|p| p.z), Some(12.5));
    }

    #[test]
    fn test_unknown_geometry_type() {
        let geom = Geometry::Collection(vec![]);
        assert!(matches!(
            world_cursor().project_geometry(&geom),
            Err(Error::UnknownGeometryType(_))
        ));
    }
}
