//! End-to-end properties of the geometry pipeline, exercised through the
//! public API only.

use tilegeom_core::extent::Extent;
use tilegeom_core::geometry::{
    Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Point3, Polygon,
};
use tilegeom_core::makevalid::clean;
use tilegeom_core::pipeline::process_feature;
use tilegeom_core::simplify::simplify;
use tilegeom_core::transform::{apply_to_points, clone_geometry};
use tilegeom_core::webmercator::{from_web_mercator, to_web_mercator, Srid};
use tilegeom_core::Error;

fn line(coords: &[(f64, f64)]) -> LineString {
    LineString::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
}

fn square(min: f64, max: f64) -> Polygon {
    Polygon::new(vec![line(&[(min, min), (max, min), (max, max), (min, max)])])
}

/// One geometry of every variant.
fn every_variant() -> Vec<Geometry> {
    vec![
        Point::new(1.0, 2.0).into(),
        Point3::new(1.0, 2.0, 3.0).into(),
        MultiPoint::new(vec![Point::new(0.0, 0.0), Point::new(5.0, -5.0)]).into(),
        line(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]).into(),
        MultiLineString::new(vec![
            line(&[(0.0, 0.0), (1.0, 1.0)]),
            line(&[(3.0, 3.0), (4.0, 3.0), (4.0, 4.0)]),
        ])
        .into(),
        Polygon::new(vec![
            line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]),
            line(&[(2.0, 2.0), (2.0, 4.0), (4.0, 4.0), (4.0, 2.0)]),
        ])
        .into(),
        MultiPolygon::new(vec![square(0.0, 1.0), square(5.0, 6.0)]).into(),
    ]
}

/// Move the first coordinate of any geometry.
fn nudge_first_point(geometry: &mut Geometry) {
    fn nudge(p: &mut Point) {
        p.x += 1000.0;
    }
    match geometry {
        Geometry::Point(p) => nudge(p),
        Geometry::Point3(p) => p.x += 1000.0,
        Geometry::MultiPoint(mp) => nudge(&mut mp.0[0]),
        Geometry::LineString(l) => nudge(&mut l.0[0]),
        Geometry::MultiLineString(mls) => nudge(&mut mls.0[0].0[0]),
        Geometry::Polygon(poly) => nudge(&mut poly.0[0].0[0]),
        Geometry::MultiPolygon(mp) => nudge(&mut mp.0[0].0[0].0[0]),
        Geometry::Collection(_) => unreachable!("not generated"),
    }
}

/// Every ring edge pair that is not adjacent must not cross or touch.
fn assert_ring_is_simple(ring: &LineString) {
    use geo::line_intersection::line_intersection;

    let pts = &ring.0;
    let n = pts.len();
    assert!(n >= 3, "ring too short: {:?}", ring);
    let edge = |i: usize| {
        geo::Line::new(
            geo::coord! { x: pts[i].x, y: pts[i].y },
            geo::coord! { x: pts[(i + 1) % n].x, y: pts[(i + 1) % n].y },
        )
    };
    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            assert!(
                line_intersection(edge(i), edge(j)).is_none(),
                "edges {} and {} of {:?} meet",
                i,
                j,
                ring
            );
        }
    }
}

// ========== Transform engine ==========

#[test]
fn clone_is_independent_of_the_source() {
    for original in every_variant() {
        let mut copy = clone_geometry(&original).unwrap().into_geometry();
        assert_eq!(copy, original);
        nudge_first_point(&mut copy);
        assert_ne!(copy, original, "{} copy was not changed", original.type_name());
        assert_eq!(
            original,
            every_variant()
                .into_iter()
                .find(|g| g.type_name() == original.type_name())
                .unwrap(),
            "mutating the copy of {} leaked into the source",
            original.type_name()
        );
    }
}

#[test]
fn identity_transform_equals_clone() {
    for geometry in every_variant() {
        let mapped = apply_to_points(&geometry, |c| Ok(c.to_vec())).unwrap();
        let cloned = clone_geometry(&geometry).unwrap();
        assert_eq!(mapped, cloned, "{}", geometry.type_name());
    }
}

#[test]
fn unknown_variant_fails_without_output() {
    let collection = Geometry::Collection(vec![Point::new(0.0, 0.0).into()]);
    let result = apply_to_points(&collection, |c| Ok(c.to_vec()));
    assert!(matches!(result, Err(Error::UnknownGeometry(_))));
}

// ========== Coordinate converter ==========

#[test]
fn mercator_round_trip_within_a_nanodegree() {
    for lon in [-179.9, -120.0, -0.5, 0.0, 33.3, 179.9] {
        for lat in [-85.0, -45.0, 0.0, 12.5, 60.0, 85.0] {
            let p = Geometry::Point(Point::new(lon, lat));
            let projected = to_web_mercator(Srid::Wgs84, &p).unwrap();
            let back = from_web_mercator(Srid::Wgs84, projected.geometry()).unwrap();
            let q = back.as_point().expect("still a point");
            assert!((q.x - lon).abs() < 1e-9, "lon {} came back as {}", lon, q.x);
            assert!((q.y - lat).abs() < 1e-9, "lat {} came back as {}", lat, q.y);
        }
    }
}

#[test]
fn same_srid_is_a_deep_copy() {
    for geometry in every_variant() {
        let mut copy = to_web_mercator(Srid::WebMercator, &geometry)
            .unwrap()
            .into_geometry();
        assert_eq!(copy, geometry);
        nudge_first_point(&mut copy);
        assert_ne!(copy, geometry);
    }
}

#[test]
fn other_srids_are_rejected() {
    let p = Geometry::Point(Point::new(0.0, 0.0));
    assert!(matches!(
        to_web_mercator(Srid::from(27700), &p),
        Err(Error::UnsupportedSrid(27700))
    ));
    assert!(matches!(
        from_web_mercator(Srid::from(2154), &p),
        Err(Error::UnsupportedSrid(2154))
    ));
}

// ========== Simplifier ==========

fn zigzag() -> LineString {
    let coords: Vec<(f64, f64)> = (0..60)
        .map(|i| {
            let x = i as f64;
            let y = (x * 0.7).sin() * 4.0 + if i % 2 == 0 { 0.3 } else { -0.3 };
            (x, y)
        })
        .collect();
    line(&coords)
}

#[test]
fn zero_tolerance_keeps_every_vertex() {
    let input = Geometry::LineString(zigzag());
    let out = simplify(&input, 0.0).unwrap();
    assert_eq!(out.geometry(), &input);
}

#[test]
fn larger_tolerance_never_adds_vertices() {
    let input = Geometry::LineString(zigzag());
    let mut previous = usize::MAX;
    for tolerance in [0.0, 0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 100.0] {
        let count = simplify(&input, tolerance).unwrap().geometry().num_points();
        assert!(
            count <= previous,
            "tolerance {} gave {} vertices, more than {}",
            tolerance,
            count,
            previous
        );
        previous = count;
    }
    assert_eq!(previous, 2, "huge tolerance leaves the endpoints");
}

// ========== Validity repairer ==========

#[test]
fn repair_is_idempotent_for_simple_input() {
    let extent = Extent::new(-20.0, -20.0, 20.0, 20.0);
    let inputs: Vec<Geometry> = vec![
        square(0.0, 5.0).into(),
        Polygon::new(vec![
            line(&[(-10.0, -10.0), (10.0, -10.0), (10.0, 10.0), (-10.0, 10.0)]),
            line(&[(-2.0, -2.0), (-2.0, 2.0), (2.0, 2.0), (2.0, -2.0)]),
        ])
        .into(),
        MultiPolygon::new(vec![square(-15.0, -12.0), square(3.0, 9.0)]).into(),
        Polygon::new(vec![line(&[(0.0, 0.0), (8.0, 1.0), (3.0, 2.0), (9.0, 7.0), (-4.0, 6.0)])])
            .into(),
    ];
    for input in inputs {
        let once = clean(&input, &extent).unwrap();
        let twice = clean(once.geometry(), &extent).unwrap();
        assert_eq!(once, twice, "repair of {:?} was not stable", input);
    }
}

#[test]
fn bowtie_becomes_two_simple_lobes() {
    let bowtie = Geometry::Polygon(Polygon::new(vec![line(&[
        (0.0, 0.0),
        (10.0, 10.0),
        (10.0, 0.0),
        (0.0, 10.0),
    ])]));
    let extent = Extent::from_corners([-5.0, -5.0], [15.0, 15.0]);

    let out = clean(&bowtie, &extent).unwrap();
    let mp = out.as_multi_polygon().expect("multipolygon");
    for poly in &mp.0 {
        for ring in poly.rings() {
            assert_ring_is_simple(ring);
        }
    }
    assert!((mp.area() - 50.0).abs() < 1e-9, "area {}", mp.area());
}

#[test]
fn polygon_outside_extent_is_empty_without_error() {
    let extent = Extent::new(0.0, 0.0, 10.0, 10.0);
    let out = clean(&square(50.0, 60.0).into(), &extent).unwrap();
    assert!(out.is_empty());
}

// ========== Orchestrator ==========

#[test]
fn nil_geometry_short_circuits() {
    let extent = Extent::new(0.0, 0.0, 4096.0, 4096.0);
    assert!(process_feature(None, &extent, 1.0, true).unwrap().is_none());
}

#[test]
fn process_feature_simplifies_before_repair() {
    let extent = Extent::new(-100.0, -100.0, 200.0, 200.0);
    // the notch is shallower than the tolerance and is simplified away
    let notched = Geometry::Polygon(Polygon::new(vec![line(&[
        (0.0, 0.0),
        (50.0, 0.0),
        (50.5, -1.0),
        (51.0, 0.0),
        (100.0, 0.0),
        (100.0, 100.0),
        (0.0, 100.0),
    ])]));
    let plain = process_feature(Some(&notched), &extent, 2.0, true)
        .unwrap()
        .expect("polygon kept");
    let mp = plain.as_multi_polygon().expect("multipolygon");
    assert!((mp.area() - 10_000.0).abs() < 1e-6, "area {}", mp.area());

    let kept = process_feature(Some(&notched), &extent, 2.0, false)
        .unwrap()
        .expect("polygon kept");
    assert!(kept.as_multi_polygon().expect("multipolygon").area() > 10_000.0);
}
