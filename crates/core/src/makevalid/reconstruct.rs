//! Merge labelled triangles back into simple polygons.
//!
//! The triangles handed in must come from a conforming triangulation: two
//! triangles that touch share a whole edge with identical coordinates. With
//! every triangle oriented counter-clockwise an interior edge appears once in
//! each direction and cancels, leaving only the boundary of the covered area.
//! That boundary is walked into rings keeping the covered area on the left,
//! which gives counter-clockwise shells and clockwise holes.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::f64::consts::TAU;

use geo::Contains;

use crate::extent::Extent;
use crate::geometry::{Geometry, LineString, MultiPolygon, Point, Polygon};
use crate::makevalid::hitmap::{Hitmap, Label, PointOracle};
use crate::makevalid::triangulate::Triangle;
use crate::{Error, Result};

type Coord = [f64; 2];
type Key = (u64, u64);

/// Relative tolerance under which three vertices count as collinear.
const COLLINEAR_EPS: f64 = 1e-9;

fn key(p: Coord) -> Key {
    (p[0].to_bits(), p[1].to_bits())
}

/// Fold negative zero into positive zero so bit keys agree.
fn canonical(p: Coord) -> Coord {
    [p[0] + 0.0, p[1] + 0.0]
}

fn cmp_coord(a: &Coord, b: &Coord) -> Ordering {
    a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1]))
}

/// Union of `triangles` as a multipolygon of simple, normalised polygons.
pub fn reconstruct(triangles: &[Triangle]) -> Result<MultiPolygon> {
    let edges = boundary_edges(triangles);
    let rings = trace_rings(&edges)?;

    let mut shells = Vec::new();
    let mut holes = Vec::new();
    for ring in rings.into_iter().flat_map(split_at_repeats) {
        let ring = remove_collinear(ring);
        if ring.len() < 3 {
            continue;
        }
        let line = LineString::new(ring.into_iter().map(Point::from).collect());
        let area = line.signed_area();
        if area > 0.0 {
            shells.push(line);
        } else if area < 0.0 {
            holes.push(line);
        }
    }

    log::trace!(
        "reconstruct: {} triangles, {} boundary edges, {} shells, {} holes",
        triangles.len(),
        edges.len(),
        shells.len(),
        holes.len()
    );

    let mut polygons = assign_holes(shells, holes);
    for poly in &mut polygons {
        for ring in &mut poly.0 {
            rotate_to_min(ring);
        }
        poly.0[1..].sort_by(|a, b| cmp_coord(&a.0[0].coords(), &b.0[0].coords()));
    }
    polygons.sort_by(|a, b| cmp_coord(&a.0[0].0[0].coords(), &b.0[0].0[0].coords()));

    Ok(MultiPolygon(polygons))
}

/// Directed edges left after cancelling every edge shared by two triangles,
/// in a deterministic order.
fn boundary_edges(triangles: &[Triangle]) -> Vec<(Coord, Coord)> {
    let mut edges: HashMap<(Key, Key), (Coord, Coord)> = HashMap::new();

    for t in triangles {
        let area = t.signed_area();
        if area == 0.0 || !area.is_finite() {
            continue;
        }
        let [a, b, c] = t.0.map(canonical);
        let corners = if area > 0.0 { [a, b, c] } else { [a, c, b] };

        for i in 0..3 {
            let (p, q) = (corners[i], corners[(i + 1) % 3]);
            if edges.remove(&(key(q), key(p))).is_none() {
                edges.insert((key(p), key(q)), (p, q));
            }
        }
    }

    let mut out: Vec<_> = edges.into_values().collect();
    out.sort_by(|a, b| cmp_coord(&a.0, &b.0).then(cmp_coord(&a.1, &b.1)));
    out
}

/// Clockwise angle from the way back to `from` to the way on to `to`.
///
/// The smallest value is the sharpest left turn, which keeps each ring
/// hugging the covered area and splits rings that touch at a vertex.
fn turn(from: Coord, at: Coord, to: Coord) -> f64 {
    let back = (from[1] - at[1]).atan2(from[0] - at[0]);
    let ahead = (to[1] - at[1]).atan2(to[0] - at[0]);
    let angle = (back - ahead).rem_euclid(TAU);
    if angle == 0.0 {
        TAU
    } else {
        angle
    }
}

fn trace_rings(edges: &[(Coord, Coord)]) -> Result<Vec<Vec<Coord>>> {
    let mut outgoing: HashMap<Key, Vec<usize>> = HashMap::new();
    for (i, e) in edges.iter().enumerate() {
        outgoing.entry(key(e.0)).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();

    for start in 0..edges.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let mut ring = vec![edges[start].0];
        let mut current = start;

        loop {
            let (from, at) = edges[current];
            let next = outgoing
                .get(&key(at))
                .into_iter()
                .flatten()
                .copied()
                .filter(|&i| !used[i] || i == start)
                .min_by(|&i, &j| {
                    turn(from, at, edges[i].1).total_cmp(&turn(from, at, edges[j].1))
                });

            match next {
                Some(i) if i == start => break,
                Some(i) => {
                    used[i] = true;
                    ring.push(at);
                    current = i;
                }
                None => {
                    return Err(Error::invariant(format!(
                        "triangle boundary is open at {:?}",
                        at
                    )))
                }
            }
        }
        rings.push(ring);
    }
    Ok(rings)
}

/// Split a traced ring into loops that each visit a vertex only once.
///
/// A hole touching its shell at a vertex is traced as part of the shell
/// ring, as a clockwise loop hanging off the shared vertex. Cutting the ring
/// at every repeated vertex separates such loops; their winding then tells
/// shells from holes.
fn split_at_repeats(ring: Vec<Coord>) -> Vec<Vec<Coord>> {
    let mut loops = Vec::new();
    let mut path: Vec<Coord> = Vec::with_capacity(ring.len());
    let mut seen: HashMap<Key, usize> = HashMap::new();

    for p in ring {
        if let Some(&at) = seen.get(&key(p)) {
            let closed = path.split_off(at);
            for q in &closed {
                seen.remove(&key(*q));
            }
            loops.push(closed);
        }
        seen.insert(key(p), path.len());
        path.push(p);
    }
    loops.push(path);
    loops
}

fn is_straight(p: Coord, v: Coord, q: Coord) -> bool {
    let a = [v[0] - p[0], v[1] - p[1]];
    let b = [q[0] - v[0], q[1] - v[1]];
    let cross = a[0] * b[1] - a[1] * b[0];
    let dot = a[0] * b[0] + a[1] * b[1];
    let scale = a[0].hypot(a[1]) * b[0].hypot(b[1]);
    dot > 0.0 && cross.abs() <= COLLINEAR_EPS * scale
}

fn remove_collinear(mut ring: Vec<Coord>) -> Vec<Coord> {
    let mut changed = true;
    while changed {
        changed = false;
        let mut i = 0;
        while i < ring.len() && ring.len() >= 3 {
            let n = ring.len();
            if is_straight(ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]) {
                ring.remove(i);
                changed = true;
            } else {
                i += 1;
            }
        }
    }
    ring
}

struct Shell {
    ring: LineString,
    area: f64,
    bbox: Extent,
    geo: geo::Polygon<f64>,
    hitmap: Option<Hitmap>,
}

impl Shell {
    /// Everything hole assignment asks of a shell, computed once.
    fn new(ring: LineString) -> Self {
        Self {
            area: ring.signed_area(),
            bbox: ring_bbox(&ring),
            geo: geo::Polygon::new(ring.to_geo_ring(), vec![]),
            hitmap: Hitmap::new(&Geometry::Polygon(Polygon::new(vec![ring.clone()]))).ok(),
            ring,
        }
    }
}

/// Attach every hole to the smallest shell containing it.
fn assign_holes(shells: Vec<LineString>, holes: Vec<LineString>) -> Vec<Polygon> {
    let shells: Vec<Shell> = shells.into_iter().map(Shell::new).collect();

    let mut interiors: Vec<Vec<LineString>> = vec![Vec::new(); shells.len()];
    for hole in holes {
        let bbox = ring_bbox(&hole);
        let candidates: Vec<usize> = (0..shells.len())
            .filter(|&i| shells[i].bbox.contains_extent(&bbox))
            .collect();

        let geo_hole = hole.to_geo_ring();
        let containing = candidates
            .iter()
            .copied()
            .filter(|&i| shells[i].geo.contains(&geo_hole));
        let mut owner = smallest(&shells, containing);

        if owner.is_none() {
            // touching rings can defeat the topological test; sample one edge instead
            let sample = edge_midpoint(&hole);
            let around_sample = candidates.iter().copied().filter(|&i| {
                shells[i]
                    .hitmap
                    .as_ref()
                    .is_some_and(|hm| hm.classify(sample) == Label::Inside)
            });
            owner = smallest(&shells, around_sample);
        }

        match owner {
            Some(i) => interiors[i].push(hole),
            None => log::warn!("dropping hole with no enclosing shell at {:?}", hole.0.first()),
        }
    }

    shells
        .into_iter()
        .zip(interiors)
        .map(|(shell, holes)| {
            let mut rings = Vec::with_capacity(1 + holes.len());
            rings.push(shell.ring);
            rings.extend(holes);
            Polygon(rings)
        })
        .collect()
}

fn smallest(shells: &[Shell], candidates: impl Iterator<Item = usize>) -> Option<usize> {
    candidates.min_by(|&a, &b| shells[a].area.total_cmp(&shells[b].area))
}

fn ring_bbox(ring: &LineString) -> Extent {
    let mut bbox = Extent::empty();
    for p in &ring.0 {
        bbox.expand_to_include(*p);
    }
    bbox
}

fn edge_midpoint(ring: &LineString) -> Coord {
    let a = ring.0[0];
    let b = ring.0[1 % ring.len()];
    [(a.x + b.x) / 2.0, (a.y + b.y) / 2.0]
}

/// Start the ring at its smallest vertex (by x, then y).
fn rotate_to_min(ring: &mut LineString) {
    let min = (0..ring.len())
        .min_by(|&a, &b| cmp_coord(&ring.0[a].coords(), &ring.0[b].coords()));
    if let Some(i) = min {
        ring.0.rotate_left(i);
    }
}
