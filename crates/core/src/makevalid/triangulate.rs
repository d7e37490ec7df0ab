//! Conforming triangulation of an extent constrained by a segment soup.
//!
//! [`SlabTriangulator`] cuts the extent into vertical slabs at every segment
//! endpoint and every crossing between two segments. Inside a slab no two
//! segments cross, so the segments split it into trapezoids, and each
//! trapezoid is triangulated as a strip between its left and right column.
//!
//! Every vertex lying on a column is shared by the slabs on both sides of it,
//! so two triangles that touch always share a complete edge with identical
//! coordinates. No triangle edge crosses an input segment.

use std::cmp::Ordering;

use geo::line_intersection::{line_intersection, LineIntersection};

use crate::extent::Extent;
use crate::makevalid::destructure::Segment;
use crate::{Error, Result};

/// A triangle given by its three corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle(pub [[f64; 2]; 3]);

impl Triangle {
    pub fn centroid(&self) -> [f64; 2] {
        let [a, b, c] = self.0;
        [(a[0] + b[0] + c[0]) / 3.0, (a[1] + b[1] + c[1]) / 3.0]
    }

    /// Positive when the corners run counter-clockwise.
    pub fn signed_area(&self) -> f64 {
        let [a, b, c] = self.0;
        ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])) / 2.0
    }
}

/// Triangulates an extent so that no triangle crosses a segment.
pub trait Triangulator {
    fn triangulate(&self, segments: &[Segment], extent: &Extent) -> Result<Vec<Triangle>>;
}

/// Slab decomposition followed by strip triangulation of each trapezoid.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlabTriangulator;

impl Triangulator for SlabTriangulator {
    fn triangulate(&self, segments: &[Segment], extent: &Extent) -> Result<Vec<Triangle>> {
        if let Some(bad) = segments
            .iter()
            .find(|s| !(s.a.iter().chain(&s.b).all(|v| v.is_finite())))
        {
            return Err(Error::Triangulation(format!(
                "non-finite coordinate in segment {:?}",
                bad
            )));
        }

        let eps = 1e-9 * extent.width().max(extent.height()).max(1.0);
        let columns = columns(segments, extent, eps);
        let edges = edges(segments, extent, &columns);
        let rows = rows(&edges, &columns, eps);

        let mut triangles = Vec::new();
        for k in 0..columns.len() - 1 {
            triangulate_slab(k, &columns, &rows, &edges, &mut triangles)?;
        }

        log::trace!(
            "slab triangulation: {} segments, {} columns, {} triangles",
            segments.len(),
            columns.len(),
            triangles.len()
        );
        Ok(triangles)
    }
}

/// A candidate coordinate and whether it is an input value (as opposed to a
/// computed one).
type Candidate = (f64, bool);

/// Sort and merge candidates closer than `eps`, preferring input values as
/// representatives.
fn cluster(mut values: Vec<Candidate>, eps: f64) -> Vec<f64> {
    values.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut out = Vec::new();
    let mut i = 0;
    while i < values.len() {
        let start = values[i].0;
        let mut representative = values[i];
        let mut j = i;
        while j < values.len() && values[j].0 - start <= eps {
            if values[j].1 && !representative.1 {
                representative = values[j];
            }
            j += 1;
        }
        out.push(representative.0);
        i = j;
    }
    out
}

/// Index of the value in `sorted` closest to `v`.
fn nearest(sorted: &[f64], v: f64) -> usize {
    let i = sorted.partition_point(|&c| c < v);
    if i == 0 {
        return 0;
    }
    if i == sorted.len() {
        return sorted.len() - 1;
    }
    if (sorted[i] - v).abs() < (v - sorted[i - 1]).abs() {
        i
    } else {
        i - 1
    }
}

fn columns(segments: &[Segment], extent: &Extent, eps: f64) -> Vec<f64> {
    let mut xs: Vec<Candidate> = Vec::with_capacity(2 * segments.len() + 2);
    xs.push((extent.min_x, true));
    xs.push((extent.max_x, true));
    for s in segments {
        xs.push((s.a[0], true));
        xs.push((s.b[0], true));
    }

    let mut order: Vec<usize> = (0..segments.len()).collect();
    order.sort_by(|&i, &j| segments[i].min_x().total_cmp(&segments[j].min_x()));

    for (n, &i) in order.iter().enumerate() {
        let si = segments[i];
        for &j in &order[n + 1..] {
            let sj = segments[j];
            if sj.min_x() > si.max_x() {
                break;
            }
            if sj.min_y() > si.max_y() || sj.max_y() < si.min_y() {
                continue;
            }
            if let Some(LineIntersection::SinglePoint {
                intersection,
                is_proper: true,
            }) = line_intersection(si.to_geo_line(), sj.to_geo_line())
            {
                if intersection.x.is_finite() {
                    xs.push((intersection.x.clamp(extent.min_x, extent.max_x), false));
                }
            }
        }
    }

    cluster(xs, eps)
}

/// A segment running left to right across one or more slabs.
#[derive(Debug, Clone, Copy)]
struct Edge {
    /// Column of the left endpoint.
    i0: usize,
    /// Column of the right endpoint.
    i1: usize,
    left: [f64; 2],
    right: [f64; 2],
}

impl Edge {
    fn y_at(&self, k: usize, columns: &[f64]) -> f64 {
        if k == self.i0 {
            return self.left[1];
        }
        if k == self.i1 {
            return self.right[1];
        }
        let t = (columns[k] - self.left[0]) / (self.right[0] - self.left[0]);
        self.left[1] + t * (self.right[1] - self.left[1])
    }
}

struct Edges {
    spanning: Vec<Edge>,
    /// `(column, y0, y1)` of segments that collapse onto a single column.
    vertical: Vec<(usize, f64, f64)>,
}

fn edges(segments: &[Segment], extent: &Extent, columns: &[f64]) -> Edges {
    let last = columns.len() - 1;
    let mut spanning = vec![
        Edge {
            i0: 0,
            i1: last,
            left: [extent.min_x, extent.min_y],
            right: [extent.max_x, extent.min_y],
        },
        Edge {
            i0: 0,
            i1: last,
            left: [extent.min_x, extent.max_y],
            right: [extent.max_x, extent.max_y],
        },
    ];
    let mut vertical = Vec::new();

    for s in segments {
        let (left, right) = if s.a[0] <= s.b[0] { (s.a, s.b) } else { (s.b, s.a) };
        let i0 = nearest(columns, left[0]);
        let i1 = nearest(columns, right[0]);
        if i0 == i1 {
            vertical.push((i0, left[1], right[1]));
        } else {
            spanning.push(Edge {
                i0,
                i1,
                left,
                right,
            });
        }
    }

    Edges { spanning, vertical }
}

/// Clustered y values on every column.
fn rows(edges: &Edges, columns: &[f64], eps: f64) -> Vec<Vec<f64>> {
    let mut candidates: Vec<Vec<Candidate>> = vec![Vec::new(); columns.len()];
    for edge in &edges.spanning {
        for (k, column) in candidates
            .iter_mut()
            .enumerate()
            .take(edge.i1 + 1)
            .skip(edge.i0)
        {
            let exact = k == edge.i0 || k == edge.i1;
            column.push((edge.y_at(k, columns), exact));
        }
    }
    for &(k, y0, y1) in &edges.vertical {
        candidates[k].push((y0, true));
        candidates[k].push((y1, true));
    }
    candidates.into_iter().map(|c| cluster(c, eps)).collect()
}

fn triangulate_slab(
    k: usize,
    columns: &[f64],
    rows: &[Vec<f64>],
    edges: &Edges,
    out: &mut Vec<Triangle>,
) -> Result<()> {
    let left_rows = &rows[k];
    let right_rows = &rows[k + 1];

    let mut active: Vec<(f64, f64)> = edges
        .spanning
        .iter()
        .filter(|e| e.i0 <= k && e.i1 > k)
        .map(|e| {
            (
                left_rows[nearest(left_rows, e.y_at(k, columns))],
                right_rows[nearest(right_rows, e.y_at(k + 1, columns))],
            )
        })
        .collect();

    active.sort_by(|a, b| {
        (a.0 + a.1)
            .total_cmp(&(b.0 + b.1))
            .then(a.0.total_cmp(&b.0))
            .then(a.1.total_cmp(&b.1))
    });
    active.dedup();

    let (xl, xr) = (columns[k], columns[k + 1]);
    for pair in active.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        // edges crossing inside the slab: the crossing was lost to snapping
        if lo.0 > hi.0 || lo.1 > hi.1 {
            return Err(Error::Triangulation(format!(
                "edges {:?} and {:?} cross inside slab [{}, {}]",
                lo, hi, xl, xr
            )));
        }
        let left = chain(left_rows, lo.0, hi.0);
        let right = chain(right_rows, lo.1, hi.1);
        strip(xl, left, xr, right, out);
    }
    Ok(())
}

/// The rows between `lo` and `hi`, inclusive.
fn chain(rows: &[f64], lo: f64, hi: f64) -> &[f64] {
    let start = rows.partition_point(|&y| y.total_cmp(&lo) == Ordering::Less);
    let end = rows.partition_point(|&y| y.total_cmp(&hi) != Ordering::Greater);
    &rows[start..end.max(start)]
}

/// Zig-zag triangulation between two vertical chains. Triangles come out
/// counter-clockwise.
fn strip(xl: f64, left: &[f64], xr: f64, right: &[f64], out: &mut Vec<Triangle>) {
    if left.is_empty() || right.is_empty() || (left.len() == 1 && right.len() == 1) {
        return;
    }
    let (mut i, mut j) = (0, 0);
    while i + 1 < left.len() || j + 1 < right.len() {
        let advance_left = if i + 1 == left.len() {
            false
        } else if j + 1 == right.len() {
            true
        } else {
            left[i + 1] <= right[j + 1]
        };

        if advance_left {
            out.push(Triangle([[xl, left[i]], [xr, right[j]], [xl, left[i + 1]]]));
            i += 1;
        } else {
            out.push(Triangle([[xl, left[i]], [xr, right[j]], [xr, right[j + 1]]]));
            j += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total_area(triangles: &[Triangle]) -> f64 {
        triangles.iter().map(Triangle::signed_area).sum()
    }

    #[test]
    fn test_empty_soup_covers_extent() {
        let extent = Extent::new(0.0, 0.0, 10.0, 4.0);
        let triangles = SlabTriangulator.triangulate(&[], &extent).unwrap();
        assert_eq!(triangles.len(), 2);
        assert!((total_area(&triangles) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_triangles_are_ccw_and_cover_extent() {
        let extent = Extent::new(-5.0, -5.0, 15.0, 15.0);
        let segments = [
            Segment::new([0.0, 0.0], [10.0, 10.0]),
            Segment::new([10.0, 10.0], [10.0, 0.0]),
            Segment::new([10.0, 0.0], [0.0, 10.0]),
            Segment::new([0.0, 10.0], [0.0, 0.0]),
        ];
        let triangles = SlabTriangulator.triangulate(&segments, &extent).unwrap();

        assert!(triangles.iter().all(|t| t.signed_area() > 0.0));
        assert!(
            (total_area(&triangles) - 400.0).abs() < 1e-6,
            "triangles must tile the extent exactly, got {}",
            total_area(&triangles)
        );
    }

    #[test]
    fn test_crossing_becomes_a_column() {
        let extent = Extent::new(0.0, 0.0, 10.0, 10.0);
        let segments = [
            Segment::new([0.0, 0.0], [10.0, 10.0]),
            Segment::new([0.0, 10.0], [10.0, 0.0]),
        ];
        let columns = columns(&segments, &extent, 1e-9);
        assert_eq!(columns, vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_no_triangle_straddles_a_segment() {
        let extent = Extent::new(0.0, 0.0, 10.0, 10.0);
        let segments = [Segment::new([2.0, 3.0], [8.0, 7.0])];
        let triangles = SlabTriangulator.triangulate(&segments, &extent).unwrap();

        // inside the segment's x range every triangle lies wholly on one side
        let side = |p: [f64; 2]| (8.0 - 2.0) * (p[1] - 3.0) - (7.0 - 3.0) * (p[0] - 2.0);
        let spanned = triangles
            .iter()
            .filter(|t| t.0.iter().all(|v| v[0] >= 2.0 && v[0] <= 8.0));
        for t in spanned {
            let sides: Vec<f64> = t.0.iter().map(|&v| side(v)).collect();
            assert!(
                sides.iter().all(|&s| s >= -1e-9) || sides.iter().all(|&s| s <= 1e-9),
                "triangle {:?} crosses the segment",
                t
            );
        }
    }

    #[test]
    fn test_vertical_segment_is_respected() {
        let extent = Extent::new(0.0, 0.0, 10.0, 10.0);
        let segments = [Segment::new([5.0, 2.0], [5.0, 8.0])];
        let triangles = SlabTriangulator.triangulate(&segments, &extent).unwrap();
        assert!((total_area(&triangles) - 100.0).abs() < 1e-9);
        for t in &triangles {
            let xs: Vec<f64> = t.0.iter().map(|v| v[0]).collect();
            let min = xs.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            assert!(max <= 5.0 || min >= 5.0, "triangle {:?} spans x = 5", t);
        }
    }

    #[test]
    fn test_non_finite_input_is_an_error() {
        let extent = Extent::new(0.0, 0.0, 10.0, 10.0);
        let segments = [Segment::new([1.0, f64::NAN], [2.0, 2.0])];
        assert!(matches!(
            SlabTriangulator.triangulate(&segments, &extent),
            Err(Error::Triangulation(_))
        ));
    }

    #[test]
    fn test_edges_crossing_inside_a_slab_fail() {
        // no column at the crossing (5, 5), so the two edges swap order
        let extent = Extent::new(0.0, 0.0, 10.0, 10.0);
        let segments = [
            Segment::new([0.0, 0.0], [10.0, 10.0]),
            Segment::new([0.0, 10.0], [10.0, 0.0]),
        ];
        let columns = vec![0.0, 10.0];
        let edges = edges(&segments, &extent, &columns);
        let rows = rows(&edges, &columns, 1e-9);

        let mut out = Vec::new();
        assert!(matches!(
            triangulate_slab(0, &columns, &rows, &edges, &mut out),
            Err(Error::Triangulation(_))
        ));
    }

    #[test]
    fn test_cluster_prefers_input_values() {
        let merged = cluster(vec![(1.0 + 1e-12, false), (1.0, true), (2.0, true)], 1e-9);
        assert_eq!(merged, vec![1.0, 2.0]);
    }

    #[test]
    fn test_chain_is_inclusive() {
        let rows = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(chain(&rows, 1.0, 2.0), &[1.0, 2.0]);
        assert_eq!(chain(&rows, 3.0, 3.0), &[3.0]);
    }
}
