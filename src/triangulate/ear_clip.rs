//! Ear clipping on a 2D polygon with a parallel list of original vertex ids.
//!
//! The polygon is assumed simple and counter-clockwise; the callers in
//! [`triangulate`](crate::triangulate) take care of both.

use crate::float_types::Real;
use crate::geometry::{Tolerance, segments_intersect_2d, signed_area, turn_sine};
use nalgebra::Point2;

/// Turn direction of `abc`: `1` left, `-1` right, `0` collinear within tolerance.
fn turn(a: &Point2<Real>, b: &Point2<Real>, c: &Point2<Real>, tol: &Tolerance) -> i8 {
    let sin = turn_sine(a, b, c);
    if sin > tol.epsilon {
        1
    } else if sin < -tol.epsilon {
        -1
    } else {
        0
    }
}

/// A polygon is convex when the turn at every vertex has the same sign.
/// Collinear vertices are ignored.
pub fn polygon_2d_is_convex(polygon: &[Point2<Real>], tol: &Tolerance) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0i8;
    for i in 0..n {
        let t = turn(&polygon[i], &polygon[(i + 1) % n], &polygon[(i + 2) % n], tol);
        if t == 0 {
            continue;
        }
        if sign == 0 {
            sign = t;
        } else if sign != t {
            return false;
        }
    }
    sign != 0
}

/// Winding of a simple polygon.
///
/// Equivalent to casting a ray from each edge midpoint and checking on which
/// side the interior lies, but done with the shoelace area in O(n).
pub fn is_counterclockwise_ordered(polygon: &[Point2<Real>]) -> bool {
    signed_area(polygon) > 0.0
}

/// True when the segment from vertex `i0` to vertex `i1` starts inside the
/// interior angle at `i0`.
pub fn segment_in_cone(polygon: &[Point2<Real>], i0: usize, i1: usize, tol: &Tolerance) -> bool {
    let n = polygon.len();
    let a = &polygon[i0];
    let b = &polygon[i1];
    let prev = &polygon[(i0 + n - 1) % n];
    let next = &polygon[(i0 + 1) % n];

    if turn(a, next, prev, tol) >= 0 {
        // convex vertex
        turn(a, b, prev, tol) > 0 && turn(b, a, next, tol) > 0
    } else {
        // reflex vertex
        !(turn(a, b, next, tol) >= 0 && turn(b, a, prev, tol) >= 0)
    }
}

/// True when `i0 - i1` is a proper internal diagonal: inside both cones and
/// not touching any edge that does not end at `i0` or `i1`.
pub fn is_diagonal(polygon: &[Point2<Real>], i0: usize, i1: usize, tol: &Tolerance) -> bool {
    let n = polygon.len();
    if !segment_in_cone(polygon, i0, i1, tol) || !segment_in_cone(polygon, i1, i0, tol) {
        return false;
    }
    let (a, b) = (&polygon[i0], &polygon[i1]);
    (0..n).all(|k| {
        let k1 = (k + 1) % n;
        if k == i0 || k == i1 || k1 == i0 || k1 == i1 {
            return true;
        }
        !segments_intersect_2d(a, b, &polygon[k], &polygon[k1], tol)
    })
}

/// Removes ears until three vertices remain, appending triangles of
/// original ids to `out`. Emits `3 * (n - 2)` indices.
///
/// When no ear can be found (numerically degenerate input) the remainder is
/// emitted as a fan so the index count still holds.
pub fn triangulate(
    polygon: &mut Vec<Point2<Real>>,
    index: &mut Vec<u32>,
    out: &mut Vec<u32>,
    tol: &Tolerance,
) {
    debug_assert_eq!(polygon.len(), index.len());

    while polygon.len() > 3 {
        let n = polygon.len();
        let Some(i0) = (0..n).find(|&i| is_diagonal(polygon, i, (i + 2) % n, tol)) else {
            tracing::warn!(remaining = n, "no ear found, emitting fan for the remainder");
            for i in 1..n - 1 {
                out.extend_from_slice(&[index[0], index[i], index[i + 1]]);
            }
            polygon.clear();
            index.clear();
            return;
        };
        let (i1, i2) = ((i0 + 1) % n, (i0 + 2) % n);
        out.extend_from_slice(&[index[i0], index[i1], index[i2]]);
        polygon.remove(i1);
        index.remove(i1);
    }

    if polygon.len() == 3 {
        out.extend_from_slice(&[index[0], index[1], index[2]]);
    }
}
