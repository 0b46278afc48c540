//! 2D polygon predicates on `Point2` lists.

use crate::float_types::Real;
use crate::geometry::Tolerance;
use nalgebra::Point2;

/// z component of `(b - a) × (c - a)`; positive when `abc` turns left.
#[inline]
pub fn orientation_2d(a: &Point2<Real>, b: &Point2<Real>, c: &Point2<Real>) -> Real {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Sine of the angle between `b - a` and `c - a`; zero when either is degenerate.
#[inline]
pub fn turn_sine(a: &Point2<Real>, b: &Point2<Real>, c: &Point2<Real>) -> Real {
    let scale = (b - a).norm() * (c - a).norm();
    if scale <= Real::EPSILON * Real::EPSILON {
        return 0.0;
    }
    orientation_2d(a, b, c) / scale
}

/// Shoelace area, positive for counter-clockwise polygons.
pub fn signed_area(polygon: &[Point2<Real>]) -> Real {
    polygon
        .iter()
        .zip(polygon.iter().cycle().skip(1))
        .map(|(p, q)| p.x * q.y - q.x * p.y)
        .sum::<Real>()
        * 0.5
}

/// Ray casting parity test along +X.
///
/// Each edge counts for `y` in the half-open interval between its end points,
/// so a ray passing exactly through a vertex is counted once. Points on the
/// boundary may go either way.
pub fn point_in_polygon(point: &Point2<Real>, polygon: &[Point2<Real>]) -> bool {
    let mut inside = false;
    for (a, b) in polygon.iter().zip(polygon.iter().cycle().skip(1)) {
        if (a.y <= point.y) != (b.y <= point.y) {
            let x = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// True when `p` lies on the closed segment `[a, b]`.
pub fn point_on_segment_2d(
    p: &Point2<Real>,
    a: &Point2<Real>,
    b: &Point2<Real>,
    tol: &Tolerance,
) -> bool {
    let length = (b - a).norm();
    if length <= tol.epsilon {
        return tol.compare_points_2d(p, a);
    }
    if !tol.is_zero(orientation_2d(a, b, p) / length) {
        return false;
    }
    let t = (p - a).dot(&(b - a)) / (length * length);
    t >= -tol.epsilon && t <= 1.0 + tol.epsilon
}

/// Two collinear segments sharing more than a single point.
pub fn segments_overlap_2d(
    a: &Point2<Real>,
    b: &Point2<Real>,
    c: &Point2<Real>,
    d: &Point2<Real>,
    tol: &Tolerance,
) -> bool {
    let length = (b - a).norm();
    if length <= tol.epsilon {
        return false;
    }
    if !tol.is_zero(orientation_2d(a, b, c) / length) || !tol.is_zero(orientation_2d(a, b, d) / length) {
        return false;
    }
    let direction = (b - a) / length;
    let (t_c, t_d) = ((c - a).dot(&direction), (d - a).dot(&direction));
    let (low, high) = (t_c.min(t_d), t_c.max(t_d));
    high.min(length) - low.max(0.0) > tol.epsilon
}

/// True when the closed segments `[a, b]` and `[c, d]` share at least one point.
pub fn segments_intersect_2d(
    a: &Point2<Real>,
    b: &Point2<Real>,
    c: &Point2<Real>,
    d: &Point2<Real>,
    tol: &Tolerance,
) -> bool {
    let (ab, cd) = ((b - a).norm(), (d - c).norm());
    if ab <= tol.epsilon || cd <= tol.epsilon {
        return point_on_segment_2d(a, c, d, tol) || point_on_segment_2d(c, a, b, tol);
    }
    // signed distances to the other segment's line
    let d1 = orientation_2d(c, d, a) / cd;
    let d2 = orientation_2d(c, d, b) / cd;
    let d3 = orientation_2d(a, b, c) / ab;
    let d4 = orientation_2d(a, b, d) / ab;

    if ((d1 > tol.epsilon && d2 < -tol.epsilon) || (d1 < -tol.epsilon && d2 > tol.epsilon))
        && ((d3 > tol.epsilon && d4 < -tol.epsilon) || (d3 < -tol.epsilon && d4 > tol.epsilon))
    {
        return true;
    }

    point_on_segment_2d(a, c, d, tol)
        || point_on_segment_2d(b, c, d, tol)
        || point_on_segment_2d(c, a, b, tol)
        || point_on_segment_2d(d, a, b, tol)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point2<Real>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ]
    }

    #[test]
    fn ray_through_vertex_counts_once() {
        let diamond = [
            Point2::new(0.0, -1.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(-1.0, 0.0),
        ];
        assert!(point_in_polygon(&Point2::new(0.0, 0.0), &diamond));
        assert!(!point_in_polygon(&Point2::new(-2.0, 0.0), &diamond));
    }

    #[test]
    fn area_sign_follows_winding() {
        let mut poly = square();
        assert!((signed_area(&poly) - 4.0).abs() < 1e-12);
        poly.reverse();
        assert!((signed_area(&poly) + 4.0).abs() < 1e-12);
    }

    #[test]
    fn touching_segments_intersect() {
        let tol = Tolerance::new(1e-9);
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        assert!(segments_intersect_2d(&a, &b, &Point2::new(1.0, 0.0), &Point2::new(1.0, 1.0), &tol));
        assert!(!segments_intersect_2d(&a, &b, &Point2::new(0.0, 1.0), &Point2::new(1.0, 1.0), &tol));
        assert!(segments_overlap_2d(&a, &b, &Point2::new(0.5, 0.0), &Point2::new(2.0, 0.0), &tol));
    }

    #[test]
    fn small_crossing_segments_are_not_collinear() {
        let tol = Tolerance::new(1e-6);
        let s = 1e-3;
        let (a, b) = (Point2::new(0.0, 0.0), Point2::new(s, s));
        let (c, d) = (Point2::new(0.0, s), Point2::new(s, 0.0));
        assert!(segments_intersect_2d(&a, &b, &c, &d, &tol));
        // parallel and a millimetre apart
        assert!(!segments_intersect_2d(&a, &Point2::new(s, 0.0), &c, &Point2::new(s, s), &tol));
        assert!((turn_sine(&a, &Point2::new(s, 0.0), &c) - 1.0).abs() < 1e-12);
    }
}
