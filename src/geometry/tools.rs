//! 3D predicates: intersections, projections, planarity and the drop to 2D.

use crate::float_types::Real;
use crate::geometry::{Plane, Tolerance, plane::rotation_to_z};
use nalgebra::{Point2, Point3, Vector3};

/// An infinite line through `point` along `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line3 {
    pub point: Point3<Real>,
    pub direction: Vector3<Real>,
}

impl Line3 {
    pub const fn new(point: Point3<Real>, direction: Vector3<Real>) -> Self {
        Line3 { point, direction }
    }

    pub fn through(a: &Point3<Real>, b: &Point3<Real>) -> Self {
        Line3::new(*a, b - a)
    }

    pub fn point_at(&self, t: Real) -> Point3<Real> {
        self.point + self.direction * t
    }
}

/// Intersection of a line with a plane.
///
/// `None` when the direction is parallel to the plane (`normal · direction ≈ 0`).
pub fn line_intersect_plane(line: &Line3, plane: &Plane, tol: &Tolerance) -> Option<Point3<Real>> {
    let denom = plane.normal.dot(&line.direction);
    if tol.is_zero(denom) {
        return None;
    }
    let t = -plane.distance_to_point(&line.point) / denom;
    Some(line.point_at(t))
}

/// Intersection of the segment `[p1, p2]` with a plane.
///
/// Same as [`line_intersect_plane`] but the point must also lie between the
/// two ends, which is what clipping an edge against a cutting plane needs.
pub fn segment_intersect_plane(
    p1: &Point3<Real>,
    p2: &Point3<Real>,
    plane: &Plane,
    tol: &Tolerance,
) -> Option<Point3<Real>> {
    let point = line_intersect_plane(&Line3::through(p1, p2), plane, tol)?;
    point_on_segment(&point, p1, p2, tol).then_some(point)
}

/// True when `point` is collinear with and between `p1` and `p2`.
pub fn point_on_segment(
    point: &Point3<Real>,
    p1: &Point3<Real>,
    p2: &Point3<Real>,
    tol: &Tolerance,
) -> bool {
    if !tol.points_collinear(p1, p2, point) {
        return false;
    }
    let segment = (p2 - p1).norm_squared();
    let slack = 2.0 * tol.epsilon * segment.sqrt() + tol.epsilon * tol.epsilon;
    (point - p1).norm_squared() <= segment + slack && (point - p2).norm_squared() <= segment + slack
}

/// Intersection of two lines in space.
///
/// `None` when the lines are parallel or skew.
pub fn line_intersect_line(l1: &Line3, l2: &Line3, tol: &Tolerance) -> Option<Point3<Real>> {
    let cross = l1.direction.cross(&l2.direction);
    let denom = cross.norm_squared();
    if denom <= tol.epsilon * tol.epsilon {
        return None;
    }
    let between = l2.point - l1.point;
    if !tol.is_zero(between.dot(&cross) / denom.sqrt()) {
        return None;
    }
    let t = between.cross(&l2.direction).dot(&cross) / denom;
    Some(l1.point_at(t))
}

/// Perpendicular projection of a point onto a line.
pub fn project_point_on_line(point: &Point3<Real>, line: &Line3) -> Point3<Real> {
    let length_squared = line.direction.norm_squared();
    if length_squared <= Real::EPSILON {
        return line.point;
    }
    let t = (point - line.point).dot(&line.direction) / length_squared;
    line.point_at(t)
}

/// Orthogonal projection of a point onto a plane. The plane normal must be unit length.
pub fn project_point_on_plane(point: &Point3<Real>, plane: &Plane) -> Point3<Real> {
    point - plane.normal * plane.distance_to_point(point)
}

/// Unit normal of the triangle `abc` (right-hand rule), zero for a degenerate triangle.
pub fn triangle_normal(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> Vector3<Real> {
    (b - a)
        .cross(&(c - a))
        .try_normalize(Real::EPSILON)
        .unwrap_or_else(Vector3::zeros)
}

/// Newell normal of a closed polygon, unit length or zero when degenerate.
pub fn polygon_normal(points: &[Point3<Real>]) -> Vector3<Real> {
    try_polygon_normal(points).unwrap_or_else(Vector3::zeros)
}

/// Newell normal of a closed polygon, `None` when the polygon has no area.
pub fn try_polygon_normal(points: &[Point3<Real>]) -> Option<Vector3<Real>> {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .fold(Vector3::zeros(), |acc: Vector3<Real>, (current, next)| {
            acc + Vector3::new(
                (current.y - next.y) * (current.z + next.z),
                (current.z - next.z) * (current.x + next.x),
                (current.x - next.x) * (current.y + next.y),
            )
        })
        .try_normalize(Real::EPSILON)
}

/// Plane through the first three points that are not collinear.
pub fn supporting_plane(points: &[Point3<Real>], tol: &Tolerance) -> Option<Plane> {
    let first = points.first()?;
    let second = points.iter().skip(1).find(|p| !tol.compare_points(first, *p))?;
    points
        .iter()
        .find(|p| !tol.points_collinear(first, second, *p))
        .and_then(|third| Plane::try_from_points(first, second, third))
}

/// Index of the first point that is off the given plane.
pub fn first_point_off_plane(points: &[Point3<Real>], plane: &Plane, tol: &Tolerance) -> Option<usize> {
    points.iter().position(|p| !plane.contains_point(p, tol))
}

/// Full planarity check, every point against the plane of the first three.
pub fn is_polygon_planar(points: &[Point3<Real>], tol: &Tolerance) -> bool {
    match points.len() {
        0..=3 => true,
        _ => supporting_plane(points, tol)
            .is_some_and(|plane| first_point_off_plane(points, &plane, tol).is_none()),
    }
}

/// Drops a planar polygon to 2D: rotates its normal onto +Z and keeps X/Y.
///
/// The normal comes from Newell's method over all points so a collinear
/// leading triple does not spoil it. Planarity is not verified here; callers
/// that care run [`is_polygon_planar`] first.
pub fn polygon_in_2d(points: &[Point3<Real>]) -> Vec<Point2<Real>> {
    let Some(normal) = try_polygon_normal(points) else {
        return points.iter().map(|p| Point2::new(p.x, p.y)).collect();
    };
    let rotation = rotation_to_z(&normal);
    points
        .iter()
        .map(|p| {
            let rotated = rotation.transform_point(p);
            Point2::new(rotated.x, rotated.y)
        })
        .collect()
}

/// Unsigned angle between two vectors in `[0, π]`.
pub fn angle_between(a: &Vector3<Real>, b: &Vector3<Real>) -> Real {
    let denom = a.norm() * b.norm();
    if denom <= Real::EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// Signed angle from `a` to `b` around `axis`, in `(-π, π]`.
pub fn signed_angle(a: &Vector3<Real>, b: &Vector3<Real>, axis: &Vector3<Real>) -> Real {
    let angle = angle_between(a, b);
    if a.cross(b).dot(axis) < 0.0 { -angle } else { angle }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newell_normal_of_square() {
        let square = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let n = polygon_normal(&square);
        assert!((n - Vector3::z()).norm() < 1e-12);
    }

    #[test]
    fn supporting_plane_skips_collinear_start() {
        let tol = Tolerance::new(1e-9);
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        let plane = supporting_plane(&points, &tol).expect("plane");
        assert!(tol.compare(plane.normal.z.abs(), 1.0));
    }
}
