mod support;

use approx::assert_relative_eq;
use nalgebra::{Point2, Point3, Vector3};
use polycsg::{
    float_types::{PI, Real},
    geometry::{
        Line3, Plane, Tolerance, angle_between, is_polygon_planar, line_intersect_line,
        line_intersect_plane, point_in_polygon, polygon_in_2d, polygon_normal,
        project_point_on_line, project_point_on_plane, segment_intersect_plane,
        segments_intersect_2d, segments_overlap_2d, signed_area, supporting_plane,
        triangle_normal,
    },
};

use crate::support::{l_shape, points};

fn tol() -> Tolerance {
    Tolerance::new(1e-9)
}

fn p2(x: Real, y: Real) -> Point2<Real> {
    Point2::new(x, y)
}

#[test]
fn line_meets_plane() {
    let plane = Plane::from_normal_and_point(Vector3::z(), &Point3::new(0.0, 0.0, 2.0));
    let line = Line3::new(Point3::new(1.0, 1.0, 0.0), Vector3::new(1.0, 0.0, 1.0));
    let hit = line_intersect_plane(&line, &plane, &tol()).unwrap();
    assert_relative_eq!(hit, Point3::new(3.0, 1.0, 2.0), epsilon = 1e-12);
}

#[test]
fn parallel_line_misses_plane() {
    let plane = Plane::from_normal_and_point(Vector3::z(), &Point3::origin());
    let line = Line3::new(Point3::new(0.0, 0.0, 1.0), Vector3::x());
    assert!(line_intersect_plane(&line, &plane, &tol()).is_none());
}

#[test]
fn segment_must_reach_the_plane() {
    let plane = Plane::from_normal_and_point(Vector3::z(), &Point3::new(0.0, 0.0, 0.5));
    let a = Point3::new(0.0, 0.0, 0.0);
    let b = Point3::new(0.0, 0.0, 1.0);
    let c = Point3::new(0.0, 0.0, 0.25);

    let hit = segment_intersect_plane(&a, &b, &plane, &tol()).unwrap();
    assert_relative_eq!(hit.z, 0.5, epsilon = 1e-12);
    assert!(segment_intersect_plane(&a, &c, &plane, &tol()).is_none());
}

#[test]
fn crossing_lines_meet() {
    let l1 = Line3::through(&Point3::new(0.0, 0.0, 1.0), &Point3::new(2.0, 2.0, 1.0));
    let l2 = Line3::through(&Point3::new(0.0, 2.0, 1.0), &Point3::new(2.0, 0.0, 1.0));
    let hit = line_intersect_line(&l1, &l2, &tol()).unwrap();
    assert_relative_eq!(hit, Point3::new(1.0, 1.0, 1.0), epsilon = 1e-12);
}

#[test]
fn skew_and_parallel_lines_do_not_meet() {
    let l1 = Line3::new(Point3::origin(), Vector3::x());
    let skew = Line3::new(Point3::new(0.0, 0.0, 1.0), Vector3::y());
    let parallel = Line3::new(Point3::new(0.0, 1.0, 0.0), Vector3::x());
    assert!(line_intersect_line(&l1, &skew, &tol()).is_none());
    assert!(line_intersect_line(&l1, &parallel, &tol()).is_none());
}

#[test]
fn projections_land_on_target() {
    let line = Line3::new(Point3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 2.0, 0.0));
    let on_line = project_point_on_line(&Point3::new(5.0, 3.0, -1.0), &line);
    assert_relative_eq!(on_line, Point3::new(1.0, 3.0, 0.0), epsilon = 1e-12);

    let plane = Plane::from_normal_and_point(Vector3::new(0.0, 1.0, 1.0), &Point3::new(0.0, 1.0, 0.0));
    let on_plane = project_point_on_plane(&Point3::new(2.0, 3.0, 3.0), &plane);
    assert!(plane.contains_point(&on_plane, &tol()));
    assert_relative_eq!(on_plane.x, 2.0, epsilon = 1e-12);
}

#[test]
fn normals_follow_winding() {
    let a = Point3::new(0.0, 0.0, 0.0);
    let b = Point3::new(1.0, 0.0, 0.0);
    let c = Point3::new(0.0, 1.0, 0.0);
    assert_relative_eq!(triangle_normal(&a, &b, &c), Vector3::z(), epsilon = 1e-12);
    assert_relative_eq!(triangle_normal(&a, &c, &b), -Vector3::z(), epsilon = 1e-12);

    // start at the reflex corner, the Newell normal does not depend on it
    let mut outline = l_shape();
    outline.rotate_left(3);
    assert_relative_eq!(polygon_normal(&outline), Vector3::z(), epsilon = 1e-12);
}

#[test]
fn collinear_leading_points_still_give_a_plane() {
    let outline = points(&[
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [2.0, 0.0, 1.0],
        [2.0, 1.0, 1.0],
    ]);
    let plane = supporting_plane(&outline, &tol()).unwrap();
    assert_relative_eq!(plane.normal, Vector3::z(), epsilon = 1e-12);
    assert_relative_eq!(plane.w, 1.0, epsilon = 1e-12);
    assert!(is_polygon_planar(&outline, &tol()));
}

#[test]
fn lifted_corner_is_not_planar() {
    let outline = points(&[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.01],
        [0.0, 1.0, 0.0],
    ]);
    assert!(!is_polygon_planar(&outline, &tol()));
}

#[test]
fn flattened_polygon_keeps_area_and_winding() {
    let outline = points(&[
        [0.0, 0.0, 0.0],
        [0.0, 2.0, 0.0],
        [0.0, 2.0, 3.0],
        [0.0, 0.0, 3.0],
    ]);
    let flat = polygon_in_2d(&outline);
    assert_relative_eq!(signed_area(&flat), 6.0, epsilon = 1e-9);
}

#[test]
fn point_in_l_shape() {
    let flat: Vec<Point2<Real>> = l_shape().iter().map(|p| p2(p.x, p.y)).collect();
    assert!(point_in_polygon(&p2(0.5, 0.5), &flat));
    assert!(point_in_polygon(&p2(0.5, 1.5), &flat));
    assert!(!point_in_polygon(&p2(1.5, 1.5), &flat));
    assert!(!point_in_polygon(&p2(-0.5, 0.5), &flat));
    // ray through the reflex vertex at (1, 1)
    assert!(point_in_polygon(&p2(0.5, 1.0), &flat));
}

#[test]
fn segment_predicates() {
    let t = tol();
    assert!(segments_intersect_2d(&p2(0.0, 0.0), &p2(2.0, 2.0), &p2(0.0, 2.0), &p2(2.0, 0.0), &t));
    assert!(!segments_intersect_2d(&p2(0.0, 0.0), &p2(1.0, 0.0), &p2(0.0, 1.0), &p2(1.0, 1.0), &t));
    // touching at an end point counts
    assert!(segments_intersect_2d(&p2(0.0, 0.0), &p2(1.0, 0.0), &p2(1.0, 0.0), &p2(1.0, 1.0), &t));

    assert!(segments_overlap_2d(&p2(0.0, 0.0), &p2(2.0, 0.0), &p2(1.0, 0.0), &p2(3.0, 0.0), &t));
    assert!(!segments_overlap_2d(&p2(0.0, 0.0), &p2(1.0, 0.0), &p2(1.0, 0.0), &p2(2.0, 0.0), &t));
}

#[test]
fn angles() {
    let t = Tolerance::new(1e-9);
    assert_relative_eq!(angle_between(&Vector3::x(), &Vector3::y()), PI / 2.0, epsilon = 1e-12);
    assert_relative_eq!(angle_between(&Vector3::x(), &-Vector3::x()), PI, epsilon = 1e-12);
    assert!(t.compare_angle(-PI, PI));
    assert!(!t.compare_angle(0.0, PI));
}
