mod support;

use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};
use polycsg::geometry::{
    Plane, Tolerance,
    plane::{BACK, COPLANAR, FRONT, SPANNING},
};

use crate::support::make_polygon_3d;

#[test]
fn test_plane_flip() {
    let mut plane = Plane::from_normal(Vector3::y(), 2.0);
    plane.flip();
    assert_eq!(plane.normal(), Vector3::new(0.0, -1.0, 0.0));
    assert_eq!(plane.offset(), -2.0);
}

#[test]
fn test_plane_from_coefficients_is_normalized() {
    // 2z - 4 = 0
    let plane = Plane::from_coefficients(0.0, 0.0, 2.0, -4.0);
    assert_relative_eq!(plane.normal(), Vector3::z(), epsilon = 1e-12);
    assert_relative_eq!(plane.offset(), 2.0, epsilon = 1e-12);
    assert_eq!(plane.coefficients(), [0.0, 0.0, 1.0, -2.0]);
}

#[test]
fn test_plane_orient_point() {
    let plane = Plane::from_normal(Vector3::z(), 0.0);
    assert_eq!(plane.orient_point(&Point3::new(0.0, 0.0, 1.0)), FRONT);
    assert_eq!(plane.orient_point(&Point3::new(0.0, 0.0, -1.0)), BACK);
    assert_eq!(plane.orient_point(&Point3::new(3.0, -2.0, 0.0)), COPLANAR);
}

#[test]
fn test_plane_classify_polygon() {
    let plane = Plane::from_normal(Vector3::x(), 0.5);
    let spanning = make_polygon_3d(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]);
    let behind = make_polygon_3d(&[[0.0, 0.0, 0.0], [0.2, 0.0, 0.0], [0.2, 1.0, 0.0]]);
    assert_eq!(plane.classify_polygon(&spanning), SPANNING);
    assert_eq!(plane.classify_polygon(&behind), BACK);
}

#[test]
fn test_plane_split_polygon() {
    // splitting plane x = 0.5
    let plane = Plane::from_normal(Vector3::x(), 0.5);
    let polygon = make_polygon_3d(&[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ]);

    let (coplanar_front, coplanar_back, front, back) = plane.split_polygon(&polygon);
    assert!(coplanar_front.is_empty());
    assert!(coplanar_back.is_empty());
    assert_eq!(front.len(), 1);
    assert_eq!(back.len(), 1);

    assert!(front[0].vertices.iter().all(|v| v.pos.x >= 0.5 - 1e-12));
    assert!(back[0].vertices.iter().all(|v| v.pos.x <= 0.5 + 1e-12));
    assert_eq!(front[0].vertices.len(), 4);
    assert_eq!(back[0].vertices.len(), 4);
    // the pieces keep the parent plane
    assert_eq!(front[0].plane, polygon.plane);
}

#[test]
fn test_plane_split_coplanar_by_facing() {
    let plane = Plane::from_normal(Vector3::z(), 0.0);
    let up = make_polygon_3d(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    let mut down = up.clone();
    down.flip();

    let (coplanar_front, coplanar_back, _, _) = plane.split_polygon(&up);
    assert_eq!((coplanar_front.len(), coplanar_back.len()), (1, 0));
    let (coplanar_front, coplanar_back, _, _) = plane.split_polygon(&down);
    assert_eq!((coplanar_front.len(), coplanar_back.len()), (0, 1));
}

#[test]
fn test_plane_to_xy_transform() {
    let plane = Plane::from_normal_and_point(Vector3::new(1.0, 1.0, 0.0), &Point3::new(2.0, 0.0, 5.0));
    let (to_xy, from_xy) = plane.to_xy_transform();
    let tol = Tolerance::new(1e-9);

    let on_plane = Point3::new(1.0, 1.0, -3.0);
    assert!(plane.contains_point(&on_plane, &tol));
    let flat = to_xy.transform_point(&on_plane);
    assert_relative_eq!(flat.z, 0.0, epsilon = 1e-9);
    assert_relative_eq!(from_xy.transform_point(&flat), on_plane, epsilon = 1e-9);
}
