mod support;

use approx::assert_relative_eq;
use nalgebra::{Point3, Rotation3, Vector3};
use polycsg::{
    float_types::Real,
    geometry::{Tolerance, polygon_normal},
    triangulate::{
        polygon_3d_is_convex, triangulate_points, triangulate_polygon,
        triangulate_polygon_constrained, triangulate_polygon_ear_clipping,
    },
};

use crate::support::{comb, flat, l_shape, points, polygon_area, signed_triangle_area};

fn tol() -> Tolerance {
    Tolerance::new(1e-9)
}

/// Checks count, coverage and winding for a simple polygon.
fn assert_covers(outline: &[Point3<Real>]) {
    let positions = flat(outline);
    let ids: Vec<u32> = (0..outline.len() as u32).collect();
    let result = triangulate_polygon(&ids, &positions, &tol());

    assert_eq!(result.indices.len(), 3 * (outline.len() - 2));
    assert!(result.dropped.is_empty());

    let normal = polygon_normal(outline);
    // every triangle winds like the outline, so signed areas add up to the outline's area
    for t in result.triangles() {
        let p = t.map(|id| outline[id as usize]);
        assert!((p[1] - p[0]).cross(&(p[2] - p[0])).dot(&normal) > 0.0);
    }
    assert_relative_eq!(
        signed_triangle_area(&result, &positions, &normal),
        polygon_area(outline),
        epsilon = 1e-9
    );
}

#[test]
fn l_shape_is_covered() {
    assert_covers(&l_shape());
}

#[test]
fn clockwise_l_shape_keeps_its_winding() {
    let mut outline = l_shape();
    outline.reverse();
    assert_covers(&outline);
}

#[test]
fn comb_is_covered() {
    assert_covers(&comb(5));
}

#[test]
fn millimetre_comb_is_covered() {
    let outline: Vec<Point3<Real>> = comb(3).iter().map(|p| p * 1e-3).collect();
    let positions = flat(&outline);
    let ids: Vec<u32> = (0..outline.len() as u32).collect();
    let result = triangulate_polygon(&ids, &positions, &Tolerance::new(1e-6));
    assert_eq!(result.indices.len(), 3 * (outline.len() - 2));

    // no overlaps: unsigned areas add up to exactly the outline
    let covered: Real = result
        .triangles()
        .map(|t| {
            let p = t.map(|id| outline[id as usize]);
            (p[1] - p[0]).cross(&(p[2] - p[0])).norm() * 0.5
        })
        .sum();
    assert_relative_eq!(covered, polygon_area(&outline), max_relative = 1e-9);
}

#[test]
fn tilted_comb_is_covered() {
    let rotation = Rotation3::from_euler_angles(0.3, -1.1, 0.7);
    let outline: Vec<Point3<Real>> = comb(3)
        .iter()
        .map(|p| rotation * p + Vector3::new(4.0, -2.0, 9.0))
        .collect();
    assert_covers(&outline);
}

#[test]
fn vertical_polygon_is_covered() {
    // lies in the XZ plane, facing -Y
    assert_covers(&points(&[
        [0.0, 0.0, 0.0],
        [0.0, 0.0, 2.0],
        [1.0, 0.0, 2.0],
        [1.0, 0.0, 1.0],
        [2.0, 0.0, 1.0],
        [2.0, 0.0, 0.0],
    ]));
}

#[test]
fn collinear_vertices_are_kept() {
    // square with a midpoint on the bottom edge
    let outline = points(&[
        [0.0, 0.0, 0.0],
        [0.5, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ]);
    assert_covers(&outline);
}

#[test]
fn convex_fast_path_matches_ear_clipping() {
    let hexagon: Vec<Point3<Real>> = (0..6)
        .map(|i| {
            let a = i as Real * std::f64::consts::FRAC_PI_3 as Real;
            Point3::new(a.cos(), a.sin(), 1.0)
        })
        .collect();
    assert!(polygon_3d_is_convex(&hexagon, &tol()));

    let positions = flat(&hexagon);
    let ids: Vec<u32> = (0..6).collect();
    let fast = triangulate_polygon(&ids, &positions, &tol());
    let clipped = triangulate_polygon_ear_clipping(&ids, &positions, &tol());

    assert_eq!(fast.triangle_count(), 4);
    assert_eq!(clipped.triangle_count(), 4);
    let normal = Vector3::z();
    assert_relative_eq!(
        signed_triangle_area(&fast, &positions, &normal),
        signed_triangle_area(&clipped, &positions, &normal),
        epsilon = 1e-9
    );
}

#[test]
fn duplicate_vertices_are_dropped_and_reported() {
    let mut outline = l_shape();
    outline.insert(3, outline[2]);
    let positions = flat(&outline);
    let ids: Vec<u32> = (0..outline.len() as u32).collect();

    let result = triangulate_polygon(&ids, &positions, &tol());
    assert_eq!(result.dropped, vec![3]);
    assert_eq!(result.triangle_count(), 4);
    assert!(result.indices.iter().all(|&i| i != 3));
}

#[test]
fn ids_index_a_shared_buffer() {
    // the polygon uses ids 10..14 of a larger buffer
    let mut buffer = vec![0.0; 30];
    buffer.extend(flat(&points(&[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ])));
    let result = triangulate_polygon(&[10, 11, 12, 13], &buffer, &tol());
    assert_eq!(result.triangle_count(), 2);
    assert!(result.indices.iter().all(|i| (10..14).contains(i)));
}

#[test]
fn too_few_points_yield_nothing() {
    let result = triangulate_points(&points(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]), &tol());
    assert!(result.indices.is_empty());
}

#[test]
fn constrained_square_reports_normal() {
    let outline = points(&[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ]);
    let positions = flat(&outline);
    let result = triangulate_polygon_constrained(&[0, 1, 2, 3], &positions, &tol());

    assert!(result.constrained);
    assert_eq!(result.triangulation.triangle_count(), 2);
    assert_relative_eq!(result.normal, Vector3::z(), epsilon = 1e-12);
}

#[test]
fn constrained_comb_matches_outline_winding() {
    let mut outline = comb(4);
    outline.reverse();
    let positions = flat(&outline);
    let ids: Vec<u32> = (0..outline.len() as u32).collect();
    let result = triangulate_polygon_constrained(&ids, &positions, &tol());

    assert!(result.constrained);
    assert_relative_eq!(result.normal, -Vector3::z(), epsilon = 1e-12);
    assert_relative_eq!(
        signed_triangle_area(&result.triangulation, &positions, &result.normal),
        polygon_area(&outline),
        epsilon = 1e-9
    );
}

#[test]
fn non_planar_polygon_falls_back_to_ear_clipping() {
    let outline = points(&[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.3],
        [0.0, 1.0, 0.0],
    ]);
    let positions = flat(&outline);
    let result = triangulate_polygon_constrained(&[0, 1, 2, 3], &positions, &tol());

    assert!(!result.constrained);
    assert_eq!(result.triangulation.indices.len(), 6);
}
