//! Test support library
//! Provides various helper functions & utilities for tests.
#![allow(dead_code)]

use nalgebra::{Point3, Vector3};
use polycsg::{
    ExtrudedMesh,
    engine::{polygon::Polygon, vertex::Vertex},
    float_types::Real,
    triangulate::Triangulation,
};

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Helper to make a simple Polygon in 3D with given vertices.
pub fn make_polygon_3d(points: &[[Real; 3]]) -> Polygon<()> {
    let verts = points
        .iter()
        .map(|p| Vertex::new(Point3::new(p[0], p[1], p[2]), Vector3::z()))
        .collect();
    Polygon::new(verts, None)
}

pub fn points(coords: &[[Real; 3]]) -> Vec<Point3<Real>> {
    coords.iter().map(|&c| Point3::from(c)).collect()
}

pub fn flat(points: &[Point3<Real>]) -> Vec<Real> {
    points.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
}

/// Outline in the XY plane listed counter-clockwise.
pub fn l_shape() -> Vec<Point3<Real>> {
    points(&[
        [0.0, 0.0, 0.0],
        [2.0, 0.0, 0.0],
        [2.0, 1.0, 0.0],
        [1.0, 1.0, 0.0],
        [1.0, 2.0, 0.0],
        [0.0, 2.0, 0.0],
    ])
}

/// A comb with `teeth` upward teeth, counter-clockwise in XY.
pub fn comb(teeth: usize) -> Vec<Point3<Real>> {
    let mut out = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(2.0 * teeth as Real, 0.0, 0.0)];
    for t in (0..teeth).rev() {
        let x = 2.0 * t as Real;
        out.push(Point3::new(x + 2.0, 2.0, 0.0));
        out.push(Point3::new(x + 1.0, 2.0, 0.0));
        out.push(Point3::new(x + 1.0, 1.0, 0.0));
        if t > 0 {
            out.push(Point3::new(x, 1.0, 0.0));
        }
    }
    out.push(Point3::new(0.0, 1.0, 0.0));
    out
}

/// Twice the Newell vector area of a polygon, as a plain area.
pub fn polygon_area(points: &[Point3<Real>]) -> Real {
    let mut sum = Vector3::zeros();
    for (a, b) in points.iter().zip(points.iter().cycle().skip(1)) {
        sum += a.coords.cross(&b.coords);
    }
    sum.norm() * 0.5
}

/// Sum of triangle areas, each signed by agreement with `normal`.
pub fn signed_triangle_area(
    result: &Triangulation,
    positions: &[Real],
    normal: &Vector3<Real>,
) -> Real {
    result
        .triangles()
        .map(|t| {
            let p = t.map(|id| {
                let i = id as usize * 3;
                Point3::new(positions[i], positions[i + 1], positions[i + 2])
            });
            (p[1] - p[0]).cross(&(p[2] - p[0])).dot(normal) * 0.5
        })
        .sum()
}

/// Unit square outline at z = 0.
pub fn unit_square() -> Vec<Point3<Real>> {
    points(&[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ])
}

/// The unit cube as an extrusion of the unit square along +Z.
pub fn unit_cube() -> ExtrudedMesh {
    ExtrudedMesh::new(unit_square(), Vector3::z(), 1.0).expect("valid cube outline")
}

/// Routes log output through the test harness. `RUST_LOG=polycsg=debug`
/// shows node evaluations; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "polycsg=warn".into()),
        )
        .with_test_writer()
        .try_init();
}
