//! Constrained Delaunay triangulation through `geo`'s spade backend.
//!
//! Stricter than ear clipping about its input: every vertex must lie on the
//! plane of the first three and no two vertices may project onto the same 2D
//! coordinate. Whenever a guard or the backend fails, the polygon is handed to
//! [`triangulate_polygon`](super::triangulate_polygon) instead.

use super::{Triangulation, distinct_points, triangulate_polygon};
use crate::errors::TriangulationError;
use crate::float_types::Real;
use crate::geometry::{
    Plane, Tolerance, plane::rotation_to_z, signed_area, supporting_plane, tools::polygon_normal,
};
use geo::{Coord, LineString, Polygon as GeoPolygon, TriangulateSpade};
use nalgebra::{Point2, Point3, Vector3};

/// Result of [`triangulate_polygon_constrained`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConstrainedTriangulation {
    pub triangulation: Triangulation,
    /// Face normal consistent with the winding of every emitted triangle.
    pub normal: Vector3<Real>,
    /// False when the ear clipping fallback produced the triangles.
    pub constrained: bool,
}

/// Triangulates a polygon with the constrained backend, falling back to ear
/// clipping (with a warning) when the polygon is not planar, has coincident
/// projected points, or the backend result cannot be mapped back exactly.
pub fn triangulate_polygon_constrained(
    indices: &[u32],
    positions: &[Real],
    tol: &Tolerance,
) -> ConstrainedTriangulation {
    let (ids, points, dropped) = distinct_points(indices, positions, tol);

    match try_constrained(&ids, &points, tol) {
        Ok((triangle_ids, normal)) => ConstrainedTriangulation {
            triangulation: Triangulation {
                indices: triangle_ids,
                dropped,
            },
            normal,
            constrained: true,
        },
        Err(err) => {
            tracing::warn!(reason = %err, vertices = ids.len(), "falling back to ear clipping");
            let triangulation = triangulate_polygon(indices, positions, tol);
            ConstrainedTriangulation {
                triangulation,
                normal: polygon_normal(&points),
                constrained: false,
            }
        },
    }
}

/// Checks that no two projected points coincide.
pub fn polygon_compatible_with_constrained(
    polygon: &[Point2<Real>],
    tol: &Tolerance,
) -> Result<(), TriangulationError> {
    for (first, a) in polygon.iter().enumerate() {
        if let Some(offset) = polygon[first + 1..]
            .iter()
            .position(|b| tol.compare_points_2d(a, b))
        {
            return Err(TriangulationError::DuplicateProjectedPoints {
                first,
                second: first + 1 + offset,
            });
        }
    }
    Ok(())
}

/// Every point must be on the plane through the first three.
pub fn check_planarity(points: &[Point3<Real>], tol: &Tolerance) -> Result<Plane, TriangulationError> {
    let plane = supporting_plane(points, tol).ok_or(TriangulationError::TooFewPoints(points.len()))?;
    for (index, point) in points.iter().enumerate() {
        let distance = plane.distance_to_point(point);
        if !tol.is_zero(distance) {
            return Err(TriangulationError::NotPlanar { index, distance });
        }
    }
    Ok(plane)
}

fn try_constrained(
    ids: &[u32],
    points: &[Point3<Real>],
    tol: &Tolerance,
) -> Result<(Vec<u32>, Vector3<Real>), TriangulationError> {
    if points.len() < 3 {
        return Err(TriangulationError::TooFewPoints(points.len()));
    }
    let plane = check_planarity(points, tol)?;

    let rotation = rotation_to_z(&plane.normal);
    let polygon: Vec<Point2<Real>> = points
        .iter()
        .map(|p| {
            let r = rotation.transform_point(p);
            Point2::new(r.x, r.y)
        })
        .collect();
    polygon_compatible_with_constrained(&polygon, tol)?;

    // the plane normal may oppose the winding of the outline
    let counterclockwise = signed_area(&polygon) > 0.0;
    let normal = if counterclockwise { plane.normal } else { -plane.normal };

    let ring: Vec<Coord<Real>> = polygon.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    let triangles = GeoPolygon::new(LineString::new(ring), Vec::new())
        .constrained_triangulation(Default::default())
        .map_err(|e| TriangulationError::Engine(format!("{e:?}")))?;

    let lookup = |c: Coord<Real>| -> Option<usize> {
        let query = Point2::new(c.x, c.y);
        polygon.iter().position(|p| tol.compare_points_2d(p, &query))
    };

    let mut out = Vec::with_capacity(triangles.len() * 3);
    for triangle in &triangles {
        let corners = triangle.to_array();
        let mut local = [0usize; 3];
        for (slot, corner) in local.iter_mut().zip(corners) {
            *slot = lookup(corner).ok_or(TriangulationError::IndexMismatch {
                expected: (points.len() - 2) * 3,
                actual: out.len(),
            })?;
        }
        let area = crate::geometry::orientation_2d(
            &polygon[local[0]],
            &polygon[local[1]],
            &polygon[local[2]],
        );
        if (area > 0.0) != counterclockwise {
            local.swap(1, 2);
        }
        out.extend(local.iter().map(|&i| ids[i]));
    }

    let expected = (points.len() - 2) * 3;
    if out.len() != expected {
        return Err(TriangulationError::IndexMismatch {
            expected,
            actual: out.len(),
        });
    }
    Ok((out, normal))
}
