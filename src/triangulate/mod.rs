//! Polygon triangulation over a bulk position array.
//!
//! A polygon is a list of vertex ids into a flat `[x, y, z, x, y, z, ...]`
//! buffer, the layout the [`Mesh`](crate::mesh::Mesh) container stores. Two
//! strategies are offered:
//!
//! - [`triangulate_polygon`]: convex fan fast path, otherwise ear clipping in
//!   the polygon's own plane.
//! - [`triangulate_polygon_constrained`]: constrained Delaunay triangulation
//!   with planarity and duplicate guards, falling back to ear clipping.
//!
//! Output triangles wind the same way as the input polygon, so their normals
//! agree with the polygon's Newell normal.

pub mod constrained;
pub mod ear_clip;

pub use constrained::{ConstrainedTriangulation, triangulate_polygon_constrained};
pub use ear_clip::{
    is_counterclockwise_ordered, is_diagonal, polygon_2d_is_convex, segment_in_cone,
};

use crate::float_types::{Real, TAU};
use crate::geometry::{Tolerance, polygon_in_2d, tools::try_polygon_normal};
use nalgebra::{Point3, Vector3};

/// Triangle indices produced for one polygon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triangulation {
    /// Flat triangle list of original vertex ids.
    pub indices: Vec<u32>,
    /// Ids removed before triangulating because they repeated an earlier
    /// position, or because they pointed outside the position buffer.
    pub dropped: Vec<u32>,
}

impl Triangulation {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }
}

/// Reads `position(id)` out of a flat xyz buffer.
#[inline]
pub fn position(positions: &[Real], id: u32) -> Option<Point3<Real>> {
    let i = id as usize * 3;
    positions
        .get(i..i + 3)
        .map(|p| Point3::new(p[0], p[1], p[2]))
}

/// Resolves ids to points, dropping out-of-range ids and repeated positions.
pub(crate) fn distinct_points(
    indices: &[u32],
    positions: &[Real],
    tol: &Tolerance,
) -> (Vec<u32>, Vec<Point3<Real>>, Vec<u32>) {
    let mut kept_ids = Vec::with_capacity(indices.len());
    let mut kept_points: Vec<Point3<Real>> = Vec::with_capacity(indices.len());
    let mut dropped = Vec::new();

    for &id in indices {
        let Some(point) = position(positions, id) else {
            tracing::warn!(index = id, "vertex id outside position buffer, dropped");
            dropped.push(id);
            continue;
        };
        if kept_points.iter().any(|p| tol.compare_points(p, &point)) {
            tracing::warn!(index = id, "duplicate polygon vertex dropped before triangulation");
            dropped.push(id);
            continue;
        }
        kept_ids.push(id);
        kept_points.push(point);
    }

    (kept_ids, kept_points, dropped)
}

/// Convexity of a planar 3D polygon: every turn has the same sense around
/// the polygon normal and the turns add up to a single revolution.
pub fn polygon_3d_is_convex(points: &[Point3<Real>], tol: &Tolerance) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let Some(normal) = try_polygon_normal(points) else {
        return false;
    };

    let mut total_turn = 0.0;
    for i in 0..n {
        let incoming: Vector3<Real> = points[(i + 1) % n] - points[i];
        let outgoing: Vector3<Real> = points[(i + 2) % n] - points[(i + 1) % n];
        let scale = incoming.norm() * outgoing.norm();
        if scale <= tol.epsilon * tol.epsilon {
            continue;
        }
        let sin = incoming.cross(&outgoing).dot(&normal) / scale;
        if sin < -tol.epsilon {
            return false;
        }
        total_turn += sin.atan2(incoming.dot(&outgoing) / scale);
    }

    (total_turn - TAU).abs() < 1e-3
}

/// A vertex collinear with its neighbours would give the fan a zero-area triangle.
fn has_straight_vertex(points: &[Point3<Real>], tol: &Tolerance) -> bool {
    let n = points.len();
    (0..n).any(|i| tol.points_collinear(&points[(i + n - 1) % n], &points[i], &points[(i + 1) % n]))
}

fn fan(ids: &[u32]) -> Vec<u32> {
    let mut indices = Vec::with_capacity((ids.len() - 2) * 3);
    for i in 1..ids.len() - 1 {
        indices.extend_from_slice(&[ids[0], ids[i], ids[i + 1]]);
    }
    indices
}

/// Triangulates a planar polygon given as ids into a flat position buffer.
///
/// Repeated positions are dropped (and reported in [`Triangulation::dropped`]).
/// Convex polygons are fanned directly; everything else goes through
/// [`triangulate_polygon_ear_clipping`].
pub fn triangulate_polygon(indices: &[u32], positions: &[Real], tol: &Tolerance) -> Triangulation {
    let (ids, points, dropped) = distinct_points(indices, positions, tol);
    let indices = match ids.len() {
        0..=2 => {
            tracing::warn!(count = ids.len(), "polygon has fewer than 3 distinct vertices");
            Vec::new()
        },
        3 => ids,
        _ if polygon_3d_is_convex(&points, tol) && !has_straight_vertex(&points, tol) => fan(&ids),
        _ => ear_clip_ids(ids, &points, tol),
    };
    Triangulation { indices, dropped }
}

/// Same as [`triangulate_polygon`] without the convex fast path.
pub fn triangulate_polygon_ear_clipping(
    indices: &[u32],
    positions: &[Real],
    tol: &Tolerance,
) -> Triangulation {
    let (ids, points, dropped) = distinct_points(indices, positions, tol);
    let indices = if ids.len() < 3 {
        tracing::warn!(count = ids.len(), "polygon has fewer than 3 distinct vertices");
        Vec::new()
    } else {
        ear_clip_ids(ids, &points, tol)
    };
    Triangulation { indices, dropped }
}

/// Triangulates an ordered point list, ids are positions in `points`.
pub fn triangulate_points(points: &[Point3<Real>], tol: &Tolerance) -> Triangulation {
    let positions: Vec<Real> = points.iter().flat_map(|p| [p.x, p.y, p.z]).collect();
    let ids: Vec<u32> = (0..points.len() as u32).collect();
    triangulate_polygon(&ids, &positions, tol)
}

/// Drops the polygon into its own plane, makes it counter-clockwise and clips ears.
fn ear_clip_ids(mut ids: Vec<u32>, points: &[Point3<Real>], tol: &Tolerance) -> Vec<u32> {
    let mut polygon = polygon_in_2d(points);

    let reversed = !is_counterclockwise_ordered(&polygon);
    if reversed {
        polygon.reverse();
        ids.reverse();
    }

    let mut out = Vec::with_capacity((ids.len() - 2) * 3);
    ear_clip::triangulate(&mut polygon, &mut ids, &mut out, tol);

    if reversed {
        // restore the caller's winding
        for triangle in out.chunks_exact_mut(3) {
            triangle.swap(1, 2);
        }
    }
    out
}
