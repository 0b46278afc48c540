//! Stand-alone triangles with per-edge sharpness flags.
//!
//! Sharpness is decided pairwise: [`Triangle::set_sharp_edge`] finds the edge
//! two triangles share and records the verdict on both of them. The flags sit
//! behind a mutex so neighbouring pairs can be classified from several threads
//! at once; both locks are always taken in ascending triangle id order.

use crate::float_types::{Real, parry3d::bounding_volume::Aabb};
use crate::geometry::{Tolerance, angle_between, triangle_normal};
use crate::mesh::MaterialId;
use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

static NEXT_TRIANGLE_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SharpEdge {
    /// No neighbour has been compared yet.
    #[default]
    Unknown,
    Soft,
    Sharp,
}

#[derive(Debug)]
pub struct Triangle {
    id: u64,
    pub points: [Point3<Real>; 3],
    pub normals: [Vector3<Real>; 3],
    pub material: MaterialId,
    /// Edge `k` runs from `points[k]` to `points[(k + 1) % 3]`.
    sharp_edges: Mutex<[SharpEdge; 3]>,
    bounding_box: OnceLock<Aabb>,
}

impl Clone for Triangle {
    /// The copy keeps the flags but gets its own id.
    fn clone(&self) -> Self {
        let mut copy = Triangle::new(self.points, self.normals, self.material);
        copy.sharp_edges = Mutex::new(self.sharp_edges());
        copy
    }
}

impl Triangle {
    pub fn new(points: [Point3<Real>; 3], normals: [Vector3<Real>; 3], material: MaterialId) -> Self {
        Triangle {
            id: NEXT_TRIANGLE_ID.fetch_add(1, Ordering::Relaxed),
            points,
            normals,
            material,
            sharp_edges: Mutex::new([SharpEdge::Unknown; 3]),
            bounding_box: OnceLock::new(),
        }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    fn flags(&self) -> MutexGuard<'_, [SharpEdge; 3]> {
        // the flags are plain data, a panic elsewhere cannot leave them torn
        self.sharp_edges.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sharp_edges(&self) -> [SharpEdge; 3] {
        *self.flags()
    }

    pub fn is_sharp(&self, edge: usize) -> bool {
        self.flags().get(edge) == Some(&SharpEdge::Sharp)
    }

    pub fn edge(&self, edge: usize) -> [Point3<Real>; 2] {
        [self.points[edge % 3], self.points[(edge + 1) % 3]]
    }

    /// Geometric face normal, zero for a degenerate triangle.
    pub fn face_normal(&self) -> Vector3<Real> {
        triangle_normal(&self.points[0], &self.points[1], &self.points[2])
    }

    pub fn area(&self) -> Real {
        (self.points[1] - self.points[0])
            .cross(&(self.points[2] - self.points[0]))
            .norm()
            * 0.5
    }

    pub fn bounding_box(&self) -> Aabb {
        *self.bounding_box.get_or_init(|| {
            let [a, b, c] = self.points;
            Aabb::new(a.inf(&b).inf(&c), a.sup(&b).sup(&c))
        })
    }

    /// The edge of `self` and of `other` that join the same two points.
    pub fn shared_edge(&self, other: &Triangle, tol: &Tolerance) -> Option<(usize, usize)> {
        for i in 0..3 {
            let [a, b] = self.edge(i);
            for j in 0..3 {
                let [c, d] = other.edge(j);
                let opposite = tol.compare_points(&a, &d) && tol.compare_points(&b, &c);
                let same = tol.compare_points(&a, &c) && tol.compare_points(&b, &d);
                if opposite || same {
                    return Some((i, j));
                }
            }
        }
        None
    }

    /// Classifies the edge shared with `other` and stores the result on both
    /// triangles. Returns the verdict, `None` when nothing is shared or either
    /// face is degenerate.
    pub fn set_sharp_edge(&self, other: &Triangle, angle_threshold: Real, tol: &Tolerance) -> Option<SharpEdge> {
        if self.id == other.id {
            return None;
        }
        let (mine, theirs) = self.shared_edge(other, tol)?;

        let (n1, n2) = (self.face_normal(), other.face_normal());
        if n1 == Vector3::zeros() || n2 == Vector3::zeros() {
            return None;
        }
        let verdict = if angle_between(&n1, &n2) > angle_threshold {
            SharpEdge::Sharp
        } else {
            SharpEdge::Soft
        };

        let (first, second) = if self.id < other.id { (self, other) } else { (other, self) };
        let mut first_flags = first.flags();
        let mut second_flags = second.flags();
        if self.id < other.id {
            first_flags[mine] = verdict;
            second_flags[theirs] = verdict;
        } else {
            first_flags[theirs] = verdict;
            second_flags[mine] = verdict;
        }
        Some(verdict)
    }
}

type PointKey = (i64, i64, i64);

fn point_key(p: &Point3<Real>, tol: &Tolerance) -> PointKey {
    let q = |v: Real| (v / tol.epsilon.max(Real::EPSILON)).round() as i64;
    (q(p.x), q(p.y), q(p.z))
}

/// Classifies every edge shared by two triangles of the slice. Returns the
/// number of pairs found sharp.
pub fn classify_sharp_edges(triangles: &[Triangle], angle_threshold: Real, tol: &Tolerance) -> usize {
    let mut edges: HashMap<(PointKey, PointKey), Vec<usize>> = HashMap::new();
    for (index, triangle) in triangles.iter().enumerate() {
        for edge in 0..3 {
            let [a, b] = triangle.edge(edge);
            let (ka, kb) = (point_key(&a, tol), point_key(&b, tol));
            let key = if ka <= kb { (ka, kb) } else { (kb, ka) };
            edges.entry(key).or_default().push(index);
        }
    }

    let pairs: Vec<(usize, usize)> = edges
        .values()
        .flat_map(|owners| {
            owners.iter().enumerate().flat_map(move |(k, &i)| {
                owners[k + 1..].iter().map(move |&j| (i, j))
            })
        })
        .filter(|(i, j)| i != j)
        .collect();

    #[cfg(feature = "parallel")]
    let iter = pairs.par_iter();
    #[cfg(not(feature = "parallel"))]
    let iter = pairs.iter();

    iter.filter(|(i, j)| {
        triangles[*i].set_sharp_edge(&triangles[*j], angle_threshold, tol) == Some(SharpEdge::Sharp)
    })
    .count()
}
