//! The boolean engine: polygon soups clipped against each other with BSP trees.
//!
//! A [`Model`] is what the [`csg`](crate::csg) adapter converts meshes into
//! before a union, difference or intersection, and converts back from after.
//! It carries no index buffer, every polygon owns its vertices.

pub mod bsp;
pub mod polygon;
pub mod vertex;

use crate::engine::{bsp::Node, polygon::Polygon, vertex::Vertex};
use crate::float_types::{
    Real,
    parry3d::bounding_volume::{Aabb, BoundingVolume},
};
use crate::geometry::{Plane, Tolerance, segment_intersect_plane};
use crate::traits::CSGOps;
use nalgebra::{Matrix3, Matrix4, Point3};
use std::{fmt::Debug, sync::OnceLock};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Clone, Debug)]
pub struct Model<S: Clone + Send + Sync + Debug> {
    pub polygons: Vec<Polygon<S>>,

    /// Lazily calculated AABB that spans `polygons`.
    pub bounding_box: OnceLock<Aabb>,

    /// Whether the vertex texture coordinates carry information.
    pub has_texels: bool,
}

impl<S: Clone + Send + Sync + Debug> Model<S> {
    /// Build a Model from an existing polygon list
    pub fn from_polygons(polygons: Vec<Polygon<S>>, has_texels: bool) -> Self {
        Model {
            polygons,
            bounding_box: OnceLock::new(),
            has_texels,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Number of triangles the polygons fan into.
    pub fn triangle_count(&self) -> usize {
        self.polygons
            .iter()
            .map(|p| p.vertices.len().saturating_sub(2))
            .sum()
    }

    /// Split polygons into (may_touch, cannot_touch) using bounding‑box tests
    fn partition_polys(
        polys: &[Polygon<S>],
        other_bb: &Aabb,
    ) -> (Vec<Polygon<S>>, Vec<Polygon<S>>) {
        let mut maybe = Vec::new();
        let mut never = Vec::new();
        for p in polys {
            if p.bounding_box().intersects(other_bb) {
                maybe.push(p.clone());
            } else {
                never.push(p.clone());
            }
        }
        (maybe, never)
    }

    /// Helper to collect all vertices.
    #[cfg(not(feature = "parallel"))]
    pub fn vertices(&self) -> Vec<Vertex> {
        self.polygons
            .iter()
            .flat_map(|p| p.vertices.clone())
            .collect()
    }

    /// Parallel helper to collect all vertices.
    #[cfg(feature = "parallel")]
    pub fn vertices(&self) -> Vec<Vertex> {
        self.polygons
            .par_iter()
            .flat_map(|p| p.vertices.clone())
            .collect()
    }

    /// Cross-section segments where the surface meets `plane`.
    ///
    /// Polygons lying in the plane contribute nothing.
    pub fn slice(&self, plane: &Plane, tol: &Tolerance) -> Vec<[Point3<Real>; 2]> {
        let mut segments = Vec::new();
        for polygon in &self.polygons {
            let mut crossings: Vec<Point3<Real>> = Vec::with_capacity(2);
            for (start, end) in polygon.edges() {
                let Some(point) = segment_intersect_plane(&start.pos, &end.pos, plane, tol)
                else {
                    continue;
                };
                if !crossings.iter().any(|c| tol.compare_points(c, &point)) {
                    crossings.push(point);
                }
            }
            if let [a, b] = crossings[..] {
                segments.push([a, b]);
            }
        }
        segments
    }
}

impl<S: Clone + Send + Sync + Debug> CSGOps for Model<S> {
    fn new() -> Self {
        Model {
            polygons: Vec::new(),
            bounding_box: OnceLock::new(),
            has_texels: false,
        }
    }

    /// Return a new Model representing union of the two Models.
    ///
    /// ```text
    /// let c = a.union(b);
    ///     +-------+            +-------+
    ///     |       |            |       |
    ///     |   a   |            |   c   |
    ///     |    +--+----+   =   |       +----+
    ///     +----+--+    |       +----+       |
    ///          |   b   |            |   c   |
    ///          |       |            |       |
    ///          +-------+            +-------+
    /// ```
    fn union(&self, other: &Model<S>) -> Model<S> {
        // avoid splitting obvious non‑intersecting faces
        let (a_clip, a_passthru) = Self::partition_polys(&self.polygons, &other.bounding_box());
        let (b_clip, b_passthru) = Self::partition_polys(&other.polygons, &self.bounding_box());

        let mut a = Node::from_polygons(&a_clip);
        let mut b = Node::from_polygons(&b_clip);

        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(&b.all_polygons());

        let mut final_polys = a.all_polygons();
        final_polys.extend(a_passthru);
        final_polys.extend(b_passthru);

        Model::from_polygons(final_polys, self.has_texels || other.has_texels)
    }

    /// Return a new Model representing the difference of the two Models.
    ///
    /// ```text
    /// let c = a.difference(b);
    ///     +-------+            +-------+
    ///     |       |            |       |
    ///     |   a   |            |   c   |
    ///     |    +--+----+   =   |    +--+
    ///     +----+--+    |       +----+
    ///          |   b   |
    ///          |       |
    ///          +-------+
    /// ```
    fn difference(&self, other: &Model<S>) -> Model<S> {
        let (a_clip, a_passthru) = Self::partition_polys(&self.polygons, &other.bounding_box());
        let (b_clip, _b_passthru) = Self::partition_polys(&other.polygons, &self.bounding_box());

        let mut a = Node::from_polygons(&a_clip);
        let mut b = Node::from_polygons(&b_clip);

        a.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(&b.all_polygons());
        a.invert();

        let mut final_polys = a.all_polygons();
        final_polys.extend(a_passthru);

        Model::from_polygons(final_polys, self.has_texels || other.has_texels)
    }

    /// Return a new Model representing the intersection of the two Models.
    ///
    /// ```text
    /// let c = a.intersection(b);
    ///     +-------+
    ///     |       |
    ///     |   a   |
    ///     |    +--+----+   =   +--+
    ///     +----+--+    |       +--+
    ///          |   b   |
    ///          |       |
    ///          +-------+
    /// ```
    fn intersection(&self, other: &Model<S>) -> Model<S> {
        if self.is_empty() || other.is_empty() {
            return Model::new();
        }
        let mut a = Node::from_polygons(&self.polygons);
        let mut b = Node::from_polygons(&other.polygons);

        a.invert();
        b.clip_to(&a);
        b.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        a.build(&b.all_polygons());
        a.invert();

        Model::from_polygons(a.all_polygons(), self.has_texels || other.has_texels)
    }

    /// Space in exactly one of the two Models.
    fn xor(&self, other: &Model<S>) -> Model<S> {
        let a_sub_b = self.difference(other);
        let b_sub_a = other.difference(self);
        a_sub_b.union(&b_sub_a)
    }

    /// Apply a 4x4 transform. Normals go through the inverse transpose of the
    /// linear part; a mirroring matrix also reverses each polygon's winding.
    fn transform(&self, mat: &Matrix4<Real>) -> Model<S> {
        let linear: Matrix3<Real> = mat.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear
            .try_inverse()
            .map(|inv| inv.transpose())
            .unwrap_or(linear);
        let mirrored = linear.determinant() < 0.0;

        let mut model = self.clone();
        for poly in &mut model.polygons {
            for vert in &mut poly.vertices {
                vert.pos = mat.transform_point(&vert.pos);
                let normal = normal_matrix * vert.normal;
                vert.normal = normal.try_normalize(0.0).unwrap_or(normal);
            }
            if mirrored {
                poly.vertices.reverse();
            }

            // keep the cached plane consistent with the new vertex positions
            poly.plane = Plane::from_vertices(&poly.vertices);
            poly.bounding_box = OnceLock::new();
        }
        model.bounding_box = OnceLock::new();

        model
    }

    /// Returns a [`parry3d::bounding_volume::Aabb`](Aabb) spanning all polygons,
    /// a degenerate box at the origin when there are none.
    fn bounding_box(&self) -> Aabb {
        *self.bounding_box.get_or_init(|| {
            let mut mins = Point3::new(Real::MAX, Real::MAX, Real::MAX);
            let mut maxs = Point3::new(-Real::MAX, -Real::MAX, -Real::MAX);
            for v in self.polygons.iter().flat_map(|p| p.vertices.iter()) {
                mins = mins.inf(&v.pos);
                maxs = maxs.sup(&v.pos);
            }
            if self.polygons.is_empty() {
                Aabb::new(Point3::origin(), Point3::origin())
            } else {
                Aabb::new(mins, maxs)
            }
        })
    }

    fn invalidate_bounding_box(&mut self) {
        self.bounding_box = OnceLock::new();
    }

    /// Inside out: every polygon flipped.
    fn inverse(&self) -> Model<S> {
        let mut model = self.clone();
        for p in &mut model.polygons {
            p.flip();
        }
        model
    }
}
