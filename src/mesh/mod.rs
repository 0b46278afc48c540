//! Render-ready triangle containers.
//!
//! A [`Mesh`] keeps flat position, normal and texture coordinate buffers next
//! to primitive groups (plain triangles, strips and fans) keyed by material,
//! plus optional wire polylines for edge display. Materials keep the order in
//! which they were first used.

pub mod material;

pub use material::{Material, MaterialId};

use crate::float_types::{Real, parry3d::bounding_volume::Aabb};
use crate::geometry::Tolerance;
use crate::triangle::{SharpEdge, Triangle, classify_sharp_edges};
use crate::triangulate::position;
use nalgebra::{Matrix4, Point3, Vector3};
use std::any::Any;
use std::fmt::Debug;
use std::sync::OnceLock;

/// Anything that can hand a [`Mesh`] to a CSG leaf.
///
/// `refresh` brings the mesh up to date and reports whether it changed since
/// the previous call, which is what lets a leaf skip reconversion.
pub trait MeshSource: Debug + Send + Sync {
    fn refresh(&mut self) -> bool;
    fn mesh(&self) -> &Mesh;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Triangles, strips and fans sharing one material.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveGroup {
    pub material: Material,
    pub triangles: Vec<u32>,
    pub strips: Vec<Vec<u32>>,
    pub fans: Vec<Vec<u32>>,
}

impl PrimitiveGroup {
    fn new(material: Material) -> Self {
        PrimitiveGroup {
            material,
            triangles: Vec::new(),
            strips: Vec::new(),
            fans: Vec::new(),
        }
    }

    /// Every primitive flattened to a triangle list.
    pub fn equivalent_triangles(&self) -> Vec<u32> {
        let mut out = self.triangles.clone();
        for strip in &self.strips {
            strip_to_triangles(strip, &mut out);
        }
        for fan in &self.fans {
            fan_to_triangles(fan, &mut out);
        }
        out
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
            + self.strips.iter().map(|s| s.len().saturating_sub(2)).sum::<usize>()
            + self.fans.iter().map(|f| f.len().saturating_sub(2)).sum::<usize>()
    }
}

/// Odd triangles of a strip swap their first two corners to keep the winding.
pub fn strip_to_triangles(strip: &[u32], out: &mut Vec<u32>) {
    for (k, w) in strip.windows(3).enumerate() {
        if k % 2 == 0 {
            out.extend_from_slice(&[w[0], w[1], w[2]]);
        } else {
            out.extend_from_slice(&[w[1], w[0], w[2]]);
        }
    }
}

pub fn fan_to_triangles(fan: &[u32], out: &mut Vec<u32>) {
    if let Some((&hub, rest)) = fan.split_first() {
        for pair in rest.windows(2) {
            out.extend_from_slice(&[hub, pair[0], pair[1]]);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    positions: Vec<Real>,
    normals: Vec<Real>,
    texels: Vec<Real>,
    groups: Vec<PrimitiveGroup>,
    wire: Vec<Vec<Point3<Real>>>,

    /// Lazily calculated AABB over `positions`.
    bounding_box: OnceLock<Aabb>,

    finished: bool,
    dirty: bool,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&mut self) {
        self.finished = false;
        self.dirty = true;
    }

    /// Appends flat xyz positions and returns the id of the first new vertex.
    pub fn add_vertices(&mut self, positions: &[Real]) -> u32 {
        let first = self.vertex_count() as u32;
        self.positions.extend_from_slice(positions);
        self.bounding_box = OnceLock::new();
        self.touch();
        first
    }

    /// Appends flat xyz normals, one per vertex.
    pub fn add_normals(&mut self, normals: &[Real]) {
        self.normals.extend_from_slice(normals);
        self.touch();
    }

    /// Appends flat uv texture coordinates, one pair per vertex.
    pub fn add_texels(&mut self, texels: &[Real]) {
        self.texels.extend_from_slice(texels);
        self.touch();
    }

    fn group_mut(&mut self, material: &Material) -> &mut PrimitiveGroup {
        let index = match self
            .groups
            .iter()
            .position(|g| g.material.id() == material.id())
        {
            Some(index) => index,
            None => {
                self.groups.push(PrimitiveGroup::new(material.clone()));
                self.groups.len() - 1
            },
        };
        &mut self.groups[index]
    }

    pub fn add_triangles(&mut self, material: &Material, indices: &[u32]) {
        if indices.len() % 3 != 0 {
            tracing::warn!(len = indices.len(), "triangle list length is not a multiple of 3, tail ignored");
        }
        let whole = indices.len() - indices.len() % 3;
        self.group_mut(material)
            .triangles
            .extend_from_slice(&indices[..whole]);
        self.touch();
    }

    pub fn add_triangle_strip(&mut self, material: &Material, strip: Vec<u32>) {
        if strip.len() < 3 {
            tracing::warn!(len = strip.len(), "triangle strip with fewer than 3 vertices ignored");
            return;
        }
        self.group_mut(material).strips.push(strip);
        self.touch();
    }

    pub fn add_triangle_fan(&mut self, material: &Material, fan: Vec<u32>) {
        if fan.len() < 3 {
            tracing::warn!(len = fan.len(), "triangle fan with fewer than 3 vertices ignored");
            return;
        }
        self.group_mut(material).fans.push(fan);
        self.touch();
    }

    /// Adds a polyline to the wire representation. Fewer than two points is a no-op.
    pub fn add_wire_polyline(&mut self, points: Vec<Point3<Real>>) {
        if points.len() >= 2 {
            self.wire.push(points);
            self.touch();
        }
    }

    /// Makes the buffers render-ready.
    ///
    /// Missing normals are generated by area-weighted averaging, a texel
    /// buffer of the wrong length is padded or truncated, and indices past the
    /// vertex buffer are reported.
    pub fn finish(&mut self) {
        let vertex_count = self.vertex_count();

        if self.normals.len() != self.positions.len() {
            if !self.normals.is_empty() {
                tracing::warn!(
                    normals = self.normals.len() / 3,
                    vertices = vertex_count,
                    "normal count does not match vertex count, regenerating"
                );
            }
            self.normals = self.generated_normals();
        }

        if !self.texels.is_empty() && self.texels.len() != vertex_count * 2 {
            tracing::warn!(
                texels = self.texels.len() / 2,
                vertices = vertex_count,
                "texel count does not match vertex count"
            );
            self.texels.resize(vertex_count * 2, 0.0);
        }

        let out_of_range = self
            .groups
            .iter()
            .flat_map(|g| g.equivalent_triangles())
            .filter(|&i| i as usize >= vertex_count)
            .count();
        if out_of_range > 0 {
            tracing::warn!(out_of_range, vertices = vertex_count, "indices past the vertex buffer");
        }

        self.finished = true;
    }

    fn generated_normals(&self) -> Vec<Real> {
        let mut accum = vec![Vector3::<Real>::zeros(); self.vertex_count()];
        for group in &self.groups {
            for t in group.equivalent_triangles().chunks_exact(3) {
                let corners = [t[0], t[1], t[2]].map(|id| position(&self.positions, id));
                let [Some(a), Some(b), Some(c)] = corners else {
                    continue;
                };
                // the unnormalized cross product weights by area
                let n = (b - a).cross(&(c - a));
                for id in t {
                    accum[*id as usize] += n;
                }
            }
        }
        accum
            .into_iter()
            .flat_map(|n| {
                let n = n.try_normalize(Real::EPSILON).unwrap_or_else(Vector3::zeros);
                [n.x, n.y, n.z]
            })
            .collect()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// True when something was added since the last [`take_dirty`](Self::take_dirty).
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Reads and clears the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn position_vector(&self) -> &[Real] {
        &self.positions
    }

    pub fn normal_vector(&self) -> &[Real] {
        &self.normals
    }

    pub fn texel_vector(&self) -> &[Real] {
        &self.texels
    }

    pub fn has_texels(&self) -> bool {
        !self.texels.is_empty()
    }

    pub fn groups(&self) -> &[PrimitiveGroup] {
        &self.groups
    }

    /// Material ids in first-use order.
    pub fn material_ids(&self) -> Vec<MaterialId> {
        self.groups.iter().map(|g| g.material.id()).collect()
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.groups
            .iter()
            .find(|g| g.material.id() == id)
            .map(|g| &g.material)
    }

    pub fn materials(&self) -> impl Iterator<Item = &Material> {
        self.groups.iter().map(|g| &g.material)
    }

    /// Triangles, strips and fans of one material flattened to a triangle list.
    pub fn equivalent_triangle_index(&self, id: MaterialId) -> Vec<u32> {
        self.groups
            .iter()
            .filter(|g| g.material.id() == id)
            .flat_map(|g| g.equivalent_triangles())
            .collect()
    }

    pub fn wire_polylines(&self) -> &[Vec<Point3<Real>>] {
        &self.wire
    }

    /// Wire polylines mapped through `matrix`.
    pub fn transformed_wire(&self, matrix: &Matrix4<Real>) -> Vec<Vec<Point3<Real>>> {
        self.wire
            .iter()
            .map(|line| line.iter().map(|p| matrix.transform_point(p)).collect())
            .collect()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.groups.iter().map(PrimitiveGroup::triangle_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.triangle_count() == 0
    }

    pub fn vertex(&self, id: u32) -> Option<Point3<Real>> {
        position(&self.positions, id)
    }

    pub fn normal(&self, id: u32) -> Option<Vector3<Real>> {
        position(&self.normals, id).map(|p| p.coords)
    }

    /// Returns a [`parry3d::bounding_volume::Aabb`](Aabb) over all positions,
    /// a degenerate box at the origin for an empty mesh.
    pub fn bounding_box(&self) -> Aabb {
        *self.bounding_box.get_or_init(|| {
            if self.positions.len() < 3 {
                return Aabb::new(Point3::origin(), Point3::origin());
            }
            let mut mins = Point3::new(Real::MAX, Real::MAX, Real::MAX);
            let mut maxs = Point3::new(-Real::MAX, -Real::MAX, -Real::MAX);
            for p in self.positions.chunks_exact(3) {
                let p = Point3::new(p[0], p[1], p[2]);
                mins = mins.inf(&p);
                maxs = maxs.sup(&p);
            }
            Aabb::new(mins, maxs)
        })
    }

    /// One [`Triangle`] per equivalent triangle, in material order.
    pub fn triangles(&self) -> Vec<Triangle> {
        let mut out = Vec::with_capacity(self.triangle_count());
        for group in &self.groups {
            for t in group.equivalent_triangles().chunks_exact(3) {
                let (Some(a), Some(b), Some(c)) = (self.vertex(t[0]), self.vertex(t[1]), self.vertex(t[2]))
                else {
                    continue;
                };
                let normals = [t[0], t[1], t[2]].map(|id| self.normal(id).unwrap_or_else(Vector3::zeros));
                out.push(Triangle::new([a, b, c], normals, group.material.id()));
            }
        }
        out
    }

    /// Edges whose adjacent faces meet at more than `angle_threshold` radians.
    pub fn sharp_edge_segments(&self, angle_threshold: Real, tol: &Tolerance) -> Vec<[Point3<Real>; 2]> {
        let triangles = self.triangles();
        classify_sharp_edges(&triangles, angle_threshold, tol);

        let mut segments = Vec::new();
        for triangle in &triangles {
            let flags = triangle.sharp_edges();
            for (edge, flag) in flags.iter().enumerate() {
                let [a, b] = triangle.edge(edge);
                // each shared edge is flagged on both sides, keep one copy
                if *flag == SharpEdge::Sharp && (a.x, a.y, a.z) < (b.x, b.y, b.z) {
                    segments.push([a, b]);
                }
            }
        }
        segments
    }
}

impl MeshSource for Mesh {
    fn refresh(&mut self) -> bool {
        if !self.finished {
            self.finish();
        }
        self.take_dirty()
    }

    fn mesh(&self) -> &Mesh {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
