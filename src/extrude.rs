//! Closed solids from a planar outline swept along a vector.
//!
//! An [`ExtrudedMesh`] is a base cap, an offset cap and one side quad per
//! outline edge. Faces are numbered for material mapping as
//!
//! - `0`: the base cap,
//! - `1..=n`: the side face of outline edge `k` is face `k + 1`,
//! - `n + 1`: the offset cap,
//!
//! where edge `k` joins point `k` to point `(k + 1) % n` in the order the
//! caller gave. The outline is reoriented internally so the base cap faces
//! away from the extrusion direction; indices stay in the caller's order.

use crate::errors::GeometryError;
use crate::float_types::{Real, parry3d::bounding_volume::Aabb};
use crate::geometry::{
    Plane, Tolerance, polygon_in_2d,
    tools::{first_point_off_plane, try_polygon_normal},
};
use crate::mesh::{Material, Mesh, MeshSource};
use crate::triangulate::triangulate_polygon_constrained;
use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use std::any::Any;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct ExtrudedMesh {
    points: Vec<Point3<Real>>,
    /// Unit extrusion direction.
    direction: Vector3<Real>,
    length: Real,
    mirrored_extend: bool,
    /// Per caller vertex.
    smoothing: Vec<bool>,
    /// Per caller edge.
    invisible_edges: Vec<bool>,
    face_materials: HashMap<usize, Material>,
    master_material: Material,
    texture_range: Real,
    tolerance: Tolerance,

    /// Base cap normal, pointing away from `direction`.
    normal: Vector3<Real>,
    /// The working outline runs opposite to the caller's order.
    reversed: bool,

    mesh: OnceLock<Mesh>,
    changed: bool,
}

struct Orientation {
    normal: Vector3<Real>,
    direction: Vector3<Real>,
    reversed: bool,
}

fn validate(
    points: &[Point3<Real>],
    direction: &Vector3<Real>,
    length: Real,
    tol: &Tolerance,
) -> Result<Orientation, GeometryError> {
    let n = points.len();
    if n < 3 {
        return Err(GeometryError::TooFewPoints { count: n });
    }
    if tol.compare_points(&points[0], &points[n - 1]) {
        return Err(GeometryError::ClosedOutline(points[0]));
    }
    let plane = Plane::try_from_points(&points[0], &points[1], &points[2])
        .ok_or(GeometryError::DegeneratePlane)?;
    if let Some(index) = first_point_off_plane(points, &plane, tol) {
        return Err(GeometryError::NotCoplanar {
            index,
            point: points[index],
        });
    }
    let direction = direction
        .try_normalize(tol.epsilon)
        .ok_or(GeometryError::DegenerateDirection)?;
    if !length.is_finite() || length <= tol.epsilon {
        return Err(GeometryError::InvalidLength(length));
    }

    // Newell's normal follows the winding even when the first corner is reflex
    let winding = try_polygon_normal(points).unwrap_or(plane.normal);
    let alignment = winding.dot(&direction);
    if tol.is_zero(alignment) {
        return Err(GeometryError::ParallelDirection);
    }
    let reversed = alignment > 0.0;
    Ok(Orientation {
        normal: if reversed { -winding } else { winding },
        direction,
        reversed,
    })
}

fn check_indices(indices: &[usize], len: usize) -> Result<(), GeometryError> {
    match indices.iter().find(|&&i| i >= len) {
        Some(&index) => Err(GeometryError::IndexOutOfRange { index, len }),
        None => Ok(()),
    }
}

fn flags(indices: &[usize], len: usize) -> Vec<bool> {
    let mut out = vec![false; len];
    for &i in indices {
        out[i] = true;
    }
    out
}

fn flatten(points: &[Point3<Real>]) -> Vec<Real> {
    points.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
}

impl ExtrudedMesh {
    /// Validates the outline and prepares a lazily built solid.
    pub fn new(
        points: Vec<Point3<Real>>,
        direction: Vector3<Real>,
        length: Real,
    ) -> Result<Self, GeometryError> {
        let tolerance = Tolerance::default();
        let orientation = validate(&points, &direction, length, &tolerance)?;
        let n = points.len();
        Ok(ExtrudedMesh {
            points,
            direction: orientation.direction,
            length,
            mirrored_extend: false,
            smoothing: vec![false; n],
            invisible_edges: vec![false; n],
            face_materials: HashMap::new(),
            master_material: Material::default(),
            texture_range: 1.0,
            tolerance,
            normal: orientation.normal,
            reversed: orientation.reversed,
            mesh: OnceLock::new(),
            changed: true,
        })
    }

    /// Same as [`new`](Self::new) with the solid centred on the outline plane.
    pub fn new_mirrored(
        points: Vec<Point3<Real>>,
        direction: Vector3<Real>,
        length: Real,
    ) -> Result<Self, GeometryError> {
        let mut extruded = Self::new(points, direction, length)?;
        extruded.mirrored_extend = true;
        Ok(extruded)
    }

    fn invalidate(&mut self) {
        self.mesh = OnceLock::new();
        self.changed = true;
    }

    fn reorient(&mut self, orientation: Orientation) {
        self.normal = orientation.normal;
        self.direction = orientation.direction;
        self.reversed = orientation.reversed;
        self.invalidate();
    }

    pub fn set_points(&mut self, points: Vec<Point3<Real>>) -> Result<(), GeometryError> {
        let orientation = validate(&points, &self.direction, self.length, &self.tolerance)?;
        let (old_n, n) = (self.points.len(), points.len());
        self.points = points;
        self.smoothing.resize(n, false);
        self.invisible_edges.resize(n, false);
        if n != old_n {
            // the offset cap follows the edge count, sides past the new count go away
            let top = self.face_materials.remove(&(old_n + 1));
            self.face_materials.retain(|&face, _| face <= n);
            if let Some(material) = top {
                self.face_materials.insert(n + 1, material);
            }
        }
        self.reorient(orientation);
        Ok(())
    }

    pub fn set_extruded_vector(&mut self, direction: Vector3<Real>) -> Result<(), GeometryError> {
        let orientation = validate(&self.points, &direction, self.length, &self.tolerance)?;
        self.reorient(orientation);
        Ok(())
    }

    pub fn set_extruded_length(&mut self, length: Real) -> Result<(), GeometryError> {
        let orientation = validate(&self.points, &self.direction, length, &self.tolerance)?;
        self.length = length;
        self.reorient(orientation);
        Ok(())
    }

    pub fn set_mirrored_extend(&mut self, mirrored: bool) {
        if self.mirrored_extend != mirrored {
            self.mirrored_extend = mirrored;
            self.invalidate();
        }
    }

    /// Vertices whose side normals are blended with the neighbouring faces.
    pub fn set_smoothing_index(&mut self, indices: &[usize]) -> Result<(), GeometryError> {
        check_indices(indices, self.points.len())?;
        self.smoothing = flags(indices, self.points.len());
        self.invalidate();
        Ok(())
    }

    /// Edges left out of the wire representation; their faces stay in the mesh.
    pub fn set_invisible_edge_index(&mut self, indices: &[usize]) -> Result<(), GeometryError> {
        check_indices(indices, self.points.len())?;
        self.invisible_edges = flags(indices, self.points.len());
        self.invalidate();
        Ok(())
    }

    /// Per-face materials (see the module docs for face numbering) and the
    /// material for every face the mapping leaves out.
    pub fn set_face_mapping_and_material(
        &mut self,
        mapping: HashMap<usize, Material>,
        master: Material,
    ) -> Result<(), GeometryError> {
        let faces = self.face_count();
        let keys: Vec<usize> = mapping.keys().copied().collect();
        check_indices(&keys, faces)?;
        self.face_materials = mapping;
        self.master_material = master;
        self.invalidate();
        Ok(())
    }

    /// Texture coordinates span `[0, range]` across the larger cap extent and the perimeter.
    pub fn set_texture_range(&mut self, range: Real) {
        self.texture_range = range;
        self.invalidate();
    }

    pub fn points(&self) -> &[Point3<Real>] {
        &self.points
    }

    /// Unit extrusion direction.
    pub const fn extruded_vector(&self) -> Vector3<Real> {
        self.direction
    }

    pub const fn extruded_length(&self) -> Real {
        self.length
    }

    pub const fn is_mirrored_extend(&self) -> bool {
        self.mirrored_extend
    }

    pub fn face_count(&self) -> usize {
        self.points.len() + 2
    }

    /// Outward normal of the base cap.
    pub const fn base_normal(&self) -> Vector3<Real> {
        self.normal
    }

    /// Outward normal of the offset cap, always `-base_normal()`.
    pub fn offset_normal(&self) -> Vector3<Real> {
        -self.normal
    }

    /// The generated mesh, built on first access after a change.
    pub fn mesh(&self) -> &Mesh {
        self.mesh.get_or_init(|| self.build())
    }

    pub fn bounding_box(&self) -> Aabb {
        self.mesh().bounding_box()
    }

    /// Regenerates the mesh if a setter changed anything. Returns whether it did.
    pub fn update(&mut self) -> bool {
        let changed = std::mem::take(&mut self.changed);
        if changed {
            self.mesh();
        }
        changed
    }

    /// The logical faces as outward-wound planar polygons, in face order.
    pub fn polygons(&self) -> Vec<Vec<Point3<Real>>> {
        let n = self.points.len();
        let (base, top) = self.caps();

        let mut faces = Vec::with_capacity(n + 2);
        faces.push(base.clone());
        for k in 0..n {
            // the edge map is its own inverse
            let j = self.original_edge(k);
            let j1 = (j + 1) % n;
            faces.push(vec![base[j], top[j], top[j1], base[j1]]);
        }
        faces.push(top.into_iter().rev().collect());
        faces
    }

    fn original_vertex(&self, working: usize) -> usize {
        if self.reversed { self.points.len() - 1 - working } else { working }
    }

    /// Caller edge index of working edge `working`.
    fn original_edge(&self, working: usize) -> usize {
        let n = self.points.len();
        if self.reversed { (2 * n - 2 - working) % n } else { working }
    }

    fn face_material(&self, face: usize) -> &Material {
        self.face_materials.get(&face).unwrap_or(&self.master_material)
    }

    /// Base and offset outlines in working order.
    fn caps(&self) -> (Vec<Point3<Real>>, Vec<Point3<Real>>) {
        let sweep = self.direction * self.length;
        let start = if self.mirrored_extend { -sweep * 0.5 } else { Vector3::zeros() };
        let mut base: Vec<Point3<Real>> = self.points.iter().map(|p| p + start).collect();
        if self.reversed {
            base.reverse();
        }
        let top = base.iter().map(|p| p + sweep).collect();
        (base, top)
    }

    fn cap_texels(&self, outline: &[Point3<Real>]) -> Vec<Real> {
        let flat = polygon_in_2d(outline);
        let (mut min_x, mut min_y) = (Real::MAX, Real::MAX);
        let (mut max_x, mut max_y) = (-Real::MAX, -Real::MAX);
        for p in &flat {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let extent = (max_x - min_x).max(max_y - min_y);
        let scale = if extent > Real::EPSILON { self.texture_range / extent } else { 0.0 };
        flat.iter()
            .flat_map(|p| [(p.x - min_x) * scale, (p.y - min_y) * scale])
            .collect()
    }

    fn side_normal(&self, outline: &[Point3<Real>], edge: usize) -> Vector3<Real> {
        let n = outline.len();
        let e = outline[(edge + 1) % n] - outline[edge];
        self.direction
            .cross(&e)
            .try_normalize(Real::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    fn build(&self) -> Mesh {
        let n = self.points.len();
        let (base, top) = self.caps();
        let mut mesh = Mesh::new();

        // caps: base ids 0..n, offset ids n..2n
        let base_flat = flatten(&base);
        let texels = self.cap_texels(&base);
        let cap_normal = |v: Vector3<Real>| -> Vec<Real> { (0..n).flat_map(|_| [v.x, v.y, v.z]).collect() };
        mesh.add_vertices(&base_flat);
        mesh.add_normals(&cap_normal(self.normal));
        mesh.add_texels(&texels);
        mesh.add_vertices(&flatten(&top));
        mesh.add_normals(&cap_normal(-self.normal));
        mesh.add_texels(&texels);

        let ids: Vec<u32> = (0..n as u32).collect();
        let cap = triangulate_polygon_constrained(&ids, &base_flat, &self.tolerance);
        let offset = n as u32;
        let top_indices: Vec<u32> = cap
            .triangulation
            .triangles()
            .flat_map(|[a, b, c]| [a + offset, c + offset, b + offset])
            .collect();
        mesh.add_triangles(self.face_material(0), &cap.triangulation.indices);
        mesh.add_triangles(self.face_material(n + 1), &top_indices);

        // sides: one strip of four fresh vertices per edge
        let side_normals: Vec<Vector3<Real>> = (0..n).map(|j| self.side_normal(&base, j)).collect();
        let smooth = |working: usize| self.smoothing[self.original_vertex(working)];
        let blend = |a: Vector3<Real>, b: Vector3<Real>| (a + b).try_normalize(Real::EPSILON).unwrap_or(a);

        let perimeter: Real = (0..n).map(|j| (base[(j + 1) % n] - base[j]).norm()).sum();
        let scale = if perimeter > Real::EPSILON { self.texture_range / perimeter } else { 0.0 };
        let v_top = self.length * scale;
        let mut travelled = 0.0;

        for j in 0..n {
            let j1 = (j + 1) % n;
            let s = side_normals[j];
            let start = if smooth(j) { blend(s, side_normals[(j + n - 1) % n]) } else { s };
            let end = if smooth(j1) { blend(s, side_normals[j1]) } else { s };

            let u0 = travelled * scale;
            travelled += (base[j1] - base[j]).norm();
            let u1 = travelled * scale;

            let first = mesh.add_vertices(&flatten(&[base[j], top[j], base[j1], top[j1]]));
            mesh.add_normals(&[start, start, end, end].iter().flat_map(|v| [v.x, v.y, v.z]).collect::<Vec<_>>());
            mesh.add_texels(&[u0, 0.0, u0, v_top, u1, 0.0, u1, v_top]);
            mesh.add_triangle_strip(
                self.face_material(self.original_edge(j) + 1),
                vec![first, first + 1, first + 2, first + 3],
            );
        }

        // wire
        for j in 0..n {
            let j1 = (j + 1) % n;
            if !self.invisible_edges[self.original_edge(j)] {
                mesh.add_wire_polyline(vec![base[j], base[j1]]);
                mesh.add_wire_polyline(vec![top[j], top[j1]]);
            }
            if !smooth(j) {
                mesh.add_wire_polyline(vec![base[j], top[j]]);
            }
        }

        mesh.finish();
        tracing::debug!(
            points = n,
            triangles = mesh.triangle_count(),
            constrained = cap.constrained,
            "extrusion built"
        );
        mesh
    }
}

impl MeshSource for ExtrudedMesh {
    fn refresh(&mut self) -> bool {
        self.update()
    }

    fn mesh(&self) -> &Mesh {
        ExtrudedMesh::mesh(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
