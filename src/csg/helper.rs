//! Conversions between render meshes and engine models.

use crate::engine::{Model, polygon::Polygon, vertex::Vertex};
use crate::float_types::Real;
use crate::mesh::{Material, MaterialId, Mesh};
use crate::traits::CSGOps;
use nalgebra::{Matrix3, Matrix4, Vector2, Vector3};

/// The three boolean operations a [`CsgNode`](super::CsgNode) can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CsgOperation {
    Union,
    Difference,
    Intersection,
}

impl CsgOperation {
    /// Applies the operation with empty operands short-circuited: an empty
    /// model stands for an empty solid.
    pub fn apply(self, a: &Model<MaterialId>, b: &Model<MaterialId>) -> Model<MaterialId> {
        match (self, a.is_empty(), b.is_empty()) {
            (CsgOperation::Union, true, _) => b.clone(),
            (CsgOperation::Union, _, true) | (CsgOperation::Difference, _, true) => a.clone(),
            (CsgOperation::Difference, true, _)
            | (CsgOperation::Intersection, true, _)
            | (CsgOperation::Intersection, _, true) => Model::new(),
            (CsgOperation::Union, false, false) => a.union(b),
            (CsgOperation::Difference, false, false) => a.difference(b),
            (CsgOperation::Intersection, false, false) => a.intersection(b),
        }
    }
}

/// Normals follow the inverse transpose of the linear part of `matrix`.
fn normal_matrix(matrix: &Matrix4<Real>) -> Matrix3<Real> {
    let linear: Matrix3<Real> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    linear
        .try_inverse()
        .map(|inv| inv.transpose())
        .unwrap_or(linear)
}

/// Converts every material group of `mesh` into engine polygons placed by
/// `matrix`. Each polygon remembers its material id.
///
/// Degenerate triangles are skipped; a mesh without normals gets face normals.
pub fn mesh_to_model(mesh: &Mesh, matrix: &Matrix4<Real>) -> Model<MaterialId> {
    let normals = normal_matrix(matrix);
    let mirrored = matrix.fixed_view::<3, 3>(0, 0).into_owned().determinant() < 0.0;
    let texels = mesh.texel_vector();

    let mut polygons = Vec::with_capacity(mesh.triangle_count());
    let mut skipped = 0usize;

    for id in mesh.material_ids() {
        for t in mesh.equivalent_triangle_index(id).chunks_exact(3) {
            let (Some(a), Some(b), Some(c)) = (mesh.vertex(t[0]), mesh.vertex(t[1]), mesh.vertex(t[2]))
            else {
                skipped += 1;
                continue;
            };
            let (a, b, c) = (
                matrix.transform_point(&a),
                matrix.transform_point(&b),
                matrix.transform_point(&c),
            );
            let face = (b - a).cross(&(c - a));
            let Some(face) = face.try_normalize(Real::EPSILON) else {
                skipped += 1;
                continue;
            };
            let face = if mirrored { -face } else { face };

            let mut vertices: Vec<Vertex> = [(t[0], a), (t[1], b), (t[2], c)]
                .into_iter()
                .map(|(vid, pos)| {
                    let normal = mesh
                        .normal(vid)
                        .map(|n| normals * n)
                        .and_then(|n| n.try_normalize(Real::EPSILON))
                        .unwrap_or(face);
                    let i = vid as usize * 2;
                    let uv = texels
                        .get(i..i + 2)
                        .map(|uv| Vector2::new(uv[0], uv[1]))
                        .unwrap_or_else(Vector2::zeros);
                    Vertex::new(pos, normal).with_uv(uv)
                })
                .collect();
            if mirrored {
                vertices.reverse();
            }
            polygons.push(Polygon::new(vertices, Some(id)));
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, "degenerate triangles skipped while converting mesh");
    }
    Model::from_polygons(polygons, mesh.has_texels())
}

/// Converts an engine model back into a finished mesh.
///
/// Polygons are grouped by the material id they carry; ids found in
/// `materials` get that material back, everything else gets `fallback`.
pub fn model_to_mesh(model: &Model<MaterialId>, materials: &[Material], fallback: &Material) -> Mesh {
    let mut mesh = Mesh::new();
    let mut order: Vec<&Material> = Vec::new();
    let mut batches: Vec<Vec<u32>> = Vec::new();

    let mut positions = Vec::with_capacity(model.polygons.len() * 9);
    let mut normals = Vec::with_capacity(model.polygons.len() * 9);
    let mut texels = Vec::new();
    let mut next: u32 = 0;

    for polygon in &model.polygons {
        if polygon.vertices.len() < 3 {
            continue;
        }
        let material = polygon
            .metadata
            .and_then(|id| materials.iter().find(|m| m.id() == id))
            .unwrap_or(fallback);
        let batch = match order.iter().position(|m| m.id() == material.id()) {
            Some(k) => k,
            None => {
                order.push(material);
                batches.push(Vec::new());
                order.len() - 1
            },
        };

        let first = next;
        for v in &polygon.vertices {
            positions.extend_from_slice(&[v.pos.x, v.pos.y, v.pos.z]);
            let n: Vector3<Real> = v.normal;
            normals.extend_from_slice(&[n.x, n.y, n.z]);
            if model.has_texels {
                texels.extend_from_slice(&[v.uv.x, v.uv.y]);
            }
            next += 1;
        }
        for k in 1..polygon.vertices.len() as u32 - 1 {
            batches[batch].extend_from_slice(&[first, first + k, first + k + 1]);
        }
    }

    mesh.add_vertices(&positions);
    mesh.add_normals(&normals);
    if model.has_texels {
        mesh.add_texels(&texels);
    }
    for (material, batch) in order.into_iter().zip(batches) {
        mesh.add_triangles(material, &batch);
    }
    mesh.finish();
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn triangle_mesh(material: &Material) -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_vertices(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 0.0]);
        // second triangle is degenerate
        mesh.add_triangles(material, &[0, 1, 2, 0, 1, 3]);
        mesh.finish();
        mesh
    }

    #[test]
    fn degenerate_triangles_are_skipped() {
        let material = Material::new("red");
        let model = mesh_to_model(&triangle_mesh(&material), &Matrix4::identity());
        assert_eq!(model.polygons.len(), 1);
        assert_eq!(model.polygons[0].metadata, Some(material.id()));
    }

    #[test]
    fn materials_are_reattached() {
        let red = Material::new("red");
        let model = mesh_to_model(
            &triangle_mesh(&red),
            &Matrix4::new_translation(&Vector3::new(0.0, 0.0, 2.0)),
        );
        let mesh = model_to_mesh(&model, std::slice::from_ref(&red), &Material::default());
        assert_eq!(mesh.material_ids(), vec![red.id()]);
        assert_eq!(mesh.vertex(0), Some(Point3::new(0.0, 0.0, 2.0)));
        assert_eq!(mesh.triangle_count(), 1);
    }
}
