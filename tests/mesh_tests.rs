mod support;

use nalgebra::{Matrix4, Point3, Vector3};
use polycsg::{
    Material, Mesh, MeshSource,
    float_types::{FRAC_PI_2, Real},
    geometry::Tolerance,
    triangle::{SharpEdge, classify_sharp_edges},
};

use crate::support::{approx_eq, unit_cube};

fn quad_mesh() -> Mesh {
    let mut mesh = Mesh::new();
    mesh.add_vertices(&[
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        1.0, 1.0, 0.0,
    ]);
    mesh
}

#[test]
fn materials_keep_first_use_order() {
    let (red, green) = (Material::new("red"), Material::new("green"));
    let mut mesh = quad_mesh();
    mesh.add_triangles(&green, &[0, 1, 2]);
    mesh.add_triangles(&red, &[1, 3, 2]);
    mesh.add_triangle_fan(&green, vec![0, 1, 3, 2]);

    assert_eq!(mesh.material_ids(), vec![green.id(), red.id()]);
    assert_eq!(mesh.equivalent_triangle_index(green.id()), vec![0, 1, 2, 0, 1, 3, 0, 3, 2]);
    assert_eq!(mesh.triangle_count(), 4);
    assert_eq!(mesh.material(red.id()).map(Material::name), Some("red"));
    assert!(mesh.material(9999).is_none());
}

#[test]
fn strip_is_equivalent_to_triangles() {
    let material = Material::default();
    let mut strip = quad_mesh();
    strip.add_triangle_strip(&material, vec![0, 1, 2, 3]);
    strip.finish();

    let mut list = quad_mesh();
    list.add_triangles(&material, &[0, 1, 2, 2, 1, 3]);
    list.finish();

    assert_eq!(
        strip.equivalent_triangle_index(material.id()),
        list.equivalent_triangle_index(material.id())
    );
    // both halves of the quad face +Z
    for id in 0..4 {
        assert_eq!(strip.normal(id), Some(Vector3::z()));
    }
}

#[test]
fn short_primitives_are_ignored() {
    let material = Material::default();
    let mut mesh = quad_mesh();
    mesh.add_triangle_strip(&material, vec![0, 1]);
    mesh.add_triangle_fan(&material, vec![]);
    mesh.add_triangles(&material, &[0, 1, 2, 3]);
    assert_eq!(mesh.triangle_count(), 1);
}

#[test]
fn finish_pads_texels() {
    let mut mesh = quad_mesh();
    mesh.add_texels(&[0.0, 0.0, 1.0, 0.0]);
    mesh.finish();
    assert!(mesh.is_finished());
    assert_eq!(mesh.texel_vector().len(), 8);
}

#[test]
fn dirty_flag_tracks_edits() {
    let mut mesh = quad_mesh();
    assert!(mesh.is_dirty());
    assert!(mesh.refresh());
    assert!(mesh.is_finished());
    assert!(!mesh.refresh());

    mesh.add_triangles(&Material::default(), &[0, 1, 2]);
    assert!(!mesh.is_finished());
    assert!(mesh.refresh());
}

#[test]
fn bounding_box_spans_positions() {
    let mesh = unit_cube().mesh().clone();
    let aabb = mesh.bounding_box();
    assert_eq!(aabb.mins, Point3::origin());
    assert_eq!(aabb.maxs, Point3::new(1.0, 1.0, 1.0));

    let empty = Mesh::new();
    assert_eq!(empty.bounding_box().mins, Point3::origin());
    assert!(empty.is_empty());
}

#[test]
fn wire_follows_the_matrix() {
    let mut mesh = Mesh::new();
    mesh.add_wire_polyline(vec![Point3::origin()]);
    mesh.add_wire_polyline(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)]);
    assert_eq!(mesh.wire_polylines().len(), 1);

    let moved = mesh.transformed_wire(&Matrix4::new_translation(&Vector3::new(0.0, 2.0, 0.0)));
    assert_eq!(moved[0][1], Point3::new(1.0, 2.0, 0.0));
}

#[test]
fn cube_has_twelve_sharp_edges() {
    let cube = unit_cube();
    let tol = Tolerance::new(1e-9);
    let segments = cube.mesh().sharp_edge_segments(0.5, &tol);
    assert_eq!(segments.len(), 12);
    for [a, b] in &segments {
        assert!(approx_eq((b - a).norm(), 1.0, 1e-9));
    }
}

#[test]
fn nothing_is_sharp_above_a_right_angle() {
    let triangles = unit_cube().mesh().triangles();
    assert_eq!(triangles.len(), 12);
    let threshold: Real = FRAC_PI_2 + 0.1;
    assert_eq!(classify_sharp_edges(&triangles, threshold, &Tolerance::new(1e-9)), 0);
    // every edge of a closed mesh has a neighbour
    for triangle in &triangles {
        assert!(triangle.sharp_edges().iter().all(|e| *e != SharpEdge::Unknown));
    }
}
