//! Geometric predicates and 2D tools shared by the triangulators, the
//! boolean engine and the extrusion builder.

pub mod plane;
pub mod polygon2d;
pub mod tolerance;
pub mod tools;

pub use plane::Plane;
pub use polygon2d::{
    orientation_2d, point_in_polygon, segments_intersect_2d, segments_overlap_2d, signed_area,
    turn_sine,
};
pub use tolerance::Tolerance;
pub use tools::{
    Line3, angle_between, is_polygon_planar, line_intersect_line, line_intersect_plane,
    polygon_in_2d, polygon_normal, project_point_on_line, project_point_on_plane,
    segment_intersect_plane, supporting_plane, triangle_normal,
};
