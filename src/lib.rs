//! Polygon triangulation, planar geometry predicates and **Constructive Solid
//! Geometry (CSG)** node trees over indexed render meshes.
//!
//! - [`geometry`]: tolerances, planes, line/plane intersections, 2D predicates
//! - [`triangulate`]: ear clipping and constrained Delaunay triangulation of
//!   planar polygons given as ids into a flat position buffer
//! - [`mesh`]: the render mesh container and its materials
//! - [`engine`]: BSP-tree boolean operations on polygon soups
//! - [`csg`]: lazily evaluated union / difference / intersection trees, with a
//!   level-parallel update
//! - [`extrude`]: closed solids from a planar outline and a direction
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - **parallel**: use rayon for the BSP engine and the level-parallel CSG update
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64

#![forbid(unsafe_code)]
#![warn(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod csg;
pub mod engine;
pub mod errors;
pub mod extrude;
pub mod float_types;
pub mod geometry;
pub mod mesh;
pub mod traits;
pub mod triangle;
pub mod triangulate;

#[cfg(any(
    all(feature = "f64", feature = "f32"),
    not(any(feature = "f64", feature = "f32"))
))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use csg::{CsgNode, CsgOperation};
pub use errors::{GeometryError, TriangulationError};
pub use extrude::ExtrudedMesh;
pub use float_types::Real;
pub use mesh::{Material, Mesh, MeshSource};
pub use traits::CSGOps;
pub use triangulate::{Triangulation, triangulate_polygon, triangulate_polygon_constrained};
