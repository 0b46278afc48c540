//! Constructive solid geometry over render meshes.
//!
//! [`CsgNode`] trees combine [`MeshSource`](crate::mesh::MeshSource) leaves with
//! union, difference and intersection. The boolean work itself happens in the
//! [`engine`](crate::engine); [`helper`] converts meshes in and out of it.

pub mod helper;
pub mod node;

pub use helper::{CsgOperation, mesh_to_model, model_to_mesh};
pub use node::{CsgNode, NodeId, NodeKind};
