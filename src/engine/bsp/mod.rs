//! Binary Space Partitioning (BSP) tree implementation
//!
//! The algorithms live behind [`BspOps`] so the serial and the rayon
//! implementations share one node type; the `parallel` feature picks which
//! one the convenience methods on [`Node`] use.

pub mod node;
pub mod traits;

#[cfg(not(feature = "parallel"))]
pub mod serial;

#[cfg(feature = "parallel")]
pub mod parallel;

pub use node::Node;
pub use traits::{BalancedSplittingStrategy, BspOps, SplittingPlaneStrategy};

#[cfg(not(feature = "parallel"))]
pub use serial::SerialBspOps;

#[cfg(feature = "parallel")]
pub use parallel::ParallelBspOps;

use crate::engine::polygon::Polygon;
use std::fmt::Debug;

#[cfg(not(feature = "parallel"))]
fn ops<S: Clone>() -> SerialBspOps<BalancedSplittingStrategy, S> {
    SerialBspOps::new()
}

#[cfg(feature = "parallel")]
fn ops<S: Clone>() -> ParallelBspOps<BalancedSplittingStrategy, S> {
    ParallelBspOps::new()
}

impl<S: Clone + Send + Sync + Debug> Node<S> {
    /// Creates a new BSP node from polygons
    pub fn from_polygons(polygons: &[Polygon<S>]) -> Self {
        let mut node = Self::new();
        if !polygons.is_empty() {
            node.build(polygons);
        }
        node
    }

    /// Invert all polygons in the BSP tree
    pub fn invert(&mut self) {
        ops::<S>().invert(self);
    }

    /// Recursively remove all polygons that are inside this BSP tree
    pub fn clip_polygons(&self, polygons: &[Polygon<S>]) -> Vec<Polygon<S>> {
        ops::<S>().clip_polygons(self, polygons)
    }

    /// Remove all polygons in this BSP tree that are inside the other BSP tree
    pub fn clip_to(&mut self, bsp: &Node<S>) {
        ops::<S>().clip_to(self, bsp);
    }

    /// Return all polygons in this BSP tree
    pub fn all_polygons(&self) -> Vec<Polygon<S>> {
        ops::<S>().all_polygons(self)
    }

    /// Build a BSP tree from the given polygons
    pub fn build(&mut self, polygons: &[Polygon<S>]) {
        ops::<S>().build(self, polygons);
    }
}
