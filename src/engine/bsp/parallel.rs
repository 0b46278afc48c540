//! Parallel implementation of BSP operations

use rayon::prelude::*;

use crate::engine::bsp::node::Node;
use crate::engine::bsp::traits::{BalancedSplittingStrategy, BspOps, SplittingPlaneStrategy};
use crate::engine::polygon::Polygon;
use std::fmt::Debug;
use std::marker::PhantomData;

type Buckets<S> = (Vec<Polygon<S>>, Vec<Polygon<S>>, Vec<Polygon<S>>, Vec<Polygon<S>>);

/// Parallel implementation of BSP operations
pub struct ParallelBspOps<
    SP: SplittingPlaneStrategy<S> = BalancedSplittingStrategy,
    S: Clone = (),
> {
    splitting_strategy: SP,
    _phantom: PhantomData<S>,
}

impl<S: Clone> ParallelBspOps<BalancedSplittingStrategy, S> {
    pub fn new() -> Self {
        Self {
            splitting_strategy: BalancedSplittingStrategy::default(),
            _phantom: PhantomData,
        }
    }
}

impl<S: Clone> Default for ParallelBspOps<BalancedSplittingStrategy, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<SP: SplittingPlaneStrategy<S>, S: Clone> ParallelBspOps<SP, S> {
    pub const fn with_strategy(strategy: SP) -> Self {
        Self {
            splitting_strategy: strategy,
            _phantom: PhantomData,
        }
    }
}

impl<SP, S> ParallelBspOps<SP, S>
where
    SP: SplittingPlaneStrategy<S> + Sync,
    S: Clone + Send + Sync + Debug,
{
    /// Splits every polygon by `node`'s plane on the rayon pool.
    fn split_all(plane: &crate::geometry::Plane, polygons: &[Polygon<S>]) -> Buckets<S> {
        polygons
            .par_iter()
            .map(|poly| plane.split_polygon(poly))
            .reduce(
                || (Vec::new(), Vec::new(), Vec::new(), Vec::new()),
                |mut acc, x| {
                    acc.0.extend(x.0);
                    acc.1.extend(x.1);
                    acc.2.extend(x.2);
                    acc.3.extend(x.3);
                    acc
                },
            )
    }
}

impl<SP, S> BspOps<S> for ParallelBspOps<SP, S>
where
    SP: SplittingPlaneStrategy<S> + Sync,
    S: Clone + Send + Sync + Debug,
{
    fn invert(&self, node: &mut Node<S>) {
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            current.polygons.par_iter_mut().for_each(|p| p.flip());
            if let Some(ref mut plane) = current.plane {
                plane.flip();
            }
            std::mem::swap(&mut current.front, &mut current.back);

            if let Some(ref mut front) = current.front {
                stack.push(front.as_mut());
            }
            if let Some(ref mut back) = current.back {
                stack.push(back.as_mut());
            }
        }
    }

    fn clip_polygons(&self, node: &Node<S>, polygons: &[Polygon<S>]) -> Vec<Polygon<S>> {
        let Some(plane) = node.plane.as_ref() else {
            return polygons.to_vec();
        };

        let (coplanar_front, coplanar_back, mut front, mut back) =
            Self::split_all(plane, polygons);
        front.extend(coplanar_front);
        back.extend(coplanar_back);

        let (mut result, back_result) = rayon::join(
            || match &node.front {
                Some(f) => self.clip_polygons(f, &front),
                None => front,
            },
            || match &node.back {
                Some(b) => self.clip_polygons(b, &back),
                None => Vec::new(),
            },
        );
        result.extend(back_result);
        result
    }

    fn clip_to(&self, node: &mut Node<S>, bsp: &Node<S>) {
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            current.polygons = self.clip_polygons(bsp, &current.polygons);

            if let Some(ref mut front) = current.front {
                stack.push(front.as_mut());
            }
            if let Some(ref mut back) = current.back {
                stack.push(back.as_mut());
            }
        }
    }

    fn all_polygons(&self, node: &Node<S>) -> Vec<Polygon<S>> {
        let mut result = Vec::new();
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            result.extend_from_slice(&current.polygons);
            stack.extend(
                [&current.front, &current.back]
                    .iter()
                    .filter_map(|child| child.as_ref().map(|boxed| boxed.as_ref())),
            );
        }
        result
    }

    fn build(&self, node: &mut Node<S>, polygons: &[Polygon<S>]) {
        if polygons.is_empty() {
            return;
        }

        let plane = *node
            .plane
            .get_or_insert_with(|| self.splitting_strategy.pick_best_splitting_plane(polygons));

        let (coplanar_front, coplanar_back, front, back) = Self::split_all(&plane, polygons);
        node.polygons.extend(coplanar_front);
        node.polygons.extend(coplanar_back);

        if !front.is_empty() {
            let child = node.front.get_or_insert_with(|| Box::new(Node::new()));
            self.build(child, &front);
        }
        if !back.is_empty() {
            let child = node.back.get_or_insert_with(|| Box::new(Node::new()));
            self.build(child, &back);
        }
    }
}
