//! The CSG tree: leaves own mesh sources, operators combine two children.
//!
//! Every node caches its geometry as an engine model already placed by its
//! own matrix, so a parent can consume it directly. A node re-evaluates only
//! when an input changed or its cache was dropped by [`CsgNode::set_matrix`].

use super::helper::{CsgOperation, mesh_to_model, model_to_mesh};
use crate::engine::Model;
use crate::float_types::Real;
use crate::geometry::Tolerance;
use crate::mesh::{Material, MaterialId, Mesh, MeshSource};
use crate::traits::CSGOps;
use nalgebra::Matrix4;
use std::borrow::Cow;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub type NodeId = u64;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Monotonic stamp handed out on every evaluation, across all trees.
static EVALUATION_CLOCK: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
pub enum NodeKind {
    Leaf(Box<dyn MeshSource>),
    Operator {
        operation: CsgOperation,
        children: Box<[CsgNode; 2]>,
        /// Result of the operation in this node's own frame.
        local: Option<Model<MaterialId>>,
        /// Render mesh of `local`.
        result: Mesh,
        /// `evaluated_at` of each child when `local` was computed.
        inputs_at: [u64; 2],
        /// Material for result faces whose source material is unknown.
        material: Material,
    },
}

#[derive(Debug)]
pub struct CsgNode {
    id: NodeId,
    matrix: Matrix4<Real>,
    kind: NodeKind,
    /// Geometry in the parent's frame.
    model: Option<Model<MaterialId>>,
    /// Whether the latest update pass re-evaluated this node.
    changed: bool,
    evaluations: usize,
    evaluated_at: u64,
}

impl CsgNode {
    fn with_kind(kind: NodeKind) -> Self {
        CsgNode {
            id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
            matrix: Matrix4::identity(),
            kind,
            model: None,
            changed: false,
            evaluations: 0,
            evaluated_at: 0,
        }
    }

    pub fn leaf(source: impl MeshSource + 'static) -> Self {
        Self::with_kind(NodeKind::Leaf(Box::new(source)))
    }

    pub fn operator(operation: CsgOperation, a: CsgNode, b: CsgNode) -> Self {
        Self::with_kind(NodeKind::Operator {
            operation,
            children: Box::new([a, b]),
            local: None,
            result: Mesh::new(),
            inputs_at: [0; 2],
            material: Material::default(),
        })
    }

    pub fn union(a: CsgNode, b: CsgNode) -> Self {
        Self::operator(CsgOperation::Union, a, b)
    }

    pub fn difference(a: CsgNode, b: CsgNode) -> Self {
        Self::operator(CsgOperation::Difference, a, b)
    }

    pub fn intersection(a: CsgNode, b: CsgNode) -> Self {
        Self::operator(CsgOperation::Intersection, a, b)
    }

    pub fn with_matrix(mut self, matrix: Matrix4<Real>) -> Self {
        self.set_matrix(matrix);
        self
    }

    pub const fn id(&self) -> NodeId {
        self.id
    }

    pub const fn matrix(&self) -> &Matrix4<Real> {
        &self.matrix
    }

    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub const fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub const fn operation(&self) -> Option<CsgOperation> {
        match &self.kind {
            NodeKind::Leaf(_) => None,
            NodeKind::Operator { operation, .. } => Some(*operation),
        }
    }

    /// How many times this node has been evaluated.
    pub const fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Clock value of the latest evaluation, 0 if never evaluated.
    pub const fn evaluated_at(&self) -> u64 {
        self.evaluated_at
    }

    /// True when the next update has work to do on this node itself.
    pub const fn is_dirty(&self) -> bool {
        self.model.is_none()
    }

    pub fn children(&self) -> &[CsgNode] {
        match &self.kind {
            NodeKind::Leaf(_) => &[],
            NodeKind::Operator { children, .. } => &children[..],
        }
    }

    pub fn children_mut(&mut self) -> &mut [CsgNode] {
        match &mut self.kind {
            NodeKind::Leaf(_) => &mut [],
            NodeKind::Operator { children, .. } => &mut children[..],
        }
    }

    /// The leaf's source downcast to its concrete type.
    pub fn source<T: MeshSource + 'static>(&self) -> Option<&T> {
        match &self.kind {
            NodeKind::Leaf(source) => source.as_any().downcast_ref::<T>(),
            NodeKind::Operator { .. } => None,
        }
    }

    /// Mutable access to the leaf's source. Edits are picked up by the next
    /// update through [`MeshSource::refresh`].
    pub fn source_mut<T: MeshSource + 'static>(&mut self) -> Option<&mut T> {
        match &mut self.kind {
            NodeKind::Leaf(source) => source.as_any_mut().downcast_mut::<T>(),
            NodeKind::Operator { .. } => None,
        }
    }

    /// Sets the fallback material of an operator's result.
    pub fn set_material(&mut self, new_material: Material) {
        if let NodeKind::Operator { material, local, .. } = &mut self.kind {
            *material = new_material;
            *local = None;
            self.model = None;
        }
    }

    /// The node's mesh in its own frame: the source mesh for a leaf, the
    /// boolean result for an operator.
    pub fn mesh(&self) -> &Mesh {
        match &self.kind {
            NodeKind::Leaf(source) => source.mesh(),
            NodeKind::Operator { result, .. } => result,
        }
    }

    /// The cached model in the parent's frame.
    pub const fn model(&self) -> Option<&Model<MaterialId>> {
        self.model.as_ref()
    }

    /// Replaces the matrix; the cache is dropped only when it actually differs.
    pub fn set_matrix(&mut self, matrix: Matrix4<Real>) {
        let tol = Tolerance::default();
        let same = self
            .matrix
            .iter()
            .zip(matrix.iter())
            .all(|(a, b)| tol.compare(*a, *b));
        if !same {
            self.matrix = matrix;
            self.model = None;
        }
    }

    /// Updates the subtree depth first. Returns whether this node was re-evaluated.
    pub fn update(&mut self) -> bool {
        if let NodeKind::Operator { children, .. } = &mut self.kind {
            for child in children.iter_mut() {
                child.update();
            }
        }
        self.update_local()
    }

    pub fn update_with_matrix(&mut self, matrix: Matrix4<Real>) -> bool {
        self.set_matrix(matrix);
        self.update()
    }

    /// Updates this node alone, trusting that its children are current.
    fn update_local(&mut self) -> bool {
        let inputs_changed = match &mut self.kind {
            NodeKind::Leaf(source) => source.refresh(),
            NodeKind::Operator {
                children, inputs_at, ..
            } => children
                .iter()
                .zip(inputs_at.iter())
                .any(|(c, at)| c.evaluated_at != *at),
        };
        self.changed = inputs_changed || self.model.is_none();
        if self.changed {
            self.evaluate(inputs_changed);
        }
        self.changed
    }

    fn evaluate(&mut self, inputs_changed: bool) {
        match &mut self.kind {
            NodeKind::Leaf(source) => {
                self.model = Some(mesh_to_model(source.mesh(), &self.matrix));
            },
            NodeKind::Operator {
                operation,
                children,
                local,
                result,
                inputs_at,
                material,
            } => {
                if inputs_changed || local.is_none() {
                    let (model, mesh) = combine(*operation, &children[0], &children[1], material);
                    *local = Some(model);
                    *result = mesh;
                    *inputs_at = [children[0].evaluated_at, children[1].evaluated_at];
                }
                self.model = local.as_ref().map(|m| m.transform(&self.matrix));
            },
        }
        self.evaluations += 1;
        self.evaluated_at = EVALUATION_CLOCK.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(
            node = self.id,
            leaf = self.is_leaf(),
            evaluations = self.evaluations,
            "node evaluated"
        );
    }

    /// Updates the tree level by level from the deepest one up, evaluating
    /// the nodes of a level concurrently. A level starts only once the level
    /// below has finished.
    pub fn multi_threaded_update(&mut self) -> bool {
        for level in (0..self.depth()).rev() {
            let mut nodes = Vec::new();
            collect_level(self, level, &mut nodes);
            tracing::trace!(level, nodes = nodes.len(), "updating level");

            #[cfg(feature = "parallel")]
            nodes.into_par_iter().for_each(|node| {
                node.update_local();
            });

            #[cfg(not(feature = "parallel"))]
            nodes.into_iter().for_each(|node| {
                node.update_local();
            });
        }
        self.changed
    }

    /// Nodes grouped by depth, root level first.
    pub fn level_list(&self) -> Vec<Vec<&CsgNode>> {
        let mut levels: Vec<Vec<&CsgNode>> = Vec::new();
        let mut queue = VecDeque::from([(self, 0usize)]);
        while let Some((node, depth)) = queue.pop_front() {
            if levels.len() == depth {
                levels.push(Vec::new());
            }
            levels[depth].push(node);
            queue.extend(node.children().iter().map(|c| (c, depth + 1)));
        }
        levels
    }

    /// Levels in the tree, 1 for a lone leaf.
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(CsgNode::depth).max().unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(CsgNode::node_count).sum::<usize>()
    }

    pub fn find(&self, id: NodeId) -> Option<&CsgNode> {
        if self.id == id {
            return Some(self);
        }
        self.children().iter().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut CsgNode> {
        if self.id == id {
            return Some(self);
        }
        self.children_mut().iter_mut().find_map(|c| c.find_mut(id))
    }
}

fn collect_level<'a>(node: &'a mut CsgNode, depth: usize, out: &mut Vec<&'a mut CsgNode>) {
    if depth == 0 {
        out.push(node);
        return;
    }
    for child in node.children_mut() {
        collect_level(child, depth - 1, out);
    }
}

/// A child's model, rebuilt from its mesh if it was never evaluated.
fn child_model(child: &CsgNode) -> Cow<'_, Model<MaterialId>> {
    match &child.model {
        Some(model) => Cow::Borrowed(model),
        None => Cow::Owned(mesh_to_model(child.mesh(), &child.matrix)),
    }
}

fn combine(
    operation: CsgOperation,
    a: &CsgNode,
    b: &CsgNode,
    material: &Material,
) -> (Model<MaterialId>, Mesh) {
    let (model_a, model_b) = (child_model(a), child_model(b));
    for (child, model) in [(a, &model_a), (b, &model_b)] {
        if model.is_empty() {
            tracing::warn!(node = child.id, ?operation, "operand is empty, treated as an empty solid");
        }
    }

    let model = operation.apply(&model_a, &model_b);
    let materials: Vec<Material> = a
        .mesh()
        .materials()
        .chain(b.mesh().materials())
        .cloned()
        .collect();
    let mut mesh = model_to_mesh(&model, &materials, material);
    if mesh.is_empty() {
        tracing::warn!(?operation, "boolean produced an empty mesh");
    }

    for child in [a, b] {
        for line in child.mesh().transformed_wire(&child.matrix) {
            mesh.add_wire_polyline(line);
        }
    }
    mesh.finish();

    (model, mesh)
}
