//! The scene graph.
//!
//! All nodes live in one generational arena owned by [`SceneGraph`];
//! [`NodeId`]s are arena handles, so a handle kept across a removal goes
//! stale instead of dangling. The graph maintains both trees per node:
//! structural operations rewrite the internal links and then refile the
//! logical links of everything whose nearest-same-subtype ancestor may
//! have changed.
//!
//! Structural mutation takes `&mut self` and happens between frames. The
//! update walk only needs `&self`: per-node state that changes during a
//! frame sits behind atomics and mutexes, which is what lets independent
//! render targets walk one scene concurrently.

use std::sync::Arc;

use aster_core::arena::Arena;

use crate::command::{QueueMode, RenderCommand, VertexCommand};
use crate::error::RenderError;
use crate::materials::{AggregatedMaterial, Alias, ParamSet, ParamValue};
use crate::program::Program;

use super::aggregated::{AggregatedGroup, AggregatedNode};
use super::node::{CustomNode, MeshNode, Node, NodeKind, Subtype};
use super::snapshot::SubtypeSnapshot;
use super::NodeId;

/// Everything one update walk needs, passed explicitly.
pub struct UpdateContext<'a> {
    /// Group the walked renderables register their bundles in.
    pub group: &'a Arc<AggregatedGroup>,
    /// Sink receiving each visited renderable's bundle and queue mode;
    /// the target files these into its command group after the walk.
    pub filed: &'a mut Vec<(Arc<AggregatedNode>, QueueMode)>,
}

/// Arena-backed scene with dual tree links per node.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Arena<Node>,
}

impl SceneGraph {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Typed factories
    // ------------------------------------------------------------------

    /// Adds a structure-only group node.
    pub fn add_group(&mut self, parent: Option<NodeId>) -> NodeId {
        self.add_node(NodeKind::Group, parent)
    }

    /// Adds a transform node with a column-major local matrix.
    pub fn add_position(&mut self, matrix: [f32; 16], parent: Option<NodeId>) -> NodeId {
        self.add_node(NodeKind::Position { matrix }, parent)
    }

    /// Adds a material node with authored parameters.
    pub fn add_material(&mut self, params: ParamSet, parent: Option<NodeId>) -> NodeId {
        self.add_node(NodeKind::Material { params }, parent)
    }

    /// Adds a program provider node.
    pub fn add_program(&mut self, program: Arc<Program>, parent: Option<NodeId>) -> NodeId {
        self.add_node(NodeKind::Program { program }, parent)
    }

    /// Adds a renderable node.
    pub fn add_mesh(
        &mut self,
        vertices: Vec<Arc<VertexCommand>>,
        queue_mode: QueueMode,
        parent: Option<NodeId>,
    ) -> NodeId {
        self.add_node(NodeKind::Mesh(MeshNode::new(vertices, queue_mode)), parent)
    }

    /// Adds a user-defined node.
    pub fn add_custom(&mut self, custom: Box<dyn CustomNode>, parent: Option<NodeId>) -> NodeId {
        self.add_node(NodeKind::Custom(custom), parent)
    }

    fn add_node(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let subtype = kind.subtype();
        let id = self.nodes.insert(Node::new(kind));
        if let Some(parent) = parent {
            assert!(self.nodes.contains(parent), "adding under an unknown parent");
            if let Some(node) = self.nodes.get_mut(parent) {
                node.internal.children.push(id);
            }
            if let Some(node) = self.nodes.get_mut(id) {
                node.internal.parent = Some(parent);
            }
        }
        self.refile_logical(id);
        log::trace!("added {:?} node {}", subtype, id);
        id
    }

    // ------------------------------------------------------------------
    // Structural operations
    // ------------------------------------------------------------------

    /// Moves `child` under `parent` (or to root level with `None`),
    /// keeping its subtree, then refiles the subtree's logical links.
    ///
    /// A no-op when `child` is already there. `parent` must not be
    /// `child` itself or anything inside its subtree.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) {
        assert!(self.nodes.contains(child), "set_parent on an unknown node");
        if let Some(parent) = parent {
            assert!(self.nodes.contains(parent), "set_parent to an unknown node");
            assert_ne!(child, parent, "a node cannot be its own parent");
            assert!(
                !self.is_inside_subtree(parent, child),
                "new parent lies inside the moved subtree"
            );
        }

        let old = self.nodes.get(child).and_then(|n| n.internal.parent);
        if old == parent {
            return;
        }

        if let Some(old) = old {
            if let Some(node) = self.nodes.get_mut(old) {
                node.internal.children.retain(|c| *c != child);
            }
        }
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.internal.children.push(child);
            }
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.internal.parent = parent;
        }
        self.refile_logical_subtree(child);
    }

    /// Detaches `child` from its internal parent; the subtree stays
    /// alive as a root.
    pub fn detach(&mut self, child: NodeId) {
        self.set_parent(child, None);
    }

    /// Removes a node and its whole internal subtree.
    ///
    /// The removal path runs every owner notification itself: cached
    /// bundles of removed renderables are withdrawn from their groups,
    /// and surviving logical parents drop their removed children.
    /// Returns the number of removed nodes.
    pub fn remove_subtree(&mut self, root: NodeId) -> usize {
        if !self.nodes.contains(root) {
            return 0;
        }
        if let Some(parent) = self.nodes.get(root).and_then(|n| n.internal.parent) {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.internal.children.retain(|c| *c != root);
            }
        }

        let ids = self.collect_subtree(root);
        let mut removed = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(node) = self.nodes.remove(*id) {
                removed.push((*id, node));
            }
        }

        for (id, node) in &removed {
            if let NodeKind::Mesh(mesh) = node.kind() {
                for stale in mesh.cache.lock().drain(..) {
                    if let Some(group) = stale.group() {
                        group.remove_node(&stale);
                    }
                }
            }
            // A logical child is always an internal descendant, so it
            // left with the subtree; only the upward link can survive.
            if let Some(parent) = node.logical.parent {
                if let Some(parent_node) = self.nodes.get_mut(parent) {
                    parent_node.logical.children.retain(|c| c != id);
                }
            }
        }

        log::trace!("removed subtree of {} nodes at {}", removed.len(), root);
        removed.len()
    }

    /// Whether `node` lies inside the subtree rooted at `root`
    /// (excluding `root` itself).
    fn is_inside_subtree(&self, node: NodeId, root: NodeId) -> bool {
        let mut cursor = self.nodes.get(node).and_then(|n| n.internal.parent);
        while let Some(current) = cursor {
            if current == root {
                return true;
            }
            cursor = self.nodes.get(current).and_then(|n| n.internal.parent);
        }
        false
    }

    fn collect_subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(id) {
                out.push(id);
                stack.extend(node.internal.children.iter().copied());
            }
        }
        out
    }

    /// Recomputes the logical links of every node in `root`'s subtree.
    fn refile_logical_subtree(&mut self, root: NodeId) {
        for id in self.collect_subtree(root) {
            self.refile_logical(id);
        }
    }

    /// Recomputes one node's logical parent: the nearest internal
    /// ancestor sharing its subtype, or none.
    fn refile_logical(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id) else { return };
        let subtype = node.subtype();
        let old_parent = node.logical.parent;

        let mut found = None;
        let mut cursor = node.internal.parent;
        while let Some(current) = cursor {
            let Some(ancestor) = self.nodes.get(current) else {
                break;
            };
            if ancestor.subtype() == subtype {
                found = Some(current);
                break;
            }
            cursor = ancestor.internal.parent;
        }

        if old_parent == found {
            return;
        }
        if let Some(old) = old_parent {
            if let Some(node) = self.nodes.get_mut(old) {
                node.logical.children.retain(|c| *c != id);
            }
        }
        if let Some(new) = found {
            if let Some(node) = self.nodes.get_mut(new) {
                node.logical.children.push(id);
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.logical.parent = found;
        }
    }

    // ------------------------------------------------------------------
    // Accessors and typed mutators
    // ------------------------------------------------------------------

    /// The node behind `id`, if live.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable access to the node behind `id`, if live.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Whether `id` is live.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// Number of live nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Aggregation class of `id`, if live.
    pub fn subtype(&self, id: NodeId) -> Option<Subtype> {
        self.nodes.get(id).map(Node::subtype)
    }

    /// Parent of `id` in the draw-traversal tree.
    pub fn internal_parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.internal.parent)
    }

    /// Children of `id` in the draw-traversal tree.
    pub fn internal_children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.internal_children())
            .unwrap_or(&[])
    }

    /// Parent of `id` in the nearest-same-subtype tree.
    pub fn logical_parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.logical.parent)
    }

    /// Children of `id` in the nearest-same-subtype tree.
    pub fn logical_children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.logical_children())
            .unwrap_or(&[])
    }

    /// Marks `id` dirty. Returns whether the node exists.
    pub fn mark_dirty(&self, id: NodeId) -> bool {
        match self.nodes.get(id) {
            Some(node) => {
                node.dirty().mark();
                true
            }
            None => false,
        }
    }

    /// Sets a node's debug label.
    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.set_label(Some(label.into()));
                true
            }
            None => false,
        }
    }

    /// Replaces a position node's local matrix and marks it dirty.
    pub fn set_position_matrix(&mut self, id: NodeId, matrix: [f32; 16]) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        let NodeKind::Position { matrix: slot } = node.kind_mut() else {
            return false;
        };
        *slot = matrix;
        node.dirty().mark();
        true
    }

    /// Sets one parameter on a material node and marks it dirty.
    pub fn set_material_param(&mut self, id: NodeId, alias: Alias, value: ParamValue) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        let NodeKind::Material { params } = node.kind_mut() else {
            return false;
        };
        params.set(alias, value);
        node.dirty().mark();
        true
    }

    // ------------------------------------------------------------------
    // Chain validation
    // ------------------------------------------------------------------

    /// Checks that `id` is a renderable whose chain can produce a
    /// transform: a position node must sit somewhere above it.
    pub fn validate_chain(&self, id: NodeId) -> Result<(), RenderError> {
        let Some(node) = self.nodes.get(id) else {
            return Err(RenderError::InvalidChain(format!(
                "node {id} does not exist"
            )));
        };
        if node.subtype() != Subtype::Mesh {
            return Err(RenderError::InvalidChain(format!(
                "node {id} is not a renderable"
            )));
        }

        let mut cursor = node.internal.parent;
        while let Some(current) = cursor {
            let Some(ancestor) = self.nodes.get(current) else {
                break;
            };
            if ancestor.subtype() == Subtype::Position {
                return Ok(());
            }
            cursor = ancestor.internal.parent;
        }
        Err(RenderError::InvalidChain(format!(
            "renderable {id} has no position node above it"
        )))
    }

    // ------------------------------------------------------------------
    // Update walk
    // ------------------------------------------------------------------

    /// Walks `root`'s internal subtree, refreshing every renderable's
    /// aggregation state against `cx.group` and reporting bundles to
    /// file through `cx.filed`.
    pub fn update(&self, root: NodeId, cx: &mut UpdateContext<'_>) {
        if !self.nodes.contains(root) {
            log::trace!("skipping removed root {}", root);
            return;
        }
        self.update_node(root, SubtypeSnapshot::new(), false, cx);
    }

    fn update_node(
        &self,
        id: NodeId,
        mut snapshot: SubtypeSnapshot,
        inherited: bool,
        cx: &mut UpdateContext<'_>,
    ) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        // take() must run even when already inheriting, so the flag is
        // clear for the next frame.
        let dirty = node.dirty().take() || inherited;
        snapshot.set(node.subtype(), id);

        if let NodeKind::Mesh(mesh) = node.kind() {
            self.update_mesh(id, mesh, &snapshot, dirty, cx);
        }

        for child in node.internal_children() {
            self.update_node(*child, snapshot.clone(), dirty, cx);
        }
    }

    /// The renderable cache protocol: discard on dirty, reuse on
    /// snapshot match, rebuild and aggregate otherwise.
    fn update_mesh(
        &self,
        id: NodeId,
        mesh: &MeshNode,
        snapshot: &SubtypeSnapshot,
        dirty: bool,
        cx: &mut UpdateContext<'_>,
    ) {
        let mut cache = mesh.cache.lock();

        if dirty && !cache.is_empty() {
            log::trace!("mesh {}: discarding {} cached bundles", id, cache.len());
            for stale in cache.drain(..) {
                if let Some(group) = stale.group() {
                    group.remove_node(&stale);
                }
            }
        }

        if let Some(hit) = cache.iter().find(|c| c.matches(snapshot, cx.group)).cloned() {
            // Covers a reset group: registration is re-established lazily.
            hit.register_in(cx.group);
            if hit.command().program_id().is_some() {
                cx.filed.push((hit, mesh.queue_mode));
            } else {
                log::trace!("mesh {}: no program bound, nothing to file", id);
            }
            return;
        }

        let material = Arc::new(AggregatedMaterial::new());
        let command = RenderCommand::new(mesh.vertices.clone(), &material);
        let bundle = AggregatedNode::new(snapshot.clone(), command, material);
        bundle.aggregate(self);
        bundle.register_in(cx.group);
        cache.push(bundle.clone());

        if bundle.command().program_id().is_some() {
            cx.filed.push((bundle, mesh.queue_mode));
        } else {
            log::warn!(
                "mesh {} has no program in its chain; its command will not be drawn",
                id
            );
        }
    }
}

static_assertions::assert_impl_all!(SceneGraph: Send, Sync);
