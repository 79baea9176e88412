//! Aggregation results.
//!
//! An [`AggregatedNode`] freezes one renderable's aggregation: the path
//! snapshot it was built for, the render command, and the aggregated
//! material. The owning mesh node caches these bundles and reuses one as
//! long as its snapshot still matches, which keeps command and material
//! identities stable across frames.
//!
//! An [`AggregatedGroup`] is the per-target collection of such bundles,
//! held weakly. Owners notify the group explicitly when discarding a
//! bundle, so group size tracks bundle lifetime exactly.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::command::RenderCommand;
use crate::materials::AggregatedMaterial;

use super::graph::SceneGraph;
use super::snapshot::SubtypeSnapshot;

/// Frozen aggregation result for one renderable on one path.
#[derive(Debug)]
pub struct AggregatedNode {
    snapshot: SubtypeSnapshot,
    command: Arc<RenderCommand>,
    material: Arc<AggregatedMaterial>,
    group: Mutex<Weak<AggregatedGroup>>,
}

impl AggregatedNode {
    /// Bundles a freshly built command and material for `snapshot`.
    pub fn new(
        snapshot: SubtypeSnapshot,
        command: Arc<RenderCommand>,
        material: Arc<AggregatedMaterial>,
    ) -> Arc<Self> {
        Arc::new(Self {
            snapshot,
            command,
            material,
            group: Mutex::new(Weak::new()),
        })
    }

    /// The snapshot this bundle was built for.
    #[inline]
    pub fn snapshot(&self) -> &SubtypeSnapshot {
        &self.snapshot
    }

    /// The render command.
    #[inline]
    pub fn command(&self) -> &Arc<RenderCommand> {
        &self.command
    }

    /// The aggregated material.
    #[inline]
    pub fn material(&self) -> &Arc<AggregatedMaterial> {
        &self.material
    }

    /// The group this bundle is registered in, if it is still alive.
    pub fn group(&self) -> Option<Arc<AggregatedGroup>> {
        self.group.lock().upgrade()
    }

    /// Whether this bundle can serve a lookup for `snapshot` targeting
    /// `group`: snapshots must be equal and the bundle must either belong
    /// to `group` or to no live group at all.
    pub fn matches(&self, snapshot: &SubtypeSnapshot, group: &Arc<AggregatedGroup>) -> bool {
        if self.snapshot != *snapshot {
            return false;
        }
        match self.group.lock().upgrade() {
            None => true,
            Some(current) => Arc::ptr_eq(&current, group),
        }
    }

    /// Registers this bundle in `group`, leaving any previous live group
    /// first. A bundle belongs to at most one group.
    pub fn register_in(self: &Arc<Self>, group: &Arc<AggregatedGroup>) {
        let mut link = self.group.lock();
        if let Some(current) = link.upgrade() {
            if !Arc::ptr_eq(&current, group) {
                current.remove_node(self);
            }
        }
        group.append_node(self);
        *link = Arc::downgrade(group);
    }

    /// Runs the aggregation pass: re-arms the material gates, then lets
    /// every live snapshot entry contribute in subtype order. Entries
    /// whose node has been removed are skipped.
    pub fn aggregate(&self, scene: &SceneGraph) {
        self.material.reset_states();
        for (subtype, id) in self.snapshot.iter() {
            let Some(node) = scene.get(*id) else {
                log::trace!("skipping removed {:?} entry {}", subtype, id);
                continue;
            };
            node.kind().aggregate(scene, *id, &self.material, &self.command);
        }
    }
}

/// Per-target collection of aggregated nodes, held weakly.
#[derive(Debug, Default)]
pub struct AggregatedGroup {
    label: Option<String>,
    nodes: Mutex<Vec<Weak<AggregatedNode>>>,
}

impl AggregatedGroup {
    /// Creates an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty group with a debug label.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            nodes: Mutex::new(Vec::new()),
        }
    }

    /// Debug label, if any.
    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Appends `node`, pruning expired entries on the way. Appending a
    /// node already present is a no-op.
    pub fn append_node(&self, node: &Arc<AggregatedNode>) {
        let mut nodes = self.nodes.lock();
        nodes.retain(|entry| entry.upgrade().is_some());

        let incoming = Arc::downgrade(node);
        if nodes.iter().any(|entry| Weak::ptr_eq(entry, &incoming)) {
            return;
        }
        nodes.push(incoming);
    }

    /// Finds the live node built for `snapshot`, if any.
    pub fn find_node(&self, snapshot: &SubtypeSnapshot) -> Option<Arc<AggregatedNode>> {
        self.nodes
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .find(|node| node.snapshot() == snapshot)
    }

    /// Removes `node` by identity. Called by the bundle's owner when it
    /// discards the bundle or moves it to another group.
    pub fn remove_node(&self, node: &AggregatedNode) {
        self.nodes.lock().retain(|entry| match entry.upgrade() {
            Some(live) => !std::ptr::eq(Arc::as_ptr(&live), node),
            None => false,
        });
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes
            .lock()
            .iter()
            .filter(|entry| entry.upgrade().is_some())
            .count()
    }

    /// Whether no live node is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static_assertions::assert_impl_all!(AggregatedNode: Send, Sync);
static_assertions::assert_impl_all!(AggregatedGroup: Send, Sync);
