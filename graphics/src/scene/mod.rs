//! Scene graph with per-subtype aggregation.
//!
//! A scene is one [`SceneGraph`] holding [`Node`]s in a generational
//! arena. Every node sits in two trees at once:
//!
//! - the *internal* tree drives the draw-order traversal and owns the
//!   parent/child structure the application edits;
//! - the *logical* tree links each node to its nearest internal ancestor
//!   of the same [`Subtype`], which is the chain aggregation follows.
//!
//! # Update and aggregation
//!
//! [`SceneGraph::update`] walks the internal tree, carrying a
//! [`SubtypeSnapshot`] of the nearest node per subtype down each branch.
//! When the walk reaches a renderable whose snapshot no longer matches
//! its cache, the mesh's chain is re-aggregated into a fresh
//! [`AggregatedNode`] bundle: positions compose their matrix chain,
//! materials write parameters nearest-first behind write-once gates, and
//! the program rebinds the render command. Unchanged renderables reuse
//! their cached bundle, so a clean frame allocates nothing.
//!
//! Bundles register themselves in the target's [`AggregatedGroup`], and
//! removal walks the group membership backwards so a deleted subtree
//! never leaves stale draw entries behind.

mod aggregated;
mod graph;
mod node;
mod snapshot;

/// Identifies a node in a [`SceneGraph`].
pub type NodeId = aster_core::arena::Handle;

pub use aggregated::{AggregatedGroup, AggregatedNode};
pub use graph::{SceneGraph, UpdateContext};
pub use node::{CustomNode, MeshNode, Node, NodeKind, Subtype, TreeLinks};
pub use snapshot::SubtypeSnapshot;
