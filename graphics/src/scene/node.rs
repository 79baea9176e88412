//! Scene nodes.
//!
//! A [`Node`] is one entry in the scene arena. It carries a dirty flag,
//! two sets of tree links (the internal draw-traversal tree and the
//! per-subtype logical tree) and a [`NodeKind`] body.
//!
//! The kind decides the node's [`Subtype`], and the subtype decides when
//! the node runs during aggregation: snapshot entries are processed in
//! ascending `Subtype` order, with `Position` deliberately greatest so
//! transform composition sees every other contribution first.

use std::fmt;
use std::sync::Arc;

use aster_core::dirty::DirtyFlag;
use aster_core::math::{mat4_array_mul, IDENTITY_MATRIX};
use parking_lot::Mutex;

use crate::command::{QueueMode, RenderCommand, VertexCommand};
use crate::materials::{AggregatedMaterial, Alias, ParamSet, ParamValue};
use crate::program::Program;

use super::aggregated::AggregatedNode;
use super::graph::SceneGraph;
use super::NodeId;

/// Aggregation class of a node.
///
/// The declaration order is the aggregation order. `Position` is last by
/// contract: the model matrix is composed after programs and materials
/// have contributed, so any of them may pre-empt the transform slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subtype {
    /// Structure-only nodes (groups).
    Null,
    /// Shader program providers.
    Program,
    /// Material parameter providers.
    Material,
    /// Renderables.
    Mesh,
    /// User-defined classes, distinguished by index.
    Custom(u16),
    /// Transform providers. Kept greatest; see the type docs.
    Position,
}

/// Parent/children links within one tree.
///
/// Every node carries two of these: `internal` for the draw-traversal
/// tree and `logical` for the nearest-same-subtype tree.
#[derive(Debug, Clone, Default)]
pub struct TreeLinks {
    /// Parent in this tree, if any.
    pub parent: Option<NodeId>,
    /// Children in insertion order.
    pub children: Vec<NodeId>,
}

/// Open extension point for user-defined node classes.
///
/// A custom node takes part in aggregation like the built-in kinds: it
/// may write material parameters, mutate the command, or climb its
/// logical chain through `scene`.
pub trait CustomNode: fmt::Debug + Send + Sync {
    /// Index distinguishing this class from other custom classes.
    fn subtype_index(&self) -> u16;

    /// Contribute to the renderable being aggregated.
    fn aggregate(
        &self,
        scene: &SceneGraph,
        id: NodeId,
        material: &AggregatedMaterial,
        command: &RenderCommand,
    );
}

/// Renderable body: geometry plus the per-node aggregation cache.
#[derive(Debug)]
pub struct MeshNode {
    pub(crate) vertices: Vec<Arc<VertexCommand>>,
    pub(crate) queue_mode: QueueMode,
    pub(crate) cache: Mutex<Vec<Arc<AggregatedNode>>>,
}

impl MeshNode {
    pub(crate) fn new(vertices: Vec<Arc<VertexCommand>>, queue_mode: QueueMode) -> Self {
        Self {
            vertices,
            queue_mode,
            cache: Mutex::new(Vec::new()),
        }
    }

    /// Geometry drawn by this renderable.
    #[inline]
    pub fn vertices(&self) -> &[Arc<VertexCommand>] {
        &self.vertices
    }

    /// Queue family this renderable's commands are filed into.
    #[inline]
    pub fn queue_mode(&self) -> QueueMode {
        self.queue_mode
    }

    /// Number of cached aggregation results.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }
}

/// The body of a scene node.
#[derive(Debug)]
pub enum NodeKind {
    /// Structure only; contributes nothing.
    Group,
    /// Local transform, column-major.
    Position {
        /// Local transform relative to the logical parent.
        matrix: [f32; 16],
    },
    /// Material parameter values.
    Material {
        /// Authored parameters.
        params: ParamSet,
    },
    /// Shader program provider.
    Program {
        /// The shared program.
        program: Arc<Program>,
    },
    /// Renderable geometry.
    Mesh(MeshNode),
    /// User-defined class.
    Custom(Box<dyn CustomNode>),
}

impl NodeKind {
    /// Aggregation class of this body.
    pub fn subtype(&self) -> Subtype {
        match self {
            Self::Group => Subtype::Null,
            Self::Program { .. } => Subtype::Program,
            Self::Material { .. } => Subtype::Material,
            Self::Mesh(_) => Subtype::Mesh,
            Self::Custom(custom) => Subtype::Custom(custom.subtype_index()),
            Self::Position { .. } => Subtype::Position,
        }
    }

    /// Runs this body's aggregation step for the renderable owning
    /// `material` and `command`.
    pub(crate) fn aggregate(
        &self,
        scene: &SceneGraph,
        id: NodeId,
        material: &AggregatedMaterial,
        command: &RenderCommand,
    ) {
        match self {
            Self::Group | Self::Mesh(_) => {}
            Self::Position { matrix } => {
                Self::aggregate_position(scene, id, *matrix, material);
            }
            Self::Material { params } => {
                Self::aggregate_material(scene, id, params, material, command);
            }
            Self::Program { program } => {
                if command.program_id() != Some(program.id()) {
                    command.set_program(program);
                }
            }
            Self::Custom(custom) => custom.aggregate(scene, id, material, command),
        }
    }

    /// Composes the full transform by climbing the logical chain and
    /// writes it once under the model matrix gate.
    fn aggregate_position(
        scene: &SceneGraph,
        id: NodeId,
        matrix: [f32; 16],
        material: &AggregatedMaterial,
    ) {
        // Nearest-first chain of local matrices.
        let mut chain = vec![matrix];
        let mut cursor = scene.logical_parent(id);
        while let Some(ancestor) = cursor {
            if let Some(node) = scene.get(ancestor) {
                if let NodeKind::Position { matrix } = node.kind() {
                    chain.push(*matrix);
                }
                cursor = node.logical_parent();
            } else {
                break;
            }
        }

        let mut product = IDENTITY_MATRIX;
        for local in chain.iter().rev() {
            product = mat4_array_mul(&product, local);
        }
        material.set(Alias::ModelMatrix, ParamValue::Mat4(product));
    }

    /// Writes this node's parameters, then delegates up the logical
    /// chain so ancestors fill the slots left unset.
    fn aggregate_material(
        scene: &SceneGraph,
        id: NodeId,
        params: &ParamSet,
        material: &AggregatedMaterial,
        command: &RenderCommand,
    ) {
        for (alias, value) in params.iter() {
            material.set(alias.clone(), value.clone());
        }
        if let Some(parent) = scene.logical_parent(id) {
            if let Some(node) = scene.get(parent) {
                node.kind().aggregate(scene, parent, material, command);
            }
        }
    }
}

/// One scene node: dirty flag, dual tree membership, body.
#[derive(Debug)]
pub struct Node {
    label: Option<String>,
    dirty: DirtyFlag,
    pub(crate) internal: TreeLinks,
    pub(crate) logical: TreeLinks,
    kind: NodeKind,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            label: None,
            dirty: DirtyFlag::new(true),
            internal: TreeLinks::default(),
            logical: TreeLinks::default(),
            kind,
        }
    }

    /// Debug label, if any.
    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    /// The node's dirty flag.
    #[inline]
    pub fn dirty(&self) -> &DirtyFlag {
        &self.dirty
    }

    /// Aggregation class of this node.
    #[inline]
    pub fn subtype(&self) -> Subtype {
        self.kind.subtype()
    }

    /// The node body.
    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Mutable access to the node body.
    ///
    /// Mutations that affect derived state should be followed by marking
    /// the node dirty; the typed mutators on the scene graph do both.
    #[inline]
    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    /// Parent in the draw-traversal tree.
    #[inline]
    pub fn internal_parent(&self) -> Option<NodeId> {
        self.internal.parent
    }

    /// Children in the draw-traversal tree, in insertion order.
    #[inline]
    pub fn internal_children(&self) -> &[NodeId] {
        &self.internal.children
    }

    /// Parent in the nearest-same-subtype tree.
    #[inline]
    pub fn logical_parent(&self) -> Option<NodeId> {
        self.logical.parent
    }

    /// Children in the nearest-same-subtype tree.
    #[inline]
    pub fn logical_children(&self) -> &[NodeId] {
        &self.logical.children
    }
}

static_assertions::assert_impl_all!(Node: Send, Sync);
