//! Draw commands.
//!
//! A [`VertexCommand`] is uploaded geometry: device buffers plus the
//! counts and topology needed to issue one draw. A [`RenderCommand`]
//! bundles one renderable's vertex commands with the aggregated material
//! and program it draws with, and is what the routing layer files into
//! queues.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::backend::{BufferHandle, Context};
use crate::command_group::RenderCommandGroup;
use crate::error::RenderError;
use crate::materials::{AggregatedMaterial, Alias, MaterialId, ParamSet, ParamValue};
use crate::mesh::MeshData;
use crate::program::{Program, ProgramId};
use crate::types::{BufferUsage, IndexFormat, PrimitiveTopology};

/// Which queue family a command is filed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueueMode {
    /// Filed once, drawn every frame until removed.
    #[default]
    Static,
    /// Re-filed every frame, cleared after each draw.
    Dynamic,
}

/// Uploaded geometry for one draw call.
///
/// Created through [`VertexCommand::new`], which uploads the mesh bytes
/// into device buffers; shared as `Arc<VertexCommand>` between the mesh
/// node that owns the geometry and every command that draws it.
#[derive(Debug)]
pub struct VertexCommand {
    label: Option<String>,
    vertex_buffer: BufferHandle,
    index_buffer: Option<BufferHandle>,
    vertex_count: u32,
    index_count: u32,
    index_format: Option<IndexFormat>,
    topology: PrimitiveTopology,
}

impl VertexCommand {
    /// Uploads `mesh` through `context` and captures the draw state.
    pub fn new(context: &dyn Context, mesh: &MeshData) -> Result<Arc<Self>, RenderError> {
        mesh.validate()?;

        let vertex_buffer =
            context.create_buffer(&mesh.data, BufferUsage::VERTEX | BufferUsage::COPY_DST)?;

        let mut index_buffer = None;
        let mut index_count = 0;
        let mut index_format = None;
        if let Some(indices) = &mesh.indices {
            index_buffer = Some(
                context.create_buffer(&indices.data, BufferUsage::INDEX | BufferUsage::COPY_DST)?,
            );
            index_count = indices.count;
            index_format = Some(indices.format);
        }

        log::trace!(
            "uploaded mesh {:?}: {} vertices, {} indices",
            mesh.label,
            mesh.vertex_count,
            index_count
        );

        Ok(Arc::new(Self {
            label: mesh.label.clone(),
            vertex_buffer,
            index_buffer,
            vertex_count: mesh.vertex_count,
            index_count,
            index_format,
            topology: mesh.topology,
        }))
    }

    /// Debug label, if any.
    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Device buffer holding the vertex data.
    #[inline]
    pub fn vertex_buffer(&self) -> BufferHandle {
        self.vertex_buffer
    }

    /// Device buffer holding the index data, if indexed.
    #[inline]
    pub fn index_buffer(&self) -> Option<BufferHandle> {
        self.index_buffer
    }

    /// Number of vertices in the vertex buffer.
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Number of indices, zero when non-indexed.
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Index format, if indexed.
    #[inline]
    pub fn index_format(&self) -> Option<IndexFormat> {
        self.index_format
    }

    /// Primitive assembly topology.
    #[inline]
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Element count a draw of this command covers: the index count when
    /// indexed, the vertex count otherwise.
    #[inline]
    pub fn draw_count(&self) -> u32 {
        if self.index_buffer.is_some() {
            self.index_count
        } else {
            self.vertex_count
        }
    }
}

/// One renderable's routed draw state.
///
/// Holds the vertex commands to issue, a weak link to the aggregated
/// material (strongly owned by the aggregated node), the program binding
/// (rebindable, program nodes may swap it during aggregation), optional
/// per-command constants, and a back link to the command group the
/// command was filed into.
#[derive(Debug)]
pub struct RenderCommand {
    vertices: Vec<Arc<VertexCommand>>,
    material: Weak<AggregatedMaterial>,
    material_id: MaterialId,
    program: Mutex<Weak<Program>>,
    constants: Mutex<ParamSet>,
    parent_group: Mutex<Weak<RenderCommandGroup>>,
}

impl RenderCommand {
    /// Creates a command drawing `vertices` with `material`.
    pub fn new(
        vertices: Vec<Arc<VertexCommand>>,
        material: &Arc<AggregatedMaterial>,
    ) -> Arc<Self> {
        Arc::new(Self {
            vertices,
            material: Arc::downgrade(material),
            material_id: material.id(),
            program: Mutex::new(Weak::new()),
            constants: Mutex::new(ParamSet::new()),
            parent_group: Mutex::new(Weak::new()),
        })
    }

    /// Vertex commands this command draws.
    #[inline]
    pub fn vertices(&self) -> &[Arc<VertexCommand>] {
        &self.vertices
    }

    /// The aggregated material, if its owner is still alive.
    pub fn material(&self) -> Option<Arc<AggregatedMaterial>> {
        self.material.upgrade()
    }

    /// Identity of the aggregated material, valid even after its owner
    /// is gone.
    #[inline]
    pub fn material_id(&self) -> MaterialId {
        self.material_id
    }

    /// Rebinds the program this command draws with. Filed copies keep
    /// routing under the old program's pass until the caller refiles.
    pub fn set_program(&self, program: &Arc<Program>) {
        *self.program.lock() = Arc::downgrade(program);
    }

    /// The bound program, if any and still alive.
    pub fn program(&self) -> Option<Arc<Program>> {
        self.program.lock().upgrade()
    }

    /// Routing identity of the bound program.
    pub fn program_id(&self) -> Option<ProgramId> {
        self.program.lock().upgrade().map(|p| p.id())
    }

    /// Sets a per-command constant, replacing any previous value.
    pub fn set_constant(&self, alias: Alias, value: ParamValue) {
        self.constants.lock().set(alias, value);
    }

    /// Snapshot of the per-command constants.
    pub fn constants(&self) -> ParamSet {
        self.constants.lock().clone()
    }

    /// Binds the group this command was filed into. The first filing
    /// wins; refiling into the same group is a no-op.
    pub fn bind_parent_group(&self, group: &Arc<RenderCommandGroup>) {
        let mut parent = self.parent_group.lock();
        match parent.upgrade() {
            None => *parent = Arc::downgrade(group),
            Some(existing) => debug_assert!(
                Arc::ptr_eq(&existing, group),
                "render command filed into a second command group"
            ),
        }
    }

    /// The command group this command belongs to, if filed.
    pub fn parent_group(&self) -> Option<Arc<RenderCommandGroup>> {
        self.parent_group.lock().upgrade()
    }

    /// Issues the draws: per-command constants first, then every vertex
    /// command. Material and program binding is the caller's business.
    pub fn draw(&self, context: &dyn Context) {
        {
            let constants = self.constants.lock();
            if !constants.is_empty() {
                context.bind_uniforms(&constants);
            }
        }
        for vertices in &self.vertices {
            context.draw(vertices);
        }
    }
}

static_assertions::assert_impl_all!(VertexCommand: Send, Sync);
static_assertions::assert_impl_all!(RenderCommand: Send, Sync);
