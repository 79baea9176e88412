//! Headless context for testing and development.
//!
//! This context performs no device work. Every call is logged at trace
//! level and recorded into an operation trace that tests drain with
//! [`HeadlessContext::take_trace`] to assert exact call sequences.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::command::VertexCommand;
use crate::error::RenderError;
use crate::materials::{MaterialId, ParamSet};
use crate::program::{Program, ProgramDescriptor, ProgramId, ShaderSource, ShaderStage};
use crate::types::{BufferUsage, Viewport};

use super::{BufferHandle, Context, ProgramHandle};

/// One recorded context call.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceOp {
    /// Buffer creation with payload size and usage.
    CreateBuffer { size: usize, usage: BufferUsage },
    /// Program creation with its label.
    CreateProgram { label: Option<String> },
    /// Context (de)activation.
    SetActive { active: bool },
    /// Viewport binding.
    BindViewport { width: f32, height: f32 },
    /// Clear with an RGBA color.
    Clear { color: [f32; 4] },
    /// Program binding.
    BindProgram { id: ProgramId },
    /// Material binding with its parameter count.
    BindMaterial { id: MaterialId, params: usize },
    /// Per-command uniform binding with its parameter count.
    BindUniforms { params: usize },
    /// One draw with the effective element count.
    Draw { elements: u32 },
    /// End-of-target flush.
    Flush,
}

/// Context that records calls instead of encoding them.
#[derive(Debug, Default)]
pub struct HeadlessContext {
    next_buffer: AtomicU64,
    next_program: AtomicU64,
    trace: Mutex<Vec<TraceOp>>,
}

impl HeadlessContext {
    /// Creates a headless context with an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns the recorded operations.
    pub fn take_trace(&self) -> Vec<TraceOp> {
        std::mem::take(&mut *self.trace.lock())
    }

    /// Number of operations recorded since the last drain.
    pub fn trace_len(&self) -> usize {
        self.trace.lock().len()
    }

    fn record(&self, op: TraceOp) {
        self.trace.lock().push(op);
    }
}

impl Context for HeadlessContext {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_buffer(&self, data: &[u8], usage: BufferUsage) -> Result<BufferHandle, RenderError> {
        let handle = BufferHandle::new(self.next_buffer.fetch_add(1, Ordering::Relaxed));
        log::trace!(
            "headless: create_buffer {:?} (size: {}, usage: {:?})",
            handle,
            data.len(),
            usage
        );
        self.record(TraceOp::CreateBuffer {
            size: data.len(),
            usage,
        });
        Ok(handle)
    }

    fn create_program(&self, descriptor: &ProgramDescriptor) -> Result<ProgramHandle, RenderError> {
        let handle = ProgramHandle::new(self.next_program.fetch_add(1, Ordering::Relaxed));
        log::trace!("headless: create_program {:?} ({:?})", handle, descriptor.label);
        self.record(TraceOp::CreateProgram {
            label: descriptor.label.clone(),
        });
        Ok(handle)
    }

    fn default_shader(&self, stage: ShaderStage) -> ShaderSource {
        match stage {
            ShaderStage::Vertex => ShaderSource::vertex("// headless vertex stub"),
            ShaderStage::Fragment => ShaderSource::fragment("// headless fragment stub"),
        }
    }

    fn set_active(&self, active: bool) {
        log::trace!("headless: set_active {}", active);
        self.record(TraceOp::SetActive { active });
    }

    fn bind_viewport(&self, viewport: &Viewport) {
        log::trace!(
            "headless: bind_viewport {}x{}",
            viewport.width,
            viewport.height
        );
        self.record(TraceOp::BindViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }

    fn clear(&self, color: [f32; 4]) {
        log::trace!("headless: clear {:?}", color);
        self.record(TraceOp::Clear { color });
    }

    fn bind_program(&self, program: &Program) {
        log::trace!("headless: bind_program {}", program.id());
        self.record(TraceOp::BindProgram { id: program.id() });
    }

    fn bind_material(&self, material: MaterialId, params: &ParamSet) {
        log::trace!(
            "headless: bind_material {} ({} params)",
            material,
            params.len()
        );
        self.record(TraceOp::BindMaterial {
            id: material,
            params: params.len(),
        });
    }

    fn bind_uniforms(&self, params: &ParamSet) {
        log::trace!("headless: bind_uniforms ({} params)", params.len());
        self.record(TraceOp::BindUniforms {
            params: params.len(),
        });
    }

    fn draw(&self, command: &VertexCommand) {
        log::trace!("headless: draw {} elements", command.draw_count());
        self.record(TraceOp::Draw {
            elements: command.draw_count(),
        });
    }

    fn flush(&self) {
        log::trace!("headless: flush");
        self.record(TraceOp::Flush);
    }
}

static_assertions::assert_impl_all!(HeadlessContext: Send, Sync);
