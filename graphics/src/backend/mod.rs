//! Backend abstraction layer.
//!
//! This module provides a trait-based abstraction over the device that
//! ultimately consumes draw calls. The rendering core never talks to a GPU
//! API directly; it records state changes and draws through a [`Context`],
//! which a backend implements.
//!
//! # Architecture
//!
//! A [`Context`] covers:
//! - Resource creation (vertex/index buffers, shader programs)
//! - Per-target state (active context, viewport, clear)
//! - Per-draw state (program, material parameters, uniforms)
//! - Draw submission and flushing
//!
//! The built-in [`headless::HeadlessContext`] performs no device work and
//! records every call instead, which is what the test suite runs against.

pub mod headless;

use std::sync::Arc;

use crate::command::VertexCommand;
use crate::error::RenderError;
use crate::materials::{MaterialId, ParamSet};
use crate::program::{Program, ProgramDescriptor, ShaderSource, ShaderStage};
use crate::types::{BufferUsage, Viewport};

/// Opaque handle to a device buffer created through a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(u64);

impl BufferHandle {
    /// Wrap a backend-chosen handle value.
    #[inline]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value, useful for logging.
    #[inline]
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Opaque handle to a compiled shader program created through a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(u64);

impl ProgramHandle {
    /// Wrap a backend-chosen handle value.
    #[inline]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value, useful for logging.
    #[inline]
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Device abstraction the rendering core records draws against.
///
/// Implementations must be callable from worker threads; draw recording for
/// independent targets may happen concurrently, with calls for a single
/// target always arriving from one thread at a time.
pub trait Context: Send + Sync {
    /// Backend name, used for logging.
    fn name(&self) -> &'static str;

    /// Create a buffer from raw bytes.
    fn create_buffer(&self, data: &[u8], usage: BufferUsage) -> Result<BufferHandle, RenderError>;

    /// Compile and link a shader program.
    fn create_program(&self, descriptor: &ProgramDescriptor) -> Result<ProgramHandle, RenderError>;

    /// Source of the fallback shader for a stage, used when a mesh chain
    /// carries no program of its own.
    fn default_shader(&self, stage: ShaderStage) -> ShaderSource;

    /// Make this context current (or release it) for the calling thread.
    fn set_active(&self, active: bool);

    /// Set the viewport for subsequent draws.
    fn bind_viewport(&self, viewport: &Viewport);

    /// Clear the active target with an RGBA color.
    fn clear(&self, color: [f32; 4]);

    /// Bind a shader program for subsequent draws.
    fn bind_program(&self, program: &Program);

    /// Bind the parameters of a material.
    ///
    /// Called once per material per pass; all commands drawn afterwards
    /// share these parameters until the next call.
    fn bind_material(&self, material: MaterialId, params: &ParamSet);

    /// Bind per-command uniform values.
    fn bind_uniforms(&self, params: &ParamSet);

    /// Submit one draw.
    fn draw(&self, command: &VertexCommand);

    /// Finish all recorded work for the current target.
    fn flush(&self);
}

/// Create the default context.
///
/// Currently always the headless context; real device contexts are provided
/// by downstream backend crates implementing [`Context`].
pub fn create_context() -> Arc<dyn Context> {
    log::info!("Using headless context");
    Arc::new(headless::HeadlessContext::new())
}
