//! Shader program definition.
//!
//! A [`Program`] is created through a [`Context`] and shared across the
//! scene as `Arc<Program>`. Shader sources are opaque payloads handed to
//! the backend; this crate never parses or compiles them.
//!
//! Every program carries a process-unique [`ProgramId`] which the routing
//! layer uses to group draw commands: commands rendered with the same
//! program end up in the same render pass.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::backend::{Context, ProgramHandle};
use crate::error::RenderError;

/// Shader stage in the graphics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Fragment shader.
    Fragment,
}

/// Shader source for one stage.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    /// The shader stage.
    pub stage: ShaderStage,

    /// Shader source code (backend dependent; passed through untouched).
    pub source: Vec<u8>,

    /// Entry point function name.
    pub entry_point: String,
}

impl ShaderSource {
    /// Create a new shader source.
    pub fn new(
        stage: ShaderStage,
        source: impl Into<Vec<u8>>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            source: source.into(),
            entry_point: entry_point.into(),
        }
    }

    /// Create a vertex shader source with the default `vs_main` entry point.
    pub fn vertex(source: impl Into<Vec<u8>>) -> Self {
        Self::new(ShaderStage::Vertex, source, "vs_main")
    }

    /// Create a fragment shader source with the default `fs_main` entry point.
    pub fn fragment(source: impl Into<Vec<u8>>) -> Self {
        Self::new(ShaderStage::Fragment, source, "fs_main")
    }

    /// Override the entry point.
    #[must_use]
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }
}

/// Descriptor for program creation.
#[derive(Debug, Clone)]
pub struct ProgramDescriptor {
    /// Optional debug label.
    pub label: Option<String>,

    /// Vertex stage source.
    pub vertex: ShaderSource,

    /// Fragment stage source.
    pub fragment: ShaderSource,
}

impl ProgramDescriptor {
    /// Create a descriptor from a vertex and a fragment source.
    pub fn new(vertex: ShaderSource, fragment: ShaderSource) -> Self {
        debug_assert!(vertex.stage == ShaderStage::Vertex);
        debug_assert!(fragment.stage == ShaderStage::Fragment);
        Self {
            label: None,
            vertex,
            fragment,
        }
    }

    /// Set a debug label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Process-unique program identity.
///
/// Distinct from [`ProgramHandle`]: the handle names the backend object,
/// the id names the program for routing purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(u64);

impl ProgramId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value, useful for logging.
    #[inline]
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ProgramId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "program#{}", self.0)
    }
}

/// A compiled shader program.
///
/// Created through [`Program::new`] and shared as `Arc<Program>`; program
/// nodes in the scene hold strong references, render passes hold weak ones.
#[derive(Debug)]
pub struct Program {
    id: ProgramId,
    handle: ProgramHandle,
    label: Option<String>,
}

impl Program {
    /// Compile a program through the given context.
    pub fn new(
        context: &dyn Context,
        descriptor: ProgramDescriptor,
    ) -> Result<Arc<Self>, RenderError> {
        let handle = context.create_program(&descriptor)?;
        let id = ProgramId::next();
        log::trace!(
            "created {} ({:?}) on {}",
            id,
            descriptor.label,
            context.name()
        );
        Ok(Arc::new(Self {
            id,
            handle,
            label: descriptor.label,
        }))
    }

    /// Compile a program from the context's fallback shaders.
    pub fn from_default_shaders(context: &dyn Context) -> Result<Arc<Self>, RenderError> {
        let descriptor = ProgramDescriptor::new(
            context.default_shader(ShaderStage::Vertex),
            context.default_shader(ShaderStage::Fragment),
        )
        .with_label("default");
        Self::new(context, descriptor)
    }

    /// Routing identity of this program.
    #[inline]
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Backend object handle.
    #[inline]
    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// Debug label, if any.
    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}
