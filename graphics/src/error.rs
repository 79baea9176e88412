//! Rendering error types.

use std::fmt;

/// Errors that can occur in the rendering core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Failed to create a backend resource.
    ResourceCreation(String),
    /// Mesh data is malformed (empty buffers, stride mismatch).
    InvalidMesh(String),
    /// A renderable chain is mis-layered.
    InvalidChain(String),
    /// The operation graph contains a dependency cycle.
    CyclicDependency(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceCreation(msg) => write!(f, "resource creation failed: {msg}"),
            Self::InvalidMesh(msg) => write!(f, "invalid mesh data: {msg}"),
            Self::InvalidChain(msg) => write!(f, "invalid render chain: {msg}"),
            Self::CyclicDependency(msg) => write!(f, "cyclic dependency: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}
