//! # Aster Graphics
//!
//! Scene-driven rendering core built around per-subtype aggregation.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`scene`] - Arena-backed scene graph with dual tree links and the
//!   update walk that aggregates renderable chains into cached bundles
//! - [`RenderCommandGroup`] / [`RenderPass`] / render queues - routing of
//!   render commands by (program, material) into static and dynamic
//!   buckets
//! - [`RenderTarget`] / [`RenderWindow`] - per-destination update/draw
//!   phases, with debounced window resizing
//! - [`RenderPath`] - dependency-ordered multi-target frame driver
//! - [`backend`] - the `Context` seam a GPU backend implements, plus the
//!   headless implementation used in tests
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use aster_graphics::backend::create_context;
//! use aster_graphics::command::QueueMode;
//! use aster_graphics::mesh::MeshData;
//! use aster_graphics::command::VertexCommand;
//! use aster_graphics::program::Program;
//! use aster_graphics::scene::SceneGraph;
//! use aster_graphics::target::RenderTarget;
//! use aster_core::math::IDENTITY_MATRIX;
//!
//! let context = create_context();
//! let program = Program::from_default_shaders(context.as_ref()).unwrap();
//!
//! let mut scene = SceneGraph::new();
//! let root = scene.add_program(program, None);
//! let position = scene.add_position(IDENTITY_MATRIX, Some(root));
//! let mesh = MeshData::from_positions(&[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
//! let command = VertexCommand::new(context.as_ref(), &mesh).unwrap();
//! scene.add_mesh(vec![command], QueueMode::Static, Some(position));
//!
//! let target = RenderTarget::new(context, 640, 480);
//! target.add_root(root);
//! target.update(&scene);
//! target.draw();
//! ```

pub mod backend;
pub mod command;
pub mod command_group;
pub mod error;
pub mod materials;
pub mod mesh;
pub mod pass;
pub mod path;
pub mod program;
pub mod queue;
pub mod scene;
pub mod surface;
pub mod target;
pub mod types;
pub mod window;

// Re-export main types for convenience
pub use backend::{create_context, Context};
pub use command::{QueueMode, RenderCommand, VertexCommand};
pub use command_group::RenderCommandGroup;
pub use error::RenderError;
pub use materials::{AggregatedMaterial, Alias, MaterialId, ParamSet, ParamValue};
pub use mesh::MeshData;
pub use pass::RenderPass;
pub use path::{OpHandle, RenderPath};
pub use program::{Program, ProgramDescriptor, ProgramId, ShaderSource, ShaderStage};
pub use queue::{DynamicRenderQueue, StaticRenderQueue};
pub use scene::{NodeId, SceneGraph, Subtype, UpdateContext};
pub use surface::{OffscreenSurface, Surface};
pub use target::{Renderable, RenderTarget};
pub use types::{BufferUsage, ClearValue, IndexFormat, PrimitiveTopology, Viewport};
pub use window::RenderWindow;

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// This should be called before using any graphics functionality.
pub fn init() {
    log::info!("Aster Graphics v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn headless_context_is_the_fallback() {
        let context = create_context();
        assert_eq!(context.name(), "headless");
    }
}
