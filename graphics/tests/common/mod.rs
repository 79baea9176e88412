//! Shared helpers for the pipeline integration tests.

use std::sync::Arc;

use aster_core::math::{mat4_from_translation, mat4_to_array, Vec3, IDENTITY_MATRIX};
use aster_graphics::backend::headless::{HeadlessContext, TraceOp};
use aster_graphics::command::{QueueMode, VertexCommand};
use aster_graphics::materials::{Alias, MaterialId, ParamSet, ParamValue};
use aster_graphics::mesh::MeshData;
use aster_graphics::program::Program;
use aster_graphics::scene::{NodeId, SceneGraph};

/// Routes test logging through `env_logger` once per binary.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Identity transform as a column-major array.
pub fn identity() -> [f32; 16] {
    IDENTITY_MATRIX
}

/// Translation transform as a column-major array.
pub fn translation(x: f32, y: f32, z: f32) -> [f32; 16] {
    mat4_to_array(&mat4_from_translation(Vec3::new(x, y, z)))
}

/// One triangle's worth of GPU-ready geometry.
pub fn triangle_command(ctx: &HeadlessContext) -> Arc<VertexCommand> {
    let mesh = MeshData::from_positions(&[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
        .with_label("test triangle");
    VertexCommand::new(ctx, &mesh).expect("triangle geometry is valid")
}

/// Node ids of one renderable chain,
/// program -> material -> position -> mesh.
pub struct Chain {
    pub root: NodeId,
    #[allow(dead_code)]
    pub material: NodeId,
    pub position: NodeId,
    pub mesh: NodeId,
}

/// Builds the minimal drawable chain under a fresh program node.
pub fn build_chain(scene: &mut SceneGraph, ctx: &HeadlessContext, mode: QueueMode) -> Chain {
    let program = Program::from_default_shaders(ctx).expect("headless program creation");
    let root = scene.add_program(program, None);

    let mut params = ParamSet::new();
    params.set(Alias::DiffuseColor, ParamValue::Vec4([1.0, 1.0, 1.0, 1.0]));
    let material = scene.add_material(params, Some(root));

    let position = scene.add_position(identity(), Some(material));
    let mesh = scene.add_mesh(vec![triangle_command(ctx)], mode, Some(position));

    Chain {
        root,
        material,
        position,
        mesh,
    }
}

/// Number of draw calls in a trace.
pub fn draw_count(trace: &[TraceOp]) -> usize {
    trace
        .iter()
        .filter(|op| matches!(op, TraceOp::Draw { .. }))
        .count()
}

/// Material binds in trace order.
pub fn bound_materials(trace: &[TraceOp]) -> Vec<MaterialId> {
    trace
        .iter()
        .filter_map(|op| match op {
            TraceOp::BindMaterial { id, .. } => Some(*id),
            _ => None,
        })
        .collect()
}

/// Parameter counts of material binds, in trace order.
pub fn bound_material_params(trace: &[TraceOp]) -> Vec<usize> {
    trace
        .iter()
        .filter_map(|op| match op {
            TraceOp::BindMaterial { params, .. } => Some(*params),
            _ => None,
        })
        .collect()
}
