//! End-to-end pipeline tests against the headless context.
//!
//! Every test drives the public surface only: build a scene, update a
//! target (or a whole render path), draw, then assert on the exact call
//! sequence the headless context recorded. Material identity across
//! frames is observed through the bound `MaterialId`s, since each
//! aggregated bundle owns a freshly allocated material.

mod common;

use std::sync::Arc;

use rstest::rstest;

use common::{
    bound_material_params, bound_materials, build_chain, draw_count, identity, init_logging,
    translation, triangle_command,
};

use aster_graphics::backend::headless::{HeadlessContext, TraceOp};
use aster_graphics::command::QueueMode;
use aster_graphics::error::RenderError;
use aster_graphics::materials::{Alias, ParamSet, ParamValue};
use aster_graphics::path::RenderPath;
use aster_graphics::program::Program;
use aster_graphics::scene::{AggregatedGroup, SceneGraph, UpdateContext};
use aster_graphics::surface::{OffscreenSurface, Surface};
use aster_graphics::target::RenderTarget;
use aster_graphics::window::RenderWindow;

// ============================================================================
// Cache lifecycle
// ============================================================================

/// Two unchanged frames reuse the cached bundle; moving the position
/// replaces it with a new one while the group keeps exactly one entry.
#[test]
fn cache_reuse_and_dirty_invalidation() {
    init_logging();
    let headless = Arc::new(HeadlessContext::new());
    let mut scene = SceneGraph::new();
    let chain = build_chain(&mut scene, &headless, QueueMode::Static);
    let target = RenderTarget::new(headless.clone(), 64, 64);
    target.add_root(chain.root);

    target.update(&scene);
    headless.take_trace();
    target.draw();
    let first = bound_materials(&headless.take_trace());
    assert_eq!(first.len(), 1);

    target.update(&scene);
    target.draw();
    let second = bound_materials(&headless.take_trace());
    assert_eq!(second, first);
    assert_eq!(target.group().len(), 1);

    assert!(scene.set_position_matrix(chain.position, translation(2.0, 0.0, 0.0)));
    target.update(&scene);
    target.draw();
    let third = bound_materials(&headless.take_trace());
    assert_eq!(third.len(), 1);
    assert_ne!(third, first);
    assert_eq!(target.group().len(), 1);
}

/// Removing a renderable's subtree withdraws its bundle from the
/// target's group.
#[test]
fn removed_renderables_leave_the_group() {
    init_logging();
    let headless = Arc::new(HeadlessContext::new());
    let mut scene = SceneGraph::new();
    let chain = build_chain(&mut scene, &headless, QueueMode::Static);
    let target = RenderTarget::new(headless.clone(), 64, 64);
    target.add_root(chain.root);

    target.update(&scene);
    assert_eq!(target.group().len(), 1);

    scene.remove_subtree(chain.mesh);
    assert_eq!(target.group().len(), 0);
}

// ============================================================================
// Aggregation
// ============================================================================

/// Along a three-material chain the nearest writer's value survives;
/// later (farther) writers are gated off.
#[test]
fn ambient_color_keeps_the_first_writers_value() {
    init_logging();
    let headless = HeadlessContext::new();
    let mut scene = SceneGraph::new();
    let program = Program::from_default_shaders(&headless).unwrap();
    let root = scene.add_program(program, None);

    let red = ParamValue::Vec4([1.0, 0.0, 0.0, 1.0]);
    let green = ParamValue::Vec4([0.0, 1.0, 0.0, 1.0]);
    let blue = ParamValue::Vec4([0.0, 0.0, 1.0, 1.0]);

    let mut params = ParamSet::new();
    params.set(Alias::AmbientColor, red);
    let farthest = scene.add_material(params, Some(root));

    let mut params = ParamSet::new();
    params.set(Alias::AmbientColor, green);
    let middle = scene.add_material(params, Some(farthest));

    let mut params = ParamSet::new();
    params.set(Alias::AmbientColor, blue.clone());
    let nearest = scene.add_material(params, Some(middle));

    let position = scene.add_position(identity(), Some(nearest));
    scene.add_mesh(
        vec![triangle_command(&headless)],
        QueueMode::Static,
        Some(position),
    );

    let group = Arc::new(AggregatedGroup::new());
    let mut filed = Vec::new();
    let mut cx = UpdateContext {
        group: &group,
        filed: &mut filed,
    };
    scene.update(root, &mut cx);

    assert_eq!(filed.len(), 1);
    let material = filed[0].0.material();
    assert_eq!(material.get(&Alias::AmbientColor), Some(blue));
}

// ============================================================================
// Queue routing
// ============================================================================

/// Updating twice without drawing files the same command twice; static
/// queues absorb the duplicate, dynamic queues keep both.
#[rstest]
#[case::static_mode(QueueMode::Static, 1)]
#[case::dynamic_mode(QueueMode::Dynamic, 2)]
fn double_filing_is_deduplicated_by_queue_mode(
    #[case] mode: QueueMode,
    #[case] expected_draws: usize,
) {
    init_logging();
    let headless = Arc::new(HeadlessContext::new());
    let mut scene = SceneGraph::new();
    let chain = build_chain(&mut scene, &headless, mode);
    let target = RenderTarget::new(headless.clone(), 64, 64);
    target.add_root(chain.root);

    target.update(&scene);
    target.update(&scene);
    headless.take_trace();
    target.draw();

    assert_eq!(draw_count(&headless.take_trace()), expected_draws);
}

/// Two renderables sharing a program but not a material land in one
/// pass with two queues: one program bind, two material binds.
#[test]
fn shared_programs_route_into_one_pass() {
    init_logging();
    let headless = Arc::new(HeadlessContext::new());
    let mut scene = SceneGraph::new();
    let program = Program::from_default_shaders(&*headless).unwrap();
    let root = scene.add_program(program, None);

    for opacity in [0.25, 0.75] {
        let mut params = ParamSet::new();
        params.set(Alias::Opacity, ParamValue::Float(opacity));
        let material = scene.add_material(params, Some(root));
        let position = scene.add_position(identity(), Some(material));
        scene.add_mesh(
            vec![triangle_command(&headless)],
            QueueMode::Static,
            Some(position),
        );
    }

    let target = RenderTarget::new(headless.clone(), 64, 64);
    target.add_root(root);
    target.update(&scene);
    headless.take_trace();
    target.draw();

    let trace = headless.take_trace();
    let programs = trace
        .iter()
        .filter(|op| matches!(op, TraceOp::BindProgram { .. }))
        .count();
    assert_eq!(programs, 1);
    assert_eq!(target.command_group().pass_count(), 1);
    assert_eq!(bound_materials(&trace).len(), 2);
    assert_eq!(draw_count(&trace), 2);
}

/// Within a pass, static queues draw before dynamic ones even when the
/// dynamic renderable was filed first.
#[test]
fn static_queues_draw_before_dynamic_queues() {
    init_logging();
    let headless = Arc::new(HeadlessContext::new());
    let mut scene = SceneGraph::new();
    let program = Program::from_default_shaders(&*headless).unwrap();
    let root = scene.add_program(program, None);

    // Dynamic branch first in tree order, with two authored params.
    let mut params = ParamSet::new();
    params.set(Alias::Opacity, ParamValue::Float(0.5));
    params.set(Alias::DiffuseColor, ParamValue::Vec4([1.0, 0.0, 0.0, 1.0]));
    let dynamic_material = scene.add_material(params, Some(root));
    let position = scene.add_position(identity(), Some(dynamic_material));
    scene.add_mesh(
        vec![triangle_command(&headless)],
        QueueMode::Dynamic,
        Some(position),
    );

    // Static branch second, with one authored param.
    let mut params = ParamSet::new();
    params.set(Alias::Opacity, ParamValue::Float(1.0));
    let static_material = scene.add_material(params, Some(root));
    let position = scene.add_position(identity(), Some(static_material));
    scene.add_mesh(
        vec![triangle_command(&headless)],
        QueueMode::Static,
        Some(position),
    );

    let target = RenderTarget::new(headless.clone(), 64, 64);
    target.add_root(root);
    target.update(&scene);
    headless.take_trace();
    target.draw();

    // Authored params plus the model matrix: static binds 2, dynamic 3.
    let params = bound_material_params(&headless.take_trace());
    assert_eq!(params, vec![2, 3]);
}

// ============================================================================
// Determinism
// ============================================================================

/// Two unchanged frames of a static scene produce byte-identical call
/// sequences.
#[test]
fn unchanged_frames_trace_identically() {
    init_logging();
    let headless = Arc::new(HeadlessContext::new());
    let mut scene = SceneGraph::new();
    let chain = build_chain(&mut scene, &headless, QueueMode::Static);
    let target = RenderTarget::new(headless.clone(), 128, 128);
    target.add_root(chain.root);

    target.update(&scene);
    headless.take_trace();
    target.draw();
    let first = headless.take_trace();

    target.update(&scene);
    target.draw();
    let second = headless.take_trace();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

// ============================================================================
// Render path
// ============================================================================

/// A two-target path runs both targets to completion, dependency first.
#[test]
fn path_draws_dependent_targets() {
    init_logging();
    let ctx_a = Arc::new(HeadlessContext::new());
    let ctx_b = Arc::new(HeadlessContext::new());
    let mut scene = SceneGraph::new();
    let chain = build_chain(&mut scene, &ctx_a, QueueMode::Static);

    let target_a = Arc::new(RenderTarget::new(ctx_a.clone(), 64, 64));
    let target_b = Arc::new(RenderTarget::new(ctx_b.clone(), 32, 32));
    target_a.add_root(chain.root);
    target_b.add_root(chain.root);

    let mut path = RenderPath::with_threads(2);
    let a = path.add_operation(target_a.clone(), &[]);
    let b = path.add_operation(target_b.clone(), &[a]);
    path.label_operation(b, "offscreen mirror");

    path.draw(&scene).unwrap();

    assert_eq!(target_a.frame(), 1);
    assert_eq!(target_b.frame(), 1);
    assert_eq!(draw_count(&ctx_a.take_trace()), 1);
    assert_eq!(draw_count(&ctx_b.take_trace()), 1);
}

/// A cycle wired after construction fails the frame without running
/// any operation.
#[test]
fn cyclic_paths_report_instead_of_running() {
    init_logging();
    let ctx = Arc::new(HeadlessContext::new());
    let scene = SceneGraph::new();
    let target_a = Arc::new(RenderTarget::new(ctx.clone(), 16, 16));
    let target_b = Arc::new(RenderTarget::new(ctx.clone(), 16, 16));

    let mut path = RenderPath::with_threads(2);
    let a = path.add_operation(target_a.clone(), &[]);
    let b = path.add_operation(target_b.clone(), &[a]);
    path.add_dependency(a, b);

    let result = path.draw(&scene);
    assert!(matches!(result, Err(RenderError::CyclicDependency(_))));
    assert_eq!(target_a.frame(), 0);
    assert_eq!(target_b.frame(), 0);
}

// ============================================================================
// Windows
// ============================================================================

/// A resize event flows through the window into the viewport the
/// backend sees on the next frame.
#[test]
fn window_resize_reaches_the_backend_viewport() {
    init_logging();
    let headless = Arc::new(HeadlessContext::new());
    let surface = Arc::new(OffscreenSurface::new(320, 200));
    let window = RenderWindow::new(headless.clone(), surface.clone());
    window.set_debounce_ms(0);

    let mut scene = SceneGraph::new();
    let chain = build_chain(&mut scene, &headless, QueueMode::Static);
    window.target().add_root(chain.root);

    window.handle_resize_event(640, 480);
    window.update(&scene);
    headless.take_trace();
    window.draw();

    let trace = headless.take_trace();
    assert!(trace.contains(&TraceOp::BindViewport {
        width: 640.0,
        height: 480.0
    }));
    assert_eq!(draw_count(&trace), 1);
    assert_eq!(surface.size(), (640, 480));
}
