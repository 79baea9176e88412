//! Command groups.
//!
//! A [`RenderCommandGroup`] is the per-target root of the routing tree:
//! passes keyed by program identity, each pass holding material-keyed
//! queues. Filing a command walks program id then material id, creating
//! the pass and queue on first use, so the draw order of a frame is
//! fully determined by identities and filing history.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::Context;
use crate::command::{QueueMode, RenderCommand};
use crate::materials::{Alias, ParamSet, ParamValue};
use crate::pass::RenderPass;
use crate::program::ProgramId;

#[derive(Debug, Default)]
struct GroupPasses {
    order: Vec<Arc<RenderPass>>,
    by_program: HashMap<ProgramId, Arc<RenderPass>>,
}

impl GroupPasses {
    /// Drops passes whose program expired; those can never be filed
    /// into again. Returns how many were dropped.
    fn compact(&mut self) -> usize {
        let before = self.order.len();
        self.order.retain(|pass| !pass.is_expired());
        self.by_program.retain(|_, pass| !pass.is_expired());
        before - self.order.len()
    }
}

/// Per-target collection of passes, one per program.
#[derive(Debug, Default)]
pub struct RenderCommandGroup {
    label: Option<String>,
    params: Mutex<ParamSet>,
    passes: Mutex<GroupPasses>,
}

impl RenderCommandGroup {
    /// Creates an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty group with a debug label.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    /// Debug label, if any.
    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Sets a group-level constant bound once per pass draw.
    pub fn set_param(&self, alias: Alias, value: ParamValue) {
        self.params.lock().set(alias, value);
    }

    /// Snapshot of the group-level constants.
    pub fn params(&self) -> ParamSet {
        self.params.lock().clone()
    }

    /// Files a command into the pass for its program.
    ///
    /// The command's program and material must still be alive; filing is
    /// only reachable from aggregation, which holds both.
    pub fn add_render_command(self: &Arc<Self>, command: &Arc<RenderCommand>, mode: QueueMode) {
        let program = command
            .program()
            .expect("filing a render command whose program is gone");
        let material = command
            .material()
            .expect("filing a render command whose material is gone");

        let pass = {
            let mut passes = self.passes.lock();
            match passes.by_program.get(&program.id()) {
                Some(pass) => pass.clone(),
                None => {
                    log::trace!("{:?}: new pass for {}", self.label, program.id());
                    let pass = Arc::new(RenderPass::new(&program));
                    passes.order.push(pass.clone());
                    passes.by_program.insert(program.id(), pass.clone());
                    pass
                }
            }
        };
        pass.add_render_command(&material, command, mode);
        command.bind_parent_group(self);
    }

    /// Number of passes.
    pub fn pass_count(&self) -> usize {
        self.passes.lock().order.len()
    }

    /// Draws every pass, then clears the dynamic queues.
    ///
    /// Per pass: bind the program, bind group constants, draw the pass.
    /// Passes whose program is gone are compacted away on the way in.
    pub fn draw(&self, context: &dyn Context) {
        let passes = {
            let mut passes = self.passes.lock();
            let dropped = passes.compact();
            if dropped > 0 {
                log::trace!("{:?}: dropped {} expired passes", self.label, dropped);
            }
            passes.order.clone()
        };
        for pass in &passes {
            let Some(program) = pass.program() else {
                log::trace!("skipping pass for dropped {}", pass.program_id());
                continue;
            };
            context.bind_program(&program);
            {
                let params = self.params.lock();
                if !params.is_empty() {
                    context.bind_uniforms(&params);
                }
            }
            pass.draw(context);
        }
        for pass in &passes {
            pass.clear_dynamic();
        }
    }
}

static_assertions::assert_impl_all!(RenderCommandGroup: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::{HeadlessContext, TraceOp};
    use crate::command::VertexCommand;
    use crate::materials::AggregatedMaterial;
    use crate::mesh::MeshData;
    use crate::program::Program;

    fn test_command(
        ctx: &HeadlessContext,
        material: &Arc<AggregatedMaterial>,
        program: &Arc<Program>,
    ) -> Arc<RenderCommand> {
        let mesh = MeshData::from_positions(&[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let vertices = VertexCommand::new(ctx, &mesh).unwrap();
        let command = RenderCommand::new(vec![vertices], material);
        command.set_program(program);
        command
    }

    #[test]
    fn commands_sharing_a_program_share_a_pass() {
        let ctx = HeadlessContext::new();
        let group = Arc::new(RenderCommandGroup::new());
        let program = Program::from_default_shaders(&ctx).unwrap();

        let red = Arc::new(AggregatedMaterial::new());
        let blue = Arc::new(AggregatedMaterial::new());
        group.add_render_command(&test_command(&ctx, &red, &program), QueueMode::Static);
        group.add_render_command(&test_command(&ctx, &blue, &program), QueueMode::Static);

        assert_eq!(group.pass_count(), 1);
    }

    #[test]
    fn distinct_programs_get_distinct_passes() {
        let ctx = HeadlessContext::new();
        let group = Arc::new(RenderCommandGroup::new());
        let first = Program::from_default_shaders(&ctx).unwrap();
        let second = Program::from_default_shaders(&ctx).unwrap();

        let material = Arc::new(AggregatedMaterial::new());
        group.add_render_command(&test_command(&ctx, &material, &first), QueueMode::Static);
        group.add_render_command(&test_command(&ctx, &material, &second), QueueMode::Static);

        assert_eq!(group.pass_count(), 2);
    }

    #[test]
    fn filing_sets_the_parent_group() {
        let ctx = HeadlessContext::new();
        let group = Arc::new(RenderCommandGroup::new());
        let program = Program::from_default_shaders(&ctx).unwrap();
        let material = Arc::new(AggregatedMaterial::new());

        let command = test_command(&ctx, &material, &program);
        assert!(command.parent_group().is_none());

        group.add_render_command(&command, QueueMode::Static);
        assert!(Arc::ptr_eq(&command.parent_group().unwrap(), &group));
    }

    #[test]
    fn draw_binds_program_before_materials() {
        let ctx = HeadlessContext::new();
        let group = Arc::new(RenderCommandGroup::new());
        let program = Program::from_default_shaders(&ctx).unwrap();
        let material = Arc::new(AggregatedMaterial::new());
        let command = test_command(&ctx, &material, &program);
        group.add_render_command(&command, QueueMode::Static);
        ctx.take_trace();

        group.draw(&ctx);
        assert_eq!(
            ctx.take_trace(),
            vec![
                TraceOp::BindProgram { id: program.id() },
                TraceOp::BindMaterial {
                    id: material.id(),
                    params: 0,
                },
                TraceOp::Draw { elements: 3 },
            ]
        );
    }

    #[test]
    fn draw_compacts_passes_with_dropped_programs() {
        let ctx = HeadlessContext::new();
        let group = Arc::new(RenderCommandGroup::new());
        let dropped = Program::from_default_shaders(&ctx).unwrap();
        let kept = Program::from_default_shaders(&ctx).unwrap();
        let material = Arc::new(AggregatedMaterial::new());

        let first = test_command(&ctx, &material, &dropped);
        let second = test_command(&ctx, &material, &kept);
        group.add_render_command(&first, QueueMode::Static);
        group.add_render_command(&second, QueueMode::Static);
        assert_eq!(group.pass_count(), 2);
        drop(dropped);
        ctx.take_trace();

        group.draw(&ctx);
        let bound: Vec<ProgramId> = ctx
            .take_trace()
            .into_iter()
            .filter_map(|op| match op {
                TraceOp::BindProgram { id } => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(bound, vec![kept.id()]);
        assert_eq!(group.pass_count(), 1);
    }

    #[test]
    fn dynamic_commands_are_cleared_after_draw() {
        let ctx = HeadlessContext::new();
        let group = Arc::new(RenderCommandGroup::new());
        let program = Program::from_default_shaders(&ctx).unwrap();
        let material = Arc::new(AggregatedMaterial::new());
        let command = test_command(&ctx, &material, &program);
        group.add_render_command(&command, QueueMode::Dynamic);
        ctx.take_trace();

        group.draw(&ctx);
        let first_frame_draws = ctx
            .take_trace()
            .into_iter()
            .filter(|op| matches!(op, TraceOp::Draw { .. }))
            .count();
        assert_eq!(first_frame_draws, 1);

        // Not refiled, so the second frame draws nothing.
        group.draw(&ctx);
        let second_frame_draws = ctx
            .take_trace()
            .into_iter()
            .filter(|op| matches!(op, TraceOp::Draw { .. }))
            .count();
        assert_eq!(second_frame_draws, 0);
    }

    #[test]
    fn group_params_bind_after_the_program() {
        let ctx = HeadlessContext::new();
        let group = Arc::new(RenderCommandGroup::new());
        let program = Program::from_default_shaders(&ctx).unwrap();
        let material = Arc::new(AggregatedMaterial::new());
        let command = test_command(&ctx, &material, &program);
        group.add_render_command(&command, QueueMode::Static);
        group.set_param(Alias::Custom("time".into()), ParamValue::Float(0.016));
        ctx.take_trace();

        group.draw(&ctx);
        let trace = ctx.take_trace();
        assert_eq!(trace[0], TraceOp::BindProgram { id: program.id() });
        assert_eq!(trace[1], TraceOp::BindUniforms { params: 1 });
    }
}
