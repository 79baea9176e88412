//! Render passes.
//!
//! A [`RenderPass`] owns the queues drawn with one program. Queues are
//! keyed by material identity, so every command filed under the same
//! aggregated material shares one queue and one material bind.
//!
//! Drawing a pass draws all static queues first, then all dynamic
//! queues, each family in queue creation order. That ordering is part of
//! the contract: persistent geometry always lands before per-frame
//! geometry within a pass.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::backend::Context;
use crate::command::{QueueMode, RenderCommand};
use crate::materials::{AggregatedMaterial, MaterialId};
use crate::program::{Program, ProgramId};
use crate::queue::{DynamicRenderQueue, StaticRenderQueue};

#[derive(Debug, Default)]
struct PassQueues {
    static_order: Vec<Arc<StaticRenderQueue>>,
    static_by_material: HashMap<MaterialId, Arc<StaticRenderQueue>>,
    dynamic_order: Vec<Arc<DynamicRenderQueue>>,
    dynamic_by_material: HashMap<MaterialId, Arc<DynamicRenderQueue>>,
}

impl PassQueues {
    /// Drops queues whose material expired; those can never be filed
    /// into again. Returns how many were dropped.
    fn compact(&mut self) -> usize {
        let before = self.static_order.len() + self.dynamic_order.len();
        self.static_order.retain(|q| !q.is_expired());
        self.static_by_material.retain(|_, q| !q.is_expired());
        self.dynamic_order.retain(|q| !q.is_expired());
        self.dynamic_by_material.retain(|_, q| !q.is_expired());
        before - self.static_order.len() - self.dynamic_order.len()
    }
}

/// Queues for one program, grouped by material.
#[derive(Debug)]
pub struct RenderPass {
    program: Weak<Program>,
    program_id: ProgramId,
    queues: Mutex<PassQueues>,
}

impl RenderPass {
    /// Creates an empty pass for `program`.
    pub fn new(program: &Arc<Program>) -> Self {
        Self {
            program: Arc::downgrade(program),
            program_id: program.id(),
            queues: Mutex::new(PassQueues::default()),
        }
    }

    /// Routing identity of the pass program.
    #[inline]
    pub fn program_id(&self) -> ProgramId {
        self.program_id
    }

    /// The pass program, if still alive.
    pub fn program(&self) -> Option<Arc<Program>> {
        self.program.upgrade()
    }

    /// Whether the pass program has been dropped. Program ids are never
    /// reused, so an expired pass can never be filed into again.
    pub fn is_expired(&self) -> bool {
        self.program.strong_count() == 0
    }

    /// Files a command into the queue for its material, creating the
    /// queue on first use.
    pub fn add_render_command(
        &self,
        material: &Arc<AggregatedMaterial>,
        command: &Arc<RenderCommand>,
        mode: QueueMode,
    ) {
        let material_id = material.id();
        let mut queues = self.queues.lock();
        match mode {
            QueueMode::Static => {
                let queue = match queues.static_by_material.get(&material_id) {
                    Some(queue) => queue.clone(),
                    None => {
                        log::trace!("{}: new static queue for {}", self.program_id, material_id);
                        let queue = Arc::new(StaticRenderQueue::new(material));
                        queues.static_order.push(queue.clone());
                        queues.static_by_material.insert(material_id, queue.clone());
                        queue
                    }
                };
                queue.add(command);
            }
            QueueMode::Dynamic => {
                let queue = match queues.dynamic_by_material.get(&material_id) {
                    Some(queue) => queue.clone(),
                    None => {
                        log::trace!("{}: new dynamic queue for {}", self.program_id, material_id);
                        let queue = Arc::new(DynamicRenderQueue::new(material));
                        queues.dynamic_order.push(queue.clone());
                        queues.dynamic_by_material.insert(material_id, queue.clone());
                        queue
                    }
                };
                queue.add(command);
            }
        }
    }

    /// Number of static queues.
    pub fn static_queue_count(&self) -> usize {
        self.queues.lock().static_order.len()
    }

    /// Number of dynamic queues.
    pub fn dynamic_queue_count(&self) -> usize {
        self.queues.lock().dynamic_order.len()
    }

    /// Draws every queue: the static family first, then the dynamic one.
    ///
    /// Binding the pass program is the caller's business; this only
    /// issues material binds and draws. Queues orphaned by a rebuilt
    /// renderable are compacted away on the way in.
    pub fn draw(&self, context: &dyn Context) {
        let (static_queues, dynamic_queues) = {
            let mut queues = self.queues.lock();
            let dropped = queues.compact();
            if dropped > 0 {
                log::trace!("{}: dropped {} expired queues", self.program_id, dropped);
            }
            (queues.static_order.clone(), queues.dynamic_order.clone())
        };
        for queue in static_queues {
            queue.draw(context);
        }
        for queue in dynamic_queues {
            queue.draw(context);
        }
    }

    /// Empties every dynamic queue, keeping allocations.
    pub fn clear_dynamic(&self) {
        let queues = self.queues.lock();
        for queue in &queues.dynamic_order {
            queue.clear();
        }
    }
}

static_assertions::assert_impl_all!(RenderPass: Send, Sync);
