//! Render queues.
//!
//! A queue collects the render commands drawn with one aggregated
//! material. Binding happens once per queue per pass: the material's
//! parameters first, then every live command.
//!
//! Two families exist. [`StaticRenderQueue`] holds commands that persist
//! across frames; filing the same command again is a no-op and expired
//! commands are pruned as they are encountered. [`DynamicRenderQueue`]
//! is rebuilt every frame: filing appends unconditionally (duplicates
//! draw twice) and the pass clears it after drawing.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::backend::Context;
use crate::command::RenderCommand;
use crate::materials::{AggregatedMaterial, MaterialId};

/// Queue whose contents persist across frames.
#[derive(Debug)]
pub struct StaticRenderQueue {
    material: Weak<AggregatedMaterial>,
    material_id: MaterialId,
    commands: Mutex<Vec<Weak<RenderCommand>>>,
}

impl StaticRenderQueue {
    /// Creates an empty queue for `material`.
    pub fn new(material: &Arc<AggregatedMaterial>) -> Self {
        Self {
            material: Arc::downgrade(material),
            material_id: material.id(),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Identity of the material this queue binds.
    #[inline]
    pub fn material_id(&self) -> MaterialId {
        self.material_id
    }

    /// Whether the queue's material has been dropped. Material ids are
    /// never reused, so an expired queue can never be filed into again.
    pub fn is_expired(&self) -> bool {
        self.material.strong_count() == 0
    }

    /// Files a command. Expired entries are pruned; filing a command
    /// already present is a no-op.
    pub fn add(&self, command: &Arc<RenderCommand>) {
        debug_assert_eq!(command.material_id(), self.material_id);
        let mut commands = self.commands.lock();
        commands.retain(|entry| entry.upgrade().is_some());

        let incoming = Arc::downgrade(command);
        if commands.iter().any(|entry| Weak::ptr_eq(entry, &incoming)) {
            return;
        }
        commands.push(incoming);
    }

    /// Number of live commands.
    pub fn len(&self) -> usize {
        self.commands
            .lock()
            .iter()
            .filter(|entry| entry.upgrade().is_some())
            .count()
    }

    /// Whether no live command is filed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Binds the material and draws every live command.
    pub fn draw(&self, context: &dyn Context) {
        let Some(material) = self.material.upgrade() else {
            log::trace!("skipping queue for dropped {}", self.material_id);
            return;
        };
        context.bind_material(self.material_id, &material.params());

        let live: Vec<Arc<RenderCommand>> = {
            let mut commands = self.commands.lock();
            commands.retain(|entry| entry.upgrade().is_some());
            commands.iter().filter_map(Weak::upgrade).collect()
        };
        for command in live {
            command.draw(context);
        }
    }
}

/// Queue rebuilt from scratch every frame.
#[derive(Debug)]
pub struct DynamicRenderQueue {
    material: Weak<AggregatedMaterial>,
    material_id: MaterialId,
    commands: Mutex<Vec<Weak<RenderCommand>>>,
}

impl DynamicRenderQueue {
    /// Creates an empty queue for `material`.
    pub fn new(material: &Arc<AggregatedMaterial>) -> Self {
        Self {
            material: Arc::downgrade(material),
            material_id: material.id(),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Identity of the material this queue binds.
    #[inline]
    pub fn material_id(&self) -> MaterialId {
        self.material_id
    }

    /// Whether the queue's material has been dropped.
    pub fn is_expired(&self) -> bool {
        self.material.strong_count() == 0
    }

    /// Files a command unconditionally; a command filed twice draws
    /// twice this frame.
    pub fn add(&self, command: &Arc<RenderCommand>) {
        debug_assert_eq!(command.material_id(), self.material_id);
        self.commands.lock().push(Arc::downgrade(command));
    }

    /// Number of filed entries, dead ones included.
    pub fn len(&self) -> usize {
        self.commands.lock().len()
    }

    /// Whether nothing is filed.
    pub fn is_empty(&self) -> bool {
        self.commands.lock().is_empty()
    }

    /// Empties the queue, keeping the allocation for the next frame.
    pub fn clear(&self) {
        self.commands.lock().clear();
    }

    /// Binds the material and draws every live command.
    pub fn draw(&self, context: &dyn Context) {
        let Some(material) = self.material.upgrade() else {
            log::trace!("skipping queue for dropped {}", self.material_id);
            return;
        };
        context.bind_material(self.material_id, &material.params());

        let live: Vec<Arc<RenderCommand>> =
            self.commands.lock().iter().filter_map(Weak::upgrade).collect();
        for command in live {
            command.draw(context);
        }
    }
}

static_assertions::assert_impl_all!(StaticRenderQueue: Send, Sync);
static_assertions::assert_impl_all!(DynamicRenderQueue: Send, Sync);
