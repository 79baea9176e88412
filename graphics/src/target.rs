//! Render targets and the two-phase frame interface.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::Context;
use crate::command_group::RenderCommandGroup;
use crate::scene::{AggregatedGroup, NodeId, SceneGraph, UpdateContext};
use crate::types::{ClearValue, Viewport};

/// Anything the render path can schedule.
///
/// A frame runs in two phases per destination: `update` walks the scene
/// and refreshes what is filed for drawing, `draw` submits it to the
/// backend. The path never interleaves the two phases of one
/// destination, but different destinations may run on different threads.
pub trait Renderable: Send + Sync {
    /// Walks the scene and refreshes this destination's filed commands.
    fn update(&self, scene: &SceneGraph);

    /// Submits the filed commands to the backend.
    fn draw(&self);
}

/// A drawing destination with its own aggregation state.
///
/// Each target owns one [`AggregatedGroup`] (the membership of bundles
/// produced for it) and one [`RenderCommandGroup`] (the routed commands).
/// Statically filed commands persist across frames and stop drawing only
/// once their render command drops, which happens when the renderable
/// that cached it is rebuilt or removed.
pub struct RenderTarget {
    label: Option<String>,
    context: Arc<dyn Context>,
    viewport: Mutex<Viewport>,
    clear: Mutex<ClearValue>,
    roots: Mutex<Vec<NodeId>>,
    group: Mutex<Arc<AggregatedGroup>>,
    commands: Arc<RenderCommandGroup>,
    frame: AtomicU64,
}

impl RenderTarget {
    /// Creates a target drawing through `context` at the given size.
    pub fn new(context: Arc<dyn Context>, width: u32, height: u32) -> Self {
        log::info!("created render target {}x{}", width, height);
        Self {
            label: None,
            context,
            viewport: Mutex::new(Viewport::from_dimensions(width, height)),
            clear: Mutex::new(ClearValue::None),
            roots: Mutex::new(Vec::new()),
            group: Mutex::new(Arc::new(AggregatedGroup::new())),
            commands: Arc::new(RenderCommandGroup::new()),
            frame: AtomicU64::new(0),
        }
    }

    /// Attaches a debug label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Debug label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The backend this target draws through.
    #[inline]
    pub fn context(&self) -> &Arc<dyn Context> {
        &self.context
    }

    /// Registers a scene root to walk during update. Duplicates are
    /// ignored.
    pub fn add_root(&self, root: NodeId) {
        let mut roots = self.roots.lock();
        if !roots.contains(&root) {
            roots.push(root);
        }
    }

    /// Unregisters a scene root. Returns whether it was registered.
    pub fn remove_root(&self, root: NodeId) -> bool {
        let mut roots = self.roots.lock();
        let before = roots.len();
        roots.retain(|r| *r != root);
        roots.len() != before
    }

    /// The registered scene roots, in registration order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.roots.lock().clone()
    }

    /// Replaces the viewport.
    pub fn set_viewport(&self, viewport: Viewport) {
        *self.viewport.lock() = viewport;
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        *self.viewport.lock()
    }

    /// Sets the clear issued before drawing.
    pub fn set_clear(&self, clear: ClearValue) {
        *self.clear.lock() = clear;
    }

    /// Current clear value.
    pub fn clear_value(&self) -> ClearValue {
        *self.clear.lock()
    }

    /// The group bundles produced for this target register in.
    pub fn group(&self) -> Arc<AggregatedGroup> {
        self.group.lock().clone()
    }

    /// Swaps in a fresh, empty group.
    ///
    /// Cached bundles are not touched; each re-registers into the new
    /// group the next time its renderable is updated.
    pub fn reset_group(&self) {
        let fresh = Arc::new(AggregatedGroup::new());
        let old = std::mem::replace(&mut *self.group.lock(), fresh);
        log::debug!(
            "target {}: reset group, dropping {} memberships",
            self.label.as_deref().unwrap_or("unlabeled"),
            old.len()
        );
    }

    /// The command group this target draws.
    #[inline]
    pub fn command_group(&self) -> &Arc<RenderCommandGroup> {
        &self.commands
    }

    /// Frames completed so far. Wraps on overflow.
    pub fn frame(&self) -> u64 {
        self.frame.load(Ordering::Relaxed)
    }

    /// Update phase: walks every registered root and files what the
    /// walk reports into this target's command group.
    pub fn update(&self, scene: &SceneGraph) {
        let group = self.group.lock().clone();
        let roots = self.roots.lock().clone();

        let mut filed = Vec::new();
        for root in roots {
            let mut cx = UpdateContext {
                group: &group,
                filed: &mut filed,
            };
            scene.update(root, &mut cx);
        }

        let filed_count = filed.len();
        for (bundle, mode) in filed {
            self.commands.add_render_command(bundle.command(), mode);
        }

        let frame = self.frame.fetch_add(1, Ordering::Relaxed);
        log::trace!(
            "target {}: frame {} filed {} commands",
            self.label.as_deref().unwrap_or("unlabeled"),
            frame,
            filed_count
        );
    }

    /// Draw phase: activates the backend, applies viewport and clear,
    /// then draws the command group and flushes.
    pub fn draw(&self) {
        let context = self.context.as_ref();
        context.set_active(true);

        let viewport = *self.viewport.lock();
        context.bind_viewport(&viewport);

        if let Some(color) = self.clear.lock().as_rgba() {
            context.clear(color);
        }

        self.commands.draw(context);
        context.flush();
    }
}

impl Renderable for RenderTarget {
    fn update(&self, scene: &SceneGraph) {
        RenderTarget::update(self, scene);
    }

    fn draw(&self) {
        RenderTarget::draw(self);
    }
}

static_assertions::assert_impl_all!(RenderTarget: Send, Sync);
