//! Window-backed render targets with debounced resizing.
//!
//! During a drag-resize the OS delivers resize events far faster than a
//! viewport should be reconfigured. [`ResizeDebounce`] buffers those
//! events and commits only the latest size once a quiet period elapses,
//! so a 500ms drag costs one reconfiguration instead of thirty.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::backend::Context;
use crate::scene::SceneGraph;
use crate::surface::Surface;
use crate::target::{Renderable, RenderTarget};
use crate::types::Viewport;

/// Buffers resize events until a quiet period elapses.
///
/// Later events replace earlier ones; only the newest size is ever
/// committed. Sizes are clamped to a minimum so a zero-size drawable
/// can never be configured.
#[derive(Debug)]
pub struct ResizeDebounce {
    pending: Option<(u32, u32)>,
    last_event: Instant,
    quiet_period: Duration,
    current: (u32, u32),
    min_size: (u32, u32),
}

impl ResizeDebounce {
    /// Creates a debouncer starting at `initial` size.
    pub fn new(initial: (u32, u32), quiet_ms: u64) -> Self {
        Self {
            pending: None,
            last_event: Instant::now(),
            quiet_period: Duration::from_millis(quiet_ms),
            current: initial,
            min_size: (1, 1),
        }
    }

    /// Sets the minimum size events are clamped to.
    pub fn set_min_size(&mut self, width: u32, height: u32) {
        self.min_size = (width.max(1), height.max(1));
    }

    /// Sets the quiet period.
    pub fn set_quiet_period(&mut self, quiet_ms: u64) {
        self.quiet_period = Duration::from_millis(quiet_ms);
    }

    /// Buffers one resize event. Events matching the pending or current
    /// size are ignored and do not restart the quiet period.
    pub fn push(&mut self, width: u32, height: u32) {
        let size = (width.max(self.min_size.0), height.max(self.min_size.1));
        if Some(size) == self.pending || size == self.current {
            return;
        }
        log::trace!(
            "resize pending: {}x{} (quiet period {}ms)",
            size.0,
            size.1,
            self.quiet_period.as_millis()
        );
        self.pending = Some(size);
        self.last_event = Instant::now();
    }

    /// Commits the pending size once the quiet period has elapsed.
    pub fn poll(&mut self) -> Option<(u32, u32)> {
        if self.pending.is_some() && self.last_event.elapsed() < self.quiet_period {
            return None;
        }
        self.commit()
    }

    /// Commits the pending size immediately, bypassing the quiet period.
    pub fn force(&mut self) -> Option<(u32, u32)> {
        self.commit()
    }

    fn commit(&mut self) -> Option<(u32, u32)> {
        let size = self.pending.take()?;
        log::trace!(
            "resize applied: {}x{} -> {}x{}",
            self.current.0,
            self.current.1,
            size.0,
            size.1
        );
        self.current = size;
        Some(size)
    }

    /// Whether a resize is buffered but not yet committed.
    pub fn is_resizing(&self) -> bool {
        self.pending.is_some()
    }

    /// The buffered size, if any.
    pub fn pending(&self) -> Option<(u32, u32)> {
        self.pending
    }

    /// The last committed size.
    pub fn current(&self) -> (u32, u32) {
        self.current
    }

    /// Drops the buffered size without committing it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// A render target bound to a presentation surface.
///
/// Resize events from the event loop go through
/// [`handle_resize_event`](RenderWindow::handle_resize_event). With
/// auto-resize on (the default) a committed size is applied at the next
/// update; callers that need the resize at a precise point instead call
/// [`apply_resize`](RenderWindow::apply_resize) themselves.
pub struct RenderWindow {
    target: RenderTarget,
    surface: Arc<dyn Surface>,
    resize: Mutex<ResizeDebounce>,
    auto_resize: AtomicBool,
}

/// Default quiet period for window resizes.
const DEFAULT_QUIET_MS: u64 = 50;

impl RenderWindow {
    /// Creates a window target sized to its surface.
    pub fn new(context: Arc<dyn Context>, surface: Arc<dyn Surface>) -> Self {
        let (width, height) = surface.size();
        log::info!(
            "created render window on surface {} ({}x{})",
            surface.label(),
            width,
            height
        );
        Self {
            target: RenderTarget::new(context, width, height),
            surface,
            resize: Mutex::new(ResizeDebounce::new((width, height), DEFAULT_QUIET_MS)),
            auto_resize: AtomicBool::new(true),
        }
    }

    /// The wrapped target; roots, viewport and clear are managed there.
    #[inline]
    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    /// The surface this window presents to.
    #[inline]
    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.surface
    }

    /// Feeds one resize event from the event loop.
    pub fn handle_resize_event(&self, width: u32, height: u32) {
        self.resize.lock().push(width, height);
    }

    /// Sets the resize quiet period.
    pub fn set_debounce_ms(&self, quiet_ms: u64) {
        self.resize.lock().set_quiet_period(quiet_ms);
    }

    /// Sets the minimum drawable size.
    pub fn set_min_size(&self, width: u32, height: u32) {
        self.resize.lock().set_min_size(width, height);
    }

    /// Whether committed resizes are applied automatically at update.
    pub fn set_auto_resize(&self, auto: bool) {
        self.auto_resize.store(auto, Ordering::Relaxed);
    }

    /// Whether a resize event is buffered.
    pub fn is_resizing(&self) -> bool {
        self.resize.lock().is_resizing()
    }

    /// The current drawable size the window renders at.
    pub fn size(&self) -> (u32, u32) {
        self.resize.lock().current()
    }

    /// Commits any pending resize immediately and applies it to the
    /// surface and viewport. Returns the applied size.
    pub fn apply_resize(&self) -> Option<(u32, u32)> {
        let size = self.resize.lock().force();
        if let Some((width, height)) = size {
            self.commit_resize(width, height);
        }
        size
    }

    fn commit_resize(&self, width: u32, height: u32) {
        self.surface.resize(width, height);
        self.target
            .set_viewport(Viewport::from_dimensions(width, height));
    }

    /// Update phase; applies a quiet-period-expired resize first when
    /// auto-resize is on.
    pub fn update(&self, scene: &SceneGraph) {
        if self.auto_resize.load(Ordering::Relaxed) {
            let size = self.resize.lock().poll();
            if let Some((width, height)) = size {
                self.commit_resize(width, height);
            }
        }
        self.target.update(scene);
    }

    /// Draw phase, delegated to the wrapped target.
    pub fn draw(&self) {
        self.target.draw();
    }
}

impl Renderable for RenderWindow {
    fn update(&self, scene: &SceneGraph) {
        RenderWindow::update(self, scene);
    }

    fn draw(&self) {
        RenderWindow::draw(self);
    }
}

static_assertions::assert_impl_all!(RenderWindow: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::HeadlessContext;
    use crate::surface::OffscreenSurface;
    use std::thread;

    #[test]
    fn events_are_buffered_until_the_quiet_period() {
        let mut debounce = ResizeDebounce::new((800, 600), 30);
        debounce.push(1024, 768);

        assert!(debounce.is_resizing());
        assert_eq!(debounce.poll(), None);
        assert_eq!(debounce.current(), (800, 600));

        thread::sleep(Duration::from_millis(40));
        assert_eq!(debounce.poll(), Some((1024, 768)));
        assert_eq!(debounce.current(), (1024, 768));
        assert!(!debounce.is_resizing());
    }

    #[test]
    fn the_latest_size_wins() {
        let mut debounce = ResizeDebounce::new((800, 600), 0);
        debounce.push(1024, 768);
        debounce.push(640, 480);

        assert_eq!(debounce.poll(), Some((640, 480)));
    }

    #[test]
    fn duplicate_events_are_ignored() {
        let mut debounce = ResizeDebounce::new((800, 600), 1000);
        debounce.push(800, 600);
        assert!(!debounce.is_resizing());

        debounce.push(1024, 768);
        let first_event = debounce.last_event;
        debounce.push(1024, 768);
        assert_eq!(debounce.last_event, first_event);
    }

    #[test]
    fn sizes_are_clamped_to_the_minimum() {
        let mut debounce = ResizeDebounce::new((800, 600), 0);
        debounce.set_min_size(64, 64);
        debounce.push(8, 1200);

        assert_eq!(debounce.poll(), Some((64, 1200)));
    }

    #[test]
    fn force_bypasses_the_quiet_period() {
        let mut debounce = ResizeDebounce::new((800, 600), 10_000);
        debounce.push(1024, 768);

        assert_eq!(debounce.poll(), None);
        assert_eq!(debounce.force(), Some((1024, 768)));
        assert_eq!(debounce.force(), None);
    }

    #[test]
    fn cancel_drops_the_pending_size() {
        let mut debounce = ResizeDebounce::new((800, 600), 0);
        debounce.push(1024, 768);
        debounce.cancel();

        assert_eq!(debounce.poll(), None);
        assert_eq!(debounce.current(), (800, 600));
    }

    #[test]
    fn auto_resize_applies_at_update() {
        let headless = Arc::new(HeadlessContext::new());
        let surface = Arc::new(OffscreenSurface::new(800, 600));
        let window = RenderWindow::new(headless, surface.clone());
        window.set_debounce_ms(0);

        window.handle_resize_event(1024, 768);
        window.update(&SceneGraph::new());

        assert_eq!(window.size(), (1024, 768));
        assert_eq!(surface.size(), (1024, 768));
        assert_eq!(window.target().viewport().width, 1024.0);
    }

    #[test]
    fn manual_mode_waits_for_apply_resize() {
        let headless = Arc::new(HeadlessContext::new());
        let surface = Arc::new(OffscreenSurface::new(800, 600));
        let window = RenderWindow::new(headless, surface.clone());
        window.set_debounce_ms(0);
        window.set_auto_resize(false);

        window.handle_resize_event(1024, 768);
        window.update(&SceneGraph::new());
        assert_eq!(surface.size(), (800, 600));

        assert_eq!(window.apply_resize(), Some((1024, 768)));
        assert_eq!(surface.size(), (1024, 768));
    }
}
