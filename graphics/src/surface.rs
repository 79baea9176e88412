//! Presentation seam.
//!
//! The renderer never talks to a windowing system directly. A window
//! integration implements [`Surface`] and hands it to
//! [`RenderWindow`](crate::window::RenderWindow); the renderer only ever
//! asks for the drawable size and pushes size changes back through
//! [`Surface::resize`].

use std::fmt;

use parking_lot::Mutex;

/// A drawable destination owned by the presentation layer.
pub trait Surface: fmt::Debug + Send + Sync {
    /// Debug label used in log messages.
    fn label(&self) -> &str;

    /// Current drawable size in pixels.
    fn size(&self) -> (u32, u32);

    /// Reconfigures the drawable for a new size.
    fn resize(&self, width: u32, height: u32);
}

/// Surface with no presentation behind it.
///
/// Stands in for a real window in tests and GPU-less runs; it just
/// remembers the size it was given.
#[derive(Debug)]
pub struct OffscreenSurface {
    label: String,
    size: Mutex<(u32, u32)>,
}

impl OffscreenSurface {
    /// Creates an offscreen surface with the given initial size.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_label("offscreen", width, height)
    }

    /// Creates an offscreen surface with a custom label.
    pub fn with_label(label: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            label: label.into(),
            size: Mutex::new((width.max(1), height.max(1))),
        }
    }
}

impl Surface for OffscreenSurface {
    fn label(&self) -> &str {
        &self.label
    }

    fn size(&self) -> (u32, u32) {
        *self.size.lock()
    }

    fn resize(&self, width: u32, height: u32) {
        let size = (width.max(1), height.max(1));
        log::trace!("surface {}: resized to {}x{}", self.label, size.0, size.1);
        *self.size.lock() = size;
    }
}

static_assertions::assert_impl_all!(OffscreenSurface: Send, Sync);
