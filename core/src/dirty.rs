//! Thread-safe dirty flag.
//!
//! A [`DirtyFlag`] lets producer threads mark state as changed while a
//! consumer observes and resets the mark without locking. Marking uses a
//! Release store and reading an Acquire load, so writes made before
//! `mark()` are visible to whoever sees the flag set.

use std::sync::atomic::{AtomicBool, Ordering};

/// Atomic changed-state marker.
///
/// The usual protocol: mutation paths call [`mark`](Self::mark), the
/// consumer calls [`take`](Self::take) once per pass and rebuilds whatever
/// depended on the stale state.
#[derive(Debug)]
pub struct DirtyFlag {
    flag: AtomicBool,
}

impl DirtyFlag {
    /// Creates a flag with the given initial state.
    pub fn new(dirty: bool) -> Self {
        Self {
            flag: AtomicBool::new(dirty),
        }
    }

    /// Sets the flag.
    #[inline]
    pub fn mark(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether the flag is currently set.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Clears the flag.
    #[inline]
    pub fn clear(&self) {
        self.flag.store(false, Ordering::Release);
    }

    /// Clears the flag and returns whether it was set.
    #[inline]
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }
}

impl Default for DirtyFlag {
    /// A fresh flag starts dirty: nothing derived from the state exists yet.
    fn default() -> Self {
        Self::new(true)
    }
}
