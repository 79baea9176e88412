//! Generational arena for stable, invalidation-aware handles.
//!
//! Values live in slots addressed by [`Handle`]s. Each slot carries a
//! generation counter that is bumped when the slot's value is removed, so
//! a handle held across a remove (and any later reuse of the slot) simply
//! stops resolving instead of aliasing a new value.
//!
//! Removal returns the stored value to the caller. Anything that must be
//! told about the removal (caches, owning collections) is notified by the
//! caller's removal path, never by a drop impl.

use std::fmt;

/// Handle to a value stored in an [`Arena`].
///
/// Handles are cheap to copy and compare. A handle is only valid for the
/// arena that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Slot index inside the arena.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot had when this handle was issued.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Slot-based storage with generation-checked access.
///
/// Free slots are reused in LIFO order. `get` on a stale handle (one whose
/// slot was removed, possibly reused) returns `None`.
#[derive(Debug)]
pub struct Arena<T> {
    values: Vec<Option<T>>,
    generations: Vec<u32>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            generations: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Creates an empty arena with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            generations: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Stores a value and returns its handle.
    pub fn insert(&mut self, value: T) -> Handle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = index as usize;
            debug_assert!(self.values[slot].is_none(), "free slot holds a value");
            self.values[slot] = Some(value);
            Handle {
                index,
                generation: self.generations[slot],
            }
        } else {
            let index = self.values.len() as u32;
            self.values.push(Some(value));
            self.generations.push(0);
            Handle {
                index,
                generation: 0,
            }
        }
    }

    /// Removes the value behind `handle`, returning it.
    ///
    /// Returns `None` when the handle is stale or never belonged to this
    /// arena. The slot's generation is bumped, invalidating every
    /// outstanding handle to it.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        if !self.contains(handle) {
            return None;
        }
        let slot = handle.index as usize;
        let value = self.values[slot].take();
        debug_assert!(value.is_some());
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        value
    }

    /// Returns a reference to the value behind `handle`, if it is live.
    #[inline]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        if self.contains(handle) {
            self.values[handle.index as usize].as_ref()
        } else {
            None
        }
    }

    /// Returns a mutable reference to the value behind `handle`, if live.
    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        if self.contains(handle) {
            self.values[handle.index as usize].as_mut()
        } else {
            None
        }
    }

    /// Whether `handle` still resolves to a live value.
    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        let slot = handle.index as usize;
        slot < self.values.len()
            && self.generations[slot] == handle.generation
            && self.values[slot].is_some()
    }

    /// Number of live values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the arena holds no live values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every value and invalidates all outstanding handles.
    pub fn clear(&mut self) {
        for (slot, value) in self.values.iter_mut().enumerate() {
            if value.take().is_some() {
                self.generations[slot] = self.generations[slot].wrapping_add(1);
                self.free.push(slot as u32);
            }
        }
        self.len = 0;
    }

    /// Iterates over live `(Handle, &T)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(move |(index, value)| {
                value.as_ref().map(|v| {
                    (
                        Handle {
                            index: index as u32,
                            generation: self.generations[index],
                        },
                        v,
                    )
                })
            })
    }
}
