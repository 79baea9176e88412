//! Aggregated material state.
//!
//! An [`AggregatedMaterial`] is the parameter sink one renderable's
//! aggregation pass writes into. Writes are gated: the first write to an
//! alias within a pass wins and later writes are ignored, so when the
//! node chain is walked nearest-first, a nearby material shadows its
//! ancestors while ancestors still fill the slots the nearby one left
//! unset.
//!
//! Materials are identity-keyed. Two aggregated materials never share a
//! [`MaterialId`], and the routing layer uses the id to give each material
//! its own render queue.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::params::{Alias, ParamSet, ParamValue};

/// Process-unique material identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(u64);

impl MaterialId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value, useful for logging.
    #[inline]
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "material#{}", self.0)
    }
}

#[derive(Debug, Default)]
struct MaterialState {
    params: ParamSet,
    // One gate per alias ever written; entries are re-armed by
    // reset_states instead of reallocated every pass.
    written: Vec<(Alias, bool)>,
}

/// Parameter sink with once-per-pass write gates.
///
/// Shared as `Arc<AggregatedMaterial>` between the aggregated node that
/// owns it and the render queue that binds it; the queue holds a weak
/// reference and skips itself once the owner is gone.
#[derive(Debug)]
pub struct AggregatedMaterial {
    id: MaterialId,
    state: Mutex<MaterialState>,
}

impl AggregatedMaterial {
    /// Creates an empty material with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: MaterialId::next(),
            state: Mutex::new(MaterialState::default()),
        }
    }

    /// Identity of this material.
    #[inline]
    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// Writes `value` under `alias` if the alias has not been written in
    /// the current pass. Returns whether the write landed.
    pub fn set(&self, alias: Alias, value: ParamValue) -> bool {
        let mut state = self.state.lock();
        if let Some(gate) = state.written.iter_mut().find(|(a, _)| *a == alias) {
            if gate.1 {
                log::trace!("{}: skipping shadowed write to {}", self.id, alias);
                return false;
            }
            gate.1 = true;
        } else {
            state.written.push((alias.clone(), true));
        }
        state.params.set(alias, value);
        true
    }

    /// Re-arms every write gate for the next pass.
    ///
    /// Parameter values persist; only the gates reset, so a pass that
    /// writes nothing leaves the previous values bound.
    pub fn reset_states(&self) {
        let mut state = self.state.lock();
        for gate in state.written.iter_mut() {
            gate.1 = false;
        }
    }

    /// Current value under `alias`.
    pub fn get(&self, alias: &Alias) -> Option<ParamValue> {
        self.state.lock().params.get(alias).cloned()
    }

    /// Snapshot of all parameters, used when binding the material.
    pub fn params(&self) -> ParamSet {
        self.state.lock().params.clone()
    }

    /// Number of parameters currently held.
    pub fn len(&self) -> usize {
        self.state.lock().params.len()
    }

    /// Whether no parameter has ever been written.
    pub fn is_empty(&self) -> bool {
        self.state.lock().params.is_empty()
    }
}

impl Default for AggregatedMaterial {
    fn default() -> Self {
        Self::new()
    }
}
