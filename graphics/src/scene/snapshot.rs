//! Path snapshots.
//!
//! A [`SubtypeSnapshot`] records, for each subtype, the last node of that
//! subtype seen on the walk from a root down to a renderable. It is both
//! the input to aggregation (which entries contribute) and the cache key
//! of aggregation results: equality is exact entry equality, handle
//! generations included, so any topology change along the path yields a
//! different snapshot and therefore a rebuild.

use super::node::Subtype;
use super::NodeId;

/// Sorted-by-subtype map of the last-seen node per subtype.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubtypeSnapshot {
    entries: Vec<(Subtype, NodeId)>,
}

impl SubtypeSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `id` as the last-seen node of `subtype`, replacing any
    /// previous entry for that subtype.
    pub fn set(&mut self, subtype: Subtype, id: NodeId) {
        match self.entries.binary_search_by(|(s, _)| s.cmp(&subtype)) {
            Ok(found) => self.entries[found].1 = id,
            Err(insert_at) => self.entries.insert(insert_at, (subtype, id)),
        }
    }

    /// The last-seen node of `subtype`, if any.
    pub fn get(&self, subtype: &Subtype) -> Option<NodeId> {
        self.entries
            .binary_search_by(|(s, _)| s.cmp(subtype))
            .ok()
            .map(|found| self.entries[found].1)
    }

    /// Entries in ascending subtype order.
    pub fn iter(&self) -> impl Iterator<Item = &(Subtype, NodeId)> {
        self.entries.iter()
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
