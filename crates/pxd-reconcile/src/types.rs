use pxd_schemas::{ConnectionRecord, TrafficSnapshot};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DisplayList
// ---------------------------------------------------------------------------

/// The reconciler's owned output: one slot per record in the latest
/// snapshot, in display order, plus the engine's global totals.
///
/// Length always equals the latest snapshot's record count. Consumers never
/// mutate this; they read a filtered/ordered projection of it each tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayList {
    pub records: Vec<ConnectionRecord>,
    pub upload_total: u64,
    pub download_total: u64,
}

impl DisplayList {
    /// The state at session start: no slots, zero totals.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Slot index of the record with `id`, if present.
    pub fn slot_of(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Stateful wrapper around [`reconcile`][crate::reconcile]: owns the
/// previous display list and feeds it back on every tick.
///
/// Exactly one writer may drive this (the session event loop); snapshots
/// must be applied in the order the transport delivered them or slot
/// stability is meaningless.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    current: DisplayList,
}

impl Reconciler {
    /// Start with an empty display list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one snapshot and return the new display list.
    ///
    /// Infallible: a snapshot with absent records reconciles to an empty
    /// list, never an error.
    pub fn apply(&mut self, snapshot: &TrafficSnapshot) -> &DisplayList {
        self.current = crate::reconcile(&self.current, snapshot);
        &self.current
    }

    /// The display list after the most recent tick.
    pub fn current(&self) -> &DisplayList {
        &self.current
    }

    /// Drop all state, as on session teardown/restart. The next snapshot
    /// reconciles against an empty list (all records arrive fresh).
    pub fn reset(&mut self) {
        self.current = DisplayList::empty();
    }
}
