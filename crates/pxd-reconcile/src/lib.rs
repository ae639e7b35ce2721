//! pxd-reconcile
//!
//! Slot-stable reconciliation of the live connections list.
//!
//! Architectural decisions:
//! - The display list is replaced wholesale every tick; no partial states
//! - A record keeps its previous slot while that slot still exists
//! - Per-tick rates are derived from cumulative counters by subtraction
//! - New and position-evicted records fill empty slots in snapshot order
//!
//! Deterministic, pure logic. No IO. No clocks.

mod engine;
mod types;

pub use engine::reconcile;
pub use types::{DisplayList, Reconciler};
