//! Read-path projection of the reconciled display list.
//!
//! Everything in this crate is a pure function of its inputs: filtering,
//! ordering, and aggregation are recomputed freely on every tick and every
//! query change, and never touch the canonical display list (slot
//! stability is the reconciler's contract, not ours to disturb).

mod aggregate;
mod fmt;
mod ordering;
mod query;

pub use aggregate::{aggregate, TrafficTotals};
pub use fmt::human_bytes;
pub use ordering::SortPolicy;
pub use query::{project, ViewFrame, ViewQuery};
