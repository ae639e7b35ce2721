//! pxd-runtime
//!
//! The assembled dashboard core: one task owns all mutable state and
//! drives it from two ordered event streams (connections feed, log feed)
//! plus a command channel from the sink side.
//!
//! Architectural decisions:
//! - Exactly one writer: session events and user commands converge on a
//!   single `select!` loop; projections are recomputed there and published
//!   whole through `watch` channels
//! - A rejected filter expression empties the view and raises a transient
//!   bus event; reconciler state is never touched by filter churn
//! - Terminal session errors are surfaced on the bus; the owner rebuilds
//!   the dashboard when connection info changes

mod bus;
mod logs;
mod runtime;
mod view;

pub use bus::{FeedKind, RuntimeEvent};
pub use logs::{LogFeed, LogFrame, LogLevelFilter, DEFAULT_LOG_CAPACITY};
pub use runtime::{Dashboard, DashboardCommand, DashboardOptions};
pub use view::LiveView;
