//! Out-of-band event bus for the sink: transient filter errors and
//! session lifecycle changes. Frames travel on their own `watch` channels;
//! this bus is only for things that are not part of a frame.

use pxd_stream::SessionState;
use serde::{Deserialize, Serialize};

/// Which feed an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    Connections,
    Logs,
}

/// Messages broadcast to bus subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    /// A filter expression failed to compile. Transient: the view is
    /// empty until the user edits the expression. `feed` says which
    /// search box raised it.
    FilterRejected { feed: FeedKind, message: String },
    /// A feed's session moved to a new lifecycle state.
    Session { feed: FeedKind, state: SessionState },
    /// A feed's session exhausted its reconnect budget. Terminal for the
    /// session; the dashboard keeps serving its last published frames.
    Terminal { feed: FeedKind, message: String },
}
