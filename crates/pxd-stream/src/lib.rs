//! pxd-stream
//!
//! Persistent subscription to one of the engine's streaming feeds.
//!
//! Architectural decisions:
//! - Explicit session state machine; `Closed` is terminal until the owner
//!   restarts with fresh connection info
//! - Bounded consecutive reconnect attempts; a successful open resets the
//!   counter; exhaustion surfaces one terminal error event
//! - All delivery over a single mpsc channel, preserving transport order
//! - Transport behind an object-safe trait so tests script feeds without
//!   a network
//!
//! The WebSocket implementation decodes each text frame as one `T` via
//! serde; the connections feed and the log feed differ only in `T`.

mod error;
mod session;
mod transport;

pub use error::{SessionError, TransportError};
pub use session::{SessionEvent, SessionOptions, SessionState, StreamSession};
pub use transport::{FeedStream, StreamTransport, WsTransport};
