use std::fmt;

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

/// One failed interaction with the underlying transport. Recoverable: the
/// session retries until its attempt budget runs out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Dial or handshake failure; the feed never opened.
    Connect(String),
    /// The open connection failed mid-stream.
    Io(String),
    /// A frame arrived but could not be decoded as the expected payload.
    Decode(String),
    /// The peer closed the connection.
    Closed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Connect(msg) => write!(f, "connect failed: {msg}"),
            TransportError::Io(msg) => write!(f, "stream error: {msg}"),
            TransportError::Decode(msg) => write!(f, "frame decode error: {msg}"),
            TransportError::Closed => write!(f, "connection closed by peer"),
        }
    }
}

impl std::error::Error for TransportError {}

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Terminal session failure. After this the session is `Closed` and stays
/// closed until the owner builds a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The configured number of consecutive reconnect attempts failed.
    AttemptsExhausted {
        attempts: u32,
        /// The transport error from the final attempt.
        last: TransportError,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::AttemptsExhausted { attempts, last } => {
                write!(f, "gave up after {attempts} reconnect attempts: {last}")
            }
        }
    }
}

impl std::error::Error for SessionError {}
