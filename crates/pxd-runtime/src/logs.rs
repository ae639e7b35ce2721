//! Synchronous core of the logs page: a bounded live buffer with a pause
//! gate, a level filter, and the same search-box matcher the connections
//! view uses. Both are applied; a line must pass each.

use std::collections::VecDeque;

use pxd_match::{FilterSpec, Matcher};
use pxd_schemas::LogRecord;
use pxd_stream::SessionEvent;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::{FeedKind, RuntimeEvent};

/// Default retention; beyond this the oldest lines fall off.
pub const DEFAULT_LOG_CAPACITY: usize = 1_000;

// ---------------------------------------------------------------------------
// LogLevelFilter
// ---------------------------------------------------------------------------

/// Level selector. Engines tag lines inconsistently ("info", "inf",
/// "warning", ...), so admission is a substring test on the record's tag,
/// exactly as the dashboard always filtered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevelFilter {
    #[default]
    All,
    Info,
    Warning,
    Error,
}

impl LogLevelFilter {
    fn tag(&self) -> Option<&'static str> {
        match self {
            LogLevelFilter::All => None,
            LogLevelFilter::Info => Some("inf"),
            LogLevelFilter::Warning => Some("warn"),
            LogLevelFilter::Error => Some("err"),
        }
    }

    pub fn admits(&self, record: &LogRecord) -> bool {
        match self.tag() {
            None => true,
            Some(tag) => record.kind.contains(tag),
        }
    }
}

// ---------------------------------------------------------------------------
// LogFrame
// ---------------------------------------------------------------------------

/// Published state of the logs page: the visible (filtered) lines and
/// whether intake is paused.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogFrame {
    pub records: Vec<LogRecord>,
    pub paused: bool,
}

// ---------------------------------------------------------------------------
// LogFeed
// ---------------------------------------------------------------------------

/// Owns the log buffer and its query state. Single writer only.
pub struct LogFeed {
    buffer: VecDeque<LogRecord>,
    capacity: usize,
    paused: bool,
    level: LogLevelFilter,
    filter: FilterSpec,
    matcher: Matcher,
    frames: watch::Sender<LogFrame>,
    bus: broadcast::Sender<RuntimeEvent>,
}

impl LogFeed {
    pub fn new(bus: broadcast::Sender<RuntimeEvent>) -> (LogFeed, watch::Receiver<LogFrame>) {
        Self::with_capacity(DEFAULT_LOG_CAPACITY, bus)
    }

    pub fn with_capacity(
        capacity: usize,
        bus: broadcast::Sender<RuntimeEvent>,
    ) -> (LogFeed, watch::Receiver<LogFrame>) {
        let (frames, frames_rx) = watch::channel(LogFrame::default());
        (
            LogFeed {
                buffer: VecDeque::new(),
                capacity: capacity.max(1),
                paused: false,
                level: LogLevelFilter::default(),
                filter: FilterSpec::default(),
                matcher: Matcher::match_all(),
                frames,
                bus,
            },
            frames_rx,
        )
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn level(&self) -> LogLevelFilter {
        self.level
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    /// Route one session event from the log feed.
    pub fn handle_event(&mut self, event: SessionEvent<LogRecord>) {
        match event {
            SessionEvent::Item(record) => self.push(record),
            SessionEvent::State(state) => {
                let _ = self.bus.send(RuntimeEvent::Session {
                    feed: FeedKind::Logs,
                    state,
                });
            }
            SessionEvent::Terminal(err) => {
                let _ = self.bus.send(RuntimeEvent::Terminal {
                    feed: FeedKind::Logs,
                    message: err.to_string(),
                });
            }
        }
    }

    /// Append one line. While paused, lines are discarded: the engine
    /// keeps talking, the page just stops listening.
    pub fn push(&mut self, record: LogRecord) {
        if self.paused {
            return;
        }
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(record);
        self.republish();
    }

    /// Stop intake. Already-buffered lines stay visible.
    pub fn pause(&mut self) {
        self.paused = true;
        self.republish();
    }

    pub fn resume(&mut self) {
        self.paused = false;
        self.republish();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.republish();
    }

    pub fn set_level(&mut self, level: LogLevelFilter) {
        self.level = level;
        self.republish();
    }

    /// Same semantics as the connections search box: recompile now,
    /// reapply now, poison the view on a bad expression.
    pub fn set_filter(&mut self, spec: FilterSpec) {
        self.matcher = match Matcher::compile(&spec) {
            Ok(matcher) => matcher,
            Err(err) => {
                debug!(%err, "log filter rejected");
                let _ = self.bus.send(RuntimeEvent::FilterRejected {
                    feed: FeedKind::Logs,
                    message: err.message.clone(),
                });
                Matcher::match_none()
            }
        };
        self.filter = spec;
        self.republish();
    }

    fn republish(&self) {
        let records = self
            .buffer
            .iter()
            .filter(|r| self.level.admits(r) && self.matcher.is_match(&r.payload))
            .cloned()
            .collect();
        self.frames.send_replace(LogFrame {
            records,
            paused: self.paused,
        });
    }
}
