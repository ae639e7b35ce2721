//! Synchronous core of the connections view: reconciler + query + matcher,
//! publishing frames through a `watch` channel. Async plumbing lives in
//! `runtime.rs`; everything here is directly unit-testable.

use pxd_match::{FilterSpec, Matcher};
use pxd_reconcile::Reconciler;
use pxd_schemas::TrafficSnapshot;
use pxd_stream::{SessionEvent, SessionState};
use pxd_view::{project, SortPolicy, ViewFrame, ViewQuery};
use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::{FeedKind, RuntimeEvent};

/// Owns everything the connections page shows. Single writer only.
pub struct LiveView {
    reconciler: Reconciler,
    query: ViewQuery,
    /// Compiled form of `query.filter`; [`Matcher::match_none`] while the
    /// user's expression is invalid.
    matcher: Matcher,
    frames: watch::Sender<ViewFrame>,
    bus: broadcast::Sender<RuntimeEvent>,
}

impl LiveView {
    pub fn new(bus: broadcast::Sender<RuntimeEvent>) -> (LiveView, watch::Receiver<ViewFrame>) {
        let (frames, frames_rx) = watch::channel(ViewFrame::default());
        (
            LiveView {
                reconciler: Reconciler::new(),
                query: ViewQuery::default(),
                matcher: Matcher::match_all(),
                frames,
                bus,
            },
            frames_rx,
        )
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    /// Route one session event. Items reconcile and republish; state
    /// changes and terminal errors go to the bus.
    pub fn handle_event(&mut self, event: SessionEvent<TrafficSnapshot>) {
        match event {
            SessionEvent::Item(snapshot) => self.apply_snapshot(&snapshot),
            SessionEvent::State(state) => self.publish_session_state(state),
            SessionEvent::Terminal(err) => {
                let _ = self.bus.send(RuntimeEvent::Terminal {
                    feed: FeedKind::Connections,
                    message: err.to_string(),
                });
            }
        }
    }

    /// One tick: merge the snapshot and republish the projection.
    pub fn apply_snapshot(&mut self, snapshot: &TrafficSnapshot) {
        self.reconciler.apply(snapshot);
        self.republish();
    }

    /// Install a new filter expression and reapply it to the current
    /// display list immediately, not on the next tick.
    ///
    /// A compile failure empties the view (the matcher is poisoned, every
    /// candidate excluded) and raises [`RuntimeEvent::FilterRejected`];
    /// the expression text is kept so the user keeps editing their input.
    pub fn set_filter(&mut self, spec: FilterSpec) {
        self.matcher = match Matcher::compile(&spec) {
            Ok(matcher) => matcher,
            Err(err) => {
                debug!(%err, "filter rejected");
                let _ = self.bus.send(RuntimeEvent::FilterRejected {
                    feed: FeedKind::Connections,
                    message: err.message.clone(),
                });
                Matcher::match_none()
            }
        };
        self.query.filter = spec;
        self.republish();
    }

    /// Switch the sort policy and republish from retained state.
    pub fn set_sort(&mut self, sort: SortPolicy) {
        self.query.sort = sort;
        self.republish();
    }

    fn publish_session_state(&self, state: SessionState) {
        let _ = self.bus.send(RuntimeEvent::Session {
            feed: FeedKind::Connections,
            state,
        });
    }

    fn republish(&self) {
        let frame = project(self.reconciler.current(), &self.matcher, self.query.sort);
        // send_replace so publishing works with or without live receivers.
        self.frames.send_replace(frame);
    }
}
