//! Session lifecycle against a scripted transport: the attempt budget is
//! enforced, a successful open resets it, and teardown always releases the
//! transport.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pxd_stream::{
    FeedStream, SessionError, SessionEvent, SessionOptions, SessionState, StreamSession,
    StreamTransport, TransportError,
};

// ---------------------------------------------------------------------------
// Scripted transport
// ---------------------------------------------------------------------------

enum Script {
    /// Connect attempt fails outright.
    Refuse,
    /// Connect succeeds; the feed yields these items then the peer closes.
    Deliver(Vec<u32>),
    /// Connect succeeds; the feed yields these items then hangs open.
    DeliverThenHang(Vec<u32>),
}

#[derive(Clone)]
struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Script>>>,
    connects: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    fn new(script: Vec<Script>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn connect_calls(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

struct ScriptedFeed {
    items: VecDeque<u32>,
    hang_when_done: bool,
}

#[async_trait]
impl FeedStream<u32> for ScriptedFeed {
    async fn next_item(&mut self) -> Option<Result<u32, TransportError>> {
        match self.items.pop_front() {
            Some(item) => Some(Ok(item)),
            None if self.hang_when_done => {
                // Feed stays open with nothing to say; only shutdown ends it.
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => None,
        }
    }
}

#[async_trait]
impl StreamTransport<u32> for ScriptedTransport {
    async fn connect(&self) -> Result<Box<dyn FeedStream<u32>>, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Script::Refuse) => Err(TransportError::Connect("refused".to_string())),
            Some(Script::Deliver(items)) => Ok(Box::new(ScriptedFeed {
                items: items.into(),
                hang_when_done: false,
            })),
            Some(Script::DeliverThenHang(items)) => Ok(Box::new(ScriptedFeed {
                items: items.into(),
                hang_when_done: true,
            })),
            // Script exhausted: behave like an unreachable server.
            None => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

fn fast_opts() -> SessionOptions {
    SessionOptions {
        retry_delay: Duration::from_millis(1),
        ..SessionOptions::default()
    }
}

async fn collect_until_terminal(
    rx: &mut tokio::sync::mpsc::Receiver<SessionEvent<u32>>,
) -> Vec<SessionEvent<u32>> {
    let mut events = Vec::new();
    while let Some(ev) = rx.recv().await {
        let terminal = matches!(ev, SessionEvent::Terminal(_));
        events.push(ev);
        if terminal {
            break;
        }
    }
    events
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn cap_consecutive_failures_closes_with_terminal_error() {
    let transport = ScriptedTransport::new(vec![Script::Refuse, Script::Refuse, Script::Refuse]);
    let (session, mut rx) = StreamSession::spawn(transport.clone(), fast_opts());

    let events = collect_until_terminal(&mut rx).await;

    assert_eq!(
        events,
        vec![
            SessionEvent::State(SessionState::Connecting),
            SessionEvent::State(SessionState::Reconnecting),
            SessionEvent::State(SessionState::Reconnecting),
            SessionEvent::State(SessionState::Closed),
            SessionEvent::Terminal(SessionError::AttemptsExhausted {
                attempts: 3,
                last: TransportError::Connect("refused".to_string()),
            }),
        ]
    );
    assert_eq!(transport.connect_calls(), 3);
    assert_eq!(session.state(), SessionState::Closed);
    assert!(session.state().is_terminal());

    // Channel ends after the terminal event.
    assert!(rx.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn successful_open_resets_the_attempt_counter() {
    // Two failures, then a live feed, then three more failures. Without
    // the reset the session would close right after the feed broke.
    let transport = ScriptedTransport::new(vec![
        Script::Refuse,
        Script::Refuse,
        Script::Deliver(vec![7]),
        Script::Refuse,
        Script::Refuse,
        Script::Refuse,
    ]);
    let (_session, mut rx) = StreamSession::spawn(transport.clone(), fast_opts());

    let events = collect_until_terminal(&mut rx).await;

    assert!(events.contains(&SessionEvent::State(SessionState::Open)));
    assert!(events.contains(&SessionEvent::Item(7)));
    match events.last() {
        Some(SessionEvent::Terminal(SessionError::AttemptsExhausted { attempts, .. })) => {
            assert_eq!(*attempts, 3, "counter must restart after the open");
        }
        other => panic!("expected terminal error, got {other:?}"),
    }
    // 2 refusals + 1 open + 3 refusals.
    assert_eq!(transport.connect_calls(), 6);
}

#[tokio::test(start_paused = true)]
async fn peer_close_counts_as_one_failure_then_reconnects() {
    let transport = ScriptedTransport::new(vec![
        Script::Deliver(vec![1, 2]),
        Script::DeliverThenHang(vec![3]),
    ]);
    let (session, mut rx) = StreamSession::spawn(transport.clone(), fast_opts());

    let mut items = Vec::new();
    while items.len() < 3 {
        match rx.recv().await.expect("session should keep delivering") {
            SessionEvent::Item(v) => items.push(v),
            SessionEvent::Terminal(err) => panic!("unexpected terminal: {err}"),
            SessionEvent::State(_) => {}
        }
    }
    assert_eq!(items, [1, 2, 3]);
    assert_eq!(session.state(), SessionState::Open);
    assert_eq!(transport.connect_calls(), 2);

    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn teardown_releases_a_hanging_connect() {
    // Empty script: the transport never answers. Closing must still
    // return promptly and stop the task.
    let transport = ScriptedTransport::new(vec![]);
    let (session, mut rx) = StreamSession::spawn(transport.clone(), fast_opts());

    assert_eq!(rx.recv().await, Some(SessionEvent::State(SessionState::Connecting)));
    session.close().await;
    assert!(rx.recv().await.is_none(), "no events after teardown");
}

#[tokio::test(start_paused = true)]
async fn dropping_the_receiver_stops_the_session() {
    let transport = ScriptedTransport::new(vec![Script::DeliverThenHang(vec![1, 2, 3, 4])]);
    let (session, mut rx) = StreamSession::spawn(transport.clone(), fast_opts());

    // Take one item, then walk away.
    loop {
        if let Some(SessionEvent::Item(_)) = rx.recv().await {
            break;
        }
    }
    drop(rx);

    // The task notices the dead channel on its next send and exits;
    // close() then just joins it.
    session.close().await;
}
