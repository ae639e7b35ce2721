//! In-process transport with a scripted outcome per connect attempt.
//! Deterministic and network-free; the session under test cannot tell it
//! from the real thing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pxd_stream::{FeedStream, StreamTransport, TransportError};

/// What one connect attempt does.
pub enum ConnectOutcome<T> {
    /// Fail the dial with this message.
    Refuse(String),
    /// Open a feed that yields these items, then the peer closes.
    Deliver(Vec<T>),
    /// Open a feed that yields these items, then stays open silently.
    DeliverThenHang(Vec<T>),
}

/// Transport whose connects pop outcomes off a script. An exhausted
/// script behaves like an unreachable server (the dial never resolves),
/// which keeps sessions parked instead of spinning.
pub struct ScriptedTransport<T> {
    script: Arc<Mutex<VecDeque<ConnectOutcome<T>>>>,
    connects: Arc<AtomicUsize>,
}

impl<T> Clone for ScriptedTransport<T> {
    fn clone(&self) -> Self {
        Self {
            script: Arc::clone(&self.script),
            connects: Arc::clone(&self.connects),
        }
    }
}

impl<T> ScriptedTransport<T> {
    pub fn new(script: Vec<ConnectOutcome<T>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A transport that never answers; sessions stay in their first dial.
    pub fn unreachable() -> Self {
        Self::new(Vec::new())
    }

    /// How many connect attempts the session has made so far.
    pub fn connect_calls(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

struct ScriptedFeed<T> {
    items: VecDeque<T>,
    hang_when_done: bool,
}

#[async_trait]
impl<T: Send + 'static> FeedStream<T> for ScriptedFeed<T> {
    async fn next_item(&mut self) -> Option<Result<T, TransportError>> {
        match self.items.pop_front() {
            Some(item) => Some(Ok(item)),
            None if self.hang_when_done => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => None,
        }
    }
}

#[async_trait]
impl<T: Send + 'static> StreamTransport<T> for ScriptedTransport<T> {
    async fn connect(&self) -> Result<Box<dyn FeedStream<T>>, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(ConnectOutcome::Refuse(message)) => Err(TransportError::Connect(message)),
            Some(ConnectOutcome::Deliver(items)) => Ok(Box::new(ScriptedFeed {
                items: items.into(),
                hang_when_done: false,
            })),
            Some(ConnectOutcome::DeliverThenHang(items)) => Ok(Box::new(ScriptedFeed {
                items: items.into(),
                hang_when_done: true,
            })),
            None => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}
