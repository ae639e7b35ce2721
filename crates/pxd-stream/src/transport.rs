//! Transport boundary for streaming feeds.
//!
//! Only the trait pair and the WebSocket implementation live here. No
//! retry policy, no state machine; that is the session's job. The trait
//! is object-safe so the session can hold `Box<dyn FeedStream<T>>` and
//! tests can substitute scripted feeds.

use std::marker::PhantomData;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::trace;

use crate::TransportError;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// An open feed: a sequence of decoded items until error or end.
#[async_trait]
pub trait FeedStream<T>: Send {
    /// Next item. `None` means the feed ended cleanly (peer hung up);
    /// the session decides whether that warrants a reconnect.
    async fn next_item(&mut self) -> Option<Result<T, TransportError>>;
}

/// Something that can open a [`FeedStream`], once per (re)connect.
#[async_trait]
pub trait StreamTransport<T>: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn FeedStream<T>>, TransportError>;
}

// ---------------------------------------------------------------------------
// WebSocket transport
// ---------------------------------------------------------------------------

/// WebSocket transport: each text frame is one serde-decoded `T`.
///
/// The URL comes fully formed from the config layer
/// (`ws://{server}/{path}?token={secret}`); this type does not interpret
/// it.
pub struct WsTransport<T> {
    url: String,
    _payload: PhantomData<fn() -> T>,
}

impl<T> WsTransport<T> {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            _payload: PhantomData,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl<T> StreamTransport<T> for WsTransport<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn connect(&self) -> Result<Box<dyn FeedStream<T>>, TransportError> {
        let (socket, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Box::new(WsFeed {
            socket,
            _payload: PhantomData,
        }))
    }
}

struct WsFeed<T> {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    _payload: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T> FeedStream<T> for WsFeed<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn next_item(&mut self) -> Option<Result<T, TransportError>> {
        loop {
            let msg = match self.socket.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => return Some(Err(TransportError::Io(e.to_string()))),
                None => return None,
            };

            let text = match msg {
                Message::Text(text) => text,
                Message::Binary(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => {
                        return Some(Err(TransportError::Decode(
                            "binary frame is not UTF-8".to_string(),
                        )))
                    }
                },
                Message::Close(_) => return None,
                // Keepalive noise between snapshots.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
                    trace!("ignoring control frame");
                    continue;
                }
            };

            return Some(match serde_json::from_str::<T>(&text) {
                Ok(item) => Ok(item),
                Err(e) => Err(TransportError::Decode(e.to_string())),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pxd_schemas::TrafficSnapshot;

    #[test]
    fn ws_transport_is_send_sync_for_task_spawning() {
        fn assert_send_sync<X: Send + Sync>() {}
        assert_send_sync::<WsTransport<TrafficSnapshot>>();
    }

    #[test]
    fn url_is_held_verbatim() {
        let t: WsTransport<TrafficSnapshot> =
            WsTransport::new("ws://127.0.0.1:9090/connections?token=abc");
        assert_eq!(t.url(), "ws://127.0.0.1:9090/connections?token=abc");
    }
}
