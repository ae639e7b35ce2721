//! Minimal in-process WebSocket server speaking the engine's feed
//! protocol: one text frame per event, feeds routed by request path.
//!
//! The first subscriber on each path receives that path's scripted frames
//! and the socket is then held open until the client hangs up, so
//! sessions stay `Open` for the rest of the test. Later subscribers get
//! an empty feed.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::Message;

type FrameScript = Arc<Mutex<Option<Vec<String>>>>;

pub struct FeedServer {
    addr: SocketAddr,
    requested: Arc<Mutex<Vec<String>>>,
    task: tokio::task::JoinHandle<()>,
}

impl FeedServer {
    /// Bind an ephemeral port and serve `connections_frames` on
    /// `/connections` and `log_frames` on `/logs`.
    pub async fn start(connections_frames: Vec<String>, log_frames: Vec<String>) -> Result<FeedServer> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind feed server")?;
        let addr = listener.local_addr().context("local addr")?;

        let requested: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let connections: FrameScript = Arc::new(Mutex::new(Some(connections_frames)));
        let logs: FrameScript = Arc::new(Mutex::new(Some(log_frames)));

        let accept_log = Arc::clone(&requested);
        let task = tokio::spawn(async move {
            loop {
                let Ok((stream, _peer)) = listener.accept().await else {
                    break;
                };
                let requested = Arc::clone(&accept_log);
                let connections = Arc::clone(&connections);
                let logs = Arc::clone(&logs);
                tokio::spawn(async move {
                    serve_one(stream, requested, connections, logs).await;
                });
            }
        });

        Ok(FeedServer {
            addr,
            requested,
            task,
        })
    }

    /// `host:port` in the shape [`pxd_config::ConnectionInfo`] expects.
    pub fn server_addr(&self) -> String {
        self.addr.to_string()
    }

    /// Request URIs seen so far (path + query), in accept order.
    pub fn requested_uris(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub async fn stop(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}

async fn serve_one(
    stream: tokio::net::TcpStream,
    requested: Arc<Mutex<Vec<String>>>,
    connections: FrameScript,
    logs: FrameScript,
) {
    let uri_slot = Arc::new(Mutex::new(String::new()));
    let capture = {
        let uri_slot = Arc::clone(&uri_slot);
        move |req: &Request, resp: Response| {
            *uri_slot.lock().unwrap() = req.uri().to_string();
            Ok(resp)
        }
    };

    let Ok(mut socket) = accept_hdr_async(stream, capture).await else {
        return;
    };

    let uri = uri_slot.lock().unwrap().clone();
    requested.lock().unwrap().push(uri.clone());

    let script = if uri.starts_with("/logs") {
        &logs
    } else {
        &connections
    };
    let frames = script.lock().unwrap().take().unwrap_or_default();

    for frame in frames {
        if socket.send(Message::Text(frame)).await.is_err() {
            return;
        }
    }

    // Keep the feed open; the client decides when the session ends.
    while let Some(Ok(_)) = socket.next().await {}
}
