//! Test fixtures for the dashboard core: record/snapshot builders, a
//! scripted in-process transport, and a real WebSocket server that speaks
//! the engine's feed protocol. The cross-crate scenario tests live in this
//! crate's `tests/` directory.

use pxd_schemas::{ConnectionMeta, ConnectionRecord, LogRecord, TrafficSnapshot};

mod scripted;
mod ws_server;

pub use scripted::{ConnectOutcome, ScriptedTransport};
pub use ws_server::FeedServer;

/// Install a test tracing subscriber honoring `RUST_LOG`. Safe to call
/// from every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_test_writer()
        .try_init();
}

/// A connection record with the fields the pipeline cares about.
pub fn conn_record(id: &str, host: &str, upload: u64, download: u64) -> ConnectionRecord {
    ConnectionRecord {
        id: id.to_string(),
        upload,
        download,
        metadata: ConnectionMeta {
            host: host.to_string(),
            ..ConnectionMeta::default()
        },
        ..ConnectionRecord::default()
    }
}

/// A snapshot whose totals are the sums of its records' counters.
pub fn snapshot(records: Vec<ConnectionRecord>) -> TrafficSnapshot {
    TrafficSnapshot {
        upload_total: records.iter().map(|r| r.upload).sum(),
        download_total: records.iter().map(|r| r.download).sum(),
        connections: Some(records),
    }
}

pub fn log_line(kind: &str, payload: &str) -> LogRecord {
    LogRecord {
        kind: kind.to_string(),
        payload: payload.to_string(),
    }
}
