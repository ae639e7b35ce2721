//! Wire data model shared by every proxydeck crate.
//!
//! Shapes mirror the proxy engine's JSON exactly (camelCase keys, nullable
//! `connections`). No behavior lives here beyond match-target extraction
//! and `start`-timestamp parsing; everything else is plain serde structs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionMeta {
    pub network: String,
    #[serde(rename = "type")]
    pub conn_type: String,
    pub host: String,
    #[serde(rename = "sourceIP")]
    pub source_ip: String,
    #[serde(rename = "destinationIP")]
    pub destination_ip: String,
    pub source_port: String,
    pub destination_port: String,
    pub process: String,
    /// Engine versions keep growing this object; unknown keys ride along
    /// so re-serialization for the sink is lossless.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    /// Opaque engine-assigned identifier, unique within one snapshot.
    pub id: String,
    #[serde(default)]
    pub metadata: ConnectionMeta,
    /// Cumulative uploaded bytes since the connection opened.
    #[serde(default)]
    pub upload: u64,
    /// Cumulative downloaded bytes since the connection opened.
    #[serde(default)]
    pub download: u64,
    /// RFC 3339 start timestamp as sent by the engine; may be empty or junk.
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default)]
    pub rule: String,
    #[serde(default)]
    pub rule_payload: String,
    /// Per-tick upload rate derived by the reconciler. Never read from the
    /// wire; always recomputed.
    #[serde(default, skip_deserializing)]
    pub cur_upload: u64,
    /// Per-tick download rate derived by the reconciler. Never read from
    /// the wire; always recomputed.
    #[serde(default, skip_deserializing)]
    pub cur_download: u64,
}

impl ConnectionRecord {
    /// The string the filter engine matches against: host name, falling
    /// back to destination IP, falling back to empty.
    pub fn match_target(&self) -> &str {
        if !self.metadata.host.is_empty() {
            &self.metadata.host
        } else if !self.metadata.destination_ip.is_empty() {
            &self.metadata.destination_ip
        } else {
            ""
        }
    }

    /// Parsed `start` timestamp, or `None` when the field is empty or not
    /// valid RFC 3339. Callers decide how missing timestamps sort.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.start)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// One full-state snapshot event from the engine's connections feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSnapshot {
    #[serde(default)]
    pub upload_total: u64,
    #[serde(default)]
    pub download_total: u64,
    /// Some engine versions send `null` here instead of `[]`.
    #[serde(default)]
    pub connections: Option<Vec<ConnectionRecord>>,
}

impl TrafficSnapshot {
    /// Records in wire order; a `null`/absent field is an empty snapshot.
    pub fn records(&self) -> &[ConnectionRecord] {
        self.connections.as_deref().unwrap_or(&[])
    }
}

/// One line from the engine's log feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Level tag, e.g. "info" / "warning" / "error" (engines vary).
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: String,
}
