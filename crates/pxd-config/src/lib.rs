//! Connection-info loading for the dashboard core.
//!
//! The upstream controller hands us a server address and an access token;
//! everything else (which feeds to open, when to restart) is the runtime's
//! business. No connection info means no subscription is established; that
//! is the caller's branch, not an error here.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

// ---------------------------------------------------------------------------
// ConnectionInfo
// ---------------------------------------------------------------------------

/// Address and credential for the proxy engine's external controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Host:port of the controller, e.g. `"127.0.0.1:9090"`.
    pub server: String,
    /// Access token; may be empty when the controller is unsecured.
    #[serde(default)]
    pub secret: String,
}

impl ConnectionInfo {
    pub fn new(server: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            secret: secret.into(),
        }
    }

    /// Read `PXD_SERVER` / `PXD_SECRET` from the environment.
    ///
    /// Returns `Ok(None)` when `PXD_SERVER` is unset or blank: the
    /// "no subscription" case, distinct from a malformed configuration.
    pub fn from_env() -> Result<Option<ConnectionInfo>> {
        let server = match std::env::var("PXD_SERVER") {
            Ok(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return Ok(None),
        };
        let info = ConnectionInfo {
            server,
            secret: std::env::var("PXD_SECRET").unwrap_or_default(),
        };
        info.validate()?;
        Ok(Some(info))
    }

    /// Load from a JSON file of shape `{"server": "...", "secret": "..."}`.
    pub fn from_file(path: &str) -> Result<ConnectionInfo> {
        let raw = fs::read_to_string(path).with_context(|| format!("read config: {path}"))?;
        let info: ConnectionInfo =
            serde_json::from_str(&raw).with_context(|| format!("parse config: {path}"))?;
        info.validate()?;
        Ok(info)
    }

    fn validate(&self) -> Result<()> {
        if self.server.trim().is_empty() {
            bail!("connection info has an empty server address");
        }
        if self.server.contains("://") {
            bail!(
                "server must be host:port without a scheme, got {:?}",
                self.server
            );
        }
        Ok(())
    }

    /// WebSocket endpoint for a feed path, token percent-encoded:
    /// `ws://{server}/{path}?token={secret}`.
    pub fn endpoint(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!(
            "ws://{}/{}?token={}",
            self.server,
            path,
            urlencoding::encode(&self.secret)
        )
    }
}
