// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge settings

use crate::error::{BridgeError, Result};
use famglb_model::DetailLevel;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Settings of the update bridge
///
/// Missing keys in a JSON file take their default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub bind_address: String,
    pub port: u16,
    /// Reply polls before a request times out
    pub poll_attempts: u32,
    pub poll_interval_ms: u64,
    /// Detail level used when a request does not name one
    pub detail_level: DetailLevel,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            poll_attempts: 100,
            poll_interval_ms: 100,
            detail_level: DetailLevel::Fine,
        }
    }
}

impl BridgeConfig {
    /// Load settings from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| BridgeError::config(format!("{}: {}", path.display(), e)))
    }

    /// Longest wait for the authority thread's reply
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.saturating_mul(u64::from(self.poll_attempts)))
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| {
                BridgeError::config(format!("bad bind address {}: {}", self.bind_address, e))
            })
    }
}
