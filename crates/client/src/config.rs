// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Client configuration.

use albina_domain::{DEFAULT_TIMEZONE, RegionCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_timezone() -> String {
    String::from(DEFAULT_TIMEZONE)
}

const fn default_internal_poll_secs() -> u64 {
    5
}

const fn default_external_poll_secs() -> u64 {
    30
}

const fn default_external_initial_delay_secs() -> u64 {
    2
}

/// A peer server whose bulletins are shown read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederatedServerConfig {
    /// Display name, also the key of its bulletins in the working set.
    pub name: String,
    /// Base URL of the peer's API.
    pub api_url: String,
    /// Username on the peer.
    pub username: String,
    /// Password on the peer.
    pub password: String,
    /// Regions requested from the peer.
    pub regions: Vec<RegionCode>,
}

/// Configuration of a forecaster's client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the own server.
    pub server_url: String,
    /// Username on the own server.
    pub username: String,
    /// Password on the own server.
    pub password: String,
    /// Regions of the same cluster loaded together with the own region.
    #[serde(default)]
    pub neighbor_regions: Vec<RegionCode>,
    /// Peer servers.
    #[serde(default)]
    pub external_servers: Vec<FederatedServerConfig>,
    /// IANA timezone of the publication times.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Seconds between refreshes from the own server.
    #[serde(default = "default_internal_poll_secs")]
    pub internal_poll_secs: u64,
    /// Seconds between refreshes from peer servers.
    #[serde(default = "default_external_poll_secs")]
    pub external_poll_secs: u64,
    /// Seconds before the first refresh from peer servers.
    #[serde(default = "default_external_initial_delay_secs")]
    pub external_initial_delay_secs: u64,
}

impl ClientConfig {
    /// Creates a configuration with the default poll cadence.
    #[must_use]
    pub fn new(server_url: &str, username: &str, password: &str) -> Self {
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            neighbor_regions: Vec::new(),
            external_servers: Vec::new(),
            timezone: default_timezone(),
            internal_poll_secs: default_internal_poll_secs(),
            external_poll_secs: default_external_poll_secs(),
            external_initial_delay_secs: default_external_initial_delay_secs(),
        }
    }

    /// Interval of the own-server refresh.
    #[must_use]
    pub const fn internal_poll(&self) -> Duration {
        Duration::from_secs(self.internal_poll_secs)
    }

    /// Interval of the peer refresh.
    #[must_use]
    pub const fn external_poll(&self) -> Duration {
        Duration::from_secs(self.external_poll_secs)
    }

    /// Delay before the first peer refresh.
    #[must_use]
    pub const fn external_initial_delay(&self) -> Duration {
        Duration::from_secs(self.external_initial_delay_secs)
    }

    /// The WebSocket base URL of the own server.
    #[must_use]
    pub fn websocket_url(&self) -> String {
        if let Some(rest) = self.server_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.server_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.server_url.clone()
        }
    }
}
