// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Periodic refresh of the working set.
//!
//! One task refreshes the own server, one task per peer server refreshes
//! that peer. Failures are recorded on the session and retried by the
//! next tick only.

use albina_domain::RegionCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::editor::Editor;
use crate::http::BulletinApi;

/// Cadence of the refresh tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Interval of the own-server refresh.
    pub internal: Duration,
    /// Interval of the peer refresh.
    pub external: Duration,
    /// Delay before the first peer refresh.
    pub external_initial_delay: Duration,
}

impl From<&ClientConfig> for PollSchedule {
    fn from(config: &ClientConfig) -> Self {
        Self {
            internal: config.internal_poll(),
            external: config.external_poll(),
            external_initial_delay: config.external_initial_delay(),
        }
    }
}

/// A peer server and the regions requested from it.
#[derive(Clone)]
pub struct FederatedServer {
    /// The peer's API, with its own session.
    pub api: Arc<dyn BulletinApi>,
    /// Regions requested from the peer.
    pub regions: Vec<RegionCode>,
}

/// Spawns the refresh tasks of an editor.
pub struct FederationPoller;

impl FederationPoller {
    /// Starts refreshing `editor` from its own server and from `servers`.
    #[must_use]
    pub fn spawn(editor: &Editor, servers: Vec<FederatedServer>, schedule: PollSchedule) -> PollerHandle {
        let mut tasks: Vec<JoinHandle<()>> = Vec::with_capacity(servers.len() + 1);

        let internal_editor: Editor = editor.clone();
        tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(schedule.internal);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; the editor loads on its own.
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Ok(true) = internal_editor.refresh_internal().await {
                    debug!("Internal refresh merged");
                }
            }
        }));

        for server in servers {
            let external_editor: Editor = editor.clone();
            tasks.push(tokio::spawn(async move {
                tokio::time::sleep(schedule.external_initial_delay).await;
                let mut interval = tokio::time::interval(schedule.external);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    interval.tick().await;
                    if let Ok(true) = external_editor
                        .refresh_external(server.api.as_ref(), &server.regions)
                        .await
                    {
                        debug!(server = server.api.name(), "External refresh merged");
                    }
                }
            }));
        }

        info!(tasks = tasks.len(), "Federation poller started");
        PollerHandle { tasks }
    }
}

/// Running refresh tasks; dropping the handle stops them.
pub struct PollerHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl PollerHandle {
    /// Number of running tasks.
    #[must_use]
    pub const fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Stops every refresh task.
    pub fn shutdown(mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        info!("Federation poller stopped");
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
