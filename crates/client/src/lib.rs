// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Forecaster-side runtime for collaborative bulletin authoring.
//!
//! Connects to the own server and to peer servers, keeps the merged
//! bulletins of the shown day, announces edits on the lock channels and
//! runs the workflow actions with their local guards.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod config;
mod editor;
mod error;
mod http;
mod locks;
mod poller;
mod session;
mod status;

#[cfg(test)]
mod tests;

pub use config::{ClientConfig, FederatedServerConfig};
pub use editor::Editor;
pub use error::ClientError;
pub use http::{BulletinApi, HttpBulletinApi, LoginReply};
pub use locks::{LockChannels, LockManager};
pub use poller::{FederatedServer, FederationPoller, PollSchedule, PollerHandle};
pub use session::{EditorSession, Operation};
pub use status::StatusRepository;

use albina_domain::{Author, PublicationSchedule};
use std::sync::Arc;
use time::Date;
use tracing::info;

/// A connected editor and the peer servers to poll.
pub struct Connection {
    /// The editor of the logged-in forecaster.
    pub editor: Editor,
    /// Peer servers, each with its own session.
    pub servers: Vec<FederatedServer>,
}

/// Logs in to the own server, opens the lock channels and loads `date`.
///
/// Peer servers are logged in lazily on their first refresh.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the login fails, the
/// lock channels cannot be opened or the first load fails.
pub async fn connect(config: &ClientConfig, date: Date) -> Result<Connection, ClientError> {
    let schedule: PublicationSchedule = PublicationSchedule::new(&config.timezone)?;

    let api: HttpBulletinApi =
        HttpBulletinApi::new("internal", &config.server_url, &config.username, &config.password)?;
    let login: LoginReply = api.login().await?;

    let locks: LockManager =
        LockManager::connect(&config.websocket_url(), &login.username, &login.access_token)
            .await?;

    let session: EditorSession = EditorSession::new(
        Author::new(&login.display_name),
        login.region.clone(),
        config.neighbor_regions.clone(),
        schedule,
        date,
    );
    let editor: Editor = Editor::new(session, Arc::new(api), Arc::new(locks));
    editor.load(date).await?;

    let servers: Vec<FederatedServer> = config
        .external_servers
        .iter()
        .map(|peer| {
            let api: HttpBulletinApi =
                HttpBulletinApi::new(&peer.name, &peer.api_url, &peer.username, &peer.password)?;
            Ok(FederatedServer {
                api: Arc::new(api),
                regions: peer.regions.clone(),
            })
        })
        .collect::<Result<Vec<FederatedServer>, ClientError>>()?;

    info!(
        username = %login.username,
        region = %login.region,
        peers = servers.len(),
        "Editor connected"
    );
    Ok(Connection { editor, servers })
}
