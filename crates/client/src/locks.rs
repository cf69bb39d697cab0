// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Client side of the advisory lock channels.
//!
//! Locks tell other forecasters what is being drawn or edited. They never
//! block anything: the manager records every event it sees and the editor
//! decides how to present foreign locks.

use albina::LockRegistry;
use albina_domain::{BulletinId, BulletinLock, RegionCode, RegionLock};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use time::Date;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::http::BulletinApi;

const SHUTDOWN_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Outgoing message queues of a manager created without a connection.
pub struct LockChannels {
    /// Messages for the region channel.
    pub regions: mpsc::UnboundedReceiver<String>,
    /// Messages for the bulletin channel.
    pub bulletins: mpsc::UnboundedReceiver<String>,
}

#[derive(Debug, Clone, Copy)]
enum Channel {
    Region,
    Bulletin,
}

impl Channel {
    const fn path(self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Bulletin => "bulletin",
        }
    }
}

/// Tracks advisory locks and talks to the server's lock channels.
pub struct LockManager {
    username: String,
    registry: Arc<Mutex<LockRegistry>>,
    region_tx: mpsc::UnboundedSender<String>,
    bulletin_tx: mpsc::UnboundedSender<String>,
    writers: Vec<JoinHandle<()>>,
    readers: Vec<JoinHandle<()>>,
}

impl LockManager {
    /// Creates a manager whose outgoing messages are handed to the caller.
    #[must_use]
    pub fn with_channels(username: &str) -> (Self, LockChannels) {
        let (region_tx, regions) = mpsc::unbounded_channel();
        let (bulletin_tx, bulletins) = mpsc::unbounded_channel();
        let manager: Self = Self {
            username: username.to_string(),
            registry: Arc::new(Mutex::new(LockRegistry::new())),
            region_tx,
            bulletin_tx,
            writers: Vec::new(),
            readers: Vec::new(),
        };
        (manager, LockChannels { regions, bulletins })
    }

    /// Opens both lock channels of `username` on the server at `ws_url`.
    ///
    /// # Arguments
    ///
    /// * `ws_url` - WebSocket base URL of the server (`ws://host:port`)
    /// * `username` - The forecaster owning the channels
    /// * `token` - The forecaster's bearer token
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if a channel cannot be opened.
    pub async fn connect(ws_url: &str, username: &str, token: &str) -> Result<Self, ClientError> {
        let (mut manager, channels) = Self::with_channels(username);

        for (channel, outgoing) in [
            (Channel::Region, channels.regions),
            (Channel::Bulletin, channels.bulletins),
        ] {
            let (writer, reader) = manager.open(ws_url, token, channel, outgoing).await?;
            manager.writers.push(writer);
            manager.readers.push(reader);
        }

        info!(%username, "Lock channels connected");
        Ok(manager)
    }

    async fn open(
        &self,
        ws_url: &str,
        token: &str,
        channel: Channel,
        mut outgoing: mpsc::UnboundedReceiver<String>,
    ) -> Result<(JoinHandle<()>, JoinHandle<()>), ClientError> {
        let url: String = format!(
            "{}/ws/{}/{}",
            ws_url.trim_end_matches('/'),
            channel.path(),
            self.username
        );
        let mut request = url.into_client_request()?;
        let header: HeaderValue = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        request.headers_mut().insert("Authorization", header);

        let (stream, _response) = tokio_tungstenite::connect_async(request).await?;
        let (mut sink, mut source) = stream.split();

        let writer: JoinHandle<()> = tokio::spawn(async move {
            while let Some(text) = outgoing.recv().await {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    warn!(error = %e, ?channel, "Failed to send lock event");
                    break;
                }
            }
        });

        let registry: Arc<Mutex<LockRegistry>> = Arc::clone(&self.registry);
        let reader: JoinHandle<()> = tokio::spawn(async move {
            while let Some(message) = source.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        let mut registry = registry.lock().await;
                        apply_remote(&mut registry, channel, &text);
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, ?channel, "Lock channel failed");
                        break;
                    }
                }
            }
            debug!(?channel, "Lock channel reader finished");
        });

        Ok((writer, reader))
    }

    /// The forecaster this manager acts for.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Announces that a new area of `region` is being drawn on `date`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the channel is closed.
    pub async fn lock_region(&self, region: &RegionCode, date: Date) -> Result<(), ClientError> {
        self.send_region(RegionLock {
            region: region.clone(),
            date,
            username: self.username.clone(),
            lock: true,
        })
        .await
    }

    /// Announces that drawing `region` on `date` has ended.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the channel is closed.
    pub async fn unlock_region(&self, region: &RegionCode, date: Date) -> Result<(), ClientError> {
        self.send_region(RegionLock {
            region: region.clone(),
            date,
            username: self.username.clone(),
            lock: false,
        })
        .await
    }

    /// Announces that `bulletin` is being edited.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the channel is closed.
    pub async fn lock_bulletin(&self, bulletin: &BulletinId, date: Date) -> Result<(), ClientError> {
        self.send_bulletin(BulletinLock {
            bulletin: bulletin.clone(),
            date,
            username: self.username.clone(),
            lock: true,
        })
        .await
    }

    /// Announces that editing `bulletin` has ended.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the channel is closed.
    pub async fn unlock_bulletin(
        &self,
        bulletin: &BulletinId,
        date: Date,
    ) -> Result<(), ClientError> {
        self.send_bulletin(BulletinLock {
            bulletin: bulletin.clone(),
            date,
            username: self.username.clone(),
            lock: false,
        })
        .await
    }

    async fn send_region(&self, event: RegionLock) -> Result<(), ClientError> {
        let json: String = event.to_json()?;
        self.registry.lock().await.apply_region_event(&event);
        self.region_tx
            .send(json)
            .map_err(|_| ClientError::Transport(String::from("region lock channel closed")))
    }

    async fn send_bulletin(&self, event: BulletinLock) -> Result<(), ClientError> {
        let json: String = event.to_json()?;
        self.registry.lock().await.apply_bulletin_event(&event);
        self.bulletin_tx
            .send(json)
            .map_err(|_| ClientError::Transport(String::from("bulletin lock channel closed")))
    }

    /// Records a region lock event received from the server.
    pub async fn receive_region(&self, text: &str) -> bool {
        apply_remote(&mut *self.registry.lock().await, Channel::Region, text)
    }

    /// Records a bulletin lock event received from the server.
    pub async fn receive_bulletin(&self, text: &str) -> bool {
        apply_remote(&mut *self.registry.lock().await, Channel::Bulletin, text)
    }

    /// Broadcasts an unlock for every lock this forecaster holds.
    ///
    /// # Returns
    ///
    /// The number of unlocks sent.
    pub async fn release_all(&self) -> usize {
        let (regions, bulletins): (Vec<RegionLock>, Vec<BulletinLock>) =
            self.registry.lock().await.release_user(&self.username);

        let mut sent: usize = 0;
        for json in regions.iter().filter_map(|e| e.to_json().ok()) {
            if self.region_tx.send(json).is_ok() {
                sent += 1;
            }
        }
        for json in bulletins.iter().filter_map(|e| e.to_json().ok()) {
            if self.bulletin_tx.send(json).is_ok() {
                sent += 1;
            }
        }

        if sent > 0 {
            info!(username = %self.username, released = sent, "Released all locks");
        }
        sent
    }

    /// Replaces the locked dates of `regions` with the server's view.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be queried.
    pub async fn resync_regions(
        &self,
        api: &dyn BulletinApi,
        regions: &[RegionCode],
    ) -> Result<(), ClientError> {
        for region in regions {
            let dates: Vec<Date> = api.locked_regions(region).await?;
            self.registry.lock().await.resync_region(region, &dates);
            debug!(region = %region, locked = dates.len(), "Resynced region locks");
        }
        Ok(())
    }

    /// Days on which a new area of `region` is being drawn.
    pub async fn locked_dates(&self, region: &RegionCode) -> Vec<Date> {
        self.registry.lock().await.locked_dates(region)
    }

    /// Returns true if someone else is drawing `region` on `date`.
    pub async fn is_region_locked_by_other(&self, region: &RegionCode, date: Date) -> bool {
        self.registry
            .lock()
            .await
            .is_region_locked_by_other(region, date, &self.username)
    }

    /// Returns true if someone else is editing `bulletin`.
    pub async fn is_bulletin_locked_by_other(&self, bulletin: &BulletinId) -> bool {
        self.registry
            .lock()
            .await
            .is_bulletin_locked_by_other(bulletin, &self.username)
    }

    /// Everyone currently editing `bulletin`.
    pub async fn bulletin_holders(&self, bulletin: &BulletinId) -> Vec<String> {
        self.registry
            .lock()
            .await
            .bulletin_holders(bulletin)
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Releases every held lock and closes the channels.
    ///
    /// Queued unlocks are flushed before the connections are dropped.
    pub async fn shutdown(mut self) {
        self.release_all().await;

        let (closed_region, _) = mpsc::unbounded_channel();
        let (closed_bulletin, _) = mpsc::unbounded_channel();
        drop(std::mem::replace(&mut self.region_tx, closed_region));
        drop(std::mem::replace(&mut self.bulletin_tx, closed_bulletin));

        for writer in self.writers.drain(..) {
            if tokio::time::timeout(SHUTDOWN_FLUSH_TIMEOUT, writer)
                .await
                .is_err()
            {
                warn!(username = %self.username, "Lock channel did not flush before shutdown");
            }
        }
        for reader in self.readers.drain(..) {
            reader.abort();
        }
    }
}

impl Drop for LockManager {
    fn drop(&mut self) {
        for task in self.writers.iter().chain(&self.readers) {
            task.abort();
        }
    }
}

fn apply_remote(registry: &mut LockRegistry, channel: Channel, text: &str) -> bool {
    let applied = match channel {
        Channel::Region => RegionLock::from_json(text).map(|e| registry.apply_region_event(&e)),
        Channel::Bulletin => {
            BulletinLock::from_json(text).map(|e| registry.apply_bulletin_event(&e))
        }
    };
    match applied {
        Ok(changed) => changed,
        Err(e) => {
            warn!(error = %e, ?channel, "Ignoring malformed lock event");
            false
        }
    }
}
