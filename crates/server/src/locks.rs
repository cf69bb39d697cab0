// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! WebSocket channels for advisory lock events.
//!
//! Two channels exist, one for regions being drawn on a day and one for
//! bulletins being edited. A message a forecaster sends on a channel is
//! applied to the server's lock registry and relayed to every other
//! connection of that channel.
//!
//! # Architecture
//!
//! - Locks are facts, never enforced by the server
//! - Nothing is persisted and nothing is audited
//! - Each connection's locks are tracked separately, so a forecaster may
//!   hold locks from several connections at once
//! - When a connection closes, unlocks are broadcast for the locks it
//!   still held that no other open connection holds as well
//! - Clients reconcile missed events through `GET /regions/locked`

use albina::LockRegistry;
use albina_domain::{BulletinLock, DomainError, RegionLock};
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, stream::StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, error, info, warn};

/// Maximum number of events to buffer in a broadcast channel.
/// If clients cannot keep up, older events are dropped.
const EVENT_BUFFER_SIZE: usize = 256;

/// Source of connection identifiers, so relays skip the sender.
static CONNECTION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// The two lock domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockChannel {
    /// `/ws/region/{username}`
    Region,
    /// `/ws/bulletin/{username}`
    Bulletin,
}

/// A lock event on one of the channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockMessage {
    /// A region lock or unlock.
    Region(RegionLock),
    /// A bulletin lock or unlock.
    Bulletin(BulletinLock),
}

impl LockMessage {
    /// Decodes a client message for `channel`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::LockEncoding` if the message is malformed.
    pub fn decode(channel: LockChannel, text: &str) -> Result<Self, DomainError> {
        match channel {
            LockChannel::Region => RegionLock::from_json(text).map(Self::Region),
            LockChannel::Bulletin => BulletinLock::from_json(text).map(Self::Bulletin),
        }
    }

    /// Encodes the message in its wire form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::LockEncoding` if serialization fails.
    pub fn encode(&self) -> Result<String, DomainError> {
        match self {
            Self::Region(event) => event.to_json(),
            Self::Bulletin(event) => event.to_json(),
        }
    }

    /// The forecaster the event is about.
    #[must_use]
    pub fn username(&self) -> &str {
        match self {
            Self::Region(event) => &event.username,
            Self::Bulletin(event) => &event.username,
        }
    }

    /// Returns true for a lock, false for an unlock.
    #[must_use]
    pub const fn is_lock(&self) -> bool {
        match self {
            Self::Region(event) => event.lock,
            Self::Bulletin(event) => event.lock,
        }
    }

    /// The same event as a lock.
    #[must_use]
    pub fn acquired(&self) -> Self {
        match self {
            Self::Region(event) => Self::Region(RegionLock {
                lock: true,
                ..event.clone()
            }),
            Self::Bulletin(event) => Self::Bulletin(BulletinLock {
                lock: true,
                ..event.clone()
            }),
        }
    }

    /// The same event as an unlock.
    #[must_use]
    pub fn released(&self) -> Self {
        match self {
            Self::Region(event) => Self::Region(event.released()),
            Self::Bulletin(event) => Self::Bulletin(event.released()),
        }
    }

    /// Applies the event to `registry`; returns true if it changed.
    pub fn apply_to(&self, registry: &mut LockRegistry) -> bool {
        match self {
            Self::Region(event) => registry.apply_region_event(event),
            Self::Bulletin(event) => registry.apply_bulletin_event(event),
        }
    }
}

/// A relayed lock message with the connection it came from.
#[derive(Debug, Clone)]
struct Envelope {
    /// Connection that sent the message, 0 for server-originated unlocks.
    origin: u64,
    message: LockMessage,
}

/// Broadcaster for one lock channel.
#[derive(Clone)]
pub struct LockBroadcaster {
    tx: broadcast::Sender<Envelope>,
}

impl LockBroadcaster {
    /// Creates a new broadcaster.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    fn broadcast(&self, origin: u64, message: LockMessage) {
        match self.tx.send(Envelope { origin, message }) {
            Ok(count) => debug!(receivers = count, "Relayed lock event"),
            Err(_) => debug!("No receivers for lock event"),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }
}

impl Default for LockBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared lock state of the server.
#[derive(Clone)]
pub struct LockHub {
    /// The server's view of who holds what.
    pub registry: Arc<Mutex<LockRegistry>>,
    /// Locks each open connection holds, as lock events.
    held: Arc<Mutex<HashMap<u64, Vec<LockMessage>>>>,
    regions: LockBroadcaster,
    bulletins: LockBroadcaster,
}

impl LockHub {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(LockRegistry::new())),
            held: Arc::new(Mutex::new(HashMap::new())),
            regions: LockBroadcaster::new(),
            bulletins: LockBroadcaster::new(),
        }
    }

    const fn broadcaster(&self, channel: LockChannel) -> &LockBroadcaster {
        match channel {
            LockChannel::Region => &self.regions,
            LockChannel::Bulletin => &self.bulletins,
        }
    }

    /// Handles one text message from `username`'s connection.
    ///
    /// Malformed messages and messages about another forecaster are
    /// dropped. Accepted events are applied to the registry and relayed
    /// whether or not they changed it.
    ///
    /// # Returns
    ///
    /// The accepted event, if any.
    pub async fn receive(
        &self,
        channel: LockChannel,
        connection: u64,
        username: &str,
        text: &str,
    ) -> Option<LockMessage> {
        let message: LockMessage = match LockMessage::decode(channel, text) {
            Ok(message) => message,
            Err(e) => {
                warn!(username, error = %e, "Dropping malformed lock message");
                return None;
            }
        };

        if message.username() != username {
            warn!(
                username,
                claimed = message.username(),
                "Dropping lock message sent on behalf of another forecaster"
            );
            return None;
        }

        let mut registry = self.registry.lock().await;
        message.apply_to(&mut registry);
        self.track(connection, &message).await;
        drop(registry);

        self.broadcaster(channel)
            .broadcast(connection, message.clone());
        Some(message)
    }

    /// Records that `connection` took or gave up the lock `message` names.
    async fn track(&self, connection: u64, message: &LockMessage) {
        let mut held = self.held.lock().await;
        let locks: &mut Vec<LockMessage> = held.entry(connection).or_default();
        if message.is_lock() {
            if !locks.contains(message) {
                locks.push(message.clone());
            }
        } else {
            let acquired: LockMessage = message.acquired();
            locks.retain(|lock| *lock != acquired);
        }
        if locks.is_empty() {
            held.remove(&connection);
        }
    }

    /// Releases the locks `connection` held on `channel` and broadcasts
    /// the unlocks.
    ///
    /// A lock that another open connection of the same forecaster also
    /// holds stays in place.
    ///
    /// # Returns
    ///
    /// The unlock events that were broadcast.
    pub async fn release(&self, channel: LockChannel, connection: u64) -> Vec<LockMessage> {
        let mut registry = self.registry.lock().await;
        let mut held = self.held.lock().await;
        let closed: Vec<LockMessage> = held.remove(&connection).unwrap_or_default();

        let unlocks: Vec<LockMessage> = closed
            .iter()
            .filter(|lock| !held.values().any(|other| other.contains(lock)))
            .map(LockMessage::released)
            .collect();
        drop(held);

        for unlock in &unlocks {
            unlock.apply_to(&mut registry);
            self.broadcaster(channel).broadcast(0, unlock.clone());
        }
        drop(registry);

        if !unlocks.is_empty() {
            info!(connection, released = unlocks.len(), ?channel, "Released stale locks");
        }
        unlocks
    }
}

impl Default for LockHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Serves one lock channel connection of `username` until it closes.
pub async fn handle_socket(socket: WebSocket, hub: LockHub, channel: LockChannel, username: String) {
    let connection: u64 = CONNECTION_COUNTER.fetch_add(1, Ordering::SeqCst);
    info!(%username, connection, ?channel, "Lock channel connected");

    let (mut sender, mut receiver) = socket.split();
    let mut rx: broadcast::Receiver<Envelope> = hub.broadcaster(channel).subscribe();

    let mut send_task = tokio::spawn(async move {
        loop {
            let envelope: Envelope = match rx.recv().await {
                Ok(envelope) => envelope,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Lock channel lagged, events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if envelope.origin == connection {
                continue;
            }
            match envelope.message.encode() {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!(error = %e, "Failed to encode lock event"),
            }
        }
    });

    let recv_hub: LockHub = hub.clone();
    let recv_username: String = username.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    recv_hub
                        .receive(channel, connection, &recv_username, text.as_str())
                        .await;
                }
                Ok(Message::Binary(_)) => warn!("Ignoring binary lock message"),
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            debug!("Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("Receive task completed");
            send_task.abort();
        }
    }

    hub.release(channel, connection).await;
    info!(%username, connection, ?channel, "Lock channel disconnected");
}
