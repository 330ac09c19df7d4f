//! Connection registry
//!
//! Tracks every live client connection for the lifetime of its transport
//! session. Pure map mutation with no failure modes; identifier allocation
//! lives here so the registry is the single source of connection identity.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Unique identifier of a client connection, allocated on accept
pub type ClientId = u64;

/// Send capability for a connection's outbound queue
///
/// The writer half of the connection drains this queue; everything the
/// server emits to a client (acks, broadcasts, errors) goes through it, so
/// per-client output ordering is preserved.
pub type OutboundSender = mpsc::UnboundedSender<Bytes>;

/// A live client connection as seen by the relay
#[derive(Debug, Clone)]
pub struct ClientHandle {
    /// Unique connection id
    pub id: ClientId,

    /// When the connection was accepted
    pub connected_at: DateTime<Utc>,

    /// Outbound send capability
    pub sender: OutboundSender,
}

impl ClientHandle {
    /// Queue a frame for delivery to this client
    ///
    /// A send failure means the connection's writer is gone and the
    /// connection is about to be torn down; the frame is simply dropped.
    pub fn send(&self, frame: Bytes) {
        let _ = self.sender.send(frame);
    }
}

/// Registry of all live connections
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    clients: HashMap<ClientId, ClientHandle>,
    next_id: ClientId,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection, allocating its id
    pub fn add(&mut self, sender: OutboundSender) -> ClientId {
        self.next_id += 1;
        let id = self.next_id;

        self.clients.insert(
            id,
            ClientHandle {
                id,
                connected_at: Utc::now(),
                sender,
            },
        );

        id
    }

    /// Remove a connection, returning its handle if it was registered
    pub fn remove(&mut self, id: ClientId) -> Option<ClientHandle> {
        self.clients.remove(&id)
    }

    /// Look up a live connection
    pub fn get(&self, id: ClientId) -> Option<&ClientHandle> {
        self.clients.get(&id)
    }

    /// Number of live connections
    pub fn count(&self) -> usize {
        self.clients.len()
    }
}
