//! Protocol dispatcher
//!
//! Routes the four inbound message kinds plus the connect/disconnect
//! lifecycle hooks to the relay state, and shapes replies and broadcasts.
//!
//! All state (registry + rooms + active set) sits behind one mutex so every
//! mutation is serialized as a unit. The lock is never held across the
//! persistence await in `location_update`; that call is the only suspension
//! point, which makes broadcast order for a vehicle follow
//! persistence-completion order rather than request-arrival order. A
//! `stop_tracking` that empties a room while an update is in flight turns
//! the eventual broadcast into a zero-recipient no-op.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::gateway::ingest;
use crate::persistence::LocationStore;
use crate::protocol::message::{Ack, ClientMessage, LocationUpdateData, TrackVehicleData};
use crate::protocol::wire::encode_event;
use crate::protocol::ServerEvent;
use crate::registry::{ActiveVehicleSet, ClientId, ConnectionRegistry, OutboundSender, VehicleRooms};
use crate::stats::StatsSnapshot;

/// Mutable relay state, guarded as one unit
#[derive(Debug, Default)]
struct GatewayState {
    registry: ConnectionRegistry,
    rooms: VehicleRooms,
    active: ActiveVehicleSet,
}

/// The tracking relay core
///
/// One instance owns all connection, room and tracking state for a gateway.
/// Construct it once, share it via `Arc` with every connection task, and let
/// it drop on shutdown; no ambient globals.
pub struct TrackingGateway {
    state: Mutex<GatewayState>,
    store: Arc<dyn LocationStore>,
}

impl TrackingGateway {
    /// Create a gateway backed by the given persistence port
    pub fn new(store: Arc<dyn LocationStore>) -> Self {
        Self {
            state: Mutex::new(GatewayState::default()),
            store,
        }
    }

    /// Accept a new connection
    ///
    /// Registers the send capability, allocates the client id and emits the
    /// `connected` greeting to the new client.
    pub async fn connect(&self, sender: OutboundSender) -> ClientId {
        let mut state = self.state.lock().await;
        let client_id = state.registry.add(sender);

        if let Some(handle) = state.registry.get(client_id) {
            if let Ok(frame) = encode_event(&ServerEvent::Connected {
                client_id,
                timestamp: handle.connected_at,
            }) {
                handle.send(frame);
            }
        }

        tracing::info!(
            client_id,
            total_clients = state.registry.count(),
            "client connected"
        );
        client_id
    }

    /// Tear down a connection
    ///
    /// Removes it from the registry and from every room it joined. The
    /// active-vehicle set is untouched; disconnection does not imply
    /// `stop_tracking`.
    pub async fn disconnect(&self, client_id: ClientId) {
        let mut state = self.state.lock().await;
        state.registry.remove(client_id);
        state.rooms.leave_all(client_id);

        tracing::info!(
            client_id,
            total_clients = state.registry.count(),
            "client disconnected"
        );
    }

    /// Route an inbound message to its handler
    ///
    /// Always produces an acknowledgment. On failure the caller additionally
    /// receives an `error` event, so transports that don't surface the ack
    /// value still see the failure. Errors are never broadcast, never
    /// retried and never fatal to the connection.
    pub async fn dispatch(&self, client_id: ClientId, message: ClientMessage) -> Ack {
        let result = match message {
            ClientMessage::StartTracking(data) => self.start_tracking(client_id, data).await,
            ClientMessage::LocationUpdate(data) => self.location_update(client_id, data).await,
            ClientMessage::StopTracking(data) => self.stop_tracking(client_id, data).await,
            ClientMessage::GetStats => self.get_stats(client_id).await,
        };

        match result {
            Ok(ack) => ack,
            Err(err) => {
                let message = err.caller_message();
                tracing::warn!(client_id, error = %message, "request failed");

                self.send_to(
                    client_id,
                    &ServerEvent::Error {
                        message: message.clone(),
                    },
                )
                .await;
                Ack::failed(message)
            }
        }
    }

    /// Point-in-time statistics, usable outside the persistent transport
    pub async fn stats_snapshot(&self) -> StatsSnapshot {
        let state = self.state.lock().await;
        StatsSnapshot::new(state.registry.count(), state.active.vehicles())
    }

    async fn start_tracking(&self, client_id: ClientId, data: TrackVehicleData) -> Result<Ack> {
        let vehicle_id = ingest::required_vehicle_id(&data)?;

        let mut state = self.state.lock().await;
        let sender = state
            .registry
            .get(client_id)
            .map(|handle| handle.sender.clone())
            .ok_or_else(|| Error::Validation("connection closed".into()))?;

        // Idempotent: re-activation and re-join are both accepted
        state.active.start(&vehicle_id);
        state.rooms.join(&vehicle_id, client_id, sender);

        let frame = encode_event(&ServerEvent::TrackingStarted {
            vehicle_id: vehicle_id.clone(),
            timestamp: Utc::now(),
        })?;
        let delivered = state.rooms.broadcast(&vehicle_id, frame);

        tracing::debug!(
            client_id,
            vehicle = %vehicle_id,
            subscribers = delivered,
            active_vehicles = state.active.len(),
            "tracking started"
        );
        Ok(Ack::ok("Tracking started"))
    }

    async fn location_update(&self, client_id: ClientId, data: LocationUpdateData) -> Result<Ack> {
        let report = ingest::validate(&data)?;

        tracing::debug!(
            client_id,
            vehicle = %report.vehicle_id,
            latitude = report.latitude,
            longitude = report.longitude,
            "persisting location report"
        );

        // The single suspension point: no state lock is held here, so other
        // messages interleave freely while the write is pending.
        let record = self
            .store
            .update_location(&report.vehicle_id, report.latitude, report.longitude)
            .await?;

        let state = self.state.lock().await;
        let frame = encode_event(&ServerEvent::LocationUpdated {
            vehicle_id: record.vehicle_id.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            timestamp: record.timestamp,
        })?;

        // The room may have been evicted while the write was in flight;
        // broadcasting to nobody is a harmless no-op.
        let delivered = state.rooms.broadcast(&record.vehicle_id, frame);

        tracing::debug!(
            client_id,
            vehicle = %record.vehicle_id,
            subscribers = delivered,
            "location broadcast"
        );
        Ok(Ack::ok_silent())
    }

    async fn stop_tracking(&self, client_id: ClientId, data: TrackVehicleData) -> Result<Ack> {
        let vehicle_id = ingest::required_vehicle_id(&data)?;

        let mut state = self.state.lock().await;
        let was_active = state.active.stop(&vehicle_id);

        // Notify subscribers before the room is torn down
        let frame = encode_event(&ServerEvent::TrackingStopped {
            vehicle_id: vehicle_id.clone(),
            timestamp: Utc::now(),
        })?;
        state.rooms.broadcast(&vehicle_id, frame);
        state.rooms.evict_all(&vehicle_id);

        tracing::debug!(
            client_id,
            vehicle = %vehicle_id,
            was_active,
            active_vehicles = state.active.len(),
            "tracking stopped"
        );
        Ok(Ack::ok("Tracking stopped"))
    }

    async fn get_stats(&self, client_id: ClientId) -> Result<Ack> {
        let state = self.state.lock().await;
        let snapshot = StatsSnapshot::new(state.registry.count(), state.active.vehicles());

        if let Some(handle) = state.registry.get(client_id) {
            handle.send(encode_event(&ServerEvent::StatsData(snapshot))?);
        }

        Ok(Ack::ok_silent())
    }

    /// Queue an event for a single client, if it is still connected
    async fn send_to(&self, client_id: ClientId, event: &ServerEvent) {
        let state = self.state.lock().await;
        if let Some(handle) = state.registry.get(client_id) {
            match encode_event(event) {
                Ok(frame) => handle.send(frame),
                Err(err) => tracing::error!(client_id, error = %err, "failed to encode event"),
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn room_member_count(&self, vehicle_id: &str) -> usize {
        self.state.lock().await.rooms.member_count(vehicle_id)
    }

    #[cfg(test)]
    pub(crate) async fn is_vehicle_active(&self, vehicle_id: &str) -> bool {
        self.state.lock().await.active.contains(vehicle_id)
    }
}
