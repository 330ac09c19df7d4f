//! Inbound and outbound message types
//!
//! Payload fields mirror the client-facing JSON shape (camelCase keys).
//! Inbound payload fields are optional so that a missing field surfaces as a
//! validation error from the gateway rather than an unparseable message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::ClientId;
use crate::stats::StatsSnapshot;

/// Payload of `start_tracking` / `stop_tracking`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackVehicleData {
    /// Vehicle identifier; validated as present and non-empty by the gateway
    pub vehicle_id: Option<String>,
}

/// Payload of `location_update`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdateData {
    pub vehicle_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A message received from a client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    StartTracking(TrackVehicleData),
    LocationUpdate(LocationUpdateData),
    StopTracking(TrackVehicleData),
    GetStats,
}

/// Uniform per-request acknowledgment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Ack {
    /// Successful ack with a status message
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    /// Successful ack without a message (`location_update` success)
    pub fn ok_silent() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Failed ack carrying the error text
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// An event emitted by the server, either to a single caller or broadcast to
/// a vehicle room
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sent once to a client when its connection is accepted
    #[serde(rename_all = "camelCase")]
    Connected {
        client_id: ClientId,
        timestamp: DateTime<Utc>,
    },

    /// Reply to any inbound request
    Ack(Ack),

    /// Broadcast to the vehicle room on `start_tracking`
    #[serde(rename_all = "camelCase")]
    TrackingStarted {
        vehicle_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Broadcast to the vehicle room after a report is persisted
    #[serde(rename_all = "camelCase")]
    LocationUpdated {
        vehicle_id: String,
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
    },

    /// Broadcast to the vehicle room on `stop_tracking`, before eviction
    #[serde(rename_all = "camelCase")]
    TrackingStopped {
        vehicle_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Reply to `get_stats`
    StatsData(StatsSnapshot),

    /// Sent to the originating caller when its request failed
    Error { message: String },
}
