//! Point-in-time relay statistics
//!
//! A snapshot is derived fresh on every request from the connection registry
//! and the active-vehicle set; it is never cached or persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point-in-time read of connection count and active-vehicle membership
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Number of live client connections
    pub connected_clients: usize,

    /// Number of vehicles under active tracking
    pub active_vehicles: usize,

    /// Active vehicle ids, ordered
    pub vehicles: Vec<String>,

    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,

    /// Set when aggregation degraded to a zeroed snapshot instead of
    /// failing; absent on the wire otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatsSnapshot {
    /// Build a snapshot from current counts
    pub fn new(connected_clients: usize, vehicles: Vec<String>) -> Self {
        Self {
            connected_clients,
            active_vehicles: vehicles.len(),
            vehicles,
            timestamp: Utc::now(),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts_follow_vehicles() {
        let snapshot = StatsSnapshot::new(2, vec!["V1".into()]);

        assert_eq!(snapshot.connected_clients, 2);
        assert_eq!(snapshot.active_vehicles, 1);
        assert_eq!(snapshot.vehicles, vec!["V1".to_owned()]);
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let snapshot = StatsSnapshot::new(0, Vec::new());
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&snapshot).unwrap()).unwrap();

        assert_eq!(value["connectedClients"], 0);
        assert_eq!(value["activeVehicles"], 0);
        assert!(value["vehicles"].as_array().unwrap().is_empty());
        assert!(value["timestamp"].is_string());
        // Degraded-only field stays off the wire when unset
        assert!(value.get("error").is_none());
    }
}
