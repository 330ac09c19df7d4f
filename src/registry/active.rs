//! Active-vehicle tracking state
//!
//! A vehicle is `Active` from the moment a `start_tracking` is accepted
//! until an explicit `stop_tracking`, independent of how many subscribers
//! its room has. Membership never expires on its own and disconnects never
//! prune it.

use std::collections::BTreeSet;

/// Set of vehicle ids currently under active tracking
///
/// Backed by a `BTreeSet` so [`vehicles`](Self::vehicles) yields a
/// deterministic order for snapshots.
#[derive(Debug, Default)]
pub struct ActiveVehicleSet {
    vehicles: BTreeSet<String>,
}

impl ActiveVehicleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a vehicle active. Returns `false` if it already was (idempotent).
    pub fn start(&mut self, vehicle_id: &str) -> bool {
        self.vehicles.insert(vehicle_id.to_owned())
    }

    /// Mark a vehicle inactive. Returns `false` if it was not active; the
    /// call is still accepted as a no-op.
    pub fn stop(&mut self, vehicle_id: &str) -> bool {
        self.vehicles.remove(vehicle_id)
    }

    /// Whether a vehicle is currently active
    pub fn contains(&self, vehicle_id: &str) -> bool {
        self.vehicles.contains(vehicle_id)
    }

    /// Number of active vehicles
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Active vehicle ids as an ordered list
    pub fn vehicles(&self) -> Vec<String> {
        self.vehicles.iter().cloned().collect()
    }
}
