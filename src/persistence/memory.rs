//! In-memory location store
//!
//! Keeps the last recorded position per known vehicle. Vehicles must be
//! registered before updates are accepted, so the `NotFound` path of the
//! port is exercisable without a database. Used by the demos and tests.

use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use async_trait::async_trait;

use super::{LocationRecord, LocationStore, StoreError};

/// Map-backed [`LocationStore`] implementation
#[derive(Debug, Default)]
pub struct MemoryLocationStore {
    positions: RwLock<HashMap<String, Option<LocationRecord>>>,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a vehicle known to the store, with no recorded position yet
    pub async fn register_vehicle(&self, vehicle_id: &str) {
        self.positions
            .write()
            .await
            .entry(vehicle_id.to_owned())
            .or_insert(None);
    }

    /// Last recorded position of a vehicle, if any
    pub async fn last_position(&self, vehicle_id: &str) -> Option<LocationRecord> {
        self.positions
            .read()
            .await
            .get(vehicle_id)
            .and_then(Clone::clone)
    }
}

#[async_trait]
impl LocationStore for MemoryLocationStore {
    async fn update_location(
        &self,
        vehicle_id: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<LocationRecord, StoreError> {
        let mut positions = self.positions.write().await;

        let slot = positions
            .get_mut(vehicle_id)
            .ok_or_else(|| StoreError::NotFound(vehicle_id.to_owned()))?;

        let record = LocationRecord {
            vehicle_id: vehicle_id.to_owned(),
            latitude,
            longitude,
            timestamp: Utc::now(),
        };
        *slot = Some(record.clone());

        Ok(record)
    }
}
