//! Location persistence port
//!
//! The relay never stores positions itself; ownership of a report passes to
//! an implementation of [`LocationStore`] the moment it is validated. The
//! store call is the single suspension point in the message-handling path,
//! so broadcast order for a vehicle follows persistence-completion order.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use memory::MemoryLocationStore;

/// A location report as recorded by the store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub vehicle_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Timestamp assigned by the store when the write was accepted
    pub timestamp: DateTime<Utc>,
}

/// Failure modes of the persistence port
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The vehicle id is unknown to the store
    #[error("vehicle {0} not found")]
    NotFound(String),

    /// The storage layer was unavailable or rejected the write
    #[error("persistence failure: {0}")]
    Failure(String),
}

/// External port used to durably record location reports
///
/// The call may suspend for as long as the backing store needs; the relay
/// holds no locks across it. A call that never returns leaves that single
/// request un-acknowledged without blocking any other connection or vehicle.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Record a position for a vehicle, returning the stored record with the
    /// timestamp the store assigned.
    async fn update_location(
        &self,
        vehicle_id: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<LocationRecord, StoreError>;
}
