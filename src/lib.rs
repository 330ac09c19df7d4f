//! Real-time vehicle tracking relay
//!
//! A persistent-connection gateway that lets many clients subscribe to a
//! vehicle's position stream. Clients join a per-vehicle room with
//! `start_tracking`, push position reports with `location_update` (persisted
//! through a pluggable [`LocationStore`] port, then rebroadcast to the room),
//! and tear the room down with `stop_tracking`. A snapshot of connected
//! clients and actively tracked vehicles is available both in-band
//! (`get_stats`) and through a stateless status endpoint.
//!
//! # Architecture
//!
//! ```text
//!   [client] ──TCP/JSON──► Connection ──► TrackingGateway ──► LocationStore
//!                              ▲               │ Mutex<registry+rooms+active>
//!                              │               ▼
//!                              └──── room broadcast (Bytes fan-out)
//! ```
//!
//! All gateway state lives behind a single lock that is never held across
//! the persistence await, so broadcast order for a vehicle follows
//! persistence-completion order rather than request-arrival order.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use fleet_relay::persistence::MemoryLocationStore;
//! use fleet_relay::{RelayServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> fleet_relay::Result<()> {
//!     let store = Arc::new(MemoryLocationStore::new());
//!     store.register_vehicle("V1").await;
//!
//!     let config = ServerConfig::default();
//!     let server = RelayServer::new(config, store);
//!     server.run().await
//! }
//! ```

pub mod error;
pub mod gateway;
pub mod persistence;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod stats;

pub use error::{Error, Result};
pub use gateway::TrackingGateway;
pub use persistence::{LocationRecord, LocationStore, StoreError};
pub use registry::ClientId;
pub use server::{RelayServer, ServerConfig};
pub use stats::StatsSnapshot;
