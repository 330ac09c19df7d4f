//! In-memory relay state: connections, rooms, active vehicles
//!
//! Three pieces of bookkeeping back the relay:
//!
//! - [`ConnectionRegistry`]: every live client connection and its outbound
//!   send capability.
//! - [`VehicleRooms`]: vehicle id → set of subscribed connections, the
//!   fan-out primitive. Rooms hold lightweight send handles, never transport
//!   sockets, and an empty room is dropped rather than materialized.
//! - [`ActiveVehicleSet`]: vehicles under explicit tracking activation.
//!   Independent of room membership; a vehicle stays active with zero
//!   subscribers until `stop_tracking`.
//!
//! # Architecture
//!
//! ```text
//!                   Mutex<GatewayState>
//!              ┌───────────────────────────┐
//!              │ registry: id → handle     │
//!              │ rooms:    vehicle → {id → │
//!              │              sender}      │
//!              │ active:   {vehicle}       │
//!              └─────────────┬─────────────┘
//!                            │ broadcast(vehicle, Bytes)
//!              ┌─────────────┼─────────────┐
//!              ▼             ▼             ▼
//!        [subscriber]  [subscriber]  [subscriber]
//!        outbound mpsc → connection writer → TCP
//! ```
//!
//! The structures themselves are plain single-threaded maps; the gateway
//! guards all three as one unit so every mutation runs to completion without
//! an intervening suspension point.

pub mod active;
pub mod connection;
pub mod rooms;

pub use active::ActiveVehicleSet;
pub use connection::{ClientHandle, ClientId, ConnectionRegistry, OutboundSender};
pub use rooms::VehicleRooms;
