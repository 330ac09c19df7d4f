//! Wire protocol for the tracking relay
//!
//! Messages are newline-delimited JSON objects in an adjacently tagged
//! envelope: `{"event": "<name>", "data": {...}}`. Inbound events are
//! `start_tracking`, `location_update`, `stop_tracking` and `get_stats`;
//! everything the server emits (acks included) travels as an outbound event
//! in the same envelope.
//!
//! Unknown event names and malformed JSON are dropped by the connection
//! layer, never answered and never fatal.

pub mod message;
pub mod wire;

pub use message::{Ack, ClientMessage, LocationUpdateData, ServerEvent, TrackVehicleData};
pub use wire::encode_event;
