//! Tracking gateway
//!
//! The message-handling core of the relay: owns the connection registry,
//! vehicle rooms and active-vehicle set behind a single lock, routes inbound
//! events to them, and shapes replies and broadcasts. Transport-agnostic;
//! the server layer feeds it parsed messages and an outbound send capability
//! per connection.

pub mod dispatcher;
pub mod ingest;

pub use dispatcher::TrackingGateway;
pub use ingest::LocationReport;
