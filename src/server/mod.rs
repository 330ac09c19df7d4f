//! TCP transport for the tracking relay
//!
//! [`RelayServer`] accepts persistent client connections and speaks the
//! newline-delimited JSON protocol over them; each accepted socket gets its
//! own task running a [`connection::Connection`] loop against the shared
//! [`TrackingGateway`](crate::gateway::TrackingGateway). An optional second
//! listener serves one stats snapshot per connection for out-of-band
//! monitoring.

pub mod config;
pub mod connection;
pub mod listener;
pub mod status;

pub use config::ServerConfig;
pub use connection::Connection;
pub use listener::RelayServer;
