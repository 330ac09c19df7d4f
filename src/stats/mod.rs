//! Relay statistics

pub mod snapshot;

pub use snapshot::StatsSnapshot;
