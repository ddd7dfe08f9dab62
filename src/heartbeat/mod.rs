//! Heartbeat service - periodic replay of the last telemetry snapshot.

mod service;

pub use service::HeartbeatService;
