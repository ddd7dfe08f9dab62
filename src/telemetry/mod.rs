//! Account telemetry reported to the governance service.

pub mod attestation;
mod snapshot;

pub use snapshot::{now_millis, AccountMetrics, EventType, TelemetrySnapshot};

pub(crate) use snapshot::is_unset;
