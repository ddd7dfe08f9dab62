//! Kuneo - governance sidecar for automated trading agents
//!
//! Reports account telemetry to the Kuneo governance service, asks for
//! approval before each order and tracks the halt signal the agent must obey.
//! Start with [`KuneoClient`].

pub mod config;
pub mod error;
pub mod heartbeat;
pub mod response;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod validation;

pub use config::ClientConfig;
pub use error::{KuneoError, Result};
pub use response::{Action, GovernanceResponse, TelemetryResult, ValidationResult, Verdict, Violation};
pub use session::KuneoClient;
pub use telemetry::{AccountMetrics, EventType, TelemetrySnapshot};
pub use transport::{HttpTransport, Transport};
pub use validation::{TradeRequest, TradeSide};
