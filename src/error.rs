//! Error types for Kuneo
//!
//! Internal error type for the governance client. Uses `thiserror` for
//! `Display` and `Error` implementations. None of these errors cross the
//! public boundary of [`send_telemetry`](crate::KuneoClient::send_telemetry) or
//! [`validate_trade`](crate::KuneoClient::validate_trade): both normalize them
//! into synthesized [`GovernanceResponse`](crate::GovernanceResponse) values.

use std::time::Duration;

use thiserror::Error;

/// The primary error type for Kuneo operations.
#[derive(Error, Debug)]
pub enum KuneoError {
    /// Configuration errors (missing API key, bad base URL, zero timeout, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failures that are not reqwest errors (closed transport, etc.)
    #[error("Transport error: {0}")]
    Transport(String),

    /// HTTP request errors (connection refused, TLS, reqwest timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The governance service did not answer within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The governance service answered with something other than a JSON object
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A trade request that cannot be sent (non-finite volume or balance)
    #[error("Invalid trade request: {0}")]
    InvalidTrade(String),

    /// Session lifecycle misuse (start after stop, etc.)
    #[error("Session error: {0}")]
    Session(String),
}

impl KuneoError {
    /// Returns `true` for errors raised while talking to the governance service.
    ///
    /// A failed validation reports these as an unavailable governance system.
    /// Anything else is a problem with the request itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            KuneoError::Transport(_)
                | KuneoError::Http(_)
                | KuneoError::Json(_)
                | KuneoError::Timeout(_)
                | KuneoError::MalformedResponse(_)
        )
    }
}

/// A specialized `Result` type for Kuneo operations.
pub type Result<T> = std::result::Result<T, KuneoError>;
