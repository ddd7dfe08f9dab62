//! Transport abstraction for the governance API.
//!
//! The session only needs "POST this JSON, give me the JSON back". Anything
//! that can do that implements [`Transport`]; [`HttpTransport`] is the default
//! and speaks HTTPS through reqwest.

mod http;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub use http::HttpTransport;

/// Request/response primitive used by [`KuneoClient`](crate::KuneoClient).
///
/// Implementations return the decoded response body for any reply that
/// carries JSON, whatever its HTTP status: the governance service delivers
/// halt directives with 4xx statuses. Connection failures and undecodable
/// bodies are errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as JSON to `url` and return the decoded JSON reply.
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value>;

    /// Release connections. Later calls to `post_json` may fail.
    async fn close(&self) {}
}
