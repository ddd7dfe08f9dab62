//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{KuneoError, Result};

use super::Transport;

const KUNEO_USER_AGENT: &str = concat!("kuneo-rs/", env!("CARGO_PKG_VERSION"));

/// HTTPS transport with a pooled reqwest client.
pub struct HttpTransport {
    client: RwLock<Option<Client>>,
}

impl HttpTransport {
    /// Create a transport whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(KUNEO_USER_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self::with_client(client))
    }

    /// Wrap an existing client (custom proxies, TLS roots, etc.).
    pub fn with_client(client: Client) -> Self {
        Self {
            client: RwLock::new(Some(client)),
        }
    }

    /// Returns `true` once [`Transport::close`] has been called.
    pub async fn is_closed(&self) -> bool {
        self.client.read().await.is_none()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        // Clone out of the lock so close() never waits on an in-flight request.
        let client = self
            .client
            .read()
            .await
            .clone()
            .ok_or_else(|| KuneoError::Transport("transport is closed".to_string()))?;

        let response = client.post(url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(status = %status, "Governance API returned non-success status");
        }

        serde_json::from_str(&text).map_err(|e| {
            KuneoError::MalformedResponse(format!("HTTP {} with non-JSON body: {}", status, e))
        })
    }

    async fn close(&self) {
        self.client.write().await.take();
    }
}
