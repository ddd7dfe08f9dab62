//! Session internals shared between the client and its heartbeat task.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{KuneoError, Result};
use crate::response::{GovernanceResponse, TelemetryResult, ValidationResult, Verdict};
use crate::telemetry::TelemetrySnapshot;
use crate::transport::Transport;
use crate::validation::{TradeRequest, ValidationRequest};

use super::state::SessionState;

pub(crate) struct SessionCore {
    id: Uuid,
    config: ClientConfig,
    telemetry_url: String,
    validate_url: String,
    transport: Arc<dyn Transport>,
    state: SessionState,
}

impl SessionCore {
    pub(crate) fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            id: Uuid::new_v4(),
            telemetry_url: config.telemetry_url(),
            validate_url: config.validate_url(),
            config,
            transport,
            state: SessionState::new(),
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn state(&self) -> &SessionState {
        &self.state
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// One bounded request. An elapsed timeout is a transport failure like any other.
    async fn post(&self, url: &str, body: &Value) -> Result<GovernanceResponse> {
        let timeout = self.config.timeout;
        let reply = tokio::time::timeout(timeout, self.transport.post_json(url, body))
            .await
            .map_err(|_| KuneoError::Timeout(timeout))??;
        GovernanceResponse::from_value(reply)
    }

    /// Send one telemetry snapshot. Never fails: transport errors yield a
    /// `status=ERROR, action=CONTINUE` result.
    pub(crate) async fn send_snapshot(&self, snapshot: TelemetrySnapshot) -> TelemetryResult {
        let body = serde_json::to_value(&snapshot);

        // Cached before the request so heartbeats replay the latest attempt,
        // whether or not it reaches the service.
        self.state.record_snapshot(snapshot).await;

        let outcome = match body {
            Ok(body) => self.post(&self.telemetry_url, &body).await,
            Err(e) => Err(e.into()),
        };

        match outcome {
            Ok(response) => {
                self.observe_halt(&response);
                response
            }
            Err(e) => {
                error!(session = %self.id, "Kuneo telemetry error: {}", e);
                GovernanceResponse::telemetry_unavailable(&e)
            }
        }
    }

    /// Ask the service to approve `trade`. Never fails: transport errors and
    /// unsendable trades yield a `validation=ERROR, action=REJECT_TRADE` result.
    pub(crate) async fn validate_trade(&self, trade: &TradeRequest) -> ValidationResult {
        let response = match self.request_validation(trade).await {
            Ok(response) => response,
            Err(e) if e.is_transport() => {
                error!(session = %self.id, symbol = %trade.symbol, "Kuneo validation error: {}", e);
                return GovernanceResponse::validation_unavailable(&e);
            }
            Err(e) => {
                warn!(session = %self.id, symbol = %trade.symbol, "Trade not sent to Kuneo: {}", e);
                return GovernanceResponse::invalid_trade(&e);
            }
        };

        if response.validation() == Some(Verdict::Fail) {
            warn!(
                session = %self.id,
                symbol = %trade.symbol,
                side = %trade.side,
                "Trade REJECTED by Kuneo: {}",
                response.reason().unwrap_or("no reason given")
            );
            for violation in response.violations() {
                warn!(session = %self.id, "   - {}: {}", violation.policy, violation.message);
            }
        }

        self.observe_halt(&response);
        response
    }

    async fn request_validation(&self, trade: &TradeRequest) -> Result<GovernanceResponse> {
        trade.check()?;
        let body = serde_json::to_value(ValidationRequest::new(&self.config.api_key, trade))?;
        self.post(&self.validate_url, &body).await
    }

    fn observe_halt(&self, response: &GovernanceResponse) {
        if !response.is_halt_directive() {
            return;
        }

        let first = self.state.latch_halt();
        warn!(
            session = %self.id,
            first,
            "KUNEO HALT: {}",
            response
                .message()
                .unwrap_or("Agent halted by governance system")
        );
    }
}
