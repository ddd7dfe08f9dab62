//! Governance client: the entry point for host trading agents.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{KuneoError, Result};
use crate::heartbeat::HeartbeatService;
use crate::response::{TelemetryResult, ValidationResult};
use crate::telemetry::{AccountMetrics, EventType, TelemetrySnapshot};
use crate::transport::{HttpTransport, Transport};
use crate::validation::TradeRequest;

use super::inner::SessionCore;

/// Client connecting one trading agent to the Kuneo governance service.
///
/// It reports account telemetry, asks for approval before each order and
/// tracks the halt signal. An optional background heartbeat keeps re-sending
/// the last reported figures while the host is idle.
///
/// Network failures never surface as errors. Telemetry fails open (the result
/// says `CONTINUE`), trade validation fails closed (the result says
/// `REJECT_TRADE`). Each client owns its own state, so several clients can
/// run side by side for multi-account agents.
///
/// # Example
///
/// ```no_run
/// use kuneo::{AccountMetrics, ClientConfig, EventType, KuneoClient, TradeRequest, TradeSide};
///
/// # async fn run() -> kuneo::Result<()> {
/// let client = KuneoClient::new(ClientConfig::new("kuneo_live_abc123"))?;
/// client.start().await?;
///
/// let metrics = AccountMetrics::new().with_balance(10_000.0).with_equity(9_800.0).with_positions(2);
/// client.send_telemetry(metrics, EventType::Heartbeat, None).await;
///
/// let trade = TradeRequest::new("EURUSD", TradeSide::Buy, 0.01, 10_000.0, 9_800.0, 2);
/// if !client.is_halted() && client.validate_trade(&trade).await.is_approved() {
///     // submit the order
/// }
///
/// client.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct KuneoClient {
    core: Arc<SessionCore>,
    heartbeat: Mutex<Option<HeartbeatService>>,
    stopped: AtomicBool,
}

impl KuneoClient {
    /// Create a client talking HTTPS to `config.base_url`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config.timeout)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            core: Arc::new(SessionCore::new(config, transport)),
            heartbeat: Mutex::new(None),
            stopped: AtomicBool::new(false),
        })
    }

    /// Identifier attached to every log event of this session.
    pub fn session_id(&self) -> Uuid {
        self.core.id()
    }

    pub fn config(&self) -> &ClientConfig {
        self.core.config()
    }

    /// Spawn the heartbeat task if `auto_heartbeat` is enabled.
    ///
    /// Call once per session. A second call while the heartbeat is running
    /// logs a warning and does nothing. Starting a stopped client is an error.
    pub async fn start(&self) -> Result<()> {
        let mut heartbeat = self.heartbeat.lock().await;

        if self.stopped.load(Ordering::SeqCst) {
            return Err(KuneoError::Session("client has been stopped".to_string()));
        }

        let config = self.core.config();
        if !config.auto_heartbeat {
            debug!(session = %self.core.id(), "Auto heartbeat disabled");
            return Ok(());
        }

        if heartbeat.as_ref().is_some_and(|h| !h.is_finished()) {
            warn!(session = %self.core.id(), "Heartbeat service already running");
            return Ok(());
        }

        *heartbeat = Some(HeartbeatService::spawn(
            Arc::clone(&self.core),
            config.heartbeat_initial_delay,
            config.heartbeat_interval,
        ));
        Ok(())
    }

    /// Stop the heartbeat, wait for it to exit, then release the transport.
    ///
    /// Safe to call without `start()` and safe to call more than once.
    /// Foreground calls already in flight are not cancelled.
    pub async fn stop(&self) {
        let first = !self.stopped.swap(true, Ordering::SeqCst);

        let heartbeat = self.heartbeat.lock().await.take();
        if let Some(heartbeat) = heartbeat {
            heartbeat.shutdown().await;
        }

        if first {
            self.core.transport().close().await;
            info!(session = %self.core.id(), "Kuneo client stopped");
        }
    }

    /// Returns `true` while the heartbeat task is alive.
    pub async fn is_running(&self) -> bool {
        self.heartbeat
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Report account telemetry.
    ///
    /// Unset fields of `metrics` are left out of the payload. The snapshot
    /// becomes the heartbeat cache whether or not the request succeeds. A
    /// halt directive in the response latches [`is_halted`](Self::is_halted).
    pub async fn send_telemetry(
        &self,
        metrics: AccountMetrics,
        event_type: EventType,
        attestation: Option<String>,
    ) -> TelemetryResult {
        self.core
            .send_snapshot(TelemetrySnapshot::new(metrics, event_type, attestation))
            .await
    }

    /// Ask the governance service to approve `trade` before submitting it.
    ///
    /// Only submit when the result [`is_approved`](crate::GovernanceResponse::is_approved).
    /// If the service cannot be reached the result is a rejection.
    pub async fn validate_trade(&self, trade: &TradeRequest) -> ValidationResult {
        self.core.validate_trade(trade).await
    }

    /// Whether the governance service has ordered this agent to halt. Once
    /// `true`, stays `true` for the life of the client.
    pub fn is_halted(&self) -> bool {
        self.core.state().is_halted()
    }

    /// The most recently attempted telemetry snapshot.
    pub async fn last_snapshot(&self) -> Option<TelemetrySnapshot> {
        self.core.state().last_snapshot().await
    }
}
