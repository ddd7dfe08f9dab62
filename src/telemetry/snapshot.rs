//! Telemetry snapshot types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// `true` for values that must not reach the wire: absent, NaN or infinite.
/// serde_json would otherwise encode a non-finite float as `null`.
pub(crate) fn is_unset(value: &Option<f64>) -> bool {
    !matches!(value, Some(v) if v.is_finite())
}

/// Current Unix time in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// What triggered a telemetry report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Periodic liveness report.
    #[default]
    Heartbeat,
    /// An order was executed.
    Trade,
    /// A position was opened.
    PositionOpened,
    /// A position was closed.
    PositionClosed,
}

impl EventType {
    /// Wire name of the event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Heartbeat => "heartbeat",
            EventType::Trade => "trade",
            EventType::PositionOpened => "position_opened",
            EventType::PositionClosed => "position_closed",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account figures carried by a telemetry report.
///
/// Every field is optional. Unset fields are left out of the JSON body rather
/// than sent as `null`. These are also the only fields a heartbeat replays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountMetrics {
    #[serde(default, skip_serializing_if = "is_unset")]
    pub balance: Option<f64>,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub equity: Option<f64>,
    /// Used margin.
    #[serde(default, skip_serializing_if = "is_unset")]
    pub margin: Option<f64>,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub margin_free: Option<f64>,
    /// Number of open positions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<u32>,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub unrealized_pnl: Option<f64>,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub realized_pnl: Option<f64>,
}

impl AccountMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, balance: f64) -> Self {
        self.balance = Some(balance);
        self
    }

    pub fn with_equity(mut self, equity: f64) -> Self {
        self.equity = Some(equity);
        self
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = Some(margin);
        self
    }

    pub fn with_margin_free(mut self, margin_free: f64) -> Self {
        self.margin_free = Some(margin_free);
        self
    }

    pub fn with_positions(mut self, positions: u32) -> Self {
        self.positions = Some(positions);
        self
    }

    pub fn with_unrealized_pnl(mut self, pnl: f64) -> Self {
        self.unrealized_pnl = Some(pnl);
        self
    }

    pub fn with_realized_pnl(mut self, pnl: f64) -> Self {
        self.realized_pnl = Some(pnl);
        self
    }
}

/// A single telemetry report as sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    #[serde(flatten)]
    pub metrics: AccountMetrics,
    pub event_type: EventType,
    /// Attestation hash, see [`attestation::digest`](super::attestation::digest).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attestation: Option<String>,
    /// Unix time in milliseconds.
    pub timestamp: i64,
}

impl TelemetrySnapshot {
    /// Build a snapshot stamped with the current time.
    pub fn new(metrics: AccountMetrics, event_type: EventType, attestation: Option<String>) -> Self {
        Self {
            metrics,
            event_type,
            attestation,
            timestamp: now_millis(),
        }
    }

    /// Build a heartbeat replay of this snapshot.
    ///
    /// Only the account figures are carried over. The event type is forced to
    /// `heartbeat`, the attestation is dropped and the timestamp is fresh.
    pub fn to_heartbeat(&self) -> Self {
        Self::new(self.metrics.clone(), EventType::Heartbeat, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_type_wire_names() {
        assert_eq!(
            serde_json::to_value(EventType::PositionOpened).unwrap(),
            json!("position_opened")
        );
        assert_eq!(EventType::PositionClosed.to_string(), "position_closed");
        assert_eq!(EventType::default(), EventType::Heartbeat);
    }

    #[test]
    fn test_unset_fields_are_omitted() {
        let snapshot = TelemetrySnapshot {
            metrics: AccountMetrics::new()
                .with_balance(10_000.0)
                .with_equity(9_800.0)
                .with_positions(2),
            event_type: EventType::Trade,
            attestation: None,
            timestamp: 1_700_000_000_000,
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            value,
            json!({
                "balance": 10000.0,
                "equity": 9800.0,
                "positions": 2,
                "event_type": "trade",
                "timestamp": 1_700_000_000_000i64,
            })
        );
        let object = value.as_object().unwrap();
        for absent in ["margin", "margin_free", "unrealized_pnl", "realized_pnl", "attestation"] {
            assert!(!object.contains_key(absent), "{} should be omitted", absent);
        }
    }

    #[test]
    fn test_attestation_serialized_when_present() {
        let snapshot = TelemetrySnapshot::new(
            AccountMetrics::new(),
            EventType::Heartbeat,
            Some("abc123".to_string()),
        );
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["attestation"], "abc123");
        assert_eq!(value["event_type"], "heartbeat");
    }

    #[test]
    fn test_new_stamps_current_time() {
        let before = now_millis();
        let snapshot = TelemetrySnapshot::new(AccountMetrics::new(), EventType::Trade, None);
        let after = now_millis();
        assert!(snapshot.timestamp >= before && snapshot.timestamp <= after);
    }

    #[test]
    fn test_to_heartbeat_drops_classification_and_attestation() {
        let original = TelemetrySnapshot {
            metrics: AccountMetrics::new().with_balance(500.0).with_realized_pnl(-12.5),
            event_type: EventType::PositionClosed,
            attestation: Some("hash".to_string()),
            timestamp: 1,
        };

        let replay = original.to_heartbeat();
        assert_eq!(replay.metrics, original.metrics);
        assert_eq!(replay.event_type, EventType::Heartbeat);
        assert!(replay.attestation.is_none());
        assert!(replay.timestamp > original.timestamp);
    }

    #[test]
    fn test_non_finite_values_are_omitted() {
        let metrics = AccountMetrics::new()
            .with_balance(f64::NAN)
            .with_equity(f64::INFINITY)
            .with_margin(12.0);
        let value = serde_json::to_value(&metrics).unwrap();
        assert_eq!(value, json!({"margin": 12.0}));
    }
}
