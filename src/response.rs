//! Governance responses.
//!
//! Responses from the governance service are passed through to the host
//! untouched: [`GovernanceResponse`] keeps the JSON object exactly as received
//! and only adds typed accessors on top. When the service cannot be reached the
//! session synthesizes a response instead, failing open for telemetry
//! ([`GovernanceResponse::telemetry_unavailable`]) and failing closed for trade
//! validation ([`GovernanceResponse::validation_unavailable`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{KuneoError, Result};

/// Reason attached to synthesized validation rejections.
pub const VALIDATION_UNAVAILABLE_REASON: &str = "Validation system unavailable";
/// Reason attached to trades rejected before they were sent.
pub const INVALID_TRADE_REASON: &str = "Invalid trade request";

const STATUS_HALTED: &str = "HALTED";
const STATUS_ERROR: &str = "ERROR";

/// Directive returned by the governance service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Keep trading.
    Continue,
    /// Stop all trading for the rest of the session.
    Halt,
    /// Do not submit the order that was validated.
    RejectTrade,
    /// Anything this client does not know about.
    Other(String),
}

impl Action {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "CONTINUE" => Action::Continue,
            "HALT" => Action::Halt,
            "REJECT_TRADE" => Action::RejectTrade,
            other => Action::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Continue => "CONTINUE",
            Action::Halt => "HALT",
            Action::RejectTrade => "REJECT_TRADE",
            Action::Other(other) => other,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a pre-trade validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Verdict {
    Pass,
    Fail,
    /// The validation could not be completed (remote error or unreachable).
    Error,
    Other(String),
}

impl Verdict {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PASS" => Verdict::Pass,
            "FAIL" => Verdict::Fail,
            "ERROR" => Verdict::Error,
            other => Verdict::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::Error => "ERROR",
            Verdict::Other(other) => other,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A policy breach reported alongside a verdict or telemetry status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Policy name. The validation endpoint calls it `policy`, the telemetry
    /// endpoint `policy_name`.
    #[serde(default, alias = "policy_name")]
    pub policy: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

/// A response from the governance service, or a locally synthesized stand-in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GovernanceResponse(Map<String, Value>);

/// Result of [`send_telemetry`](crate::KuneoClient::send_telemetry).
pub type TelemetryResult = GovernanceResponse;
/// Result of [`validate_trade`](crate::KuneoClient::validate_trade).
pub type ValidationResult = GovernanceResponse;

impl GovernanceResponse {
    /// Accept a decoded response body. Anything but a JSON object is malformed.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(KuneoError::MalformedResponse(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Fail-open result for a telemetry call that could not reach the service.
    pub fn telemetry_unavailable(error: &KuneoError) -> Self {
        let mut map = Map::new();
        map.insert("status".into(), Value::from(STATUS_ERROR));
        map.insert("action".into(), Value::from(Action::Continue.as_str()));
        map.insert("error".into(), Value::from(error.to_string()));
        Self(map)
    }

    /// Fail-closed result for a validation call that could not reach the
    /// service. Unreachable governance is a rejection, never an approval.
    pub fn validation_unavailable(error: &KuneoError) -> Self {
        let mut map = Map::new();
        map.insert("validation".into(), Value::from(Verdict::Error.as_str()));
        map.insert("action".into(), Value::from(Action::RejectTrade.as_str()));
        map.insert("reason".into(), Value::from(VALIDATION_UNAVAILABLE_REASON));
        map.insert("error".into(), Value::from(error.to_string()));
        Self(map)
    }

    /// Local rejection for a trade that could not be put on the wire.
    pub fn invalid_trade(error: &KuneoError) -> Self {
        let mut map = Map::new();
        map.insert("validation".into(), Value::from(Verdict::Error.as_str()));
        map.insert("action".into(), Value::from(Action::RejectTrade.as_str()));
        map.insert("reason".into(), Value::from(INVALID_TRADE_REASON));
        map.insert("error".into(), Value::from(error.to_string()));
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn status(&self) -> Option<&str> {
        self.str_field("status")
    }

    pub fn action(&self) -> Option<Action> {
        self.str_field("action").map(Action::parse)
    }

    pub fn validation(&self) -> Option<Verdict> {
        self.str_field("validation").map(Verdict::parse)
    }

    pub fn message(&self) -> Option<&str> {
        self.str_field("message")
    }

    pub fn reason(&self) -> Option<&str> {
        self.str_field("reason")
    }

    /// Audit token issued for an approved trade.
    pub fn token(&self) -> Option<&str> {
        self.str_field("token")
    }

    pub fn error(&self) -> Option<&str> {
        self.str_field("error")
    }

    /// Itemized policy violations. Entries that are not objects are skipped.
    pub fn violations(&self) -> Vec<Violation> {
        self.0
            .get("violations")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `action == "HALT"` or `status == "HALTED"`.
    pub fn is_halt_directive(&self) -> bool {
        self.action() == Some(Action::Halt) || self.status() == Some(STATUS_HALTED)
    }

    /// The only answer that permits submitting the order: verdict `PASS` and
    /// action `CONTINUE`.
    pub fn is_approved(&self) -> bool {
        self.validation() == Some(Verdict::Pass) && self.action() == Some(Action::Continue)
    }
}

impl PartialEq<Value> for GovernanceResponse {
    fn eq(&self, other: &Value) -> bool {
        other.as_object() == Some(&self.0)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: Value) -> GovernanceResponse {
        GovernanceResponse::from_value(value).unwrap()
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        for value in [json!(null), json!([1, 2]), json!("OK"), json!(3)] {
            let err = GovernanceResponse::from_value(value).unwrap_err();
            assert!(matches!(err, KuneoError::MalformedResponse(_)));
        }
    }

    #[test]
    fn test_passes_body_through_verbatim() {
        let body = json!({"status": "OK", "action": "CONTINUE", "extra": {"n": 1}});
        let parsed = response(body.clone());
        assert_eq!(parsed, body);
        assert_eq!(parsed.into_value(), body);
    }

    #[test]
    fn test_halt_detection() {
        assert!(response(json!({"action": "HALT", "message": "drawdown breach"})).is_halt_directive());
        assert!(response(json!({"status": "HALTED"})).is_halt_directive());
        assert!(!response(json!({"status": "OK", "action": "CONTINUE"})).is_halt_directive());
        assert!(!response(json!({"status": "halted", "action": "halt"})).is_halt_directive());
        assert!(!response(json!({})).is_halt_directive());
    }

    #[test]
    fn test_typed_accessors() {
        let parsed = response(json!({
            "validation": "FAIL",
            "action": "REJECT_TRADE",
            "reason": "Critical policy violations detected",
            "token": "val_1234",
        }));
        assert_eq!(parsed.validation(), Some(Verdict::Fail));
        assert_eq!(parsed.action(), Some(Action::RejectTrade));
        assert_eq!(parsed.reason(), Some("Critical policy violations detected"));
        assert_eq!(parsed.token(), Some("val_1234"));
        assert!(parsed.message().is_none());
        assert!(!parsed.is_approved());
    }

    #[test]
    fn test_unknown_action_is_preserved() {
        let parsed = response(json!({"action": "THROTTLE"}));
        assert_eq!(parsed.action(), Some(Action::Other("THROTTLE".into())));
        assert_eq!(Action::Other("THROTTLE".into()).to_string(), "THROTTLE");
    }

    #[test]
    fn test_is_approved_requires_pass_and_continue() {
        assert!(response(json!({"validation": "PASS", "action": "CONTINUE"})).is_approved());
        assert!(!response(json!({"validation": "PASS"})).is_approved());
        assert!(!response(json!({"validation": "PASS", "action": "HALT"})).is_approved());
    }

    #[test]
    fn test_violations_accept_both_key_styles() {
        let parsed = response(json!({
            "violations": [
                {"policy": "Max Drawdown", "severity": "CRITICAL", "message": "Current drawdown 12.00% exceeds 10%"},
                {"policy_name": "Position Cap", "message": "Open positions 6 exceeds limit 5", "current_value": 6, "threshold": 5},
                "garbage",
            ]
        }));

        let violations = parsed.violations();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].policy, "Max Drawdown");
        assert_eq!(violations[0].severity.as_deref(), Some("CRITICAL"));
        assert_eq!(violations[1].policy, "Position Cap");
        assert_eq!(violations[1].current_value, Some(6.0));
        assert_eq!(violations[1].threshold, Some(5.0));
    }

    #[test]
    fn test_missing_violations_is_empty() {
        assert!(response(json!({"validation": "PASS"})).violations().is_empty());
        assert!(response(json!({"violations": "none"})).violations().is_empty());
    }

    #[test]
    fn test_telemetry_unavailable_fails_open() {
        let err = KuneoError::Transport("connection refused".into());
        let synthesized = GovernanceResponse::telemetry_unavailable(&err);
        assert_eq!(
            synthesized,
            json!({
                "status": "ERROR",
                "action": "CONTINUE",
                "error": "Transport error: connection refused",
            })
        );
        assert!(!synthesized.is_halt_directive());
    }

    #[test]
    fn test_validation_unavailable_fails_closed() {
        let err = KuneoError::Transport("connection refused".into());
        let synthesized = GovernanceResponse::validation_unavailable(&err);
        assert_eq!(
            synthesized,
            json!({
                "validation": "ERROR",
                "action": "REJECT_TRADE",
                "reason": "Validation system unavailable",
                "error": "Transport error: connection refused",
            })
        );
        assert_eq!(synthesized.action(), Some(Action::RejectTrade));
        assert!(!synthesized.is_approved());
    }

    #[test]
    fn test_invalid_trade_is_a_rejection() {
        let err = KuneoError::InvalidTrade("volume must be a finite number, got NaN".into());
        let synthesized = GovernanceResponse::invalid_trade(&err);
        assert_eq!(synthesized.validation(), Some(Verdict::Error));
        assert_eq!(synthesized.action(), Some(Action::RejectTrade));
        assert_eq!(synthesized.reason(), Some("Invalid trade request"));
        assert!(synthesized.error().unwrap().contains("volume"));
        assert!(!synthesized.is_approved());
    }
}
