//! Pre-trade validation requests.
//!
//! A [`TradeRequest`] describes the order the host is about to submit. The
//! session wraps it in a [`ValidationRequest`] carrying the API key and a
//! fresh timestamp. Nothing here is cached: each validation is independent.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{KuneoError, Result};
use crate::telemetry::{is_unset, now_millis};

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}

/// An order awaiting governance approval, plus the account state it would
/// be placed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    /// Trading symbol, e.g. `EURUSD`.
    pub symbol: String,
    #[serde(rename = "action")]
    pub side: TradeSide,
    /// Position size in lots.
    pub volume: f64,
    pub current_balance: f64,
    pub current_equity: f64,
    pub open_positions: u32,
    /// Entry price.
    #[serde(default, skip_serializing_if = "is_unset")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub stop_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub take_profit: Option<f64>,
}

impl TradeRequest {
    pub fn new(
        symbol: &str,
        side: TradeSide,
        volume: f64,
        current_balance: f64,
        current_equity: f64,
        open_positions: u32,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            volume,
            current_balance,
            current_equity,
            open_positions,
            price: None,
            stop_loss: None,
            take_profit: None,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_stop_loss(mut self, stop_loss: f64) -> Self {
        self.stop_loss = Some(stop_loss);
        self
    }

    pub fn with_take_profit(mut self, take_profit: f64) -> Self {
        self.take_profit = Some(take_profit);
        self
    }

    /// Check that the required figures are finite. JSON has no NaN or
    /// infinity, so such a trade is rejected before it is sent.
    pub fn check(&self) -> Result<()> {
        let required = [
            ("volume", self.volume),
            ("current_balance", self.current_balance),
            ("current_equity", self.current_equity),
        ];
        for (field, value) in required {
            if !value.is_finite() {
                return Err(KuneoError::InvalidTrade(format!(
                    "{} must be a finite number, got {}",
                    field, value
                )));
            }
        }
        Ok(())
    }
}

/// Body posted to the validation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationRequest<'a> {
    pub api_key: &'a str,
    #[serde(flatten)]
    pub trade: &'a TradeRequest,
    /// Unix time in milliseconds.
    pub timestamp: i64,
}

impl<'a> ValidationRequest<'a> {
    /// Wrap `trade` for submission, stamped with the current time.
    pub fn new(api_key: &'a str, trade: &'a TradeRequest) -> Self {
        Self {
            api_key,
            trade,
            timestamp: now_millis(),
        }
    }
}
