//! Paper-trading host loop wired to Kuneo governance.
//!
//! Reads `KUNEO_API_KEY` (and optional `KUNEO_*` overrides) from the
//! environment or `.env`, then runs a toy strategy that reports telemetry
//! every cycle and asks for approval before each simulated order.
//!
//! Run with: RUST_LOG=info cargo run --example paper_trader
//! Set `LOG_FORMAT=json` for JSON log lines.

use std::time::Duration;

use anyhow::{Context, Result};
use kuneo::{AccountMetrics, ClientConfig, EventType, KuneoClient, TradeRequest, TradeSide};
use tracing::info;
use tracing_subscriber::EnvFilter;

const CYCLES: u32 = 20;
const CYCLE_DELAY: Duration = Duration::from_secs(3);
const LOT_SIZE: f64 = 0.01;

/// Simulated account with a deterministic price path.
struct PaperAccount {
    balance: f64,
    equity: f64,
    positions: u32,
    realized_pnl: f64,
}

impl PaperAccount {
    fn new(balance: f64) -> Self {
        Self {
            balance,
            equity: balance,
            positions: 0,
            realized_pnl: 0.0,
        }
    }

    fn mark(&mut self, cycle: u32) {
        let drift = (f64::from(cycle) * 0.7).sin() * 40.0 * f64::from(self.positions);
        self.equity = self.balance + drift;
    }

    fn metrics(&self) -> AccountMetrics {
        AccountMetrics::new()
            .with_balance(self.balance)
            .with_equity(self.equity)
            .with_positions(self.positions)
            .with_unrealized_pnl(self.equity - self.balance)
            .with_realized_pnl(self.realized_pnl)
    }

    fn signal(&self, cycle: u32) -> Option<TradeSide> {
        match cycle % 4 {
            0 => Some(TradeSide::Buy),
            2 if self.positions > 0 => Some(TradeSide::Sell),
            _ => None,
        }
    }

    fn fill(&mut self, side: TradeSide) {
        match side {
            TradeSide::Buy => self.positions += 1,
            TradeSide::Sell => {
                let pnl = self.equity - self.balance;
                self.positions = self.positions.saturating_sub(1);
                self.balance += pnl;
                self.realized_pnl += pnl;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // LOG_FORMAT=json for machine-readable logs next to the host's own.
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    }

    let config = ClientConfig::from_env().context("Failed to load Kuneo configuration")?;
    let client = KuneoClient::new(config).context("Failed to create Kuneo client")?;
    client.start().await?;

    let outcome = trade_loop(&client).await;
    client.stop().await;
    outcome
}

async fn trade_loop(client: &KuneoClient) -> Result<()> {
    let mut account = PaperAccount::new(10_000.0);

    for cycle in 0..CYCLES {
        if client.is_halted() {
            info!("Agent halted by Kuneo - stopping all operations");
            break;
        }

        account.mark(cycle);
        client
            .send_telemetry(account.metrics(), EventType::Heartbeat, None)
            .await;

        if let Some(side) = account.signal(cycle) {
            let trade = TradeRequest::new(
                "EURUSD",
                side,
                LOT_SIZE,
                account.balance,
                account.equity,
                account.positions,
            );

            let verdict = client.validate_trade(&trade).await;
            if verdict.is_approved() {
                account.fill(side);
                info!(
                    token = verdict.token().unwrap_or("-"),
                    "Paper {} of {} lots filled",
                    side,
                    LOT_SIZE
                );
                let event = match side {
                    TradeSide::Buy => EventType::PositionOpened,
                    TradeSide::Sell => EventType::PositionClosed,
                };
                client.send_telemetry(account.metrics(), event, None).await;
            } else {
                info!(
                    "Trade rejected: {}",
                    verdict.reason().unwrap_or("no reason given")
                );
            }
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            _ = tokio::time::sleep(CYCLE_DELAY) => {}
        }
    }

    Ok(())
}
