//! Background position monitor
//!
//! Once per interval, walks every user with active positions, reconciles each
//! position against a fresh market snapshot and sends one digest per user.
//!
//! ```text
//! market.purge_expired()
//!     │
//!     ▼
//! ledger.active_positions_by_user()
//!     │
//!     ▼  per user, in ledger order
//! fetch_market_fresh(ticker) ──▶ SettlementResolver ──▶ ledger.update_position()
//!     │                                 │
//!     │                                 └─ settled ──▶ ProgressTracker (best-effort)
//!     ▼
//! "Settled: ... | Moved: ..." ──▶ dispatch_digest (fire-and-forget)
//! ```

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::resolver::{Resolution, SettlementResolver};
use super::types::TrackedPosition;
use crate::common::errors::Result;
use crate::common::traits::{MarketDataSource, Notifier, PositionLedger};
use crate::config::types::MonitorConfig;
use crate::notify::dispatch_digest;
use crate::progress::ProgressTracker;

/// Something worth telling the user about
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Settlement {
        ticker: String,
        won: bool,
        realized_pnl: Decimal,
    },
    PriceMove {
        ticker: String,
        delta: Decimal,
    },
}

impl PositionEvent {
    /// Digest fragment, e.g. `KXFED W +70¢` or `KXBTC -3¢`
    pub fn digest_entry(&self) -> String {
        match self {
            PositionEvent::Settlement {
                ticker,
                won,
                realized_pnl,
            } => {
                let outcome = if *won { "W" } else { "L" };
                let sign = if *won { "+" } else { "" };
                format!("{} {} {}{}¢", ticker, outcome, sign, realized_pnl.normalize())
            }
            PositionEvent::PriceMove { ticker, delta } => {
                let sign = if delta.is_sign_positive() && !delta.is_zero() {
                    "+"
                } else {
                    ""
                };
                format!("{} {}{}¢", ticker, sign, delta.normalize())
            }
        }
    }
}

/// Build one digest body from a user's events, or `None` if nothing happened
pub fn format_digest(events: &[PositionEvent]) -> Option<String> {
    let settlements: Vec<String> = events
        .iter()
        .filter(|e| matches!(e, PositionEvent::Settlement { .. }))
        .map(PositionEvent::digest_entry)
        .collect();
    let moves: Vec<String> = events
        .iter()
        .filter(|e| matches!(e, PositionEvent::PriceMove { .. }))
        .map(PositionEvent::digest_entry)
        .collect();

    let mut parts = Vec::new();
    if !settlements.is_empty() {
        parts.push(format!("Settled: {}", settlements.join(", ")));
    }
    if !moves.is_empty() {
        parts.push(format!("Moved: {}", moves.join(", ")));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

/// Counters for a single cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub users: usize,
    pub positions_checked: usize,
    pub settlements: usize,
    pub price_moves: usize,
    pub failures: usize,
    pub digests: usize,
}

/// Periodic reconciliation of active positions
pub struct PositionMonitor {
    ledger: Arc<dyn PositionLedger>,
    market: Arc<dyn MarketDataSource>,
    notifier: Arc<dyn Notifier>,
    progress: Arc<ProgressTracker>,
    resolver: SettlementResolver,
    interval: Duration,
    position_delay: Duration,
    digest_title: String,
}

impl PositionMonitor {
    pub fn new(
        ledger: Arc<dyn PositionLedger>,
        market: Arc<dyn MarketDataSource>,
        notifier: Arc<dyn Notifier>,
        progress: Arc<ProgressTracker>,
        config: &MonitorConfig,
        digest_title: impl Into<String>,
    ) -> Self {
        Self {
            ledger,
            market,
            notifier,
            progress,
            resolver: SettlementResolver::new(config.price_move_threshold_cents),
            interval: config.interval(),
            position_delay: config.position_delay(),
            digest_title: digest_title.into(),
        }
    }

    /// Run cycles until a shutdown signal arrives
    ///
    /// Shutdown is only observed between cycles; a cycle in progress always
    /// finishes. A closed shutdown channel also stops the loop.
    pub async fn run(&self, mut shutdown: mpsc::Receiver<()>) {
        info!(
            "Position monitor started (interval={}s, source={}, notifier={})",
            self.interval.as_secs(),
            self.market.source_name(),
            self.notifier.name()
        );

        loop {
            match self.run_cycle().await {
                Ok(report) => info!(
                    users = report.users,
                    checked = report.positions_checked,
                    settlements = report.settlements,
                    moves = report.price_moves,
                    failures = report.failures,
                    digests = report.digests,
                    "monitor cycle complete"
                ),
                Err(e) => error!(error = %e, "monitor cycle failed"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.recv() => {
                    info!("Position monitor stopping");
                    break;
                }
            }
        }
    }

    /// One pass over every user with active positions
    ///
    /// Expired market-cache entries are purged first. Fails only when users
    /// cannot be enumerated. Per-position failures are logged and counted.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        self.market.purge_expired().await;

        let grouped = self.ledger.active_positions_by_user().await?;
        let mut report = CycleReport {
            users: grouped.len(),
            ..Default::default()
        };

        if grouped.is_empty() {
            info!("Position monitor: no active positions");
            return Ok(report);
        }
        info!("Position monitor: checking {} users", grouped.len());

        let mut deliveries: Vec<JoinHandle<()>> = Vec::new();

        for (user_id, positions) in grouped {
            let mut events = Vec::new();

            for position in &positions {
                report.positions_checked += 1;
                match self.check_position(position).await {
                    Ok(Some(event)) => {
                        match event {
                            PositionEvent::Settlement { .. } => report.settlements += 1,
                            PositionEvent::PriceMove { .. } => report.price_moves += 1,
                        }
                        events.push(event);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        report.failures += 1;
                        warn!(
                            position_id = %position.position_id,
                            ticker = %position.ticker,
                            error = %e,
                            "position check failed"
                        );
                    }
                }

                if !self.position_delay.is_zero() {
                    tokio::time::sleep(self.position_delay).await;
                }
            }

            if let Some(body) = format_digest(&events) {
                info!(user_id = %user_id, "Sending digest: {}", body);
                deliveries.push(dispatch_digest(
                    self.notifier.clone(),
                    user_id,
                    self.digest_title.clone(),
                    body,
                ));
                report.digests += 1;
            }
        }

        // Delivery errors are contained by the task; only a panic surfaces here
        for handle in deliveries {
            if let Err(e) = handle.await {
                error!(error = %e, "digest task panicked");
            }
        }

        Ok(report)
    }

    /// Reconcile one position against a fresh snapshot
    async fn check_position(&self, position: &TrackedPosition) -> Result<Option<PositionEvent>> {
        if position.ticker.is_empty() || position.position_id.is_empty() {
            return Ok(None);
        }

        let Some(market) = self.market.fetch_market_fresh(&position.ticker).await? else {
            debug!(ticker = %position.ticker, "market not found, skipping");
            return Ok(None);
        };

        let resolution = self.resolver.resolve(position, &market, Utc::now());
        let Some(update) = resolution.update().cloned() else {
            return Ok(None);
        };
        self.ledger
            .update_position(&position.position_id, update)
            .await?;

        let event = match resolution {
            Resolution::Settled {
                won, realized_pnl, ..
            } => {
                info!(
                    position_id = %position.position_id,
                    ticker = %position.ticker,
                    won,
                    pnl = %realized_pnl,
                    "position settled"
                );
                if let Err(e) = self.progress.record_settlement(&position.user_id).await {
                    warn!(user_id = %position.user_id, error = %e, "progress recount failed");
                }
                PositionEvent::Settlement {
                    ticker: position.ticker.clone(),
                    won,
                    realized_pnl,
                }
            }
            Resolution::PriceMove { delta, .. } => PositionEvent::PriceMove {
                ticker: position.ticker.clone(),
                delta,
            },
            Resolution::Unchanged => return Ok(None),
        };
        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn settlement(ticker: &str, won: bool, pnl: Decimal) -> PositionEvent {
        PositionEvent::Settlement {
            ticker: ticker.to_string(),
            won,
            realized_pnl: pnl,
        }
    }

    fn price_move(ticker: &str, delta: Decimal) -> PositionEvent {
        PositionEvent::PriceMove {
            ticker: ticker.to_string(),
            delta,
        }
    }

    #[test]
    fn test_digest_format() {
        let events = vec![
            settlement("KXFED", true, dec!(95)),
            price_move("KXBTC", dec!(3)),
            settlement("KXNBA", false, dec!(-30)),
            price_move("KXCPI", dec!(-2.50)),
        ];
        assert_eq!(
            format_digest(&events).unwrap(),
            "Settled: KXFED W +95¢, KXNBA L -30¢ | Moved: KXBTC +3¢, KXCPI -2.5¢"
        );
    }

    #[test]
    fn test_digest_with_only_moves() {
        let events = vec![price_move("KXBTC", dec!(1))];
        assert_eq!(format_digest(&events).unwrap(), "Moved: KXBTC +1¢");
    }

    #[test]
    fn test_empty_digest() {
        assert_eq!(format_digest(&[]), None);
    }
}
