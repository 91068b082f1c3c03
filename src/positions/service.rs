//! Request-path operations on tracked positions

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::resolver::{Resolution, SettlementResolver};
use super::types::{EntrySnapshot, NewPosition, PositionStatus, PositionUpdate, TrackedPosition};
use crate::common::errors::{Result, TraderError};
use crate::common::traits::{MarketDataSource, PositionLedger};
use crate::kalshi::enrich_market;
use crate::progress::ProgressTracker;

/// Accept, list and close positions on behalf of a user
///
/// Shares the ledger with the monitor. Writes are last-write-wins; the
/// resolver is idempotent on terminal positions so concurrent settlement is
/// harmless.
pub struct PositionService {
    ledger: Arc<dyn PositionLedger>,
    market: Arc<dyn MarketDataSource>,
    progress: Arc<ProgressTracker>,
    resolver: SettlementResolver,
}

impl PositionService {
    pub fn new(
        ledger: Arc<dyn PositionLedger>,
        market: Arc<dyn MarketDataSource>,
        progress: Arc<ProgressTracker>,
        resolver: SettlementResolver,
    ) -> Self {
        Self {
            ledger,
            market,
            progress,
            resolver,
        }
    }

    /// Start tracking an accepted idea
    #[instrument(skip(self, new), fields(user_id = %new.user_id, ticker = %new.ticker))]
    pub async fn accept(&self, new: NewPosition) -> Result<TrackedPosition> {
        new.validate()?;

        let now = Utc::now();
        let data = enrich_market(self.market.as_ref(), &new.ticker).await;
        let mut position = TrackedPosition::open(Uuid::new_v4().to_string(), new, now);
        position.market_snapshot_at_entry = EntrySnapshot::from_market_data(&data, now);

        self.ledger.put_position(position.clone()).await?;
        info!(
            position_id = %position.position_id,
            side = %position.side,
            entry = %position.entry_price,
            "position tracked"
        );

        if let Err(e) = self.progress.record_position_tracked(&position.user_id).await {
            warn!(user_id = %position.user_id, error = %e, "progress recount failed");
        }
        Ok(position)
    }

    pub async fn get(&self, position_id: &str) -> Result<Option<TrackedPosition>> {
        self.ledger.get_position(position_id).await
    }

    /// A user's positions, optionally refreshed against live markets
    ///
    /// With `live`, each active position is settled if its market resolved,
    /// otherwise marked to market. A failed lookup leaves that position as
    /// stored.
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: &str, live: bool) -> Result<Vec<TrackedPosition>> {
        let positions = self.ledger.list_positions_by_user(user_id).await?;
        if !live {
            return Ok(positions);
        }

        let mut refreshed = Vec::with_capacity(positions.len());
        let mut settled_any = false;

        for position in positions {
            if !position.is_active() {
                refreshed.push(position);
                continue;
            }

            let market = match self.market.fetch_market(&position.ticker).await {
                Ok(Some(market)) => market,
                Ok(None) => {
                    refreshed.push(position);
                    continue;
                }
                Err(e) => {
                    warn!(ticker = %position.ticker, error = %e, "live refresh failed");
                    refreshed.push(position);
                    continue;
                }
            };

            let now = Utc::now();
            let update = if market.is_settled() {
                match self.resolver.resolve(&position, &market, now) {
                    Resolution::Settled { update, .. } => {
                        settled_any = true;
                        Some(update)
                    }
                    _ => None,
                }
            } else {
                self.resolver.mark_to_market(&position, &market, now)
            };

            match update {
                Some(update) => {
                    let stored = self
                        .ledger
                        .update_position(&position.position_id, update)
                        .await?;
                    refreshed.push(stored.unwrap_or(position));
                }
                None => refreshed.push(position),
            }
        }

        if settled_any {
            if let Err(e) = self.progress.record_settlement(user_id).await {
                warn!(user_id, error = %e, "progress recount failed");
            }
        }
        Ok(refreshed)
    }

    /// Close an active position by hand
    ///
    /// Closing an already closed position returns it unchanged.
    #[instrument(skip(self))]
    pub async fn close(&self, position_id: &str) -> Result<TrackedPosition> {
        let position = self
            .ledger
            .get_position(position_id)
            .await?
            .ok_or_else(|| TraderError::PositionNotFound(position_id.to_string()))?;

        if position.status == PositionStatus::Closed {
            return Ok(position);
        }
        if !position.status.can_transition_to(PositionStatus::Closed) {
            return Err(TraderError::InvalidTransition {
                position_id: position_id.to_string(),
                from: position.status,
                to: PositionStatus::Closed,
            });
        }

        let update = PositionUpdate {
            status: Some(PositionStatus::Closed),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        let closed = self
            .ledger
            .update_position(position_id, update)
            .await?
            .ok_or_else(|| TraderError::PositionNotFound(position_id.to_string()))?;
        info!(position_id, user_id = %closed.user_id, "position closed");

        if let Err(e) = self.progress.record_close(&closed.user_id).await {
            warn!(user_id = %closed.user_id, error = %e, "progress recount failed");
        }
        Ok(closed)
    }
}
