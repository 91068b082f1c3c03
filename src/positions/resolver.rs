//! Settlement resolver
//!
//! Pure mapping from (position, live market) to the position's next state.
//! Both the monitor and the request path go through here, so the rules for
//! settling and for debouncing price moves live in one place.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::types::{PositionStatus, PositionUpdate, TrackedPosition};
use crate::common::types::{MarketSnapshot, CONTRACT_PAYOUT_CENTS};

/// What a single reconciliation produced
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Market resolved; the position moves to a terminal status
    Settled {
        update: PositionUpdate,
        won: bool,
        realized_pnl: Decimal,
    },
    /// Price moved at least the threshold since the last notification
    PriceMove {
        update: PositionUpdate,
        current_price: Decimal,
        delta: Decimal,
    },
    /// Nothing worth writing
    Unchanged,
}

impl Resolution {
    /// Ledger update to persist, if any
    pub fn update(&self) -> Option<&PositionUpdate> {
        match self {
            Resolution::Settled { update, .. } | Resolution::PriceMove { update, .. } => {
                Some(update)
            }
            Resolution::Unchanged => None,
        }
    }

    pub fn is_settlement(&self) -> bool {
        matches!(self, Resolution::Settled { .. })
    }
}

/// Maps live market state onto tracked positions
#[derive(Debug, Clone)]
pub struct SettlementResolver {
    price_move_threshold: Decimal,
}

impl Default for SettlementResolver {
    fn default() -> Self {
        Self::new(dec!(1))
    }
}

impl SettlementResolver {
    /// Create a resolver that reports moves of at least `price_move_threshold` cents
    pub fn new(price_move_threshold: Decimal) -> Self {
        Self {
            price_move_threshold,
        }
    }

    /// Resolve one position against the latest market snapshot
    ///
    /// Non-active positions are never touched.
    pub fn resolve(
        &self,
        position: &TrackedPosition,
        market: &MarketSnapshot,
        now: DateTime<Utc>,
    ) -> Resolution {
        if !position.is_active() {
            return Resolution::Unchanged;
        }

        if let Some(result) = market.result {
            return Self::settle(position, result == position.side, now);
        }

        let Some(yes_price) = market.yes_price() else {
            return Resolution::Unchanged;
        };

        let current_price = position.side.price_from_yes(yes_price);
        let last_notified = position.last_notified_price.unwrap_or(position.entry_price);
        let delta = (current_price - last_notified).round_dp(2);

        if delta.abs() < self.price_move_threshold {
            return Resolution::Unchanged;
        }

        Resolution::PriceMove {
            update: PositionUpdate {
                current_price: Some(current_price),
                unrealized_pnl: Some(current_price - position.entry_price),
                last_notified_price: Some(current_price),
                last_notified_at: Some(now),
                updated_at: Some(now),
                ..Default::default()
            },
            current_price,
            delta,
        }
    }

    /// Live price refresh for display, without the notification debounce
    pub fn mark_to_market(
        &self,
        position: &TrackedPosition,
        market: &MarketSnapshot,
        now: DateTime<Utc>,
    ) -> Option<PositionUpdate> {
        if !position.is_active() || market.is_settled() {
            return None;
        }
        let current_price = position.side.price_from_yes(market.yes_price()?);
        Some(PositionUpdate {
            current_price: Some(current_price),
            unrealized_pnl: Some(current_price - position.entry_price),
            updated_at: Some(now),
            ..Default::default()
        })
    }

    fn settle(position: &TrackedPosition, won: bool, now: DateTime<Utc>) -> Resolution {
        let (status, settlement_price) = if won {
            (PositionStatus::SettledWin, CONTRACT_PAYOUT_CENTS)
        } else {
            (PositionStatus::SettledLoss, Decimal::ZERO)
        };
        let realized_pnl = (settlement_price - position.entry_price).round_dp(2);

        Resolution::Settled {
            update: PositionUpdate {
                status: Some(status),
                settlement_price: Some(settlement_price),
                realized_pnl: Some(realized_pnl),
                settled_at: Some(now),
                updated_at: Some(now),
                ..Default::default()
            },
            won,
            realized_pnl,
        }
    }
}
