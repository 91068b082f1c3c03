//! Tracked position model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::common::errors::{Result, TraderError};
use crate::common::types::{MarketData, Side};

/// Lifecycle status of a tracked position
///
/// `Active` is the only non-terminal state. Terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Active,
    SettledWin,
    SettledLoss,
    Closed,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Active => "active",
            PositionStatus::SettledWin => "settled_win",
            PositionStatus::SettledLoss => "settled_loss",
            PositionStatus::Closed => "closed",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, PositionStatus::Active)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, PositionStatus::SettledWin | PositionStatus::SettledLoss)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// `active -> any`, and re-applying the current state, are the only legal moves
    pub fn can_transition_to(&self, next: PositionStatus) -> bool {
        self.is_active() || *self == next
    }
}

impl std::fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market conditions captured when the position was accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySnapshot {
    #[serde(default)]
    pub yes_bid: Option<Decimal>,
    #[serde(default)]
    pub yes_ask: Option<Decimal>,
    #[serde(default)]
    pub last_price: Option<Decimal>,
    #[serde(default)]
    pub volume: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub event_title: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl EntrySnapshot {
    /// Build a snapshot from enrichment data, if the market was found
    pub fn from_market_data(data: &MarketData, captured_at: DateTime<Utc>) -> Option<Self> {
        let market = data.market.as_ref().filter(|_| data.is_found())?;
        Some(Self {
            yes_bid: market.yes_bid,
            yes_ask: market.yes_ask,
            last_price: market.last_price,
            volume: market.volume,
            category: data.event.as_ref().and_then(|e| e.category.clone()),
            event_title: data.event.as_ref().and_then(|e| e.title.clone()),
            captured_at,
        })
    }
}

fn default_entry_price() -> Decimal {
    dec!(50)
}

/// A paper bet tracked from acceptance to settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedPosition {
    pub position_id: String,
    pub user_id: String,
    /// Idea this position was accepted from
    #[serde(default)]
    pub prediction_id: Option<String>,
    pub ticker: String,
    #[serde(default)]
    pub title: Option<String>,
    pub side: Side,
    /// Entry price in cents (0-100)
    #[serde(default = "default_entry_price")]
    pub entry_price: Decimal,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Immutable once set
    #[serde(default)]
    pub market_snapshot_at_entry: Option<EntrySnapshot>,
    pub status: PositionStatus,

    // Live fields, present only while active
    #[serde(default)]
    pub current_price: Option<Decimal>,
    #[serde(default)]
    pub unrealized_pnl: Option<Decimal>,
    #[serde(default)]
    pub last_notified_price: Option<Decimal>,
    #[serde(default)]
    pub last_notified_at: Option<DateTime<Utc>>,

    // Settlement fields, present only once settled
    #[serde(default)]
    pub settlement_price: Option<Decimal>,
    #[serde(default)]
    pub realized_pnl: Option<Decimal>,
    #[serde(default)]
    pub settled_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TrackedPosition {
    /// Create an active position from an accepted idea
    pub fn open(position_id: impl Into<String>, new: NewPosition, now: DateTime<Utc>) -> Self {
        Self {
            position_id: position_id.into(),
            user_id: new.user_id,
            prediction_id: new.prediction_id,
            ticker: new.ticker,
            title: new.title,
            side: new.side,
            entry_price: new.entry_price,
            model: new.model,
            confidence: new.confidence,
            market_snapshot_at_entry: None,
            status: PositionStatus::Active,
            current_price: None,
            unrealized_pnl: None,
            last_notified_price: None,
            last_notified_at: None,
            settlement_price: None,
            realized_pnl: None,
            settled_at: None,
            created_at: now,
            updated_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Category recorded at entry, "Unknown" when absent
    pub fn entry_category(&self) -> &str {
        self.market_snapshot_at_entry
            .as_ref()
            .and_then(|s| s.category.as_deref())
            .filter(|c| !c.is_empty())
            .unwrap_or("Unknown")
    }

    /// Apply a partial update, enforcing the lifecycle invariants
    ///
    /// Terminal statuses cannot be left, and settlement fields are frozen once
    /// the position is settled. Live fields are cleared on any terminal move.
    pub fn apply(&mut self, update: PositionUpdate) -> Result<()> {
        if let Some(next) = update.status {
            if !self.status.can_transition_to(next) {
                return Err(TraderError::InvalidTransition {
                    position_id: self.position_id.clone(),
                    from: self.status,
                    to: next,
                });
            }
        }

        let was_settled = self.status.is_settled();

        if let Some(next) = update.status {
            self.status = next;
        }

        if !was_settled {
            if let Some(price) = update.settlement_price {
                self.settlement_price = Some(price);
            }
            if let Some(pnl) = update.realized_pnl {
                self.realized_pnl = Some(pnl);
            }
            if let Some(at) = update.settled_at {
                self.settled_at = Some(at);
            }
        }

        if self.status.is_terminal() {
            self.current_price = None;
            self.unrealized_pnl = None;
        } else {
            if let Some(price) = update.current_price {
                self.current_price = Some(price);
            }
            if let Some(pnl) = update.unrealized_pnl {
                self.unrealized_pnl = Some(pnl);
            }
        }

        if let Some(price) = update.last_notified_price {
            self.last_notified_price = Some(price);
        }
        if let Some(at) = update.last_notified_at {
            self.last_notified_at = Some(at);
        }
        if let Some(at) = update.updated_at {
            self.updated_at = Some(at);
        }

        Ok(())
    }
}

/// Request to track a new position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPosition {
    pub user_id: String,
    #[serde(default)]
    pub prediction_id: Option<String>,
    pub ticker: String,
    pub side: Side,
    pub entry_price: Decimal,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl NewPosition {
    pub fn new(
        user_id: impl Into<String>,
        ticker: impl Into<String>,
        side: Side,
        entry_price: Decimal,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            prediction_id: None,
            ticker: ticker.into(),
            side,
            entry_price,
            title: None,
            model: None,
            confidence: None,
        }
    }

    /// Reject entry prices outside the 0-100 cent range
    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(TraderError::Validation("ticker is required".to_string()));
        }
        if self.entry_price < Decimal::ZERO || self.entry_price > dec!(100) {
            return Err(TraderError::Validation(format!(
                "entry price {} is outside 0-100 cents",
                self.entry_price
            )));
        }
        if let Some(confidence) = self.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(TraderError::Validation(format!(
                    "confidence {} is outside 0-1",
                    confidence
                )));
            }
        }
        Ok(())
    }
}

/// Partial field update for a stored position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionUpdate {
    pub status: Option<PositionStatus>,
    pub current_price: Option<Decimal>,
    pub unrealized_pnl: Option<Decimal>,
    pub last_notified_price: Option<Decimal>,
    pub last_notified_at: Option<DateTime<Utc>>,
    pub settlement_price: Option<Decimal>,
    pub realized_pnl: Option<Decimal>,
    pub settled_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PositionUpdate {
    pub fn is_empty(&self) -> bool {
        *self == PositionUpdate::default()
    }
}
