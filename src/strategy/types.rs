use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::size_calculator::{ComputedSize, RiskTier};
use crate::common::types::Side;

/// Minimum settled trades before a profile carries preferences
pub const MIN_SETTLED_TRADES: usize = 5;

/// Side preference derived from side-specific win rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferredSide {
    Yes,
    No,
    Balanced,
}

impl PreferredSide {
    /// The directional side, if any
    pub fn as_side(&self) -> Option<Side> {
        match self {
            PreferredSide::Yes => Some(Side::Yes),
            PreferredSide::No => Some(Side::No),
            PreferredSide::Balanced => None,
        }
    }
}

/// Entry-price band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryBand {
    Low,
    Mid,
    High,
}

impl EntryBand {
    pub const ALL: [EntryBand; 3] = [EntryBand::Low, EntryBand::Mid, EntryBand::High];

    /// low < 30c, high > 70c, otherwise mid
    pub fn classify(price: Decimal) -> Self {
        if price < dec!(30) {
            EntryBand::Low
        } else if price > dec!(70) {
            EntryBand::High
        } else {
            EntryBand::Mid
        }
    }

    pub fn contains(&self, price: Decimal) -> bool {
        Self::classify(price) == *self
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryBand::Low => "low",
            EntryBand::Mid => "mid",
            EntryBand::High => "high",
        }
    }
}

impl std::fmt::Display for EntryBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Win rate within one market category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStat {
    pub category: String,
    pub win_rate: f64,
    pub count: usize,
}

/// Preferences learned from settled history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyPreferences {
    pub win_rate: f64,
    /// Up to five categories, most traded first
    pub preferred_categories: Vec<CategoryStat>,
    pub preferred_side: PreferredSide,
    pub preferred_entry_band: EntryBand,
    pub avg_entry_price: f64,
    pub yes_win_rate: f64,
    pub no_win_rate: f64,
    pub paper_balance: Decimal,
    pub risk_tier: RiskTier,
    pub suggested_qty_per_trade: u64,
    pub max_risk_pct: f64,
    pub kelly_fraction: f64,
}

impl StrategyPreferences {
    /// Category entry matching `category`, regardless of its win rate
    pub fn category(&self, category: &str) -> Option<&CategoryStat> {
        self.preferred_categories
            .iter()
            .find(|c| c.category == category)
    }

    pub(crate) fn apply_sizing(&mut self, sizing: &ComputedSize) {
        self.risk_tier = sizing.risk_tier;
        self.suggested_qty_per_trade = sizing.suggested_qty;
        self.max_risk_pct = sizing.max_risk_pct;
        self.kelly_fraction = sizing.kelly_fraction;
    }
}

/// A user's trading profile, computed on demand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyProfile {
    pub user_id: String,
    pub total_trades: usize,
    /// Fewer than [`MIN_SETTLED_TRADES`] settled trades
    pub insufficient_data: bool,
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<StrategyPreferences>,
    pub generated_at: DateTime<Utc>,
}

impl StrategyProfile {
    pub fn insufficient(user_id: impl Into<String>, total_trades: usize, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            total_trades,
            insufficient_data: true,
            preferences: None,
            generated_at: now,
        }
    }

    /// Preferences, if the profile has enough data
    pub fn preferences(&self) -> Option<&StrategyPreferences> {
        self.preferences.as_ref().filter(|_| !self.insufficient_data)
    }
}

/// A ranked, sized recommendation to open a position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub ticker: String,
    pub title: String,
    pub side: Side,
    pub confidence: f64,
    pub reasoning: String,
    pub match_score: f64,
    pub category: String,
    pub current_price: Option<Decimal>,
    pub entry_price_suggestion: Decimal,
    pub suggested_qty: u64,
    pub risk_tier: RiskTier,
    pub max_risk_pct: f64,
}
