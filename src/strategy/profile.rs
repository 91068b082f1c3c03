//! Strategy profile builder
//!
//! Aggregates a user's settled history into win rates by category, side and
//! entry band. Pure: the caller supplies positions and the current balance.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::size_calculator::{round_to, SizeCalculator, SizingRequest};
use super::types::{
    CategoryStat, EntryBand, PreferredSide, StrategyPreferences, StrategyProfile,
    MIN_SETTLED_TRADES,
};
use crate::common::types::Side;
use crate::positions::types::{PositionStatus, TrackedPosition};

const MAX_PREFERRED_CATEGORIES: usize = 5;
const SIDE_PREFERENCE_MARGIN: f64 = 0.1;
const MIN_BAND_TRADES: usize = 2;

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    wins: usize,
    total: usize,
}

impl Tally {
    fn record(&mut self, won: bool) {
        self.total += 1;
        if won {
            self.wins += 1;
        }
    }

    fn win_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.wins as f64 / self.total as f64
        }
    }
}

/// Build a profile from a user's positions
///
/// Only settled positions count. Below [`MIN_SETTLED_TRADES`] the profile is
/// flagged insufficient and carries no preferences.
pub fn build_profile(
    user_id: &str,
    positions: &[TrackedPosition],
    paper_balance: Decimal,
    sizer: &dyn SizeCalculator,
    now: DateTime<Utc>,
) -> StrategyProfile {
    let settled: Vec<&TrackedPosition> =
        positions.iter().filter(|p| p.status.is_settled()).collect();

    if settled.len() < MIN_SETTLED_TRADES {
        return StrategyProfile::insufficient(user_id, settled.len(), now);
    }

    let won = |p: &TrackedPosition| p.status == PositionStatus::SettledWin;

    let mut overall = Tally::default();
    let mut yes = Tally::default();
    let mut no = Tally::default();
    let mut categories: Vec<(String, Tally)> = Vec::new();
    let mut bands = [Tally::default(); 3];
    let mut entry_sum = Decimal::ZERO;

    for position in &settled {
        let win = won(position);
        overall.record(win);
        match position.side {
            Side::Yes => yes.record(win),
            Side::No => no.record(win),
        }

        let category = position.entry_category();
        match categories.iter_mut().find(|(name, _)| name == category) {
            Some((_, tally)) => tally.record(win),
            None => {
                let mut tally = Tally::default();
                tally.record(win);
                categories.push((category.to_string(), tally));
            }
        }

        let band = EntryBand::classify(position.entry_price);
        if let Some(index) = EntryBand::ALL.iter().position(|b| *b == band) {
            bands[index].record(win);
        }
        entry_sum += position.entry_price;
    }

    // Stable sort keeps first-seen order among equal counts
    categories.sort_by(|a, b| b.1.total.cmp(&a.1.total));
    let preferred_categories = categories
        .into_iter()
        .take(MAX_PREFERRED_CATEGORIES)
        .map(|(category, tally)| CategoryStat {
            category,
            win_rate: round_to(tally.win_rate(), 3),
            count: tally.total,
        })
        .collect();

    let yes_wr = yes.win_rate();
    let no_wr = no.win_rate();
    let preferred_side = if (yes_wr - no_wr).abs() < SIDE_PREFERENCE_MARGIN {
        PreferredSide::Balanced
    } else if yes_wr > no_wr {
        PreferredSide::Yes
    } else {
        PreferredSide::No
    };

    let mut preferred_entry_band = EntryBand::Mid;
    let mut best_band_wr = 0.0;
    for (band, tally) in EntryBand::ALL.iter().zip(bands.iter()) {
        if tally.total >= MIN_BAND_TRADES && tally.win_rate() > best_band_wr {
            best_band_wr = tally.win_rate();
            preferred_entry_band = *band;
        }
    }

    let avg_entry = entry_sum / Decimal::from(settled.len() as u64);
    let win_rate = overall.win_rate();

    let sizing_price = match avg_entry.round() {
        p if p.is_zero() => dec!(50),
        p => p,
    };
    let sizing = sizer.compute(&SizingRequest::new(
        paper_balance,
        sizing_price,
        win_rate,
        win_rate,
    ));

    let mut preferences = StrategyPreferences {
        win_rate: round_to(win_rate, 3),
        preferred_categories,
        preferred_side,
        preferred_entry_band,
        avg_entry_price: round_to(avg_entry.to_f64().unwrap_or(50.0), 1),
        yes_win_rate: round_to(yes_wr, 3),
        no_win_rate: round_to(no_wr, 3),
        paper_balance,
        risk_tier: sizing.risk_tier,
        suggested_qty_per_trade: 0,
        max_risk_pct: 0.0,
        kelly_fraction: 0.0,
    };
    preferences.apply_sizing(&sizing);

    StrategyProfile {
        user_id: user_id.to_string(),
        total_trades: settled.len(),
        insufficient_data: false,
        preferences: Some(preferences),
        generated_at: now,
    }
}
