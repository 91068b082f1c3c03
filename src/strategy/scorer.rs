//! Candidate-market scoring against a strategy profile

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::size_calculator::round_to;
use super::types::{EntryBand, StrategyPreferences};
use crate::common::types::{CandidateMarket, Side};

const CATEGORY_WEIGHT: f64 = 3.0;
const BAND_MATCH_POINTS: f64 = 2.0;
const NEUTRAL_RANGE_POINTS: f64 = 1.0;
const WIDE_SPREAD_PENALTY: f64 = 1.0;
const NEAR_CERTAIN_PENALTY: f64 = 3.0;

fn in_neutral_range(price: Decimal) -> bool {
    price >= dec!(30) && price <= dec!(70)
}

/// Score one market; zero means "do not recommend"
pub fn score_market(candidate: &CandidateMarket, prefs: &StrategyPreferences) -> f64 {
    let market = &candidate.market;
    let mut score = 0.0;

    if let Some(stat) = prefs
        .preferred_categories
        .iter()
        .find(|c| c.category == candidate.category && c.win_rate > 0.5)
    {
        score += CATEGORY_WEIGHT * stat.win_rate;
    }

    let yes_price = market.reference_yes_price();
    if prefs.preferred_entry_band.contains(yes_price) {
        score += BAND_MATCH_POINTS;
    } else if in_neutral_range(yes_price) {
        score += NEUTRAL_RANGE_POINTS;
    }

    let volume_24h = market.volume_24h.unwrap_or(0);
    if volume_24h > 1000 {
        score += 1.0;
    } else if volume_24h > 100 {
        score += 0.5;
    }

    let open_interest = market.open_interest.unwrap_or(0);
    if open_interest > 500 {
        score += 1.0;
    } else if open_interest > 100 {
        score += 0.5;
    }

    if market.spread() > dec!(10) {
        score -= WIDE_SPREAD_PENALTY;
    }

    let last = market.last_or_mid();
    if last > dec!(95) || last < dec!(5) {
        score -= NEAR_CERTAIN_PENALTY;
    }

    score.max(0.0)
}

/// Preferred side when directional, else the cheaper-looking side
pub fn pick_side(candidate: &CandidateMarket, prefs: &StrategyPreferences) -> Side {
    if let Some(side) = prefs.preferred_side.as_side() {
        return side;
    }
    if candidate.market.last_or_mid() < dec!(50) {
        Side::Yes
    } else {
        Side::No
    }
}

/// Human-readable explanation of which heuristics fired
pub fn build_reasoning(candidate: &CandidateMarket, prefs: &StrategyPreferences, score: f64) -> String {
    let mut parts = Vec::new();

    if let Some(stat) = prefs.category(&candidate.category) {
        let pct = (stat.win_rate * 100.0).trunc() as i64;
        parts.push(format!("You win {}% in {}", pct, candidate.category));
    }

    let band = EntryBand::classify(candidate.market.last_or_mid());
    if band == prefs.preferred_entry_band {
        parts.push(format!("Price in your best range ({})", band));
    }

    let volume_24h = candidate.market.volume_24h.unwrap_or(0);
    if volume_24h > 1000 {
        parts.push(format!("Active market ({}/24h)", group_thousands(volume_24h)));
    }

    if parts.is_empty() {
        parts.push(format!("Matches your patterns (score {:.1})", score));
    }
    parts.join(". ")
}

/// Confidence from score, capped at 0.95
pub fn confidence_from_score(score: f64) -> f64 {
    round_to(score / 10.0, 2).min(0.95)
}

/// Price of `side` given the market's reference yes price
pub fn entry_price_for(candidate: &CandidateMarket, side: Side) -> Decimal {
    side.price_from_yes(candidate.market.reference_yes_price())
}

/// `1234567` -> `1,234,567`
fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
