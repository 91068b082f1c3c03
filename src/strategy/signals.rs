//! Signal generation
//!
//! Ranks open candidate markets against a strategy profile and sizes each
//! pick. [`rank_signals`] is pure; [`StrategyEngine`] wires it to the ledger,
//! the progress tracker and the market source.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::profile::build_profile;
use super::scorer::{build_reasoning, confidence_from_score, entry_price_for, pick_side, score_market};
use super::size_calculator::{round_to, SizeCalculator, SizingRequest};
use super::types::{Signal, StrategyProfile};
use crate::common::errors::Result;
use crate::common::traits::{MarketDataSource, PositionLedger};
use crate::common::types::CandidateMarket;
use crate::progress::ProgressTracker;

/// Reference price used to derive the tier's position cap
const TIER_REFERENCE_PRICE: Decimal = dec!(50);

/// Score, rank, cap and size candidate markets
///
/// Returns nothing for an insufficient profile. Only markets scoring above zero
/// qualify; ties keep candidate order. The result is capped by both `limit` and
/// the balance tier's concurrent-position cap.
pub fn rank_signals(
    profile: &StrategyProfile,
    candidates: Vec<CandidateMarket>,
    balance: Decimal,
    limit: usize,
    sizer: &dyn SizeCalculator,
) -> Vec<Signal> {
    let Some(prefs) = profile.preferences() else {
        return Vec::new();
    };

    let mut scored: Vec<(CandidateMarket, f64)> = candidates
        .into_iter()
        .map(|candidate| {
            let score = score_market(&candidate, prefs);
            (candidate, score)
        })
        .filter(|(_, score)| *score > 0.0)
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    let tier_cap = sizer.max_positions(balance, TIER_REFERENCE_PRICE, prefs.win_rate);
    let effective_max = limit.min(tier_cap);

    scored
        .into_iter()
        .take(effective_max)
        .map(|(candidate, score)| {
            let side = pick_side(&candidate, prefs);
            let entry_price = entry_price_for(&candidate, side);
            let confidence = confidence_from_score(score);
            let sizing = sizer.compute(&SizingRequest::new(
                balance,
                entry_price,
                confidence,
                prefs.win_rate,
            ));
            let reasoning = build_reasoning(&candidate, prefs, score);

            let CandidateMarket {
                market,
                category,
                event_title,
            } = candidate;
            Signal {
                title: market.title.clone().unwrap_or(event_title),
                ticker: market.ticker,
                side,
                confidence,
                reasoning,
                match_score: round_to(score, 2),
                category,
                current_price: market.last_price,
                entry_price_suggestion: entry_price,
                suggested_qty: sizing.suggested_qty,
                risk_tier: sizing.risk_tier,
                max_risk_pct: sizing.max_risk_pct,
            }
        })
        .collect()
}

/// Derives strategy profiles and signals for a user on demand
pub struct StrategyEngine {
    ledger: Arc<dyn PositionLedger>,
    market: Arc<dyn MarketDataSource>,
    progress: Arc<ProgressTracker>,
    sizer: Arc<dyn SizeCalculator>,
    open_events_limit: u32,
}

impl StrategyEngine {
    pub fn new(
        ledger: Arc<dyn PositionLedger>,
        market: Arc<dyn MarketDataSource>,
        progress: Arc<ProgressTracker>,
        sizer: Arc<dyn SizeCalculator>,
        open_events_limit: u32,
    ) -> Self {
        Self {
            ledger,
            market,
            progress,
            sizer,
            open_events_limit,
        }
    }

    /// Build the user's profile from their settled history
    #[instrument(skip(self))]
    pub async fn derive_strategy(&self, user_id: &str) -> Result<StrategyProfile> {
        let positions = self.ledger.list_positions_by_user(user_id).await?;
        let balance = self.progress.paper_balance(user_id).await?;
        let profile = build_profile(user_id, &positions, balance, self.sizer.as_ref(), Utc::now());
        debug!(
            user_id,
            total_trades = profile.total_trades,
            insufficient = profile.insufficient_data,
            "strategy derived"
        );
        Ok(profile)
    }

    /// Ranked, sized signals; empty when history is too thin
    #[instrument(skip(self))]
    pub async fn generate_signals(&self, user_id: &str, limit: usize) -> Result<Vec<Signal>> {
        let profile = self.derive_strategy(user_id).await?;
        if profile.insufficient_data {
            info!(user_id, trades = profile.total_trades, "not enough settled trades for signals");
            return Ok(Vec::new());
        }

        let balance = self.progress.paper_balance(user_id).await?;
        let events = self.market.open_events(self.open_events_limit).await?;
        let candidates = CandidateMarket::from_events(events);
        let candidate_count = candidates.len();

        let signals = rank_signals(&profile, candidates, balance, limit, self.sizer.as_ref());
        info!(
            user_id,
            candidates = candidate_count,
            signals = signals.len(),
            "signals generated"
        );
        Ok(signals)
    }
}
