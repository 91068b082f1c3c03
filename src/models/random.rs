//! Stub runner producing random recommendations for testing

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;

use super::runner::ModelRunner;
use super::types::{EvScenario, Factor, ModelRequest, Recommendation};
use crate::common::errors::Result;
use crate::common::types::Side;

const STUB_MARKETS: [(&str, &str); 5] = [
    ("KXNBAGAME-26FEB21HOUNYK", "NBA: Rockets vs Knicks"),
    ("KXAPPROVAL-26MAR-50", "Presidential approval above 50%?"),
    ("KXFED-26MAR-CUT", "Fed rate cut in March?"),
    ("KXBTC-26APR-100K", "Bitcoin above $100k by April?"),
    ("KXUFC-312-MAIN", "UFC 312 main event winner"),
];

const FACTOR_POOL: [(&str, &str, &str, &str); 6] = [
    ("Win rate in comparable matchups", "Sports Reference", "favors_yes", "high"),
    ("Trailing 7-day polling average", "Poll aggregate", "favors_yes", "medium"),
    ("24h volume spike", "Kalshi order book", "favors_yes", "medium"),
    ("Polls disagree with market price", "Poll aggregate", "favors_no", "high"),
    ("Questionable starter", "Team injury report", "favors_no", "high"),
    ("Lopsided public sentiment", "Social trends", "favors_no", "low"),
];

const BEAR_CASES: [&str; 3] = [
    "A late news event could shift the fundamentals before the contract closes.",
    "The edge may already be priced in; remaining upside is thin after costs.",
    "The supporting trend is a short-lived outlier and may revert.",
];

const NO_BET_REASONS: [&str; 3] = [
    "Market price already matches the estimated probability.",
    "Not enough data to establish an edge.",
    "Edge is smaller than transaction costs.",
];

const NO_BET_PROBABILITY: f64 = 0.15;
const MAX_RECOMMENDED_POSITION: f64 = 0.15;

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Expected value and Kelly at confidence -10, 0 and +10 points
fn ev_scenarios<R: Rng + ?Sized>(rng: &mut R, side: Side, confidence: f64) -> Vec<EvScenario> {
    let contract_price = round_to(rng.gen_range(0.30..=0.70), 2);
    let odds = (1.0 - contract_price) / contract_price;

    [-0.10, 0.0, 0.10]
        .iter()
        .map(|offset| {
            let probability = round_to((confidence + offset).clamp(0.05, 0.95), 2);
            let ev = match side {
                Side::Yes => probability * (1.0 - contract_price) - (1.0 - probability) * contract_price,
                Side::No => (1.0 - probability) * (1.0 - contract_price) - probability * contract_price,
            };
            let edge = (ev / contract_price).max(0.0);
            EvScenario {
                probability,
                ev_per_contract: round_to(ev, 4),
                kelly_fraction: round_to((edge / odds).max(0.0), 4),
            }
        })
        .collect()
}

/// Random recommendations; not a real model
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomModel;

impl RandomModel {
    /// Generate one recommendation from the given source of randomness
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Recommendation {
        let (ticker, title) = STUB_MARKETS[rng.gen_range(0..STUB_MARKETS.len())];
        let side = if rng.gen_bool(0.5) { Side::Yes } else { Side::No };
        let no_bet = rng.gen_bool(NO_BET_PROBABILITY);
        let confidence = if no_bet {
            round_to(rng.gen_range(0.45..=0.55), 2)
        } else {
            round_to(rng.gen_range(0.55..=0.95), 2)
        };

        let factor_count = rng.gen_range(3..=5);
        let factors = FACTOR_POOL
            .choose_multiple(rng, factor_count)
            .map(|(stat, source, direction, magnitude)| Factor {
                stat: stat.to_string(),
                source: source.to_string(),
                direction: direction.to_string(),
                magnitude: magnitude.to_string(),
                detail: format!("{} ({})", stat, magnitude),
            })
            .collect();

        let ev_analysis = ev_scenarios(rng, side, confidence);
        let avg_kelly =
            ev_analysis.iter().map(|s| s.kelly_fraction).sum::<f64>() / ev_analysis.len() as f64;

        let breakeven = (rng.gen_range(0.40..=0.65) * 100.0_f64).round() as i64;
        let true_prob = (confidence * 100.0).round() as i64;
        let reasoning = format!(
            "Break-even probability is {}% against an estimated {}%, a {}-point edge.",
            breakeven,
            true_prob,
            (true_prob - breakeven).abs()
        );

        Recommendation {
            ticker: ticker.to_string(),
            title: title.to_string(),
            side,
            confidence,
            reasoning,
            factors,
            ev_analysis,
            bear_case: BEAR_CASES[rng.gen_range(0..BEAR_CASES.len())].to_string(),
            recommended_position: round_to(avg_kelly.min(MAX_RECOMMENDED_POSITION), 4),
            no_bet,
            no_bet_reason: no_bet
                .then(|| NO_BET_REASONS[rng.gen_range(0..NO_BET_REASONS.len())].to_string()),
        }
    }
}

#[async_trait]
impl ModelRunner for RandomModel {
    fn name(&self) -> &str {
        "random"
    }

    fn display_name(&self) -> &str {
        "Random Generator"
    }

    fn description(&self) -> &str {
        "Generates random analysis for testing. Not a real model."
    }

    async fn run(&self, _request: &ModelRequest) -> Result<Recommendation> {
        Ok(self.generate(&mut rand::thread_rng()))
    }
}
