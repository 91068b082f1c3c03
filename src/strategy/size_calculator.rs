use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Balance-based risk bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    /// No balance or no price to size against
    Broke,
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskTier {
    /// Select the tier for a balance in cents
    pub fn for_balance(balance: f64) -> Self {
        if balance <= 0.0 {
            RiskTier::Broke
        } else if balance < 2000.0 {
            RiskTier::Conservative
        } else if balance < 5000.0 {
            RiskTier::Moderate
        } else {
            RiskTier::Aggressive
        }
    }

    /// Largest fraction of the balance risked on one trade
    pub fn max_risk_fraction(&self) -> f64 {
        match self {
            RiskTier::Broke => 0.0,
            RiskTier::Conservative => 0.05,
            RiskTier::Moderate => 0.08,
            RiskTier::Aggressive => 0.10,
        }
    }

    /// Cap on concurrent positions
    pub fn max_positions(&self) -> usize {
        match self {
            RiskTier::Broke => 0,
            RiskTier::Conservative => 3,
            RiskTier::Moderate => 5,
            RiskTier::Aggressive => 8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Broke => "broke",
            RiskTier::Conservative => "conservative",
            RiskTier::Moderate => "moderate",
            RiskTier::Aggressive => "aggressive",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs for sizing a single trade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingRequest {
    /// Paper balance in cents
    pub balance: Decimal,
    /// Price paid per contract in cents
    pub entry_price: Decimal,
    /// Signal confidence, carried for callers; Kelly uses `win_rate`
    pub confidence: f64,
    pub win_rate: f64,
}

impl SizingRequest {
    pub fn new(balance: Decimal, entry_price: Decimal, confidence: f64, win_rate: f64) -> Self {
        Self {
            balance,
            entry_price,
            confidence,
            win_rate,
        }
    }
}

/// Size for a potential trade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComputedSize {
    pub risk_tier: RiskTier,
    pub suggested_qty: u64,
    /// Final risk fraction as a percentage, one decimal
    pub max_risk_pct: f64,
    pub max_positions: usize,
    /// Full Kelly fraction, four decimals
    pub kelly_fraction: f64,
    /// Unrounded fraction of the balance at risk
    #[serde(skip)]
    pub risk_fraction: f64,
}

impl ComputedSize {
    /// Zero-size result for degenerate inputs
    pub fn broke() -> Self {
        Self {
            risk_tier: RiskTier::Broke,
            suggested_qty: 0,
            max_risk_pct: 0.0,
            max_positions: 0,
            kelly_fraction: 0.0,
            risk_fraction: 0.0,
        }
    }
}

/// Turns a balance and an edge into a stake
///
/// Implementations are pure: no I/O, no shared state. They never fail and never
/// return a negative quantity.
pub trait SizeCalculator: Send + Sync {
    fn compute(&self, request: &SizingRequest) -> ComputedSize;

    /// Concurrent-position cap for a balance, sized at a reference price
    fn max_positions(&self, balance: Decimal, reference_price: Decimal, win_rate: f64) -> usize {
        self.compute(&SizingRequest::new(balance, reference_price, win_rate, win_rate))
            .max_positions
    }
}

/// Half-Kelly sizing capped by the balance tier
#[derive(Debug, Clone, Copy, Default)]
pub struct KellySizeCalculator;

impl KellySizeCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Binary-market Kelly fraction for a contract bought at `entry_price` cents
    ///
    /// Payout odds are `100 / entry - 1`; at or above 100 cents they are pinned to
    /// 0.01 so the division stays finite. Never negative.
    pub fn kelly_fraction(entry_price: f64, win_rate: f64) -> f64 {
        let payout_odds = if entry_price < 100.0 {
            100.0 / entry_price - 1.0
        } else {
            0.01
        };
        let q = 1.0 - win_rate;
        ((win_rate * payout_odds - q) / payout_odds).max(0.0)
    }
}

impl SizeCalculator for KellySizeCalculator {
    fn compute(&self, request: &SizingRequest) -> ComputedSize {
        let balance = request.balance.to_f64().unwrap_or(0.0);
        let entry_price = request.entry_price.to_f64().unwrap_or(0.0);
        if balance <= 0.0 || entry_price <= 0.0 {
            return ComputedSize::broke();
        }

        let risk_tier = RiskTier::for_balance(balance);
        let kelly = Self::kelly_fraction(entry_price, request.win_rate);
        let risk_fraction = (kelly / 2.0).min(risk_tier.max_risk_fraction());

        let max_spend = balance * risk_fraction;
        let suggested_qty = ((max_spend / entry_price).floor() as u64).max(1);

        ComputedSize {
            risk_tier,
            suggested_qty,
            max_risk_pct: round_to(risk_fraction * 100.0, 1),
            max_positions: risk_tier.max_positions(),
            kelly_fraction: round_to(kelly, 4),
            risk_fraction,
        }
    }
}

/// Round to `places` decimals, ties to even on the exact binary value
pub(crate) fn round_to(value: f64, places: u32) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| {
            d.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
                .to_f64()
                .unwrap_or(value)
        })
        .unwrap_or(value)
}
