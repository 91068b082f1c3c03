//! Strategy module: profiles, sizing and signals
//!
//! Everything here is computed on demand from a user's position history and
//! is never persisted.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PROFILE (pure)                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  settled positions ──▶ build_profile()                      │
//! │    - win rate overall / by category / by side / by band     │
//! │    - embedded sizing at the average entry price             │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SIGNALS                                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  open events ──▶ CandidateMarket                            │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  score_market() ──▶ filter > 0 ──▶ rank                     │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  cap by limit and tier ──▶ SizeCalculator per signal        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`build_profile`]: Aggregates settled history into a [`StrategyProfile`]
//! - [`SizeCalculator`]: Turns balance and edge into a stake ([`KellySizeCalculator`])
//! - [`score_market`]: Multi-factor heuristic score for one candidate
//! - [`rank_signals`]: Pure ranking and sizing of candidates
//! - [`StrategyEngine`]: Wires the above to the ledger and market source

mod profile;
mod scorer;
mod signals;
mod size_calculator;
mod types;

pub use profile::build_profile;

pub use scorer::{build_reasoning, confidence_from_score, entry_price_for, pick_side, score_market};

pub use signals::{rank_signals, StrategyEngine};

pub use size_calculator::{
    ComputedSize,
    KellySizeCalculator,
    RiskTier,
    SizeCalculator,
    SizingRequest,
};

pub use types::{
    CategoryStat,
    EntryBand,
    PreferredSide,
    Signal,
    StrategyPreferences,
    StrategyProfile,
    MIN_SETTLED_TRADES,
};
