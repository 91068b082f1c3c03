//! Paper Trader Library
//!
//! Paper-trading engine for Kalshi prediction markets: tracks accepted bets
//! through to settlement, keeps per-user progress, derives a trading profile
//! from settled history and ranks open markets against it.

pub mod common;
pub mod config;
pub mod kalshi;
pub mod models;
pub mod notify;
pub mod positions;
pub mod progress;
pub mod strategy;

// Re-export commonly used types
pub use common::errors::{Result, TraderError};
pub use common::traits::{MarketDataSource, Notifier, PositionLedger};
pub use common::types::{
    CandidateMarket, EventInfo, EventWithMarkets, MarketData, MarketSnapshot, Orderbook, Side,
};
pub use config::types::AppConfig;
pub use kalshi::{KalshiMarketSource, KalshiRestClient};
pub use models::{ModelRegistry, ModelRunner};
pub use notify::{ExpoPushNotifier, LogNotifier};
pub use positions::{
    InMemoryLedger, NewPosition, PositionMonitor, PositionService, PositionStatus, SettlementResolver,
    TrackedPosition,
};
pub use progress::{ProgressTracker, UserProgress};

// Strategy types
pub use strategy::{
    ComputedSize, KellySizeCalculator, RiskTier, Signal, SizeCalculator, StrategyEngine,
    StrategyProfile,
};
