//! Trait definitions for the engine's external collaborators

use async_trait::async_trait;

use super::errors::Result;
use super::types::{EventInfo, EventWithMarkets, MarketSnapshot, Orderbook};
use crate::positions::types::{PositionUpdate, TrackedPosition};
use crate::progress::types::UserProgress;

/// Public market data (Kalshi, or a fake in tests)
///
/// Unknown tickers must come back as `Ok(None)`, never as an error.
/// Timeouts are the implementation's responsibility.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Look up a market; implementations may serve a recently cached copy
    async fn fetch_market(&self, ticker: &str) -> Result<Option<MarketSnapshot>>;

    /// Look up a market, bypassing any cache
    ///
    /// Settlement decisions always go through this method.
    async fn fetch_market_fresh(&self, ticker: &str) -> Result<Option<MarketSnapshot>> {
        self.fetch_market(ticker).await
    }

    /// Look up event metadata (title, category)
    async fn fetch_event(&self, event_ticker: &str) -> Result<Option<EventInfo>>;

    /// Open events with their nested markets, used as signal candidates
    async fn open_events(&self, limit: u32) -> Result<Vec<EventWithMarkets>>;

    /// Resting orders for a market; sources without book data return `None`
    async fn fetch_orderbook(&self, _ticker: &str) -> Result<Option<Orderbook>> {
        Ok(None)
    }

    /// Drop expired cache entries; returns how many were removed
    async fn purge_expired(&self) -> usize {
        0
    }

    /// Get the name of the data source
    fn source_name(&self) -> &'static str;
}

/// Durable store of tracked positions and per-user progress
///
/// Plain key-value semantics: no cross-record transactions, last write wins.
#[async_trait]
pub trait PositionLedger: Send + Sync {
    async fn get_position(&self, position_id: &str) -> Result<Option<TrackedPosition>>;

    /// All positions of a user, in ledger order
    async fn list_positions_by_user(&self, user_id: &str) -> Result<Vec<TrackedPosition>>;

    async fn put_position(&self, position: TrackedPosition) -> Result<()>;

    /// Apply a partial update; returns the stored record, or `None` if missing
    async fn update_position(
        &self,
        position_id: &str,
        update: PositionUpdate,
    ) -> Result<Option<TrackedPosition>>;

    async fn delete_position(&self, position_id: &str) -> Result<bool>;

    /// Every user holding at least one active position, with those positions
    async fn active_positions_by_user(&self) -> Result<Vec<(String, Vec<TrackedPosition>)>>;

    async fn get_progress(&self, user_id: &str) -> Result<Option<UserProgress>>;

    async fn put_progress(&self, progress: UserProgress) -> Result<()>;
}

/// Digest notification transport
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one digest to a user
    async fn send_digest(&self, user_id: &str, title: &str, body: &str) -> Result<()>;

    /// Get the name of the transport
    fn name(&self) -> &'static str;
}
