//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use paper_trader::common::errors::{Result, TraderError};
use paper_trader::common::traits::{MarketDataSource, Notifier, PositionLedger};
use paper_trader::common::types::{EventInfo, EventWithMarkets, MarketSnapshot, Side};
use paper_trader::positions::{
    EntrySnapshot, InMemoryLedger, NewPosition, PositionStatus, PositionUpdate, TrackedPosition,
};
use paper_trader::progress::UserProgress;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Create an active position
pub fn active_position(
    position_id: &str,
    user_id: &str,
    ticker: &str,
    side: Side,
    entry_price: Decimal,
) -> TrackedPosition {
    TrackedPosition::open(
        position_id,
        NewPosition::new(user_id, ticker, side, entry_price),
        Utc::now() - Duration::days(1),
    )
}

/// Create a settled position with the given outcome
pub fn settled_position(
    position_id: &str,
    user_id: &str,
    side: Side,
    entry_price: Decimal,
    won: bool,
    category: &str,
) -> TrackedPosition {
    let mut position = active_position(
        position_id,
        user_id,
        &format!("KX{}-{}", category.to_uppercase(), position_id),
        side,
        entry_price,
    );
    let settlement_price = if won { dec!(100) } else { Decimal::ZERO };
    position.status = if won {
        PositionStatus::SettledWin
    } else {
        PositionStatus::SettledLoss
    };
    position.settlement_price = Some(settlement_price);
    position.realized_pnl = Some(settlement_price - entry_price);
    position.settled_at = Some(Utc::now());
    position.market_snapshot_at_entry = Some(EntrySnapshot {
        yes_bid: None,
        yes_ask: Some(entry_price),
        last_price: Some(entry_price),
        volume: None,
        category: Some(category.to_string()),
        event_title: None,
        captured_at: position.created_at,
    });
    position
}

/// Open market quoted at the given yes ask
pub fn open_market(ticker: &str, yes_ask: Decimal) -> MarketSnapshot {
    MarketSnapshot {
        status: Some("active".to_string()),
        yes_bid: Some(yes_ask - dec!(1)),
        yes_ask: Some(yes_ask),
        last_price: Some(yes_ask),
        volume_24h: Some(2_500),
        ..MarketSnapshot::new(ticker)
    }
}

/// Settled market with the given result
pub fn settled_market(ticker: &str, result: Side) -> MarketSnapshot {
    MarketSnapshot {
        status: Some("settled".to_string()),
        result: Some(result),
        ..MarketSnapshot::new(ticker)
    }
}

/// In-memory market source with per-ticker failure injection
#[derive(Default)]
pub struct FakeMarketSource {
    markets: RwLock<HashMap<String, MarketSnapshot>>,
    failing: RwLock<HashSet<String>>,
    events: RwLock<Vec<EventWithMarkets>>,
    purges: AtomicUsize,
}

impl FakeMarketSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_market(&self, market: MarketSnapshot) {
        self.markets
            .write()
            .await
            .insert(market.ticker.clone(), market);
    }

    /// Make lookups for this ticker fail
    pub async fn fail_ticker(&self, ticker: &str) {
        self.failing.write().await.insert(ticker.to_string());
    }

    /// How many times expired entries were purged
    pub fn purge_count(&self) -> usize {
        self.purges.load(Ordering::SeqCst)
    }

    pub async fn add_event(&self, category: &str, title: &str, markets: Vec<MarketSnapshot>) {
        let mut events = self.events.write().await;
        let event_ticker = format!("EVT-{}", events.len());
        events.push(EventWithMarkets {
            info: EventInfo {
                event_ticker,
                title: Some(title.to_string()),
                category: Some(category.to_string()),
                mutually_exclusive: Some(false),
                market_count: markets.len(),
            },
            markets,
        });
    }
}

#[async_trait]
impl MarketDataSource for FakeMarketSource {
    async fn fetch_market(&self, ticker: &str) -> Result<Option<MarketSnapshot>> {
        if self.failing.read().await.contains(ticker) {
            return Err(TraderError::Timeout(format!("market {}", ticker)));
        }
        Ok(self.markets.read().await.get(ticker).cloned())
    }

    async fn fetch_event(&self, event_ticker: &str) -> Result<Option<EventInfo>> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .find(|e| e.info.event_ticker == event_ticker)
            .map(|e| e.info.clone()))
    }

    async fn open_events(&self, limit: u32) -> Result<Vec<EventWithMarkets>> {
        let events = self.events.read().await;
        Ok(events.iter().take(limit as usize).cloned().collect())
    }

    async fn purge_expired(&self) -> usize {
        self.purges.fetch_add(1, Ordering::SeqCst);
        0
    }

    fn source_name(&self) -> &'static str {
        "fake"
    }
}

/// Ledger whose first `fail_listings` enumerations of active positions fail
pub struct FlakyLedger {
    inner: Arc<InMemoryLedger>,
    fail_listings: usize,
    listings: AtomicUsize,
}

impl FlakyLedger {
    pub fn new(inner: Arc<InMemoryLedger>, fail_listings: usize) -> Self {
        Self {
            inner,
            fail_listings,
            listings: AtomicUsize::new(0),
        }
    }

    pub fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PositionLedger for FlakyLedger {
    async fn get_position(&self, position_id: &str) -> Result<Option<TrackedPosition>> {
        self.inner.get_position(position_id).await
    }

    async fn list_positions_by_user(&self, user_id: &str) -> Result<Vec<TrackedPosition>> {
        self.inner.list_positions_by_user(user_id).await
    }

    async fn put_position(&self, position: TrackedPosition) -> Result<()> {
        self.inner.put_position(position).await
    }

    async fn update_position(
        &self,
        position_id: &str,
        update: PositionUpdate,
    ) -> Result<Option<TrackedPosition>> {
        self.inner.update_position(position_id, update).await
    }

    async fn delete_position(&self, position_id: &str) -> Result<bool> {
        self.inner.delete_position(position_id).await
    }

    async fn active_positions_by_user(&self) -> Result<Vec<(String, Vec<TrackedPosition>)>> {
        let call = self.listings.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_listings {
            return Err(TraderError::Ledger("ledger unavailable".to_string()));
        }
        self.inner.active_positions_by_user().await
    }

    async fn get_progress(&self, user_id: &str) -> Result<Option<UserProgress>> {
        self.inner.get_progress(user_id).await
    }

    async fn put_progress(&self, progress: UserProgress) -> Result<()> {
        self.inner.put_progress(progress).await
    }
}

/// A digest captured by [`RecordingNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentDigest {
    pub user_id: String,
    pub title: String,
    pub body: String,
}

/// Notifier that keeps every digest it is asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    sent: RwLock<Vec<SentDigest>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<SentDigest> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_digest(&self, user_id: &str, title: &str, body: &str) -> Result<()> {
        self.sent.write().await.push(SentDigest {
            user_id: user_id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
