//! Kalshi market source: REST client behind owned TTL caches

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

use super::rest::KalshiRestClient;
use crate::common::cache::TtlCache;
use crate::common::errors::Result;
use crate::common::traits::MarketDataSource;
use crate::common::types::{EventInfo, EventWithMarkets, MarketSnapshot, Orderbook};
use crate::config::types::KalshiConfig;

const OPEN_STATUS: &str = "open";

/// [`MarketDataSource`] backed by the Kalshi public API
///
/// Owns two caches, both empty at start-up: market-by-ticker and the open
/// events list. Cached entries are advisory; settlement goes through
/// [`MarketDataSource::fetch_market_fresh`], which always hits the API.
pub struct KalshiMarketSource {
    rest: KalshiRestClient,
    markets: TtlCache<String, Option<MarketSnapshot>>,
    open_events: TtlCache<u32, Vec<EventWithMarkets>>,
}

impl KalshiMarketSource {
    pub fn new(rest: KalshiRestClient, market_ttl: Duration, open_events_ttl: Duration) -> Self {
        Self {
            rest,
            markets: TtlCache::new(market_ttl),
            open_events: TtlCache::new(open_events_ttl),
        }
    }

    /// Create a market source from configuration
    pub fn from_config(config: &KalshiConfig) -> Result<Self> {
        let rest = KalshiRestClient::with_timeout(&config.rest_url, config.request_timeout())?;
        Ok(Self::new(
            rest,
            config.market_cache_ttl(),
            config.open_markets_cache_ttl(),
        ))
    }

    /// Get a reference to the REST client
    pub fn rest(&self) -> &KalshiRestClient {
        &self.rest
    }

    /// Drop a cached market
    pub async fn invalidate_market(&self, ticker: &str) {
        self.markets.invalidate(&ticker.to_string()).await;
    }

    /// Drop every cached entry
    pub async fn clear_caches(&self) {
        self.markets.clear().await;
        self.open_events.clear().await;
    }
}

#[async_trait]
impl MarketDataSource for KalshiMarketSource {
    async fn fetch_market(&self, ticker: &str) -> Result<Option<MarketSnapshot>> {
        let key = ticker.to_string();
        if let Some(cached) = self.markets.get(&key).await {
            debug!(ticker, "market cache hit");
            return Ok(cached);
        }
        self.fetch_market_fresh(ticker).await
    }

    #[instrument(skip(self))]
    async fn fetch_market_fresh(&self, ticker: &str) -> Result<Option<MarketSnapshot>> {
        let market = self.rest.fetch_market(ticker).await?;
        self.markets.insert(ticker.to_string(), market.clone()).await;
        Ok(market)
    }

    async fn fetch_event(&self, event_ticker: &str) -> Result<Option<EventInfo>> {
        self.rest.fetch_event(event_ticker).await
    }

    async fn open_events(&self, limit: u32) -> Result<Vec<EventWithMarkets>> {
        if let Some(cached) = self.open_events.get(&limit).await {
            debug!(limit, "open events cache hit");
            return Ok(cached);
        }
        let events = self.rest.fetch_events(OPEN_STATUS, limit).await?;
        self.open_events.insert(limit, events.clone()).await;
        Ok(events)
    }

    async fn fetch_orderbook(&self, ticker: &str) -> Result<Option<Orderbook>> {
        self.rest.fetch_orderbook(ticker).await
    }

    async fn purge_expired(&self) -> usize {
        let removed = self.markets.purge_expired().await + self.open_events.purge_expired().await;
        if removed > 0 {
            debug!(removed, "purged expired cache entries");
        }
        removed
    }

    fn source_name(&self) -> &'static str {
        "Kalshi"
    }
}
