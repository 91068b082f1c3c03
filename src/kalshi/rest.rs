//! REST API client for Kalshi public market data

use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument};

use super::messages::*;
use crate::common::errors::{Result, TraderError};
use crate::common::types::{EventInfo, EventWithMarkets, MarketSnapshot, Orderbook};

/// Unauthenticated REST client for the Kalshi trade API
#[derive(Debug, Clone)]
pub struct KalshiRestClient {
    /// HTTP client
    client: Client,
    /// Base URL, without a trailing slash
    base_url: String,
}

impl KalshiRestClient {
    /// Create a new REST client
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    /// Create a new REST client with custom timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TraderError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a GET and decode the body; 404 becomes `None`
    async fn get_optional<T>(&self, url: &str) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.client.get(url).send().await.map_err(map_timeout)?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Not found: {}", url);
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TraderError::InvalidResponse(format!(
                "Server returned status {}: {}",
                status, body
            )));
        }

        let text = response.text().await?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    // ========================================================================
    // Public Endpoints (No Authentication Required)
    // ========================================================================

    /// Get a market by ticker
    ///
    /// Unknown tickers return `Ok(None)`.
    #[instrument(skip(self))]
    pub async fn fetch_market(&self, ticker: &str) -> Result<Option<MarketSnapshot>> {
        let url = format!("{}/markets/{}", self.base_url, ticker);
        debug!("Fetching market from: {}", url);

        let response: Option<MarketResponse> = self.get_optional(&url).await?;
        Ok(response.map(|r| MarketSnapshot::from(r.market)))
    }

    /// Get the resting orders for a market
    #[instrument(skip(self))]
    pub async fn fetch_orderbook(&self, ticker: &str) -> Result<Option<Orderbook>> {
        let url = format!("{}/markets/{}/orderbook", self.base_url, ticker);
        debug!("Fetching orderbook from: {}", url);

        let response: Option<OrderbookResponse> = self.get_optional(&url).await?;
        Ok(response.map(|r| Orderbook::from(r.orderbook)))
    }

    /// Get event metadata by event ticker
    #[instrument(skip(self))]
    pub async fn fetch_event(&self, event_ticker: &str) -> Result<Option<EventInfo>> {
        let url = format!("{}/events/{}", self.base_url, event_ticker);
        debug!("Fetching event from: {}", url);

        let response: Option<EventResponse> = self.get_optional(&url).await?;
        Ok(response.map(|r| {
            let extra = r.markets.as_ref().map(Vec::len).unwrap_or(0);
            r.event.info(extra)
        }))
    }

    /// List events by status, with their markets nested
    #[instrument(skip(self))]
    pub async fn fetch_events(&self, status: &str, limit: u32) -> Result<Vec<EventWithMarkets>> {
        let url = format!(
            "{}/events?status={}&limit={}&with_nested_markets=true",
            self.base_url, status, limit
        );
        debug!("Fetching events from: {}", url);

        let response: Option<EventsResponse> = self.get_optional(&url).await?;
        let events: Vec<EventWithMarkets> = response
            .map(|r| r.events)
            .unwrap_or_default()
            .into_iter()
            .map(EventWithMarkets::from)
            .collect();

        debug!("Fetched {} events", events.len());
        Ok(events)
    }
}

fn map_timeout(err: reqwest::Error) -> TraderError {
    if err.is_timeout() {
        TraderError::Timeout(err.to_string())
    } else {
        TraderError::HttpRequest(err)
    }
}
