//! Kalshi public REST response types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::types::{
    EventInfo, EventWithMarkets, MarketSnapshot, Orderbook, OrderbookLevel, Side,
};

/// Envelope for `GET /markets/{ticker}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketResponse {
    pub market: KalshiMarket,
}

/// Envelope for `GET /events/{event_ticker}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResponse {
    pub event: KalshiEvent,
    /// Newer API versions return markets beside the event instead of nested
    #[serde(default)]
    pub markets: Option<Vec<KalshiMarket>>,
}

/// Envelope for `GET /events`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub events: Vec<KalshiEvent>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Envelope for `GET /markets/{ticker}/orderbook`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderbookResponse {
    pub orderbook: KalshiOrderbook,
}

/// Book as returned by the exchange: `[price, size]` pairs per side
///
/// A side with no resting orders comes back as `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KalshiOrderbook {
    #[serde(default)]
    pub yes: Option<Vec<Vec<i64>>>,
    #[serde(default)]
    pub no: Option<Vec<Vec<i64>>>,
}

/// Market as returned by the exchange (prices in cents)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KalshiMarket {
    pub ticker: String,
    #[serde(default)]
    pub event_ticker: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// "yes", "no", or empty while unresolved
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub yes_bid: Option<Decimal>,
    #[serde(default)]
    pub yes_ask: Option<Decimal>,
    #[serde(default)]
    pub no_bid: Option<Decimal>,
    #[serde(default)]
    pub no_ask: Option<Decimal>,
    #[serde(default)]
    pub last_price: Option<Decimal>,
    #[serde(default)]
    pub previous_price: Option<Decimal>,
    #[serde(default)]
    pub previous_yes_bid: Option<Decimal>,
    #[serde(default)]
    pub volume: Option<i64>,
    #[serde(default)]
    pub volume_24h: Option<i64>,
    #[serde(default)]
    pub open_interest: Option<i64>,
    #[serde(default)]
    pub close_time: Option<String>,
}

/// Event as returned by the exchange
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KalshiEvent {
    pub event_ticker: String,
    #[serde(default)]
    pub series_ticker: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sub_title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub mutually_exclusive: Option<bool>,
    /// Present when requested with `with_nested_markets=true`
    #[serde(default)]
    pub markets: Option<Vec<KalshiMarket>>,
}

impl From<KalshiMarket> for MarketSnapshot {
    fn from(market: KalshiMarket) -> Self {
        Self {
            result: market.result.as_deref().and_then(Side::parse),
            ticker: market.ticker,
            title: market.title,
            event_ticker: market.event_ticker,
            status: market.status,
            yes_bid: market.yes_bid,
            yes_ask: market.yes_ask,
            no_bid: market.no_bid,
            no_ask: market.no_ask,
            last_price: market.last_price,
            previous_price: market.previous_price,
            volume: market.volume,
            volume_24h: market.volume_24h,
            open_interest: market.open_interest,
        }
    }
}

/// Malformed levels (fewer than two entries) are dropped
fn levels(raw: Option<Vec<Vec<i64>>>) -> Vec<OrderbookLevel> {
    raw.unwrap_or_default()
        .into_iter()
        .filter_map(|level| match level.as_slice() {
            [price, size, ..] => Some(OrderbookLevel {
                price: Decimal::from(*price),
                size: *size,
            }),
            _ => None,
        })
        .collect()
}

impl From<KalshiOrderbook> for Orderbook {
    fn from(book: KalshiOrderbook) -> Self {
        Self {
            yes: levels(book.yes),
            no: levels(book.no),
        }
    }
}

impl KalshiEvent {
    /// Event metadata; `extra_markets` counts markets returned beside the event
    pub fn info(&self, extra_markets: usize) -> EventInfo {
        EventInfo {
            event_ticker: self.event_ticker.clone(),
            title: self.title.clone(),
            category: self.category.clone(),
            mutually_exclusive: self.mutually_exclusive,
            market_count: self.markets.as_ref().map(Vec::len).unwrap_or(0) + extra_markets,
        }
    }
}

impl From<KalshiEvent> for EventWithMarkets {
    fn from(event: KalshiEvent) -> Self {
        let info = event.info(0);
        let markets = event
            .markets
            .unwrap_or_default()
            .into_iter()
            .map(MarketSnapshot::from)
            .collect();
        Self { info, markets }
    }
}
