//! Unified types shared by the market-data client and the engine

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Payout of a winning contract, in cents
pub const CONTRACT_PAYOUT_CENTS: Decimal = dec!(100);

/// Contract outcome a position bets on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    /// Parse an exchange outcome string ("yes"/"no", any case)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" => Some(Side::Yes),
            "no" => Some(Side::No),
            _ => None,
        }
    }

    /// Price of this side given the yes price (both in cents)
    pub fn price_from_yes(&self, yes_price: Decimal) -> Decimal {
        match self {
            Side::Yes => yes_price,
            Side::No => CONTRACT_PAYOUT_CENTS - yes_price,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Yes => "yes",
            Side::No => "no",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live state of a single binary market (prices in cents)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub event_ticker: Option<String>,
    /// Exchange lifecycle status ("active", "closed", "settled", ...)
    #[serde(default)]
    pub status: Option<String>,
    /// Settlement outcome, absent until the market resolves
    #[serde(default)]
    pub result: Option<Side>,
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
    pub volume: Option<i64>,
    #[serde(default)]
    pub volume_24h: Option<i64>,
    #[serde(default)]
    pub open_interest: Option<i64>,
}

/// Treat zero as "no quote", matching how the exchange reports empty books
fn quoted(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| !v.is_zero())
}

impl MarketSnapshot {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Default::default()
        }
    }

    /// Whether the exchange has published a settlement result
    pub fn is_settled(&self) -> bool {
        self.result.is_some()
    }

    /// Displayed yes price: the live ask, else the last trade
    pub fn yes_price(&self) -> Option<Decimal> {
        quoted(self.yes_ask).or(self.last_price)
    }

    /// Yes price used for ranking; unpriced markets sit at 50
    pub fn reference_yes_price(&self) -> Decimal {
        quoted(self.yes_ask)
            .or_else(|| quoted(self.last_price))
            .unwrap_or(dec!(50))
    }

    /// Last trade price, 50 when the market has never traded
    pub fn last_or_mid(&self) -> Decimal {
        quoted(self.last_price).unwrap_or(dec!(50))
    }

    /// Yes-side spread, zero unless both sides are quoted
    pub fn spread(&self) -> Decimal {
        match (quoted(self.yes_bid), quoted(self.yes_ask)) {
            (Some(bid), Some(ask)) => ask - bid,
            _ => Decimal::ZERO,
        }
    }

    /// Yes-side midpoint
    pub fn midpoint(&self) -> Option<Decimal> {
        match (self.yes_bid, self.yes_ask) {
            (Some(bid), Some(ask)) => Some(((bid + ask) / dec!(2)).round_dp(1)),
            _ => None,
        }
    }
}

/// Event metadata used for category context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    pub event_ticker: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub mutually_exclusive: Option<bool>,
    #[serde(default)]
    pub market_count: usize,
}

/// An open event together with its nested markets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventWithMarkets {
    pub info: EventInfo,
    pub markets: Vec<MarketSnapshot>,
}

/// A market considered for a signal, tagged with its event context
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMarket {
    pub market: MarketSnapshot,
    pub category: String,
    pub event_title: String,
}

impl CandidateMarket {
    /// Flatten open events into per-market candidates
    pub fn from_events(events: Vec<EventWithMarkets>) -> Vec<Self> {
        events
            .into_iter()
            .flat_map(|event| {
                let category = event.info.category.clone().unwrap_or_default();
                let event_title = event.info.title.clone().unwrap_or_default();
                event.markets.into_iter().map(move |market| CandidateMarket {
                    market,
                    category: category.clone(),
                    event_title: event_title.clone(),
                })
            })
            .collect()
    }
}

/// One resting price level (price in cents, contracts resting)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookLevel {
    pub price: Decimal,
    pub size: i64,
}

/// Resting bids on both sides of a market
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Orderbook {
    pub yes: Vec<OrderbookLevel>,
    pub no: Vec<OrderbookLevel>,
}

impl Orderbook {
    /// Contracts resting on the yes side
    pub fn yes_depth(&self) -> i64 {
        self.yes.iter().map(|level| level.size).sum()
    }

    /// Contracts resting on the no side
    pub fn no_depth(&self) -> i64 {
        self.no.iter().map(|level| level.size).sum()
    }
}

/// Outcome of a market lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    Found,
    NotFound,
    Error,
}

/// Live market data attached to an idea or a newly accepted position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub status: LookupStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<MarketSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midpoint: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_delta: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yes_depth: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_depth: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orderbook: Option<Orderbook>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<EventInfo>,
}

impl MarketData {
    pub fn not_found(ticker: Option<String>, reason: Option<&str>) -> Self {
        Self {
            status: LookupStatus::NotFound,
            ticker,
            reason: reason.map(str::to_string),
            market: None,
            spread: None,
            midpoint: None,
            price_delta: None,
            yes_depth: None,
            no_depth: None,
            orderbook: None,
            event: None,
        }
    }

    pub fn error(ticker: impl Into<String>) -> Self {
        Self {
            status: LookupStatus::Error,
            ..Self::not_found(Some(ticker.into()), None)
        }
    }

    pub fn is_found(&self) -> bool {
        self.status == LookupStatus::Found
    }
}
