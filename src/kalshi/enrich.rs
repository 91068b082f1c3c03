//! Market enrichment for ideas and newly accepted positions

use tracing::{error, instrument, warn};

use crate::common::traits::MarketDataSource;
use crate::common::types::{LookupStatus, MarketData, Orderbook};
use rust_decimal_macros::dec;

/// Placeholder ticker used when an idea could not name a market
const UNKNOWN_TICKER: &str = "UNKNOWN";

/// Fetch live pricing and event context for a ticker
///
/// Never fails: a failed market lookup is reported through
/// [`MarketData::status`]. Orderbook and event context are optional extras;
/// if either lookup fails the market is still reported as found without it.
#[instrument(skip(source))]
pub async fn enrich_market(source: &dyn MarketDataSource, ticker: &str) -> MarketData {
    let ticker = ticker.trim();
    if ticker.is_empty() || ticker.eq_ignore_ascii_case(UNKNOWN_TICKER) {
        return MarketData::not_found(None, Some("no_ticker"));
    }

    let market = match source.fetch_market(ticker).await {
        Ok(Some(market)) => market,
        Ok(None) => return MarketData::not_found(Some(ticker.to_string()), None),
        Err(e) => {
            error!(ticker, error = %e, "market enrichment failed");
            return MarketData::error(ticker);
        }
    };

    let (spread, midpoint) = match (market.yes_bid, market.yes_ask) {
        (Some(bid), Some(ask)) => (Some(ask - bid), Some(((bid + ask) / dec!(2)).round_dp(1))),
        _ => (None, None),
    };
    let price_delta = match (market.last_price, market.previous_price) {
        (Some(last), Some(previous)) => Some(last - previous),
        _ => None,
    };

    let orderbook = match source.fetch_orderbook(ticker).await {
        Ok(book) => book,
        Err(e) => {
            warn!(ticker, error = %e, "orderbook lookup failed");
            None
        }
    };

    let event = match market.event_ticker.as_deref() {
        Some(event_ticker) if !event_ticker.is_empty() => {
            match source.fetch_event(event_ticker).await {
                Ok(event) => event,
                Err(e) => {
                    warn!(ticker, event_ticker, error = %e, "event lookup failed");
                    None
                }
            }
        }
        _ => None,
    };

    MarketData {
        status: LookupStatus::Found,
        ticker: Some(ticker.to_string()),
        reason: None,
        market: Some(market),
        spread,
        midpoint,
        price_delta,
        yes_depth: orderbook.as_ref().map(Orderbook::yes_depth),
        no_depth: orderbook.as_ref().map(Orderbook::no_depth),
        orderbook,
        event,
    }
}
