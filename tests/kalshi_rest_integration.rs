//! Integration tests for the Kalshi public REST client
//!
//! Runs against a local wiremock server standing in for the trade API.

use paper_trader::common::errors::TraderError;
use paper_trader::common::traits::MarketDataSource;
use paper_trader::common::types::LookupStatus;
use paper_trader::kalshi::{enrich_market, KalshiMarketSource, KalshiRestClient};
use paper_trader::Side;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn market_body(ticker: &str, result: &str) -> serde_json::Value {
    let status = if result.is_empty() { "active" } else { "settled" };
    json!({
        "market": {
            "ticker": ticker,
            "event_ticker": "KXFED-26MAR",
            "title": "Fed cuts in March?",
            "status": status,
            "result": result,
            "yes_bid": 41,
            "yes_ask": 44,
            "no_bid": 56,
            "no_ask": 59,
            "last_price": 43,
            "previous_price": 40,
            "volume": 120000,
            "volume_24h": 3400,
            "open_interest": 8000
        }
    })
}

fn create_source(server: &MockServer) -> KalshiMarketSource {
    let rest = KalshiRestClient::with_timeout(&server.uri(), Duration::from_secs(5))
        .expect("Failed to create REST client");
    KalshiMarketSource::new(rest, Duration::from_secs(60), Duration::from_secs(60))
}

// ============================================================================
// Market Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_market_parses_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/markets/KXFED-26MAR-T4.25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(market_body("KXFED-26MAR-T4.25", "")))
        .mount(&server)
        .await;

    let client = KalshiRestClient::new(&format!("{}/", server.uri())).unwrap();
    let market = client
        .fetch_market("KXFED-26MAR-T4.25")
        .await
        .expect("request should succeed")
        .expect("market should exist");

    assert_eq!(market.ticker, "KXFED-26MAR-T4.25");
    assert_eq!(market.yes_ask, Some(dec!(44)));
    assert_eq!(market.previous_price, Some(dec!(40)));
    assert_eq!(market.volume_24h, Some(3400));
    assert_eq!(market.result, None);
    assert!(!market.is_settled());
}

#[tokio::test]
async fn test_settled_result_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/markets/KXDONE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(market_body("KXDONE", "no")))
        .mount(&server)
        .await;

    let source = create_source(&server);
    let market = source.fetch_market_fresh("KXDONE").await.unwrap().unwrap();
    assert_eq!(market.result, Some(Side::No));
}

#[tokio::test]
async fn test_unknown_ticker_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/markets/KXNOPE"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
        .mount(&server)
        .await;

    let source = create_source(&server);
    assert_eq!(source.fetch_market("KXNOPE").await.unwrap(), None);
}

#[tokio::test]
async fn test_server_error_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/markets/KXBROKEN"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let source = create_source(&server);
    let result = source.fetch_market("KXBROKEN").await;
    assert!(matches!(result, Err(TraderError::InvalidResponse(_))), "got {:?}", result);
}

#[tokio::test]
async fn test_cached_lookup_versus_fresh_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/markets/KXCACHE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(market_body("KXCACHE", "")))
        .expect(3)
        .mount(&server)
        .await;

    let source = create_source(&server);

    // One request, second read served from cache
    source.fetch_market("KXCACHE").await.unwrap();
    source.fetch_market("KXCACHE").await.unwrap();

    // Fresh lookups always reach the API
    source.fetch_market_fresh("KXCACHE").await.unwrap();

    // Invalidation forces the next cached read to refetch
    source.invalidate_market("KXCACHE").await;
    source.fetch_market("KXCACHE").await.unwrap();

    server.verify().await;
}

// ============================================================================
// Event Tests
// ============================================================================

#[tokio::test]
async fn test_open_events_are_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .and(query_param("status", "open"))
        .and(query_param("limit", "200"))
        .and(query_param("with_nested_markets", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [{
                "event_ticker": "KXNBA-26FEB21",
                "title": "Rockets at Knicks",
                "category": "Sports",
                "mutually_exclusive": true,
                "markets": [
                    {"ticker": "KXNBA-26FEB21-HOU", "yes_ask": 38, "last_price": 37},
                    {"ticker": "KXNBA-26FEB21-NYK", "yes_ask": 63, "last_price": 62}
                ]
            }],
            "cursor": ""
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = create_source(&server);
    let events = source.open_events(200).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].info.category.as_deref(), Some("Sports"));
    assert_eq!(events[0].info.market_count, 2);
    assert_eq!(events[0].markets[1].ticker, "KXNBA-26FEB21-NYK");

    let again = source.open_events(200).await.unwrap();
    assert_eq!(again, events);
    server.verify().await;
}

#[tokio::test]
async fn test_enrichment_against_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/markets/KXFED-26MAR-T4.25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(market_body("KXFED-26MAR-T4.25", "")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/events/KXFED-26MAR"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "event": {
                "event_ticker": "KXFED-26MAR",
                "title": "Fed decision in March",
                "category": "Economics"
            },
            "markets": [{"ticker": "KXFED-26MAR-T4.25"}]
        })))
        .mount(&server)
        .await;

    let source = create_source(&server);
    let data = enrich_market(&source, "KXFED-26MAR-T4.25").await;

    assert_eq!(data.status, LookupStatus::Found);
    assert_eq!(data.spread, Some(dec!(3)));
    assert_eq!(data.midpoint, Some(dec!(42.5)));
    assert_eq!(data.price_delta, Some(dec!(3)));
    let event = data.event.expect("event context");
    assert_eq!(event.category.as_deref(), Some("Economics"));
    assert_eq!(event.market_count, 1);
}

#[tokio::test]
async fn test_enrichment_of_unreachable_api_is_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = create_source(&server);
    let data = enrich_market(&source, "KXANY").await;
    assert_eq!(data.status, LookupStatus::Error);
    assert_eq!(data.ticker.as_deref(), Some("KXANY"));
}

// ============================================================================
// Orderbook Tests
// ============================================================================

#[tokio::test]
async fn test_enrichment_reports_orderbook_depth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/markets/KXFED-26MAR-T4.25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(market_body("KXFED-26MAR-T4.25", "")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/markets/KXFED-26MAR-T4.25/orderbook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "orderbook": {
                "yes": [[40, 300], [41, 120]],
                "no": [[56, 75]]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = create_source(&server);
    let data = enrich_market(&source, "KXFED-26MAR-T4.25").await;

    assert_eq!(data.status, LookupStatus::Found);
    assert_eq!(data.yes_depth, Some(420));
    assert_eq!(data.no_depth, Some(75));
    let book = data.orderbook.expect("orderbook levels");
    assert_eq!(book.yes[0].price, dec!(40));
    assert_eq!(book.no[0].size, 75);
    server.verify().await;
}

#[tokio::test]
async fn test_failed_event_lookup_keeps_market_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/markets/KXFED-26MAR-T4.25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(market_body("KXFED-26MAR-T4.25", "")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/markets/KXFED-26MAR-T4.25/orderbook"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/events/KXFED-26MAR"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream error"))
        .mount(&server)
        .await;

    let source = create_source(&server);
    let data = enrich_market(&source, "KXFED-26MAR-T4.25").await;

    assert_eq!(data.status, LookupStatus::Found);
    assert_eq!(data.spread, Some(dec!(3)));
    assert_eq!(data.event, None);
    assert_eq!(data.yes_depth, None);
}

#[tokio::test]
async fn test_orderbook_of_unknown_market_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/markets/KXNOPE/orderbook"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = KalshiRestClient::new(&server.uri()).unwrap();
    assert_eq!(client.fetch_orderbook("KXNOPE").await.unwrap(), None);
}
