//! Kalshi module - Public market-data client for the Kalshi trade API

pub mod client;
pub mod enrich;
pub mod messages;
pub mod rest;

pub use client::KalshiMarketSource;
pub use enrich::enrich_market;
pub use rest::KalshiRestClient;
