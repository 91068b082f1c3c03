//! Configuration types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Kalshi public market-data configuration
    #[serde(default)]
    pub kalshi: KalshiConfig,
    /// Position monitor scheduling
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Digest notification delivery
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

/// Kalshi platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KalshiConfig {
    /// Base URL for the public REST API
    #[serde(default = "default_kalshi_rest_url")]
    pub rest_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// How long a market-by-ticker lookup may be served from cache
    #[serde(default = "default_market_cache_ttl")]
    pub market_cache_ttl_seconds: u64,
    /// How long the open-events list may be served from cache
    #[serde(default = "default_open_markets_cache_ttl")]
    pub open_markets_cache_ttl_seconds: u64,
    /// Number of open events pulled when generating signals
    #[serde(default = "default_open_events_limit")]
    pub open_events_limit: u32,
}

impl Default for KalshiConfig {
    fn default() -> Self {
        Self {
            rest_url: default_kalshi_rest_url(),
            request_timeout_seconds: default_request_timeout(),
            market_cache_ttl_seconds: default_market_cache_ttl(),
            open_markets_cache_ttl_seconds: default_open_markets_cache_ttl(),
            open_events_limit: default_open_events_limit(),
        }
    }
}

impl KalshiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn market_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.market_cache_ttl_seconds)
    }

    pub fn open_markets_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.open_markets_cache_ttl_seconds)
    }
}

fn default_kalshi_rest_url() -> String {
    "https://api.elections.kalshi.com/trade-api/v2".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_market_cache_ttl() -> u64 {
    30
}

fn default_open_markets_cache_ttl() -> u64 {
    300
}

fn default_open_events_limit() -> u32 {
    200
}

/// Position monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between reconciliation cycles
    #[serde(default = "default_monitor_interval")]
    pub interval_seconds: u64,
    /// Pause between per-position market fetches, in milliseconds
    #[serde(default = "default_position_delay")]
    pub position_delay_ms: u64,
    /// Smallest price change (cents) reported as a move
    #[serde(default = "default_price_move_threshold")]
    pub price_move_threshold_cents: Decimal,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_monitor_interval(),
            position_delay_ms: default_position_delay(),
            price_move_threshold_cents: default_price_move_threshold(),
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn position_delay(&self) -> Duration {
        Duration::from_millis(self.position_delay_ms)
    }
}

fn default_monitor_interval() -> u64 {
    60 * 60
}

fn default_position_delay() -> u64 {
    500
}

fn default_price_move_threshold() -> Decimal {
    dec!(1)
}

/// Notification transport selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationProvider {
    /// Write digests to the log only
    Log,
    /// Expo push service
    Expo,
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_provider")]
    pub provider: NotificationProvider,
    /// Expo push endpoint
    #[serde(default = "default_expo_push_url")]
    pub expo_push_url: String,
    /// Title used for position digests
    #[serde(default = "default_digest_title")]
    pub digest_title: String,
    /// Expo push token per user id
    #[serde(default)]
    pub push_tokens: HashMap<String, String>,
    /// JSON object of user id to push token, merged under `push_tokens`
    #[serde(default)]
    pub push_tokens_file: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            expo_push_url: default_expo_push_url(),
            digest_title: default_digest_title(),
            push_tokens: HashMap::new(),
            push_tokens_file: None,
        }
    }
}

fn default_provider() -> NotificationProvider {
    NotificationProvider::Log
}

fn default_expo_push_url() -> String {
    "https://exp.host/--/api/v2/push/send".to_string()
}

fn default_digest_title() -> String {
    "Position Update".to_string()
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Paper balance every user starts with, in cents
    #[serde(default = "default_starting_balance")]
    pub starting_paper_balance_cents: Decimal,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            starting_paper_balance_cents: default_starting_balance(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_starting_balance() -> Decimal {
    crate::progress::STARTING_PAPER_BALANCE
}
