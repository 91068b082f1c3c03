//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::{AppConfig, NotificationProvider};
use crate::common::errors::{Result, TraderError};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. `KALSHI_REST_URL`
/// 2. Environment variables (prefixed with APP__, e.g. APP__MONITOR__INTERVAL_SECONDS)
/// 3. Configuration file (TOML format)
/// 4. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| TraderError::Configuration(e.to_string()))?;

    let mut app: AppConfig = config
        .try_deserialize()
        .map_err(|e| TraderError::Configuration(e.to_string()))?;

    if let Ok(url) = std::env::var("KALSHI_REST_URL") {
        app.kalshi.rest_url = url;
    }

    validate(&app)?;
    Ok(app)
}

/// Load configuration from environment variables only
pub fn load_from_env() -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let mut config = AppConfig::default();

    if let Ok(url) = std::env::var("KALSHI_REST_URL") {
        config.kalshi.rest_url = url;
    }
    if let Some(secs) = env_parse::<u64>("MONITOR_INTERVAL_SECONDS")? {
        config.monitor.interval_seconds = secs;
    }
    if let Some(ms) = env_parse::<u64>("MONITOR_POSITION_DELAY_MS")? {
        config.monitor.position_delay_ms = ms;
    }
    if let Ok(provider) = std::env::var("NOTIFICATION_PROVIDER") {
        config.notifications.provider = match provider.to_lowercase().as_str() {
            "expo" => NotificationProvider::Expo,
            "log" => NotificationProvider::Log,
            other => {
                return Err(TraderError::Configuration(format!(
                    "unknown notification provider: {}",
                    other
                )))
            }
        };
    }
    if let Ok(path) = std::env::var("PUSH_TOKENS_FILE") {
        config.notifications.push_tokens_file = Some(path);
    }
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        config.settings.log_level = level;
    }

    validate(&config)?;
    Ok(config)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| TraderError::Configuration(format!("{} is not a valid number", key))),
        Err(_) => Ok(None),
    }
}

fn validate(config: &AppConfig) -> Result<()> {
    if config.kalshi.rest_url.trim().is_empty() {
        return Err(TraderError::Configuration("kalshi.rest_url is empty".to_string()));
    }
    if config.monitor.interval_seconds == 0 {
        return Err(TraderError::Configuration(
            "monitor.interval_seconds must be positive".to_string(),
        ));
    }
    if config.settings.starting_paper_balance_cents.is_sign_negative() {
        return Err(TraderError::Configuration(
            "settings.starting_paper_balance_cents must not be negative".to_string(),
        ));
    }
    Ok(())
}
