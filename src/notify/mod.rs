//! Digest notification transports

mod expo;

pub use expo::ExpoPushNotifier;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::common::errors::{Result, TraderError};
use crate::common::tasks::spawn_logged;
use crate::common::traits::Notifier;
use crate::config::types::{NotificationConfig, NotificationProvider};

/// Writes digests to the log instead of delivering them
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_digest(&self, user_id: &str, title: &str, body: &str) -> Result<()> {
        info!(user_id, title, "{}", body);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Build the configured transport
pub fn from_config(config: &NotificationConfig) -> Result<Arc<dyn Notifier>> {
    match config.provider {
        NotificationProvider::Log => Ok(Arc::new(LogNotifier)),
        NotificationProvider::Expo => Ok(Arc::new(expo_from_config(config)?)),
    }
}

/// Expo transport seeded with tokens from `push_tokens_file`, then
/// `push_tokens`; inline entries win
fn expo_from_config(config: &NotificationConfig) -> Result<ExpoPushNotifier> {
    let mut tokens = match &config.push_tokens_file {
        Some(path) => load_push_tokens(path)?,
        None => HashMap::new(),
    };
    tokens.extend(config.push_tokens.clone());
    if tokens.is_empty() {
        warn!("Expo notifications enabled without any push tokens");
    } else {
        info!("Loaded {} push tokens", tokens.len());
    }
    Ok(ExpoPushNotifier::with_tokens(
        config.expo_push_url.clone(),
        tokens,
    ))
}

/// Read a JSON object of user id to push token
fn load_push_tokens(path: &str) -> Result<HashMap<String, String>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        TraderError::Configuration(format!("cannot read push tokens from {}: {}", path, e))
    })?;
    Ok(serde_json::from_str(&raw)?)
}

/// Send a digest in the background
///
/// Delivery failures are logged by the task and never reach the caller.
pub fn dispatch_digest(
    notifier: Arc<dyn Notifier>,
    user_id: String,
    title: String,
    body: String,
) -> JoinHandle<()> {
    let label = format!("{} digest for {}", notifier.name(), user_id);
    spawn_logged(label, async move {
        notifier.send_digest(&user_id, &title, &body).await
    })
}
