//! Expo push notifications

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::common::errors::{Result, TraderError};
use crate::common::traits::Notifier;

/// Payload `data.type` for position digests
const POSITION_UPDATE_KIND: &str = "position_update";

#[derive(Debug, Serialize)]
struct PushMessage<'a> {
    to: &'a str,
    title: &'a str,
    body: &'a str,
    sound: &'static str,
    data: PushData<'a>,
}

#[derive(Debug, Serialize)]
struct PushData<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    user_id: &'a str,
}

/// Delivers digests through the Expo push service
///
/// Push tokens are registered per user; users without one are skipped.
pub struct ExpoPushNotifier {
    client: Client,
    push_url: String,
    tokens: RwLock<HashMap<String, String>>,
}

impl ExpoPushNotifier {
    pub fn new(push_url: impl Into<String>) -> Self {
        Self::with_tokens(push_url, HashMap::new())
    }

    /// Create a notifier with known user tokens
    pub fn with_tokens(push_url: impl Into<String>, tokens: HashMap<String, String>) -> Self {
        Self {
            client: Client::new(),
            push_url: push_url.into(),
            tokens: RwLock::new(tokens),
        }
    }

    pub async fn token_count(&self) -> usize {
        self.tokens.read().await.len()
    }

    /// Register or replace a user's push token
    pub async fn register_token(&self, user_id: impl Into<String>, token: impl Into<String>) {
        self.tokens.write().await.insert(user_id.into(), token.into());
    }

    pub async fn token_for(&self, user_id: &str) -> Option<String> {
        self.tokens.read().await.get(user_id).cloned()
    }
}

#[async_trait]
impl Notifier for ExpoPushNotifier {
    #[instrument(skip(self, body))]
    async fn send_digest(&self, user_id: &str, title: &str, body: &str) -> Result<()> {
        let Some(token) = self.token_for(user_id).await else {
            debug!(user_id, "no push token, digest skipped");
            return Ok(());
        };

        let message = PushMessage {
            to: &token,
            title,
            body,
            sound: "default",
            data: PushData {
                kind: POSITION_UPDATE_KIND,
                user_id,
            },
        };

        let response = self
            .client
            .post(&self.push_url)
            .json(&message)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TraderError::Notification(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        debug!(user_id, "push notification sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "expo"
    }
}
