//! User-defined model runners
//!
//! A custom model is configuration only: it names a built-in backing runner
//! and may override the extraction prompt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::runner::ModelRunner;
use super::types::{ModelRequest, Recommendation};
use crate::common::errors::{Result, TraderError};

fn default_backing_runner() -> String {
    "random".to_string()
}

/// Stored definition of a custom model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomModelConfig {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    /// Built-in runner this model delegates to
    #[serde(default = "default_backing_runner")]
    pub backing_runner: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// External store of custom model definitions
#[async_trait]
pub trait CustomModelStore: Send + Sync {
    async fn list_custom_models(&self) -> Result<Vec<CustomModelConfig>>;

    async fn save_custom_model(&self, config: CustomModelConfig) -> Result<()>;

    /// Returns false if no model had that name
    async fn delete_custom_model(&self, name: &str) -> Result<bool>;
}

/// Process-memory store
#[derive(Debug, Default)]
pub struct InMemoryCustomModelStore {
    configs: RwLock<Vec<CustomModelConfig>>,
}

impl InMemoryCustomModelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomModelStore for InMemoryCustomModelStore {
    async fn list_custom_models(&self) -> Result<Vec<CustomModelConfig>> {
        Ok(self.configs.read().await.clone())
    }

    async fn save_custom_model(&self, config: CustomModelConfig) -> Result<()> {
        if config.name.trim().is_empty() {
            return Err(TraderError::Validation("model name is required".to_string()));
        }
        let mut configs = self.configs.write().await;
        match configs.iter().position(|c| c.name == config.name) {
            Some(index) => configs[index] = config,
            None => configs.push(config),
        }
        Ok(())
    }

    async fn delete_custom_model(&self, name: &str) -> Result<bool> {
        let mut configs = self.configs.write().await;
        let before = configs.len();
        configs.retain(|c| c.name != name);
        Ok(configs.len() != before)
    }
}

/// Runs a custom model through its backing runner
pub struct CustomModelRunner {
    config: CustomModelConfig,
    backing: Arc<dyn ModelRunner>,
}

impl CustomModelRunner {
    pub fn new(config: CustomModelConfig, backing: Arc<dyn ModelRunner>) -> Self {
        Self { config, backing }
    }

    pub fn config(&self) -> &CustomModelConfig {
        &self.config
    }
}

#[async_trait]
impl ModelRunner for CustomModelRunner {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn display_name(&self) -> &str {
        &self.config.display_name
    }

    fn description(&self) -> &str {
        &self.config.description
    }

    async fn run(&self, request: &ModelRequest) -> Result<Recommendation> {
        let mut request = request.clone();
        if let Some(prompt) = &self.config.system_prompt {
            request.system_prompt = Some(prompt.clone());
        }
        self.backing.run(&request).await
    }
}
