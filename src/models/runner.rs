use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::custom::{CustomModelConfig, CustomModelRunner, CustomModelStore};
use super::random::RandomModel;
use super::types::{ModelInfo, ModelRequest, Recommendation};
use crate::common::cache::TtlCache;
use crate::common::errors::{Result, TraderError};

/// Turns an uploaded screenshot into a trade idea
#[async_trait]
pub trait ModelRunner: Send + Sync {
    /// Registry key
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    fn description(&self) -> &str;

    fn status(&self) -> &str {
        "available"
    }

    async fn run(&self, request: &ModelRequest) -> Result<Recommendation>;
}

const CUSTOM_CACHE_KEY: &str = "custom";
const DEFAULT_CUSTOM_TTL: Duration = Duration::from_secs(60);

/// Runners available to the process
///
/// Built-ins are registered explicitly at start-up. Custom models are read
/// from a [`CustomModelStore`] through a TTL cache that starts empty.
pub struct ModelRegistry {
    builtin: Vec<Arc<dyn ModelRunner>>,
    custom_store: Option<Arc<dyn CustomModelStore>>,
    custom_cache: TtlCache<&'static str, Vec<CustomModelConfig>>,
}

impl ModelRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            builtin: Vec::new(),
            custom_store: None,
            custom_cache: TtlCache::new(DEFAULT_CUSTOM_TTL),
        }
    }

    /// Registry holding the stub runner
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RandomModel));
        registry
    }

    /// Attach a store for user-defined models
    pub fn with_custom_store(mut self, store: Arc<dyn CustomModelStore>, ttl: Duration) -> Self {
        self.custom_store = Some(store);
        self.custom_cache = TtlCache::new(ttl);
        self
    }

    /// Add or replace a built-in runner
    pub fn register(&mut self, runner: Arc<dyn ModelRunner>) {
        match self.builtin.iter().position(|r| r.name() == runner.name()) {
            Some(index) => self.builtin[index] = runner,
            None => self.builtin.push(runner),
        }
    }

    fn builtin(&self, name: &str) -> Option<Arc<dyn ModelRunner>> {
        self.builtin.iter().find(|r| r.name() == name).cloned()
    }

    /// Custom definitions, from cache when fresh
    async fn custom_configs(&self) -> Result<Vec<CustomModelConfig>> {
        let Some(store) = &self.custom_store else {
            return Ok(Vec::new());
        };
        if let Some(cached) = self.custom_cache.get(&CUSTOM_CACHE_KEY).await {
            return Ok(cached);
        }
        let configs = store.list_custom_models().await?;
        debug!(count = configs.len(), "loaded custom models");
        self.custom_cache
            .insert(CUSTOM_CACHE_KEY, configs.clone())
            .await;
        Ok(configs)
    }

    /// Forget cached custom definitions
    pub async fn invalidate_custom(&self) {
        self.custom_cache.invalidate(&CUSTOM_CACHE_KEY).await;
    }

    /// Resolve a runner by name; built-ins take precedence
    #[instrument(skip(self))]
    pub async fn get(&self, name: &str) -> Result<Arc<dyn ModelRunner>> {
        if let Some(runner) = self.builtin(name) {
            return Ok(runner);
        }

        let config = self
            .custom_configs()
            .await?
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| TraderError::ModelNotFound(name.to_string()))?;

        let backing = self.builtin(&config.backing_runner).ok_or_else(|| {
            warn!(model = name, backing = %config.backing_runner, "unknown backing runner");
            TraderError::ModelNotFound(config.backing_runner.clone())
        })?;
        Ok(Arc::new(CustomModelRunner::new(config, backing)))
    }

    /// Built-ins first, then custom models
    pub async fn list(&self) -> Result<Vec<ModelInfo>> {
        let mut models: Vec<ModelInfo> = self
            .builtin
            .iter()
            .map(|r| ModelInfo {
                name: r.name().to_string(),
                display_name: r.display_name().to_string(),
                description: r.description().to_string(),
                status: r.status().to_string(),
                custom: false,
            })
            .collect();

        models.extend(self.custom_configs().await?.into_iter().map(|c| ModelInfo {
            name: c.name,
            display_name: c.display_name,
            description: c.description,
            status: "available".to_string(),
            custom: true,
        }));
        Ok(models)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
