use serde::{Deserialize, Serialize};

use crate::common::types::Side;

/// Input handed to a model runner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Object-store key of the uploaded screenshot
    pub image_key: String,
    /// Free-form user context
    #[serde(default)]
    pub context: Option<String>,
    /// Replaces the runner's default extraction prompt
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl ModelRequest {
    pub fn new(image_key: impl Into<String>) -> Self {
        Self {
            image_key: image_key.into(),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Evidence behind a recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    pub stat: String,
    pub source: String,
    /// "favors_yes" or "favors_no"
    pub direction: String,
    /// "low", "medium" or "high"
    pub magnitude: String,
    pub detail: String,
}

/// Expected value at one probability point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvScenario {
    pub probability: f64,
    pub ev_per_contract: f64,
    pub kelly_fraction: f64,
}

/// A trade idea produced by a model runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub ticker: String,
    pub title: String,
    pub side: Side,
    pub confidence: f64,
    pub reasoning: String,
    pub factors: Vec<Factor>,
    pub ev_analysis: Vec<EvScenario>,
    pub bear_case: String,
    /// Fraction of bankroll, capped at 0.15
    pub recommended_position: f64,
    pub no_bet: bool,
    #[serde(default)]
    pub no_bet_reason: Option<String>,
}

/// Catalog entry for a runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub status: String,
    /// User-defined rather than built in
    pub custom: bool,
}
