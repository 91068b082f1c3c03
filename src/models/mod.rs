//! Model runners: screenshot-to-idea backends
//!
//! Vision and LLM backends live outside this crate; only the registry, the
//! custom-model indirection and a random stub are provided here.

mod custom;
mod random;
mod runner;
mod types;

pub use custom::{CustomModelConfig, CustomModelRunner, CustomModelStore, InMemoryCustomModelStore};
pub use random::RandomModel;
pub use runner::{ModelRegistry, ModelRunner};
pub use types::{EvScenario, Factor, ModelInfo, ModelRequest, Recommendation};
