//! Shared building blocks: errors, types, collaborator traits and task helpers

pub mod cache;
pub mod channels;
pub mod errors;
pub mod tasks;
pub mod traits;
pub mod types;
