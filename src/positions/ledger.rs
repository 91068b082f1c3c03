//! In-memory position ledger
//!
//! Reference implementation of [`PositionLedger`] used by the CLI and tests.
//! Positions keep insertion order, which is the order the monitor walks them.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::types::{PositionUpdate, TrackedPosition};
use crate::common::errors::Result;
use crate::common::traits::PositionLedger;
use crate::progress::types::UserProgress;

#[derive(Debug, Default)]
struct LedgerState {
    positions: Vec<TrackedPosition>,
    progress: HashMap<String, UserProgress>,
}

/// Ledger backed by process memory
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the ledger with existing positions
    pub fn with_positions(positions: Vec<TrackedPosition>) -> Self {
        Self {
            state: RwLock::new(LedgerState {
                positions,
                progress: HashMap::new(),
            }),
        }
    }

    /// Seed the ledger from a JSON array of positions
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let positions: Vec<TrackedPosition> = serde_json::from_str(&raw)?;
        info!(
            "Loaded {} positions from {}",
            positions.len(),
            path.as_ref().display()
        );
        Ok(Self::with_positions(positions))
    }

    /// Snapshot of every stored position
    pub async fn all_positions(&self) -> Vec<TrackedPosition> {
        self.state.read().await.positions.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.positions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.positions.is_empty()
    }
}

#[async_trait]
impl PositionLedger for InMemoryLedger {
    async fn get_position(&self, position_id: &str) -> Result<Option<TrackedPosition>> {
        let state = self.state.read().await;
        Ok(state
            .positions
            .iter()
            .find(|p| p.position_id == position_id)
            .cloned())
    }

    async fn list_positions_by_user(&self, user_id: &str) -> Result<Vec<TrackedPosition>> {
        let state = self.state.read().await;
        Ok(state
            .positions
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn put_position(&self, position: TrackedPosition) -> Result<()> {
        let mut state = self.state.write().await;
        match state
            .positions
            .iter()
            .position(|p| p.position_id == position.position_id)
        {
            Some(index) => state.positions[index] = position,
            None => state.positions.push(position),
        }
        Ok(())
    }

    async fn update_position(
        &self,
        position_id: &str,
        update: PositionUpdate,
    ) -> Result<Option<TrackedPosition>> {
        let mut state = self.state.write().await;
        let Some(position) = state
            .positions
            .iter_mut()
            .find(|p| p.position_id == position_id)
        else {
            debug!(position_id, "update for unknown position ignored");
            return Ok(None);
        };
        position.apply(update)?;
        Ok(Some(position.clone()))
    }

    async fn delete_position(&self, position_id: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.positions.len();
        state.positions.retain(|p| p.position_id != position_id);
        Ok(state.positions.len() != before)
    }

    async fn active_positions_by_user(&self) -> Result<Vec<(String, Vec<TrackedPosition>)>> {
        let state = self.state.read().await;
        let mut grouped: Vec<(String, Vec<TrackedPosition>)> = Vec::new();
        for position in state.positions.iter().filter(|p| p.is_active()) {
            match grouped.iter_mut().find(|(user, _)| *user == position.user_id) {
                Some((_, list)) => list.push(position.clone()),
                None => grouped.push((position.user_id.clone(), vec![position.clone()])),
            }
        }
        Ok(grouped)
    }

    async fn get_progress(&self, user_id: &str) -> Result<Option<UserProgress>> {
        Ok(self.state.read().await.progress.get(user_id).cloned())
    }

    async fn put_progress(&self, progress: UserProgress) -> Result<()> {
        let mut state = self.state.write().await;
        state.progress.insert(progress.user_id.clone(), progress);
        Ok(())
    }
}
