//! Progress record types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::milestones::{initial_milestones, MilestoneField};

/// One milestone's state for a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub name: String,
    pub description: String,
    pub target: i64,
    pub current: i64,
    /// One-way: once true it stays true
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Per-user progress record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    pub user_id: String,
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub current_streak: i64,
    #[serde(default)]
    pub longest_streak: i64,
    #[serde(default)]
    pub last_check_in: Option<DateTime<Utc>>,
    #[serde(default)]
    pub check_in_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub total_check_ins: i64,
    #[serde(default)]
    pub bot_ready: bool,
    #[serde(default)]
    pub total_positions: i64,
    #[serde(default)]
    pub settled_positions: i64,
    /// Paper balance in cents, rebuilt from history
    #[serde(default = "default_paper_balance")]
    pub paper_balance: Decimal,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_paper_balance() -> Decimal {
    super::STARTING_PAPER_BALANCE
}

impl UserProgress {
    /// Fresh record with every milestone pending
    pub fn new(user_id: impl Into<String>, starting_balance: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            milestones: initial_milestones(),
            current_streak: 0,
            longest_streak: 0,
            last_check_in: None,
            check_in_dates: Vec::new(),
            total_check_ins: 0,
            bot_ready: false,
            total_positions: 0,
            settled_positions: 0,
            paper_balance: starting_balance,
            created_at: now,
            updated_at: Some(now),
        }
    }

    /// Current value of the statistic a milestone tracks
    pub fn field_value(&self, field: MilestoneField) -> i64 {
        match field {
            MilestoneField::TotalPositions => self.total_positions,
            MilestoneField::SettledPositions => self.settled_positions,
            MilestoneField::CurrentStreak => self.current_streak,
        }
    }

    pub fn milestone(&self, id: &str) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id == id)
    }
}
