//! Fixed milestone table and evaluation
//!
//! Adding an entry needs no migration step of its own: [`backfill`] appends
//! missing definitions to stored records on load.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::types::{Milestone, UserProgress};

/// Milestone whose completion marks the bot as ready
pub const BOT_READY_MILESTONE: &str = "m6";

/// Statistic a milestone is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneField {
    TotalPositions,
    SettledPositions,
    CurrentStreak,
}

/// Static milestone definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestoneDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub target: i64,
    pub field: MilestoneField,
}

pub const MILESTONES: [MilestoneDef; 6] = [
    MilestoneDef {
        id: "m1",
        name: "First Steps",
        description: "Track your first position",
        target: 1,
        field: MilestoneField::TotalPositions,
    },
    MilestoneDef {
        id: "m2",
        name: "Getting Serious",
        description: "Track 5 positions",
        target: 5,
        field: MilestoneField::TotalPositions,
    },
    MilestoneDef {
        id: "m3",
        name: "Skin in the Game",
        description: "First settled position",
        target: 1,
        field: MilestoneField::SettledPositions,
    },
    MilestoneDef {
        id: "m4",
        name: "Consistency",
        description: "7-day check-in streak",
        target: 7,
        field: MilestoneField::CurrentStreak,
    },
    MilestoneDef {
        id: "m5",
        name: "Data Rich",
        description: "25 positions with outcomes",
        target: 25,
        field: MilestoneField::SettledPositions,
    },
    MilestoneDef {
        id: BOT_READY_MILESTONE,
        name: "Bot Ready",
        description: "Your bot is ready to trade",
        target: 25,
        field: MilestoneField::SettledPositions,
    },
];

/// Look up a definition by id
pub fn definition(id: &str) -> Option<&'static MilestoneDef> {
    MILESTONES.iter().find(|m| m.id == id)
}

impl From<&MilestoneDef> for Milestone {
    fn from(def: &MilestoneDef) -> Self {
        Self {
            id: def.id.to_string(),
            name: def.name.to_string(),
            description: def.description.to_string(),
            target: def.target,
            current: 0,
            completed: false,
            completed_at: None,
        }
    }
}

/// Pending milestones for a new user
pub fn initial_milestones() -> Vec<Milestone> {
    MILESTONES.iter().map(Milestone::from).collect()
}

/// Append any definitions missing from a stored list; returns how many were added
pub fn backfill(milestones: &mut Vec<Milestone>) -> usize {
    let missing: Vec<Milestone> = MILESTONES
        .iter()
        .filter(|def| !milestones.iter().any(|m| m.id == def.id))
        .map(Milestone::from)
        .collect();
    let added = missing.len();
    milestones.extend(missing);
    added
}

/// Refresh current values and flip newly reached milestones
///
/// Completion is one-way: a completed milestone is never reopened, even if
/// its statistic later drops (a broken streak, for instance).
pub fn evaluate(progress: &mut UserProgress, now: DateTime<Utc>) {
    let values: Vec<Option<i64>> = progress
        .milestones
        .iter()
        .map(|m| definition(&m.id).map(|def| progress.field_value(def.field)))
        .collect();

    for (milestone, value) in progress.milestones.iter_mut().zip(values) {
        let Some(current) = value else {
            warn!(milestone = %milestone.id, user_id = %progress.user_id, "unknown milestone skipped");
            continue;
        };
        milestone.current = current;
        if !milestone.completed && current >= milestone.target {
            milestone.completed = true;
            milestone.completed_at = Some(now);
        }
    }

    progress.bot_ready = progress
        .milestone(BOT_READY_MILESTONE)
        .map(|m| m.completed)
        .unwrap_or(false);
    progress.updated_at = Some(now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::STARTING_PAPER_BALANCE;
    use chrono::Duration;

    fn progress() -> UserProgress {
        UserProgress::new("user-1", STARTING_PAPER_BALANCE, Utc::now())
    }

    #[test]
    fn test_first_position_completes_m1_only() {
        let mut p = progress();
        p.total_positions = 1;
        evaluate(&mut p, Utc::now());

        assert!(p.milestone("m1").unwrap().completed);
        assert!(!p.milestone("m2").unwrap().completed);
        assert_eq!(p.milestone("m2").unwrap().current, 1);
        assert!(!p.bot_ready);
    }

    #[test]
    fn test_completion_is_monotonic() {
        let mut p = progress();
        p.current_streak = 7;
        let first = Utc::now();
        evaluate(&mut p, first);
        assert!(p.milestone("m4").unwrap().completed);

        p.current_streak = 1;
        evaluate(&mut p, first + Duration::days(3));
        let m4 = p.milestone("m4").unwrap();
        assert!(m4.completed);
        assert_eq!(m4.current, 1);
        assert_eq!(m4.completed_at, Some(first));
    }

    #[test]
    fn test_bot_ready_mirrors_terminal_milestone() {
        let mut p = progress();
        p.settled_positions = 25;
        evaluate(&mut p, Utc::now());
        assert!(p.milestone("m5").unwrap().completed);
        assert!(p.bot_ready);
    }

    #[test]
    fn test_backfill_adds_missing_definitions() {
        let mut milestones = initial_milestones();
        milestones.retain(|m| m.id != "m4" && m.id != "m6");
        assert_eq!(backfill(&mut milestones), 2);
        assert_eq!(milestones.len(), MILESTONES.len());
        assert_eq!(backfill(&mut milestones), 0);
    }

    #[test]
    fn test_unknown_milestone_is_skipped() {
        let mut p = progress();
        p.milestones.push(Milestone {
            id: "legacy".to_string(),
            name: "Old".to_string(),
            description: String::new(),
            target: 1,
            current: 0,
            completed: false,
            completed_at: None,
        });
        p.total_positions = 3;
        evaluate(&mut p, Utc::now());

        assert!(!p.milestone("legacy").unwrap().completed);
        assert!(p.milestone("m1").unwrap().completed);
    }
}
