//! User progress: paper balance, position counters, streaks and milestones
//!
//! Every counter on [`UserProgress`] is a cache. The tracker rebuilds them from
//! the full position history on each event instead of adjusting them in place.

pub mod milestones;
pub mod streak;
pub mod tracker;
pub mod types;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Starting paper balance: $100.00
pub const STARTING_PAPER_BALANCE: Decimal = dec!(10000);

pub use milestones::{MilestoneDef, MilestoneField, BOT_READY_MILESTONE, MILESTONES};
pub use tracker::{recount, PositionTally, ProgressTracker};
pub use types::{Milestone, UserProgress};
