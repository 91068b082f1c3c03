//! Progress recounter and check-in handling

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::milestones::{self, backfill};
use super::streak;
use super::types::UserProgress;
use crate::common::errors::Result;
use crate::common::traits::PositionLedger;
use crate::common::types::CONTRACT_PAYOUT_CENTS;
use crate::positions::types::{PositionStatus, TrackedPosition};

/// Aggregates derived from a user's full position history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionTally {
    pub total_positions: i64,
    pub settled_positions: i64,
    pub paper_balance: Decimal,
}

/// Rebuild counters and paper balance from scratch
///
/// Every position pays its entry price; a win pays back 100, a manual close
/// refunds the entry, a loss pays nothing. Order of positions does not matter.
pub fn recount(positions: &[TrackedPosition], starting_balance: Decimal) -> PositionTally {
    let mut balance = starting_balance;
    let mut settled = 0;

    for position in positions {
        balance -= position.entry_price;
        match position.status {
            PositionStatus::SettledWin => balance += CONTRACT_PAYOUT_CENTS,
            PositionStatus::Closed => balance += position.entry_price,
            PositionStatus::SettledLoss | PositionStatus::Active => {}
        }
        if position.status.is_settled() {
            settled += 1;
        }
    }

    PositionTally {
        total_positions: positions.len() as i64,
        settled_positions: settled,
        paper_balance: balance.round_dp(2),
    }
}

/// Keeps [`UserProgress`] records in step with the ledger
pub struct ProgressTracker {
    ledger: Arc<dyn PositionLedger>,
    starting_balance: Decimal,
}

impl ProgressTracker {
    pub fn new(ledger: Arc<dyn PositionLedger>, starting_balance: Decimal) -> Self {
        Self {
            ledger,
            starting_balance,
        }
    }

    pub fn starting_balance(&self) -> Decimal {
        self.starting_balance
    }

    /// Load a user's progress, creating and storing it on first access
    #[instrument(skip(self))]
    pub async fn get_or_create(&self, user_id: &str) -> Result<UserProgress> {
        match self.ledger.get_progress(user_id).await? {
            Some(mut progress) => {
                let added = backfill(&mut progress.milestones);
                if added > 0 {
                    info!(user_id, added, "backfilled milestone definitions");
                    milestones::evaluate(&mut progress, Utc::now());
                    self.ledger.put_progress(progress.clone()).await?;
                }
                Ok(progress)
            }
            None => {
                let progress = UserProgress::new(user_id, self.starting_balance, Utc::now());
                self.ledger.put_progress(progress.clone()).await?;
                debug!(user_id, "created progress record");
                Ok(progress)
            }
        }
    }

    /// Current paper balance for sizing
    pub async fn paper_balance(&self, user_id: &str) -> Result<Decimal> {
        Ok(self.get_or_create(user_id).await?.paper_balance)
    }

    /// Recount after a new position was tracked
    pub async fn record_position_tracked(&self, user_id: &str) -> Result<UserProgress> {
        self.refresh(user_id).await
    }

    /// Recount after a position settled
    pub async fn record_settlement(&self, user_id: &str) -> Result<UserProgress> {
        self.refresh(user_id).await
    }

    /// Recount after a manual close
    pub async fn record_close(&self, user_id: &str) -> Result<UserProgress> {
        self.refresh(user_id).await
    }

    /// Full recount from the ledger followed by milestone evaluation
    #[instrument(skip(self))]
    pub async fn refresh(&self, user_id: &str) -> Result<UserProgress> {
        let mut progress = self.get_or_create(user_id).await?;
        let positions = self.ledger.list_positions_by_user(user_id).await?;
        let tally = recount(&positions, self.starting_balance);

        progress.total_positions = tally.total_positions;
        progress.settled_positions = tally.settled_positions;
        progress.paper_balance = tally.paper_balance;
        milestones::evaluate(&mut progress, Utc::now());

        self.ledger.put_progress(progress.clone()).await?;
        debug!(
            user_id,
            total = tally.total_positions,
            settled = tally.settled_positions,
            balance = %tally.paper_balance,
            "progress recounted"
        );
        Ok(progress)
    }

    /// Record today's check-in (UTC)
    pub async fn record_check_in(&self, user_id: &str) -> Result<UserProgress> {
        let now = Utc::now();
        self.record_check_in_on(user_id, now.date_naive(), now).await
    }

    /// Record a check-in for a specific day
    ///
    /// A second check-in on the same day returns the stored record unchanged.
    pub async fn record_check_in_on(
        &self,
        user_id: &str,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<UserProgress> {
        let mut progress = self.get_or_create(user_id).await?;
        if !streak::record(&mut progress.check_in_dates, today) {
            debug!(user_id, %today, "already checked in");
            return Ok(progress);
        }

        progress.last_check_in = Some(now);
        progress.total_check_ins = progress.check_in_dates.len() as i64;
        progress.current_streak = streak::current_streak(&progress.check_in_dates);
        progress.longest_streak = progress.longest_streak.max(progress.current_streak);
        milestones::evaluate(&mut progress, now);

        self.ledger.put_progress(progress.clone()).await?;
        info!(user_id, streak = progress.current_streak, "check-in recorded");
        Ok(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::Side;
    use crate::positions::ledger::InMemoryLedger;
    use crate::positions::types::NewPosition;
    use crate::progress::STARTING_PAPER_BALANCE;
    use rust_decimal_macros::dec;

    fn position(id: &str, entry: Decimal, status: PositionStatus) -> TrackedPosition {
        let mut p = TrackedPosition::open(
            id,
            NewPosition::new("user-1", "KXTEST", Side::Yes, entry),
            Utc::now(),
        );
        p.status = status;
        p
    }

    fn history() -> Vec<TrackedPosition> {
        vec![
            position("a", dec!(30), PositionStatus::SettledWin),
            position("b", dec!(40), PositionStatus::SettledLoss),
            position("c", dec!(25), PositionStatus::Closed),
            position("d", dec!(60), PositionStatus::Active),
        ]
    }

    #[test]
    fn test_recount_replays_history() {
        let tally = recount(&history(), STARTING_PAPER_BALANCE);
        // 10000 - 30 + 100 - 40 - 25 + 25 - 60
        assert_eq!(tally.paper_balance, dec!(9970));
        assert_eq!(tally.total_positions, 4);
        assert_eq!(tally.settled_positions, 2);
    }

    #[test]
    fn test_recount_is_order_independent() {
        let mut reversed = history();
        reversed.reverse();
        assert_eq!(
            recount(&history(), STARTING_PAPER_BALANCE),
            recount(&reversed, STARTING_PAPER_BALANCE)
        );
        assert_eq!(
            recount(&history(), STARTING_PAPER_BALANCE),
            recount(&history(), STARTING_PAPER_BALANCE)
        );
    }

    #[test]
    fn test_empty_history_is_starting_balance() {
        let tally = recount(&[], STARTING_PAPER_BALANCE);
        assert_eq!(tally.paper_balance, STARTING_PAPER_BALANCE);
        assert_eq!(tally.total_positions, 0);
    }

    #[tokio::test]
    async fn test_refresh_persists_counters() {
        let ledger = Arc::new(InMemoryLedger::with_positions(history()));
        let tracker = ProgressTracker::new(ledger.clone(), STARTING_PAPER_BALANCE);

        let progress = tracker.record_settlement("user-1").await.unwrap();
        assert_eq!(progress.paper_balance, dec!(9970));
        assert!(progress.milestone("m1").unwrap().completed);
        assert!(progress.milestone("m3").unwrap().completed);

        let stored = ledger.get_progress("user-1").await.unwrap().unwrap();
        assert_eq!(stored, progress);
    }

    #[tokio::test]
    async fn test_streak_through_check_ins() {
        let ledger = Arc::new(InMemoryLedger::new());
        let tracker = ProgressTracker::new(ledger, STARTING_PAPER_BALANCE);
        let now = Utc::now();
        let day = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();

        for d in ["2024-01-01", "2024-01-02", "2024-01-03"] {
            tracker.record_check_in_on("user-1", day(d), now).await.unwrap();
        }
        let progress = tracker
            .record_check_in_on("user-1", day("2024-01-03"), now)
            .await
            .unwrap();
        assert_eq!(progress.current_streak, 3);
        assert_eq!(progress.total_check_ins, 3);

        let progress = tracker
            .record_check_in_on("user-1", day("2024-01-05"), now)
            .await
            .unwrap();
        assert_eq!(progress.current_streak, 1);
        assert_eq!(progress.longest_streak, 3);
    }

    #[tokio::test]
    async fn test_lazy_creation_uses_starting_balance() {
        let ledger = Arc::new(InMemoryLedger::new());
        let tracker = ProgressTracker::new(ledger.clone(), dec!(5000));
        let progress = tracker.get_or_create("new-user").await.unwrap();
        assert_eq!(progress.paper_balance, dec!(5000));
        assert!(ledger.get_progress("new-user").await.unwrap().is_some());
    }
}
