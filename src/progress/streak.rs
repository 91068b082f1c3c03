//! Daily check-in streaks

use chrono::NaiveDate;

/// Consecutive-day streak ending at the most recent check-in
///
/// Walks the sorted dates backward and stops at the first gap.
pub fn current_streak(dates: &[NaiveDate]) -> i64 {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    if sorted.is_empty() {
        return 0;
    }

    let mut streak = 1;
    for pair in sorted.windows(2).rev() {
        if (pair[1] - pair[0]).num_days() == 1 {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// Record a check-in for `today`
///
/// Returns false when `today` is already the last recorded date.
pub fn record(dates: &mut Vec<NaiveDate>, today: NaiveDate) -> bool {
    if dates.last() == Some(&today) {
        return false;
    }
    dates.push(today);
    true
}
