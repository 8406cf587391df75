//! Half-open time windows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A booked window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Exclusive end.
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Build a window, rejecting `end <= start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AppError> {
        if end <= start {
            return Err(AppError::validation(format!(
                "end time {end} must be after start time {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Half-open overlap: two windows conflict unless one ends at or before
    /// the other starts.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }

    /// Whether `at` lies within `[start, end]`.
    ///
    /// Both ends are inclusive: a reservation "covers now" up to and
    /// including its end instant.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// `NOT (a_end <= b_start OR a_start >= b_end)`.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    !(a_end <= b_start || a_start >= b_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).single().expect("valid")
    }

    #[test]
    fn test_rejects_empty_window() {
        assert!(TimeWindow::new(at(9), at(9)).is_err());
        assert!(TimeWindow::new(at(10), at(9)).is_err());
    }

    #[test]
    fn test_adjacent_windows_do_not_overlap() {
        let morning = TimeWindow::new(at(9), at(10)).expect("window");
        let next = TimeWindow::new(at(10), at(11)).expect("window");
        assert!(!morning.overlaps(&next));
        assert!(!next.overlaps(&morning));
    }

    #[test]
    fn test_partial_and_nested_overlap() {
        let base = TimeWindow::new(at(9), at(12)).expect("window");
        let partial = TimeWindow::new(at(11), at(13)).expect("window");
        let nested = TimeWindow::new(at(10), at(11)).expect("window");
        assert!(base.overlaps(&partial));
        assert!(base.overlaps(&nested));
        assert!(nested.overlaps(&base));
    }

    #[test]
    fn test_covers_is_inclusive() {
        let window = TimeWindow::new(at(9), at(10)).expect("window");
        assert!(window.covers(at(9)));
        assert!(window.covers(at(10)));
        assert!(!window.covers(at(10) + Duration::seconds(1)));
    }
}
