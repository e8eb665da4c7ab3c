//! Inclusive calendar-date ranges used by visitor history, reports, and exports.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// A range of calendar days (UTC), inclusive at both ends.
///
/// A timestamp falls inside the range when its calendar date is between
/// `start` and `end`, so a visit at 23:59 on `end` is included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day included.
    pub start: NaiveDate,
    /// Last day included.
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting one whose start lies after its end.
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if start > end {
            return Err(AppError::validation(format!(
                "Date range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// A range covering a single day.
    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Today only.
    pub fn today() -> Self {
        Self::single_day(Utc::now().date_naive())
    }

    /// The last `days` days including today.
    pub fn last_days(days: u64) -> Self {
        let end = Utc::now().date_naive();
        let start = end
            .checked_sub_days(Days::new(days.saturating_sub(1)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    /// Build a range from optional bounds, defaulting a missing side to the
    /// other one (or to today when both are missing).
    pub fn from_optional(start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<Self> {
        match (start, end) {
            (Some(s), Some(e)) => Self::new(s, e),
            (Some(s), None) => Self::new(s, s.max(Utc::now().date_naive())),
            (None, Some(e)) => Ok(Self::single_day(e)),
            (None, None) => Ok(Self::today()),
        }
    }

    /// Whether `ts` falls on a day inside the range.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        let day = ts.date_naive();
        day >= self.start && day <= self.end
    }

    /// Half-open timestamp bounds `[start 00:00, end + 1 day 00:00)` for
    /// range queries.
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let lower = self.start.and_time(NaiveTime::MIN).and_utc();
        let upper = self
            .end
            .checked_add_days(Days::new(1))
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        (lower, upper)
    }

    /// Number of days covered.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(DateRange::new(day(2026, 3, 2), day(2026, 3, 1)).is_err());
    }

    #[test]
    fn contains_is_inclusive_at_both_ends() {
        let range = DateRange::new(day(2026, 3, 1), day(2026, 3, 3)).unwrap();
        let first = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let last = Utc.with_ymd_and_hms(2026, 3, 3, 23, 59, 59).unwrap();
        let before = Utc.with_ymd_and_hms(2026, 2, 28, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 3, 4, 0, 0, 0).unwrap();
        assert!(range.contains(first));
        assert!(range.contains(last));
        assert!(!range.contains(before));
        assert!(!range.contains(after));
    }

    #[test]
    fn bounds_end_on_following_midnight() {
        let range = DateRange::single_day(day(2026, 3, 1));
        let (lo, hi) = range.bounds();
        assert_eq!(lo, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(hi, Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap());
        assert_eq!(range.days(), 1);
    }

    #[test]
    fn last_days_counts_today() {
        let range = DateRange::last_days(7);
        assert_eq!(range.days(), 7);
        assert_eq!(range.end, Utc::now().date_naive());
    }
}
