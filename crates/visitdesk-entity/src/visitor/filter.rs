//! Visitor query criteria.

use serde::{Deserialize, Serialize};
use visitdesk_core::types::DateRange;

use super::model::Visitor;
use super::status::VisitorStatus;

/// Criteria for the visitor log. Results are always ordered by check-in
/// time, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitorFilter {
    /// Restrict to one status.
    pub status: Option<VisitorStatus>,
    /// Inclusive check-in day range.
    pub range: Option<DateRange>,
    /// Free-text search over name, phone, resident, badge, and ID.
    pub search: Option<String>,
}

impl VisitorFilter {
    /// Everyone currently on site.
    pub fn on_site() -> Self {
        Self {
            status: Some(VisitorStatus::CheckedIn),
            ..Default::default()
        }
    }

    /// Everyone who checked in during `range`.
    pub fn in_range(range: DateRange) -> Self {
        Self {
            range: Some(range),
            ..Default::default()
        }
    }

    /// Trimmed, non-empty search text.
    pub fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Whether the filter combines more than one indexed field, which needs
    /// the composite `(status, check_in_time)` index to run server-side.
    pub fn needs_composite_index(&self) -> bool {
        self.status.is_some() && self.range.is_some()
    }

    /// Client-side evaluation of every criterion.
    pub fn matches(&self, visitor: &Visitor) -> bool {
        if let Some(status) = self.status {
            if visitor.status != status {
                return false;
            }
        }
        if let Some(range) = &self.range {
            if !range.contains(visitor.check_in_time) {
                return false;
            }
        }
        match self.search_text() {
            Some(q) => visitor.matches_search(q),
            None => true,
        }
    }
}

/// Sort newest check-in first, breaking ties by ID for a stable order.
pub fn sort_newest_first(visitors: &mut [Visitor]) {
    visitors.sort_by(|a, b| {
        b.check_in_time
            .cmp(&a.check_in_time)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visitor::model::NewVisitor;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn at(d: u32, h: u32) -> Visitor {
        Visitor::check_in(
            NewVisitor {
                first_name: "Sam".into(),
                last_name: format!("Day{d}"),
                purpose: "Visit".into(),
                ..Default::default()
            },
            None,
            Utc.with_ymd_and_hms(2026, 5, d, h, 0, 0).unwrap(),
        )
    }

    #[test]
    fn range_filter_is_inclusive() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2026, 5, 2).unwrap(),
            NaiveDate::from_ymd_opt(2026, 5, 3).unwrap(),
        )
        .unwrap();
        let filter = VisitorFilter::in_range(range);
        assert!(!filter.matches(&at(1, 23)));
        assert!(filter.matches(&at(2, 0)));
        assert!(filter.matches(&at(3, 23)));
        assert!(!filter.matches(&at(4, 0)));
    }

    #[test]
    fn status_and_search_combine() {
        let mut v = at(2, 9);
        let filter = VisitorFilter {
            status: Some(VisitorStatus::CheckedIn),
            search: Some("  day2 ".into()),
            range: None,
        };
        assert!(filter.matches(&v));
        v.mark_checked_out(None, Utc::now()).unwrap();
        assert!(!filter.matches(&v));
    }

    #[test]
    fn sorts_newest_first() {
        let mut list = vec![at(1, 8), at(3, 8), at(2, 8)];
        sort_newest_first(&mut list);
        let names: Vec<_> = list.iter().map(|v| v.last_name.as_str()).collect();
        assert_eq!(names, ["Day3", "Day2", "Day1"]);
    }
}
