//! Common value types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive calendar date range (both endpoints count as days of the range)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// `(end - start) + 1`. Zero or negative for reversed ranges.
    pub fn inclusive_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn is_reversed(&self) -> bool {
        self.end_date < self.start_date
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_inclusive_days() {
        assert_eq!(DateRange::new(date(2025, 1, 1), date(2025, 1, 10)).inclusive_days(), 10);
        assert_eq!(DateRange::new(date(2025, 1, 1), date(2025, 1, 1)).inclusive_days(), 1);
        assert_eq!(DateRange::new(date(2025, 1, 2), date(2025, 1, 1)).inclusive_days(), 0);
        assert_eq!(DateRange::new(date(2025, 1, 5), date(2025, 1, 1)).inclusive_days(), -3);
    }

    #[test]
    fn test_contains_endpoints() {
        let range = DateRange::new(date(2025, 1, 1), date(2025, 1, 10));
        assert!(range.contains(date(2025, 1, 1)));
        assert!(range.contains(date(2025, 1, 10)));
        assert!(!range.contains(date(2024, 12, 31)));
        assert!(!range.contains(date(2025, 1, 11)));
    }
}
