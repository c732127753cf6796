//! Program progress projection
//!
//! Derives three temporal metrics from a program's inclusive date range and
//! the current date. Nothing here is stored; callers recompute on every read.

use chrono::NaiveDate;
use pilot_core::{Clock, DateRange};
use serde::Serialize;

/// Derived progress fields attached to a program on read
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramProgress {
    /// `(end_date - start_date) + 1`
    pub days_count_this_program: i64,
    /// 1-based index of today inside the range, 0 before it, capped after it
    pub day_x_of_program: i64,
    /// Percentage of the range elapsed, two decimals
    pub phase_progress: f64,
}

impl ProgramProgress {
    /// Evaluate the projection for `today`.
    ///
    /// Reversed ranges are not rejected: they produce a zero or negative day
    /// count and the branches below still terminate without dividing by zero.
    pub fn compute(range: DateRange, today: NaiveDate) -> Self {
        let days_count = range.inclusive_days();
        let elapsed = (today - range.start_date).num_days() + 1;

        let day_x = if today < range.start_date {
            0
        } else if today > range.end_date {
            days_count
        } else {
            elapsed
        };

        // zero-day guard goes first
        let phase_progress = if days_count == 0 || today < range.start_date {
            0.0
        } else if today > range.end_date {
            100.0
        } else {
            round_percentage(elapsed, days_count)
        };

        Self {
            days_count_this_program: days_count,
            day_x_of_program: day_x,
            phase_progress,
        }
    }

    /// Evaluate against the clock's current date
    pub fn now(range: DateRange, clock: &dyn Clock) -> Self {
        Self::compute(range, clock.today())
    }

    pub fn has_started(&self) -> bool {
        self.day_x_of_program > 0
    }

    pub fn is_finished(&self) -> bool {
        self.phase_progress >= 100.0
    }
}

/// `numerator / denominator * 100`, rounded to two decimals, half away from zero.
///
/// Integer arithmetic on hundredths keeps results identical to a SQL
/// `ROUND(numeric, 2)` (33.33, 66.67, 3.13 for 1/32).
pub fn round_percentage(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }

    let scaled = i128::from(numerator) * 10_000;
    let divisor = i128::from(denominator);
    let quotient = scaled / divisor;
    let remainder = scaled % divisor;

    let hundredths = if 2 * remainder.abs() >= divisor.abs() {
        if (scaled < 0) != (divisor < 0) {
            quotient - 1
        } else {
            quotient + 1
        }
    } else {
        quotient
    };

    hundredths as f64 / 100.0
}

/// Share of expected petri samples that are complete, capped at 100
pub fn session_percentage(complete: i64, expected: i64) -> f64 {
    if expected <= 0 {
        return 0.0;
    }
    round_percentage(complete.clamp(0, expected), expected)
}
