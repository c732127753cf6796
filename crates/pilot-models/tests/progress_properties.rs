use chrono::{Duration, NaiveDate};
use pilot_core::DateRange;
use pilot_models::ProgramProgress;
use proptest::prelude::*;
use proptest::test_runner::Config;

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn range(start_offset: i64, len: i64) -> DateRange {
    let start = base() + Duration::days(start_offset);
    DateRange::new(start, start + Duration::days(len))
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn day_count_is_inclusive(start in 0_i64..2_000, len in 0_i64..1_000, today in -500_i64..3_500) {
        let range = range(start, len);
        let progress = ProgramProgress::compute(range, base() + Duration::days(today));
        prop_assert_eq!(progress.days_count_this_program, len + 1);
    }

    #[test]
    fn progress_is_bounded(start in 0_i64..2_000, len in 0_i64..1_000, today in -500_i64..3_500) {
        let progress = ProgramProgress::compute(range(start, len), base() + Duration::days(today));
        prop_assert!(progress.phase_progress >= 0.0);
        prop_assert!(progress.phase_progress <= 100.0);
        prop_assert!(progress.day_x_of_program >= 0);
        prop_assert!(progress.day_x_of_program <= progress.days_count_this_program);
    }

    #[test]
    fn progress_is_monotonic(start in 0_i64..2_000, len in 0_i64..1_000, today in -500_i64..3_500, step in 1_i64..60) {
        let range = range(start, len);
        let earlier = ProgramProgress::compute(range, base() + Duration::days(today));
        let later = ProgramProgress::compute(range, base() + Duration::days(today + step));
        prop_assert!(later.day_x_of_program >= earlier.day_x_of_program);
        prop_assert!(later.phase_progress >= earlier.phase_progress);
    }

    #[test]
    fn boundaries(start in 0_i64..2_000, len in 0_i64..1_000, outside in 1_i64..400) {
        let range = range(start, len);

        let before = ProgramProgress::compute(range, range.start_date - Duration::days(outside));
        prop_assert_eq!(before.day_x_of_program, 0);
        prop_assert_eq!(before.phase_progress, 0.0);

        let first = ProgramProgress::compute(range, range.start_date);
        prop_assert_eq!(first.day_x_of_program, 1);

        let last = ProgramProgress::compute(range, range.end_date);
        prop_assert_eq!(last.day_x_of_program, last.days_count_this_program);
        prop_assert_eq!(last.phase_progress, 100.0);

        let after = ProgramProgress::compute(range, range.end_date + Duration::days(outside));
        prop_assert_eq!(after.day_x_of_program, after.days_count_this_program);
        prop_assert_eq!(after.phase_progress, 100.0);
    }

    #[test]
    fn two_decimal_precision(start in 0_i64..2_000, len in 0_i64..1_000, today in 0_i64..1_000) {
        let range = range(start, len);
        let progress = ProgramProgress::compute(range, range.start_date + Duration::days(today));
        let hundredths = progress.phase_progress * 100.0;
        prop_assert!((hundredths - hundredths.round()).abs() < 1e-6);
    }
}
