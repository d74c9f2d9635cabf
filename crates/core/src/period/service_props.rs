//! Property-based tests for period interval rules.

use chrono::{Duration, NaiveDate, Utc};
use proptest::prelude::*;
use verity_shared::types::{OrganizationId, PeriodId};

use super::service::PeriodService;
use super::types::{Period, PeriodStatus};

/// Strategy to generate valid dates within a reasonable range.
fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2020i32..=2030, 1u32..=12, 1u32..=28)
        .prop_map(|(year, month, day)| NaiveDate::from_ymd_opt(year, month, day).unwrap())
}

/// Strategy to generate a valid period interval (start < end, under 2 years).
fn interval_strategy() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
    date_strategy().prop_flat_map(|start| {
        (Just(start), 1i64..=700).prop_map(move |(s, days)| (s, s + Duration::days(days)))
    })
}

fn period(start: NaiveDate, end: NaiveDate) -> Period {
    Period {
        id: PeriodId::new(),
        organization_id: OrganizationId::new(),
        name: "prop".to_string(),
        start_date: start,
        end_date: end,
        status: PeriodStatus::Open,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any pair of intervals the overlap test is symmetric.
    #[test]
    fn prop_overlap_is_symmetric(
        (a_start, a_end) in interval_strategy(),
        (b_start, b_end) in interval_strategy(),
    ) {
        let a = period(a_start, a_end);
        let b = period(b_start, b_end);
        prop_assert_eq!(a.overlaps(b_start, b_end), b.overlaps(a_start, a_end));
    }

    /// An interval ending on day D never overlaps one starting on D+1.
    #[test]
    fn prop_adjacent_intervals_do_not_overlap((a_start, a_end) in interval_strategy()) {
        let b_start = a_end + Duration::days(1);
        let b_end = b_start + Duration::days(30);
        let a = period(a_start, a_end);
        prop_assert!(!a.overlaps(b_start, b_end));
    }

    /// An interval sharing even one day with an existing period is rejected.
    #[test]
    fn prop_shared_day_is_rejected(
        (a_start, a_end) in interval_strategy(),
        offset in 0i64..=700,
    ) {
        let b_start = a_start + Duration::days(offset);
        prop_assume!(b_start <= a_end);
        let b_end = b_start + Duration::days(30);

        let existing = vec![period(a_start, a_end)];
        let result = PeriodService::check_overlap(b_start, b_end, &existing, None);
        prop_assert!(result.is_err());
    }

    /// Whatever `check_overlap` accepts satisfies the no-overlap invariant:
    /// for any accepted candidate, start > existing.end or end < existing.start.
    #[test]
    fn prop_accepted_candidates_are_disjoint(
        (a_start, a_end) in interval_strategy(),
        (b_start, b_end) in interval_strategy(),
    ) {
        let existing = vec![period(a_start, a_end)];
        if PeriodService::check_overlap(b_start, b_end, &existing, None).is_ok() {
            prop_assert!(b_start > a_end || b_end < a_start);
        }
    }

    /// The closed state never transitions anywhere.
    #[test]
    fn prop_closed_is_terminal(to in prop_oneof![
        Just(PeriodStatus::Open),
        Just(PeriodStatus::Closing),
        Just(PeriodStatus::Closed),
    ]) {
        prop_assert!(PeriodService::validate_transition(PeriodStatus::Closed, to).is_err());
    }
}
