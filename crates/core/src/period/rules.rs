//! Half-open date range rules for billing periods.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bordereau_shared::types::PeriodId;

/// Error for a degenerate period range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("start_date {start} must be strictly before end_date {end}")]
pub struct PeriodRangeError {
    /// Requested start date.
    pub start: NaiveDate,
    /// Requested end date.
    pub end: NaiveDate,
}

/// A billing window `[start_date, end_date)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    /// Unique identifier.
    pub id: PeriodId,
    /// First day of the window (inclusive).
    pub start_date: NaiveDate,
    /// Day after the last day of the window (exclusive).
    pub end_date: NaiveDate,
}

impl PeriodWindow {
    /// Returns true if the date falls inside this window:
    /// `start_date <= date < end_date`.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date < self.end_date
    }
}

/// Validates that a range is non-empty.
///
/// # Errors
///
/// Returns [`PeriodRangeError`] unless `start < end`.
pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), PeriodRangeError> {
    if start < end {
        Ok(())
    } else {
        Err(PeriodRangeError { start, end })
    }
}

/// Returns true if two half-open ranges intersect.
///
/// Touching endpoints do not overlap: `[jan, feb)` and `[feb, mar)` are
/// disjoint.
#[must_use]
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Finds the period containing the date, if any.
///
/// Non-overlap makes the answer unique when it exists.
#[must_use]
pub fn find_period_for_date(periods: &[PeriodWindow], date: NaiveDate) -> Option<&PeriodWindow> {
    periods.iter().find(|p| p.contains(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window(start: NaiveDate, end: NaiveDate) -> PeriodWindow {
        PeriodWindow {
            id: PeriodId::new(),
            start_date: start,
            end_date: end,
        }
    }

    #[test]
    fn test_validate_range_rejects_empty_and_inverted() {
        assert!(validate_range(date(2024, 1, 1), date(2024, 2, 1)).is_ok());
        assert!(validate_range(date(2024, 1, 1), date(2024, 1, 1)).is_err());
        assert!(validate_range(date(2024, 2, 1), date(2024, 1, 1)).is_err());
    }

    #[test]
    fn test_touching_endpoints_do_not_overlap() {
        assert!(!ranges_overlap(
            date(2024, 1, 1),
            date(2024, 2, 1),
            date(2024, 2, 1),
            date(2024, 3, 1)
        ));
    }

    #[test]
    fn test_partial_overlap_detected() {
        assert!(ranges_overlap(
            date(2024, 1, 1),
            date(2024, 2, 1),
            date(2024, 1, 15),
            date(2024, 3, 1)
        ));
    }

    #[test]
    fn test_containment_is_overlap() {
        assert!(ranges_overlap(
            date(2024, 1, 1),
            date(2024, 12, 31),
            date(2024, 3, 1),
            date(2024, 4, 1)
        ));
    }

    #[test]
    fn test_contains_is_half_open() {
        let w = window(date(2024, 1, 1), date(2024, 2, 1));
        assert!(w.contains(date(2024, 1, 1)));
        assert!(w.contains(date(2024, 1, 31)));
        assert!(!w.contains(date(2024, 2, 1)));
        assert!(!w.contains(date(2023, 12, 31)));
    }

    #[test]
    fn test_find_period_for_date() {
        let jan = window(date(2024, 1, 1), date(2024, 2, 1));
        let feb = window(date(2024, 2, 1), date(2024, 3, 1));
        let periods = vec![jan, feb];

        assert_eq!(
            find_period_for_date(&periods, date(2024, 1, 20)).map(|p| p.id),
            Some(jan.id)
        );
        // Boundary day belongs to the later window.
        assert_eq!(
            find_period_for_date(&periods, date(2024, 2, 1)).map(|p| p.id),
            Some(feb.id)
        );
        assert!(find_period_for_date(&periods, date(2024, 3, 1)).is_none());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        prop_compose! {
            fn arb_date()(days in 0i64..3650) -> NaiveDate {
                date(2020, 1, 1) + chrono::Duration::days(days)
            }
        }

        prop_compose! {
            fn arb_range()(start in arb_date(), len in 1i64..400) -> (NaiveDate, NaiveDate) {
                (start, start + chrono::Duration::days(len))
            }
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            /// Overlap is symmetric in its two ranges.
            #[test]
            fn prop_overlap_symmetric(a in arb_range(), b in arb_range()) {
                prop_assert_eq!(
                    ranges_overlap(a.0, a.1, b.0, b.1),
                    ranges_overlap(b.0, b.1, a.0, a.1)
                );
            }

            /// A range always overlaps itself.
            #[test]
            fn prop_range_overlaps_itself(a in arb_range()) {
                prop_assert!(ranges_overlap(a.0, a.1, a.0, a.1));
            }

            /// Adjacent ranges built by splitting never overlap.
            #[test]
            fn prop_split_ranges_disjoint(start in arb_date(), len1 in 1i64..200, len2 in 1i64..200) {
                let mid = start + chrono::Duration::days(len1);
                let end = mid + chrono::Duration::days(len2);
                prop_assert!(!ranges_overlap(start, mid, mid, end));
            }

            /// A date is inside a window exactly when `contains` says so,
            /// matching the overlap of the degenerate one-day range.
            #[test]
            fn prop_contains_matches_one_day_overlap(a in arb_range(), d in arb_date()) {
                let w = PeriodWindow { id: PeriodId::new(), start_date: a.0, end_date: a.1 };
                let one_day = (d, d + chrono::Duration::days(1));
                prop_assert_eq!(
                    w.contains(d),
                    ranges_overlap(a.0, a.1, one_day.0, one_day.1)
                );
            }
        }
    }
}
