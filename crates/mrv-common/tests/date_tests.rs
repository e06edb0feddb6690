//! Tests for date validation and query ranges.

use chrono::NaiveDate;
use mrv_common::{validate_dates, warn_if_before_project_start, DateRange, MrvError};

// ============================================================================
// validate_dates
// ============================================================================

#[test]
fn test_validate_dates_single() {
    validate_dates(&["2022-01-01"]).unwrap();
}

#[test]
fn test_validate_dates_wrong_separator() {
    let err = validate_dates(&["2022-01-01", "2022/01/01"]).unwrap_err();
    assert!(matches!(err, MrvError::BadDateFormat { .. }));
    assert!(err.is_invalid_value());
}

#[test]
fn test_validate_dates_rejects_non_iso_forms() {
    for bad in [
        "01-01-2022",
        "2022-13-01",
        "2022-02-30",
        "2022-1-01",
        "20220101",
        "2022-01-01T00:00:00",
        "",
        "yesterday",
        "+999-01-01",
        "-999-01-01",
        " 2022-1-05",
        "2022- 1-05",
        "2022-01-1 ",
        "02022-1-05",
    ] {
        let err = validate_dates(&[bad]).unwrap_err();
        assert!(
            matches!(err, MrvError::BadDateFormat { .. }),
            "{bad:?} should be rejected as a bad format"
        );
    }
}

#[test]
fn test_validate_dates_empty_list() {
    validate_dates(&[]).unwrap();
}

// ============================================================================
// DateRange ordering
// ============================================================================

#[test]
fn test_range_ok() {
    let range = DateRange::parse("2022-06-04", "2022-07-04").unwrap();
    assert_eq!(range.start, NaiveDate::from_ymd_opt(2022, 6, 4).unwrap());
    assert_eq!(range.end, NaiveDate::from_ymd_opt(2022, 7, 4).unwrap());
}

#[test]
fn test_range_end_before_start() {
    let err = DateRange::parse("2022-06-04", "2000-01-01").unwrap_err();
    assert!(matches!(
        err,
        MrvError::DateOrdering {
            before: "end_date",
            after: "start_date"
        }
    ));
}

#[test]
fn test_range_equal_dates_rejected() {
    let err = DateRange::parse("2022-06-04", "2022-06-04").unwrap_err();
    assert!(matches!(err, MrvError::DateOrdering { .. }));
}

#[test]
fn test_range_ordering_matches_lexicographic_order() {
    let dates = [
        "1999-12-31",
        "2000-01-01",
        "2000-01-02",
        "2000-02-01",
        "2010-10-10",
        "2022-07-05",
    ];
    for start in dates {
        for end in dates {
            let result = DateRange::parse(start, end);
            if start >= end {
                assert!(
                    matches!(result, Err(MrvError::DateOrdering { .. })),
                    "{start} -> {end} should fail ordering"
                );
            } else {
                assert!(result.is_ok(), "{start} -> {end} should be valid");
            }
        }
    }
}

#[test]
fn test_range_format_checked_before_ordering() {
    let err = DateRange::parse("2022/06/04", "2000-01-01").unwrap_err();
    assert!(matches!(err, MrvError::BadDateFormat { .. }));
}

// ============================================================================
// Project start warning
// ============================================================================

#[test]
fn test_warning_when_end_before_project_start() {
    let range = DateRange::parse("2017-01-01", "2018-02-01").unwrap();
    let project_start = NaiveDate::from_ymd_opt(2021, 7, 5).unwrap();
    assert!(warn_if_before_project_start(&range, project_start));
}

#[test]
fn test_no_warning_after_project_start() {
    let range = DateRange::parse("2021-07-05", "2022-07-05").unwrap();
    let project_start = NaiveDate::from_ymd_opt(2021, 7, 5).unwrap();
    assert!(!warn_if_before_project_start(&range, project_start));
}
