//! Date handling for classification queries.
//!
//! All dates are calendar days in strict ISO 8601 form (`YYYY-MM-DD`). With
//! zero padding enforced, lexicographic and chronological order agree.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{MrvError, MrvResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a single `YYYY-MM-DD` date, naming it `label` in the error.
pub fn parse_date(label: &str, value: &str) -> MrvResult<NaiveDate> {
    let bad_format = || MrvError::BadDateFormat {
        label: label.to_string(),
        value: value.to_string(),
    };

    // chrono tolerates signs, spaces and unpadded fields; only `dddd-dd-dd` is accepted.
    if !is_iso_shape(value) {
        return Err(bad_format());
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| bad_format())
}

fn is_iso_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Check that every date has the `YYYY-MM-DD` format.
pub fn validate_dates(dates: &[&str]) -> MrvResult<()> {
    for date in dates {
        parse_date("date", date)?;
    }
    Ok(())
}

/// A half-open query window `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Validate both formats, then the ordering.
    pub fn parse(start: &str, end: &str) -> MrvResult<Self> {
        let start = parse_date("start_date", start)?;
        let end = parse_date("end_date", end)?;
        Self::new(start, end)
    }

    pub fn new(start: NaiveDate, end: NaiveDate) -> MrvResult<Self> {
        if start >= end {
            return Err(MrvError::DateOrdering {
                before: "end_date",
                after: "start_date",
            });
        }
        Ok(Self { start, end })
    }

    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start_str(), self.end_str())
    }
}

/// Log a warning when the query ends before the project started.
///
/// Returns whether the warning fired. This is never an error.
pub fn warn_if_before_project_start(range: &DateRange, project_start: NaiveDate) -> bool {
    if project_start > range.end {
        warn!(
            end_date = %range.end_str(),
            project_start_date = %project_start.format(DATE_FORMAT),
            "end_date is before project's start_date"
        );
        return true;
    }
    false
}
