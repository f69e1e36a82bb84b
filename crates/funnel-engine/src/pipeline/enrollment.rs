use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

use crate::table::RawTable;

const ENROLLMENT_DATE_COLUMNS: &[&str] = &["date of enrollment", "enrollment date"];
const ENROLLMENT_TERM_COLUMNS: &[&str] = &["term of enrollment", "enrollment term"];

/// Per-population enrollment flags plus the data-quality signal for the
/// missing-source case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentStatus {
    pub enrolled: Vec<bool>,
    /// True when the feed carried neither an enrollment-date nor a
    /// term-of-enrollment column. The whole population reads as not
    /// enrolled, which zeroes a year's enrollment count, so callers must
    /// surface this rather than swallow it.
    pub source_missing: bool,
}

/// Derive per-row enrollment for one population.
///
/// The two feeds report enrollment through different fields, so the lookup
/// is two-tier: an explicit enrollment date wins; a term label is the
/// fallback; neither column present is a feed-configuration failure.
pub fn derive_enrollment(table: &RawTable, valid_years: &[i32]) -> EnrollmentStatus {
    if let Some(date_col) = table.column(ENROLLMENT_DATE_COLUMNS) {
        let enrolled: Vec<bool> = table
            .rows()
            .map(|row| enrolled_by_date(row.field(Some(date_col)), valid_years))
            .collect();
        debug!(
            enrolled = enrolled.iter().filter(|e| **e).count(),
            rows = table.len(),
            "derived enrollment from enrollment-date column"
        );
        return EnrollmentStatus {
            enrolled,
            source_missing: false,
        };
    }

    if let Some(term_col) = table.column(ENROLLMENT_TERM_COLUMNS) {
        let enrolled: Vec<bool> = table
            .rows()
            .map(|row| enrolled_by_term(row.field(Some(term_col)), valid_years))
            .collect();
        debug!(
            enrolled = enrolled.iter().filter(|e| **e).count(),
            rows = table.len(),
            "derived enrollment from term-of-enrollment column"
        );
        return EnrollmentStatus {
            enrolled,
            source_missing: false,
        };
    }

    warn!(
        headers = ?table.headers(),
        "no enrollment-date or term-of-enrollment column; all rows marked not enrolled"
    );
    EnrollmentStatus {
        enrolled: vec![false; table.len()],
        source_missing: !table.is_empty(),
    }
}

fn enrolled_by_date(raw: &str, valid_years: &[i32]) -> bool {
    match parse_flexible_date(raw) {
        Some(date) => valid_years.contains(&date.year()),
        None => false,
    }
}

fn enrolled_by_term(raw: &str, valid_years: &[i32]) -> bool {
    if raw.trim().is_empty() {
        return false;
    }
    valid_years
        .iter()
        .any(|year| raw.contains(&year.to_string()))
}

/// Tolerant date parsing across the formats the feeds have shipped.
/// Unparseable input is `None`, never an error.
pub(crate) fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m/%d/%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    // Exports occasionally carry a timestamp suffix.
    if let Some((date_part, _)) = trimmed.split_once(' ') {
        for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
                return Some(date);
            }
        }
    }

    None
}
