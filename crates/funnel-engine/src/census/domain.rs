use serde::{Deserialize, Serialize};

use crate::pipeline::domain::DegreeType;

/// Raw student status reported by the census snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    New,
    Continuing,
    Returning,
    Unknown,
}

impl StudentStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            s if s.eq_ignore_ascii_case("new") => StudentStatus::New,
            s if s.eq_ignore_ascii_case("continuing") => StudentStatus::Continuing,
            s if s.eq_ignore_ascii_case("returning") => StudentStatus::Returning,
            _ => StudentStatus::Unknown,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            StudentStatus::New => "New",
            StudentStatus::Continuing => "Continuing",
            StudentStatus::Returning => "Returning",
            StudentStatus::Unknown => "Unknown",
        }
    }
}

/// Billing classification: first-term students bill at new-student rates,
/// everyone else at current-student rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentType {
    New,
    Current,
}

impl StudentType {
    pub const fn label(self) -> &'static str {
        match self {
            StudentType::New => "New",
            StudentType::Current => "Current",
        }
    }
}

/// One census row after parsing and in-scope filtering.
///
/// Student ids are not unique per row (the snapshot repeats a student for
/// each attribute set), so headcounts are always unique-id counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CensusRecord {
    pub student_id: String,
    pub term: String,
    pub location: String,
    pub degree_type: DegreeType,
    pub corporate: bool,
    pub corporate_cohort: String,
    pub lighthouse: bool,
    pub status: StudentStatus,
    /// Set when the student already enrolled in the prior summer term as
    /// new; such students bill as current, not new, in the fall.
    pub prior_summer_as_new: bool,
    pub credits: f64,
    pub program: String,
    pub school: String,
}
