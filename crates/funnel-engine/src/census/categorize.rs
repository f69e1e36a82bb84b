use super::domain::{CensusRecord, StudentStatus, StudentType};
use crate::pipeline::domain::{Category, DegreeType};
use crate::pipeline::standardize::is_continuing_ed_program;

const CONTINUING_ED_SCHOOL_MARKER: &str = "PCE";
const PARTNER_LOCATION: &str = "Online Partner";
const ONLINE_LOCATION: &str = "Online";

/// One step of the census cascade.
pub struct CensusRule {
    pub name: &'static str,
    pub applies: fn(&CensusRecord) -> bool,
    pub category: Category,
}

/// Census rows lack funnel fields (tags, sponsor, decision), so this
/// cascade reasons from location, flags, and degree type instead. Order is
/// a contract, same as the application cascade. The trailing rule leaves
/// the row visibly uncategorized rather than folding it into Retail;
/// revenue math filters those out explicitly.
pub const CENSUS_CASCADE: &[CensusRule] = &[
    CensusRule {
        name: "continuing_ed_program_or_school",
        applies: |record| {
            is_continuing_ed_program(&record.program)
                || record
                    .school
                    .to_ascii_uppercase()
                    .contains(CONTINUING_ED_SCHOOL_MARKER)
        },
        category: Category::ContinuingEducation,
    },
    CensusRule {
        name: "non_degree_fasttrack",
        applies: |record| record.degree_type == DegreeType::NonDegree,
        category: Category::FastTrack,
    },
    CensusRule {
        name: "partner_location",
        applies: |record| record.location == PARTNER_LOCATION,
        category: Category::PartnerOnline,
    },
    CensusRule {
        name: "lighthouse_flag",
        applies: |record| record.lighthouse,
        category: Category::Lighthouse,
    },
    CensusRule {
        name: "corporate_with_cohort",
        applies: |record| {
            record.location == ONLINE_LOCATION
                && record.corporate
                && is_real_cohort(&record.corporate_cohort)
        },
        category: Category::Corporate,
    },
    CensusRule {
        name: "online_retail",
        applies: |record| record.location == ONLINE_LOCATION,
        category: Category::Retail,
    },
    CensusRule {
        name: "uncategorized",
        applies: |_| true,
        category: Category::Uncategorized,
    },
];

/// Run the census cascade; total via the trailing catch-all.
pub fn categorize_census_record(record: &CensusRecord) -> Category {
    for rule in CENSUS_CASCADE {
        if (rule.applies)(record) {
            return rule.category;
        }
    }
    Category::Uncategorized
}

/// Cohort values that mean "no cohort actually recorded".
fn is_real_cohort(cohort: &str) -> bool {
    let trimmed = cohort.trim();
    !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("not reported")
}

/// New-vs-current derivation.
///
/// Continuing and Returning students are current. A New-status student who
/// already enrolled in the prior summer term as new is also current; the
/// summer term billed their new-student rate, and without the look-back the
/// fall snapshot would count them as new a second time. Unknown statuses
/// stay unclassified and never reach billing.
pub fn derive_student_type(record: &CensusRecord) -> Option<StudentType> {
    match record.status {
        StudentStatus::Continuing | StudentStatus::Returning => Some(StudentType::Current),
        StudentStatus::New if record.prior_summer_as_new => Some(StudentType::Current),
        StudentStatus::New => Some(StudentType::New),
        StudentStatus::Unknown => None,
    }
}
