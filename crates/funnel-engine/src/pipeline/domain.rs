use serde::{Deserialize, Serialize};

/// Which raw feed produced an application row.
///
/// The two feeds describe the same funnel but encode decisions differently:
/// Main rows carry a decision bin, FastTrack rows carry free-text decisions
/// and only count as applications once a decision is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFeed {
    Main,
    FastTrack,
}

impl SourceFeed {
    pub const fn label(self) -> &'static str {
        match self {
            SourceFeed::Main => "Main",
            SourceFeed::FastTrack => "FastTrack",
        }
    }
}

/// Intake season inferred from the round label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Fall,
    Spring,
    Summer,
    Unknown,
}

impl Season {
    pub const fn label(self) -> &'static str {
        match self {
            Season::Fall => "Fall",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Unknown => "Unknown",
        }
    }
}

/// Canonical school after standardization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum School {
    Business,
    Engineering,
    ContinuingEducation,
    DualDegree,
}

impl School {
    pub const fn label(self) -> &'static str {
        match self {
            School::Business => "School of Business",
            School::Engineering => "School of Engineering",
            School::ContinuingEducation => "PCE",
            School::DualDegree => "Dual Degree",
        }
    }
}

/// Canonical degree type shared by the pipeline and census sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegreeType {
    Masters,
    GraduateCertificate,
    ProfessionalGraduateCertificate,
    DualDegree,
    NonDegree,
}

impl DegreeType {
    pub const fn label(self) -> &'static str {
        match self {
            DegreeType::Masters => "Masters",
            DegreeType::GraduateCertificate => "Graduate Certificate",
            DegreeType::ProfessionalGraduateCertificate => "Professional Graduate Certificate",
            DegreeType::DualDegree => "Dual Degree",
            DegreeType::NonDegree => "Non-Degree",
        }
    }
}

/// Channel/segment classification shared by both classifiers.
///
/// Application rows are classified from funnel fields (tags, school,
/// sponsor), census rows from location/flag fields; both land in this one
/// category space so their aggregates can be reported side by side.
/// `Uncategorized` only appears on the census side and must be filtered out
/// before revenue math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    PartnerOnline,
    Lighthouse,
    Corporate,
    Retail,
    ContinuingEducation,
    SpecialProgram,
    FastTrack,
    Uncategorized,
}

impl Category {
    pub const fn label(self) -> &'static str {
        match self {
            Category::PartnerOnline => "Partner Online",
            Category::Lighthouse => "Lighthouse",
            Category::Corporate => "Corporate",
            Category::Retail => "Retail",
            Category::ContinuingEducation => "Continuing Education",
            Category::SpecialProgram => "Special Program",
            Category::FastTrack => "FastTrack",
            Category::Uncategorized => "Uncategorized",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmitStatus {
    Admitted,
    NotAdmitted,
}

impl AdmitStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AdmitStatus::Admitted => "admitted",
            AdmitStatus::NotAdmitted => "not admitted",
        }
    }
}

/// One application row after standardization, derivation, and
/// classification. Rows are not deduplicated across years; identity is row
/// position within its reporting year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub source: SourceFeed,
    pub reporting_year: i32,
    pub season: Season,
    pub program_raw: String,
    pub program: String,
    pub school: School,
    pub degree_type: DegreeType,
    pub sponsor_company: String,
    pub category: Category,
    /// Main rows always count; FastTrack rows count only once a decision is
    /// recorded.
    pub counted_application: bool,
    pub admit_status: AdmitStatus,
    pub offer_accepted: bool,
    pub offer_declined: bool,
    pub enrolled: bool,
}
