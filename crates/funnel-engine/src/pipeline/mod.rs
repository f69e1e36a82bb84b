pub mod classify;
pub mod domain;
pub mod enrollment;
pub mod standardize;

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::table::RawTable;
use classify::{classify_application, ClassifierInput};
use domain::{AdmitStatus, ApplicantRecord, DegreeType, School, Season, SourceFeed};
use enrollment::derive_enrollment;
use standardize::{
    standardize_company_name, standardize_degree_type, standardize_program_name,
    standardize_school_name,
};

const ROUND_COLUMNS: &[&str] = &["round"];
const PROGRAM_COLUMNS: &[&str] = &["program", "program of interest", "area of study"];
const SCHOOL_COLUMNS: &[&str] = &["school applied for", "school"];
const DEGREE_COLUMNS: &[&str] = &["degree of interest"];
const BIN_COLUMNS: &[&str] = &["bin"];
const DECISION_COLUMNS: &[&str] = &["decision", "latest decision"];
const EMPLOYER_COLUMNS: &[&str] = &["sponsoring employer", "employer name"];
const CORPORATE_SPONSOR_COLUMNS: &[&str] = &["corporate sponsor"];
const TAG_COLUMNS: &[&str] = &["app tags", "tags"];
const PARTNER_EXCEPTION_COLUMNS: &[&str] = &["partner exception"];
const SPECIAL_PROGRAM_COLUMNS: &[&str] = &["special program"];

/// Round value marking rows from the secondary, rolling-admission pipeline.
const FASTTRACK_ROUND: &str = "FastTrack";

/// Decision bins that admit a Main row outright.
const ADMIT_BINS: &[&str] = &["admit", "conditional admit"];
/// Free-text decisions that also mean the applicant was admitted; rows from
/// the continuing-education division arrive with an empty bin.
const ADMIT_DECISION_KEYWORDS: &[&str] = &[
    "admit/matric",
    "admit provisionally",
    "admit/decline",
    "admit/withdraw",
];

/// Canonical program names whose certificate is the professional variant.
const PROFESSIONAL_CERT_PROGRAMS: &[&str] = &[
    "Analytics Foundations",
    "Enterprise Automation",
    "Systems Leadership Foundations",
];

/// Transformed populations keyed by reporting year, plus the data-quality
/// signals gathered along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationsByYear {
    pub years: BTreeMap<i32, Vec<ApplicantRecord>>,
    /// Population labels (for example "Main 2026") whose feed carried no
    /// enrollment-status field at all.
    pub missing_enrollment_sources: Vec<String>,
}

impl ApplicationsByYear {
    pub fn records(&self, year: i32) -> &[ApplicantRecord] {
        self.years.get(&year).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Output of transforming one source population.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationOutcome {
    pub records: Vec<ApplicantRecord>,
    pub missing_enrollment_source: bool,
}

/// Split the raw applications export by feed and year and transform each
/// population, merging FastTrack rows into the current reporting year.
///
/// The split happens before transformation because the two feeds share
/// column names but not semantics. An export without a round column is
/// treated as a single Main population for the current year.
pub fn load_applications(raw: &RawTable, current_year: i32) -> ApplicationsByYear {
    let valid_years = reporting_window(current_year);
    let mut result = ApplicationsByYear::default();

    if raw.is_empty() {
        return result;
    }

    let Some(round_col) = raw.column(ROUND_COLUMNS) else {
        debug!("no round column; treating the whole export as the current-year Main population");
        let outcome = transform_population(raw, SourceFeed::Main, current_year, &valid_years);
        if outcome.missing_enrollment_source {
            result
                .missing_enrollment_sources
                .push(format!("Main {current_year}"));
        }
        result.years.insert(current_year, outcome.records);
        return result;
    };

    let fasttrack = raw.filter(|row| row.field(Some(round_col)) == FASTTRACK_ROUND);
    let main = raw.filter(|row| row.field(Some(round_col)) != FASTTRACK_ROUND);
    debug!(
        main = main.len(),
        fasttrack = fasttrack.len(),
        "separated application feeds"
    );

    for year in valid_years {
        let year_label = year.to_string();
        let population = main.filter(|row| row.field(Some(round_col)).contains(&year_label));
        let outcome = transform_population(&population, SourceFeed::Main, year, &valid_years);
        if outcome.missing_enrollment_source {
            result
                .missing_enrollment_sources
                .push(format!("Main {year}"));
        }
        result.years.insert(year, outcome.records);
    }

    if !fasttrack.is_empty() {
        let outcome =
            transform_population(&fasttrack, SourceFeed::FastTrack, current_year, &valid_years);
        if outcome.missing_enrollment_source {
            result
                .missing_enrollment_sources
                .push(SourceFeed::FastTrack.label().to_string());
        }
        // Rows without a recorded decision are not applications at all.
        let counted: Vec<ApplicantRecord> = outcome
            .records
            .into_iter()
            .filter(|record| record.counted_application)
            .collect();
        info!(
            merged = counted.len(),
            year = current_year,
            "merged FastTrack applications into the current year"
        );
        result
            .years
            .entry(current_year)
            .or_default()
            .extend(counted);
    }

    result
}

/// The 3-year rolling comparison window ending at `current_year`.
pub fn reporting_window(current_year: i32) -> [i32; 3] {
    [current_year - 2, current_year - 1, current_year]
}

/// Apply standardizers, the enrollment deriver, and the classifier to one
/// population. Pure over its input: calling it twice yields identical
/// records.
pub fn transform_population(
    table: &RawTable,
    source: SourceFeed,
    year: i32,
    valid_years: &[i32],
) -> PopulationOutcome {
    if table.is_empty() {
        return PopulationOutcome::default();
    }

    let round_col = table.column(ROUND_COLUMNS);
    let program_col = table.column(PROGRAM_COLUMNS);
    let school_col = table.column(SCHOOL_COLUMNS);
    let degree_col = table.column(DEGREE_COLUMNS);
    let bin_col = table.column(BIN_COLUMNS);
    let decision_col = table.column(DECISION_COLUMNS);
    let employer_col = table.column(EMPLOYER_COLUMNS);
    let corporate_sponsor_col = table.column(CORPORATE_SPONSOR_COLUMNS);
    let tag_col = table.column(TAG_COLUMNS);
    let partner_exception_col = table.column(PARTNER_EXCEPTION_COLUMNS);
    let special_col = table.column(SPECIAL_PROGRAM_COLUMNS);

    let season = infer_season(table, round_col);
    let enrollment = derive_enrollment(table, valid_years);

    let records = table
        .rows()
        .map(|row| {
            let program_raw = row.field(program_col).to_string();
            let school_raw = row.field(school_col);
            let degree_raw = row.field(degree_col);
            let decision = row.field(decision_col);

            let program = standardize_program_name(&program_raw);
            let mut school = standardize_school_name(school_raw);
            let mut degree_type = standardize_degree_type(degree_raw);
            let sponsor_company = standardize_company_name(row.field(employer_col));

            if is_professional_certificate_program(&program) {
                degree_type = DegreeType::ProfessionalGraduateCertificate;
            }
            if degree_type == DegreeType::DualDegree {
                school = School::DualDegree;
            }
            if source == SourceFeed::FastTrack {
                degree_type = DegreeType::Masters;
                school = School::Engineering;
            }

            let (counted_application, admit_status, offer_accepted, offer_declined) = match source {
                SourceFeed::Main => (
                    true,
                    main_admit_status(row.field(bin_col), decision),
                    decision.trim().eq_ignore_ascii_case("admit/matric"),
                    decision.to_ascii_lowercase().contains("admit/decline"),
                ),
                SourceFeed::FastTrack => {
                    let flags = fasttrack_flags(decision);
                    (
                        flags.submitted,
                        if flags.admitted {
                            AdmitStatus::Admitted
                        } else {
                            AdmitStatus::NotAdmitted
                        },
                        flags.offer_accepted,
                        flags.offer_declined,
                    )
                }
            };

            let category = classify_application(&ClassifierInput {
                source: Some(source),
                school_raw,
                degree_interest_raw: degree_raw,
                program_raw: &program_raw,
                tag: row.field(tag_col),
                partner_exception: row.field(partner_exception_col),
                special_program: row.field(special_col),
                sponsoring_employer: row.field(employer_col),
                corporate_sponsor: row.field(corporate_sponsor_col),
            });

            ApplicantRecord {
                source,
                reporting_year: year,
                season,
                program_raw,
                program,
                school,
                degree_type,
                sponsor_company,
                category,
                counted_application,
                admit_status,
                offer_accepted,
                offer_declined,
                enrolled: enrollment.enrolled.get(row.index()).copied().unwrap_or(false),
            }
        })
        .collect();

    PopulationOutcome {
        records,
        missing_enrollment_source: enrollment.source_missing,
    }
}

fn infer_season(table: &RawTable, round_col: Option<crate::table::Column>) -> Season {
    let contains = |needle: &str| {
        table.rows().any(|row| {
            row.field(round_col)
                .to_ascii_lowercase()
                .contains(needle)
        })
    };
    if round_col.is_none() {
        return Season::Unknown;
    }
    if contains("fall") {
        Season::Fall
    } else if contains("summer") {
        Season::Summer
    } else if contains("spring") {
        Season::Spring
    } else {
        Season::Unknown
    }
}

fn main_admit_status(bin: &str, decision: &str) -> AdmitStatus {
    let bin = bin.trim().to_ascii_lowercase();
    if ADMIT_BINS.contains(&bin.as_str()) {
        return AdmitStatus::Admitted;
    }
    let decision = decision.trim().to_ascii_lowercase();
    if ADMIT_DECISION_KEYWORDS
        .iter()
        .any(|keyword| decision.contains(keyword))
    {
        return AdmitStatus::Admitted;
    }
    AdmitStatus::NotAdmitted
}

fn is_professional_certificate_program(program: &str) -> bool {
    let lower = program.to_ascii_lowercase();
    PROFESSIONAL_CERT_PROGRAMS
        .iter()
        .any(|name| lower.contains(&name.to_ascii_lowercase()))
}

/// Funnel flags decoded from a FastTrack free-text decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FastTrackFlags {
    pub submitted: bool,
    pub admitted: bool,
    pub offer_accepted: bool,
    pub offer_declined: bool,
}

/// Decode the FastTrack decision field. Values arrive as free text, often
/// dash-prefixed; only a non-blank decision counts as a submitted
/// application, and only approved decisions admit.
pub(crate) fn fasttrack_flags(raw_decision: &str) -> FastTrackFlags {
    let mut decision = raw_decision.trim().to_ascii_lowercase();
    if let Some(stripped) = decision.strip_prefix('-') {
        decision = stripped.trim().to_string();
    }

    let submitted = !decision.is_empty();
    let approved = decision.contains("fasttrack approved")
        || (decision.contains("approved") && decision.contains("fasttrack"));

    FastTrackFlags {
        submitted,
        admitted: approved,
        offer_accepted: approved && decision.contains("accept"),
        offer_declined: approved && decision.contains("decline"),
    }
}
