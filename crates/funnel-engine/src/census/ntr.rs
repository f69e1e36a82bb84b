use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::categorize::{categorize_census_record, derive_student_type};
use super::domain::{CensusRecord, StudentType};
use super::rates::{RateKey, RateTable};
use crate::funnel::safe_divide;
use crate::pipeline::domain::{Category, DegreeType};
use crate::pipeline::standardize::is_continuing_ed_program;

/// Categories that carry modeled revenue; `Uncategorized` is deliberately
/// absent so uncounted rows surface in reporting instead of billing at a
/// zero rate.
const BILLABLE_CATEGORIES: &[Category] = &[
    Category::PartnerOnline,
    Category::Lighthouse,
    Category::Corporate,
    Category::Retail,
    Category::ContinuingEducation,
    Category::FastTrack,
];

const BILLABLE_DEGREES: &[DegreeType] = &[
    DegreeType::Masters,
    DegreeType::GraduateCertificate,
    DegreeType::ProfessionalGraduateCertificate,
    DegreeType::NonDegree,
];

/// Overall net tuition revenue position against the configured goal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NtrSummary {
    pub total_ntr: f64,
    pub goal: f64,
    pub percent_of_goal: f64,
    pub gap_to_goal: f64,
    pub total_students: u32,
    pub total_credits: f64,
    pub new_students: u32,
    pub current_students: u32,
    pub new_credits: f64,
    pub current_credits: f64,
    pub new_ntr: f64,
    pub current_ntr: f64,
}

/// Revenue detail for one (category, degree) segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentNtr {
    pub category: Category,
    pub category_label: &'static str,
    pub degree_type: DegreeType,
    pub degree_label: &'static str,
    pub new_students: u32,
    pub current_students: u32,
    pub total_students: u32,
    pub new_credits: f64,
    pub current_credits: f64,
    pub total_credits: f64,
    pub rate_new: f64,
    pub rate_current: f64,
    pub ntr_new: f64,
    pub ntr_current: f64,
    pub total_ntr: f64,
}

/// Per-program revenue roll-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramNtr {
    pub program: String,
    pub students: u32,
    pub credits: f64,
    pub ntr: f64,
}

/// Full revenue report: summary, per-segment breakdown, and the rate-table
/// coverage gaps observed while computing it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NtrReport {
    pub summary: NtrSummary,
    pub segments: Vec<SegmentNtr>,
    /// (category, degree, student-type) triples observed in the census but
    /// absent from the rate table. Each contributed exactly zero revenue;
    /// callers should raise these as data-quality alerts.
    pub missing_rates: Vec<RateKey>,
}

#[derive(Default)]
struct SegmentAccumulator {
    new_ids: HashSet<String>,
    current_ids: HashSet<String>,
    new_credits: f64,
    current_credits: f64,
}

/// Compute net tuition revenue for the census population.
///
/// Rows are grouped by (category, degree, student type); student counts are
/// unique-id counts while credits sum over rows, since the snapshot splits
/// a student's credits across repeated rows. Revenue is credits times the
/// segment rate, summed over segments.
pub fn calculate_ntr(records: &[CensusRecord], rates: &RateTable, goal: f64) -> NtrReport {
    let mut segments: BTreeMap<(Category, DegreeType), SegmentAccumulator> = BTreeMap::new();
    let mut missing: BTreeSet<RateKey> = BTreeSet::new();

    for record in records {
        let category = categorize_census_record(record);
        if !BILLABLE_CATEGORIES.contains(&category) {
            continue;
        }
        if !BILLABLE_DEGREES.contains(&record.degree_type) {
            continue;
        }
        let Some(student_type) = derive_student_type(record) else {
            continue;
        };

        let entry = segments.entry((category, record.degree_type)).or_default();
        match student_type {
            StudentType::New => {
                entry.new_ids.insert(record.student_id.clone());
                entry.new_credits += record.credits;
            }
            StudentType::Current => {
                entry.current_ids.insert(record.student_id.clone());
                entry.current_credits += record.credits;
            }
        }
    }

    let mut report = NtrReport {
        summary: NtrSummary {
            goal,
            ..NtrSummary::default()
        },
        ..NtrReport::default()
    };

    for ((category, degree_type), accumulator) in segments {
        let new_key = RateKey {
            category,
            degree_type,
            student_type: StudentType::New,
        };
        let current_key = RateKey {
            category,
            degree_type,
            student_type: StudentType::Current,
        };

        if !accumulator.new_ids.is_empty() && rates.lookup(&new_key).is_none() {
            missing.insert(new_key);
        }
        if !accumulator.current_ids.is_empty() && rates.lookup(&current_key).is_none() {
            missing.insert(current_key);
        }

        let rate_new = rates.rate(&new_key);
        let rate_current = rates.rate(&current_key);
        let ntr_new = accumulator.new_credits * rate_new;
        let ntr_current = accumulator.current_credits * rate_current;

        let segment = SegmentNtr {
            category,
            category_label: category.label(),
            degree_type,
            degree_label: degree_type.label(),
            new_students: accumulator.new_ids.len() as u32,
            current_students: accumulator.current_ids.len() as u32,
            total_students: (accumulator.new_ids.len() + accumulator.current_ids.len()) as u32,
            new_credits: accumulator.new_credits,
            current_credits: accumulator.current_credits,
            total_credits: accumulator.new_credits + accumulator.current_credits,
            rate_new,
            rate_current,
            ntr_new,
            ntr_current,
            total_ntr: ntr_new + ntr_current,
        };

        report.summary.total_ntr += segment.total_ntr;
        report.summary.total_students += segment.total_students;
        report.summary.total_credits += segment.total_credits;
        report.summary.new_students += segment.new_students;
        report.summary.current_students += segment.current_students;
        report.summary.new_credits += segment.new_credits;
        report.summary.current_credits += segment.current_credits;
        report.summary.new_ntr += segment.ntr_new;
        report.summary.current_ntr += segment.ntr_current;
        report.segments.push(segment);
    }

    report.summary.percent_of_goal = safe_divide(report.summary.total_ntr, goal) * 100.0;
    report.summary.gap_to_goal = goal - report.summary.total_ntr;
    report.missing_rates = missing.into_iter().collect();

    for key in &report.missing_rates {
        warn!(
            category = key.category.label(),
            degree = key.degree_type.label(),
            student_type = key.student_type.label(),
            "census segment has no published rate; it contributed zero revenue"
        );
    }

    report
}

/// Per-program revenue, rated row by row.
///
/// Continuing-education programs certify at the professional-certificate
/// rate even when the census reports the generic certificate degree, so the
/// degree substitution is applied before the lookup for that category.
pub fn calculate_ntr_by_program(records: &[CensusRecord], rates: &RateTable) -> Vec<ProgramNtr> {
    struct ProgramAccumulator {
        ids: HashSet<String>,
        credits: f64,
        ntr: f64,
    }

    let mut programs: BTreeMap<String, ProgramAccumulator> = BTreeMap::new();

    for record in records {
        if record.program.trim().is_empty() {
            continue;
        }
        let category = categorize_census_record(record);
        if !BILLABLE_CATEGORIES.contains(&category) {
            continue;
        }
        let Some(student_type) = derive_student_type(record) else {
            continue;
        };

        let mut degree_type = record.degree_type;
        if category == Category::ContinuingEducation
            && degree_type == DegreeType::GraduateCertificate
            && is_continuing_ed_program(&record.program)
        {
            degree_type = DegreeType::ProfessionalGraduateCertificate;
        }

        let rate = rates.rate(&RateKey {
            category,
            degree_type,
            student_type,
        });

        let entry = programs
            .entry(record.program.clone())
            .or_insert_with(|| ProgramAccumulator {
                ids: HashSet::new(),
                credits: 0.0,
                ntr: 0.0,
            });
        entry.ids.insert(record.student_id.clone());
        entry.credits += record.credits;
        entry.ntr += record.credits * rate;
    }

    let mut rows: Vec<ProgramNtr> = programs
        .into_iter()
        .map(|(program, accumulator)| ProgramNtr {
            program,
            students: accumulator.ids.len() as u32,
            credits: accumulator.credits,
            ntr: accumulator.ntr,
        })
        .collect();
    rows.sort_by(|a, b| b.ntr.partial_cmp(&a.ntr).unwrap_or(std::cmp::Ordering::Equal));
    rows
}
