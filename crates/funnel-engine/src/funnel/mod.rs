use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::pipeline::domain::{AdmitStatus, ApplicantRecord};
use crate::pipeline::ApplicationsByYear;

/// Divide without surfacing division errors: a zero denominator yields 0.
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Funnel counts for one reporting year (or one group within a year).
///
/// Each stage counts the rows satisfying its own predicate; the stages are
/// not forced into a monotone funnel because real data is not monotone (a
/// row can carry an enrollment date without a parsed offer). Rates are
/// computed on read, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelMetrics {
    pub year: i32,
    pub applications: u32,
    pub admits: u32,
    pub offers_accepted: u32,
    pub enrollments: u32,
}

impl FunnelMetrics {
    pub fn empty(year: i32) -> Self {
        Self {
            year,
            ..Self::default()
        }
    }

    pub fn admit_rate(&self) -> f64 {
        safe_divide(self.admits as f64, self.applications as f64) * 100.0
    }

    pub fn offer_rate(&self) -> f64 {
        safe_divide(self.offers_accepted as f64, self.admits as f64) * 100.0
    }

    pub fn yield_rate(&self) -> f64 {
        safe_divide(self.enrollments as f64, self.admits as f64) * 100.0
    }

    pub fn overall_conversion(&self) -> f64 {
        safe_divide(self.enrollments as f64, self.applications as f64) * 100.0
    }
}

/// Reduce one year's records to funnel counts.
///
/// Every record contributes at most one unit per stage: applications count
/// the counted-application flag, admits the admit status, offers and
/// enrollments their own booleans.
pub fn compute_funnel_metrics(records: &[ApplicantRecord], year: i32) -> FunnelMetrics {
    let mut metrics = FunnelMetrics::empty(year);
    for record in records {
        if record.counted_application {
            metrics.applications += 1;
        }
        if record.admit_status == AdmitStatus::Admitted {
            metrics.admits += 1;
        }
        if record.offer_accepted {
            metrics.offers_accepted += 1;
        }
        if record.enrolled {
            metrics.enrollments += 1;
        }
    }
    metrics
}

/// Year-over-year comparison between two funnel snapshots.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct YoyComparison {
    pub current: FunnelMetrics,
    pub previous: FunnelMetrics,
}

impl YoyComparison {
    pub fn new(current: FunnelMetrics, previous: FunnelMetrics) -> Self {
        Self { current, previous }
    }

    pub fn applications_change(&self) -> f64 {
        percent_change(self.current.applications, self.previous.applications)
    }

    pub fn admits_change(&self) -> f64 {
        percent_change(self.current.admits, self.previous.admits)
    }

    pub fn enrollments_change(&self) -> f64 {
        percent_change(self.current.enrollments, self.previous.enrollments)
    }
}

fn percent_change(current: u32, previous: u32) -> f64 {
    safe_divide(current as f64 - previous as f64, previous as f64) * 100.0
}

/// Canonical grouping fields for funnel breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownField {
    Category,
    School,
    DegreeType,
}

impl BreakdownField {
    fn value_of(self, record: &ApplicantRecord) -> &'static str {
        match self {
            BreakdownField::Category => record.category.label(),
            BreakdownField::School => record.school.label(),
            BreakdownField::DegreeType => record.degree_type.label(),
        }
    }
}

/// Group value -> year -> metrics.
pub type Breakdown = BTreeMap<String, BTreeMap<i32, FunnelMetrics>>;

/// Group every year's records by a canonical field and aggregate each group.
///
/// The key set is the union across all years, so a group present in only
/// one year still appears with zero metrics in the others and
/// year-over-year tables never hit missing keys. Blank values are
/// unclassifiable rows, not a group, and are skipped.
pub fn compute_breakdown_by_field(
    applications: &ApplicationsByYear,
    field: BreakdownField,
) -> Breakdown {
    let mut values: BTreeSet<&str> = BTreeSet::new();
    for records in applications.years.values() {
        for record in records {
            let value = field.value_of(record);
            if !value.is_empty() {
                values.insert(value);
            }
        }
    }

    let mut breakdown = Breakdown::new();
    for value in values {
        let mut per_year = BTreeMap::new();
        for (&year, records) in &applications.years {
            let group: Vec<ApplicantRecord> = records
                .iter()
                .filter(|record| field.value_of(record) == value)
                .cloned()
                .collect();
            per_year.insert(year, compute_funnel_metrics(&group, year));
        }
        breakdown.insert(value.to_string(), per_year);
    }
    breakdown
}

/// One stage row for funnel-shaped consumers (charts, exports).
#[derive(Debug, Clone, Serialize)]
pub struct FunnelStage {
    pub stage: &'static str,
    pub value: u32,
}

pub fn funnel_stages(metrics: &FunnelMetrics) -> Vec<FunnelStage> {
    vec![
        FunnelStage {
            stage: "Applications",
            value: metrics.applications,
        },
        FunnelStage {
            stage: "Admits",
            value: metrics.admits,
        },
        FunnelStage {
            stage: "Offers Accepted",
            value: metrics.offers_accepted,
        },
        FunnelStage {
            stage: "Enrollments",
            value: metrics.enrollments,
        },
    ]
}

/// Per-program funnel stats for the current and previous year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramStats {
    pub program: String,
    pub school: String,
    pub degree_type: String,
    pub applications: u32,
    pub admits: u32,
    pub enrollments: u32,
    pub previous_applications: u32,
    pub previous_admits: u32,
    pub previous_enrollments: u32,
}

impl ProgramStats {
    pub fn admit_rate(&self) -> f64 {
        safe_divide(self.admits as f64, self.applications as f64) * 100.0
    }

    pub fn yield_rate(&self) -> f64 {
        safe_divide(self.enrollments as f64, self.admits as f64) * 100.0
    }

    pub fn applications_change(&self) -> f64 {
        percent_change(self.applications, self.previous_applications)
    }
}

/// Per-program roll-up, attributed to each program's most frequent school
/// and degree, sorted by current-year applications. Rows with no program
/// name are unclassifiable and excluded.
pub fn compute_program_stats(
    current: &[ApplicantRecord],
    previous: &[ApplicantRecord],
) -> Vec<ProgramStats> {
    let mut programs: BTreeSet<&str> = current
        .iter()
        .map(|record| record.program.as_str())
        .filter(|program| !program.is_empty())
        .collect();
    programs.extend(
        previous
            .iter()
            .map(|record| record.program.as_str())
            .filter(|program| !program.is_empty()),
    );

    let mut stats: Vec<ProgramStats> = programs
        .into_iter()
        .map(|program| {
            let rows: Vec<&ApplicantRecord> = current
                .iter()
                .filter(|record| record.program == program)
                .collect();
            let prev_rows: Vec<&ApplicantRecord> = previous
                .iter()
                .filter(|record| record.program == program)
                .collect();

            ProgramStats {
                program: program.to_string(),
                school: most_frequent(rows.iter().map(|r| r.school.label())),
                degree_type: most_frequent(rows.iter().map(|r| r.degree_type.label())),
                applications: rows.iter().filter(|r| r.counted_application).count() as u32,
                admits: rows
                    .iter()
                    .filter(|r| r.admit_status == AdmitStatus::Admitted)
                    .count() as u32,
                enrollments: rows.iter().filter(|r| r.enrolled).count() as u32,
                previous_applications: prev_rows
                    .iter()
                    .filter(|r| r.counted_application)
                    .count() as u32,
                previous_admits: prev_rows
                    .iter()
                    .filter(|r| r.admit_status == AdmitStatus::Admitted)
                    .count() as u32,
                previous_enrollments: prev_rows.iter().filter(|r| r.enrolled).count() as u32,
            }
        })
        .collect();

    stats.sort_by(|a, b| b.applications.cmp(&a.applications).then(a.program.cmp(&b.program)));
    stats
}

fn most_frequent<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        if !value.is_empty() {
            *counts.entry(value).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(value, _)| value.to_string())
        .unwrap_or_default()
}

/// Funnel counts per canonical sponsoring company, pipeline data only,
/// sorted by enrollments. Rows without a sponsor are excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyStats {
    pub company: String,
    pub applications: u32,
    pub admits: u32,
    pub enrollments: u32,
}

pub fn compute_corporate_stats(records: &[ApplicantRecord]) -> Vec<CompanyStats> {
    let mut by_company: BTreeMap<&str, CompanyStats> = BTreeMap::new();
    for record in records {
        if record.sponsor_company.is_empty() {
            continue;
        }
        let entry = by_company
            .entry(record.sponsor_company.as_str())
            .or_insert_with(|| CompanyStats {
                company: record.sponsor_company.clone(),
                applications: 0,
                admits: 0,
                enrollments: 0,
            });
        if record.counted_application {
            entry.applications += 1;
        }
        if record.admit_status == AdmitStatus::Admitted {
            entry.admits += 1;
        }
        if record.enrolled {
            entry.enrollments += 1;
        }
    }

    let mut stats: Vec<CompanyStats> = by_company.into_values().collect();
    stats.sort_by(|a, b| b.enrollments.cmp(&a.enrollments).then(a.company.cmp(&b.company)));
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::domain::{Category, DegreeType, School, Season, SourceFeed};

    fn record(year: i32) -> ApplicantRecord {
        ApplicantRecord {
            source: SourceFeed::Main,
            reporting_year: year,
            season: Season::Fall,
            program_raw: "Data Science".to_string(),
            program: "Data Science".to_string(),
            school: School::Business,
            degree_type: DegreeType::Masters,
            sponsor_company: String::new(),
            category: Category::Retail,
            counted_application: true,
            admit_status: AdmitStatus::NotAdmitted,
            offer_accepted: false,
            offer_declined: false,
            enrolled: false,
        }
    }

    #[test]
    fn safe_divide_guards_zero_denominator() {
        assert_eq!(safe_divide(10.0, 0.0), 0.0);
        assert_eq!(safe_divide(0.0, 0.0), 0.0);
        assert_eq!(safe_divide(10.0, 4.0), 2.5);
    }

    #[test]
    fn stages_count_their_own_predicates_independently() {
        // Enrolled without an accepted offer: no implicit funneling.
        let mut enrolled_only = record(2026);
        enrolled_only.enrolled = true;

        let mut admitted = record(2026);
        admitted.admit_status = AdmitStatus::Admitted;

        let mut uncounted = record(2026);
        uncounted.counted_application = false;

        let metrics = compute_funnel_metrics(&[enrolled_only, admitted, uncounted], 2026);
        assert_eq!(metrics.applications, 2);
        assert_eq!(metrics.admits, 1);
        assert_eq!(metrics.offers_accepted, 0);
        assert_eq!(metrics.enrollments, 1);
    }

    #[test]
    fn rates_are_computed_on_read_with_zero_guard() {
        let metrics = FunnelMetrics::empty(2026);
        assert_eq!(metrics.admit_rate(), 0.0);
        assert_eq!(metrics.yield_rate(), 0.0);

        let metrics = FunnelMetrics {
            year: 2026,
            applications: 200,
            admits: 50,
            offers_accepted: 30,
            enrollments: 25,
        };
        assert_eq!(metrics.admit_rate(), 25.0);
        assert_eq!(metrics.offer_rate(), 60.0);
        assert_eq!(metrics.yield_rate(), 50.0);
        assert_eq!(metrics.overall_conversion(), 12.5);
    }

    #[test]
    fn yoy_change_is_safe_on_zero_previous() {
        let comparison = YoyComparison::new(
            FunnelMetrics {
                year: 2026,
                applications: 120,
                ..FunnelMetrics::empty(2026)
            },
            FunnelMetrics::empty(2025),
        );
        assert_eq!(comparison.applications_change(), 0.0);

        let comparison = YoyComparison::new(
            FunnelMetrics {
                year: 2026,
                applications: 120,
                ..FunnelMetrics::empty(2026)
            },
            FunnelMetrics {
                year: 2025,
                applications: 100,
                ..FunnelMetrics::empty(2025)
            },
        );
        assert!((comparison.applications_change() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn breakdown_unions_keys_across_years() {
        let mut partner_2025 = record(2025);
        partner_2025.category = Category::PartnerOnline;

        let mut applications = ApplicationsByYear::default();
        applications.years.insert(2025, vec![partner_2025]);
        applications.years.insert(2026, vec![record(2026)]);

        let breakdown = compute_breakdown_by_field(&applications, BreakdownField::Category);
        let partner = breakdown.get("Partner Online").expect("key present");
        assert_eq!(partner.get(&2025).expect("2025 metrics").applications, 1);
        // Present in 2026 too, with zero metrics.
        assert_eq!(partner.get(&2026).expect("2026 metrics").applications, 0);
    }

    #[test]
    fn funnel_stage_rows_follow_pipeline_order() {
        let stages = funnel_stages(&FunnelMetrics {
            year: 2026,
            applications: 4,
            admits: 3,
            offers_accepted: 2,
            enrollments: 1,
        });
        let labels: Vec<&str> = stages.iter().map(|s| s.stage).collect();
        assert_eq!(
            labels,
            vec!["Applications", "Admits", "Offers Accepted", "Enrollments"]
        );
        assert_eq!(stages[3].value, 1);
    }

    #[test]
    fn program_stats_exclude_blank_programs_and_sort_by_applications() {
        let mut popular = record(2026);
        popular.program = "Machine Learning".to_string();
        let mut blank = record(2026);
        blank.program = String::new();

        let stats = compute_program_stats(
            &[popular.clone(), popular.clone(), record(2026), blank],
            &[record(2025)],
        );
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].program, "Machine Learning");
        assert_eq!(stats[0].applications, 2);
        assert_eq!(stats[1].program, "Data Science");
        assert_eq!(stats[1].previous_applications, 1);
    }

    #[test]
    fn corporate_stats_group_by_canonical_sponsor() {
        let mut boeing = record(2026);
        boeing.sponsor_company = "Boeing".to_string();
        boeing.enrolled = true;
        let mut boeing_admit = boeing.clone();
        boeing_admit.enrolled = false;
        boeing_admit.admit_status = AdmitStatus::Admitted;

        let stats = compute_corporate_stats(&[boeing, boeing_admit, record(2026)]);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].company, "Boeing");
        assert_eq!(stats[0].applications, 2);
        assert_eq!(stats[0].admits, 1);
        assert_eq!(stats[0].enrollments, 1);
    }
}
