use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::{snapshot_key, SnapshotCache};
use crate::census::{
    calculate_ntr, calculate_ntr_by_program, category_headcounts, parse_census, NtrReport,
    ProgramNtr, RateKey, RateTable,
};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::funnel::{
    compute_breakdown_by_field, compute_corporate_stats, compute_funnel_metrics,
    compute_program_stats, funnel_stages, Breakdown, BreakdownField, CompanyStats, FunnelMetrics,
    FunnelStage, ProgramStats, YoyComparison,
};
use crate::pipeline::{load_applications, reporting_window};
use crate::reconcile::{build_enrollment_breakdown, EnrollmentBreakdown};
use crate::table::RawTable;

/// Census headcounts carried on the snapshot for reporting surfaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CensusCounts {
    pub total_students: u32,
    pub new_students: u32,
    pub continuing_students: u32,
    pub returning_students: u32,
    pub by_category: BTreeMap<String, u32>,
}

/// Data-quality signals that must stay visible alongside the numbers they
/// would otherwise silently distort.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataQualityReport {
    /// Populations whose feed carried no enrollment-status field; their
    /// enrollment counts are zero by construction, not by observation.
    pub missing_enrollment_sources: Vec<String>,
    /// Census segments that billed at a zero rate because the rate table
    /// has no entry for them.
    pub missing_rates: Vec<RateKey>,
}

impl DataQualityReport {
    pub fn is_clean(&self) -> bool {
        self.missing_enrollment_sources.is_empty() && self.missing_rates.is_empty()
    }
}

/// Everything the presentation, export, and assistant surfaces read:
/// plain data, no behavior beyond derived-rate accessors.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSnapshot {
    pub generated_at: DateTime<Utc>,
    pub current_year: i32,
    pub funnels: BTreeMap<i32, FunnelMetrics>,
    pub current_vs_previous: YoyComparison,
    pub previous_vs_two_years: YoyComparison,
    pub by_category: Breakdown,
    pub by_school: Breakdown,
    pub by_degree: Breakdown,
    pub current_funnel_stages: Vec<FunnelStage>,
    pub program_stats: Vec<ProgramStats>,
    pub corporate_stats: Vec<CompanyStats>,
    pub census: CensusCounts,
    pub enrollment: EnrollmentBreakdown,
    pub ntr: NtrReport,
    pub ntr_by_program: Vec<ProgramNtr>,
    pub data_quality: DataQualityReport,
}

/// A resolved snapshot plus whether it was served from the cache.
pub struct SnapshotOutcome {
    pub snapshot: Arc<AnalyticsSnapshot>,
    pub cache_hit: bool,
}

/// Owns the pipeline configuration, the rate table, and the snapshot cache.
///
/// Every computation runs over an immutable copy of the raw inputs; the
/// feeds stay the system of record and a fresh call recomputes everything.
pub struct AnalyticsEngine {
    config: EngineConfig,
    rates: RateTable,
    cache: SnapshotCache<AnalyticsSnapshot>,
}

impl AnalyticsEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_rates(config, RateTable::standard())
    }

    pub fn with_rates(config: EngineConfig, rates: RateTable) -> Self {
        let cache = SnapshotCache::new(config.cache_ttl);
        Self {
            config,
            rates,
            cache,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Resolve a snapshot through the cache. `force_refresh` always
    /// recomputes and overwrites the cached entry.
    pub fn snapshot(
        &self,
        applications_csv: &[u8],
        census_csv: &[u8],
        force_refresh: bool,
    ) -> Result<SnapshotOutcome, EngineError> {
        let key = snapshot_key(&[applications_csv, census_csv]);

        if !force_refresh {
            if let Some(snapshot) = self.cache.fetch(key) {
                return Ok(SnapshotOutcome {
                    snapshot,
                    cache_hit: true,
                });
            }
        }

        let snapshot = Arc::new(self.compute(applications_csv, census_csv)?);
        self.cache.store(key, Arc::clone(&snapshot));
        Ok(SnapshotOutcome {
            snapshot,
            cache_hit: false,
        })
    }

    /// Run the full pipeline, bypassing the cache entirely.
    pub fn compute(
        &self,
        applications_csv: &[u8],
        census_csv: &[u8],
    ) -> Result<AnalyticsSnapshot, EngineError> {
        let applications_table = read_table(applications_csv)?;
        let census_table = read_table(census_csv)?;

        let current_year = self.config.current_year;
        let window = reporting_window(current_year);

        let applications = load_applications(&applications_table, current_year);
        let census = parse_census(&census_table, &self.config.census_term);

        let funnels: BTreeMap<i32, FunnelMetrics> = window
            .iter()
            .map(|&year| (year, compute_funnel_metrics(applications.records(year), year)))
            .collect();
        let metric = |year: i32| {
            funnels
                .get(&year)
                .copied()
                .unwrap_or_else(|| FunnelMetrics::empty(year))
        };

        let current = metric(current_year);
        let ntr = calculate_ntr(&census.records, &self.rates, self.config.ntr_goal);

        let data_quality = DataQualityReport {
            missing_enrollment_sources: applications.missing_enrollment_sources.clone(),
            missing_rates: ntr.missing_rates.clone(),
        };
        for population in &data_quality.missing_enrollment_sources {
            warn!(
                %population,
                "population has no enrollment-status source; its enrollment count is zero"
            );
        }

        let snapshot = AnalyticsSnapshot {
            generated_at: Utc::now(),
            current_year,
            current_vs_previous: YoyComparison::new(current, metric(current_year - 1)),
            previous_vs_two_years: YoyComparison::new(
                metric(current_year - 1),
                metric(current_year - 2),
            ),
            by_category: compute_breakdown_by_field(&applications, BreakdownField::Category),
            by_school: compute_breakdown_by_field(&applications, BreakdownField::School),
            by_degree: compute_breakdown_by_field(&applications, BreakdownField::DegreeType),
            current_funnel_stages: funnel_stages(&current),
            program_stats: compute_program_stats(
                applications.records(current_year),
                applications.records(current_year - 1),
            ),
            corporate_stats: compute_corporate_stats(applications.records(current_year)),
            census: CensusCounts {
                total_students: census.total_students,
                new_students: census.new_students,
                continuing_students: census.continuing_students,
                returning_students: census.returning_students,
                by_category: category_headcounts(&census.records)
                    .into_iter()
                    .map(|(label, count)| (label.to_string(), count))
                    .collect(),
            },
            enrollment: build_enrollment_breakdown(&current, &census),
            ntr_by_program: calculate_ntr_by_program(&census.records, &self.rates),
            ntr,
            funnels,
            data_quality,
        };

        info!(
            year = current_year,
            applications = current.applications,
            enrollments = current.enrollments,
            total_ntr = snapshot.ntr.summary.total_ntr,
            "computed analytics snapshot"
        );

        Ok(snapshot)
    }
}

fn read_table(csv: &[u8]) -> Result<RawTable, EngineError> {
    if csv.is_empty() {
        return Ok(RawTable::default());
    }
    Ok(RawTable::from_reader(csv)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> AnalyticsEngine {
        AnalyticsEngine::new(EngineConfig::default())
    }

    const APPS_CSV: &str = "\
Round,Program,School Applied For,Degree Of Interest,Bin,Decision,App Tags,Date of Enrollment
2026 Spring Graduate,Data Science,SOB,MS,Admit,Admit/Matric,Corporate,2026-01-10
2026 Spring Graduate,Data Science,SOB,MS,,,Partner,
2025 Spring Graduate,Data Science,SOB,MS,Admit,,Partner,2025-01-15
";

    const CENSUS_CSV: &str = "\
Semester,Student Id,Student Location Detailed,Degree Type,Corporate Student,Corporate Cohort,Lighthouse Flag,Student Status,Total Credit Hours,Enrolled Previous Summer As New,Primary Program Of Study,School
2026S,C1,Online,Masters,Non-Corporate,,0,Continuing,6,0,Data Science,SOB
2026S,C2,Online,Masters,Non-Corporate,,0,Returning,3,0,Data Science,SOB
2026S,C3,Online,Masters,Non-Corporate,,0,New,6,0,Data Science,SOB
";

    #[test]
    fn empty_inputs_produce_all_zero_metrics() {
        let outcome = engine().snapshot(b"", b"", false).expect("snapshot builds");
        let snapshot = outcome.snapshot;
        assert_eq!(snapshot.funnels.len(), 3);
        assert!(snapshot
            .funnels
            .values()
            .all(|metrics| metrics.applications == 0));
        assert_eq!(snapshot.enrollment.total(), 0);
        assert_eq!(snapshot.ntr.summary.total_ntr, 0.0);
        assert!(snapshot.data_quality.is_clean());
    }

    #[test]
    fn snapshot_wires_funnel_census_and_reconciliation_together() {
        let outcome = engine()
            .snapshot(APPS_CSV.as_bytes(), CENSUS_CSV.as_bytes(), false)
            .expect("snapshot builds");
        let snapshot = outcome.snapshot;

        let current = snapshot.funnels.get(&2026).expect("current year");
        assert_eq!(current.applications, 2);
        assert_eq!(current.admits, 1);
        assert_eq!(current.enrollments, 1);

        // New comes from the pipeline; continuing/returning from census.
        assert_eq!(snapshot.enrollment.new_from_pipeline, 1);
        assert_eq!(snapshot.enrollment.census_new, 1);
        assert_eq!(snapshot.enrollment.continuing, 1);
        assert_eq!(snapshot.enrollment.returning, 1);
        assert_eq!(snapshot.enrollment.total(), 3);

        assert!(snapshot.ntr.summary.total_ntr > 0.0);
        assert_eq!(snapshot.census.total_students, 3);
        assert!(!outcome.cache_hit);
    }

    #[test]
    fn repeated_reads_hit_the_cache_and_force_refresh_bypasses_it() {
        let engine = engine();
        let first = engine
            .snapshot(APPS_CSV.as_bytes(), CENSUS_CSV.as_bytes(), false)
            .expect("first snapshot");
        assert!(!first.cache_hit);

        let second = engine
            .snapshot(APPS_CSV.as_bytes(), CENSUS_CSV.as_bytes(), false)
            .expect("second snapshot");
        assert!(second.cache_hit);
        assert_eq!(
            first.snapshot.generated_at,
            second.snapshot.generated_at
        );

        let forced = engine
            .snapshot(APPS_CSV.as_bytes(), CENSUS_CSV.as_bytes(), true)
            .expect("forced snapshot");
        assert!(!forced.cache_hit);
    }

    #[test]
    fn different_inputs_never_share_a_cache_entry() {
        let engine = engine();
        engine
            .snapshot(APPS_CSV.as_bytes(), CENSUS_CSV.as_bytes(), false)
            .expect("first snapshot");
        let other = engine
            .snapshot(APPS_CSV.as_bytes(), b"", false)
            .expect("other snapshot");
        assert!(!other.cache_hit);
        assert_eq!(other.snapshot.census.total_students, 0);
    }

    #[test]
    fn data_quality_flags_surface_in_the_snapshot() {
        let apps_without_enrollment = "\
Round,Program,School Applied For,Degree Of Interest,App Tags
2026 Spring Graduate,Data Science,SOB,MS,Referral
";
        let outcome = engine()
            .snapshot(apps_without_enrollment.as_bytes(), b"", false)
            .expect("snapshot builds");
        assert_eq!(
            outcome.snapshot.data_quality.missing_enrollment_sources,
            vec!["Main 2026"]
        );
        assert!(!outcome.snapshot.data_quality.is_clean());
    }
}
