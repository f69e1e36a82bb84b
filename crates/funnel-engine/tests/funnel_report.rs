//! End-to-end specifications for the reconciliation pipeline: raw CSV
//! exports in, one coherent snapshot out. Scenarios exercise the public
//! engine facade the way the service does, without reaching into private
//! modules.

use funnel_engine::config::EngineConfig;
use funnel_engine::AnalyticsEngine;

fn engine() -> AnalyticsEngine {
    AnalyticsEngine::new(EngineConfig::default())
}

const APPLICATIONS_CSV: &str = "\
Round,Program,School Applied For,Degree Of Interest,Bin,Decision,App Tags,Partner Exception,Special Program,Sponsoring Employer,Date of Enrollment
2026 Spring Graduate,Data Science (Online),SOB,MS,Admit,Admit/Matric,Corporate,,,boeing,2026-01-10
2026 Spring Graduate,Data Science (Online),SOB,MS,,,Partner,,,,
2026 Spring Graduate,Machine Learning,SOE,MS,Admit,Admit/Decline,Partner,Exclude,,,
2026 Spring Graduate,Applied Data Analytics,PCE,Graduate Certificate,,Admit/Matric,,,,,2026-01-20
2026 Spring Graduate,Quantum Engineering,SOE,MS,,,EDD Partner,,,,
2025 Spring Graduate,Data Science (Online),SOB,MS,Admit,Admit/Matric,Corporate,,,,2025-02-01
2025 Spring Graduate,Systems Engineering,SOE,MS,,,Partner,,,,
2024 Spring Graduate,Data Science (Online),SOB,MS,,,,,,,
FastTrack,Analytics Foundations,,,,FastTrack Approved,,,,,
FastTrack,Analytics Foundations,,,,- FastTrack Approved / Accepted,,,,,
FastTrack,Analytics Foundations,,,,,,,,,
";

const CENSUS_CSV: &str = "\
Semester,Student Id,Student Location Detailed,Degree Type,Corporate Student,Corporate Cohort,Lighthouse Flag,Student Status,Total Credit Hours,Enrolled Previous Summer As New,Primary Program Of Study,School
2026S,C1,Online,Masters,Non-Corporate,,0,Continuing,6,0,Data Science,SOB
2026S,C1,Online,Masters,Non-Corporate,,0,Continuing,3,0,Data Science,SOB
2026S,C2,Online,Masters,Corporate,Boeing 2026,0,Continuing,6,0,Machine Learning,SOE
2026S,C3,Online Partner,Masters,Non-Corporate,,0,Returning,6,0,Data Science,SOB
2026S,C4,Online,Masters,Non-Corporate,,1,New,6,0,Data Science,SOB
2026S,C5,Online,Masters,Non-Corporate,,0,New,6,1,Data Science,SOB
2026S,C6,Online,Non-Degree,Non-Corporate,,0,New,3,0,Analytics Foundations,SOE
2025F,C7,Online,Masters,Non-Corporate,,0,Continuing,6,0,Data Science,SOB
2026S,C8,On Campus,Masters,Non-Corporate,,0,Continuing,6,0,Data Science,SOB
";

#[test]
fn snapshot_reconciles_both_feeds_without_double_counting() {
    let outcome = engine()
        .snapshot(APPLICATIONS_CSV.as_bytes(), CENSUS_CSV.as_bytes(), false)
        .expect("snapshot builds");
    let snapshot = outcome.snapshot;

    // Main 2026 has five rows; the FastTrack feed adds the two with a
    // recorded decision and drops the blank one.
    let current = snapshot.funnels.get(&2026).expect("current year metrics");
    assert_eq!(current.applications, 7);
    // Admits: two Main rows with an admit bin, the certificate row's
    // Admit/Matric decision, and the two approved FastTrack rows.
    assert_eq!(current.admits, 5);
    assert_eq!(current.enrollments, 2);

    // Census continuing/returning are unique students; the duplicate C1
    // rows collapse. Census new (C4, C5, C6) stays out of the total.
    assert_eq!(snapshot.enrollment.new_from_pipeline, 2);
    assert_eq!(snapshot.enrollment.continuing, 2);
    assert_eq!(snapshot.enrollment.returning, 1);
    assert_eq!(snapshot.enrollment.census_new, 3);
    assert_eq!(snapshot.enrollment.total(), 5);
}

#[test]
fn category_breakdown_spans_all_three_years() {
    let outcome = engine()
        .snapshot(APPLICATIONS_CSV.as_bytes(), CENSUS_CSV.as_bytes(), false)
        .expect("snapshot builds");
    let snapshot = outcome.snapshot;

    // Partner Online only exists in 2025/2026, but every key carries all
    // three years so year-over-year tables never miss a cell.
    let partner = snapshot
        .by_category
        .get("Partner Online")
        .expect("partner channel present");
    assert_eq!(partner.len(), 3);
    assert_eq!(partner.get(&2026).expect("2026 cell").applications, 1);
    assert_eq!(partner.get(&2024).expect("2024 cell").applications, 0);

    // The 2024 retail row keeps its key alive in 2026 as well.
    let retail = snapshot.by_category.get("Retail").expect("retail present");
    assert_eq!(retail.get(&2024).expect("2024 cell").applications, 1);
}

#[test]
fn revenue_reflects_category_and_student_type_rates() {
    let outcome = engine()
        .snapshot(APPLICATIONS_CSV.as_bytes(), CENSUS_CSV.as_bytes(), false)
        .expect("snapshot builds");
    let snapshot = outcome.snapshot;
    let summary = &snapshot.ntr.summary;

    // C1 retail current 9cr * 1710; C2 corporate current 6cr * 1540;
    // C3 partner current 6cr * 1615; C4 lighthouse new 6cr * 320;
    // C5 retail current (prior-summer look-back) 6cr * 1710;
    // C6 fasttrack new 3cr * 850.
    let expected = 9.0 * 1710.0
        + 6.0 * 1540.0
        + 6.0 * 1615.0
        + 6.0 * 320.0
        + 6.0 * 1710.0
        + 3.0 * 850.0;
    assert!((summary.total_ntr - expected).abs() < 1e-6);

    // The look-back keeps C5 out of the new-student pool.
    assert_eq!(summary.new_students, 2);
    assert_eq!(summary.current_students, 4);
    assert!(snapshot.ntr.missing_rates.is_empty());
}

#[test]
fn corporate_sponsors_roll_up_under_canonical_names() {
    let outcome = engine()
        .snapshot(APPLICATIONS_CSV.as_bytes(), CENSUS_CSV.as_bytes(), false)
        .expect("snapshot builds");
    let snapshot = outcome.snapshot;

    let boeing = snapshot
        .corporate_stats
        .iter()
        .find(|stats| stats.company == "Boeing")
        .expect("sponsored rows grouped under the canonical name");
    assert_eq!(boeing.applications, 1);
    assert_eq!(boeing.enrollments, 1);
}

#[test]
fn missing_enrollment_column_is_a_visible_signal_not_an_error() {
    let csv = "\
Round,Program,School Applied For,Degree Of Interest,App Tags
2026 Spring Graduate,Data Science,SOB,MS,Referral
2025 Spring Graduate,Data Science,SOB,MS,Referral
";
    let outcome = engine()
        .snapshot(csv.as_bytes(), b"", false)
        .expect("snapshot still builds");
    let snapshot = outcome.snapshot;

    assert_eq!(
        snapshot.data_quality.missing_enrollment_sources,
        vec!["Main 2025".to_string(), "Main 2026".to_string()]
    );
    assert_eq!(snapshot.funnels.get(&2026).expect("metrics").enrollments, 0);
}
