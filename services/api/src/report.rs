use crate::error::AppError;
use clap::Args;
use funnel_engine::config::AppConfig;
use funnel_engine::{AnalyticsEngine, AnalyticsSnapshot};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct FunnelReportArgs {
    /// Applications export (CSV)
    #[arg(long)]
    pub(crate) applications: PathBuf,
    /// Census snapshot (CSV); omit for funnel metrics only
    #[arg(long)]
    pub(crate) census: Option<PathBuf>,
    /// Override the configured reporting year
    #[arg(long)]
    pub(crate) year: Option<i32>,
    /// Override the configured NTR goal
    #[arg(long)]
    pub(crate) goal: Option<f64>,
    /// Include the per-program funnel table
    #[arg(long)]
    pub(crate) show_programs: bool,
    /// Include the published rate card
    #[arg(long)]
    pub(crate) show_rates: bool,
}

pub(crate) fn run_funnel_report(args: FunnelReportArgs) -> Result<(), AppError> {
    let FunnelReportArgs {
        applications,
        census,
        year,
        goal,
        show_programs,
        show_rates,
    } = args;

    let mut config = AppConfig::load()?.engine;
    if let Some(year) = year {
        config.current_year = year;
        config.census_term = format!("{year}S");
    }
    if let Some(goal) = goal {
        config.ntr_goal = goal;
    }

    let applications_csv = std::fs::read(&applications)?;
    let census_csv = match &census {
        Some(path) => std::fs::read(path)?,
        None => Vec::new(),
    };

    let engine = AnalyticsEngine::new(config);
    let snapshot = engine.compute(&applications_csv, &census_csv)?;

    render_snapshot(&snapshot, census.is_some());
    if show_programs {
        render_programs(&snapshot);
    }
    if show_rates {
        render_rates(&engine);
    }

    Ok(())
}

fn render_snapshot(snapshot: &AnalyticsSnapshot, census_provided: bool) {
    println!("Enrollment funnel report ({})", snapshot.current_year);
    println!("Generated at: {}", snapshot.generated_at);

    println!("\nFunnel by year");
    for (year, metrics) in &snapshot.funnels {
        println!(
            "- {}: {} applications, {} admits, {} offers accepted, {} enrollments ({:.0}% admit, {:.0}% yield)",
            year,
            metrics.applications,
            metrics.admits,
            metrics.offers_accepted,
            metrics.enrollments,
            metrics.admit_rate(),
            metrics.yield_rate()
        );
    }

    let yoy = &snapshot.current_vs_previous;
    println!(
        "\nYear over year: applications {:+.0}%, admits {:+.0}%, enrollments {:+.0}%",
        yoy.applications_change(),
        yoy.admits_change(),
        yoy.enrollments_change()
    );

    println!("\nEnrollment breakdown");
    println!(
        "- New (pipeline): {}",
        snapshot.enrollment.new_from_pipeline
    );
    println!("- Continuing (census): {}", snapshot.enrollment.continuing);
    println!("- Returning (census): {}", snapshot.enrollment.returning);
    println!("- Total: {}", snapshot.enrollment.total());

    if census_provided {
        let summary = &snapshot.ntr.summary;
        println!("\nNet tuition revenue");
        println!(
            "- Total: ${:.0} of ${:.0} goal ({:.1}%), gap ${:.0}",
            summary.total_ntr, summary.goal, summary.percent_of_goal, summary.gap_to_goal
        );
        println!(
            "- New: {} students, {:.0} credits, ${:.0}",
            summary.new_students, summary.new_credits, summary.new_ntr
        );
        println!(
            "- Current: {} students, {:.0} credits, ${:.0}",
            summary.current_students, summary.current_credits, summary.current_ntr
        );

        println!("\nRevenue by segment");
        for segment in &snapshot.ntr.segments {
            println!(
                "- {} / {}: {} students, {:.0} credits, ${:.0}",
                segment.category_label,
                segment.degree_label,
                segment.total_students,
                segment.total_credits,
                segment.total_ntr
            );
        }
    }

    let quality = &snapshot.data_quality;
    if quality.is_clean() {
        println!("\nData quality: no issues detected");
    } else {
        println!("\nData quality");
        for population in &quality.missing_enrollment_sources {
            println!("- WARNING: {population} has no enrollment-status source; enrollments read as zero");
        }
        for key in &quality.missing_rates {
            println!(
                "- WARNING: no published rate for {} / {} / {}; segment billed at $0",
                key.category.label(),
                key.degree_type.label(),
                key.student_type.label()
            );
        }
    }
}

fn render_programs(snapshot: &AnalyticsSnapshot) {
    println!("\nPrograms by application volume");
    for stats in &snapshot.program_stats {
        println!(
            "- {} ({}, {}): {} applications ({:+.0}% YoY), {} admits, {} enrollments",
            stats.program,
            stats.school,
            stats.degree_type,
            stats.applications,
            stats.applications_change(),
            stats.admits,
            stats.enrollments
        );
    }
}

fn render_rates(engine: &AnalyticsEngine) {
    println!("\nPublished cost-per-credit rates");
    for row in engine.rates().reference_rows() {
        println!(
            "- {} / {}: new ${:.0}, current ${:.0}",
            row.category, row.degree_type, row.new_rate, row.current_rate
        );
    }
}
