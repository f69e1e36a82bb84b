use std::collections::HashSet;

use tracing::debug;

use super::domain::{CensusRecord, StudentStatus};
use crate::pipeline::domain::DegreeType;
use crate::table::RawTable;

const TERM_COLUMNS: &[&str] = &["semester", "census term", "term"];
const STUDENT_ID_COLUMNS: &[&str] = &["student id"];
const LOCATION_COLUMNS: &[&str] = &["student location detailed", "student location"];
const DEGREE_COLUMNS: &[&str] = &["degree type"];
const CORPORATE_COLUMNS: &[&str] = &["corporate student"];
const COHORT_COLUMNS: &[&str] = &["corporate cohort"];
const LIGHTHOUSE_COLUMNS: &[&str] = &["lighthouse flag"];
const STATUS_COLUMNS: &[&str] = &["student status"];
/// The credits column has shipped under two names; both must be checked.
const CREDIT_COLUMNS: &[&str] = &["total credit hours", "number of credits"];
const PRIOR_SUMMER_COLUMNS: &[&str] = &["enrolled previous summer as new"];
const PROGRAM_COLUMNS: &[&str] = &["primary program of study", "program"];
const SCHOOL_COLUMNS: &[&str] = &["school"];

/// Locations billed through this model; anything else is invisible to NTR.
const IN_SCOPE_LOCATIONS: &[&str] = &["Online", "Online Partner"];

/// Parsed census population for one term, filtered to the in-scope
/// locations and degree types, with unique-student headcounts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CensusPopulation {
    pub records: Vec<CensusRecord>,
    pub total_students: u32,
    pub new_students: u32,
    pub continuing_students: u32,
    pub returning_students: u32,
}

/// Parse the census snapshot and keep only rows for `term`, the in-scope
/// locations, and the billable degree types. Malformed numeric fields read
/// as zero; nothing here errors on data.
pub fn parse_census(table: &RawTable, term: &str) -> CensusPopulation {
    if table.is_empty() {
        return CensusPopulation::default();
    }

    let term_col = table.column(TERM_COLUMNS);
    let id_col = table.column(STUDENT_ID_COLUMNS);
    let location_col = table.column(LOCATION_COLUMNS);
    let degree_col = table.column(DEGREE_COLUMNS);
    let corporate_col = table.column(CORPORATE_COLUMNS);
    let cohort_col = table.column(COHORT_COLUMNS);
    let lighthouse_col = table.column(LIGHTHOUSE_COLUMNS);
    let status_col = table.column(STATUS_COLUMNS);
    let credit_col = table.column(CREDIT_COLUMNS);
    let prior_summer_col = table.column(PRIOR_SUMMER_COLUMNS);
    let program_col = table.column(PROGRAM_COLUMNS);
    let school_col = table.column(SCHOOL_COLUMNS);

    let records: Vec<CensusRecord> = table
        .rows()
        .filter(|row| term_col.is_none() || row.field(term_col) == term)
        .filter(|row| IN_SCOPE_LOCATIONS.contains(&row.field(location_col)))
        .filter_map(|row| {
            let degree_type = parse_census_degree(row.field(degree_col))?;
            Some(CensusRecord {
                student_id: row.field(id_col).to_string(),
                term: row.field(term_col).to_string(),
                location: row.field(location_col).to_string(),
                degree_type,
                corporate: row.field(corporate_col).eq_ignore_ascii_case("corporate"),
                corporate_cohort: row.field(cohort_col).to_string(),
                lighthouse: parse_flag(row.field(lighthouse_col)),
                status: StudentStatus::parse(row.field(status_col)),
                prior_summer_as_new: parse_flag(row.field(prior_summer_col)),
                credits: parse_credits(row.field(credit_col)),
                program: row.field(program_col).to_string(),
                school: row.field(school_col).to_string(),
            })
        })
        .collect();

    let population = CensusPopulation {
        total_students: unique_students(&records, |_| true),
        new_students: unique_students(&records, |r| r.status == StudentStatus::New),
        continuing_students: unique_students(&records, |r| r.status == StudentStatus::Continuing),
        returning_students: unique_students(&records, |r| r.status == StudentStatus::Returning),
        records,
    };
    debug!(
        rows = population.records.len(),
        students = population.total_students,
        term,
        "parsed census snapshot"
    );
    population
}

/// Census rows bill only as Masters, Graduate Certificate, or Non-Degree;
/// other degree strings put the row out of scope.
fn parse_census_degree(raw: &str) -> Option<DegreeType> {
    match raw.trim() {
        s if s.eq_ignore_ascii_case("masters") => Some(DegreeType::Masters),
        s if s.eq_ignore_ascii_case("graduate certificate") => Some(DegreeType::GraduateCertificate),
        s if s.eq_ignore_ascii_case("professional graduate certificate") => {
            Some(DegreeType::ProfessionalGraduateCertificate)
        }
        s if s.eq_ignore_ascii_case("non-degree") => Some(DegreeType::NonDegree),
        _ => None,
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim(), "1" | "1.0" | "true" | "True" | "TRUE" | "yes" | "Yes")
}

fn parse_credits(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0)
}

fn unique_students<F>(records: &[CensusRecord], predicate: F) -> u32
where
    F: Fn(&CensusRecord) -> bool,
{
    records
        .iter()
        .filter(|record| predicate(record))
        .map(|record| record.student_id.as_str())
        .collect::<HashSet<_>>()
        .len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn table(csv: &str) -> RawTable {
        RawTable::from_reader(Cursor::new(csv.to_string())).expect("table parses")
    }

    const HEADER: &str = "Semester,Student Id,Student Location Detailed,Degree Type,Corporate Student,Corporate Cohort,Lighthouse Flag,Student Status,Total Credit Hours,Enrolled Previous Summer As New,Primary Program Of Study,School";

    #[test]
    fn filters_to_term_location_and_degree() {
        let csv = format!(
            "{HEADER}\n\
             2026S,S1,Online,Masters,Non-Corporate,,0,New,6,0,Data Science,SOB\n\
             2025F,S2,Online,Masters,Non-Corporate,,0,New,6,0,Data Science,SOB\n\
             2026S,S3,On Campus,Masters,Non-Corporate,,0,New,6,0,Data Science,SOB\n\
             2026S,S4,Online,Doctoral,Non-Corporate,,0,New,6,0,Data Science,SOB\n"
        );
        let population = parse_census(&table(&csv), "2026S");
        assert_eq!(population.records.len(), 1);
        assert_eq!(population.records[0].student_id, "S1");
    }

    #[test]
    fn credits_column_alias_is_checked() {
        let csv = "Semester,Student Id,Student Location Detailed,Degree Type,Student Status,Number Of Credits\n\
                   2026S,S1,Online,Masters,Continuing,9\n";
        let population = parse_census(&table(csv), "2026S");
        assert_eq!(population.records[0].credits, 9.0);
    }

    #[test]
    fn malformed_numerics_read_as_zero() {
        let csv = "Semester,Student Id,Student Location Detailed,Degree Type,Student Status,Total Credit Hours,Lighthouse Flag\n\
                   2026S,S1,Online,Masters,New,not-a-number,maybe\n";
        let population = parse_census(&table(csv), "2026S");
        assert_eq!(population.records[0].credits, 0.0);
        assert!(!population.records[0].lighthouse);
    }

    #[test]
    fn headcounts_deduplicate_by_student_id() {
        let csv = format!(
            "{HEADER}\n\
             2026S,S1,Online,Masters,Non-Corporate,,0,Continuing,3,0,Data Science,SOB\n\
             2026S,S1,Online,Masters,Non-Corporate,,0,Continuing,3,0,Machine Learning,SOB\n\
             2026S,S2,Online,Masters,Non-Corporate,,0,Returning,6,0,Data Science,SOB\n"
        );
        let population = parse_census(&table(&csv), "2026S");
        assert_eq!(population.records.len(), 3);
        assert_eq!(population.total_students, 2);
        assert_eq!(population.continuing_students, 1);
        assert_eq!(population.returning_students, 1);
        assert_eq!(population.new_students, 0);
    }

    #[test]
    fn empty_snapshot_is_valid() {
        let population = parse_census(&RawTable::default(), "2026S");
        assert!(population.records.is_empty());
        assert_eq!(population.total_students, 0);
    }
}
