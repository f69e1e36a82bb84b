pub mod categorize;
pub mod domain;
pub mod ntr;
pub mod parser;
pub mod rates;

pub use categorize::{categorize_census_record, derive_student_type};
pub use domain::{CensusRecord, StudentStatus, StudentType};
pub use ntr::{calculate_ntr, calculate_ntr_by_program, NtrReport, NtrSummary, ProgramNtr, SegmentNtr};
pub use parser::{parse_census, CensusPopulation};
pub use rates::{RateKey, RateReferenceRow, RateTable};

use std::collections::BTreeMap;

/// Unique-student counts per category, for side-by-side reporting with the
/// application-side category breakdown.
pub fn category_headcounts(records: &[CensusRecord]) -> BTreeMap<&'static str, u32> {
    use std::collections::HashSet;

    let mut ids: BTreeMap<&'static str, HashSet<&str>> = BTreeMap::new();
    for record in records {
        ids.entry(categorize_census_record(record).label())
            .or_default()
            .insert(record.student_id.as_str());
    }
    ids.into_iter()
        .map(|(label, set)| (label, set.len() as u32))
        .collect()
}
