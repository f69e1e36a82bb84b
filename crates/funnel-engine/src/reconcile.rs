use serde::{Deserialize, Serialize};

use crate::census::CensusPopulation;
use crate::funnel::FunnelMetrics;

/// Reconciled enrollment picture for the current cycle.
///
/// The two sources overlap: pipeline enrollments are applied-and-enrolled
/// students for this cycle, while census "New" is everyone enrolled this
/// term regardless of channel. The breakdown takes "new" from the pipeline
/// (better date fidelity) and only continuing/returning from the census, so
/// no student is counted through both doors. The census new count is kept
/// for visibility but never enters the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentBreakdown {
    pub new_from_pipeline: u32,
    pub census_new: u32,
    pub continuing: u32,
    pub returning: u32,
}

impl EnrollmentBreakdown {
    pub fn total(&self) -> u32 {
        self.new_from_pipeline + self.continuing + self.returning
    }
}

/// Combine the current-year funnel with census continuing/returning counts.
pub fn build_enrollment_breakdown(
    current_funnel: &FunnelMetrics,
    census: &CensusPopulation,
) -> EnrollmentBreakdown {
    EnrollmentBreakdown {
        new_from_pipeline: current_funnel.enrollments,
        census_new: census.new_students,
        continuing: census.continuing_students,
        returning: census.returning_students,
    }
}
