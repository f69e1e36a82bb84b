use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::domain::StudentType;
use crate::pipeline::domain::{Category, DegreeType};

/// Key into the cost-per-credit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RateKey {
    pub category: Category,
    pub degree_type: DegreeType,
    pub student_type: StudentType,
}

/// Published cost-per-credit rates by (category, degree, new-vs-current).
///
/// Lookups on unmapped keys return a zero rate: uncovered segments earn no
/// modeled revenue. Callers must pair any total built on this table with
/// the list of unmapped keys they observed (see the revenue engine) so the
/// gap is visible instead of disappearing into the total.
#[derive(Debug, Clone)]
pub struct RateTable {
    rates: HashMap<RateKey, f64>,
}

impl RateTable {
    pub fn new(entries: impl IntoIterator<Item = (RateKey, f64)>) -> Self {
        Self {
            rates: entries.into_iter().collect(),
        }
    }

    /// The published rate card for the current fiscal year.
    pub fn standard() -> Self {
        use Category::*;
        use DegreeType::*;
        use StudentType::*;

        let entries = [
            ((PartnerOnline, Masters, New), 1350.0),
            ((PartnerOnline, Masters, Current), 1615.0),
            ((Lighthouse, Masters, New), 320.0),
            ((Lighthouse, Masters, Current), 320.0),
            ((Corporate, Masters, New), 1280.0),
            ((Corporate, Masters, Current), 1540.0),
            ((Corporate, GraduateCertificate, New), 1180.0),
            ((Corporate, GraduateCertificate, Current), 1180.0),
            ((Retail, Masters, New), 1400.0),
            ((Retail, Masters, Current), 1710.0),
            ((Retail, GraduateCertificate, New), 1965.0),
            ((Retail, GraduateCertificate, Current), 2015.0),
            ((FastTrack, NonDegree, New), 850.0),
            ((FastTrack, NonDegree, Current), 850.0),
            ((ContinuingEducation, Masters, New), 795.0),
            ((ContinuingEducation, Masters, Current), 795.0),
            ((ContinuingEducation, GraduateCertificate, New), 590.0),
            ((ContinuingEducation, GraduateCertificate, Current), 590.0),
            (
                (ContinuingEducation, ProfessionalGraduateCertificate, New),
                590.0,
            ),
            (
                (ContinuingEducation, ProfessionalGraduateCertificate, Current),
                590.0,
            ),
        ];

        Self::new(entries.into_iter().map(|((category, degree_type, student_type), rate)| {
            (
                RateKey {
                    category,
                    degree_type,
                    student_type,
                },
                rate,
            )
        }))
    }

    /// Exact lookup; `None` marks a coverage gap.
    pub fn lookup(&self, key: &RateKey) -> Option<f64> {
        self.rates.get(key).copied()
    }

    /// Lookup with the zero fallback used by revenue math.
    pub fn rate(&self, key: &RateKey) -> f64 {
        self.lookup(key).unwrap_or(0.0)
    }

    /// The table as plain reference rows (one per category x degree, with
    /// both new and current rates) for reporting surfaces.
    pub fn reference_rows(&self) -> Vec<RateReferenceRow> {
        let mut pairs: Vec<(Category, DegreeType)> = self
            .rates
            .keys()
            .map(|key| (key.category, key.degree_type))
            .collect();
        pairs.sort();
        pairs.dedup();

        pairs
            .into_iter()
            .map(|(category, degree_type)| RateReferenceRow {
                category: category.label(),
                degree_type: degree_type.label(),
                new_rate: self.rate(&RateKey {
                    category,
                    degree_type,
                    student_type: StudentType::New,
                }),
                current_rate: self.rate(&RateKey {
                    category,
                    degree_type,
                    student_type: StudentType::Current,
                }),
            })
            .collect()
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// One row of the read-only rate reference table.
#[derive(Debug, Clone, Serialize)]
pub struct RateReferenceRow {
    pub category: &'static str,
    pub degree_type: &'static str,
    pub new_rate: f64,
    pub current_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_covers_the_published_segments() {
        let table = RateTable::standard();
        assert_eq!(
            table.rate(&RateKey {
                category: Category::Retail,
                degree_type: DegreeType::Masters,
                student_type: StudentType::Current,
            }),
            1710.0
        );
        assert_eq!(
            table.rate(&RateKey {
                category: Category::Lighthouse,
                degree_type: DegreeType::Masters,
                student_type: StudentType::New,
            }),
            320.0
        );
    }

    #[test]
    fn unmapped_keys_rate_as_zero_but_lookup_reports_the_gap() {
        let table = RateTable::standard();
        let key = RateKey {
            category: Category::Lighthouse,
            degree_type: DegreeType::GraduateCertificate,
            student_type: StudentType::New,
        };
        assert_eq!(table.lookup(&key), None);
        assert_eq!(table.rate(&key), 0.0);
    }

    #[test]
    fn reference_rows_pair_new_and_current_rates() {
        let rows = RateTable::standard().reference_rows();
        let retail_masters = rows
            .iter()
            .find(|row| row.category == "Retail" && row.degree_type == "Masters")
            .expect("retail masters row");
        assert_eq!(retail_masters.new_rate, 1400.0);
        assert_eq!(retail_masters.current_rate, 1710.0);
    }
}
