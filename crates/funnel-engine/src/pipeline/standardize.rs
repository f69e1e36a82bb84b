use super::domain::{DegreeType, School};

/// Noise fragments stripped from program names before title-casing.
const PROGRAM_NOISE: &[&str] = &["(online)", "(evening)", "ms -", "(ms)"];

/// Programs run by the continuing-education division regardless of the
/// school field on the row.
pub(crate) const CONTINUING_ED_PROGRAM_KEYWORDS: &[&str] = &[
    "applied data analytics",
    "analytics foundations",
    "enterprise automation",
    "digital leadership",
];

/// Sponsor keyword -> canonical employer name. Checked in order; the first
/// keyword contained in the raw value wins, so more specific spellings come
/// before the short ones.
const COMPANY_MAPPINGS: &[(&str, &str)] = &[
    ("lockheed", "Lockheed Martin"),
    ("northrop", "Northrop Grumman"),
    ("raytheon", "RTX"),
    ("rtx", "RTX"),
    ("boeing", "Boeing"),
    ("bank of america", "Bank of America"),
    ("merrill", "Bank of America"),
    ("jp morgan", "JPMorgan Chase"),
    ("jpmorgan", "JPMorgan Chase"),
    ("jpmc", "JPMorgan Chase"),
    ("verizon", "Verizon"),
    ("pfizer", "Pfizer"),
    ("siemens", "Siemens"),
    ("us army", "US Army"),
    ("devcom", "US Army"),
];

/// Lowercase, strip known noise fragments, then title-case the remainder.
/// Empty or whitespace input standardizes to "".
pub fn standardize_program_name(raw: &str) -> String {
    let mut name = raw.trim().to_ascii_lowercase();
    for noise in PROGRAM_NOISE {
        name = name.replace(noise, "");
    }
    title_case(name.trim())
}

/// Map a raw school string onto the canonical school set.
///
/// The continuing-education marker is honored before the blank check so a
/// value like "PCE - Online" never falls into the Dual Degree bucket.
/// Unmapped names also land in Dual Degree; the feed only produces the
/// mapped spellings plus joint-program rows that leave the field loose.
pub fn standardize_school_name(raw: &str) -> School {
    let name = raw.trim().to_ascii_uppercase();
    if name.contains("PCE") {
        return School::ContinuingEducation;
    }
    if name.is_empty() || name.contains("DUAL") {
        return School::DualDegree;
    }
    match name.as_str() {
        "SOB" | "SCHOOL OF BUSINESS" => School::Business,
        "SOE" | "SCHOOL OF ENGINEERING" | "SCHOOL OF ENGINEERING AND APPLIED SCIENCE" => {
            School::Engineering
        }
        "PROFESSIONAL AND CONTINUING EDUCATION" | "CONTINUING EDUCATION" => {
            School::ContinuingEducation
        }
        _ => School::DualDegree,
    }
}

/// Degree of interest -> canonical degree type. Most applicants are
/// Masters, so that is the default rather than an "unknown" bucket.
pub fn standardize_degree_type(raw: &str) -> DegreeType {
    let text = raw.trim().to_ascii_lowercase();
    if text.contains("certificate") {
        DegreeType::GraduateCertificate
    } else if text.contains("dual") {
        DegreeType::DualDegree
    } else {
        DegreeType::Masters
    }
}

/// Normalize a sponsoring-employer name via the keyword table, falling back
/// to title-casing whatever the applicant typed.
pub fn standardize_company_name(raw: &str) -> String {
    let original = raw.trim().to_ascii_lowercase();
    if original.is_empty() {
        return String::new();
    }
    for (keyword, canonical) in COMPANY_MAPPINGS {
        if original.contains(keyword) {
            return (*canonical).to_string();
        }
    }
    title_case(&original)
}

/// Whether a program name belongs to the continuing-education division.
pub fn is_continuing_ed_program(program: &str) -> bool {
    if program.trim().is_empty() {
        return false;
    }
    let lower = program.trim().to_ascii_lowercase();
    CONTINUING_ED_PROGRAM_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_names_are_cleaned_and_title_cased() {
        assert_eq!(
            standardize_program_name("  data science (online) "),
            "Data Science"
        );
        assert_eq!(
            standardize_program_name("MS - Computer Engineering"),
            "Computer Engineering"
        );
        assert_eq!(standardize_program_name(""), "");
    }

    #[test]
    fn school_marker_checked_before_dual_degree_fallback() {
        assert_eq!(
            standardize_school_name("PCE - Online Programs"),
            School::ContinuingEducation
        );
        assert_eq!(standardize_school_name(""), School::DualDegree);
        assert_eq!(standardize_school_name("dual degree"), School::DualDegree);
        assert_eq!(standardize_school_name("sob"), School::Business);
        assert_eq!(
            standardize_school_name("School of Engineering"),
            School::Engineering
        );
    }

    #[test]
    fn unmapped_school_falls_back_to_dual_degree() {
        assert_eq!(
            standardize_school_name("School of Unusual Studies"),
            School::DualDegree
        );
    }

    #[test]
    fn degree_type_defaults_to_masters() {
        assert_eq!(
            standardize_degree_type("Graduate Certificate"),
            DegreeType::GraduateCertificate
        );
        assert_eq!(standardize_degree_type("Dual Degree"), DegreeType::DualDegree);
        assert_eq!(standardize_degree_type("MS"), DegreeType::Masters);
        assert_eq!(standardize_degree_type(""), DegreeType::Masters);
    }

    #[test]
    fn company_keyword_table_wins_over_title_casing() {
        assert_eq!(
            standardize_company_name("lockheed martin space"),
            "Lockheed Martin"
        );
        assert_eq!(standardize_company_name("JP Morgan"), "JPMorgan Chase");
        assert_eq!(standardize_company_name("acme widgets llc"), "Acme Widgets Llc");
        assert_eq!(standardize_company_name("   "), "");
    }

    #[test]
    fn continuing_ed_program_keywords_match_substrings() {
        assert!(is_continuing_ed_program("Applied Data Analytics Foundations"));
        assert!(is_continuing_ed_program("enterprise automation"));
        assert!(!is_continuing_ed_program("Data Science"));
        assert!(!is_continuing_ed_program(""));
    }
}
