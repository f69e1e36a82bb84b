use super::domain::{Category, SourceFeed};
use super::standardize::is_continuing_ed_program;

/// Marker for the continuing-education division inside the school field.
const CONTINUING_ED_MARKER: &str = "PCE";
/// Doctoral rows carry this tag and are reported with the retail channel.
const EXCLUDED_TAG_MARKER: &str = "EDD";
const PARTNER_TAG: &str = "Partner";
const LIGHTHOUSE_TAG: &str = "Lighthouse";
const CORPORATE_TAG: &str = "Corporate";

/// Raw classification inputs for one application row.
///
/// Fields are the pre-standardization strings: the cascade reasons about
/// blankness and markers in what the feed actually said, not about the
/// canonical fallbacks the standardizers substitute.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifierInput<'a> {
    pub source: Option<SourceFeed>,
    pub school_raw: &'a str,
    pub degree_interest_raw: &'a str,
    pub program_raw: &'a str,
    pub tag: &'a str,
    pub partner_exception: &'a str,
    pub special_program: &'a str,
    pub sponsoring_employer: &'a str,
    pub corporate_sponsor: &'a str,
}

/// One step of the cascade: a named predicate and the category it assigns.
pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&ClassifierInput<'_>) -> bool,
    pub category: Category,
}

/// The classification cascade, evaluated top to bottom, first match wins.
///
/// The order is a contract: rules are sorted by specificity of evidence
/// (explicit markers before inferred defaults), and swapping any two
/// changes real classifications. The final rule always matches.
pub const CASCADE: &[Rule] = &[
    Rule {
        name: "fasttrack_source",
        applies: |input| input.source == Some(SourceFeed::FastTrack),
        category: Category::FastTrack,
    },
    Rule {
        name: "continuing_ed_school",
        applies: |input| {
            input
                .school_raw
                .to_ascii_uppercase()
                .contains(CONTINUING_ED_MARKER)
        },
        category: Category::ContinuingEducation,
    },
    Rule {
        name: "continuing_ed_program",
        applies: |input| is_continuing_ed_program(input.program_raw),
        category: Category::ContinuingEducation,
    },
    Rule {
        name: "blank_school_default",
        applies: |input| {
            input.school_raw.trim().is_empty() && input.degree_interest_raw.trim() != "Dual Degree"
        },
        category: Category::ContinuingEducation,
    },
    Rule {
        name: "untagged_or_excluded",
        applies: |input| input.tag.trim().is_empty() || input.tag.contains(EXCLUDED_TAG_MARKER),
        category: Category::Retail,
    },
    Rule {
        name: "special_program",
        applies: |input| !input.special_program.trim().is_empty(),
        category: Category::SpecialProgram,
    },
    Rule {
        name: "partner_channel",
        applies: |input| {
            input.tag.contains(PARTNER_TAG)
                && !input
                    .partner_exception
                    .to_ascii_lowercase()
                    .contains("exclude")
        },
        category: Category::PartnerOnline,
    },
    Rule {
        name: "lighthouse_cohort",
        applies: |input| input.tag.contains(LIGHTHOUSE_TAG),
        category: Category::Lighthouse,
    },
    Rule {
        name: "corporate_sponsored",
        applies: |input| {
            input.tag.contains(CORPORATE_TAG)
                || !input.sponsoring_employer.trim().is_empty()
                || !input.corporate_sponsor.trim().is_empty()
        },
        category: Category::Corporate,
    },
    Rule {
        name: "retail_default",
        applies: |_| true,
        category: Category::Retail,
    },
];

/// Run the cascade. Total: the trailing catch-all guarantees exactly one
/// category for any input.
pub fn classify_application(input: &ClassifierInput<'_>) -> Category {
    classify_with_rule(input).1
}

/// As [`classify_application`], also reporting which rule fired.
pub fn classify_with_rule(input: &ClassifierInput<'_>) -> (&'static str, Category) {
    for rule in CASCADE {
        if (rule.applies)(input) {
            return (rule.name, rule.category);
        }
    }
    // The catch-all makes this unreachable; keep the default explicit so the
    // function stays total even if the table is edited.
    ("retail_default", Category::Retail)
}
