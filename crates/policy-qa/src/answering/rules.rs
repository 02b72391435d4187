//! Rule-based answering: question categories mapped to regex batteries
//!
//! Patterns run against the lowercased document text; `.` does not cross line
//! breaks, so a match stays within one extracted line. Context windows are cut
//! from the original-case text so answers keep the document's capitalization.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::analysis::{NOT_FOUND, NOT_RECOGNIZED};

/// Question categories, in classification priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    GracePeriod,
    PreExistingWaitingPeriod,
    Maternity,
    CataractWaitingPeriod,
    OrganDonor,
    NoClaimDiscount,
    PreventiveHealthCheck,
    HospitalDefinition,
    AyushCoverage,
    RoomRentIcuLimits,
}

impl RuleCategory {
    /// First category whose trigger terms all occur in the question
    pub fn classify(question: &str) -> Option<Self> {
        let q = question.to_lowercase();
        let has = |term: &str| q.contains(term);

        if has("grace period") && has("premium") {
            Some(Self::GracePeriod)
        } else if has("waiting period") && has("pre-existing") {
            Some(Self::PreExistingWaitingPeriod)
        } else if has("maternity") && has("expenses") {
            Some(Self::Maternity)
        } else if has("cataract") && has("surgery") {
            Some(Self::CataractWaitingPeriod)
        } else if has("organ donor") && has("expenses") {
            Some(Self::OrganDonor)
        } else if has("no claim discount") || has("ncd") {
            Some(Self::NoClaimDiscount)
        } else if has("preventive") && has("health check") {
            Some(Self::PreventiveHealthCheck)
        } else if has("hospital") && has("define") {
            Some(Self::HospitalDefinition)
        } else if has("ayush") && has("coverage") {
            Some(Self::AyushCoverage)
        } else if has("room rent") && has("icu") && has("plan a") {
            Some(Self::RoomRentIcuLimits)
        } else {
            None
        }
    }

    fn rule(&self) -> &'static Rule {
        &RULES[*self as usize]
    }
}

/// How a match becomes an answer
enum Render {
    /// `{}` in the template is replaced by capture group 1, or `default`
    Value {
        template: &'static str,
        default: &'static str,
    },
    /// `label` followed by the text within `radius` chars of the match
    Context { label: &'static str, radius: usize },
    /// The sentence beginning at "Hospital" inside a 2000-char window
    Hospital,
}

/// Last-resort check when no pattern matched
enum Fallback {
    None,
    /// "pre-existing disease" with "excluded" and 36 months nearby
    PreExistingThirtySix,
    /// Maternity mentioned alongside an exclusions section
    MaternityExclusion,
    /// Any cataract mention
    CataractMention,
}

struct Rule {
    patterns: &'static [&'static str],
    render: Render,
    fallback: Fallback,
}

/// Indexed by `RuleCategory as usize`
static RULES: [Rule; 10] = [
    Rule {
        patterns: &[
            r"grace period.*?(\d+)\s*days?",
            r"(\d+)\s*days?.*?grace period",
            r"grace period.*?thirty\s*days?",
            r"thirty\s*days?.*?grace period",
            r"grace period.*?30\s*days?",
            r"30\s*days?.*?grace period",
        ],
        render: Render::Value {
            template: "Grace period: {} days",
            default: "30",
        },
        fallback: Fallback::None,
    },
    Rule {
        patterns: &[
            r"pre-existing disease.*?(\d+)\s*months?",
            r"(\d+)\s*months?.*?pre-existing disease",
            r"ped.*?(\d+)\s*months?",
            r"thirty-six\s*months?.*?pre-existing",
            r"36\s*months?.*?pre-existing",
            r"pre-existing.*?excluded.*?(\d+)\s*months?",
            r"(\d+)\s*months?.*?continuous coverage",
            r"pre-existing.*?(\d+)\s*months?.*?continuous",
        ],
        render: Render::Value {
            template: "Waiting period for pre-existing diseases (PED): {} months of continuous coverage",
            default: "36",
        },
        fallback: Fallback::PreExistingThirtySix,
    },
    Rule {
        patterns: &[
            r"maternity.*?expenses?.*?covered",
            r"maternity.*?benefits?",
            r"pregnancy.*?expenses?",
            r"childbirth.*?expenses?",
            r"maternity.*?treatment",
            r"pregnancy.*?treatment",
        ],
        render: Render::Context {
            label: "Maternity coverage found: ",
            radius: 1000,
        },
        fallback: Fallback::MaternityExclusion,
    },
    Rule {
        patterns: &[
            r"cataract.*?(\d+)\s*months?",
            r"(\d+)\s*months?.*?cataract",
            r"cataract.*?waiting period",
            r"waiting period.*?cataract",
            r"cataract.*?surgery.*?(\d+)",
            r"(\d+).*?cataract.*?surgery",
        ],
        render: Render::Value {
            template: "Waiting period for cataract surgery: {} months",
            default: "specified",
        },
        fallback: Fallback::CataractMention,
    },
    Rule {
        patterns: &[
            r"organ donor.*?expenses?",
            r"organ donor.*?covered",
            r"donor.*?medical expenses?",
            r"organ.*?donor.*?costs?",
            r"organ donor.*?hospitalisation",
            r"donor.*?hospitalisation.*?expenses?",
        ],
        render: Render::Context {
            label: "Organ donor coverage found: ",
            radius: 1000,
        },
        fallback: Fallback::None,
    },
    Rule {
        patterns: &[
            r"no claim discount.*?(\d+)\s*percent",
            r"ncd.*?(\d+)\s*percent",
            r"(\d+)\s*percent.*?no claim discount",
            r"no claim discount.*?(\d+)\s*%",
            r"(\d+)\s*%.*?no claim discount",
            r"no claim discount.*?(\d+)",
            r"(\d+).*?no claim discount",
        ],
        render: Render::Value {
            template: "No Claim Discount (NCD): {}%",
            default: "specified",
        },
        fallback: Fallback::None,
    },
    Rule {
        patterns: &[
            r"preventive.*?health check",
            r"health check.*?benefit",
            r"preventive.*?medical",
            r"annual.*?health check",
            r"health check.*?up",
            r"preventive.*?care",
            r"health screening",
            r"preventive.*?examination",
        ],
        render: Render::Context {
            label: "Preventive health check benefit found: ",
            radius: 1000,
        },
        fallback: Fallback::None,
    },
    Rule {
        patterns: &[
            r"hospital.*?means.*?institution",
            r"definition.*?hospital",
            r"hospital.*?definition",
            r"hospital.*?institution.*?established",
            r"institution.*?established.*?hospital",
        ],
        render: Render::Hospital,
        fallback: Fallback::None,
    },
    Rule {
        patterns: &[
            r"ayush.*?treatment",
            r"ayush.*?coverage",
            r"ayurveda.*?yoga.*?naturopathy",
            r"ayush.*?day care",
            r"ayush.*?hospital",
            r"ayush.*?medical",
            r"ayush.*?indemnify",
        ],
        render: Render::Context {
            label: "AYUSH coverage found: ",
            radius: 1500,
        },
        fallback: Fallback::None,
    },
    Rule {
        patterns: &[
            r"room rent.*?sub.limit",
            r"icu.*?charges.*?sub.limit",
            r"room rent.*?limit",
            r"icu.*?limit",
            r"plan a.*?room rent",
            r"plan a.*?icu",
            r"room.*?rent.*?charges",
            r"icu.*?charges",
            r"sub.limit.*?room",
            r"sub.limit.*?icu",
        ],
        render: Render::Context {
            label: "Room rent/ICU sub-limits found: ",
            radius: 1000,
        },
        fallback: Fallback::None,
    },
];

/// Compiled patterns, indexed like `RULES`
static COMPILED: Lazy<Vec<Vec<Regex>>> = Lazy::new(|| {
    RULES
        .iter()
        .map(|rule| {
            rule.patterns
                .iter()
                .map(|p| Regex::new(p).expect("Invalid regex"))
                .collect()
        })
        .collect()
});

const HOSPITAL_RADIUS: usize = 2000;

/// Answer a question from document text using the rule table.
///
/// Pure and deterministic: the same text and question always give the same answer.
pub fn answer(text: &str, question: &str) -> String {
    match RuleCategory::classify(question) {
        Some(category) => answer_category(text, category),
        None => NOT_RECOGNIZED.to_string(),
    }
}

/// Apply one category's patterns to the text
pub fn answer_category(text: &str, category: RuleCategory) -> String {
    let doc = SearchText::new(text);
    let rule = category.rule();

    for pattern in &COMPILED[category as usize] {
        if let Some(caps) = pattern.captures(&doc.lower) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            return match &rule.render {
                Render::Value { template, default } => {
                    let value = caps.get(1).map(|m| m.as_str()).unwrap_or(*default);
                    template.replace("{}", value)
                }
                Render::Context { label, radius } => {
                    format!("{}{}", label, doc.window(whole.start(), whole.end(), *radius))
                }
                Render::Hospital => {
                    hospital_definition(doc.window(whole.start(), whole.end(), HOSPITAL_RADIUS))
                }
            };
        }
    }

    match rule.fallback {
        Fallback::None => None,
        Fallback::PreExistingThirtySix => doc.pre_existing_thirty_six(),
        Fallback::MaternityExclusion => doc.maternity_exclusion(),
        Fallback::CataractMention => doc.cataract_mention(),
    }
    .unwrap_or_else(|| NOT_FOUND.to_string())
}

/// Extract "Hospital ... ." from a context window, or return the whole window
fn hospital_definition(context: &str) -> String {
    if let Some(start) = context.find("Hospital") {
        let search_from = advance_chars(context, start, 100);
        if let Some(offset) = context[search_from..].find('.') {
            let end = search_from + offset + 1;
            return format!("Hospital Definition: {}", &context[start..end]);
        }
    }
    format!("Hospital definition found: {}", context)
}

/// Document text with a lowercase twin sharing byte offsets
struct SearchText<'a> {
    original: std::borrow::Cow<'a, str>,
    lower: String,
}

impl<'a> SearchText<'a> {
    fn new(text: &'a str) -> Self {
        let lower = text.to_lowercase();
        // Some characters change byte length when lowercased; offsets into
        // `lower` are then only valid for `lower` itself.
        let original = if lower.len() == text.len() {
            std::borrow::Cow::Borrowed(text)
        } else {
            std::borrow::Cow::Owned(lower.clone())
        };
        Self { original, lower }
    }

    /// Original-case text within `radius` chars either side of `start..end`
    fn window(&self, start: usize, end: usize, radius: usize) -> &str {
        let from = retreat_chars(&self.original, start, radius);
        let to = advance_chars(&self.original, end, radius);
        &self.original[from..to]
    }

    fn pre_existing_thirty_six(&self) -> Option<String> {
        let start = self.lower.find("pre-existing disease")?;
        if !self.lower.contains("excluded") {
            return None;
        }
        let context = &self.lower[retreat_chars(&self.lower, start, 1000)
            ..advance_chars(&self.lower, start, 1000)];
        if context.contains("36") || context.contains("thirty-six") {
            Some("Waiting period for pre-existing diseases (PED): 36 months of continuous coverage".to_string())
        } else {
            None
        }
    }

    fn maternity_exclusion(&self) -> Option<String> {
        let start = self.lower.find("maternity")?;
        if !self.lower.contains("exclusion") {
            return None;
        }
        Some(format!("Maternity coverage status: {}", self.window(start, start, 500)))
    }

    fn cataract_mention(&self) -> Option<String> {
        let start = self.lower.find("cataract")?;
        Some(format!(
            "Cataract surgery information found: {}",
            self.window(start, start, 1000)
        ))
    }
}

/// Byte index `n` chars before `idx`, clamped to the start
fn retreat_chars(s: &str, idx: usize, n: usize) -> usize {
    if n == 0 {
        return idx;
    }
    s[..idx]
        .char_indices()
        .rev()
        .take(n)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(idx)
}

/// Byte index `n` chars after `idx`, clamped to the end
fn advance_chars(s: &str, idx: usize, n: usize) -> usize {
    s[idx..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| idx + i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(COMPILED.len(), RULES.len());
        for (rule, compiled) in RULES.iter().zip(COMPILED.iter()) {
            assert_eq!(rule.patterns.len(), compiled.len());
        }
    }

    #[test]
    fn test_rules_table_matches_category_order() {
        let categories = [
            RuleCategory::GracePeriod,
            RuleCategory::PreExistingWaitingPeriod,
            RuleCategory::Maternity,
            RuleCategory::CataractWaitingPeriod,
            RuleCategory::OrganDonor,
            RuleCategory::NoClaimDiscount,
            RuleCategory::PreventiveHealthCheck,
            RuleCategory::HospitalDefinition,
            RuleCategory::AyushCoverage,
            RuleCategory::RoomRentIcuLimits,
        ];
        assert!(RULES[RuleCategory::GracePeriod as usize].patterns[0].starts_with("grace"));
        assert!(RULES[RuleCategory::AyushCoverage as usize].patterns[0].starts_with("ayush"));
        assert_eq!(categories.len(), RULES.len());
    }

    #[test]
    fn test_grace_period_from_digits() {
        let text = "Premium may be paid within a grace period of 30 days from the due date.";
        let q = "What is the grace period for premium payment?";
        assert_eq!(answer(text, q), "Grace period: 30 days");
    }

    #[test]
    fn test_grace_period_words_use_default() {
        let text = "A Grace Period of thirty days is allowed.";
        let q = "What is the grace period for premium payment?";
        assert_eq!(answer(text, q), "Grace period: 30 days");
    }

    #[test]
    fn test_unrecognized_question() {
        assert_eq!(
            answer("anything at all", "What color is the cover page?"),
            NOT_RECOGNIZED
        );
    }

    #[test]
    fn test_recognized_but_missing() {
        let text = "This policy covers hospitalisation only.";
        assert_eq!(
            answer(text, "Are the medical expenses for an organ donor covered?"),
            NOT_FOUND
        );
    }

    #[test]
    fn test_classification_priority() {
        assert_eq!(
            RuleCategory::classify("What is the No Claim Discount (NCD) offered?"),
            Some(RuleCategory::NoClaimDiscount)
        );
        assert_eq!(
            RuleCategory::classify("Is there a benefit for preventive health check-ups?"),
            Some(RuleCategory::PreventiveHealthCheck)
        );
        assert_eq!(
            RuleCategory::classify("Are there any sub-limits on room rent and ICU charges for Plan A?"),
            Some(RuleCategory::RoomRentIcuLimits)
        );
        assert_eq!(
            RuleCategory::classify("Room rent and ICU limits?"),
            None
        );
    }

    #[test]
    fn test_ped_months() {
        let text = "Expenses related to pre-existing disease are excluded until 36 months of continuous coverage.";
        let q = "What is the waiting period for pre-existing diseases (PED) to be covered?";
        assert_eq!(
            answer(text, q),
            "Waiting period for pre-existing diseases (PED): 36 months of continuous coverage"
        );
    }

    #[test]
    fn test_ped_fallback_across_lines() {
        let text = "Pre-existing disease\nis excluded\nuntil thirty-six\nmonths have elapsed";
        assert_eq!(
            answer_category(text, RuleCategory::PreExistingWaitingPeriod),
            "Waiting period for pre-existing diseases (PED): 36 months of continuous coverage"
        );
    }

    #[test]
    fn test_ncd_percent() {
        let text = "A No Claim Discount of 5% on the base premium is offered on renewal.";
        let q = "What is the No Claim Discount (NCD) offered in this policy?";
        assert_eq!(answer(text, q), "No Claim Discount (NCD): 5%");
    }

    #[test]
    fn test_cataract_months() {
        let text = "Cataract surgery has a waiting period of 24 months.";
        let q = "What is the waiting period for cataract surgery?";
        assert_eq!(answer(text, q), "Waiting period for cataract surgery: 24 months");
    }

    #[test]
    fn test_context_window_keeps_original_case() {
        let text = "Section 4. AYUSH Treatment is covered up to the Sum Insured.";
        let q = "What is the extent of coverage for AYUSH treatments?";
        let a = answer(text, q);
        assert!(a.starts_with("AYUSH coverage found: "));
        assert!(a.contains("AYUSH Treatment is covered"));
    }

    #[test]
    fn test_context_window_is_bounded() {
        let padding = "x".repeat(3000);
        let text = format!("{} maternity benefits apply {}", padding, padding);
        let a = answer_category(&text, RuleCategory::Maternity);
        let context = a.trim_start_matches("Maternity coverage found: ");
        assert!(context.chars().count() <= 2000 + "maternity benefits".len());
        assert!(context.contains("maternity benefits"));
    }

    #[test]
    fn test_maternity_exclusion_fallback() {
        let text = "Exclusions\nMaternity\nis not payable";
        let a = answer_category(text, RuleCategory::Maternity);
        assert!(a.starts_with("Maternity coverage status: "));
    }

    #[test]
    fn test_hospital_definition_sentence() {
        let text = "Definitions\nHospital means any institution established for in-patient care and day care treatment of illness and/or injuries and which has been registered as a hospital. Other text follows.";
        let q = "How does the policy define a 'Hospital'?";
        let a = answer(text, q);
        assert!(a.starts_with("Hospital Definition: Hospital means any institution"));
        assert!(a.ends_with("registered as a hospital."));
    }

    #[test]
    fn test_multibyte_text_does_not_panic() {
        let text = "Ünïcödé İ grace period 15 days ✓ premium";
        let q = "What is the grace period for premium payment?";
        assert_eq!(answer(text, q), "Grace period: 15 days");
        let a = answer_category(text, RuleCategory::Maternity);
        assert_eq!(a, NOT_FOUND);
    }

    #[test]
    fn test_deterministic() {
        let text = "Room rent is subject to a sub-limit of 1% of Sum Insured.";
        let q = "Are there any sub-limits on room rent and ICU charges for Plan A?";
        let first = answer(text, q);
        for _ in 0..5 {
            assert_eq!(answer(text, q), first);
        }
        assert!(first.starts_with("Room rent/ICU sub-limits found: "));
    }
}
