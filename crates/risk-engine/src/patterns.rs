//! Vocabularies used by the insight generators

/// Contract vocabulary
pub const LEGAL_TERMS: &[&str] = &[
    "contract",
    "agreement",
    "terms",
    "conditions",
    "clause",
    "section",
    "party",
    "parties",
    "obligation",
    "liability",
    "breach",
    "termination",
    "renewal",
    "amendment",
    "waiver",
    "indemnification",
    "governing law",
];

/// Money-related vocabulary
pub const FINANCIAL_TERMS: &[&str] = &[
    "payment",
    "fee",
    "cost",
    "price",
    "amount",
    "revenue",
    "profit",
    "loss",
    "budget",
    "investment",
    "funding",
    "currency",
    "dollar",
];

/// Corporate strategy vocabulary
pub const BUSINESS_TERMS: &[&str] = &[
    "partnership",
    "collaboration",
    "joint venture",
    "merger",
    "acquisition",
    "market",
    "competition",
    "strategy",
    "growth",
    "expansion",
];

/// Regulatory vocabulary
pub const COMPLIANCE_TERMS: &[&str] = &[
    "compliance",
    "regulation",
    "legal",
    "statute",
    "requirement",
    "license",
    "permit",
    "certification",
    "accreditation",
    "audit",
];

/// Returned when no vocabulary term is present
pub const FALLBACK_KEY_TERMS: &[&str] = &["Legal Document", "Agreement"];

pub const MAX_KEY_TERMS: usize = 8;

pub const FINANCIAL_IMPACT_PATTERN: &str = r"\b(?:revenue|profit|loss|cost|expense|budget|investment|funding|dollar|euro|pound|currency|amount|value|price|fee|payment)\b";

pub const OPERATIONAL_IMPACT_PATTERN: &str = r"\b(?:operation|process|efficiency|productivity|workflow|procedure|resource|staff|personnel|equipment|infrastructure|maintenance)\b";

pub const STRATEGIC_IMPACT_PATTERN: &str = r"\b(?:market|competition|strategy|growth|expansion|partnership|merger|acquisition|joint\s+venture|alliance|collaboration|exit)\b";

pub const REGULATORY_IMPACT_PATTERN: &str = r"\b(?:regulation|compliance|legal|statute|law|requirement|mandatory|license|permit|certification|accreditation|audit|inspection)\b";

/// Title-case every whitespace-separated word ("governing law" -> "Governing Law")
pub fn title_case(term: &str) -> String {
    term.split_whitespace()
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

/// Count whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("governing law"), "Governing Law");
        assert_eq!(title_case("fee"), "Fee");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("  one\ttwo\nthree  "), 3);
    }
}
