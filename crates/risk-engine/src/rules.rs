//! Rule table and rule-set compilation
//!
//! A [`RuleSet`] is compiled once at startup and shared read-only. Any bad
//! definition (malformed regex, duplicate category, zero weight) fails the
//! whole load with a [`RuleError`]; there is no per-call error path.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use shared_types::{Category, ComplianceSignal};
use thiserror::Error;

/// Upper bound on the compiled size of a single rule pattern
pub const PATTERN_SIZE_LIMIT: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid pattern for {category}: {source}")]
    InvalidPattern {
        category: Category,
        #[source]
        source: regex::Error,
    },

    #[error("duplicate rule for category {0}")]
    DuplicateCategory(Category),

    #[error("rule for {0} has zero weight")]
    ZeroWeight(Category),

    #[error("rule set contains no rules")]
    Empty,

    #[error("failed to read rules file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rules file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Uncompiled rule, as written in the built-in table or a JSON rules file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub category: Category,
    pub pattern: String,
    pub weight: u32,
    #[serde(default)]
    pub signal: ComplianceSignal,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub category: Category,
    pub pattern: Regex,
    pub weight: u32,
    pub signal: ComplianceSignal,
}

impl Rule {
    fn compile(def: &RuleDefinition) -> Result<Self, RuleError> {
        if def.weight == 0 {
            return Err(RuleError::ZeroWeight(def.category));
        }

        let pattern = RegexBuilder::new(&def.pattern)
            .case_insensitive(true)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|source| RuleError::InvalidPattern {
                category: def.category,
                source,
            })?;

        Ok(Self {
            category: def.category,
            pattern,
            weight: def.weight,
            signal: def.signal,
        })
    }
}

/// Immutable, compiled collection of rules, one per category
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn compile(definitions: &[RuleDefinition]) -> Result<Self, RuleError> {
        if definitions.is_empty() {
            return Err(RuleError::Empty);
        }

        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(definitions.len());
        for def in definitions {
            if !seen.insert(def.category) {
                return Err(RuleError::DuplicateCategory(def.category));
            }
            rules.push(Rule::compile(def)?);
        }
        rules.sort_by_key(|r| r.category);

        tracing::debug!("Compiled {} classification rules", rules.len());
        Ok(Self { rules })
    }

    /// Compile the built-in rule table
    pub fn builtin() -> Result<Self, RuleError> {
        Self::compile(&builtin_definitions())
    }

    pub fn from_json_str(json: &str) -> Result<Self, RuleError> {
        let definitions: Vec<RuleDefinition> = serde_json::from_str(json)?;
        Self::compile(&definitions)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, category: Category) -> Option<&Rule> {
        self.rules.iter().find(|r| r.category == category)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// (category, pattern, weight, signal)
const BUILTIN_RULES: &[(Category, &str, u32, ComplianceSignal)] = &[
    (
        Category::Penalty,
        r"\b(?:penalt(?:y|ies)|liquidated\s+damages|damages|forfeitures?|sanctions?|fines?)\b",
        8,
        ComplianceSignal::None,
    ),
    (
        Category::Criminal,
        r"\b(?:criminal|felon(?:y|ies)|misdemeanou?rs?|prosecutions?)\b",
        10,
        ComplianceSignal::None,
    ),
    (
        Category::Litigation,
        r"\b(?:litigation|lawsuits?|arbitration|mediation|disputes?)\b",
        7,
        ComplianceSignal::None,
    ),
    (
        Category::Indemnification,
        r"\b(?:indemnif(?:y|ies|ied|ication)|indemnit(?:y|ies)|hold\s+harmless|force\s+majeure)\b",
        7,
        ComplianceSignal::None,
    ),
    (
        Category::Termination,
        r"\b(?:terminat(?:e|es|ed|ion)|cancell?ations?|void|invalid|unenforceable)\b",
        6,
        ComplianceSignal::None,
    ),
    (
        Category::Breach,
        r"\b(?:breach(?:es|ed)?|defaults?|non-performance|failure\s+to\s+perform)\b",
        6,
        ComplianceSignal::None,
    ),
    (
        Category::Liability,
        r"\b(?:liabilit(?:y|ies)|warrant(?:y|ies)|guarantees?|obligations?)\b",
        5,
        ComplianceSignal::None,
    ),
    (
        Category::IntellectualProperty,
        r"\b(?:intellectual\s+property|patents?|copyrights?|trademarks?|licen[cs]es?)\b",
        4,
        ComplianceSignal::None,
    ),
    (
        Category::Confidentiality,
        r"\b(?:confidentiality|non-disclosure|trade\s+secrets?|proprietary)\b",
        3,
        ComplianceSignal::None,
    ),
    (
        Category::RegulatoryViolation,
        r"\b(?:violations?|non-?complian(?:ce|t)|unlawful|illegal)\b",
        10,
        ComplianceSignal::Violation,
    ),
    (
        Category::Regulatory,
        r"\b(?:regulatory|statutory|mandatory|audits?|inspections?|certifications?)\b",
        3,
        ComplianceSignal::Review,
    ),
    (
        Category::DataProtection,
        r"\b(?:data\s+protection|privacy|personal\s+data|gdpr|ccpa|hipaa)\b",
        4,
        ComplianceSignal::Review,
    ),
    (
        Category::Ambiguous,
        r"\b(?:reasonable\s+efforts|best\s+efforts|as\s+appropriate|to\s+be\s+determined|tbd|subject\s+to\s+change|sole\s+discretion|from\s+time\s+to\s+time)\b",
        1,
        ComplianceSignal::Review,
    ),
];

/// The built-in rule table as serializable definitions
pub fn builtin_definitions() -> Vec<RuleDefinition> {
    BUILTIN_RULES
        .iter()
        .map(|(category, pattern, weight, signal)| RuleDefinition {
            category: *category,
            pattern: (*pattern).to_string(),
            weight: *weight,
            signal: *signal,
        })
        .collect()
}

lazy_static! {
    static ref BUILTIN_RULE_SET: Arc<RuleSet> =
        Arc::new(RuleSet::builtin().expect("built-in rule table must compile"));
}

/// Shared handle to the compiled built-in rules
pub fn builtin_rules() -> Arc<RuleSet> {
    Arc::clone(&BUILTIN_RULE_SET)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(category: Category, pattern: &str, weight: u32) -> RuleDefinition {
        RuleDefinition {
            category,
            pattern: pattern.to_string(),
            weight,
            signal: ComplianceSignal::None,
        }
    }

    #[test]
    fn test_builtin_table_compiles_with_every_category() {
        let rules = RuleSet::builtin().unwrap();
        assert_eq!(rules.len(), Category::ALL.len());
        for category in Category::ALL {
            assert!(rules.get(category).is_some(), "missing rule for {}", category);
        }
    }

    #[test]
    fn test_rules_are_sorted_by_category() {
        let rules = RuleSet::compile(&[
            def(Category::Liability, r"\bliability\b", 5),
            def(Category::Penalty, r"\bpenalty\b", 8),
        ])
        .unwrap();
        let order: Vec<_> = rules.rules().iter().map(|r| r.category).collect();
        assert_eq!(order, vec![Category::Penalty, Category::Liability]);
    }

    #[test]
    fn test_patterns_are_case_insensitive() {
        let rules = builtin_rules();
        let penalty = rules.get(Category::Penalty).unwrap();
        assert!(penalty.pattern.is_match("LIQUIDATED DAMAGES apply"));
        let data = rules.get(Category::DataProtection).unwrap();
        assert!(data.pattern.is_match("Processing under gdpr"));
    }

    #[test]
    fn test_word_boundaries_prevent_partial_matches() {
        let rules = builtin_rules();
        let penalty = rules.get(Category::Penalty).unwrap();
        assert!(!penalty.pattern.is_match("the finest refinery"));
        let violation = rules.get(Category::RegulatoryViolation).unwrap();
        assert!(!violation.pattern.is_match("the violin section"));
    }

    #[test]
    fn test_malformed_pattern_is_load_error() {
        let err = RuleSet::compile(&[def(Category::Penalty, r"(unclosed", 8)]).unwrap_err();
        assert!(matches!(
            err,
            RuleError::InvalidPattern {
                category: Category::Penalty,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_category_is_load_error() {
        let err = RuleSet::compile(&[
            def(Category::Penalty, r"\bpenalty\b", 8),
            def(Category::Penalty, r"\bfine\b", 8),
        ])
        .unwrap_err();
        assert!(matches!(err, RuleError::DuplicateCategory(Category::Penalty)));
    }

    #[test]
    fn test_zero_weight_and_empty_are_load_errors() {
        assert!(matches!(
            RuleSet::compile(&[def(Category::Penalty, r"\bpenalty\b", 0)]),
            Err(RuleError::ZeroWeight(Category::Penalty))
        ));
        assert!(matches!(RuleSet::compile(&[]), Err(RuleError::Empty)));
    }

    #[test]
    fn test_json_rules_file_format() {
        let json = r#"[
            {"category": "PENALTY", "pattern": "\\bpenalty\\b", "weight": 8},
            {"category": "REGULATORY_VIOLATION", "pattern": "\\bviolation\\b", "weight": 10, "signal": "violation"}
        ]"#;
        let rules = RuleSet::from_json_str(json).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.get(Category::Penalty).unwrap().signal, ComplianceSignal::None);
        assert_eq!(
            rules.get(Category::RegulatoryViolation).unwrap().signal,
            ComplianceSignal::Violation
        );
    }

    #[test]
    fn test_json_parse_failure_and_missing_file() {
        assert!(matches!(
            RuleSet::from_json_str("{not json"),
            Err(RuleError::Parse(_))
        ));
        assert!(matches!(
            RuleSet::from_path("/definitely/not/here.json"),
            Err(RuleError::Io { .. })
        ));
    }

    #[test]
    fn test_builtin_definitions_round_trip_through_json() {
        let json = serde_json::to_string(&builtin_definitions()).unwrap();
        let rules = RuleSet::from_json_str(&json).unwrap();
        assert_eq!(rules.len(), BUILTIN_RULES.len());
    }
}
