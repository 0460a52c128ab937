//! Risk and compliance classifier for extracted legal document text.
//!
//! [`RiskEngine::classify`] runs every rule of a compiled [`RuleSet`] over the
//! text and folds the matches into an [`AnalysisResult`]. It is a pure function
//! of its input: no I/O, no shared mutable state, safe to call from any number
//! of threads at once.

pub mod extractors;
pub mod insights;
pub mod patterns;
pub mod rules;
pub mod scoring;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared_types::{AnalysisResult, DocumentInsights, DocumentMetadata, Indicator};

pub use rules::{builtin_definitions, builtin_rules, Rule, RuleDefinition, RuleError, RuleSet};
pub use scoring::{
    CategoryTally, CONFIDENCE_FLOOR, HIGH_RISK_THRESHOLD, MAX_COUNTED_MATCHES,
    MEDIUM_RISK_THRESHOLD,
};

/// Everything derived from one document's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub result: AnalysisResult,
    pub insights: DocumentInsights,
    pub metadata: DocumentMetadata,
}

/// RiskEngine entry point
#[derive(Debug, Clone)]
pub struct RiskEngine {
    rules: Arc<RuleSet>,
}

impl RiskEngine {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn classify(&self, text: &str) -> AnalysisResult {
        // (indicator, match end) so equal starts order by category, then end
        let mut hits: Vec<(Indicator, usize)> = Vec::new();
        let mut tallies: Vec<CategoryTally> = Vec::with_capacity(self.rules.len());

        for rule in self.rules.rules() {
            let mut count = 0u32;
            for m in rule.pattern.find_iter(text) {
                hits.push((
                    Indicator {
                        category: rule.category,
                        matched_text: m.as_str().to_string(),
                        position: m.start(),
                    },
                    m.end(),
                ));
                count = count.saturating_add(1);
            }

            if count > 0 {
                tallies.push(CategoryTally {
                    category: rule.category,
                    weight: rule.weight,
                    signal: rule.signal,
                    count,
                });
            }
        }

        hits.sort_by(|(a, a_end), (b, b_end)| {
            a.position
                .cmp(&b.position)
                .then(a.category.cmp(&b.category))
                .then(a_end.cmp(b_end))
        });

        let risk_score = scoring::risk_score(&tallies);
        let result = AnalysisResult {
            risk_level: scoring::risk_level_for(risk_score),
            compliance_status: scoring::compliance_status_for(&tallies),
            matched_indicators: hits.into_iter().map(|(indicator, _)| indicator).collect(),
            confidence_score: scoring::confidence_score(&tallies, patterns::word_count(text)),
            risk_score,
        };

        tracing::debug!(
            risk_score,
            indicators = result.matched_indicators.len(),
            "Classified text as {} / {}",
            result.risk_level,
            result.compliance_status
        );

        result
    }

    /// Classify and derive insights and metadata in one pass
    pub fn analyze(&self, text: &str) -> DocumentAnalysis {
        let result = self.classify(text);
        let metadata = extractors::extract_metadata(text);
        let insights = insights::generate_insights(text, metadata.agreement_type, &result);

        DocumentAnalysis {
            result,
            insights,
            metadata,
        }
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new(builtin_rules())
    }
}
