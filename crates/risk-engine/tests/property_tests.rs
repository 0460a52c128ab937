//! Property-based tests for the risk engine
//!
//! Covers the classifier's contract over arbitrary input:
//! - determinism
//! - risk monotonicity when high-weight text is appended
//! - confidence bounds
//! - indicator ordering
//! - identical results across threads sharing one engine

use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use risk_engine::RiskEngine;
use shared_types::{AnalysisResult, ComplianceStatus, RiskLevel};

/// Clause fragments drawn from the built-in vocabulary plus neutral filler
fn clause() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("The parties agree to cooperate.".to_string()),
        Just("Any breach shall incur a penalty.".to_string()),
        Just("Liability is limited to direct damages.".to_string()),
        Just("Either party may terminate on notice.".to_string()),
        Just("Disputes go to binding arbitration.".to_string()),
        Just("This is a violation of applicable law.".to_string()),
        Just("Personal data is processed under GDPR.".to_string()),
        Just("Fees may change from time to time.".to_string()),
        Just("Delivery is scheduled for spring.".to_string()),
        "[a-z ]{0,40}",
    ]
}

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(clause(), 0..20).prop_map(|clauses| clauses.join(" "))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn classification_is_deterministic(text in document()) {
        let engine = RiskEngine::default();
        prop_assert_eq!(engine.classify(&text), engine.classify(&text));
    }

    #[test]
    fn classify_never_panics_on_arbitrary_unicode(text in "\\PC{0,500}") {
        let engine = RiskEngine::default();
        let result = engine.classify(&text);
        prop_assert!(result.confidence_score <= 100);
    }

    #[test]
    fn appending_high_weight_text_never_lowers_risk(
        text in document(),
        extra in prop::collection::vec(
            prop_oneof![
                Just(" criminal prosecution"),
                Just(" a penalty applies"),
                Just(" this is unlawful"),
            ],
            1..5,
        )
    ) {
        let engine = RiskEngine::default();
        let before = engine.classify(&text);
        let after = engine.classify(&format!("{}{}", text, extra.concat()));

        prop_assert!(after.risk_level >= before.risk_level);
        prop_assert!(after.risk_score >= before.risk_score);
    }

    #[test]
    fn confidence_is_bounded(text in document()) {
        let result = RiskEngine::default().classify(&text);
        prop_assert!(result.confidence_score <= 95);
        if result.matched_indicators.is_empty() {
            prop_assert_eq!(result.confidence_score, 0);
            prop_assert_eq!(result.risk_level, RiskLevel::Low);
            prop_assert_eq!(result.compliance_status, ComplianceStatus::Compliant);
        } else {
            prop_assert!(result.confidence_score >= 20);
        }
    }

    #[test]
    fn indicators_are_sorted_and_point_into_text(text in document()) {
        let result = RiskEngine::default().classify(&text);
        let positions: Vec<usize> = result.matched_indicators.iter().map(|i| i.position).collect();
        prop_assert!(positions.windows(2).all(|w| w[0] <= w[1]));

        for indicator in &result.matched_indicators {
            let end = indicator.position + indicator.matched_text.len();
            prop_assert_eq!(&text[indicator.position..end], indicator.matched_text.as_str());
        }
    }

    #[test]
    fn any_violation_means_non_compliant(prefix in document(), suffix in document()) {
        let text = format!("{} illegal {}", prefix, suffix);
        let result = RiskEngine::default().classify(&text);
        prop_assert_eq!(result.compliance_status, ComplianceStatus::NonCompliant);
    }
}

const THREADS: usize = 8;

/// Classify every text on `THREADS` threads through one shared engine
fn classify_on_threads(engine: &Arc<RiskEngine>, texts: &[String]) -> Vec<Vec<AnalysisResult>> {
    let texts = Arc::new(texts.to_vec());
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let engine = Arc::clone(engine);
            let texts = Arc::clone(&texts);
            thread::spawn(move || texts.iter().map(|t| engine.classify(t)).collect::<Vec<_>>())
        })
        .collect();

    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn shared_engine_classifies_identically_across_threads() {
    let engine = Arc::new(RiskEngine::default());
    let texts: Vec<String> = vec![
        "Any breach shall incur a penalty and criminal prosecution.".to_string(),
        "Personal data is processed under GDPR.".to_string(),
        "The parties agree to cooperate.".to_string(),
        String::new(),
    ];
    let expected: Vec<_> = texts.iter().map(|t| engine.classify(t)).collect();

    for per_thread in classify_on_threads(&engine, &texts) {
        assert_eq!(per_thread, expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn threads_agree_on_generated_documents(texts in prop::collection::vec(document(), 1..6)) {
        let engine = Arc::new(RiskEngine::default());
        let expected: Vec<_> = texts.iter().map(|t| engine.classify(t)).collect();

        for per_thread in classify_on_threads(&engine, &texts) {
            prop_assert_eq!(per_thread, expected.clone());
        }
    }
}
