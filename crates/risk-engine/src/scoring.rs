//! Score aggregation
//!
//! Every threshold and weight here is a fixed constant and part of the
//! classifier's tested contract.

use shared_types::{Category, ComplianceSignal, ComplianceStatus, RiskLevel};

/// Matches beyond this count add nothing to a category's risk contribution
pub const MAX_COUNTED_MATCHES: u32 = 3;

/// Scores below this are LOW
pub const MEDIUM_RISK_THRESHOLD: u32 = 10;

/// Scores at or above this are HIGH
pub const HIGH_RISK_THRESHOLD: u32 = 25;

/// Confidence reported when nothing matched
pub const CONFIDENCE_FLOOR: u8 = 0;
pub const CONFIDENCE_BASE: u32 = 20;
pub const CONFIDENCE_CEILING: u32 = 95;
pub const MAX_EVIDENCE_POINTS: u32 = 50;
pub const MAX_COVERAGE_POINTS: u32 = 25;
pub const WORDS_PER_COVERAGE_POINT: usize = 40;

/// Texts shorter than this many words are capped at [`SHORT_TEXT_CONFIDENCE_CAP`]
pub const SHORT_TEXT_WORDS: usize = 25;
pub const SHORT_TEXT_CONFIDENCE_CAP: u32 = 40;

/// Per-category match count for one classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryTally {
    pub category: Category,
    pub weight: u32,
    pub signal: ComplianceSignal,
    pub count: u32,
}

pub fn risk_score(tallies: &[CategoryTally]) -> u32 {
    tallies.iter().fold(0u32, |acc, t| {
        acc.saturating_add(t.weight.saturating_mul(t.count.min(MAX_COUNTED_MATCHES)))
    })
}

pub fn risk_level_for(score: u32) -> RiskLevel {
    if score < MEDIUM_RISK_THRESHOLD {
        RiskLevel::Low
    } else if score < HIGH_RISK_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

pub fn compliance_status_for(tallies: &[CategoryTally]) -> ComplianceStatus {
    let matched = |signal: ComplianceSignal| {
        tallies
            .iter()
            .any(|t| t.signal == signal && t.count > 0)
    };

    if matched(ComplianceSignal::Violation) {
        ComplianceStatus::NonCompliant
    } else if matched(ComplianceSignal::Review) {
        ComplianceStatus::ReviewRequired
    } else {
        ComplianceStatus::Compliant
    }
}

pub fn confidence_score(tallies: &[CategoryTally], word_count: usize) -> u8 {
    let matched: Vec<&CategoryTally> = tallies.iter().filter(|t| t.count > 0).collect();
    if matched.is_empty() {
        return CONFIDENCE_FLOOR;
    }

    let evidence = matched
        .iter()
        .fold(0u32, |acc, t| acc.saturating_add(t.weight).saturating_add(t.count))
        .min(MAX_EVIDENCE_POINTS);
    let coverage = ((word_count / WORDS_PER_COVERAGE_POINT) as u32).min(MAX_COVERAGE_POINTS);

    let mut score = (CONFIDENCE_BASE + evidence + coverage).min(CONFIDENCE_CEILING);
    if word_count < SHORT_TEXT_WORDS {
        score = score.min(SHORT_TEXT_CONFIDENCE_CAP);
    }

    score as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(category: Category, weight: u32, signal: ComplianceSignal, count: u32) -> CategoryTally {
        CategoryTally {
            category,
            weight,
            signal,
            count,
        }
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(risk_level_for(0), RiskLevel::Low);
        assert_eq!(risk_level_for(MEDIUM_RISK_THRESHOLD - 1), RiskLevel::Low);
        assert_eq!(risk_level_for(MEDIUM_RISK_THRESHOLD), RiskLevel::Medium);
        assert_eq!(risk_level_for(HIGH_RISK_THRESHOLD - 1), RiskLevel::Medium);
        assert_eq!(risk_level_for(HIGH_RISK_THRESHOLD), RiskLevel::High);
    }

    #[test]
    fn test_repeated_matches_are_capped_per_category() {
        let few = [tally(Category::Penalty, 8, ComplianceSignal::None, 3)];
        let many = [tally(Category::Penalty, 8, ComplianceSignal::None, 300)];
        assert_eq!(risk_score(&few), 24);
        assert_eq!(risk_score(&many), 24);
    }

    #[test]
    fn test_scores_sum_across_categories() {
        let tallies = [
            tally(Category::Penalty, 8, ComplianceSignal::None, 1),
            tally(Category::Liability, 5, ComplianceSignal::None, 2),
        ];
        assert_eq!(risk_score(&tallies), 18);
    }

    #[test]
    fn test_violation_outranks_review() {
        let tallies = [
            tally(Category::Ambiguous, 1, ComplianceSignal::Review, 4),
            tally(Category::RegulatoryViolation, 10, ComplianceSignal::Violation, 1),
        ];
        assert_eq!(compliance_status_for(&tallies), ComplianceStatus::NonCompliant);
        assert_eq!(
            compliance_status_for(&tallies[..1]),
            ComplianceStatus::ReviewRequired
        );
        assert_eq!(compliance_status_for(&[]), ComplianceStatus::Compliant);
    }

    #[test]
    fn test_confidence_floor_without_matches() {
        assert_eq!(confidence_score(&[], 0), CONFIDENCE_FLOOR);
        assert_eq!(confidence_score(&[], 10_000), CONFIDENCE_FLOOR);
    }

    #[test]
    fn test_confidence_short_text_cap() {
        let tallies = [tally(Category::Criminal, 10, ComplianceSignal::None, 2)];
        // 20 + (10 + 2) = 32, under the cap
        assert_eq!(confidence_score(&tallies, 5), 32);

        let heavy = [
            tally(Category::Criminal, 10, ComplianceSignal::None, 2),
            tally(Category::Penalty, 8, ComplianceSignal::None, 2),
        ];
        assert_eq!(confidence_score(&heavy, 5), SHORT_TEXT_CONFIDENCE_CAP as u8);
    }

    #[test]
    fn test_confidence_ceiling() {
        let tallies: Vec<_> = Category::ALL
            .iter()
            .map(|c| tally(*c, 10, ComplianceSignal::None, 10))
            .collect();
        assert_eq!(confidence_score(&tallies, 100_000), CONFIDENCE_CEILING as u8);
    }

    #[test]
    fn test_confidence_grows_with_categories() {
        let one = [tally(Category::Liability, 5, ComplianceSignal::None, 1)];
        let two = [
            tally(Category::Liability, 5, ComplianceSignal::None, 1),
            tally(Category::Termination, 6, ComplianceSignal::None, 1),
        ];
        assert!(confidence_score(&two, 200) > confidence_score(&one, 200));
    }
}
