//! Narrative insights derived from an analysis: key terms, business impact,
//! recommendations and a one-line summary.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use shared_types::{AgreementType, AnalysisResult, ComplianceStatus, DocumentInsights, RiskLevel};

use crate::patterns::{
    title_case, word_count, BUSINESS_TERMS, COMPLIANCE_TERMS, FALLBACK_KEY_TERMS,
    FINANCIAL_IMPACT_PATTERN, FINANCIAL_TERMS, LEGAL_TERMS, MAX_KEY_TERMS,
    OPERATIONAL_IMPACT_PATTERN, REGULATORY_IMPACT_PATTERN, STRATEGIC_IMPACT_PATTERN,
};

/// Areas scoring above this many matches per 100 words are reported
const IMPACT_AREA_THRESHOLD: f64 = 2.5;
const MODERATE_IMPACT_THRESHOLD: f64 = 1.5;
const MAX_RECOMMENDATIONS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImpactArea {
    Financial,
    Operational,
    Strategic,
    Regulatory,
}

impl ImpactArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactArea::Financial => "Financial",
            ImpactArea::Operational => "Operational",
            ImpactArea::Strategic => "Strategic",
            ImpactArea::Regulatory => "Regulatory",
        }
    }
}

fn impact_regex(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("impact pattern must compile")
}

lazy_static! {
    static ref IMPACT_PATTERNS: Vec<(ImpactArea, Regex)> = vec![
        (ImpactArea::Financial, impact_regex(FINANCIAL_IMPACT_PATTERN)),
        (ImpactArea::Operational, impact_regex(OPERATIONAL_IMPACT_PATTERN)),
        (ImpactArea::Strategic, impact_regex(STRATEGIC_IMPACT_PATTERN)),
        (ImpactArea::Regulatory, impact_regex(REGULATORY_IMPACT_PATTERN)),
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessImpact {
    /// Areas above the reporting threshold, in fixed area order
    pub areas: Vec<ImpactArea>,
    /// Highest per-100-word density across all areas
    pub peak_density: f64,
    pub label: String,
}

impl BusinessImpact {
    pub fn has(&self, area: ImpactArea) -> bool {
        self.areas.contains(&area)
    }
}

/// Title-cased vocabulary terms present in the text, at most [`MAX_KEY_TERMS`]
pub fn extract_key_terms(text: &str) -> Vec<String> {
    let text_lower = text.to_lowercase();

    let mut terms: Vec<String> = [LEGAL_TERMS, FINANCIAL_TERMS, BUSINESS_TERMS, COMPLIANCE_TERMS]
        .iter()
        .flat_map(|vocab| vocab.iter())
        .filter(|term| text_lower.contains(*term))
        .map(|term| title_case(term))
        .collect();
    terms.dedup();
    terms.truncate(MAX_KEY_TERMS);

    if terms.is_empty() {
        FALLBACK_KEY_TERMS.iter().map(|t| t.to_string()).collect()
    } else {
        terms
    }
}

pub fn assess_business_impact(text: &str) -> BusinessImpact {
    let words = word_count(text);
    let densities: Vec<(ImpactArea, f64)> = IMPACT_PATTERNS
        .iter()
        .map(|(area, re)| {
            let hits = re.find_iter(text).count() as f64;
            let density = if words > 0 {
                hits * 100.0 / words as f64
            } else {
                0.0
            };
            (*area, density)
        })
        .collect();

    let peak_density = densities.iter().map(|(_, d)| *d).fold(0.0, f64::max);
    if peak_density == 0.0 {
        return BusinessImpact {
            areas: Vec::new(),
            peak_density,
            label: "Standard business operations".to_string(),
        };
    }

    let areas: Vec<ImpactArea> = densities
        .iter()
        .filter(|(_, d)| *d > IMPACT_AREA_THRESHOLD)
        .map(|(a, _)| *a)
        .collect();

    let headline = if areas.is_empty() {
        if peak_density > MODERATE_IMPACT_THRESHOLD {
            "Moderate".to_string()
        } else {
            "Limited".to_string()
        }
    } else {
        areas
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let description = impact_description(&areas, peak_density);
    BusinessImpact {
        areas,
        peak_density,
        label: format!("{} - {}", headline, description),
    }
}

fn impact_description(areas: &[ImpactArea], peak: f64) -> &'static str {
    let strong = peak > 3.0;
    if strong && areas.contains(&ImpactArea::Financial) {
        "Significant financial implications"
    } else if strong && areas.contains(&ImpactArea::Strategic) {
        "Strategic business decisions required"
    } else if strong && areas.contains(&ImpactArea::Regulatory) {
        "Regulatory compliance critical"
    } else if strong && areas.contains(&ImpactArea::Operational) {
        "Operational processes affected"
    } else if peak > 2.0 {
        "Moderate business impact"
    } else {
        "Standard business impact"
    }
}

pub fn recommendations(result: &AnalysisResult, impact: &BusinessImpact) -> Vec<String> {
    let mut out: Vec<&str> = Vec::new();

    match result.risk_level {
        RiskLevel::High => out.extend([
            "Immediate legal review required",
            "Implement risk mitigation strategies",
            "Monitor for potential breaches",
        ]),
        RiskLevel::Medium => out.extend([
            "Schedule legal review within 30 days",
            "Review risk factors quarterly",
        ]),
        RiskLevel::Low => out.push("Standard review process"),
    }

    match result.compliance_status {
        ComplianceStatus::NonCompliant => out.extend([
            "Urgent compliance review needed",
            "Implement compliance monitoring",
        ]),
        ComplianceStatus::ReviewRequired => out.push("Schedule compliance review"),
        ComplianceStatus::Compliant => out.push("Maintain current compliance standards"),
    }

    if impact.has(ImpactArea::Financial) {
        out.push("Financial impact assessment required");
    }
    if impact.has(ImpactArea::Strategic) {
        out.push("Executive review recommended");
    }
    if impact.has(ImpactArea::Regulatory) {
        out.push("Legal compliance verification");
    }

    out.truncate(MAX_RECOMMENDATIONS);
    out.into_iter().map(String::from).collect()
}

pub fn summarize(
    agreement_type: AgreementType,
    result: &AnalysisResult,
    impact: &BusinessImpact,
) -> String {
    let doc_type = match agreement_type {
        AgreementType::Other => "Document",
        other => other.as_str(),
    };

    format!(
        "{} with {} risk level. {} compliance status. {} business impact.",
        doc_type,
        result.risk_level.as_str().to_lowercase(),
        result.compliance_status.as_str().replace('_', " ").to_lowercase(),
        impact.label.to_lowercase(),
    )
}

/// Build the full insight bundle for one analysed document
pub fn generate_insights(
    text: &str,
    agreement_type: AgreementType,
    result: &AnalysisResult,
) -> DocumentInsights {
    let impact = assess_business_impact(text);
    DocumentInsights {
        summary: summarize(agreement_type, result, &impact),
        key_terms: extract_key_terms(text),
        recommendations: recommendations(result, &impact),
        business_impact: impact.label,
    }
}
