//! Natural-language questions over stored documents
//!
//! A question is reduced to a [`QueryIntent`]: structured filters pulled out
//! of the wording plus the kind of answer wanted. Documents failing any
//! filter are dropped and the rest are ranked by how much of the question
//! they match. Optional comparison and analysis sections describe the
//! matching set as a whole.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use risk_engine::extractors::{
    detect_agreement_type, detect_geography, detect_industry, detect_jurisdiction,
};
use serde::{Deserialize, Serialize};
use shared_types::{AgreementType, ComplianceStatus, Geography, Industry, Jurisdiction, RiskLevel};

use crate::models::{Document, DocumentSummary};

/// Ranked results returned for a targeted question
pub const MAX_RESULTS: usize = 30;
/// Newest documents returned when nothing in a general question matches
pub const GENERAL_RESULTS: usize = 20;

const AGREEMENT_WEIGHT: f64 = 8.0;
const JURISDICTION_WEIGHT: f64 = 8.0;
const INDUSTRY_WEIGHT: f64 = 6.0;
const GEOGRAPHY_WEIGHT: f64 = 6.0;
const RISK_WEIGHT: f64 = 4.0;
const COMPLIANCE_WEIGHT: f64 = 4.0;
const PARTY_WEIGHT: f64 = 3.0;
const TERM_WEIGHT: f64 = 0.5;

/// Words too common in questions to say anything about a document
const STOP_WORDS: &[&str] = &[
    "about", "agreement", "agreements", "all", "also", "among", "and", "are", "contract",
    "contracts", "document", "documents", "does", "find", "for", "from", "give", "have", "list",
    "me", "our", "show", "that", "the", "their", "them", "there", "these", "this", "those",
    "what", "where", "which", "who", "with",
];

lazy_static! {
    static ref RISK_LEVEL_PATTERN: Regex =
        Regex::new(r"(?i)\b(?P<level>high|medium|moderate|low)[-\s]+risk\b").unwrap();
    static ref RISKY_PATTERN: Regex =
        Regex::new(r"(?i)\b(?:risky|riskiest|dangerous)\b").unwrap();
    static ref RISK_TOPIC_PATTERN: Regex = Regex::new(r"(?i)\b(?:risks?|risky|riskiest)\b").unwrap();

    static ref NON_COMPLIANT_PATTERN: Regex =
        Regex::new(r"(?i)\b(?:non[-\s]?complian(?:t|ce)|violat\w*)\b").unwrap();
    static ref REVIEW_PATTERN: Regex =
        Regex::new(r"(?i)\b(?:(?:needs?|requires?|required)\s+review|review[-\s]required)\b").unwrap();
    static ref COMPLIANT_PATTERN: Regex = Regex::new(r"(?i)\bcompliant\b").unwrap();
    static ref COMPLIANCE_TOPIC_PATTERN: Regex =
        Regex::new(r"(?i)\b(?:complian(?:t|ce)|regulat\w*)\b").unwrap();

    static ref PARTY_PATTERN: Regex = Regex::new(
        r"\b(?:with|between|involving|involve|involves|party|parties)\s+(?P<name>[A-Z][A-Za-z0-9&'-]*(?:\s+[A-Z][A-Za-z0-9&'-]*)*)"
    )
    .unwrap();

    static ref COMPARISON_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:compare|comparison|comparing|versus|vs|differences?|differ|similarit(?:y|ies)|contrast)\b"
    )
    .unwrap();
    static ref ANALYSIS_PATTERN: Regex =
        Regex::new(r"(?i)\b(?:analy[sz]e|analysis|assess|assessment|evaluate|breakdown)\b").unwrap();
    static ref SUMMARY_PATTERN: Regex =
        Regex::new(r"(?i)\b(?:summary|summari[sz]e|overview)\b").unwrap();

    static ref WORD_PATTERN: Regex = Regex::new(r"[A-Za-z][A-Za-z0-9'-]*").unwrap();
}

/// Structured constraints; every set field must match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilters {
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub compliance_status: Option<ComplianceStatus>,
    #[serde(default)]
    pub agreement_type: Option<AgreementType>,
    #[serde(default)]
    pub jurisdiction: Option<Jurisdiction>,
    #[serde(default)]
    pub industry: Option<Industry>,
    #[serde(default)]
    pub geography: Option<Geography>,
}

impl QueryFilters {
    fn is_empty(&self) -> bool {
        *self == QueryFilters::default()
    }

    /// Fields set on `self` win over those on `detected`
    fn or(self, detected: QueryFilters) -> QueryFilters {
        QueryFilters {
            risk_level: self.risk_level.or(detected.risk_level),
            compliance_status: self.compliance_status.or(detected.compliance_status),
            agreement_type: self.agreement_type.or(detected.agreement_type),
            jurisdiction: self.jurisdiction.or(detected.jurisdiction),
            industry: self.industry.or(detected.industry),
            geography: self.geography.or(detected.geography),
        }
    }
}

/// Dimension documents are grouped along in a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonDimension {
    AgreementType,
    Jurisdiction,
    Industry,
    Geography,
    RiskLevel,
}

impl ComparisonDimension {
    const DEFAULT: [ComparisonDimension; 3] = [
        ComparisonDimension::AgreementType,
        ComparisonDimension::Jurisdiction,
        ComparisonDimension::Industry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonDimension::AgreementType => "agreement_type",
            ComparisonDimension::Jurisdiction => "jurisdiction",
            ComparisonDimension::Industry => "industry",
            ComparisonDimension::Geography => "geography",
            ComparisonDimension::RiskLevel => "risk_level",
        }
    }

    fn value_of(&self, doc: &Document) -> Option<String> {
        let meta = &doc.metadata;
        match self {
            ComparisonDimension::AgreementType => Some(meta.agreement_type.to_string()),
            ComparisonDimension::Jurisdiction => meta.jurisdiction.map(|j| j.to_string()),
            ComparisonDimension::Industry => meta.industry.map(|i| i.to_string()),
            ComparisonDimension::Geography => meta.geography.map(|g| g.to_string()),
            ComparisonDimension::RiskLevel => Some(doc.analysis.risk_level.to_string()),
        }
    }
}

fn default_include_analysis() -> bool {
    true
}

/// Body for `POST /api/query`
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default)]
    pub filters: QueryFilters,
    /// Forces a comparison grouped along this dimension
    #[serde(default)]
    pub comparison_type: Option<ComparisonDimension>,
    #[serde(default = "default_include_analysis")]
    pub include_analysis: bool,
}

/// What the question is mainly about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    RiskAnalysis,
    ComplianceCheck,
    Parties,
    AgreementType,
    Jurisdiction,
    Industry,
    Geography,
    Comparison,
    Summary,
    GeneralSearch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryIntent {
    pub kind: IntentKind,
    pub filters: QueryFilters,
    pub parties: Vec<String>,
    /// Remaining content words, lowercased
    pub terms: Vec<String>,
    pub wants_comparison: bool,
    pub wants_analysis: bool,
    pub wants_summary: bool,
    pub confidence: f64,
}

impl QueryIntent {
    fn has_entities(&self) -> bool {
        !self.filters.is_empty() || !self.parties.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryMatch {
    pub document: DocumentSummary,
    pub score: f64,
    pub matched_on: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonGroup {
    pub dimension: &'static str,
    pub value: String,
    pub document_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredComparison {
    pub documents_compared: usize,
    pub groups: Vec<ComparisonGroup>,
    pub similarities: Vec<String>,
    pub differences: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub question: String,
    pub intent: QueryIntent,
    pub total_results: usize,
    pub results: Vec<QueryMatch>,
    pub comparison: Option<StructuredComparison>,
    pub analysis: Option<String>,
}

/// Add a singular form of each plural word so "NDAs" reads like "NDA"
fn with_singulars(question: &str) -> String {
    let singulars: Vec<&str> = WORD_PATTERN
        .find_iter(question)
        .map(|m| m.as_str())
        .filter(|w| w.len() > 3 && (w.ends_with('s') || w.ends_with('S')))
        .map(|w| &w[..w.len() - 1])
        .collect();
    format!("{} {}", question, singulars.join(" "))
}

fn detect_risk_level(question: &str) -> Option<RiskLevel> {
    if let Some(cap) = RISK_LEVEL_PATTERN.captures(question) {
        return match cap["level"].to_ascii_lowercase().as_str() {
            "high" => Some(RiskLevel::High),
            "low" => Some(RiskLevel::Low),
            _ => Some(RiskLevel::Medium),
        };
    }
    RISKY_PATTERN.is_match(question).then_some(RiskLevel::High)
}

fn detect_compliance(question: &str) -> Option<ComplianceStatus> {
    if NON_COMPLIANT_PATTERN.is_match(question) {
        Some(ComplianceStatus::NonCompliant)
    } else if REVIEW_PATTERN.is_match(question) {
        Some(ComplianceStatus::ReviewRequired)
    } else if COMPLIANT_PATTERN.is_match(question) {
        Some(ComplianceStatus::Compliant)
    } else {
        None
    }
}

/// Capitalized names after "with", "between" and similar, minus names
/// that are really a region, sector or agreement type
fn detect_parties(question: &str) -> Vec<String> {
    let mut parties: Vec<String> = Vec::new();
    for cap in PARTY_PATTERN.captures_iter(question) {
        let name = cap["name"].trim_end_matches(['.', '?', '!', ',']).trim();
        let descriptive = detect_jurisdiction(name).is_some()
            || detect_industry(name).is_some()
            || detect_geography(name).is_some()
            || detect_agreement_type(&with_singulars(name)) != AgreementType::Other;
        if !name.is_empty() && !descriptive && !parties.iter().any(|p| p == name) {
            parties.push(name.to_string());
        }
    }
    parties
}

fn content_terms(question: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in WORD_PATTERN.find_iter(question) {
        let word = word.as_str().to_lowercase();
        if word.len() > 3 && !STOP_WORDS.contains(&word.as_str()) && !terms.contains(&word) {
            terms.push(word);
        }
    }
    terms
}

pub fn detect_intent(question: &str) -> QueryIntent {
    let expanded = with_singulars(question);

    let agreement_type = Some(detect_agreement_type(&expanded)).filter(|t| *t != AgreementType::Other);
    let filters = QueryFilters {
        risk_level: detect_risk_level(question),
        compliance_status: detect_compliance(question),
        agreement_type,
        jurisdiction: detect_jurisdiction(question),
        industry: detect_industry(&expanded),
        geography: detect_geography(question),
    };
    let parties = detect_parties(question);

    let wants_comparison = COMPARISON_PATTERN.is_match(question);
    let wants_analysis = ANALYSIS_PATTERN.is_match(question);
    let wants_summary = SUMMARY_PATTERN.is_match(question);

    let kind = if filters.risk_level.is_some() || RISK_TOPIC_PATTERN.is_match(question) {
        IntentKind::RiskAnalysis
    } else if filters.compliance_status.is_some() || COMPLIANCE_TOPIC_PATTERN.is_match(question) {
        IntentKind::ComplianceCheck
    } else if !parties.is_empty() {
        IntentKind::Parties
    } else if filters.agreement_type.is_some() {
        IntentKind::AgreementType
    } else if filters.jurisdiction.is_some() {
        IntentKind::Jurisdiction
    } else if filters.industry.is_some() {
        IntentKind::Industry
    } else if filters.geography.is_some() {
        IntentKind::Geography
    } else if wants_comparison {
        IntentKind::Comparison
    } else if wants_summary {
        IntentKind::Summary
    } else {
        IntentKind::GeneralSearch
    };

    let mut intent = QueryIntent {
        kind,
        filters,
        parties,
        terms: content_terms(question),
        wants_comparison,
        wants_analysis,
        wants_summary,
        confidence: 0.0,
    };
    intent.confidence = confidence(&intent);
    intent
}

fn confidence(intent: &QueryIntent) -> f64 {
    let mut score = 0.3;
    if intent.has_entities() {
        score += 0.3;
    }
    if intent.kind != IntentKind::GeneralSearch {
        score += 0.2;
    }
    if intent.wants_comparison || intent.wants_analysis {
        score += 0.2;
    }
    (f64::min(score, 1.0) * 100.0).round() / 100.0
}

fn searchable_text(doc: &Document) -> String {
    let meta = &doc.metadata;
    let mut parts: Vec<&str> = vec![doc.filename.as_str(), doc.insights.summary.as_str()];
    parts.extend(doc.insights.key_terms.iter().map(String::as_str));
    parts.extend(meta.parties.iter().map(String::as_str));
    if let Some(law) = &meta.governing_law {
        parts.push(law);
    }
    parts.join(" ").to_lowercase()
}

/// Score `doc`, or `None` when it fails a filter or a named party
fn score_document(doc: &Document, intent: &QueryIntent) -> Option<(f64, Vec<&'static str>)> {
    let filters = &intent.filters;
    let meta = &doc.metadata;
    let mut score = 0.0;
    let mut matched_on: Vec<&'static str> = Vec::new();

    let checks: [(bool, bool, f64, &'static str); 6] = [
        (
            filters.agreement_type.is_some(),
            filters.agreement_type == Some(meta.agreement_type),
            AGREEMENT_WEIGHT,
            "agreement_type",
        ),
        (
            filters.jurisdiction.is_some(),
            filters.jurisdiction == meta.jurisdiction,
            JURISDICTION_WEIGHT,
            "jurisdiction",
        ),
        (
            filters.industry.is_some(),
            filters.industry == meta.industry,
            INDUSTRY_WEIGHT,
            "industry",
        ),
        (
            filters.geography.is_some(),
            filters.geography == meta.geography,
            GEOGRAPHY_WEIGHT,
            "geography",
        ),
        (
            filters.risk_level.is_some(),
            filters.risk_level == Some(doc.analysis.risk_level),
            RISK_WEIGHT,
            "risk_level",
        ),
        (
            filters.compliance_status.is_some(),
            filters.compliance_status == Some(doc.analysis.compliance_status),
            COMPLIANCE_WEIGHT,
            "compliance_status",
        ),
    ];
    for (requested, matched, weight, label) in checks {
        if !requested {
            continue;
        }
        if !matched {
            return None;
        }
        score += weight;
        matched_on.push(label);
    }

    if !intent.parties.is_empty() {
        let doc_parties: Vec<String> = meta.parties.iter().map(|p| p.to_lowercase()).collect();
        let hits = intent
            .parties
            .iter()
            .map(|p| p.to_lowercase())
            .filter(|wanted| {
                doc_parties
                    .iter()
                    .any(|have| have.contains(wanted.as_str()) || wanted.contains(have.as_str()))
            })
            .count();
        if hits == 0 {
            return None;
        }
        score += PARTY_WEIGHT * hits as f64;
        matched_on.push("parties");
    }

    let haystack = searchable_text(doc);
    let term_hits = intent
        .terms
        .iter()
        .filter(|t| haystack.contains(t.as_str()))
        .count();
    if term_hits > 0 {
        score += TERM_WEIGHT * term_hits as f64;
        matched_on.push("terms");
    }

    Some((score, matched_on))
}

/// Rank `documents` (newest first on equal scores) against `intent`
pub fn rank<'a>(documents: &'a [Document], intent: &QueryIntent) -> Vec<(&'a Document, f64, Vec<&'static str>)> {
    let mut scored: Vec<(&Document, f64, Vec<&'static str>)> = documents
        .iter()
        .filter_map(|doc| score_document(doc, intent).map(|(score, on)| (doc, score, on)))
        .collect();

    if !intent.has_entities() {
        scored.retain(|(_, score, _)| *score > 0.0);
        if scored.is_empty() {
            let mut newest: Vec<&Document> = documents.iter().collect();
            newest.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            return newest
                .into_iter()
                .take(GENERAL_RESULTS)
                .map(|doc| (doc, 0.0, Vec::new()))
                .collect();
        }
    }

    scored.sort_by(|a, b| {
        b.1.total_cmp(&a.1)
            .then_with(|| b.0.created_at.cmp(&a.0.created_at))
    });
    scored.truncate(MAX_RESULTS);
    scored
}

fn distinct<T: Ord + Clone>(values: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = values.into_iter().collect();
    out.sort();
    out.dedup();
    out
}

/// Group and contrast the matched documents
pub fn compare(documents: &[&Document], dimension: Option<ComparisonDimension>) -> StructuredComparison {
    let dimensions: Vec<ComparisonDimension> = match dimension {
        Some(d) => vec![d],
        None => ComparisonDimension::DEFAULT.to_vec(),
    };

    let mut groups = Vec::new();
    for dim in dimensions {
        let mut by_value: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for doc in documents {
            if let Some(value) = dim.value_of(doc) {
                by_value.entry(value).or_default().push(doc.id.clone());
            }
        }
        groups.extend(
            by_value
                .into_iter()
                .filter(|(_, ids)| ids.len() >= 2)
                .map(|(value, document_ids)| ComparisonGroup {
                    dimension: dim.as_str(),
                    value,
                    document_ids,
                }),
        );
    }

    let mut similarities = Vec::new();
    let mut differences = Vec::new();
    if documents.len() >= 2 {
        let agreement_types = distinct(documents.iter().map(|d| d.metadata.agreement_type.as_str()));
        if let [only] = agreement_types.as_slice() {
            similarities.push(format!("All documents are {} agreements", only));
        }
        let jurisdictions = distinct(documents.iter().map(|d| d.metadata.jurisdiction));
        if let [Some(only)] = jurisdictions.as_slice() {
            similarities.push(format!("All documents fall under {} jurisdiction", only));
        }
        let industries = distinct(documents.iter().map(|d| d.metadata.industry));
        if let [Some(only)] = industries.as_slice() {
            similarities.push(format!("All documents concern the {} industry", only));
        }

        let risk_levels = distinct(documents.iter().map(|d| d.analysis.risk_level));
        match risk_levels.as_slice() {
            [only] => similarities.push(format!("All documents are {} risk", only)),
            levels => differences.push(format!(
                "Risk levels vary: {}",
                levels.iter().map(RiskLevel::as_str).collect::<Vec<_>>().join(", ")
            )),
        }

        let values: Vec<f64> = documents.iter().filter_map(|d| d.metadata.value).collect();
        if values.len() >= 2 {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if max > min {
                differences.push(format!("Contract values range from {:.2} to {:.2}", min, max));
            }
        }

        let party_counts = distinct(documents.iter().map(|d| d.metadata.parties.len()));
        if let (Some(fewest), Some(most)) = (party_counts.first(), party_counts.last()) {
            if fewest != most {
                differences.push(format!("Party counts range from {} to {}", fewest, most));
            }
        }
    }

    StructuredComparison {
        documents_compared: documents.len(),
        groups,
        similarities,
        differences,
    }
}

/// One-paragraph description of the matched set
pub fn describe_matches(documents: &[&Document]) -> String {
    let count = |level: RiskLevel| documents.iter().filter(|d| d.analysis.risk_level == level).count();
    let status = |s: ComplianceStatus| {
        documents
            .iter()
            .filter(|d| d.analysis.compliance_status == s)
            .count()
    };

    format!(
        "{} matching documents: {} high, {} medium and {} low risk. {} non-compliant, {} need review.",
        documents.len(),
        count(RiskLevel::High),
        count(RiskLevel::Medium),
        count(RiskLevel::Low),
        status(ComplianceStatus::NonCompliant),
        status(ComplianceStatus::ReviewRequired),
    )
}

/// Answer `request` over `documents`
pub fn run(request: QueryRequest, documents: &[Document]) -> QueryResponse {
    let mut intent = detect_intent(&request.question);
    intent.filters = request.filters.or(intent.filters);
    if request.comparison_type.is_some() {
        intent.wants_comparison = true;
    }
    intent.confidence = confidence(&intent);

    let ranked = rank(documents, &intent);
    let matched: Vec<&Document> = ranked.iter().map(|(doc, _, _)| *doc).collect();

    let comparison = (intent.wants_comparison && matched.len() >= 2)
        .then(|| compare(&matched, request.comparison_type));
    let analysis = ((request.include_analysis || intent.wants_analysis) && !matched.is_empty())
        .then(|| describe_matches(&matched));

    let results: Vec<QueryMatch> = ranked
        .into_iter()
        .map(|(doc, score, matched_on)| QueryMatch {
            document: DocumentSummary::from(doc),
            score,
            matched_on,
        })
        .collect();

    QueryResponse {
        question: request.question,
        intent,
        total_results: results.len(),
        results,
        comparison,
        analysis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use doc_extract::FileType;
    use pretty_assertions::assert_eq;
    use shared_types::{AnalysisResult, DocumentInsights, DocumentMetadata};

    fn doc(id: &str, risk: RiskLevel, metadata: DocumentMetadata, age_minutes: i64) -> Document {
        let at = Utc::now() - Duration::minutes(age_minutes);
        Document {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            filename: format!("{}.txt", id),
            file_type: FileType::Txt,
            file_size: 10,
            content_hash: String::new(),
            processing_status: "completed".to_string(),
            analysis: AnalysisResult {
                risk_level: risk,
                compliance_status: ComplianceStatus::Compliant,
                matched_indicators: Vec::new(),
                confidence_score: 50,
                risk_score: 0,
            },
            insights: DocumentInsights::default(),
            metadata,
            created_at: at,
            updated_at: at,
        }
    }

    fn meta(agreement_type: AgreementType, jurisdiction: Option<Jurisdiction>) -> DocumentMetadata {
        DocumentMetadata {
            agreement_type,
            jurisdiction,
            ..Default::default()
        }
    }

    #[test]
    fn test_detects_risk_and_agreement_filters() {
        let intent = detect_intent("Which NDAs are high risk?");
        assert_eq!(intent.kind, IntentKind::RiskAnalysis);
        assert_eq!(intent.filters.risk_level, Some(RiskLevel::High));
        assert_eq!(intent.filters.agreement_type, Some(AgreementType::Nda));
        assert_eq!(intent.confidence, 0.8);
    }

    #[test]
    fn test_detects_compliance_status() {
        assert_eq!(
            detect_intent("List non-compliant leases").filters.compliance_status,
            Some(ComplianceStatus::NonCompliant)
        );
        assert_eq!(
            detect_intent("What needs review?").filters.compliance_status,
            Some(ComplianceStatus::ReviewRequired)
        );
        assert_eq!(
            detect_intent("Show compliant contracts").kind,
            IntentKind::ComplianceCheck
        );
    }

    #[test]
    fn test_detects_parties_but_not_regions() {
        let intent = detect_intent("Agreements with Acme Corp governed in UAE");
        assert_eq!(intent.parties, vec!["Acme Corp"]);
        assert_eq!(intent.filters.jurisdiction, Some(Jurisdiction::Uae));
        assert_eq!(intent.kind, IntentKind::Parties);

        assert!(detect_intent("Contracts with UAE counterparties").parties.is_empty());
    }

    #[test]
    fn test_general_search_has_base_confidence() {
        let intent = detect_intent("anything about payment schedules");
        assert_eq!(intent.kind, IntentKind::GeneralSearch);
        assert!(intent.filters.is_empty());
        assert_eq!(intent.terms, vec!["anything", "payment", "schedules"]);
        assert_eq!(intent.confidence, 0.3);
    }

    #[test]
    fn test_comparison_and_analysis_flags() {
        let intent = detect_intent("Compare the franchise agreements and analyze them");
        assert!(intent.wants_comparison);
        assert!(intent.wants_analysis);
        assert_eq!(intent.kind, IntentKind::AgreementType);
        assert_eq!(intent.confidence, 1.0);
    }

    #[test]
    fn test_rank_filters_then_orders_by_score() {
        let docs = vec![
            doc("old-nda", RiskLevel::High, meta(AgreementType::Nda, Some(Jurisdiction::Uae)), 30),
            doc("new-nda", RiskLevel::High, meta(AgreementType::Nda, None), 1),
            doc("lease", RiskLevel::High, meta(AgreementType::Lease, Some(Jurisdiction::Uae)), 5),
            doc("low-nda", RiskLevel::Low, meta(AgreementType::Nda, Some(Jurisdiction::Uae)), 2),
        ];

        let intent = detect_intent("high risk NDAs");
        let ids: Vec<&str> = rank(&docs, &intent).iter().map(|(d, _, _)| d.id.as_str()).collect();
        // Equal scores fall back to newest first
        assert_eq!(ids, vec!["new-nda", "old-nda"]);

        let intent = detect_intent("high risk NDAs in Dubai");
        let ranked = rank(&docs, &intent);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0.id, "old-nda");
        assert_eq!(ranked[0].1, AGREEMENT_WEIGHT + JURISDICTION_WEIGHT + RISK_WEIGHT);
        assert_eq!(ranked[0].2, vec!["agreement_type", "jurisdiction", "risk_level"]);
    }

    #[test]
    fn test_party_filter_matches_case_insensitively() {
        let mut with_party = meta(AgreementType::Service, None);
        with_party.parties = vec!["Acme Corp".to_string(), "Globex LLC".to_string()];
        let docs = vec![
            doc("acme", RiskLevel::Low, with_party, 1),
            doc("other", RiskLevel::Low, meta(AgreementType::Service, None), 1),
        ];

        let ranked = rank(&docs, &detect_intent("contracts involving Acme"));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0.id, "acme");
        assert!(ranked[0].2.contains(&"parties"));
    }

    #[test]
    fn test_general_search_falls_back_to_newest() {
        let mut docs: Vec<Document> = (0..25)
            .map(|i| doc(&format!("d{}", i), RiskLevel::Low, meta(AgreementType::Other, None), i))
            .collect();
        docs[13].insights.summary = "Quarterly payment schedule".to_string();

        let ranked = rank(&docs, &detect_intent("zzzz qqqq"));
        assert_eq!(ranked.len(), GENERAL_RESULTS);
        assert_eq!(ranked[0].0.id, "d0");

        let ranked = rank(&docs, &detect_intent("payment schedule"));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0.id, "d13");
        assert_eq!(ranked[0].1, 2.0 * TERM_WEIGHT);
    }

    #[test]
    fn test_compare_groups_and_contrasts() {
        let mut a = meta(AgreementType::Nda, Some(Jurisdiction::Uk));
        a.value = Some(1000.0);
        a.parties = vec!["A".to_string(), "B".to_string()];
        let mut b = meta(AgreementType::Nda, Some(Jurisdiction::Uk));
        b.value = Some(5000.0);
        b.parties = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let docs = [
            doc("a", RiskLevel::High, a, 1),
            doc("b", RiskLevel::Low, b, 2),
        ];
        let refs: Vec<&Document> = docs.iter().collect();

        let comparison = compare(&refs, None);
        assert_eq!(comparison.documents_compared, 2);
        assert_eq!(
            comparison.groups,
            vec![
                ComparisonGroup {
                    dimension: "agreement_type",
                    value: "NDA".to_string(),
                    document_ids: vec!["a".to_string(), "b".to_string()],
                },
                ComparisonGroup {
                    dimension: "jurisdiction",
                    value: "UK".to_string(),
                    document_ids: vec!["a".to_string(), "b".to_string()],
                },
            ]
        );
        assert_eq!(
            comparison.similarities,
            vec![
                "All documents are NDA agreements",
                "All documents fall under UK jurisdiction",
            ]
        );
        assert_eq!(
            comparison.differences,
            vec![
                "Risk levels vary: LOW, HIGH",
                "Contract values range from 1000.00 to 5000.00",
                "Party counts range from 2 to 3",
            ]
        );
    }

    #[test]
    fn test_run_applies_explicit_filters_and_comparison() {
        let docs = vec![
            doc("a", RiskLevel::High, meta(AgreementType::Lease, None), 1),
            doc("b", RiskLevel::High, meta(AgreementType::Lease, None), 2),
            doc("c", RiskLevel::Low, meta(AgreementType::Lease, None), 3),
        ];
        let request = QueryRequest {
            question: "leases".to_string(),
            filters: QueryFilters {
                risk_level: Some(RiskLevel::High),
                ..Default::default()
            },
            comparison_type: Some(ComparisonDimension::RiskLevel),
            include_analysis: true,
        };

        let response = run(request, &docs);
        assert_eq!(response.total_results, 2);
        assert_eq!(response.intent.filters.agreement_type, Some(AgreementType::Lease));
        let comparison = response.comparison.unwrap();
        assert_eq!(comparison.groups.len(), 1);
        assert_eq!(comparison.groups[0].value, "HIGH");
        assert_eq!(
            response.analysis.as_deref(),
            Some("2 matching documents: 2 high, 0 medium and 0 low risk. 0 non-compliant, 0 need review.")
        );
    }
}
