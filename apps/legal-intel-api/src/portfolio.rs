//! Whole-collection views: cross-document analysis and the portfolio summary

use std::collections::BTreeMap;

use serde::Serialize;
use shared_types::{AgreementType, Category, ComplianceStatus, RiskLevel};

use crate::models::Document;

/// Standard deviations above the mean before a risk score is an outlier
const OUTLIER_SIGMAS: f64 = 2.0;
const OUTLIER_MIN_DOCUMENTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAggregation {
    pub by_level: BTreeMap<String, u64>,
    pub average_risk_score: f64,
    /// Filenames of the highest-scoring documents, worst first
    pub highest_risk: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionAnalysis {
    pub analysis_type: &'static str,
    pub documents_analyzed: usize,
    pub key_insights: Vec<String>,
    pub patterns_found: Vec<String>,
    pub anomalies_detected: Vec<String>,
    pub recommendations: Vec<String>,
    pub risk_aggregation: RiskAggregation,
    pub compliance_overview: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub summary: String,
    pub total_documents: usize,
    pub confidence: f64,
}

fn tally<K: Ord>(keys: impl IntoIterator<Item = K>) -> BTreeMap<K, u64> {
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Most frequent key; ties go to the smallest key
fn most_common<K: Ord + Copy>(counts: &BTreeMap<K, u64>) -> Option<(K, u64)> {
    counts.iter().fold(None, |best, (key, count)| match best {
        Some((_, best_count)) if best_count >= *count => best,
        _ => Some((*key, *count)),
    })
}

fn percent(part: usize, whole: usize) -> u64 {
    if whole == 0 {
        0
    } else {
        ((part as f64 / whole as f64) * 100.0).round() as u64
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn count_risk(documents: &[Document], level: RiskLevel) -> usize {
    documents
        .iter()
        .filter(|d| d.analysis.risk_level == level)
        .count()
}

fn count_status(documents: &[Document], status: ComplianceStatus) -> usize {
    documents
        .iter()
        .filter(|d| d.analysis.compliance_status == status)
        .count()
}

fn risk_aggregation(documents: &[Document]) -> RiskAggregation {
    let mut by_level: BTreeMap<String, u64> = RiskLevel::ALL
        .iter()
        .map(|r| (r.as_str().to_string(), 0))
        .collect();
    for doc in documents {
        *by_level
            .entry(doc.analysis.risk_level.as_str().to_string())
            .or_insert(0) += 1;
    }

    let total: u64 = documents.iter().map(|d| u64::from(d.analysis.risk_score)).sum();
    let average = total as f64 / documents.len().max(1) as f64;

    let mut ranked: Vec<&Document> = documents
        .iter()
        .filter(|d| d.analysis.risk_score > 0)
        .collect();
    ranked.sort_by(|a, b| b.analysis.risk_score.cmp(&a.analysis.risk_score));

    RiskAggregation {
        by_level,
        average_risk_score: round1(average),
        highest_risk: ranked.iter().take(3).map(|d| d.filename.clone()).collect(),
    }
}

/// Categories found in at least two documents, most widespread first
fn shared_categories(documents: &[Document]) -> Vec<(Category, u64)> {
    let per_document = documents
        .iter()
        .flat_map(|d| d.analysis.matched_categories());
    let mut shared: Vec<(Category, u64)> = tally(per_document)
        .into_iter()
        .filter(|(_, docs)| *docs >= 2)
        .collect();
    shared.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    shared
}

fn anomalies(documents: &[Document]) -> Vec<String> {
    let mut found = Vec::new();

    if documents.len() >= OUTLIER_MIN_DOCUMENTS {
        let scores: Vec<f64> = documents
            .iter()
            .map(|d| f64::from(d.analysis.risk_score))
            .collect();
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        let variance =
            scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64;
        let threshold = mean + OUTLIER_SIGMAS * variance.sqrt();

        for (doc, score) in documents.iter().zip(&scores) {
            if variance > 0.0 && *score > threshold {
                found.push(format!(
                    "{} scores {}, well above the collection average of {:.1}",
                    doc.filename, doc.analysis.risk_score, mean
                ));
            }
        }
    }

    for doc in documents {
        if doc.analysis.risk_level == RiskLevel::High
            && doc.analysis.compliance_status == ComplianceStatus::Compliant
        {
            found.push(format!(
                "{} is high risk but raised no compliance issues",
                doc.filename
            ));
        }
    }

    found
}

/// Cross-document analysis over a non-empty collection
pub fn analyze_collection(documents: &[Document]) -> CollectionAnalysis {
    let total = documents.len();
    let high = count_risk(documents, RiskLevel::High);
    let non_compliant = count_status(documents, ComplianceStatus::NonCompliant);
    let review = count_status(documents, ComplianceStatus::ReviewRequired);

    let agreement_counts = tally(documents.iter().map(|d| d.metadata.agreement_type));
    let jurisdiction_counts = tally(documents.iter().filter_map(|d| d.metadata.jurisdiction));

    let mut key_insights = vec![
        format!(
            "{} of {} documents are high risk ({}%)",
            high,
            total,
            percent(high, total)
        ),
        format!(
            "{} documents are non-compliant and {} need review",
            non_compliant, review
        ),
    ];
    if let Some((kind, count)) = most_common(&agreement_counts) {
        key_insights.push(format!(
            "Most common agreement type: {} ({} documents)",
            kind, count
        ));
    }
    if let Some((jurisdiction, count)) = most_common(&jurisdiction_counts) {
        key_insights.push(format!(
            "Most common jurisdiction: {} ({} documents)",
            jurisdiction, count
        ));
    }

    let mut patterns_found: Vec<String> = shared_categories(documents)
        .into_iter()
        .take(3)
        .map(|(category, docs)| format!("{} clauses appear in {} documents", category, docs))
        .collect();
    patterns_found.extend(
        agreement_counts
            .iter()
            .filter(|(kind, count)| **kind != AgreementType::Other && **count >= 2)
            .map(|(kind, count)| format!("{} documents are {} agreements", count, kind)),
    );

    let missing_jurisdiction = documents
        .iter()
        .filter(|d| d.metadata.jurisdiction.is_none())
        .count();
    let mut recommendations = Vec::new();
    if high > 0 {
        recommendations.push(format!(
            "Prioritize legal review of the {} high-risk documents",
            high
        ));
    }
    if non_compliant > 0 {
        recommendations.push(format!(
            "Remediate the {} non-compliant documents before renewal",
            non_compliant
        ));
    }
    if review > 0 {
        recommendations.push(format!("Schedule a compliance review for {} documents", review));
    }
    if missing_jurisdiction > 0 {
        recommendations.push(format!(
            "Confirm the governing jurisdiction of {} documents where none was detected",
            missing_jurisdiction
        ));
    }
    if recommendations.is_empty() {
        recommendations.push("No action required; continue routine monitoring".to_string());
    }

    CollectionAnalysis {
        analysis_type: "collection",
        documents_analyzed: total,
        key_insights,
        patterns_found,
        anomalies_detected: anomalies(documents),
        recommendations,
        risk_aggregation: risk_aggregation(documents),
        compliance_overview: ComplianceStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), count_status(documents, *s) as u64))
            .collect(),
    }
}

fn volume_factor(total: usize) -> f64 {
    match total {
        n if n >= 10 => 0.9,
        n if n >= 5 => 0.7,
        n if n >= 2 => 0.5,
        _ => 0.3,
    }
}

/// Narrative overview of the whole portfolio
pub fn portfolio_summary(documents: &[Document]) -> PortfolioSummary {
    let total = documents.len();
    if total == 0 {
        return PortfolioSummary {
            summary: "No documents have been uploaded yet. Upload agreements to generate a \
                      portfolio summary."
                .to_string(),
            total_documents: 0,
            confidence: 0.0,
        };
    }

    let top_type = most_common(&tally(
        documents
            .iter()
            .map(|d| d.metadata.agreement_type)
            .filter(|t| *t != AgreementType::Other),
    ));
    let top_jurisdiction = most_common(&tally(documents.iter().filter_map(|d| d.metadata.jurisdiction)));
    let top_industry = most_common(&tally(documents.iter().filter_map(|d| d.metadata.industry)));

    let mut sentences = vec![format!("The portfolio holds {} documents.", total)];
    if let Some((kind, count)) = top_type {
        sentences.push(format!(
            "The most common agreement type is {} ({}).",
            kind, count
        ));
    }
    if let Some((jurisdiction, _)) = top_jurisdiction {
        sentences.push(format!("Most documents fall under {} jurisdiction.", jurisdiction));
    }
    if let Some((industry, _)) = top_industry {
        sentences.push(format!("The leading industry is {}.", industry));
    }
    sentences.push(format!(
        "{} documents are high risk and {} are non-compliant.",
        count_risk(documents, RiskLevel::High),
        count_status(documents, ComplianceStatus::NonCompliant)
    ));

    let mut metadata_factor = 0.0;
    if top_type.is_some() {
        metadata_factor += 0.3;
    }
    if top_jurisdiction.is_some() {
        metadata_factor += 0.3;
    }
    if top_industry.is_some() {
        metadata_factor += 0.4;
    }
    let confidence = (volume_factor(total) + metadata_factor) / 2.0;

    PortfolioSummary {
        summary: sentences.join(" "),
        total_documents: total,
        confidence: (confidence * 100.0).round() / 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use doc_extract::FileType;
    use pretty_assertions::assert_eq;
    use shared_types::{
        AnalysisResult, DocumentInsights, DocumentMetadata, Indicator, Industry, Jurisdiction,
    };

    fn doc(
        filename: &str,
        risk: RiskLevel,
        status: ComplianceStatus,
        risk_score: u32,
        categories: &[Category],
        metadata: DocumentMetadata,
    ) -> Document {
        let now = Utc::now();
        Document {
            id: filename.to_string(),
            owner_id: "owner".to_string(),
            filename: filename.to_string(),
            file_type: FileType::Txt,
            file_size: 1,
            content_hash: String::new(),
            processing_status: "completed".to_string(),
            analysis: AnalysisResult {
                risk_level: risk,
                compliance_status: status,
                matched_indicators: categories
                    .iter()
                    .enumerate()
                    .map(|(i, c)| Indicator {
                        category: *c,
                        matched_text: c.as_str().to_lowercase(),
                        position: i,
                    })
                    .collect(),
                confidence_score: 40,
                risk_score,
            },
            insights: DocumentInsights::default(),
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    fn nda_in(jurisdiction: Option<Jurisdiction>) -> DocumentMetadata {
        DocumentMetadata {
            agreement_type: AgreementType::Nda,
            jurisdiction,
            ..Default::default()
        }
    }

    #[test]
    fn test_collection_counts_and_recommendations() {
        let docs = vec![
            doc(
                "a.txt",
                RiskLevel::High,
                ComplianceStatus::NonCompliant,
                9,
                &[Category::Penalty, Category::Breach],
                nda_in(Some(Jurisdiction::Uae)),
            ),
            doc(
                "b.txt",
                RiskLevel::Low,
                ComplianceStatus::ReviewRequired,
                1,
                &[Category::Penalty],
                nda_in(Some(Jurisdiction::Uae)),
            ),
            doc(
                "c.txt",
                RiskLevel::Low,
                ComplianceStatus::Compliant,
                0,
                &[],
                DocumentMetadata::default(),
            ),
        ];

        let analysis = analyze_collection(&docs);
        assert_eq!(analysis.documents_analyzed, 3);
        assert_eq!(
            analysis.key_insights,
            vec![
                "1 of 3 documents are high risk (33%)",
                "1 documents are non-compliant and 1 need review",
                "Most common agreement type: NDA (2 documents)",
                "Most common jurisdiction: UAE (2 documents)",
            ]
        );
        assert_eq!(
            analysis.patterns_found,
            vec![
                "PENALTY clauses appear in 2 documents",
                "2 documents are NDA agreements",
            ]
        );
        assert_eq!(analysis.recommendations.len(), 4);
        assert_eq!(analysis.compliance_overview["COMPLIANT"], 1);
        assert_eq!(analysis.risk_aggregation.by_level["MEDIUM"], 0);
        assert_eq!(analysis.risk_aggregation.highest_risk, vec!["a.txt", "b.txt"]);
        assert_eq!(analysis.risk_aggregation.average_risk_score, 3.3);
    }

    #[test]
    fn test_outliers_and_inconsistent_documents_are_flagged() {
        let mut docs: Vec<Document> = (0..9)
            .map(|i| {
                doc(
                    &format!("routine-{}.txt", i),
                    RiskLevel::Low,
                    ComplianceStatus::Compliant,
                    1,
                    &[],
                    DocumentMetadata::default(),
                )
            })
            .collect();
        docs.push(doc(
            "outlier.txt",
            RiskLevel::High,
            ComplianceStatus::Compliant,
            40,
            &[],
            DocumentMetadata::default(),
        ));

        let anomalies = analyze_collection(&docs).anomalies_detected;
        assert_eq!(
            anomalies,
            vec![
                "outlier.txt scores 40, well above the collection average of 4.9",
                "outlier.txt is high risk but raised no compliance issues",
            ]
        );
    }

    #[test]
    fn test_quiet_collection_gets_monitoring_advice() {
        let docs = vec![doc(
            "a.txt",
            RiskLevel::Low,
            ComplianceStatus::Compliant,
            0,
            &[],
            nda_in(Some(Jurisdiction::Uk)),
        )];
        let analysis = analyze_collection(&docs);
        assert_eq!(
            analysis.recommendations,
            vec!["No action required; continue routine monitoring"]
        );
        assert!(analysis.anomalies_detected.is_empty());
    }

    #[test]
    fn test_empty_portfolio_summary() {
        let summary = portfolio_summary(&[]);
        assert!(summary.summary.starts_with("No documents have been uploaded yet"));
        assert_eq!(summary.confidence, 0.0);
    }

    #[test]
    fn test_portfolio_summary_names_top_metadata() {
        let mut tech = nda_in(Some(Jurisdiction::Singapore));
        tech.industry = Some(Industry::Technology);
        let docs = vec![
            doc("a.txt", RiskLevel::High, ComplianceStatus::NonCompliant, 5, &[], tech.clone()),
            doc("b.txt", RiskLevel::Low, ComplianceStatus::Compliant, 0, &[], tech),
        ];

        let summary = portfolio_summary(&docs);
        assert_eq!(
            summary.summary,
            "The portfolio holds 2 documents. The most common agreement type is NDA (2). \
             Most documents fall under Singapore jurisdiction. The leading industry is \
             Technology. 1 documents are high risk and 1 are non-compliant."
        );
        // (0.5 volume + 1.0 metadata) / 2
        assert_eq!(summary.confidence, 0.75);
        assert_eq!(summary.total_documents, 2);
    }

    #[test]
    fn test_summary_confidence_without_metadata() {
        let docs: Vec<Document> = (0..10)
            .map(|i| {
                doc(
                    &format!("{}.txt", i),
                    RiskLevel::Low,
                    ComplianceStatus::Compliant,
                    0,
                    &[],
                    DocumentMetadata::default(),
                )
            })
            .collect();
        // (0.9 volume + 0.0 metadata) / 2
        assert_eq!(portfolio_summary(&docs).confidence, 0.45);
    }
}
