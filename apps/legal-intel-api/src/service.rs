//! Document service: extraction, classification and persistence
//!
//! Extraction and classification are CPU-bound and run on the blocking pool;
//! everything else is a thin layer over the `documents` table.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use chrono::Utc;
use doc_extract::{ExtractedText, FileType};
use risk_engine::{DocumentAnalysis, RiskEngine};
use sha2::{Digest, Sha256};
use shared_types::{ComplianceStatus, RiskLevel};
use uuid::Uuid;
use zip::ZipArchive;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{
    BatchUploadResponse, DashboardResponse, DbDocument, Document, DocumentPage, DocumentSummary,
    FailedUpload, ListFilter, DOCUMENT_COLUMNS,
};
use crate::portfolio::{self, CollectionAnalysis, PortfolioSummary};
use crate::query::{self, QueryRequest, QueryResponse};
use crate::state::AppState;

/// Uploads shown on the dashboard
pub const RECENT_UPLOADS: i64 = 5;

/// Entries read from one folder archive, directories included
pub const MAX_ARCHIVE_ENTRIES: usize = 1000;

pub const MAX_QUESTION_CHARS: usize = 2000;

const STATUS_COMPLETED: &str = "completed";

/// Run the classifier off the async executor
async fn analyze_blocking(engine: Arc<RiskEngine>, text: String) -> Result<DocumentAnalysis, ApiError> {
    tokio::task::spawn_blocking(move || engine.analyze(&text))
        .await
        .context("Analysis task failed")
        .map_err(ApiError::from)
}

/// Classify text without storing anything
pub async fn analyze_text(state: &AppState, text: String) -> Result<DocumentAnalysis, ApiError> {
    analyze_blocking(state.engine.clone(), text).await
}

/// Validate, extract, classify and store one upload
pub async fn ingest(
    state: &AppState,
    owner: &AuthUser,
    filename: &str,
    data: Vec<u8>,
) -> Result<Document, ApiError> {
    let filename = filename.trim();
    if filename.is_empty() {
        return Err(ApiError::InvalidRequest("filename is required".to_string()));
    }

    let file_type = FileType::from_filename(filename)?;

    let limit = state.config.max_file_size;
    if data.len() > limit {
        return Err(ApiError::PayloadTooLarge {
            size: data.len(),
            limit,
        });
    }

    let content_hash = hex::encode(Sha256::digest(&data));
    let file_size = data.len() as u64;

    let engine = state.engine.clone();
    let (extracted, analysis) = tokio::task::spawn_blocking(
        move || -> Result<(ExtractedText, DocumentAnalysis), doc_extract::ExtractError> {
            let extracted = doc_extract::extract_text(&data, file_type)?;
            let analysis = engine.analyze(&extracted.text);
            Ok((extracted, analysis))
        },
    )
    .await
    .context("Ingest task failed")??;

    let now = Utc::now();
    let doc = Document {
        id: Uuid::new_v4().to_string(),
        owner_id: owner.id.clone(),
        filename: filename.to_string(),
        file_type,
        file_size,
        content_hash,
        processing_status: STATUS_COMPLETED.to_string(),
        analysis: analysis.result,
        insights: analysis.insights,
        metadata: analysis.metadata,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO documents (id, owner_id, filename, file_type, file_size, content_hash,
            extracted_text, processing_status, risk_level, compliance_status, confidence_score,
            risk_score, agreement_type, indicators_json, insights_json, metadata_json,
            created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&doc.id)
    .bind(&doc.owner_id)
    .bind(&doc.filename)
    .bind(doc.file_type.as_str())
    .bind(file_size as i64)
    .bind(&doc.content_hash)
    .bind(&extracted.text)
    .bind(&doc.processing_status)
    .bind(doc.analysis.risk_level.as_str())
    .bind(doc.analysis.compliance_status.as_str())
    .bind(i64::from(doc.analysis.confidence_score))
    .bind(i64::from(doc.analysis.risk_score))
    .bind(doc.metadata.agreement_type.as_str())
    .bind(to_json(&doc.analysis.matched_indicators)?)
    .bind(to_json(&doc.insights)?)
    .bind(to_json(&doc.metadata)?)
    .bind(doc.created_at)
    .bind(doc.updated_at)
    .execute(&state.db)
    .await?;

    tracing::info!(
        id = %doc.id,
        pages = extracted.page_count,
        indicators = doc.analysis.matched_indicators.len(),
        "Ingested {} as {} / {}",
        doc.filename,
        doc.analysis.risk_level,
        doc.analysis.compliance_status
    );

    Ok(doc)
}

/// A file waiting to be ingested; `data` already holds the error when the
/// file could not be decoded or unpacked
#[derive(Debug)]
pub struct PendingUpload {
    pub filename: String,
    pub data: Result<Vec<u8>, ApiError>,
}

/// Ingest each file on its own; a failure is recorded and the rest continue
pub async fn ingest_many(
    state: &AppState,
    owner: &AuthUser,
    files: Vec<PendingUpload>,
) -> BatchUploadResponse {
    let started = Instant::now();
    let total_processed = files.len();
    let mut uploaded = Vec::new();
    let mut failed = Vec::new();

    for file in files {
        let outcome = match file.data {
            Ok(data) => ingest(state, owner, &file.filename, data).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(doc) => uploaded.push(DocumentSummary::from(&doc)),
            Err(e) => {
                tracing::warn!(filename = %file.filename, code = e.code(), "Upload failed: {}", e);
                failed.push(FailedUpload {
                    filename: file.filename,
                    error: e.public_message(),
                    code: e.code().to_string(),
                });
            }
        }
    }

    tracing::info!(
        "Batch of {} files: {} stored, {} failed",
        total_processed,
        uploaded.len(),
        failed.len()
    );

    BatchUploadResponse {
        uploaded,
        failed,
        total_processed,
        processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}

/// macOS resource forks and dotfiles are never documents
fn is_hidden_entry(name: &str) -> bool {
    name.starts_with("__MACOSX/")
        || name
            .rsplit('/')
            .next()
            .is_some_and(|base| base.starts_with('.'))
}

fn read_entry(entry: impl Read, declared_size: u64, limit: usize) -> Result<Vec<u8>, ApiError> {
    let too_large = |size: usize| ApiError::PayloadTooLarge { size, limit };
    if declared_size > limit as u64 {
        return Err(too_large(usize::try_from(declared_size).unwrap_or(usize::MAX)));
    }

    // Declared sizes can lie; never inflate past the limit
    let mut data = Vec::new();
    entry
        .take(limit as u64 + 1)
        .read_to_end(&mut data)
        .map_err(|e| ApiError::InvalidRequest(format!("Could not read archive entry: {}", e)))?;
    if data.len() > limit {
        return Err(too_large(data.len()));
    }
    Ok(data)
}

/// Supported files inside a ZIP archive, in archive order. Directories,
/// hidden files and unsupported extensions are skipped.
pub fn unpack_archive(data: &[u8], max_entry_size: usize) -> Result<Vec<PendingUpload>, ApiError> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid ZIP archive: {}", e)))?;
    if archive.len() > MAX_ARCHIVE_ENTRIES {
        return Err(ApiError::InvalidRequest(format!(
            "Archive has {} entries (limit {})",
            archive.len(),
            MAX_ARCHIVE_ENTRIES
        )));
    }

    let mut pending = Vec::new();
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid ZIP entry: {}", e)))?;
        let name = entry.name().to_string();
        if entry.is_dir() || is_hidden_entry(&name) || FileType::from_filename(&name).is_err() {
            tracing::debug!(entry = %name, "Skipping archive entry");
            continue;
        }

        let declared_size = entry.size();
        pending.push(PendingUpload {
            data: read_entry(entry, declared_size, max_entry_size),
            filename: name,
        });
    }

    Ok(pending)
}

/// Ingest every supported document inside a `.zip` folder upload
pub async fn ingest_archive(
    state: &AppState,
    owner: &AuthUser,
    archive_name: &str,
    data: Vec<u8>,
) -> Result<BatchUploadResponse, ApiError> {
    if !archive_name.trim().to_ascii_lowercase().ends_with(".zip") {
        return Err(ApiError::UnsupportedFile(format!(
            "folder uploads must be .zip archives, got '{}'",
            archive_name.trim()
        )));
    }

    let limit = state.config.max_file_size;
    if data.len() > limit {
        return Err(ApiError::PayloadTooLarge {
            size: data.len(),
            limit,
        });
    }

    let pending = tokio::task::spawn_blocking(move || unpack_archive(&data, limit))
        .await
        .context("Archive task failed")??;
    if pending.is_empty() {
        return Err(ApiError::InvalidRequest(format!(
            "'{}' contains no supported documents ({})",
            archive_name.trim(),
            FileType::SUPPORTED_EXTENSIONS.join(", ")
        )));
    }

    tracing::info!(archive = archive_name, entries = pending.len(), "Unpacked folder upload");
    Ok(ingest_many(state, owner, pending).await)
}

/// Recompute the analysis from the stored text, replacing the old one
pub async fn reanalyze(state: &AppState, id: &str) -> Result<Document, ApiError> {
    let text: Option<String> =
        sqlx::query_scalar("SELECT extracted_text FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    let text = text.ok_or_else(|| ApiError::DocumentNotFound(id.to_string()))?;

    let analysis = analyze_blocking(state.engine.clone(), text).await?;

    sqlx::query(
        r#"
        UPDATE documents
        SET risk_level = ?, compliance_status = ?, confidence_score = ?, risk_score = ?,
            agreement_type = ?, indicators_json = ?, insights_json = ?, metadata_json = ?,
            processing_status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(analysis.result.risk_level.as_str())
    .bind(analysis.result.compliance_status.as_str())
    .bind(i64::from(analysis.result.confidence_score))
    .bind(i64::from(analysis.result.risk_score))
    .bind(analysis.metadata.agreement_type.as_str())
    .bind(to_json(&analysis.result.matched_indicators)?)
    .bind(to_json(&analysis.insights)?)
    .bind(to_json(&analysis.metadata)?)
    .bind(STATUS_COMPLETED)
    .bind(Utc::now())
    .bind(id)
    .execute(&state.db)
    .await?;

    tracing::info!(id, "Reanalyzed as {}", analysis.result.risk_level);

    get(state, id).await
}

pub async fn get(state: &AppState, id: &str) -> Result<Document, ApiError> {
    let row: Option<DbDocument> = sqlx::query_as(&format!(
        "SELECT {} FROM documents WHERE id = ?",
        DOCUMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&state.db)
    .await?;

    let row = row.ok_or_else(|| ApiError::DocumentNotFound(id.to_string()))?;
    Ok(Document::try_from(row)?)
}

/// One page of documents, newest first
pub async fn list(state: &AppState, filter: ListFilter) -> Result<DocumentPage, ApiError> {
    let risk = filter.risk_level.map(|r| r.as_str());
    let compliance = filter.compliance_status.map(|c| c.as_str());

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM documents \
         WHERE (?1 IS NULL OR risk_level = ?1) AND (?2 IS NULL OR compliance_status = ?2)",
    )
    .bind(risk)
    .bind(compliance)
    .fetch_one(&state.db)
    .await?;

    let offset = i64::from(filter.page - 1) * i64::from(filter.size);
    let rows: Vec<DbDocument> = sqlx::query_as(&format!(
        "SELECT {} FROM documents \
         WHERE (?1 IS NULL OR risk_level = ?1) AND (?2 IS NULL OR compliance_status = ?2) \
         ORDER BY created_at DESC, rowid DESC LIMIT ?3 OFFSET ?4",
        DOCUMENT_COLUMNS
    ))
    .bind(risk)
    .bind(compliance)
    .bind(i64::from(filter.size))
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    let items = summarize_rows(rows)?;
    let total = total.max(0) as u64;

    Ok(DocumentPage {
        items,
        total,
        page: filter.page,
        size: filter.size,
        pages: total.div_ceil(u64::from(filter.size)),
    })
}

/// Every document, oldest first
pub async fn all(state: &AppState) -> Result<Vec<Document>, ApiError> {
    let rows: Vec<DbDocument> = sqlx::query_as(&format!(
        "SELECT {} FROM documents ORDER BY created_at ASC, rowid ASC",
        DOCUMENT_COLUMNS
    ))
    .fetch_all(&state.db)
    .await?;

    rows.into_iter()
        .map(|row| Document::try_from(row).map_err(ApiError::from))
        .collect()
}

/// Owners may delete their own documents; admins may delete any
pub async fn delete(state: &AppState, user: &AuthUser, id: &str) -> Result<(), ApiError> {
    let owner: Option<String> = sqlx::query_scalar("SELECT owner_id FROM documents WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let owner = owner.ok_or_else(|| ApiError::DocumentNotFound(id.to_string()))?;

    if owner != user.id && !user.is_admin() {
        return Err(ApiError::Forbidden(
            "Only the owner or an admin may delete this document".to_string(),
        ));
    }

    sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    tracing::info!(id, by = %user.email, "Deleted document");
    Ok(())
}

pub async fn dashboard(state: &AppState) -> Result<DashboardResponse, ApiError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
        .fetch_one(&state.db)
        .await?;

    let mut by_risk_level: BTreeMap<String, u64> = RiskLevel::ALL
        .iter()
        .map(|r| (r.as_str().to_string(), 0))
        .collect();
    merge_counts(&mut by_risk_level, count_by(state, "risk_level").await?);

    let mut by_compliance_status: BTreeMap<String, u64> = ComplianceStatus::ALL
        .iter()
        .map(|c| (c.as_str().to_string(), 0))
        .collect();
    merge_counts(
        &mut by_compliance_status,
        count_by(state, "compliance_status").await?,
    );

    let by_agreement_type = tally_by(state, "agreement_type").await?;
    let by_jurisdiction = tally_by(state, "json_extract(metadata_json, '$.jurisdiction')").await?;
    let by_industry = tally_by(state, "json_extract(metadata_json, '$.industry')").await?;
    let by_geography = tally_by(state, "json_extract(metadata_json, '$.geography')").await?;

    let average: Option<f64> = sqlx::query_scalar("SELECT AVG(confidence_score) FROM documents")
        .fetch_one(&state.db)
        .await?;

    let recent: Vec<DbDocument> = sqlx::query_as(&format!(
        "SELECT {} FROM documents ORDER BY created_at DESC, rowid DESC LIMIT ?",
        DOCUMENT_COLUMNS
    ))
    .bind(RECENT_UPLOADS)
    .fetch_all(&state.db)
    .await?;

    Ok(DashboardResponse {
        total_documents: total.max(0) as u64,
        by_risk_level,
        by_compliance_status,
        by_agreement_type,
        by_jurisdiction,
        by_industry,
        by_geography,
        average_confidence: (average.unwrap_or(0.0) * 10.0).round() / 10.0,
        recent_uploads: summarize_rows(recent)?,
    })
}

/// `column` is one of our own constant expressions, never user input.
/// Rows where it is NULL are not counted.
async fn count_by(state: &AppState, column: &str) -> Result<Vec<(String, i64)>, ApiError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {column}, COUNT(*) FROM documents WHERE {column} IS NOT NULL GROUP BY {column}"
    ))
    .fetch_all(&state.db)
    .await?;
    Ok(rows)
}

async fn tally_by(state: &AppState, column: &str) -> Result<BTreeMap<String, u64>, ApiError> {
    let mut counts = BTreeMap::new();
    merge_counts(&mut counts, count_by(state, column).await?);
    Ok(counts)
}

/// Answer a natural-language question over every stored document
pub async fn query(state: &AppState, request: QueryRequest) -> Result<QueryResponse, ApiError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(ApiError::InvalidRequest("question is required".to_string()));
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err(ApiError::InvalidRequest(format!(
            "question is longer than {} characters",
            MAX_QUESTION_CHARS
        )));
    }

    let documents = all(state).await?;
    let response = tokio::task::spawn_blocking(move || query::run(request, &documents))
        .await
        .context("Query task failed")?;

    tracing::info!(
        intent = ?response.intent.kind,
        results = response.total_results,
        "Answered query"
    );
    Ok(response)
}

/// Cross-document analysis over `ids`, or over everything when empty
pub async fn analyze_collection(
    state: &AppState,
    ids: &[String],
) -> Result<CollectionAnalysis, ApiError> {
    let mut documents = all(state).await?;
    if !ids.is_empty() {
        if let Some(missing) = ids.iter().find(|id| !documents.iter().any(|d| &d.id == *id)) {
            return Err(ApiError::DocumentNotFound(missing.clone()));
        }
        documents.retain(|d| ids.contains(&d.id));
    }
    if documents.is_empty() {
        return Err(ApiError::NoDocuments);
    }

    let analysis = portfolio::analyze_collection(&documents);
    tracing::info!(
        documents = analysis.documents_analyzed,
        anomalies = analysis.anomalies_detected.len(),
        "Analyzed collection"
    );
    Ok(analysis)
}

pub async fn portfolio_summary(state: &AppState) -> Result<PortfolioSummary, ApiError> {
    let documents = all(state).await?;
    Ok(portfolio::portfolio_summary(&documents))
}

fn merge_counts(into: &mut BTreeMap<String, u64>, counts: Vec<(String, i64)>) {
    for (key, count) in counts {
        *into.entry(key).or_insert(0) += count.max(0) as u64;
    }
}

fn summarize_rows(rows: Vec<DbDocument>) -> Result<Vec<DocumentSummary>, ApiError> {
    rows.into_iter()
        .map(|row| -> Result<DocumentSummary, ApiError> {
            let doc = Document::try_from(row)?;
            Ok(DocumentSummary::from(&doc))
        })
        .collect()
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value)
        .context("Failed to serialize analysis")
        .map_err(ApiError::from)
}
