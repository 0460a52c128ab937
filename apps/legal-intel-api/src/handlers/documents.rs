//! Document handlers: single, batch and folder upload, list, detail,
//! analysis, reanalysis, deletion

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use risk_engine::DocumentAnalysis;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{
    AnalysisResponse, AnalyzeTextRequest, BatchUploadRequest, BatchUploadResponse, Document,
    DocumentPage, ListQuery, MessageResponse, UploadRequest,
};
use crate::service::{self, PendingUpload};
use crate::state::AppState;

/// Most files accepted in one batch request
pub const MAX_BATCH_FILES: usize = 50;

/// Decode an upload body, rejecting it early when the decoded size (known
/// from the encoded length) is over `limit`
fn decode_content(content_base64: &str, limit: usize) -> Result<Vec<u8>, ApiError> {
    let decoded_estimate = content_base64.len() / 4 * 3;
    if decoded_estimate > limit.saturating_add(3) {
        return Err(ApiError::PayloadTooLarge {
            size: decoded_estimate,
            limit,
        });
    }

    BASE64
        .decode(content_base64.trim())
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid base64 content: {}", e)))
}

/// Handler: POST /api/documents
pub async fn upload(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<UploadRequest>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let data = decode_content(&req.content_base64, state.config.max_file_size)?;
    let doc = service::ingest(&state, &user, &req.filename, data).await?;
    Ok((StatusCode::CREATED, Json(doc)))
}

/// Handler: POST /api/documents/batch
pub async fn upload_batch(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<BatchUploadRequest>,
) -> Result<Json<BatchUploadResponse>, ApiError> {
    if req.files.is_empty() {
        return Err(ApiError::InvalidRequest("files must not be empty".to_string()));
    }
    if req.files.len() > MAX_BATCH_FILES {
        return Err(ApiError::InvalidRequest(format!(
            "at most {} files per batch (got {})",
            MAX_BATCH_FILES,
            req.files.len()
        )));
    }

    let limit = state.config.max_file_size;
    let pending = req
        .files
        .into_iter()
        .map(|file| PendingUpload {
            data: decode_content(&file.content_base64, limit),
            filename: file.filename,
        })
        .collect();

    Ok(Json(service::ingest_many(&state, &user, pending).await))
}

/// Handler: POST /api/documents/folder
pub async fn upload_folder(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<UploadRequest>,
) -> Result<Json<BatchUploadResponse>, ApiError> {
    let data = decode_content(&req.content_base64, state.config.max_file_size)?;
    Ok(Json(
        service::ingest_archive(&state, &user, &req.filename, data).await?,
    ))
}

/// Handler: GET /api/documents
pub async fn list(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<DocumentPage>, ApiError> {
    let filter = query.validate().map_err(ApiError::InvalidRequest)?;
    Ok(Json(service::list(&state, filter).await?))
}

/// Handler: GET /api/documents/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(service::get(&state, &id).await?))
}

/// Handler: GET /api/documents/:id/analysis
pub async fn analysis(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    Ok(Json(service::get(&state, &id).await?.into()))
}

/// Handler: POST /api/documents/:id/reanalyze
pub async fn reanalyze(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    Ok(Json(service::reanalyze(&state, &id).await?.into()))
}

/// Handler: DELETE /api/documents/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    service::delete(&state, &user, &id).await?;
    Ok(Json(MessageResponse::ok(format!("Document {} deleted", id))))
}

/// Handler: POST /api/analyze
pub async fn analyze_text(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(req): Json<AnalyzeTextRequest>,
) -> Result<Json<DocumentAnalysis>, ApiError> {
    if req.text.len() > state.config.max_file_size {
        return Err(ApiError::PayloadTooLarge {
            size: req.text.len(),
            limit: state.config.max_file_size,
        });
    }
    Ok(Json(service::analyze_text(&state, req.text).await?))
}
