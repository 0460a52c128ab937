use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::export::{self, ExportFormat};
use crate::service;
use crate::state::AppState;

/// Handler: GET /api/export/health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "formats": ["csv", "pdf"],
    }))
}

/// Handler: GET /api/export/:format
pub async fn export_documents(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(format): Path<String>,
) -> Result<Response, ApiError> {
    let format: ExportFormat = format.parse().map_err(ApiError::InvalidRequest)?;

    let documents = service::all(&state).await?;
    let generated_at = Utc::now();

    let body = tokio::task::spawn_blocking(move || export::render(format, &documents, generated_at))
        .await
        .map_err(|e| ApiError::Internal(e.into()))??;

    tracing::info!("Exported {} report ({} bytes)", format, body.len());

    let filename = format!(
        "legal_documents_{}.{}",
        generated_at.format("%Y%m%d_%H%M%S"),
        format.extension()
    );

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}
