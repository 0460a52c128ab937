//! Question answering and whole-collection analysis

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::CollectionAnalysisRequest;
use crate::portfolio::{CollectionAnalysis, PortfolioSummary};
use crate::query::{QueryRequest, QueryResponse};
use crate::service;
use crate::state::AppState;

/// Handler: POST /api/query
pub async fn query(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    Ok(Json(service::query(&state, req).await?))
}

/// Handler: POST /api/analyze-documents
pub async fn analyze_documents(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(req): Json<CollectionAnalysisRequest>,
) -> Result<Json<CollectionAnalysis>, ApiError> {
    Ok(Json(
        service::analyze_collection(&state, &req.document_ids).await?,
    ))
}

/// Handler: POST /api/ai/summary
pub async fn summary(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<Json<PortfolioSummary>, ApiError> {
    let summary = service::portfolio_summary(&state).await?;
    tracing::debug!(
        documents = summary.total_documents,
        confidence = summary.confidence,
        "Built portfolio summary"
    );
    Ok(Json(summary))
}
