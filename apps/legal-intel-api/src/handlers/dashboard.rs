use std::sync::Arc;

use axum::{extract::State, Json};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::DashboardResponse;
use crate::service;
use crate::state::AppState;

/// Handler: GET /api/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    let data = service::dashboard(&state).await?;
    tracing::debug!("Dashboard built over {} documents", data.total_documents);
    Ok(Json(data))
}
