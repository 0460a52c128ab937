//! HTTP handlers for the legal intel API

pub mod auth;
pub mod dashboard;
pub mod documents;
pub mod export;
pub mod insights;

use axum::Json;
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "legal-intel-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}
