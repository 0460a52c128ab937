//! Legal Intel API - backend for the legal document dashboard
//!
//! Provides REST endpoints for:
//! - Account registration, login and profile management
//! - Document upload (single, batch or zipped folder) with risk and
//!   compliance classification
//! - Natural-language queries and cross-document analysis
//! - Dashboard aggregates, portfolio summary and CSV/PDF export

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod handlers;
pub mod models;
pub mod portfolio;
pub mod query;
pub mod service;
pub mod state;


use state::AppState;

/// Slack on top of the base64-inflated upload limit for the JSON envelope
const BODY_OVERHEAD: usize = 64 * 1024;

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Full application router
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_file_size / 3 * 4 + BODY_OVERHEAD;
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        // Health checks
        .route("/health", get(handlers::health))
        .route("/api/export/health", get(handlers::export::health))
        // Accounts
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/auth/me",
            get(handlers::auth::me).put(handlers::auth::update_me),
        )
        .route(
            "/api/auth/change-password",
            post(handlers::auth::change_password),
        )
        .route("/api/auth/users", get(handlers::auth::list_users))
        // Documents
        .route(
            "/api/documents",
            get(handlers::documents::list).post(handlers::documents::upload),
        )
        .route(
            "/api/documents/batch",
            post(handlers::documents::upload_batch),
        )
        .route(
            "/api/documents/folder",
            post(handlers::documents::upload_folder),
        )
        .route(
            "/api/documents/:id",
            get(handlers::documents::get).delete(handlers::documents::delete),
        )
        .route(
            "/api/documents/:id/analysis",
            get(handlers::documents::analysis),
        )
        .route(
            "/api/documents/:id/reanalyze",
            post(handlers::documents::reanalyze),
        )
        .route("/api/analyze", post(handlers::documents::analyze_text))
        // Questions and collection views
        .route("/api/query", post(handlers::insights::query))
        .route(
            "/api/analyze-documents",
            post(handlers::insights::analyze_documents),
        )
        .route("/api/ai/summary", post(handlers::insights::summary))
        // Reporting
        .route("/api/dashboard", get(handlers::dashboard::dashboard))
        .route(
            "/api/export/:format",
            get(handlers::export::export_documents),
        )
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::disable()),
        )
        .with_state(state)
}
