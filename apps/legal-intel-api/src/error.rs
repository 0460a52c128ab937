//! Error types for the legal intel API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use doc_extract::ExtractError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("User not found")]
    UserNotFound,

    #[error("No documents have been uploaded yet")]
    NoDocuments,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("File too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: &'static str,
}

impl ApiError {
    /// Machine-readable code sent as `code` in error bodies
    pub fn code(&self) -> &'static str {
        self.describe().1
    }

    /// Client-facing message; server-side failures stay generic
    pub fn public_message(&self) -> String {
        self.describe().2
    }

    fn describe(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::DocumentNotFound(id) => (
                StatusCode::NOT_FOUND,
                "DOCUMENT_NOT_FOUND",
                format!("Document '{}' not found", id),
            ),
            ApiError::UserNotFound => (
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                "User not found".to_string(),
            ),
            ApiError::NoDocuments => (StatusCode::NOT_FOUND, "NO_DOCUMENTS", self.to_string()),
            ApiError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone())
            }
            ApiError::UnsupportedFile(msg) => {
                (StatusCode::BAD_REQUEST, "UNSUPPORTED_FILE", msg.clone())
            }
            ApiError::PayloadTooLarge { .. } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "FILE_TOO_LARGE",
                self.to_string(),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            ApiError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Database error".to_string(),
            ),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal error".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Database(e) => tracing::error!("Database error: {}", e),
            ApiError::Internal(e) => tracing::error!("Internal error: {:#}", e),
            _ => {}
        }
        let (status, code, message) = self.describe();

        let body = ErrorResponse {
            success: false,
            error: message,
            code,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedType(_) | ExtractError::ContentMismatch { .. } => {
                ApiError::UnsupportedFile(err.to_string())
            }
            ExtractError::Parse { .. } | ExtractError::EncodingFailure(_) => {
                ApiError::InvalidRequest(format!("Could not read document: {}", err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_extract::FileType;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::DocumentNotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::PayloadTooLarge { size: 10, limit: 5 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (ApiError::Unauthorized("no".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (ApiError::Conflict("dup".into()), StatusCode::CONFLICT),
            (ApiError::NoDocuments, StatusCode::NOT_FOUND),
            (
                ApiError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_extract_errors_map_to_client_errors() {
        let unsupported: ApiError = ExtractError::UnsupportedType("doc".into()).into();
        assert!(matches!(unsupported, ApiError::UnsupportedFile(_)));

        let mismatch: ApiError = ExtractError::ContentMismatch {
            declared: FileType::Pdf,
        }
        .into();
        assert!(matches!(mismatch, ApiError::UnsupportedFile(_)));

        let parse: ApiError = ExtractError::Parse {
            file_type: FileType::Docx,
            message: "unexpected end of archive".into(),
        }
        .into();
        assert!(matches!(parse, ApiError::InvalidRequest(_)));
    }

    #[test]
    fn test_codes_and_public_messages() {
        assert_eq!(ApiError::NoDocuments.code(), "NO_DOCUMENTS");
        assert_eq!(
            ApiError::UnsupportedFile("x".into()).code(),
            "UNSUPPORTED_FILE"
        );

        let internal = ApiError::Internal(anyhow::anyhow!("disk path /var/secret"));
        assert_eq!(internal.code(), "INTERNAL_ERROR");
        assert_eq!(internal.public_message(), "Internal error");
    }
}
