//! Data models for the legal intel API

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use doc_extract::FileType;
use serde::{Deserialize, Serialize};
use shared_types::{
    AgreementType, AnalysisResult, ComplianceStatus, DocumentInsights, DocumentMetadata,
    Geography, Indicator, Industry, Jurisdiction, RiskLevel,
};
use sqlx::FromRow;

use crate::auth::Role;

// ============================================
// Users
// ============================================

/// User row stored in database
#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl DbUser {
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_else(|e| {
            tracing::warn!("User {} has {}; treating as user", self.id, e);
            Role::User
        })
    }
}

/// User as returned by the API (never includes the hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<DbUser> for UserResponse {
    fn from(user: DbUser) -> Self {
        let role = user.role();
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Seconds until the token expires
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

// ============================================
// Documents
// ============================================

/// Columns selected for a [`DbDocument`]; the extracted text is loaded separately
pub const DOCUMENT_COLUMNS: &str = "id, owner_id, filename, file_type, file_size, content_hash, \
     processing_status, risk_level, compliance_status, confidence_score, risk_score, \
     indicators_json, insights_json, metadata_json, created_at, updated_at";

/// Document row stored in database
#[derive(Debug, Clone, FromRow)]
pub struct DbDocument {
    pub id: String,
    pub owner_id: String,
    pub filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub content_hash: String,
    pub processing_status: String,
    pub risk_level: String,
    pub compliance_status: String,
    pub confidence_score: i64,
    pub risk_score: i64,
    pub indicators_json: String,
    pub insights_json: String,
    pub metadata_json: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored document with its current analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub owner_id: String,
    pub filename: String,
    pub file_type: FileType,
    pub file_size: u64,
    pub content_hash: String,
    pub processing_status: String,
    pub analysis: AnalysisResult,
    pub insights: DocumentInsights,
    pub metadata: DocumentMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbDocument> for Document {
    type Error = anyhow::Error;

    fn try_from(row: DbDocument) -> Result<Self, Self::Error> {
        let matched_indicators: Vec<Indicator> = serde_json::from_str(&row.indicators_json)?;

        Ok(Self {
            analysis: AnalysisResult {
                risk_level: row.risk_level.parse()?,
                compliance_status: row.compliance_status.parse()?,
                matched_indicators,
                confidence_score: u8::try_from(row.confidence_score)?,
                risk_score: u32::try_from(row.risk_score)?,
            },
            insights: serde_json::from_str(&row.insights_json)?,
            metadata: serde_json::from_str(&row.metadata_json)?,
            file_type: row.file_type.parse()?,
            file_size: u64::try_from(row.file_size)?,
            id: row.id,
            owner_id: row.owner_id,
            filename: row.filename,
            content_hash: row.content_hash,
            processing_status: row.processing_status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Lightweight list entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
    pub file_type: FileType,
    pub file_size: u64,
    pub agreement_type: AgreementType,
    pub jurisdiction: Option<Jurisdiction>,
    pub industry: Option<Industry>,
    pub geography: Option<Geography>,
    pub risk_level: RiskLevel,
    pub compliance_status: ComplianceStatus,
    pub confidence_score: u8,
    pub risk_score: u32,
    pub indicator_count: usize,
    pub processing_status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            filename: doc.filename.clone(),
            file_type: doc.file_type,
            file_size: doc.file_size,
            agreement_type: doc.metadata.agreement_type,
            jurisdiction: doc.metadata.jurisdiction,
            industry: doc.metadata.industry,
            geography: doc.metadata.geography,
            risk_level: doc.analysis.risk_level,
            compliance_status: doc.analysis.compliance_status,
            confidence_score: doc.analysis.confidence_score,
            risk_score: doc.analysis.risk_score,
            indicator_count: doc.analysis.matched_indicators.len(),
            processing_status: doc.processing_status.clone(),
            created_at: doc.created_at,
        }
    }
}

/// Upload body; the file travels base64-encoded
#[derive(Debug, Clone, Deserialize)]
pub struct UploadRequest {
    pub filename: String,
    pub content_base64: String,
}

/// Several files in one request, each with its own outcome
#[derive(Debug, Clone, Deserialize)]
pub struct BatchUploadRequest {
    pub files: Vec<UploadRequest>,
}

/// A file from a batch or archive that was not stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedUpload {
    pub filename: String,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchUploadResponse {
    pub uploaded: Vec<DocumentSummary>,
    pub failed: Vec<FailedUpload>,
    pub total_processed: usize,
    pub processing_time_ms: u64,
}

/// Body for `POST /api/analyze-documents`; no ids means every document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionAnalysisRequest {
    #[serde(default)]
    pub document_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeTextRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    pub document_id: String,
    pub analysis: AnalysisResult,
    pub insights: DocumentInsights,
    pub metadata: DocumentMetadata,
}

impl From<Document> for AnalysisResponse {
    fn from(doc: Document) -> Self {
        Self {
            document_id: doc.id,
            analysis: doc.analysis,
            insights: doc.insights,
            metadata: doc.metadata,
        }
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query string for `GET /api/documents`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub risk_level: Option<String>,
    pub compliance_status: Option<String>,
}

/// Validated list parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListFilter {
    pub page: u32,
    pub size: u32,
    pub risk_level: Option<RiskLevel>,
    pub compliance_status: Option<ComplianceStatus>,
}

impl ListQuery {
    pub fn validate(&self) -> Result<ListFilter, String> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err("page starts at 1".to_string());
        }

        let size = self.size.unwrap_or(DEFAULT_PAGE_SIZE);
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(format!("size must be between 1 and {}", MAX_PAGE_SIZE));
        }

        let risk_level = self
            .risk_level
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e: shared_types::ParseEnumError| e.to_string())?;
        let compliance_status = self
            .compliance_status
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e: shared_types::ParseEnumError| e.to_string())?;

        Ok(ListFilter {
            page,
            size,
            risk_level,
            compliance_status,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentPage {
    pub items: Vec<DocumentSummary>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
    pub pages: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub total_documents: u64,
    pub by_risk_level: BTreeMap<String, u64>,
    pub by_compliance_status: BTreeMap<String, u64>,
    pub by_agreement_type: BTreeMap<String, u64>,
    pub by_jurisdiction: BTreeMap<String, u64>,
    pub by_industry: BTreeMap<String, u64>,
    pub by_geography: BTreeMap<String, u64>,
    pub average_confidence: f64,
    pub recent_uploads: Vec<DocumentSummary>,
}
