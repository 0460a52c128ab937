pub mod types;

pub use types::{
    AgreementType, AnalysisResult, Category, ComplianceSignal, ComplianceStatus,
    DocumentInsights, DocumentMetadata, Geography, Indicator, Industry, Jurisdiction,
    ParseEnumError, RiskLevel,
};
