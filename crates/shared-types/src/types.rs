use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Returned when a string does not name a known enum variant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Coarse severity of a document
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            _ => Err(ParseEnumError::new("risk level", s)),
        }
    }
}

/// Regulatory conformance of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    ReviewRequired,
}

impl ComplianceStatus {
    pub const ALL: [ComplianceStatus; 3] = [
        ComplianceStatus::Compliant,
        ComplianceStatus::NonCompliant,
        ComplianceStatus::ReviewRequired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "COMPLIANT",
            ComplianceStatus::NonCompliant => "NON_COMPLIANT",
            ComplianceStatus::ReviewRequired => "REVIEW_REQUIRED",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplianceStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "COMPLIANT" => Ok(ComplianceStatus::Compliant),
            "NON_COMPLIANT" => Ok(ComplianceStatus::NonCompliant),
            "REVIEW_REQUIRED" => Ok(ComplianceStatus::ReviewRequired),
            _ => Err(ParseEnumError::new("compliance status", s)),
        }
    }
}

/// Label attached to a rule and to every indicator it produces.
///
/// Declaration order is significant: indicators that start at the same
/// position are listed in this order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Penalty,
    Criminal,
    Litigation,
    Indemnification,
    Termination,
    Breach,
    Liability,
    IntellectualProperty,
    Confidentiality,
    RegulatoryViolation,
    Regulatory,
    DataProtection,
    Ambiguous,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::Penalty,
        Category::Criminal,
        Category::Litigation,
        Category::Indemnification,
        Category::Termination,
        Category::Breach,
        Category::Liability,
        Category::IntellectualProperty,
        Category::Confidentiality,
        Category::RegulatoryViolation,
        Category::Regulatory,
        Category::DataProtection,
        Category::Ambiguous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Penalty => "PENALTY",
            Category::Criminal => "CRIMINAL",
            Category::Litigation => "LITIGATION",
            Category::Indemnification => "INDEMNIFICATION",
            Category::Termination => "TERMINATION",
            Category::Breach => "BREACH",
            Category::Liability => "LIABILITY",
            Category::IntellectualProperty => "INTELLECTUAL_PROPERTY",
            Category::Confidentiality => "CONFIDENTIALITY",
            Category::RegulatoryViolation => "REGULATORY_VIOLATION",
            Category::Regulatory => "REGULATORY",
            Category::DataProtection => "DATA_PROTECTION",
            Category::Ambiguous => "AMBIGUOUS",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| ParseEnumError::new("category", s))
    }
}

/// How matches of a category feed into the compliance status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceSignal {
    /// Contributes to risk only
    #[default]
    None,
    /// Ambiguous or obligation-bearing language; needs a human look
    Review,
    /// Evidence of a regulatory violation
    Violation,
}

/// A single pattern match within the analysed text
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Indicator {
    pub category: Category,
    pub matched_text: String,
    /// Byte offset of the match in the analysed text
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisResult {
    pub risk_level: RiskLevel,
    pub compliance_status: ComplianceStatus,
    pub matched_indicators: Vec<Indicator>,
    pub confidence_score: u8,
    /// Weighted score that `risk_level` was derived from
    pub risk_score: u32,
}

impl AnalysisResult {
    /// Distinct categories present, in declaration order
    pub fn matched_categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> =
            self.matched_indicators.iter().map(|i| i.category).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    pub fn count_for(&self, category: Category) -> usize {
        self.matched_indicators
            .iter()
            .filter(|i| i.category == category)
            .count()
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum AgreementType {
    #[serde(rename = "NDA")]
    Nda,
    #[serde(rename = "MSA")]
    Msa,
    #[serde(rename = "Franchise Agreement")]
    Franchise,
    #[serde(rename = "Employment Contract")]
    Employment,
    #[serde(rename = "Lease Agreement")]
    Lease,
    #[serde(rename = "Partnership Agreement")]
    Partnership,
    #[serde(rename = "Supply Agreement")]
    Supply,
    #[serde(rename = "Service Agreement")]
    Service,
    #[serde(rename = "Licensing Agreement")]
    Licensing,
    Other,
}

impl AgreementType {
    pub const ALL: [AgreementType; 10] = [
        AgreementType::Nda,
        AgreementType::Msa,
        AgreementType::Franchise,
        AgreementType::Employment,
        AgreementType::Lease,
        AgreementType::Partnership,
        AgreementType::Supply,
        AgreementType::Service,
        AgreementType::Licensing,
        AgreementType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgreementType::Nda => "NDA",
            AgreementType::Msa => "MSA",
            AgreementType::Franchise => "Franchise Agreement",
            AgreementType::Employment => "Employment Contract",
            AgreementType::Lease => "Lease Agreement",
            AgreementType::Partnership => "Partnership Agreement",
            AgreementType::Supply => "Supply Agreement",
            AgreementType::Service => "Service Agreement",
            AgreementType::Licensing => "Licensing Agreement",
            AgreementType::Other => "Other",
        }
    }
}

impl fmt::Display for AgreementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgreementType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        AgreementType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseEnumError::new("agreement type", s))
    }
}

/// Enum whose wire form is a human-readable label, parsed case-insensitively
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| ParseEnumError::new($kind, s))
            }
        }
    };
}

labelled_enum! {
    /// Legal system named in the document
    Jurisdiction, "jurisdiction" {
        Uae => "UAE",
        Uk => "UK",
        Usa => "USA",
        Delaware => "Delaware",
        Singapore => "Singapore",
        HongKong => "Hong Kong",
        Germany => "Germany",
        France => "France",
    }
}

labelled_enum! {
    /// Business sector the agreement concerns
    Industry, "industry" {
        Technology => "Technology",
        Healthcare => "Healthcare",
        Finance => "Finance",
        OilGas => "Oil & Gas",
        RealEstate => "Real Estate",
        Manufacturing => "Manufacturing",
        Retail => "Retail",
        Consulting => "Consulting",
    }
}

labelled_enum! {
    /// World region the agreement operates in
    Geography, "geography" {
        MiddleEast => "Middle East",
        Europe => "Europe",
        NorthAmerica => "North America",
        AsiaPacific => "Asia Pacific",
        Africa => "Africa",
        SouthAmerica => "South America",
    }
}

/// Descriptive fields pulled from the document text
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocumentMetadata {
    pub agreement_type: AgreementType,
    #[serde(default)]
    pub jurisdiction: Option<Jurisdiction>,
    #[serde(default)]
    pub industry: Option<Industry>,
    #[serde(default)]
    pub geography: Option<Geography>,
    pub governing_law: Option<String>,
    #[serde(default)]
    pub parties: Vec<String>,
    /// Effective or commencement date as written in the document
    #[serde(default)]
    pub effective_date: Option<String>,
    /// Expiration, termination or end date as written in the document
    #[serde(default)]
    pub expiration_date: Option<String>,
    /// First stated contract value
    pub value: Option<f64>,
    /// ISO 4217 code of `value`
    pub currency: Option<String>,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            agreement_type: AgreementType::Other,
            jurisdiction: None,
            industry: None,
            geography: None,
            governing_law: None,
            parties: Vec::new(),
            effective_date: None,
            expiration_date: None,
            value: None,
            currency: None,
        }
    }
}

/// Human-facing narrative derived from an analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DocumentInsights {
    pub summary: String,
    pub key_terms: Vec<String>,
    pub business_impact: String,
    pub recommendations: Vec<String>,
}
