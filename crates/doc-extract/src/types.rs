//! Common types for text extraction

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upload formats the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Txt,
}

impl FileType {
    pub const ALL: [FileType; 3] = [FileType::Pdf, FileType::Docx, FileType::Txt];

    /// Extensions accepted on upload, in the order they are listed to clients
    pub const SUPPORTED_EXTENSIONS: [&'static str; 3] = ["pdf", "docx", "txt"];

    /// Resolve the declared format from a filename's extension
    pub fn from_filename(filename: &str) -> Result<Self, ExtractError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        extension.parse()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Txt => "txt",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ext = s.trim().trim_start_matches('.').to_ascii_lowercase();
        if ext == "text" {
            return Ok(FileType::Txt);
        }
        FileType::ALL
            .into_iter()
            .find(|t| t.as_str() == ext)
            .ok_or(ExtractError::UnsupportedType(ext))
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(
        "unsupported file type '{0}' (supported: {supported})",
        supported = FileType::SUPPORTED_EXTENSIONS.join(", ")
    )]
    UnsupportedType(String),

    #[error("content does not look like a {declared} file")]
    ContentMismatch { declared: FileType },

    #[error("{file_type} parse error: {message}")]
    Parse { file_type: FileType, message: String },

    #[error("PDF encoding failure: {0}")]
    EncodingFailure(String),
}

/// Text pulled from one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub file_type: FileType,
    pub page_count: u32,
    pub backend: String,
}

/// A format-specific extraction backend
pub trait TextBackend {
    fn name(&self) -> &'static str;

    /// Cheap sniff of the content before a full extraction
    fn can_handle(&self, data: &[u8]) -> bool;

    fn extract(&self, data: &[u8]) -> Result<ExtractedText, ExtractError>;
}
