//! Text extraction for uploaded documents
//!
//! Picks a [`TextBackend`] from the declared [`FileType`] (PDF, DOCX or
//! plain text) and returns the document's raw text. Unicode normalization, if any, happens here and
//! never in the classifier.

pub mod docx;
pub mod pdf;
pub mod plain;
pub mod types;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;
pub use plain::PlainTextExtractor;
pub use types::{ExtractError, ExtractedText, FileType, TextBackend};

/// Backend responsible for a declared file type
pub fn backend_for(file_type: FileType) -> Box<dyn TextBackend + Send + Sync> {
    match file_type {
        FileType::Pdf => Box::new(PdfExtractor::new()),
        FileType::Docx => Box::new(DocxExtractor),
        FileType::Txt => Box::new(PlainTextExtractor),
    }
}

/// Extract text from `data`, which the caller declares to be `file_type`
pub fn extract_text(data: &[u8], file_type: FileType) -> Result<ExtractedText, ExtractError> {
    let backend = backend_for(file_type);
    let extracted = backend.extract(data)?;

    tracing::debug!(
        backend = backend.name(),
        pages = extracted.page_count,
        chars = extracted.text.len(),
        "Extracted text"
    );

    Ok(extracted)
}

/// Resolve the type from `filename` and extract
pub fn extract_from_file(filename: &str, data: &[u8]) -> Result<ExtractedText, ExtractError> {
    extract_text(data, FileType::from_filename(filename)?)
}
