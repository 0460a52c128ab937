//! PDF backend using pdf-extract

use crate::types::{ExtractError, ExtractedText, FileType, TextBackend};

pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBackend for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn can_handle(&self, data: &[u8]) -> bool {
        data.len() > 4 && &data[0..4] == b"%PDF"
    }

    fn extract(&self, data: &[u8]) -> Result<ExtractedText, ExtractError> {
        if !self.can_handle(data) {
            return Err(ExtractError::ContentMismatch {
                declared: FileType::Pdf,
            });
        }

        let text = pdf_extract::extract_text_from_mem(data).map_err(|e| {
            let error_str = e.to_string();
            if error_str.contains("Identity-H") || error_str.contains("Unimplemented") {
                ExtractError::EncodingFailure(error_str)
            } else {
                ExtractError::Parse {
                    file_type: FileType::Pdf,
                    message: error_str,
                }
            }
        })?;

        let page_count = match pdf_extract::Document::load_mem(data) {
            Ok(doc) => doc.get_pages().len() as u32,
            Err(_) => 1,
        };

        // Form feeds separate pages; downstream matching wants plain newlines
        let text = text.replace('\x0C', "\n");

        Ok(ExtractedText {
            text,
            file_type: FileType::Pdf,
            page_count,
            backend: self.name().to_string(),
        })
    }
}
