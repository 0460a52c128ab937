use crate::types::{ExtractError, ExtractedText, FileType, TextBackend};

const UTF8_BOM: &str = "\u{feff}";

/// Plain-text backend; invalid UTF-8 is replaced rather than rejected
pub struct PlainTextExtractor;

impl TextBackend for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "plain-text"
    }

    fn can_handle(&self, data: &[u8]) -> bool {
        !data.contains(&0)
    }

    fn extract(&self, data: &[u8]) -> Result<ExtractedText, ExtractError> {
        if !self.can_handle(data) {
            return Err(ExtractError::ContentMismatch {
                declared: FileType::Txt,
            });
        }

        let text = String::from_utf8_lossy(data);
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(&text).to_string();

        Ok(ExtractedText {
            text,
            file_type: FileType::Txt,
            page_count: 1,
            backend: self.name().to_string(),
        })
    }
}
