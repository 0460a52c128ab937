//! DOCX backend: unzip `word/document.xml` and collect its `w:t` runs

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::types::{ExtractError, ExtractedText, FileType, TextBackend};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const DOCUMENT_PART: &str = "word/document.xml";

/// Upper bound on the inflated main document part
const MAX_DOCUMENT_XML_BYTES: u64 = 64 * 1024 * 1024;

pub struct DocxExtractor;

fn parse_error(message: impl ToString) -> ExtractError {
    ExtractError::Parse {
        file_type: FileType::Docx,
        message: message.to_string(),
    }
}

/// Read the main document part out of the OOXML container
fn document_xml(data: &[u8]) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(data)).map_err(parse_error)?;
    let part = match archive.by_name(DOCUMENT_PART) {
        Ok(part) => part,
        Err(ZipError::FileNotFound) => {
            return Err(ExtractError::ContentMismatch {
                declared: FileType::Docx,
            })
        }
        Err(e) => return Err(parse_error(e)),
    };

    let mut xml = String::new();
    part.take(MAX_DOCUMENT_XML_BYTES)
        .read_to_string(&mut xml)
        .map_err(parse_error)?;
    Ok(xml)
}

/// Paragraph text joined by newlines. Tabs and breaks inside a paragraph
/// become a tab and a newline respectively.
fn paragraphs_from_xml(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event().map_err(parse_error)? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_text_run => {
                current.push_str(&t.unescape().map_err(parse_error)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }

    Ok(paragraphs.join("\n"))
}

impl TextBackend for DocxExtractor {
    fn name(&self) -> &'static str {
        "docx-xml"
    }

    fn can_handle(&self, data: &[u8]) -> bool {
        data.starts_with(ZIP_MAGIC)
    }

    fn extract(&self, data: &[u8]) -> Result<ExtractedText, ExtractError> {
        if !self.can_handle(data) {
            return Err(ExtractError::ContentMismatch {
                declared: FileType::Docx,
            });
        }

        let xml = document_xml(data)?;
        let text = paragraphs_from_xml(&xml)?;

        Ok(ExtractedText {
            text,
            file_type: FileType::Docx,
            page_count: 1,
            backend: self.name().to_string(),
        })
    }
}
