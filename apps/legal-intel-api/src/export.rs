//! CSV and PDF reports over stored documents

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as PdfDocument, Object, ObjectId, Stream};
use shared_types::{ComplianceStatus, RiskLevel};

use crate::models::Document;

pub const CSV_HEADER: [&str; 9] = [
    "id",
    "filename",
    "agreement_type",
    "risk_level",
    "compliance_status",
    "confidence_score",
    "risk_score",
    "indicator_count",
    "created_at",
];

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 54;
const FONT_SIZE: i64 = 9;
const LEADING: i64 = 13;
const LINES_PER_PAGE: usize = 52;
const MAX_FILENAME_CHARS: usize = 36;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("Unsupported export format '{}' (use csv or pdf)", other)),
        }
    }
}

/// Render `documents` in the requested format
pub fn render(format: ExportFormat, documents: &[Document], generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => to_csv(documents),
        ExportFormat::Pdf => to_pdf(documents, generated_at),
    }
}

pub fn to_csv(documents: &[Document]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .context("Failed to write CSV header")?;

    for doc in documents {
        let confidence = doc.analysis.confidence_score.to_string();
        let risk_score = doc.analysis.risk_score.to_string();
        let indicator_count = doc.analysis.matched_indicators.len().to_string();
        let created_at = doc.created_at.to_rfc3339();

        writer
            .write_record([
                doc.id.as_str(),
                doc.filename.as_str(),
                doc.metadata.agreement_type.as_str(),
                doc.analysis.risk_level.as_str(),
                doc.analysis.compliance_status.as_str(),
                confidence.as_str(),
                risk_score.as_str(),
                indicator_count.as_str(),
                created_at.as_str(),
            ])
            .context("Failed to write CSV record")?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))
}

/// Lines of the text report, before pagination
fn report_lines(documents: &[Document], generated_at: DateTime<Utc>) -> Vec<String> {
    let count_risk = |level: RiskLevel| {
        documents
            .iter()
            .filter(|d| d.analysis.risk_level == level)
            .count()
    };
    let count_compliance = |status: ComplianceStatus| {
        documents
            .iter()
            .filter(|d| d.analysis.compliance_status == status)
            .count()
    };

    let mut lines = vec![
        "Legal Document Analysis Report".to_string(),
        format!("Generated {}", generated_at.format("%Y-%m-%d %H:%M UTC")),
        String::new(),
        format!("Total documents: {}", documents.len()),
        format!(
            "Risk: {} high, {} medium, {} low",
            count_risk(RiskLevel::High),
            count_risk(RiskLevel::Medium),
            count_risk(RiskLevel::Low)
        ),
        format!(
            "Compliance: {} non-compliant, {} review required, {} compliant",
            count_compliance(ComplianceStatus::NonCompliant),
            count_compliance(ComplianceStatus::ReviewRequired),
            count_compliance(ComplianceStatus::Compliant)
        ),
        String::new(),
    ];

    if documents.is_empty() {
        lines.push("No documents have been uploaded.".to_string());
        return lines;
    }

    lines.push(format!(
        "{:<36}  {:<20}  {:<6}  {:<15}  {:>4}",
        "Filename", "Type", "Risk", "Compliance", "Conf"
    ));
    for doc in documents {
        lines.push(format!(
            "{:<36}  {:<20}  {:<6}  {:<15}  {:>4}",
            truncate(&doc.filename, MAX_FILENAME_CHARS),
            doc.metadata.agreement_type.as_str(),
            doc.analysis.risk_level.as_str(),
            doc.analysis.compliance_status.as_str(),
            doc.analysis.confidence_score
        ));
    }

    lines
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max - 3).collect();
        out.push_str("...");
        out
    }
}

/// Encode a line as WinAnsi bytes for the standard Helvetica font.
/// Latin-1 letters and the common Windows-1252 punctuation survive;
/// control characters and anything outside the code page become '?'.
fn pdf_safe(line: &str) -> Vec<u8> {
    line.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        ' '..='~' => c as u8,
        '\u{00a0}'..='\u{00ff}' => c as u32 as u8,
        '€' => 0x80,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        _ => b'?',
    }
}

pub fn to_pdf(documents: &[Document], generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
    let lines = report_lines(documents, generated_at);

    let mut doc = PdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut page_ids: Vec<ObjectId> = Vec::new();
    for chunk in lines.chunks(LINES_PER_PAGE) {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
            Operation::new("TL", vec![LEADING.into()]),
            Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN).into()]),
        ];
        for line in chunk {
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(pdf_safe(line), lopdf::StringFormat::Literal)],
            ));
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().context("Failed to encode PDF content")?,
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    let page_count = page_ids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out).context("Failed to write PDF")?;
    Ok(out)
}
