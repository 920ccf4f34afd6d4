//! Document type detection and text extraction for uploaded CVs.
//!
//! Supported: PDF (pdf-extract), DOCX (`word/document.xml` inside the zip),
//! and UTF-8 plain text. PDF parsing is CPU-bound and runs inside
//! `tokio::task::spawn_blocking`.

use std::io::{Cursor, Read};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use zip::ZipArchive;

use crate::errors::AppError;

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// Some generators put junk before the header; readers accept it within the first KiB.
const PDF_HEADER_WINDOW: usize = 1024;
/// Upper bound for the inflated `word/document.xml`; a text CV is far smaller.
const MAX_DOCX_XML_BYTES: u64 = 16 * 1024 * 1024;
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentKind {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" | "text" | "md" => Some(Self::PlainText),
            _ => None,
        }
    }

    fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "application/pdf" => Some(Self::Pdf),
            DOCX_MIME => Some(Self::Docx),
            "text/plain" | "text/markdown" => Some(Self::PlainText),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::PlainText => "text",
        }
    }
}

/// Decides the document kind. The file extension wins; the declared content
/// type is only consulted when the name has no extension. The content must
/// then look like the claimed kind.
pub fn detect_kind(
    file_name: Option<&str>,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<DocumentKind, AppError> {
    let extension = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty());

    let kind = match extension {
        Some(ext) => DocumentKind::from_extension(ext).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Unsupported file type '.{ext}'. Upload a PDF, DOCX or TXT file."
            ))
        })?,
        None => content_type
            .and_then(DocumentKind::from_content_type)
            .ok_or_else(|| {
                AppError::InvalidInput(
                    "Could not determine the file type. Upload a PDF, DOCX or TXT file."
                        .to_string(),
                )
            })?,
    };

    let looks_right = match kind {
        DocumentKind::Pdf => {
            let window = &bytes[..bytes.len().min(PDF_HEADER_WINDOW)];
            window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
        }
        DocumentKind::Docx => bytes.starts_with(ZIP_MAGIC),
        DocumentKind::PlainText => true,
    };
    if !looks_right {
        return Err(AppError::InvalidInput(format!(
            "The file content does not match its {} type",
            kind.label()
        )));
    }

    Ok(kind)
}

/// Extracts normalised text. Empty output is an error: a document with no
/// readable text cannot be analysed.
pub async fn extract_text(kind: DocumentKind, bytes: Bytes) -> Result<String, AppError> {
    let raw = match kind {
        DocumentKind::Pdf => extract_pdf_text(bytes).await?,
        DocumentKind::Docx => extract_docx_text(&bytes)?,
        DocumentKind::PlainText => decode_plain_text(&bytes)?,
    };

    let text = normalize_text(&raw);
    if text.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "No readable text was found in the {} file",
            kind.label()
        )));
    }
    Ok(text)
}

async fn extract_pdf_text(bytes: Bytes) -> Result<String, AppError> {
    // The parser may panic on malformed input; a panic surfaces as a JoinError.
    let outcome = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await;

    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => {
            tracing::debug!("pdf-extract failed: {e}");
            Err(unreadable(DocumentKind::Pdf))
        }
        Err(e) => {
            tracing::warn!("PDF extraction task aborted: {e}");
            Err(unreadable(DocumentKind::Pdf))
        }
    }
}

fn extract_docx_text(bytes: &[u8]) -> Result<String, AppError> {
    let xml = read_document_xml(bytes, MAX_DOCX_XML_BYTES)?;
    Ok(docx_xml_to_text(&xml))
}

/// Inflates `word/document.xml`, refusing to produce more than `limit` bytes
/// whatever the entry header claims.
fn read_document_xml(bytes: &[u8], limit: u64) -> Result<String, AppError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|_| unreadable(DocumentKind::Docx))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| unreadable(DocumentKind::Docx))?;

    if entry.size() > limit {
        return Err(docx_too_large(entry.size()));
    }

    let mut xml = Vec::new();
    entry
        .take(limit + 1)
        .read_to_end(&mut xml)
        .map_err(|_| unreadable(DocumentKind::Docx))?;
    if xml.len() as u64 > limit {
        return Err(docx_too_large(xml.len() as u64));
    }

    String::from_utf8(xml).map_err(|_| unreadable(DocumentKind::Docx))
}

fn docx_too_large(size: u64) -> AppError {
    tracing::warn!("Rejected DOCX whose document part inflates to {size}+ bytes");
    AppError::InvalidInput(
        "The DOCX file expands to too much text to analyse. Upload a shorter document."
            .to_string(),
    )
}

fn decode_plain_text(bytes: &[u8]) -> Result<String, AppError> {
    let text = std::str::from_utf8(bytes).map_err(|_| {
        AppError::InvalidInput("The text file is not valid UTF-8".to_string())
    })?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

fn unreadable(kind: DocumentKind) -> AppError {
    AppError::InvalidInput(format!(
        "The {} file could not be read. It may be corrupted, encrypted or image-only.",
        kind.label()
    ))
}

/// Pulls the visible text out of WordprocessingML. Only `<w:t>` runs carry
/// text; paragraph ends and breaks become newlines, tabs become spaces.
fn docx_xml_to_text(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len() / 4);
    let mut in_text_run = false;
    let mut rest = xml;

    while let Some(open) = rest.find('<') {
        if in_text_run {
            out.push_str(&decode_entities(&rest[..open]));
        }
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        let tag = &rest[open + 1..open + close];
        let name = tag
            .trim_end_matches('/')
            .split_whitespace()
            .next()
            .unwrap_or_default();

        match name {
            "w:t" => in_text_run = !tag.ends_with('/'),
            "/w:t" => in_text_run = false,
            "/w:p" | "w:br" | "w:cr" => out.push('\n'),
            "w:tab" => out.push(' '),
            _ => {}
        }

        rest = &rest[open + close + 1..];
    }

    out
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        let decoded = after.find(';').and_then(|semi| {
            let entity = &after[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Collapses whitespace inside lines, keeps at most one blank line between
/// blocks, and trims the ends.
pub fn normalize_text(raw: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut previous_blank = true;

    for line in raw.replace('\u{c}', "\n").lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            if !previous_blank {
                lines.push(String::new());
            }
            previous_blank = true;
        } else {
            lines.push(collapsed);
            previous_blank = false;
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
