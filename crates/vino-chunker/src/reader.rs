//! Document reading and conversion.
//!
//! Turns an on-disk file into plain text plus an optional table of contents,
//! dispatching on the file extension:
//!
//! - Markdown: ATX headings are flattened into the body and collected into a
//!   generated TOC block
//! - DOCX: text extraction via docx-lite
//! - PDF: text via pdf-extract, page count via lopdf
//! - everything else: encoding-aware plain text read
//!
//! Reading is failure-tolerant: any conversion error is logged and yields an
//! empty document, so one bad file never aborts a directory run.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ChunkerError, Result};

/// Heuristic for a leading table of contents: either a bullet block followed
/// by a blank line and capitalized text, or dot-leader lines ending in page
/// numbers.
static TOC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(- .*\r?\n\r?\n[A-Z]|\.{3,}.*\d+\s*\n)").expect("static regex"));

static TOC_BODY_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n\r?\n").expect("static regex"));

/// Markdown ATX heading line, one to six `#` then a space.
static MD_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(#{1,6})\s+(.+?)\s*$").expect("static regex"));

/// Page estimate for formats that carry no page structure.
const LINES_PER_PAGE: usize = 40;

/// A converted document, ready for normalization and segmentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDocument {
    /// Detected or generated table of contents; empty when none was found.
    pub toc: String,
    /// Plain-text body.
    pub body: String,
    /// Exact page count for PDFs, a line-based estimate otherwise.
    pub page_count: usize,
}

impl RawDocument {
    /// Whether conversion produced any usable text.
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// Read and convert a file. Never fails: conversion errors are logged and an
/// empty document is returned instead.
pub fn read_document(path: &Path) -> RawDocument {
    match convert(path) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("failed to read {}: {e}", path.display());
            RawDocument::default()
        }
    }
}

fn convert(path: &Path) -> Result<RawDocument> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "md" | "markdown" => {
            let text = read_text_file(path)?;
            let (toc, body) = markdown_to_plain(&text);
            let page_count = estimate_page_count(&body);
            Ok(RawDocument { toc, body, page_count })
        }
        "docx" => {
            let text = docx_lite::extract_text(path)
                .map_err(|e| ChunkerError::Conversion(format!("{}: {e}", path.display())))?;
            let (toc, body) = split_toc(&text);
            let page_count = estimate_page_count(&body);
            Ok(RawDocument { toc, body, page_count })
        }
        "pdf" => {
            let text = pdf_extract::extract_text(path)
                .map_err(|e| ChunkerError::Conversion(format!("{}: {e}", path.display())))?;
            // pdf-extract can leave NUL bytes behind on some producers.
            let text = text.replace('\u{0}', "");
            let (toc, body) = split_toc(&text);
            Ok(RawDocument {
                toc,
                body,
                page_count: pdf_page_count(path),
            })
        }
        _ => {
            let text = read_text_file(path)?;
            let (toc, body) = split_toc(&text);
            let page_count = estimate_page_count(&body);
            Ok(RawDocument { toc, body, page_count })
        }
    }
}

/// Read a text file, transcoding legacy encodings to UTF-8 when the bytes are
/// not already valid UTF-8.
fn read_text_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            let bytes = e.into_bytes();
            let mut detector = chardetng::EncodingDetector::new();
            detector.feed(&bytes, true);
            let encoding = detector.guess(None, true);
            let (text, _, had_errors) = encoding.decode(&bytes);
            if had_errors {
                tracing::debug!(
                    "lossy {} decode of {}",
                    encoding.name(),
                    path.display()
                );
            }
            Ok(text.into_owned())
        }
    }
}

/// Flatten markdown into (generated TOC, plain body).
///
/// Heading lines lose their `#` markers but stay in the body as bare
/// paragraphs, so the segmenter can match them against the generated TOC.
fn markdown_to_plain(text: &str) -> (String, String) {
    let mut headings = Vec::new();
    for captures in MD_HEADING.captures_iter(text) {
        if let Some(heading) = captures.get(2) {
            headings.push(heading.as_str().to_string());
        }
    }

    let body = MD_HEADING.replace_all(text, "$2").into_owned();
    if headings.is_empty() {
        return (String::new(), body);
    }

    let toc = headings
        .iter()
        .map(|heading| format!("- {heading}"))
        .collect::<Vec<_>>()
        .join("\n");
    (toc, body)
}

/// Split off a leading TOC block when the heuristic pattern fires: the TOC is
/// everything before the first blank line, the body is the rest.
fn split_toc(text: &str) -> (String, String) {
    if !TOC_PATTERN.is_match(text) {
        return (String::new(), text.to_string());
    }
    match TOC_BODY_BREAK.find(text) {
        Some(sep) => (
            text[..sep.start()].to_string(),
            text[sep.end()..].to_string(),
        ),
        None => (String::new(), text.to_string()),
    }
}

fn estimate_page_count(body: &str) -> usize {
    (body.lines().count().div_ceil(LINES_PER_PAGE)).max(1)
}

/// Exact page count via lopdf; falls back to 1 when the file cannot be
/// parsed (the text extraction path already succeeded by then).
fn pdf_page_count(path: &Path) -> usize {
    match lopdf::Document::load(path) {
        Ok(doc) => doc.get_pages().len().max(1),
        Err(e) => {
            tracing::debug!("page count unavailable for {}: {e}", path.display());
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_temp(suffix: &str, content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_markdown_headings_become_toc() {
        let (toc, body) = markdown_to_plain("# Intro\n\nText one.\n\n## Details\n\nText two.\n");
        assert_eq!(toc, "- Intro\n- Details");
        assert!(body.contains("Intro\n"));
        assert!(body.contains("Details\n"));
        assert!(!body.contains('#'));
    }

    #[test]
    fn test_markdown_without_headings_has_no_toc() {
        let (toc, body) = markdown_to_plain("just a paragraph\nanother line");
        assert!(toc.is_empty());
        assert_eq!(body, "just a paragraph\nanother line");
    }

    #[test]
    fn test_split_toc_detects_bullet_block() {
        let text = "- Intro\n- Details\n\nIntro\n\nBody text here.";
        let (toc, body) = split_toc(text);
        assert_eq!(toc, "- Intro\n- Details");
        assert!(body.starts_with("Intro"));
    }

    #[test]
    fn test_split_toc_detects_dot_leaders() {
        let text = "Introduction......3\nDetails......7\n\nIntroduction\n\nBody.";
        let (toc, body) = split_toc(text);
        assert!(toc.contains("Introduction......3"));
        assert!(body.contains("Body."));
    }

    #[test]
    fn test_split_toc_absent() {
        let text = "Plain prose.\n\nMore prose.";
        let (toc, body) = split_toc(text);
        assert!(toc.is_empty());
        assert_eq!(body, text);
    }

    #[test]
    fn test_read_markdown_file() {
        let file = write_temp(".md", b"# Title\n\nSome body content.\n");
        let doc = read_document(file.path());
        assert_eq!(doc.toc, "- Title");
        assert!(doc.body.contains("Some body content."));
        assert_eq!(doc.page_count, 1);
    }

    #[test]
    fn test_read_plain_text_file() {
        let file = write_temp(".txt", b"Nothing fancy here.\n");
        let doc = read_document(file.path());
        assert!(doc.toc.is_empty());
        assert_eq!(doc.body, "Nothing fancy here.\n");
    }

    #[test]
    fn test_read_latin1_text_file() {
        // "café" in ISO-8859-1
        let file = write_temp(".txt", b"caf\xe9 au lait");
        let doc = read_document(file.path());
        assert!(doc.body.contains("café"));
    }

    #[test]
    fn test_missing_file_yields_empty_document() {
        let doc = read_document(Path::new("/nonexistent/file.txt"));
        assert!(doc.is_empty());
    }

    #[test]
    fn test_corrupt_pdf_yields_empty_document() {
        let file = write_temp(".pdf", b"this is not a pdf");
        let doc = read_document(file.path());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_page_estimate_rounds_up() {
        assert_eq!(estimate_page_count(&"line\n".repeat(40)), 1);
        assert_eq!(estimate_page_count(&"line\n".repeat(41)), 2);
        assert_eq!(estimate_page_count(""), 1);
    }
}
