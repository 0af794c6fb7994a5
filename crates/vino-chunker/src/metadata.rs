//! Per-file metadata extraction.
//!
//! Lightweight summary stats computed alongside chunking: size, counts,
//! frequency-ranked keywords, and a leading abstract. None of it feeds back
//! into the chunking pipeline.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Keywords kept after frequency ranking.
pub const DEFAULT_MAX_KEYWORDS: usize = 10;

/// Target abstract length, in characters.
pub const DEFAULT_ABSTRACT_LENGTH: usize = 500;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-zA-Z]{3,}\b").expect("static regex"));

/// Common English words excluded from keyword ranking.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "day", "get", "has", "him", "his", "how", "man", "new", "now", "old", "see",
    "two", "way", "who", "its", "did", "yes", "this", "that", "with", "have", "from", "they",
    "been", "will", "each", "more", "other", "than", "then", "them", "these", "some", "what",
    "when", "which", "there", "their", "would", "about", "into", "also", "such", "only", "were",
    "between", "where", "while", "after", "before", "during", "under", "over", "does", "being",
];

/// Summary metadata for one processed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Logical source label (e.g. the ingestion root or collection name).
    pub source: String,
    /// Bare file name.
    pub filename: String,
    /// Size on disk, in bytes.
    pub file_size: u64,
    /// Lowercased file extension.
    pub file_type: String,
    /// Exact page count for PDFs, a line-based estimate otherwise.
    pub page_count: usize,
    /// Whitespace-separated word count of the extracted text.
    pub word_count: usize,
    /// Character count of the extracted text.
    pub char_count: usize,
    /// Most frequent non-stopword terms, highest count first.
    pub keywords: Vec<String>,
    /// Leading text excerpt, trimmed near a sentence boundary.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

/// Build the metadata record for a file whose text was already extracted.
pub fn create_file_metadata(
    path: &Path,
    content: &str,
    page_count: usize,
    source: &str,
) -> Result<FileMetadata> {
    let file_size = std::fs::metadata(path)?.len();
    let (char_count, word_count) = char_word_count(content);

    Ok(FileMetadata {
        source: source.to_string(),
        filename: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        file_size,
        file_type: path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default(),
        page_count,
        word_count,
        char_count,
        keywords: extract_keywords(content, DEFAULT_MAX_KEYWORDS),
        abstract_text: generate_abstract(content, DEFAULT_ABSTRACT_LENGTH),
    })
}

fn char_word_count(content: &str) -> (usize, usize) {
    (content.chars().count(), content.split_whitespace().count())
}

/// Rank lowercased words of three or more letters by frequency, ties broken
/// alphabetically for deterministic output.
pub fn extract_keywords(content: &str, max_keywords: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in WORD.find_iter(content) {
        let word = word.as_str().to_lowercase();
        if !STOPWORDS.contains(&word.as_str()) {
            *counts.entry(word).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(max_keywords)
        .map(|(word, _)| word)
        .collect()
}

/// Take a leading excerpt of roughly `max_chars` characters, cut back to the
/// last full sentence when one ends past the halfway point.
pub fn generate_abstract(content: &str, max_chars: usize) -> String {
    let condensed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if condensed.chars().count() <= max_chars {
        return condensed;
    }

    let prefix: String = condensed.chars().take(max_chars).collect();
    match prefix.rfind('.') {
        Some(pos) if pos > max_chars / 2 => prefix[..=pos].to_string(),
        _ => format!("{}...", prefix.trim_end()),
    }
}
