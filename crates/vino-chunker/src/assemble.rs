//! Chunk assembly.
//!
//! Turns the final split pieces into [`DocumentChunk`] records with stable
//! identifiers, section labels, and exact token counts.

use serde::{Deserialize, Serialize};

use crate::segment::SEP;
use crate::tokenizer::Tokenizer;

/// Section label for chunks whose text carries no heading prefix.
pub const NO_HEADING: &str = "No Heading";

/// One retrieval-ready chunk of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Identifier of the source document, derived from its file name.
    pub doc_id: String,
    /// 1-based position within the document.
    pub chunk_index: usize,
    /// Owning section heading, or [`NO_HEADING`].
    pub section: String,
    /// Exact token count of `text` under the configured vocabulary.
    pub token_length: usize,
    /// Full chunk text, including any `"{heading} [SEP] "` prefix.
    pub text: String,
}

impl DocumentChunk {
    /// Stable chunk identifier, `"{doc_id}_{chunk_index}"`.
    pub fn id(&self) -> String {
        format!("{}_{}", self.doc_id, self.chunk_index)
    }
}

/// Wrap final text pieces into ordered chunk records.
///
/// The section label is recovered from the piece's own `[SEP]` prefix, so a
/// chunk remains self-describing even when handled away from its document.
pub fn assemble(doc_id: &str, pieces: Vec<String>, tokenizer: &dyn Tokenizer) -> Vec<DocumentChunk> {
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let section = text
                .split_once(SEP)
                .map(|(heading, _)| heading.trim().to_string())
                .filter(|heading| !heading.is_empty())
                .unwrap_or_else(|| NO_HEADING.to_string());
            DocumentChunk {
                doc_id: doc_id.to_string(),
                chunk_index: i + 1,
                section,
                token_length: tokenizer.count(&text),
                text,
            }
        })
        .collect()
}

/// Derive a document id from a file path: the file stem with spaces replaced
/// by underscores.
pub fn doc_id_from_path(path: &std::path::Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().replace(' ', "_"))
        .unwrap_or_else(|| "document".to_string())
}
