//! Fixed-window token chunking.
//!
//! The fallback mode for documents with no usable structure (notably PDFs
//! where no table of contents was detected): encode the whole text once, then
//! slide a `max_tokens` window forward by `max_tokens - overlap_tokens` so
//! consecutive chunks share a token overlap.

use crate::tokenizer::Tokenizer;

/// Chunk `text` into decoded fixed-size token windows.
///
/// The stride is clamped to at least one token so the window always advances,
/// even with a degenerate `overlap_tokens >= max_tokens` configuration.
pub fn chunk_fixed_window(
    text: &str,
    max_tokens: usize,
    overlap_tokens: usize,
    tokenizer: &dyn Tokenizer,
) -> Vec<String> {
    let tokens = tokenizer.encode(text);
    if tokens.is_empty() {
        return Vec::new();
    }

    let max_tokens = max_tokens.max(1);
    let stride = max_tokens.saturating_sub(overlap_tokens).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < tokens.len() {
        let end = (start + max_tokens).min(tokens.len());
        let piece = tokenizer.decode(&tokens[start..end]);
        if !piece.trim().is_empty() {
            chunks.push(piece);
        }
        if end == tokens.len() {
            break;
        }
        start += stride;
    }
    chunks
}
