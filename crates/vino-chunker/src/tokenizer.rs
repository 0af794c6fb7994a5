//! Tokenizer adapter.
//!
//! The chunker never talks to a tokenizer library directly; it depends on the
//! narrow [`Tokenizer`] contract so the BPE backend can be swapped (or faked
//! in tests) without touching the pipeline.

use tiktoken_rs::{cl100k_base, get_bpe_from_model, CoreBPE};

use crate::error::{ChunkerError, Result};

/// Narrow tokenization contract consumed by the chunking pipeline.
///
/// `Send + Sync` so a single adapter can be shared across per-file workers;
/// the BPE encoder holds no mutable state.
pub trait Tokenizer: Send + Sync {
    /// Encode text into a token id sequence.
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Decode a token id sequence back into text.
    fn decode(&self, tokens: &[u32]) -> String;

    /// Count the tokens in `text`.
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }
}

/// BPE tokenizer backed by tiktoken vocabularies.
pub struct BpeTokenizer {
    bpe: CoreBPE,
}

impl BpeTokenizer {
    /// Resolve the vocabulary for a model name (e.g. `gpt-3.5-turbo`).
    ///
    /// Unknown model names fall back to `cl100k_base` with a warning rather
    /// than failing the pipeline; the fallback vocabulary itself failing to
    /// load is the only error case.
    pub fn for_model(model: &str) -> Result<Self> {
        let bpe = match get_bpe_from_model(model) {
            Ok(bpe) => bpe,
            Err(e) => {
                tracing::warn!("unknown encoding model {model}: {e}; falling back to cl100k_base");
                cl100k_base().map_err(|e| ChunkerError::Tokenizer(e.to_string()))?
            }
        };
        Ok(Self { bpe })
    }
}

impl Tokenizer for BpeTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe.encode_ordinary(text)
    }

    fn decode(&self, tokens: &[u32]) -> String {
        // Lossy by contract: invalid id sequences decode to an empty string
        // instead of propagating an error into the pure pipeline.
        self.bpe.decode(tokens.to_vec()).unwrap_or_default()
    }
}
