//! Chunking configuration.
//!
//! All knobs are carried in an immutable [`ChunkingConfig`] value that is
//! passed explicitly into the pipeline; components never read ambient global
//! state, which keeps the segmenter and splitter pure functions of their
//! inputs.

use crate::error::{ChunkerError, Result};
use crate::segment::MatchStrategy;

/// Default hard upper bound per chunk, in tokens.
pub const DEFAULT_MAX_CHUNK_TOKENS: usize = 300;

/// Default informational lower bound per chunk, in tokens. Not enforced by
/// the splitting logic itself.
pub const DEFAULT_MIN_CHUNK_TOKENS: usize = 50;

/// Default token overlap between consecutive fixed-window chunks.
pub const DEFAULT_OVERLAP_TOKENS: usize = 80;

/// Default tokenizer vocabulary selector.
pub const DEFAULT_ENCODING_MODEL: &str = "gpt-3.5-turbo";

/// Rough words-per-token ratio used by the word-count splitting fallback.
pub const DEFAULT_WORDS_PER_TOKEN: f64 = 0.75;

/// Configuration for the document chunking pipeline.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Hard upper bound per chunk before overflow is tolerated.
    pub max_chunk_tokens: usize,
    /// Informational lower bound; not enforced by splitting.
    pub min_chunk_tokens: usize,
    /// Token overlap for the fixed-window mode (not used by the
    /// heading-aware splitter).
    pub overlap_tokens: usize,
    /// Which tokenizer vocabulary to use for counting.
    pub encoding_model: String,
    /// Words-per-token ratio for the word-count splitting fallback.
    pub words_per_token: f64,
    /// How TOC headings are matched against body paragraphs.
    pub match_strategy: MatchStrategy,
    /// Literal artifact tokens removed during normalization.
    pub strip_artifacts: Vec<String>,
    /// File extensions (without dot) accepted by directory processing.
    pub allowed_filetypes: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_tokens: DEFAULT_MAX_CHUNK_TOKENS,
            min_chunk_tokens: DEFAULT_MIN_CHUNK_TOKENS,
            overlap_tokens: DEFAULT_OVERLAP_TOKENS,
            encoding_model: DEFAULT_ENCODING_MODEL.to_string(),
            words_per_token: DEFAULT_WORDS_PER_TOKEN,
            match_strategy: MatchStrategy::Exact,
            strip_artifacts: ["[image]", "[]", "[figure]", "[table]"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_filetypes: ["md", "docx", "pdf", "txt"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ChunkingConfig {
    /// Build a config from the environment, falling back to defaults for
    /// anything unset or unparsable.
    ///
    /// Recognized variables: `MAX_CHUNK_TOKENS`, `MIN_CHUNK_TOKENS`,
    /// `OVERLAP_TOKENS`, `ENCODING_MODEL`, `TOKEN_ESTIMATION_RATIO`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_parse("MAX_CHUNK_TOKENS") {
            config.max_chunk_tokens = v;
        }
        if let Some(v) = env_parse("MIN_CHUNK_TOKENS") {
            config.min_chunk_tokens = v;
        }
        if let Some(v) = env_parse("OVERLAP_TOKENS") {
            config.overlap_tokens = v;
        }
        if let Ok(v) = std::env::var("ENCODING_MODEL") {
            if !v.is_empty() {
                config.encoding_model = v;
            }
        }
        if let Some(v) = env_parse::<f64>("TOKEN_ESTIMATION_RATIO") {
            config.words_per_token = v;
        }
        config
    }

    /// Check the invariants between the token budgets.
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_tokens <= self.min_chunk_tokens {
            return Err(ChunkerError::Config(
                "MAX_CHUNK_TOKENS must be greater than MIN_CHUNK_TOKENS".to_string(),
            ));
        }
        // The fixed-window stride is max - overlap, so the overlap only has
        // to stay below the window size.
        if self.overlap_tokens >= self.max_chunk_tokens {
            return Err(ChunkerError::Config(
                "OVERLAP_TOKENS must be less than MAX_CHUNK_TOKENS".to_string(),
            ));
        }
        if self.words_per_token <= 0.0 {
            return Err(ChunkerError::Config(
                "TOKEN_ESTIMATION_RATIO must be positive".to_string(),
            ));
        }
        if self.allowed_filetypes.is_empty() {
            return Err(ChunkerError::Config(
                "at least one allowed file type is required".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
