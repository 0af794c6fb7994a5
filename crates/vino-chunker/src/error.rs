//! Error types for the chunking engine.

use thiserror::Error;

/// Errors raised by the chunking pipeline.
///
/// None of these are fatal to a batch: `DocumentChunker` catches them at the
/// per-file boundary, logs, and moves on with zero chunks for that file.
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// Format conversion to plain text failed (corrupt file, unsupported
    /// sub-format, missing converter support).
    #[error("conversion error: {0}")]
    Conversion(String),

    /// I/O error reading a source file
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Tokenizer vocabulary could not be loaded, even after falling back to
    /// the default encoding.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for chunker operations.
pub type Result<T> = std::result::Result<T, ChunkerError>;
