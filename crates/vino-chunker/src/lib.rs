//! Document chunking engine.
//!
//! Converts files (markdown, DOCX, PDF, plain text) into retrieval-ready,
//! token-bounded chunks. The pipeline runs in fixed stages:
//!
//! 1. read and convert the file ([`reader`])
//! 2. normalize the plain text ([`normalize`])
//! 3. segment by TOC headings ([`segment`])
//! 4. split oversized segments recursively ([`splitter`])
//! 5. assemble ordered chunk records ([`assemble`])
//!
//! Documents without usable structure (PDFs with no detected TOC) fall back
//! to fixed-window token chunking with overlap ([`fixed`]).
//!
//! ```no_run
//! use vino_chunker::{ChunkingConfig, DocumentChunker};
//!
//! let chunker = DocumentChunker::new(ChunkingConfig::default())?;
//! let chunks = chunker.chunk_file(std::path::Path::new("report.pdf"));
//! for chunk in &chunks {
//!     println!("{} [{} tokens] {}", chunk.id(), chunk.token_length, chunk.section);
//! }
//! # Ok::<(), vino_chunker::ChunkerError>(())
//! ```

pub mod assemble;
pub mod config;
pub mod error;
pub mod fixed;
pub mod metadata;
pub mod normalize;
pub mod reader;
pub mod segment;
pub mod splitter;
pub mod tokenizer;

use std::path::Path;

pub use assemble::{DocumentChunk, NO_HEADING};
pub use config::ChunkingConfig;
pub use error::{ChunkerError, Result};
pub use metadata::FileMetadata;
pub use segment::MatchStrategy;
pub use tokenizer::{BpeTokenizer, Tokenizer};

/// The chunking pipeline, bound to a configuration and a tokenizer.
pub struct DocumentChunker {
    config: ChunkingConfig,
    tokenizer: Box<dyn Tokenizer>,
}

impl DocumentChunker {
    /// Build a chunker with the BPE tokenizer named by the configuration.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        let tokenizer = BpeTokenizer::for_model(&config.encoding_model)?;
        Self::with_tokenizer(config, Box::new(tokenizer))
    }

    /// Build a chunker with a caller-supplied tokenizer.
    pub fn with_tokenizer(config: ChunkingConfig, tokenizer: Box<dyn Tokenizer>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, tokenizer })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Chunk already-extracted text with an optional TOC.
    pub fn chunk_text(&self, doc_id: &str, toc: &str, text: &str) -> Vec<DocumentChunk> {
        let normalized = normalize::normalize(text, &self.config);
        let segments = segment::segment(toc, &normalized, self.config.match_strategy);

        let mut pieces = Vec::new();
        for seg in segments {
            pieces.extend(splitter::split_oversized(
                &seg.format(),
                &self.config,
                self.tokenizer.as_ref(),
            ));
        }
        assemble::assemble(doc_id, pieces, self.tokenizer.as_ref())
    }

    /// Chunk one file.
    ///
    /// Unreadable or empty files produce zero chunks with a warning rather
    /// than an error, so callers can batch over mixed-quality corpora. PDFs
    /// with no detected TOC take the fixed-window path.
    pub fn chunk_file(&self, path: &Path) -> Vec<DocumentChunk> {
        let doc_id = assemble::doc_id_from_path(path);
        let doc = reader::read_document(path);
        if doc.is_empty() {
            tracing::warn!("no text extracted from {}; skipping", path.display());
            return Vec::new();
        }

        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        let chunks = if is_pdf && doc.toc.trim().is_empty() {
            tracing::debug!("no TOC detected in {}; using fixed windows", path.display());
            let normalized = normalize::normalize(&doc.body, &self.config);
            let pieces = fixed::chunk_fixed_window(
                &normalized,
                self.config.max_chunk_tokens,
                self.config.overlap_tokens,
                self.tokenizer.as_ref(),
            );
            assemble::assemble(&doc_id, pieces, self.tokenizer.as_ref())
        } else {
            self.chunk_text(&doc_id, &doc.toc, &doc.body)
        };

        tracing::debug!("{}: {} chunks", path.display(), chunks.len());
        chunks
    }

    /// Chunk every allowed file under `root`, recursively.
    ///
    /// Per-file failures are tolerated: a file that cannot be read or yields
    /// no text contributes zero chunks and the walk continues.
    pub fn chunk_directory(&self, root: &Path) -> Result<Vec<DocumentChunk>> {
        let mut files = Vec::new();
        collect_files(root, &self.config.allowed_filetypes, &mut files)?;
        files.sort();

        let mut chunks = Vec::new();
        let mut processed = 0usize;
        for file in &files {
            let file_chunks = self.chunk_file(file);
            if !file_chunks.is_empty() {
                processed += 1;
            }
            chunks.extend(file_chunks);
        }
        tracing::info!(
            "chunked {processed}/{} files under {} into {} chunks",
            files.len(),
            root.display(),
            chunks.len()
        );
        Ok(chunks)
    }

    /// Extract summary metadata for one file, using the same converted text
    /// the chunker sees.
    pub fn file_metadata(&self, path: &Path, source: &str) -> Result<FileMetadata> {
        let doc = reader::read_document(path);
        metadata::create_file_metadata(path, &doc.body, doc.page_count, source)
    }
}

fn collect_files(
    dir: &Path,
    allowed: &[String],
    out: &mut Vec<std::path::PathBuf>,
) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, allowed, out)?;
        } else if path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| allowed.iter().any(|a| a == &ext))
        {
            out.push(path);
        }
    }
    Ok(())
}
