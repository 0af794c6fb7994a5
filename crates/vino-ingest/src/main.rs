//! vino-ingest - document chunking CLI
//!
//! Chunks a file or a directory tree into retrieval-ready, token-bounded
//! chunks and prints them as a summary table or as JSON lines.
//!
//! Usage:
//!   vino-ingest ./docs                      Chunk a directory
//!   vino-ingest report.pdf --json           Chunk one file, emit JSON lines
//!   vino-ingest ./docs --max-tokens 200     Override the token budget
//!   vino-ingest report.pdf --metadata       Also print file metadata

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use vino_chunker::{ChunkingConfig, DocumentChunk, DocumentChunker, MatchStrategy};

#[derive(Parser)]
#[command(name = "vino-ingest", version, about = "Chunk documents into token-bounded pieces")]
struct Cli {
    /// File or directory to chunk
    path: PathBuf,

    /// Maximum tokens per chunk
    #[arg(long)]
    max_tokens: Option<usize>,

    /// Minimum tokens per chunk (informational bound)
    #[arg(long)]
    min_tokens: Option<usize>,

    /// Token overlap for fixed-window chunking
    #[arg(long)]
    overlap_tokens: Option<usize>,

    /// Tokenizer vocabulary model name
    #[arg(long)]
    model: Option<String>,

    /// Heading match strategy: exact, normalized, or fuzzy
    #[arg(long, default_value = "exact")]
    strategy: String,

    /// Emit chunks as JSON lines instead of a summary table
    #[arg(long)]
    json: bool,

    /// Also print file metadata (single-file mode only)
    #[arg(long)]
    metadata: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&cli)?;
    let chunker = DocumentChunker::new(config).context("failed to initialize chunker")?;

    let path = cli
        .path
        .canonicalize()
        .with_context(|| format!("failed to resolve path: {}", cli.path.display()))?;

    let chunks = if path.is_dir() {
        chunker
            .chunk_directory(&path)
            .with_context(|| format!("failed to chunk directory: {}", path.display()))?
    } else {
        chunker.chunk_file(&path)
    };

    if cli.json {
        print_json(&chunks)?;
    } else {
        print_summary(&chunks);
    }

    if cli.metadata {
        if path.is_dir() {
            anyhow::bail!("--metadata requires a single file, not a directory");
        }
        let source = path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let meta = chunker
            .file_metadata(&path, &source)
            .with_context(|| format!("failed to extract metadata from {}", path.display()))?;
        println!("{}", serde_json::to_string_pretty(&meta)?);
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<ChunkingConfig> {
    let mut config = ChunkingConfig::from_env();
    if let Some(v) = cli.max_tokens {
        config.max_chunk_tokens = v;
    }
    if let Some(v) = cli.min_tokens {
        config.min_chunk_tokens = v;
    }
    if let Some(v) = cli.overlap_tokens {
        config.overlap_tokens = v;
    }
    if let Some(model) = &cli.model {
        config.encoding_model = model.clone();
    }
    config.match_strategy = parse_strategy(&cli.strategy)?;
    Ok(config)
}

fn parse_strategy(name: &str) -> Result<MatchStrategy> {
    match name.to_lowercase().as_str() {
        "exact" => Ok(MatchStrategy::Exact),
        "normalized" => Ok(MatchStrategy::Normalized),
        "fuzzy" => Ok(MatchStrategy::Fuzzy),
        other => anyhow::bail!("unknown match strategy: {other} (expected exact, normalized, or fuzzy)"),
    }
}

fn print_json(chunks: &[DocumentChunk]) -> Result<()> {
    use std::io::Write as _;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for chunk in chunks {
        serde_json::to_writer(&mut out, chunk)?;
        writeln!(out)?;
    }
    Ok(())
}

fn print_summary(chunks: &[DocumentChunk]) {
    if chunks.is_empty() {
        println!("no chunks produced");
        return;
    }

    for chunk in chunks {
        let preview: String = chunk.text.chars().take(60).collect();
        println!(
            "{:<30} {:>4} tok  {:<24} {preview}",
            chunk.id(),
            chunk.token_length,
            truncate(&chunk.section, 24),
        );
    }

    let total_tokens: usize = chunks.iter().map(|c| c.token_length).sum();
    let docs = chunks
        .iter()
        .map(|c| c.doc_id.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len();
    println!("\n{} chunks from {docs} document(s), {total_tokens} tokens total", chunks.len());
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strategy() {
        assert_eq!(parse_strategy("exact").unwrap(), MatchStrategy::Exact);
        assert_eq!(parse_strategy("FUZZY").unwrap(), MatchStrategy::Fuzzy);
        assert!(parse_strategy("nope").is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 24), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
    }

    #[test]
    fn test_cli_flag_overrides() {
        let cli = Cli::parse_from([
            "vino-ingest",
            "some/path",
            "--max-tokens",
            "200",
            "--overlap-tokens",
            "30",
            "--strategy",
            "fuzzy",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.max_chunk_tokens, 200);
        assert_eq!(config.overlap_tokens, 30);
        assert_eq!(config.match_strategy, MatchStrategy::Fuzzy);
    }
}
