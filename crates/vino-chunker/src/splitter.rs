//! Recursive size-bounded splitting of oversized segments.
//!
//! A formatted segment over the token budget is reduced by the first
//! applicable strategy (list-item boundaries, then sentence boundaries, then
//! raw word-count slicing), with every emitted piece re-prefixed with its
//! heading before the budget check, so the prefix cost is always counted.
//! Pieces still over budget are re-submitted recursively; a strategy that
//! fails to divide the text falls through to the next, and text no strategy
//! can divide is accepted as irreducible overflow. Content is never truncated
//! or dropped.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ChunkingConfig;
use crate::segment::SEP;
use crate::tokenizer::Tokenizer;

/// Bullet (`\n- `) and numbered (`\nN.`) list item boundaries.
static LIST_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n- |\n\d+\.").expect("static regex"));

/// Recursion guard: past this depth the piece is accepted as overflow, which
/// bounds pathological inputs with no natural split points.
const MAX_SPLIT_DEPTH: usize = 16;

/// Split a formatted segment (`"{heading} [SEP] {body}"`, or bare body) into
/// pieces that fit `config.max_chunk_tokens`, tolerating overflow only for
/// irreducible units.
pub fn split_oversized(
    text: &str,
    config: &ChunkingConfig,
    tokenizer: &dyn Tokenizer,
) -> Vec<String> {
    split_recursive(text, config, tokenizer, 0)
}

fn split_recursive(
    text: &str,
    config: &ChunkingConfig,
    tokenizer: &dyn Tokenizer,
    depth: usize,
) -> Vec<String> {
    if tokenizer.count(text) <= config.max_chunk_tokens {
        return vec![text.to_string()];
    }
    if depth >= MAX_SPLIT_DEPTH {
        tracing::warn!(
            "split depth limit reached at {} tokens; accepting overflow",
            tokenizer.count(text)
        );
        return vec![text.to_string()];
    }

    let (heading, content) = match text.split_once(SEP) {
        Some((heading, content)) => (heading.trim(), content.trim()),
        None => ("", text.trim()),
    };

    let Some(pieces) = split_with_strategies(content, heading, config, tokenizer) else {
        // No strategy divides this text: a single indivisible unit over
        // budget is emitted as-is rather than truncated.
        return vec![text.to_string()];
    };

    let mut out = Vec::new();
    for piece in pieces {
        if tokenizer.count(&piece) > config.max_chunk_tokens {
            out.extend(split_recursive(&piece, config, tokenizer, depth + 1));
        } else {
            out.push(piece);
        }
    }
    out
}

/// Try the strategies in order and return the first that actually divides
/// the content. `None` means the content is irreducible.
fn split_with_strategies(
    content: &str,
    heading: &str,
    config: &ChunkingConfig,
    tokenizer: &dyn Tokenizer,
) -> Option<Vec<String>> {
    if LIST_MARKER.is_match(content) {
        let pieces = split_by_list_items(content, heading, config.max_chunk_tokens, tokenizer);
        if pieces.len() > 1 {
            return Some(pieces);
        }
    }
    if content.contains('.') {
        let pieces = split_by_sentences(content, heading, config.max_chunk_tokens, tokenizer);
        if pieces.len() > 1 {
            return Some(pieces);
        }
    }
    let pieces = split_by_words(
        content,
        heading,
        config.max_chunk_tokens,
        config.words_per_token,
    );
    (pieces.len() > 1).then_some(pieces)
}

/// Re-attach the heading prefix to a piece body.
fn with_heading(heading: &str, body: &str) -> String {
    let body = body.trim();
    if heading.is_empty() {
        body.to_string()
    } else {
        format!("{heading} {SEP} {body}")
    }
}

/// Split content at list-item boundaries, keeping each marker attached to its
/// item, and greedily pack items up to the budget.
fn split_by_list_items(
    content: &str,
    heading: &str,
    max_tokens: usize,
    tokenizer: &dyn Tokenizer,
) -> Vec<String> {
    let mut parts: Vec<&str> = Vec::new();
    let mut prev = 0;
    for marker in LIST_MARKER.find_iter(content) {
        if marker.start() > prev {
            parts.push(&content[prev..marker.start()]);
        }
        prev = marker.start();
    }
    parts.push(&content[prev..]);

    let mut chunks = Vec::new();
    let mut current = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i == 0 {
            current = (*part).to_string();
            continue;
        }
        // Parts carry their own markers, so plain concatenation reproduces
        // the original text.
        let test = format!("{current}{part}");
        if tokenizer.count(&with_heading(heading, &test)) > max_tokens
            && !current.trim().is_empty()
        {
            chunks.push(with_heading(heading, &current));
            current = (*part).to_string();
        } else {
            current = test;
        }
    }
    if !current.trim().is_empty() {
        chunks.push(with_heading(heading, &current));
    }
    chunks
}

/// Split content at sentence boundaries (`.`/`!`/`?` followed by whitespace)
/// and greedily pack sentences up to the budget.
fn split_by_sentences(
    content: &str,
    heading: &str,
    max_tokens: usize,
    tokenizer: &dyn Tokenizer,
) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for sentence in split_sentences(content) {
        let test = if current.is_empty() {
            sentence.to_string()
        } else {
            format!("{current} {sentence}")
        };
        if tokenizer.count(&with_heading(heading, &test)) > max_tokens
            && !current.trim().is_empty()
        {
            chunks.push(with_heading(heading, &current));
            current = sentence.to_string();
        } else {
            current = test;
        }
    }
    if !current.trim().is_empty() {
        chunks.push(with_heading(heading, &current));
    }
    chunks
}

/// Sentence boundary scan. The `regex` crate has no lookbehind, so this is
/// an explicit walk instead of a `(?<=[.!?])\s+` split: a boundary sits
/// after sentence-ending punctuation that is followed by whitespace (any
/// Unicode whitespace, NBSP included), and the whitespace run itself is
/// dropped.
fn split_sentences(content: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = content.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let is_terminator = matches!(c, '.' | '!' | '?');
        if is_terminator && chars.peek().is_some_and(|(_, next)| next.is_whitespace()) {
            sentences.push(&content[start..i + c.len_utf8()]);
            start = content.len();
            while let Some(&(j, next)) = chars.peek() {
                if next.is_whitespace() {
                    chars.next();
                } else {
                    start = j;
                    break;
                }
            }
        }
    }

    if start < content.len() {
        sentences.push(&content[start..]);
    }
    sentences
}

/// Last-resort splitting by approximate word count, sized from the
/// words-per-token ratio. No greedy re-check here; the recursive pass
/// re-verifies each group against the budget.
fn split_by_words(
    content: &str,
    heading: &str,
    max_tokens: usize,
    words_per_token: f64,
) -> Vec<String> {
    let words: Vec<&str> = content.split_whitespace().collect();
    let words_per_chunk = ((max_tokens as f64 * words_per_token) as usize).max(1);

    words
        .chunks(words_per_chunk)
        .map(|group| with_heading(heading, &group.join(" ")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test double: one token per whitespace-separated word, so budgets are
    /// predictable.
    struct WordTokenizer;

    impl Tokenizer for WordTokenizer {
        fn encode(&self, text: &str) -> Vec<u32> {
            text.split_whitespace().map(|_| 0).collect()
        }

        fn decode(&self, _tokens: &[u32]) -> String {
            String::new()
        }
    }

    fn config(max_tokens: usize) -> ChunkingConfig {
        ChunkingConfig {
            max_chunk_tokens: max_tokens,
            ..Default::default()
        }
    }

    fn body_of(piece: &str) -> &str {
        piece.split_once(SEP).map_or(piece, |(_, body)| body).trim()
    }

    #[test]
    fn test_under_budget_unchanged() {
        let tok = WordTokenizer;
        let text = "Intro [SEP] short body here.";
        let pieces = split_oversized(text, &config(100), &tok);
        assert_eq!(pieces, vec![text.to_string()]);
    }

    #[test]
    fn test_sentence_split_respects_budget() {
        let tok = WordTokenizer;
        let text = "Intro [SEP] One two three four. Five six seven eight. Nine ten eleven twelve.";
        let pieces = split_oversized(text, &config(8), &tok);
        assert!(pieces.len() > 1);
        for piece in &pieces {
            assert!(piece.starts_with("Intro [SEP] "), "heading lost: {piece}");
            assert!(tok.count(piece) <= 8, "over budget: {piece}");
        }
    }

    #[test]
    fn test_list_split_keeps_markers() {
        let tok = WordTokenizer;
        let text = "Steps [SEP] intro line\n- item one has words\n- item two has words\n- item three has words";
        let pieces = split_oversized(text, &config(9), &tok);
        assert!(pieces.len() > 1);
        let rejoined: String = pieces.iter().map(|p| body_of(p)).collect::<Vec<_>>().join(" ");
        assert!(rejoined.contains("- item one"));
        assert!(rejoined.contains("- item two"));
        assert!(rejoined.contains("- item three"));
    }

    #[test]
    fn test_numbered_list_markers_survive() {
        let tok = WordTokenizer;
        let text = "Plan [SEP] first\n1. alpha beta gamma delta\n2. epsilon zeta eta theta";
        let pieces = split_oversized(text, &config(7), &tok);
        let rejoined: String = pieces.iter().map(|p| body_of(p)).collect::<Vec<_>>().join(" ");
        assert!(rejoined.contains("1."), "numbered marker dropped: {rejoined}");
        assert!(rejoined.contains("2."), "numbered marker dropped: {rejoined}");
    }

    #[test]
    fn test_list_strategy_preferred_over_sentences() {
        let tok = WordTokenizer;
        // Sentences inside items must not cause a mid-item split.
        let text = "H [SEP] start\n- one. two. three. four.\n- five. six. seven. eight.";
        let pieces = split_oversized(text, &config(8), &tok);
        for piece in &pieces {
            let body = body_of(piece);
            // Each piece is whole items (or the intro), never a torn item.
            assert!(
                !body.starts_with("two.") && !body.starts_with("six."),
                "sentence split inside list item: {body}"
            );
        }
    }

    #[test]
    fn test_word_fallback_on_runon_text() {
        let tok = WordTokenizer;
        let words: Vec<String> = (0..500).map(|i| format!("w{i}")).collect();
        let text = words.join(" ");
        let max_tokens = 50;
        let pieces = split_oversized(&text, &config(max_tokens), &tok);

        // 50 * 0.75 = 37 words per group
        let expected = 500usize.div_ceil(37);
        assert_eq!(pieces.len(), expected);
        for piece in &pieces[..pieces.len() - 1] {
            assert!(tok.count(piece) <= max_tokens);
        }
    }

    #[test]
    fn test_no_content_loss() {
        let tok = WordTokenizer;
        let text = "Guide [SEP] Alpha beta gamma. Delta epsilon zeta eta. Theta iota kappa lambda mu.";
        let pieces = split_oversized(text, &config(7), &tok);

        let original_words: Vec<&str> = body_of(text).split_whitespace().collect();
        let rejoined: Vec<String> = pieces
            .iter()
            .flat_map(|p| body_of(p).split_whitespace().map(String::from).collect::<Vec<_>>())
            .collect();
        assert_eq!(
            original_words,
            rejoined.iter().map(String::as_str).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_irreducible_single_word_accepted() {
        let tok = WordTokenizer;
        // One "word" counted as one token, but budget of... budget must be
        // below the formatted total. Heading + SEP + word = 3 tokens.
        let text = "H [SEP] supercalifragilistic";
        let pieces = split_oversized(text, &config(1), &tok);
        assert_eq!(pieces, vec![text.to_string()]);
    }

    #[test]
    fn test_heading_reattached_to_every_piece() {
        let tok = WordTokenizer;
        let text = "Section Nine [SEP] one. two. three. four. five. six. seven. eight. nine. ten.";
        let pieces = split_oversized(text, &config(6), &tok);
        assert!(pieces.len() > 1);
        for piece in &pieces {
            assert!(piece.starts_with("Section Nine [SEP] "));
        }
    }

    #[test]
    fn test_split_sentences_boundaries() {
        let sentences = split_sentences("One two. Three four! Five six? Seven");
        assert_eq!(sentences, vec!["One two.", "Three four!", "Five six?", "Seven"]);
    }

    #[test]
    fn test_split_sentences_unicode_whitespace() {
        let sentences = split_sentences("First one.\u{a0}Second one.\tThird");
        assert_eq!(sentences, vec!["First one.", "Second one.", "Third"]);
    }

    #[test]
    fn test_split_sentences_no_boundary() {
        assert_eq!(split_sentences("no terminator here"), vec!["no terminator here"]);
    }
}
