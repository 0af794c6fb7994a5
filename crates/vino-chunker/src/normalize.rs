//! Plain-text normalization.
//!
//! The converter output is cleaned by a fixed sequence of named passes, each
//! independently testable:
//!
//! 1. strip artifact tokens (`[image]`, `[]`, `[figure]`, `[table]`)
//! 2. normalize line endings to `\n`
//! 3. join soft-wrapped lines into paragraphs
//! 4. collapse blank-line runs to exactly one blank line
//! 5. collapse interior space runs to a single space
//!
//! The composed [`normalize`] is pure and idempotent: applying it twice
//! yields the same result as once.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ChunkingConfig;

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").expect("static regex"));

/// Run all normalization passes in order.
pub fn normalize(text: &str, config: &ChunkingConfig) -> String {
    let text = strip_artifacts(text, &config.strip_artifacts);
    let text = normalize_line_endings(&text);
    let text = join_soft_wraps(&text);
    let text = collapse_blank_lines(&text);
    collapse_spaces(&text)
}

/// Remove literal artifact tokens left behind by document conversion.
///
/// Removal iterates to a fixpoint so nested occurrences (`[figure[]]`) cannot
/// survive a single application.
pub fn strip_artifacts(text: &str, artifacts: &[String]) -> String {
    let mut out = text.to_string();
    loop {
        let mut changed = false;
        for artifact in artifacts {
            if !artifact.is_empty() && out.contains(artifact.as_str()) {
                out = out.replace(artifact.as_str(), "");
                changed = true;
            }
        }
        if !changed {
            return out;
        }
    }
}

/// Normalize `\r\n` and bare `\r` line endings to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Replace a single `\n` with a space, unless it is part of a paragraph
/// break (adjacent to another `\n`) or immediately precedes a `- ` bullet
/// marker (list item boundaries keep their newline).
pub fn join_soft_wraps(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for (i, &c) in chars.iter().enumerate() {
        if c != '\n' {
            out.push(c);
            continue;
        }
        let prev_is_newline = i > 0 && chars[i - 1] == '\n';
        let next_is_newline = chars.get(i + 1) == Some(&'\n');
        let next_is_bullet = chars.get(i + 1) == Some(&'-') && chars.get(i + 2) == Some(&' ');
        if prev_is_newline || next_is_newline || next_is_bullet {
            out.push('\n');
        } else {
            out.push(' ');
        }
    }

    out
}

/// Collapse any run of two or more newlines down to exactly one blank line.
pub fn collapse_blank_lines(text: &str) -> String {
    PARAGRAPH_BREAK.replace_all(text, "\n\n").into_owned()
}

/// Collapse interior runs of spaces to a single space. Runs at line start
/// (indentation) are left untouched.
pub fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for line in text.split_inclusive('\n') {
        let indent_len = line.len() - line.trim_start_matches(' ').len();
        out.push_str(&line[..indent_len]);

        let mut prev_space = false;
        for c in line[indent_len..].chars() {
            if c == ' ' {
                if !prev_space {
                    out.push(' ');
                }
                prev_space = true;
            } else {
                out.push(c);
                prev_space = false;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChunkingConfig {
        ChunkingConfig::default()
    }

    #[test]
    fn test_strip_artifacts() {
        let artifacts = config().strip_artifacts;
        assert_eq!(
            strip_artifacts("before [image] after [] end", &artifacts),
            "before  after  end"
        );
    }

    #[test]
    fn test_strip_artifacts_nested() {
        let artifacts = config().strip_artifacts;
        assert_eq!(strip_artifacts("[figure[]]", &artifacts), "");
        assert_eq!(strip_artifacts("[[]image]", &artifacts), "");
    }

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\nd"), "a\nb\nc\nd");
    }

    #[test]
    fn test_join_soft_wraps_merges_paragraph_lines() {
        assert_eq!(join_soft_wraps("soft\nwrapped\nline"), "soft wrapped line");
    }

    #[test]
    fn test_join_soft_wraps_keeps_paragraph_breaks() {
        assert_eq!(join_soft_wraps("para one\n\npara two"), "para one\n\npara two");
    }

    #[test]
    fn test_join_soft_wraps_keeps_bullets() {
        assert_eq!(
            join_soft_wraps("intro\n- item one\n- item two"),
            "intro\n- item one\n- item two"
        );
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_collapse_spaces_interior_only() {
        assert_eq!(collapse_spaces("a    b"), "a b");
        assert_eq!(collapse_spaces("  indented   text"), "  indented text");
        assert_eq!(collapse_spaces("line\n    code   here"), "line\n    code here");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize("", &config()), "");
    }

    #[test]
    fn test_normalize_full_pipeline() {
        let raw = "Title\r\n\r\n\r\nBody line one\nline two  with   spaces.\n\n- item one\n- item two\n\n[image]\n\nEnd.";
        let cleaned = normalize(raw, &config());
        assert!(cleaned.contains("Body line one line two with spaces."));
        assert!(cleaned.contains("\n- item one\n- item two"));
        assert!(!cleaned.contains("[image]"));
        assert!(!cleaned.contains("\n\n\n"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "",
            "plain paragraph",
            "a\r\nb\rc",
            "wrapped\nline with [image] artifacts   and   spaces",
            "intro\n- one\n- two\n\n\nnext para\nstill next",
            "[figure[]] [[]image]",
            "  leading   spaces\n   more\n\n\n\nend",
        ];
        let config = config();
        for s in samples {
            let once = normalize(s, &config);
            let twice = normalize(&once, &config);
            assert_eq!(once, twice, "normalize not idempotent for {s:?}");
        }
    }
}
