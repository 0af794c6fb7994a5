//! Heading-aware segmentation.
//!
//! Splits normalized text into (heading, body) segments by matching body
//! paragraphs against headings parsed from the table of contents. The TOC is
//! treated as a mutable candidate pool: every heading is consumed on first
//! match, so a heading that repeats verbatim in the body only anchors one
//! segment.
//!
//! Matching is exact string equality by default. A heading whose body text
//! drifts from its TOC entry (whitespace, punctuation) will not be recognized
//! and its content folds into the preceding segment, a documented heuristic
//! boundary. Stricter association is available through [`MatchStrategy`].

/// Separator between a heading and its body in formatted chunk text.
pub const SEP: &str = "[SEP]";

/// How TOC headings are matched against body paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStrategy {
    /// Exact string equality (the classic behavior).
    #[default]
    Exact,
    /// Case-insensitive comparison of trimmed text.
    Normalized,
    /// Case-insensitive comparison ignoring non-alphanumeric characters.
    Fuzzy,
}

impl MatchStrategy {
    fn matches(&self, paragraph: &str, heading: &str) -> bool {
        match self {
            MatchStrategy::Exact => paragraph == heading,
            MatchStrategy::Normalized => {
                paragraph.trim().to_lowercase() == heading.trim().to_lowercase()
            }
            MatchStrategy::Fuzzy => alphanumeric_key(paragraph) == alphanumeric_key(heading),
        }
    }
}

fn alphanumeric_key(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// A (heading, body) pair in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// The owning heading, or `None` for leading content before the first
    /// detected heading.
    pub heading: Option<String>,
    /// Paragraph text joined with single spaces. Never empty for an emitted
    /// segment.
    pub body: String,
}

impl Segment {
    /// Format as `"{heading} [SEP] {body}"`, or the bare body when headingless.
    pub fn format(&self) -> String {
        match &self.heading {
            Some(heading) => format!("{heading} {SEP} {}", self.body),
            None => self.body.clone(),
        }
    }
}

/// Parse TOC lines into candidate heading strings: strip bullet markers and
/// surrounding whitespace, drop empties.
pub fn parse_toc_headings(toc: &str) -> Vec<String> {
    toc.lines()
        .map(|line| {
            line.trim_matches(|c| matches!(c, '-' | ' ' | '\r' | '\n'))
                .trim()
        })
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Split normalized text into ordered segments using TOC headings as section
/// boundaries.
///
/// Paragraphs are walked in document order; a paragraph equal (under
/// `strategy`) to a remaining TOC candidate closes the current segment and
/// opens a new one. Content before the first matched heading becomes at most
/// one headingless segment. Segments with empty bodies are not emitted.
pub fn segment(toc: &str, text: &str, strategy: MatchStrategy) -> Vec<Segment> {
    let mut pool = parse_toc_headings(toc);

    let mut segments = Vec::new();
    let mut current_heading: Option<String> = None;
    let mut current_body: Vec<&str> = Vec::new();

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        let matched = pool
            .iter()
            .position(|heading| strategy.matches(paragraph, heading));

        if let Some(pos) = matched {
            if !current_body.is_empty() {
                segments.push(Segment {
                    heading: current_heading.take(),
                    body: current_body.join(" "),
                });
            }
            pool.remove(pos);
            current_heading = Some(paragraph.to_string());
            current_body.clear();
        } else {
            current_body.push(paragraph);
        }
    }

    if !current_body.is_empty() {
        segments.push(Segment {
            heading: current_heading,
            body: current_body.join(" "),
        });
    }

    segments
}
