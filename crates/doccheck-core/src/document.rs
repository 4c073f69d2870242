//! Document index: line table, heading index and fenced code blocks.
//!
//! A [`Document`] is built once from raw text and never mutated. All derived
//! structures (headings, the first-occurrence heading index, code fences)
//! are computed at load time.

use crate::types::Span;
use crate::utils::normalize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Deepest heading level recognized.
pub const MAX_HEADING_LEVEL: usize = 6;

/// How section titles are marked in a document.
///
/// A line is a heading when it starts with `marker` repeated 1 to
/// [`MAX_HEADING_LEVEL`] times, followed by whitespace and non-empty text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingStyle {
    /// Marker character (`#` by default).
    pub marker: char,
}

impl Default for HeadingStyle {
    fn default() -> Self {
        Self { marker: '#' }
    }
}

impl HeadingStyle {
    /// Creates a heading style with a custom marker character.
    #[must_use]
    pub fn new(marker: char) -> Self {
        Self { marker }
    }

    /// Whether `marker` can introduce headings. Fence markers and
    /// whitespace cannot: fences are detected before headings.
    #[must_use]
    pub fn is_valid_marker(marker: char) -> bool {
        !matches!(marker, '`' | '~') && !marker.is_whitespace()
    }

    /// Parses a line as a heading, returning `(level, text)`.
    #[must_use]
    pub fn parse<'a>(&self, line: &'a str) -> Option<(usize, &'a str)> {
        let body = strip_indent(line)?;
        let level = body.chars().take_while(|&c| c == self.marker).count();
        if level == 0 || level > MAX_HEADING_LEVEL {
            return None;
        }
        let rest = &body[level * self.marker.len_utf8()..];
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let text = strip_closing_markers(rest.trim(), self.marker);
        if text.is_empty() {
            None
        } else {
            Some((level, text))
        }
    }
}

/// Up to three leading spaces are allowed before a structural marker.
fn strip_indent(line: &str) -> Option<&str> {
    let body = line.trim_start_matches(' ');
    if line.len() - body.len() > 3 {
        None
    } else {
        Some(body)
    }
}

/// Removes an optional closing marker run (`## Title ##`).
fn strip_closing_markers(text: &str, marker: char) -> &str {
    let stripped = text.trim_end_matches(marker);
    if stripped.len() == text.len() {
        return text;
    }
    if stripped.is_empty() || stripped.ends_with(char::is_whitespace) {
        stripped.trim_end()
    } else {
        text
    }
}

/// One line of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Line number (1-indexed).
    pub number: usize,
    /// Raw line text without the trailing newline.
    pub text: String,
}

/// A detected section title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Line number of the heading.
    pub line: usize,
    /// Marker count (1 = top level).
    pub level: usize,
    /// Heading text as written, without markers.
    pub text: String,
    /// Trimmed, whitespace-collapsed, case-folded text.
    pub normalized: String,
}

/// A fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFence {
    /// Case-folded first word of the info string, if any.
    pub language: Option<String>,
    /// Opening fence line.
    pub start: usize,
    /// Closing fence line, or the last document line for unclosed fences.
    pub end: usize,
    /// Whether a closing fence was found.
    pub closed: bool,
}

impl CodeFence {
    /// Line range from the opening to the closing fence.
    #[must_use]
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

/// Errors building a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// The text has no content once trimmed.
    #[error("document `{name}` is empty")]
    Empty {
        /// Logical document name.
        name: String,
    },
}

/// A loaded text artifact with a line table and derived indexes.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    lines: Vec<Line>,
    headings: Vec<Heading>,
    heading_index: HashMap<String, usize>,
    fences: Vec<CodeFence>,
}

impl Document {
    /// Parses raw text into a document using the default heading style.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Empty`] if the text is blank.
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self, DocumentError> {
        Self::parse_with(name, text, HeadingStyle::default())
    }

    /// Parses raw text into a document with a custom heading style.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Empty`] if the text is blank.
    pub fn parse_with(
        name: impl Into<String>,
        text: &str,
        style: HeadingStyle,
    ) -> Result<Self, DocumentError> {
        let name = name.into();
        if text.trim().is_empty() {
            return Err(DocumentError::Empty { name });
        }

        let lines: Vec<Line> = text
            .lines()
            .enumerate()
            .map(|(i, t)| Line {
                number: i + 1,
                text: t.to_string(),
            })
            .collect();

        let (headings, fences) = scan_structure(&lines, style);

        let mut heading_index = HashMap::new();
        for (i, h) in headings.iter().enumerate() {
            heading_index.entry(h.normalized.clone()).or_insert(i);
        }

        tracing::debug!(
            "Indexed document `{}`: {} lines, {} headings, {} code fences",
            name,
            lines.len(),
            headings.len(),
            fences.len()
        );

        Ok(Self {
            name,
            lines,
            headings,
            heading_index,
            fences,
        })
    }

    /// Logical name used by rules to reference this document.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All lines in order.
    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Number of lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Text of a line by its 1-indexed number.
    #[must_use]
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(|l| l.text.as_str())
    }

    /// Lines covered by a span, clamped to the document.
    #[must_use]
    pub fn lines_in(&self, span: Span) -> &[Line] {
        let start = span.start.saturating_sub(1).min(self.lines.len());
        let end = span.end.min(self.lines.len()).max(start);
        &self.lines[start..end]
    }

    /// Span covering the whole document.
    #[must_use]
    pub fn full_span(&self) -> Span {
        Span::new(1, self.lines.len())
    }

    /// All headings in document order.
    #[must_use]
    pub fn headings(&self) -> &[Heading] {
        &self.headings
    }

    /// First heading whose normalized text equals `text` after normalization.
    #[must_use]
    pub fn heading(&self, text: &str) -> Option<&Heading> {
        self.heading_index
            .get(&normalize(text))
            .and_then(|&i| self.headings.get(i))
    }

    /// Headings whose normalized text contains `pattern`, in document order.
    ///
    /// This linear scan also reaches duplicate headings the index skips.
    pub fn find_headings<'a>(&'a self, pattern: &str) -> impl Iterator<Item = &'a Heading> + 'a {
        let needle = normalize(pattern);
        self.headings
            .iter()
            .filter(move |h| h.normalized.contains(&needle))
    }

    /// All fenced code blocks in document order.
    #[must_use]
    pub fn fences(&self) -> &[CodeFence] {
        &self.fences
    }

    /// The section body starting at `heading`.
    ///
    /// Runs until the line before the next heading of equal or higher
    /// level (or the end of the document), capped at `max_lines` lines
    /// after the heading. `None` means no cap.
    #[must_use]
    pub fn section_span(&self, heading: &Heading, max_lines: Option<usize>) -> Span {
        let section_end = self
            .headings
            .iter()
            .find(|h| h.line > heading.line && h.level <= heading.level)
            .map_or(self.lines.len(), |h| h.line - 1);
        let end = match max_lines {
            Some(n) => section_end.min(heading.line + n),
            None => section_end,
        };
        Span::new(heading.line, end)
    }
}

/// Finds headings and code fences in one pass. Heading markers inside
/// fences are code, not structure.
fn scan_structure(lines: &[Line], style: HeadingStyle) -> (Vec<Heading>, Vec<CodeFence>) {
    let mut headings = Vec::new();
    let mut fences = Vec::new();
    let mut open: Option<OpenFence> = None;

    for line in lines {
        if let Some(fence) = open.as_ref() {
            if is_closing_fence(&line.text, fence.marker, fence.len) {
                fences.push(CodeFence {
                    language: fence.language.clone(),
                    start: fence.start,
                    end: line.number,
                    closed: true,
                });
                open = None;
            }
            continue;
        }

        if let Some(fence) = parse_opening_fence(&line.text, line.number) {
            open = Some(fence);
            continue;
        }

        if let Some((level, text)) = style.parse(&line.text) {
            headings.push(Heading {
                line: line.number,
                level,
                text: text.to_string(),
                normalized: normalize(text),
            });
        }
    }

    if let Some(fence) = open {
        fences.push(CodeFence {
            language: fence.language,
            start: fence.start,
            end: lines.len(),
            closed: false,
        });
    }

    (headings, fences)
}

struct OpenFence {
    marker: char,
    len: usize,
    start: usize,
    language: Option<String>,
}

fn parse_opening_fence(line: &str, number: usize) -> Option<OpenFence> {
    let body = strip_indent(line)?;
    let marker = body.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = body.chars().take_while(|&c| c == marker).count();
    if len < 3 {
        return None;
    }
    let info = body[len..].trim();
    if marker == '`' && info.contains('`') {
        return None;
    }
    let language = info
        .split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c| c == '{' || c == '}').to_lowercase())
        .filter(|w| !w.is_empty());
    Some(OpenFence {
        marker,
        len,
        start: number,
        language,
    })
}

fn is_closing_fence(line: &str, ch: char, min_len: usize) -> bool {
    let Some(body) = strip_indent(line) else {
        return false;
    };
    let body = body.trim_end();
    let len = body.chars().take_while(|&c| c == ch).count();
    len >= min_len && len == body.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const README: &str = "\
# Project

Intro text.

## Prerequisites

- Python 3.11
- Docker

## Installation

```bash
# not a heading
pip install -e .
```

## prerequisites

Duplicate section.
";

    #[test]
    fn rejects_blank_text() {
        let err = Document::parse("README", "  \n\t\n").unwrap_err();
        assert_eq!(
            err,
            DocumentError::Empty {
                name: "README".to_string()
            }
        );
    }

    #[test]
    fn lines_are_one_indexed_and_contiguous() {
        let doc = Document::parse("README", README).unwrap();
        assert_eq!(doc.line(1), Some("# Project"));
        assert_eq!(doc.line(0), None);
        for (i, line) in doc.lines().iter().enumerate() {
            assert_eq!(line.number, i + 1);
        }
    }

    #[test]
    fn detects_headings_with_levels() {
        let doc = Document::parse("README", README).unwrap();
        let levels: Vec<(usize, &str)> = doc
            .headings()
            .iter()
            .map(|h| (h.level, h.text.as_str()))
            .collect();
        assert_eq!(
            levels,
            vec![
                (1, "Project"),
                (2, "Prerequisites"),
                (2, "Installation"),
                (2, "prerequisites"),
            ]
        );
    }

    #[test]
    fn fence_markers_are_not_heading_markers() {
        assert!(HeadingStyle::is_valid_marker('#'));
        assert!(HeadingStyle::is_valid_marker('='));
        assert!(!HeadingStyle::is_valid_marker('`'));
        assert!(!HeadingStyle::is_valid_marker('~'));
        assert!(!HeadingStyle::is_valid_marker('\t'));
    }

    #[test]
    fn heading_markers_inside_fences_are_ignored() {
        let doc = Document::parse("README", README).unwrap();
        assert!(doc.headings().iter().all(|h| h.text != "not a heading"));
    }

    #[test]
    fn index_keeps_first_duplicate_and_scan_finds_all() {
        let doc = Document::parse("README", README).unwrap();
        assert_eq!(doc.heading("  PREREQUISITES ").map(|h| h.line), Some(5));
        let lines: Vec<usize> = doc.find_headings("prereq").map(|h| h.line).collect();
        assert_eq!(lines, vec![5, 17]);
    }

    #[test]
    fn detects_code_fences() {
        let doc = Document::parse("README", README).unwrap();
        assert_eq!(doc.fences().len(), 1);
        let fence = &doc.fences()[0];
        assert_eq!(fence.language.as_deref(), Some("bash"));
        assert_eq!(fence.span(), Span::new(12, 15));
        assert!(fence.closed);
    }

    #[test]
    fn unclosed_fence_runs_to_end() {
        let doc = Document::parse("notes", "text\n~~~yaml\nkey: value\n").unwrap();
        let fence = &doc.fences()[0];
        assert_eq!(fence.span(), Span::new(2, 3));
        assert!(!fence.closed);
    }

    #[test]
    fn section_span_stops_at_next_sibling() {
        let doc = Document::parse("README", README).unwrap();
        let h = doc.heading("Prerequisites").unwrap();
        assert_eq!(doc.section_span(h, Some(20)), Span::new(5, 9));
        assert_eq!(doc.section_span(h, Some(2)), Span::new(5, 7));
    }

    #[test]
    fn top_level_section_contains_subsections() {
        let doc = Document::parse("README", README).unwrap();
        let h = doc.heading("Project").unwrap();
        assert_eq!(doc.section_span(h, None), Span::new(1, doc.line_count()));
    }

    #[test]
    fn heading_style_rules() {
        let style = HeadingStyle::default();
        assert_eq!(style.parse("### Title ###"), Some((3, "Title")));
        assert_eq!(style.parse("#Title"), None);
        assert_eq!(style.parse("####### too deep"), None);
        assert_eq!(style.parse("#   "), None);
        assert_eq!(style.parse("    # indented code"), None);
        assert_eq!(style.parse("# C#"), Some((1, "C#")));
    }

    #[test]
    fn custom_marker() {
        let doc =
            Document::parse_with("notes", "= Title\n\ntext\n== Sub\n", HeadingStyle::new('='))
                .unwrap();
        assert_eq!(doc.headings().len(), 2);
        assert_eq!(doc.headings()[1].level, 2);
    }
}
