//! Phase 1: Line Classifier
//!
//! The scanner turns source text into classified lines. It performs:
//! - Blank line filtering
//! - Indentation counting (spaces only; tabs are rejected)
//! - Sequence marker detection (the "-" prefix)
//! - Key/value splitting at the first ":"
//!
//! Trimming only ever strips U+0020. Other whitespace is content.

use crate::error::{Error, ParseContext, Result};

/// Character introducing a sequence item.
pub const MARKER: char = '-';

/// Character separating a key from its value.
pub const SEPARATOR: char = ':';

/// A single non-blank source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Raw line text, indentation included.
    pub text: String,
    /// Number of leading spaces.
    pub indent: usize,
    /// One-based line number for error reporting.
    pub line_num: usize,
}

impl Line {
    pub fn new(text: impl Into<String>, line_num: usize) -> Self {
        let text = text.into();
        let indent = indentation(&text);
        Self {
            text,
            indent,
            line_num,
        }
    }

    /// Text after the indentation.
    pub fn content(&self) -> &str {
        &self.text[self.indent..]
    }

    pub fn is_sequence_marker(&self) -> bool {
        is_sequence_marker(&self.text)
    }

    pub fn is_bare_scalar_item(&self) -> bool {
        is_bare_scalar_item(&self.text)
    }

    /// Inline content after the sequence marker, trimmed.
    pub fn marker_content(&self) -> &str {
        marker_content(&self.text)
    }

    /// Split a key/value line.
    pub fn key_value(&self) -> (&str, &str) {
        split_key_value(&self.text)
    }
}

/// Count the number of leading spaces in a line.
pub fn indentation(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b' ').count()
}

/// Whether the first non-space character is the sequence marker.
pub fn is_sequence_marker(line: &str) -> bool {
    line[indentation(line)..].starts_with(MARKER)
}

/// Whether the line is a one-line scalar item such as `- value`.
///
/// A lone `-` opens a block item and `- - x` is a nested marker, so neither
/// counts. This also rules out negative numbers as bare items: `- -5` is a
/// misplaced marker. Write them as mapping values instead (`value: -5`).
pub fn is_bare_scalar_item(line: &str) -> bool {
    if !is_sequence_marker(line) {
        return false;
    }
    let content = marker_content(line);
    !content.is_empty() && !content.starts_with(MARKER)
}

/// Content following the sequence marker, trimmed of spaces. Empty when the
/// line is not a marker line.
pub fn marker_content(line: &str) -> &str {
    match line[indentation(line)..].strip_prefix(MARKER) {
        Some(rest) => trim_spaces(rest),
        None => "",
    }
}

/// Split a line at the first separator into a trimmed key and value.
/// Without a separator the whole line is the key and the value is empty.
pub fn split_key_value(line: &str) -> (&str, &str) {
    match line.split_once(SEPARATOR) {
        Some((key, value)) => (trim_spaces(key), trim_spaces(value)),
        None => (trim_spaces(line), ""),
    }
}

/// Strip U+0020 from both ends.
pub fn trim_spaces(s: &str) -> &str {
    s.trim_matches(' ')
}

fn is_blank(line: &str) -> bool {
    line.chars().all(char::is_whitespace)
}

/// Scan source text into classified, non-blank lines.
pub fn scan(source: &str, ctx: &ParseContext<'_>) -> Result<Vec<Line>> {
    let mut lines = Vec::new();
    for (index, text) in source.lines().enumerate() {
        if let Some(line) = scan_line(text, index + 1, ctx)? {
            lines.push(line);
        }
    }
    Ok(lines)
}

/// Classify a single line, returning `None` for blank lines.
pub fn scan_line(text: &str, line_num: usize, ctx: &ParseContext<'_>) -> Result<Option<Line>> {
    if is_blank(text) {
        return Ok(None);
    }
    let leading = text.len() - text.trim_start().len();
    if text[..leading].contains('\t') {
        return Err(Error::TabIndentation(ctx.loc_suffix(line_num)));
    }
    Ok(Some(Line::new(text, line_num)))
}
