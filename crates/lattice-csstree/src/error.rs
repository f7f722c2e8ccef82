//! Error types for parsing, grammar handling and matching.

use std::fmt;
use std::path::PathBuf;

use crate::tokenizer::{Loc, Position};

/// Result type alias for fallible crate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the crate's fallible entry points.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// CSS parse error.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Malformed value definition syntax.
    #[error(transparent)]
    Syntax(#[from] SyntaxParseError),

    /// A value does not satisfy a grammar.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// A grammar refers to an unknown type or property.
    #[error(transparent)]
    Reference(#[from] SyntaxReferenceError),

    /// A tree failed structural validation.
    #[error("Invalid tree structure: {}", format_structure_errors(.0))]
    Structure(Vec<StructureError>),

    /// File I/O error.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_structure_errors(errors: &[StructureError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

impl Error {
    /// Create a parse error.
    pub fn parse(
        message: impl Into<String>,
        css: impl Into<String>,
        offset: usize,
        line: usize,
        column: usize,
    ) -> Self {
        Self::Parse(ParseError::new(message, css, offset, line, column))
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

const MAX_LINE_LENGTH: usize = 100;
const OFFSET_CORRECTION: usize = 60;
const TAB_REPLACEMENT: &str = "    ";

/// A CSS syntax error with its position in the parsed text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    /// The parsed text.
    pub css: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(
        message: impl Into<String>,
        css: impl Into<String>,
        offset: usize,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            message: message.into(),
            css: css.into(),
            offset,
            line,
            column,
        }
    }

    /// The error line with `extra_lines` of context around it and a caret
    /// under the error column.
    pub fn source_fragment(&self, extra_lines: usize) -> String {
        source_fragment(&self.css, self.line, self.column, extra_lines)
    }

    /// `Parse error: <message>` followed by a two-line context fragment.
    pub fn formatted_message(&self) -> String {
        format!("Parse error: {}\n{}", self.message, self.source_fragment(2))
    }
}

fn split_lines(source: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = source.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            '\n' | '\u{c}' => lines.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }

    lines.push(current);
    lines
}

fn source_fragment(source: &str, line: usize, column: usize, extra_lines: usize) -> String {
    let mut lines = split_lines(source);
    let line = line.clamp(1, lines.len());
    let start_line = line.saturating_sub(extra_lines).max(1) - 1;
    let end_line = (line + extra_lines).min(lines.len() + 1);
    let max_num_length = end_line.to_string().len().max(4) + 1;
    let mut column = column.max(1);
    let mut cut_left = 0;

    // tabs before the column widen it
    let tabs = lines[line - 1]
        .chars()
        .take(column - 1)
        .filter(|&ch| ch == '\t')
        .count();
    column += (TAB_REPLACEMENT.len() - 1) * tabs;

    if column > MAX_LINE_LENGTH {
        cut_left = column - OFFSET_CORRECTION + 3;
        column = OFFSET_CORRECTION - 2;
    }

    let count = end_line.min(lines.len()) + 1;
    for text in lines.iter_mut().take(count).skip(start_line) {
        let expanded: Vec<char> = text.replace('\t', TAB_REPLACEMENT).chars().collect();
        let mut clipped = String::new();

        if cut_left > 0 && expanded.len() > cut_left {
            clipped.push('\u{2026}');
        }
        clipped.extend(expanded.iter().skip(cut_left).take(MAX_LINE_LENGTH - 2));
        if expanded.len() > cut_left + MAX_LINE_LENGTH - 1 {
            clipped.push('\u{2026}');
        }

        *text = clipped;
    }

    let process_lines = |start: usize, end: usize| -> String {
        let end = end.min(lines.len());
        (start..end)
            .map(|index| format!("{:>width$} |{}", index + 1, lines[index], width = max_num_length))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let caret = format!("{}^", "-".repeat(column + max_num_length + 1));

    [process_lines(start_line, line), caret, process_lines(line, end_line)]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Malformed value definition syntax.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SyntaxParseError {
    pub raw_message: String,
    /// The grammar text being parsed.
    pub input: String,
    pub offset: usize,
    /// Raw message followed by the input and a caret line.
    pub message: String,
}

impl SyntaxParseError {
    pub fn new(raw_message: impl Into<String>, input: impl Into<String>, offset: usize) -> Self {
        let raw_message = raw_message.into();
        let input = input.into();
        let caret_offset = if offset == 0 { input.chars().count() } else { offset };
        let message = format!("{raw_message}\n  {input}\n--{}^", "-".repeat(caret_offset));

        Self {
            raw_message,
            input,
            offset,
            message,
        }
    }
}

/// A grammar refers to a name the lexer does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} `{reference}`")]
pub struct SyntaxReferenceError {
    /// Description, for example `Unknown type reference`.
    pub kind: String,
    pub reference: String,
}

impl SyntaxReferenceError {
    pub fn new(kind: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            reference: reference.into(),
        }
    }

    pub fn unknown_type(name: &str) -> Self {
        Self::new("Unknown type reference", format!("<{name}>"))
    }

    pub fn unknown_property(name: &str) -> Self {
        Self::new("Unknown property reference", format!("<'{name}'>"))
    }
}

/// Why a match failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchErrorKind {
    /// The value does not satisfy the grammar.
    Mismatch,
    /// The grammar or the requested name could not be resolved.
    Reference,
}

/// A failed grammar match with the mismatch located in the value text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct MatchError {
    pub kind: MatchErrorKind,
    pub raw_message: String,
    pub message: String,
    /// Canonical text of the grammar being matched.
    pub syntax: String,
    /// Text of the value being matched.
    pub css: String,
    pub mismatch_offset: usize,
    pub mismatch_length: usize,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    pub loc: Option<Loc>,
}

impl MatchError {
    /// Build a mismatch error. `start` is the position of the mismatching
    /// fragment; `end` is where it stops.
    #[allow(clippy::too_many_arguments)]
    pub fn mismatch(
        raw_message: impl Into<String>,
        syntax: impl Into<String>,
        css: impl Into<String>,
        mismatch_offset: usize,
        mismatch_length: usize,
        source: &str,
        start: Position,
        end: Position,
    ) -> Self {
        let raw_message = raw_message.into();
        let syntax = syntax.into();
        let css = css.into();
        let shown = if css.is_empty() { "<empty string>" } else { css.as_str() };
        let caret_offset = css
            .get(..mismatch_offset)
            .map_or(mismatch_offset, |prefix| prefix.chars().count());
        let message = format!(
            "{raw_message}\n  syntax: {syntax}\n   value: {shown}\n  --------{}^",
            "-".repeat(caret_offset)
        );

        Self {
            kind: MatchErrorKind::Mismatch,
            raw_message,
            message,
            syntax,
            css,
            mismatch_offset,
            mismatch_length,
            offset: start.offset,
            line: start.line,
            column: start.column,
            loc: Some(Loc {
                source: source.to_string(),
                start,
                end,
            }),
        }
    }
}

impl From<SyntaxReferenceError> for MatchError {
    fn from(error: SyntaxReferenceError) -> Self {
        let message = error.to_string();

        Self {
            kind: MatchErrorKind::Reference,
            raw_message: message.clone(),
            message,
            syntax: String::new(),
            css: String::new(),
            mismatch_offset: 0,
            mismatch_length: 0,
            offset: 0,
            line: 1,
            column: 1,
            loc: None,
        }
    }
}

impl From<SyntaxParseError> for MatchError {
    fn from(error: SyntaxParseError) -> Self {
        Self {
            kind: MatchErrorKind::Reference,
            raw_message: error.raw_message,
            message: error.message,
            syntax: error.input,
            css: String::new(),
            mismatch_offset: 0,
            mismatch_length: 0,
            offset: error.offset,
            line: 1,
            column: error.offset + 1,
            loc: None,
        }
    }
}

/// One violation found by [`crate::ast::check_structure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureError {
    /// Kind of the offending node.
    pub node_kind: String,
    /// Field name, or an empty string for node-level problems.
    pub field: String,
    pub message: String,
}

impl StructureError {
    pub fn new(node_kind: impl Into<String>, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            node_kind: node_kind.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}: {}", self.node_kind, self.message)
        } else {
            write!(f, "{}.{}: {}", self.node_kind, self.field, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_points_at_column() {
        let error = ParseError::new("Colon is expected", "a{color red}", 8, 1, 9);

        assert_eq!(
            error.source_fragment(0),
            format!("    1 |a{{color red}}\n{}^", "-".repeat(15))
        );
    }

    #[test]
    fn fragment_includes_context_lines() {
        let css = "a {\n  color red;\n}\n";
        let error = ParseError::new("Colon is expected", css, 12, 2, 9);
        let fragment = error.source_fragment(1);
        let lines: Vec<&str> = fragment.lines().collect();

        assert_eq!(lines[0], "    1 |a {");
        assert_eq!(lines[1], "    2 |  color red;");
        assert_eq!(lines[2], format!("{}^", "-".repeat(15)));
        assert_eq!(lines[3], "    3 |}");
    }

    #[test]
    fn formatted_message_has_header() {
        let error = ParseError::new("Unexpected input", ".", 0, 1, 1);
        let message = error.formatted_message();

        assert!(message.starts_with("Parse error: Unexpected input\n"));
        assert!(message.contains("    1 |."));
        assert!(message.ends_with(&format!("{}^", "-".repeat(7))));
    }

    #[test]
    fn fragment_expands_tabs() {
        let error = ParseError::new("x", "\tab", 2, 1, 3);
        let fragment = error.source_fragment(0);

        assert!(fragment.starts_with("    1 |    ab"));
        // column 3 plus three extra characters for the tab
        assert!(fragment.ends_with(&format!("{}^", "-".repeat(6 + 5 + 1))));
    }

    #[test]
    fn fragment_clips_long_lines() {
        let css = format!("{}x{}", "a".repeat(150), "b".repeat(150));
        let error = ParseError::new("x", css, 150, 1, 151);
        let fragment = error.source_fragment(0);
        let first = fragment.lines().next().unwrap();

        assert!(first.contains('\u{2026}'));
        assert!(first.ends_with('\u{2026}'));
        assert!(fragment.ends_with(&format!("{}^", "-".repeat(58 + 6))));
    }

    #[test]
    fn syntax_parse_error_message() {
        let error = SyntaxParseError::new("Expected a quote", "a 'b", 4);
        assert_eq!(error.message, "Expected a quote\n  a 'b\n------^");
    }

    #[test]
    fn match_error_message() {
        let start = Position { offset: 0, line: 1, column: 1 };
        let end = Position { offset: 3, line: 1, column: 4 };
        let error = MatchError::mismatch("Mismatch", "<color>", "123", 0, 3, "<unknown>", start, end);

        assert_eq!(
            error.message,
            "Mismatch\n  syntax: <color>\n   value: 123\n  --------^"
        );
        assert_eq!(error.line, 1);
        assert_eq!(error.column, 1);
    }

    #[test]
    fn reference_error_message() {
        let error = SyntaxReferenceError::unknown_type("foo");
        assert_eq!(error.to_string(), "Unknown type reference `<foo>`");

        let error: MatchError = SyntaxReferenceError::new("Unknown property", "bar").into();
        assert_eq!(error.kind, MatchErrorKind::Reference);
        assert_eq!(error.message, "Unknown property `bar`");
    }

    #[test]
    fn io_error_mentions_path() {
        let error = Error::io("missing.json", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(error.to_string().contains("missing.json"));
    }
}
