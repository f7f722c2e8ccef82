//! Logging and debugging facilities.
//!
//! The crate is instrumented with `tracing`. Nothing is printed unless the
//! application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("lattice_csstree::parser=debug")
//!     .init();
//! ```
//!
//! [`CstTreeDebug`] renders a parsed tree as an indented outline, which is
//! handy when a generated stylesheet does not look like the input.

use std::fmt::{self, Write as FmtWrite};

use crate::ast::Node;

/// Target names for log filtering.
pub mod targets {
    /// Token stream construction.
    pub const TOKENIZER: &str = "lattice_csstree::tokenizer";
    /// Parsing and error recovery.
    pub const PARSER: &str = "lattice_csstree::parser";
    /// Text generation and source maps.
    pub const GENERATOR: &str = "lattice_csstree::generator";
    /// Grammar dictionary and value matching.
    pub const LEXER: &str = "lattice_csstree::lexer";
    /// Timing spans.
    pub const PERF: &str = "lattice_csstree::perf";
}

/// Branch drawing style for [`CstTreeDebug`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    Ascii,
    #[default]
    Unicode,
    /// Dashes only, no vertical guides.
    Compact,
}

/// Configuration for tree dumps.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    pub style: TreeStyle,
    /// Append `@line:column` of nodes carrying a location.
    pub show_locations: bool,
    /// Append names and values of leaf nodes.
    pub show_values: bool,
    /// Maximum depth to descend into (None for unlimited).
    pub max_depth: Option<usize>,
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_locations: false,
            show_values: true,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    pub fn detailed() -> Self {
        Self {
            show_locations: true,
            ..Default::default()
        }
    }

    /// Node kinds only.
    pub fn minimal() -> Self {
        Self {
            show_values: false,
            ..Default::default()
        }
    }
}

/// Outline renderer for CST nodes.
#[derive(Debug, Clone, Default)]
pub struct CstTreeDebug {
    options: TreeFormatOptions,
}

impl CstTreeDebug {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Render `root` and its descendants.
    pub fn format(&self, root: &Node) -> String {
        let mut output = String::new();
        self.format_into(root, 0, true, &mut output);
        output
    }

    fn format_into(&self, node: &Node, depth: usize, is_last: bool, output: &mut String) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        output.push_str(&self.build_prefix(depth, is_last));
        output.push_str(node.kind());

        if self.options.show_values {
            if let Some(label) = leaf_label(node) {
                write!(output, " {label:?}").expect("write to String");
            }
        }

        if self.options.show_locations {
            if let Some(loc) = node.loc() {
                write!(output, " @{}:{}", loc.start.line, loc.start.column).expect("write to String");
            }
        }

        output.push('\n');

        let children = node.child_nodes();
        let count = children.len();
        for (index, child) in children.into_iter().enumerate() {
            self.format_into(child, depth + 1, index + 1 == count, output);
        }
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (guide, tee, elbow) = match self.options.style {
            TreeStyle::Ascii => ("|", "+-- ", "`-- "),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500} ", "\u{2514}\u{2500}\u{2500} "),
            TreeStyle::Compact => ("", "- ", "- "),
        };

        let mut prefix = String::new();
        for _ in 1..depth {
            prefix.push_str(guide);
            prefix.extend(std::iter::repeat_n(' ', self.options.indent_size));
        }
        prefix.push_str(if is_last { elbow } else { tee });
        prefix
    }
}

fn leaf_label(node: &Node) -> Option<String> {
    let label = match node {
        Node::Atrule(inner) => inner.name.clone(),
        Node::Declaration(inner) => inner.property.clone(),
        Node::Raw(inner) => inner.value.clone(),
        Node::Comment(inner) => inner.value.clone(),
        Node::TypeSelector(inner) => inner.name.clone(),
        Node::ClassSelector(inner) => inner.name.clone(),
        Node::IdSelector(inner) => inner.name.clone(),
        Node::PseudoClassSelector(inner) => inner.name.clone(),
        Node::PseudoElementSelector(inner) => inner.name.clone(),
        Node::Combinator(inner) => inner.name.clone(),
        Node::Function(inner) => inner.name.clone(),
        Node::Dimension(inner) => format!("{}{}", inner.value, inner.unit),
        Node::Number(inner) => inner.value.clone(),
        Node::Percentage(inner) => format!("{}%", inner.value),
        Node::Hash(inner) => inner.value.clone(),
        Node::String(inner) => inner.value.clone(),
        Node::Url(inner) => inner.value.clone(),
        Node::Identifier(inner) => inner.name.clone(),
        Node::Operator(inner) => inner.value.clone(),
        Node::UnicodeRange(inner) => inner.value.clone(),
        Node::MediaFeature(inner) => inner.name.clone(),
        Node::Ratio(inner) => format!("{}/{}", inner.left, inner.right),
        _ => return None,
    };

    Some(label)
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&CstTreeDebug::new().format(self))
    }
}

/// A guard that keeps a timing span entered until dropped.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "lattice_csstree::perf", "perf", operation = name);
        Self { _span: span.entered() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::List;

    fn sample() -> Node {
        Node::value(List::from_vec(vec![
            Node::identifier("a"),
            Node::white_space(),
            Node::number("1"),
        ]))
    }

    #[test]
    fn formats_unicode_outline() {
        let output = CstTreeDebug::new().format(&sample());

        assert_eq!(
            output,
            "Value\n\u{251c}\u{2500}\u{2500} Identifier \"a\"\n\u{251c}\u{2500}\u{2500} WhiteSpace\n\u{2514}\u{2500}\u{2500} Number \"1\"\n"
        );
    }

    #[test]
    fn minimal_ascii_outline() {
        let options = TreeFormatOptions {
            style: TreeStyle::Ascii,
            ..TreeFormatOptions::minimal()
        };

        let output = CstTreeDebug::with_options(options).format(&sample());

        assert_eq!(output, "Value\n+-- Identifier\n+-- WhiteSpace\n`-- Number\n");
    }

    #[test]
    fn max_depth_cuts_descendants() {
        let options = TreeFormatOptions {
            max_depth: Some(0),
            ..Default::default()
        };

        assert_eq!(CstTreeDebug::with_options(options).format(&sample()), "Value\n");
    }

    #[test]
    fn perf_span_can_be_created_without_subscriber() {
        let _guard = PerfSpan::new("test");
    }
}
