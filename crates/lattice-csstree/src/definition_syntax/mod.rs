//! Value definition syntax.
//!
//! CSS specifications describe property values with a small grammar
//! language such as `<length> | auto` or `[ <bg-layer> , ]* <final-bg-layer>`.
//! [`parse`] turns such a string into a [`SyntaxNode`] tree, [`generate`]
//! prints a tree back in canonical form and [`walk`] visits every node.
//!
//! # Example
//!
//! ```
//! use lattice_csstree::definition_syntax::{generate, parse, GenerateSyntaxOptions};
//!
//! let ast = parse("<number>{0,} && [ a | b ]").unwrap();
//! assert_eq!(generate(&ast, &GenerateSyntaxOptions::default()), "<number>* && [ a | b ]");
//! ```

mod generate;
mod parse;

use serde::Serialize;

pub use generate::{generate, GenerateSyntaxOptions};
pub use parse::parse;

/// How the terms of a group combine, from tightest to loosest binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Combinator {
    /// `a b`: all terms, in order.
    #[serde(rename = " ")]
    Juxtapose,
    /// `a && b`: all terms, any order.
    #[serde(rename = "&&")]
    DoubleAmpersand,
    /// `a || b`: one or more terms, any order.
    #[serde(rename = "||")]
    DoubleVerticalLine,
    /// `a | b`: exactly one term.
    #[serde(rename = "|")]
    VerticalLine,
}

impl Combinator {
    pub fn as_str(self) -> &'static str {
        match self {
            Combinator::Juxtapose => " ",
            Combinator::DoubleAmpersand => "&&",
            Combinator::DoubleVerticalLine => "||",
            Combinator::VerticalLine => "|",
        }
    }
}

/// Numeric bounds of a type such as `<number [0,∞]>`. `None` is infinite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// A node of a parsed value definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SyntaxNode {
    /// Terms joined by one combinator. `explicit` groups were written in
    /// brackets; `disallow_empty` groups carry the `!` flag.
    Group {
        combinator: Combinator,
        terms: Vec<SyntaxNode>,
        explicit: bool,
        #[serde(rename = "disallowEmpty")]
        disallow_empty: bool,
    },
    /// A repeated term. `max` is `None` when unbounded; `comma` repetitions
    /// are separated by commas.
    Multiplier {
        min: u32,
        max: Option<u32>,
        comma: bool,
        term: Box<SyntaxNode>,
    },
    /// `<name>`, with an optional numeric range.
    Type { name: String, range: Option<Range> },
    /// `<'name'>`, a reference to a property grammar.
    Property { name: String },
    Keyword { name: String },
    AtKeyword { name: String },
    /// `name( ... )`; `children` is the group inside the parentheses.
    Function { name: String, children: Box<SyntaxNode> },
    Parentheses { children: Box<SyntaxNode> },
    /// Any other single character, such as `/` or `%`.
    Token { value: String },
    Comma,
    /// Quoted string, quotes included.
    String { value: String },
}

impl SyntaxNode {
    pub fn kind(&self) -> &'static str {
        match self {
            SyntaxNode::Group { .. } => "Group",
            SyntaxNode::Multiplier { .. } => "Multiplier",
            SyntaxNode::Type { .. } => "Type",
            SyntaxNode::Property { .. } => "Property",
            SyntaxNode::Keyword { .. } => "Keyword",
            SyntaxNode::AtKeyword { .. } => "AtKeyword",
            SyntaxNode::Function { .. } => "Function",
            SyntaxNode::Parentheses { .. } => "Parentheses",
            SyntaxNode::Token { .. } => "Token",
            SyntaxNode::Comma => "Comma",
            SyntaxNode::String { .. } => "String",
        }
    }

    /// A non-explicit group holding `terms`.
    pub fn group(combinator: Combinator, terms: Vec<SyntaxNode>) -> SyntaxNode {
        SyntaxNode::Group {
            combinator,
            terms,
            explicit: false,
            disallow_empty: false,
        }
    }

    pub fn keyword(name: impl Into<String>) -> SyntaxNode {
        SyntaxNode::Keyword { name: name.into() }
    }

    pub fn type_ref(name: impl Into<String>) -> SyntaxNode {
        SyntaxNode::Type {
            name: name.into(),
            range: None,
        }
    }
}

/// Visit `node` and its descendants depth first, calling `enter` before and
/// `leave` after the children of each node.
pub fn walk<E, L>(node: &SyntaxNode, mut enter: E, mut leave: L)
where
    E: FnMut(&SyntaxNode),
    L: FnMut(&SyntaxNode),
{
    walk_node(node, &mut enter, &mut leave);
}

fn walk_node(node: &SyntaxNode, enter: &mut dyn FnMut(&SyntaxNode), leave: &mut dyn FnMut(&SyntaxNode)) {
    enter(node);

    match node {
        SyntaxNode::Group { terms, .. } => {
            for term in terms {
                walk_node(term, enter, leave);
            }
        }
        SyntaxNode::Multiplier { term, .. } => walk_node(term, enter, leave),
        SyntaxNode::Function { children, .. } | SyntaxNode::Parentheses { children } => {
            walk_node(children, enter, leave);
        }
        SyntaxNode::Type { .. }
        | SyntaxNode::Property { .. }
        | SyntaxNode::Keyword { .. }
        | SyntaxNode::AtKeyword { .. }
        | SyntaxNode::Token { .. }
        | SyntaxNode::Comma
        | SyntaxNode::String { .. } => {}
    }

    leave(node);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_visits_in_order() {
        let ast = parse("a [ <b> | fn( <'c'> ) ]#").unwrap();
        let mut entered = Vec::new();
        let mut left = Vec::new();

        walk(&ast, |node| entered.push(node.kind()), |node| left.push(node.kind()));

        assert_eq!(
            entered,
            ["Group", "Keyword", "Multiplier", "Group", "Type", "Function", "Group", "Property"]
        );
        assert_eq!(left.first(), Some(&"Keyword"));
        assert_eq!(left.last(), Some(&"Group"));
        assert_eq!(left.len(), entered.len());
    }

    #[test]
    fn range_bounds() {
        let range = Range {
            min: Some(0.0),
            max: None,
        };

        assert!(range.contains(0.0));
        assert!(range.contains(1e9));
        assert!(!range.contains(-0.5));
    }

    #[test]
    fn serializes_with_type_tags() {
        let ast = parse("a | <b>?").unwrap();
        let json = serde_json::to_value(&ast).unwrap();

        assert_eq!(json["type"], "Group");
        assert_eq!(json["combinator"], "|");
        assert_eq!(json["terms"][1]["type"], "Multiplier");
        assert_eq!(json["terms"][1]["term"]["name"], "b");
    }
}
