//! Concrete syntax tree.
//!
//! [`Node`] is a closed enum with one variant per node kind. Every variant
//! wraps a struct holding the kind-specific fields plus an optional source
//! range. Child sequences are [`List`]s so they can be edited in place while
//! being traversed.
//!
//! The serde representation is the plain-object form: each node becomes a
//! JSON object tagged by `"type"`, lists become arrays and unknown fields are
//! rejected.

mod convert;
mod structure;

use serde::{Deserialize, Serialize};

use crate::list::List;
use crate::tokenizer::Loc;

pub use convert::{from_plain_object, to_plain_object};
pub use structure::check_structure;

/// `!important` marker of a declaration.
///
/// Hacks such as `!ie` keep their identifier so they survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Important {
    Flag(bool),
    Hack(String),
}

impl Important {
    /// Whether any `!` marker is present.
    pub fn is_set(&self) -> bool {
        !matches!(self, Important::Flag(false))
    }
}

impl Default for Important {
    fn default() -> Self {
        Important::Flag(false)
    }
}

macro_rules! node_struct {
    ($(#[$meta:meta])* $name:ident { $($(#[$field_meta:meta])* $field:ident : $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(deny_unknown_fields)]
        pub struct $name {
            #[serde(default)]
            pub loc: Option<Loc>,
            $($(#[$field_meta])* pub $field: $ty,)*
        }
    };
}

// stylesheet level

node_struct!(
    /// Root of a parsed stylesheet.
    StyleSheet { children: List<Node> }
);

node_struct!(
    /// Qualified rule: a prelude followed by a block.
    Rule { prelude: Box<Node>, block: Box<Node> }
);

node_struct!(
    /// At-rule such as `@media` or `@import`.
    Atrule {
        name: String,
        prelude: Option<Box<Node>>,
        block: Option<Box<Node>>,
    }
);

node_struct!(AtrulePrelude { children: List<Node> });

node_struct!(
    /// `{ ... }` holding declarations, rules and at-rules.
    Block { children: List<Node> }
);

node_struct!(
    Declaration {
        important: Important,
        property: String,
        value: Box<Node>,
    }
);

node_struct!(DeclarationList { children: List<Node> });

node_struct!(
    /// Source text kept verbatim, usually produced by error recovery.
    Raw { value: String }
);

node_struct!(Cdo {});
node_struct!(Cdc {});

node_struct!(
    /// Comment body without the `/*` and `*/` delimiters.
    Comment { value: String }
);

// selectors

node_struct!(SelectorList { children: List<Node> });
node_struct!(Selector { children: List<Node> });
node_struct!(TypeSelector { name: String });
node_struct!(ClassSelector { name: String });
node_struct!(IdSelector { name: String });

node_struct!(
    AttributeSelector {
        name: Box<Node>,
        matcher: Option<String>,
        value: Option<Box<Node>>,
        flags: Option<String>,
    }
);

node_struct!(
    PseudoClassSelector {
        name: String,
        children: Option<List<Node>>,
    }
);

node_struct!(
    PseudoElementSelector {
        name: String,
        children: Option<List<Node>>,
    }
);

node_struct!(
    /// `>`, `+`, `~`, `/deep/` or a single space for the descendant combinator.
    Combinator { name: String }
);

node_struct!(
    /// Argument of the `nth-*` pseudo classes.
    Nth {
        nth: Box<Node>,
        selector: Option<Box<Node>>,
    }
);

node_struct!(
    /// `An+B` microsyntax. Missing parts are `None`.
    AnPlusB {
        a: Option<String>,
        b: Option<String>,
    }
);

// values

node_struct!(Value { children: List<Node> });

node_struct!(
    Function {
        name: String,
        children: List<Node>,
    }
);

node_struct!(Parentheses { children: List<Node> });
node_struct!(Brackets { children: List<Node> });
node_struct!(Dimension { value: String, unit: String });
node_struct!(Number { value: String });

node_struct!(
    /// Numeric part of a percentage, without the `%`.
    Percentage { value: String }
);

node_struct!(
    /// Hash value without the leading `#`.
    Hash { value: String }
);

node_struct!(
    /// Decoded string content.
    QuotedString { value: String }
);

node_struct!(
    /// Decoded url.
    Url { value: String }
);

node_struct!(Identifier { name: String });
node_struct!(Operator { value: String });
node_struct!(WhiteSpace { value: String });
node_struct!(UnicodeRange { value: String });

// media queries

node_struct!(MediaQueryList { children: List<Node> });
node_struct!(MediaQuery { children: List<Node> });

node_struct!(
    MediaFeature {
        name: String,
        value: Option<Box<Node>>,
    }
);

node_struct!(Ratio { left: String, right: String });

/// A CST node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    StyleSheet(StyleSheet),
    Rule(Rule),
    Atrule(Atrule),
    AtrulePrelude(AtrulePrelude),
    Block(Block),
    Declaration(Declaration),
    DeclarationList(DeclarationList),
    Raw(Raw),
    #[serde(rename = "CDO")]
    Cdo(Cdo),
    #[serde(rename = "CDC")]
    Cdc(Cdc),
    Comment(Comment),
    SelectorList(SelectorList),
    Selector(Selector),
    TypeSelector(TypeSelector),
    ClassSelector(ClassSelector),
    IdSelector(IdSelector),
    AttributeSelector(AttributeSelector),
    PseudoClassSelector(PseudoClassSelector),
    PseudoElementSelector(PseudoElementSelector),
    Combinator(Combinator),
    Nth(Nth),
    AnPlusB(AnPlusB),
    Value(Value),
    Function(Function),
    Parentheses(Parentheses),
    Brackets(Brackets),
    Dimension(Dimension),
    Number(Number),
    Percentage(Percentage),
    Hash(Hash),
    String(QuotedString),
    Url(Url),
    Identifier(Identifier),
    Operator(Operator),
    WhiteSpace(WhiteSpace),
    UnicodeRange(UnicodeRange),
    MediaQueryList(MediaQueryList),
    MediaQuery(MediaQuery),
    MediaFeature(MediaFeature),
    Ratio(Ratio),
}

macro_rules! for_each_variant {
    ($node:expr, $inner:ident => $body:expr) => {
        match $node {
            Node::StyleSheet($inner) => $body,
            Node::Rule($inner) => $body,
            Node::Atrule($inner) => $body,
            Node::AtrulePrelude($inner) => $body,
            Node::Block($inner) => $body,
            Node::Declaration($inner) => $body,
            Node::DeclarationList($inner) => $body,
            Node::Raw($inner) => $body,
            Node::Cdo($inner) => $body,
            Node::Cdc($inner) => $body,
            Node::Comment($inner) => $body,
            Node::SelectorList($inner) => $body,
            Node::Selector($inner) => $body,
            Node::TypeSelector($inner) => $body,
            Node::ClassSelector($inner) => $body,
            Node::IdSelector($inner) => $body,
            Node::AttributeSelector($inner) => $body,
            Node::PseudoClassSelector($inner) => $body,
            Node::PseudoElementSelector($inner) => $body,
            Node::Combinator($inner) => $body,
            Node::Nth($inner) => $body,
            Node::AnPlusB($inner) => $body,
            Node::Value($inner) => $body,
            Node::Function($inner) => $body,
            Node::Parentheses($inner) => $body,
            Node::Brackets($inner) => $body,
            Node::Dimension($inner) => $body,
            Node::Number($inner) => $body,
            Node::Percentage($inner) => $body,
            Node::Hash($inner) => $body,
            Node::String($inner) => $body,
            Node::Url($inner) => $body,
            Node::Identifier($inner) => $body,
            Node::Operator($inner) => $body,
            Node::WhiteSpace($inner) => $body,
            Node::UnicodeRange($inner) => $body,
            Node::MediaQueryList($inner) => $body,
            Node::MediaQuery($inner) => $body,
            Node::MediaFeature($inner) => $body,
            Node::Ratio($inner) => $body,
        }
    };
}

impl Node {
    /// Kind name as it appears in the `type` field of the plain form.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::StyleSheet(_) => "StyleSheet",
            Node::Rule(_) => "Rule",
            Node::Atrule(_) => "Atrule",
            Node::AtrulePrelude(_) => "AtrulePrelude",
            Node::Block(_) => "Block",
            Node::Declaration(_) => "Declaration",
            Node::DeclarationList(_) => "DeclarationList",
            Node::Raw(_) => "Raw",
            Node::Cdo(_) => "CDO",
            Node::Cdc(_) => "CDC",
            Node::Comment(_) => "Comment",
            Node::SelectorList(_) => "SelectorList",
            Node::Selector(_) => "Selector",
            Node::TypeSelector(_) => "TypeSelector",
            Node::ClassSelector(_) => "ClassSelector",
            Node::IdSelector(_) => "IdSelector",
            Node::AttributeSelector(_) => "AttributeSelector",
            Node::PseudoClassSelector(_) => "PseudoClassSelector",
            Node::PseudoElementSelector(_) => "PseudoElementSelector",
            Node::Combinator(_) => "Combinator",
            Node::Nth(_) => "Nth",
            Node::AnPlusB(_) => "AnPlusB",
            Node::Value(_) => "Value",
            Node::Function(_) => "Function",
            Node::Parentheses(_) => "Parentheses",
            Node::Brackets(_) => "Brackets",
            Node::Dimension(_) => "Dimension",
            Node::Number(_) => "Number",
            Node::Percentage(_) => "Percentage",
            Node::Hash(_) => "Hash",
            Node::String(_) => "String",
            Node::Url(_) => "Url",
            Node::Identifier(_) => "Identifier",
            Node::Operator(_) => "Operator",
            Node::WhiteSpace(_) => "WhiteSpace",
            Node::UnicodeRange(_) => "UnicodeRange",
            Node::MediaQueryList(_) => "MediaQueryList",
            Node::MediaQuery(_) => "MediaQuery",
            Node::MediaFeature(_) => "MediaFeature",
            Node::Ratio(_) => "Ratio",
        }
    }

    pub fn loc(&self) -> Option<&Loc> {
        for_each_variant!(self, inner => inner.loc.as_ref())
    }

    pub fn set_loc(&mut self, loc: Option<Loc>) {
        for_each_variant!(self, inner => inner.loc = loc)
    }

    /// The `children` list of list-bearing nodes.
    pub fn children(&self) -> Option<&List<Node>> {
        match self {
            Node::StyleSheet(node) => Some(&node.children),
            Node::AtrulePrelude(node) => Some(&node.children),
            Node::Block(node) => Some(&node.children),
            Node::DeclarationList(node) => Some(&node.children),
            Node::SelectorList(node) => Some(&node.children),
            Node::Selector(node) => Some(&node.children),
            Node::PseudoClassSelector(node) => node.children.as_ref(),
            Node::PseudoElementSelector(node) => node.children.as_ref(),
            Node::Value(node) => Some(&node.children),
            Node::Function(node) => Some(&node.children),
            Node::Parentheses(node) => Some(&node.children),
            Node::Brackets(node) => Some(&node.children),
            Node::MediaQueryList(node) => Some(&node.children),
            Node::MediaQuery(node) => Some(&node.children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut List<Node>> {
        match self {
            Node::StyleSheet(node) => Some(&mut node.children),
            Node::AtrulePrelude(node) => Some(&mut node.children),
            Node::Block(node) => Some(&mut node.children),
            Node::DeclarationList(node) => Some(&mut node.children),
            Node::SelectorList(node) => Some(&mut node.children),
            Node::Selector(node) => Some(&mut node.children),
            Node::PseudoClassSelector(node) => node.children.as_mut(),
            Node::PseudoElementSelector(node) => node.children.as_mut(),
            Node::Value(node) => Some(&mut node.children),
            Node::Function(node) => Some(&mut node.children),
            Node::Parentheses(node) => Some(&mut node.children),
            Node::Brackets(node) => Some(&mut node.children),
            Node::MediaQueryList(node) => Some(&mut node.children),
            Node::MediaQuery(node) => Some(&mut node.children),
            _ => None,
        }
    }

    /// Direct child nodes in source order, including single-node fields.
    pub fn child_nodes(&self) -> Vec<&Node> {
        match self {
            Node::Rule(node) => vec![&*node.prelude, &*node.block],
            Node::Atrule(node) => node.prelude.iter().chain(node.block.iter()).map(|n| &**n).collect(),
            Node::Declaration(node) => vec![&*node.value],
            Node::AttributeSelector(node) => {
                std::iter::once(&*node.name).chain(node.value.as_deref()).collect()
            }
            Node::Nth(node) => std::iter::once(&*node.nth).chain(node.selector.as_deref()).collect(),
            Node::MediaFeature(node) => node.value.as_deref().into_iter().collect(),
            _ => self.children().map(|list| list.iter().collect()).unwrap_or_default(),
        }
    }

    /// Remove `loc` from this node and all descendants.
    pub fn strip_locations(&mut self) {
        self.set_loc(None);

        match self {
            Node::Rule(node) => {
                node.prelude.strip_locations();
                node.block.strip_locations();
            }
            Node::Atrule(node) => {
                if let Some(prelude) = node.prelude.as_mut() {
                    prelude.strip_locations();
                }
                if let Some(block) = node.block.as_mut() {
                    block.strip_locations();
                }
            }
            Node::Declaration(node) => node.value.strip_locations(),
            Node::AttributeSelector(node) => {
                node.name.strip_locations();
                if let Some(value) = node.value.as_mut() {
                    value.strip_locations();
                }
            }
            Node::Nth(node) => {
                node.nth.strip_locations();
                if let Some(selector) = node.selector.as_mut() {
                    selector.strip_locations();
                }
            }
            Node::MediaFeature(node) => {
                if let Some(value) = node.value.as_mut() {
                    value.strip_locations();
                }
            }
            _ => {
                if let Some(children) = self.children_mut() {
                    children.for_each_mut(Node::strip_locations);
                }
            }
        }
    }

    /// Identifier name, when this is an `Identifier`.
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Node::Identifier(node) => Some(&node.name),
            _ => None,
        }
    }

    /// Whether the node is whitespace or a comment.
    pub fn is_white_space_or_comment(&self) -> bool {
        matches!(self, Node::WhiteSpace(_) | Node::Comment(_))
    }

    pub fn identifier(name: impl Into<String>) -> Node {
        Node::Identifier(Identifier {
            loc: None,
            name: name.into(),
        })
    }

    pub fn number(value: impl Into<String>) -> Node {
        Node::Number(Number {
            loc: None,
            value: value.into(),
        })
    }

    pub fn operator(value: impl Into<String>) -> Node {
        Node::Operator(Operator {
            loc: None,
            value: value.into(),
        })
    }

    pub fn white_space() -> Node {
        Node::WhiteSpace(WhiteSpace {
            loc: None,
            value: " ".to_string(),
        })
    }

    pub fn raw(value: impl Into<String>) -> Node {
        Node::Raw(Raw {
            loc: None,
            value: value.into(),
        })
    }

    pub fn value(children: List<Node>) -> Node {
        Node::Value(Value { loc: None, children })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_serde_tags() {
        let nodes = vec![
            Node::identifier("a"),
            Node::Cdo(Cdo { loc: None }),
            Node::String(QuotedString {
                loc: None,
                value: "x".into(),
            }),
        ];

        for node in nodes {
            let plain = serde_json::to_value(&node).unwrap();
            assert_eq!(plain["type"], node.kind());
        }
    }

    #[test]
    fn children_accessors() {
        let mut node = Node::value(List::from_vec(vec![Node::identifier("a")]));

        assert_eq!(node.children().map(List::len), Some(1));
        node.children_mut().unwrap().push(Node::white_space());
        assert_eq!(node.child_nodes().len(), 2);
        assert!(Node::identifier("a").children().is_none());
    }

    #[test]
    fn important_serializes_as_bool_or_string() {
        assert_eq!(serde_json::to_string(&Important::Flag(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&Important::Hack("ie".into())).unwrap(), "\"ie\"");
        assert!(!Important::default().is_set());
        assert!(Important::Hack("ie".into()).is_set());
    }

    #[test]
    fn strip_locations_clears_nested_loc() {
        use crate::tokenizer::Position;

        let position = Position { offset: 0, line: 1, column: 1 };
        let loc = Some(Loc {
            source: "<unknown>".into(),
            start: position,
            end: position,
        });
        let mut child = Node::identifier("a");
        child.set_loc(loc.clone());
        let mut node = Node::value(List::from_vec(vec![child]));
        node.set_loc(loc);

        node.strip_locations();

        assert!(node.loc().is_none());
        assert!(node.child_nodes()[0].loc().is_none());
    }
}
