//! Structural validation of a CST.

use crate::error::StructureError;
use crate::list::List;
use crate::tokenizer::Loc;

use super::Node;

const SELECTOR_PARTS: &[&str] = &[
    "TypeSelector",
    "IdSelector",
    "ClassSelector",
    "AttributeSelector",
    "PseudoClassSelector",
    "PseudoElementSelector",
    "Combinator",
    "Percentage",
    "WhiteSpace",
];

const BLOCK_ITEMS: &[&str] = &["Atrule", "Rule", "Declaration"];

/// Validate `root` and all its descendants, collecting every violation.
///
/// Kinds allowed in each field and list, non-empty names and well-formed
/// `loc` ranges are checked. Raw nodes are accepted in every list since
/// error recovery may put them anywhere.
pub fn check_structure(root: &Node) -> Vec<StructureError> {
    let mut checker = Checker { errors: Vec::new() };
    checker.node(root);
    checker.errors
}

struct Checker {
    errors: Vec<StructureError>,
}

impl Checker {
    fn report(&mut self, node: &Node, field: &str, message: impl Into<String>) {
        self.errors.push(StructureError::new(node.kind(), field, message));
    }

    fn loc(&mut self, node: &Node, loc: &Loc) {
        for (name, position) in [("start", &loc.start), ("end", &loc.end)] {
            if position.line == 0 || position.column == 0 {
                self.report(node, "loc", format!("{name} line and column must be at least 1"));
            }
        }

        if loc.start.offset > loc.end.offset {
            self.report(node, "loc", "start offset is after end offset");
        }
    }

    fn name(&mut self, node: &Node, field: &str, value: &str) {
        if value.is_empty() {
            self.report(node, field, "must not be empty");
        }
    }

    fn child(&mut self, owner: &Node, field: &str, child: &Node, allowed: &[&str]) {
        if !allowed.contains(&child.kind()) {
            self.report(
                owner,
                field,
                format!("expected {} but got {}", allowed.join(" or "), child.kind()),
            );
        }

        self.node(child);
    }

    fn optional(&mut self, owner: &Node, field: &str, child: Option<&Node>, allowed: &[&str]) {
        if let Some(child) = child {
            self.child(owner, field, child, allowed);
        }
    }

    fn list(&mut self, owner: &Node, list: &List<Node>, allowed: Option<&[&str]>) {
        for child in list {
            if let Some(allowed) = allowed {
                if child.kind() != "Raw" && !allowed.contains(&child.kind()) {
                    self.report(
                        owner,
                        "children",
                        format!("{} is not allowed in this list", child.kind()),
                    );
                }
            }

            self.node(child);
        }
    }

    fn node(&mut self, node: &Node) {
        if let Some(loc) = node.loc() {
            self.loc(node, loc);
        }

        match node {
            Node::StyleSheet(inner) => self.list(
                node,
                &inner.children,
                Some(&["Comment", "CDO", "CDC", "Atrule", "Rule"]),
            ),
            Node::Rule(inner) => {
                self.child(node, "prelude", &inner.prelude, &["SelectorList", "Raw"]);
                self.child(node, "block", &inner.block, &["Block"]);
            }
            Node::Atrule(inner) => {
                self.name(node, "name", &inner.name);
                self.optional(node, "prelude", inner.prelude.as_deref(), &["AtrulePrelude", "Raw"]);
                self.optional(node, "block", inner.block.as_deref(), &["Block"]);
            }
            Node::Block(inner) => self.list(node, &inner.children, Some(BLOCK_ITEMS)),
            Node::DeclarationList(inner) => self.list(node, &inner.children, Some(BLOCK_ITEMS)),
            Node::Declaration(inner) => {
                self.name(node, "property", &inner.property);
                self.child(node, "value", &inner.value, &["Value", "Raw"]);
            }
            Node::SelectorList(inner) => self.list(node, &inner.children, Some(&["Selector"])),
            Node::Selector(inner) => self.list(node, &inner.children, Some(SELECTOR_PARTS)),
            Node::TypeSelector(inner) => self.name(node, "name", &inner.name),
            Node::ClassSelector(inner) => self.name(node, "name", &inner.name),
            Node::IdSelector(inner) => self.name(node, "name", &inner.name),
            Node::AttributeSelector(inner) => {
                self.child(node, "name", &inner.name, &["Identifier"]);
                self.optional(node, "value", inner.value.as_deref(), &["String", "Identifier"]);

                if inner.matcher.is_none() && inner.value.is_some() {
                    self.report(node, "value", "value requires a matcher");
                }
            }
            Node::PseudoClassSelector(inner) => {
                self.name(node, "name", &inner.name);
                if let Some(children) = &inner.children {
                    self.list(node, children, None);
                }
            }
            Node::PseudoElementSelector(inner) => {
                self.name(node, "name", &inner.name);
                if let Some(children) = &inner.children {
                    self.list(node, children, None);
                }
            }
            Node::Combinator(inner) => self.name(node, "name", &inner.name),
            Node::Nth(inner) => {
                self.child(node, "nth", &inner.nth, &["AnPlusB", "Identifier"]);
                self.optional(node, "selector", inner.selector.as_deref(), &["SelectorList"]);
            }
            Node::AnPlusB(inner) => {
                if inner.a.is_none() && inner.b.is_none() {
                    self.report(node, "", "either a or b must be set");
                }
            }
            Node::Function(inner) => {
                self.name(node, "name", &inner.name);
                self.list(node, &inner.children, None);
            }
            Node::Dimension(inner) => {
                self.name(node, "value", &inner.value);
                self.name(node, "unit", &inner.unit);
            }
            Node::Number(inner) => self.name(node, "value", &inner.value),
            Node::Percentage(inner) => self.name(node, "value", &inner.value),
            Node::Hash(inner) => self.name(node, "value", &inner.value),
            Node::Identifier(inner) => self.name(node, "name", &inner.name),
            Node::Operator(inner) => self.name(node, "value", &inner.value),
            Node::UnicodeRange(inner) => self.name(node, "value", &inner.value),
            Node::MediaQueryList(inner) => self.list(node, &inner.children, Some(&["MediaQuery"])),
            Node::MediaQuery(inner) => self.list(
                node,
                &inner.children,
                Some(&["Identifier", "MediaFeature", "WhiteSpace"]),
            ),
            Node::MediaFeature(inner) => {
                self.name(node, "name", &inner.name);
                self.optional(
                    node,
                    "value",
                    inner.value.as_deref(),
                    &["Identifier", "Number", "Dimension", "Ratio"],
                );
            }
            Node::Ratio(inner) => {
                self.name(node, "left", &inner.left);
                self.name(node, "right", &inner.right);
            }
            Node::AtrulePrelude(_)
            | Node::Value(_)
            | Node::Parentheses(_)
            | Node::Brackets(_) => {
                if let Some(children) = node.children() {
                    self.list(node, children, None);
                }
            }
            Node::Raw(_)
            | Node::Cdo(_)
            | Node::Cdc(_)
            | Node::Comment(_)
            | Node::String(_)
            | Node::Url(_)
            | Node::WhiteSpace(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Declaration, Important, Rule};
    use crate::tokenizer::Position;

    fn declaration(property: &str, value: Node) -> Node {
        Node::Declaration(Declaration {
            loc: None,
            important: Important::default(),
            property: property.to_string(),
            value: Box::new(value),
        })
    }

    #[test]
    fn valid_tree_has_no_errors() {
        let value = Node::value(List::from_vec(vec![Node::identifier("red")]));
        let block = Node::Block(Block {
            loc: None,
            children: List::from_vec(vec![declaration("color", value)]),
        });

        assert!(check_structure(&block).is_empty());
    }

    #[test]
    fn reports_wrong_child_kind_and_empty_name() {
        let rule = Node::Rule(Rule {
            loc: None,
            prelude: Box::new(Node::identifier("a")),
            block: Box::new(Node::Block(Block {
                loc: None,
                children: List::from_vec(vec![declaration("", Node::raw("x"))]),
            })),
        });

        let errors = check_structure(&rule);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].node_kind, "Rule");
        assert_eq!(errors[0].field, "prelude");
        assert_eq!(errors[1].node_kind, "Declaration");
        assert_eq!(errors[1].field, "property");
    }

    #[test]
    fn reports_disallowed_list_items() {
        let block = Node::Block(Block {
            loc: None,
            children: List::from_vec(vec![Node::identifier("a"), Node::raw("b")]),
        });

        let errors = check_structure(&block);

        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Identifier"));
    }

    #[test]
    fn reports_malformed_loc() {
        let mut node = Node::identifier("a");
        node.set_loc(Some(Loc {
            source: "<unknown>".into(),
            start: Position { offset: 5, line: 1, column: 6 },
            end: Position { offset: 2, line: 0, column: 3 },
        }));

        let errors = check_structure(&node);

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|error| error.field == "loc"));
    }
}
