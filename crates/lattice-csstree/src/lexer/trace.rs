//! Match trees and queries over them.

use crate::ast::Node;
use crate::error::MatchError;

/// What a grammar term matched.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchTree<'a> {
    /// A named grammar term: `Type`, `Property`, `Keyword`, `Function` or
    /// `Parentheses`, or the `Value` root of a match.
    Term {
        kind: &'static str,
        name: Option<String>,
        /// The value node the term consumed as a whole, for functions and
        /// parentheses.
        node: Option<&'a Node>,
        children: Vec<MatchTree<'a>>,
    },
    /// A value node consumed by a leaf term.
    Node(&'a Node),
}

impl<'a> MatchTree<'a> {
    pub(crate) fn term(kind: &'static str, name: Option<&str>, children: Vec<MatchTree<'a>>) -> Self {
        MatchTree::Term {
            kind,
            name: name.map(str::to_string),
            node: None,
            children,
        }
    }

    /// Value nodes covered by this tree, in order.
    pub fn nodes(&self) -> Vec<&'a Node> {
        let mut nodes = Vec::new();
        self.collect_nodes(&mut nodes);
        nodes
    }

    fn collect_nodes(&self, out: &mut Vec<&'a Node>) {
        match self {
            MatchTree::Node(node) => out.push(*node),
            MatchTree::Term {
                node: Some(node), ..
            } => out.push(*node),
            MatchTree::Term { children, .. } => {
                for child in children {
                    child.collect_nodes(out);
                }
            }
        }
    }
}

/// A grammar term on the path from the match root to a value node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// `Type`, `Property` or `Keyword`.
    pub kind: &'static str,
    pub name: String,
}

/// Outcome of a lexer match. Both fields are `None` when matching does not
/// apply, as for custom properties.
#[derive(Debug, Clone, Default)]
pub struct MatchResult<'a> {
    pub matched: Option<MatchTree<'a>>,
    pub error: Option<MatchError>,
}

impl<'a> MatchResult<'a> {
    pub(crate) fn matched(tree: MatchTree<'a>) -> Self {
        Self {
            matched: Some(tree),
            error: None,
        }
    }

    pub(crate) fn failed(error: MatchError) -> Self {
        Self {
            matched: None,
            error: Some(error),
        }
    }

    pub fn is_match(&self) -> bool {
        self.matched.is_some()
    }

    /// `Type`, `Property` and `Keyword` terms enclosing `node`, outermost
    /// first. `None` if the match does not cover `node`.
    pub fn get_trace(&self, node: &Node) -> Option<Vec<TraceEntry>> {
        let mut stack = Vec::new();
        let tree = self.matched.as_ref()?;

        find_node(tree, node, &mut stack).then_some(stack)
    }

    /// Whether `node` was matched through the type `<name>`.
    pub fn is_type(&self, node: &Node, name: &str) -> bool {
        self.test_trace(node, |entry| entry.kind == "Type" && entry.name == name)
    }

    /// Whether `node` was matched through the property `<'name'>`.
    pub fn is_property(&self, node: &Node, name: &str) -> bool {
        self.test_trace(node, |entry| entry.kind == "Property" && entry.name == name)
    }

    pub fn is_keyword(&self, node: &Node) -> bool {
        self.test_trace(node, |entry| entry.kind == "Keyword")
    }

    fn test_trace(&self, node: &Node, predicate: impl Fn(&TraceEntry) -> bool) -> bool {
        self.get_trace(node)
            .is_some_and(|trace| trace.iter().any(predicate))
    }
}

fn find_node(tree: &MatchTree<'_>, target: &Node, stack: &mut Vec<TraceEntry>) -> bool {
    match tree {
        MatchTree::Node(node) => std::ptr::eq(*node, target),
        MatchTree::Term {
            kind,
            name,
            node,
            children,
        } => {
            let traced = matches!(*kind, "Type" | "Property" | "Keyword");
            if traced {
                stack.push(TraceEntry {
                    kind: *kind,
                    name: name.clone().unwrap_or_default(),
                });
            }

            if node.is_some_and(|node| std::ptr::eq(node, target))
                || children.iter().any(|child| find_node(child, target, stack))
            {
                return true;
            }

            if traced {
                stack.pop();
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_lists_enclosing_terms() {
        let red = Node::identifier("red");
        let other = Node::identifier("red");
        let tree = MatchTree::term(
            "Property",
            Some("color"),
            vec![MatchTree::term(
                "Type",
                Some("color"),
                vec![MatchTree::term("Keyword", Some("red"), vec![MatchTree::Node(&red)])],
            )],
        );
        let result = MatchResult::matched(tree);

        let trace = result.get_trace(&red).unwrap();
        let kinds: Vec<_> = trace.iter().map(|entry| (entry.kind, entry.name.as_str())).collect();
        assert_eq!(kinds, [("Property", "color"), ("Type", "color"), ("Keyword", "red")]);

        assert!(result.is_type(&red, "color"));
        assert!(result.is_property(&red, "color"));
        assert!(result.is_keyword(&red));
        assert!(!result.is_type(&red, "length"));

        // identity, not equality
        assert!(result.get_trace(&other).is_none());
    }

    #[test]
    fn failed_result_has_no_trace() {
        let node = Node::identifier("a");
        let result = MatchResult::default();

        assert!(!result.is_match());
        assert!(result.get_trace(&node).is_none());
        assert!(!result.is_keyword(&node));
    }
}
