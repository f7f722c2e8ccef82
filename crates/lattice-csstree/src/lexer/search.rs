//! Fragment search: runs of value nodes matched through a given type or
//! property.

use crate::ast::Node;

use super::trace::{MatchResult, MatchTree};

/// Sibling value nodes matched through one grammar term, from the first
/// node the term consumed to the last, including the whitespace between.
#[derive(Debug, Clone)]
pub struct ValueFragment<'a> {
    /// Node whose children hold the fragment.
    pub parent: &'a Node,
    pub nodes: Vec<&'a Node>,
}

/// Fragments of `value` matched through terms of `kind` named `name`.
pub(crate) fn match_fragments<'a>(
    value: &'a Node,
    result: &MatchResult<'a>,
    kind: &str,
    name: &str,
) -> Vec<ValueFragment<'a>> {
    let mut fragments = Vec::new();

    if let Some(tree) = &result.matched {
        collect_fragments(value, tree, kind, name, &mut fragments);
    }

    fragments
}

fn collect_fragments<'a>(
    value: &'a Node,
    tree: &MatchTree<'a>,
    kind: &str,
    name: &str,
    out: &mut Vec<ValueFragment<'a>>,
) {
    let MatchTree::Term {
        kind: term_kind,
        name: term_name,
        children,
        ..
    } = tree
    else {
        return;
    };

    if *term_kind == kind && term_name.as_deref() == Some(name) {
        let nodes = tree.nodes();
        if let (Some(first), Some(last)) = (nodes.first(), nodes.last()) {
            out.extend(siblings_between(value, first, last));
        }
    }

    for child in children {
        collect_fragments(value, child, kind, name, out);
    }
}

/// The run from `first` to `last` in the child list holding `first`. The
/// run stops at the end of that list if `last` is elsewhere.
fn siblings_between<'a>(parent: &'a Node, first: &Node, last: &Node) -> Option<ValueFragment<'a>> {
    if let Some(list) = parent.children() {
        let mut nodes = Vec::new();

        for node in list.iter() {
            if nodes.is_empty() && !std::ptr::eq(node, first) {
                continue;
            }
            nodes.push(node);
            if std::ptr::eq(node, last) {
                break;
            }
        }

        if !nodes.is_empty() {
            return Some(ValueFragment { parent, nodes });
        }
    }

    parent
        .child_nodes()
        .into_iter()
        .find_map(|child| siblings_between(child, first, last))
}

/// Every `Declaration` in `root`, in source order.
pub(crate) fn declarations(root: &Node) -> Vec<&Node> {
    let mut found = Vec::new();
    collect_declarations(root, &mut found);
    found
}

fn collect_declarations<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
    if matches!(node, Node::Declaration(_)) {
        out.push(node);
        return;
    }

    for child in node.child_nodes() {
        collect_declarations(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::List;

    #[test]
    fn run_spans_whitespace_between_matched_nodes() {
        let value = Node::value(
            [Node::identifier("a"), Node::white_space(), Node::identifier("b"), Node::white_space(), Node::identifier("c")]
                .into_iter()
                .collect::<List<Node>>(),
        );
        let children: Vec<&Node> = value.children().unwrap().iter().collect();

        let fragment = siblings_between(&value, children[0], children[2]).unwrap();

        assert_eq!(fragment.nodes.len(), 3);
        assert!(std::ptr::eq(fragment.nodes[2], children[2]));
        assert!(std::ptr::eq(fragment.parent, &value));
    }

    #[test]
    fn declarations_are_found_in_nested_blocks() {
        use crate::parser::{parse, ParseOptions};

        let ast = parse("a { color: red } @media print { b { width: 1px; height: 2px } }", &ParseOptions::new()).unwrap();
        let found = declarations(&ast);

        let properties: Vec<&str> = found
            .iter()
            .filter_map(|node| match node {
                Node::Declaration(declaration) => Some(declaration.property.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(properties, ["color", "width", "height"]);
    }
}
