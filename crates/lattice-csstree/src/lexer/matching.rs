//! Backtracking match of value nodes against a grammar tree.
//!
//! The matcher walks a flat slice of value nodes with an index cursor.
//! Whitespace and comments between terms are skipped, never matched.
//! Every term yields its candidate end positions, most preferred first, and
//! sequences, multipliers and `&&`/`||` groups retry later candidates when
//! a following term fails. Alternatives (`|`) are the exception: the first
//! alternative that matches is final even if a later one would let the
//! enclosing sequence succeed.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::ast::Node;
use crate::definition_syntax::{self, Combinator, GenerateSyntaxOptions, SyntaxNode};
use crate::error::{MatchError, SyntaxReferenceError};
use crate::generator::generate;
use crate::logging::targets;
use crate::tokenizer::Position;

use super::generic::GenericPredicate;
use super::names;
use super::trace::{MatchResult, MatchTree};
use super::{Lexer, SyntaxEntry, SyntaxSource};

/// Keywords valid for every property.
pub(crate) const CSS_WIDE_KEYWORDS: &[&str] = &["initial", "inherit", "unset", "revert", "revert-layer", "-moz-initial"];

/// Type and property references followed before giving up on a branch.
const MAX_REFERENCE_DEPTH: usize = 64;

/// Terms of a `&&` or `||` group tracked in a bit set.
const MAX_ALL_OF_TERMS: usize = 64;

/// Match trees paired with the index just past the consumed nodes, most
/// preferred first. Empty when the term does not match.
type Candidates<'a> = Vec<(Vec<MatchTree<'a>>, usize)>;
type MatchStep<'a> = Result<Candidates<'a>, MatchError>;

fn skip_spaces(nodes: &[&Node], mut pos: usize) -> usize {
    while nodes.get(pos).is_some_and(|node| node.is_white_space_or_comment()) {
        pos += 1;
    }
    pos
}

fn is_operator(node: &Node, value: &str) -> bool {
    matches!(node, Node::Operator(operator) if operator.value == value)
}

/// `\0` and `\9` browser hacks.
fn is_hack(node: &Node) -> bool {
    matches!(node, Node::Identifier(identifier) if identifier.name.starts_with("\\0") || identifier.name.starts_with("\\9"))
}

/// `name` without a trailing `\0` or `\9` hack.
fn strip_hack(name: &str) -> &str {
    let hack = name
        .match_indices('\\')
        .map(|(index, _)| index)
        .find(|&index| matches!(name.as_bytes().get(index + 1), Some(b'0' | b'9')));

    match hack {
        Some(index) => &name[..index],
        None => name,
    }
}

fn contains_var(node: &Node) -> bool {
    if let Node::Function(function) = node {
        if function.name.eq_ignore_ascii_case("var") {
            return true;
        }
    }
    node.child_nodes().into_iter().any(contains_var)
}

fn keyword_matches(name: &str, value: &str) -> bool {
    let keyword = names::keyword(strip_hack(value));
    format!("{}{}", keyword.vendor, keyword.basename) == name.to_lowercase()
}

/// Whether a comma at `pos` would follow nothing, another comma or `/`.
fn is_comma_context_start(nodes: &[&Node], pos: usize) -> bool {
    let before = &nodes[..pos.min(nodes.len())];

    match before.iter().rev().find(|node| !node.is_white_space_or_comment()) {
        None => true,
        Some(node) => is_operator(node, ",") || is_operator(node, "/"),
    }
}

/// Whether nothing but `/` or the end of the list follows `pos`.
fn is_comma_context_end(nodes: &[&Node], pos: usize) -> bool {
    match nodes.get(skip_spaces(nodes, pos)) {
        None => true,
        Some(node) => is_operator(node, "/"),
    }
}

/// Keep the first candidate for every end position.
fn dedup_ends(candidates: &mut Candidates<'_>) {
    let mut seen = BTreeSet::new();
    candidates.retain(|(_, end)| seen.insert(*end));
}

/// Nodes a value is matched over: the children of a `Value` or prelude,
/// or the node itself.
fn value_nodes(value: &Node) -> Vec<&Node> {
    match value {
        Node::Value(_) | Node::AtrulePrelude(_) => value.children().map(|list| list.iter().collect()).unwrap_or_default(),
        other => vec![other],
    }
}

fn inner_nodes(node: &Node) -> Vec<&Node> {
    node.children().map(|list| list.iter().collect()).unwrap_or_default()
}

/// State of one `&&` or `||` group search.
struct AllOfSearch<'s, 'a> {
    terms: &'s [SyntaxNode],
    nodes: &'s [&'a Node],
    exhaustive: bool,
    disallow_empty: bool,
    visited: BTreeSet<(u64, usize)>,
    /// Whether term `index` may match nothing at `pos`.
    empty: BTreeMap<(usize, usize), bool>,
    found: Candidates<'a>,
}

struct Matcher<'l> {
    lexer: &'l Lexer,
    references: usize,
    /// Index of each function or parentheses node being matched into.
    path: Vec<usize>,
    /// Furthest position any attempt consumed up to, as a path.
    deepest: Vec<usize>,
}

impl<'l> Matcher<'l> {
    fn new(lexer: &'l Lexer) -> Self {
        Self {
            lexer,
            references: 0,
            path: Vec::new(),
            deepest: vec![0],
        }
    }

    fn reached(&mut self, next: usize) {
        let mut key = self.path.clone();
        key.push(next);
        if key > self.deepest {
            self.deepest = key;
        }
    }

    /// Consume the single node at `pos`.
    fn single<'a>(&mut self, nodes: &[&'a Node], pos: usize) -> (MatchTree<'a>, usize) {
        self.reached(pos + 1);
        (MatchTree::Node(nodes[pos]), pos + 1)
    }

    fn match_term<'a>(&mut self, syntax: &SyntaxNode, nodes: &[&'a Node], pos: usize) -> MatchStep<'a> {
        let pos = skip_spaces(nodes, pos);
        let mut candidates = self.match_term_at(syntax, nodes, pos)?;

        for (_, end) in &mut candidates {
            *end = skip_spaces(nodes, *end);
        }
        dedup_ends(&mut candidates);

        Ok(candidates)
    }

    fn match_term_at<'a>(&mut self, syntax: &SyntaxNode, nodes: &[&'a Node], pos: usize) -> MatchStep<'a> {
        let lexer = self.lexer;

        match syntax {
            SyntaxNode::Group {
                combinator,
                terms,
                disallow_empty,
                ..
            } => match combinator {
                Combinator::VerticalLine => self.match_one_of(terms, nodes, pos),
                Combinator::Juxtapose => self.match_sequence(terms, *disallow_empty, nodes, pos),
                Combinator::DoubleAmpersand => self.match_all_of(terms, *disallow_empty, true, nodes, pos),
                Combinator::DoubleVerticalLine => self.match_all_of(terms, *disallow_empty, false, nodes, pos),
            },
            SyntaxNode::Multiplier { min, max, comma, term } => {
                self.match_multiplier(term, *min, *max, *comma, nodes, pos)
            }
            SyntaxNode::Type { name, range } => {
                let entry = lexer
                    .get_type(name)
                    .ok_or_else(|| SyntaxReferenceError::unknown_type(name))?;
                self.match_entry(entry, "Type", range.as_ref(), nodes, pos)
            }
            SyntaxNode::Property { name } => {
                let entry = lexer
                    .property_entry(name)
                    .ok_or_else(|| SyntaxReferenceError::unknown_property(name))?;
                self.match_entry(entry, "Property", None, nodes, pos)
            }
            SyntaxNode::Keyword { name } => {
                let matched = match nodes.get(pos) {
                    Some(Node::Identifier(identifier)) => keyword_matches(name, &identifier.name),
                    // numeric keywords such as `font-weight: 400`
                    Some(Node::Number(number)) => number.value == *name,
                    _ => false,
                };
                if !matched {
                    return Ok(Vec::new());
                }
                let (node, next) = self.single(nodes, pos);
                Ok(vec![(vec![MatchTree::term("Keyword", Some(name.as_str()), vec![node])], next)])
            }
            SyntaxNode::Function { name, children } => {
                let Some(&node) = nodes.get(pos) else {
                    return Ok(Vec::new());
                };
                let Node::Function(function) = node else {
                    return Ok(Vec::new());
                };
                if !keyword_matches(name, &function.name) {
                    return Ok(Vec::new());
                }
                self.match_contents("Function", Some(name.as_str()), node, children, pos)
            }
            SyntaxNode::Parentheses { children } => {
                let Some(&node) = nodes.get(pos).filter(|node| matches!(node, Node::Parentheses(_))) else {
                    return Ok(Vec::new());
                };
                self.match_contents("Parentheses", None, node, children, pos)
            }
            SyntaxNode::Comma => self.match_comma(nodes, pos),
            SyntaxNode::Token { .. } | SyntaxNode::String { .. } => {
                let accepted = match (syntax, nodes.get(pos)) {
                    (SyntaxNode::Token { value }, Some(node)) => is_operator(node, value),
                    (SyntaxNode::String { .. }, Some(node)) => matches!(node, Node::String(_)),
                    _ => false,
                };
                if !accepted {
                    return Ok(Vec::new());
                }
                let (node, next) = self.single(nodes, pos);
                Ok(vec![(vec![node], next)])
            }
            // at-keywords never appear in values
            SyntaxNode::AtKeyword { .. } => Ok(Vec::new()),
        }
    }

    /// A comma needs a match on both sides; without one in the value it
    /// matches nothing, but only next to a list boundary.
    fn match_comma<'a>(&mut self, nodes: &[&'a Node], pos: usize) -> MatchStep<'a> {
        let has_comma = nodes.get(pos).is_some_and(|node| is_operator(node, ","));

        if !has_comma {
            if is_comma_context_start(nodes, pos) || is_comma_context_end(nodes, pos) {
                return Ok(vec![(Vec::new(), pos)]);
            }
            return Ok(Vec::new());
        }

        if is_comma_context_start(nodes, pos) {
            return Ok(Vec::new());
        }
        let (node, next) = self.single(nodes, pos);
        if is_comma_context_end(nodes, next) {
            return Ok(Vec::new());
        }

        Ok(vec![(vec![node], next)])
    }

    fn match_entry<'a>(
        &mut self,
        entry: &SyntaxEntry,
        kind: &'static str,
        range: Option<&definition_syntax::Range>,
        nodes: &[&'a Node],
        pos: usize,
    ) -> MatchStep<'a> {
        let name = Some(entry.name());

        let syntax = match entry.source() {
            SyntaxSource::Generic(predicate) => return Ok(self.match_generic(*predicate, kind, name, range, nodes, pos)),
            SyntaxSource::Definition(_) => match entry.syntax() {
                Some(Ok(syntax)) => syntax,
                Some(Err(error)) => return Err(error.clone().into()),
                None => return Ok(Vec::new()),
            },
        };

        if self.references >= MAX_REFERENCE_DEPTH {
            return Ok(Vec::new());
        }

        self.references += 1;
        let result = self.match_term(syntax, nodes, pos);
        self.references -= 1;

        Ok(result?
            .into_iter()
            .map(|(children, next)| (vec![MatchTree::term(kind, name, children)], next))
            .collect())
    }

    fn match_generic<'a>(
        &mut self,
        predicate: GenericPredicate,
        kind: &'static str,
        name: Option<&str>,
        range: Option<&definition_syntax::Range>,
        nodes: &[&'a Node],
        pos: usize,
    ) -> Candidates<'a> {
        let count = match nodes.get(pos..) {
            Some(rest) if !rest.is_empty() => predicate(rest, range).min(rest.len()),
            _ => 0,
        };
        if count == 0 {
            return Vec::new();
        }

        let next = pos + count;
        self.reached(next);
        let children = nodes[pos..next].iter().copied().map(MatchTree::Node).collect();

        vec![(vec![MatchTree::term(kind, name, children)], next)]
    }

    /// Match the inside of a function or parentheses node as a flat list
    /// that must be consumed entirely.
    fn match_contents<'a>(
        &mut self,
        kind: &'static str,
        name: Option<&str>,
        node: &'a Node,
        syntax: &SyntaxNode,
        pos: usize,
    ) -> MatchStep<'a> {
        let inner = inner_nodes(node);

        self.path.push(pos);
        let result = self.match_term(syntax, &inner, 0);
        self.path.pop();

        let Some((children, _)) = result?.into_iter().find(|(_, end)| *end == inner.len()) else {
            return Ok(Vec::new());
        };

        self.reached(pos + 1);
        let tree = MatchTree::Term {
            kind,
            name: name.map(str::to_string),
            node: Some(node),
            children,
        };

        Ok(vec![(vec![tree], pos + 1)])
    }

    fn match_one_of<'a>(&mut self, terms: &[SyntaxNode], nodes: &[&'a Node], pos: usize) -> MatchStep<'a> {
        for term in terms {
            let candidates = self.match_term(term, nodes, pos)?;
            if !candidates.is_empty() {
                return Ok(candidates);
            }
        }
        Ok(Vec::new())
    }

    fn match_sequence<'a>(
        &mut self,
        terms: &[SyntaxNode],
        disallow_empty: bool,
        nodes: &[&'a Node],
        pos: usize,
    ) -> MatchStep<'a> {
        let mut states: Candidates<'a> = vec![(Vec::new(), pos)];

        for term in terms {
            let mut next_states = Vec::new();

            for (trees, at) in &states {
                for (matched, end) in self.match_term(term, nodes, *at)? {
                    let mut trees = trees.clone();
                    trees.extend(matched);
                    next_states.push((trees, end));
                }
            }

            dedup_ends(&mut next_states);
            if next_states.is_empty() {
                return Ok(Vec::new());
            }
            states = next_states;
        }

        if disallow_empty {
            states.retain(|(_, end)| *end > pos);
        }

        Ok(states)
    }

    /// `&&` when `exhaustive`, `||` otherwise.
    fn match_all_of<'a>(
        &mut self,
        terms: &[SyntaxNode],
        disallow_empty: bool,
        exhaustive: bool,
        nodes: &[&'a Node],
        pos: usize,
    ) -> MatchStep<'a> {
        if terms.len() > MAX_ALL_OF_TERMS {
            trace!(target: targets::LEXER, terms = terms.len(), "group too large to match");
            return Ok(Vec::new());
        }

        let mut search = AllOfSearch {
            terms,
            nodes,
            exhaustive,
            disallow_empty,
            visited: BTreeSet::new(),
            empty: BTreeMap::new(),
            found: Vec::new(),
        };
        self.all_of_from(&mut search, 0, Vec::new(), pos)?;

        Ok(search.found)
    }

    /// Try every unused term that consumes something at `at`, deeper
    /// states first, then accept `at` itself if what is left may be
    /// omitted.
    fn all_of_from<'a>(
        &mut self,
        search: &mut AllOfSearch<'_, 'a>,
        used: u64,
        trees: Vec<MatchTree<'a>>,
        at: usize,
    ) -> Result<(), MatchError> {
        if !search.visited.insert((used, at)) {
            return Ok(());
        }

        let terms = search.terms;
        let nodes = search.nodes;

        for (index, term) in terms.iter().enumerate() {
            if used & (1 << index) != 0 {
                continue;
            }

            let candidates = self.match_term(term, nodes, at)?;
            search
                .empty
                .insert((index, at), candidates.iter().any(|(_, end)| *end == at));

            for (matched, end) in candidates {
                if end == at {
                    continue;
                }
                let mut trees = trees.clone();
                trees.extend(matched);
                self.all_of_from(search, used | (1 << index), trees, end)?;
            }
        }

        let any_used = used != 0;
        let rest_omittable = (0..terms.len())
            .filter(|&index| used & (1 << index) == 0)
            .all(|index| search.empty.get(&(index, at)).copied().unwrap_or(false));

        let accepted = if any_used {
            !search.exhaustive || rest_omittable
        } else {
            rest_omittable && !search.disallow_empty
        };
        if accepted {
            search.found.push((trees, at));
        }

        Ok(())
    }

    fn match_multiplier<'a>(
        &mut self,
        term: &SyntaxNode,
        min: u32,
        max: Option<u32>,
        comma: bool,
        nodes: &[&'a Node],
        pos: usize,
    ) -> MatchStep<'a> {
        // rounds[n] holds the ends reachable with exactly n repetitions
        let mut rounds: Vec<Candidates<'a>> = vec![vec![(Vec::new(), pos)]];
        // ends where a repetition matched nothing, so any count is reachable
        let mut saturated: Candidates<'a> = Vec::new();

        loop {
            let count = rounds.len();
            if max.is_some_and(|max| count > max as usize) {
                break;
            }
            let Some(frontier) = rounds.last().cloned() else {
                break;
            };

            let mut next = Vec::new();
            for (trees, at) in frontier {
                let mut prefix = trees;
                let mut start = at;

                if comma && count > 1 {
                    if !nodes.get(at).is_some_and(|node| is_operator(node, ",")) {
                        continue;
                    }
                    let (separator, after) = self.single(nodes, at);
                    prefix.push(separator);
                    start = skip_spaces(nodes, after);
                }

                for (matched, end) in self.match_term(term, nodes, start)? {
                    let mut trees = prefix.clone();
                    trees.extend(matched);

                    if end > start {
                        next.push((trees, end));
                    } else if start == at {
                        saturated.push((trees, end));
                    }
                    // an empty item after a comma is never taken
                }
            }

            dedup_ends(&mut next);
            if next.is_empty() {
                break;
            }
            rounds.push(next);
        }

        let mut candidates: Candidates<'a> = rounds
            .into_iter()
            .enumerate()
            .rev()
            .filter(|(count, _)| *count >= min as usize)
            .flat_map(|(_, round)| round)
            .collect();
        candidates.extend(saturated);

        Ok(candidates)
    }
}

/// The node at `path` with its offset and length in the concatenated text
/// of `nodes`. Falls back to the enclosing node when the path ends past the
/// last child.
fn locate<'a>(nodes: &[&'a Node], path: &[usize]) -> Option<(&'a Node, usize, usize)> {
    let mut slice = nodes.to_vec();
    let mut base = 0;
    let mut found = None;

    for (depth, &index) in path.iter().enumerate() {
        let index = if depth + 1 == path.len() {
            skip_spaces(&slice, index)
        } else {
            index
        };
        let Some(&node) = slice.get(index) else {
            break;
        };

        let offset = base + slice[..index].iter().map(|node| generate(node).len()).sum::<usize>();
        found = Some((node, offset, generate(node).len()));

        let opening = match node {
            Node::Function(function) => function.name.len() + 1,
            Node::Parentheses(_) => 1,
            _ => break,
        };
        base = offset + opening;
        slice = inner_nodes(node);
    }

    found
}

fn mismatch_error(raw_message: &str, syntax: &SyntaxNode, nodes: &[&Node], path: &[usize]) -> MatchError {
    let css: String = nodes.iter().map(|node| generate(node)).collect();
    let located = locate(nodes, path);

    let (mismatch_offset, mismatch_length) = located.map_or((css.len(), 0), |(_, offset, length)| (offset, length));
    let syntax_text = definition_syntax::generate(syntax, &GenerateSyntaxOptions::default());

    let (source, start, end) = match located.and_then(|(node, ..)| node.loc()) {
        Some(loc) => (loc.source.clone(), loc.start, loc.end),
        None => {
            let column = |offset: usize| css.get(..offset).map_or(offset, |prefix| prefix.chars().count()) + 1;
            let start = Position {
                offset: mismatch_offset,
                line: 1,
                column: column(mismatch_offset),
            };
            let end_offset = mismatch_offset + mismatch_length;
            let end = Position {
                offset: end_offset,
                line: 1,
                column: column(end_offset),
            };
            ("<unknown>".to_string(), start, end)
        }
    };

    MatchError::mismatch(
        raw_message,
        syntax_text,
        css,
        mismatch_offset,
        mismatch_length,
        &source,
        start,
        end,
    )
}

/// Match `value` against `syntax`, wrapping a successful match in a
/// `kind`/`name` term.
pub(crate) fn match_value<'a>(
    lexer: &Lexer,
    syntax: &SyntaxNode,
    kind: &'static str,
    name: Option<&str>,
    value: &'a Node,
) -> MatchResult<'a> {
    let nodes = value_nodes(value);

    // substitution makes the value undecidable until computed
    if contains_var(value) {
        let children = nodes.iter().copied().map(MatchTree::Node).collect();
        return MatchResult::matched(MatchTree::term(kind, name, children));
    }

    let significant: Vec<&Node> = nodes.iter().copied().filter(|node| !node.is_white_space_or_comment()).collect();
    if let [node] = significant.as_slice() {
        let keyword = node.as_identifier().and_then(|identifier| {
            CSS_WIDE_KEYWORDS
                .iter()
                .find(|keyword| identifier.eq_ignore_ascii_case(keyword))
                .copied()
        });
        if let Some(keyword) = keyword {
            let tree = MatchTree::term("Keyword", Some(keyword), vec![MatchTree::Node(*node)]);
            return MatchResult::matched(MatchTree::term(kind, name, vec![tree]));
        }
    }

    let mut end = nodes.len();
    while end > 0 && (nodes[end - 1].is_white_space_or_comment() || is_hack(nodes[end - 1])) {
        end -= 1;
    }
    let candidates = &nodes[..end];

    let mut matcher = Matcher::new(lexer);
    let result = match matcher.match_term(syntax, candidates, 0) {
        Err(error) => MatchResult::failed(error),
        Ok(matches) if matches.is_empty() => {
            MatchResult::failed(mismatch_error("Mismatch", syntax, &nodes, &matcher.deepest))
        }
        Ok(matches) => {
            let furthest = matches.iter().map(|(_, next)| *next).max().unwrap_or(0);
            match matches.into_iter().find(|(_, next)| *next == end) {
                Some((children, _)) => MatchResult::matched(MatchTree::term(kind, name, children)),
                None => MatchResult::failed(mismatch_error("Uncomplete match", syntax, &nodes, &[furthest])),
            }
        }
    };

    trace!(
        target: targets::LEXER,
        kind,
        name = name.unwrap_or(""),
        matched = result.is_match(),
        "match value"
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition_syntax::parse as parse_syntax;
    use crate::parser::{parse, Context, ParseOptions};

    fn value(source: &str) -> Node {
        parse(source, &ParseOptions::new().context(Context::Value)).unwrap()
    }

    fn matches(grammar: &str, source: &str) -> bool {
        let syntax = parse_syntax(grammar).unwrap();
        let value = value(source);
        match_value(Lexer::default_lexer(), &syntax, "Syntax", None, &value).is_match()
    }

    #[test]
    fn sequences_keep_order() {
        assert!(matches("a b c", "a b c"));
        assert!(!matches("a b c", "a c b"));
        assert!(matches("a b? c", "a c"));
        assert!(!matches("a b", "a"));
    }

    #[test]
    fn all_of_accepts_any_order() {
        assert!(matches("a && b && c", "c a b"));
        assert!(!matches("a && b && c", "c a"));
        assert!(matches("a && b?", "a"));
        assert!(!matches("a && b && c", ""));
    }

    #[test]
    fn one_or_more_of_accepts_subsets() {
        assert!(matches("a || b || c", "c a"));
        assert!(matches("a || b || c", "b"));
        assert!(!matches("a || b || c", "d"));
        assert!(!matches("a || b", "a a"));
    }

    #[test]
    fn repetitions_are_given_back() {
        assert!(matches("a? a", "a"));
        assert!(matches("a* a", "a a"));
        assert!(matches("<length>{1,2} <length>", "1px 2px"));
        assert!(matches("<length>#? , <length>", "1px, 2px"));
        assert!(matches("<length>#? , <length>", "1px"));
        assert!(matches("[ a | b ]* b", "a b b"));
        assert!(!matches("a+ a", "a"));
    }

    #[test]
    fn all_of_retries_other_orders() {
        assert!(matches("[ a || a b ] c", "a b c"));
        assert!(matches("[ <length>{1,2} && b ] <length>", "b 1px 2px"));
        assert!(matches("[ a? && b ] a", "b a"));
    }

    #[test]
    fn comma_needs_a_preceding_match() {
        assert!(!matches("a? [ , b ]", ", b"));
        assert!(matches("a? [ , b ]", "a, b"));
        assert!(matches("a? [ , b ]", "b"));
        assert!(!matches("a , b", "a ,"));
        assert!(!matches("a? , b", "a b"));
    }

    #[test]
    fn alternatives_are_greedy() {
        assert!(matches("a | b", "b"));
        // `a` wins and `a b` is never tried
        assert!(!matches("[ a | a b ] c", "a b c"));
        assert!(matches("[ a b | a ] c", "a c"));
    }

    #[test]
    fn multipliers_and_commas() {
        assert!(matches("a{2,3}", "a a"));
        assert!(!matches("a{2,3}", "a"));
        assert!(!matches("a{2,3}", "a a a a"));
        assert!(matches("<length>#", "1px, 2px ,3px"));
        assert!(!matches("<length>#", "1px 2px"));
        assert!(!matches("<length>#", "1px,"));
        assert!(matches("a*", ""));
    }

    #[test]
    fn optional_terms_around_commas() {
        let grammar = "<length>? , <color>";
        assert!(matches(grammar, "1px, red"));
        assert!(matches(grammar, "red"));
        assert!(!matches(grammar, "1px red"));
        assert!(!matches(grammar, ", red"));
    }

    #[test]
    fn functions_must_be_consumed() {
        assert!(matches("rgb( <number>#{3} )", "rgb(1, 2, 3)"));
        assert!(!matches("rgb( <number>#{3} )", "rgb(1, 2, 3, 4)"));
        assert!(!matches("rgb( <number>#{3} )", "hsl(1, 2, 3)"));
        assert!(matches("-webkit-fit-content( <length> )", "-WEBKIT-Fit-Content(1px)"));
        assert!(!matches("fit-content( <length> )", "-webkit-fit-content(1px)"));
        assert!(matches("( <length> )", "(1px)"));
    }

    #[test]
    fn keywords_and_numbers() {
        assert!(matches("bold | 400", "BOLD"));
        assert!(matches("bold | 400", "400"));
        assert!(!matches("bold | 400", "401"));
        assert!(matches("<length> / <length>", "1px/2px"));
    }

    #[test]
    fn mismatch_points_at_the_divergence() {
        let syntax = parse_syntax("a b c").unwrap();
        let value = value("a b d");
        let result = match_value(Lexer::default_lexer(), &syntax, "Syntax", None, &value);
        let error = result.error.unwrap();

        assert_eq!(error.raw_message, "Mismatch");
        assert_eq!(error.css, "a b d");
        assert_eq!(error.mismatch_offset, 4);
        assert_eq!(error.mismatch_length, 1);
        assert_eq!(error.column, 5);
    }

    #[test]
    fn mismatch_inside_function_points_at_the_argument() {
        let syntax = parse_syntax("rgb( <number>#{3} ) | fit-content( <length> )").unwrap();

        for source in ["rgb(1, 2, x)", "fit-content(1px 2px)"] {
            let value = value(source);
            let error = match_value(Lexer::default_lexer(), &syntax, "Syntax", None, &value)
                .error
                .unwrap();
            let caret = &error.css[error.mismatch_offset..error.mismatch_offset + error.mismatch_length];

            assert_eq!(error.raw_message, "Mismatch");
            assert!(error.mismatch_offset > 0, "{source}: {}", error.mismatch_offset);
            assert!(matches!(caret, "x" | "2px"), "{source}: {caret:?}");
        }
    }

    #[test]
    fn leftover_nodes_are_uncomplete() {
        let syntax = parse_syntax("a").unwrap();
        let value = value("a b");
        let error = match_value(Lexer::default_lexer(), &syntax, "Syntax", None, &value)
            .error
            .unwrap();

        assert_eq!(error.raw_message, "Uncomplete match");
        assert_eq!(error.mismatch_offset, 2);
    }

    #[test]
    fn hacks_and_trailing_space_are_ignored() {
        assert!(matches("a", "a \\9"));
        assert!(matches("a", "a /* note */"));
    }

    #[test]
    fn keyword_hack_suffix_is_dropped() {
        assert!(matches("red | blue", "red\\9"));
        assert!(matches("red | blue", "blue\\0"));
        assert!(!matches("red | blue", "green\\9"));
        assert_eq!(strip_hack("red\\9"), "red");
        assert_eq!(strip_hack("a\\b"), "a\\b");
    }

    #[test]
    fn unknown_reference_is_an_error() {
        let syntax = parse_syntax("<no-such-type>").unwrap();
        let value = value("a");
        let error = match_value(Lexer::default_lexer(), &syntax, "Syntax", None, &value)
            .error
            .unwrap();

        assert_eq!(error.message, "Unknown type reference `<no-such-type>`");
    }
}
