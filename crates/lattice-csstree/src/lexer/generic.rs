//! Built-in types matched by predicates instead of grammar.

use crate::ast::Node;
use crate::definition_syntax::Range;

use super::names;

/// Matches a prefix of `nodes`, returning how many nodes it consumed.
/// Zero means no match. The first node is never whitespace.
pub type GenericPredicate = fn(nodes: &[&Node], range: Option<&Range>) -> usize;

const LENGTH: &[&str] = &[
    // absolute
    "px", "mm", "cm", "in", "pt", "pc", "q",
    // font relative
    "em", "ex", "ch", "rem",
    // viewport
    "vh", "vw", "vmin", "vmax", "vm",
];
const ANGLE: &[&str] = &["deg", "grad", "rad", "turn"];
const TIME: &[&str] = &["s", "ms"];
const FREQUENCY: &[&str] = &["hz", "khz"];
const RESOLUTION: &[&str] = &["dpi", "dpcm", "dppx", "x"];
const FLEX: &[&str] = &["fr"];
const DECIBEL: &[&str] = &["db"];
const SEMITONES: &[&str] = &["st"];

/// Names that can never be a `<custom-ident>`.
const RESERVED_IDENTS: &[&str] = &["unset", "initial", "inherit", "default"];

pub(crate) const GENERICS: &[(&str, GenericPredicate)] = &[
    ("angle", angle),
    ("any-value", any_value),
    ("attr()", attr),
    ("custom-ident", custom_ident),
    ("custom-property-name", dashed_ident),
    ("dashed-ident", dashed_ident),
    ("decibel", decibel),
    ("declaration", declaration),
    ("declaration-value", any_value),
    ("dimension", dimension),
    ("expression", expression),
    ("-ms-legacy-expression", expression),
    ("flex", flex),
    ("frequency", frequency),
    ("hex-color", hex_color),
    ("id-selector", id_selector),
    ("ident", ident),
    ("integer", integer),
    ("length", length),
    ("media-query-list", media_query_list),
    ("number", number),
    ("number-one-or-greater", number_one_or_greater),
    ("number-zero-one", number_zero_one),
    ("percentage", percentage),
    ("positive-integer", positive_integer),
    ("progid", progid),
    ("resolution", resolution),
    ("selector-list", selector_list),
    ("semitones", semitones),
    ("string", string),
    ("time", time),
    ("unicode-range", unicode_range),
    ("url", url),
    ("zero", zero),
];

fn one(matched: bool) -> usize {
    usize::from(matched)
}

/// `calc()` and friends stand in for any numeric type.
fn is_math_function(node: &Node) -> bool {
    let Node::Function(function) = node else {
        return false;
    };
    let name = names::keyword(&function.name);

    match name.basename.as_str() {
        "calc" => matches!(name.vendor.as_str(), "" | "-moz-" | "-webkit-"),
        "min" | "max" | "clamp" => name.vendor.is_empty(),
        _ => false,
    }
}

fn in_range(value: &str, range: Option<&Range>) -> bool {
    match (range, value.parse::<f64>()) {
        (None, _) => true,
        (Some(range), Ok(value)) => range.contains(value),
        (Some(_), Err(_)) => false,
    }
}

fn dimension_in(nodes: &[&Node], range: Option<&Range>, units: &[&str]) -> usize {
    match nodes.first() {
        Some(node) if is_math_function(node) => 1,
        Some(Node::Dimension(dimension)) => one(
            units.iter().any(|unit| dimension.unit.eq_ignore_ascii_case(unit)) && in_range(&dimension.value, range),
        ),
        _ => 0,
    }
}

fn number_where(nodes: &[&Node], range: Option<&Range>, accept: impl Fn(&str) -> bool) -> usize {
    match nodes.first() {
        Some(node) if is_math_function(node) => 1,
        Some(Node::Number(number)) => one(accept(&number.value) && in_range(&number.value, range)),
        _ => 0,
    }
}

fn numeric_value(value: &str) -> Option<f64> {
    value.parse().ok()
}

fn angle(nodes: &[&Node], range: Option<&Range>) -> usize {
    dimension_in(nodes, range, ANGLE)
}

fn time(nodes: &[&Node], range: Option<&Range>) -> usize {
    dimension_in(nodes, range, TIME)
}

fn frequency(nodes: &[&Node], range: Option<&Range>) -> usize {
    dimension_in(nodes, range, FREQUENCY)
}

fn resolution(nodes: &[&Node], range: Option<&Range>) -> usize {
    dimension_in(nodes, range, RESOLUTION)
}

fn flex(nodes: &[&Node], range: Option<&Range>) -> usize {
    dimension_in(nodes, range, FLEX)
}

fn decibel(nodes: &[&Node], range: Option<&Range>) -> usize {
    dimension_in(nodes, range, DECIBEL)
}

fn semitones(nodes: &[&Node], range: Option<&Range>) -> usize {
    dimension_in(nodes, range, SEMITONES)
}

fn length(nodes: &[&Node], range: Option<&Range>) -> usize {
    match nodes.first() {
        // unitless zero
        Some(Node::Number(number)) => one(numeric_value(&number.value) == Some(0.0)),
        _ => dimension_in(nodes, range, LENGTH),
    }
}

fn dimension(nodes: &[&Node], range: Option<&Range>) -> usize {
    match nodes.first() {
        Some(node) if is_math_function(node) => 1,
        Some(Node::Dimension(dimension)) => one(in_range(&dimension.value, range)),
        _ => 0,
    }
}

fn number(nodes: &[&Node], range: Option<&Range>) -> usize {
    number_where(nodes, range, |_| true)
}

fn integer(nodes: &[&Node], range: Option<&Range>) -> usize {
    number_where(nodes, range, |value| !value.contains(['.', 'e', 'E']))
}

fn positive_integer(nodes: &[&Node], range: Option<&Range>) -> usize {
    number_where(nodes, range, |value| {
        !value.contains(['.', 'e', 'E']) && !value.starts_with('-')
    })
}

fn number_zero_one(nodes: &[&Node], range: Option<&Range>) -> usize {
    number_where(nodes, range, |value| {
        numeric_value(value).is_some_and(|value| (0.0..=1.0).contains(&value))
    })
}

fn number_one_or_greater(nodes: &[&Node], range: Option<&Range>) -> usize {
    number_where(nodes, range, |value| numeric_value(value).is_some_and(|value| value >= 1.0))
}

fn zero(nodes: &[&Node], _range: Option<&Range>) -> usize {
    match nodes.first() {
        Some(Node::Number(number)) => one(numeric_value(&number.value) == Some(0.0)),
        _ => 0,
    }
}

fn percentage(nodes: &[&Node], range: Option<&Range>) -> usize {
    match nodes.first() {
        Some(node) if is_math_function(node) => 1,
        Some(Node::Percentage(percentage)) => one(in_range(&percentage.value, range)),
        _ => 0,
    }
}

fn hex_color(nodes: &[&Node], _range: Option<&Range>) -> usize {
    match nodes.first() {
        Some(Node::Hash(hash)) => one(
            matches!(hash.value.len(), 3 | 4 | 6 | 8) && hash.value.chars().all(|ch| ch.is_ascii_hexdigit()),
        ),
        _ => 0,
    }
}

fn id_selector(nodes: &[&Node], _range: Option<&Range>) -> usize {
    one(matches!(nodes.first(), Some(Node::Hash(_))))
}

fn ident(nodes: &[&Node], _range: Option<&Range>) -> usize {
    one(matches!(nodes.first(), Some(Node::Identifier(_))))
}

fn custom_ident(nodes: &[&Node], _range: Option<&Range>) -> usize {
    match nodes.first() {
        Some(Node::Identifier(identifier)) => one(
            !RESERVED_IDENTS
                .iter()
                .any(|reserved| identifier.name.eq_ignore_ascii_case(reserved)),
        ),
        _ => 0,
    }
}

fn dashed_ident(nodes: &[&Node], _range: Option<&Range>) -> usize {
    match nodes.first() {
        Some(Node::Identifier(identifier)) => one(names::is_custom_property(&identifier.name)),
        _ => 0,
    }
}

fn string(nodes: &[&Node], _range: Option<&Range>) -> usize {
    one(matches!(nodes.first(), Some(Node::String(_))))
}

fn url(nodes: &[&Node], _range: Option<&Range>) -> usize {
    one(matches!(nodes.first(), Some(Node::Url(_))))
}

fn unicode_range(nodes: &[&Node], _range: Option<&Range>) -> usize {
    one(matches!(nodes.first(), Some(Node::UnicodeRange(_))))
}

fn function_named(nodes: &[&Node], name: &str) -> usize {
    match nodes.first() {
        Some(Node::Function(function)) => one(function.name.eq_ignore_ascii_case(name)),
        _ => 0,
    }
}

fn attr(nodes: &[&Node], _range: Option<&Range>) -> usize {
    function_named(nodes, "attr")
}

fn expression(nodes: &[&Node], _range: Option<&Range>) -> usize {
    function_named(nodes, "expression")
}

fn progid(nodes: &[&Node], _range: Option<&Range>) -> usize {
    match nodes.first() {
        Some(Node::Raw(raw)) => one(raw.value.trim_start().to_ascii_lowercase().starts_with("progid:")),
        _ => 0,
    }
}

// Preludes and conditions the parser has already given structure.

fn declaration(nodes: &[&Node], _range: Option<&Range>) -> usize {
    one(matches!(nodes.first(), Some(Node::Declaration(_))))
}

fn media_query_list(nodes: &[&Node], _range: Option<&Range>) -> usize {
    one(matches!(nodes.first(), Some(Node::MediaQueryList(_))))
}

fn selector_list(nodes: &[&Node], _range: Option<&Range>) -> usize {
    one(matches!(nodes.first(), Some(Node::SelectorList(_))))
}

/// Everything up to the end of the sequence.
fn any_value(nodes: &[&Node], _range: Option<&Range>) -> usize {
    let significant = nodes.iter().rposition(|node| !node.is_white_space_or_comment());
    significant.map_or(0, |last| last + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, Context, ParseOptions};

    fn check(predicate: GenericPredicate, value: &str, range: Option<&Range>) -> usize {
        let ast = parse(value, &ParseOptions::new().context(Context::Value)).unwrap();
        let children = ast.children().unwrap();
        let nodes: Vec<&Node> = children.iter().collect();
        predicate(&nodes, range)
    }

    #[test]
    fn lengths() {
        assert_eq!(check(length, "10px", None), 1);
        assert_eq!(check(length, "1.5EM", None), 1);
        assert_eq!(check(length, "0", None), 1);
        assert_eq!(check(length, "1", None), 0);
        assert_eq!(check(length, "10deg", None), 0);
        assert_eq!(check(length, "calc(1px + 2%)", None), 1);
        assert_eq!(check(length, "-webkit-calc(1px)", None), 1);
        assert_eq!(check(length, "-o-calc(1px)", None), 0);
    }

    #[test]
    fn dimension_families() {
        assert_eq!(check(angle, "90deg", None), 1);
        assert_eq!(check(time, "200ms", None), 1);
        assert_eq!(check(frequency, "1kHz", None), 1);
        assert_eq!(check(resolution, "2x", None), 1);
        assert_eq!(check(flex, "1fr", None), 1);
        assert_eq!(check(decibel, "3db", None), 1);
        assert_eq!(check(semitones, "-2st", None), 1);
        assert_eq!(check(time, "2px", None), 0);
    }

    #[test]
    fn numbers() {
        assert_eq!(check(integer, "12", None), 1);
        assert_eq!(check(integer, "1.5", None), 0);
        assert_eq!(check(positive_integer, "-3", None), 0);
        assert_eq!(check(number_zero_one, "0.5", None), 1);
        assert_eq!(check(number_zero_one, "1.5", None), 0);
        assert_eq!(check(number_one_or_greater, "1", None), 1);
        assert_eq!(check(zero, "0.0", None), 1);
        assert_eq!(check(percentage, "50%", None), 1);
        assert_eq!(check(number, "max(1, 2)", None), 1);
    }

    #[test]
    fn ranges_are_enforced() {
        let non_negative = Range {
            min: Some(0.0),
            max: None,
        };

        assert_eq!(check(number, "-1", Some(&non_negative)), 0);
        assert_eq!(check(number, "3", Some(&non_negative)), 1);
        assert_eq!(check(length, "-1px", Some(&non_negative)), 0);
        assert_eq!(check(length, "calc(-1px)", Some(&non_negative)), 1);
    }

    #[test]
    fn identifiers_and_hashes() {
        assert_eq!(check(hex_color, "#fff", None), 1);
        assert_eq!(check(hex_color, "#abcd12", None), 1);
        assert_eq!(check(hex_color, "#abcde", None), 0);
        assert_eq!(check(hex_color, "#ggg", None), 0);
        assert_eq!(check(id_selector, "#main", None), 1);
        assert_eq!(check(custom_ident, "foo", None), 1);
        assert_eq!(check(custom_ident, "Inherit", None), 0);
        assert_eq!(check(dashed_ident, "--x", None), 1);
        assert_eq!(check(dashed_ident, "x", None), 0);
    }

    #[test]
    fn functions_and_sequences() {
        assert_eq!(check(attr, "attr(title)", None), 1);
        assert_eq!(check(expression, "expression(1)", None), 1);
        assert_eq!(check(string, "'a'", None), 1);
        assert_eq!(check(url, "url(a.png)", None), 1);
        assert_eq!(check(any_value, "a b c ", None), 5);
    }
}
