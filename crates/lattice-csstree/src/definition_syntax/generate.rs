//! Canonical text for grammar trees.

use super::{Combinator, Range, SyntaxNode};

/// Options for [`generate`].
#[derive(Clone, Copy, Default)]
pub struct GenerateSyntaxOptions<'d> {
    /// Bracket every group, not only the ones written with brackets.
    pub force_braces: bool,
    /// Wraps the text produced for a node. Multipliers pass only their
    /// suffix; groups, functions and parentheses pass their whole text.
    pub decorate: Option<&'d dyn Fn(String, &SyntaxNode) -> String>,
}

/// Print `node` in canonical definition syntax.
pub fn generate(node: &SyntaxNode, options: &GenerateSyntaxOptions<'_>) -> String {
    let text = match node {
        SyntaxNode::Group {
            explicit,
            disallow_empty,
            ..
        } => {
            let mut text = sequence(node, *explicit || options.force_braces, options);
            if *disallow_empty {
                text.push('!');
            }
            text
        }
        SyntaxNode::Multiplier { term, .. } => {
            let suffix = decorate(multiplier(node), node, options);
            return generate(term, options) + &suffix;
        }
        SyntaxNode::Type { name, range } => match range {
            Some(range) => format!("<{name} {}>", range_text(range)),
            None => format!("<{name}>"),
        },
        SyntaxNode::Property { name } => format!("<'{name}'>"),
        SyntaxNode::Keyword { name } => name.clone(),
        SyntaxNode::AtKeyword { name } => format!("@{name}"),
        SyntaxNode::Function { name, children } => enclosed(&format!("{name}("), children, options),
        SyntaxNode::Parentheses { children } => enclosed("(", children, options),
        SyntaxNode::Token { value } | SyntaxNode::String { value } => value.clone(),
        SyntaxNode::Comma => ",".to_string(),
    };

    decorate(text, node, options)
}

fn decorate(text: String, node: &SyntaxNode, options: &GenerateSyntaxOptions<'_>) -> String {
    match options.decorate {
        Some(decorate) => decorate(text, node),
        None => text,
    }
}

fn sequence(node: &SyntaxNode, braces: bool, options: &GenerateSyntaxOptions<'_>) -> String {
    let SyntaxNode::Group { combinator, terms, .. } = node else {
        return generate(node, options);
    };

    let separator = match combinator {
        Combinator::Juxtapose => " ".to_string(),
        other => format!(" {} ", other.as_str()),
    };
    let inner = terms
        .iter()
        .map(|term| generate(term, options))
        .collect::<Vec<_>>()
        .join(&separator);

    if !braces {
        return inner;
    }

    if matches!(terms.first(), Some(SyntaxNode::Comma)) {
        format!("[{inner} ]")
    } else {
        format!("[ {inner} ]")
    }
}

// the group inside `fn( ... )` or `( ... )` is printed without brackets
fn enclosed(open: &str, children: &SyntaxNode, options: &GenerateSyntaxOptions<'_>) -> String {
    let inner = sequence(children, false, options);

    if inner.is_empty() {
        format!("{open})")
    } else {
        format!("{open} {inner} )")
    }
}

fn multiplier(node: &SyntaxNode) -> String {
    let SyntaxNode::Multiplier { min, max, comma, .. } = node else {
        return String::new();
    };

    match (*min, *max, *comma) {
        (0, None, false) => "*".to_string(),
        (0, None, true) => "#?".to_string(),
        (0, Some(1), false) => "?".to_string(),
        (1, None, false) => "+".to_string(),
        (1, None, true) => "#".to_string(),
        (1, Some(1), false) => String::new(),
        (min, max, comma) => {
            let prefix = if comma { "#" } else { "" };
            match max {
                Some(max) if max == min => format!("{prefix}{{{min}}}"),
                Some(max) => format!("{prefix}{{{min},{max}}}"),
                None => format!("{prefix}{{{min},}}"),
            }
        }
    }
}

fn range_text(range: &Range) -> String {
    let min = range.min.map_or_else(|| "-\u{221E}".to_string(), |min| min.to_string());
    let max = range.max.map_or_else(|| "\u{221E}".to_string(), |max| max.to_string());
    format!("[{min},{max}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition_syntax::parse;

    fn canonical(source: &str) -> String {
        generate(&parse(source).unwrap(), &GenerateSyntaxOptions::default())
    }

    #[test]
    fn multipliers_are_canonical() {
        let cases = [
            ("<number>", "<number>"),
            ("<number>*", "<number>*"),
            ("<number>?", "<number>?"),
            ("<number>+", "<number>+"),
            ("<number>#", "<number>#"),
            ("<number>#?", "<number>#?"),
            ("<number>#{2,3}", "<number>#{2,3}"),
            ("<number>{2}", "<number>{2}"),
            ("<number>{2,}", "<number>{2,}"),
            ("<number>{0,}", "<number>*"),
            ("<number>{1,}", "<number>+"),
            ("<number>{2,2}", "<number>{2}"),
            ("<number>{1}", "<number>"),
            ("<number>+#", "<number>+#"),
            ("[ <number> ]#{1,2}", "[ <number> ]#{1,2}"),
            ("[ <number> ]!", "[ <number> ]!"),
            ("[ <number> ]!{1,2}", "[ <number> ]!{1,2}"),
        ];

        for (source, expected) in cases {
            assert_eq!(canonical(source), expected, "{source}");
        }
    }

    #[test]
    fn ranges() {
        assert_eq!(canonical("<number [1,2]>"), "<number [1,2]>");
        assert_eq!(canonical("<number [-\u{221E},2]>"), "<number [-\u{221E},2]>");
        assert_eq!(canonical("<number [-\u{221E},\u{221E}]>"), "<number>");
        assert_eq!(canonical("<number[1,2]>"), "<number [1,2]>");
        assert_eq!(canonical("<number [1 , 2]>"), "<number [1,2]>");
    }

    #[test]
    fn functions_and_tokens() {
        assert_eq!(canonical("rgb(  <number>#{3}  )"), "rgb( <number>#{3} )");
        assert_eq!(canonical("fn()"), "fn()");
        assert_eq!(canonical("[ , <a> ]"), "[, <a> ]");
        assert_eq!(canonical("<a> / <b> '%' @media"), "<a> / <b> '%' @media");
    }

    #[test]
    fn force_braces_brackets_every_group() {
        let ast = parse("a b   |   c ||   d &&   e f").unwrap();
        let options = GenerateSyntaxOptions {
            force_braces: true,
            ..Default::default()
        };

        assert_eq!(generate(&ast, &options), "[ [ a b ] | [ c || [ d && [ e f ] ] ] ]");
    }

    #[test]
    fn decorate_wraps_fragments() {
        let ast = parse("<foo> && <bar>+").unwrap();
        let decorate = |text: String, node: &SyntaxNode| match node {
            SyntaxNode::Type { .. } => format!("{{{text}}}"),
            SyntaxNode::Group { .. } => format!("*{text}*"),
            SyntaxNode::Multiplier { .. } => format!("({text})"),
            _ => text,
        };
        let options = GenerateSyntaxOptions {
            decorate: Some(&decorate),
            ..Default::default()
        };

        assert_eq!(generate(&ast, &options), "*{<foo>} && {<bar>}(+)*");
    }

    #[test]
    fn generated_text_parses_back_to_the_same_tree() {
        let sources = [
            "[ <length> | <percentage> ]{1,4} && <'margin'>?",
            "<color> || [ a b ]! || c( <x>#, 'y' )",
            "( <integer [0,\u{221E}]> ) | @rule | <rgb()>",
            "[ [ a | b ] c ]*",
        ];

        for source in sources {
            let ast = parse(source).unwrap();
            let text = generate(&ast, &GenerateSyntaxOptions::default());
            assert_eq!(parse(&text).unwrap(), ast, "{source} -> {text}");
        }
    }
}
