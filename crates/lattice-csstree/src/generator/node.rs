//! Per-kind token emission.

use crate::ast::{AnPlusB, Important, Node};
use crate::escape::{encode_string, encode_url};
use crate::tokenizer::TokenType;

use super::Generator;

impl Generator<'_> {
    pub(super) fn generate_node(&mut self, node: &Node) {
        match node {
            Node::StyleSheet(node) => self.each(&node.children),
            Node::Rule(node) => {
                self.node(&node.prelude);
                self.node(&node.block);
            }
            Node::Atrule(node) => {
                self.token(TokenType::AtKeyword, &format!("@{}", node.name));
                if let Some(prelude) = node.prelude.as_deref() {
                    self.token(TokenType::WhiteSpace, " ");
                    self.node(prelude);
                }
                match node.block.as_deref() {
                    Some(block) => self.node(block),
                    None => self.token(TokenType::Semicolon, ";"),
                }
            }
            Node::AtrulePrelude(node) => self.each(&node.children),
            Node::Block(node) => {
                self.token(TokenType::LeftCurlyBracket, "{");
                self.children(&node.children, Self::semicolon_after_declaration);
                self.token(TokenType::RightCurlyBracket, "}");
            }
            Node::Declaration(node) => {
                self.token(TokenType::Ident, &node.property);
                self.token(TokenType::Colon, ":");
                self.node(&node.value);

                match &node.important {
                    Important::Flag(false) => {}
                    Important::Flag(true) => {
                        self.token(TokenType::Delim, "!");
                        self.token(TokenType::Ident, "important");
                    }
                    Important::Hack(hack) => {
                        self.token(TokenType::Delim, "!");
                        self.token(TokenType::Ident, hack);
                    }
                }
            }
            Node::DeclarationList(node) => {
                self.children(&node.children, Self::semicolon_after_declaration);
            }
            Node::Raw(node) => self.tokenize(&node.value),
            Node::Cdo(_) => self.token(TokenType::Cdo, "<!--"),
            Node::Cdc(_) => self.token(TokenType::Cdc, "-->"),
            Node::Comment(node) => self.token(TokenType::Comment, &format!("/*{}*/", node.value)),

            Node::SelectorList(node) => self.children(&node.children, Self::comma),
            Node::Selector(node) => self.each(&node.children),
            Node::TypeSelector(node) => self.tokenize(&node.name),
            Node::ClassSelector(node) => {
                self.token(TokenType::Delim, ".");
                self.token(TokenType::Ident, &node.name);
            }
            Node::IdSelector(node) => self.token(TokenType::Delim, &format!("#{}", node.name)),
            Node::AttributeSelector(node) => {
                self.token(TokenType::LeftSquareBracket, "[");
                self.node(&node.name);
                if let Some(matcher) = node.matcher.as_deref() {
                    self.tokenize(matcher);
                    if let Some(value) = node.value.as_deref() {
                        self.node(value);
                    }
                }
                if let Some(flags) = node.flags.as_deref() {
                    self.token(TokenType::Ident, flags);
                }
                self.token(TokenType::RightSquareBracket, "]");
            }
            Node::PseudoClassSelector(node) => {
                self.token(TokenType::Colon, ":");
                self.pseudo(&node.name, node.children.as_ref());
            }
            Node::PseudoElementSelector(node) => {
                self.token(TokenType::Colon, ":");
                self.token(TokenType::Colon, ":");
                self.pseudo(&node.name, node.children.as_ref());
            }
            Node::Combinator(node) => self.tokenize(&node.name),
            Node::Nth(node) => {
                self.node(&node.nth);
                if let Some(selector) = node.selector.as_deref() {
                    self.token(TokenType::Ident, "of");
                    self.node(selector);
                }
            }
            Node::AnPlusB(node) => self.tokenize(&an_plus_b_text(node)),

            Node::Value(node) => self.each(&node.children),
            Node::Function(node) => {
                self.token(TokenType::Function, &format!("{}(", node.name));
                self.each(&node.children);
                self.token(TokenType::RightParenthesis, ")");
            }
            Node::Parentheses(node) => {
                self.token(TokenType::LeftParenthesis, "(");
                self.each(&node.children);
                self.token(TokenType::RightParenthesis, ")");
            }
            Node::Brackets(node) => {
                self.token(TokenType::LeftSquareBracket, "[");
                self.each(&node.children);
                self.token(TokenType::RightSquareBracket, "]");
            }
            Node::Dimension(node) => {
                self.token(TokenType::Dimension, &format!("{}{}", node.value, node.unit));
            }
            Node::Number(node) => self.token(TokenType::Number, &node.value),
            Node::Percentage(node) => self.token(TokenType::Percentage, &format!("{}%", node.value)),
            Node::Hash(node) => self.token(TokenType::Hash, &format!("#{}", node.value)),
            Node::String(node) => self.token(TokenType::String, &encode_string(&node.value)),
            Node::Url(node) => self.token(TokenType::Url, &encode_url(&node.value)),
            Node::Identifier(node) => self.token(TokenType::Ident, &node.name),
            Node::Operator(node) => self.tokenize(&node.value),
            Node::WhiteSpace(node) => self.token(TokenType::WhiteSpace, &node.value),
            Node::UnicodeRange(node) => self.tokenize(&node.value),

            Node::MediaQueryList(node) => self.children(&node.children, Self::comma),
            Node::MediaQuery(node) => self.each(&node.children),
            Node::MediaFeature(node) => {
                self.token(TokenType::LeftParenthesis, "(");
                self.token(TokenType::Ident, &node.name);
                if let Some(value) = node.value.as_deref() {
                    self.token(TokenType::Colon, ":");
                    self.node(value);
                }
                self.token(TokenType::RightParenthesis, ")");
            }
            Node::Ratio(node) => {
                self.token(TokenType::Number, &node.left);
                self.token(TokenType::Delim, "/");
                self.token(TokenType::Number, &node.right);
            }
        }
    }

    fn pseudo(&mut self, name: &str, children: Option<&crate::list::List<Node>>) {
        match children {
            None => self.token(TokenType::Ident, name),
            Some(children) => {
                self.token(TokenType::Function, &format!("{name}("));
                self.each(children);
                self.token(TokenType::RightParenthesis, ")");
            }
        }
    }

    fn semicolon_after_declaration(&mut self, prev: &Node) {
        if matches!(prev, Node::Declaration(_)) {
            self.token(TokenType::Semicolon, ";");
        }
    }

    fn comma(&mut self, _prev: &Node) {
        self.token(TokenType::Comma, ",");
    }
}

/// Canonical `An+B` text: `n` for a coefficient of one, an explicit sign
/// on the offset.
fn an_plus_b_text(node: &AnPlusB) -> String {
    let Some(a) = node.a.as_deref() else {
        return node.b.clone().unwrap_or_default();
    };

    let mut text = match a {
        "+1" | "1" => "n".to_string(),
        "-1" => "-n".to_string(),
        _ => format!("{a}n"),
    };

    if let Some(b) = node.b.as_deref() {
        if !b.starts_with(['-', '+']) {
            text.push('+');
        }
        text.push_str(b);
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn an_plus_b(a: Option<&str>, b: Option<&str>) -> String {
        an_plus_b_text(&AnPlusB {
            loc: None,
            a: a.map(str::to_string),
            b: b.map(str::to_string),
        })
    }

    #[test]
    fn an_plus_b_canonical_forms() {
        assert_eq!(an_plus_b(Some("1"), None), "n");
        assert_eq!(an_plus_b(Some("-1"), Some("2")), "-n+2");
        assert_eq!(an_plus_b(Some("2"), Some("-1")), "2n-1");
        assert_eq!(an_plus_b(Some("0"), Some("+3")), "0n+3");
        assert_eq!(an_plus_b(None, Some("-5")), "-5");
        assert_eq!(an_plus_b(None, None), "");
    }

    #[test]
    fn nodes_built_by_hand_generate() {
        use crate::ast::{Dimension, Function, MediaFeature, Ratio};
        use crate::generator::generate;
        use crate::list::List;

        let function = Node::Function(Function {
            loc: None,
            name: "rgb".into(),
            children: List::from_vec(vec![
                Node::number("1"),
                Node::operator(","),
                Node::number("2"),
            ]),
        });
        assert_eq!(generate(&function), "rgb(1,2)");

        let feature = Node::MediaFeature(MediaFeature {
            loc: None,
            name: "aspect-ratio".into(),
            value: Some(Box::new(Node::Ratio(Ratio {
                loc: None,
                left: "16".into(),
                right: "9".into(),
            }))),
        });
        assert_eq!(generate(&feature), "(aspect-ratio:16/9)");

        let dimensions = Node::value(List::from_vec(vec![
            Node::Dimension(Dimension {
                loc: None,
                value: "1".into(),
                unit: "px".into(),
            }),
            Node::identifier("auto"),
        ]));
        assert_eq!(generate(&dimensions), "1px auto");
    }
}
