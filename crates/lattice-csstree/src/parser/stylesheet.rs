//! Stylesheet, rule, block and declaration productions.

use crate::ast::{Block, Cdc, Cdo, Comment, Declaration, DeclarationList, Important, Node, Rule, StyleSheet};
use crate::list::List;
use crate::tokenizer::TokenType;

use super::sequence::RawMode;
use super::state::{PResult, Parser};

const EXCLAMATION_MARK: u32 = 0x0021;
const NUMBER_SIGN: u32 = 0x0023;
const DOLLAR_SIGN: u32 = 0x0024;
const AMPERSAND: u32 = 0x0026;
const ASTERISK: u32 = 0x002A;
const PLUS_SIGN: u32 = 0x002B;
const SOLIDUS: u32 = 0x002F;

fn is_custom_property(name: &str) -> bool {
    name.starts_with("--")
}

impl Parser<'_, '_, '_> {
    /// Top level: rules, at-rules, `<!--`/`-->` and `/*! */` comments.
    pub fn style_sheet(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        let mut children = List::new();

        while !self.stream.eof {
            let child = match self.stream.token_type {
                TokenType::WhiteSpace => {
                    self.stream.next();
                    continue;
                }
                TokenType::Comment => {
                    if self.stream.char_code_at(self.stream.token_start + 2) != EXCLAMATION_MARK {
                        self.stream.next();
                        continue;
                    }
                    self.comment()?
                }
                TokenType::Cdo => {
                    let start = self.stream.token_start;
                    self.stream.next();
                    Node::Cdo(Cdo {
                        loc: self.location(start, self.stream.token_start),
                    })
                }
                TokenType::Cdc => {
                    let start = self.stream.token_start;
                    self.stream.next();
                    Node::Cdc(Cdc {
                        loc: self.location(start, self.stream.token_start),
                    })
                }
                TokenType::AtKeyword => self.parse_with_fallback(Self::atrule, |parser, start| {
                    parser.raw(start, RawMode::Default, false)
                })?,
                _ => self.parse_with_fallback(Self::rule, |parser, start| {
                    parser.raw(start, RawMode::Default, false)
                })?,
            };

            children.push(child);
        }

        Ok(Node::StyleSheet(StyleSheet {
            loc: self.location(start, self.stream.token_start),
            children,
        }))
    }

    pub fn comment(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        let mut end = self.stream.token_end;

        self.eat(TokenType::Comment)?;

        if end - start >= 4 && self.stream.substring(end - 2, end) == "*/" {
            end -= 2;
        }

        Ok(Node::Comment(Comment {
            loc: self.location(start, self.stream.token_start),
            value: self.stream.substring(start + 2, end).to_string(),
        }))
    }

    /// A qualified rule: selector list prelude and a declaration block.
    pub fn rule(&mut self) -> PResult<Node> {
        let start_token = self.stream.token_index;
        let start = self.stream.token_start;

        let prelude = if self.options.parse_rule_prelude {
            self.parse_with_fallback(Self::rule_prelude, |parser, start| {
                parser.raw(start, RawMode::LeftCurlyBracket, true)
            })?
        } else {
            self.raw(start_token, RawMode::LeftCurlyBracket, true)
        };

        let block = self.block(true)?;

        Ok(Node::Rule(Rule {
            loc: self.location(start, self.stream.token_start),
            prelude: Box::new(prelude),
            block: Box::new(block),
        }))
    }

    fn rule_prelude(&mut self) -> PResult<Node> {
        let prelude = self.selector_list()?;

        if !self.stream.eof && self.stream.token_type != TokenType::LeftCurlyBracket {
            return Err(self.error("Unexpected input", None));
        }

        Ok(prelude)
    }

    /// `{ ... }` holding either declarations or rules, plus at-rules.
    pub fn block(&mut self, declarations: bool) -> PResult<Node> {
        let start = self.stream.token_start;
        let mut children = List::new();

        self.eat(TokenType::LeftCurlyBracket)?;

        while !self.stream.eof {
            let child = match self.stream.token_type {
                TokenType::RightCurlyBracket => break,
                TokenType::WhiteSpace | TokenType::Comment => {
                    self.stream.next();
                    continue;
                }
                TokenType::AtKeyword => self.parse_with_fallback(
                    |parser| parser.atrule_in(declarations),
                    |parser, start| parser.raw(start, RawMode::Default, true),
                )?,
                _ if declarations => self.block_declaration()?,
                _ => self.parse_with_fallback(Self::rule, |parser, start| {
                    parser.raw(start, RawMode::Default, true)
                })?,
            };

            children.push(child);
        }

        if !self.stream.eof {
            self.eat(TokenType::RightCurlyBracket)?;
        }

        Ok(Node::Block(Block {
            loc: self.location(start, self.stream.token_start),
            children,
        }))
    }

    fn block_declaration(&mut self) -> PResult<Node> {
        if self.stream.token_type == TokenType::Semicolon {
            let start = self.stream.token_index;
            return Ok(self.raw(start, RawMode::SemicolonIncluded, true));
        }

        let node = self.parse_with_fallback(Self::declaration, |parser, start| {
            parser.raw(start, RawMode::SemicolonIncluded, true)
        })?;

        if self.stream.token_type == TokenType::Semicolon {
            self.stream.next();
        }

        Ok(node)
    }

    /// Declarations without surrounding braces, as found in a `style`
    /// attribute.
    pub fn declaration_list(&mut self) -> PResult<Node> {
        let mut children = List::new();

        while !self.stream.eof {
            let child = match self.stream.token_type {
                TokenType::WhiteSpace | TokenType::Comment | TokenType::Semicolon => {
                    self.stream.next();
                    continue;
                }
                TokenType::AtKeyword => self.parse_with_fallback(
                    |parser| parser.atrule_in(true),
                    |parser, start| parser.raw(start, RawMode::SemicolonIncluded, true),
                )?,
                _ => self.parse_with_fallback(Self::declaration, |parser, start| {
                    parser.raw(start, RawMode::SemicolonIncluded, true)
                })?,
            };

            children.push(child);
        }

        Ok(Node::DeclarationList(DeclarationList {
            loc: self.location_from_list(&children),
            children,
        }))
    }

    // Property name, accepting the `*zoom`, `_color` style hacks.
    fn property_name(&mut self) -> PResult<String> {
        let start = self.stream.token_start;

        if self.stream.token_type == TokenType::Delim {
            match self.stream.char_code_at(start) {
                ASTERISK | DOLLAR_SIGN | PLUS_SIGN | NUMBER_SIGN | AMPERSAND => self.stream.next(),
                SOLIDUS => {
                    self.stream.next();
                    if self.stream.is_delim(SOLIDUS, 0) {
                        self.stream.next();
                    }
                }
                _ => {}
            }
        }

        if self.stream.token_type == TokenType::Hash {
            self.eat(TokenType::Hash)?;
        } else {
            self.eat(TokenType::Ident)?;
        }

        Ok(self.stream.substr_to_cursor(start).to_string())
    }

    fn declaration_value(&mut self) -> PResult<Node> {
        let start_token = self.stream.token_index;
        let value = self.value()?;

        if !matches!(value, Node::Raw(_))
            && !self.stream.eof
            && self.stream.token_type != TokenType::Semicolon
            && !self.stream.is_delim(EXCLAMATION_MARK, 0)
            && !self.stream.is_balance_edge(start_token)
        {
            return Err(self.error("Unexpected input", None));
        }

        Ok(value)
    }

    // `!` ws* important, keeping other words as the `!ie` hack
    fn important(&mut self) -> PResult<Important> {
        self.eat(TokenType::Delim)?;
        self.stream.skip_sc();
        let word = self.consume(TokenType::Ident)?;

        Ok(if word == "important" {
            Important::Flag(true)
        } else {
            Important::Hack(word.to_string())
        })
    }

    /// `property: value !important`, without the trailing semicolon.
    pub fn declaration(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        let start_token = self.stream.token_index;

        let property = self.property_name()?;
        let custom = is_custom_property(&property);
        let parse_value = if custom {
            self.options.parse_custom_property
        } else {
            self.options.parse_value
        };
        let raw_exclude_ws = !custom;

        self.stream.skip_sc();
        self.eat(TokenType::Colon)?;

        let value_start = self.stream.token_index;
        if !custom {
            self.stream.skip_sc();
        }

        let mut value = if parse_value {
            self.parse_with_fallback(Self::declaration_value, |parser, start| {
                parser.raw(start, RawMode::ExclamationMarkOrSemicolon, raw_exclude_ws)
            })?
        } else {
            let start_token = self.stream.token_index;
            self.raw(start_token, RawMode::ExclamationMarkOrSemicolon, raw_exclude_ws)
        };

        if custom {
            self.keep_single_space(&mut value, value_start);
        }

        let mut important = Important::default();
        if self.stream.is_delim(EXCLAMATION_MARK, 0) {
            important = self.important()?;
            self.stream.skip_sc();
        }

        if !self.stream.eof
            && self.stream.token_type != TokenType::Semicolon
            && !self.stream.is_balance_edge(start_token)
        {
            return Err(self.error("Unexpected input", None));
        }

        Ok(Node::Declaration(Declaration {
            loc: self.location(start, self.stream.token_start),
            important,
            property,
            value: Box::new(value),
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Important, Node};
    use crate::parser::{parse, parse_with_hooks, Context, ParseHooks, ParseOptions};

    fn stylesheet(source: &str) -> Node {
        parse(source, &ParseOptions::new()).unwrap()
    }

    fn declaration(source: &str) -> crate::ast::Declaration {
        match parse(source, &ParseOptions::new().context(Context::Declaration)).unwrap() {
            Node::Declaration(declaration) => declaration,
            other => panic!("unexpected {other:?}"),
        }
    }

    fn kinds(node: &Node) -> Vec<&'static str> {
        node.children()
            .map(|list| list.iter().map(Node::kind).collect())
            .unwrap_or_default()
    }

    #[test]
    fn top_level_items() {
        let node = stylesheet("<!-- /*! keep */ /* drop */ @import 'a'; a{} -->");
        assert_eq!(kinds(&node), ["CDO", "Comment", "Atrule", "Rule", "CDC"]);
    }

    #[test]
    fn important_flag_and_hack() {
        assert_eq!(declaration("color: red !important").important, Important::Flag(true));
        assert_eq!(declaration("color: red ! ie").important, Important::Hack("ie".into()));
        assert_eq!(declaration("color: red").important, Important::Flag(false));
    }

    #[test]
    fn property_hacks() {
        assert_eq!(declaration("*zoom: 1").property, "*zoom");
        assert_eq!(declaration("//color: red").property, "//color");
    }

    #[test]
    fn custom_property_values() {
        let raw = declaration("--x: { a: b } ");
        assert_eq!(*raw.value, Node::raw(" { a: b } "));

        let options = ParseOptions::new()
            .context(Context::Declaration)
            .parse_custom_property(true);
        let parsed = match parse("--x: ", &options).unwrap() {
            Node::Declaration(declaration) => declaration,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(kinds(&parsed.value), ["WhiteSpace"]);
    }

    #[test]
    fn block_recovers_bad_declarations() {
        let mut messages = Vec::new();
        let mut hooks = ParseHooks::new().on_parse_error(|error, _| {
            messages.push(error.message.clone());
            Ok(())
        });

        let node = parse_with_hooks("a { color: red red) ; ; top: 0 }", &ParseOptions::new(), &mut hooks)
            .unwrap();
        drop(hooks);

        let rule = node.children().unwrap().first().cloned().unwrap();
        let Node::Rule(rule) = rule else {
            panic!("expected rule");
        };
        assert_eq!(kinds(&rule.block), ["Declaration", "Raw", "Declaration"]);
        assert_eq!(messages, ["Unexpected input"]);
    }

    #[test]
    fn bad_selector_becomes_raw_prelude() {
        let node = stylesheet("a!b { color: red }");
        let Some(Node::Rule(rule)) = node.children().unwrap().first() else {
            panic!("expected rule");
        };
        assert_eq!(*rule.prelude, Node::raw("a!b"));
        assert_eq!(kinds(&rule.block), ["Declaration"]);
    }

    #[test]
    fn nested_atrules_in_declaration_blocks() {
        let node = stylesheet("a { color: red; @media print { color: blue } }");
        let Some(Node::Rule(rule)) = node.children().unwrap().first() else {
            panic!("expected rule");
        };
        assert_eq!(kinds(&rule.block), ["Declaration", "Atrule"]);

        let Some(Node::Atrule(atrule)) = rule.block.children().and_then(|list| list.last()) else {
            panic!("expected at-rule");
        };
        assert_eq!(kinds(atrule.block.as_deref().unwrap()), ["Declaration"]);
    }

    #[test]
    fn declaration_list_context() {
        let node = parse(
            "color: red;; margin: 0 auto;",
            &ParseOptions::new().context(Context::DeclarationList),
        )
        .unwrap();
        assert_eq!(kinds(&node), ["Declaration", "Declaration"]);
    }
}
