//! Generic sequences of component values and verbatim Raw regions.

use crate::ast::{Combinator, Node, Raw, WhiteSpace};
use crate::list::List;
use crate::tokenizer::{StopAction, TokenType};

use super::state::{PResult, Parser};

const EXCLAMATION_MARK: u32 = 0x0021;
const NUMBER_SIGN: u32 = 0x0023;
const ASTERISK: u32 = 0x002A;
const PLUS_SIGN: u32 = 0x002B;
const HYPHEN_MINUS: u32 = 0x002D;
const FULL_STOP: u32 = 0x002E;
const SOLIDUS: u32 = 0x002F;
const GREATER_THAN_SIGN: u32 = 0x003E;
const VERTICAL_LINE: u32 = 0x007C;
const TILDE: u32 = 0x007E;
const SEMICOLON: u32 = 0x003B;
const LEFT_CURLY_BRACKET: u32 = 0x007B;

/// Where a Raw region ends, besides the end of its enclosing block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawMode {
    Default,
    /// Before `{`.
    LeftCurlyBracket,
    /// Before `{` or `;`.
    LeftCurlyBracketOrSemicolon,
    /// Before `!` or `;`.
    ExclamationMarkOrSemicolon,
    /// After `;`.
    SemicolonIncluded,
}

impl RawMode {
    fn stop(self, code: u32) -> StopAction {
        let stop = match self {
            RawMode::Default => false,
            RawMode::LeftCurlyBracket => code == LEFT_CURLY_BRACKET,
            RawMode::LeftCurlyBracketOrSemicolon => code == LEFT_CURLY_BRACKET || code == SEMICOLON,
            RawMode::ExclamationMarkOrSemicolon => code == EXCLAMATION_MARK || code == SEMICOLON,
            RawMode::SemicolonIncluded => {
                return if code == SEMICOLON {
                    StopAction::StopIncluding
                } else {
                    StopAction::Continue
                };
            }
        };

        if stop { StopAction::Stop } else { StopAction::Continue }
    }
}

/// Which recognizer [`Parser::read_sequence`] dispatches tokens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Value,
    Selector,
    AtrulePrelude,
}

/// State shared between the sequence loop and a recognizer.
#[derive(Debug, Default)]
pub(crate) struct SequenceState {
    pub space: Option<Node>,
    pub ignore_ws_after: bool,
}

impl Parser<'_, '_, '_> {
    /// Verbatim source from `start_token` up to where `mode` stops, never
    /// leaving the block that encloses the start token.
    pub fn raw(&mut self, start_token: usize, mode: RawMode, exclude_ws: bool) -> Node {
        let start = self.stream.get_token_start(start_token);

        self.stream
            .skip_until_balanced(start_token, |_, code| mode.stop(code));

        let end = if exclude_ws && self.stream.token_start > start {
            self.offset_excluding_ws()
        } else {
            self.stream.token_start
        };

        Node::Raw(Raw {
            loc: self.location(start, end),
            value: self.stream.substring(start, end).to_string(),
        })
    }

    fn offset_excluding_ws(&self) -> usize {
        let index = self.stream.token_index;

        if index > 0 && self.stream.lookup_type(-1) == TokenType::WhiteSpace {
            return if index > 1 {
                self.stream.get_token_start(index - 1)
            } else {
                self.stream.first_char_offset()
            };
        }

        self.stream.token_start
    }

    pub fn white_space(&mut self) -> PResult<Node> {
        self.eat(TokenType::WhiteSpace)?;

        Ok(Node::WhiteSpace(WhiteSpace {
            loc: None,
            value: " ".to_string(),
        }))
    }

    /// Read nodes until the recognizer for `scope` gives up.
    ///
    /// Comments are dropped. Whitespace between two nodes becomes a
    /// WhiteSpace node in values and a descendant Combinator in selectors;
    /// whitespace after a comma is dropped.
    pub fn read_sequence(&mut self, scope: Scope) -> PResult<List<Node>> {
        let mut children = List::new();
        let mut state = SequenceState::default();
        let mut ignore_ws = false;

        self.stream.skip_sc();

        while !self.stream.eof {
            match self.stream.token_type {
                TokenType::Comment => {
                    self.stream.next();
                    continue;
                }
                TokenType::WhiteSpace => {
                    if ignore_ws {
                        self.stream.next();
                    } else {
                        state.space = Some(self.white_space()?);
                    }
                    continue;
                }
                _ => {}
            }

            state.ignore_ws_after = false;

            let child = match scope {
                Scope::Selector => self.selector_node()?,
                Scope::Value | Scope::AtrulePrelude => self.value_node(scope, &mut state)?,
            };

            let Some(child) = child else {
                break;
            };

            if let Some(space) = state.space.take() {
                match scope {
                    Scope::Selector => {
                        let around_combinator = matches!(children.last(), Some(Node::Combinator(_)))
                            || matches!(child, Node::Combinator(_));
                        if !around_combinator {
                            children.push(Node::Combinator(Combinator {
                                loc: None,
                                name: " ".to_string(),
                            }));
                        }
                    }
                    Scope::Value | Scope::AtrulePrelude => {
                        children.push(space);
                    }
                }
            }

            ignore_ws = state.ignore_ws_after;
            children.push(child);
        }

        Ok(children)
    }

    fn selector_node(&mut self) -> PResult<Option<Node>> {
        let node = match self.stream.token_type {
            TokenType::LeftSquareBracket => self.attribute_selector()?,
            TokenType::Hash => self.id_selector()?,
            TokenType::Colon => {
                if self.stream.lookup_type(1) == TokenType::Colon {
                    self.pseudo_element_selector()?
                } else {
                    self.pseudo_class_selector()?
                }
            }
            TokenType::Ident => self.type_selector()?,
            TokenType::Number | TokenType::Percentage => self.percentage()?,
            TokenType::Dimension => {
                if self.stream.char_code_at(self.stream.token_start) == FULL_STOP {
                    return Err(self.error("Identifier is expected", Some(self.stream.token_start + 1)));
                }
                return Ok(None);
            }
            TokenType::Delim => match self.stream.char_code_at(self.stream.token_start) {
                PLUS_SIGN | GREATER_THAN_SIGN | TILDE | SOLIDUS => self.combinator()?,
                FULL_STOP => self.class_selector()?,
                ASTERISK | VERTICAL_LINE => self.type_selector()?,
                NUMBER_SIGN => self.id_selector()?,
                _ => return Ok(None),
            },
            _ => return Ok(None),
        };

        Ok(Some(node))
    }

    fn value_node(&mut self, scope: Scope, state: &mut SequenceState) -> PResult<Option<Node>> {
        let node = match self.stream.token_type {
            TokenType::Hash => self.hash()?,
            TokenType::Comma => {
                state.space = None;
                state.ignore_ws_after = true;
                self.operator()?
            }
            TokenType::LeftParenthesis => self.parentheses(scope)?,
            TokenType::LeftSquareBracket => self.brackets(scope)?,
            TokenType::String => self.string()?,
            TokenType::Dimension => self.dimension()?,
            TokenType::Percentage => self.percentage()?,
            TokenType::Number => self.number()?,
            TokenType::Function => {
                if self
                    .stream
                    .cmp_str(self.stream.token_start, self.stream.token_end, "url(")
                {
                    self.url()?
                } else {
                    self.function(scope)?
                }
            }
            TokenType::Url => self.url()?,
            TokenType::Ident => {
                let start = self.stream.token_start;
                if self.stream.cmp_char(start, 'u' as u32)
                    && self.stream.cmp_char(start + 1, PLUS_SIGN)
                {
                    self.unicode_range()?
                } else {
                    self.identifier()?
                }
            }
            TokenType::Delim => match self.stream.char_code_at(self.stream.token_start) {
                SOLIDUS | ASTERISK | PLUS_SIGN | HYPHEN_MINUS => self.operator()?,
                NUMBER_SIGN => {
                    return Err(self.error(
                        "Hex or identifier is expected",
                        Some(self.stream.token_start + 1),
                    ));
                }
                _ => return Ok(None),
            },
            _ => return Ok(None),
        };

        Ok(Some(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParseHooks, ParseOptions};
    use crate::tokenizer::TokenStream;

    fn with_parser<T>(source: &str, f: impl FnOnce(&mut Parser<'_, '_, '_>) -> T) -> T {
        let options = ParseOptions::new();
        let mut hooks = ParseHooks::new();
        let mut parser = Parser::new(TokenStream::new(source), &options, &mut hooks);
        f(&mut parser)
    }

    fn kinds(list: &List<Node>) -> Vec<&'static str> {
        list.iter().map(Node::kind).collect()
    }

    #[test]
    fn raw_stops_at_requested_token() {
        with_parser("a b ; c", |parser| {
            let raw = parser.raw(0, RawMode::ExclamationMarkOrSemicolon, true);
            assert_eq!(raw, Node::raw("a b"));
            assert_eq!(parser.stream.token_type, TokenType::Semicolon);
        });

        with_parser("a b ; c", |parser| {
            let raw = parser.raw(0, RawMode::SemicolonIncluded, false);
            assert_eq!(raw, Node::raw("a b ;"));
        });
    }

    #[test]
    fn raw_skips_balanced_blocks() {
        with_parser("a(;) ; b", |parser| {
            let raw = parser.raw(0, RawMode::LeftCurlyBracketOrSemicolon, false);
            assert_eq!(raw, Node::raw("a(;) "));
        });
    }

    #[test]
    fn raw_does_not_leave_enclosing_block() {
        with_parser("(a b) c", |parser| {
            parser.stream.next();
            let raw = parser.raw(1, RawMode::Default, false);
            assert_eq!(raw, Node::raw("a b"));
            assert_eq!(parser.stream.token_type, TokenType::RightParenthesis);
        });
    }

    #[test]
    fn value_sequence_keeps_single_spaces() {
        with_parser(" a /**/ 1px ,  b", |parser| {
            let children = parser.read_sequence(Scope::Value).unwrap();
            assert_eq!(
                kinds(&children),
                ["Identifier", "WhiteSpace", "Dimension", "Operator", "Identifier"]
            );
        });
    }

    #[test]
    fn selector_sequence_turns_spaces_into_combinators() {
        with_parser("a  .b > c", |parser| {
            let children = parser.read_sequence(Scope::Selector).unwrap();
            let names: Vec<_> = children
                .iter()
                .filter_map(|node| match node {
                    Node::Combinator(combinator) => Some(combinator.name.as_str()),
                    _ => None,
                })
                .collect();

            assert_eq!(
                kinds(&children),
                ["TypeSelector", "Combinator", "ClassSelector", "Combinator", "TypeSelector"]
            );
            assert_eq!(names, [" ", ">"]);
        });
    }

    #[test]
    fn sequence_stops_at_unknown_token() {
        with_parser("a b;c", |parser| {
            let children = parser.read_sequence(Scope::Value).unwrap();
            assert_eq!(children.len(), 3);
            assert_eq!(parser.stream.token_type, TokenType::Semicolon);
        });
    }

    #[test]
    fn dimension_in_selector_reports_missing_identifier() {
        with_parser(".5a", |parser| {
            let error = parser.read_sequence(Scope::Selector).unwrap_err();
            assert_eq!(error.message, "Identifier is expected");
            assert_eq!(error.offset, 1);
        });
    }
}
