//! At-rules and their name-specific preludes and blocks.

use crate::ast::{Atrule, AtrulePrelude, Node};
use crate::list::List;
use crate::tokenizer::TokenType;

use super::sequence::{RawMode, Scope};
use super::state::{PResult, Parser};

impl Parser<'_, '_, '_> {
    /// An at-rule outside of a declaration block.
    pub fn atrule(&mut self) -> PResult<Node> {
        self.atrule_in(false)
    }

    /// An at-rule; `in_style_block` is set when it is nested among
    /// declarations, which nested conditional rules inherit.
    pub fn atrule_in(&mut self, in_style_block: bool) -> PResult<Node> {
        let start = self.stream.token_start;

        self.eat(TokenType::AtKeyword)?;
        let name = self.stream.substr_to_cursor(start + 1).to_string();
        let lower_name = name.to_ascii_lowercase();
        self.stream.skip_sc();

        let mut prelude = None;
        if !self.stream.eof
            && !matches!(
                self.stream.token_type,
                TokenType::LeftCurlyBracket | TokenType::Semicolon
            )
        {
            let node = if self.options.parse_atrule_prelude {
                self.parse_with_fallback(
                    |parser| parser.atrule_prelude(&name),
                    |parser, start_token| {
                        parser.raw(start_token, RawMode::LeftCurlyBracketOrSemicolon, true)
                    },
                )?
            } else {
                let start_token = self.stream.token_index;
                self.raw(start_token, RawMode::LeftCurlyBracketOrSemicolon, true)
            };

            let empty = matches!(&node, Node::AtrulePrelude(inner) if inner.children.is_empty());
            if !empty {
                prelude = Some(Box::new(node));
            }
            self.stream.skip_sc();
        }

        let mut block = None;
        match self.stream.token_type {
            TokenType::Semicolon => self.stream.next(),
            TokenType::LeftCurlyBracket => {
                let declarations = match lower_name.as_str() {
                    "font-face" | "page" | "counter-style" | "property" | "viewport"
                    | "-ms-viewport" => true,
                    "media" | "supports" | "container" | "layer" | "document" | "-moz-document" => {
                        in_style_block
                    }
                    _ => self.is_declaration_block_atrule(),
                };
                block = Some(Box::new(self.block(declarations)?));
            }
            _ => {}
        }

        Ok(Node::Atrule(Atrule {
            loc: self.location(start, self.stream.token_start),
            name,
            prelude,
            block,
        }))
    }

    /// Whether the block starting at the current `{` closes before any
    /// nested block or at-rule opens.
    fn is_declaration_block_atrule(&self) -> bool {
        let mut offset = 1;

        loop {
            match self.stream.lookup_type(offset) {
                TokenType::RightCurlyBracket => return true,
                TokenType::LeftCurlyBracket | TokenType::AtKeyword | TokenType::Eof => return false,
                _ => offset += 1,
            }
        }
    }

    /// Prelude of the at-rule `name`, parsed by the grammar specific to
    /// that name or as a generic sequence otherwise.
    pub fn atrule_prelude(&mut self, name: &str) -> PResult<Node> {
        self.stream.skip_sc();

        let children = match name.to_ascii_lowercase().as_str() {
            "media" | "custom-media" => List::from_vec(vec![self.media_query_list()?]),
            "import" => self.import_prelude()?,
            "page" | "nest" => List::from_vec(vec![self.selector_list()?]),
            "supports" => {
                let children = self.supports_sequence()?;
                if children.is_empty() {
                    return Err(self.error("Condition is expected", None));
                }
                children
            }
            _ => self.read_sequence(Scope::AtrulePrelude)?,
        };

        self.stream.skip_sc();

        if !self.stream.eof
            && !matches!(
                self.stream.token_type,
                TokenType::LeftCurlyBracket | TokenType::Semicolon
            )
        {
            return Err(self.error("Semicolon or block is expected", None));
        }

        Ok(Node::AtrulePrelude(AtrulePrelude {
            loc: self.location_from_list(&children),
            children,
        }))
    }

    // <string> | <url>, then optional layer(), supports() and media queries
    fn import_prelude(&mut self) -> PResult<List<Node>> {
        let mut children = List::new();

        match self.stream.token_type {
            TokenType::String => children.push(self.string()?),
            TokenType::Url | TokenType::Function => children.push(self.url()?),
            _ => return Err(self.error("String or url() is expected", None)),
        };

        loop {
            let modifier = matches!(
                self.lookup_non_ws_type(0),
                TokenType::Function | TokenType::Ident | TokenType::LeftParenthesis
            );

            if !modifier {
                break;
            }

            self.stream.skip_sc();
            children.push(Node::white_space());

            match self.stream.token_type {
                TokenType::Function => {
                    let child = self.function_with(|parser, name| {
                        if name.eq_ignore_ascii_case("supports") {
                            parser.supports_condition()
                        } else {
                            parser.read_sequence(Scope::AtrulePrelude)
                        }
                    })?;
                    children.push(child);
                }
                TokenType::Ident if self.stream.lookup_value(0, "layer") => {
                    children.push(self.identifier()?);
                }
                _ => {
                    children.push(self.media_query_list()?);
                    break;
                }
            }
        }

        Ok(children)
    }

    /// Content of a parenthesized supports condition: a declaration test or
    /// a nested condition sequence.
    fn supports_condition(&mut self) -> PResult<List<Node>> {
        self.stream.skip_sc();

        if self.stream.token_type == TokenType::Ident && self.lookup_non_ws_type(1) == TokenType::Colon {
            return Ok(List::from_vec(vec![self.declaration()?]));
        }

        self.supports_sequence()
    }

    fn supports_sequence(&mut self) -> PResult<List<Node>> {
        let mut children = List::new();
        let mut space = false;

        self.stream.skip_sc();

        while !self.stream.eof {
            let child = match self.stream.token_type {
                TokenType::WhiteSpace => {
                    self.stream.next();
                    space = true;
                    continue;
                }
                TokenType::Comment => {
                    self.stream.next();
                    continue;
                }
                TokenType::Function => self.function_with(|parser, _| {
                    let start = parser.stream.token_index;
                    Ok(List::from_vec(vec![parser.raw(start, RawMode::Default, false)]))
                })?,
                TokenType::Ident => self.identifier()?,
                TokenType::LeftParenthesis => {
                    self.parentheses_with(|parser| parser.supports_condition())?
                }
                _ => break,
            };

            if space && !children.is_empty() {
                children.push(Node::white_space());
            }
            space = false;
            children.push(child);
        }

        Ok(children)
    }
}
