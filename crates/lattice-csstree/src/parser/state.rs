//! Parser state and token-level primitives shared by every production.

use crate::ast::Node;
use crate::error::ParseError;
use crate::list::List;
use crate::logging::targets;
use crate::tokenizer::{Loc, OffsetToLocation, TokenStream, TokenType};

use super::{ParseHooks, ParseOptions};

pub(crate) type PResult<T> = std::result::Result<T, ParseError>;

const NUMBER_SIGN: u32 = 0x0023;

/// Recursive descent parser over a token stream.
///
/// Productions live in sibling modules as further `impl` blocks; this file
/// holds the cursor helpers, location bookkeeping and error recovery.
pub struct Parser<'s, 'a, 'h> {
    pub stream: TokenStream<'s>,
    locations: OffsetToLocation<'s>,
    pub options: &'a ParseOptions,
    hooks: &'a mut ParseHooks<'h>,
    fatal: bool,
}

impl<'s, 'a, 'h> Parser<'s, 'a, 'h> {
    pub fn new(stream: TokenStream<'s>, options: &'a ParseOptions, hooks: &'a mut ParseHooks<'h>) -> Self {
        let locations =
            OffsetToLocation::with_bias(stream.source(), options.offset, options.line, options.column);

        Self {
            stream,
            locations,
            options,
            hooks,
            fatal: false,
        }
    }

    /// Build a parse error located at `offset`, or at the current token.
    ///
    /// At end of input the error points at the start of the last token that
    /// is neither whitespace nor a comment.
    pub fn error(&self, message: &str, offset: Option<usize>) -> ParseError {
        let source = self.stream.source();
        let offset = match offset {
            Some(offset) if offset < source.len() => offset,
            _ if self.stream.eof => self.last_significant_token_start(),
            _ => self.stream.token_start,
        };
        let position = self.locations.position(offset);

        ParseError::new(message, source, position.offset, position.line, position.column)
    }

    fn last_significant_token_start(&self) -> usize {
        (0..self.stream.token_count())
            .rev()
            .find(|&index| {
                let ty = self.stream.lookup_type(index as isize - self.stream.token_index as isize);
                ty != TokenType::WhiteSpace && ty != TokenType::Comment
            })
            .map_or(0, |index| self.stream.get_token_start(index))
    }

    /// Require a token of type `ty` and move past it.
    pub fn eat(&mut self, ty: TokenType) -> PResult<()> {
        if self.stream.token_type == ty {
            self.stream.next();
            return Ok(());
        }

        let mut offset = self.stream.token_start;
        let mut message = format!("{} is expected", ty.name());

        match ty {
            TokenType::Ident => {
                if matches!(self.stream.token_type, TokenType::Function | TokenType::Url) {
                    offset = self.stream.token_end - 1;
                    message = "Identifier is expected but function found".to_string();
                } else {
                    message = "Identifier is expected".to_string();
                }
            }
            TokenType::Hash => {
                if self.stream.is_delim(NUMBER_SIGN, 0) {
                    self.stream.next();
                    offset += 1;
                    message = "Name is expected".to_string();
                }
            }
            TokenType::Percentage => {
                if self.stream.token_type == TokenType::Number {
                    offset = self.stream.token_end;
                    message = "Percent sign is expected".to_string();
                }
            }
            _ => {
                if opening_char(ty).is_some_and(|code| self.stream.char_code_at(offset) == code) {
                    offset += 1;
                }
            }
        }

        Err(self.error(&message, Some(offset)))
    }

    /// Require a Delim token holding `code`.
    pub fn eat_delim(&mut self, code: u32) -> PResult<()> {
        if !self.stream.is_delim(code, 0) {
            let ch = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
            return Err(self.error(&format!("Delim \"{ch}\" is expected"), None));
        }

        self.stream.next();
        Ok(())
    }

    /// Require an identifier equal to `name` ignoring ASCII case.
    pub fn eat_ident(&mut self, name: &str) -> PResult<()> {
        if self.stream.token_type != TokenType::Ident || !self.stream.lookup_value(0, name) {
            return Err(self.error(&format!("Identifier \"{name}\" is expected"), None));
        }

        self.stream.next();
        Ok(())
    }

    /// Text of the current token, after checking its type.
    pub fn consume(&mut self, ty: TokenType) -> PResult<&'s str> {
        let value = self.stream.get_token_value();
        self.eat(ty)?;
        Ok(value)
    }

    /// Name of the current function token without its `(`.
    pub fn consume_function_name(&mut self) -> PResult<&'s str> {
        let name = self
            .stream
            .substring(self.stream.token_start, self.stream.token_end.saturating_sub(1));
        self.eat(TokenType::Function)?;
        Ok(name)
    }

    /// Type of the token `offset` positions ahead, skipping whitespace (but
    /// not comments).
    pub fn lookup_non_ws_type(&self, mut offset: isize) -> TokenType {
        loop {
            let ty = self.stream.lookup_type(offset);
            if ty != TokenType::WhiteSpace {
                return ty;
            }
            offset += 1;
        }
    }

    pub fn location(&self, start: usize, end: usize) -> Option<Loc> {
        self.options
            .positions
            .then(|| self.locations.location_range(start, end, &self.options.filename))
    }

    /// Range spanning the first and last nodes of `list`, or an empty range
    /// at the current token when they carry no location.
    pub fn location_from_list(&self, list: &List<Node>) -> Option<Loc> {
        if !self.options.positions {
            return None;
        }

        let bias = self.locations.start_offset();
        let start = list
            .first()
            .and_then(Node::loc)
            .map_or(self.stream.token_start, |loc| loc.start.offset - bias);
        let end = list
            .last()
            .and_then(Node::loc)
            .map_or(self.stream.token_start, |loc| loc.end.offset - bias);

        self.location(start, end)
    }

    /// Run `consumer`; if it fails, re-read the region it started at with
    /// `fallback` and report the error.
    ///
    /// An error returned by the error hook is fatal: it is propagated
    /// through every enclosing recovery point unchanged.
    pub fn parse_with_fallback<C, F>(&mut self, consumer: C, fallback: F) -> PResult<Node>
    where
        C: FnOnce(&mut Self) -> PResult<Node>,
        F: FnOnce(&mut Self, usize) -> Node,
    {
        let start_token = self.stream.token_index;

        let error = match consumer(self) {
            Ok(node) => return Ok(node),
            Err(error) if self.fatal => return Err(error),
            Err(error) => error,
        };

        let fallback_node = fallback(self, start_token);

        match self.hooks.on_parse_error.as_mut() {
            Some(on_parse_error) => {
                if let Err(fatal) = on_parse_error(&error, &fallback_node) {
                    self.fatal = true;
                    return Err(fatal);
                }
            }
            None => {
                tracing::warn!(
                    target: targets::PARSER,
                    line = error.line,
                    column = error.column,
                    "recovered from parse error: {}",
                    error.message
                );
            }
        }

        Ok(fallback_node)
    }
}

fn opening_char(ty: TokenType) -> Option<u32> {
    let code = match ty {
        TokenType::Colon => ':',
        TokenType::Semicolon => ';',
        TokenType::Comma => ',',
        TokenType::LeftSquareBracket => '[',
        TokenType::RightSquareBracket => ']',
        TokenType::LeftParenthesis => '(',
        TokenType::RightParenthesis => ')',
        TokenType::LeftCurlyBracket => '{',
        TokenType::RightCurlyBracket => '}',
        _ => return None,
    };

    Some(code as u32)
}
