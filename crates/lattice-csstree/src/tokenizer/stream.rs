//! Random access token stream with bracket balance tracking.

use super::char_code::is_bom;
use super::utils::{char_code_at, cmp_str};
use super::{tokenize, TokenType};

const OFFSET_MASK: u32 = 0x00FF_FFFF;
const TYPE_SHIFT: u32 = 24;
const MIN_BUFFER_SIZE: usize = 16 * 1024;

/// Grow `buffer` so it can hold at least `size` entries.
///
/// Buffers never shrink; when growth is needed the new length is
/// `max(size + 1024, 16K)`.
pub fn adopt_buffer(mut buffer: Vec<u32>, size: usize) -> Vec<u32> {
    if buffer.len() < size {
        buffer.clear();
        buffer.resize((size + 1024).max(MIN_BUFFER_SIZE), 0);
    }

    buffer
}

/// Reusable backing storage for a [`TokenStream`].
#[derive(Debug, Default, Clone)]
pub struct TokenBuffers {
    offset_and_type: Vec<u32>,
    balance: Vec<u32>,
}

impl TokenBuffers {
    /// Create empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current capacity in tokens.
    pub fn capacity(&self) -> usize {
        self.offset_and_type.len()
    }
}

/// What [`TokenStream::skip_until_balanced`] should do at a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopAction {
    /// Keep scanning (skipping balanced blocks as a whole).
    Continue,
    /// Stop before this token.
    Stop,
    /// Stop after this token.
    StopIncluding,
}

/// One entry of [`TokenStream::dump`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDump {
    pub index: usize,
    pub ty: TokenType,
    pub chars: String,
    pub balance: u32,
}

/// A tokenized source with a movable cursor.
///
/// Every token is stored as one `u32`: its end offset in the low 24 bits and
/// its type in the high 8. A parallel balance array links each opening
/// bracket with its closer, so a whole balanced block can be skipped in O(1).
/// Sources are therefore limited to 16 MiB.
#[derive(Debug, Clone)]
pub struct TokenStream<'s> {
    source: &'s str,
    offset_and_type: Vec<u32>,
    balance: Vec<u32>,
    token_count: usize,
    first_char_offset: usize,

    /// Index of the current token.
    pub token_index: usize,
    /// Type of the current token.
    pub token_type: TokenType,
    /// Start offset of the current token.
    pub token_start: usize,
    /// End offset of the current token.
    pub token_end: usize,
    /// Set once the cursor moved past the last token.
    pub eof: bool,
}

fn closing_type_for(ty: TokenType) -> Option<TokenType> {
    match ty {
        TokenType::Function | TokenType::LeftParenthesis => Some(TokenType::RightParenthesis),
        TokenType::LeftSquareBracket => Some(TokenType::RightSquareBracket),
        TokenType::LeftCurlyBracket => Some(TokenType::RightCurlyBracket),
        _ => None,
    }
}

impl<'s> TokenStream<'s> {
    /// Tokenize `source` into fresh buffers.
    pub fn new(source: &'s str) -> Self {
        Self::with_buffers(source, TokenBuffers::default())
    }

    /// Tokenize `source` reusing previously allocated buffers.
    pub fn with_buffers(source: &'s str, buffers: TokenBuffers) -> Self {
        let mut stream = TokenStream {
            source,
            offset_and_type: buffers.offset_and_type,
            balance: buffers.balance,
            token_count: 0,
            first_char_offset: 0,
            token_index: 0,
            token_type: TokenType::Eof,
            token_start: 0,
            token_end: 0,
            eof: false,
        };
        stream.populate();
        stream
    }

    /// Release the buffers for reuse by another stream.
    pub fn into_buffers(self) -> TokenBuffers {
        TokenBuffers {
            offset_and_type: self.offset_and_type,
            balance: self.balance,
        }
    }

    fn populate(&mut self) {
        let source_length = self.source.len() as u32;
        let mut offset_and_type =
            adopt_buffer(std::mem::take(&mut self.offset_and_type), self.source.len() + 1);
        let mut balance = adopt_buffer(std::mem::take(&mut self.balance), self.source.len() + 1);
        let mut token_count = 0usize;
        let mut balance_close_type: Option<TokenType> = None;
        let mut balance_start: u32 = 0;
        let mut first_char_offset: Option<usize> = None;

        tokenize(self.source, |ty, start, end| {
            if balance_close_type == Some(ty) {
                let mut balance_prev = (balance_start & OFFSET_MASK) as usize;
                balance_start = balance[balance_prev];
                balance_close_type = if balance_start == 0 {
                    None
                } else {
                    Some(TokenType::from_u8((balance_start >> TYPE_SHIFT) as u8))
                };
                balance[token_count] = balance_prev as u32;
                balance[balance_prev] = token_count as u32;
                balance_prev += 1;

                while balance_prev < token_count {
                    if balance[balance_prev] == source_length {
                        balance[balance_prev] = token_count as u32;
                    }
                    balance_prev += 1;
                }
            } else if let Some(close) = closing_type_for(ty) {
                balance[token_count] = balance_start;
                balance_close_type = Some(close);
                balance_start = ((close as u32) << TYPE_SHIFT) | token_count as u32;
            } else {
                balance[token_count] = source_length;
            }

            offset_and_type[token_count] = ((ty as u32) << TYPE_SHIFT) | end as u32;
            token_count += 1;
            first_char_offset.get_or_insert(start);
        });

        offset_and_type[token_count] = ((TokenType::Eof as u32) << TYPE_SHIFT) | source_length;
        balance[token_count] = source_length;
        balance[self.source.len()] = source_length;

        while balance_start != 0 {
            let balance_prev = (balance_start & OFFSET_MASK) as usize;
            balance_start = balance[balance_prev];
            balance[balance_prev] = source_length;
        }

        self.first_char_offset = first_char_offset
            .unwrap_or(if is_bom(self.source.as_bytes()) { 3 } else { 0 });
        self.token_count = token_count;
        self.offset_and_type = offset_and_type;
        self.balance = balance;

        tracing::trace!(
            target: crate::logging::targets::TOKENIZER,
            tokens = token_count,
            "tokenized source"
        );

        self.reset();
        self.next();
    }

    /// The source text this stream was built from.
    pub fn source(&self) -> &'s str {
        self.source
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn first_char_offset(&self) -> usize {
        self.first_char_offset
    }

    /// Balance entry of a token: for an opener the closer index, for a
    /// closer the opener index, for other tokens the enclosing closer (or
    /// the source length at top level or when unbalanced).
    pub fn balance_of(&self, index: usize) -> u32 {
        self.balance.get(index).copied().unwrap_or(self.source.len() as u32)
    }

    #[inline]
    fn type_at(&self, index: usize) -> TokenType {
        TokenType::from_u8((self.offset_and_type[index] >> TYPE_SHIFT) as u8)
    }

    #[inline]
    fn end_at(&self, index: usize) -> usize {
        (self.offset_and_type[index] & OFFSET_MASK) as usize
    }

    /// Move the cursor before the first token.
    pub fn reset(&mut self) {
        self.eof = false;
        self.token_index = usize::MAX;
        self.token_type = TokenType::Eof;
        self.token_start = self.first_char_offset;
        self.token_end = self.first_char_offset;
    }

    /// Type of the token `offset` positions after the cursor.
    pub fn lookup_type(&self, offset: isize) -> TokenType {
        let index = self.token_index as isize + offset;

        if index >= 0 && (index as usize) < self.token_count {
            self.type_at(index as usize)
        } else {
            TokenType::Eof
        }
    }

    /// Type of the `idx`-th token from the cursor, ignoring whitespace and comments.
    pub fn lookup_type_non_sc(&self, mut idx: usize) -> TokenType {
        for index in self.token_index..self.token_count {
            let ty = self.type_at(index);

            if ty != TokenType::WhiteSpace && ty != TokenType::Comment {
                if idx == 0 {
                    return ty;
                }
                idx -= 1;
            }
        }

        TokenType::Eof
    }

    /// Start offset of the token `offset` positions after the cursor.
    pub fn lookup_offset(&self, offset: isize) -> usize {
        let index = self.token_index as isize + offset;

        if index >= 0 && (index as usize) < self.token_count {
            self.get_token_start(index as usize)
        } else {
            self.source.len()
        }
    }

    /// Compare the token `offset` positions after the cursor with a lower
    /// case reference, ignoring ASCII case.
    pub fn lookup_value(&self, offset: isize, reference: &str) -> bool {
        let index = self.token_index as isize + offset;

        if index >= 0 && (index as usize) < self.token_count {
            let index = index as usize;
            cmp_str(
                self.source.as_bytes(),
                self.get_token_start(index),
                self.end_at(index),
                reference,
            )
        } else {
            false
        }
    }

    pub fn get_token_start(&self, index: usize) -> usize {
        if index == self.token_index {
            return self.token_start;
        }

        if index > 0 {
            return if index < self.token_count {
                self.end_at(index - 1)
            } else {
                self.end_at(self.token_count)
            };
        }

        self.first_char_offset
    }

    pub fn get_token_end(&self, index: usize) -> usize {
        if index < self.token_count {
            self.end_at(index)
        } else {
            self.source.len()
        }
    }

    /// Byte at `offset`, or 0 past the end.
    #[inline]
    pub fn char_code_at(&self, offset: usize) -> u32 {
        char_code_at(self.source.as_bytes(), offset)
    }

    /// Case-insensitive test of the byte at `offset`.
    pub fn cmp_char(&self, offset: usize, reference: u32) -> bool {
        super::utils::cmp_char(self.source.as_bytes(), offset, reference)
    }

    pub fn cmp_str(&self, start: usize, end: usize, reference: &str) -> bool {
        cmp_str(self.source.as_bytes(), start, end, reference)
    }

    pub fn substring(&self, start: usize, end: usize) -> &'s str {
        self.source.get(start..end).unwrap_or("")
    }

    /// Source text from `start` up to the current token.
    pub fn substr_to_cursor(&self, start: usize) -> &'s str {
        self.substring(start, self.token_start)
    }

    pub fn get_token_value(&self) -> &'s str {
        self.substring(self.token_start, self.token_end)
    }

    pub fn get_token_length(&self) -> usize {
        self.token_end - self.token_start
    }

    /// Whether the current token lies outside the block opened at token `pos`.
    pub fn is_balance_edge(&self, pos: usize) -> bool {
        (self.balance_of(self.token_index) as usize) < pos
    }

    /// Whether the token `offset` positions after the cursor is a Delim of `code`.
    pub fn is_delim(&self, code: u32, offset: isize) -> bool {
        if offset != 0 {
            return self.lookup_type(offset) == TokenType::Delim
                && self.char_code_at(self.lookup_offset(offset)) == code;
        }

        self.token_type == TokenType::Delim && self.char_code_at(self.token_start) == code
    }

    /// Move the cursor by `count` tokens (negative values rewind).
    pub fn skip(&mut self, count: isize) {
        let next = self.token_index.wrapping_add(count as usize);

        if next < self.token_count {
            self.token_index = next;
            self.token_start = self.get_token_start_raw(next);
            self.token_type = self.type_at(next);
            self.token_end = self.end_at(next);
            self.eof = false;
        } else {
            self.token_index = self.token_count;
            self.next();
        }
    }

    fn get_token_start_raw(&self, index: usize) -> usize {
        if index > 0 {
            self.end_at(index - 1)
        } else {
            self.first_char_offset
        }
    }

    /// Advance to the next token.
    pub fn next(&mut self) {
        let next = self.token_index.wrapping_add(1);

        if next < self.token_count {
            self.token_index = next;
            self.token_start = self.token_end;
            self.token_type = self.type_at(next);
            self.token_end = self.end_at(next);
        } else {
            self.eof = true;
            self.token_index = self.token_count;
            self.token_type = TokenType::Eof;
            self.token_start = self.source.len();
            self.token_end = self.source.len();
        }
    }

    pub fn skip_ws(&mut self) {
        while self.token_type == TokenType::WhiteSpace {
            self.next();
        }
    }

    /// Skip whitespace and comments.
    pub fn skip_sc(&mut self) {
        while matches!(self.token_type, TokenType::WhiteSpace | TokenType::Comment) {
            self.next();
        }
    }

    /// Move the cursor from `start_token` forward until `stop` says so,
    /// treating balanced blocks as single units and never leaving the block
    /// that encloses `start_token`.
    ///
    /// `stop` receives each candidate token's type and the byte at its start.
    pub fn skip_until_balanced<F>(&mut self, start_token: usize, mut stop: F)
    where
        F: FnMut(TokenType, u32) -> StopAction,
    {
        let mut cursor = start_token;

        while cursor < self.token_count {
            let balance_end = self.balance[cursor] as usize;

            if balance_end < start_token {
                break;
            }

            let offset = self.get_token_start_raw(cursor);

            match stop(self.type_at(cursor), self.char_code_at(offset)) {
                StopAction::Stop => break,
                StopAction::StopIncluding => {
                    cursor += 1;
                    break;
                }
                StopAction::Continue => {
                    if balance_end < self.token_count && self.balance[balance_end] as usize == cursor {
                        cursor = balance_end;
                    }
                }
            }

            cursor += 1;
        }

        self.skip(cursor as isize - self.token_index as isize);
    }

    /// Call `f(type, start, end, index)` for every token.
    pub fn for_each_token<F>(&self, mut f: F)
    where
        F: FnMut(TokenType, usize, usize, usize),
    {
        let mut start = self.first_char_offset;

        for index in 0..self.token_count {
            let end = self.end_at(index);
            f(self.type_at(index), start, end, index);
            start = end;
        }
    }

    /// Debug listing of all tokens.
    pub fn dump(&self) -> Vec<TokenDump> {
        let mut result = Vec::with_capacity(self.token_count);

        self.for_each_token(|ty, start, end, index| {
            result.push(TokenDump {
                index,
                ty,
                chars: self.substring(start, end).to_string(),
                balance: self.balance[index],
            });
        });

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_tokens() {
        let mut stream = TokenStream::new("a b");

        assert_eq!(stream.token_type, TokenType::Ident);
        assert_eq!(stream.get_token_value(), "a");
        stream.next();
        assert_eq!(stream.token_type, TokenType::WhiteSpace);
        stream.skip_sc();
        assert_eq!(stream.get_token_value(), "b");
        assert!(!stream.eof);
        stream.next();
        assert!(stream.eof);
        assert_eq!(stream.token_start, 3);
    }

    #[test]
    fn empty_source_is_eof() {
        let stream = TokenStream::new("");

        assert!(stream.eof);
        assert_eq!(stream.token_count(), 0);
        assert_eq!(stream.token_type, TokenType::Eof);
    }

    #[test]
    fn balance_links_openers_and_closers() {
        let source = "(b[c]{d})e";
        let stream = TokenStream::new(source);
        let count = stream.token_count();

        // ( b [ c ] { d } ) e
        assert_eq!(stream.balance_of(0), 8);
        assert_eq!(stream.balance_of(8), 0);
        assert_eq!(stream.balance_of(2), 4);
        assert_eq!(stream.balance_of(4), 2);
        assert_eq!(stream.balance_of(5), 7);
        assert_eq!(stream.balance_of(7), 5);
        assert_eq!(stream.balance_of(1), 8);
        assert_eq!(stream.balance_of(3), 4);
        assert_eq!(stream.balance_of(9), source.len() as u32);

        for i in 0..count {
            let ty = stream.type_at(i);
            if matches!(
                ty,
                TokenType::LeftParenthesis
                    | TokenType::Function
                    | TokenType::LeftSquareBracket
                    | TokenType::LeftCurlyBracket
            ) {
                let closer = stream.balance_of(i) as usize;
                assert_eq!(stream.balance_of(closer) as usize, i);
            }
        }
    }

    #[test]
    fn unbalanced_openers_point_past_the_end() {
        let source = "a(b[c";
        let stream = TokenStream::new(source);

        // a( b [ c
        assert_eq!(stream.balance_of(0), source.len() as u32);
        assert_eq!(stream.balance_of(2), source.len() as u32);
    }

    #[test]
    fn mismatched_closer_does_not_close() {
        let source = "(a]b)";
        let stream = TokenStream::new(source);

        assert_eq!(stream.balance_of(0), 4);
        assert_eq!(stream.balance_of(4), 0);
        assert_eq!(stream.balance_of(2), 4);
    }

    #[test]
    fn lookups_are_relative_to_cursor() {
        let mut stream = TokenStream::new("Foo /* c */ bar(1)");

        assert!(stream.lookup_value(0, "foo"));
        assert_eq!(stream.lookup_type(1), TokenType::WhiteSpace);
        assert_eq!(stream.lookup_type_non_sc(1), TokenType::Function);
        assert_eq!(stream.lookup_offset(2), 4);
        stream.skip(4);
        assert_eq!(stream.token_type, TokenType::Function);
        stream.skip(-4);
        assert_eq!(stream.get_token_value(), "Foo");
        assert_eq!(stream.lookup_type(-1), TokenType::Eof);
    }

    #[test]
    fn skip_until_balanced_skips_blocks() {
        let mut stream = TokenStream::new("a (b;c) ; d");

        stream.skip_until_balanced(0, |ty, _| {
            if ty == TokenType::Semicolon {
                StopAction::Stop
            } else {
                StopAction::Continue
            }
        });

        assert_eq!(stream.token_type, TokenType::Semicolon);
        assert_eq!(stream.token_start, 8);
    }

    #[test]
    fn skip_until_balanced_stops_at_block_end() {
        let mut stream = TokenStream::new("{a b} c");
        stream.next();

        stream.skip_until_balanced(1, |_, _| StopAction::Continue);

        assert_eq!(stream.token_type, TokenType::RightCurlyBracket);
    }

    #[test]
    fn skip_until_balanced_can_include_stop_token() {
        let mut stream = TokenStream::new("a;b");

        stream.skip_until_balanced(0, |_, code| {
            if code == ';' as u32 {
                StopAction::StopIncluding
            } else {
                StopAction::Continue
            }
        });

        assert_eq!(stream.get_token_value(), "b");
    }

    #[test]
    fn adopt_buffer_grows_only() {
        let buffer = adopt_buffer(Vec::new(), 10);
        assert_eq!(buffer.len(), MIN_BUFFER_SIZE);

        let buffer = adopt_buffer(buffer, 100);
        assert_eq!(buffer.len(), MIN_BUFFER_SIZE);

        let buffer = adopt_buffer(buffer, MIN_BUFFER_SIZE * 2);
        assert_eq!(buffer.len(), MIN_BUFFER_SIZE * 2 + 1024);
    }

    #[test]
    fn buffers_are_reused() {
        let stream = TokenStream::new("a b c");
        let buffers = stream.into_buffers();
        let capacity = buffers.capacity();

        let stream = TokenStream::with_buffers("x", buffers);
        assert_eq!(stream.token_count(), 1);
        assert_eq!(stream.into_buffers().capacity(), capacity);
    }

    #[test]
    fn dump_lists_tokens() {
        let stream = TokenStream::new("a{}");
        let dump = stream.dump();

        assert_eq!(dump.len(), 3);
        assert_eq!(dump[1].ty, TokenType::LeftCurlyBracket);
        assert_eq!(dump[1].balance, 2);
        assert_eq!(dump[2].chars, "}");
    }
}
