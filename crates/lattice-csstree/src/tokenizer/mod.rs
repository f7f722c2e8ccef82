//! CSS tokenizer following CSS Syntax Module Level 3.
//!
//! [`tokenize`] is the lowest level entry point: it reports every token as a
//! `(type, start, end)` triple and never fails. [`TokenStream`] stores those
//! triples compactly together with bracket balance information and offers the
//! random access the parser relies on.
//!
//! # Example
//!
//! ```
//! use lattice_csstree::tokenizer::{tokenize, TokenType};
//!
//! let mut tokens = Vec::new();
//! tokenize("a{color:red}", |ty, start, end| tokens.push((ty, start, end)));
//!
//! assert_eq!(tokens[0], (TokenType::Ident, 0, 1));
//! assert_eq!(tokens[1].0, TokenType::LeftCurlyBracket);
//! ```

pub mod char_code;
mod location;
mod stream;
pub mod utils;

use char_code::{
    char_code_category, is_bom, is_identifier_start, is_name, is_newline, is_number_start,
    is_valid_escape, CharCategory,
};
use utils::{
    char_code_at, cmp_str, consume_bad_url_remnants, consume_escaped, consume_name,
    consume_number, find_white_space_end,
};

pub use location::{Loc, OffsetToLocation, Position};
pub use stream::{adopt_buffer, StopAction, TokenBuffers, TokenDump, TokenStream};

/// Token kinds produced by [`tokenize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TokenType {
    Eof = 0,
    Ident,
    Function,
    AtKeyword,
    Hash,
    String,
    BadString,
    Url,
    BadUrl,
    Delim,
    Number,
    Percentage,
    Dimension,
    WhiteSpace,
    Cdo,
    Cdc,
    Colon,
    Semicolon,
    Comma,
    LeftSquareBracket,
    RightSquareBracket,
    LeftParenthesis,
    RightParenthesis,
    LeftCurlyBracket,
    RightCurlyBracket,
    Comment,
}

impl TokenType {
    const ALL: [TokenType; 26] = [
        TokenType::Eof,
        TokenType::Ident,
        TokenType::Function,
        TokenType::AtKeyword,
        TokenType::Hash,
        TokenType::String,
        TokenType::BadString,
        TokenType::Url,
        TokenType::BadUrl,
        TokenType::Delim,
        TokenType::Number,
        TokenType::Percentage,
        TokenType::Dimension,
        TokenType::WhiteSpace,
        TokenType::Cdo,
        TokenType::Cdc,
        TokenType::Colon,
        TokenType::Semicolon,
        TokenType::Comma,
        TokenType::LeftSquareBracket,
        TokenType::RightSquareBracket,
        TokenType::LeftParenthesis,
        TokenType::RightParenthesis,
        TokenType::LeftCurlyBracket,
        TokenType::RightCurlyBracket,
        TokenType::Comment,
    ];

    /// Recover a token type from its numeric tag.
    pub fn from_u8(tag: u8) -> TokenType {
        Self::ALL.get(tag as usize).copied().unwrap_or(TokenType::Eof)
    }

    /// Human readable name used in parse error messages.
    pub fn name(self) -> &'static str {
        match self {
            TokenType::Eof => "EOF",
            TokenType::Ident => "Identifier",
            TokenType::Function => "Function",
            TokenType::AtKeyword => "AtKeyword",
            TokenType::Hash => "Hash",
            TokenType::String => "String",
            TokenType::BadString => "BadString",
            TokenType::Url => "Url",
            TokenType::BadUrl => "BadUrl",
            TokenType::Delim => "Delim",
            TokenType::Number => "Number",
            TokenType::Percentage => "Percentage",
            TokenType::Dimension => "Dimension",
            TokenType::WhiteSpace => "WhiteSpace",
            TokenType::Cdo => "CDO",
            TokenType::Cdc => "CDC",
            TokenType::Colon => "Colon",
            TokenType::Semicolon => "Semicolon",
            TokenType::Comma => "Comma",
            TokenType::LeftSquareBracket => "Left square bracket",
            TokenType::RightSquareBracket => "Right square bracket",
            TokenType::LeftParenthesis => "Left parenthesis",
            TokenType::RightParenthesis => "Right parenthesis",
            TokenType::LeftCurlyBracket => "Left curly bracket",
            TokenType::RightCurlyBracket => "Right curly bracket",
            TokenType::Comment => "Comment",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const QUOTATION_MARK: u32 = 0x0022;
const NUMBER_SIGN: u32 = 0x0023;
const APOSTROPHE: u32 = 0x0027;
const LEFT_PARENTHESIS: u32 = 0x0028;
const RIGHT_PARENTHESIS: u32 = 0x0029;
const ASTERISK: u32 = 0x002A;
const PLUS_SIGN: u32 = 0x002B;
const COMMA: u32 = 0x002C;
const HYPHEN_MINUS: u32 = 0x002D;
const FULL_STOP: u32 = 0x002E;
const SOLIDUS: u32 = 0x002F;
const COLON: u32 = 0x003A;
const SEMICOLON: u32 = 0x003B;
const LESS_THAN_SIGN: u32 = 0x003C;
const GREATER_THAN_SIGN: u32 = 0x003E;
const EXCLAMATION_MARK: u32 = 0x0021;
const COMMERCIAL_AT: u32 = 0x0040;
const LEFT_SQUARE_BRACKET: u32 = 0x005B;
const REVERSE_SOLIDUS: u32 = 0x005C;
const RIGHT_SQUARE_BRACKET: u32 = 0x005D;
const LEFT_CURLY_BRACKET: u32 = 0x007B;
const RIGHT_CURLY_BRACKET: u32 = 0x007D;
const PERCENT_SIGN: u32 = 0x0025;

struct Scanner<'s> {
    source: &'s [u8],
    offset: usize,
}

impl Scanner<'_> {
    #[inline]
    fn code(&self, delta: usize) -> u32 {
        char_code_at(self.source, self.offset + delta)
    }

    fn consume_numeric_token(&mut self) -> TokenType {
        self.offset = consume_number(self.source, self.offset);

        if is_identifier_start(self.code(0), self.code(1), self.code(2)) {
            self.offset = consume_name(self.source, self.offset);
            return TokenType::Dimension;
        }

        if self.code(0) == PERCENT_SIGN {
            self.offset += 1;
            return TokenType::Percentage;
        }

        TokenType::Number
    }

    fn consume_ident_like_token(&mut self) -> TokenType {
        let name_start = self.offset;
        self.offset = consume_name(self.source, self.offset);

        if cmp_str(self.source, name_start, self.offset, "url") && self.code(0) == LEFT_PARENTHESIS {
            let after = find_white_space_end(self.source, self.offset + 1);
            let code = char_code_at(self.source, after);

            if code == QUOTATION_MARK || code == APOSTROPHE {
                self.offset = name_start + 4;
                return TokenType::Function;
            }

            self.offset = after;
            return self.consume_url_token();
        }

        if self.code(0) == LEFT_PARENTHESIS {
            self.offset += 1;
            return TokenType::Function;
        }

        TokenType::Ident
    }

    fn consume_string_token(&mut self) -> TokenType {
        let ending = self.code(0);
        self.offset += 1;

        while self.offset < self.source.len() {
            let code = self.code(0);

            if code == ending {
                self.offset += 1;
                return TokenType::String;
            }

            if is_newline(code) {
                return TokenType::BadString;
            }

            if code == REVERSE_SOLIDUS {
                let next = self.code(1);

                if self.offset + 1 == self.source.len() {
                    self.offset += 1;
                    continue;
                }

                if is_newline(next) {
                    self.offset += 1 + utils::get_newline_length(self.source, self.offset + 1, next);
                    continue;
                }

                if is_valid_escape(code, next) {
                    self.offset = consume_escaped(self.source, self.offset);
                    continue;
                }
            }

            self.offset += 1;
        }

        TokenType::String
    }

    fn consume_url_token(&mut self) -> TokenType {
        while self.offset < self.source.len() {
            let code = self.code(0);

            match char_code_category(code) {
                CharCategory::Other(RIGHT_PARENTHESIS) => {
                    self.offset += 1;
                    return TokenType::Url;
                }
                CharCategory::WhiteSpace => {
                    self.offset = find_white_space_end(self.source, self.offset);

                    if self.offset >= self.source.len() {
                        return TokenType::Url;
                    }

                    if self.code(0) == RIGHT_PARENTHESIS {
                        self.offset += 1;
                        return TokenType::Url;
                    }

                    self.offset = consume_bad_url_remnants(self.source, self.offset);
                    return TokenType::BadUrl;
                }
                CharCategory::Other(QUOTATION_MARK | APOSTROPHE | LEFT_PARENTHESIS)
                | CharCategory::NonPrintable => {
                    self.offset = consume_bad_url_remnants(self.source, self.offset);
                    return TokenType::BadUrl;
                }
                CharCategory::Other(REVERSE_SOLIDUS) => {
                    if is_valid_escape(code, self.code(1)) {
                        self.offset = consume_escaped(self.source, self.offset);
                        continue;
                    }

                    self.offset = consume_bad_url_remnants(self.source, self.offset);
                    return TokenType::BadUrl;
                }
                _ => self.offset += 1,
            }
        }

        TokenType::Url
    }

    fn delim(&mut self) -> TokenType {
        self.offset += 1;
        TokenType::Delim
    }

    fn single(&mut self, ty: TokenType) -> TokenType {
        self.offset += 1;
        ty
    }

    fn next_token(&mut self) -> TokenType {
        let code = self.code(0);

        match char_code_category(code) {
            CharCategory::WhiteSpace => {
                self.offset = find_white_space_end(self.source, self.offset + 1);
                TokenType::WhiteSpace
            }
            CharCategory::Digit => self.consume_numeric_token(),
            CharCategory::NameStart => self.consume_ident_like_token(),
            CharCategory::Eof | CharCategory::NonPrintable => self.delim(),
            CharCategory::Other(code) => match code {
                QUOTATION_MARK | APOSTROPHE => self.consume_string_token(),
                NUMBER_SIGN => {
                    if is_name(self.code(1)) || is_valid_escape(self.code(1), self.code(2)) {
                        self.offset = consume_name(self.source, self.offset + 1);
                        TokenType::Hash
                    } else {
                        self.delim()
                    }
                }
                LEFT_PARENTHESIS => self.single(TokenType::LeftParenthesis),
                RIGHT_PARENTHESIS => self.single(TokenType::RightParenthesis),
                PLUS_SIGN | FULL_STOP => {
                    if is_number_start(code, self.code(1), self.code(2)) != 0 {
                        self.consume_numeric_token()
                    } else {
                        self.delim()
                    }
                }
                COMMA => self.single(TokenType::Comma),
                HYPHEN_MINUS => {
                    if is_number_start(code, self.code(1), self.code(2)) != 0 {
                        self.consume_numeric_token()
                    } else if self.code(1) == HYPHEN_MINUS && self.code(2) == GREATER_THAN_SIGN {
                        self.offset += 3;
                        TokenType::Cdc
                    } else if is_identifier_start(code, self.code(1), self.code(2)) {
                        self.consume_ident_like_token()
                    } else {
                        self.delim()
                    }
                }
                SOLIDUS => {
                    if self.code(1) == ASTERISK {
                        let body = &self.source[self.offset + 2..];
                        self.offset = match body.windows(2).position(|w| w == b"*/") {
                            Some(pos) => self.offset + 2 + pos + 2,
                            None => self.source.len(),
                        };
                        TokenType::Comment
                    } else {
                        self.delim()
                    }
                }
                COLON => self.single(TokenType::Colon),
                SEMICOLON => self.single(TokenType::Semicolon),
                LESS_THAN_SIGN => {
                    if self.code(1) == EXCLAMATION_MARK
                        && self.code(2) == HYPHEN_MINUS
                        && self.code(3) == HYPHEN_MINUS
                    {
                        self.offset += 4;
                        TokenType::Cdo
                    } else {
                        self.delim()
                    }
                }
                COMMERCIAL_AT => {
                    if is_identifier_start(self.code(1), self.code(2), self.code(3)) {
                        self.offset = consume_name(self.source, self.offset + 1);
                        TokenType::AtKeyword
                    } else {
                        self.delim()
                    }
                }
                LEFT_SQUARE_BRACKET => self.single(TokenType::LeftSquareBracket),
                REVERSE_SOLIDUS => {
                    if is_valid_escape(code, self.code(1)) {
                        self.consume_ident_like_token()
                    } else {
                        self.delim()
                    }
                }
                RIGHT_SQUARE_BRACKET => self.single(TokenType::RightSquareBracket),
                LEFT_CURLY_BRACKET => self.single(TokenType::LeftCurlyBracket),
                RIGHT_CURLY_BRACKET => self.single(TokenType::RightCurlyBracket),
                _ => self.delim(),
            },
        }
    }
}

/// Tokenize `source`, reporting each token to `on_token` as
/// `(type, start, end)` with byte offsets.
///
/// Tokenization never fails: unterminated strings, urls and comments run to
/// the end of input. A leading byte order mark is skipped.
pub fn tokenize<F>(source: &str, mut on_token: F)
where
    F: FnMut(TokenType, usize, usize),
{
    let bytes = source.as_bytes();
    let mut scanner = Scanner {
        source: bytes,
        offset: if is_bom(bytes) { 3 } else { 0 },
    };
    let mut start = scanner.offset;

    while scanner.offset < bytes.len() {
        let ty = scanner.next_token();
        on_token(ty, start, scanner.offset);
        start = scanner.offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<(TokenType, &str)> {
        let mut result = Vec::new();
        tokenize(source, |ty, start, end| result.push((ty, &source[start..end])));
        result
    }

    fn types(source: &str) -> Vec<TokenType> {
        tokens(source).into_iter().map(|(ty, _)| ty).collect()
    }

    #[test]
    fn tokenizes_simple_rule() {
        use TokenType::*;

        assert_eq!(
            tokens(".a { color: red; }"),
            vec![
                (Delim, "."),
                (Ident, "a"),
                (WhiteSpace, " "),
                (LeftCurlyBracket, "{"),
                (WhiteSpace, " "),
                (Ident, "color"),
                (Colon, ":"),
                (WhiteSpace, " "),
                (Ident, "red"),
                (Semicolon, ";"),
                (WhiteSpace, " "),
                (RightCurlyBracket, "}"),
            ]
        );
    }

    #[test]
    fn tokenizes_numbers() {
        use TokenType::*;

        assert_eq!(
            tokens("1 -2.5 +.5 10px 50% 1e3 -x .5em"),
            vec![
                (Number, "1"),
                (WhiteSpace, " "),
                (Number, "-2.5"),
                (WhiteSpace, " "),
                (Number, "+.5"),
                (WhiteSpace, " "),
                (Dimension, "10px"),
                (WhiteSpace, " "),
                (Percentage, "50%"),
                (WhiteSpace, " "),
                (Number, "1e3"),
                (WhiteSpace, " "),
                (Ident, "-x"),
                (WhiteSpace, " "),
                (Dimension, ".5em"),
            ]
        );
    }

    #[test]
    fn tokenizes_urls_and_functions() {
        use TokenType::*;

        assert_eq!(tokens("url(a.png)"), vec![(Url, "url(a.png)")]);
        assert_eq!(tokens("URL( a.png )"), vec![(Url, "URL( a.png )")]);
        assert_eq!(
            tokens("url( 'a.png')"),
            vec![(Function, "url("), (WhiteSpace, " "), (String, "'a.png'"), (RightParenthesis, ")")]
        );
        assert_eq!(tokens("url(a b)"), vec![(BadUrl, "url(a b)")]);
        assert_eq!(tokens("rgb(1"), vec![(Function, "rgb("), (Number, "1")]);
        assert_eq!(tokens("url(a"), vec![(Url, "url(a")]);
    }

    #[test]
    fn tokenizes_strings() {
        use TokenType::*;

        assert_eq!(tokens("'a\\'b'"), vec![(String, "'a\\'b'")]);
        assert_eq!(tokens("\"abc"), vec![(String, "\"abc")]);
        assert_eq!(tokens("'a\nb'"), vec![(BadString, "'a"), (WhiteSpace, "\n"), (Ident, "b"), (String, "'")]);
        assert_eq!(tokens("'a\\\nb'"), vec![(String, "'a\\\nb'")]);
    }

    #[test]
    fn tokenizes_comments_and_cdo_cdc() {
        use TokenType::*;

        assert_eq!(tokens("/* x */a"), vec![(Comment, "/* x */"), (Ident, "a")]);
        assert_eq!(tokens("/* x"), vec![(Comment, "/* x")]);
        assert_eq!(tokens("<!-- -->"), vec![(Cdo, "<!--"), (WhiteSpace, " "), (Cdc, "-->")]);
        assert_eq!(tokens("/a"), vec![(Delim, "/"), (Ident, "a")]);
    }

    #[test]
    fn tokenizes_hash_and_at_keyword() {
        use TokenType::*;

        assert_eq!(tokens("#fff"), vec![(Hash, "#fff")]);
        assert_eq!(tokens("#1a"), vec![(Hash, "#1a")]);
        assert_eq!(tokens("# a"), vec![(Delim, "#"), (WhiteSpace, " "), (Ident, "a")]);
        assert_eq!(tokens("@media"), vec![(AtKeyword, "@media")]);
        assert_eq!(tokens("@-x"), vec![(AtKeyword, "@-x")]);
        assert_eq!(tokens("@1"), vec![(Delim, "@"), (Number, "1")]);
    }

    #[test]
    fn tokenizes_escapes_and_non_ascii() {
        use TokenType::*;

        assert_eq!(tokens("\\31 a"), vec![(Ident, "\\31 a")]);
        assert_eq!(tokens("caf\u{e9}"), vec![(Ident, "caf\u{e9}")]);
        assert_eq!(tokens("\u{feff}a"), vec![(Ident, "a")]);
        assert_eq!(tokens("\\\n"), vec![(Delim, "\\"), (WhiteSpace, "\n")]);
    }

    #[test]
    fn tokenizes_brackets() {
        use TokenType::*;

        assert_eq!(
            types("[a](b){c}"),
            vec![
                LeftSquareBracket,
                Ident,
                RightSquareBracket,
                LeftParenthesis,
                Ident,
                RightParenthesis,
                LeftCurlyBracket,
                Ident,
                RightCurlyBracket,
            ]
        );
    }

    #[test]
    fn offsets_cover_the_source() {
        let source = "a { b: url(x) 'y' /* z */ } @m (1+2)";
        let mut last = 0;

        tokenize(source, |_, start, end| {
            assert_eq!(start, last);
            assert!(end > start);
            last = end;
        });

        assert_eq!(last, source.len());
    }

    #[test]
    fn token_type_round_trips_through_tag() {
        for ty in TokenType::ALL {
            assert_eq!(TokenType::from_u8(ty as u8), ty);
        }
    }
}
