//! Whitespace insertion between adjacent tokens.
//!
//! Each emitted token is classified by a code: its [`TokenType`] tag, or for
//! delims the first character shifted left by eight bits. A whitespace is
//! required when the `(previous, next)` code pair appears in the table for
//! the active mode, since concatenating those tokens directly would read
//! back as a different token sequence.

use crate::tokenizer::TokenType;

use super::GenerateMode;

const PLUS_SIGN: char = '+';
const HYPHEN_MINUS: char = '-';

const fn ty(token: TokenType) -> u32 {
    token as u32
}

const fn delim(ch: char) -> u32 {
    (ch as u32) << 8
}

use TokenType::{
    AtKeyword, BadUrl, Cdc, Colon, Dimension, Function, Hash, Ident, LeftParenthesis, Number,
    Percentage, RightParenthesis, String as StringToken, Url,
};

// CSS Syntax 3, section 9 (serialization)
const SPEC_PAIRS: &[(u32, u32)] = &[
    (ty(Ident), ty(Ident)),
    (ty(Ident), ty(Function)),
    (ty(Ident), ty(Url)),
    (ty(Ident), ty(BadUrl)),
    (ty(Ident), delim('-')),
    (ty(Ident), ty(Number)),
    (ty(Ident), ty(Percentage)),
    (ty(Ident), ty(Dimension)),
    (ty(Ident), ty(Cdc)),
    (ty(Ident), ty(LeftParenthesis)),
    (ty(AtKeyword), ty(Ident)),
    (ty(AtKeyword), ty(Function)),
    (ty(AtKeyword), ty(Url)),
    (ty(AtKeyword), ty(BadUrl)),
    (ty(AtKeyword), delim('-')),
    (ty(AtKeyword), ty(Number)),
    (ty(AtKeyword), ty(Percentage)),
    (ty(AtKeyword), ty(Dimension)),
    (ty(AtKeyword), ty(Cdc)),
    (ty(Hash), ty(Ident)),
    (ty(Hash), ty(Function)),
    (ty(Hash), ty(Url)),
    (ty(Hash), ty(BadUrl)),
    (ty(Hash), delim('-')),
    (ty(Hash), ty(Number)),
    (ty(Hash), ty(Percentage)),
    (ty(Hash), ty(Dimension)),
    (ty(Hash), ty(Cdc)),
    (ty(Dimension), ty(Ident)),
    (ty(Dimension), ty(Function)),
    (ty(Dimension), ty(Url)),
    (ty(Dimension), ty(BadUrl)),
    (ty(Dimension), delim('-')),
    (ty(Dimension), ty(Number)),
    (ty(Dimension), ty(Percentage)),
    (ty(Dimension), ty(Dimension)),
    (ty(Dimension), ty(Cdc)),
    (delim('#'), ty(Ident)),
    (delim('#'), ty(Function)),
    (delim('#'), ty(Url)),
    (delim('#'), ty(BadUrl)),
    (delim('#'), delim('-')),
    (delim('#'), ty(Number)),
    (delim('#'), ty(Percentage)),
    (delim('#'), ty(Dimension)),
    (delim('-'), ty(Ident)),
    (delim('-'), ty(Function)),
    (delim('-'), ty(Url)),
    (delim('-'), ty(BadUrl)),
    (delim('-'), delim('-')),
    (delim('-'), ty(Number)),
    (delim('-'), ty(Percentage)),
    (delim('-'), ty(Dimension)),
    (ty(Number), ty(Ident)),
    (ty(Number), ty(Function)),
    (ty(Number), ty(Url)),
    (ty(Number), ty(BadUrl)),
    (ty(Number), ty(Number)),
    (ty(Number), ty(Percentage)),
    (ty(Number), ty(Dimension)),
    (delim('@'), ty(Ident)),
    (delim('@'), ty(Function)),
    (delim('@'), ty(Url)),
    (delim('@'), ty(BadUrl)),
    (delim('@'), delim('-')),
    (delim('.'), ty(Number)),
    (delim('.'), ty(Percentage)),
    (delim('.'), ty(Dimension)),
    (delim('+'), ty(Number)),
    (delim('+'), ty(Percentage)),
    (delim('+'), ty(Dimension)),
    (delim('/'), delim('*')),
];

// pairs that re-tokenize correctly but trip up older consumers
const SAFE_PAIRS: &[(u32, u32)] = &[
    (ty(AtKeyword), ty(LeftParenthesis)),
    (ty(AtKeyword), ty(StringToken)),
    (ty(AtKeyword), ty(Colon)),
    (ty(RightParenthesis), ty(Ident)),
    (ty(RightParenthesis), ty(Function)),
    (ty(RightParenthesis), ty(Url)),
    (ty(Url), ty(Ident)),
    (ty(Url), ty(Function)),
    (ty(Url), ty(Url)),
];

/// Classification code of a token about to be emitted.
pub(crate) fn token_code(token: TokenType, value: &str) -> u32 {
    if token != TokenType::Delim {
        return ty(token);
    }

    match value.chars().next() {
        Some(ch) if (ch as u32) > 0x7F => 0x8000,
        Some(ch) => delim(ch),
        None => 0,
    }
}

/// Whether a whitespace must separate a token with code `prev` from the
/// token `(next, value)`.
pub(crate) fn is_white_space_required(
    mode: GenerateMode,
    prev: u32,
    next: TokenType,
    value: &str,
) -> bool {
    let next_code = match value.chars().next() {
        Some(ch @ (PLUS_SIGN | HYPHEN_MINUS)) => delim(ch),
        _ => token_code(next, value),
    };
    let pair = (prev, next_code);

    SPEC_PAIRS.contains(&pair) || (mode == GenerateMode::Safe && SAFE_PAIRS.contains(&pair))
}
