//! Scanning helpers shared by the tokenizer, the parser and the lexer.

use super::char_code::{
    is_digit, is_hex_digit, is_name, is_newline, is_uppercase_letter, is_valid_escape,
    is_white_space, EOF,
};

const LF: u32 = 0x000A;
const CR: u32 = 0x000D;
const RIGHT_PARENTHESIS: u32 = 0x0029;
const PLUS_SIGN: u32 = 0x002B;
const HYPHEN_MINUS: u32 = 0x002D;
const FULL_STOP: u32 = 0x002E;
const LOWER_E: u32 = 0x0065;

/// Byte at `offset` as a code, or [`EOF`] past the end.
#[inline]
pub fn char_code_at(source: &[u8], offset: usize) -> u32 {
    source.get(offset).map_or(EOF, |&b| b as u32)
}

/// Length of the newline starting at `offset` (2 for CRLF, 0 if not a newline).
pub fn get_newline_length(source: &[u8], offset: usize, code: u32) -> usize {
    if !is_newline(code) {
        return 0;
    }

    if code == CR && char_code_at(source, offset + 1) == LF {
        2
    } else {
        1
    }
}

/// Case-insensitive comparison of one byte against a lower case reference.
pub fn cmp_char(source: &[u8], offset: usize, reference: u32) -> bool {
    let mut code = char_code_at(source, offset);

    if is_uppercase_letter(code) {
        code |= 32;
    }

    code == reference
}

/// Case-insensitive comparison of `source[start..end]` against a lower case
/// reference string.
pub fn cmp_str(source: &[u8], start: usize, end: usize, reference: &str) -> bool {
    if end < start || end - start != reference.len() || end > source.len() {
        return false;
    }

    source[start..end]
        .iter()
        .zip(reference.bytes())
        .all(|(&test, reference)| test.to_ascii_lowercase() == reference)
}

/// Walk back over whitespace ending at `offset` and return the first
/// whitespace position (or `offset + 1` when `offset` is not whitespace).
pub fn find_white_space_start(source: &[u8], offset: usize) -> usize {
    let mut offset = offset as isize;

    while offset >= 0 && is_white_space(char_code_at(source, offset as usize)) {
        offset -= 1;
    }

    (offset + 1) as usize
}

pub fn find_white_space_end(source: &[u8], mut offset: usize) -> usize {
    while offset < source.len() && is_white_space(source[offset] as u32) {
        offset += 1;
    }

    offset
}

pub fn find_decimal_number_end(source: &[u8], mut offset: usize) -> usize {
    while offset < source.len() && is_digit(source[offset] as u32) {
        offset += 1;
    }

    offset
}

/// Consume an escape. `offset` points at the reverse solidus, which must
/// start a valid escape. Returns the offset just past the escape.
pub fn consume_escaped(source: &[u8], offset: usize) -> usize {
    let mut offset = offset + 2;

    if is_hex_digit(char_code_at(source, offset - 1)) {
        let max_offset = source.len().min(offset + 5);

        while offset < max_offset && is_hex_digit(char_code_at(source, offset)) {
            offset += 1;
        }

        let code = char_code_at(source, offset);
        if is_white_space(code) {
            offset += get_newline_length(source, offset, code).max(1);
        }
    }

    offset
}

/// Consume a name starting at `offset` and return its end.
pub fn consume_name(source: &[u8], mut offset: usize) -> usize {
    while offset < source.len() {
        let code = source[offset] as u32;

        if is_name(code) {
            offset += 1;
            continue;
        }

        if is_valid_escape(code, char_code_at(source, offset + 1)) {
            offset = consume_escaped(source, offset);
            continue;
        }

        break;
    }

    offset
}

/// Consume a number (sign, integer part, fraction, exponent) and return its end.
pub fn consume_number(source: &[u8], mut offset: usize) -> usize {
    let mut code = char_code_at(source, offset);

    if code == PLUS_SIGN || code == HYPHEN_MINUS {
        offset += 1;
        code = char_code_at(source, offset);
    }

    if is_digit(code) {
        offset = find_decimal_number_end(source, offset + 1);
        code = char_code_at(source, offset);
    }

    if code == FULL_STOP && is_digit(char_code_at(source, offset + 1)) {
        offset = find_decimal_number_end(source, offset + 2);
    }

    if cmp_char(source, offset, LOWER_E) {
        let mut sign = 0;
        code = char_code_at(source, offset + 1);

        if code == HYPHEN_MINUS || code == PLUS_SIGN {
            sign = 1;
            code = char_code_at(source, offset + 2);
        }

        if is_digit(code) {
            offset = find_decimal_number_end(source, offset + 1 + sign + 1);
        }
    }

    offset
}

/// Skip the rest of a malformed url up to and including `)`.
pub fn consume_bad_url_remnants(source: &[u8], mut offset: usize) -> usize {
    while offset < source.len() {
        let code = source[offset] as u32;

        if code == RIGHT_PARENTHESIS {
            return offset + 1;
        }

        if is_valid_escape(code, char_code_at(source, offset + 1)) {
            offset = consume_escaped(source, offset);
        } else {
            offset += 1;
        }
    }

    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_case_insensitively() {
        let source = b"URL(foo)";
        assert!(cmp_str(source, 0, 3, "url"));
        assert!(!cmp_str(source, 0, 4, "url"));
        assert!(cmp_char(source, 0, 'u' as u32));
    }

    #[test]
    fn consumes_numbers() {
        assert_eq!(consume_number(b"12.5e-3px", 0), 7);
        assert_eq!(consume_number(b"+.5", 0), 3);
        assert_eq!(consume_number(b"1e", 0), 1);
        assert_eq!(consume_number(b"1.", 0), 1);
    }

    #[test]
    fn consumes_escapes() {
        assert_eq!(consume_escaped(b"\\41 b", 0), 4);
        assert_eq!(consume_escaped(b"\\x", 0), 2);
        assert_eq!(consume_escaped(b"\\1234567", 0), 7);
        assert_eq!(consume_escaped(b"\\41\r\nb", 0), 5);
    }

    #[test]
    fn finds_white_space_bounds() {
        let source = b"a  b ";
        assert_eq!(find_white_space_end(source, 1), 3);
        assert_eq!(find_white_space_start(source, 2), 1);
        assert_eq!(find_white_space_start(source, 4), 4);
    }

    #[test]
    fn skips_bad_url_remnants() {
        assert_eq!(consume_bad_url_remnants(b"a b)c", 0), 4);
        assert_eq!(consume_bad_url_remnants(b"a\\)b)", 0), 5);
        assert_eq!(consume_bad_url_remnants(b"abc", 0), 3);
    }
}
