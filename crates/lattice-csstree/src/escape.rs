//! Decoding and encoding of quoted strings and `url()` tokens.

use std::fmt::Write;

use crate::tokenizer::char_code::{is_hex_digit, is_newline, is_valid_escape, is_white_space};
use crate::tokenizer::utils::consume_escaped;

const REVERSE_SOLIDUS: u32 = 0x005C;
const QUOTATION_MARK: u32 = 0x0022;
const APOSTROPHE: u32 = 0x0027;
const LEFT_PARENTHESIS: u32 = 0x0028;
const RIGHT_PARENTHESIS: u32 = 0x0029;

fn decode_escaped(escaped: &str) -> char {
    let mut chars = escaped.chars();

    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if !is_hex_digit(ch as u32) {
            return ch;
        }
    }

    let code = u32::from_str_radix(escaped.trim_end(), 16).unwrap_or(0);

    match code {
        0 | 0xD800..=0xDFFF => char::REPLACEMENT_CHARACTER,
        _ => char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER),
    }
}

/// Decode the body of a string or url between `start` and `end` (inclusive).
fn decode_range(source: &str, start: usize, end: Option<usize>) -> String {
    let bytes = source.as_bytes();
    let mut decoded = String::new();
    let Some(end) = end else { return decoded };
    let mut i = start;

    while i <= end && i < bytes.len() {
        let code = bytes[i] as u32;

        if code != REVERSE_SOLIDUS {
            let ch_len = source[i..].chars().next().map_or(1, char::len_utf8);
            decoded.push_str(&source[i..i + ch_len]);
            i += ch_len;
            continue;
        }

        if i == end {
            // a trailing backslash escapes the closing quote
            if i != bytes.len() - 1 {
                decoded = source[i + 1..].to_string();
            }
            break;
        }

        i += 1;
        let next = bytes[i] as u32;

        if is_valid_escape(REVERSE_SOLIDUS, next) && !is_hex_digit(next) {
            let ch_len = source[i..].chars().next().map_or(1, char::len_utf8);
            decoded.push_str(&source[i..i + ch_len]);
            i += ch_len;
        } else if is_valid_escape(REVERSE_SOLIDUS, next) {
            let escape_start = i - 1;
            let escape_end = consume_escaped(bytes, escape_start);
            let escaped = source.get(escape_start + 1..escape_end).unwrap_or("");
            decoded.push(decode_escaped(escaped));
            i = escape_end;
        } else {
            // escaped newline is dropped
            if next == 0x0D && bytes.get(i + 1) == Some(&b'\n') {
                i += 1;
            }
            i += 1;
        }
    }

    decoded
}

/// Decode a string token (with or without its quotes).
pub fn decode_string(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let len = bytes.len();

    if len == 0 {
        return String::new();
    }

    let first = bytes[0] as u32;
    let start = usize::from(first == QUOTATION_MARK || first == APOSTROPHE);
    let end = if start == 1 && len > 1 && bytes[len - 1] as u32 == first {
        len.checked_sub(2)
    } else {
        len.checked_sub(1)
    };

    decode_range(raw, start, end.filter(|&end| end + 1 >= start))
}

/// Serialize a decoded string as a double quoted CSS string.
pub fn encode_string(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len() + 2);
    cssparser::serialize_string(value, &mut encoded).expect("write to String");
    encoded
}

/// Decode a url token `url( ... )`.
pub fn decode_url(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let len = bytes.len();
    let mut start = 4;

    if len <= start {
        return String::new();
    }

    let mut end = if bytes[len - 1] as u32 == RIGHT_PARENTHESIS { len - 2 } else { len - 1 };

    while start < end && is_white_space(bytes[start] as u32) {
        start += 1;
    }

    while start < end && is_white_space(bytes[end] as u32) {
        end -= 1;
    }

    if end < start {
        return String::new();
    }

    decode_range(raw, start, Some(end))
}

/// Serialize a decoded url as an unquoted `url()` token.
pub fn encode_url(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len() + 5);
    let mut ws_before_hex_is_needed = false;

    encoded.push_str("url(");

    for ch in value.chars() {
        let code = ch as u32;

        if is_newline(code) {
            write!(encoded, "\\{code:x}").expect("write to String");
            ws_before_hex_is_needed = true;
        } else if is_white_space(code)
            || code == REVERSE_SOLIDUS
            || code == QUOTATION_MARK
            || code == APOSTROPHE
            || code == LEFT_PARENTHESIS
            || code == RIGHT_PARENTHESIS
        {
            encoded.push('\\');
            encoded.push(ch);
            ws_before_hex_is_needed = false;
        } else {
            if ws_before_hex_is_needed && is_hex_digit(code) {
                encoded.push(' ');
            }
            encoded.push(ch);
            ws_before_hex_is_needed = false;
        }
    }

    encoded.push(')');
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_strings() {
        assert_eq!(decode_string("\"abc\""), "abc");
        assert_eq!(decode_string("'a\\'b'"), "a'b");
        assert_eq!(decode_string("\"\\41 B\""), "AB");
        assert_eq!(decode_string("\"a\\\nb\""), "ab");
        assert_eq!(decode_string("\"unterminated"), "unterminated");
        assert_eq!(decode_string("\"\""), "");
        assert_eq!(decode_string("\"\\0\""), "\u{fffd}");
    }

    #[test]
    fn encodes_strings_with_double_quotes() {
        assert_eq!(encode_string("abc"), "\"abc\"");
        assert_eq!(encode_string("a\"b"), "\"a\\\"b\"");
        assert_eq!(decode_string(&encode_string("it's \"quoted\"")), "it's \"quoted\"");
    }

    #[test]
    fn decodes_urls() {
        assert_eq!(decode_url("url(foo.png)"), "foo.png");
        assert_eq!(decode_url("url(  foo.png  )"), "foo.png");
        assert_eq!(decode_url("url(a\\(b\\))"), "a(b)");
        assert_eq!(decode_url("url()"), "");
    }

    #[test]
    fn encodes_urls() {
        assert_eq!(encode_url("foo.png"), "url(foo.png)");
        assert_eq!(encode_url("a b(c)"), "url(a\\ b\\(c\\))");
        assert_eq!(encode_url("a\nb"), "url(a\\a b)");
        assert_eq!(decode_url(&encode_url("a b'c\"")), "a b'c\"");
    }
}
