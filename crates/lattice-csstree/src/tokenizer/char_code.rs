//! Code point classification used by the tokenizer.
//!
//! The tokenizer works on UTF-8 bytes. Every byte of a multi-byte sequence is
//! at least `0x80`, so a non-ASCII character is simply a run of name-start
//! bytes and token boundaries always fall on ASCII positions.

/// Sentinel returned when reading past the end of input.
pub const EOF: u32 = 0;

const TAB: u32 = 0x0009;
const LF: u32 = 0x000A;
const FF: u32 = 0x000C;
const CR: u32 = 0x000D;
const SPACE: u32 = 0x0020;
const REVERSE_SOLIDUS: u32 = 0x005C;
const HYPHEN_MINUS: u32 = 0x002D;
const PLUS_SIGN: u32 = 0x002B;
const FULL_STOP: u32 = 0x002E;
const LOW_LINE: u32 = 0x005F;

/// Category assigned to a code point by [`char_code_category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharCategory {
    /// Space, tab or a newline.
    WhiteSpace,
    /// `0`..`9`.
    Digit,
    /// Letters, `_` and every non-ASCII byte.
    NameStart,
    /// Control characters that are not whitespace.
    NonPrintable,
    /// End of input.
    Eof,
    /// Any other code point, dispatched on by value.
    Other(u32),
}

/// A code point between U+0030 and U+0039.
#[inline]
pub fn is_digit(code: u32) -> bool {
    (0x0030..=0x0039).contains(&code)
}

/// A digit or a letter between `a` and `f` in either case.
#[inline]
pub fn is_hex_digit(code: u32) -> bool {
    is_digit(code) || (0x0041..=0x0046).contains(&code) || (0x0061..=0x0066).contains(&code)
}

#[inline]
pub fn is_uppercase_letter(code: u32) -> bool {
    (0x0041..=0x005A).contains(&code)
}

#[inline]
pub fn is_lowercase_letter(code: u32) -> bool {
    (0x0061..=0x007A).contains(&code)
}

#[inline]
pub fn is_letter(code: u32) -> bool {
    is_uppercase_letter(code) || is_lowercase_letter(code)
}

#[inline]
pub fn is_non_ascii(code: u32) -> bool {
    code >= 0x0080
}

/// A letter, a non-ASCII code point, or `_`.
#[inline]
pub fn is_name_start(code: u32) -> bool {
    is_letter(code) || is_non_ascii(code) || code == LOW_LINE
}

/// A name-start code point, a digit, or `-`.
#[inline]
pub fn is_name(code: u32) -> bool {
    is_name_start(code) || is_digit(code) || code == HYPHEN_MINUS
}

#[inline]
pub fn is_non_printable(code: u32) -> bool {
    code <= 0x0008 || code == 0x000B || (0x000E..=0x001F).contains(&code) || code == 0x007F
}

/// LF, CR or FF. Input is not preprocessed, so all three count as newlines.
#[inline]
pub fn is_newline(code: u32) -> bool {
    code == LF || code == CR || code == FF
}

#[inline]
pub fn is_white_space(code: u32) -> bool {
    is_newline(code) || code == SPACE || code == TAB
}

/// Whether two code points start a valid escape.
#[inline]
pub fn is_valid_escape(first: u32, second: u32) -> bool {
    first == REVERSE_SOLIDUS && !is_newline(second) && second != EOF
}

/// Whether three code points would start an identifier.
pub fn is_identifier_start(first: u32, second: u32, third: u32) -> bool {
    if first == HYPHEN_MINUS {
        return is_name_start(second) || second == HYPHEN_MINUS || is_valid_escape(second, third);
    }

    if is_name_start(first) {
        return true;
    }

    if first == REVERSE_SOLIDUS {
        return is_valid_escape(first, second);
    }

    false
}

/// Whether three code points would start a number.
///
/// Returns the number of code points needed to make that decision
/// (`0` when they do not start a number).
pub fn is_number_start(first: u32, second: u32, third: u32) -> usize {
    if first == PLUS_SIGN || first == HYPHEN_MINUS {
        if is_digit(second) {
            return 2;
        }

        return if second == FULL_STOP && is_digit(third) { 3 } else { 0 };
    }

    if first == FULL_STOP {
        return if is_digit(second) { 2 } else { 0 };
    }

    if is_digit(first) {
        return 1;
    }

    0
}

/// The UTF-8 encoded byte order mark.
pub fn is_bom(source: &[u8]) -> bool {
    source.starts_with(&[0xEF, 0xBB, 0xBF])
}

/// Classify a code point for tokenizer dispatch.
pub fn char_code_category(code: u32) -> CharCategory {
    if code == EOF {
        CharCategory::Eof
    } else if is_white_space(code) {
        CharCategory::WhiteSpace
    } else if is_digit(code) {
        CharCategory::Digit
    } else if is_name_start(code) {
        CharCategory::NameStart
    } else if is_non_printable(code) {
        CharCategory::NonPrintable
    } else {
        CharCategory::Other(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_name_code_points() {
        assert!(is_name_start('a' as u32));
        assert!(is_name_start('_' as u32));
        assert!(is_name_start(0xC3));
        assert!(!is_name_start('-' as u32));
        assert!(is_name('-' as u32));
        assert!(is_name('7' as u32));
    }

    #[test]
    fn detects_identifier_start() {
        let c = |s: &str| s.chars().map(|c| c as u32).chain([0, 0, 0]).collect::<Vec<_>>();

        let v = c("-a");
        assert!(is_identifier_start(v[0], v[1], v[2]));
        let v = c("--");
        assert!(is_identifier_start(v[0], v[1], v[2]));
        let v = c("-1");
        assert!(!is_identifier_start(v[0], v[1], v[2]));
        let v = c("\\a");
        assert!(is_identifier_start(v[0], v[1], v[2]));
        let v = c("\\\n");
        assert!(!is_identifier_start(v[0], v[1], v[2]));
    }

    #[test]
    fn detects_number_start() {
        assert_eq!(is_number_start('1' as u32, 0, 0), 1);
        assert_eq!(is_number_start('+' as u32, '1' as u32, 0), 2);
        assert_eq!(is_number_start('-' as u32, '.' as u32, '5' as u32), 3);
        assert_eq!(is_number_start('.' as u32, '5' as u32, 0), 2);
        assert_eq!(is_number_start('-' as u32, 'a' as u32, 0), 0);
    }

    #[test]
    fn categorizes_code_points() {
        assert_eq!(char_code_category(0), CharCategory::Eof);
        assert_eq!(char_code_category(' ' as u32), CharCategory::WhiteSpace);
        assert_eq!(char_code_category('\r' as u32), CharCategory::WhiteSpace);
        assert_eq!(char_code_category('9' as u32), CharCategory::Digit);
        assert_eq!(char_code_category(0x01), CharCategory::NonPrintable);
        assert_eq!(char_code_category('{' as u32), CharCategory::Other('{' as u32));
    }
}
