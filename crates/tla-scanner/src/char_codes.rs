//! Character classification utilities.

pub const LINE_SEPARATOR: char = '\u{2028}';
pub const PARAGRAPH_SEPARATOR: char = '\u{2029}';
pub const BYTE_ORDER_MARK: char = '\u{FEFF}';
pub const ZERO_WIDTH_NON_JOINER: char = '\u{200C}';
pub const ZERO_WIDTH_JOINER: char = '\u{200D}';

#[inline]
pub fn is_line_break(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | LINE_SEPARATOR | PARAGRAPH_SEPARATOR)
}

#[inline]
pub fn is_white_space_single_line(ch: char) -> bool {
    match ch {
        ' ' | '\t' | '\u{000B}' | '\u{000C}' | '\u{00A0}' | BYTE_ORDER_MARK => true,
        _ => !ch.is_ascii() && !is_line_break(ch) && ch.is_whitespace(),
    }
}

#[inline]
pub fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '$' || ch == '_' || (!ch.is_ascii() && ch.is_alphabetic())
}

#[inline]
pub fn is_identifier_part(ch: char) -> bool {
    is_identifier_start(ch)
        || ch.is_ascii_digit()
        || (!ch.is_ascii() && ch.is_alphanumeric())
        || ch == ZERO_WIDTH_NON_JOINER
        || ch == ZERO_WIDTH_JOINER
}

#[inline]
pub fn is_digit(byte: u8) -> bool {
    byte.is_ascii_digit()
}

#[inline]
pub fn is_hex_digit(byte: u8) -> bool {
    byte.is_ascii_hexdigit()
}
