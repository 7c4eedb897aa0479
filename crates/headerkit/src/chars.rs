//! Character classes used by the header grammars.
//!
//! All predicates operate on single bytes. Header text is ASCII; bytes above
//! `0x7F` only ever appear as `obs-text` inside quoted strings and comments.

/// A reusable character classification predicate.
pub type CharPredicate = fn(u8) -> bool;

/// Returns true for any US-ASCII byte.
#[must_use]
pub const fn is_ascii(b: u8) -> bool {
    b.is_ascii()
}

/// Returns true for `0-9`.
#[must_use]
pub const fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

/// Returns true for `0-9`, `a-f` and `A-F`.
#[must_use]
pub const fn is_hex_digit(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

/// Returns true for `a-z` and `A-Z`.
#[must_use]
pub const fn is_alpha(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

/// Returns true for ASCII letters and digits.
#[must_use]
pub const fn is_letter_or_digit(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

/// Returns true for SP and HTAB.
#[must_use]
pub const fn is_whitespace(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Returns true for control characters (`0x00-0x1F` and DEL).
#[must_use]
pub const fn is_control(b: u8) -> bool {
    b < 0x20 || b == 0x7F
}

/// Returns true for an RFC 7230 `tchar`.
#[must_use]
pub const fn is_token_char(b: u8) -> bool {
    // tchar = "!" / "#" / "$" / "%" / "&" / "'" / "*" / "+" / "-" / "." /
    //         "^" / "_" / "`" / "|" / "~" / DIGIT / ALPHA
    matches!(b,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' |
        b'^' | b'_' | b'`' | b'|' | b'~'
    ) || b.is_ascii_alphanumeric()
}

/// Returns true for an RFC 2045 `tspecials` character.
#[must_use]
pub const fn is_tspecial(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'@' | b',' | b';' | b':' | b'\\' | b'"' | b'/' | b'['
            | b']' | b'?' | b'='
    )
}

/// Returns true for an RFC 2045 token character.
#[must_use]
pub const fn is_rfc2045_token_char(b: u8) -> bool {
    b.is_ascii() && b != b' ' && !is_control(b) && !is_tspecial(b)
}

/// Returns true for RFC 7230 `qdtext`, including `obs-text`.
#[must_use]
pub const fn is_qdtext(b: u8) -> bool {
    matches!(b, b'\t' | b' ' | 0x21 | 0x23..=0x5B | 0x5D..=0x7E) || b >= 0x80
}

/// Returns true for RFC 7230 `ctext`, including `obs-text`.
#[must_use]
pub const fn is_ctext(b: u8) -> bool {
    matches!(b, b'\t' | b' ' | 0x21..=0x27 | 0x2A..=0x5B | 0x5D..=0x7E) || b >= 0x80
}

/// Returns true for an RFC 5987 `attr-char`.
#[must_use]
pub const fn is_attr_char(b: u8) -> bool {
    matches!(b,
        b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
    ) || b.is_ascii_alphanumeric()
}

/// Returns true for an RFC 5987 `mime-charsetc`.
#[must_use]
pub const fn is_mime_charset_char(b: u8) -> bool {
    matches!(b,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'+' | b'-' | b'^' | b'_' | b'`' | b'{' | b'}' | b'~'
    ) || b.is_ascii_alphanumeric()
}

/// Returns true for characters allowed in a language tag or range.
#[must_use]
pub const fn is_language_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-'
}

/// Returns true for an RFC 2046 boundary `bchars` character.
#[must_use]
pub const fn is_boundary_char(b: u8) -> bool {
    matches!(b,
        b'\'' | b'(' | b')' | b'+' | b'_' | b',' | b'-' | b'.' | b'/' | b':' | b'=' | b'?' | b' '
    ) || b.is_ascii_alphanumeric()
}

/// Returns true if `s` is a non-empty run of token characters.
#[must_use]
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_token_char)
}
