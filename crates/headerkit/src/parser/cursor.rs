//! Bounds-checked scanning primitives over a header field value.
//!
//! A [`Cursor`] is created for a single parse call and discarded afterwards.
//! Every primitive that detects a grammar violation returns an error carrying
//! the offset of the offending character and the full original text.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

use crate::chars::{
    CharPredicate, is_attr_char, is_control, is_hex_digit, is_language_char, is_mime_charset_char,
};
use crate::encoded::EncodedText;
use crate::{Error, Result};

/// Scanning state over one header field value.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor positioned at the start of `text`.
    #[must_use]
    pub const fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Returns the complete text being scanned.
    #[must_use]
    pub const fn text(&self) -> &'a str {
        self.text
    }

    /// Returns the current offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Moves the cursor back (or forward) to `position`, clamped to the text.
    pub fn set_position(&mut self, position: usize) {
        self.pos = position.min(self.text.len());
    }

    /// Returns true if the whole text has been consumed.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// Returns the current byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    /// Returns the byte `offset` places after the current one.
    #[must_use]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    /// Consumes and returns the current byte.
    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Consumes `expected`, failing with an invalid-character error (or a
    /// missing-value error at end of text) if something else is found.
    pub fn expect(&mut self, expected: u8) -> Result<()> {
        match self.peek() {
            Some(b) if b == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(self.invalid_character(self.pos)),
            None => Err(self.missing_value(self.pos)),
        }
    }

    /// Skips spaces, tabs and folded line breaks (`CRLF` followed by at least
    /// one space or tab).
    ///
    /// Returns true if anything was skipped.
    pub fn skip_whitespace(&mut self) -> Result<bool> {
        let start = self.pos;

        loop {
            match self.peek() {
                Some(b' ' | b'\t') => self.pos += 1,
                Some(b'\r') => {
                    if self.peek_at(1) != Some(b'\n') {
                        return Err(self.invalid_character(self.pos));
                    }
                    match self.peek_at(2) {
                        Some(b' ' | b'\t') => self.pos += 3,
                        Some(_) => return Err(self.invalid_character(self.pos + 2)),
                        None => return Err(self.invalid_character(self.pos + 1)),
                    }
                }
                _ => break,
            }
        }

        Ok(self.pos > start)
    }

    /// Consumes the longest run of bytes matching `predicate`.
    ///
    /// The result may be empty; callers decide whether that is an error.
    pub fn token(&mut self, predicate: CharPredicate) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(predicate) {
            self.pos += 1;
        }
        &self.text[start..self.pos]
    }

    /// Reads a quoted string and returns its raw interior.
    ///
    /// The cursor must be on the opening `"`. With `escaping_supported`, a
    /// backslash consumes the following character unconditionally; use
    /// [`unescape`] to strip the escapes. Unescaped characters must satisfy
    /// `predicate`.
    pub fn quoted_text(
        &mut self,
        predicate: CharPredicate,
        escaping_supported: bool,
    ) -> Result<&'a str> {
        if self.peek() != Some(b'"') {
            return Err(self.unexpected());
        }
        self.pos += 1;
        let start = self.pos;

        loop {
            match self.peek() {
                None => return Err(self.missing_closing_quote()),
                Some(b'"') => {
                    let interior = &self.text[start..self.pos];
                    self.pos += 1;
                    return Ok(interior);
                }
                Some(b'\\') if escaping_supported => {
                    if self.peek_at(1).is_none() {
                        return Err(self.missing_closing_quote());
                    }
                    self.pos += 2;
                }
                Some(b) if predicate(b) => self.pos += 1,
                Some(_) => return Err(self.invalid_character(self.pos)),
            }
        }
    }

    /// Reads a comment and returns the raw text between its outer
    /// parentheses.
    ///
    /// Nested comments and single- or double-quoted spans are honoured, each
    /// with backslash escapes, so an escaped or quoted `)` does not close the
    /// comment.
    pub fn comment(&mut self) -> Result<&'a str> {
        if self.peek() != Some(b'(') {
            return Err(self.unexpected());
        }
        self.pos += 1;
        let start = self.pos;
        let mut depth = 1usize;

        loop {
            let Some(byte) = self.peek() else {
                return Err(self.missing_closing_parenthesis());
            };

            match byte {
                b'\\' => self.skip_escape()?,
                b'(' => {
                    depth += 1;
                    self.pos += 1;
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        let interior = &self.text[start..self.pos];
                        self.pos += 1;
                        return Ok(interior);
                    }
                    self.pos += 1;
                }
                b'"' | b'\'' => self.skip_quoted_span(byte)?,
                b'\t' => self.pos += 1,
                b if is_control(b) => return Err(self.invalid_character(self.pos)),
                _ => self.pos += 1,
            }
        }
    }

    /// Skips over a comment.
    pub fn skip_comment(&mut self) -> Result<()> {
        self.comment().map(|_| ())
    }

    fn skip_escape(&mut self) -> Result<()> {
        if self.peek_at(1).is_none() {
            return Err(self.missing_closing_parenthesis());
        }
        self.pos += 2;
        Ok(())
    }

    fn skip_quoted_span(&mut self, quote: u8) -> Result<()> {
        self.pos += 1;

        loop {
            match self.peek() {
                None => return Err(self.missing_closing_parenthesis()),
                Some(b'\\') => self.skip_escape()?,
                Some(b) if b == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(b'\t') => self.pos += 1,
                Some(b) if is_control(b) => return Err(self.invalid_character(self.pos)),
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Reads an RFC 5987 extended value: `charset "'" [language] "'" value`.
    ///
    /// The value part consists of `attr-char`s and `%XX` escapes and ends at
    /// whitespace, `;`, `,` or end of text.
    pub fn encoded_text(&mut self) -> Result<EncodedText> {
        let charset_start = self.pos;
        let charset = self.token(is_mime_charset_char);
        if charset.is_empty() || self.peek() != Some(b'\'') {
            return Err(Error::InvalidValue(format!(
                "Invalid charset at {charset_start} in \"{}\"",
                self.text
            )));
        }
        self.pos += 1;

        let language_start = self.pos;
        let language = self.token(is_language_char);
        if self.peek() != Some(b'\'') {
            return Err(Error::UnterminatedLanguage {
                position: self.pos,
                text: self.text.to_string(),
            });
        }
        if !language.is_empty() && !crate::types::language::is_valid_tag(language) {
            return Err(Error::InvalidValue(format!(
                "Invalid language \"{language}\" at {language_start} in \"{}\"",
                self.text
            )));
        }
        self.pos += 1;

        let value_start = self.pos;
        loop {
            match self.peek() {
                Some(b'%') => {
                    let valid = self.peek_at(1).is_some_and(is_hex_digit)
                        && self.peek_at(2).is_some_and(is_hex_digit);
                    if !valid {
                        return Err(self.invalid_encoded_text(self.pos));
                    }
                    self.pos += 3;
                }
                Some(b) if is_attr_char(b) => self.pos += 1,
                None | Some(b' ' | b'\t' | b'\r' | b';' | b',') => break,
                Some(_) => return Err(self.invalid_encoded_text(self.pos)),
            }
        }

        let raw = &self.text[value_start..self.pos];
        let bytes: Vec<u8> = percent_decode_str(raw).collect();
        let value = EncodedText::decode_bytes(charset, &bytes)
            .map_err(|_| self.invalid_encoded_text(value_start))?;

        EncodedText::new(charset, (!language.is_empty()).then_some(language), value)
    }

    /// Error for an unexpected character at `position`.
    ///
    /// Falls back to a missing-value error when `position` is at the end of
    /// the text.
    #[must_use]
    pub fn invalid_character(&self, position: usize) -> Error {
        let mut start = position.min(self.text.len());
        while !self.text.is_char_boundary(start) {
            start -= 1;
        }

        match self.text[start..].chars().next() {
            Some(character) => Error::InvalidCharacter {
                character,
                position: start,
                text: self.text.to_string(),
            },
            None => self.missing_value(position),
        }
    }

    /// Error for the character under the cursor.
    #[must_use]
    pub fn unexpected(&self) -> Error {
        self.invalid_character(self.pos)
    }

    /// Error for a value expected at `position`.
    #[must_use]
    pub fn missing_value(&self, position: usize) -> Error {
        Error::MissingValue {
            position,
            text: self.text.to_string(),
        }
    }

    /// Error for a parameter value expected at `position`.
    #[must_use]
    pub fn missing_parameter_value(&self, position: usize) -> Error {
        Error::MissingParameterValue {
            position,
            text: self.text.to_string(),
        }
    }

    fn missing_closing_quote(&self) -> Error {
        Error::MissingClosingQuote {
            text: self.text.to_string(),
        }
    }

    fn missing_closing_parenthesis(&self) -> Error {
        Error::MissingClosingParenthesis {
            text: self.text.to_string(),
        }
    }

    fn invalid_encoded_text(&self, position: usize) -> Error {
        Error::InvalidEncodedText {
            position,
            text: self.text.to_string(),
        }
    }
}

/// Removes quoted-pair backslashes from the raw interior of a quoted string
/// or comment.
#[must_use]
pub fn unescape(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\\') {
        return Cow::Borrowed(raw);
    }

    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                result.push(escaped);
            }
        } else {
            result.push(c);
        }
    }
    Cow::Owned(result)
}
