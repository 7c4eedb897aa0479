//! Event-dispatch parse loop.
//!
//! [`drive`] walks a header value, skipping whitespace and classifying the
//! next significant character, and hands each lexical unit to an
//! [`EventHandler`]. The loop has no grammar knowledge of its own: handlers
//! decide what a token, a `;` or a `,` means at their current state.
//!
//! # Example
//!
//! ```
//! use headerkit::Result;
//! use headerkit::chars::is_token_char;
//! use headerkit::parser::{Cursor, EventHandler, drive};
//!
//! #[derive(Default)]
//! struct Words(Vec<String>);
//!
//! impl<'a> EventHandler<'a> for Words {
//!     fn on_token(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
//!         self.0.push(cursor.token(is_token_char).to_string());
//!         Ok(())
//!     }
//!
//!     fn on_multi_value_separator(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
//!         cursor.advance();
//!         Ok(())
//!     }
//! }
//!
//! let mut words = Words::default();
//! drive(&mut Cursor::new("gzip, br"), &mut words).unwrap();
//! assert_eq!(words.0, ["gzip", "br"]);
//! ```

use crate::Result;
use crate::chars::is_token_char;

use super::Cursor;

/// Classification of the next significant character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A token character.
    Token,
    /// `"`
    QuotedText,
    /// `/`
    Slash,
    /// `*`
    Wildcard,
    /// `(`
    Comment,
    /// `;`
    TokenSeparator,
    /// `=`
    KeyValueSeparator,
    /// `,`
    MultiValueSeparator,
    /// Anything else.
    Invalid,
}

/// Classifies a byte. Structural characters take precedence over token
/// characters, so `*` is always a wildcard event.
#[must_use]
pub const fn classify(byte: u8) -> Event {
    match byte {
        b'"' => Event::QuotedText,
        b'/' => Event::Slash,
        b'*' => Event::Wildcard,
        b'(' => Event::Comment,
        b';' => Event::TokenSeparator,
        b'=' => Event::KeyValueSeparator,
        b',' => Event::MultiValueSeparator,
        _ if is_token_char(byte) => Event::Token,
        _ => Event::Invalid,
    }
}

/// Hooks invoked by [`drive`].
///
/// Each hook is called with the cursor on the character that triggered it
/// and must consume at least that character. Unless overridden, hooks reject
/// the character with an invalid-character error.
pub trait EventHandler<'a> {
    /// Called once after each contiguous run of whitespace was skipped.
    fn on_whitespace(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        let _ = cursor;
        Ok(())
    }

    /// Called on a token character.
    fn on_token(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        Err(cursor.unexpected())
    }

    /// Called on `"`.
    fn on_quoted_text(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        Err(cursor.unexpected())
    }

    /// Called on `/`.
    fn on_slash(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        Err(cursor.unexpected())
    }

    /// Called on `*`.
    fn on_wildcard(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        Err(cursor.unexpected())
    }

    /// Called on `(`.
    fn on_comment(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        Err(cursor.unexpected())
    }

    /// Called on `;`.
    fn on_token_separator(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        Err(cursor.unexpected())
    }

    /// Called on `=`.
    fn on_key_value_separator(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        Err(cursor.unexpected())
    }

    /// Called on `,`.
    fn on_multi_value_separator(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        Err(cursor.unexpected())
    }

    /// Called by handlers when a required value is absent at `position`.
    fn on_missing_value(&mut self, cursor: &mut Cursor<'a>, position: usize) -> Result<()> {
        Err(cursor.missing_value(position))
    }

    /// Called exactly once when the whole text has been consumed.
    fn on_end_of_text(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        let _ = cursor;
        Ok(())
    }
}

/// Runs `handler` over the remaining text of `cursor` until end of text or
/// the first error.
///
/// # Errors
///
/// Returns the first error raised by a primitive or a hook. A hook that
/// returns without consuming anything is reported as an invalid character.
pub fn drive<'a, H>(cursor: &mut Cursor<'a>, handler: &mut H) -> Result<()>
where
    H: EventHandler<'a> + ?Sized,
{
    tracing::trace!(text = cursor.text(), "parsing header value");

    let result = run(cursor, handler);
    if let Err(error) = &result {
        tracing::debug!(%error, "rejected header value");
    }
    result
}

fn run<'a, H>(cursor: &mut Cursor<'a>, handler: &mut H) -> Result<()>
where
    H: EventHandler<'a> + ?Sized,
{
    loop {
        if cursor.skip_whitespace()? {
            handler.on_whitespace(cursor)?;
        }

        let Some(byte) = cursor.peek() else {
            break;
        };
        let start = cursor.position();

        match classify(byte) {
            Event::Token => handler.on_token(cursor)?,
            Event::QuotedText => handler.on_quoted_text(cursor)?,
            Event::Slash => handler.on_slash(cursor)?,
            Event::Wildcard => handler.on_wildcard(cursor)?,
            Event::Comment => handler.on_comment(cursor)?,
            Event::TokenSeparator => handler.on_token_separator(cursor)?,
            Event::KeyValueSeparator => handler.on_key_value_separator(cursor)?,
            Event::MultiValueSeparator => handler.on_multi_value_separator(cursor)?,
            Event::Invalid => return Err(cursor.invalid_character(start)),
        }

        if cursor.position() == start {
            return Err(cursor.invalid_character(start));
        }
    }

    handler.on_end_of_text(cursor)
}
