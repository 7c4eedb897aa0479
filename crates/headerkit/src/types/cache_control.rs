//! `Cache-Control` directives (RFC 9111 §5.2).
//!
//! Each well-known directive has a fixed argument arity. Unknown directives
//! are extensions whose argument type is inferred from its text: a quoted
//! string is text, bare digits are seconds, any other bare token is text.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::chars::{is_control, is_digit, is_qdtext, is_token, is_token_char};
use crate::params::write_quoted;
use crate::parser::{Cursor, EventHandler, drive, unescape};
use crate::{Error, Result};

/// Argument arity of a well-known directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    None,
    OptionalSeconds,
    Seconds,
}

static DIRECTIVES: LazyLock<HashMap<&'static str, Arity>> = LazyLock::new(|| {
    HashMap::from([
        ("no-cache", Arity::None),
        ("no-store", Arity::None),
        ("no-transform", Arity::None),
        ("only-if-cached", Arity::None),
        ("must-revalidate", Arity::None),
        ("proxy-revalidate", Arity::None),
        ("must-understand", Arity::None),
        ("public", Arity::None),
        ("private", Arity::None),
        ("immutable", Arity::None),
        ("max-stale", Arity::OptionalSeconds),
        ("max-age", Arity::Seconds),
        ("s-maxage", Arity::Seconds),
        ("min-fresh", Arity::Seconds),
        ("stale-while-revalidate", Arity::Seconds),
        ("stale-if-error", Arity::Seconds),
    ])
});

/// Argument of a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DirectiveArgument {
    /// A delta-seconds value.
    Seconds(u64),
    /// Free text, serialized as a quoted string.
    Text(String),
}

/// A single `Cache-Control` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheDirective {
    name: Cow<'static, str>,
    argument: Option<DirectiveArgument>,
}

impl CacheDirective {
    /// `no-cache`
    pub const NO_CACHE: Self = Self::flag("no-cache");
    /// `no-store`
    pub const NO_STORE: Self = Self::flag("no-store");
    /// `no-transform`
    pub const NO_TRANSFORM: Self = Self::flag("no-transform");
    /// `only-if-cached`
    pub const ONLY_IF_CACHED: Self = Self::flag("only-if-cached");
    /// `must-revalidate`
    pub const MUST_REVALIDATE: Self = Self::flag("must-revalidate");
    /// `proxy-revalidate`
    pub const PROXY_REVALIDATE: Self = Self::flag("proxy-revalidate");
    /// `must-understand`
    pub const MUST_UNDERSTAND: Self = Self::flag("must-understand");
    /// `public`
    pub const PUBLIC: Self = Self::flag("public");
    /// `private`
    pub const PRIVATE: Self = Self::flag("private");
    /// `immutable`
    pub const IMMUTABLE: Self = Self::flag("immutable");

    const fn flag(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            argument: None,
        }
    }

    const fn seconds_directive(name: &'static str, seconds: u64) -> Self {
        Self {
            name: Cow::Borrowed(name),
            argument: Some(DirectiveArgument::Seconds(seconds)),
        }
    }

    /// `max-age=<seconds>`
    #[must_use]
    pub const fn max_age(seconds: u64) -> Self {
        Self::seconds_directive("max-age", seconds)
    }

    /// `s-maxage=<seconds>`
    #[must_use]
    pub const fn s_maxage(seconds: u64) -> Self {
        Self::seconds_directive("s-maxage", seconds)
    }

    /// `min-fresh=<seconds>`
    #[must_use]
    pub const fn min_fresh(seconds: u64) -> Self {
        Self::seconds_directive("min-fresh", seconds)
    }

    /// `max-stale` with an optional limit.
    #[must_use]
    pub const fn max_stale(seconds: Option<u64>) -> Self {
        match seconds {
            Some(seconds) => Self::seconds_directive("max-stale", seconds),
            None => Self::flag("max-stale"),
        }
    }

    /// Creates a directive, checking the argument against the arity of
    /// well-known names. Names are lower-cased.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not a token or the argument does not
    /// fit the directive.
    pub fn new(name: &str, argument: Option<DirectiveArgument>) -> Result<Self> {
        if !is_token(name) {
            return Err(Error::InvalidValue(format!(
                "Invalid cache directive name \"{name}\""
            )));
        }

        let name = intern(&name.to_ascii_lowercase());
        let valid = match (arity(&name), &argument) {
            (Some(Arity::None), Some(_))
            | (Some(Arity::Seconds), None | Some(DirectiveArgument::Text(_)))
            | (Some(Arity::OptionalSeconds), Some(DirectiveArgument::Text(_))) => false,
            _ => true,
        };
        if !valid {
            return Err(Error::InvalidValue(format!(
                "Invalid argument {argument:?} for cache directive \"{name}\""
            )));
        }
        if let Some(DirectiveArgument::Text(text)) = &argument
            && text.bytes().any(|b| is_control(b) && b != b'\t')
        {
            return Err(Error::conversion(
                &*name,
                text.as_str(),
                "control characters are not allowed",
            ));
        }

        Ok(Self { name, argument })
    }

    /// Returns the lower-cased directive name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the argument, if any.
    #[must_use]
    pub const fn argument(&self) -> Option<&DirectiveArgument> {
        self.argument.as_ref()
    }

    /// Returns the argument as seconds.
    #[must_use]
    pub const fn seconds(&self) -> Option<u64> {
        match self.argument {
            Some(DirectiveArgument::Seconds(seconds)) => Some(seconds),
            _ => None,
        }
    }

    /// Returns true if the name is not a well-known directive.
    #[must_use]
    pub fn is_extension(&self) -> bool {
        arity(&self.name).is_none()
    }

    /// Parses a comma-separated directive list.
    ///
    /// # Errors
    ///
    /// Returns an error if any directive is malformed.
    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        let mut cursor = Cursor::new(text);
        let mut parser = DirectiveParser::default();
        drive(&mut cursor, &mut parser)?;
        Ok(parser.directives)
    }
}

impl fmt::Display for CacheDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        match &self.argument {
            Some(DirectiveArgument::Seconds(seconds)) => write!(f, "={seconds}"),
            Some(DirectiveArgument::Text(text)) => {
                f.write_str("=")?;
                write_quoted(f, text)
            }
            None => Ok(()),
        }
    }
}

fn arity(name: &str) -> Option<Arity> {
    DIRECTIVES.get(name).copied()
}

/// Shares the static name of well-known directives.
fn intern(name: &str) -> Cow<'static, str> {
    match DIRECTIVES.get_key_value(name) {
        Some((known, _)) => Cow::Borrowed(*known),
        None => Cow::Owned(name.to_string()),
    }
}

/// A parsed `Cache-Control` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheControl(Vec<CacheDirective>);

impl CacheControl {
    /// Creates a header from directives.
    #[must_use]
    pub const fn new(directives: Vec<CacheDirective>) -> Self {
        Self(directives)
    }

    /// Parses a header value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is malformed.
    pub fn parse(text: &str) -> Result<Self> {
        CacheDirective::parse_list(text).map(Self)
    }

    /// Returns the directives in header order.
    #[must_use]
    pub fn directives(&self) -> &[CacheDirective] {
        &self.0
    }

    /// Returns the first directive called `name`, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CacheDirective> {
        self.0.iter().find(|d| d.name.eq_ignore_ascii_case(name))
    }

    /// Returns the `max-age` seconds.
    #[must_use]
    pub fn max_age(&self) -> Option<u64> {
        self.get("max-age").and_then(CacheDirective::seconds)
    }

    /// Returns the `s-maxage` seconds.
    #[must_use]
    pub fn s_maxage(&self) -> Option<u64> {
        self.get("s-maxage").and_then(CacheDirective::seconds)
    }

    /// Returns true if `no-cache` is present.
    #[must_use]
    pub fn no_cache(&self) -> bool {
        self.get("no-cache").is_some()
    }

    /// Returns true if `no-store` is present.
    #[must_use]
    pub fn no_store(&self) -> bool {
        self.get("no-store").is_some()
    }

    /// Returns a copy with `directive` added, replacing any directive with
    /// the same name.
    #[must_use]
    pub fn with_directive(&self, directive: CacheDirective) -> Self {
        let mut directives = self.0.clone();
        match directives.iter_mut().find(|d| d.name == directive.name) {
            Some(existing) => *existing = directive,
            None => directives.push(directive),
        }
        Self(directives)
    }
}

impl fmt::Display for CacheControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, directive) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{directive}")?;
        }
        Ok(())
    }
}

impl FromStr for CacheControl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    ExpectDirective,
    AfterDirective,
}

#[derive(Default)]
struct DirectiveParser {
    state: State,
    directives: Vec<CacheDirective>,
}

impl DirectiveParser {
    fn separator(&mut self, cursor: &mut Cursor<'_>) -> Result<()> {
        let position = cursor.position();
        let repeated_comma = !self.directives.is_empty() && cursor.peek() == Some(b',');
        match self.state {
            State::ExpectDirective if repeated_comma => self.on_missing_value(cursor, position),
            State::ExpectDirective => Err(cursor.unexpected()),
            State::AfterDirective => {
                cursor.advance();
                self.state = State::ExpectDirective;
                Ok(())
            }
        }
    }
}

impl<'a> EventHandler<'a> for DirectiveParser {
    fn on_token(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        if self.state == State::AfterDirective {
            return Err(cursor.unexpected());
        }

        let name = intern(&cursor.token(is_token_char).to_ascii_lowercase());
        let name_end = cursor.position();
        let arity = arity(&name);

        cursor.skip_whitespace()?;
        let argument = if cursor.peek() == Some(b'=') {
            if arity == Some(Arity::None) {
                return Err(cursor.unexpected());
            }
            let separator = cursor.position();
            cursor.advance();
            cursor.skip_whitespace()?;
            match cursor.peek() {
                None => return Err(cursor.missing_parameter_value(separator)),
                Some(b',' | b';') => return Err(cursor.unexpected()),
                Some(_) => {}
            }

            Some(match arity {
                Some(_) => DirectiveArgument::Seconds(read_seconds(&name, cursor)?),
                None => read_extension_argument(&name, cursor)?,
            })
        } else if arity == Some(Arity::Seconds) {
            return Err(cursor.missing_parameter_value(name_end));
        } else {
            None
        };

        self.directives.push(CacheDirective { name, argument });
        self.state = State::AfterDirective;
        Ok(())
    }

    fn on_token_separator(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        self.separator(cursor)
    }

    fn on_multi_value_separator(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        self.separator(cursor)
    }

    fn on_end_of_text(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        let position = cursor.position();
        if self.directives.is_empty() {
            return self.on_missing_value(cursor, position);
        }
        Ok(())
    }
}

fn read_seconds(name: &str, cursor: &mut Cursor<'_>) -> Result<u64> {
    if cursor.peek() == Some(b'"') {
        let text = unescape(cursor.quoted_text(is_qdtext, true)?);
        if text.is_empty() || !text.bytes().all(is_digit) {
            return Err(Error::conversion(name, text, "delta-seconds must be digits"));
        }
        return text.parse().map_err(|e| Error::conversion(name, &*text, e));
    }

    let start = cursor.position();
    let digits = cursor.token(is_digit);
    if digits.is_empty() {
        return Err(cursor.invalid_character(start));
    }
    digits.parse().map_err(|e| Error::conversion(name, digits, e))
}

fn read_extension_argument(name: &str, cursor: &mut Cursor<'_>) -> Result<DirectiveArgument> {
    if cursor.peek() == Some(b'"') {
        let text = unescape(cursor.quoted_text(is_qdtext, true)?);
        if text.bytes().any(|b| is_control(b) && b != b'\t') {
            return Err(Error::conversion(name, text, "control characters are not allowed"));
        }
        return Ok(DirectiveArgument::Text(text.into_owned()));
    }

    let start = cursor.position();
    let text = cursor.token(is_token_char);
    if text.is_empty() {
        return Err(cursor.invalid_character(start));
    }
    if text.bytes().all(is_digit) {
        return text
            .parse()
            .map(DirectiveArgument::Seconds)
            .map_err(|e| Error::conversion(name, text, e));
    }
    Ok(DirectiveArgument::Text(text.to_string()))
}
