//! Byte ranges: `Content-Range` responses and `Range` requests (RFC 9110 §14).

use std::fmt;
use std::str::FromStr;

use crate::chars::{is_digit, is_token_char};
use crate::parser::{Cursor, EventHandler, drive};
use crate::{Error, Result};

const BYTES: &str = "bytes";

/// An inclusive byte range `first-last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ByteRange {
    first: u64,
    last: u64,
}

impl ByteRange {
    /// Creates a range.
    ///
    /// # Errors
    ///
    /// Returns an error if `last` is before `first`.
    pub fn new(first: u64, last: u64) -> Result<Self> {
        if last < first {
            return Err(Error::InvalidValue(format!(
                "Byte range {first}-{last} ends before it starts"
            )));
        }
        Ok(Self { first, last })
    }

    /// Returns the first byte position.
    #[must_use]
    pub const fn first(&self) -> u64 {
        self.first
    }

    /// Returns the last byte position (inclusive).
    #[must_use]
    pub const fn last(&self) -> u64 {
        self.last
    }

    /// Returns the number of bytes covered, or `None` for `0-18446744073709551615`
    /// whose length does not fit a `u64`.
    #[must_use]
    pub const fn len(&self) -> Option<u64> {
        (self.last - self.first).checked_add(1)
    }

    /// Always false; a byte range covers at least one byte.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

/// A `Content-Range` value, e.g. `bytes 0-499/1234` or `bytes */1234`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentRange {
    unit: String,
    range: Option<ByteRange>,
    size: Option<u64>,
}

impl ContentRange {
    /// Creates a byte content range. `None` stands for `*`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range ends at or beyond a known size.
    pub fn new(range: Option<ByteRange>, size: Option<u64>) -> Result<Self> {
        if let (Some(range), Some(size)) = (range, size) {
            if range.last >= size {
                return Err(Error::InvalidValue(format!(
                    "Byte range {range} exceeds complete length {size}"
                )));
            }
        }
        Ok(Self {
            unit: BYTES.to_string(),
            range,
            size,
        })
    }

    /// `bytes */<size>`, sent with `416 Range Not Satisfiable`.
    #[must_use]
    pub fn unsatisfied(size: u64) -> Self {
        Self {
            unit: BYTES.to_string(),
            range: None,
            size: Some(size),
        }
    }

    /// Returns the range unit.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Returns the range, or `None` for `*`.
    #[must_use]
    pub const fn range(&self) -> Option<ByteRange> {
        self.range
    }

    /// Returns the complete length, or `None` for `*`.
    #[must_use]
    pub const fn size(&self) -> Option<u64> {
        self.size
    }

    /// Parses a `Content-Range` value.
    ///
    /// # Errors
    ///
    /// Returns `MissingUnit` if the value does not start with `bytes`, and
    /// positional or structural errors otherwise.
    pub fn parse(text: &str) -> Result<Self> {
        let mut cursor = Cursor::new(text);
        let mut parser = ContentRangeParser::default();
        drive(&mut cursor, &mut parser)?;
        Self::new(parser.range, parser.size)
    }
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.unit)?;
        match self.range {
            Some(range) => write!(f, "{range}")?,
            None => f.write_str("*")?,
        }
        match self.size {
            Some(size) => write!(f, "/{size}"),
            None => f.write_str("/*"),
        }
    }
}

impl FromStr for ContentRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Stage {
    #[default]
    Unit,
    Range,
    Slash,
    Size,
    Done,
}

#[derive(Default)]
struct ContentRangeParser {
    stage: Stage,
    range: Option<ByteRange>,
    size: Option<u64>,
}

impl<'a> EventHandler<'a> for ContentRangeParser {
    // Only the unit is followed by whitespace; trailing whitespace is ignored.
    fn on_whitespace(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        match self.stage {
            Stage::Slash | Stage::Size | Stage::Done if cursor.peek().is_some() => {
                Err(cursor.unexpected())
            }
            _ => Ok(()),
        }
    }

    fn on_token(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        match self.stage {
            Stage::Unit => {
                let unit = cursor.token(is_token_char);
                if !unit.eq_ignore_ascii_case(BYTES) {
                    return Err(missing_unit(cursor));
                }
                self.stage = Stage::Range;
                Ok(())
            }
            Stage::Range => {
                let first = read_number(cursor, "first-pos")?;
                cursor.expect(b'-')?;
                let last = read_number(cursor, "last-pos")?;
                self.range = Some(ByteRange::new(first, last)?);
                self.stage = Stage::Slash;
                Ok(())
            }
            Stage::Size => {
                self.size = Some(read_number(cursor, "complete-length")?);
                self.stage = Stage::Done;
                Ok(())
            }
            Stage::Slash | Stage::Done => Err(cursor.unexpected()),
        }
    }

    fn on_wildcard(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        match self.stage {
            Stage::Unit => Err(missing_unit(cursor)),
            Stage::Range => {
                cursor.advance();
                self.stage = Stage::Slash;
                Ok(())
            }
            Stage::Size => {
                cursor.advance();
                self.stage = Stage::Done;
                Ok(())
            }
            Stage::Slash | Stage::Done => Err(cursor.unexpected()),
        }
    }

    fn on_slash(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        match self.stage {
            Stage::Unit => Err(missing_unit(cursor)),
            Stage::Slash => {
                cursor.advance();
                self.stage = Stage::Size;
                Ok(())
            }
            _ => Err(cursor.unexpected()),
        }
    }

    fn on_quoted_text(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        match self.stage {
            Stage::Unit => Err(missing_unit(cursor)),
            _ => Err(cursor.unexpected()),
        }
    }

    fn on_end_of_text(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        let position = cursor.position();
        match self.stage {
            Stage::Unit => Err(missing_unit(cursor)),
            Stage::Done => Ok(()),
            _ => self.on_missing_value(cursor, position),
        }
    }
}

fn missing_unit(cursor: &Cursor<'_>) -> Error {
    Error::MissingUnit {
        text: cursor.text().to_string(),
    }
}

fn read_number(cursor: &mut Cursor<'_>, what: &str) -> Result<u64> {
    let start = cursor.position();
    let digits = cursor.token(is_digit);
    if digits.is_empty() {
        return Err(cursor.invalid_character(start));
    }
    digits.parse().map_err(|e| Error::conversion(what, digits, e))
}

/// One range of a `Range` request header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ByteRangeSpec {
    /// `first-last`
    FromTo(ByteRange),
    /// `first-`, to the end of the representation.
    From(u64),
    /// `-length`, the final `length` bytes.
    Suffix(u64),
}

impl ByteRangeSpec {
    /// Resolves the range against a representation of `complete_length`
    /// bytes. Returns `None` if it is not satisfiable.
    #[must_use]
    pub fn resolve(&self, complete_length: u64) -> Option<ByteRange> {
        if complete_length == 0 {
            return None;
        }
        let end = complete_length - 1;
        let (first, last) = match *self {
            Self::FromTo(range) => (range.first, range.last.min(end)),
            Self::From(first) => (first, end),
            Self::Suffix(0) => return None,
            Self::Suffix(length) => (complete_length.saturating_sub(length), end),
        };
        (first <= last).then_some(ByteRange { first, last })
    }

    /// Start and inclusive end (`None` for open-ended), without suffixes.
    const fn bounds(&self) -> Option<(u64, Option<u64>)> {
        match *self {
            Self::FromTo(range) => Some((range.first, Some(range.last))),
            Self::From(first) => Some((first, None)),
            Self::Suffix(_) => None,
        }
    }
}

impl fmt::Display for ByteRangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FromTo(range) => write!(f, "{range}"),
            Self::From(first) => write!(f, "{first}-"),
            Self::Suffix(length) => write!(f, "-{length}"),
        }
    }
}

/// A `Range` request header, e.g. `bytes=0-499, 1000-`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    unit: String,
    ranges: Vec<ByteRangeSpec>,
}

impl Range {
    /// Creates a byte range set.
    ///
    /// # Errors
    ///
    /// Returns an error if `ranges` is empty or two ranges overlap.
    pub fn new(ranges: Vec<ByteRangeSpec>) -> Result<Self> {
        if ranges.is_empty() {
            return Err(Error::InvalidValue("Range requires at least one range".into()));
        }

        let mut bounds: Vec<_> = ranges.iter().filter_map(ByteRangeSpec::bounds).collect();
        bounds.sort_unstable_by_key(|&(first, _)| first);
        for pair in bounds.windows(2) {
            let (_, previous_end) = pair[0];
            let (next_start, _) = pair[1];
            if previous_end.is_none_or(|end| end >= next_start) {
                return Err(Error::InvalidValue(format!(
                    "Overlapping byte ranges in {}",
                    join(&ranges)
                )));
            }
        }

        Ok(Self {
            unit: BYTES.to_string(),
            ranges,
        })
    }

    /// Returns the range unit.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Returns the requested ranges in header order.
    #[must_use]
    pub fn ranges(&self) -> &[ByteRangeSpec] {
        &self.ranges
    }

    /// Resolves every range against `complete_length`, dropping the
    /// unsatisfiable ones.
    #[must_use]
    pub fn resolve(&self, complete_length: u64) -> Vec<ByteRange> {
        self.ranges
            .iter()
            .filter_map(|spec| spec.resolve(complete_length))
            .collect()
    }

    /// Parses a `Range` value.
    ///
    /// # Errors
    ///
    /// Returns `MissingUnit` if the value does not start with `bytes=`,
    /// positional errors for malformed ranges and a structural error for
    /// overlapping ones.
    pub fn parse(text: &str) -> Result<Self> {
        let mut cursor = Cursor::new(text);
        let mut parser = RangeParser::default();
        drive(&mut cursor, &mut parser)?;
        Self::new(parser.ranges)
    }
}

fn join(ranges: &[ByteRangeSpec]) -> String {
    ranges
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.unit, join(&self.ranges))
    }
}

impl FromStr for Range {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum RangeState {
    #[default]
    Unit,
    ExpectSpec,
    AfterSpec,
}

#[derive(Default)]
struct RangeParser {
    state: RangeState,
    ranges: Vec<ByteRangeSpec>,
}

impl RangeParser {
    fn read_spec(cursor: &mut Cursor<'_>) -> Result<ByteRangeSpec> {
        if cursor.peek() == Some(b'-') {
            cursor.advance();
            return read_number(cursor, "suffix-length").map(ByteRangeSpec::Suffix);
        }

        let first = read_number(cursor, "first-pos")?;
        cursor.expect(b'-')?;
        if !cursor.peek().is_some_and(is_digit) {
            return Ok(ByteRangeSpec::From(first));
        }
        let last = read_number(cursor, "last-pos")?;
        ByteRange::new(first, last).map(ByteRangeSpec::FromTo)
    }
}

impl<'a> EventHandler<'a> for RangeParser {
    fn on_token(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        match self.state {
            RangeState::Unit => {
                let unit = cursor.token(is_token_char);
                if !unit.eq_ignore_ascii_case(BYTES) {
                    return Err(missing_unit(cursor));
                }
                cursor.skip_whitespace()?;
                cursor.expect(b'=')?;
                self.state = RangeState::ExpectSpec;
                Ok(())
            }
            RangeState::ExpectSpec => {
                self.ranges.push(Self::read_spec(cursor)?);
                self.state = RangeState::AfterSpec;
                Ok(())
            }
            RangeState::AfterSpec => Err(cursor.unexpected()),
        }
    }

    fn on_multi_value_separator(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        let position = cursor.position();
        match self.state {
            RangeState::Unit => Err(missing_unit(cursor)),
            RangeState::ExpectSpec => self.on_missing_value(cursor, position),
            RangeState::AfterSpec => {
                cursor.advance();
                self.state = RangeState::ExpectSpec;
                Ok(())
            }
        }
    }

    fn on_end_of_text(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        let position = cursor.position();
        match self.state {
            RangeState::Unit => Err(missing_unit(cursor)),
            RangeState::ExpectSpec => self.on_missing_value(cursor, position),
            RangeState::AfterSpec => Ok(()),
        }
    }
}
