//! Header value parameters.
//!
//! Parameters are `;name=value` pairs attached to a header value. Names are
//! case-insensitive and stored lower-cased; values are typed according to
//! the parameter name (see [`ParamValue::convert`]).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use thiserror::Error;

use crate::chars::{is_boundary_char, is_control, is_token};
use crate::encoded::EncodedText;
use crate::{Error, Result};

/// Error parsing a q-factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QValueError {
    /// Not of the form `0[.ddd]` or `1[.000]`.
    #[error("invalid q-factor syntax")]
    Syntax,
    /// Greater than one.
    #[error("q-factor must be between 0 and 1")]
    OutOfRange,
    /// More than three decimals.
    #[error("q-factor allows at most three decimals")]
    TooPrecise,
}

/// A quality value (`q` parameter) between 0 and 1 with three decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QValue(u16);

impl QValue {
    /// `q=1`, the default weight.
    pub const MAX: Self = Self(1000);
    /// `q=0`, meaning "not acceptable".
    pub const MIN: Self = Self(0);

    /// Creates a q-factor from thousandths (`500` is `0.5`).
    #[must_use]
    pub const fn from_thousandths(n: u16) -> Option<Self> {
        if n <= 1000 { Some(Self(n)) } else { None }
    }

    /// Returns the value in thousandths.
    #[must_use]
    pub const fn thousandths(self) -> u16 {
        self.0
    }

    /// Returns the value as a float.
    #[must_use]
    pub fn as_f32(self) -> f32 {
        f32::from(self.0) / 1000.0
    }
}

impl Default for QValue {
    fn default() -> Self {
        Self::MAX
    }
}

impl FromStr for QValue {
    type Err = QValueError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(QValueError::Syntax);
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(QValueError::Syntax);
        }
        if fraction.len() > 3 {
            return Err(QValueError::TooPrecise);
        }

        let mut thousandths: u16 = 0;
        for (i, b) in fraction.bytes().enumerate() {
            let scale = [100, 10, 1][i];
            thousandths += u16::from(b - b'0') * scale;
        }

        match whole {
            "0" => Ok(Self(thousandths)),
            "1" if thousandths == 0 => Ok(Self::MAX),
            _ => Err(QValueError::OutOfRange),
        }
    }
}

impl fmt::Display for QValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            1000 => f.write_str("1"),
            0 => f.write_str("0"),
            n => {
                let digits = format!("{n:03}");
                write!(f, "0.{}", digits.trim_end_matches('0'))
            }
        }
    }
}

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamValue {
    /// Plain text, from a token or a quoted string.
    Text(String),
    /// A non-negative integer.
    Number(u64),
    /// A q-factor.
    Quality(QValue),
    /// A charset name.
    Charset(String),
    /// An RFC 5987 extended value.
    Encoded(EncodedText),
    /// An RFC 2822 date.
    Date(DateTime<FixedOffset>),
}

impl ParamValue {
    /// Converts the (unquoted) text of parameter `name` into its typed form.
    ///
    /// `q` becomes a [`QValue`], `charset` a charset token and `boundary` is
    /// checked against the RFC 2046 boundary alphabet; anything else is
    /// plain text.
    ///
    /// # Errors
    ///
    /// Returns a conversion error naming the parameter if the text does not
    /// fit the parameter's type.
    pub fn convert(name: &str, text: &str) -> Result<Self> {
        match name {
            "q" => text
                .parse()
                .map(Self::Quality)
                .map_err(|e| Error::conversion(name, text, e)),
            "charset" => {
                if is_token(text) {
                    Ok(Self::Charset(text.to_string()))
                } else {
                    Err(Error::conversion(name, text, "charset must be a token"))
                }
            }
            "boundary" => {
                validate_boundary(text).map_err(|message| Error::conversion(name, text, message))?;
                Ok(Self::Text(text.to_string()))
            }
            _ => Ok(Self::Text(text.to_string())),
        }
    }

    /// Parses a non-negative integer parameter.
    ///
    /// # Errors
    ///
    /// Returns a conversion error naming the parameter on failure.
    pub fn number(name: &str, text: &str) -> Result<Self> {
        text.parse()
            .map(Self::Number)
            .map_err(|e| Error::conversion(name, text, e))
    }

    /// Parses an RFC 2822 date parameter.
    ///
    /// # Errors
    ///
    /// Returns a conversion error naming the parameter on failure.
    pub fn date(name: &str, text: &str) -> Result<Self> {
        DateTime::parse_from_rfc2822(text)
            .map(Self::Date)
            .map_err(|e| Error::conversion(name, text, e))
    }

    /// Brings a value into the form parsing its serialization would give
    /// for parameter `name`.
    ///
    /// Text and charset values are re-typed with [`ParamValue::convert`],
    /// as is anything stored under `q`, `charset` or `boundary`. A q-factor
    /// under any other name becomes text. Other numbers and dates belong to
    /// header-specific grammars and are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the text contains control characters, does not
    /// convert, or an encoded value is paired with a name not ending in `*`
    /// (or the reverse).
    pub fn normalize(name: &str, value: Self) -> Result<Self> {
        let extended = name.ends_with('*');
        match &value {
            Self::Encoded(_) if extended => Ok(value),
            Self::Encoded(_) => Err(Error::InvalidValue(format!(
                "Encoded value requires a parameter name ending in '*', got \"{name}\""
            ))),
            _ if extended => Err(Error::InvalidValue(format!(
                "Parameter \"{name}\" requires an encoded value"
            ))),
            Self::Text(text) | Self::Charset(text) => {
                if text.bytes().any(|b| is_control(b) && b != b'\t') {
                    return Err(Error::conversion(
                        name,
                        text.as_str(),
                        "control characters are not allowed",
                    ));
                }
                Self::convert(name, text)
            }
            Self::Quality(_) | Self::Number(_) if matches!(name, "q" | "charset" | "boundary") => {
                Self::convert(name, &value.to_string())
            }
            Self::Quality(q) => Ok(Self::Text(q.to_string())),
            Self::Number(_) | Self::Date(_) => Ok(value),
        }
    }

    /// Returns the text of a `Text` or `Charset` value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Charset(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write_text(f, s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Quality(q) => write!(f, "{q}"),
            Self::Charset(s) => f.write_str(s),
            Self::Encoded(e) => write!(f, "{e}"),
            Self::Date(d) => write_quoted(f, &d.to_rfc2822()),
        }
    }
}

fn validate_boundary(text: &str) -> std::result::Result<(), &'static str> {
    if text.is_empty() || text.len() > 70 {
        return Err("boundary must be 1 to 70 characters");
    }
    if !text.bytes().all(is_boundary_char) {
        return Err("boundary contains a character outside the RFC 2046 alphabet");
    }
    if text.ends_with(' ') {
        return Err("boundary must not end with a space");
    }
    Ok(())
}

/// Writes `s` as a token if possible, as a quoted string otherwise.
pub(crate) fn write_text(f: &mut impl fmt::Write, s: &str) -> fmt::Result {
    if is_token(s) {
        f.write_str(s)
    } else {
        write_quoted(f, s)
    }
}

/// Writes `s` as a quoted string, escaping `"` and `\`.
pub(crate) fn write_quoted(f: &mut impl fmt::Write, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        if c == '"' || c == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}

/// Ordered parameter map.
///
/// Insertion order is kept for serialization. Inserting a name that is
/// already present replaces its value in place (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameters(IndexMap<String, ParamValue>);

impl Parameters {
    /// Creates an empty parameter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter, returning the value it replaced.
    ///
    /// The value is passed through [`ParamValue::normalize`], so a map
    /// built here serializes to text that parses back to the same map.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not a token or the value does not fit
    /// the parameter.
    pub fn insert(&mut self, name: &str, value: ParamValue) -> Result<Option<ParamValue>> {
        if !is_token(name) {
            return Err(Error::InvalidValue(format!(
                "Invalid parameter name \"{name}\""
            )));
        }
        let name = name.to_ascii_lowercase();
        let value = ParamValue::normalize(&name, value)?;
        Ok(self.0.insert(name, value))
    }

    /// Inserts a value already known to be in normalized form.
    pub(crate) fn set(&mut self, name: &str, value: ParamValue) {
        self.0.insert(name.to_ascii_lowercase(), value);
    }

    /// Returns the value of a parameter, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name.to_ascii_lowercase().as_str())
    }

    /// Returns the text of a `Text` or `Charset` parameter.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    /// Removes a parameter, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.0.shift_remove(name.to_ascii_lowercase().as_str())
    }

    /// Returns true if the parameter is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the `q` parameter, defaulting to 1.
    #[must_use]
    pub fn q(&self) -> QValue {
        match self.get("q") {
            Some(ParamValue::Quality(q)) => *q,
            _ => QValue::MAX,
        }
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.0 {
            write!(f, "; {name}={value}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = indexmap::map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_qvalue_parse() {
        assert_eq!("1".parse::<QValue>().unwrap(), QValue::MAX);
        assert_eq!("1.000".parse::<QValue>().unwrap(), QValue::MAX);
        assert_eq!("0".parse::<QValue>().unwrap(), QValue::MIN);
        assert_eq!("0.5".parse::<QValue>().unwrap().thousandths(), 500);
        assert_eq!("0.25".parse::<QValue>().unwrap().thousandths(), 250);
        assert_eq!("0.001".parse::<QValue>().unwrap().thousandths(), 1);
        assert_eq!("0.".parse::<QValue>().unwrap(), QValue::MIN);
    }

    #[test]
    fn test_qvalue_parse_errors() {
        assert_eq!("1.5".parse::<QValue>(), Err(QValueError::OutOfRange));
        assert_eq!("2".parse::<QValue>(), Err(QValueError::OutOfRange));
        assert_eq!("0.1234".parse::<QValue>(), Err(QValueError::TooPrecise));
        assert_eq!(".5".parse::<QValue>(), Err(QValueError::Syntax));
        assert_eq!("abc".parse::<QValue>(), Err(QValueError::Syntax));
        assert_eq!("0.5x".parse::<QValue>(), Err(QValueError::Syntax));
    }

    #[test]
    fn test_qvalue_display() {
        assert_eq!(QValue::MAX.to_string(), "1");
        assert_eq!(QValue::MIN.to_string(), "0");
        assert_eq!(QValue::from_thousandths(500).unwrap().to_string(), "0.5");
        assert_eq!(QValue::from_thousandths(250).unwrap().to_string(), "0.25");
        assert_eq!(QValue::from_thousandths(7).unwrap().to_string(), "0.007");
        assert!(QValue::from_thousandths(1001).is_none());
    }

    #[test]
    fn test_convert_typed() {
        assert_eq!(
            ParamValue::convert("q", "0.8").unwrap(),
            ParamValue::Quality(QValue::from_thousandths(800).unwrap())
        );
        assert_eq!(
            ParamValue::convert("charset", "utf-8").unwrap(),
            ParamValue::Charset("utf-8".to_string())
        );
        assert_eq!(
            ParamValue::convert("level", "1").unwrap(),
            ParamValue::Text("1".to_string())
        );
    }

    #[test]
    fn test_convert_failure_message() {
        let err = ParamValue::convert("q", "1.5").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to convert \"q\" value \"1.5\", message: q-factor must be between 0 and 1"
        );

        assert!(ParamValue::convert("charset", "utf 8").is_err());
        assert!(ParamValue::convert("boundary", "").is_err());
        assert!(ParamValue::convert("boundary", "abc ").is_err());
        assert!(ParamValue::convert("boundary", "----=_Part_123").is_ok());
    }

    #[test]
    fn test_number_and_date() {
        assert_eq!(
            ParamValue::number("size", "1024").unwrap(),
            ParamValue::Number(1024)
        );
        assert!(matches!(
            ParamValue::number("size", "-1"),
            Err(Error::Conversion { .. })
        ));
        assert!(matches!(
            ParamValue::date("read-date", "Wed, 12 Feb 1997 16:29:51 -0500").unwrap(),
            ParamValue::Date(_)
        ));
        assert!(ParamValue::date("read-date", "yesterday").is_err());
    }

    #[test]
    fn test_text_quoting() {
        assert_eq!(ParamValue::Text("plain".to_string()).to_string(), "plain");
        assert_eq!(ParamValue::Text("a b".to_string()).to_string(), "\"a b\"");
        assert_eq!(ParamValue::Text(String::new()).to_string(), "\"\"");
        assert_eq!(
            ParamValue::Text("say \"hi\"".to_string()).to_string(),
            r#""say \"hi\"""#
        );
    }

    #[test]
    fn test_parameters_last_write_wins() {
        let mut params = Parameters::new();
        params.insert("A", ParamValue::Text("1".to_string())).unwrap();
        params.insert("b", ParamValue::Text("2".to_string())).unwrap();
        params.insert("a", ParamValue::Text("3".to_string())).unwrap();

        assert_eq!(params.len(), 2);
        assert_eq!(params.get_str("A"), Some("3"));
        assert_eq!(params.to_string(), "; a=3; b=2");
    }

    #[test]
    fn test_parameters_remove_keeps_order() {
        let mut params = Parameters::new();
        params.insert("a", ParamValue::Number(1)).unwrap();
        params.insert("b", ParamValue::Number(2)).unwrap();
        params.insert("c", ParamValue::Number(3)).unwrap();
        params.remove("B");

        let names: Vec<_> = params.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn test_parameters_default_q() {
        let mut params = Parameters::new();
        assert_eq!(params.q(), QValue::MAX);
        params.insert("q", ParamValue::Quality(QValue::MIN)).unwrap();
        assert_eq!(params.q(), QValue::MIN);
    }

    #[test]
    fn test_insert_normalizes_typed_names() {
        let mut params = Parameters::new();
        params
            .insert("Charset", ParamValue::Text("utf-8".to_string()))
            .unwrap();
        params.insert("q", ParamValue::Text("0.50".to_string())).unwrap();
        params
            .insert("level", ParamValue::Charset("1".to_string()))
            .unwrap();

        assert_eq!(
            params.get("charset"),
            Some(&ParamValue::Charset("utf-8".to_string()))
        );
        assert_eq!(params.q().thousandths(), 500);
        assert_eq!(params.get("level"), Some(&ParamValue::Text("1".to_string())));
    }

    #[test]
    fn test_insert_rejects_unserializable_values() {
        let mut params = Parameters::new();
        assert!(matches!(
            params.insert("note", ParamValue::Text("a\nb".to_string())),
            Err(Error::Conversion { .. })
        ));
        assert!(params.insert("note", ParamValue::Text("a\tb".to_string())).is_ok());
        assert!(params.insert("q", ParamValue::Text("high".to_string())).is_err());
        assert!(params.insert("bad name", ParamValue::Number(1)).is_err());
        assert!(params.insert("title", ParamValue::Encoded(EncodedText::utf8("x"))).is_err());
        assert!(params.insert("title*", ParamValue::Text("x".to_string())).is_err());
        assert!(params.insert("title*", ParamValue::Encoded(EncodedText::utf8("x"))).is_ok());
    }
}
