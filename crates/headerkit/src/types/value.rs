//! Generic parameterized header values.

use std::fmt;
use std::str::FromStr;

use crate::chars::{is_token, is_token_char};
use crate::params::{ParamValue, Parameters, QValue};
use crate::parser::{self, Cursor, ValueGrammar};
use crate::{Error, Result};

/// A token (or `*`) with parameters, e.g. `gzip;q=0.8`.
///
/// Used for headers such as `Accept-Encoding`, `Accept-Charset`, `TE` or
/// `Vary`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeaderValue {
    value: String,
    parameters: Parameters,
}

impl HeaderValue {
    /// Creates a value without parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is neither a token nor `*`.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value != "*" && !is_token(&value) {
            return Err(Error::InvalidValue(format!("\"{value}\" is not a token")));
        }
        Ok(Self {
            value,
            parameters: Parameters::new(),
        })
    }

    /// Returns the value token.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the parameters.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Returns a single parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    /// Returns the q-factor, defaulting to 1.
    #[must_use]
    pub fn q(&self) -> QValue {
        self.parameters.q()
    }

    /// Returns true if the value is `*`.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.value == "*"
    }

    /// Returns a copy with `name` set to `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter could not be parsed back from its
    /// serialization (see [`Parameters::insert`]).
    pub fn with_parameter(&self, name: &str, value: ParamValue) -> Result<Self> {
        let mut parameters = self.parameters.clone();
        parameters.insert(name, value)?;
        Ok(Self {
            value: self.value.clone(),
            parameters,
        })
    }

    /// Returns a copy with the given q-factor.
    #[must_use]
    pub fn with_q(&self, q: QValue) -> Self {
        let mut parameters = self.parameters.clone();
        parameters.set("q", ParamValue::Quality(q));
        Self {
            value: self.value.clone(),
            parameters,
        }
    }

    /// Parses a single value.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed or contains several values.
    pub fn parse(text: &str) -> Result<Self> {
        parser::parse_single(text, TokenGrammar)
    }

    /// Parses a comma-separated list, sorted by descending q-factor.
    ///
    /// # Errors
    ///
    /// Returns an error if any element is malformed.
    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        parser::parse_list(text, TokenGrammar)
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.parameters)
    }
}

impl FromStr for HeaderValue {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Token or `*` values.
struct TokenGrammar;

impl ValueGrammar for TokenGrammar {
    type Output = HeaderValue;

    fn value(&mut self, cursor: &mut Cursor<'_>) -> Result<String> {
        let start = cursor.position();
        if cursor.peek() == Some(b'*') {
            cursor.advance();
            if cursor.peek().is_some_and(is_token_char) {
                return Err(cursor.unexpected());
            }
            return Ok("*".to_string());
        }

        let token = cursor.token(is_token_char);
        if token.is_empty() {
            return Err(cursor.invalid_character(start));
        }
        Ok(token.to_string())
    }

    fn complete(&mut self, value: String, parameters: Parameters) -> Result<HeaderValue> {
        Ok(HeaderValue { value, parameters })
    }

    fn quality(&self, output: &HeaderValue) -> Option<QValue> {
        Some(output.q())
    }
}

/// Formats a list of values as header text, separated by `", "`.
#[must_use]
pub fn to_header_text<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accept_encoding() {
        let values = HeaderValue::parse_list("deflate;q=0.5, gzip, *;q=0").unwrap();
        let names: Vec<_> = values.iter().map(HeaderValue::value).collect();
        assert_eq!(names, ["gzip", "deflate", "*"]);
        assert!(values[2].is_wildcard());
        assert_eq!(values[2].q(), QValue::MIN);
    }

    #[test]
    fn test_parse_single_with_parameters() {
        let value = HeaderValue::parse("trailers; x=\"a b\"").unwrap();
        assert_eq!(value.value(), "trailers");
        assert_eq!(
            value.parameter("x"),
            Some(&ParamValue::Text("a b".to_string()))
        );
    }

    #[test]
    fn test_wildcard_followed_by_token() {
        let err = HeaderValue::parse("*abc").unwrap_err();
        assert_eq!(err.position(), Some(1));
    }

    #[test]
    fn test_quoted_value_rejected() {
        let err = HeaderValue::parse("\"gzip\"").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidCharacter {
                character: '"',
                position: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_with_parameter_returns_new_value() {
        let gzip = HeaderValue::new("gzip").unwrap();
        let weighted = gzip.with_q(QValue::from_thousandths(300).unwrap());
        assert!(gzip.parameters().is_empty());
        assert_eq!(weighted.to_string(), "gzip; q=0.3");
    }

    #[test]
    fn test_new_rejects_non_token() {
        assert!(HeaderValue::new("a b").is_err());
        assert!(HeaderValue::new("").is_err());
        assert!(HeaderValue::new("*").is_ok());
    }

    #[test]
    fn test_round_trip() {
        let value = HeaderValue::new("compress")
            .unwrap()
            .with_parameter("note", ParamValue::Text("legacy; avoid".to_string()))
            .unwrap()
            .with_q(QValue::from_thousandths(125).unwrap());
        let text = value.to_string();
        assert_eq!(text, "compress; note=\"legacy; avoid\"; q=0.125");
        assert_eq!(HeaderValue::parse(&text).unwrap(), value);
    }

    #[test]
    fn test_with_parameter_rejects_text_that_would_not_parse_back() {
        let gzip = HeaderValue::new("gzip").unwrap();
        assert!(matches!(
            gzip.with_parameter("note", ParamValue::Text("line\r\nbreak".to_string())),
            Err(Error::Conversion { .. })
        ));
        assert!(gzip.with_parameter("q", ParamValue::Text("soon".to_string())).is_err());

        let typed = gzip
            .with_parameter("charset", ParamValue::Text("utf-8".to_string()))
            .unwrap();
        assert_eq!(
            typed.parameters().get("charset"),
            Some(&ParamValue::Charset("utf-8".to_string()))
        );
        assert_eq!(HeaderValue::parse(&typed.to_string()).unwrap(), typed);
    }

    #[test]
    fn test_to_header_text() {
        let values = HeaderValue::parse_list("br , gzip;q=0.9").unwrap();
        assert_eq!(to_header_text(&values), "br, gzip; q=0.9");
    }
}
