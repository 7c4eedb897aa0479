//! Media types (`Content-Type`, `Accept`).

use std::fmt;
use std::str::FromStr;

use crate::chars::{is_token, is_token_char};
use crate::params::{ParamValue, Parameters, QValue};
use crate::parser::{self, Cursor, ValueGrammar};
use crate::{Error, Result};

/// Media type with parameters, e.g. `text/html; charset=utf-8`.
///
/// Type and subtype are stored lower-cased. In `Accept` lists they may be
/// `*` (`*/*` or `text/*`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaType {
    main_type: String,
    sub_type: String,
    parameters: Parameters,
}

impl MediaType {
    /// Creates a media type without parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if either part is not a token, or the type is `*`
    /// while the subtype is not.
    pub fn new(main_type: &str, sub_type: &str) -> Result<Self> {
        if !is_token(main_type) || !is_token(sub_type) {
            return Err(Error::InvalidValue(format!(
                "Invalid media type \"{main_type}/{sub_type}\""
            )));
        }
        if main_type == "*" && sub_type != "*" {
            return Err(Error::InvalidValue(format!(
                "Wildcard type requires a wildcard subtype in \"{main_type}/{sub_type}\""
            )));
        }

        Ok(Self {
            main_type: main_type.to_ascii_lowercase(),
            sub_type: sub_type.to_ascii_lowercase(),
            parameters: Parameters::new(),
        })
    }

    fn known(main_type: &str, sub_type: &str) -> Self {
        Self {
            main_type: main_type.to_string(),
            sub_type: sub_type.to_string(),
            parameters: Parameters::new(),
        }
    }

    /// `*/*`
    #[must_use]
    pub fn any() -> Self {
        Self::known("*", "*")
    }

    /// `text/plain; charset=utf-8`
    #[must_use]
    pub fn text_plain() -> Self {
        Self::known("text", "plain").with_charset_utf8()
    }

    /// `text/html; charset=utf-8`
    #[must_use]
    pub fn text_html() -> Self {
        Self::known("text", "html").with_charset_utf8()
    }

    /// `application/json`
    #[must_use]
    pub fn application_json() -> Self {
        Self::known("application", "json")
    }

    /// `application/octet-stream`
    #[must_use]
    pub fn octet_stream() -> Self {
        Self::known("application", "octet-stream")
    }

    /// `multipart/form-data` with a boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if `boundary` is not a valid RFC 2046 boundary.
    pub fn multipart_form_data(boundary: impl Into<String>) -> Result<Self> {
        Self::known("multipart", "form-data")
            .with_parameter("boundary", ParamValue::Text(boundary.into()))
    }

    /// Returns a copy with `name` set to `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter could not be parsed back from its
    /// serialization (see [`Parameters::insert`]).
    pub fn with_parameter(mut self, name: &str, value: ParamValue) -> Result<Self> {
        self.parameters.insert(name, value)?;
        Ok(self)
    }

    fn with_charset_utf8(mut self) -> Self {
        self.parameters.set("charset", ParamValue::Charset("utf-8".into()));
        self
    }

    /// Returns a copy without parameters.
    #[must_use]
    pub fn without_parameters(&self) -> Self {
        Self::known(&self.main_type, &self.sub_type)
    }

    /// Returns the main type (e.g. `text`).
    #[must_use]
    pub fn main_type(&self) -> &str {
        &self.main_type
    }

    /// Returns the subtype (e.g. `html`).
    #[must_use]
    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    /// Returns `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Returns the parameters.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameters.get_str("charset")
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameters.get_str("boundary")
    }

    /// Returns the q-factor, defaulting to 1.
    #[must_use]
    pub fn q(&self) -> QValue {
        self.parameters.q()
    }

    /// Checks if this is a multipart media type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type == "multipart"
    }

    /// Checks if this is a text media type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type == "text"
    }

    /// Returns true if this range (possibly with wildcards) includes `other`.
    /// Parameters are ignored.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        if self.main_type == "*" {
            return true;
        }
        if self.main_type != other.main_type {
            return false;
        }
        self.sub_type == "*" || self.sub_type == other.sub_type
    }

    /// Parses a single media type, as found in `Content-Type`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed.
    pub fn parse(text: &str) -> Result<Self> {
        parser::parse_single(text, MediaTypeGrammar)
    }

    /// Parses an `Accept` list, sorted by descending q-factor.
    ///
    /// # Errors
    ///
    /// Returns an error if any element is malformed.
    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        parser::parse_list(text, MediaTypeGrammar)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = &self.main_type;
        let sub = &self.sub_type;
        write!(f, "{main}/{sub}{}", self.parameters)
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// `type "/" subtype` values.
struct MediaTypeGrammar;

impl ValueGrammar for MediaTypeGrammar {
    type Output = MediaType;

    fn value(&mut self, cursor: &mut Cursor<'_>) -> Result<String> {
        let main_start = cursor.position();
        let main_type = cursor.token(is_token_char);
        if main_type.is_empty() {
            return Err(cursor.invalid_character(main_start));
        }

        cursor.expect(b'/')?;

        let sub_start = cursor.position();
        let sub_type = cursor.token(is_token_char);
        if sub_type.is_empty() {
            return Err(if cursor.is_eof() {
                cursor.missing_value(sub_start)
            } else {
                cursor.invalid_character(sub_start)
            });
        }
        if main_type == "*" && sub_type != "*" {
            return Err(cursor.invalid_character(sub_start));
        }

        Ok(format!(
            "{}/{}",
            main_type.to_ascii_lowercase(),
            sub_type.to_ascii_lowercase()
        ))
    }

    fn complete(&mut self, value: String, parameters: Parameters) -> Result<MediaType> {
        let (main_type, sub_type) = value
            .split_once('/')
            .ok_or_else(|| Error::InvalidValue(format!("Invalid media type \"{value}\"")))?;
        Ok(MediaType {
            main_type: main_type.to_string(),
            sub_type: sub_type.to_string(),
            parameters,
        })
    }

    fn quality(&self, output: &MediaType) -> Option<QValue> {
        Some(output.q())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_new() {
        let mt = MediaType::new("Text", "Plain").unwrap();
        assert_eq!(mt.main_type(), "text");
        assert_eq!(mt.sub_type(), "plain");
        assert!(mt.parameters().is_empty());
        assert!(MediaType::new("*", "html").is_err());
        assert!(MediaType::new("te xt", "plain").is_err());
    }

    #[test]
    fn test_text_plain() {
        let mt = MediaType::text_plain();
        assert_eq!(mt.essence(), "text/plain");
        assert_eq!(mt.charset(), Some("utf-8"));
        assert!(mt.is_text());
    }

    #[test]
    fn test_multipart_form_data() {
        let mt = MediaType::multipart_form_data("boundary123").unwrap();
        assert_eq!(mt.boundary(), Some("boundary123"));
        assert!(mt.is_multipart());
        assert!(MediaType::multipart_form_data("").is_err());
        assert!(MediaType::multipart_form_data("ends in space ").is_err());
    }

    #[test]
    fn test_parse() {
        let mt = MediaType::parse("Text/HTML; Charset=UTF-8").unwrap();
        assert_eq!(mt.essence(), "text/html");
        assert_eq!(mt.charset(), Some("UTF-8"));
    }

    #[test]
    fn test_parse_quoted_boundary() {
        let mt = MediaType::parse("multipart/mixed; boundary=\"----=_Part_123\"").unwrap();
        assert_eq!(mt.boundary(), Some("----=_Part_123"));
        assert_eq!(
            mt.to_string(),
            "multipart/mixed; boundary=\"----=_Part_123\""
        );
    }

    #[test]
    fn test_parse_invalid_boundary() {
        let err = MediaType::parse("multipart/mixed; boundary=\"\"").unwrap_err();
        assert!(matches!(err, Error::Conversion { ref parameter, .. } if parameter == "boundary"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            MediaType::parse("text"),
            Err(Error::MissingValue { position: 4, .. })
        ));
        assert!(matches!(
            MediaType::parse("text/"),
            Err(Error::MissingValue { position: 5, .. })
        ));
        assert!(matches!(
            MediaType::parse("text /html"),
            Err(Error::InvalidCharacter { position: 4, .. })
        ));
        assert!(matches!(
            MediaType::parse("*/html"),
            Err(Error::InvalidCharacter { position: 2, .. })
        ));
        assert!(matches!(
            MediaType::parse("text/html, text/plain"),
            Err(Error::InvalidCharacter { position: 9, .. })
        ));
    }

    #[test]
    fn test_parse_accept() {
        let list =
            MediaType::parse_list("text/*;q=0.3, text/html;q=0.7, text/html;level=1, */*;q=0.5")
                .unwrap();
        let rendered: Vec<_> = list.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            [
                "text/html; level=1",
                "text/html; q=0.7",
                "*/*; q=0.5",
                "text/*; q=0.3",
            ]
        );
    }

    #[test]
    fn test_matches() {
        let html = MediaType::parse("text/html").unwrap();
        assert!(MediaType::any().matches(&html));
        assert!(MediaType::parse("text/*").unwrap().matches(&html));
        assert!(!MediaType::parse("image/*").unwrap().matches(&html));
        assert!(html.matches(&MediaType::text_html()));
    }

    #[test]
    fn test_round_trip() {
        let mt = MediaType::text_html()
            .with_parameter("q", ParamValue::Quality(QValue::MIN))
            .unwrap();
        assert_eq!(MediaType::parse(&mt.to_string()).unwrap(), mt);
    }
}
