//! `Content-Disposition` (RFC 6266, RFC 7578 for `form-data`).

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};

use crate::chars::{is_token, is_token_char};
use crate::encoded::EncodedText;
use crate::params::{ParamValue, Parameters};
use crate::parser::{
    self, Cursor, ValueGrammar, quoted_parameter_value, read_parameter_value,
    unquoted_parameter_value,
};
use crate::{Error, Result};

/// Disposition type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DispositionType {
    /// `inline`
    Inline,
    /// `attachment`
    Attachment,
    /// `form-data`
    FormData,
    /// Any other type, lower-cased.
    Other(String),
}

impl DispositionType {
    fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "inline" => Self::Inline,
            "attachment" => Self::Attachment,
            "form-data" => Self::FormData,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the type token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inline => "inline",
            Self::Attachment => "attachment",
            Self::FormData => "form-data",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for DispositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `Content-Disposition` value, e.g.
/// `attachment; filename="report.pdf"; size=1024`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentDisposition {
    disposition_type: DispositionType,
    parameters: Parameters,
}

impl ContentDisposition {
    /// Creates a disposition without parameters.
    #[must_use]
    pub fn new(disposition_type: DispositionType) -> Self {
        Self {
            disposition_type,
            parameters: Parameters::new(),
        }
    }

    /// `inline`
    #[must_use]
    pub fn inline() -> Self {
        Self::new(DispositionType::Inline)
    }

    /// `attachment`
    #[must_use]
    pub fn attachment() -> Self {
        Self::new(DispositionType::Attachment)
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

    /// Returns a copy carrying `filename`. Non-ASCII names are sent as
    /// `filename*` with an ASCII `filename` fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if `filename` contains control characters.
    pub fn with_filename(self, filename: &str) -> Result<Self> {
        if filename.is_ascii() {
            return self.with_parameter("filename", ParamValue::Text(filename.to_string()));
        }

        let fallback: String = filename
            .chars()
            .map(|c| if c.is_ascii() { c } else { '_' })
            .collect();
        self.with_parameter("filename", ParamValue::Text(fallback))?
            .with_parameter("filename*", ParamValue::Encoded(EncodedText::utf8(filename)))
    }

    /// Returns the disposition type.
    #[must_use]
    pub const fn disposition_type(&self) -> &DispositionType {
        &self.disposition_type
    }

    /// Returns the parameters.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Checks if this is an attachment.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.disposition_type == DispositionType::Attachment
    }

    /// Checks if this is inline content.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.disposition_type == DispositionType::Inline
    }

    /// Returns the file name, preferring `filename*` over `filename`.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        if let Some(ParamValue::Encoded(encoded)) = self.parameters.get("filename*") {
            return Some(encoded.value());
        }
        self.parameters.get_str("filename")
    }

    /// Returns the `name` parameter of a `form-data` part.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.parameters.get_str("name")
    }

    /// Returns the `size` parameter.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        match self.parameters.get("size") {
            Some(ParamValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Returns the `creation-date` parameter.
    #[must_use]
    pub fn creation_date(&self) -> Option<DateTime<FixedOffset>> {
        self.date("creation-date")
    }

    /// Returns the `modification-date` parameter.
    #[must_use]
    pub fn modification_date(&self) -> Option<DateTime<FixedOffset>> {
        self.date("modification-date")
    }

    /// Returns the `read-date` parameter.
    #[must_use]
    pub fn read_date(&self) -> Option<DateTime<FixedOffset>> {
        self.date("read-date")
    }

    fn date(&self, name: &str) -> Option<DateTime<FixedOffset>> {
        match self.parameters.get(name) {
            Some(ParamValue::Date(date)) => Some(*date),
            _ => None,
        }
    }

    /// Parses a `Content-Disposition` value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is malformed or a typed parameter does
    /// not convert.
    pub fn parse(text: &str) -> Result<Self> {
        parser::parse_single(text, DispositionGrammar)
    }
}

impl fmt::Display for ContentDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.disposition_type, self.parameters)
    }
}

impl FromStr for ContentDisposition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

struct DispositionGrammar;

impl DispositionGrammar {
    fn text<'a>(cursor: &mut Cursor<'a>) -> Result<Cow<'a, str>> {
        if cursor.peek() == Some(b'"') {
            quoted_parameter_value(cursor)
        } else {
            unquoted_parameter_value(cursor).map(Cow::Borrowed)
        }
    }
}

impl ValueGrammar for DispositionGrammar {
    type Output = ContentDisposition;

    fn value(&mut self, cursor: &mut Cursor<'_>) -> Result<String> {
        let start = cursor.position();
        let token = cursor.token(is_token_char);
        if !is_token(token) {
            return Err(cursor.invalid_character(start));
        }
        Ok(token.to_ascii_lowercase())
    }

    fn parameter(&mut self, name: &str, cursor: &mut Cursor<'_>) -> Result<ParamValue> {
        match name {
            "size" => ParamValue::number(name, &Self::text(cursor)?),
            "creation-date" | "modification-date" | "read-date" => {
                ParamValue::date(name, &Self::text(cursor)?)
            }
            _ => read_parameter_value(name, cursor),
        }
    }

    fn complete(&mut self, value: String, parameters: Parameters) -> Result<ContentDisposition> {
        Ok(ContentDisposition {
            disposition_type: DispositionType::from_token(&value),
            parameters,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_attachment() {
        let cd = ContentDisposition::parse("Attachment; filename=\"report 2024.pdf\"").unwrap();
        assert!(cd.is_attachment());
        assert!(!cd.is_inline());
        assert_eq!(cd.filename(), Some("report 2024.pdf"));
    }

    #[test]
    fn test_filename_star_preferred() {
        let cd = ContentDisposition::parse(
            "attachment; filename=\"EURO rates\"; filename*=utf-8''%e2%82%ac%20rates",
        )
        .unwrap();
        assert_eq!(cd.filename(), Some("\u{20ac} rates"));
    }

    #[test]
    fn test_typed_parameters() {
        let cd = ContentDisposition::parse(
            "attachment; size=1024; creation-date=\"Wed, 12 Feb 1997 16:29:51 -0500\"",
        )
        .unwrap();
        assert_eq!(cd.size(), Some(1024));
        assert_eq!(cd.creation_date().unwrap().year(), 1997);
        assert_eq!(cd.modification_date(), None);
    }

    #[test]
    fn test_typed_parameter_errors() {
        let err = ContentDisposition::parse("attachment; size=big").unwrap_err();
        assert!(matches!(err, Error::Conversion { ref parameter, .. } if parameter == "size"));

        let err = ContentDisposition::parse("inline; read-date=\"yesterday\"").unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Failed to convert \"read-date\" value \"yesterday\", message: ")
        );
    }

    #[test]
    fn test_form_data() {
        let cd = ContentDisposition::parse("form-data; name=\"field1\"").unwrap();
        assert_eq!(cd.disposition_type(), &DispositionType::FormData);
        assert_eq!(cd.name(), Some("field1"));
    }

    #[test]
    fn test_other_type() {
        let cd = ContentDisposition::parse("X-Custom").unwrap();
        assert_eq!(
            cd.disposition_type(),
            &DispositionType::Other("x-custom".to_string())
        );
    }

    #[test]
    fn test_single_value_only() {
        assert!(matches!(
            ContentDisposition::parse("inline, attachment"),
            Err(Error::InvalidCharacter { position: 6, .. })
        ));
    }

    #[test]
    fn test_with_filename_non_ascii() {
        let cd = ContentDisposition::attachment()
            .with_filename("na\u{ef}ve.txt")
            .unwrap();
        assert_eq!(
            cd.to_string(),
            "attachment; filename=na_ve.txt; filename*=UTF-8''na%C3%AFve.txt"
        );
        assert_eq!(cd.filename(), Some("na\u{ef}ve.txt"));
        assert_eq!(ContentDisposition::parse(&cd.to_string()).unwrap(), cd);
    }

    #[test]
    fn test_round_trip_with_date() {
        let cd = ContentDisposition::parse(
            "inline; modification-date=\"Thu, 13 Feb 1997 10:00:00 +0000\"; size=7",
        )
        .unwrap();
        assert_eq!(ContentDisposition::parse(&cd.to_string()).unwrap(), cd);
    }
}
