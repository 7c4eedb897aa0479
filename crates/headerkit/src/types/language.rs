//! Language ranges (`Accept-Language`, `Content-Language`).

use std::fmt;
use std::str::FromStr;

use crate::chars::{is_alpha, is_language_char, is_letter_or_digit};
use crate::params::{ParamValue, Parameters, QValue};
use crate::parser::{self, Cursor, ValueGrammar};
use crate::{Error, Result};

/// Checks a language tag: `1*8ALPHA *("-" 1*8alphanum)`.
#[must_use]
pub fn is_valid_tag(tag: &str) -> bool {
    let mut subtags = tag.split('-');

    let primary_ok = subtags
        .next()
        .is_some_and(|s| (1..=8).contains(&s.len()) && s.bytes().all(is_alpha));

    primary_ok && subtags.all(|s| (1..=8).contains(&s.len()) && s.bytes().all(is_letter_or_digit))
}

/// A language tag or `*` with parameters, e.g. `en-GB;q=0.8`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LanguageRange {
    tag: String,
    parameters: Parameters,
}

impl LanguageRange {
    /// Creates a range for `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if `tag` is neither `*` nor a valid language tag.
    pub fn new(tag: &str) -> Result<Self> {
        if tag != "*" && !is_valid_tag(tag) {
            return Err(Error::InvalidValue(format!("Invalid language tag \"{tag}\"")));
        }
        Ok(Self {
            tag: tag.to_string(),
            parameters: Parameters::new(),
        })
    }

    /// Returns the tag as written.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the primary subtag (`en` for `en-GB`).
    #[must_use]
    pub fn primary(&self) -> &str {
        self.tag.split('-').next().unwrap_or(&self.tag)
    }

    /// Returns the parameters.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Returns the q-factor, defaulting to 1.
    #[must_use]
    pub fn q(&self) -> QValue {
        self.parameters.q()
    }

    /// Returns true for `*`.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.tag == "*"
    }

    /// Returns a copy with the given q-factor.
    #[must_use]
    pub fn with_q(&self, q: QValue) -> Self {
        let mut range = self.clone();
        range.parameters.set("q", ParamValue::Quality(q));
        range
    }

    /// Basic filtering: true if this range equals `tag` or is a prefix of it
    /// followed by `-`. Comparison is case-insensitive; `*` matches any tag.
    #[must_use]
    pub fn matches(&self, tag: &str) -> bool {
        if self.is_wildcard() {
            return true;
        }
        let range = self.tag.as_bytes();
        let tag = tag.as_bytes();
        if tag.len() < range.len() || !tag[..range.len()].eq_ignore_ascii_case(range) {
            return false;
        }
        tag.len() == range.len() || tag[range.len()] == b'-'
    }

    /// Parses a single range.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed.
    pub fn parse(text: &str) -> Result<Self> {
        parser::parse_single(text, LanguageGrammar)
    }

    /// Parses a list, sorted by descending q-factor.
    ///
    /// # Errors
    ///
    /// Returns an error if any element is malformed.
    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        parser::parse_list(text, LanguageGrammar)
    }
}

impl fmt::Display for LanguageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.tag, self.parameters)
    }
}

impl FromStr for LanguageRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

struct LanguageGrammar;

impl ValueGrammar for LanguageGrammar {
    type Output = LanguageRange;

    fn value(&mut self, cursor: &mut Cursor<'_>) -> Result<String> {
        let start = cursor.position();
        if cursor.peek() == Some(b'*') {
            cursor.advance();
            return Ok("*".to_string());
        }

        let tag = cursor.token(is_language_char);
        if tag.is_empty() {
            return Err(cursor.invalid_character(start));
        }
        if !is_valid_tag(tag) {
            return Err(Error::InvalidValue(format!(
                "Invalid language tag \"{tag}\" at {start} in \"{}\"",
                cursor.text()
            )));
        }
        Ok(tag.to_string())
    }

    fn complete(&mut self, tag: String, parameters: Parameters) -> Result<LanguageRange> {
        Ok(LanguageRange { tag, parameters })
    }

    fn quality(&self, output: &LanguageRange) -> Option<QValue> {
        Some(output.q())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_tag() {
        assert!(is_valid_tag("en"));
        assert!(is_valid_tag("en-GB"));
        assert!(is_valid_tag("zh-Hant-TW"));
        assert!(is_valid_tag("de-CH-1996"));
        assert!(!is_valid_tag(""));
        assert!(!is_valid_tag("1en"));
        assert!(!is_valid_tag("en-"));
        assert!(!is_valid_tag("en--GB"));
        assert!(!is_valid_tag("toolongtag"));
        assert!(!is_valid_tag("en-subtagtoolong"));
    }

    #[test]
    fn test_parse_accept_language() {
        let list = LanguageRange::parse_list("da, en-GB;q=0.8, en;q=0.7, *;q=0.1").unwrap();
        let tags: Vec<_> = list.iter().map(LanguageRange::tag).collect();
        assert_eq!(tags, ["da", "en-GB", "en", "*"]);
        assert_eq!(list[1].primary(), "en");
        assert!(list[3].is_wildcard());
    }

    #[test]
    fn test_sorting() {
        let list = LanguageRange::parse_list("fr;q=0.5, de, en;q=0.9").unwrap();
        let tags: Vec<_> = list.iter().map(LanguageRange::tag).collect();
        assert_eq!(tags, ["de", "en", "fr"]);
    }

    #[test]
    fn test_invalid_tag() {
        assert!(matches!(
            LanguageRange::parse("en-toolongsubtag"),
            Err(Error::InvalidValue(_))
        ));
        assert!(matches!(
            LanguageRange::parse("en_GB"),
            Err(Error::InvalidCharacter { position: 2, .. })
        ));
        assert!(LanguageRange::new("x y").is_err());
    }

    #[test]
    fn test_matches() {
        let en = LanguageRange::new("en").unwrap();
        assert!(en.matches("en"));
        assert!(en.matches("EN-us"));
        assert!(!en.matches("eng"));
        assert!(!LanguageRange::new("en-GB").unwrap().matches("en"));
        assert!(LanguageRange::new("*").unwrap().matches("fr"));
    }

    #[test]
    fn test_round_trip() {
        let range = LanguageRange::new("pt-BR")
            .unwrap()
            .with_q(QValue::from_thousandths(600).unwrap());
        assert_eq!(range.to_string(), "pt-BR; q=0.6");
        assert_eq!(LanguageRange::parse(&range.to_string()).unwrap(), range);
    }
}
