//! RFC 5987 extended parameter values.
//!
//! Extended values carry a charset, an optional language and percent-encoded
//! text, e.g. `UTF-8'en'%E2%82%AC%20rates`.

use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_encode};

use crate::{Error, Result};

/// Bytes that must be percent-encoded: everything except `attr-char`.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Character sets supported for decoding and encoding extended values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Charset {
    Utf8,
    Latin1,
}

impl Charset {
    fn lookup(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("utf-8") {
            Some(Self::Utf8)
        } else if name.eq_ignore_ascii_case("iso-8859-1") {
            Some(Self::Latin1)
        } else {
            None
        }
    }
}

/// A decoded RFC 5987 extended value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncodedText {
    charset: String,
    language: Option<String>,
    value: String,
}

impl EncodedText {
    /// Creates an extended value.
    ///
    /// # Errors
    ///
    /// Returns an error if the charset is not supported or `value` cannot be
    /// represented in it.
    pub fn new(charset: &str, language: Option<&str>, value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        match Charset::lookup(charset) {
            Some(Charset::Utf8) => {}
            Some(Charset::Latin1) => {
                if value.chars().any(|c| u32::from(c) > 0xFF) {
                    return Err(Error::InvalidValue(format!(
                        "\"{value}\" cannot be encoded as {charset}"
                    )));
                }
            }
            None => {
                return Err(Error::InvalidValue(format!(
                    "Unsupported charset \"{charset}\""
                )));
            }
        }

        Ok(Self {
            charset: charset.to_string(),
            language: language.map(ToString::to_string),
            value,
        })
    }

    /// Creates a UTF-8 extended value without a language.
    #[must_use]
    pub fn utf8(value: impl Into<String>) -> Self {
        Self {
            charset: "UTF-8".to_string(),
            language: None,
            value: value.into(),
        }
    }

    /// Returns the charset name as written.
    #[must_use]
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Returns the language tag, if any.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Returns the decoded value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Decodes raw bytes in the named charset.
    pub(crate) fn decode_bytes(charset: &str, bytes: &[u8]) -> Result<String> {
        match Charset::lookup(charset) {
            Some(Charset::Utf8) => String::from_utf8(bytes.to_vec())
                .map_err(|e| Error::InvalidValue(format!("Invalid UTF-8 in encoded text: {e}"))),
            Some(Charset::Latin1) => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            None => Err(Error::InvalidValue(format!(
                "Unsupported charset \"{charset}\""
            ))),
        }
    }

    fn encoded_bytes(&self) -> Vec<u8> {
        match Charset::lookup(&self.charset) {
            Some(Charset::Latin1) => self
                .value
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
            _ => self.value.as_bytes().to_vec(),
        }
    }
}

impl fmt::Display for EncodedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let charset = &self.charset;
        let language = self.language.as_deref().unwrap_or_default();
        let bytes = self.encoded_bytes();
        write!(f, "{charset}'{language}'{}", percent_encode(&bytes, ATTR_CHAR))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_utf8() {
        let text = EncodedText::new("UTF-8", Some("en"), "\u{20ac} rates").unwrap();
        assert_eq!(text.to_string(), "UTF-8'en'%E2%82%AC%20rates");
    }

    #[test]
    fn test_display_latin1() {
        let text = EncodedText::new("ISO-8859-1", None, "\u{a3} rates").unwrap();
        assert_eq!(text.to_string(), "ISO-8859-1''%A3%20rates");
    }

    #[test]
    fn test_attr_chars_not_escaped() {
        let text = EncodedText::utf8("a.b-c_d~e");
        assert_eq!(text.to_string(), "UTF-8''a.b-c_d~e");
    }

    #[test]
    fn test_unsupported_charset() {
        assert!(EncodedText::new("KOI8-R", None, "x").is_err());
        assert!(EncodedText::new("iso-8859-1", None, "\u{20ac}").is_err());
    }

    #[test]
    fn test_decode_bytes() {
        assert_eq!(
            EncodedText::decode_bytes("utf-8", "na\u{ef}ve".as_bytes()).unwrap(),
            "na\u{ef}ve"
        );
        assert_eq!(
            EncodedText::decode_bytes("ISO-8859-1", &[0x6E, 0x61, 0xEF]).unwrap(),
            "na\u{ef}"
        );
        assert!(EncodedText::decode_bytes("utf-8", &[0xFF]).is_err());
    }
}
