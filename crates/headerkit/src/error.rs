//! Error types for header value parsing.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing or constructing header values.
///
/// Every error is terminal for the parse call that produced it. Positional
/// variants carry the 0-based offset of the offending character together with
/// the complete original text so callers can render a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An unexpected character at a specific position.
    #[error("Invalid character '{character}' at {position} in \"{text}\"")]
    InvalidCharacter {
        /// The character found.
        character: char,
        /// Offset of the character.
        position: usize,
        /// Full header text.
        text: String,
    },

    /// A value was required but absent.
    #[error("Missing value at {position} in \"{text}\"")]
    MissingValue {
        /// Offset where the value was expected.
        position: usize,
        /// Full header text.
        text: String,
    },

    /// A parameter name was not followed by a value.
    #[error("Missing parameter value at {position} in \"{text}\"")]
    MissingParameterValue {
        /// Offset where the value was expected.
        position: usize,
        /// Full header text.
        text: String,
    },

    /// End of text reached inside a quoted string.
    #[error("Missing closing '\"' in \"{text}\"")]
    MissingClosingQuote {
        /// Full header text.
        text: String,
    },

    /// End of text reached inside a comment.
    #[error("Missing closing ')' in \"{text}\"")]
    MissingClosingParenthesis {
        /// Full header text.
        text: String,
    },

    /// Malformed RFC 5987 value characters or percent escapes.
    #[error("Invalid encoded text at {position} in \"{text}\"")]
    InvalidEncodedText {
        /// Offset of the offending character.
        position: usize,
        /// Full header text.
        text: String,
    },

    /// RFC 5987 language segment without its closing apostrophe.
    #[error("Missing closing ''' after language at {position} in \"{text}\"")]
    UnterminatedLanguage {
        /// Offset where the apostrophe was expected.
        position: usize,
        /// Full header text.
        text: String,
    },

    /// A parameter value was present but failed typed conversion.
    #[error("Failed to convert \"{parameter}\" value \"{value}\", message: {message}")]
    Conversion {
        /// Parameter or directive name.
        parameter: String,
        /// The offending text.
        value: String,
        /// Message of the underlying conversion error.
        message: String,
    },

    /// Range unit absent or not recognized.
    #[error("Missing unit from \"{text}\"")]
    MissingUnit {
        /// Full header text.
        text: String,
    },

    /// Structurally invalid value detected after tokenization.
    #[error("Invalid header value: {0}")]
    InvalidValue(String),
}

impl Error {
    /// Returns the offset of the offending character, if the error has one.
    #[must_use]
    pub const fn position(&self) -> Option<usize> {
        match self {
            Self::InvalidCharacter { position, .. }
            | Self::MissingValue { position, .. }
            | Self::MissingParameterValue { position, .. }
            | Self::InvalidEncodedText { position, .. }
            | Self::UnterminatedLanguage { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Returns the original header text the error refers to, if recorded.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::InvalidCharacter { text, .. }
            | Self::MissingValue { text, .. }
            | Self::MissingParameterValue { text, .. }
            | Self::MissingClosingQuote { text }
            | Self::MissingClosingParenthesis { text }
            | Self::InvalidEncodedText { text, .. }
            | Self::UnterminatedLanguage { text, .. }
            | Self::MissingUnit { text } => Some(text),
            Self::Conversion { .. } | Self::InvalidValue(_) => None,
        }
    }

    pub(crate) fn conversion(
        parameter: impl Into<String>,
        value: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        Self::Conversion {
            parameter: parameter.into(),
            value: value.into(),
            message: message.to_string(),
        }
    }
}
