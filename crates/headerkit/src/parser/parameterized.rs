//! Parameterized values: `value *(";" name "=" value)` lists.
//!
//! [`ParameterizedParser`] implements the parameter protocol on top of the
//! event loop and delegates the grammar-specific parts (how a value is read,
//! how a parameter value is typed, what the finished value looks like) to a
//! [`ValueGrammar`].

use std::borrow::Cow;

use crate::chars::{is_qdtext, is_token_char};
use crate::params::{ParamValue, Parameters, QValue};
use crate::{Error, Result};

use super::Cursor;
use super::cursor::unescape;
use super::dispatch::{EventHandler, drive};

/// Grammar-specific steps of the parameter protocol.
pub trait ValueGrammar {
    /// The value produced for each comma-separated segment.
    type Output;

    /// Returns false if `,` must be rejected.
    fn allows_multiple_values(&self) -> bool {
        true
    }

    /// Reads one value starting at the cursor (a token, `*`, a media type,
    /// ...).
    fn value(&mut self, cursor: &mut Cursor<'_>) -> Result<String>;

    /// Reads the value of parameter `name`. The cursor is on the first
    /// character after `=` and any whitespace.
    fn parameter(&mut self, name: &str, cursor: &mut Cursor<'_>) -> Result<ParamValue> {
        read_parameter_value(name, cursor)
    }

    /// Builds the finished value once its parameters have been read.
    fn complete(&mut self, value: String, parameters: Parameters) -> Result<Self::Output>;

    /// Returns the q-factor of a finished value, if the grammar has one.
    /// Lists with q-factors are sorted by descending weight.
    fn quality(&self, output: &Self::Output) -> Option<QValue> {
        let _ = output;
        None
    }
}

/// Reads a parameter value the default way: RFC 5987 encoded text for names
/// ending in `*`, otherwise a quoted string or a token, converted according
/// to [`ParamValue::convert`].
///
/// # Errors
///
/// Returns positional errors for malformed text and conversion errors for
/// values that do not fit the parameter's type.
pub fn read_parameter_value(name: &str, cursor: &mut Cursor<'_>) -> Result<ParamValue> {
    if name.ends_with('*') {
        return cursor.encoded_text().map(ParamValue::Encoded);
    }

    let text = if cursor.peek() == Some(b'"') {
        quoted_parameter_value(cursor)?
    } else {
        Cow::Borrowed(unquoted_parameter_value(cursor)?)
    };
    ParamValue::convert(name, &text)
}

/// Reads a quoted parameter value and removes its escapes.
///
/// # Errors
///
/// Returns an error for an unterminated string or a control character.
pub fn quoted_parameter_value<'a>(cursor: &mut Cursor<'a>) -> Result<Cow<'a, str>> {
    cursor.quoted_text(is_qdtext, true).map(unescape)
}

/// Reads an unquoted (token) parameter value.
///
/// # Errors
///
/// Returns an invalid-character error if no token character is present, or
/// a missing-parameter-value error at end of text.
pub fn unquoted_parameter_value<'a>(cursor: &mut Cursor<'a>) -> Result<&'a str> {
    let start = cursor.position();
    let value = cursor.token(is_token_char);
    if value.is_empty() {
        return Err(if cursor.is_eof() {
            cursor.missing_parameter_value(start)
        } else {
            cursor.invalid_character(start)
        });
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectValue,
    AfterValue,
}

/// Event handler assembling values and their parameters.
pub struct ParameterizedParser<G: ValueGrammar> {
    grammar: G,
    state: State,
    value: Option<String>,
    parameters: Parameters,
    values: Vec<G::Output>,
}

impl<G: ValueGrammar> ParameterizedParser<G> {
    /// Creates a parser for `grammar`.
    pub fn new(grammar: G) -> Self {
        Self {
            grammar,
            state: State::ExpectValue,
            value: None,
            parameters: Parameters::new(),
            values: Vec::new(),
        }
    }

    /// Returns the finished values, sorted by descending q-factor when the
    /// grammar defines one. Equal weights keep their input order.
    pub fn into_values(self) -> Vec<G::Output> {
        let Self {
            grammar,
            mut values,
            ..
        } = self;

        if values.iter().any(|v| grammar.quality(v).is_some()) {
            values.sort_by(|a, b| {
                let qa = grammar.quality(a).unwrap_or_default();
                let qb = grammar.quality(b).unwrap_or_default();
                qb.cmp(&qa)
            });
        }
        values
    }

    fn read_value(&mut self, cursor: &mut Cursor<'_>) -> Result<()> {
        if self.state == State::AfterValue {
            return Err(cursor.unexpected());
        }
        self.value = Some(self.grammar.value(cursor)?);
        self.state = State::AfterValue;
        Ok(())
    }

    fn read_parameter(&mut self, cursor: &mut Cursor<'_>) -> Result<()> {
        cursor.advance();
        cursor.skip_whitespace()?;

        // Empty parameter: "a;" or "a;;b=c"
        if matches!(cursor.peek(), None | Some(b';' | b',')) {
            return Ok(());
        }

        let name_start = cursor.position();
        let name = cursor.token(is_token_char);
        if name.is_empty() {
            return Err(cursor.invalid_character(name_start));
        }
        let name_end = cursor.position();

        cursor.skip_whitespace()?;
        if cursor.peek() != Some(b'=') {
            return Err(cursor.missing_parameter_value(name_end));
        }
        let separator = cursor.position();
        cursor.advance();
        cursor.skip_whitespace()?;

        match cursor.peek() {
            None => return Err(cursor.missing_parameter_value(separator)),
            Some(b';' | b',') => return Err(cursor.unexpected()),
            Some(_) => {}
        }

        let name = name.to_ascii_lowercase();
        let value = self.grammar.parameter(&name, cursor)?;
        self.parameters.insert(&name, value)?;
        Ok(())
    }

    fn finish_value(&mut self) -> Result<()> {
        let value = self.value.take().unwrap_or_default();
        let parameters = std::mem::take(&mut self.parameters);
        let output = self.grammar.complete(value, parameters)?;
        self.values.push(output);
        Ok(())
    }
}

impl<'a, G: ValueGrammar> EventHandler<'a> for ParameterizedParser<G> {
    fn on_token(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        self.read_value(cursor)
    }

    fn on_quoted_text(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        self.read_value(cursor)
    }

    fn on_wildcard(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        self.read_value(cursor)
    }

    fn on_token_separator(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        match self.state {
            State::ExpectValue => Err(cursor.unexpected()),
            State::AfterValue => self.read_parameter(cursor),
        }
    }

    fn on_multi_value_separator(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        let position = cursor.position();
        match self.state {
            // An empty element between two commas; a leading comma has no
            // element to be missing from.
            State::ExpectValue if !self.values.is_empty() => {
                self.on_missing_value(cursor, position)
            }
            State::ExpectValue => Err(cursor.unexpected()),
            State::AfterValue if self.grammar.allows_multiple_values() => {
                self.finish_value()?;
                cursor.advance();
                self.state = State::ExpectValue;
                Ok(())
            }
            State::AfterValue => Err(cursor.unexpected()),
        }
    }

    fn on_end_of_text(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        let position = cursor.position();
        match self.state {
            State::ExpectValue => self.on_missing_value(cursor, position),
            State::AfterValue => self.finish_value(),
        }
    }
}

/// Restricts a grammar to a single value.
struct Single<G>(G);

impl<G: ValueGrammar> ValueGrammar for Single<G> {
    type Output = G::Output;

    fn allows_multiple_values(&self) -> bool {
        false
    }

    fn value(&mut self, cursor: &mut Cursor<'_>) -> Result<String> {
        self.0.value(cursor)
    }

    fn parameter(&mut self, name: &str, cursor: &mut Cursor<'_>) -> Result<ParamValue> {
        self.0.parameter(name, cursor)
    }

    fn complete(&mut self, value: String, parameters: Parameters) -> Result<Self::Output> {
        self.0.complete(value, parameters)
    }
}

/// Parses a comma-separated list of parameterized values.
///
/// # Errors
///
/// Returns the first error encountered; no partial list is produced.
pub fn parse_list<G: ValueGrammar>(text: &str, grammar: G) -> Result<Vec<G::Output>> {
    let mut cursor = Cursor::new(text);
    let mut parser = ParameterizedParser::new(grammar);
    drive(&mut cursor, &mut parser)?;
    Ok(parser.into_values())
}

/// Parses exactly one parameterized value; `,` is rejected.
///
/// # Errors
///
/// Returns the first error encountered.
pub fn parse_single<G: ValueGrammar>(text: &str, grammar: G) -> Result<G::Output> {
    parse_list(text, Single(grammar))?
        .pop()
        .ok_or_else(|| Error::MissingValue {
            position: 0,
            text: text.to_string(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Token values carrying their parameters as (name, text) pairs.
    struct Plain;

    impl ValueGrammar for Plain {
        type Output = (String, Parameters);

        fn value(&mut self, cursor: &mut Cursor<'_>) -> Result<String> {
            let start = cursor.position();
            let token = cursor.token(is_token_char);
            if token.is_empty() {
                return Err(cursor.invalid_character(start));
            }
            Ok(token.to_string())
        }

        fn complete(&mut self, value: String, parameters: Parameters) -> Result<Self::Output> {
            Ok((value, parameters))
        }

        fn quality(&self, output: &Self::Output) -> Option<QValue> {
            Some(output.1.q())
        }
    }

    fn values(text: &str) -> Vec<String> {
        parse_list(text, Plain)
            .unwrap()
            .into_iter()
            .map(|(v, _)| v)
            .collect()
    }

    #[test]
    fn test_single_value_with_parameters() {
        let (value, params) = parse_single("A; b=c; d=\"e f\"", Plain).unwrap();
        assert_eq!(value, "A");
        assert_eq!(params.get_str("b"), Some("c"));
        assert_eq!(params.get_str("d"), Some("e f"));
    }

    #[test]
    fn test_parameter_names_are_case_insensitive() {
        let (_, params) = parse_single("A;Level=1", Plain).unwrap();
        assert_eq!(params.get_str("level"), Some("1"));
        assert_eq!(params.get_str("LEVEL"), Some("1"));
    }

    #[test]
    fn test_duplicate_parameter_last_wins() {
        let (_, params) = parse_single("A;x=1;X=2", Plain).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get_str("x"), Some("2"));
    }

    #[test]
    fn test_q_sort_is_stable_and_descending() {
        assert_eq!(
            values("V1;q=0.5, V2;q=1.0, V3;q=0.25"),
            ["V2", "V1", "V3"]
        );
        assert_eq!(values("a;q=0.5, b, c;q=0.5, d"), ["b", "d", "a", "c"]);
    }

    #[test]
    fn test_missing_parameter_value() {
        let err = parse_list("A;b=", Plain).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing parameter value at 3 in \"A;b=\""
        );

        let err = parse_list("A;b", Plain).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingParameterValue { position: 3, .. }
        ));

        let err = parse_list("A;b=;c=d", Plain).unwrap_err();
        assert_eq!(err.to_string(), "Invalid character ';' at 4 in \"A;b=;c=d\"");

        assert!(matches!(
            parse_list("A;b=,C", Plain),
            Err(Error::InvalidCharacter { position: 4, character: ',', .. })
        ));
        assert!(matches!(
            parse_list("A;b= ;c=d", Plain),
            Err(Error::InvalidCharacter { position: 5, character: ';', .. })
        ));
    }

    #[test]
    fn test_trailing_comma_is_missing_value() {
        let err = parse_list("A,", Plain).unwrap_err();
        assert_eq!(err.to_string(), "Missing value at 2 in \"A,\"");

        let err = parse_list("A,,B", Plain).unwrap_err();
        assert!(matches!(err, Error::MissingValue { position: 2, .. }));
    }

    #[test]
    fn test_empty_input_is_missing_value() {
        assert!(matches!(
            parse_list("", Plain),
            Err(Error::MissingValue { position: 0, .. })
        ));
        assert!(matches!(
            parse_list("  ", Plain),
            Err(Error::MissingValue { position: 2, .. })
        ));
    }

    #[test]
    fn test_structural_characters_where_value_expected() {
        assert!(matches!(
            parse_list(";a=b", Plain),
            Err(Error::InvalidCharacter { position: 0, character: ';', .. })
        ));
        assert!(matches!(
            parse_list("=a", Plain),
            Err(Error::InvalidCharacter { position: 0, character: '=', .. })
        ));
        assert!(matches!(
            parse_list(", A", Plain),
            Err(Error::InvalidCharacter { position: 0, character: ',', .. })
        ));
        assert!(matches!(
            parse_list("A, ;b=c", Plain),
            Err(Error::InvalidCharacter { position: 3, character: ';', .. })
        ));
        assert!(matches!(
            parse_list("A;=b", Plain),
            Err(Error::InvalidCharacter { position: 2, character: '=', .. })
        ));
        assert!(matches!(
            parse_list("A=b", Plain),
            Err(Error::InvalidCharacter { position: 1, .. })
        ));
        assert!(matches!(
            parse_list("A B", Plain),
            Err(Error::InvalidCharacter { position: 2, .. })
        ));
        assert!(matches!(
            parse_list("A;b=@", Plain),
            Err(Error::InvalidCharacter { position: 4, character: '@', .. })
        ));
    }

    #[test]
    fn test_single_rejects_comma() {
        let err = parse_single("A, B", Plain).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidCharacter { position: 1, character: ',', .. }
        ));
    }

    #[test]
    fn test_trailing_semicolon_tolerated() {
        let (value, params) = parse_single("A;", Plain).unwrap();
        assert_eq!(value, "A");
        assert!(params.is_empty());
        assert_eq!(values("A; , B"), ["A", "B"]);
    }

    #[test]
    fn test_whitespace_is_insignificant() {
        let compact = parse_list("A;b=c,D;e=\"f\"", Plain).unwrap();
        let spaced = parse_list("A ; b = c ,\r\n D\t;e= \"f\"", Plain).unwrap();
        assert_eq!(compact, spaced);
    }

    #[test]
    fn test_typed_conversion_failure() {
        let err = parse_list("A;q=high", Plain).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to convert \"q\" value \"high\", message: invalid q-factor syntax"
        );
    }

    #[test]
    fn test_encoded_parameter() {
        let (_, params) = parse_single("A;title*=UTF-8'de'Gr%C3%BC%C3%9Fe", Plain).unwrap();
        match params.get("title*") {
            Some(ParamValue::Encoded(text)) => assert_eq!(text.value(), "Gr\u{fc}\u{df}e"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_quoted_parameter() {
        assert!(matches!(
            parse_list("A;b=\"c", Plain),
            Err(Error::MissingClosingQuote { .. })
        ));
    }
}
