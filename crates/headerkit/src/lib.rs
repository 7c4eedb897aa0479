//! # headerkit
//!
//! Parsing, validation and serialization of HTTP header field values.
//!
//! ## Features
//!
//! - **Hand-written parsers**: RFC 7230/9110 tokens, quoted strings,
//!   comments, folded whitespace and RFC 5987 encoded parameters
//! - **Parameterized values**: `value;name=value` lists with typed
//!   parameters and q-factor weighted sorting
//! - **Typed headers**: `Cache-Control`, `Content-Range`, `Range`,
//!   `Content-Disposition`, media types, language ranges, product lists
//! - **Positional errors**: every rejection names the offending character
//!   and its offset in the original text
//! - **Round-trip serialization**: `Display` produces header text that
//!   parses back to an equal value
//!
//! ## Quick Start
//!
//! ```
//! use headerkit::{CacheControl, CacheDirective, MediaType};
//!
//! let cc = CacheControl::parse("no-cache, max-age=123").unwrap();
//! assert_eq!(cc.directives()[0], CacheDirective::NO_CACHE);
//! assert_eq!(cc.max_age(), Some(123));
//! assert_eq!(cc.to_string(), "no-cache, max-age=123");
//!
//! let accept = MediaType::parse_list("text/*;q=0.3, text/html").unwrap();
//! assert_eq!(accept[0].essence(), "text/html");
//! ```
//!
//! ## Errors
//!
//! ```
//! use headerkit::CacheControl;
//!
//! let err = CacheControl::parse("max-age=!").unwrap_err();
//! assert_eq!(err.to_string(), "Invalid character '!' at 8 in \"max-age=!\"");
//! assert_eq!(err.position(), Some(8));
//! ```
//!
//! ## Custom Grammars
//!
//! The [`parser`] module exposes the building blocks: a [`parser::Cursor`]
//! with scanning primitives, the [`parser::drive`] event loop with its
//! [`parser::EventHandler`] hooks, and the [`parser::ValueGrammar`] trait for
//! new `value;name=value` headers.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod encoded;
mod error;

pub mod chars;
pub mod params;
pub mod parser;
pub mod types;

pub use encoded::EncodedText;
pub use error::{Error, Result};
pub use params::{ParamValue, Parameters, QValue, QValueError};
pub use types::{
    ByteRange, ByteRangeSpec, CacheControl, CacheDirective, ContentDisposition, ContentRange,
    DirectiveArgument, DispositionType, HeaderValue, LanguageRange, MediaType, Product,
    ProductItem, Products, Range, to_header_text,
};
