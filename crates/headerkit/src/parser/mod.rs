//! Header value parsing engine.
//!
//! The engine is split into three layers:
//!
//! - **Cursor**: bounds-checked scanning primitives (whitespace, tokens,
//!   quoted strings, comments, RFC 5987 encoded text)
//! - **Dispatch**: the event loop that classifies each significant
//!   character and invokes an [`EventHandler`] hook
//! - **Parameterized**: the `value;name=value, ...` protocol built on the
//!   event loop, parameterized by a [`ValueGrammar`]
//!
//! The typed parsers in [`crate::types`] are built from these pieces.

pub mod cursor;
pub mod dispatch;
pub mod parameterized;

pub use cursor::{Cursor, unescape};
pub use dispatch::{Event, EventHandler, classify, drive};
pub use parameterized::{
    ParameterizedParser, ValueGrammar, parse_list, parse_single, quoted_parameter_value,
    read_parameter_value, unquoted_parameter_value,
};
