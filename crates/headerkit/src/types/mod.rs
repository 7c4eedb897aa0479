//! Typed header values built on the parsing engine.

pub mod cache_control;
pub mod disposition;
pub mod language;
pub mod media_type;
pub mod product;
pub mod range;
pub mod value;

pub use cache_control::{CacheControl, CacheDirective, DirectiveArgument};
pub use disposition::{ContentDisposition, DispositionType};
pub use language::LanguageRange;
pub use media_type::MediaType;
pub use product::{Product, ProductItem, Products};
pub use range::{ByteRange, ByteRangeSpec, ContentRange, Range};
pub use value::{HeaderValue, to_header_text};
