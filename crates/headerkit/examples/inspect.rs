//! Example: parse a header value and print its typed form
//!
//! ## Running
//!
//! ```bash
//! cargo run --example inspect -- cache-control "no-cache, max-age=60"
//! RUST_LOG=headerkit=trace cargo run --example inspect -- accept "text/*;q=0.3, text/html"
//! ```
//!
//! Supported header names: `accept`, `accept-encoding`, `accept-language`,
//! `cache-control`, `content-disposition`, `content-range`, `content-type`,
//! `range`, `user-agent`.

use std::env;

use anyhow::{Context, bail};
use headerkit::{
    CacheControl, ContentDisposition, ContentRange, HeaderValue, LanguageRange, MediaType,
    Products, Range, to_header_text,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "headerkit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = env::args().skip(1);
    let name = args.next().context("usage: inspect <header-name> <value>")?;
    let value = args.next().context("missing header value")?;

    let (typed, text) = match name.to_ascii_lowercase().as_str() {
        "accept" => {
            let list = MediaType::parse_list(&value)?;
            (format!("{list:#?}"), to_header_text(&list))
        }
        "accept-encoding" => {
            let list = HeaderValue::parse_list(&value)?;
            (format!("{list:#?}"), to_header_text(&list))
        }
        "accept-language" => {
            let list = LanguageRange::parse_list(&value)?;
            (format!("{list:#?}"), to_header_text(&list))
        }
        "cache-control" => {
            let cc = CacheControl::parse(&value)?;
            (format!("{cc:#?}"), cc.to_string())
        }
        "content-disposition" => {
            let cd = ContentDisposition::parse(&value)?;
            (format!("{cd:#?}"), cd.to_string())
        }
        "content-range" => {
            let cr = ContentRange::parse(&value)?;
            (format!("{cr:#?}"), cr.to_string())
        }
        "content-type" => {
            let mt = MediaType::parse(&value)?;
            (format!("{mt:#?}"), mt.to_string())
        }
        "range" => {
            let range = Range::parse(&value)?;
            (format!("{range:#?}"), range.to_string())
        }
        "user-agent" | "server" => {
            let products = Products::parse(&value)?;
            (format!("{products:#?}"), products.to_string())
        }
        other => bail!("unsupported header \"{other}\""),
    };

    println!("{typed}");
    println!("Header text: {text}");
    Ok(())
}
