//! Product lists (`User-Agent`, `Server`, `Via` comments).

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::chars::{is_token, is_token_char};
use crate::parser::{Cursor, EventHandler, drive, unescape};
use crate::{Error, Result};

/// A `name[/version]` product token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Product {
    name: String,
    version: Option<String>,
}

impl Product {
    /// Creates a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or version is not a token.
    pub fn new(name: &str, version: Option<&str>) -> Result<Self> {
        if !is_token(name) || version.is_some_and(|v| !is_token(v)) {
            return Err(Error::InvalidValue(format!(
                "Invalid product \"{name}/{}\"",
                version.unwrap_or_default()
            )));
        }
        Ok(Self {
            name: name.to_string(),
            version: version.map(ToString::to_string),
        })
    }

    /// Returns the product name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the product version.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(version) = &self.version {
            write!(f, "/{version}")?;
        }
        Ok(())
    }
}

/// One element of a product list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProductItem {
    /// A product token.
    Product(Product),
    /// A comment, kept as written between the outer parentheses.
    Comment(String),
}

impl ProductItem {
    /// Returns the comment text with quoted-pair escapes removed.
    #[must_use]
    pub fn comment_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Comment(raw) => Some(unescape(raw)),
            Self::Product(_) => None,
        }
    }
}

impl fmt::Display for ProductItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product(product) => write!(f, "{product}"),
            Self::Comment(raw) => write!(f, "({raw})"),
        }
    }
}

/// A whitespace-separated list of products and comments, e.g.
/// `Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Products(Vec<ProductItem>);

impl Products {
    /// Creates a list from items.
    #[must_use]
    pub const fn new(items: Vec<ProductItem>) -> Self {
        Self(items)
    }

    /// Returns every item in order.
    #[must_use]
    pub fn items(&self) -> &[ProductItem] {
        &self.0
    }

    /// Iterates over the products, skipping comments.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.0.iter().filter_map(|item| match item {
            ProductItem::Product(product) => Some(product),
            ProductItem::Comment(_) => None,
        })
    }

    /// Returns the first product with the given name, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Product> {
        self.products().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Parses a product list.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed products or unterminated comments.
    pub fn parse(text: &str) -> Result<Self> {
        let mut cursor = Cursor::new(text);
        let mut parser = ProductParser::default();
        drive(&mut cursor, &mut parser)?;
        Ok(Self(parser.items))
    }
}

impl fmt::Display for Products {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

impl FromStr for Products {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[derive(Default)]
struct ProductParser {
    items: Vec<ProductItem>,
    after_name: bool,
}

impl<'a> EventHandler<'a> for ProductParser {
    fn on_whitespace(&mut self, _cursor: &mut Cursor<'a>) -> Result<()> {
        self.after_name = false;
        Ok(())
    }

    fn on_token(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        let name = cursor.token(is_token_char);
        self.items.push(ProductItem::Product(Product {
            name: name.to_string(),
            version: None,
        }));
        self.after_name = true;
        Ok(())
    }

    // `*` is a token character, so it may start a product name.
    fn on_wildcard(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        self.on_token(cursor)
    }

    fn on_slash(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        if !self.after_name {
            return Err(cursor.unexpected());
        }
        let Some(ProductItem::Product(product)) = self.items.last_mut() else {
            return Err(cursor.unexpected());
        };

        cursor.advance();
        let start = cursor.position();
        let version = cursor.token(is_token_char);
        if version.is_empty() {
            return Err(cursor.invalid_character(start));
        }
        product.version = Some(version.to_string());
        self.after_name = false;
        Ok(())
    }

    fn on_comment(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        let raw = cursor.comment()?;
        self.items.push(ProductItem::Comment(raw.to_string()));
        self.after_name = false;
        Ok(())
    }

    fn on_end_of_text(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        let position = cursor.position();
        if self.items.is_empty() {
            return self.on_missing_value(cursor, position);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FIREFOX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";

    #[test]
    fn test_parse_user_agent() {
        let products = Products::parse(FIREFOX).unwrap();
        assert_eq!(products.items().len(), 4);
        assert_eq!(products.get("firefox").unwrap().version(), Some("120.0"));
        assert_eq!(
            products.items()[1].comment_text().unwrap(),
            "X11; Linux x86_64; rv:120.0"
        );
        assert_eq!(products.to_string(), FIREFOX);
    }

    #[test]
    fn test_product_without_version() {
        let products = Products::parse("curl").unwrap();
        assert_eq!(products.items(), [ProductItem::Product(Product::new("curl", None).unwrap())]);
    }

    #[test]
    fn test_nested_comment() {
        let products = Products::parse("App/1 (built (nightly) \\) by \"ci)\")").unwrap();
        assert_eq!(
            products.items()[1],
            ProductItem::Comment("built (nightly) \\) by \"ci)\"".to_string())
        );
        assert_eq!(
            products.items()[1].comment_text().unwrap(),
            "built (nightly) ) by \"ci)\""
        );
    }

    #[test]
    fn test_name_starting_with_asterisk() {
        let products = Products::parse("*agent/1 x*/2.*").unwrap();
        assert_eq!(products.get("*agent").unwrap().version(), Some("1"));
        assert_eq!(products.get("x*").unwrap().version(), Some("2.*"));
        assert_eq!(products.to_string(), "*agent/1 x*/2.*");
        assert_eq!(Products::parse("*").unwrap().items().len(), 1);
    }

    #[test]
    fn test_whitespace_normalized() {
        let products = Products::parse("  a/1 \t (x)   b  ").unwrap();
        assert_eq!(products.to_string(), "a/1 (x) b");
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Products::parse(""),
            Err(Error::MissingValue { position: 0, .. })
        ));
        assert!(matches!(
            Products::parse("a/"),
            Err(Error::MissingValue { position: 2, .. })
        ));
        assert!(matches!(
            Products::parse("a/ 1"),
            Err(Error::InvalidCharacter { position: 2, .. })
        ));
        assert!(matches!(
            Products::parse("a /1"),
            Err(Error::InvalidCharacter { position: 2, .. })
        ));
        assert!(matches!(
            Products::parse("a (x"),
            Err(Error::MissingClosingParenthesis { .. })
        ));
        assert!(matches!(
            Products::parse("a, b"),
            Err(Error::InvalidCharacter { position: 1, .. })
        ));
    }

    #[test]
    fn test_new_validates() {
        assert!(Product::new("a b", None).is_err());
        assert!(Product::new("a", Some("")).is_err());
        assert_eq!(Product::new("a", Some("2")).unwrap().to_string(), "a/2");
    }
}
