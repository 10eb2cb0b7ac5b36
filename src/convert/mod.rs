//! Text-to-value conversion for leaf elements.
//!
//! Every scalar field funnels through [`FromText`]; custom conversions go
//! through an [`Adapter`]. Input text is whitespace-trimmed by the caller
//! before it reaches either trait.

use std::fmt;
use std::str::FromStr;

// -----------------------------------------------------------------------------
// ConversionError

/// The text content of an element does not match the target type's grammar.
///
/// This error is fatal for the enclosing decode call; it is never recovered
/// locally. The decoder wraps it with the field and element it was working
/// on, so the offending value can be located without re-running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    text: String,
    target: &'static str,
}

impl ConversionError {
    /// Record that `text` could not be read as a `target`.
    pub fn new(text: impl Into<String>, target: &'static str) -> Self {
        Self {
            text: text.into(),
            target,
        }
    }

    /// The offending text, already trimmed.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Name of the type the text was supposed to become.
    #[inline]
    pub const fn target(&self) -> &'static str {
        self.target
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot convert `{}` into `{}`", self.text, self.target)
    }
}

impl std::error::Error for ConversionError {}

// -----------------------------------------------------------------------------
// FromText

/// Conversion from an element's trimmed text content.
///
/// Implemented for the primitive scalars and `String`; the derive macro
/// implements it for enumerations, matching each variant's canonical token
/// exactly (the variant identifier, or its `#[xml(rename = "...")]`
/// override).
///
/// # Example
///
/// ```
/// use xmlbind::convert::FromText;
///
/// assert_eq!(u32::from_text("17")?, 17);
/// assert!(u32::from_text("seventeen").is_err());
/// # Ok::<(), xmlbind::convert::ConversionError>(())
/// ```
pub trait FromText: Sized {
    /// Convert `text` into a value, failing with a [`ConversionError`] when
    /// the text does not lexically match the target grammar.
    fn from_text(text: &str) -> Result<Self, ConversionError>;
}

macro_rules! impl_from_text_via_from_str {
    ($($ty:ty),* $(,)?) => {$(
        impl FromText for $ty {
            #[inline]
            fn from_text(text: &str) -> Result<Self, ConversionError> {
                <$ty as FromStr>::from_str(text)
                    .map_err(|_| ConversionError::new(text, stringify!($ty)))
            }
        }
    )*};
}

impl_from_text_via_from_str! {
    bool, char,
    i8, i16, i32, i64, i128, isize,
    u8, u16, u32, u64, u128, usize,
    f32, f64,
}

impl FromText for String {
    #[inline]
    fn from_text(text: &str) -> Result<Self, ConversionError> {
        Ok(text.to_owned())
    }
}

// -----------------------------------------------------------------------------
// Adapter

/// A bidirectional text converter for values without a natural grammar.
///
/// The `Default` bound is the factory: the decoder constructs a fresh adapter
/// for each conversion, mirroring the per-use construction of the original
/// adapter annotation.
///
/// # Example
///
/// ```
/// use xmlbind::convert::{Adapter, ConversionError};
///
/// /// Stores comma-separated tokens as a vector.
/// #[derive(Default)]
/// struct CsvAdapter;
///
/// impl Adapter for CsvAdapter {
///     type Value = Vec<String>;
///
///     fn parse(&self, text: &str) -> Result<Self::Value, ConversionError> {
///         Ok(text.split(',').map(|s| s.trim().to_owned()).collect())
///     }
///
///     fn format(&self, value: &Self::Value) -> String {
///         value.join(",")
///     }
/// }
///
/// let parsed = CsvAdapter.parse("a, b ,c")?;
/// assert_eq!(parsed, ["a", "b", "c"]);
/// assert_eq!(CsvAdapter.format(&parsed), "a,b,c");
/// # Ok::<(), ConversionError>(())
/// ```
pub trait Adapter: Default {
    /// The in-memory type this adapter produces.
    type Value;

    /// Convert trimmed text into a value.
    fn parse(&self, text: &str) -> Result<Self::Value, ConversionError>;

    /// Render a value back into text.
    fn format(&self, value: &Self::Value) -> String;
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_grammar() {
        assert_eq!(i32::from_text("-3").unwrap(), -3);
        assert_eq!(u64::from_text("42").unwrap(), 42);
        assert_eq!(f64::from_text("2.5").unwrap(), 2.5);
        assert!(bool::from_text("true").unwrap());
        assert_eq!(String::from_text("any text").unwrap(), "any text");
    }

    #[test]
    fn lexical_mismatch_reports_text_and_target() {
        let err = u32::from_text("-1").unwrap_err();
        assert_eq!(err.text(), "-1");
        assert_eq!(err.target(), "u32");
        assert_eq!(err.to_string(), "cannot convert `-1` into `u32`");
    }

    #[test]
    fn bool_rejects_loose_spellings() {
        assert!(bool::from_text("TRUE").is_err());
        assert!(bool::from_text("1").is_err());
    }
}
