//! The tree decoder: populate a typed object graph from an [`Element`] tree.
//!
//! All entry points funnel into [`decode_element`]: [`from_str`] parses an
//! in-memory string, [`from_reader`] drains a stream first, [`from_path`]
//! reads a file. Failures to obtain the tree surface as
//! [`SourceError`](crate::tree::SourceError) before any decoding runs.
//!
//! Decoding is tolerant of partial documents (a missing child leaves the
//! field at its default) and of unknown children (forward compatibility),
//! but strict about content: text that does not match a field's grammar is a
//! fatal [`DecodeError`] for the whole call. There are no partial results.

use std::fmt;
use std::io::Read;
use std::path::Path;

use crate::convert::{Adapter, ConversionError};
use crate::info::{Described, FieldValue};
use crate::tree::{self, Element, SourceError};

// -----------------------------------------------------------------------------
// DecodeError

/// A fatal failure while decoding a document into an object graph.
#[derive(Debug)]
pub enum DecodeError {
    /// The input tree could not be obtained at all.
    Source(SourceError),
    /// An element's text did not match the target field's grammar.
    ///
    /// `type_name` and `field` are filled in by the decoding loop of the
    /// composite that owns the field, so the error pinpoints the offending
    /// element without re-running.
    Conversion {
        type_name: Option<&'static str>,
        field: Option<&'static str>,
        element: String,
        source: ConversionError,
    },
    /// No registered type could be instantiated for the document.
    ///
    /// Only the dynamic, registry-driven path can raise this; the typed path
    /// proves constructibility at compile time through the `Default` bound.
    Instantiation { element: String },
}

impl DecodeError {
    /// A conversion failure at `element`, before field attribution.
    pub fn conversion(element: &Element, source: ConversionError) -> Self {
        Self::Conversion {
            type_name: None,
            field: None,
            element: element.name().to_owned(),
            source,
        }
    }

    /// Attribute a conversion failure to the field being decoded.
    ///
    /// Attribution sticks to the innermost composite: once filled, it is not
    /// overwritten by outer decoding loops.
    fn for_field(mut self, type_name: &'static str, field: &'static str) -> Self {
        if let Self::Conversion {
            type_name: slot_type @ None,
            field: slot_field,
            ..
        } = &mut self
        {
            *slot_type = Some(type_name);
            *slot_field = Some(field);
        }
        self
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(err) => write!(f, "cannot obtain document: {err}"),
            Self::Conversion {
                type_name,
                field,
                element,
                source,
            } => {
                write!(f, "{source} (element `{element}`")?;
                if let (Some(type_name), Some(field)) = (type_name, field) {
                    write!(f, ", field `{field}` of `{type_name}`")?;
                }
                write!(f, ")")
            }
            Self::Instantiation { element } => {
                write!(f, "no registered type decodes root element `{element}`")
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(err) => Some(err),
            Self::Conversion { source, .. } => Some(source),
            Self::Instantiation { .. } => None,
        }
    }
}

impl From<SourceError> for DecodeError {
    #[inline]
    fn from(err: SourceError) -> Self {
        Self::Source(err)
    }
}

// -----------------------------------------------------------------------------
// Entry points

/// Decode a document held in a string.
///
/// # Example
///
/// ```
/// use xmlbind::derive::Bind;
///
/// #[derive(Bind, Clone, Debug, Default, PartialEq)]
/// struct Cfg {
///     retries: u32,
///     name: String,
/// }
///
/// let cfg: Cfg = xmlbind::from_str("<cfg><retries>3</retries><name>a</name></cfg>")?;
/// assert_eq!(cfg, Cfg { retries: 3, name: "a".into() });
/// # Ok::<(), xmlbind::decode::DecodeError>(())
/// ```
pub fn from_str<T: Described + Default>(xml: &str) -> Result<T, DecodeError> {
    let root = tree::parse_str(xml)?;
    decode_element(&root)
}

/// Decode a document read from a stream.
pub fn from_reader<T: Described + Default, R: Read>(reader: R) -> Result<T, DecodeError> {
    let root = tree::parse_reader(reader)?;
    decode_element(&root)
}

/// Decode a document stored at `path`.
pub fn from_path<T: Described + Default, P: AsRef<Path>>(path: P) -> Result<T, DecodeError> {
    let root = tree::parse_path(path)?;
    decode_element(&root)
}

// -----------------------------------------------------------------------------
// Tree decoder

/// Decode `element` as a `T`.
///
/// Instantiates `T::default()`, then walks `T`'s descriptor in field order:
/// the first child matching each field's element name populates the field;
/// an absent child leaves the field at its default; children matching no
/// field are ignored.
pub fn decode_element<T: Described + Default>(element: &Element) -> Result<T, DecodeError> {
    let mut value = T::default();
    decode_fields(&mut value, element)?;
    Ok(value)
}

/// Populate the fields of an existing `value` from `element`.
pub fn decode_fields<T: Described>(value: &mut T, element: &Element) -> Result<(), DecodeError> {
    let descriptor = T::descriptor();
    for field in descriptor.fields() {
        let Some(child) = element.child(field.element_name()) else {
            continue;
        };
        field
            .decode_into(value, child)
            .map_err(|err| err.for_field(descriptor.type_name(), field.name()))?;
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// List decoder

/// Decode the repeated `item_tag` children of a wrapper element.
///
/// Children with other tag names are skipped; the result keeps document
/// order, which is observable application behavior (precedence lists).
pub fn decode_list<T: FieldValue>(
    wrapper: &Element,
    item_tag: &str,
) -> Result<Vec<T>, DecodeError> {
    let mut items = Vec::new();
    for child in wrapper.children() {
        if child.matches(item_tag) {
            items.push(T::decode_element(child)?);
        }
    }
    Ok(items)
}

// -----------------------------------------------------------------------------
// Per-field operations
//
// Monomorphic helpers the derive macro points field descriptors at.

/// Decode `element` into a singular field slot.
#[inline]
pub fn assign_field<F: FieldValue>(slot: &mut F, element: &Element) -> Result<(), DecodeError> {
    *slot = F::decode_element(element)?;
    Ok(())
}

/// Decode a wrapper element into a list field slot.
#[inline]
pub fn assign_list<F: FieldValue>(
    slot: &mut Vec<F>,
    wrapper: &Element,
    item_tag: &str,
) -> Result<(), DecodeError> {
    *slot = decode_list(wrapper, item_tag)?;
    Ok(())
}

/// Convert `element`'s trimmed text through a freshly constructed adapter
/// and store the result in the field slot.
#[inline]
pub fn assign_adapted<A: Adapter>(
    slot: &mut A::Value,
    element: &Element,
) -> Result<(), DecodeError> {
    *slot = A::default()
        .parse(element.text().trim())
        .map_err(|err| DecodeError::conversion(element, err))?;
    Ok(())
}

// -----------------------------------------------------------------------------
// Tests
