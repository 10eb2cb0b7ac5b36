use crate::decode::DecodeError;
use crate::merge::MergeError;
use crate::tree::Element;

// -----------------------------------------------------------------------------
// FieldShape

/// How a field binds to the document, fixed at derive time.
///
/// Classification is first-match-wins:
///
/// 1. a `Vec` field annotated with both a wrapper name and an item element
///    name is a [`CompositeList`](Self::CompositeList);
/// 2. a field annotated `#[xml(adapter = ...)]` is [`Adapted`](Self::Adapted);
/// 3. otherwise the field type's own [`FieldValue::SHAPE`](super::FieldValue::SHAPE)
///    decides: derived enumerations report [`Enum`](Self::Enum), derived
///    composites report [`Composite`](Self::Composite), and the built-in
///    scalars report [`Scalar`](Self::Scalar).
///
/// A field whose type fits none of these fails at compile time with a missing
/// `FieldValue` implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldShape {
    /// Primitive converted from trimmed text content.
    Scalar,
    /// Enumeration converted from its canonical token.
    Enum,
    /// Nested composite decoded from the child element's own children.
    Composite,
    /// Wrapper element containing repeated item elements.
    CompositeList,
    /// Converted through a user-supplied [`Adapter`](crate::convert::Adapter).
    Adapted,
}

impl FieldShape {
    /// Lowercase name for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Enum => "enum",
            Self::Composite => "composite",
            Self::CompositeList => "composite list",
            Self::Adapted => "adapted",
        }
    }
}

impl core::fmt::Display for FieldShape {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// -----------------------------------------------------------------------------
// FieldDescriptor

type DecodeFn<T> = fn(&mut T, &Element) -> Result<(), DecodeError>;
type MergeFn<T> = fn(&mut T, &T, &T) -> Result<(), MergeError>;

/// Binding information for one field of a composite, size-fixed and `'static`.
///
/// The two function pointers are the field's capability table: the derive
/// macro generates one decode-into and one merge-into operation per field, so
/// the engines stay generic while field access stays fully typed. (Storing
/// behavior as plain `fn` pointers keeps the descriptor `Send + Sync` for
/// every `T`.)
pub struct FieldDescriptor<T> {
    name: &'static str,
    element_name: &'static str,
    item_element_name: Option<&'static str>,
    item_type: Option<&'static str>,
    shape: FieldShape,
    decode: DecodeFn<T>,
    merge: MergeFn<T>,
}

impl<T> FieldDescriptor<T> {
    /// Describe a singular field: scalar, enum, composite, or adapted.
    pub const fn new(
        name: &'static str,
        element_name: &'static str,
        shape: FieldShape,
        decode: DecodeFn<T>,
        merge: MergeFn<T>,
    ) -> Self {
        Self {
            name,
            element_name,
            item_element_name: None,
            item_type: None,
            shape,
            decode,
            merge,
        }
    }

    /// Describe a wrapped list field.
    ///
    /// `element_name` is the wrapper tag; `item_element_name` the tag of each
    /// repeated item inside it.
    pub const fn list(
        name: &'static str,
        element_name: &'static str,
        item_element_name: &'static str,
        item_type: &'static str,
        decode: DecodeFn<T>,
        merge: MergeFn<T>,
    ) -> Self {
        Self {
            name,
            element_name,
            item_element_name: Some(item_element_name),
            item_type: Some(item_type),
            shape: FieldShape::CompositeList,
            decode,
            merge,
        }
    }

    /// The field's own identifier.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The tag name this field binds to (the wrapper tag for lists).
    #[inline]
    pub const fn element_name(&self) -> &'static str {
        self.element_name
    }

    /// The tag name of each repeated item, for list fields.
    #[inline]
    pub const fn item_element_name(&self) -> Option<&'static str> {
        self.item_element_name
    }

    /// The declared item type of the sequence, for list fields.
    #[inline]
    pub const fn item_type(&self) -> Option<&'static str> {
        self.item_type
    }

    /// The field's [`FieldShape`].
    #[inline]
    pub const fn shape(&self) -> FieldShape {
        self.shape
    }

    /// Populate this field of `value` from its matched child element.
    #[inline]
    pub fn decode_into(&self, value: &mut T, element: &Element) -> Result<(), DecodeError> {
        (self.decode)(value, element)
    }

    /// Merge this field of `second` into `first`, with `baseline` providing
    /// the type's default value for the override-if-default test.
    #[inline]
    pub fn merge_into(&self, first: &mut T, second: &T, baseline: &T) -> Result<(), MergeError> {
        (self.merge)(first, second, baseline)
    }
}

impl<T> core::fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("element_name", &self.element_name)
            .field("item_element_name", &self.item_element_name)
            .field("item_type", &self.item_type)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}
