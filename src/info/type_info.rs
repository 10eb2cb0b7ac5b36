use std::sync::OnceLock;

use super::FieldDescriptor;

// -----------------------------------------------------------------------------
// TypeDescriptor

/// The derived structural schema of a composite type.
///
/// Holds the field descriptors in declaration order. Declaration order is
/// significant for round-trip fidelity but decode and merge are correct under
/// any order.
///
/// Descriptors are computed once per type and cached for the lifetime of the
/// process; see [`DescriptorCell`] and
/// [`Described::descriptor`](super::Described::descriptor).
///
/// # Example
///
/// ```
/// use xmlbind::derive::Bind;
/// use xmlbind::info::{Described, FieldShape};
///
/// #[derive(Bind, Clone, Debug, Default, PartialEq)]
/// struct Cfg {
///     retries: u32,
///     name: String,
/// }
///
/// let descriptor = Cfg::descriptor();
/// assert_eq!(descriptor.type_name(), "Cfg");
/// assert_eq!(descriptor.fields().len(), 2);
/// assert_eq!(descriptor.fields()[0].shape(), FieldShape::Scalar);
/// ```
pub struct TypeDescriptor<T> {
    type_name: &'static str,
    root_element: &'static str,
    fields: Vec<FieldDescriptor<T>>,
}

impl<T> TypeDescriptor<T> {
    /// Assemble a descriptor from its derived parts.
    pub const fn new(
        type_name: &'static str,
        root_element: &'static str,
        fields: Vec<FieldDescriptor<T>>,
    ) -> Self {
        Self {
            type_name,
            root_element,
            fields,
        }
    }

    /// The type's identifier, without module path.
    #[inline]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The tag name wrapping the type at the document root.
    #[inline]
    pub const fn root_element(&self) -> &'static str {
        self.root_element
    }

    /// The field descriptors, in declaration order.
    #[inline]
    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    /// Look up a field descriptor by field name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.fields.iter().find(|field| field.name() == name)
    }
}

impl<T> core::fmt::Debug for TypeDescriptor<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("root_element", &self.root_element)
            .field("fields", &self.fields)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// DescriptorCell

/// Static storage for a lazily computed [`TypeDescriptor`].
///
/// One cell is generated per derived type. Internally an [`OnceLock`], so the
/// descriptor is computed at most once per process no matter how many threads
/// race on first use.
pub struct DescriptorCell<T: 'static>(OnceLock<TypeDescriptor<T>>);

impl<T> DescriptorCell<T> {
    /// Create an empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Return the stored descriptor, computing it from `f` on first access.
    #[inline]
    pub fn get_or_init(
        &self,
        f: impl FnOnce() -> TypeDescriptor<T>,
    ) -> &TypeDescriptor<T> {
        self.0.get_or_init(f)
    }
}

impl<T> Default for DescriptorCell<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
