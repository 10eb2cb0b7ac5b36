//! Per-type binding information: the descriptor table and the traits the
//! [`Bind`](crate::derive::Bind) derive implements.
//!
//! This is the registry's raw material. Every derived type gets a
//! [`TypeDescriptor`] computed once and cached in a static [`DescriptorCell`],
//! and a [`FieldValue`] implementation describing how the type behaves when
//! it appears *as a field* of some other composite.

mod field_info;
mod type_info;

pub(crate) mod impls;

pub use field_info::{FieldDescriptor, FieldShape};
pub use type_info::{DescriptorCell, TypeDescriptor};

use crate::decode::DecodeError;
use crate::merge::MergeError;
use crate::tree::Element;

// -----------------------------------------------------------------------------
// Described

/// A composite type with a derived structural schema.
///
/// Implemented by `#[derive(Bind)]` on structs; not meant to be implemented
/// by hand. The descriptor is derived once per type and cached for the
/// lifetime of the process, so repeated calls are cheap and always return
/// the same table.
pub trait Described: Sized + 'static {
    /// The type's cached [`TypeDescriptor`].
    fn descriptor() -> &'static TypeDescriptor<Self>;
}

// -----------------------------------------------------------------------------
// FieldValue

/// Behavior of a type when bound as a singular field of a composite.
///
/// The built-in scalars and `String` implement this with
/// [`Scalar`](FieldShape::Scalar) shape; `#[derive(Bind)]` implements it for
/// enumerations ([`Enum`](FieldShape::Enum)) and structs
/// ([`Composite`](FieldShape::Composite)); `Option<F>` forwards to `F` and
/// contributes the notion of absence.
///
/// The [`merge_nested`](Self::merge_nested) hook doubles as the merge
/// engine's family boundary: the default implementation is a no-op (a
/// conflicting foreign or primitive value on both sides is left alone, first
/// wins), while derived composites override it with a real recursive merge.
/// Only types that went through the same derive ever recurse, which is this
/// crate's rendering of "recurse only into composites from the same package".
pub trait FieldValue: Clone + PartialEq + Sized + 'static {
    /// How this type binds, used to classify fields at descriptor build time.
    const SHAPE: FieldShape;

    /// Decode a value of this type from its matched child element.
    fn decode_element(element: &Element) -> Result<Self, DecodeError>;

    /// Whether this value counts as absent for merge precedence.
    ///
    /// Only `Option::None` is absent; every other value is present.
    #[inline]
    fn is_absent(&self) -> bool {
        false
    }

    /// Merge `other` into `self` when both sides hold a non-default value.
    ///
    /// No-op by default; see the trait docs.
    #[inline]
    fn merge_nested(&mut self, _other: &Self) -> Result<(), MergeError> {
        Ok(())
    }
}
