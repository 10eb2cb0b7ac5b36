//! Derive macro for the `xmlbind` crate. See [`Bind`].

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

static XML_ATTRIBUTE_NAME: &str = "xml";

// -----------------------------------------------------------------------------
// Modules

mod derive_data;
mod impls;

use derive_data::{BindKind, BindType};

// -----------------------------------------------------------------------------
// Crate path

/// The access path to the `xmlbind` crate in generated code.
///
/// `xmlbind` declares `extern crate self as xmlbind`, so the absolute path
/// also resolves inside the crate itself and its tests.
pub(crate) fn xmlbind_path() -> TokenStream2 {
    quote!(::xmlbind)
}

// -----------------------------------------------------------------------------
// Macros

/// # Document Binding Derivation
///
/// `#[derive(Bind)]` on a struct with named fields implements:
///
/// - `Described`: the field descriptor table driving decode and merge
/// - `FieldValue`: how the type behaves as a field of another composite
/// - `Merge`: the recursive merge engine entry point
/// - `Display`: renders the fields as child elements, for encoding
///
/// On an enum with unit variants it implements:
///
/// - `FromText`: decodes a variant from its canonical token
/// - `FieldValue`: enumerations bind as atomic leaf values
/// - `Merge`: a no-op, enumerations never merge partially
/// - `Display`: renders the canonical token
///
/// The type must also derive (or implement) `Clone`, `PartialEq` and
/// `Default`; decoding starts from a default instance, and merging judges
/// "still at its default" against one.
///
/// ## Container Attributes
///
/// ```rust, ignore
/// #[derive(Bind, Clone, Debug, Default, PartialEq)]
/// #[xml(root = "settings", auto_register)]
/// struct Settings { /* ... */ }
/// ```
///
/// - `root = "..."`: the tag wrapping the type at the document root. Defaults
///   to the type name with its first letter lowercased.
/// - `auto_register`: submit the type for
///   [`TypeRegistry::auto_register`](../xmlbind/registry/struct.TypeRegistry.html#method.auto_register).
///
/// ## Field Attributes
///
/// ```rust, ignore
/// #[derive(Bind, Clone, Debug, Default, PartialEq)]
/// struct Settings {
///     retries: u32,                          // binds to <retries>
///     #[xml(element = "renderCase")]
///     render_case: String,                   // binds to <renderCase>
///     #[xml(wrap = "schemata", element = "schema")]
///     schemata: Vec<Schema>,                 // <schemata><schema>..</schema></schemata>
///     #[xml(adapter = HexAdapter)]
///     mask: u32,                             // converted through HexAdapter
///     #[xml(skip)]
///     cache: usize,                          // never bound, stays at default
/// }
/// ```
///
/// - `element = "..."`: the tag the field binds to; for wrapped lists, the
///   tag of each repeated item. Defaults to the field name.
/// - `wrap` / `wrap = "..."`: marks a `Vec<_>` field as a wrapped list and
///   names the wrapper tag. Defaults to the field name.
/// - `adapter = Path`: converts the field through the named
///   [`Adapter`](../xmlbind/convert/trait.Adapter.html) instead of the field
///   type's own grammar.
/// - `skip`: leaves the field out of binding entirely.
///
/// ## Variant Attributes
///
/// - `rename = "..."`: the variant's canonical token, when it differs from
///   the variant identifier.
///
/// ## Generics
///
/// Generic types are not supported; the descriptor table is per concrete
/// type.
#[proc_macro_derive(Bind, attributes(xml))]
pub fn derive_bind(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let tokens = match BindType::parse(&input) {
        Ok(info) => match &info.kind {
            BindKind::Struct(fields) => impls::impl_struct(&info, fields),
            BindKind::Enum(variants) => impls::impl_enum(&info, variants),
        },
        Err(err) => err.to_compile_error(),
    };

    tokens.into()
}
