//! Input model for the [`Bind`](crate::Bind) derive: container, field and
//! variant attributes, parsed and validated before any code is generated.

use syn::{
    Attribute, Data, DeriveInput, Fields, GenericArgument, Ident, LitStr, Path, PathArguments,
    Type,
};

use crate::XML_ATTRIBUTE_NAME;

// -----------------------------------------------------------------------------
// BindType

pub(crate) struct BindType<'a> {
    pub ident: &'a Ident,
    pub attrs: TypeAttrs,
    pub kind: BindKind<'a>,
}

pub(crate) enum BindKind<'a> {
    Struct(Vec<BindField<'a>>),
    Enum(Vec<BindVariant<'a>>),
}

impl<'a> BindType<'a> {
    pub fn parse(input: &'a DeriveInput) -> syn::Result<Self> {
        if !input.generics.params.is_empty() {
            return Err(syn::Error::new_spanned(
                &input.generics,
                "`Bind` does not support generic types",
            ));
        }

        let attrs = TypeAttrs::parse(&input.attrs)?;
        let kind = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(fields) => BindKind::Struct(
                    fields
                        .named
                        .iter()
                        .map(BindField::parse)
                        .collect::<syn::Result<_>>()?,
                ),
                fields => {
                    return Err(syn::Error::new_spanned(
                        fields,
                        "`Bind` requires a struct with named fields",
                    ));
                }
            },
            Data::Enum(data) => BindKind::Enum(
                data.variants
                    .iter()
                    .map(BindVariant::parse)
                    .collect::<syn::Result<_>>()?,
            ),
            Data::Union(data) => {
                return Err(syn::Error::new_spanned(
                    data.union_token,
                    "`Bind` does not support unions",
                ));
            }
        };

        Ok(Self {
            ident: &input.ident,
            attrs,
            kind,
        })
    }

    /// The tag wrapping this type at the document root: the `root` attribute,
    /// or the type name with its first letter lowercased.
    pub fn root_element(&self) -> String {
        match &self.attrs.root {
            Some(root) => root.clone(),
            None => decapitalize(&self.ident.to_string()),
        }
    }
}

// -----------------------------------------------------------------------------
// TypeAttrs

#[derive(Default)]
pub(crate) struct TypeAttrs {
    pub root: Option<String>,
    pub auto_register: bool,
}

impl TypeAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        for attr in attrs {
            if !attr.path().is_ident(XML_ATTRIBUTE_NAME) {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("root") {
                    let lit: LitStr = meta.value()?.parse()?;
                    out.root = Some(lit.value());
                    Ok(())
                } else if meta.path.is_ident("auto_register") {
                    out.auto_register = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown `xml` container attribute"))
                }
            })?;
        }
        Ok(out)
    }
}

// -----------------------------------------------------------------------------
// BindField

pub(crate) struct BindField<'a> {
    pub ident: &'a Ident,
    pub ty: &'a Type,
    pub attrs: FieldAttrs,
}

#[derive(Default)]
pub(crate) struct FieldAttrs {
    pub element: Option<String>,
    /// `Some(None)` for bare `wrap`, `Some(Some(name))` for `wrap = "name"`.
    pub wrap: Option<Option<String>>,
    pub adapter: Option<Path>,
    pub skip: bool,
}

impl<'a> BindField<'a> {
    fn parse(field: &'a syn::Field) -> syn::Result<Self> {
        let mut attrs = FieldAttrs::default();
        for attr in &field.attrs {
            if !attr.path().is_ident(XML_ATTRIBUTE_NAME) {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("element") {
                    let lit: LitStr = meta.value()?.parse()?;
                    attrs.element = Some(lit.value());
                    Ok(())
                } else if meta.path.is_ident("wrap") {
                    if meta.input.peek(syn::Token![=]) {
                        let lit: LitStr = meta.value()?.parse()?;
                        attrs.wrap = Some(Some(lit.value()));
                    } else {
                        attrs.wrap = Some(None);
                    }
                    Ok(())
                } else if meta.path.is_ident("adapter") {
                    attrs.adapter = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    attrs.skip = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown `xml` field attribute"))
                }
            })?;
        }

        let parsed = Self {
            // Only named fields reach this point.
            ident: field.ident.as_ref().unwrap(),
            ty: &field.ty,
            attrs,
        };
        parsed.validate(field)?;
        Ok(parsed)
    }

    fn validate(&self, field: &syn::Field) -> syn::Result<()> {
        if self.attrs.wrap.is_some() && self.attrs.adapter.is_some() {
            return Err(syn::Error::new_spanned(
                field,
                "`wrap` and `adapter` cannot be combined",
            ));
        }
        if self.attrs.wrap.is_some() && self.list_item().is_none() {
            return Err(syn::Error::new_spanned(
                &field.ty,
                "`wrap` requires a `Vec<_>` field",
            ));
        }
        Ok(())
    }

    /// The tag this field binds to: the wrapper tag for lists, otherwise the
    /// `element` attribute or the field name.
    pub fn element_name(&self) -> String {
        if let Some(wrap) = &self.attrs.wrap {
            return match wrap {
                Some(name) => name.clone(),
                None => self.ident.to_string(),
            };
        }
        match &self.attrs.element {
            Some(name) => name.clone(),
            None => self.ident.to_string(),
        }
    }

    /// The tag of each repeated item of a wrapped list: the `element`
    /// attribute or the field name.
    pub fn item_element_name(&self) -> String {
        match &self.attrs.element {
            Some(name) => name.clone(),
            None => self.ident.to_string(),
        }
    }

    /// The item type of a `Vec<_>` field, for wrapped lists.
    pub fn list_item(&self) -> Option<&'a Type> {
        generic_inner(self.ty, "Vec")
    }

    /// The inner type of an `Option<_>` field, for rendering.
    pub fn option_inner(&self) -> Option<&'a Type> {
        generic_inner(self.ty, "Option")
    }
}

// -----------------------------------------------------------------------------
// BindVariant

pub(crate) struct BindVariant<'a> {
    pub ident: &'a Ident,
    pub token: String,
}

impl<'a> BindVariant<'a> {
    fn parse(variant: &'a syn::Variant) -> syn::Result<Self> {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                &variant.fields,
                "`Bind` enums must have unit variants only",
            ));
        }

        let mut token = None;
        for attr in &variant.attrs {
            if !attr.path().is_ident(XML_ATTRIBUTE_NAME) {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let lit: LitStr = meta.value()?.parse()?;
                    token = Some(lit.value());
                    Ok(())
                } else {
                    Err(meta.error("unknown `xml` variant attribute"))
                }
            })?;
        }

        Ok(Self {
            ident: &variant.ident,
            token: token.unwrap_or_else(|| variant.ident.to_string()),
        })
    }
}

// -----------------------------------------------------------------------------
// Type helpers

/// The single type argument of `wrapper<T>`, matched on the last path
/// segment.
fn generic_inner<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

/// The last path segment of a type, as written.
pub(crate) fn type_ident_string(ty: &Type) -> String {
    if let Type::Path(path) = ty {
        if let Some(segment) = path.path.segments.last() {
            return segment.ident.to_string();
        }
    }
    // Fallback for non-path item types; only used in diagnostics.
    quote::ToTokens::to_token_stream(ty).to_string()
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
