use proc_macro2::TokenStream;
use quote::quote;

use crate::derive_data::{BindField, BindType, type_ident_string};

/// Generate the full implementation set for a named struct: `Described`,
/// `FieldValue`, `Merge` and `Display`, plus the optional auto registration
/// submission.
pub(crate) fn impl_struct(info: &BindType<'_>, fields: &[BindField<'_>]) -> TokenStream {
    let xmlbind = crate::xmlbind_path();
    let ident = info.ident;
    let type_name = ident.to_string();
    let root_element = info.root_element();

    let descriptors: Vec<TokenStream> = fields
        .iter()
        .filter(|field| !field.attrs.skip)
        .map(|field| field_descriptor(info, field))
        .collect();

    let render: Vec<TokenStream> = fields
        .iter()
        .filter(|field| !field.attrs.skip)
        .map(field_render)
        .collect();

    let auto_register = if info.attrs.auto_register {
        quote! {
            #xmlbind::__macro_exports::inventory::submit! {
                #xmlbind::registry::AutoRegistration {
                    register: |registry: &#xmlbind::registry::TypeRegistry| {
                        registry.register::<#ident>();
                    },
                }
            }
        }
    } else {
        TokenStream::new()
    };

    quote! {
        const _: () = {
            static DESCRIPTOR: #xmlbind::info::DescriptorCell<#ident> =
                #xmlbind::info::DescriptorCell::new();

            impl #xmlbind::info::Described for #ident {
                fn descriptor() -> &'static #xmlbind::info::TypeDescriptor<Self> {
                    DESCRIPTOR.get_or_init(|| {
                        #xmlbind::info::TypeDescriptor::new(
                            #type_name,
                            #root_element,
                            ::std::vec![#(#descriptors),*],
                        )
                    })
                }
            }

            impl #xmlbind::info::FieldValue for #ident {
                const SHAPE: #xmlbind::info::FieldShape =
                    #xmlbind::info::FieldShape::Composite;

                fn decode_element(
                    element: &#xmlbind::tree::Element,
                ) -> ::core::result::Result<Self, #xmlbind::decode::DecodeError> {
                    #xmlbind::decode::decode_element(element)
                }

                fn merge_nested(
                    &mut self,
                    other: &Self,
                ) -> ::core::result::Result<(), #xmlbind::merge::MergeError> {
                    #xmlbind::merge::Merge::merge_from(self, other)
                }
            }

            impl #xmlbind::merge::Merge for #ident {
                fn merge_from(
                    &mut self,
                    other: &Self,
                ) -> ::core::result::Result<(), #xmlbind::merge::MergeError> {
                    #xmlbind::merge::merge_graphs(self, other)
                }
            }

            impl ::core::fmt::Display for #ident {
                fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                    #(#render)*
                    ::core::result::Result::Ok(())
                }
            }

            #auto_register
        };
    }
}

/// The `FieldDescriptor` expression for one field.
fn field_descriptor(info: &BindType<'_>, field: &BindField<'_>) -> TokenStream {
    let xmlbind = crate::xmlbind_path();
    let ident = info.ident;
    let field_ident = field.ident;
    let field_name = field.ident.to_string();
    let element_name = field.element_name();

    if let Some(item_ty) = field.list_item() {
        if field.attrs.wrap.is_some() {
            let item_name = field.item_element_name();
            let item_type = type_ident_string(item_ty);
            return quote! {
                #xmlbind::info::FieldDescriptor::list(
                    #field_name,
                    #element_name,
                    #item_name,
                    #item_type,
                    |value: &mut #ident, element: &#xmlbind::tree::Element| {
                        #xmlbind::decode::assign_list(&mut value.#field_ident, element, #item_name)
                    },
                    |first: &mut #ident, second: &#ident, _baseline: &#ident| {
                        #xmlbind::merge::merge_list(&mut first.#field_ident, &second.#field_ident)
                    },
                )
            };
        }
    }

    if let Some(adapter) = &field.attrs.adapter {
        return quote! {
            #xmlbind::info::FieldDescriptor::new(
                #field_name,
                #element_name,
                #xmlbind::info::FieldShape::Adapted,
                |value: &mut #ident, element: &#xmlbind::tree::Element| {
                    #xmlbind::decode::assign_adapted::<#adapter>(&mut value.#field_ident, element)
                },
                |first: &mut #ident, second: &#ident, baseline: &#ident| {
                    #xmlbind::merge::merge_opaque(
                        &mut first.#field_ident,
                        &second.#field_ident,
                        &baseline.#field_ident,
                    )
                },
            )
        };
    }

    let field_ty = field.ty;
    quote! {
        #xmlbind::info::FieldDescriptor::new(
            #field_name,
            #element_name,
            <#field_ty as #xmlbind::info::FieldValue>::SHAPE,
            |value: &mut #ident, element: &#xmlbind::tree::Element| {
                #xmlbind::decode::assign_field(&mut value.#field_ident, element)
            },
            |first: &mut #ident, second: &#ident, baseline: &#ident| {
                #xmlbind::merge::merge_field(
                    &mut first.#field_ident,
                    &second.#field_ident,
                    &baseline.#field_ident,
                )
            },
        )
    }
}

/// The `Display` statement rendering one field.
fn field_render(field: &BindField<'_>) -> TokenStream {
    let xmlbind = crate::xmlbind_path();
    let field_ident = field.ident;
    let element_name = field.element_name();

    if field.list_item().is_some() && field.attrs.wrap.is_some() {
        let item_name = field.item_element_name();
        return quote! {
            #xmlbind::encode::write_list(f, #element_name, #item_name, &self.#field_ident)?;
        };
    }

    if let Some(adapter) = &field.attrs.adapter {
        return quote! {
            #xmlbind::encode::write_scalar(
                f,
                #element_name,
                &#xmlbind::convert::Adapter::format(
                    &<#adapter as ::core::default::Default>::default(),
                    &self.#field_ident,
                ),
            )?;
        };
    }

    if field.option_inner().is_some() {
        return quote! {
            if let ::core::option::Option::Some(value) = &self.#field_ident {
                #xmlbind::encode::write_field(f, #element_name, value)?;
            }
        };
    }

    quote! {
        #xmlbind::encode::write_field(f, #element_name, &self.#field_ident)?;
    }
}
