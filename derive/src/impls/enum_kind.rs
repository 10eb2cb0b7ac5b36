use proc_macro2::TokenStream;
use quote::quote;

use crate::derive_data::{BindType, BindVariant};

/// Generate the implementation set for a unit-variant enum: `FromText`,
/// `FieldValue`, `Merge` and `Display`, keyed on the variants' canonical
/// tokens.
///
/// Enumerations are atomic values: they decode from their token, render as
/// their token, and merging them is a no-op keeping the base value.
pub(crate) fn impl_enum(info: &BindType<'_>, variants: &[BindVariant<'_>]) -> TokenStream {
    let xmlbind = crate::xmlbind_path();
    let ident = info.ident;
    let type_name = ident.to_string();

    let from_arms: Vec<TokenStream> = variants
        .iter()
        .map(|variant| {
            let variant_ident = variant.ident;
            let token = &variant.token;
            quote! { #token => ::core::result::Result::Ok(Self::#variant_ident), }
        })
        .collect();

    let display_arms: Vec<TokenStream> = variants
        .iter()
        .map(|variant| {
            let variant_ident = variant.ident;
            let token = &variant.token;
            quote! { Self::#variant_ident => f.write_str(#token), }
        })
        .collect();

    quote! {
        const _: () = {
            impl #xmlbind::convert::FromText for #ident {
                fn from_text(
                    text: &str,
                ) -> ::core::result::Result<Self, #xmlbind::convert::ConversionError> {
                    match text {
                        #(#from_arms)*
                        other => ::core::result::Result::Err(
                            #xmlbind::convert::ConversionError::new(other, #type_name),
                        ),
                    }
                }
            }

            impl #xmlbind::info::FieldValue for #ident {
                const SHAPE: #xmlbind::info::FieldShape = #xmlbind::info::FieldShape::Enum;

                fn decode_element(
                    element: &#xmlbind::tree::Element,
                ) -> ::core::result::Result<Self, #xmlbind::decode::DecodeError> {
                    <Self as #xmlbind::convert::FromText>::from_text(element.text().trim())
                        .map_err(|err| #xmlbind::decode::DecodeError::conversion(element, err))
                }
            }

            impl #xmlbind::merge::Merge for #ident {
                fn merge_from(
                    &mut self,
                    _other: &Self,
                ) -> ::core::result::Result<(), #xmlbind::merge::MergeError> {
                    ::core::result::Result::Ok(())
                }
            }

            impl ::core::fmt::Display for #ident {
                fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                    match self {
                        #(#display_arms)*
                    }
                }
            }
        };
    }
}
