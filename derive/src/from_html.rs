//! Implementation of #[derive(FromHtml)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, LitStr};

use crate::serde_names::ContainerNames;

pub fn derive_from_html_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "FromHtml requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "FromHtml only works on structs",
            ))
        }
    };

    let names = ContainerNames::from_attrs(&input.attrs)?;
    let mut descriptors = Vec::new();
    for field in fields {
        if let Some(tag) = css_tag(field)? {
            // Named fields always carry an ident
            let unraw = field
                .ident
                .as_ref()
                .map(|ident| ident.unraw().to_string())
                .unwrap_or_default();
            let key = names.field_key(field, &unraw)?;
            descriptors.push(descriptor(field, &key, &tag));
        }
    }

    Ok(quote! {
        impl #impl_generics ::tagscrape::FromHtml for #name #ty_generics #where_clause {
            fn fields() -> ::std::vec::Vec<::tagscrape::FieldDescriptor> {
                ::std::vec![#(#descriptors),*]
            }
        }

        impl #impl_generics ::tagscrape::FieldShape for #name #ty_generics #where_clause {
            fn shape() -> ::tagscrape::Shape {
                ::tagscrape::record_shape::<Self>()
            }
        }
    })
}

fn descriptor(field: &Field, key: &str, tag: &LitStr) -> TokenStream2 {
    let ty = &field.ty;

    quote! {
        ::tagscrape::FieldDescriptor::new(
            #key,
            #tag,
            <#ty as ::tagscrape::FieldShape>::shape(),
        )
    }
}

/// Tag from `#[css("...")]`, erroring on duplicates
fn css_tag(field: &Field) -> syn::Result<Option<LitStr>> {
    let mut tag: Option<LitStr> = None;
    for attr in &field.attrs {
        if !attr.path().is_ident("css") {
            continue;
        }
        if tag.is_some() {
            return Err(syn::Error::new_spanned(attr, "duplicate #[css] attribute"));
        }
        tag = Some(attr.parse_args::<LitStr>()?);
    }
    Ok(tag)
}
