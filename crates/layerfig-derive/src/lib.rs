//! `#[derive(Settings)]` for layerfig.
//!
//! The derive implements `layerfig::Settings` (field enumeration) and
//! `layerfig::Setting` (so the struct can be nested inside another settings
//! struct). Per-field metadata is attached with the `setting` attribute:
//!
//! ```ignore
//! #[derive(Settings, Default)]
//! struct Server {
//!     #[setting("env=PORT,flag=p port")]
//!     port: u16,
//!     database: Database,
//!     #[setting(skip)]
//!     cache: Cache,
//! }
//! ```
//!
//! A derived struct can also sit behind `Box<T>` or `Option<T>`. Inside an
//! `Option` it must implement `Default`, which is what a source writes into
//! when the option is `None`.
//!
//! The annotation string is not interpreted here; it is parsed at runtime
//! so malformed annotations surface as a typed error from the collector.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::ParseStream;
use syn::{Attribute, Data, DeriveInput, Fields, Ident, LitStr, parse_macro_input};

#[proc_macro_derive(Settings, attributes(setting))]
pub fn derive_settings(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct FieldAttr {
    annotation: Option<String>,
    skip: bool,
}

impl FieldAttr {
    fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = FieldAttr::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("setting")) {
            attr.parse_args_with(|input: ParseStream| {
                if input.peek(LitStr) {
                    let lit: LitStr = input.parse()?;
                    if out.annotation.replace(lit.value()).is_some() {
                        return Err(syn::Error::new(lit.span(), "duplicate setting annotation"));
                    }
                    return Ok(());
                }
                let ident: Ident = input.parse()?;
                if ident == "skip" {
                    out.skip = true;
                    Ok(())
                } else {
                    Err(syn::Error::new(
                        ident.span(),
                        "expected an annotation string or `skip`",
                    ))
                }
            })?;
        }
        Ok(out)
    }
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Settings can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Settings can only be derived for structs",
            ));
        }
    };

    let mut slots = Vec::new();
    for field in named {
        let attr = FieldAttr::from_attrs(&field.attrs)?;
        if attr.skip {
            continue;
        }
        let Some(ident) = &field.ident else {
            continue;
        };
        let name = ident.unraw().to_string();
        let annotation = attr.annotation.unwrap_or_default();
        slots.push(quote! {
            ::layerfig::FieldSlot::new(#name, #annotation, &mut self.#ident)
        });
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::layerfig::Settings for #ident #ty_generics #where_clause {
            fn fields_mut(&mut self) -> ::std::vec::Vec<::layerfig::FieldSlot<'_>> {
                ::std::vec![#(#slots),*]
            }
        }

        impl #impl_generics ::layerfig::Setting for #ident #ty_generics #where_clause {
            fn kind(&self) -> ::layerfig::Kind {
                ::layerfig::Kind::Struct
            }

            fn set_text(&mut self, _text: &str) -> ::std::result::Result<(), ::layerfig::CoerceError> {
                ::std::result::Result::Err(::layerfig::CoerceError::Unsupported {
                    kind: ::layerfig::Kind::Struct,
                })
            }

            fn set_node(&mut self, _node: &::layerfig::Node) -> ::std::result::Result<(), ::layerfig::CoerceError> {
                ::std::result::Result::Err(::layerfig::CoerceError::Mismatch {
                    kind: ::layerfig::Kind::Struct,
                    reason: "nested settings are matched field by field".to_string(),
                })
            }

            fn reset(&mut self) {
                for slot in ::layerfig::Settings::fields_mut(self) {
                    slot.value.reset();
                }
            }

            fn as_settings_mut(&mut self) -> ::std::option::Option<&mut dyn ::layerfig::Settings> {
                ::std::option::Option::Some(self)
            }
        }
    })
}
