/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
#![forbid(unsafe_code)]

//! Missive Macro Library
//!
//! Procedural macros for the Missive typed notification layer.
//!
//! # Message Macro
//!
//! [`missive_message`] turns a plain struct into a bus-ready message:
//!
//! ```ignore
//! // Name defaults to the struct name, subject to `()`, dispatch to concurrent.
//! #[missive_message]
//! pub struct Ping;
//!
//! #[missive_message(name = "document.saved", subject = Document, dispatch = "both")]
//! pub struct DocumentSaved {
//!     pub path: String,
//! }
//! ```

use proc_macro::TokenStream;

use quote::{format_ident, quote};
use syn::{parse_macro_input, DeriveInput, LitStr, Type};

fn has_derive(input: &DeriveInput, trait_name: &str) -> bool {
    input.attrs.iter().any(|attr| {
        if attr.path().is_ident("derive") {
            let mut found = false;
            let _ = attr.parse_nested_meta(|meta| {
                // Accept both `Serialize` and `serde::Serialize`.
                if meta
                    .path
                    .segments
                    .last()
                    .is_some_and(|segment| segment.ident == trait_name)
                {
                    found = true;
                }
                Ok(())
            });
            found
        } else {
            false
        }
    })
}

/// Dispatch discipline markers requested through `dispatch = "..."`.
#[derive(Clone, Copy, PartialEq, Eq)]
enum DispatchChoice {
    Concurrent,
    Affinity,
    Both,
}

/// Configuration options parsed from `#[missive_message(...)]` attributes.
struct MessageConfig {
    /// Bus-level name; defaults to the struct identifier.
    name: Option<LitStr>,
    /// Subject type; defaults to `()`.
    subject: Option<Type>,
    dispatch: DispatchChoice,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            name: None,
            subject: None,
            dispatch: DispatchChoice::Concurrent,
        }
    }
}

impl MessageConfig {
    fn parser(&mut self) -> impl syn::parse::Parser<Output = ()> + '_ {
        syn::meta::parser(move |meta| {
            if meta.path.is_ident("name") {
                self.name = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("subject") {
                self.subject = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("dispatch") {
                let value: LitStr = meta.value()?.parse()?;
                self.dispatch = match value.value().as_str() {
                    "concurrent" => DispatchChoice::Concurrent,
                    "affinity" => DispatchChoice::Affinity,
                    "both" => DispatchChoice::Both,
                    other => {
                        return Err(syn::Error::new_spanned(
                            &value,
                            format!(
                                "unknown dispatch `{other}`; expected \"concurrent\", \"affinity\" or \"both\""
                            ),
                        ))
                    }
                };
                Ok(())
            } else {
                Err(meta.error("unsupported missive_message option; expected `name`, `subject` or `dispatch`"))
            }
        })
    }
}

/// Derives everything a type needs to travel over a Missive bus.
///
/// # Usage
///
/// ```ignore
/// use missive::prelude::*;
///
/// #[missive_message(name = "TestAsyncMessage", subject = TestSubject)]
/// pub struct TestAsyncMessage {
///     pub content: String,
/// }
/// ```
///
/// This expands to:
/// - `#[derive(Clone, Debug, Serialize, Deserialize)]` (only traits not already present)
/// - an implementation of `missive::MessageCodec` whose payload is the serde
///   representation of the struct and whose name is the `name` option
///   (or the struct name)
/// - `missive::AsyncMessage` and/or `missive::AffinityMessage` according to
///   `dispatch` (`"concurrent"` by default)
/// - a compile-time assertion that the type is `Send + Sync + 'static`
#[proc_macro_attribute]
pub fn missive_message(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut config = MessageConfig::default();
    let parser = config.parser();
    parse_macro_input!(attr with parser);

    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let bus_name = config
        .name
        .clone()
        .unwrap_or_else(|| LitStr::new(&name.to_string(), name.span()));
    let subject = config
        .subject
        .clone()
        .map_or_else(|| quote!(()), |ty| quote!(#ty));

    let derives = {
        let mut traits = Vec::new();
        if !has_derive(&input, "Clone") {
            traits.push(quote!(Clone));
        }
        if !has_derive(&input, "Debug") {
            traits.push(quote!(Debug));
        }
        if !has_derive(&input, "Serialize") {
            traits.push(quote!(::missive::__private::serde::Serialize));
        }
        if !has_derive(&input, "Deserialize") {
            traits.push(quote!(::missive::__private::serde::Deserialize));
        }
        if traits.is_empty() {
            quote!()
        } else {
            quote!(#[derive(#(#traits),*)])
        }
    };

    // User-supplied serde derives resolve serde through the user's own path.
    let serde_crate = if has_derive(&input, "Serialize") && has_derive(&input, "Deserialize") {
        quote!()
    } else {
        quote!(#[serde(crate = "::missive::__private::serde")])
    };

    let markers = {
        let concurrent = quote! {
            impl #impl_generics ::missive::AsyncMessage for #name #ty_generics #where_clause {}
        };
        let affinity = quote! {
            impl #impl_generics ::missive::AffinityMessage for #name #ty_generics #where_clause {}
        };
        match config.dispatch {
            DispatchChoice::Concurrent => concurrent,
            DispatchChoice::Affinity => affinity,
            DispatchChoice::Both => quote!(#concurrent #affinity),
        }
    };

    let assert_ident = format_ident!("_AssertMissiveMessage_{}", name);

    let expanded = quote! {
        #derives
        #serde_crate
        #input

        impl #impl_generics ::missive::MessageCodec for #name #ty_generics #where_clause {
            type Subject = #subject;

            const NAME: ::missive::MessageName = ::missive::MessageName::from_static(#bus_name);

            fn decode(envelope: &::missive::Envelope) -> ::core::option::Option<Self> {
                ::missive::codec::decode_serde(envelope, &Self::NAME)
            }

            fn encode(&self) -> ::missive::Envelope {
                ::missive::codec::encode_serde(self, Self::NAME)
            }

            fn try_encode(&self) -> ::missive::Result<::missive::Envelope> {
                ::missive::codec::try_encode_serde(self, Self::NAME)
            }
        }

        #markers

        // Messages cross threads on every delivery path.
        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + Sync + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}
