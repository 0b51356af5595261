extern crate proc_macro;

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Ident};

fn parse_derive_input(input: TokenStream) -> DeriveInput {
    syn::parse(input).expect("unable to parse derive input")
}

/// Collect the variant identifiers of a fieldless enum, panicking with a message naming the
/// offending derive if the input is not an enum or if any variant carries fields.
fn fieldless_variants<'a>(ast: &'a DeriveInput, derive_name: &str) -> Vec<&'a Ident> {
    let name = &ast.ident;

    let Data::Enum(data) = &ast.data else {
        panic!("{derive_name} can only be derived for enums; {name} is not an enum");
    };

    data.variants
        .iter()
        .map(|variant| {
            let variant_name = &variant.ident;
            assert!(
                variant.fields.is_empty(),
                "{derive_name} requires fieldless variants; {name}::{variant_name} has fields"
            );
            variant_name
        })
        .collect()
}

/// Normalize an identifier or user string for matching: lowercase, with `-`, `_` and spaces
/// removed, so that `ForceDmg`, `force-dmg` and `FORCE_DMG` all compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Implement `std::fmt::Display` for a fieldless enum, printing each variant's name.
#[proc_macro_derive(EnumDisplay)]
pub fn enum_display(input: TokenStream) -> TokenStream {
    let ast = parse_derive_input(input);
    let name = &ast.ident;

    let match_arms = fieldless_variants(&ast, "EnumDisplay").into_iter().map(|variant| {
        let variant_str = variant.to_string();
        quote! { Self::#variant => f.write_str(#variant_str) }
    });

    quote! {
        impl ::std::fmt::Display for #name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    #(#match_arms,)*
                }
            }
        }
    }
    .into()
}

/// Implement `std::str::FromStr` for a fieldless enum with `Err = String`. Matching ignores case
/// and any `-`/`_`/space separators.
#[proc_macro_derive(EnumFromStr)]
pub fn enum_from_str(input: TokenStream) -> TokenStream {
    let ast = parse_derive_input(input);
    let name = &ast.ident;

    let match_arms = fieldless_variants(&ast, "EnumFromStr").into_iter().map(|variant| {
        let key = normalize(&variant.to_string());
        quote! { #key => Ok(Self::#variant) }
    });

    let err_fmt = format!("invalid {name} value: '{{}}'");
    quote! {
        impl ::std::str::FromStr for #name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized: String = s
                    .chars()
                    .filter(|c| !matches!(c, '-' | '_' | ' '))
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                match normalized.as_str() {
                    #(#match_arms,)*
                    _ => Err(format!(#err_fmt, s)),
                }
            }
        }
    }
    .into()
}

/// Implement `serde::Serialize` by writing the value's `Display` output as a string.
#[proc_macro_derive(StrSerialize)]
pub fn str_serialize(input: TokenStream) -> TokenStream {
    let ast = parse_derive_input(input);
    let ident = &ast.ident;

    quote! {
        impl serde::Serialize for #ident {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }
    }
    .into()
}

/// Implement `serde::Deserialize` by parsing a string through the type's `FromStr` impl.
#[proc_macro_derive(StrDeserialize)]
pub fn str_deserialize(input: TokenStream) -> TokenStream {
    let ast = parse_derive_input(input);
    let ident = &ast.ident;

    let visitor = format_ident!("__{}StrVisitor", ident);
    let expecting = format!("a string naming a {ident}");

    quote! {
        #[doc(hidden)]
        struct #visitor;

        impl<'de> serde::de::Visitor<'de> for #visitor {
            type Value = #ident;

            fn expecting(&self, formatter: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                formatter.write_str(#expecting)
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse().map_err(E::custom)
            }
        }

        impl<'de> serde::Deserialize<'de> for #ident {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                deserializer.deserialize_str(#visitor)
            }
        }
    }
    .into()
}
