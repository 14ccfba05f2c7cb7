#![recursion_limit = "128"]
//! # DocMap Derive Macros
//!
//! Procedural macros deriving the `docmap` mapping traits.
//!
//! ## Macros
//!
//! ### `Convertible`
//!
//! Derives `docmap::common::Convertible` for structs with named fields and
//! for enums. Fields missing from a document decode from `Null`, so optional
//! fields may be absent in stored data.
//!
//! - **Type attribute**: `#[converter(ignored = "a, b")]` skips fields; they
//!   are rebuilt with `Default::default()`
//!
//! ### `Entity`
//!
//! Derives `docmap::repository::Entity` for structs with named fields.
//! Works together with `Convertible`.
//!
//! - **Type attribute**: `#[entity(name = "...", collection = "...", id = "...")]`
//! - **Field attribute**: `#[sub_collection(name = "...")]` renames the
//!   sub-collection held by a `SubCollection<_>` field
//!
//! # Examples
//!
//! ```rust,ignore
//! use docmap::repository::SubCollection;
//! use docmap_derive::{Convertible, Entity};
//!
//! #[derive(Entity, Convertible, Default)]
//! pub struct Post {
//!     pub id: Option<String>,
//!     pub title: String,
//!     pub comments: SubCollection<Comment>,
//! }
//!
//! #[derive(Entity, Convertible, Default)]
//! #[entity(collection = "remarks")]
//! pub struct Comment {
//!     pub id: Option<String>,
//!     pub text: String,
//! }
//! ```

extern crate proc_macro;
mod convertible;
mod entity;

use crate::convertible::{generate_convertible_for_enum, generate_convertible_for_struct};
use crate::entity::generate_entity_for_struct;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

/// Derives the `Convertible` trait.
///
/// # Errors
///
/// Returns a compile error for unions and tuple structs.
#[proc_macro_derive(Convertible, attributes(converter))]
pub fn derive_convert(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    let result = match ast.data {
        Data::Struct(ref data) => generate_convertible_for_struct(&ast, data),
        Data::Enum(ref data) => generate_convertible_for_enum(&ast, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &ast,
            "Cannot derive Convertible for unions",
        )),
    };

    match result {
        Ok(token_stream) => token_stream,
        Err(e) => syn::Error::new_spanned(
            &ast,
            format!("Failed to derive Convertible for '{}': {}", ast.ident, e),
        )
        .to_compile_error()
        .into(),
    }
}

/// Derives the `Entity` trait.
///
/// The id field defaults to `id` and must be a `String` or an
/// `Option<String>`. Every field of type `SubCollection<_>` becomes a
/// sub-collection named after its entity's default collection name unless
/// `#[sub_collection(name = "...")]` says otherwise.
///
/// # Errors
///
/// Returns a compile error for enums, unions and tuple structs, and when the
/// id field does not exist.
#[proc_macro_derive(Entity, attributes(entity, sub_collection))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_entity_for_struct(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => syn::Error::new_spanned(
                &ast,
                format!(
                    "Failed to derive Entity for struct '{}': {}.\n\
                     Example: #[derive(Entity)] pub struct MyEntity {{ id: Option<String> }}",
                    ast.ident, e
                ),
            )
            .to_compile_error()
            .into(),
        },
        Data::Enum(_) => syn::Error::new_spanned(
            &ast,
            "Cannot derive Entity for enums. Only structs are supported.",
        )
        .to_compile_error()
        .into(),
        Data::Union(_) => syn::Error::new_spanned(
            &ast,
            "Cannot derive Entity for unions. Only structs are supported.",
        )
        .to_compile_error()
        .into(),
    }
}
