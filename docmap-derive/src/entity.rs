use proc_macro::TokenStream;
use quote::quote;
use syn::{DataStruct, DeriveInput, Field, LitStr, Result, Type};

struct SubCollectionField<'a> {
    field: &'a Field,
    name: Option<String>,
}

fn is_sub_collection(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "SubCollection"),
        _ => false,
    }
}

fn parse_sub_collection_name(field: &Field) -> Result<Option<String>> {
    let mut name = None;
    for attr in &field.attrs {
        if attr.path().is_ident("sub_collection") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    name = Some(s.value());
                    Ok(())
                } else {
                    Err(meta.error("Unknown sub_collection attribute"))
                }
            })?
        }
    }
    Ok(name)
}

pub(crate) fn generate_entity_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut entity_name = name.to_string();
    let mut collection_name: Option<String> = None;
    let mut id_field_name = "id".to_string();

    for attr in &ast.attrs {
        if attr.path().is_ident("entity") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let s: LitStr = meta.value()?.parse()?;
                    entity_name = s.value();
                    Ok(())
                } else if meta.path.is_ident("collection") {
                    let s: LitStr = meta.value()?.parse()?;
                    collection_name = Some(s.value());
                    Ok(())
                } else if meta.path.is_ident("id") {
                    let s: LitStr = meta.value()?.parse()?;
                    id_field_name = s.value();
                    Ok(())
                } else {
                    Err(meta.error("Unknown entity attribute"))
                }
            })?
        }
    }

    let fields: Vec<&Field> = match &data.fields {
        syn::Fields::Named(fields) => fields.named.iter().collect(),
        _ => {
            return Err(syn::Error::new_spanned(
                ast,
                "Only structs with named fields are supported",
            ))
        }
    };

    let id_field = fields
        .iter()
        .find(|field| field.ident.as_ref().is_some_and(|ident| ident == &id_field_name))
        .ok_or_else(|| {
            syn::Error::new_spanned(ast, format!("Field {} not found in struct", id_field_name))
        })?;
    let id_ident = &id_field.ident;

    let mut sub_collections = Vec::new();
    for field in &fields {
        let sub_name = parse_sub_collection_name(field)?;
        if is_sub_collection(&field.ty) {
            sub_collections.push(SubCollectionField { field, name: sub_name });
        } else if sub_name.is_some() {
            return Err(syn::Error::new_spanned(
                field,
                "#[sub_collection] is only allowed on SubCollection<_> fields",
            ));
        }
    }

    let collection_name_code = match collection_name {
        Some(collection) => quote! {
            fn collection_name() -> Option<&'static str> {
                Some(#collection)
            }
        },
        None => quote! {},
    };

    let sub_collection_keys: Vec<String> = sub_collections
        .iter()
        .filter_map(|sub| sub.field.ident.as_ref().map(|i| i.to_string()))
        .collect();

    let descriptors: Vec<proc_macro2::TokenStream> = sub_collections
        .iter()
        .zip(sub_collection_keys.iter())
        .map(|(sub, key)| {
            let ty = &sub.field.ty;
            let child = quote! {
                docmap::metadata::EntityType::of::<<#ty as docmap::repository::SubCollectionField>::Entity>()
            };
            match &sub.name {
                Some(sub_name) => quote! {
                    docmap::metadata::SubCollectionDescriptor::new(
                        #sub_name,
                        #child,
                        docmap::metadata::EntityType::of::<Self>(),
                        #key,
                    )
                },
                None => quote! {
                    docmap::metadata::SubCollectionDescriptor::with_default_name(
                        #child,
                        docmap::metadata::EntityType::of::<Self>(),
                        #key,
                    )
                },
            }
        })
        .collect();

    let sub_collection_code = if sub_collections.is_empty() {
        quote! {}
    } else {
        let sub_idents: Vec<_> = sub_collections.iter().map(|sub| &sub.field.ident).collect();
        quote! {
            fn sub_collection_keys() -> Vec<&'static str> {
                vec![#(#sub_collection_keys),*]
            }

            fn sub_collections() -> Vec<docmap::metadata::SubCollectionDescriptor> {
                vec![#(#descriptors),*]
            }

            fn attach_sub_collection(
                &mut self,
                property_key: &str,
                binding: docmap::repository::SubCollectionBinding,
            ) -> docmap::errors::DocMapResult<()> {
                match property_key {
                    #(#sub_collection_keys => docmap::repository::SubCollectionField::bind(&mut self.#sub_idents, binding),)*
                    _ => Ok(()),
                }
            }
        }
    };

    let gen = quote! {
        impl #impl_generics docmap::repository::Entity for #name #ty_generics #where_clause {
            fn entity_name() -> &'static str {
                #entity_name
            }

            #collection_name_code

            fn id_field() -> &'static str {
                #id_field_name
            }

            fn id(&self) -> Option<&str> {
                docmap::repository::IdField::as_id(&self.#id_ident)
            }

            #sub_collection_code
        }
    };

    Ok(TokenStream::from(gen))
}
