use proc_macro::TokenStream;
use proc_macro2::{Ident, Span};
use quote::quote;
use syn::{DataEnum, DataStruct, DeriveInput, Field, LitStr, Result, Type};

fn parse_ignored_fields(ast: &DeriveInput) -> Result<Vec<String>> {
    let mut ignored_fields: Vec<String> = vec![];
    for attr in &ast.attrs {
        if attr.path().is_ident("converter") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("ignored") {
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    ignored_fields.extend(
                        s.value()
                            .split(',')
                            .map(|field| field.trim().to_string())
                            .filter(|field| !field.is_empty()),
                    );
                    Ok(())
                } else {
                    Err(meta.error("Unknown converter attribute"))
                }
            })?
        }
    }
    Ok(ignored_fields)
}

fn mapping_error(message: &str) -> proc_macro2::TokenStream {
    quote! {
        docmap::errors::DocMapError::new(#message, docmap::errors::ErrorKind::ObjectMappingError)
    }
}

pub(crate) fn generate_convertible_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let ignored_fields = parse_ignored_fields(ast)?;

    let fields: Vec<&Field> = match &data.fields {
        syn::Fields::Named(ref fields) => fields.named.iter().collect(),
        _ => {
            return Err(syn::Error::new_spanned(
                ast,
                "Only structs with named fields are supported",
            ))
        }
    };

    let stored_idents: Vec<&Ident> = fields
        .iter()
        .filter_map(|f| f.ident.as_ref())
        .filter(|ident| !ignored_fields.contains(&ident.to_string()))
        .collect();
    let stored_names: Vec<String> = stored_idents.iter().map(|i| i.to_string()).collect();

    let initializers: Vec<proc_macro2::TokenStream> = fields
        .iter()
        .filter_map(|f| f.ident.as_ref().map(|ident| (ident, &f.ty)))
        .map(|(ident, ty)| {
            let name = ident.to_string();
            if ignored_fields.contains(&name) {
                quote! { #ident: Default::default() }
            } else {
                quote! {
                    #ident: docmap::common::from_value::<#ty>(
                        doc.get_ref(#name).unwrap_or(&docmap::common::Value::Null),
                    )?
                }
            }
        })
        .collect();

    let name = &ast.ident;
    let not_a_document = mapping_error(&format!("Value is not a {} document", name));
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let gen = quote! {
        impl #impl_generics docmap::common::Convertible for #name #ty_generics #where_clause {
            type Output = Self;

            fn to_value(&self) -> docmap::errors::DocMapResult<docmap::common::Value> {
                let mut doc = docmap::common::Document::new();
                #(doc.put_literal(#stored_names, docmap::common::Convertible::to_value(&self.#stored_idents)?);)*
                Ok(docmap::common::Value::Document(doc))
            }

            fn from_value(value: &docmap::common::Value) -> docmap::errors::DocMapResult<Self::Output> {
                match value {
                    docmap::common::Value::Document(doc) => Ok(#name {
                        #(#initializers,)*
                    }),
                    _ => Err(#not_a_document),
                }
            }
        }
    };

    Ok(TokenStream::from(gen))
}

pub(crate) fn generate_convertible_for_enum(ast: &DeriveInput, data: &DataEnum) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let ignored_fields = parse_ignored_fields(ast)?;

    let variant_count = data.variants.len();
    let mut to_value_variants = Vec::with_capacity(variant_count);
    let mut from_value_variants = Vec::with_capacity(variant_count);

    for variant in &data.variants {
        let variant_ident = &variant.ident;
        let variant_name = variant_ident.to_string();

        match &variant.fields {
            syn::Fields::Named(fields) => {
                let stored_idents: Vec<&Ident> = fields
                    .named
                    .iter()
                    .filter_map(|f| f.ident.as_ref())
                    .filter(|ident| !ignored_fields.contains(&ident.to_string()))
                    .collect();
                let stored_names: Vec<String> = stored_idents.iter().map(|i| i.to_string()).collect();

                to_value_variants.push(quote! {
                    #name::#variant_ident { #(#stored_idents,)* .. } => {
                        let mut data = docmap::common::Document::new();
                        #(data.put_literal(#stored_names, docmap::common::Convertible::to_value(#stored_idents)?);)*
                        (#variant_name, docmap::common::Value::Document(data))
                    }
                });

                let initializers: Vec<proc_macro2::TokenStream> = fields
                    .named
                    .iter()
                    .filter_map(|f| f.ident.as_ref().map(|ident| (ident, &f.ty)))
                    .map(|(ident, ty)| {
                        let field_name = ident.to_string();
                        if ignored_fields.contains(&field_name) {
                            quote! { #ident: Default::default() }
                        } else {
                            quote! {
                                #ident: docmap::common::from_value::<#ty>(
                                    data.get_ref(#field_name).unwrap_or(&docmap::common::Value::Null),
                                )?
                            }
                        }
                    })
                    .collect();
                let not_a_document = mapping_error(&format!("Variant {} is not a document", variant_name));

                from_value_variants.push(quote! {
                    Some(#variant_name) => {
                        let data = data.as_document().ok_or_else(|| #not_a_document)?;
                        Ok(#name::#variant_ident {
                            #(#initializers,)*
                        })
                    }
                });
            }
            syn::Fields::Unnamed(fields) => {
                let field_count = fields.unnamed.len();
                let field_idents: Vec<Ident> = (0..field_count)
                    .map(|i| Ident::new(&format!("field_{}", i), Span::call_site()))
                    .collect();

                to_value_variants.push(quote! {
                    #name::#variant_ident(#(#field_idents),*) => {
                        let mut array = Vec::with_capacity(#field_count);
                        #(array.push(docmap::common::Convertible::to_value(#field_idents)?);)*
                        (#variant_name, docmap::common::Value::Array(array))
                    }
                });

                let field_indices: Vec<usize> = (0..field_count).collect();
                let field_types: Vec<&Type> = fields.unnamed.iter().map(|f| &f.ty).collect();
                let not_an_array = mapping_error(&format!(
                    "Variant {} needs an array of {} values",
                    variant_name, field_count
                ));

                from_value_variants.push(quote! {
                    Some(#variant_name) => {
                        let data = data
                            .as_array()
                            .filter(|items| items.len() == #field_count)
                            .ok_or_else(|| #not_an_array)?;
                        Ok(#name::#variant_ident(
                            #(docmap::common::from_value::<#field_types>(&data[#field_indices])?,)*
                        ))
                    }
                });
            }
            syn::Fields::Unit => {
                to_value_variants.push(quote! {
                    #name::#variant_ident => (#variant_name, docmap::common::Value::Null)
                });

                from_value_variants.push(quote! {
                    Some(#variant_name) => Ok(#name::#variant_ident)
                });
            }
        }
    }

    let unknown_variant = mapping_error(&format!("Value is not a valid {} variant", name));
    let not_a_document = mapping_error(&format!("Value is not a {} document", name));

    let gen = quote! {
        impl #impl_generics docmap::common::Convertible for #name #ty_generics #where_clause {
            type Output = Self;

            fn to_value(&self) -> docmap::errors::DocMapResult<docmap::common::Value> {
                let (variant, data): (&str, docmap::common::Value) = match self {
                    #(#to_value_variants),*
                };
                let mut document = docmap::common::Document::new();
                document.put_literal("variant", docmap::common::Value::from(variant));
                document.put_literal("value", data);
                Ok(docmap::common::Value::Document(document))
            }

            fn from_value(value: &docmap::common::Value) -> docmap::errors::DocMapResult<Self::Output> {
                let doc = value.as_document().ok_or_else(|| #not_a_document)?;
                #[allow(unused_variables)]
                let data = doc.get("value");
                match doc.get_ref("variant").and_then(|v| v.as_str()) {
                    #(#from_value_variants,)*
                    _ => Err(#unknown_variant),
                }
            }
        }
    };

    Ok(TokenStream::from(gen))
}
