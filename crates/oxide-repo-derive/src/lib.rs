//! Derive macros for oxide-repo.
//!
//! This crate provides `#[derive(Record)]`, which describes a struct as a
//! stored record, and `#[derive(AggregateRow)]` for aggregate result
//! destinations.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Expr, Field, Fields, Ident, Lit, Meta, Type};

/// Derives the `Record` trait for a struct.
///
/// # Attributes
///
/// - `#[record(collection = "users")]` - Collection (table) name (optional,
///   defaults to snake_case of struct name)
/// - `#[record(package = "user")]` - Package name (optional, defaults to
///   snake_case of struct name)
///
/// # Field Attributes
///
/// - `#[column(name = "column_name")]` - Storage name (optional, defaults to
///   field name)
/// - `#[column(ident)]` - Marks the identity column; exactly one is required
/// - `#[column(auto)]` - Marks a system-generated column, never written
/// - `#[column(nullable)]` - Marks the column as nullable
/// - `#[column(comparable)]` - Allows comparing the column to other columns
#[proc_macro_derive(Record, attributes(record, column))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_record_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derives the `AggregateRow` trait for a struct.
///
/// Fields are read by position, in declaration order, so they must follow
/// the order of the aggregate columns.
#[proc_macro_derive(AggregateRow)]
pub fn derive_aggregate_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_aggregate_row_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_record_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let record_attrs = parse_record_attrs(&input.attrs, struct_name)?;
    let fields = named_fields(&input, "Record")?;

    let mut columns: Vec<ColumnInfo> = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.clone() else {
            continue;
        };
        let attrs = parse_column_attrs(&field.attrs)?;
        columns.push(ColumnInfo {
            column_name: attrs.name.unwrap_or_else(|| field_name.to_string()),
            field_name,
            field_type: field.ty.clone(),
            is_ident: attrs.ident,
            is_auto: attrs.auto,
            is_nullable: attrs.nullable,
            is_comparable: attrs.comparable,
        });
    }

    let idents: Vec<&ColumnInfo> = columns.iter().filter(|c| c.is_ident).collect();
    let ident = match idents.as_slice() {
        [ident] => *ident,
        [] => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Record derive requires one field marked #[column(ident)]",
            ));
        }
        [_, second, ..] => {
            return Err(syn::Error::new_spanned(
                &second.field_name,
                "Record derive allows only one field marked #[column(ident)]",
            ));
        }
    };
    let id_type = &ident.field_type;

    let collection = &record_attrs.collection;
    let package = &record_attrs.package;

    let column_descriptors: Vec<TokenStream2> = columns
        .iter()
        .map(|info| {
            let column_name = &info.column_name;
            let field_type = &info.field_type;
            let field_str = info.field_name.to_string();
            let mut hooks = quote! { .field(#field_str) };
            if info.is_ident {
                hooks.extend(quote! { .ident() });
            }
            if info.is_auto {
                hooks.extend(quote! { .auto() });
            }
            if info.is_nullable {
                hooks.extend(quote! { .nullable() });
            }
            if info.is_comparable {
                hooks.extend(quote! { .comparable() });
            }
            quote! {
                .column(::oxide_repo::ColumnDescriptor::of::<#field_type>(#column_name) #hooks)
            }
        })
        .collect();

    let field_decoders: Vec<TokenStream2> = columns
        .iter()
        .map(|info| {
            let field_name = &info.field_name;
            let column_name = &info.column_name;
            quote! { #field_name: row.get(#column_name)? }
        })
        .collect();

    // Auto columns are generated by the database
    let write_values: Vec<TokenStream2> = columns
        .iter()
        .filter(|c| !c.is_auto)
        .map(|info| {
            let field_name = &info.field_name;
            let column_name = &info.column_name;
            quote! {
                (#column_name, ::oxide_repo::ToSqlValue::to_sql_value(::std::clone::Clone::clone(&self.#field_name)))
            }
        })
        .collect();

    let expanded = quote! {
        impl ::oxide_repo::Record for #struct_name {
            type Id = #id_type;

            fn descriptor() -> ::oxide_repo::RecordDescriptor {
                ::oxide_repo::RecordDescriptor::new(#package, #collection)
                    #(#column_descriptors)*
            }

            fn from_row(row: &::oxide_repo::Row) -> ::oxide_repo::Result<Self> {
                Ok(Self {
                    #(#field_decoders),*
                })
            }

            fn values(&self) -> ::std::vec::Vec<(&'static str, ::oxide_repo::SqlValue)> {
                vec![#(#write_values),*]
            }
        }
    };

    Ok(expanded)
}

fn derive_aggregate_row_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let fields = named_fields(&input, "AggregateRow")?;

    let field_decoders: Vec<TokenStream2> = fields
        .iter()
        .enumerate()
        .filter_map(|(index, field)| {
            let field_name = field.ident.as_ref()?;
            Some(quote! { #field_name: row.get_at(#index)? })
        })
        .collect();
    let field_count = field_decoders.len();

    Ok(quote! {
        impl ::oxide_repo::AggregateRow for #struct_name {
            const FIELDS: usize = #field_count;

            fn from_row(row: &::oxide_repo::Row) -> ::oxide_repo::Result<Self> {
                Ok(Self {
                    #(#field_decoders),*
                })
            }
        }
    })
}

fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> syn::Result<&'a Punctuated<Field, Comma>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(&fields.named),
            _ => Err(syn::Error::new_spanned(
                input,
                format!("{derive} derive only supports structs with named fields"),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            input,
            format!("{derive} derive only supports structs"),
        )),
    }
}

struct ColumnInfo {
    field_name: Ident,
    field_type: Type,
    column_name: String,
    is_ident: bool,
    is_auto: bool,
    is_nullable: bool,
    is_comparable: bool,
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    ident: bool,
    auto: bool,
    nullable: bool,
    comparable: bool,
}

struct RecordAttrs {
    collection: String,
    package: String,
}

fn parse_record_attrs(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<RecordAttrs> {
    let default_name = to_snake_case(&struct_name.to_string());
    let mut collection = None;
    let mut package = None;

    for attr in attrs {
        if attr.path().is_ident("record") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("collection") {
                    collection = Some(parse_str_value(&meta)?);
                } else if meta.path.is_ident("package") {
                    package = Some(parse_str_value(&meta)?);
                } else {
                    return Err(meta.error("unknown record attribute"));
                }
                Ok(())
            })?;
        }
    }

    Ok(RecordAttrs {
        collection: collection.unwrap_or_else(|| default_name.clone()),
        package: package.unwrap_or(default_name),
    })
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("column") {
            // Handle empty attribute like #[column]
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("ident") {
                    result.ident = true;
                } else if meta.path.is_ident("auto") {
                    result.auto = true;
                } else if meta.path.is_ident("nullable") {
                    result.nullable = true;
                } else if meta.path.is_ident("comparable") {
                    result.comparable = true;
                } else if meta.path.is_ident("name") {
                    result.name = Some(parse_str_value(&meta)?);
                } else {
                    return Err(meta.error("unknown column attribute"));
                }
                Ok(())
            })?;
        }
    }

    Ok(result)
}

fn parse_str_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    let value: Expr = meta.value()?.parse()?;
    if let Expr::Lit(lit) = &value {
        if let Lit::Str(s) = &lit.lit {
            return Ok(s.value());
        }
    }
    Err(syn::Error::new_spanned(value, "expected a string literal"))
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
