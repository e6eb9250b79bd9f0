//! Derive macro mapping structs onto quarry schema descriptors.
//!
//! This crate provides `#[derive(Record)]`, which implements
//! `quarry_core::Record` for a struct with named fields.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Fields, GenericArgument, Ident, LitStr,
    Meta, PathArguments, Type,
};

/// Derives `Record` for a struct.
///
/// Column types are inferred from field types through `FieldType`;
/// `Option<T>` fields are nullable. Without any `primary` or
/// `auto_increment` field, the first field becomes the primary key.
///
/// # Field Attributes
///
/// - `#[column(name = "column_name")]` - SQL column name (defaults to the field name)
/// - `#[column(sql_type = "varchar(50)")]` - Overrides the inferred type
/// - `#[column(primary)]` - Adds the column to the primary key
/// - `#[column(auto_increment)]` - Auto-incrementing primary key on `i64`, `i32`, `i16`,
///   `u32` or `u16`
/// - `#[column(foreign_key = "table")]` - References the same-named column of `table`
/// - `#[column(nullable)]` - Allows NULL
/// - `#[column(unique)]` - Adds a UNIQUE constraint
/// - `#[column(default = "expr")]` - Raw SQL default expression
#[proc_macro_derive(Record, attributes(column))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_record_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_record_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Record derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Record derive only supports structs",
            ));
        }
    };

    let mut columns = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.clone() else {
            continue;
        };
        let attrs = parse_column_attrs(&field.attrs)?;
        columns.push(ColumnInfo::new(field_name, field.ty.clone(), attrs)?);
    }

    let has_key = columns.iter().any(|c| c.primary || c.auto_increment.is_some());
    if !has_key {
        if let Some(first) = columns.first_mut() {
            first.primary = true;
        }
    }

    let declarations = columns.iter().map(ColumnInfo::declaration);
    let reads = columns.iter().map(|c| {
        let field = &c.field_name;
        let name = &c.column_name;
        quote! { #field: row.get(#name)? }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::quarry_core::Record for #struct_name #ty_generics #where_clause {
            fn describe(
                schema: &mut ::quarry_core::Schema,
                instance: ::core::option::Option<&Self>,
            ) {
                #(#declarations)*
            }

            fn from_row(
                row: &::quarry_core::Row,
            ) -> ::quarry_core::Result<Self> {
                ::core::result::Result::Ok(Self {
                    #(#reads,)*
                })
            }
        }
    })
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    sql_type: Option<LitStr>,
    primary: bool,
    auto_increment: bool,
    foreign_key: Option<LitStr>,
    nullable: bool,
    unique: bool,
    default_expr: Option<String>,
}

#[derive(Clone, Copy)]
enum AutoIncrement {
    Int,
    BigInt,
}

struct ColumnInfo {
    field_name: Ident,
    field_type: Type,
    column_name: String,
    sql_type: Option<TokenStream2>,
    primary: bool,
    auto_increment: Option<AutoIncrement>,
    foreign_key: Option<String>,
    nullable: bool,
    unique: bool,
    default_expr: Option<String>,
}

impl ColumnInfo {
    fn new(field_name: Ident, field_type: Type, attrs: ColumnAttrs) -> syn::Result<Self> {
        if attrs.primary && attrs.auto_increment {
            return Err(syn::Error::new_spanned(
                &field_name,
                "auto_increment columns are already primary; remove `primary`",
            ));
        }
        let auto_increment = if attrs.auto_increment {
            if attrs.sql_type.is_some() {
                return Err(syn::Error::new_spanned(
                    &field_name,
                    "auto_increment columns choose their own type; remove `sql_type`",
                ));
            }
            Some(auto_increment_kind(&field_type).ok_or_else(|| {
                syn::Error::new_spanned(
                    &field_type,
                    "auto_increment is only supported on i64, i32, i16, u32 and u16 fields",
                )
            })?)
        } else {
            None
        };
        let foreign_key = match attrs.foreign_key {
            Some(lit) if lit.value().trim().is_empty() => {
                return Err(syn::Error::new_spanned(
                    lit,
                    "foreign_key needs a referenced table",
                ));
            }
            Some(lit) => Some(lit.value()),
            None => None,
        };
        let sql_type = attrs.sql_type.as_ref().map(sql_type_tokens).transpose()?;
        Ok(Self {
            column_name: attrs.name.unwrap_or_else(|| field_name.to_string()),
            field_name,
            field_type,
            sql_type,
            primary: attrs.primary,
            auto_increment,
            foreign_key,
            nullable: attrs.nullable,
            unique: attrs.unique,
            default_expr: attrs.default_expr,
        })
    }

    fn declaration(&self) -> TokenStream2 {
        let field = &self.field_name;
        let ty = &self.field_type;
        let name = &self.column_name;

        let declare = match (self.auto_increment, &self.sql_type) {
            (Some(AutoIncrement::BigInt), _) => quote! {
                let column = schema.auto_increment_big_int(#name);
            },
            (Some(AutoIncrement::Int), _) => quote! {
                let column = schema.auto_increment(#name);
            },
            (None, Some(sql_type)) => quote! {
                let column = schema.add_column(
                    ::quarry_core::ColumnDefinition::new(#name, #sql_type),
                );
                let column = if <#ty as ::quarry_core::FieldType>::NULLABLE {
                    column.nullable()
                } else {
                    column
                };
            },
            (None, None) => quote! {
                let column = <#ty as ::quarry_core::FieldType>::declare(schema, #name);
            },
        };

        let mut modifiers = Vec::new();
        if self.primary {
            modifiers.push(quote! { let column = column.primary(); });
        }
        if self.nullable {
            modifiers.push(quote! { let column = column.nullable(); });
        }
        if self.unique {
            modifiers.push(quote! { let column = column.unique(); });
        }
        if let Some(expr) = &self.default_expr {
            modifiers.push(quote! { let column = column.default_value(#expr); });
        }
        if let Some(table) = &self.foreign_key {
            modifiers.push(quote! { let column = column.foreign_key(#table); });
        }

        quote! {
            {
                #declare
                let column = match instance {
                    ::core::option::Option::Some(record) => column.try_value(
                        ::quarry_core::FieldType::to_sql(&record.#field),
                    ),
                    ::core::option::Option::None => column,
                };
                #(#modifiers)*
                let _ = column;
            }
        }
    }
}

/// Strips one `Option<...>` layer.
fn inner_type(ty: &Type) -> &Type {
    if let Type::Path(path) = ty {
        if let Some(segment) = path.path.segments.last() {
            if segment.ident == "Option" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return inner;
                    }
                }
            }
        }
    }
    ty
}

fn auto_increment_kind(ty: &Type) -> Option<AutoIncrement> {
    let Type::Path(path) = inner_type(ty) else {
        return None;
    };
    let ident = path.path.segments.last()?.ident.to_string();
    match ident.as_str() {
        "i64" => Some(AutoIncrement::BigInt),
        "i32" | "u32" | "i16" | "u16" => Some(AutoIncrement::Int),
        _ => None,
    }
}

/// Turns `"varchar(50)"` and friends into a `SqlType` expression.
fn sql_type_tokens(lit: &LitStr) -> syn::Result<TokenStream2> {
    let source = lit.value().trim().to_ascii_lowercase();
    let (name, args) = match source.split_once('(') {
        Some((name, rest)) => match rest.strip_suffix(')') {
            Some(args) => (name.trim().to_string(), Some(args.to_string())),
            None => return Err(syn::Error::new_spanned(lit, "unbalanced parentheses")),
        },
        None => (source.clone(), None),
    };
    let numbers = match args {
        Some(args) => args
            .split(',')
            .map(|n| n.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| syn::Error::new_spanned(lit, format!("bad type argument: {e}")))?,
        None => Vec::new(),
    };
    let tokens = match (name.as_str(), numbers.as_slice()) {
        ("varchar" | "string", []) => quote! { ::quarry_core::SqlType::Varchar(255) },
        ("varchar" | "string", [len]) => quote! { ::quarry_core::SqlType::Varchar(#len) },
        ("text", []) => quote! { ::quarry_core::SqlType::Text },
        ("longtext", []) => quote! { ::quarry_core::SqlType::LongText },
        ("int" | "integer", []) => quote! { ::quarry_core::SqlType::Integer },
        ("bigint" | "long", []) => quote! { ::quarry_core::SqlType::BigInt },
        ("decimal", []) => quote! { ::quarry_core::SqlType::Decimal(65, 30) },
        ("decimal", [precision, scale]) if *precision <= 255 && *scale <= 255 => {
            let precision = u8::try_from(*precision).unwrap_or(u8::MAX);
            let scale = u8::try_from(*scale).unwrap_or(u8::MAX);
            quote! { ::quarry_core::SqlType::Decimal(#precision, #scale) }
        }
        ("boolean" | "bool", []) => quote! { ::quarry_core::SqlType::Boolean },
        ("json", []) => quote! { ::quarry_core::SqlType::Json },
        ("blob", []) => quote! { ::quarry_core::SqlType::Blob },
        ("timestamp", []) => quote! { ::quarry_core::SqlType::Timestamp },
        ("date", []) => quote! { ::quarry_core::SqlType::Date },
        ("uuid", []) => quote! { ::quarry_core::SqlType::Varchar(36) },
        _ => {
            return Err(syn::Error::new_spanned(
                lit,
                format!("unknown SQL type `{}`", lit.value()),
            ));
        }
    };
    Ok(tokens)
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("column") || matches!(attr.meta, Meta::Path(_)) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("primary") || meta.path.is_ident("primary_key") {
                result.primary = true;
            } else if meta.path.is_ident("auto_increment") || meta.path.is_ident("autoincrement") {
                result.auto_increment = true;
            } else if meta.path.is_ident("nullable") {
                result.nullable = true;
            } else if meta.path.is_ident("unique") {
                result.unique = true;
            } else if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                result.name = Some(value.value());
            } else if meta.path.is_ident("default") {
                let value: LitStr = meta.value()?.parse()?;
                result.default_expr = Some(value.value());
            } else if meta.path.is_ident("sql_type") {
                result.sql_type = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("foreign_key") {
                result.foreign_key = Some(meta.value()?.parse()?);
            } else {
                return Err(meta.error("unknown column attribute"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}
