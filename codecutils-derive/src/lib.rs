use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, parse_quote, DeriveInput};

/// Derive macro for the `ToNode` trait.
///
/// Structs with named fields become mappings keyed by field name, in
/// declaration order. Tuple structs become sequences and unit structs become
/// null. For enums, a unit variant becomes its name as a string and a variant
/// with data becomes a single-key mapping from the variant name to its
/// payload.
///
/// # Example
///
/// ```ignore
/// use codecutils_core::ToNode;
///
/// #[derive(ToNode)]
/// struct Sample {
///     name: String,
///     #[node(rename = "values")]
///     data: Vec<f32>,
///     #[node(skip)]
///     scratch: Vec<u8>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[node(skip)]` - Leave this field out of the node
/// - `#[node(rename = "name")]` - Use a custom key for a field or variant
///
/// Any other key inside `#[node(...)]` is a compile error.
#[proc_macro_derive(ToNode, attributes(node))]
pub fn derive_to_node(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_to_node_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_to_node_impl(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let generics = add_trait_bounds(&input.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let body = match &input.data {
        syn::Data::Struct(data) => generate_struct_body(&data.fields)?,
        syn::Data::Enum(data) => generate_enum_body(data)?,
        syn::Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "ToNode cannot be derived for unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::codecutils_core::ToNode for #name #ty_generics #where_clause {
            fn to_node(&self) -> ::codecutils_core::Node {
                #body
            }
        }
    })
}

/// Adds a `ToNode` bound for every type parameter to the where clause.
fn add_trait_bounds(generics: &syn::Generics) -> syn::Generics {
    let mut generics = generics.clone();
    let type_params: Vec<_> = generics.type_params().map(|p| p.ident.clone()).collect();

    if type_params.is_empty() {
        return generics;
    }

    let where_clause = generics.make_where_clause();
    for param in type_params {
        where_clause
            .predicates
            .push(parse_quote! { #param: ::codecutils_core::ToNode });
    }
    generics
}

/// Key under which a field or variant is stored.
fn node_key(ident: &syn::Ident, attrs: &FieldAttrs) -> String {
    attrs.rename.clone().unwrap_or_else(|| ident.to_string())
}

/// Builds a mapping from `(key, value expression)` pairs.
fn mapping_of(entries: Vec<(String, proc_macro2::TokenStream)>) -> proc_macro2::TokenStream {
    let inserts = entries.iter().map(|(key, value)| {
        quote! {
            entries.insert(
                ::std::string::String::from(#key),
                ::codecutils_core::ToNode::to_node(#value),
            );
        }
    });
    quote! {{
        #[allow(unused_mut)]
        let mut entries = ::codecutils_core::Mapping::new();
        #(#inserts)*
        ::codecutils_core::Node::from_mapping(entries)
    }}
}

fn sequence_of(values: Vec<proc_macro2::TokenStream>) -> proc_macro2::TokenStream {
    quote! {
        ::codecutils_core::Node::sequence(::std::vec![
            #(::codecutils_core::ToNode::to_node(#values)),*
        ])
    }
}

fn generate_struct_body(fields: &syn::Fields) -> syn::Result<proc_macro2::TokenStream> {
    match fields {
        syn::Fields::Named(named) => {
            let mut entries = Vec::new();
            for f in &named.named {
                let attrs = parse_field_attrs(&f.attrs)?;
                if attrs.skip {
                    continue;
                }
                if let Some(ident) = &f.ident {
                    entries.push((node_key(ident, &attrs), quote! { &self.#ident }));
                }
            }
            Ok(mapping_of(entries))
        }
        syn::Fields::Unnamed(unnamed) => {
            let mut values = Vec::new();
            for (i, f) in unnamed.unnamed.iter().enumerate() {
                if parse_field_attrs(&f.attrs)?.skip {
                    continue;
                }
                let idx = syn::Index::from(i);
                values.push(quote! { &self.#idx });
            }
            Ok(sequence_of(values))
        }
        syn::Fields::Unit => Ok(quote! { ::codecutils_core::Node::Null }),
    }
}

fn generate_variant_arm(variant: &syn::Variant) -> syn::Result<proc_macro2::TokenStream> {
    let variant_ident = &variant.ident;
    let key = node_key(variant_ident, &parse_field_attrs(&variant.attrs)?);

    let arm = match &variant.fields {
        syn::Fields::Unit => {
            quote! {
                Self::#variant_ident => ::codecutils_core::Node::from(#key)
            }
        }
        syn::Fields::Named(fields) => {
            let mut bindings = Vec::new();
            let mut entries = Vec::new();
            for f in &fields.named {
                let attrs = parse_field_attrs(&f.attrs)?;
                if attrs.skip {
                    continue;
                }
                if let Some(ident) = &f.ident {
                    entries.push((node_key(ident, &attrs), quote! { #ident }));
                    bindings.push(ident);
                }
            }
            let payload = mapping_of(entries);
            quote! {
                Self::#variant_ident { #(#bindings,)* .. } => {
                    ::codecutils_core::Node::mapping([(#key, #payload)])
                }
            }
        }
        syn::Fields::Unnamed(fields) => {
            let mut bindings = Vec::new();
            let mut values = Vec::new();
            for (i, f) in fields.unnamed.iter().enumerate() {
                if parse_field_attrs(&f.attrs)?.skip {
                    bindings.push(quote! { _ });
                } else {
                    let binding = format_ident!("f{}", i);
                    bindings.push(quote! { #binding });
                    values.push(quote! { #binding });
                }
            }
            let payload = if values.len() == 1 {
                let value = &values[0];
                quote! { ::codecutils_core::ToNode::to_node(#value) }
            } else {
                sequence_of(values)
            };
            quote! {
                Self::#variant_ident(#(#bindings),*) => {
                    ::codecutils_core::Node::mapping([(#key, #payload)])
                }
            }
        }
    };
    Ok(arm)
}

fn generate_enum_body(data: &syn::DataEnum) -> syn::Result<proc_macro2::TokenStream> {
    let arms = data
        .variants
        .iter()
        .map(generate_variant_arm)
        .collect::<syn::Result<Vec<_>>>()?;

    if arms.is_empty() {
        return Ok(quote! { match *self {} });
    }

    Ok(quote! {
        match self {
            #(#arms),*
        }
    })
}

#[derive(Default)]
struct FieldAttrs {
    skip: bool,
    rename: Option<String>,
}

fn parse_field_attrs(attrs: &[syn::Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("node") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                result.skip = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                let value: syn::LitStr = meta.value()?.parse()?;
                result.rename = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unknown node attribute, expected `skip` or `rename`"))
            }
        })?;
    }

    Ok(result)
}
