use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Error, Fields, Lit, Meta, NestedMeta, Result};

pub fn expand_from_form(input: DeriveInput) -> Result<TokenStream> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => return Err(Error::new_spanned(&input.ident, "FromForm expects named fields")),
        },
        _ => return Err(Error::new_spanned(&input.ident, "FromForm can only be derived for structs")),
    };

    let mut setters = Vec::new();
    for field in fields {
        let tag = match form_tag(&field.attrs)? {
            Some(tag) => tag,
            None => continue,
        };

        let ident = field.ident.as_ref().expect("named fields always have an ident");
        setters.push(quote! {
            self.#ident = opale::form::FromFormField::from_form_field(#tag, form, policy)?;
        });
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics opale::form::FromForm for #ident #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn populate(
                &mut self,
                form: &opale::multipart::FormData,
                policy: opale::form::NumericPolicy,
            ) -> std::result::Result<(), opale::form::FieldError> {
                #(#setters)*
                Ok(())
            }
        }
    })
}

/// Reads the `#[form(..)]` attribute of one field. Accepted shapes are
/// `#[form("name")]` and `#[form(name = "name")]`; a field without the
/// attribute binds to no form entry.
fn form_tag(attrs: &[Attribute]) -> Result<Option<String>> {
    for attr in attrs {
        if !attr.path.is_ident("form") {
            continue;
        }

        if let Meta::List(list) = attr.parse_meta()? {
            for nested in list.nested {
                match nested {
                    NestedMeta::Lit(Lit::Str(tag)) => return Ok(Some(tag.value())),
                    NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("name") => {
                        if let Lit::Str(tag) = nv.lit {
                            return Ok(Some(tag.value()));
                        }
                    }
                    _ => {}
                }
            }
        }

        return Err(Error::new_spanned(attr, r#"expected #[form("name")]"#));
    }

    Ok(None)
}
