// The `quote!` macro requires deep recursion.
#![recursion_limit = "256"]

extern crate proc_macro;

use proc_macro::TokenStream as TokenStream1;
use syn::{parse_macro_input, DeriveInput};

mod form;

/// Derives `opale::form::FromForm` for a struct with named fields.
///
/// Each field carrying a `#[form("name")]` attribute is assigned from the
/// parsed multipart entry of that name, in field declaration order. Fields
/// without the attribute are left untouched by the decoder.
///
/// ```ignore
/// use opale::prelude::*;
///
/// #[derive(Default, FromForm)]
/// struct Signup {
///     #[form("user")]
///     user: String,
///     #[form("age")]
///     age: i64,
///     #[form("avatar")]
///     avatar: Vec<UploadedFile>,
/// }
/// ```
///
/// Deriving on anything but a struct with named fields is a compile error,
/// as is tagging a field whose type has no `FromFormField` implementation.
#[proc_macro_derive(FromForm, attributes(form))]
pub fn from_form(input: TokenStream1) -> TokenStream1 {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = form::expand_from_form(input).unwrap_or_else(|e| e.to_compile_error());

    TokenStream1::from(expanded)
}
