use std::error::Error as StdError;

use thiserror::Error;

use crate::multipart::{FormData, UploadedFile};

/// Behavior applied to numeric form values that fail to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericPolicy {
    /// A malformed numeric value becomes the type's zero value. Historical
    /// form decoding contract, and the default.
    #[default]
    ZeroFill,
    /// A malformed numeric value fails the decode with a [`FieldError`]
    /// naming the field
    Strict,
}

/// Conversion failure for a single form field, produced under
/// [`NumericPolicy::Strict`]
#[derive(Error, Debug)]
#[error("invalid value `{value}` for field `{field}`: {source}")]
pub struct FieldError {
    field: String,
    value: String,
    source: Box<dyn StdError + Send + Sync + 'static>,
}

impl FieldError {
    pub fn new<E>(field: &str, value: &str, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        FieldError {
            field: field.to_owned(),
            value: value.to_owned(),
            source: Box::new(source),
        }
    }

    /// Name of the form field that failed conversion
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The raw form value that could not be converted
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A record whose fields can be populated from a parsed multipart form.
///
/// Implement through `#[derive(FromForm)]`: every field carrying a
/// `#[form("name")]` attribute is assigned from the form entry of that name,
/// in field declaration order. Fields without the attribute are left
/// untouched.
pub trait FromForm {
    fn populate(&mut self, form: &FormData, policy: NumericPolicy) -> Result<(), FieldError>;
}

/// A single field value convertible from a parsed multipart form entry
pub trait FromFormField: Sized {
    fn from_form_field(name: &str, form: &FormData, policy: NumericPolicy) -> Result<Self, FieldError>;
}

impl FromFormField for String {
    fn from_form_field(name: &str, form: &FormData, _policy: NumericPolicy) -> Result<Self, FieldError> {
        Ok(form.value(name).unwrap_or_default().to_owned())
    }
}

impl FromFormField for Vec<UploadedFile> {
    fn from_form_field(name: &str, form: &FormData, _policy: NumericPolicy) -> Result<Self, FieldError> {
        Ok(form.files(name).to_vec())
    }
}

macro_rules! impl_int_form_field {
    ( $( $x:ty ),+ ) => {
        $(
            impl FromFormField for $x {
                fn from_form_field(name: &str, form: &FormData, policy: NumericPolicy) -> Result<Self, FieldError> {
                    let raw = form.value(name).unwrap_or_default();
                    match raw.parse::<$x>() {
                        Ok(v) => Ok(v),
                        Err(_) if policy == NumericPolicy::ZeroFill => Ok(0),
                        Err(e) => Err(FieldError::new(name, raw, e)),
                    }
                }
            }
        )+
    }
}

macro_rules! impl_float_form_field {
    ( $( $x:ty ),+ ) => {
        $(
            impl FromFormField for $x {
                fn from_form_field(name: &str, form: &FormData, policy: NumericPolicy) -> Result<Self, FieldError> {
                    let raw = form.value(name).unwrap_or_default();
                    // parsed as a 64-bit float first, then narrowed to the declared kind
                    match raw.parse::<f64>() {
                        Ok(v) => Ok(v as $x),
                        Err(_) if policy == NumericPolicy::ZeroFill => Ok(0.0),
                        Err(e) => Err(FieldError::new(name, raw, e)),
                    }
                }
            }
        )+
    }
}

impl_int_form_field!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_float_form_field!(f32, f64);

#[cfg(test)]
mod t {
    use super::*;
    use hyper::body::Bytes;

    fn form_with(name: &str, value: &str) -> FormData {
        let mut form = FormData::default();
        form.push_value(name, value);
        form
    }

    mod strings {
        use super::*;

        #[test]
        fn first_value_assigned_verbatim() {
            let mut form = form_with("k", "first");
            form.push_value("k", "second");

            let v = String::from_form_field("k", &form, NumericPolicy::default()).unwrap();
            assert_eq!(v, "first");
        }

        #[test]
        fn absent_value_becomes_empty() {
            let form = FormData::default();

            let v = String::from_form_field("k", &form, NumericPolicy::default()).unwrap();
            assert_eq!(v, "");
        }
    }

    mod numbers {
        use super::*;

        #[test]
        fn base10_int_parses() {
            let form = form_with("k", "42");
            assert_eq!(i64::from_form_field("k", &form, NumericPolicy::default()).unwrap(), 42);
        }

        #[test]
        fn malformed_int_zero_fills() {
            let form = form_with("k", "abc");
            assert_eq!(i64::from_form_field("k", &form, NumericPolicy::ZeroFill).unwrap(), 0);
        }

        #[test]
        fn negative_value_zero_fills_unsigned_kinds() {
            let form = form_with("k", "-4");
            assert_eq!(u32::from_form_field("k", &form, NumericPolicy::ZeroFill).unwrap(), 0);
        }

        #[test]
        fn malformed_int_errors_when_strict() {
            let form = form_with("k", "abc");

            let e = i64::from_form_field("k", &form, NumericPolicy::Strict).unwrap_err();
            assert_eq!(e.field(), "k");
            assert_eq!(e.value(), "abc");
        }

        #[test]
        fn float_parses_exactly() {
            let form = form_with("k", "32.12");
            assert_eq!(f64::from_form_field("k", &form, NumericPolicy::default()).unwrap(), 32.12);
        }

        #[test]
        fn float_narrows_to_f32() {
            let form = form_with("k", "32.12");
            assert_eq!(f32::from_form_field("k", &form, NumericPolicy::default()).unwrap(), 32.12f64 as f32);
        }

        #[test]
        fn malformed_float_zero_fills() {
            let form = form_with("k", "12,5");
            assert_eq!(f64::from_form_field("k", &form, NumericPolicy::ZeroFill).unwrap(), 0.0);
        }
    }

    mod files {
        use super::*;

        #[test]
        fn binds_every_file_under_the_name() {
            let mut form = FormData::default();
            form.push_file(UploadedFile::new(
                "docs".to_owned(),
                Some("a.txt".to_owned()),
                mime::TEXT_PLAIN,
                Bytes::from_static(b"a"),
            ));
            form.push_file(UploadedFile::new(
                "docs".to_owned(),
                Some("b.txt".to_owned()),
                mime::TEXT_PLAIN,
                Bytes::from_static(b"b"),
            ));

            let files = Vec::<UploadedFile>::from_form_field("docs", &form, NumericPolicy::default()).unwrap();
            assert_eq!(files.len(), 2);
            assert_eq!(files[0].file_name(), Some("a.txt"));
            assert_eq!(files[1].file_name(), Some("b.txt"));
        }

        #[test]
        fn absent_name_binds_an_empty_list() {
            let form = FormData::default();

            let files = Vec::<UploadedFile>::from_form_field("docs", &form, NumericPolicy::default()).unwrap();
            assert!(files.is_empty());
        }
    }
}
