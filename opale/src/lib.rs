//! ### Opale, per-request http context helpers
//! Opale wraps one inbound http request and one outbound response into a
//! [`Context`](context::Context), giving handler code typed response writers
//! (plain text, json, xml), a content-type driven body decoder able to
//! populate any record type from json, xml or multipart form-data (uploaded
//! files included), and cookie read/write/expiry helpers.
//!
//! Routing, middleware and the server lifecycle are deliberately left to the
//! surrounding framework; its only obligation is to call
//! [`handler::serve`] (or build a [`Context`](context::Context) itself) once
//! per request.
//!
//! ```ignore
//! use opale::prelude::*;
//!
//! #[derive(Default, Deserialize, FromForm)]
//! struct Signup {
//!     #[form("user")]
//!     user: String,
//!     #[form("age")]
//!     age: i64,
//!     #[form("avatar")]
//!     avatar: Vec<UploadedFile>,
//! }
//!
//! async fn signup(mut ctx: Context) -> Context {
//!     let mut signup = Signup::default();
//!     match ctx.parse_body(&mut signup).await {
//!         Ok(()) => {
//!             let _ = ctx.json(&serde_json::json!({ "user": signup.user }));
//!         }
//!         Err(_) => ctx.status(400),
//!     }
//!     ctx
//! }
//! ```

#[macro_use]
extern crate log;

/// Buffered request/response bodies and the typed json/xml body wrappers
pub mod body;
/// Context enveloping every request <-> response
pub mod context;
/// Cookie types and the removal cookie helper
pub mod cookie;
/// Error definitions
pub mod error;
/// Schema-driven population of records from parsed multipart forms
pub mod form;
/// Definition of types which can handle an http request
pub mod handler;
/// Multipart form-data parsing
pub mod multipart;
/// The Http Request type
pub mod request;
/// The Http Response type
pub mod response;

///
pub use http;
///
pub use hyper;

#[cfg(feature = "macro")]
pub use opale_macro::FromForm;

/// Contains everything you need to handle requests through a context
pub mod prelude {
    ///
    pub use crate::body::Body;
    ///
    pub use crate::body::Bytes;
    ///
    pub use crate::body::Json;
    ///
    pub use crate::body::Xml;
    ///
    pub use crate::context::Context;
    ///
    pub use crate::cookie::Cookie;
    ///
    pub use crate::cookie::CookieBuilder;
    ///
    pub use crate::cookie::CookieJar;
    ///
    pub use crate::error::OpaleError;
    ///
    pub use crate::form::FromForm;
    ///
    pub use crate::form::FromFormField;
    ///
    pub use crate::form::NumericPolicy;
    ///
    pub use crate::handler::Handler;
    ///
    pub use crate::multipart::FormData;
    ///
    pub use crate::multipart::UploadedFile;
    ///
    pub use crate::request::Request;
    ///
    pub use crate::response::Builder;
    ///
    pub use crate::response::Response;
    ///
    #[cfg(feature = "macro")]
    pub use opale_macro::FromForm;
    ///
    pub use http::header;
    ///
    pub use http::Extensions;
    ///
    pub use http::Method;
    ///
    pub use http::StatusCode;
    ///
    pub use http::Uri;
    ///
    pub use http::Version;
}
