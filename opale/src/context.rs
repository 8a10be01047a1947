use std::net::SocketAddr;

use http::{header, Request as RawRequest, StatusCode};
use hyper::Body as RawBody;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    body::{Body, Bytes},
    cookie::{self, Cookie},
    error::OpaleError,
    form::{FromForm, NumericPolicy},
    multipart::FormData,
    request::Request,
    response::{Builder, Response},
};

/// Per-request bundle of the inbound request and the outbound response
/// builder.
///
/// One instance exclusively owns both ends for exactly one request/response
/// cycle; it is never shared across requests and holds no state beyond that
/// cycle, so no synchronization happens here.
///
/// ```rust
/// # use opale::prelude::*;
/// let req = opale::http::Request::builder()
///     .method("GET")
///     .uri("http://localhost/greet")
///     .body(opale::hyper::Body::empty())
///     .unwrap();
///
/// let mut ctx = Context::new(req, None);
/// ctx.string("hello");
/// let response = ctx.into_response().unwrap();
/// ```
pub struct Context {
    request: Request<Body<Bytes>>,
    response: Builder,
    numeric_policy: NumericPolicy,
}

impl Context {
    /// Wraps one inbound request, parsing its cookies along the way
    pub fn new(raw: RawRequest<RawBody>, peer_addr: Option<SocketAddr>) -> Self {
        let mut request = Request::new(raw.map(Body::from_raw), peer_addr);
        request.parse_cookies();

        Context {
            request,
            response: Builder::new(),
            numeric_policy: NumericPolicy::default(),
        }
    }

    /// The inbound request
    #[inline]
    pub fn request(&self) -> &Request<Body<Bytes>> {
        &self.request
    }

    /// The inbound request in a mutable way
    #[inline]
    pub fn request_mut(&mut self) -> &mut Request<Body<Bytes>> {
        &mut self.request
    }

    /// The response builder composed so far
    #[inline]
    pub fn response(&self) -> &Builder {
        &self.response
    }

    ///
    #[inline]
    pub fn response_mut(&mut self) -> &mut Builder {
        &mut self.response
    }

    /// How malformed numeric form values behave during
    /// [`parse_body`](Context::parse_body); defaults to
    /// [`NumericPolicy::ZeroFill`]
    pub fn set_numeric_policy(&mut self, policy: NumericPolicy) {
        self.numeric_policy = policy;
    }

    ///
    pub fn numeric_policy(&self) -> NumericPolicy {
        self.numeric_policy
    }

    /// Writes `body` as the response, with a `text/plain` content type
    pub fn string<B: Into<String>>(&mut self, body: B) {
        self.response = std::mem::take(&mut self.response)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(body.into());
    }

    /// Serializes `value` as the json response body, with an
    /// `application/json` content type. Values the codec cannot represent
    /// fail the call; the error is the caller's to handle.
    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<(), OpaleError> {
        let builder = std::mem::take(&mut self.response).header(header::CONTENT_TYPE, "application/json");
        match builder.json(value) {
            Ok(builder) => {
                self.response = builder;
                Ok(())
            }
            Err((builder, e)) => {
                self.response = builder;
                Err(e)
            }
        }
    }

    /// Serializes `value` as the xml response body, with an
    /// `application/xml` content type
    pub fn xml<T: Serialize>(&mut self, value: &T) -> Result<(), OpaleError> {
        let builder = std::mem::take(&mut self.response).header(header::CONTENT_TYPE, "application/xml");
        match builder.xml(value) {
            Ok(builder) => {
                self.response = builder;
                Ok(())
            }
            Err((builder, e)) => {
                self.response = builder;
                Err(e)
            }
        }
    }

    /// Forwards an http status onto the response builder
    pub fn status<S>(&mut self, status: S)
    where
        StatusCode: TryFrom<S>,
        <StatusCode as TryFrom<S>>::Error: Into<http::Error>,
    {
        self.response = std::mem::take(&mut self.response).status(status);
    }

    /// Decodes the request body into `dest`, choosing the wire format from
    /// the declared `Content-Type` header.
    ///
    /// The header value's prefix is matched, case sensitive and in this
    /// precedence order: `application/json`, then `application/xml` or
    /// `text/xml`, then `multipart/form-data`. A header matching none of
    /// these fails with [`OpaleError::UnsupportedContentType`] before the
    /// body is read, leaving `dest` untouched.
    ///
    /// For json and xml, the whole body is buffered then deserialized into
    /// `dest` keyed by its serde names. For multipart, the parsed form
    /// populates every `#[form("name")]` tagged field of `dest` in
    /// declaration order: text fields get the first scalar value (empty
    /// string when absent), numeric fields are parsed per the context's
    /// [`NumericPolicy`], and `Vec<UploadedFile>` fields bind every file
    /// uploaded under their tag.
    ///
    /// On failure, `dest` may be partially populated and should be
    /// considered unusable.
    pub async fn parse_body<T>(&mut self, dest: &mut T) -> Result<(), OpaleError>
    where
        T: DeserializeOwned + FromForm,
    {
        let content_type = self
            .request
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .unwrap_or_default();

        if content_type.starts_with("application/json") {
            let bytes = self.request.body_mut().take().await?;
            *dest = serde_json::from_slice(bytes.as_ref())?;
        } else if content_type.starts_with("application/xml") || content_type.starts_with("text/xml") {
            let bytes = self.request.body_mut().take().await?;
            *dest = quick_xml::de::from_reader(bytes.as_ref())?;
        } else if content_type.starts_with("multipart/form-data") {
            let bytes = self.request.body_mut().take().await?;
            let form = FormData::parse(content_type.as_str(), bytes).await?;
            dest.populate(&form, self.numeric_policy)?;
        } else {
            return Err(OpaleError::UnsupportedContentType(content_type));
        }

        Ok(())
    }

    /// Adds a cookie to the response jar; it is written out as a
    /// `Set-Cookie` header when the response is finished
    pub fn set_cookie(&mut self, cookie: Cookie<'static>) {
        self.response = std::mem::take(&mut self.response).cookie(cookie);
    }

    /// Looks up an inbound cookie by name
    pub fn cookie(&self, name: &str) -> Result<&Cookie<'static>, OpaleError> {
        self.request
            .cookies()
            .get(name)
            .ok_or_else(|| OpaleError::CookieNotFound(name.to_owned()))
    }

    /// Looks up an inbound cookie by name, returning only its value
    pub fn cookie_value(&self, name: &str) -> Result<&str, OpaleError> {
        self.cookie(name).map(|cookie| cookie.value())
    }

    /// Expires client cookies by writing replacement cookies with an empty
    /// value, a negative max-age and an expiration in the past.
    ///
    /// An empty `names` slice expires every cookie present on the inbound
    /// request; otherwise exactly the named cookies that are present are
    /// expired, and absent names are silently skipped.
    pub fn clear_cookies(&mut self, names: &[&str]) {
        let targets: Vec<String> = if names.is_empty() {
            self.request.cookies().iter().map(|cookie| cookie.name().to_owned()).collect()
        } else {
            names
                .iter()
                .filter(|name| self.request.cookies().get(name).is_some())
                .map(|name| (*name).to_owned())
                .collect()
        };

        for name in targets {
            self.set_cookie(cookie::expired(name));
        }
    }

    /// The inbound request's scheme and host, concatenated as
    /// `scheme://host`. A literal reflection of what the transport
    /// populated; components it left empty stay empty.
    pub fn base_url(&self) -> String {
        let uri = self.request.uri();
        format!(
            "{}://{}",
            uri.scheme_str().unwrap_or_default(),
            uri.authority().map(|authority| authority.as_str()).unwrap_or_default()
        )
    }

    /// Finish the response, handing it back for the surrounding framework
    /// to write out
    pub fn into_response(self) -> Result<Response<Body<Bytes>>, OpaleError> {
        self.response.build()
    }
}
