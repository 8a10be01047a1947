use std::{
    error::Error as StdError,
    io::{Error as IoError, ErrorKind},
};

use http::header::InvalidHeaderValue;
use thiserror::Error;

use crate::{form::FieldError, multipart::MultipartError};

/// Error type throughout the opale stack
///
/// Every failure surfaces synchronously to the immediate caller as one of
/// these variants; nothing is retried and the decode paths log nothing. How
/// a variant translates into an http status is the surrounding handler's
/// decision.
#[derive(Error, Debug)]
pub enum OpaleError {
    /// Transport failure: the request body could not be fully read, or the
    /// response channel broke
    #[error("io error: {0}")]
    Io(#[from] IoError),
    /// Invalid header value or malformed response construction
    #[error("http error: {0}")]
    Http(#[from] http::Error),
    /// Error from (de)serializing json data
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Error from (de)serializing xml data
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::DeError),
    /// The request content type matched no known decoder prefix
    #[error("unsupported content type `{0}`")]
    UnsupportedContentType(String),
    /// The multipart body could not be parsed
    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),
    /// A form field failed its declared numeric conversion; only produced
    /// under [`NumericPolicy::Strict`](crate::form::NumericPolicy)
    #[error("form error: {0}")]
    FormField(#[from] FieldError),
    /// Cookie lookup miss
    #[error("cookie `{0}` not found")]
    CookieNotFound(String),
    /// Body was taken and cannot be polled again
    #[error("request body already taken")]
    BodyAlreadyTaken,
    /// Custom error type to map any other error
    #[error("{0}")]
    Custom(Box<dyn StdError + Send + Sync + 'static>),
}

impl From<hyper::Error> for OpaleError {
    fn from(e: hyper::Error) -> Self {
        OpaleError::Io(IoError::new(ErrorKind::Other, e))
    }
}

impl From<InvalidHeaderValue> for OpaleError {
    fn from(e: InvalidHeaderValue) -> Self {
        OpaleError::Http(http::Error::from(e))
    }
}
