use std::pin::Pin;

use futures::{
    task::{Context, Poll},
    Future, StreamExt,
};
use hyper::body::{Body as RawBody, Buf};

use crate::error::OpaleError;

pub use hyper::body::Bytes;
pub use json::Json;
pub use xml::Xml;

pub(crate) enum BodyInner {
    Raw(RawBody),
    Memory(Bytes),
}

impl BodyInner {
    pub fn empty() -> Self {
        BodyInner::Raw(RawBody::empty())
    }

    #[inline]
    pub(crate) fn from_raw(raw: RawBody) -> Self {
        BodyInner::Raw(raw)
    }

    #[inline]
    pub(crate) fn into_raw(self) -> RawBody {
        match self {
            BodyInner::Raw(r) => r,
            BodyInner::Memory(b) => RawBody::from(b),
        }
    }

    pub async fn load(self) -> Result<Bytes, OpaleError> {
        match self {
            BodyInner::Raw(mut r) => {
                let first = match r.next().await.transpose().map_err(OpaleError::from)? {
                    Some(buf) => buf,
                    None => return Ok(Bytes::new()),
                };

                let second = match r.next().await.transpose().map_err(OpaleError::from)? {
                    Some(buf) => buf,
                    None => return Ok(first),
                };

                let mut vec = Vec::with_capacity(first.remaining() + second.remaining());
                vec.extend_from_slice(first.as_ref());
                vec.extend_from_slice(second.as_ref());

                while let Some(buf) = r.next().await.transpose().map_err(OpaleError::from)? {
                    vec.extend_from_slice(buf.as_ref());
                }

                Ok(vec.into())
            }
            BodyInner::Memory(b) => Ok(b),
        }
    }
}

/// A request or response body, buffered into memory the first time it is
/// awaited. Awaiting a `Body<T>` yields the body decoded as `T`.
pub struct Body<T = Bytes>
where
    T: FromBytes,
{
    inner: Option<BodyInner>,
    fut: Option<Pin<Box<dyn Future<Output = Result<(T::Out, Bytes), OpaleError>> + Send + Sync + 'static>>>,
}

impl Body<Bytes> {
    pub fn empty() -> Self {
        Body {
            inner: Some(BodyInner::empty()),
            fut: None,
        }
    }
}

impl<T: 'static> Body<T>
where
    T: FromBytes,
{
    #[inline]
    pub(crate) async fn generate(inner: BodyInner) -> Result<(T::Out, Bytes), OpaleError> {
        T::from_bytes(inner.load().await?)
    }

    #[inline]
    pub(crate) fn from_raw(raw: RawBody) -> Self {
        Body {
            inner: Some(BodyInner::from_raw(raw)),
            fut: None,
        }
    }

    #[inline]
    pub(crate) fn into_raw(self) -> RawBody {
        self.inner.unwrap_or_else(BodyInner::empty).into_raw()
    }

    /// Performing `take` will give you an owned version of the body, leaving
    /// an empty one behind
    #[inline]
    pub fn take(&mut self) -> Self {
        Body {
            inner: self.inner.take(),
            fut: None,
        }
    }

    /// Performing `take_as` will give you an owned version of the body as
    /// `U`, leaving an empty one behind
    #[inline]
    pub fn take_as<U: FromBytes>(&mut self) -> Body<U> {
        Body {
            inner: self.inner.take(),
            fut: None,
        }
    }
}

impl<T: FromBytes> Default for Body<T> {
    fn default() -> Self {
        Body { inner: None, fut: None }
    }
}

/// Decodes a buffered body into its output type, handing the buffer back so
/// the body can be awaited again
pub trait FromBytes {
    type Out;
    fn from_bytes(bytes: Bytes) -> Result<(Self::Out, Bytes), OpaleError>
    where
        Self: Sized;
}

impl<T: 'static + Unpin> Future for Body<T>
where
    T: FromBytes,
{
    type Output = Result<T::Out, OpaleError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(fut) = self.fut.as_mut() {
            match fut.as_mut().poll(cx) {
                Poll::Ready(res) => Poll::Ready(res.map(|(out, b)| {
                    self.inner = Some(BodyInner::Memory(b));
                    out
                })),
                Poll::Pending => Poll::Pending,
            }
        } else if let Some(body) = self.inner.take() {
            self.fut = Some(Box::pin(Self::generate(body)));

            match self
                .fut
                .as_mut()
                .expect("the future was assigned to Some(_) on the line above")
                .as_mut()
                .poll(cx)
            {
                Poll::Ready(res) => Poll::Ready(res.map(|(out, b)| {
                    self.inner = Some(BodyInner::Memory(b));
                    out
                })),
                Poll::Pending => Poll::Pending,
            }
        } else {
            Poll::Ready(Err(OpaleError::BodyAlreadyTaken))
        }
    }
}

impl FromBytes for Bytes {
    type Out = Bytes;

    #[inline]
    fn from_bytes(bytes: Bytes) -> Result<(Self::Out, Bytes), OpaleError>
    where
        Self: Sized,
    {
        Ok((bytes.clone(), bytes))
    }
}

impl FromBytes for String {
    type Out = String;

    #[inline]
    fn from_bytes(bytes: Bytes) -> Result<(Self::Out, Bytes), OpaleError>
    where
        Self: Sized,
    {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| OpaleError::Custom(Box::new(e)))
            .map(|s| (s, bytes))
    }
}

impl FromBytes for Vec<u8> {
    type Out = Vec<u8>;

    #[inline]
    fn from_bytes(bytes: Bytes) -> Result<(Self::Out, Bytes), OpaleError>
    where
        Self: Sized,
    {
        Ok((bytes.to_vec(), bytes))
    }
}

pub mod json {
    use hyper::body::Bytes;
    use serde::Deserialize;
    use std::ops::{Deref, DerefMut};

    use crate::{body::FromBytes, error::OpaleError};

    /// Typed wrapper decoding the body as json
    pub struct Json<T>(pub T);

    impl<T> Json<T> {
        pub fn into_inner(self) -> T {
            self.0
        }
    }

    impl<T> Deref for Json<T> {
        type Target = T;

        fn deref(&self) -> &Self::Target {
            &self.0
        }
    }

    impl<T> DerefMut for Json<T> {
        fn deref_mut(&mut self) -> &mut Self::Target {
            &mut self.0
        }
    }

    impl<T> FromBytes for Json<T>
    where
        T: for<'a> Deserialize<'a>,
    {
        type Out = T;

        #[inline]
        fn from_bytes(bytes: Bytes) -> Result<(Self::Out, Bytes), OpaleError>
        where
            Self: Sized,
        {
            Ok((serde_json::from_slice(bytes.as_ref())?, bytes))
        }
    }
}

pub mod xml {
    use hyper::body::Bytes;
    use serde::Deserialize;
    use std::ops::{Deref, DerefMut};

    use crate::{body::FromBytes, error::OpaleError};

    /// Typed wrapper decoding the body as xml
    pub struct Xml<T>(pub T);

    impl<T> Xml<T> {
        pub fn into_inner(self) -> T {
            self.0
        }
    }

    impl<T> Deref for Xml<T> {
        type Target = T;

        fn deref(&self) -> &Self::Target {
            &self.0
        }
    }

    impl<T> DerefMut for Xml<T> {
        fn deref_mut(&mut self) -> &mut Self::Target {
            &mut self.0
        }
    }

    impl<T> FromBytes for Xml<T>
    where
        T: for<'a> Deserialize<'a>,
    {
        type Out = T;

        #[inline]
        fn from_bytes(bytes: Bytes) -> Result<(Self::Out, Bytes), OpaleError>
        where
            Self: Sized,
        {
            Ok((quick_xml::de::from_reader(bytes.as_ref())?, bytes))
        }
    }
}

#[doc(hidden)]
pub trait TransmuteBody {
    fn transmute(&mut self) -> Body<Bytes>;
}

#[doc(hidden)]
impl<T> TransmuteBody for Option<T>
where
    T: Into<RawBody>,
{
    #[inline]
    fn transmute(&mut self) -> Body<Bytes> {
        Body::from_raw(match self.take() {
            Some(b) => b.into(),
            None => RawBody::empty(),
        })
    }
}

impl<T: FromBytes + 'static> From<Body<T>> for RawBody {
    #[inline]
    fn from(body: Body<T>) -> Self {
        body.into_raw()
    }
}

#[cfg(test)]
mod t {
    use super::*;

    #[tokio::test]
    async fn loads_a_chunked_raw_body() {
        let chunks: Vec<Result<Bytes, std::io::Error>> =
            vec![Ok(Bytes::from_static(b"hel")), Ok(Bytes::from_static(b"lo ")), Ok(Bytes::from_static(b"world"))];
        let mut body = Body::<Bytes>::from_raw(RawBody::wrap_stream(futures::stream::iter(chunks)));

        let bytes = body.take().await.expect("body loads");
        assert_eq!(bytes.as_ref(), b"hello world");
    }

    #[tokio::test]
    async fn take_leaves_an_empty_body_behind() {
        let mut body = Body::<Bytes>::from_raw(RawBody::from("abc"));

        let bytes = body.take().await.expect("body loads");
        assert_eq!(bytes.as_ref(), b"abc");

        assert!(matches!(body.take().await, Err(OpaleError::BodyAlreadyTaken)));
    }

    #[tokio::test]
    async fn decodes_as_json_through_take_as() {
        let mut body = Body::<Bytes>::from_raw(RawBody::from(r#"{"n":3}"#));

        let value = body.take_as::<Json<serde_json::Value>>().await.expect("valid json");
        assert_eq!(value["n"], 3);
    }
}
