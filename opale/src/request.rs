use std::{
    net::SocketAddr,
    ops::{Deref, DerefMut},
};

use cookie::{Cookie, CookieJar};
use futures_util::future::Future;
use http::Request as RawRequest;
use hyper::body::Bytes;

use crate::{
    body::{Body, FromBytes},
    error::OpaleError,
};

/// Struct that wraps an http request + the per-request cookie jar
pub struct Request<T = Body<Bytes>> {
    #[doc(hidden)]
    inner: RawRequest<T>,
    #[doc(hidden)]
    cookies: CookieJar,
    #[doc(hidden)]
    peer_addr: Option<SocketAddr>,
}

impl<T> Request<T> {
    #[doc(hidden)]
    pub fn new(raw: RawRequest<T>, peer_addr: Option<SocketAddr>) -> Self {
        Request {
            inner: raw,
            cookies: Default::default(),
            peer_addr,
        }
    }

    /// Return the peer SocketAddr if one was available when receiving the
    /// request
    #[inline]
    pub fn peer_addr(&self) -> Option<&SocketAddr> {
        self.peer_addr.as_ref()
    }

    ///
    #[inline]
    pub fn peer_addr_mut(&mut self) -> Option<&mut SocketAddr> {
        self.peer_addr.as_mut()
    }

    /// Get the cookies sent by the browser.
    ///
    /// Before accessing cookies, you will need to parse them, it is done with
    /// the [`parse_cookies`](#method.parse_cookies) method
    ///
    /// ```rust
    ///# use opale::prelude::*;
    ///# use opale::http::Request as RawRequest;
    ///# let mut req = Request::new(RawRequest::builder().method("GET").uri("https://www.rust-lang.org/").body(()).unwrap(), None);
    /// // Parse cookies
    /// req.parse_cookies();
    /// // then use cookies
    /// let cookie = req.cookies().get("MyCookie");
    /// ```
    #[inline]
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Get the cookies sent by the browser in a mutable way
    #[inline]
    pub fn cookies_mut(&mut self) -> &mut CookieJar {
        &mut self.cookies
    }

    /// Convert a request of T in a request of U
    ///
    /// ```rust
    ///# use opale::prelude::*;
    ///# use opale::http::Request as RawRequest;
    ///# let mut req = Request::new(RawRequest::builder().method("GET").uri("https://www.rust-lang.org/").body(()).unwrap(), None);
    /// // req is Request<()>
    /// let req: Request<String> = req.map(|_ignored_body| "New body".to_string());
    /// ```
    #[inline]
    pub fn map<F, U>(self, f: F) -> Request<U>
    where
        F: FnOnce(T) -> U,
    {
        let Request { inner, cookies, peer_addr } = self;
        Request {
            inner: inner.map(f),
            cookies,
            peer_addr,
        }
    }

    /// Convert a request of T in a request of U through a future
    #[inline]
    pub async fn async_map<F, Fut, U>(self, f: F) -> Request<U>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = U>,
    {
        let Request { inner, cookies, peer_addr } = self;
        let (head, body) = inner.into_parts();
        let mapped = f(body).await;
        let mapped_r = RawRequest::from_parts(head, mapped);

        Request {
            inner: mapped_r,
            cookies,
            peer_addr,
        }
    }

    /// Parse cookies from the Cookie header
    pub fn parse_cookies(&mut self) {
        let jar = &mut self.cookies;
        if let Some(cookie_iter) = self
            .inner
            .headers()
            .get("Cookie")
            .and_then(|cookies| cookies.to_str().ok())
            .map(|cookies_str| cookies_str.split("; "))
            .map(|cookie_iter| cookie_iter.filter_map(|cookie_s| Cookie::parse(cookie_s.to_string()).ok()))
        {
            cookie_iter.for_each(|c| jar.add_original(c));
        }
    }
}

impl<T: FromBytes + Unpin + 'static> Request<Body<T>> {
    /// Load the body to memory, converting a `Request<Body<T>>` into a
    /// `Request<T>`
    ///
    /// ```rust
    ///# use opale::prelude::*;
    ///# use opale::http::Request as RawRequest;
    ///# async {
    ///# let mut req = Request::new(RawRequest::builder().method("GET").uri("https://www.rust-lang.org/").body(Body::empty()).unwrap(), None);
    /// // req is Request<Body<Bytes>>
    /// let req = req.load_body().await.unwrap();
    /// // req is now Request<Bytes>
    ///# };
    /// ```
    #[inline]
    pub async fn load_body(self) -> Result<Request<T::Out>, OpaleError> {
        let Request { inner, cookies, peer_addr } = self;
        let (head, body) = inner.into_parts();

        let t = body.await?;

        let mapped_r = RawRequest::from_parts(head, t);

        Ok(Request {
            inner: mapped_r,
            cookies,
            peer_addr,
        })
    }
}

impl<T, E> Request<Result<T, E>> {
    /// Convert a request of Result<T, E> in a Result<Request<T>, E>
    ///
    /// ```rust
    ///# use opale::prelude::*;
    ///# use opale::http::Request as RawRequest;
    ///# let r: Result<String, String> = Ok("Body".to_string());
    ///# let mut req = Request::new(RawRequest::builder().method("GET").uri("https://www.rust-lang.org/").body(r).unwrap(), None);
    /// // req is Request<Result<String, String>>
    /// let res = req.transpose();
    /// assert!(res.is_ok());
    /// ```
    pub fn transpose(self) -> Result<Request<T>, E> {
        let Request { inner, cookies, peer_addr } = self;
        let (head, body) = inner.into_parts();

        body.map(move |b| Request {
            inner: RawRequest::from_parts(head, b),
            cookies,
            peer_addr,
        })
    }
}

impl<T> Request<Option<T>> {
    /// Convert a request of Option<T> in an Option<Request<T>>
    ///
    /// ```rust
    ///# use opale::prelude::*;
    ///# use opale::http::Request as RawRequest;
    ///# let mut req = Request::new(RawRequest::builder().method("GET").uri("https://www.rust-lang.org/").body(Some("Body".to_string())).unwrap(), None);
    /// // req is Request<Option<String>>
    /// let opt = req.transpose();
    /// assert!(opt.is_some());
    /// ```
    pub fn transpose(self) -> Option<Request<T>> {
        let Request { inner, cookies, peer_addr } = self;
        let (head, body) = inner.into_parts();

        body.map(move |b| Request {
            inner: RawRequest::from_parts(head, b),
            cookies,
            peer_addr,
        })
    }
}

mod json {
    use serde::Deserialize;

    use crate::body::Json;

    use super::*;

    impl Request<Body<Bytes>> {
        /// Loads the request body and deserializes it as json
        pub async fn json<T>(&mut self) -> Result<T, OpaleError>
        where
            T: for<'a> Deserialize<'a> + Unpin + 'static,
        {
            self.body_mut().take_as::<Json<T>>().await
        }
    }
}

mod xml {
    use serde::Deserialize;

    use crate::body::Xml;

    use super::*;

    impl Request<Body<Bytes>> {
        /// Loads the request body and deserializes it as xml
        pub async fn xml<T>(&mut self) -> Result<T, OpaleError>
        where
            T: for<'a> Deserialize<'a> + Unpin + 'static,
        {
            self.body_mut().take_as::<Xml<T>>().await
        }
    }
}

impl<T> Deref for Request<T> {
    type Target = RawRequest<T>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> DerefMut for Request<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
