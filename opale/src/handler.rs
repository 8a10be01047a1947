use std::net::SocketAddr;

use futures::Future;
use http::{Request as RawRequest, Response as RawResponse};
use hyper::Body as RawBody;

use crate::{context::Context, error::OpaleError};

/// Define a type able to handle one http request through its [`Context`]
///
/// Implemented by default on any `Fn(Context) -> impl Future<Output = Context>`,
/// which lets plain async functions act as handlers.
pub trait Handler {
    /// Specific future returning the context once the handler composed its
    /// response
    type Future: Future<Output = Context> + Send;

    /// Handle the http request, returning the context carrying the composed
    /// response
    fn handle(&self, ctx: Context) -> Self::Future;
}

impl<Fun, Fut> Handler for Fun
where
    Fun: Fn(Context) -> Fut,
    Fut: 'static + Future<Output = Context> + Send,
{
    type Future = Fut;

    #[inline]
    fn handle(&self, ctx: Context) -> Self::Future {
        (*self)(ctx)
    }
}

/// Runs `handler` against one inbound request and finishes its response,
/// applying the response cookie jar as `Set-Cookie` headers.
///
/// This is the seam a surrounding server framework calls once per inbound
/// request; the context built here lives until the returned future resolves
/// and is never shared beyond it.
pub async fn serve<H>(handler: &H, req: RawRequest<RawBody>, peer_addr: Option<SocketAddr>) -> Result<RawResponse<RawBody>, OpaleError>
where
    H: Handler,
{
    trace!("{} {}", req.method(), req.uri());

    let ctx = handler.handle(Context::new(req, peer_addr)).await;
    let res = ctx.into_response()?.into_raw()?;

    Ok(res.map(Into::into))
}
