//! Handler trait and type erasure.
//!
//! # Storage
//!
//! Every handler has its own type, yet the router keeps them in one table.
//! Each is boxed behind `dyn ErasedHandler` on registration:
//!
//! ```text
//! async fn hello(req: Request) -> Negotiable { … }    ← user writes this
//!        ↓ router.on(Method::GET, "/", hello)
//! hello.into_boxed_handler()                         ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(hello))                         ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req)  at request time                 ← one vtable dispatch
//!        ↓
//! Box::pin(async { hello(req).await.into_result() }) ← BoxFuture
//! ```
//!
//! Per request that is one `Arc` clone and one virtual call.

use std::any::type_name;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Error;
use crate::request::Request;
use crate::response::{IntoReply, Reply};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future.
///
/// `Send` lets tokio move the future across worker threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The future every handler, middleware and endpoint resolves to.
pub type ReplyFuture<'a> = BoxFuture<'a, Result<Reply, Error>>;

/// Object-safe face of a handler, called by the router.
///
/// Public only because [`Handler::into_boxed_handler`] names it.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> ReplyFuture<'static>;
}

/// A type-erased handler, cloned out of the routing table per request.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Handler output ────────────────────────────────────────────────────────────

/// What a handler function may return: anything [`IntoReply`], or a
/// `Result` of one whose error is a crate [`Error`].
pub trait HandlerOutput {
    fn into_result(self) -> Result<Reply, Error>;
}

impl<T: IntoReply> HandlerOutput for T {
    fn into_result(self) -> Result<Reply, Error> {
        Ok(self.into_reply())
    }
}

impl<T: IntoReply> HandlerOutput for Result<T, Error> {
    fn into_result(self) -> Result<Reply, Error> {
        self.map(IntoReply::into_reply)
    }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// A route handler.
///
/// Sealed: the blanket impl covers every `async fn` (or closure returning a
/// future) shaped like
///
/// ```text
/// async fn name(req: Request) -> impl HandlerOutput
/// ```
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;

    /// The handler's function name, used as its default route name.
    /// Closures have none.
    #[doc(hidden)]
    fn default_name(&self) -> Option<&'static str>;
}

mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: HandlerOutput + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: HandlerOutput + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }

    fn default_name(&self) -> Option<&'static str> {
        fn_name(type_name::<F>())
    }
}

/// `my_app::views::list_articles` → `list_articles`.
fn fn_name(full: &'static str) -> Option<&'static str> {
    if full.contains("{{closure}}") {
        return None;
    }
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().filter(|name| !name.is_empty())
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Newtype bridging a concrete handler `F` to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: HandlerOutput + Send + 'static,
{
    fn call(&self, req: Request) -> ReplyFuture<'static> {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_result() })
    }
}
