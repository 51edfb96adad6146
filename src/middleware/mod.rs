//! Middleware layer.
//!
//! Middleware wraps the router endpoint and is the right place for
//! cross-cutting concerns: tracing, path normalization, content negotiation.
//!
//! A middleware receives the request and a [`Next`] handle to the rest of the
//! chain. It may answer on its own, or call [`Next::run`] and inspect or
//! rewrite the result on the way back out:
//!
//! ```text
//! request ─▶ trace ─▶ normalize_path ─▶ negotiation ─▶ router ─▶ handler
//! response ◀────────────────────────────────────────────────────────┘
//! ```
//!
//! Middleware registered first with [`App::wrap`](crate::App::wrap) is
//! outermost.
//!
//! Built-in middleware:
//! - [`trace`]: per-request log line with method, path, status, latency
//! - [`path_norm`]: trailing-slash and double-slash redirects
//! - [`negotiation`](crate::negotiation): Accept-driven rendering

pub mod path_norm;
pub mod trace;

use std::any::type_name;
use std::sync::Arc;

use crate::handler::ReplyFuture;
use crate::request::Request;
use crate::router::Router;

pub use path_norm::NormalizePath;
pub use trace::Trace;

/// A shareable, type-erased middleware.
pub type SharedMiddleware = Arc<dyn Middleware>;

/// A layer in the request pipeline.
pub trait Middleware: Send + Sync + 'static {
    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> ReplyFuture<'a>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        type_name::<Self>().rsplit("::").next().unwrap_or("middleware")
    }
}

/// The remainder of the pipeline after the current middleware.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    router: &'a Router,
    stack: &'a [SharedMiddleware],
}

impl<'a> Next<'a> {
    pub(crate) fn new(router: &'a Router, stack: &'a [SharedMiddleware]) -> Self {
        Self { router, stack }
    }

    /// Passes the request to the next middleware, or to the router when none
    /// are left.
    pub fn run(self, req: Request) -> ReplyFuture<'a> {
        match self.stack.split_first() {
            Some((middleware, rest)) => middleware.handle(req, Next::new(self.router, rest)),
            None => self.router.dispatch(req),
        }
    }

    /// The application router, read-only.
    pub fn router(&self) -> &'a Router {
        self.router
    }
}

// ── from_fn ───────────────────────────────────────────────────────────────────

/// Middleware built from a closure. See [`from_fn`].
pub struct FromFn<F>(F);

impl<F> Middleware for FromFn<F>
where
    F: for<'a> Fn(Request, Next<'a>) -> ReplyFuture<'a> + Send + Sync + 'static,
{
    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> ReplyFuture<'a> {
        (self.0)(req, next)
    }

    fn name(&self) -> &'static str {
        "from_fn"
    }
}

/// Turns a closure into middleware.
///
/// ```rust
/// use tsu_utils::middleware;
///
/// let stamp = middleware::from_fn(|req, next| {
///     Box::pin(async move {
///         let mut reply = next.run(req).await?;
///         if let tsu_utils::Reply::Finished(res) = &mut reply {
///             res.headers_mut().insert("x-served-by", http::HeaderValue::from_static("tsu"));
///         }
///         Ok::<_, tsu_utils::Error>(reply)
///     })
/// });
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: for<'a> Fn(Request, Next<'a>) -> ReplyFuture<'a> + Send + Sync + 'static,
{
    FromFn(f)
}
