//! Path normalization: redirect near-miss URLs to the route that exists.
//!
//! - `/articles` → `/articles/` when only the slashed route exists
//! - `/articles//` → `/articles/`
//!
//! Only requests that would otherwise be `404 Not Found` are considered, and
//! only when the rewritten path resolves in the router. The redirect is a
//! `301 Moved Permanently` that keeps the query string.
//!
//! The redirect is decided on the error coming back from the inner chain, so
//! inner middleware still sees the unnormalized request first. With
//! negotiation configured as `force_negotiation(false)`, a request whose
//! `Accept` matches no renderer is answered `406` before routing ever reports
//! the `404` this middleware reacts to.

use http::Method;
use tracing::debug;

use super::{Middleware, Next};
use crate::config::PathNormSettings;
use crate::error::Error;
use crate::handler::ReplyFuture;
use crate::request::Request;
use crate::response::{IntoReply, Response};
use crate::router::Router;

/// Path normalization middleware.
#[derive(Clone, Copy, Debug)]
pub struct NormalizePath {
    append_slash: bool,
    merge_slashes: bool,
}

impl NormalizePath {
    /// Both normalizations enabled.
    pub fn new() -> Self {
        Self { append_slash: true, merge_slashes: true }
    }

    pub fn from_settings(settings: &PathNormSettings) -> Self {
        Self { append_slash: settings.append_slash, merge_slashes: settings.merge_slashes }
    }

    pub fn append_slash(mut self, enabled: bool) -> Self {
        self.append_slash = enabled;
        self
    }

    pub fn merge_slashes(mut self, enabled: bool) -> Self {
        self.merge_slashes = enabled;
        self
    }

    /// The path to redirect to, if any.
    pub fn normalized(&self, router: &Router, method: &Method, path: &str) -> Option<String> {
        let merged = if self.merge_slashes { merge_slashes(path) } else { path.to_owned() };

        let mut candidates = vec![merged.clone()];
        if self.append_slash && !merged.ends_with('/') {
            candidates.push(format!("{merged}/"));
        }

        candidates
            .into_iter()
            .find(|candidate| candidate != path && router.resolves(method, candidate))
    }
}

impl Default for NormalizePath {
    fn default() -> Self { Self::new() }
}

impl Middleware for NormalizePath {
    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> ReplyFuture<'a> {
        Box::pin(async move {
            let method = req.method().clone();
            let path = req.path().to_owned();
            let query = req.query().map(str::to_owned);

            match next.run(req).await {
                Err(Error::NotFound) if !has_body_semantics(&method) => {
                    let Some(mut location) = self.normalized(next.router(), &method, &path) else {
                        return Err(Error::NotFound);
                    };
                    if let Some(query) = query {
                        location.push('?');
                        location.push_str(&query);
                    }
                    debug!(from = %path, to = %location, "redirecting to normalized path");
                    Ok(Response::redirect(&location).into_reply())
                }
                other => other,
            }
        })
    }
}

/// Redirecting these would make clients drop the request body.
fn has_body_semantics(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn merge_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}
