//! The application: a router plus its middleware stack.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{ALLOW, HeaderValue};
use http_body_util::Full;
use tracing::error;

use crate::error::Error;
use crate::handler::ReplyFuture;
use crate::middleware::{Middleware, Next, SharedMiddleware};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// A router wrapped in middleware, immutable once built.
///
/// Middleware added first is outermost: it sees the request first and the
/// result last.
pub struct App {
    router: Router,
    middleware: Vec<SharedMiddleware>,
}

impl App {
    pub fn new(router: Router) -> Self {
        Self { router, middleware: Vec::new() }
    }

    /// Adds `middleware` inside every middleware added before it.
    pub fn wrap(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn router(&self) -> &Router { &self.router }

    /// Names of the installed middleware, outermost first.
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    /// Runs `req` through the middleware stack and router.
    pub fn handle(&self, req: Request) -> ReplyFuture<'_> {
        Next::new(&self.router, &self.middleware).run(req)
    }

    /// Serves one request end to end, turning errors into their HTTP status.
    pub async fn call(&self, req: http::Request<Bytes>) -> http::Response<Full<Bytes>> {
        let method = req.method().clone();
        let path = req.uri().path().to_owned();

        let response = match self.handle(Request::from_http(req)).await {
            Ok(reply) => reply.into_response(),
            Err(err) => {
                if !err.is_client_error() {
                    error!(%method, %path, %err, "request failed");
                }
                error_response(&err)
            }
        };
        response.into_http()
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("middleware", &self.middleware_names())
            .finish_non_exhaustive()
    }
}

/// The framework's answer to an error that escaped the middleware stack.
fn error_response(err: &Error) -> Response {
    let mut res = Response::status(err.status());
    if let Error::MethodNotAllowed { allowed } = err {
        let allow = allowed.iter().map(http::Method::as_str).collect::<Vec<_>>().join(", ");
        if let Ok(value) = HeaderValue::from_str(&allow) {
            res.headers.insert(ALLOW, value);
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};

    use super::*;
    use crate::middleware::{self, NormalizePath, Trace};
    use crate::response::Reply;

    async fn ok(_req: Request) -> &'static str {
        "ok"
    }

    fn get(uri: &str) -> http::Request<Bytes> {
        http::Request::builder().uri(uri).body(Bytes::new()).unwrap()
    }

    #[tokio::test]
    async fn unknown_paths_are_404() {
        let app = App::new(Router::new().on(Method::GET, "/", ok));
        let res = app.call(get("/missing")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_method_is_405_with_allow() {
        let app = App::new(Router::new().on(Method::GET, "/a", ok).on(Method::PUT, "/a", ok));
        let req = http::Request::builder()
            .method(Method::DELETE)
            .uri("/a")
            .body(Bytes::new())
            .unwrap();
        let res = app.call(req).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()[ALLOW], "GET, PUT");
    }

    #[tokio::test]
    async fn handler_errors_become_500() {
        async fn broken(_req: Request) -> Result<Response, Error> {
            Err(Error::handler("database unavailable"))
        }
        let app = App::new(Router::new().on(Method::GET, "/", broken));
        let res = app.call(get("/")).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn first_wrapped_middleware_is_outermost() {
        let app = App::new(Router::new().on(Method::GET, "/", ok))
            .wrap(Trace)
            .wrap(NormalizePath::new())
            .wrap(middleware::from_fn(|req, next| {
                Box::pin(async move {
                    let reply = next.run(req).await?;
                    let mut res = reply.into_response();
                    res.headers_mut().insert("x-inner", HeaderValue::from_static("1"));
                    Ok::<_, Error>(Reply::Finished(res))
                })
            }));

        assert_eq!(app.middleware_names(), ["Trace", "NormalizePath", "from_fn"]);
        let res = app.call(get("/")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["x-inner"], "1");
    }
}
