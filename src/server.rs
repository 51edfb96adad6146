//! HTTP server and graceful shutdown.
//!
//! [`Server::serve`] accepts connections until the process receives SIGTERM
//! or Ctrl-C, then stops accepting and waits for every in-flight connection
//! to finish before returning.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::app::App;
use crate::error::Error;
use crate::response::Response;

/// Serves an [`App`] over HTTP/1.1 and HTTP/2.
///
/// ```rust,no_run
/// use tsu_utils::{App, Router, Server};
///
/// # async fn run() -> Result<(), tsu_utils::Error> {
/// Server::bind("127.0.0.1:8080").serve(App::new(Router::new())).await
/// # }
/// ```
#[derive(Debug)]
pub struct Server {
    addr: String,
}

impl Server {
    /// Remembers `addr`; it is parsed when [`serve`](Server::serve) starts.
    pub fn bind(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Runs `app` until a shutdown signal arrives and all connections drain.
    ///
    /// Fails with [`Error::InvalidAddress`] if the address is not a valid
    /// `host:port`, or with [`Error::Io`] if the listener cannot bind.
    pub async fn serve(self, app: App) -> Result<(), Error> {
        let addr: SocketAddr = self
            .addr
            .parse()
            .map_err(|_| Error::InvalidAddress(self.addr.clone()))?;
        let listener = TcpListener::bind(addr).await?;
        let app = Arc::new(app);

        info!(%addr, middleware = ?app.middleware_names(), "listening");

        let mut tasks = JoinSet::new();
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Shutdown first, so a queued backlog cannot delay it.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let app = Arc::clone(&app);
                            async move { serve_one(&app, req).await }
                        });
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(TokioIo::new(stream), svc)
                            .await
                        {
                            debug!(%peer, "connection closed with error: {e}");
                        }
                    });
                }

                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("stopped");
        Ok(())
    }
}

// ── Request entry ─────────────────────────────────────────────────────────────

/// Buffers the request body and hands the request to the app.
///
/// Never fails towards hyper: a body that cannot be read is answered with
/// `400 Bad Request`.
async fn serve_one(
    app: &App,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(path = parts.uri.path(), "failed to read request body: {e}");
            return Ok(Response::status(http::StatusCode::BAD_REQUEST).into_http());
        }
    };
    Ok(app.call(http::Request::from_parts(parts, body)).await)
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on SIGTERM or Ctrl-C. A signal that cannot be installed is
/// logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
