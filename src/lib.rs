//! # tsu-utils
//!
//! Content negotiation, path normalization and resource routing for
//! async HTTP services on hyper.
//!
//! Handlers return *data*; the negotiation middleware picks a renderer from
//! the client's `Accept` header and turns that data into a response body.
//! Around it sit the pieces most services want anyway:
//!
//! - [`negotiation`]: `Accept` parsing, renderer registry, pluggable negotiator
//! - [`middleware::NormalizePath`]: `301` redirects for missing trailing
//!   slashes and repeated slashes
//! - [`Router`] and [`Resource`]: radix-tree routing via [`matchit`], named
//!   routes, method-keyed resources, URL reversal
//! - [`Server`]: HTTP/1.1 and HTTP/2, graceful shutdown on SIGTERM / Ctrl-C
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::Method;
//! use serde_json::json;
//! use tsu_utils::middleware::{NormalizePath, Trace};
//! use tsu_utils::{App, Negotiable, Request, Router, Server, negotiation};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tsu_utils::Error> {
//!     let router = Router::new()
//!         .on(Method::GET, "/users/{id}/", get_user);
//!
//!     let app = App::new(router)
//!         .wrap(Trace)
//!         .wrap(NormalizePath::new());
//!     let app = negotiation::setup(app, negotiation::NegotiationConfig::default())?;
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//!
//! async fn get_user(req: Request) -> Negotiable {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Negotiable::new(json!({ "id": id }))
//! }
//! ```

mod app;
mod config;
mod error;
mod handler;
mod request;
mod resource;
mod response;
mod router;
mod server;

pub mod middleware;
pub mod negotiation;

pub use app::App;
pub use config::{NegotiationSettings, PathNormSettings, Settings};
pub use error::{BoxError, Error, Result};
pub use handler::{BoxFuture, Handler, HandlerOutput, ReplyFuture};
pub use request::{Request, SelectedMediaType};
pub use resource::Resource;
pub use response::{DEFAULT_CONTENT_TYPE, IntoReply, Negotiable, Payload, Reply, Response, ResponseBuilder};
pub use router::{Router, Scope};
pub use server::Server;
