//! Content negotiation.
//!
//! The middleware picks a renderer for each request from the client's
//! `Accept` header, runs the handler, and renders the handler's
//! [`Negotiable`](crate::Negotiable) data with the chosen renderer:
//!
//! ```rust
//! use http::Method;
//! use serde_json::json;
//! use tsu_utils::{App, Negotiable, Request, Router, negotiation};
//!
//! async fn hello(_req: Request) -> Negotiable {
//!     Negotiable::new(json!({"message": "Let's negotiate"}))
//! }
//!
//! # fn main() -> Result<(), tsu_utils::Error> {
//! let app = negotiation::setup(
//!     App::new(Router::new().on(Method::GET, "/", hello)),
//!     negotiation::NegotiationConfig::default(),
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! By default everything renders to JSON, unmatched `Accept` headers fall
//! back to the first registered renderer, and empty payloads (`null`,
//! `false`, absent) produce an empty body.
//!
//! Per request the middleware moves through three phases, strictly in order:
//! negotiation, then the handler, then rendering. A handler that returns a
//! finished [`Response`](crate::Response) skips rendering.

mod accept;
mod media_type;
mod negotiator;
mod registry;

pub mod renderer;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

pub use accept::{AcceptTier, parse_accept};
pub use media_type::MediaType;
pub use negotiator::{DefaultNegotiator, Negotiator, Selection};
pub use registry::{IntoRenderer, RendererRegistry};
pub use renderer::{JsonRenderer, RenderContext, Rendered, Renderer, TextRenderer};

use crate::app::App;
use crate::config::NegotiationSettings;
use crate::error::{Error, Result};
use crate::handler::ReplyFuture;
use crate::middleware::{Middleware, Next};
use crate::request::{Request, SelectedMediaType};
use crate::response::Reply;

// ── Configuration ─────────────────────────────────────────────────────────────

/// Everything the negotiation middleware needs, resolved once at startup.
#[derive(Clone)]
pub struct NegotiationConfig {
    registry: RendererRegistry,
    negotiator: Arc<dyn Negotiator>,
    force_negotiation: bool,
    force_rendering: bool,
    accept_query_param: Option<String>,
}

impl Default for NegotiationConfig {
    /// JSON only, forced negotiation, no forced rendering, no query override.
    fn default() -> Self {
        Self::from_settings(&NegotiationSettings::default())
    }
}

impl fmt::Debug for NegotiationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NegotiationConfig")
            .field("registry", &self.registry)
            .field("force_negotiation", &self.force_negotiation)
            .field("force_rendering", &self.force_rendering)
            .field("accept_query_param", &self.accept_query_param)
            .finish_non_exhaustive()
    }
}

impl NegotiationConfig {
    /// Default renderers and negotiator with the switches from `settings`.
    pub fn from_settings(settings: &NegotiationSettings) -> Self {
        Self {
            registry: RendererRegistry::json(),
            negotiator: Arc::new(DefaultNegotiator),
            force_negotiation: settings.force_negotiation,
            force_rendering: settings.force_rendering,
            accept_query_param: settings.accept_query_param.clone(),
        }
    }

    /// Replaces the switches with those in `settings`, keeping renderers and
    /// negotiator.
    pub fn with_settings(mut self, settings: &NegotiationSettings) -> Self {
        self.force_negotiation = settings.force_negotiation;
        self.force_rendering = settings.force_rendering;
        self.accept_query_param = settings.accept_query_param.clone();
        self
    }

    pub fn renderers(mut self, registry: RendererRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn negotiator(mut self, negotiator: impl Negotiator) -> Self {
        self.negotiator = Arc::new(negotiator);
        self
    }

    pub fn force_negotiation(mut self, enabled: bool) -> Self {
        self.force_negotiation = enabled;
        self
    }

    pub fn force_rendering(mut self, enabled: bool) -> Self {
        self.force_rendering = enabled;
        self
    }

    /// Lets `?<param>=<media type>` override the `Accept` header.
    pub fn accept_query_param(mut self, param: impl Into<String>) -> Self {
        self.accept_query_param = Some(param.into());
        self
    }

    pub fn registry(&self) -> &RendererRegistry { &self.registry }
}

// ── Middleware ────────────────────────────────────────────────────────────────

/// Selects a renderer before the handler runs and renders its data after.
#[derive(Debug)]
pub struct NegotiationMiddleware {
    config: NegotiationConfig,
}

impl NegotiationMiddleware {
    /// Validates the configuration. An empty renderer registry is rejected
    /// here rather than on every request.
    pub fn new(config: NegotiationConfig) -> Result<Self> {
        if config.registry.is_empty() {
            return Err(Error::Misconfigured("negotiation needs at least one renderer".to_owned()));
        }
        Ok(Self { config })
    }

    /// Runs the configured negotiator for `req`.
    pub fn negotiate(&self, req: &Request) -> Result<Selection> {
        let query = self.config.accept_query_param.as_deref()
            .and_then(|param| req.query_param(param));
        let header = req.header(http::header::ACCEPT.as_str());
        let tiers = parse_accept(header, query.as_deref());

        let selection = self.config.negotiator.select(
            &tiers,
            &self.config.registry,
            self.config.force_negotiation,
        )?;
        debug!(
            accept = header.unwrap_or("*/*"),
            content_type = %selection.content_type,
            "negotiated representation"
        );
        Ok(selection)
    }
}

impl NegotiationMiddleware {
    async fn respond<'a>(&'a self, mut req: Request, next: Next<'a>) -> Result<Reply> {
        let Selection { content_type, renderer } = self.negotiate(&req)?;
        req.extensions_mut().insert(SelectedMediaType(content_type.clone()));

        let cx = RenderContext {
            media_type: content_type.clone(),
            method: req.method().clone(),
            path: req.path().to_owned(),
        };

        let mut negotiable = match next.run(req).await? {
            finished @ Reply::Finished(_) => return Ok(finished),
            Reply::Negotiable(negotiable) => negotiable,
        };

        if !self.config.force_rendering && !negotiable.payload.has_data() {
            return Ok(Reply::Finished(negotiable.finish_unrendered()));
        }

        let data = std::mem::take(&mut negotiable.payload).into_value();
        let res = match renderer.render(data, cx).await? {
            Rendered::Body(body) => negotiable.finish(&content_type, body),
            Rendered::Response(res) => res,
        };
        Ok(Reply::Finished(res))
    }
}

impl Middleware for NegotiationMiddleware {
    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> ReplyFuture<'a> {
        Box::pin(self.respond(req, next))
    }
}

/// Adds negotiation to `app` as its innermost middleware so far.
pub fn setup(app: App, config: NegotiationConfig) -> Result<App> {
    Ok(app.wrap(NegotiationMiddleware::new(config)?))
}
