//! Renderers turn negotiated payload data into response bytes.
//!
//! Every renderer is called through one asynchronous signature, whether it
//! needs to suspend (a template reading a file) or not (JSON). Synchronous
//! closures are adapted with [`from_sync_fn`], asynchronous ones with
//! [`from_fn`].

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use serde_json::Value;

use crate::error::Error;
use crate::handler::BoxFuture;
use crate::response::Response;

/// The future a renderer resolves to.
pub type RenderFuture<'a> = BoxFuture<'a, Result<Rendered, Error>>;

/// A shareable, type-erased renderer.
pub type SharedRenderer = Arc<dyn Renderer>;

/// Output of a renderer.
#[derive(Debug)]
pub enum Rendered {
    /// Becomes the response body; `content-type` is set to the negotiated type.
    Body(Bytes),
    /// Replaces the response entirely (redirects, errors, custom headers).
    Response(Response),
}

impl From<Bytes> for Rendered {
    fn from(body: Bytes) -> Self { Self::Body(body) }
}

impl From<Vec<u8>> for Rendered {
    fn from(body: Vec<u8>) -> Self { Self::Body(body.into()) }
}

impl From<String> for Rendered {
    fn from(body: String) -> Self { Self::Body(body.into()) }
}

impl From<Response> for Rendered {
    fn from(res: Response) -> Self { Self::Response(res) }
}

/// What a renderer knows about the request it renders for.
#[derive(Clone, Debug)]
pub struct RenderContext {
    pub media_type: String,
    pub method: Method,
    pub path: String,
}

/// Converts in-memory data into a representation.
pub trait Renderer: Send + Sync + 'static {
    fn render(&self, data: Value, cx: RenderContext) -> RenderFuture<'_>;
}

// ── JSON ──────────────────────────────────────────────────────────────────────

/// Renders payloads with `serde_json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonRenderer {
    pretty: bool,
}

impl JsonRenderer {
    pub fn new() -> Self { Self::default() }

    /// Indented output, for humans poking at an API with curl.
    pub fn pretty() -> Self { Self { pretty: true } }

    pub fn to_bytes(&self, data: &Value) -> Result<Bytes, Error> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(data)?
        } else {
            serde_json::to_vec(data)?
        };
        Ok(bytes.into())
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, data: Value, _cx: RenderContext) -> RenderFuture<'_> {
        let out = self.to_bytes(&data).map(Rendered::Body);
        Box::pin(std::future::ready(out))
    }
}

// ── Text ──────────────────────────────────────────────────────────────────────

/// Renders strings verbatim and any other value as its JSON text, encoded for
/// a declared charset. Only UTF-8 and its ASCII subset are supported.
#[derive(Clone, Debug)]
pub struct TextRenderer {
    charset: String,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self { charset: "utf-8".to_owned() }
    }

    pub fn with_charset(charset: impl Into<String>) -> Self {
        Self { charset: charset.into() }
    }

    pub fn charset(&self) -> &str { &self.charset }

    fn encode(&self, text: String) -> Result<Bytes, Error> {
        match self.charset.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(text.into()),
            "us-ascii" | "ascii" if text.is_ascii() => Ok(text.into()),
            other => Err(Error::render(format!("cannot encode text as `{other}`"))),
        }
    }
}

impl Default for TextRenderer {
    fn default() -> Self { Self::new() }
}

impl Renderer for TextRenderer {
    fn render(&self, data: Value, _cx: RenderContext) -> RenderFuture<'_> {
        let text = match data {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let out = self.encode(text).map(Rendered::Body);
        Box::pin(std::future::ready(out))
    }
}

// ── Closures ──────────────────────────────────────────────────────────────────

struct FnRenderer<F>(F);

impl<F, Fut, R> Renderer for FnRenderer<F>
where
    F: Fn(Value, RenderContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
    R: Into<Rendered>,
{
    fn render(&self, data: Value, cx: RenderContext) -> RenderFuture<'_> {
        let fut = (self.0)(data, cx);
        Box::pin(async move { fut.await.map(Into::<Rendered>::into) })
    }
}

struct SyncFnRenderer<F>(F);

impl<F, R> Renderer for SyncFnRenderer<F>
where
    F: Fn(Value, &RenderContext) -> Result<R, Error> + Send + Sync + 'static,
    R: Into<Rendered>,
{
    fn render(&self, data: Value, cx: RenderContext) -> RenderFuture<'_> {
        let out = (self.0)(data, &cx).map(Into::<Rendered>::into);
        Box::pin(std::future::ready(out))
    }
}

/// Wraps an async closure as a renderer.
///
/// ```rust
/// use tsu_utils::negotiation::renderer::{self, RenderContext};
/// use tsu_utils::Error;
///
/// let html = renderer::from_fn(|data: serde_json::Value, _cx: RenderContext| async move {
///     Ok::<_, Error>(format!("<p>{}</p>", data["message"].as_str().unwrap_or_default()))
/// });
/// ```
pub fn from_fn<F, Fut, R>(f: F) -> SharedRenderer
where
    F: Fn(Value, RenderContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
    R: Into<Rendered> + 'static,
{
    Arc::new(FnRenderer(f))
}

/// Wraps a synchronous closure as a renderer.
pub fn from_sync_fn<F, R>(f: F) -> SharedRenderer
where
    F: Fn(Value, &RenderContext) -> Result<R, Error> + Send + Sync + 'static,
    R: Into<Rendered> + 'static,
{
    Arc::new(SyncFnRenderer(f))
}
