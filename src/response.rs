//! Handler results: finished responses, negotiable payloads, and the
//! [`IntoReply`] conversion trait.
//!
//! A handler either finishes the response itself ([`Response`]) or hands back
//! data for the negotiation layer to render ([`Negotiable`]). [`Reply`] is the
//! tag that tells the two apart.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};

/// Content type given to a negotiable response whose payload was not rendered.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// ── Response ─────────────────────────────────────────────────────────────────

/// A finished HTTP response. Negotiation never touches it.
///
/// ```rust
/// use http::StatusCode;
/// use tsu_utils::Response;
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/users/42")
///     .json(br#"{"id":42}"#.to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

impl Response {
    /// `200 OK`: `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK`: `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { status: code, headers: HeaderMap::new(), body: Bytes::new() }
    }

    /// `301 Moved Permanently` pointing at `location`.
    pub fn redirect(location: &str) -> Self {
        Self::builder()
            .status(StatusCode::MOVED_PERMANENTLY)
            .header("location", location)
            .no_body()
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method.
#[derive(Debug)]
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Appends a header. Invalid names or values are dropped with a warning.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        append_header(&mut self.headers, name, value);
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.bytes("application/json", body)
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.bytes("text/plain; charset=utf-8", body.into())
    }

    /// Terminate with a body of any media type.
    pub fn bytes(mut self, content_type: &str, body: impl Into<Bytes>) -> Response {
        set_content_type(&mut self.headers, content_type);
        Response { status: self.status, headers: self.headers, body: body.into() }
    }

    /// Terminate with no body (e.g. `204 No Content`, `301 Moved Permanently`).
    pub fn no_body(self) -> Response {
        Response { status: self.status, headers: self.headers, body: Bytes::new() }
    }
}

fn append_header(headers: &mut HeaderMap, name: &str, value: &str) {
    match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
        (Ok(name), Ok(value)) => {
            headers.append(name, value);
        }
        _ => warn!(header = name, "dropping invalid response header"),
    }
}

pub(crate) fn set_content_type(headers: &mut HeaderMap, content_type: &str) {
    match HeaderValue::from_str(content_type) {
        Ok(value) => {
            headers.insert(CONTENT_TYPE, value);
        }
        Err(_) => warn!(content_type, "dropping invalid content type"),
    }
}

// ── Payload ───────────────────────────────────────────────────────────────────

/// Data carried by a [`Negotiable`] response.
///
/// `Absent` means the handler produced no data at all. A present `null` or
/// `false` is treated the same way by the default rendering policy; every
/// other value (including `0`, `""`, `[]` and `{}`) counts as data.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Payload {
    #[default]
    Absent,
    Present(Value),
}

impl Payload {
    /// `false` for `Absent`, `null` and `false`.
    pub fn has_data(&self) -> bool {
        !matches!(self, Self::Absent | Self::Present(Value::Null | Value::Bool(false)))
    }

    /// The value handed to a renderer. `Absent` renders as `null`.
    pub fn into_value(self) -> Value {
        match self {
            Self::Absent => Value::Null,
            Self::Present(value) => value,
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Present(value)
    }
}

impl From<Option<Value>> for Payload {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Self::Absent, Self::Present)
    }
}

// ── Negotiable ────────────────────────────────────────────────────────────────

/// A response whose body is produced by the negotiated renderer.
///
/// Status and headers set here are kept; the body and `content-type` are
/// filled in by the negotiation middleware.
///
/// ```rust
/// use serde_json::json;
/// use tsu_utils::Negotiable;
///
/// let reply = Negotiable::new(json!({"message": "Hello world"}));
/// let created = Negotiable::serialize(&vec![1, 2, 3])
///     .unwrap()
///     .with_status(http::StatusCode::CREATED);
/// ```
#[derive(Debug)]
pub struct Negotiable {
    pub(crate) payload: Payload,
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
}

impl Negotiable {
    pub fn new(data: impl Into<Payload>) -> Self {
        Self { payload: data.into(), status: StatusCode::OK, headers: HeaderMap::new() }
    }

    /// A negotiable response carrying no data.
    pub fn empty() -> Self {
        Self::new(Payload::Absent)
    }

    /// Serializes any `Serialize` value into the payload.
    pub fn serialize<T: Serialize + ?Sized>(data: &T) -> Result<Self> {
        let value = serde_json::to_value(data).map_err(Error::handler)?;
        Ok(Self::new(value))
    }

    pub fn with_status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        append_header(&mut self.headers, name, value);
        self
    }

    pub fn payload(&self) -> &Payload { &self.payload }
    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    /// Turns the negotiable into a finished response with `body` as content.
    pub(crate) fn finish(self, content_type: &str, body: Bytes) -> Response {
        let mut headers = self.headers;
        set_content_type(&mut headers, content_type);
        Response { status: self.status, headers, body }
    }

    /// Finishes the response without rendering the payload.
    pub(crate) fn finish_unrendered(self) -> Response {
        let mut headers = self.headers;
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        }
        Response { status: self.status, headers, body: Bytes::new() }
    }
}

// ── Reply ─────────────────────────────────────────────────────────────────────

/// What a handler hands back to the pipeline.
#[derive(Debug)]
pub enum Reply {
    /// Already complete; passes through negotiation untouched.
    Finished(Response),
    /// Carries data to be rendered by the negotiated renderer.
    Negotiable(Negotiable),
}

impl Reply {
    /// Collapses the reply into a finished response. Data on a negotiable
    /// reply that reaches this point unrendered is discarded.
    pub fn into_response(self) -> Response {
        match self {
            Self::Finished(res) => res,
            Self::Negotiable(neg) => neg.finish_unrendered(),
        }
    }
}

impl From<Response> for Reply {
    fn from(res: Response) -> Self { Self::Finished(res) }
}

impl From<Negotiable> for Reply {
    fn from(neg: Negotiable) -> Self { Self::Negotiable(neg) }
}

// ── IntoReply ─────────────────────────────────────────────────────────────────

/// Conversion into a handler [`Reply`].
///
/// Implement on your own types to return them directly from handlers:
///
/// ```rust
/// use serde::Serialize;
/// use tsu_utils::{IntoReply, Negotiable, Reply};
///
/// #[derive(Serialize)]
/// struct User { id: u64, name: String }
///
/// impl IntoReply for User {
///     fn into_reply(self) -> Reply {
///         Negotiable::new(serde_json::json!({"id": self.id, "name": self.name})).into_reply()
///     }
/// }
/// ```
pub trait IntoReply {
    fn into_reply(self) -> Reply;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Reply { self }
}

impl IntoReply for Response {
    fn into_reply(self) -> Reply { Reply::Finished(self) }
}

impl IntoReply for Negotiable {
    fn into_reply(self) -> Reply { Reply::Negotiable(self) }
}

impl IntoReply for Value {
    fn into_reply(self) -> Reply { Reply::Negotiable(Negotiable::new(self)) }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Reply { Response::text(self).into_reply() }
}

impl IntoReply for String {
    fn into_reply(self) -> Reply { Response::text(self).into_reply() }
}

/// Return a status directly from a handler: `return StatusCode::NO_CONTENT`
impl IntoReply for StatusCode {
    fn into_reply(self) -> Reply { Response::status(self).into_reply() }
}
