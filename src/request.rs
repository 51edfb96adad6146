//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method, Uri};
use percent_encoding::percent_decode_str;

/// The media type chosen by content negotiation for the current request.
///
/// Inserted into the request's extensions before the handler runs, so a
/// handler (a template view, say) can shape its payload for the representation
/// that will be rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedMediaType(pub String);

/// An incoming HTTP request with its body fully buffered.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) headers: HeaderMap,
    pub(crate) extensions: Extensions,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn from_http(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            extensions: parts.extensions,
            body,
            params: HashMap::new(),
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn query(&self) -> Option<&str> { self.uri.query() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Values that are not visible ASCII are
    /// treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns the first value of a query-string parameter.
    ///
    /// Keys and values are percent-decoded before comparison; `+` is kept
    /// literally so media types like `application/vnd.api+json` survive.
    pub fn query_param(&self, key: &str) -> Option<String> {
        self.query()?
            .split('&')
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
            .find(|(k, _)| decode(k) == key)
            .map(|(_, v)| decode(v))
    }

    /// Request-scoped typed storage shared between middleware and handlers.
    pub fn extensions(&self) -> &Extensions { &self.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.extensions }

    /// The media type negotiated for this request, if negotiation ran.
    pub fn selected_media_type(&self) -> Option<&str> {
        self.extensions.get::<SelectedMediaType>().map(|m| m.0.as_str())
    }
}

/// Decode a percent-encoded query component.
fn decode(component: &str) -> String {
    percent_decode_str(component).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> Request {
        Request::from_http(
            http::Request::builder()
                .uri(uri)
                .header("Accept", "application/json")
                .body(Bytes::new())
                .unwrap(),
        )
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = request("/");
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("ACCEPT"), Some("application/json"));
        assert_eq!(req.header("x-missing"), None);
    }

    #[test]
    fn query_params_are_decoded() {
        let req = request("/items?format=text%2Fhtml&flag");
        assert_eq!(req.query_param("format").as_deref(), Some("text/html"));
        assert_eq!(req.query_param("flag").as_deref(), Some(""));
        assert_eq!(req.query_param("missing"), None);
    }

    #[test]
    fn query_keys_are_decoded_and_plus_is_literal() {
        let req = request("/?form%61t=application%2Fvnd.api+json");
        assert_eq!(req.query_param("format").as_deref(), Some("application/vnd.api+json"));
    }

    #[test]
    fn selected_media_type_reads_extension() {
        let mut req = request("/");
        assert_eq!(req.selected_media_type(), None);
        req.extensions_mut().insert(SelectedMediaType("text/html".to_owned()));
        assert_eq!(req.selected_media_type(), Some("text/html"));
    }
}
