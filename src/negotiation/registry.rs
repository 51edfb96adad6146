//! Ordered media type → renderer table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use super::media_type::MediaType;
use super::renderer::{JsonRenderer, Renderer, SharedRenderer};
use crate::error::Error;

/// Renderers keyed by media type, in registration order.
///
/// Order matters: when the client expresses no usable preference, or only a
/// wildcard, earlier entries win. Keys are unique; registering a media type a
/// second time replaces its renderer in place.
///
/// Build from an ordered source (`with` chains, a `Vec`, an array) when the
/// fallback order matters. A `HashMap` has no order, so its entries are sorted
/// by key to keep fallback deterministic.
#[derive(Clone, Default)]
pub struct RendererRegistry {
    entries: Vec<(MediaType, SharedRenderer)>,
}

impl RendererRegistry {
    pub fn new() -> Self { Self::default() }

    /// `application/json` rendered by [`JsonRenderer`].
    pub fn json() -> Self {
        Self::new().with("application/json", JsonRenderer::new())
    }

    /// Adds or replaces the renderer for `media_type`.
    pub fn register(
        &mut self,
        media_type: &str,
        renderer: impl IntoRenderer,
    ) -> Result<(), Error> {
        let media_type = MediaType::parse(media_type)?;
        let renderer = renderer.into_renderer();
        match self.entries.iter_mut().find(|(mt, _)| *mt == media_type) {
            Some(entry) => entry.1 = renderer,
            None => self.entries.push((media_type, renderer)),
        }
        Ok(())
    }

    /// Chaining form of [`register`](Self::register). A malformed media type
    /// is skipped with a warning instead of failing.
    pub fn with(mut self, media_type: &str, renderer: impl IntoRenderer) -> Self {
        if let Err(err) = self.register(media_type, renderer) {
            warn!(%err, "skipping renderer registration");
        }
        self
    }

    /// The renderer registered under exactly `media_type`.
    pub fn resolve(&self, media_type: &str) -> Result<&SharedRenderer, Error> {
        let wanted = MediaType::parse(media_type)?;
        self.entries.iter()
            .find(|(mt, _)| *mt == wanted)
            .map(|(_, renderer)| renderer)
            .ok_or_else(|| Error::RendererNotFound(media_type.to_owned()))
    }

    /// The fallback entry.
    pub fn first(&self) -> Option<(&MediaType, &SharedRenderer)> {
        self.entries.first().map(|(mt, r)| (mt, r))
    }

    pub fn entries(&self) -> impl Iterator<Item = (&MediaType, &SharedRenderer)> {
        self.entries.iter().map(|(mt, r)| (mt, r))
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(mt, _)| mt.to_string()))
            .finish()
    }
}

impl<K: AsRef<str>, R: IntoRenderer> FromIterator<(K, R)> for RendererRegistry {
    fn from_iter<I: IntoIterator<Item = (K, R)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |registry, (mt, r)| registry.with(mt.as_ref(), r))
    }
}

impl<R: IntoRenderer> From<HashMap<String, R>> for RendererRegistry {
    fn from(map: HashMap<String, R>) -> Self {
        let mut entries: Vec<_> = map.into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        entries.into_iter().collect()
    }
}

// ── IntoRenderer ──────────────────────────────────────────────────────────────

/// Anything that can be stored in the registry: a concrete renderer or one
/// already shared behind an `Arc`.
pub trait IntoRenderer {
    fn into_renderer(self) -> SharedRenderer;
}

impl<R: Renderer> IntoRenderer for R {
    fn into_renderer(self) -> SharedRenderer { Arc::new(self) }
}

impl IntoRenderer for SharedRenderer {
    fn into_renderer(self) -> SharedRenderer { self }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::renderer::TextRenderer;

    fn keys(registry: &RendererRegistry) -> Vec<String> {
        registry.entries().map(|(mt, _)| mt.to_string()).collect()
    }

    #[test]
    fn preserves_registration_order() {
        let registry = RendererRegistry::new()
            .with("text/html", TextRenderer::new())
            .with("application/json", JsonRenderer::new())
            .with("text/plain", TextRenderer::new());
        assert_eq!(keys(&registry), ["text/html", "application/json", "text/plain"]);
        assert_eq!(registry.first().unwrap().0.to_string(), "text/html");
    }

    #[test]
    fn duplicate_registration_replaces_in_place() {
        let json: SharedRenderer = Arc::new(JsonRenderer::new());
        let mut registry = RendererRegistry::new()
            .with("application/json", TextRenderer::new())
            .with("text/plain", TextRenderer::new());
        registry.register("Application/JSON", Arc::clone(&json)).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(keys(&registry), ["application/json", "text/plain"]);
        let resolved = registry.resolve("application/json").unwrap();
        assert!(Arc::ptr_eq(resolved, &json));
    }

    #[test]
    fn malformed_keys_are_rejected_or_skipped() {
        let mut registry = RendererRegistry::new();
        assert!(matches!(
            registry.register("json", JsonRenderer::new()),
            Err(Error::MalformedMediaType(_)),
        ));
        let registry = registry.with("nope", JsonRenderer::new());
        assert!(registry.is_empty());
    }

    #[test]
    fn resolve_reports_missing_types() {
        let registry = RendererRegistry::json();
        assert!(registry.resolve("application/json").is_ok());
        assert!(matches!(registry.resolve("text/html"), Err(Error::RendererNotFound(_))));
    }

    #[test]
    fn unordered_maps_get_a_deterministic_order() {
        let map: HashMap<String, JsonRenderer> = ["text/plain", "application/json", "image/svg+xml"]
            .into_iter()
            .map(|k| (k.to_owned(), JsonRenderer::new()))
            .collect();
        let registry = RendererRegistry::from(map);
        assert_eq!(keys(&registry), ["application/json", "image/svg+xml", "text/plain"]);
    }

    #[test]
    fn collects_from_ordered_pairs() {
        let registry: RendererRegistry = vec![
            ("text/html", TextRenderer::new()),
            ("text/plain", TextRenderer::new()),
        ]
        .into_iter()
        .collect();
        assert_eq!(keys(&registry), ["text/html", "text/plain"]);
    }
}
