//! Renderer selection.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::accept::AcceptTier;
use super::registry::RendererRegistry;
use super::renderer::SharedRenderer;
use crate::error::Error;

/// The outcome of negotiation for one request.
#[derive(Clone)]
pub struct Selection {
    /// Value for the response's `content-type`.
    pub content_type: String,
    pub renderer: SharedRenderer,
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Strategy that picks a renderer for a request's accept tiers.
///
/// Closures with the same signature implement it, so a custom strategy can
/// be dropped into [`NegotiationConfig`](super::NegotiationConfig) directly.
pub trait Negotiator: Send + Sync + 'static {
    fn select(
        &self,
        tiers: &[AcceptTier],
        registry: &RendererRegistry,
        force: bool,
    ) -> Result<Selection, Error>;
}

impl<F> Negotiator for F
where
    F: Fn(&[AcceptTier], &RendererRegistry, bool) -> Result<Selection, Error> + Send + Sync + 'static,
{
    fn select(
        &self,
        tiers: &[AcceptTier],
        registry: &RendererRegistry,
        force: bool,
    ) -> Result<Selection, Error> {
        self(tiers, registry, force)
    }
}

/// Client preference first, registration order second.
///
/// Tiers are walked most preferred first. Within a tier, registry entries are
/// walked in registration order and compared against every media type in the
/// tier; the first match wins. The reported content type is whichever of the
/// two matching media types is more specific, so `*/*` against a registered
/// `application/json` reports `application/json`, while a client asking for
/// `application/json; indent=4` gets its parameters echoed back.
///
/// Without a match, `force` falls back to the first registry entry; otherwise
/// the request is [`Error::NotAcceptable`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultNegotiator;

impl Negotiator for DefaultNegotiator {
    fn select(
        &self,
        tiers: &[AcceptTier],
        registry: &RendererRegistry,
        force: bool,
    ) -> Result<Selection, Error> {
        for tier in tiers {
            for (registered, renderer) in registry.entries() {
                let Some(candidate) = tier.media_types().iter().find(|c| registered.matches(c))
                else {
                    continue;
                };
                let content_type = if registered.precedence() > candidate.precedence() {
                    registered.to_string()
                } else {
                    candidate.to_string()
                };
                return Ok(Selection { content_type, renderer: Arc::clone(renderer) });
            }
        }

        if !force {
            return Err(Error::NotAcceptable);
        }
        let (media_type, renderer) = registry
            .first()
            .ok_or_else(|| Error::Misconfigured("no renderers registered".to_owned()))?;
        debug!(fallback = %media_type, "no acceptable renderer, forcing fallback");
        Ok(Selection { content_type: media_type.to_string(), renderer: Arc::clone(renderer) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::accept::parse_accept;
    use crate::negotiation::renderer::{JsonRenderer, TextRenderer};

    fn html_then_json() -> (RendererRegistry, SharedRenderer, SharedRenderer) {
        let html: SharedRenderer = Arc::new(TextRenderer::new());
        let json: SharedRenderer = Arc::new(JsonRenderer::new());
        let registry = RendererRegistry::new()
            .with("text/html", Arc::clone(&html))
            .with("application/json", Arc::clone(&json));
        (registry, html, json)
    }

    fn select(accept: &str, registry: &RendererRegistry, force: bool) -> Result<Selection, Error> {
        DefaultNegotiator.select(&parse_accept(Some(accept), None), registry, force)
    }

    #[test]
    fn wildcard_reports_registered_type() {
        let sel = select("*/*", &RendererRegistry::json(), false).unwrap();
        assert_eq!(sel.content_type, "application/json");
    }

    #[test]
    fn exact_match_picks_that_renderer() {
        let (registry, _, json) = html_then_json();
        let sel = select("application/json", &registry, false).unwrap();
        assert_eq!(sel.content_type, "application/json");
        assert!(Arc::ptr_eq(&sel.renderer, &json));
    }

    #[test]
    fn registration_order_breaks_ties_within_a_tier() {
        let (registry, html, _) = html_then_json();
        let sel = select("application/json, text/html", &registry, false).unwrap();
        assert_eq!(sel.content_type, "text/html");
        assert!(Arc::ptr_eq(&sel.renderer, &html));

        let sel = select("*/*", &registry, false).unwrap();
        assert_eq!(sel.content_type, "text/html");
    }

    #[test]
    fn quality_outranks_registration_order() {
        let (registry, _, json) = html_then_json();
        let sel = select("text/html;q=0.5, application/json", &registry, false).unwrap();
        assert!(Arc::ptr_eq(&sel.renderer, &json));
    }

    #[test]
    fn more_specific_client_type_is_echoed() {
        let sel = select("application/json; indent=4", &RendererRegistry::json(), false).unwrap();
        assert_eq!(sel.content_type, "application/json; indent=4");

        let sel = select("application/*", &RendererRegistry::json(), false).unwrap();
        assert_eq!(sel.content_type, "application/json");
    }

    #[test]
    fn unmatched_without_force_is_not_acceptable() {
        let (registry, _, _) = html_then_json();
        assert!(matches!(select("text/notsupported", &registry, false), Err(Error::NotAcceptable)));
        assert!(matches!(select("image/*", &registry, false), Err(Error::NotAcceptable)));
    }

    #[test]
    fn unmatched_with_force_falls_back_to_first_entry() {
        let (registry, html, _) = html_then_json();
        let sel = select("application/vnd.api+json", &registry, true).unwrap();
        assert_eq!(sel.content_type, "text/html");
        assert!(Arc::ptr_eq(&sel.renderer, &html));
    }

    #[test]
    fn force_never_fails_with_a_populated_registry() {
        let (registry, _, _) = html_then_json();
        for accept in ["", "garbage", "*/json", ",,,", "x/y;q=0", "application/x-exotic; v=\"1\""] {
            assert!(select(accept, &registry, true).is_ok(), "accept {accept:?}");
        }
    }

    #[test]
    fn force_with_empty_registry_is_misconfigured() {
        let result = select("*/*", &RendererRegistry::new(), true);
        assert!(matches!(result, Err(Error::Misconfigured(_))));
    }

    #[test]
    fn selection_is_idempotent() {
        let (registry, _, _) = html_then_json();
        let tiers = parse_accept(Some("text/*;q=0.9, application/json"), None);
        let a = DefaultNegotiator.select(&tiers, &registry, false).unwrap();
        let b = DefaultNegotiator.select(&tiers, &registry, false).unwrap();
        assert_eq!(a.content_type, b.content_type);
        assert!(Arc::ptr_eq(&a.renderer, &b.renderer));
    }

    #[test]
    fn closures_are_negotiators() {
        let always_json = |_: &[AcceptTier], registry: &RendererRegistry, _: bool| -> Result<Selection, Error> {
            let renderer = Arc::clone(registry.resolve("application/json")?);
            Ok(Selection { content_type: "application/json".to_owned(), renderer })
        };
        let (registry, _, json) = html_then_json();
        let sel = always_json.select(&[], &registry, false).unwrap();
        assert!(Arc::ptr_eq(&sel.renderer, &json));
    }
}
