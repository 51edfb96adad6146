//! Accept header parsing into precedence tiers.

use tracing::debug;

use super::media_type::MediaType;

const DEFAULT_ACCEPT: &str = "*/*";

/// One group of equally preferred media types, in header order.
#[derive(Clone, Debug, PartialEq)]
pub struct AcceptTier {
    quality: f32,
    precedence: u8,
    media_types: Vec<MediaType>,
}

impl AcceptTier {
    pub fn quality(&self) -> f32 { self.quality }
    pub fn precedence(&self) -> u8 { self.precedence }
    pub fn media_types(&self) -> &[MediaType] { &self.media_types }
}

/// Parses the client's acceptable media types into tiers, most preferred first.
///
/// `query_override` (typically a query-string parameter) wins over `header`;
/// when neither carries a value the client accepts `*/*`.
///
/// Tokens are grouped by quality, then by specificity, both descending.
/// Tokens that tie on both stay in header order within one tier. Malformed
/// tokens and tokens with `q=0` are dropped.
///
/// ```rust
/// use tsu_utils::negotiation::parse_accept;
///
/// let tiers = parse_accept(Some("text/html;q=0.8, application/json, */*;q=0.1"), None);
/// assert_eq!(tiers.len(), 3);
/// assert_eq!(tiers[0].media_types()[0].to_string(), "application/json");
/// ```
pub fn parse_accept(header: Option<&str>, query_override: Option<&str>) -> Vec<AcceptTier> {
    let source = [query_override, header]
        .into_iter()
        .flatten()
        .find(|v| !v.trim().is_empty())
        .unwrap_or(DEFAULT_ACCEPT);

    let mut weighted: Vec<(f32, MediaType)> = source
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match MediaType::parse(token) {
            Ok(mut media_type) => {
                let quality = media_type
                    .take_param("q")
                    .map_or(1.0, |q| parse_quality(&q));
                Some((quality, media_type))
            }
            Err(err) => {
                debug!(%err, "skipping accept token");
                None
            }
        })
        .filter(|(quality, _)| *quality > 0.0)
        .collect();

    // Stable: ties keep header order.
    weighted.sort_by(|(qa, a), (qb, b)| {
        qb.total_cmp(qa).then_with(|| b.precedence().cmp(&a.precedence()))
    });

    let mut tiers: Vec<AcceptTier> = Vec::new();
    for (quality, media_type) in weighted {
        let precedence = media_type.precedence();
        match tiers.last_mut() {
            Some(tier) if tier.quality == quality && tier.precedence == precedence => {
                tier.media_types.push(media_type);
            }
            _ => tiers.push(AcceptTier { quality, precedence, media_types: vec![media_type] }),
        }
    }
    tiers
}

/// Unparseable weights count as the default `1`.
fn parse_quality(raw: &str) -> f32 {
    match raw.trim().parse::<f32>() {
        Ok(q) if q.is_finite() => q.clamp(0.0, 1.0),
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flatten(tiers: &[AcceptTier]) -> Vec<Vec<String>> {
        tiers.iter()
            .map(|t| t.media_types().iter().map(ToString::to_string).collect())
            .collect()
    }

    #[test]
    fn defaults_to_any() {
        let tiers = parse_accept(None, None);
        assert_eq!(flatten(&tiers), vec![vec!["*/*"]]);
        assert_eq!(flatten(&parse_accept(Some("   "), None)), vec![vec!["*/*"]]);
    }

    #[test]
    fn query_override_wins_over_header() {
        let tiers = parse_accept(Some("application/json"), Some("text/html"));
        assert_eq!(flatten(&tiers), vec![vec!["text/html"]]);

        let tiers = parse_accept(Some("application/json"), Some(""));
        assert_eq!(flatten(&tiers), vec![vec!["application/json"]]);
    }

    #[test]
    fn equal_tokens_share_a_tier_in_header_order() {
        let tiers = parse_accept(Some("text/html, , application/json"), None);
        assert_eq!(flatten(&tiers), vec![vec!["text/html", "application/json"]]);
    }

    #[test]
    fn orders_by_quality_then_specificity() {
        let tiers = parse_accept(
            Some("*/*;q=0.1, text/*, text/html;level=1, application/xml;q=0.5, text/plain"),
            None,
        );
        assert_eq!(
            flatten(&tiers),
            vec![
                vec!["text/html; level=1"],
                vec!["text/plain"],
                vec!["text/*"],
                vec!["application/xml"],
                vec!["*/*"],
            ],
        );
        assert_eq!(tiers[3].quality(), 0.5);
    }

    #[test]
    fn drops_malformed_and_refused_tokens() {
        let tiers = parse_accept(Some("garbage, */json, text/csv;q=0, application/json"), None);
        assert_eq!(flatten(&tiers), vec![vec!["application/json"]]);

        assert!(parse_accept(Some("nonsense"), None).is_empty());
    }

    #[test]
    fn invalid_quality_defaults_to_one() {
        assert_eq!(parse_quality("abc"), 1.0);
        assert_eq!(parse_quality("7"), 1.0);
        assert_eq!(parse_quality("0.25"), 0.25);
        assert_eq!(parse_quality("-1"), 0.0);
    }
}
