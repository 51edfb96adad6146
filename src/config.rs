//! Application settings.
//!
//! Settings are plain data: they can come from the environment
//! ([`Settings::from_env`]) or be deserialized from any serde format (a
//! section of your app's TOML or JSON config). Renderers and negotiators are
//! code, not data, so they are supplied through
//! [`NegotiationConfig`](crate::negotiation::NegotiationConfig) instead.
//!
//! Precedence, lowest to highest: built-in defaults, then `Settings`, then
//! explicit builder calls on the config objects. Everything is resolved once
//! at startup and never changes afterwards.

use serde::{Deserialize, Serialize};

/// All tsu-utils settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Settings {
    pub negotiation: NegotiationSettings,
    pub path_norm: PathNormSettings,
}

/// Content negotiation switches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct NegotiationSettings {
    /// Fall back to the first renderer instead of answering `406`.
    pub force_negotiation: bool,
    /// Render `null`, `false` and absent payloads too.
    pub force_rendering: bool,
    /// Query parameter whose value overrides the `Accept` header.
    pub accept_query_param: Option<String>,
}

impl Default for NegotiationSettings {
    fn default() -> Self {
        Self { force_negotiation: true, force_rendering: false, accept_query_param: None }
    }
}

/// Path normalization switches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PathNormSettings {
    pub append_slash: bool,
    pub merge_slashes: bool,
}

impl Default for PathNormSettings {
    fn default() -> Self {
        Self { append_slash: true, merge_slashes: true }
    }
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// | Variable | Setting |
    /// |---|---|
    /// | `FORCE_NEGOTIATION` | `negotiation.force_negotiation` |
    /// | `FORCE_RENDERING` | `negotiation.force_rendering` |
    /// | `ACCEPT_QUERY_PARAM` | `negotiation.accept_query_param` |
    /// | `APPEND_SLASH` | `path_norm.append_slash` |
    /// | `MERGE_SLASHES` | `path_norm.merge_slashes` |
    ///
    /// Booleans accept `1`/`true` and `0`/`false`; anything else keeps the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        let flag = |key: &str, current: bool| lookup(key).and_then(|v| parse_bool(&v)).unwrap_or(current);

        let n = &mut settings.negotiation;
        n.force_negotiation = flag("FORCE_NEGOTIATION", n.force_negotiation);
        n.force_rendering = flag("FORCE_RENDERING", n.force_rendering);
        if let Some(param) = lookup("ACCEPT_QUERY_PARAM").filter(|v| !v.is_empty()) {
            n.accept_query_param = Some(param);
        }

        let p = &mut settings.path_norm;
        p.append_slash = flag("APPEND_SLASH", p.append_slash);
        p.merge_slashes = flag("MERGE_SLASHES", p.merge_slashes);

        settings
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim() {
        "1" => Some(true),
        "0" => Some(false),
        v if v.eq_ignore_ascii_case("true") => Some(true),
        v if v.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert!(settings.negotiation.force_negotiation);
        assert!(!settings.negotiation.force_rendering);
        assert_eq!(settings.negotiation.accept_query_param, None);
        assert!(settings.path_norm.append_slash);
        assert!(settings.path_norm.merge_slashes);
    }

    #[test]
    fn reads_overrides_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("FORCE_NEGOTIATION", "false"),
            ("FORCE_RENDERING", "1"),
            ("ACCEPT_QUERY_PARAM", "format"),
            ("APPEND_SLASH", "0"),
            ("MERGE_SLASHES", "maybe"),
        ]
        .into_iter()
        .collect();
        let settings = Settings::from_lookup(|k| env.get(k).map(|v| (*v).to_owned()));

        assert!(!settings.negotiation.force_negotiation);
        assert!(settings.negotiation.force_rendering);
        assert_eq!(settings.negotiation.accept_query_param.as_deref(), Some("format"));
        assert!(!settings.path_norm.append_slash);
        assert!(settings.path_norm.merge_slashes);
    }

    #[test]
    fn deserializes_partial_documents() {
        let settings: Settings = serde_json::from_str(
            r#"{"negotiation": {"force_rendering": true}, "path_norm": {"append_slash": false}}"#,
        )
        .unwrap();
        assert!(settings.negotiation.force_negotiation);
        assert!(settings.negotiation.force_rendering);
        assert!(!settings.path_norm.append_slash);
        assert!(settings.path_norm.merge_slashes);
    }
}
