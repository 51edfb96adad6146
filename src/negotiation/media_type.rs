//! Media type parsing, wildcard matching and specificity.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

const WILDCARD: &str = "*";

/// A parsed `type/subtype[; key=value]*` media type.
///
/// Type, subtype and parameter keys are lower-cased. Parameter values are
/// trimmed and unquoted but otherwise kept verbatim, in header order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaType {
    type_: String,
    subtype: String,
    params: Vec<(String, String)>,
}

impl MediaType {
    /// `*/*`
    pub fn any() -> Self {
        Self { type_: WILDCARD.to_owned(), subtype: WILDCARD.to_owned(), params: Vec::new() }
    }

    pub fn parse(text: &str) -> Result<Self, Error> {
        let malformed = || Error::MalformedMediaType(text.to_owned());

        let mut parts = text.split(';');
        let essence = parts.next().unwrap_or_default();
        let (type_, subtype) = essence.split_once('/').ok_or_else(malformed)?;
        let type_ = type_.trim().to_ascii_lowercase();
        let subtype = subtype.trim().to_ascii_lowercase();

        if type_.is_empty() || subtype.is_empty() || subtype.contains('/') {
            return Err(malformed());
        }
        // `*/json` names no real family of types.
        if type_ == WILDCARD && subtype != WILDCARD {
            return Err(malformed());
        }

        let mut params = Vec::new();
        for param in parts {
            if param.trim().is_empty() {
                continue;
            }
            let (key, value) = param.split_once('=').ok_or_else(malformed)?;
            let key = key.trim().to_ascii_lowercase();
            if key.is_empty() {
                return Err(malformed());
            }
            let value = value.trim();
            let value = match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
                Some(quoted) => unescape(quoted),
                None => value.to_owned(),
            };
            params.push((key, value));
        }

        Ok(Self { type_, subtype, params })
    }

    pub fn type_(&self) -> &str { &self.type_ }
    pub fn subtype(&self) -> &str { &self.subtype }
    pub fn params(&self) -> &[(String, String)] { &self.params }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Removes and returns a parameter (used to pull `q` out of Accept tokens).
    pub(crate) fn take_param(&mut self, key: &str) -> Option<String> {
        let idx = self.params.iter().position(|(k, _)| k == key)?;
        Some(self.params.remove(idx).1)
    }

    /// Specificity rank: `type/subtype;params` 3, `type/subtype` 2,
    /// `type/*` 1, `*/*` 0.
    pub fn precedence(&self) -> u8 {
        if self.type_ == WILDCARD {
            0
        } else if self.subtype == WILDCARD {
            1
        } else if self.params.is_empty() {
            2
        } else {
            3
        }
    }

    /// Does `candidate` satisfy `self` used as a pattern?
    ///
    /// A wildcard on either side matches anything in that position, so a
    /// registered `application/json` matches a client's `*/*` and vice versa.
    /// Every parameter of the pattern must appear on the candidate with an
    /// equal value; extra candidate parameters are ignored.
    pub fn matches(&self, candidate: &MediaType) -> bool {
        let part = |a: &str, b: &str| a == WILDCARD || b == WILDCARD || a == b;

        part(&self.type_, &candidate.type_)
            && part(&self.subtype, &candidate.subtype)
            && self.params.iter().all(|(key, value)| candidate.param(key) == Some(value.as_str()))
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_, self.subtype)?;
        for (key, value) in &self.params {
            if is_token(value) {
                write!(f, "; {key}={value}")?;
            } else {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "; {key}=\"{escaped}\"")?;
            }
        }
        Ok(())
    }
}

/// RFC 7230 `token`: non-empty, visible ASCII minus separators.
fn is_token(value: &str) -> bool {
    !value.is_empty()
        && value.bytes().all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

/// Undo `quoted-pair` escapes inside a quoted parameter value.
fn unescape(quoted: &str) -> String {
    let mut out = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mt(s: &str) -> MediaType {
        s.parse().unwrap()
    }

    #[test]
    fn parses_type_subtype_and_params() {
        let m = mt(" Text/HTML ; Charset = \"utf-8\" ; level=1");
        assert_eq!(m.type_(), "text");
        assert_eq!(m.subtype(), "html");
        assert_eq!(m.param("charset"), Some("utf-8"));
        assert_eq!(m.param("level"), Some("1"));
        assert_eq!(m.to_string(), "text/html; charset=utf-8; level=1");
    }

    #[test]
    fn non_token_values_are_quoted_again() {
        let m = mt(r#"text/plain; x="a b"; y="say \"hi\""; z="tok""#);
        assert_eq!(m.param("x"), Some("a b"));
        assert_eq!(m.param("y"), Some(r#"say "hi""#));
        assert_eq!(m.to_string(), r#"text/plain; x="a b"; y="say \"hi\""; z=tok"#);
        assert_eq!(mt(&m.to_string()), m);
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["json", "", "/json", "text/", "*/json", "text/html; charset", "a/b/c", "text/html; =x"] {
            assert!(
                matches!(MediaType::parse(bad), Err(Error::MalformedMediaType(_))),
                "{bad:?} should be rejected",
            );
        }
    }

    #[test]
    fn accepts_wildcards() {
        assert_eq!(mt("*/*"), MediaType::any());
        assert_eq!(mt("text/*").subtype(), "*");
    }

    #[test]
    fn precedence_ranks_specificity() {
        assert_eq!(mt("application/json; indent=4").precedence(), 3);
        assert_eq!(mt("application/json").precedence(), 2);
        assert_eq!(mt("application/*").precedence(), 1);
        assert_eq!(mt("*/*").precedence(), 0);
    }

    #[test]
    fn wildcards_match_in_either_direction() {
        assert!(mt("application/json").matches(&mt("*/*")));
        assert!(mt("application/json").matches(&mt("application/*")));
        assert!(mt("*/*").matches(&mt("text/html")));
        assert!(mt("text/*").matches(&mt("text/html")));
        assert!(!mt("text/*").matches(&mt("application/json")));
        assert!(!mt("application/json").matches(&mt("text/*")));
    }

    #[test]
    fn pattern_params_must_be_satisfied() {
        let pattern = mt("text/html; charset=utf-8");
        assert!(pattern.matches(&mt("text/html; charset=utf-8; level=1")));
        assert!(!pattern.matches(&mt("text/html")));
        assert!(!pattern.matches(&mt("text/html; charset=latin-1")));
        // Extra candidate params are ignored.
        assert!(mt("text/html").matches(&mt("text/html; charset=utf-8")));
    }

    #[test]
    fn take_param_removes_it() {
        let mut m = mt("text/html; q=0.5; level=1");
        assert_eq!(m.take_param("q").as_deref(), Some("0.5"));
        assert_eq!(m.to_string(), "text/html; level=1");
        assert_eq!(m.take_param("q"), None);
    }
}
