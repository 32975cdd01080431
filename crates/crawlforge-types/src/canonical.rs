use serde::{Deserialize, Serialize};
use url::Url;

/// A URL after canonicalization: lowercased scheme+host, sorted query
/// parameters, fragment stripped. Used as the scheduler's seen-set key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse and canonicalize `raw`, returning `None` if it does not parse as an
/// absolute URL.
pub fn canonicalize(raw: &str) -> Option<CanonicalUrl> {
    let mut url = Url::parse(raw).ok()?;
    if !url.has_host() {
        return None;
    }
    url.set_fragment(None);

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();

    let scheme = url.scheme().to_ascii_lowercase();
    let host = url.host_str()?.to_ascii_lowercase();
    let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
    let path = if url.path().is_empty() { "/" } else { url.path() };

    let query = if pairs.is_empty() {
        String::new()
    } else {
        let joined = pairs
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("?{joined}")
    };

    Some(CanonicalUrl(format!(
        "{scheme}://{host}{port}{path}{query}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_scheme_and_host() {
        let a = canonicalize("HTTPS://Example.COM/Path").unwrap();
        let b = canonicalize("https://example.com/Path").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn strips_fragment() {
        let a = canonicalize("https://example.com/path#section").unwrap();
        let b = canonicalize("https://example.com/path").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sorts_query_parameters() {
        let a = canonicalize("https://example.com/?b=2&a=1").unwrap();
        let b = canonicalize("https://example.com/?a=1&b=2").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_unparseable_urls() {
        assert!(canonicalize("not a url").is_none());
        assert!(canonicalize("").is_none());
    }
}
