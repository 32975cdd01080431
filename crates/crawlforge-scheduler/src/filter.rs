use regex::RegexSet;

/// Allowed-domains whitelist plus blocked-pattern blocklist, applied before
/// a request ever reaches the seen-set.
pub struct UrlFilter {
    allowed_domains: Vec<String>,
    blocked: Option<RegexSet>,
    max_depth: u32,
}

impl UrlFilter {
    pub fn new(allowed_domains: Vec<String>, blocked_patterns: &[String], max_depth: u32) -> Self {
        let blocked = if blocked_patterns.is_empty() {
            None
        } else {
            RegexSet::new(blocked_patterns).ok()
        };
        Self {
            allowed_domains,
            blocked,
            max_depth,
        }
    }

    /// True if `host` is permitted and `depth` is within bound and `url`
    /// does not match any blocked pattern.
    pub fn accepts(&self, url: &str, host: &str, depth: u32) -> bool {
        if depth > self.max_depth {
            return false;
        }
        if !self.allowed_domains.is_empty()
            && !self.allowed_domains.iter().any(|d| host == d || host.ends_with(&format!(".{d}")))
        {
            return false;
        }
        if let Some(set) = &self.blocked {
            if set.is_match(url) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allowlist_permits_any_host() {
        let filter = UrlFilter::new(Vec::new(), &[], 5);
        assert!(filter.accepts("https://example.com/a", "example.com", 0));
    }

    #[test]
    fn allowlist_permits_subdomains() {
        let filter = UrlFilter::new(vec!["example.com".into()], &[], 5);
        assert!(filter.accepts("https://blog.example.com/a", "blog.example.com", 0));
        assert!(!filter.accepts("https://other.com/a", "other.com", 0));
    }

    #[test]
    fn depth_beyond_max_is_rejected() {
        let filter = UrlFilter::new(Vec::new(), &[], 1);
        assert!(filter.accepts("https://example.com/a", "example.com", 1));
        assert!(!filter.accepts("https://example.com/a", "example.com", 2));
    }

    #[test]
    fn blocked_pattern_rejects_match() {
        let filter = UrlFilter::new(Vec::new(), &["/admin".to_string()], 5);
        assert!(!filter.accepts("https://example.com/admin/login", "example.com", 0));
        assert!(filter.accepts("https://example.com/public", "example.com", 0));
    }
}
