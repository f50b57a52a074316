/// Hostname normalization: turns a tab URL into the key time is tracked under
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Hosts that belong to the browser itself rather than to a website
const INTERNAL_HOSTS: &[&str] = &["about:blank", "newtab", "chrome://newtab/"];

/// A single label with no dot: bare internal names and extension ids
static BARE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("bare label pattern is valid"));

/// Normalized host component of a URL, the unit time is tracked under
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hostname(String);

impl Hostname {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Rebuild a key read back from storage. The key is already a host, so only the
    /// host rules apply; it is never re-parsed as a URL.
    pub fn from_stored(key: &str) -> Option<Hostname> {
        is_trackable_host(key).then(|| Hostname(key.to_string()))
    }

    /// Re-check the host rules on an already built key (keys restored from storage included)
    pub fn is_trackable(&self) -> bool {
        is_trackable_host(&self.0)
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Hostname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extract a trackable hostname from a raw tab URL
///
/// Algorithm:
/// 1. Parse the URL; a parse failure means "untrackable"
/// 2. Take the host component
/// 3. Reject empty hosts and browser-internal pages (new tab, blank)
/// 4. Reject single alphanumeric labels ("localhost", extension ids)
/// 5. Otherwise return the host unchanged, subdomain and TLD included
///
/// Examples:
/// - http://example.com/page → example.com
/// - https://mail.google.com/inbox?x=1 → mail.google.com
/// - chrome://newtab/ → None
/// - about:blank → None
pub fn normalize(url: &str) -> Option<Hostname> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?;

    if !is_trackable_host(host) {
        return None;
    }

    Some(Hostname(host.to_string()))
}

fn is_trackable_host(host: &str) -> bool {
    !(host.is_empty() || INTERNAL_HOSTS.contains(&host) || BARE_LABEL.is_match(host))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(s: &str) -> Option<String> {
        normalize(s).map(Hostname::into_string)
    }

    #[test]
    fn test_normalize_basic() {
        assert_eq!(host("http://example.com/page"), Some("example.com".to_string()));
        assert_eq!(host("https://example.com"), Some("example.com".to_string()));
    }

    #[test]
    fn test_normalize_keeps_subdomain() {
        assert_eq!(host("https://www.google.com/search?q=rust"), Some("www.google.com".to_string()));
        assert_eq!(host("https://mail.google.com/inbox"), Some("mail.google.com".to_string()));
        assert_eq!(host("https://news.bbc.co.uk/article"), Some("news.bbc.co.uk".to_string()));
    }

    #[test]
    fn test_normalize_ignores_path_and_port() {
        assert_eq!(host("https://github.com/rust-lang/rust"), host("https://github.com/"));
        assert_eq!(host("http://127.0.0.1:8080/admin"), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_normalize_internal_pages() {
        assert_eq!(host("about:blank"), None);
        assert_eq!(host("chrome://newtab/"), None);
        assert_eq!(host("chrome-extension://abcdefghijklmnop/newtab.html"), None);
    }

    #[test]
    fn test_normalize_single_label() {
        assert_eq!(host("http://localhost:3000"), None);
        assert_eq!(host("http://intranet/"), None);
    }

    #[test]
    fn test_normalize_malformed() {
        assert_eq!(host(""), None);
        assert_eq!(host("not a url"), None);
        assert_eq!(host("example.com"), None);
        assert_eq!(host("https://"), None);
    }

    #[test]
    fn test_normalize_does_not_case_fold_beyond_parser() {
        // the URL parser lowercases hosts of http(s) URLs; nothing else is stripped
        assert_eq!(host("https://Example.COM/"), Some("example.com".to_string()));
        assert_eq!(host("https://example.com./"), Some("example.com.".to_string()));
    }

    #[test]
    fn test_normalize_is_stable_when_reembedded() {
        for url in [
            "http://example.com/page",
            "https://sub.domain.example.org:8443/a/b?c=d",
            "https://192.168.1.1/",
        ] {
            let first = normalize(url).unwrap();
            let again = normalize(&format!("https://{}/", first)).unwrap();
            assert_eq!(first, again);
            assert_eq!(normalize(url), normalize(url));
        }
    }

    #[test]
    fn test_from_stored_keeps_key_verbatim() {
        // non-special schemes keep the host's case, and the stored key must match it
        let tracked = normalize("git://Example.com/repo").unwrap();
        assert_eq!(tracked.as_str(), "Example.com");
        assert_eq!(Hostname::from_stored("Example.com"), Some(tracked));

        assert_eq!(Hostname::from_stored("example.com"), normalize("https://example.com/"));
        assert_eq!(Hostname::from_stored("localhost"), None);
        assert_eq!(Hostname::from_stored("newtab"), None);
        assert_eq!(Hostname::from_stored(""), None);
    }

    #[test]
    fn test_restored_key_rechecked() {
        let restored: Hostname = serde_json::from_str("\"newtab\"").unwrap();
        assert!(!restored.is_trackable());
        assert!(normalize("https://example.com").unwrap().is_trackable());
    }

    #[test]
    fn test_hostname_serializes_as_string() {
        let h = normalize("https://example.com").unwrap();
        assert_eq!(serde_json::to_string(&h).unwrap(), "\"example.com\"");
    }
}
