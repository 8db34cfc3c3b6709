/// Recognizing AARP pages from tab URLs
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static SITE_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|\.)aarp\.org$").expect("site host pattern is valid")
});

/// Extract the lowercase hostname of a URL
///
/// Only http(s) URLs count; `chrome://` pages and the like have no
/// meaningful host for our purposes.
pub fn extract_hostname(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed.host_str().map(|host| host.to_lowercase())
}

/// Whether a URL points at aarp.org or one of its subdomains
pub fn is_site_url(url: &str) -> bool {
    extract_hostname(url).is_some_and(|host| SITE_HOST.is_match(&host))
}

/// Like `is_site_url`, for the optional URL chrome reports on a tab
pub fn is_site_tab_url(url: Option<&str>) -> bool {
    url.is_some_and(is_site_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_hostname() {
        assert_eq!(
            extract_hostname("https://www.aarp.org/rewards/"),
            Some("www.aarp.org".to_string())
        );
        assert_eq!(
            extract_hostname("https://Secure.AARP.org:443/login"),
            Some("secure.aarp.org".to_string())
        );
        assert_eq!(extract_hostname("chrome://extensions"), None);
        assert_eq!(extract_hostname(""), None);
        assert_eq!(extract_hostname("not-a-url"), None);
    }

    #[test]
    fn test_is_site_url() {
        assert!(is_site_url("https://www.aarp.org/"));
        assert!(is_site_url("https://aarp.org"));
        assert!(is_site_url("https://secure.aarp.org/applications/user/login"));
        assert!(is_site_url("http://stayingsharp.aarp.org/activities?id=1"));
    }

    #[test]
    fn test_is_site_url_rejects_lookalikes() {
        assert!(!is_site_url("https://notaarp.org/"));
        assert!(!is_site_url("https://aarp.org.example.com/"));
        assert!(!is_site_url("https://example.com/?next=aarp.org"));
    }

    #[test]
    fn test_is_site_tab_url_missing() {
        assert!(!is_site_tab_url(None));
        assert!(is_site_tab_url(Some("https://www.aarp.org/")));
    }
}
