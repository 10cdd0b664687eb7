use url::Url;

/// Extracts the lowercase host of a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use catalog_sweep::url::extract_domain;
///
/// let url = Url::parse("https://SHOP.example.com/catalogue/").unwrap();
/// assert_eq!(extract_domain(&url), Some("shop.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks if a domain matches a pattern
///
/// `"shop.com"` matches only itself; `"*.shop.com"` matches `shop.com` and any
/// subdomain of it. The candidate is expected in lowercase.
///
/// ```
/// use catalog_sweep::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.shop.com", "shop.com"));
/// assert!(matches_wildcard("*.shop.com", "img.cdn.shop.com"));
/// assert!(!matches_wildcard("*.shop.com", "myshop.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|rest| rest.ends_with('.'))
        }
        None => candidate == pattern,
    }
}

/// Returns true if the URL's host is covered by one of the patterns
///
/// An empty pattern list allows every host.
pub fn is_allowed_domain(url: &Url, patterns: &[String]) -> bool {
    if patterns.is_empty() {
        return true;
    }

    match extract_domain(url) {
        Some(domain) => patterns
            .iter()
            .any(|pattern| matches_wildcard(&pattern.to_lowercase(), &domain)),
        None => false,
    }
}
