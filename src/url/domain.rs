use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use shelf_sweep::url::extract_domain;
///
/// let url = Url::parse("https://Shop.Example.com/product/tea/").unwrap();
/// assert_eq!(extract_domain(&url), Some("shop.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true when `candidate` belongs to the same storefront as `base`
///
/// Hosts are compared case-insensitively with any `www.` prefix ignored, and
/// the effective ports must agree.
pub fn same_site(base: &Url, candidate: &Url) -> bool {
    let (Some(a), Some(b)) = (extract_domain(base), extract_domain(candidate)) else {
        return false;
    };

    strip_www(&a) == strip_www(&b)
        && base.port_or_known_default() == candidate.port_or_known_default()
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
