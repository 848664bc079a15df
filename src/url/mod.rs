//! URL handling module for Shelf-Sweep
//!
//! This module provides URL normalization, same-site checks, link resolution
//! and the small path helpers used to name categories and synthesize SKUs.

mod domain;
mod normalize;

pub use domain::{extract_domain, same_site};
pub use normalize::normalize_url;

use url::Url;

/// Resolves a link href against the page it appeared on
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only (same page) anchors
/// - invalid URLs or non-HTTP(S) URLs after resolution
///
/// Protocol-relative (`//cdn.example.com/a.jpg`) and root-relative (`/a.jpg`)
/// references resolve against the page's scheme and host.
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        _ => None,
    }
}

/// Returns the non-empty path segments of a URL
pub fn path_segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Returns the last non-empty path segment of a URL
pub fn last_path_segment(url: &Url) -> Option<String> {
    path_segments(url).pop()
}

/// Turns a URL slug into a display label
///
/// # Examples
///
/// ```
/// use shelf_sweep::url::humanize_segment;
///
/// assert_eq!(humanize_segment("herbal-teas"), "Herbal Teas");
/// assert_eq!(humanize_segment("vitamins_and%20minerals"), "Vitamins And Minerals");
/// ```
pub fn humanize_segment(segment: &str) -> String {
    let decoded = segment.replace("%20", " ");
    decoded
        .split(|c: char| c == '-' || c == '_' || c == '+' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns a copy of `url` with the query parameter `key` set to `value`
///
/// Any existing occurrence of the key is replaced; other parameters are kept.
pub fn with_query_param(url: &Url, key: &str, value: &str) -> Url {
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut result = url.clone();
    result.set_fragment(None);
    {
        let mut pairs = result.query_pairs_mut();
        pairs.clear();
        for (k, v) in &retained {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(key, value);
    }
    result
}
