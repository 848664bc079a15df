//! Small helpers over `scraper` shared by the classifier and the extractors

use scraper::{ElementRef, Html, Selector};

/// Parses a CSS selector, returning None for an invalid one
pub(crate) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Returns the element's text with whitespace runs collapsed to single spaces
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Collapses whitespace runs to single spaces and trims the ends
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the text of the first non-empty element matching `selectors`
pub(crate) fn first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|css| {
        let sel = selector(css)?;
        document
            .select(&sel)
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}

/// Returns true when the document has at least one element matching `css`
pub(crate) fn exists(document: &Html, css: &str) -> bool {
    selector(css).is_some_and(|sel| document.select(&sel).next().is_some())
}

/// Reads a `<meta>` tag's content by `property` or `name`
pub(crate) fn meta_content(document: &Html, key: &str) -> Option<String> {
    let css = format!("meta[property='{key}'], meta[name='{key}'], meta[itemprop='{key}']");
    let sel = selector(&css)?;
    document
        .select(&sel)
        .filter_map(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .find(|content| !content.is_empty())
}

/// Returns the primary heading of the page
pub(crate) fn primary_heading(document: &Html) -> Option<String> {
    first_text(document, &["h1"])
}

/// Returns true when the element or one of its ancestors is hidden
///
/// Hidden means a `hidden` or `aria-hidden="true"` attribute, an inline
/// `display:none`, or a `hidden`/`d-none` class.
pub(crate) fn is_hidden(element: ElementRef<'_>) -> bool {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|el| {
            let value = el.value();
            if value.attr("hidden").is_some() || value.attr("aria-hidden") == Some("true") {
                return true;
            }
            if value
                .attr("style")
                .map(|style| style.replace(' ', "").to_ascii_lowercase())
                .is_some_and(|style| style.contains("display:none"))
            {
                return true;
            }
            value.classes().any(|c| c == "hidden" || c == "d-none")
        })
}

/// Returns true when one of the element's ancestors carries any of `classes`
pub(crate) fn has_ancestor_class(element: ElementRef<'_>, classes: &[&str]) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().classes().any(|c| classes.contains(&c)))
}
