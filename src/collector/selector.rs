//! CSS paths for shifted elements, computed over a parsed DOM snapshot.
//!
//! The in-page recorder builds the same paths from live nodes. Each level is
//! `tag[#id][.class...][:nth-child(n)]`, joined with ` > ` and rooted at the
//! document element. `:nth-child` is only emitted when the parent has more
//! than one child element with the same tag, which keeps paths short while
//! still designating exactly one element.

use log::debug;
use scraper::{ElementRef, Html, Selector};

use crate::{Error, Result};

/// Build the CSS path of `element`
pub fn css_path(element: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    let mut current = element;

    while let Some(parent) = current.parent().and_then(ElementRef::wrap) {
        parts.push(level(current, parent));
        current = parent;
    }
    // `current` is now the document element
    parts.push(current.value().name().to_string());
    parts.reverse();
    parts.join(" > ")
}

fn level(element: ElementRef<'_>, parent: ElementRef<'_>) -> String {
    let tag = element.value().name();
    let mut part = tag.to_string();

    if let Some(id) = element.value().id().filter(|id| !id.is_empty()) {
        part.push('#');
        part.push_str(&escape_ident(id));
    }
    for class in classes(element) {
        part.push('.');
        part.push_str(&escape_ident(class));
    }

    let siblings: Vec<ElementRef<'_>> = parent.children().filter_map(ElementRef::wrap).collect();
    let same_tag = siblings.iter().filter(|s| s.value().name() == tag).count();
    if same_tag > 1 {
        if let Some(index) = siblings.iter().position(|s| s.id() == element.id()) {
            part.push_str(&format!(":nth-child({})", index + 1));
        }
    }
    part
}

// Document order with duplicates removed, like `Element.classList`
fn classes<'a>(element: ElementRef<'a>) -> Vec<&'a str> {
    let mut seen: Vec<&'a str> = Vec::new();
    for class in element.value().attr("class").unwrap_or("").split_ascii_whitespace() {
        if !seen.contains(&class) {
            seen.push(class);
        }
    }
    seen
}

/// Escape an identifier the way `CSS.escape` does for the common cases
pub fn escape_ident(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    for (i, c) in ident.chars().enumerate() {
        let leading_digit = c.is_ascii_digit() && (i == 0 || (i == 1 && ident.starts_with('-')));
        if leading_digit {
            out.push_str(&format!("\\{:x} ", c as u32));
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    if out == "-" {
        return "\\-".to_string();
    }
    out
}

/// Find the single element a selector designates in `document`.
///
/// Returns `Ok(None)` when nothing or more than one element matches.
pub fn resolve_selector<'a>(document: &'a Html, selector: &str) -> Result<Option<ElementRef<'a>>> {
    let parsed = Selector::parse(selector)
        .map_err(|e| Error::Other(format!("invalid selector '{}': {:?}", selector, e)))?;
    let mut matches = document.select(&parsed);
    let first = matches.next();
    if first.is_some() && matches.next().is_some() {
        debug!("selector '{}' is ambiguous in snapshot", selector);
        return Ok(None);
    }
    Ok(first)
}

/// Selectors from `selectors` that no longer designate exactly one element
pub fn unresolved<'s, I>(document: &Html, selectors: I) -> Vec<&'s str>
where
    I: IntoIterator<Item = &'s str>,
{
    selectors
        .into_iter()
        .filter(|s| !matches!(resolve_selector(document, s), Ok(Some(_))))
        .collect()
}
