//! Small typed helpers over `scraper` elements.
//!
//! Locators and extractors only talk to markup through these helpers, so the
//! meaning of "text of an element" is defined in exactly one place.

use scraper::{ElementRef, Selector};
use url::Url;

use crate::error::ScrapeError;

/// Parse a CSS selector, mapping failures into the crate error type.
pub fn css(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::ParseShape(format!("invalid CSS selector '{selector}': {e:?}")))
}

/// Concatenate every descendant text node in document order, then collapse
/// whitespace runs into single spaces and trim.
pub fn text_of(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in el.descendants() {
        if let Some(t) = node.value().as_text() {
            raw.push_str(t);
        }
    }
    clean_ws(&raw)
}

/// Text of the first descendant matching `sel`, if any and non-empty.
pub fn first_text(el: ElementRef<'_>, sel: &Selector) -> Option<String> {
    let t = text_of(el.select(sel).next()?);
    if t.is_empty() { None } else { Some(t) }
}

pub fn clean_ws(s: &str) -> String {
    let mut buf = String::with_capacity(s.len());
    let mut in_ws = false;
    for ch in s.chars() {
        if ch.is_whitespace() || ch == '\u{a0}' {
            if !in_ws {
                if !buf.is_empty() { buf.push(' '); }
                in_ws = true;
            }
        } else {
            buf.push(ch);
            in_ws = false;
        }
    }
    buf.trim_end().to_string()
}

/// Substring test on the raw class attribute (`contains(@class, ...)` semantics).
pub fn class_contains(el: ElementRef<'_>, needle: &str) -> bool {
    el.value().attr("class").is_some_and(|c| c.contains(needle))
}

/// Whole-token test on the class list.
pub fn has_class_token(el: ElementRef<'_>, token: &str) -> bool {
    el.value().classes().any(|c| c == token)
}

/// Direct element children whose tag name is one of `tags`.
pub fn child_elements<'a>(el: ElementRef<'a>, tags: &[&str]) -> Vec<ElementRef<'a>> {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(|c| tags.contains(&c.value().name()))
        .collect()
}

/// Row cells (`th` and `td`) in order.
pub fn cells<'a>(row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    child_elements(row, &["th", "td"])
}

pub fn absolute_url(base: &str, href: &str) -> String {
    match Url::parse(base).and_then(|b| b.join(href)) {
        Ok(u) => u.to_string(),
        Err(_) => href.to_string(),
    }
}

/// `"Jane Doe (Nonpartisan)"` -> `("Jane Doe", Some("Nonpartisan"))`.
pub fn split_trailing_parens(s: &str) -> (String, Option<String>) {
    let t = s.trim();
    if let Some(stripped) = t.strip_suffix(')') {
        if let Some(open) = stripped.rfind('(') {
            let inner = stripped[open + 1..].trim();
            let head = stripped[..open].trim();
            if !inner.is_empty() && !head.is_empty() {
                return (head.to_string(), Some(inner.to_string()));
            }
        }
    }
    (t.to_string(), None)
}

/// `"1,234"` -> 1234. Anything besides digits (after dropping commas and
/// spaces) yields `None`.
pub fn parse_int(s: &str) -> Option<u64> {
    let digits: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

pub fn parse_percent(s: &str) -> Option<f64> {
    let t = s.trim().trim_end_matches('%').trim();
    if t.is_empty() { return None; }
    t.parse().ok()
}
