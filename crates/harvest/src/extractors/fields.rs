// ABOUTME: DOM helpers for pulling text and attributes out of pages and review fragments.
// ABOUTME: Selectors are tried in order; the first non-empty match wins.

//! Selector-based text and attribute helpers.
//!
//! Key behaviors:
//! - Selectors are tried in order; first non-empty match wins.
//! - Whitespace is normalized (collapsed to single spaces, trimmed).
//! - Empty strings are treated as no match.

use scraper::{ElementRef, Html};

use crate::extractors::compiled::get_or_compile;

/// Collapses runs of whitespace into single spaces and trims.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Inner text of an element with markup stripped and whitespace normalized.
pub fn element_text(el: &ElementRef<'_>) -> String {
    let text: String = el.text().collect::<Vec<_>>().join(" ");
    normalize_whitespace(&text)
}

/// True when the element has no element children, only text.
pub fn is_text_only(el: &ElementRef<'_>) -> bool {
    !el.children().any(|child| child.value().is_element())
}

/// Plain text of an HTML snippet. Tags are dropped and entities decoded.
pub fn strip_html(s: &str) -> String {
    let frag = Html::parse_fragment(s);
    element_text(&frag.root_element())
}

/// Text of the first element matching any selector, in selector order.
pub fn extract_first_text(doc: &Html, selectors: &[&str]) -> Option<String> {
    extract_first_text_min(doc, selectors, 1)
}

/// Like [`extract_first_text`] but skips matches shorter than `min_chars`.
pub fn extract_first_text_min(doc: &Html, selectors: &[&str], min_chars: usize) -> Option<String> {
    for &css in selectors {
        let Some(sel) = get_or_compile(css) else {
            continue;
        };
        for el in doc.select(&sel) {
            let text = element_text(&el);
            if !text.is_empty() && text.chars().count() >= min_chars {
                return Some(text);
            }
        }
    }
    None
}

/// Attribute value from the first matching element that has it non-empty.
pub fn extract_first_attr(doc: &Html, selectors: &[&str], attr: &str) -> Option<String> {
    for &css in selectors {
        let Some(sel) = get_or_compile(css) else {
            continue;
        };
        for el in doc.select(&sel) {
            if let Some(value) = el.value().attr(attr) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}
