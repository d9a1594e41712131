// ABOUTME: Pre-compiled CSS selector cache shared by every extraction strategy.
// ABOUTME: Selectors are parsed once and reused for each page and fragment.

//! Selector caching for repeated DOM queries.
//!
//! Strategies run once per page and once per review fragment, always with the
//! same handful of selectors. Parsing them each time is wasted work, so they are
//! compiled on first use and kept in a process-wide cache.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use scraper::Selector;

static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Option<Selector>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gets or compiles a CSS selector, caching the result.
///
/// Returns `None` for an invalid selector; invalid selectors are cached too.
pub fn get_or_compile(css: &str) -> Option<Selector> {
    if let Ok(cache) = SELECTOR_CACHE.read() {
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = Selector::parse(css).ok();
    if let Ok(mut cache) = SELECTOR_CACHE.write() {
        // another thread may have inserted while we were compiling
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
        cache.insert(css.to_string(), compiled.clone());
    }
    compiled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_selector_is_cached() {
        assert!(get_or_compile("div.RHo1pe").is_some());
        assert!(get_or_compile("div.RHo1pe").is_some());
    }

    #[test]
    fn invalid_selector_returns_none() {
        assert!(get_or_compile("[[[invalid").is_none());
        assert!(get_or_compile("[[[invalid").is_none());
    }

    #[test]
    fn attribute_selectors_compile() {
        assert!(get_or_compile("div[jscontroller][data-review-id]").is_some());
        assert!(get_or_compile("script[type='application/ld+json']").is_some());
    }
}
