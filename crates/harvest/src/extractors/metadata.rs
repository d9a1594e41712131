// ABOUTME: App metadata extraction from the landing page: name, developer, rating and rating count.
// ABOUTME: Each field runs a selector strategy first and a raw-markup capture second.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extractors::blocks::Page;
use crate::extractors::chain::{FallbackChain, Strategy};
use crate::extractors::compiled::get_or_compile;
use crate::extractors::fields::{element_text, extract_first_text};
use crate::models::{AppInfo, UNKNOWN_APP, UNKNOWN_DEVELOPER};

pub const TITLE_CLASS_SELECTOR: &str = "h1.Fd93Bb";
pub const DEVELOPER_CLASS_SELECTOR: &str = "div.Vbfug";
pub const DEVELOPER_LINK_SELECTOR: &str = "a.hrTbp";
pub const RATING_BADGE_SELECTOR: &str = "div.TT9eCd";
pub const RATING_COUNT_SELECTOR: &str = "div.EHUI5b";

static LEADING_FLOAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([0-9]+(?:\.[0-9]+)?)").unwrap());
static GROUPED_DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9][0-9,]*)").unwrap());
static RATING_VALUE_JSON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""ratingValue"\s*:\s*"?([0-9]+(?:\.[0-9]+)?)"#).unwrap());
static RATING_COUNT_JSON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""ratingCount"\s*:\s*"?([0-9]+)"#).unwrap());

fn parse_rating(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_count(s: &str) -> Option<u64> {
    s.replace(',', "").parse::<u64>().ok()
}

/// Non-empty text of the first element matching a selector.
pub struct PageText {
    name: &'static str,
    css: &'static str,
}

impl PageText {
    pub fn new(name: &'static str, css: &'static str) -> Self {
        Self { name, css }
    }
}

impl Strategy<Page, String> for PageText {
    fn name(&self) -> &'static str {
        self.name
    }

    fn try_extract(&self, page: &Page) -> Option<String> {
        extract_first_text(&page.doc, &[self.css])
    }
}

/// First capture of `re` within the text of elements matching `css`, then parsed.
pub struct SelectorCapture<T> {
    name: &'static str,
    css: &'static str,
    re: &'static Lazy<Regex>,
    parse: fn(&str) -> Option<T>,
}

impl<T> SelectorCapture<T> {
    pub fn new(
        name: &'static str,
        css: &'static str,
        re: &'static Lazy<Regex>,
        parse: fn(&str) -> Option<T>,
    ) -> Self {
        Self { name, css, re, parse }
    }
}

impl<T> Strategy<Page, T> for SelectorCapture<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn try_extract(&self, page: &Page) -> Option<T> {
        let sel = get_or_compile(self.css)?;
        page.doc.select(&sel).find_map(|el| {
            let text = element_text(&el);
            let caps = self.re.captures(&text)?;
            (self.parse)(caps.get(1)?.as_str())
        })
    }
}

/// First capture of `re` anywhere in the raw markup, then parsed.
pub struct RawCapture<T> {
    name: &'static str,
    re: &'static Lazy<Regex>,
    parse: fn(&str) -> Option<T>,
}

impl<T> RawCapture<T> {
    pub fn new(name: &'static str, re: &'static Lazy<Regex>, parse: fn(&str) -> Option<T>) -> Self {
        Self { name, re, parse }
    }
}

impl<T> Strategy<Page, T> for RawCapture<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn try_extract(&self, page: &Page) -> Option<T> {
        self.re
            .captures_iter(&page.raw)
            .find_map(|caps| (self.parse)(caps.get(1)?.as_str()))
    }
}

/// Extracts [`AppInfo`] from a landing page.
///
/// Extraction never fails; fields with no match keep their defaults.
pub struct AppInfoExtractor {
    name: FallbackChain<Page, String>,
    developer: FallbackChain<Page, String>,
    rating: FallbackChain<Page, f64>,
    rating_count: FallbackChain<Page, u64>,
}

impl AppInfoExtractor {
    pub fn new() -> Self {
        Self {
            name: FallbackChain::new("app-name")
                .with(PageText::new("title-class", TITLE_CLASS_SELECTOR))
                .with(PageText::new("any-h1", "h1")),
            developer: FallbackChain::new("developer")
                .with(PageText::new("developer-class", DEVELOPER_CLASS_SELECTOR))
                .with(PageText::new("developer-link", DEVELOPER_LINK_SELECTOR)),
            rating: FallbackChain::new("rating")
                .with(SelectorCapture::new(
                    "rating-badge",
                    RATING_BADGE_SELECTOR,
                    &LEADING_FLOAT_RE,
                    parse_rating,
                ))
                .with(RawCapture::new("rating-json", &RATING_VALUE_JSON_RE, parse_rating)),
            rating_count: FallbackChain::new("rating-count")
                .with(SelectorCapture::new(
                    "count-badge",
                    RATING_COUNT_SELECTOR,
                    &GROUPED_DIGITS_RE,
                    parse_count,
                ))
                .with(RawCapture::new("count-json", &RATING_COUNT_JSON_RE, parse_count)),
        }
    }

    pub fn extract(&self, page: &Page) -> AppInfo {
        let info = AppInfo {
            name: self.name.run(page).unwrap_or_else(|| UNKNOWN_APP.to_string()),
            developer: self
                .developer
                .run(page)
                .unwrap_or_else(|| UNKNOWN_DEVELOPER.to_string()),
            rating: self.rating.run(page),
            rating_count: self.rating_count.run(page),
        };
        if info.is_empty() {
            tracing::debug!("no app metadata recognized on landing page");
        }
        info
    }

    pub fn extract_html(&self, html: &str) -> AppInfo {
        self.extract(&Page::parse(html))
    }
}

impl Default for AppInfoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience wrapper over [`AppInfoExtractor::extract_html`].
pub fn extract_app_info(html: &str) -> AppInfo {
    AppInfoExtractor::new().extract_html(html)
}
