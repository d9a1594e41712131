// ABOUTME: Block extraction: locating candidate review units in a listing page.
// ABOUTME: Four strategies run in priority order, from pinned markup down to plain-text salvage.

//! Review block extraction.
//!
//! A page is split into [`RawBlock`]s by the first strategy that finds any:
//!
//! 1. [`ContainerSelector::primary`]: containers with the pinned `RHo1pe` class.
//! 2. [`ContainerSelector::alternative`]: containers with `jscontroller` and
//!    `data-review-id` attributes, for when the class name churns.
//! 3. [`StructuredData`]: schema.org review objects embedded as JSON.
//! 4. [`TextSpans`]: text-only spans of plausible review length.
//!
//! Ordering goes from structurally precise to heuristic salvage. A strategy
//! further down is never invoked once one above it has produced a block.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde_json::{Map, Value};

use crate::extractors::chain::{FallbackChain, Strategy};
use crate::extractors::compiled::get_or_compile;
use crate::extractors::fields::{element_text, is_text_only, strip_html};

/// Class pinned on review containers in the current listing markup.
pub const PRIMARY_CONTAINER_SELECTOR: &str = "div.RHo1pe";

/// Attribute signature used by review containers when the class is missing.
pub const ALTERNATIVE_CONTAINER_SELECTOR: &str = "div[jscontroller][data-review-id]";

const LD_JSON_SELECTOR: &str = "script[type='application/ld+json']";

/// Inclusive character bounds for a salvaged text span.
pub const SPAN_MIN_CHARS: usize = 20;
pub const SPAN_MAX_CHARS: usize = 500;

static CALL_TO_ACTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(Download|Install|Get|Free|Paid)").unwrap());

static EMBEDDED_REVIEW_ARRAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""review"\s*:\s*\["#).unwrap());

/// A parsed listing page: the raw markup and its DOM.
pub struct Page {
    pub raw: String,
    pub doc: Html,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        Self {
            raw: html.to_string(),
            doc: Html::parse_document(html),
        }
    }
}

/// A review taken from embedded structured data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredReview {
    pub author: String,
    pub text: String,
    pub rating: u8,
    pub date_published: Option<String>,
}

/// An unparsed candidate believed to hold one review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawBlock {
    /// Inner HTML of a review container.
    Markup(String),
    /// A record lifted out of embedded JSON.
    Structured(StructuredReview),
    /// A salvaged text span; `ordinal` is 1-based among emitted spans.
    Span { ordinal: usize, text: String },
}

fn non_empty(blocks: Vec<RawBlock>) -> Option<Vec<RawBlock>> {
    if blocks.is_empty() {
        None
    } else {
        Some(blocks)
    }
}

/// Containers located by a CSS selector; each match is one markup fragment.
pub struct ContainerSelector {
    name: &'static str,
    css: &'static str,
}

impl ContainerSelector {
    pub fn new(name: &'static str, css: &'static str) -> Self {
        Self { name, css }
    }

    pub fn primary() -> Self {
        Self::new("primary-markup", PRIMARY_CONTAINER_SELECTOR)
    }

    pub fn alternative() -> Self {
        Self::new("alternative-markup", ALTERNATIVE_CONTAINER_SELECTOR)
    }
}

impl Strategy<Page, Vec<RawBlock>> for ContainerSelector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn try_extract(&self, page: &Page) -> Option<Vec<RawBlock>> {
        let sel = get_or_compile(self.css)?;
        let blocks = page
            .doc
            .select(&sel)
            .map(|el| RawBlock::Markup(el.inner_html()))
            .collect();
        non_empty(blocks)
    }
}

/// schema.org review objects embedded in the page as JSON.
///
/// `<script type="application/ld+json">` blocks are searched first; failing
/// that, the first `"review": [...]` array anywhere in the raw page is used.
pub struct StructuredData;

impl StructuredData {
    fn from_ld_json(page: &Page) -> Vec<StructuredReview> {
        let Some(sel) = get_or_compile(LD_JSON_SELECTOR) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for script in page.doc.select(&sel) {
            let text = script.text().collect::<String>();
            if let Ok(value) = serde_json::from_str::<Value>(&text) {
                collect_review_arrays(&value, &mut out);
            }
        }
        out
    }

    fn from_embedded_array(raw: &str) -> Vec<StructuredReview> {
        for m in EMBEDDED_REVIEW_ARRAY_RE.find_iter(raw) {
            // start at the opening bracket and let serde find the matching one
            let slice = &raw[m.end() - 1..];
            let mut stream = serde_json::Deserializer::from_str(slice).into_iter::<Value>();
            if let Some(Ok(Value::Array(items))) = stream.next() {
                let reviews: Vec<_> = items.iter().filter_map(structured_review).collect();
                if !reviews.is_empty() {
                    return reviews;
                }
            }
        }
        Vec::new()
    }
}

impl Strategy<Page, Vec<RawBlock>> for StructuredData {
    fn name(&self) -> &'static str {
        "structured-data"
    }

    fn try_extract(&self, page: &Page) -> Option<Vec<RawBlock>> {
        let mut reviews = Self::from_ld_json(page);
        if reviews.is_empty() {
            reviews = Self::from_embedded_array(&page.raw);
        }
        non_empty(reviews.into_iter().map(RawBlock::Structured).collect())
    }
}

/// Walks a JSON value and collects every valid review under a `review` key.
fn collect_review_arrays(value: &Value, out: &mut Vec<StructuredReview>) {
    match value {
        Value::Object(map) => {
            match map.get("review") {
                Some(Value::Array(items)) => {
                    out.extend(items.iter().filter_map(structured_review));
                }
                Some(single @ Value::Object(_)) => {
                    out.extend(structured_review(single));
                }
                _ => {}
            }
            for (key, v) in map {
                if key != "review" {
                    collect_review_arrays(v, out);
                }
            }
        }
        Value::Array(arr) => {
            for v in arr {
                collect_review_arrays(v, out);
            }
        }
        _ => {}
    }
}

/// Converts one JSON review object. Author, body and rating value must all be present.
fn structured_review(value: &Value) -> Option<StructuredReview> {
    let obj = value.as_object()?;
    let author = match obj.get("author")? {
        Value::String(s) => s.trim().to_string(),
        Value::Object(a) => a
            .get("name")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        _ => String::new(),
    };
    let text = strip_html(obj.get("reviewBody")?.as_str()?);
    let rating = rating_value(obj.get("reviewRating")?.as_object()?)?;
    let date_published = obj
        .get("datePublished")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(StructuredReview {
        author,
        text,
        rating,
        date_published,
    })
}

fn rating_value(rating: &Map<String, Value>) -> Option<u8> {
    let raw = match rating.get("ratingValue")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Some(raw.trunc().clamp(0.0, 5.0) as u8)
}

/// Last resort: text-only spans of review-like length that are not UI chrome.
pub struct TextSpans;

impl Strategy<Page, Vec<RawBlock>> for TextSpans {
    fn name(&self) -> &'static str {
        "text-spans"
    }

    fn try_extract(&self, page: &Page) -> Option<Vec<RawBlock>> {
        let sel = get_or_compile("span")?;
        let mut blocks = Vec::new();
        for el in page.doc.select(&sel) {
            if !is_text_only(&el) {
                continue;
            }
            let text = element_text(&el);
            let len = text.chars().count();
            if !(SPAN_MIN_CHARS..=SPAN_MAX_CHARS).contains(&len) {
                continue;
            }
            if CALL_TO_ACTION_RE.is_match(&text) {
                continue;
            }
            blocks.push(RawBlock::Span {
                ordinal: blocks.len() + 1,
                text,
            });
        }
        non_empty(blocks)
    }
}

/// The ordered block-extraction chain.
#[derive(Debug)]
pub struct BlockExtractor {
    chain: FallbackChain<Page, Vec<RawBlock>>,
}

impl BlockExtractor {
    /// The default four-strategy chain.
    pub fn new() -> Self {
        let chain = FallbackChain::new("blocks")
            .with(ContainerSelector::primary())
            .with(ContainerSelector::alternative())
            .with(StructuredData)
            .with(TextSpans);
        Self { chain }
    }

    /// Use a custom chain, e.g. with extra or instrumented strategies.
    pub fn with_chain(chain: FallbackChain<Page, Vec<RawBlock>>) -> Self {
        Self { chain }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.chain.names()
    }

    /// Candidate blocks from the first successful strategy; empty when all fail.
    pub fn extract(&self, page: &Page) -> Vec<RawBlock> {
        match self.chain.run_named(page) {
            Some((strategy, blocks)) => {
                tracing::debug!(strategy, count = blocks.len(), "extracted review blocks");
                blocks
            }
            None => Vec::new(),
        }
    }

    pub fn extract_html(&self, html: &str) -> Vec<RawBlock> {
        self.extract(&Page::parse(html))
    }
}

impl Default for BlockExtractor {
    fn default() -> Self {
        Self::new()
    }
}
