// ABOUTME: Field parsing that turns raw review blocks into normalized Review records.
// ABOUTME: Each field has its own ordered fallback chain and an explicit default.

//! Review field parsing.
//!
//! Markup fragments run through one [`FallbackChain`] per field. Structured and
//! span blocks bypass the chains for the fields they already carry. Every path
//! ends in the same validation: a review without at least
//! [`FieldDefaults::min_text_len`] + 1 characters of text is dropped.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

use crate::date::{find_date, parse_iso_date, today, DATE_FORMAT};
use crate::extractors::blocks::{RawBlock, StructuredReview};
use crate::extractors::chain::{FallbackChain, Strategy};
use crate::extractors::compiled::get_or_compile;
use crate::extractors::fields::{element_text, extract_first_text_min};
use crate::models::Review;

pub const AUTHOR_CLASS_SELECTOR: &str = "span.X43Kjb";
pub const TEXT_ATTR_SELECTOR: &str = "span[jscontroller]";
pub const TEXT_CLASS_SELECTOR: &str = "div.UD7Dzf";

/// Minimum characters for a text sub-pattern to count as review text.
pub const MIN_FIELD_TEXT_CHARS: usize = 20;

static CAPITALIZED_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-z]+ [A-Z][a-z]+$").unwrap());
static ARIA_STAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*([0-5])\s*star").unwrap());
static RATING_VALUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""ratingValue"\s*:\s*"?([0-5])"#).unwrap());

/// Values used when a field cannot be recovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefaults {
    pub author: String,
    /// Rating for markup fragments without a recognizable rating.
    pub markup_rating: u8,
    /// Fixed rating for salvaged text spans.
    pub span_rating: u8,
    /// Trimmed text must be strictly longer than this.
    pub min_text_len: usize,
}

impl Default for FieldDefaults {
    fn default() -> Self {
        Self {
            author: "Anonymous".to_string(),
            markup_rating: 5,
            span_rating: 3,
            min_text_len: 10,
        }
    }
}

/// One review container, parsed as its own DOM.
pub struct Fragment {
    pub raw: String,
    pub doc: Html,
}

impl Fragment {
    pub fn parse(html: &str) -> Self {
        Self {
            raw: html.to_string(),
            doc: Html::parse_fragment(html),
        }
    }

    fn text(&self) -> String {
        element_text(&self.doc.root_element())
    }
}

/// Text of the first element matching `css` with at least `min_chars` characters.
pub struct SelectorText {
    name: &'static str,
    css: &'static str,
    min_chars: usize,
}

impl SelectorText {
    pub fn new(name: &'static str, css: &'static str, min_chars: usize) -> Self {
        Self {
            name,
            css,
            min_chars,
        }
    }
}

impl Strategy<Fragment, String> for SelectorText {
    fn name(&self) -> &'static str {
        self.name
    }

    fn try_extract(&self, frag: &Fragment) -> Option<String> {
        extract_first_text_min(&frag.doc, &[self.css], self.min_chars.max(1))
    }
}

/// A span whose whole text looks like "First Last".
pub struct CapitalizedName;

impl Strategy<Fragment, String> for CapitalizedName {
    fn name(&self) -> &'static str {
        "capitalized-name"
    }

    fn try_extract(&self, frag: &Fragment) -> Option<String> {
        let sel = get_or_compile("span")?;
        frag.doc
            .select(&sel)
            .map(|el| element_text(&el))
            .find(|text| CAPITALIZED_NAME_RE.is_match(text))
    }
}

/// An accessibility label such as `aria-label="4 stars"`.
pub struct AriaLabelRating;

impl Strategy<Fragment, u8> for AriaLabelRating {
    fn name(&self) -> &'static str {
        "aria-label"
    }

    fn try_extract(&self, frag: &Fragment) -> Option<u8> {
        let sel = get_or_compile("[aria-label]")?;
        frag.doc.select(&sel).find_map(|el| {
            let label = el.value().attr("aria-label")?;
            ARIA_STAR_RE.captures(label)?.get(1)?.as_str().parse().ok()
        })
    }
}

/// An embedded `"ratingValue": N` field anywhere in the fragment.
pub struct EmbeddedRatingValue;

impl Strategy<Fragment, u8> for EmbeddedRatingValue {
    fn name(&self) -> &'static str {
        "rating-value"
    }

    fn try_extract(&self, frag: &Fragment) -> Option<u8> {
        RATING_VALUE_RE.captures(&frag.raw)?.get(1)?.as_str().parse().ok()
    }
}

/// A "5 Jan 2024" style date in the fragment text.
pub struct DayMonthYear;

impl Strategy<Fragment, String> for DayMonthYear {
    fn name(&self) -> &'static str {
        "day-month-year"
    }

    fn try_extract(&self, frag: &Fragment) -> Option<String> {
        find_date(&frag.text())
    }
}

/// Turns raw blocks into validated [`Review`]s.
#[derive(Debug)]
pub struct ReviewParser {
    defaults: FieldDefaults,
    /// Pinned fallback date; `None` means the date at parse time.
    pinned_today: Option<String>,
    author: FallbackChain<Fragment, String>,
    text: FallbackChain<Fragment, String>,
    rating: FallbackChain<Fragment, u8>,
    date: FallbackChain<Fragment, String>,
}

impl ReviewParser {
    pub fn new(defaults: FieldDefaults) -> Self {
        Self {
            defaults,
            pinned_today: None,
            author: FallbackChain::new("author")
                .with(SelectorText::new("author-class", AUTHOR_CLASS_SELECTOR, 1))
                .with(CapitalizedName),
            text: FallbackChain::new("text")
                .with(SelectorText::new(
                    "text-attr",
                    TEXT_ATTR_SELECTOR,
                    MIN_FIELD_TEXT_CHARS,
                ))
                .with(SelectorText::new(
                    "text-class",
                    TEXT_CLASS_SELECTOR,
                    MIN_FIELD_TEXT_CHARS,
                )),
            rating: FallbackChain::new("rating")
                .with(AriaLabelRating)
                .with(EmbeddedRatingValue),
            date: FallbackChain::new("date").with(DayMonthYear),
        }
    }

    /// Pin the date used for reviews without a recognizable date.
    pub fn with_today(mut self, date: NaiveDate) -> Self {
        self.pinned_today = Some(date.format(DATE_FORMAT).to_string());
        self
    }

    /// Date stamped on reviews without a recognizable date.
    pub fn fallback_date(&self) -> String {
        match &self.pinned_today {
            Some(date) => date.clone(),
            None => today().format(DATE_FORMAT).to_string(),
        }
    }

    pub fn defaults(&self) -> &FieldDefaults {
        &self.defaults
    }

    /// Parse every block, silently dropping the ones that fail validation.
    pub fn parse_all(&self, blocks: &[RawBlock]) -> Vec<Review> {
        let reviews: Vec<Review> = blocks.iter().filter_map(|b| self.parse(b)).collect();
        if reviews.len() < blocks.len() {
            tracing::debug!(
                rejected = blocks.len() - reviews.len(),
                kept = reviews.len(),
                "dropped blocks without usable review text"
            );
        }
        reviews
    }

    /// Parse one block. `None` means the block was not actually a review.
    pub fn parse(&self, block: &RawBlock) -> Option<Review> {
        let review = match block {
            RawBlock::Markup(html) => self.parse_markup(html),
            RawBlock::Structured(s) => self.from_structured(s),
            RawBlock::Span { ordinal, text } => Review {
                author: format!("User {}", ordinal),
                text: text.trim().to_string(),
                rating: self.defaults.span_rating,
                date: self.fallback_date(),
            },
        };
        self.validate(review)
    }

    fn parse_markup(&self, html: &str) -> Review {
        let frag = Fragment::parse(html);
        Review {
            author: self
                .author
                .run(&frag)
                .unwrap_or_else(|| self.defaults.author.clone()),
            text: self.text.run(&frag).unwrap_or_default(),
            rating: self.rating.run(&frag).unwrap_or(self.defaults.markup_rating),
            date: self.date.run(&frag).unwrap_or_else(|| self.fallback_date()),
        }
    }

    fn from_structured(&self, s: &StructuredReview) -> Review {
        let author = if s.author.is_empty() {
            self.defaults.author.clone()
        } else {
            s.author.clone()
        };
        Review {
            author,
            text: s.text.trim().to_string(),
            rating: s.rating,
            date: s
                .date_published
                .as_deref()
                .and_then(parse_iso_date)
                .unwrap_or_else(|| self.fallback_date()),
        }
    }

    fn validate(&self, review: Review) -> Option<Review> {
        if review.text.trim().chars().count() > self.defaults.min_text_len {
            Some(review)
        } else {
            None
        }
    }
}

impl Default for ReviewParser {
    fn default() -> Self {
        Self::new(FieldDefaults::default())
    }
}
