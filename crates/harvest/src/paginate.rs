// ABOUTME: Pagination over listing review pages with a page ceiling and politeness delay.
// ABOUTME: Each iteration returns an explicit PageStep so termination is easy to reason about.

//! Review pagination.
//!
//! Pages are fetched strictly in order: whether page `k + 1` is requested
//! depends on what page `k` produced. The loop ends on the first of
//! - enough reviews collected ([`PageStep::StopFull`]),
//! - the page ceiling ([`PageStep::StopCeiling`]),
//! - a page with no parsable reviews ([`PageStep::StopEmpty`]),
//! - a fetch failure ([`PageStep::StopFetchFailed`]).
//!
//! A fetch failure on the first page is returned as an error; later failures
//! keep what was already collected.

use std::thread;
use std::time::Duration;

use url::Url;

use crate::error::ScrapeError;
use crate::extractors::blocks::BlockExtractor;
use crate::extractors::review::ReviewParser;
use crate::models::Review;
use crate::resource::PageSource;

/// Outcome of one pagination iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStep {
    Continue,
    StopFull,
    StopCeiling,
    StopEmpty,
    StopFetchFailed,
}

/// What a collection run produced and why it stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct Harvest {
    pub reviews: Vec<Review>,
    pub pages_fetched: usize,
    pub stop: PageStep,
}

/// Landing page URL: `<base>?id=<app>`.
pub fn landing_url(base: &str, app_id: &str) -> Result<String, ScrapeError> {
    let mut url = parse_base(base)?;
    url.query_pairs_mut().append_pair("id", app_id);
    Ok(url.into())
}

/// Review listing URL for a zero-based page number.
///
/// Page 0 is the plain review listing; later pages add explicit sort, type and
/// page-number parameters.
pub fn listing_url(base: &str, app_id: &str, page: usize) -> Result<String, ScrapeError> {
    let mut url = parse_base(base)?;
    {
        let mut q = url.query_pairs_mut();
        q.append_pair("id", app_id);
        q.append_pair("showAllReviews", "true");
        if page > 0 {
            q.append_pair("reviewSortOrder", "0");
            q.append_pair("reviewType", "0");
            q.append_pair("pageNum", &page.to_string());
        }
    }
    Ok(url.into())
}

fn parse_base(base: &str) -> Result<Url, ScrapeError> {
    Url::parse(base).map_err(|e| {
        ScrapeError::invalid_url(base, "BuildUrl", Some(anyhow::anyhow!("invalid base URL: {}", e)))
    })
}

struct LoopState {
    page: usize,
    fetches: usize,
    collected: Vec<Review>,
}

/// Drives a [`PageSource`] across result pages.
pub struct Paginator<'a> {
    source: &'a dyn PageSource,
    extractor: &'a BlockExtractor,
    parser: &'a ReviewParser,
    base_url: &'a str,
    max_pages: usize,
    page_delay: Duration,
}

impl<'a> Paginator<'a> {
    pub fn new(
        source: &'a dyn PageSource,
        extractor: &'a BlockExtractor,
        parser: &'a ReviewParser,
        base_url: &'a str,
    ) -> Self {
        Self {
            source,
            extractor,
            parser,
            base_url,
            max_pages: crate::options::DEFAULT_MAX_PAGES,
            page_delay: crate::options::DEFAULT_PAGE_DELAY,
        }
    }

    /// Lower the page ceiling. Values above [`DEFAULT_MAX_PAGES`] are clamped.
    ///
    /// [`DEFAULT_MAX_PAGES`]: crate::options::DEFAULT_MAX_PAGES
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.min(crate::options::DEFAULT_MAX_PAGES);
        self
    }

    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Collect up to `target` reviews for `app_id`.
    pub fn run(&self, app_id: &str, target: usize) -> Result<Harvest, ScrapeError> {
        let mut state = LoopState {
            page: 0,
            fetches: 0,
            collected: Vec::new(),
        };

        let stop = loop {
            let step = self.advance(app_id, target, &mut state)?;
            if step != PageStep::Continue {
                break step;
            }
        };

        let mut reviews = state.collected;
        reviews.truncate(target);
        tracing::info!(
            app_id,
            pages = state.fetches,
            reviews = reviews.len(),
            stop = ?stop,
            "review collection finished"
        );
        Ok(Harvest {
            reviews,
            pages_fetched: state.fetches,
            stop,
        })
    }

    /// One iteration: decide whether to fetch, then fetch and parse one page.
    fn advance(&self, app_id: &str, target: usize, state: &mut LoopState) -> Result<PageStep, ScrapeError> {
        if state.collected.len() >= target {
            return Ok(PageStep::StopFull);
        }
        if state.page >= self.max_pages {
            return Ok(PageStep::StopCeiling);
        }
        if state.page > 0 && !self.page_delay.is_zero() {
            thread::sleep(self.page_delay);
        }

        let url = listing_url(self.base_url, app_id, state.page)?;
        state.fetches += 1;
        let html = match self.source.fetch_page(&url) {
            Ok(html) => html,
            Err(err) if state.page == 0 => return Err(err),
            Err(err) => {
                tracing::warn!(page = state.page, error = %err, "page fetch failed, keeping partial results");
                return Ok(PageStep::StopFetchFailed);
            }
        };

        let blocks = self.extractor.extract_html(&html);
        let reviews = self.parser.parse_all(&blocks);
        if reviews.is_empty() {
            tracing::debug!(page = state.page, blocks = blocks.len(), "page yielded no reviews");
            return Ok(PageStep::StopEmpty);
        }

        tracing::info!(page = state.page, count = reviews.len(), "collected reviews from page");
        state.collected.extend(reviews);
        state.page += 1;
        Ok(PageStep::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::time::Instant;

    const BASE: &str = "https://listing.test/store/apps/details";

    /// Serves scripted responses in order and records requested URLs.
    struct ScriptedSource {
        responses: Vec<Result<String, ()>>,
        requested: RefCell<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<String, ()>>) -> Self {
            Self {
                responses,
                requested: RefCell::new(Vec::new()),
            }
        }

        fn repeating(page: String, times: usize) -> Self {
            Self::new((0..times).map(|_| Ok(page.clone())).collect())
        }

        fn calls(&self) -> usize {
            self.requested.borrow().len()
        }
    }

    impl PageSource for ScriptedSource {
        fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
            let idx = self.requested.borrow().len();
            self.requested.borrow_mut().push(url.to_string());
            match self.responses.get(idx) {
                Some(Ok(html)) => Ok(html.clone()),
                _ => Err(ScrapeError::fetch(url, "Fetch", Some(anyhow::anyhow!("HTTP status 503")))),
            }
        }
    }

    fn page_with(n: usize) -> String {
        let mut html = String::from("<html><body>");
        for i in 0..n {
            html.push_str(&format!(
                r#"<div class="RHo1pe"><div class="UD7Dzf">Review number {} with enough text</div></div>"#,
                i
            ));
        }
        html.push_str("</body></html>");
        html
    }

    fn empty_page() -> String {
        "<html><body><p>No reviews</p></body></html>".to_string()
    }

    fn run(source: &ScriptedSource, target: usize) -> Result<Harvest, ScrapeError> {
        let extractor = BlockExtractor::new();
        let parser = ReviewParser::default();
        Paginator::new(source, &extractor, &parser, BASE)
            .page_delay(Duration::ZERO)
            .run("com.example.app", target)
    }

    #[test]
    fn stops_at_page_ceiling() {
        let source = ScriptedSource::repeating(page_with(3), 10);
        let harvest = run(&source, 50).unwrap();
        assert_eq!(source.calls(), 5);
        assert_eq!(harvest.pages_fetched, 5);
        assert_eq!(harvest.reviews.len(), 15);
        assert_eq!(harvest.stop, PageStep::StopCeiling);
    }

    #[test]
    fn stops_when_target_reached_and_truncates() {
        let source = ScriptedSource::repeating(page_with(3), 10);
        let harvest = run(&source, 5).unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(harvest.reviews.len(), 5);
        assert_eq!(harvest.stop, PageStep::StopFull);
    }

    #[test]
    fn empty_page_stops_further_fetches() {
        let source = ScriptedSource::new(vec![
            Ok(page_with(2)),
            Ok(empty_page()),
            Ok(page_with(2)),
        ]);
        let harvest = run(&source, 50).unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(harvest.pages_fetched, 2);
        assert_eq!(harvest.reviews.len(), 2);
        assert_eq!(harvest.stop, PageStep::StopEmpty);
    }

    #[test]
    fn empty_first_page_is_not_an_error() {
        let source = ScriptedSource::new(vec![Ok(empty_page())]);
        let harvest = run(&source, 50).unwrap();
        assert!(harvest.reviews.is_empty());
        assert_eq!(harvest.stop, PageStep::StopEmpty);
        assert_eq!(harvest.pages_fetched, source.calls());
        assert_eq!(harvest.pages_fetched, 1);
    }

    #[test]
    fn first_page_failure_is_returned() {
        let source = ScriptedSource::new(vec![Err(())]);
        let err = run(&source, 50).unwrap_err();
        assert!(err.is_fetch());
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn later_failure_keeps_partial_results() {
        let source = ScriptedSource::new(vec![Ok(page_with(2)), Ok(page_with(2)), Err(())]);
        let harvest = run(&source, 50).unwrap();
        assert_eq!(source.calls(), 3);
        assert_eq!(harvest.reviews.len(), 4);
        assert_eq!(harvest.stop, PageStep::StopFetchFailed);
        assert_eq!(harvest.pages_fetched, source.calls());
    }

    #[test]
    fn zero_target_fetches_nothing() {
        let source = ScriptedSource::repeating(page_with(1), 1);
        let harvest = run(&source, 0).unwrap();
        assert_eq!(source.calls(), 0);
        assert!(harvest.reviews.is_empty());
        assert_eq!(harvest.stop, PageStep::StopFull);
    }

    #[test]
    fn page_urls_follow_listing_contract() {
        let source = ScriptedSource::repeating(page_with(1), 3);
        run(&source, 3).unwrap();
        let urls = source.requested.borrow().clone();
        assert_eq!(
            urls,
            vec![
                format!("{}?id=com.example.app&showAllReviews=true", BASE),
                format!(
                    "{}?id=com.example.app&showAllReviews=true&reviewSortOrder=0&reviewType=0&pageNum=1",
                    BASE
                ),
                format!(
                    "{}?id=com.example.app&showAllReviews=true&reviewSortOrder=0&reviewType=0&pageNum=2",
                    BASE
                ),
            ]
        );
    }

    #[test]
    fn delay_applies_between_pages_only() {
        let source = ScriptedSource::repeating(page_with(1), 3);
        let extractor = BlockExtractor::new();
        let parser = ReviewParser::default();
        let start = Instant::now();
        let harvest = Paginator::new(&source, &extractor, &parser, BASE)
            .page_delay(Duration::from_millis(30))
            .run("com.example.app", 3)
            .unwrap();
        assert_eq!(harvest.reviews.len(), 3);
        // two gaps between three pages
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn custom_ceiling_is_respected() {
        let source = ScriptedSource::repeating(page_with(1), 10);
        let extractor = BlockExtractor::new();
        let parser = ReviewParser::default();
        let harvest = Paginator::new(&source, &extractor, &parser, BASE)
            .page_delay(Duration::ZERO)
            .max_pages(2)
            .run("com.example.app", 50)
            .unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(harvest.stop, PageStep::StopCeiling);
    }

    #[test]
    fn ceiling_cannot_be_raised() {
        let source = ScriptedSource::repeating(page_with(1), 10);
        let extractor = BlockExtractor::new();
        let parser = ReviewParser::default();
        let harvest = Paginator::new(&source, &extractor, &parser, BASE)
            .page_delay(Duration::ZERO)
            .max_pages(10)
            .run("com.example.app", 50)
            .unwrap();
        assert_eq!(source.calls(), 5);
        assert_eq!(harvest.pages_fetched, 5);
        assert_eq!(harvest.stop, PageStep::StopCeiling);
    }

    #[test]
    fn landing_url_encodes_identifier() {
        assert_eq!(
            landing_url(BASE, "com.example app").unwrap(),
            format!("{}?id=com.example+app", BASE)
        );
        assert!(landing_url("not a url", "x").unwrap_err().is_invalid_url());
    }
}
