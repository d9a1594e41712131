// ABOUTME: The Client that ties fetching, block extraction, field parsing and pagination together.
// ABOUTME: Provides collect_reviews(), app_info() and the offline parse_*_html() entry points.

use crate::error::ScrapeError;
use crate::extractors::blocks::BlockExtractor;
use crate::extractors::metadata::AppInfoExtractor;
use crate::extractors::review::ReviewParser;
use crate::models::{AppInfo, Review};
use crate::options::{ClientBuilder, Options, DEFAULT_REVIEW_COUNT};
use crate::paginate::{landing_url, Harvest, Paginator};
use crate::resource::{build_http_client, FetchOptions, HttpSource, PageSource};

/// Review and metadata harvester for one listing site.
pub struct Client {
    opts: Options,
    source: HttpSource,
    blocks: BlockExtractor,
    parser: ReviewParser,
    metadata: AppInfoExtractor,
}

impl Client {
    /// Create a new ClientBuilder for configuring a Client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    pub fn new(opts: Options) -> Result<Self, ScrapeError> {
        let http_client = match opts.http_client.clone() {
            Some(client) => client,
            None => build_http_client(&opts)?,
        };
        let source = HttpSource::new(
            http_client,
            FetchOptions {
                headers: opts.headers.clone(),
            },
        );
        let parser = ReviewParser::new(opts.field_defaults.clone());
        Ok(Self {
            opts,
            source,
            blocks: BlockExtractor::new(),
            parser,
            metadata: AppInfoExtractor::new(),
        })
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Collect up to `count` reviews for a package identifier.
    ///
    /// An empty result is not an error. Only a blank identifier or a failed
    /// first-page fetch is.
    pub fn collect_reviews(&self, app_id: &str, count: usize) -> Result<Vec<Review>, ScrapeError> {
        Ok(self.harvest(app_id, count)?.reviews)
    }

    /// [`Client::collect_reviews`] with the default count of 50.
    pub fn reviews(&self, app_id: &str) -> Result<Vec<Review>, ScrapeError> {
        self.collect_reviews(app_id, DEFAULT_REVIEW_COUNT)
    }

    /// Like [`Client::collect_reviews`], also reporting pages fetched and why
    /// collection stopped.
    pub fn harvest(&self, app_id: &str, count: usize) -> Result<Harvest, ScrapeError> {
        let app_id = validate_app_id(app_id, "CollectReviews")?;
        self.harvest_from(&self.source, app_id, count)
    }

    fn harvest_from(
        &self,
        source: &dyn PageSource,
        app_id: &str,
        count: usize,
    ) -> Result<Harvest, ScrapeError> {
        Paginator::new(source, &self.blocks, &self.parser, &self.opts.base_url)
            .max_pages(self.opts.max_pages)
            .page_delay(self.opts.page_delay)
            .run(app_id, count)
    }

    /// Fetch the landing page once and extract app metadata.
    pub fn app_info(&self, app_id: &str) -> Result<AppInfo, ScrapeError> {
        let app_id = validate_app_id(app_id, "AppInfo")?;
        let url = landing_url(&self.opts.base_url, app_id)?;
        let html = self.source.fetch_page(&url).map_err(|mut e| {
            e.op = "AppInfo".to_string();
            e
        })?;
        Ok(self.metadata.extract_html(&html))
    }

    /// Extract and parse reviews from HTML that was fetched elsewhere.
    pub fn parse_reviews_html(&self, html: &str) -> Vec<Review> {
        let blocks = self.blocks.extract_html(html);
        self.parser.parse_all(&blocks)
    }

    /// Extract app metadata from HTML that was fetched elsewhere.
    pub fn parse_app_info_html(&self, html: &str) -> AppInfo {
        self.metadata.extract_html(html)
    }
}

fn validate_app_id<'a>(app_id: &'a str, op: &str) -> Result<&'a str, ScrapeError> {
    let trimmed = app_id.trim();
    if trimmed.is_empty() {
        return Err(ScrapeError::invalid_app_id(
            op,
            Some(anyhow::anyhow!("package identifier is empty")),
        ));
    }
    Ok(trimmed)
}
