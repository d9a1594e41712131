// ABOUTME: Configuration options for the harvester: Options defaults and the fluent ClientBuilder.
// ABOUTME: Covers listing URL, HTTP behavior, pagination limits, and field defaults.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::Client;
use crate::error::ScrapeError;
use crate::extractors::review::FieldDefaults;

/// Public listing page every URL is built from.
pub const DEFAULT_BASE_URL: &str = "https://play.google.com/store/apps/details";

/// Desktop browser user agent; the listing serves reduced markup to unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Hard ceiling on page fetches per collection request.
pub const DEFAULT_MAX_PAGES: usize = 5;

/// Pause between consecutive page fetches.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);

/// Reviews requested when the caller does not say.
pub const DEFAULT_REVIEW_COUNT: usize = 50;

/// Configuration options for the harvest client.
#[derive(Debug, Clone)]
pub struct Options {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Skip TLS certificate validation. Off unless explicitly enabled.
    pub accept_invalid_certs: bool,
    pub headers: HashMap<String, String>,
    pub max_pages: usize,
    pub page_delay: Duration,
    pub field_defaults: FieldDefaults,
    pub http_client: Option<reqwest::blocking::Client>,
}

impl Default for Options {
    fn default() -> Self {
        let mut headers = HashMap::new();
        headers.insert(
            "Accept".to_string(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
        );
        headers.insert("Accept-Language".to_string(), "en-US,en;q=0.9".to_string());

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            accept_invalid_certs: false,
            headers,
            max_pages: DEFAULT_MAX_PAGES,
            page_delay: DEFAULT_PAGE_DELAY,
            field_defaults: FieldDefaults::default(),
            http_client: None,
        }
    }
}

/// Builder for constructing Client instances with custom configuration.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    /// Create a new ClientBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the listing URL that package identifiers are appended to.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.opts.base_url = base_url.into();
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Set the total request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.opts.connect_timeout = timeout;
        self
    }

    /// Accept invalid TLS certificates.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.opts.accept_invalid_certs = accept;
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Lower the number of pages fetched per collection. The ceiling of
    /// [`DEFAULT_MAX_PAGES`] cannot be raised; larger values are clamped.
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.opts.max_pages = max_pages.min(DEFAULT_MAX_PAGES);
        self
    }

    /// Set the pause between page fetches.
    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.opts.page_delay = delay;
        self
    }

    /// Override the values used for unrecoverable fields.
    pub fn field_defaults(mut self, defaults: FieldDefaults) -> Self {
        self.opts.field_defaults = defaults;
        self
    }

    /// Use a custom HTTP client. Timeouts, user agent and TLS settings of the
    /// builder are then ignored.
    pub fn http_client(mut self, client: reqwest::blocking::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Build the Client with the configured options.
    pub fn build(self) -> Result<Client, ScrapeError> {
        Client::new(self.opts)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_listing_contract() {
        let opts = Options::default();
        assert_eq!(opts.base_url, DEFAULT_BASE_URL);
        assert_eq!(opts.timeout, Duration::from_secs(30));
        assert_eq!(opts.connect_timeout, Duration::from_secs(10));
        assert_eq!(opts.max_pages, 5);
        assert_eq!(opts.page_delay, Duration::from_millis(500));
        assert!(!opts.accept_invalid_certs);
        assert!(opts.user_agent.starts_with("Mozilla/5.0"));
        assert!(opts.headers.contains_key("Accept-Language"));
    }

    #[test]
    fn builder_overrides() {
        let builder = ClientBuilder::new()
            .base_url("http://localhost/details")
            .max_pages(2)
            .page_delay(Duration::ZERO)
            .accept_invalid_certs(true)
            .header("X-Test", "1");
        assert_eq!(builder.opts.base_url, "http://localhost/details");
        assert_eq!(builder.opts.max_pages, 2);
        assert_eq!(builder.opts.page_delay, Duration::ZERO);
        assert!(builder.opts.accept_invalid_certs);
        assert_eq!(builder.opts.headers.get("X-Test").map(String::as_str), Some("1"));
    }

    #[test]
    fn page_ceiling_is_clamped() {
        assert_eq!(ClientBuilder::new().max_pages(50).opts.max_pages, DEFAULT_MAX_PAGES);
    }
}
