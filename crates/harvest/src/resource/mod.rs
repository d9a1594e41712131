// ABOUTME: Resource fetching for listing pages over blocking HTTP.
// ABOUTME: Enforces the exactly-200, non-empty-body contract, content-length limits, and charset decoding.

use std::collections::HashMap;

use bytes::Bytes;
use reqwest::blocking::Client as HttpClient;

use crate::error::ScrapeError;
use crate::options::Options;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Options for fetching a resource.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub headers: HashMap<String, String>,
}

/// Result of a successful fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body as UTF-8 text using the response charset, or detection without one.
    pub fn text_utf8(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

/// Build the blocking HTTP client used for every listing request.
///
/// Redirects are followed; certificate validation is only skipped when
/// `accept_invalid_certs` is set.
pub fn build_http_client(opts: &Options) -> Result<HttpClient, ScrapeError> {
    HttpClient::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(&opts.user_agent)
        .timeout(opts.timeout)
        .connect_timeout(opts.connect_timeout)
        .danger_accept_invalid_certs(opts.accept_invalid_certs)
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .map_err(|e| {
            ScrapeError::fetch(
                "",
                "BuildClient",
                Some(anyhow::anyhow!("failed to build HTTP client: {}", e)),
            )
        })
}

/// Fetch a resource from the given URL.
///
/// Anything other than status 200 with a non-empty body is a fetch error; "not
/// found" and "blocked" are indistinguishable here.
pub fn fetch(client: &HttpClient, url: &str, opts: &FetchOptions) -> Result<FetchResult, ScrapeError> {
    if url.is_empty() {
        return Err(ScrapeError::invalid_url(url, "Fetch", None));
    }

    let parsed_url = url::Url::parse(url).map_err(|e| {
        ScrapeError::invalid_url(url, "Fetch", Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;

    let scheme = parsed_url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ScrapeError::invalid_url(
            url,
            "Fetch",
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }

    let mut request = client.get(parsed_url);
    for (key, value) in &opts.headers {
        request = request.header(key, value);
    }

    let response = request.send().map_err(|e| {
        ScrapeError::fetch(url, "Fetch", Some(anyhow::anyhow!("request failed: {}", e)))
    })?;

    if let Some(len) = response.content_length() {
        if len as usize > MAX_CONTENT_LENGTH {
            return Err(ScrapeError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large")),
            ));
        }
    }

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    if status != 200 {
        return Err(ScrapeError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("HTTP status {}", status)),
        ));
    }

    let body = response.bytes().map_err(|e| {
        ScrapeError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("failed to read body: {}", e)),
        )
    })?;

    if body.len() > MAX_CONTENT_LENGTH {
        return Err(ScrapeError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("content too large")),
        ));
    }

    if body.is_empty() {
        return Err(ScrapeError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("empty body")),
        ));
    }

    Ok(FetchResult {
        status,
        content_type,
        body,
    })
}

/// Anything that can hand back the HTML of a listing URL.
///
/// The pagination loop and metadata lookup only see this trait, which keeps
/// them testable without a network.
pub trait PageSource {
    fn fetch_page(&self, url: &str) -> Result<String, ScrapeError>;
}

/// [`PageSource`] backed by a real HTTP client.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: HttpClient,
    opts: FetchOptions,
}

impl HttpSource {
    pub fn new(client: HttpClient, opts: FetchOptions) -> Self {
        Self { client, opts }
    }
}

impl PageSource for HttpSource {
    fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        let result = fetch(&self.client, url, &self.opts)?;
        let html = result.text_utf8();
        if html.trim().is_empty() {
            return Err(ScrapeError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("empty body")),
            ));
        }
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn create_test_client() -> HttpClient {
        HttpClient::builder()
            .user_agent("test-agent")
            .build()
            .unwrap()
    }

    #[test]
    fn fetch_ok_utf8() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/test");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body("<p>hello</p>");
        });

        let result = fetch(&create_test_client(), &server.url("/test"), &FetchOptions::default());
        mock.assert();

        let result = result.expect("fetch should succeed");
        assert_eq!(result.status, 200);
        assert_eq!(result.text_utf8(), "<p>hello</p>");
    }

    #[test]
    fn fetch_sends_configured_headers() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/h")
                .header("accept-language", "en-US,en;q=0.9");
            then.status(200).body("ok");
        });

        let mut headers = HashMap::new();
        headers.insert("Accept-Language".to_string(), "en-US,en;q=0.9".to_string());
        let opts = FetchOptions { headers };

        let result = fetch(&create_test_client(), &server.url("/h"), &opts);
        mock.assert();
        assert!(result.is_ok());
    }

    #[test]
    fn fetch_non_200_rejected() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/notfound");
            then.status(404).body("not found");
        });

        let result = fetch(&create_test_client(), &server.url("/notfound"), &FetchOptions::default());
        mock.assert();

        let err = result.expect_err("should fail on 404");
        assert!(err.is_fetch());
    }

    #[test]
    fn fetch_other_success_codes_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/accepted");
            then.status(203).body("<p>not quite</p>");
        });

        let err = fetch(&create_test_client(), &server.url("/accepted"), &FetchOptions::default())
            .expect_err("only 200 is accepted");
        assert!(err.is_fetch());
    }

    #[test]
    fn fetch_empty_body_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/empty");
            then.status(200).body("");
        });

        let err = fetch(&create_test_client(), &server.url("/empty"), &FetchOptions::default())
            .expect_err("empty body is a failure");
        assert!(err.is_fetch());
    }

    #[test]
    fn fetch_rejects_bad_scheme_and_empty_url() {
        let client = create_test_client();
        let err = fetch(&client, "ftp://example.com/x", &FetchOptions::default()).unwrap_err();
        assert!(err.is_invalid_url());
        let err = fetch(&client, "", &FetchOptions::default()).unwrap_err();
        assert!(err.is_invalid_url());
    }

    #[test]
    fn fetch_transport_error_is_fetch_failure() {
        // nothing listens on port 9 on loopback
        let err = fetch(
            &create_test_client(),
            "http://127.0.0.1:9/",
            &FetchOptions::default(),
        )
        .unwrap_err();
        assert!(err.is_fetch());
    }

    #[test]
    fn http_source_rejects_whitespace_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/blank");
            then.status(200).body("   \n ");
        });

        let source = HttpSource::new(create_test_client(), FetchOptions::default());
        let err = source.fetch_page(&server.url("/blank")).unwrap_err();
        assert!(err.is_fetch());
    }

    #[test]
    fn extract_charset_variants() {
        assert_eq!(
            extract_charset("text/html; charset=utf-8"),
            Some("utf-8".to_string())
        );
        assert_eq!(
            extract_charset("text/html; charset=\"ISO-8859-1\""),
            Some("iso-8859-1".to_string())
        );
        assert_eq!(extract_charset("text/html"), None);
    }

    #[test]
    fn fetch_decodes_declared_charset() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/latin1");
            then.status(200)
                .header("content-type", "text/html; charset=iso-8859-1")
                .body(vec![0x63u8, 0x61, 0x66, 0xe9]);
        });

        let source = HttpSource::new(create_test_client(), FetchOptions::default());
        assert_eq!(source.fetch_page(&server.url("/latin1")).unwrap(), "café");
    }

    #[test]
    fn decode_body_with_latin1_charset() {
        let body: &[u8] = &[0x63, 0x61, 0x66, 0xe9];
        assert_eq!(decode_body(body, Some("text/html; charset=iso-8859-1")), "café");
    }
}
