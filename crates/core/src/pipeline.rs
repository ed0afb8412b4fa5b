//! End-to-end extraction: validate, fetch, parse, extract, pick a lead image.
//!
//! [`Extractor::process`] turns one [`ExtractionRequest`] into exactly one
//! [`ExtractedArticle`] or one [`ExtractionError`]. Every failure carries the
//! URL as the caller sent it.
//!
//! ```text
//! validate ──> fetch ──> parse ──> extract + lead image ──> article
//!    │           │         │              │
//! InvalidUrl  Timeout  ParseError  ExtractionFailed
//!             HttpError
//!             NetworkError
//! ```
//!
//! The fetch is the only await point. Parsing and scoring are CPU-bound and
//! run on tokio's blocking pool.

use std::time::Duration;

use url::Url;

use crate::article::ExtractedArticle;
use crate::error::ExtractionError;
use crate::fetch::{Fetch, FetchConfig, HttpFetcher};
use crate::image::resolve_lead_image;
use crate::parse::Document;
use crate::readability::{Readability, ReadabilityConfig};
use crate::request::{ExtractionRequest, parse_article_url};
use crate::{JaibError, Result};

/// Runs the extraction pipeline.
///
/// Holds configuration and a fetcher only; no state is carried from one
/// request to the next.
///
/// # Example
///
/// ```no_run
/// use jaib_core::{ExtractionRequest, Extractor};
///
/// # #[tokio::main]
/// # async fn main() {
/// let extractor = Extractor::new();
/// match extractor.process(&ExtractionRequest::new("https://example.com/post")).await {
///     Ok(article) => println!("{} ({} chars)", article.title, article.length),
///     Err(err) => eprintln!("{}: {}", err.kind, err.message),
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Extractor<F: Fetch = HttpFetcher> {
    fetcher: F,
    timeout: Duration,
    readability: Readability,
}

impl Extractor<HttpFetcher> {
    /// Extractor with the default fetch and readability settings.
    pub fn new() -> Self {
        Self::with_fetch_config(FetchConfig::default())
    }

    pub fn with_fetch_config(config: FetchConfig) -> Self {
        let timeout = config.timeout;
        Self { fetcher: HttpFetcher::new(config), timeout, readability: Readability::new() }
    }
}

impl Default for Extractor<HttpFetcher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Fetch> Extractor<F> {
    /// Extractor using a custom page source.
    pub fn with_fetcher(fetcher: F) -> Self {
        Self { fetcher, timeout: FetchConfig::default().timeout, readability: Readability::new() }
    }

    /// Overrides the fetch budget.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn readability_config(mut self, config: ReadabilityConfig) -> Self {
        self.readability = Readability::with_config(config);
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches the requested page and extracts its article.
    #[tracing::instrument(level = "info", skip(self, request), fields(url = %request.url))]
    pub async fn process(&self, request: &ExtractionRequest) -> std::result::Result<ExtractedArticle, ExtractionError> {
        let requested = request.url.clone();
        let fail = |err: JaibError| {
            let failure = ExtractionError::from_error(err, requested.clone());
            tracing::warn!(kind = %failure.kind, message = %failure.message, "Extraction failed");
            failure
        };

        let url = request.validate().map_err(fail)?;
        let page = self.fetcher.fetch(&url, self.timeout).await.map_err(fail)?;
        tracing::debug!(status = page.status, bytes = page.body.len(), "Fetched page");

        let article = self.run_blocking(page.body, page.url, requested.clone()).await.map_err(fail)?;
        tracing::info!(title = %article.title, length = article.length, "Extracted article");
        Ok(article)
    }

    /// Runs the pipeline from parsing onward on HTML the caller already has.
    ///
    /// `url` is the page's address; it resolves relative links and is echoed
    /// back in the article.
    pub async fn process_html(
        &self, html: impl Into<String>, url: &str,
    ) -> std::result::Result<ExtractedArticle, ExtractionError> {
        let page_url = parse_article_url(url).map_err(|e| ExtractionError::from_error(e, url))?;
        self.run_blocking(html.into(), page_url, url.to_string())
            .await
            .map_err(|e| ExtractionError::from_error(e, url))
    }

    async fn run_blocking(&self, html: String, page_url: Url, requested: String) -> Result<ExtractedArticle> {
        let readability = self.readability.clone();
        tokio::task::spawn_blocking(move || extract_article(&readability, &html, &page_url, &requested))
            .await
            .map_err(|e| JaibError::Internal(format!("Article processing failed: {}", e)))?
    }
}

/// Synchronous core of the pipeline: parse, extract and pick a lead image.
///
/// `page_url` is where the HTML came from (after redirects); `requested_url`
/// is what the caller asked for and is echoed as the article's `url`.
pub fn extract_article(
    readability: &Readability, html: &str, page_url: &Url, requested_url: &str,
) -> Result<ExtractedArticle> {
    let doc = Document::parse(html)?.with_base_url(page_url.clone());
    let readable = readability.extract(&doc, Some(page_url))?;
    let lead_image_url = resolve_lead_image(&doc, Some(&readable.content), page_url);

    Ok(ExtractedArticle::from_readable(readable, requested_url, lead_image_url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fetch::FetchedPage;
    use std::future::Future;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PROSE: &str = "Local-first software keeps the primary copy of your data on your own device, with sync as a \
                         convenience, not a requirement, and that changes how you design storage, conflict handling, and trust.";

    fn article_html() -> String {
        format!(
            r#"<html><head>
                <title>Designing Local-First Apps | Field Notes</title>
                <meta property="og:image" content="/cover.jpg">
            </head><body>
                <div class="sidebar"><a href="/a">A</a><a href="/b">B</a></div>
                <article class="post-content"><p>{PROSE}</p><p>{PROSE}</p><p>{PROSE}</p></article>
            </body></html>"#
        )
    }

    /// Serves canned results and counts calls.
    #[derive(Clone)]
    struct StubFetcher {
        response: std::result::Result<String, fn() -> JaibError>,
        calls: Arc<AtomicUsize>,
    }

    impl StubFetcher {
        fn ok(body: String) -> Self {
            Self { response: Ok(body), calls: Arc::new(AtomicUsize::new(0)) }
        }

        fn failing(err: fn() -> JaibError) -> Self {
            Self { response: Err(err), calls: Arc::new(AtomicUsize::new(0)) }
        }
    }

    impl Fetch for StubFetcher {
        fn fetch(&self, url: &Url, _timeout: Duration) -> impl Future<Output = Result<FetchedPage>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = match &self.response {
                Ok(body) => Ok(FetchedPage { url: url.clone(), status: 200, content_type: None, body: body.clone() }),
                Err(make) => Err(make()),
            };
            async move { result }
        }
    }

    #[tokio::test]
    async fn test_process_success() {
        let extractor = Extractor::with_fetcher(StubFetcher::ok(article_html()));
        let article = extractor.process(&ExtractionRequest::new("https://blog.example.com/local-first")).await.unwrap();

        assert_eq!(article.title, "Designing Local-First Apps");
        assert_eq!(article.url, "https://blog.example.com/local-first");
        assert_eq!(article.lead_image_url.as_deref(), Some("https://blog.example.com/cover.jpg"));
        assert!(article.text_content.contains("Local-first software"));
        assert!(!article.content.contains("sidebar"));
        assert_eq!(article.length, article.text_content.chars().count());
        assert!(article.excerpt.starts_with("Local-first software"));
    }

    #[tokio::test]
    async fn test_invalid_url_never_fetches() {
        let fetcher = StubFetcher::ok(article_html());
        let calls = Arc::clone(&fetcher.calls);
        let extractor = Extractor::with_fetcher(fetcher);

        for bad in ["", "not a url", "example.com/post", "ftp://example.com/a", "javascript:alert(1)"] {
            let err = extractor.process(&ExtractionRequest::new(bad)).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidUrl);
            assert_eq!(err.source_url, bad);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_failures_are_classified() {
        let cases: [(fn() -> JaibError, ErrorKind); 3] = [
            (|| JaibError::Timeout { timeout_ms: 20_000 }, ErrorKind::Timeout),
            (|| JaibError::Network("connection refused".into()), ErrorKind::NetworkError),
            (
                || JaibError::HttpStatus { status: 404, reason: "Not Found".into(), snippet: "gone".into() },
                ErrorKind::HttpError,
            ),
        ];

        for (make, kind) in cases {
            let extractor = Extractor::with_fetcher(StubFetcher::failing(make));
            let err = extractor.process(&ExtractionRequest::new("https://example.com/x")).await.unwrap_err();
            assert_eq!(err.kind, kind);
            assert_eq!(err.source_url, "https://example.com/x");
        }
    }

    #[tokio::test]
    async fn test_non_article_page_fails_extraction() {
        let html = r##"<html><body><nav><a href="#">Home</a></nav><p>Sign in to continue.</p></body></html>"##;
        let extractor = Extractor::with_fetcher(StubFetcher::ok(html.to_string()));
        let err = extractor.process(&ExtractionRequest::new("https://example.com/login")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExtractionFailed);
    }

    #[tokio::test]
    async fn test_empty_body_is_parse_error() {
        let extractor = Extractor::with_fetcher(StubFetcher::ok("   ".to_string()));
        let err = extractor.process(&ExtractionRequest::new("https://example.com/empty")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);
    }

    #[tokio::test]
    async fn test_process_html() {
        let extractor = Extractor::new();
        let article = extractor.process_html(article_html(), "https://blog.example.com/p").await.unwrap();
        assert_eq!(article.url, "https://blog.example.com/p");
        assert_eq!(article.lead_image_url.as_deref(), Some("https://blog.example.com/cover.jpg"));

        let err = extractor.process_html(article_html(), "relative/path").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidUrl);
    }

    #[tokio::test]
    async fn test_repeated_requests_are_independent() {
        let extractor = Extractor::with_fetcher(StubFetcher::ok(article_html()));
        let request = ExtractionRequest::new("https://blog.example.com/local-first");

        let first = extractor.process(&request).await.unwrap();
        let second = extractor.process(&request).await.unwrap();
        assert_eq!(first, second);
    }
}
