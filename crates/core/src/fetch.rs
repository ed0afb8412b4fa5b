//! Page retrieval from the network, local files and stdin.
//!
//! Network fetches send one GET request with a desktop-browser identity
//! under a single wall-clock budget. There are no retries: extraction is an
//! on-demand, user-triggered action.

use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use url::Url;

use crate::request::parse_article_url;
use crate::{JaibError, Result};

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/124.0.0.0 Safari/537.36 JaibArticleFetcher/1.0";

const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Number of body characters kept when reporting a non-success status.
pub const ERROR_SNIPPET_CHARS: usize = 200;

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Wall-clock budget for the whole request, body included.
    pub timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
    /// Accept header value.
    pub accept: String,
    /// Accept-Language header value.
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: Url,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// Source of raw pages for the extraction pipeline.
///
/// [`HttpFetcher`] is the production implementation. The timeout is passed
/// per call so the orchestrator owns the budget.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &Url, timeout: Duration) -> impl Future<Output = Result<FetchedPage>> + Send;
}

/// Fetches pages over HTTP(S) with reqwest.
///
/// A fresh client is built per request, so concurrent fetches share no
/// connection pool or other mutable state.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &Url, timeout: Duration) -> impl Future<Output = Result<FetchedPage>> + Send {
        let config = FetchConfig { timeout, ..self.config.clone() };
        let url = url.clone();
        async move { fetch_page(&url, &config).await }
    }
}

/// Fetches HTML content from a URL string.
///
/// The URL is validated first; anything that is not an absolute http(s)
/// URL fails with [`JaibError::InvalidUrl`] before any network I/O.
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed = parse_article_url(url)?;
    fetch_page(&parsed, config).await.map(|page| page.body)
}

/// Fetches a page, enforcing `config.timeout` over the entire exchange.
#[tracing::instrument(level = "debug", skip(config), fields(url = %url, timeout_ms = config.timeout_ms()))]
pub async fn fetch_page(url: &Url, config: &FetchConfig) -> Result<FetchedPage> {
    match tokio::time::timeout(config.timeout, send_request(url, config)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(url = %url, "fetch aborted after {} ms", config.timeout_ms());
            Err(JaibError::Timeout { timeout_ms: config.timeout_ms() })
        }
    }
}

async fn send_request(url: &Url, config: &FetchConfig) -> Result<FetchedPage> {
    let client = Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| JaibError::Internal(format!("Failed to build HTTP client: {}", e)))?;

    let response = client
        .get(url.clone())
        .header(USER_AGENT, &config.user_agent)
        .header(ACCEPT, &config.accept)
        .header(ACCEPT_LANGUAGE, &config.accept_language)
        .send()
        .await
        .map_err(|e| classify_transport_error(&e, config))?;

    let status = response.status();
    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read response body".to_string());
        tracing::debug!(status = status.as_u16(), "target answered with a non-success status");
        return Err(JaibError::HttpStatus {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            snippet: snippet(&body, ERROR_SNIPPET_CHARS),
        });
    }

    let body = response.text().await.map_err(|e| classify_transport_error(&e, config))?;
    tracing::debug!(bytes = body.len(), final_url = %final_url, "page fetched");

    Ok(FetchedPage { url: final_url, status: status.as_u16(), content_type, body })
}

fn classify_transport_error(err: &reqwest::Error, config: &FetchConfig) -> JaibError {
    if err.is_timeout() {
        JaibError::Timeout { timeout_ms: config.timeout_ms() }
    } else {
        JaibError::Network(error_chain(err))
    }
}

/// reqwest's top-level message rarely names the cause; walk the sources.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// First `max_chars` characters of `body`.
pub(crate) fn snippet(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

/// Reads HTML content from a local file.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        return Err(JaibError::FileNotFound(path_buf));
    }
    Ok(fs::read_to_string(&path_buf)?)
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accepts one connection, reads the request head and answers with `response`.
    async fn serve_once(response: String) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        Url::parse(&format!("http://{}/article", addr)).unwrap()
    }

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.timeout_ms(), 20_000);
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
        assert!(config.user_agent.contains("JaibArticleFetcher"));
        assert!(config.accept.starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_fetch_url_invalid() {
        let result = fetch_url("not-a-url", &FetchConfig::default()).await;
        assert!(matches!(result, Err(JaibError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_url_rejects_non_http_scheme() {
        let result = fetch_url("ftp://example.com/file.html", &FetchConfig::default()).await;
        assert!(matches!(result, Err(JaibError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_page_success() {
        let url = serve_once(http_response("200 OK", "<html><body><p>Hi</p></body></html>")).await;
        let page = fetch_page(&url, &FetchConfig::default()).await.unwrap();

        assert_eq!(page.status, 200);
        assert!(page.body.contains("<p>Hi</p>"));
        assert_eq!(page.content_type.as_deref(), Some("text/html; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_fetch_page_non_success_status() {
        let body = format!("<html><body>{}</body></html>", "x".repeat(500));
        let url = serve_once(http_response("404 Not Found", &body)).await;
        let result = fetch_page(&url, &FetchConfig::default()).await;

        match result {
            Err(JaibError::HttpStatus { status, reason, snippet }) => {
                assert_eq!(status, 404);
                assert_eq!(reason, "Not Found");
                assert_eq!(snippet.chars().count(), ERROR_SNIPPET_CHARS);
                assert!(snippet.starts_with("<html><body>"));
            }
            other => panic!("expected HttpStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}/", addr)).unwrap();
        let result = fetch_page(&url, &FetchConfig::default()).await;
        assert!(matches!(result, Err(JaibError::Network(_))));
    }

    #[tokio::test]
    async fn test_fetch_page_times_out_on_silent_host() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let config = FetchConfig { timeout: Duration::from_millis(200), ..Default::default() };
        let url = Url::parse(&format!("http://{}/", addr)).unwrap();
        let started = std::time::Instant::now();
        let result = fetch_page(&url, &config).await;

        assert!(matches!(result, Err(JaibError::Timeout { timeout_ms: 200 })));
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_snippet_counts_characters() {
        assert_eq!(snippet("héllo wörld", 5), "héllo");
        assert_eq!(snippet("short", 200), "short");
    }

    #[test]
    fn test_fetch_file_not_found() {
        let result = fetch_file("/nonexistent/path/file.html");
        assert!(matches!(result, Err(JaibError::FileNotFound(_))));
    }
}
