//! Document cleanup that runs before scoring.
//!
//! Everything happens in one streaming lol_html pass, so the cost is linear in
//! the size of the page regardless of how many rules are enabled.

use std::sync::LazyLock;

use lol_html::{Settings, doc_comments, element};
use regex::Regex;
use url::Url;

use crate::scoring::{NEGATIVE_CLASSES, POSITIVE_CLASSES};

static UNLIKELY: LazyLock<Regex> = LazyLock::new(|| Regex::new(NEGATIVE_CLASSES).expect("unlikely pattern is valid"));
static POSITIVE: LazyLock<Regex> = LazyLock::new(|| Regex::new(POSITIVE_CLASSES).expect("positive pattern is valid"));
static HIDDEN_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").expect("hidden style pattern is valid")
});
static INTER_TAG_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("whitespace pattern is valid"));

/// Elements dropped together with everything inside them.
const STRIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "iframe", "svg", "canvas", "template"];

/// Elements never removed as unlikely candidates, whatever their class says.
const PROTECTED_TAGS: &[&str] = &["html", "body", "article", "main", "a"];

/// ARIA roles that mark page chrome.
const CHROME_ROLES: &[&str] = &["navigation", "complementary", "banner", "dialog", "alertdialog", "menu", "menubar"];

/// Configuration for HTML preprocessing.
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Drop `script`, `style`, `noscript`, `iframe`, `svg`, `canvas` and `template`.
    pub strip_non_content: bool,
    /// Drop elements whose class/id/role look like page chrome.
    pub remove_unlikely: bool,
    /// Keep unlikely-looking elements that also match content patterns.
    pub keep_positive: bool,
    /// Drop `display:none`, `visibility:hidden`, `hidden` and `aria-hidden` elements.
    pub remove_hidden: bool,
    /// Collapse whitespace between tags.
    pub collapse_whitespace: bool,
    /// Base for resolving relative `href`/`src`; no resolution when `None`.
    pub base_url: Option<Url>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            strip_non_content: true,
            remove_unlikely: true,
            keep_positive: true,
            remove_hidden: true,
            collapse_whitespace: true,
            base_url: None,
        }
    }
}

/// Preprocess HTML by removing unwanted elements and normalizing the document.
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let mut handlers = Vec::new();

    if config.strip_non_content {
        for &tag in STRIPPED_ELEMENTS {
            handlers.push(element!(tag, |el| {
                el.remove();
                Ok(())
            }));
        }
    }

    if config.remove_hidden {
        handlers.push(element!("*", |el| {
            let hidden_style = el.get_attribute("style").is_some_and(|style| HIDDEN_STYLE.is_match(&style));
            let aria_hidden = el.get_attribute("aria-hidden").is_some_and(|v| v == "true");
            if hidden_style || aria_hidden || el.has_attribute("hidden") {
                el.remove();
            }
            Ok(())
        }));
    }

    if config.remove_unlikely {
        let keep_positive = config.keep_positive;
        handlers.push(element!("*", move |el| {
            let tag = el.tag_name().to_ascii_lowercase();
            if PROTECTED_TAGS.contains(&tag.as_str()) {
                return Ok(());
            }

            let role = el.get_attribute("role").unwrap_or_default();
            if CHROME_ROLES.contains(&role.as_str()) {
                el.remove();
                return Ok(());
            }

            let signature = format!(
                "{} {}",
                el.get_attribute("class").unwrap_or_default(),
                el.get_attribute("id").unwrap_or_default()
            );
            if is_unlikely_candidate(&signature, keep_positive) {
                el.remove();
            }
            Ok(())
        }));
    }

    if let Some(base_url) = &config.base_url {
        for tag in ["a", "link"] {
            handlers.push(element!(format!("{}[href]", tag), move |el| {
                if let Some(href) = el.get_attribute("href")
                    && let Some(absolute) = absolutize(base_url, &href)
                {
                    el.set_attribute("href", &absolute)?;
                }
                Ok(())
            }));
        }
    }

    // Lazy-loaded images keep the real source in data-src.
    handlers.push(element!("img", move |el| {
        let placeholder = el.get_attribute("src").is_none_or(|src| src.trim().is_empty() || src.starts_with("data:"));
        let source = match el.get_attribute("data-src") {
            Some(lazy) if placeholder && !lazy.trim().is_empty() => Some(lazy),
            _ => el.get_attribute("src"),
        };
        if let Some(src) = source {
            let resolved = config.base_url.as_ref().and_then(|base| absolutize(base, &src)).unwrap_or(src);
            el.set_attribute("src", &resolved)?;
        }
        Ok(())
    }));

    let settings = Settings {
        element_content_handlers: handlers,
        document_content_handlers: vec![doc_comments!(|comment| {
            comment.remove();
            Ok(())
        })],
        ..Default::default()
    };

    let processed = rewrite(html, settings);

    if config.collapse_whitespace {
        INTER_TAG_WHITESPACE.replace_all(&processed, "> <").into_owned()
    } else {
        processed
    }
}

/// Whether a class/id signature marks an element as page chrome.
pub fn is_unlikely_candidate(signature: &str, keep_positive: bool) -> bool {
    UNLIKELY.is_match(signature) && !(keep_positive && POSITIVE.is_match(signature))
}

/// Resolves `reference` against `base`, leaving fragments and special schemes alone.
pub(crate) fn absolutize(base: &Url, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with('#') || reference.starts_with("data:") {
        return None;
    }
    base.join(reference).ok().map(String::from)
}

/// Runs a lol_html rewrite, returning the input unchanged if the rewriter fails.
pub(crate) fn rewrite(html: &str, settings: Settings<'_, '_>) -> String {
    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = lol_html::HtmlRewriter::new(settings, |chunk: &[u8]| output.extend_from_slice(chunk));

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }
    if rewriter.end().is_err() {
        return html.to_string();
    }

    String::from_utf8(output).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preprocess(html: &str) -> String {
        preprocess_html(html, &PreprocessConfig::default())
    }

    #[test]
    fn test_strips_non_content_elements() {
        let html = r#"
            <html>
                <head><script>alert('test');</script><style>body{color:red;}</style></head>
                <body>
                    <noscript>Enable JavaScript</noscript>
                    <iframe src="https://example.com/embed"></iframe>
                    <svg><rect width="100" height="100"/></svg>
                    <canvas id="chart"></canvas>
                    <p>Content</p>
                </body>
            </html>
        "#;

        let result = preprocess(html);
        assert!(!result.contains("alert"), "script body should be gone");
        assert!(!result.contains("color:red"), "style body should be gone");
        assert!(!result.contains("Enable JavaScript"));
        assert!(!result.contains("<iframe"));
        assert!(!result.contains("rect"));
        assert!(!result.contains("chart"));
        assert!(result.contains("<p>Content</p>"));
    }

    #[test]
    fn test_removes_comments() {
        let html = "<body><!-- single --><p>Visible content</p><!--\n multi\n line\n--></body>";
        let result = preprocess(html);
        assert!(!result.contains("<!--"));
        assert!(!result.contains("multi"));
        assert!(result.contains("Visible content"));
    }

    #[test]
    fn test_removes_unlikely_candidates() {
        let html = r#"
            <body>
                <div id="sidebar">Sidebar content</div>
                <div id="main-content">Main content</div>
                <div class="banner-ad">Ad</div>
                <div class="comments">Reader comments</div>
                <nav role="navigation">Menu</nav>
                <div class="article">Article content</div>
            </body>
        "#;

        let result = preprocess(html);
        assert!(!result.contains("Sidebar content"));
        assert!(!result.contains("Ad<"));
        assert!(!result.contains("Reader comments"));
        assert!(!result.contains("Menu"));
        assert!(result.contains("Main content"));
        assert!(result.contains("Article content"));
    }

    #[test]
    fn test_keep_positive_can_be_disabled() {
        let html = r#"<body><div class="comment-content">Text</div></body>"#;
        assert!(preprocess(html).contains("Text"));

        let config = PreprocessConfig { keep_positive: false, ..Default::default() };
        assert!(!preprocess_html(html, &config).contains("Text"));
    }

    #[test]
    fn test_unlikely_removal_can_be_disabled() {
        let html = r#"<body><div class="sidebar">Kept</div></body>"#;
        let config = PreprocessConfig { remove_unlikely: false, ..Default::default() };
        assert!(preprocess_html(html, &config).contains("Kept"));
    }

    #[test]
    fn test_body_is_never_removed() {
        let html = r#"<html><body class="has-sidebar"><p>Still here</p></body></html>"#;
        assert!(preprocess(html).contains("Still here"));
    }

    #[test]
    fn test_resolves_relative_urls() {
        let base = Url::parse("https://example.com/blog/").unwrap();
        let html = r##"
            <body>
                <a href="/about">About</a>
                <a href="post.html">Post</a>
                <a href="#top">Top</a>
                <img src="image.jpg">
            </body>
        "##;

        let config = PreprocessConfig { base_url: Some(base), ..Default::default() };
        let result = preprocess_html(html, &config);
        assert!(result.contains(r#"href="https://example.com/about""#));
        assert!(result.contains(r#"href="https://example.com/blog/post.html""#));
        assert!(result.contains(r##"href="#top""##));
        assert!(result.contains(r#"src="https://example.com/blog/image.jpg""#));
    }

    #[test]
    fn test_promotes_lazy_image_source() {
        let html = r#"<body><img src="data:image/gif;base64,R0lGOD" data-src="/real.jpg"></body>"#;
        let base = Url::parse("https://example.com/post").unwrap();
        let config = PreprocessConfig { base_url: Some(base), ..Default::default() };
        let result = preprocess_html(html, &config);
        assert!(result.contains(r#"src="https://example.com/real.jpg""#));
    }

    #[test]
    fn test_removes_hidden_elements() {
        let html = r#"
            <body>
                <div style="display:none">Hidden content</div>
                <div style="visibility: hidden">Invisible content</div>
                <div hidden>Attribute hidden</div>
                <div aria-hidden="true">Aria hidden</div>
                <div>Visible content</div>
            </body>
        "#;

        let result = preprocess(html);
        assert!(!result.contains("Hidden content"));
        assert!(!result.contains("Invisible content"));
        assert!(!result.contains("Attribute hidden"));
        assert!(!result.contains("Aria hidden"));
        assert!(result.contains("Visible content"));
    }

    #[test]
    fn test_collapses_whitespace_between_tags() {
        let html = "<body>\n\n    <p>One</p>\n\t\t<p>Two</p></body>";
        assert_eq!(preprocess(html), "<body> <p>One</p> <p>Two</p></body>");
    }

    #[test]
    fn test_is_unlikely_candidate() {
        assert!(is_unlikely_candidate("sidebar ", true));
        assert!(is_unlikely_candidate(" footer-links", true));
        assert!(!is_unlikely_candidate("post-body ", true));
        assert!(!is_unlikely_candidate("comment-content ", true));
        assert!(is_unlikely_candidate("comment-content ", false));
    }
}
