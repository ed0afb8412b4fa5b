//! Readability extraction: metadata plus the main article body.
//!
//! The main entry point is [`Readability`], configured through
//! [`ReadabilityConfig::builder`]. Metadata is read from the document as
//! fetched; content is scored on a preprocessed copy with scripts, chrome
//! and hidden elements removed.
//!
//! # Example
//!
//! ```rust
//! use jaib_core::readability::parse_with_url;
//!
//! let html = r#"<html><head><title>Why Parsers Are Fun | Blog</title></head><body><article class="post">
//!     <p>Parsers turn flat text into structure, and that structure is what every later stage relies on.</p>
//!     <p>Good parsers recover from errors, report positions, and keep going when the input is messy.</p>
//!     <p>Writing one by hand teaches more about a language than almost any other exercise, honestly.</p>
//! </article></body></html>"#;
//!
//! let readable = parse_with_url(html, "https://example.com/parsers").unwrap();
//! assert_eq!(readable.title, "Why Parsers Are Fun");
//! assert!(readable.text_content.starts_with("Parsers turn flat text"));
//! ```

use url::Url;

use crate::extract::{ExtractConfig, extract_content_with_config, score_candidates};
use crate::formatters::text::html_to_plain_text;
use crate::metadata::{Metadata, excerpt_from_text};
use crate::parse::Document;
use crate::postprocess::PostProcessConfig;
use crate::preprocess::{PreprocessConfig, preprocess_html};
use crate::{JaibError, Result};

/// Title used when the page offers none.
pub const UNTITLED: &str = "Untitled";

/// Shortest paragraph an excerpt is taken from; skips bylines and captions.
const MIN_EXCERPT_PARAGRAPH_CHARS: usize = 80;

/// Configuration for the Readability extractor.
///
/// # Example
///
/// ```rust
/// use jaib_core::ReadabilityConfig;
///
/// let config = ReadabilityConfig::builder()
///     .min_score(25.0)
///     .preserve_images(false)
///     .build();
/// assert!(!config.preserve_images);
/// ```
#[derive(Debug, Clone)]
pub struct ReadabilityConfig {
    /// Minimum score the best candidate must reach (default: 20.0).
    pub min_score: f64,

    /// Paragraphs shorter than this are not scored (default: 25).
    pub min_paragraph_chars: usize,

    /// Number of top candidates considered for promotion (default: 5).
    pub nb_top_candidates: usize,

    /// Maximum paragraphs to score (0 = unlimited, default: 0).
    pub max_elems_to_parse: usize,

    /// Sibling threshold as a fraction of the winner's score (default: 0.2).
    pub sibling_threshold: f64,

    /// Whether to remove unlikely candidates before scoring (default: true).
    pub remove_unlikely: bool,

    /// Whether to preserve class attributes in output HTML (default: false).
    pub keep_classes: bool,

    /// Whether to preserve images in output HTML (default: true).
    pub preserve_images: bool,
}

impl Default for ReadabilityConfig {
    fn default() -> Self {
        Self {
            min_score: 20.0,
            min_paragraph_chars: 25,
            nb_top_candidates: 5,
            max_elems_to_parse: 0,
            sibling_threshold: 0.2,
            remove_unlikely: true,
            keep_classes: false,
            preserve_images: true,
        }
    }
}

impl ReadabilityConfig {
    pub fn builder() -> ReadabilityConfigBuilder {
        ReadabilityConfigBuilder::new()
    }

    fn extract_config(&self, base_url: Option<Url>) -> ExtractConfig {
        ExtractConfig {
            min_score_threshold: self.min_score,
            min_paragraph_chars: self.min_paragraph_chars,
            max_top_candidates: self.nb_top_candidates,
            max_elements: self.max_elems_to_parse,
            sibling_threshold: self.sibling_threshold,
            postprocess: PostProcessConfig {
                strip_images: !self.preserve_images,
                keep_classes: self.keep_classes,
                base_url,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn preprocess_config(&self, base_url: Option<Url>) -> PreprocessConfig {
        PreprocessConfig { remove_unlikely: self.remove_unlikely, base_url, ..Default::default() }
    }
}

/// Fluent builder for [`ReadabilityConfig`].
pub struct ReadabilityConfigBuilder {
    config: ReadabilityConfig,
}

impl ReadabilityConfigBuilder {
    pub fn new() -> Self {
        Self { config: ReadabilityConfig::default() }
    }

    pub fn min_score(mut self, value: f64) -> Self {
        self.config.min_score = value;
        self
    }

    pub fn min_paragraph_chars(mut self, value: usize) -> Self {
        self.config.min_paragraph_chars = value;
        self
    }

    pub fn nb_top_candidates(mut self, value: usize) -> Self {
        self.config.nb_top_candidates = value;
        self
    }

    pub fn max_elems_to_parse(mut self, value: usize) -> Self {
        self.config.max_elems_to_parse = value;
        self
    }

    pub fn sibling_threshold(mut self, value: f64) -> Self {
        self.config.sibling_threshold = value;
        self
    }

    pub fn remove_unlikely(mut self, value: bool) -> Self {
        self.config.remove_unlikely = value;
        self
    }

    pub fn keep_classes(mut self, value: bool) -> Self {
        self.config.keep_classes = value;
        self
    }

    pub fn preserve_images(mut self, value: bool) -> Self {
        self.config.preserve_images = value;
        self
    }

    pub fn build(self) -> ReadabilityConfig {
        self.config
    }
}

impl Default for ReadabilityConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a successful extraction, before the caller's URL and lead
/// image are attached.
#[derive(Debug, Clone)]
pub struct Readable {
    pub title: String,
    pub content: String,
    pub text_content: String,
    pub excerpt: String,
    pub byline: Option<String>,
    /// Character count of `text_content`.
    pub length: usize,
    pub site_name: Option<String>,
    /// Score of the winning candidate.
    pub top_score: f64,
}

impl Readable {
    pub fn metadata(&self) -> Metadata {
        Metadata {
            title: Some(self.title.clone()),
            byline: self.byline.clone(),
            excerpt: Some(self.excerpt.clone()),
            site_name: self.site_name.clone(),
        }
    }
}

/// Article extractor.
///
/// Holds only configuration; one instance can serve any number of documents
/// from any number of threads.
#[derive(Debug, Clone, Default)]
pub struct Readability {
    config: ReadabilityConfig,
}

impl Readability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReadabilityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReadabilityConfig {
        &self.config
    }

    /// Extracts the article from an already parsed document.
    ///
    /// `page_url` resolves relative links in the content; when `None`, the
    /// document's own base URL is used if it has one.
    ///
    /// # Errors
    ///
    /// [`JaibError::NoContent`] when nothing scores at all,
    /// [`JaibError::NotReadable`] when the best candidate falls short of
    /// `min_score`.
    pub fn extract(&self, doc: &Document, page_url: Option<&Url>) -> Result<Readable> {
        let base_url = page_url.or(doc.base_url()).cloned();
        let metadata = doc.extract_metadata();

        let cleaned = preprocess_html(&doc.as_string(), &self.config.preprocess_config(base_url.clone()));
        let mut content_doc = Document::parse(&cleaned)?;
        if let Some(base) = &base_url {
            content_doc = content_doc.with_base_url(base.clone());
        }

        let extracted = extract_content_with_config(&content_doc, &self.config.extract_config(base_url))?;
        let text_content = html_to_plain_text(&extracted.content);
        let length = text_content.chars().count();

        let excerpt = metadata
            .excerpt
            .unwrap_or_else(|| excerpt_from_text(&lead_paragraph(&extracted.content, &text_content)));

        tracing::debug!(
            top_score = extracted.top_score,
            elements = extracted.element_count,
            length,
            "Extracted article"
        );

        Ok(Readable {
            title: metadata.title.unwrap_or_else(|| UNTITLED.to_string()),
            content: extracted.content,
            text_content,
            excerpt,
            byline: metadata.byline,
            length,
            site_name: metadata.site_name,
            top_score: extracted.top_score,
        })
    }

    /// Parses `html` and extracts the article.
    pub fn parse(&self, html: &str) -> Result<Readable> {
        let doc = Document::parse(html)?;
        self.extract(&doc, None)
    }

    /// Parses `html` served from `url` and extracts the article.
    ///
    /// # Errors
    ///
    /// Returns [`JaibError::InvalidUrl`] if `url` does not parse.
    pub fn parse_with_url(&self, html: &str, url: &str) -> Result<Readable> {
        let base_url = Url::parse(url).map_err(|e| JaibError::InvalidUrl(e.to_string()))?;
        let doc = Document::parse(html)?;
        self.extract(&doc, Some(&base_url))
    }

    /// Cheap check for whether `html` looks like an article.
    ///
    /// Runs preprocessing and scoring but skips sibling collection, cleanup
    /// and metadata.
    ///
    /// # Example
    ///
    /// ```rust
    /// use jaib_core::Readability;
    ///
    /// let reader = Readability::new();
    /// let nav = r##"<html><body><nav><a href="#">Home</a> <a href="#">About</a></nav></body></html>"##;
    /// assert!(!reader.is_probably_readable(nav));
    /// ```
    pub fn is_probably_readable(&self, html: &str) -> bool {
        let Ok(doc) = Document::parse_with_preprocessing(html, None) else {
            return false;
        };

        let config = self.config.extract_config(None);
        score_candidates(&doc, &config)
            .iter()
            .map(|candidate| candidate.score)
            .fold(None, |best: Option<f64>, score| Some(best.map_or(score, |b| b.max(score))))
            .is_some_and(|best| best >= self.config.min_score)
    }
}

/// Text of the first paragraph long enough to summarize, or the whole text.
fn lead_paragraph(content: &str, text_content: &str) -> String {
    Document::parse(content)
        .ok()
        .and_then(|doc| {
            doc.select("p")
                .ok()?
                .into_iter()
                .map(|p| p.text())
                .find(|text| text.trim().chars().count() >= MIN_EXCERPT_PARAGRAPH_CHARS)
        })
        .unwrap_or_else(|| text_content.to_string())
}

/// Extracts with the default configuration.
pub fn parse(html: &str) -> Result<Readable> {
    Readability::new().parse(html)
}

/// Extracts with the default configuration, resolving links against `url`.
pub fn parse_with_url(html: &str, url: &str) -> Result<Readable> {
    Readability::new().parse_with_url(html, url)
}

pub fn is_probably_readable(html: &str) -> bool {
    Readability::new().is_probably_readable(html)
}
