//! The extracted article as returned to callers.
//!
//! [`ExtractedArticle`] serializes to the JSON shape the web app stores:
//! `title`, `content`, `textContent`, `excerpt`, `byline`, `length`, `url`
//! and `lead_image_url`, with `byline` and `lead_image_url` as `null` when
//! absent.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::formatters::markdown::{FrontmatterExtras, MarkdownConfig, convert_to_markdown_with_extras};
use crate::formatters::text::{TextConfig, convert_to_text};
use crate::metadata::Metadata;
use crate::readability::Readable;
use crate::{JaibError, Result};

/// Reading speed used for reading-time estimates.
pub const WORDS_PER_MINUTE: usize = 200;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\w'’-]+").expect("word pattern is valid"));

/// Output format options for article content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// The wire JSON shape.
    Json,
    /// Sanitized article HTML.
    Html,
    /// Block-aware plain text.
    Text,
    /// Markdown, optionally with TOML frontmatter.
    Markdown,
}

/// A successfully extracted article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedArticle {
    /// `"Untitled"` when the page offers nothing usable.
    pub title: String,

    /// Sanitized HTML of the main article body.
    pub content: String,

    /// Plain-text rendering of `content`.
    #[serde(rename = "textContent")]
    pub text_content: String,

    pub excerpt: String,

    pub byline: Option<String>,

    /// Character count of `text_content`.
    pub length: usize,

    /// The URL the caller asked for, unchanged.
    pub url: String,

    pub lead_image_url: Option<String>,

    /// Publisher name, when declared. Omitted from JSON when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
}

impl ExtractedArticle {
    /// Assembles the caller-facing article from an extraction result.
    pub fn from_readable(readable: Readable, url: impl Into<String>, lead_image_url: Option<String>) -> Self {
        Self {
            title: readable.title,
            content: readable.content,
            text_content: readable.text_content,
            excerpt: readable.excerpt,
            byline: readable.byline,
            length: readable.length,
            url: url.into(),
            lead_image_url,
            site_name: readable.site_name,
        }
    }

    pub fn word_count(&self) -> usize {
        count_words(&self.text_content)
    }

    /// Estimated reading time, rounded up, at [`WORDS_PER_MINUTE`].
    ///
    /// Zero only for an article without words.
    ///
    /// # Example
    ///
    /// ```rust
    /// use jaib_core::ExtractedArticle;
    ///
    /// let article = ExtractedArticle {
    ///     title: "T".into(),
    ///     content: String::new(),
    ///     text_content: "word ".repeat(201),
    ///     excerpt: String::new(),
    ///     byline: None,
    ///     length: 0,
    ///     url: "https://example.com".into(),
    ///     lead_image_url: None,
    ///     site_name: None,
    /// };
    /// assert_eq!(article.reading_time_minutes(), 2);
    /// ```
    pub fn reading_time_minutes(&self) -> usize {
        self.word_count().div_ceil(WORDS_PER_MINUTE)
    }

    /// Document-level fields in the shape the formatters take.
    pub fn metadata(&self) -> Metadata {
        Metadata {
            title: Some(self.title.clone()),
            byline: self.byline.clone(),
            excerpt: Some(self.excerpt.clone()).filter(|e| !e.is_empty()),
            site_name: self.site_name.clone(),
        }
    }

    /// Renders the article in `format` with default formatter settings.
    pub fn to_format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => self.to_json(),
            OutputFormat::Html => Ok(self.content.clone()),
            OutputFormat::Text => Ok(self.to_text(&TextConfig::default())),
            OutputFormat::Markdown => Ok(self.to_markdown(&MarkdownConfig::default())),
        }
    }

    /// Pretty-printed wire JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| JaibError::Internal(format!("Could not serialize article: {}", e)))
    }

    pub fn to_text(&self, config: &TextConfig) -> String {
        convert_to_text(&self.content, &self.metadata(), config)
    }

    /// Markdown; the frontmatter, when enabled, also carries url, lead image,
    /// word count and reading time.
    pub fn to_markdown(&self, config: &MarkdownConfig) -> String {
        let extras = FrontmatterExtras {
            url: Some(self.url.clone()),
            lead_image_url: self.lead_image_url.clone(),
            word_count: Some(self.word_count()),
            reading_time_minutes: Some(self.reading_time_minutes()),
        };
        convert_to_markdown_with_extras(&self.content, &self.metadata(), &extras, config)
    }
}

/// Counts words in plain text.
pub fn count_words(text: &str) -> usize {
    WORD.find_iter(text).count()
}
