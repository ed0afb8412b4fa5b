//! Article extraction for the Jaib read-later app.
//!
//! Given an article URL, [`Extractor::process`] fetches the page, isolates
//! the readable article with a Readability-style scorer, picks a lead image
//! and returns an [`ExtractedArticle`], or a classified [`ExtractionError`].
//!
//! The pieces are usable on their own: [`Document`] for lenient parsing,
//! [`Readability`] for extraction from HTML already in hand,
//! [`image::resolve_lead_image`] for preview images and the
//! [`formatters`] for text and Markdown output.

pub mod article;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod formatters;
pub mod image;
pub mod metadata;
pub mod parse;
pub mod pipeline;
pub mod postprocess;
pub mod preprocess;
pub mod readability;
pub mod request;
pub mod scoring;

pub use article::{ExtractedArticle, OutputFormat};
pub use error::{ErrorKind, ExtractionError, JaibError, Result};
#[doc(hidden)]
pub use extract::{ExtractConfig, ExtractedContent};
pub use extract::{extract_content, extract_content_with_config};
pub use fetch::{Fetch, FetchConfig, FetchedPage, HttpFetcher};
pub use fetch::{fetch_file, fetch_page, fetch_stdin, fetch_url};
pub use formatters::{MarkdownConfig, MarkdownFormatter, TextConfig, TextFormatter};
pub use formatters::{convert_to_markdown, convert_to_text, html_to_plain_text};
pub use image::resolve_lead_image;
pub use metadata::Metadata;
pub use parse::{Document, Element};
pub use pipeline::{Extractor, extract_article};
#[doc(hidden)]
pub use postprocess::PostProcessConfig;
pub use postprocess::postprocess_html;
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use preprocess::preprocess_html;
pub use readability::{
    Readability, ReadabilityConfig, ReadabilityConfigBuilder, Readable, is_probably_readable, parse, parse_with_url,
};
pub use request::ExtractionRequest;
#[doc(hidden)]
pub use scoring::{ScoreConfig, base_tag_score, class_id_weight, content_density_score, link_density};
