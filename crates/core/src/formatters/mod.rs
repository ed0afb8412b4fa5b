//! Renderers for extracted articles.
//!
//! JSON output is the serde shape of [`crate::ExtractedArticle`]; these
//! modules cover plain text and Markdown.

pub mod markdown;
pub mod text;

pub use markdown::{FrontmatterExtras, MarkdownConfig, MarkdownFormatter, convert_to_markdown};
pub use text::{TextConfig, TextFormatter, convert_to_text, html_to_plain_text};
