use lol_html::{Settings, element};
use scraper::{Html, Selector};
use std::collections::HashSet;

use crate::metadata::Metadata;
use crate::preprocess::rewrite;

/// Configuration for Markdown conversion
#[derive(Debug, Clone, Default)]
pub struct MarkdownConfig {
    /// Include TOML frontmatter with metadata
    pub include_frontmatter: bool,
    /// Generate reference table for all links
    pub include_references: bool,
    /// Strip images from output
    pub strip_images: bool,
    /// Include title as H1 heading at the start of content
    pub include_title_heading: bool,
}

/// A collected link reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReference {
    pub text: String,
    pub url: String,
}

/// Extra frontmatter values that are not document metadata.
#[derive(Debug, Clone, Default)]
pub struct FrontmatterExtras {
    pub url: Option<String>,
    pub lead_image_url: Option<String>,
    pub word_count: Option<usize>,
    pub reading_time_minutes: Option<usize>,
}

/// Convert HTML content to Markdown with optional frontmatter and references
pub fn convert_to_markdown(html: &str, metadata: &Metadata, config: &MarkdownConfig) -> String {
    convert_to_markdown_with_extras(html, metadata, &FrontmatterExtras::default(), config)
}

/// Like [`convert_to_markdown`], with additional frontmatter keys.
pub fn convert_to_markdown_with_extras(
    html: &str, metadata: &Metadata, extras: &FrontmatterExtras, config: &MarkdownConfig,
) -> String {
    let mut output = String::new();

    if config.include_frontmatter {
        output.push_str(&generate_frontmatter(metadata, extras));
        output.push('\n');
    }

    if config.include_title_heading
        && let Some(title) = &metadata.title
    {
        output.push_str(&format!("# {}\n\n", title));
    }

    let processed_html = if config.strip_images { strip_images(html) } else { html.to_string() };

    output.push_str(html_to_markdown(&processed_html).trim());

    if config.include_references {
        let links = extract_links(&processed_html);
        if !links.is_empty() {
            output.push_str("\n\n## References\n\n");
            output.push_str(&generate_reference_table(&links));
        }
    }

    output
}

fn generate_frontmatter(metadata: &Metadata, extras: &FrontmatterExtras) -> String {
    let mut frontmatter = String::from("+++");

    let strings = [
        ("title", metadata.title.as_deref()),
        ("byline", metadata.byline.as_deref()),
        ("site", metadata.site_name.as_deref()),
        ("excerpt", metadata.excerpt.as_deref()),
        ("url", extras.url.as_deref()),
        ("lead_image_url", extras.lead_image_url.as_deref()),
    ];
    for (key, value) in strings {
        if let Some(value) = value {
            frontmatter.push_str(&format!("\n{} = {}", key, toml_escape_string(value)));
        }
    }

    if let Some(word_count) = extras.word_count {
        frontmatter.push_str(&format!("\nword_count = {}", word_count));
    }

    if let Some(minutes) = extras.reading_time_minutes {
        frontmatter.push_str(&format!("\nreading_time_minutes = {}", minutes));
    }

    frontmatter.push_str("\n+++\n");
    frontmatter
}

/// Quotes a string as a TOML basic string.
fn toml_escape_string(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t");
    format!("\"{}\"", escaped)
}

#[cfg(feature = "markdown")]
fn html_to_markdown(html: &str) -> String {
    htmd::convert(html).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Markdown conversion failed, falling back to plain text");
        super::html_to_plain_text(html)
    })
}

#[cfg(not(feature = "markdown"))]
fn html_to_markdown(html: &str) -> String {
    super::html_to_plain_text(html)
}

fn strip_images(html: &str) -> String {
    rewrite(
        html,
        Settings {
            element_content_handlers: vec![
                element!("img", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("picture", |el| {
                    el.remove();
                    Ok(())
                }),
            ],
            ..Settings::new()
        },
    )
}

/// All distinct `a[href]` links with visible text, in document order.
pub fn extract_links(html: &str) -> Vec<LinkReference> {
    let fragment = Html::parse_fragment(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let mut seen = HashSet::new();

    fragment
        .select(&selector)
        .filter_map(|element| {
            let text = element.text().collect::<String>().trim().to_string();
            let url = element.value().attr("href")?.trim().to_string();
            (!text.is_empty() && !url.is_empty() && seen.insert(url.clone())).then_some(LinkReference { text, url })
        })
        .collect()
}

fn generate_reference_table(links: &[LinkReference]) -> String {
    let mut table = String::from("| # | Text | URL |\n");
    table.push_str("|---|------|-----|\n");

    for (i, link) in links.iter().enumerate() {
        table.push_str(&format!("| {} | {} | {} |\n", i + 1, escape_pipe(&link.text), escape_pipe(&link.url)));
    }

    table
}

fn escape_pipe(s: &str) -> String {
    s.replace('|', "\\|")
}

/// Markdown formatter with configurable options
pub struct MarkdownFormatter {
    config: MarkdownConfig,
}

impl MarkdownFormatter {
    pub fn new(config: MarkdownConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, html: &str, metadata: &Metadata) -> String {
        convert_to_markdown(html, metadata, &self.config)
    }
}
