//! Title, byline, excerpt and site-name lookup.
//!
//! Metadata is read from the raw document, before preprocessing strips the
//! `<script type="application/ld+json">` blocks that often carry it.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::Document;

/// Bylines longer than this are assumed to be something else.
pub const MAX_BYLINE_CHARS: usize = 100;

/// Excerpts built from body text are capped at this many characters.
pub const MAX_EXCERPT_CHARS: usize = 300;

/// Separators between an article title and a site name.
const TITLE_SEPARATORS: &[&str] = &[" | ", " - ", " — ", " – ", " :: ", " » "];

static BY_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^by[\s:]+").expect("byline prefix is valid"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));
static SENTENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]+(\s|$)").expect("sentence pattern is valid"));

/// Document-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: Option<String>,
    pub byline: Option<String>,
    /// Only the publisher-provided description; body-text excerpts are
    /// derived later from the extracted content.
    pub excerpt: Option<String>,
    pub site_name: Option<String>,
}

impl Document {
    /// Title with priority fallback:
    /// 1. JSON-LD `headline`
    /// 2. Open Graph `og:title`
    /// 3. Twitter `twitter:title`
    /// 4. `<title>` with a trailing site name removed
    /// 5. First `<h1>`
    pub fn extract_title(&self) -> Option<String> {
        self.json_ld_string("headline")
            .or_else(|| self.meta_content("og:title"))
            .or_else(|| self.meta_content("twitter:title"))
            .or_else(|| self.title().map(|t| clean_title(&t)))
            .or_else(|| self.first_text("h1"))
            .filter(|t| !t.is_empty())
    }

    /// Byline with priority fallback:
    /// 1. JSON-LD `author` (string, object or list)
    /// 2. Meta `author`
    /// 3. `[rel="author"]`
    /// 4. `[itemprop="author"]`
    /// 5. Elements whose class or id mentions `byline` or `author`
    ///
    /// A leading "By" is stripped. Values over [`MAX_BYLINE_CHARS`] are
    /// skipped in favour of the next source.
    pub fn extract_byline(&self) -> Option<String> {
        let mut sources: Vec<Option<String>> = vec![
            self.json_ld_objects().iter().find_map(|obj| obj.get("author").and_then(json_ld_author)),
            self.meta_content("author"),
        ];

        for selector in ["[rel=\"author\"]", "[itemprop=\"author\"]"] {
            sources.push(self.first_element_text(selector));
        }

        for pattern in ["byline", "author"] {
            for attr in ["class", "id"] {
                let selector = format!("[{}*=\"{}\"]", attr, pattern);
                for el in self.select(&selector).unwrap_or_default().iter().take(3) {
                    sources.push(Some(el.attr("content").map_or_else(|| el.text(), str::to_string)));
                }
            }
        }

        sources.into_iter().flatten().find_map(|raw| clean_byline(&raw))
    }

    /// Publisher-provided description:
    /// 1. JSON-LD `description`
    /// 2. Open Graph `og:description`
    /// 3. Meta `description`
    pub fn extract_excerpt(&self) -> Option<String> {
        self.json_ld_string("description")
            .or_else(|| self.meta_content("og:description"))
            .or_else(|| self.meta_content("description"))
    }

    /// Site name from JSON-LD `publisher.name` or `og:site_name`.
    pub fn extract_site_name(&self) -> Option<String> {
        self.json_ld_objects()
            .iter()
            .find_map(|obj| obj.get("publisher")?.get("name")?.as_str().map(normalize_spaces))
            .filter(|name| !name.is_empty())
            .or_else(|| self.meta_content("og:site_name"))
    }

    pub fn extract_metadata(&self) -> Metadata {
        Metadata {
            title: self.extract_title(),
            byline: self.extract_byline(),
            excerpt: self.extract_excerpt(),
            site_name: self.extract_site_name(),
        }
    }

    /// Non-empty `content` of `meta[name=...]` or `meta[property=...]`.
    fn meta_content(&self, key: &str) -> Option<String> {
        ["name", "property", "itemprop"].iter().find_map(|attr| {
            let selector = format!("meta[{}=\"{}\"]", attr, key);
            self.select(&selector)
                .ok()?
                .iter()
                .filter_map(|el| el.attr("content"))
                .map(normalize_spaces)
                .find(|content| !content.is_empty())
        })
    }

    fn first_text(&self, selector: &str) -> Option<String> {
        let text = normalize_spaces(&self.select_first(selector).ok()??.text());
        (!text.is_empty()).then_some(text)
    }

    /// Like `first_text`, but prefers a `content` attribute (microdata).
    fn first_element_text(&self, selector: &str) -> Option<String> {
        let el = self.select_first(selector).ok()??;
        let text = el.attr("content").map_or_else(|| el.text(), str::to_string);
        let text = normalize_spaces(&text);
        (!text.is_empty()).then_some(text)
    }

    /// Every JSON-LD object on the page, with top-level arrays and `@graph`
    /// lists flattened.
    fn json_ld_objects(&self) -> Vec<Value> {
        let mut objects = Vec::new();
        for script in self.select("script[type=\"application/ld+json\"]").unwrap_or_default() {
            let Ok(value) = serde_json::from_str::<Value>(script.text().trim()) else {
                continue;
            };
            flatten_json_ld(value, &mut objects);
        }
        objects
    }

    fn json_ld_string(&self, key: &str) -> Option<String> {
        self.json_ld_objects()
            .iter()
            .filter_map(|obj| obj.get(key)?.as_str().map(normalize_spaces))
            .find(|value| !value.is_empty())
    }
}

fn flatten_json_ld(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.into_iter().for_each(|item| flatten_json_ld(item, out)),
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten_json_ld(graph, out);
            }
            out.push(Value::Object(map));
        }
        _ => {}
    }
}

/// Author names from a JSON-LD `author` value, joined with ", ".
fn json_ld_author(author: &Value) -> Option<String> {
    let names: Vec<String> = match author {
        Value::String(name) => vec![name.clone()],
        Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string).into_iter().collect(),
        Value::Array(items) => items.iter().filter_map(json_ld_author).collect(),
        _ => Vec::new(),
    };
    let names: Vec<String> = names.iter().map(String::as_str).map(normalize_spaces).filter(|n| !n.is_empty()).collect();
    (!names.is_empty()).then(|| names.join(", "))
}

/// Removes a trailing site name (`"Headline | Site"`) when the remaining
/// headline keeps at least three words.
///
/// # Example
///
/// ```rust
/// use jaib_core::metadata::clean_title;
///
/// assert_eq!(clean_title("Why Rust Works Well | Example Blog"), "Why Rust Works Well");
/// assert_eq!(clean_title("Home | Example Blog"), "Home | Example Blog");
/// ```
pub fn clean_title(raw: &str) -> String {
    let title = normalize_spaces(raw);
    let split = TITLE_SEPARATORS.iter().filter_map(|sep| title.rfind(sep)).max();

    if let Some(index) = split {
        let head = title[..index].trim();
        if head.split_whitespace().count() >= 3 {
            return head.to_string();
        }
    }

    title
}

/// Normalizes a byline candidate, or rejects it.
pub fn clean_byline(raw: &str) -> Option<String> {
    let text = normalize_spaces(raw);
    let text = BY_PREFIX.replace(&text, "").trim().to_string();

    if text.is_empty() || text.chars().count() > MAX_BYLINE_CHARS {
        None
    } else {
        Some(text)
    }
}

/// First one or two sentences of `text`, at most [`MAX_EXCERPT_CHARS`] long.
///
/// A second sentence is added only when the first is shorter than 100
/// characters.
pub fn excerpt_from_text(text: &str) -> String {
    let text = normalize_spaces(text);
    let mut sentences = SENTENCE.find_iter(&text).map(|m| m.as_str().trim());

    let excerpt = match sentences.next() {
        Some(first) if first.chars().count() < 100 => match sentences.next() {
            Some(second) => format!("{} {}", first, second),
            None => first.to_string(),
        },
        Some(first) => first.to_string(),
        None => text.clone(),
    };

    truncate_chars(&excerpt, MAX_EXCERPT_CHARS)
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let cut: String = text.chars().take(max - 3).collect();
    let cut = match cut.rfind(' ') {
        Some(space) if space > max / 2 => &cut[..space],
        _ => cut.as_str(),
    };
    format!("{}...", cut.trim_end())
}

pub(crate) fn normalize_spaces(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML_WITH_META: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Test Page Title | Example Site</title>
            <meta name="author" content="John Doe">
            <meta name="description" content="This is a test description of the page.">
            <meta property="og:title" content="OG Title">
            <meta property="og:description" content="OG Description">
            <meta property="og:site_name" content="Example Site">
            <script type="application/ld+json">
            {
                "@context": "https://schema.org",
                "@type": "Article",
                "headline": "JSON-LD Headline",
                "author": { "@type": "Person", "name": "Jane Smith" },
                "description": "JSON-LD Description",
                "publisher": { "@type": "Organization", "name": "JSON-LD Publisher" }
            }
            </script>
        </head>
        <body>
            <h1>Main Heading</h1>
            <p>This is the first paragraph of the content.</p>
        </body>
        </html>
    "#;

    const HTML_WITHOUT_META: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Simple Page</title>
        </head>
        <body>
            <h1>Heading</h1>
            <p>This is a paragraph with some text content.</p>
        </body>
        </html>
    "#;

    fn doc(html: &str) -> Document {
        Document::parse(html).unwrap()
    }

    #[test]
    fn test_title_priority() {
        assert_eq!(doc(HTML_WITH_META).extract_title().as_deref(), Some("JSON-LD Headline"));

        let og = r#"<html><head><meta property="og:title" content="OG Title"><title>Other</title></head></html>"#;
        assert_eq!(doc(og).extract_title().as_deref(), Some("OG Title"));

        let twitter = r#"<html><head><meta name="twitter:title" content="Tweet Title"><title>Other</title></head></html>"#;
        assert_eq!(doc(twitter).extract_title().as_deref(), Some("Tweet Title"));

        assert_eq!(doc(HTML_WITHOUT_META).extract_title().as_deref(), Some("Simple Page"));

        let h1_only = "<html><body><h1>  Only a\n heading </h1></body></html>";
        assert_eq!(doc(h1_only).extract_title().as_deref(), Some("Only a heading"));

        assert_eq!(doc("<html><body><p>nothing</p></body></html>").extract_title(), None);
    }

    #[test]
    fn test_title_from_graph_json_ld() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@context": "https://schema.org", "@graph": [
                {"@type": "WebSite", "name": "Site"},
                {"@type": "NewsArticle", "headline": "Graph Headline"}
            ]}
        </script></head></html>"#;
        assert_eq!(doc(html).extract_title().as_deref(), Some("Graph Headline"));
    }

    #[test]
    fn test_malformed_json_ld_is_ignored() {
        let html = r#"<html><head><script type="application/ld+json">{ not json</script><title>Fallback</title></head></html>"#;
        assert_eq!(doc(html).extract_title().as_deref(), Some("Fallback"));
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("A Long Article Headline | Example News"), "A Long Article Headline");
        assert_eq!(clean_title("Three Word Title - Site"), "Three Word Title");
        assert_eq!(clean_title("Site Section - A Long Headline Here | Site"), "Site Section - A Long Headline Here");
        assert_eq!(clean_title("Short - Site"), "Short - Site");
        assert_eq!(clean_title("  No   separator here "), "No separator here");
    }

    #[test]
    fn test_byline_from_json_ld() {
        assert_eq!(doc(HTML_WITH_META).extract_byline().as_deref(), Some("Jane Smith"));
    }

    #[test]
    fn test_byline_from_json_ld_author_list() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@type": "Article", "author": [{"name": "Ann Lee"}, {"name": "Bo Chen"}]}
        </script></head></html>"#;
        assert_eq!(doc(html).extract_byline().as_deref(), Some("Ann Lee, Bo Chen"));
    }

    #[test]
    fn test_byline_from_meta() {
        let html = r#"<html><head><meta name="author" content="John Doe"></head><body></body></html>"#;
        assert_eq!(doc(html).extract_byline().as_deref(), Some("John Doe"));
    }

    #[test]
    fn test_byline_from_markup() {
        let rel = r#"<html><body><a rel="author" href="/me">By Alex Writer</a></body></html>"#;
        assert_eq!(doc(rel).extract_byline().as_deref(), Some("Alex Writer"));

        let class = r#"<html><body><span class="post-byline">by: Sam Quill</span></body></html>"#;
        assert_eq!(doc(class).extract_byline().as_deref(), Some("Sam Quill"));
    }

    #[test]
    fn test_long_byline_is_rejected() {
        let long = "x".repeat(150);
        let html = format!(r#"<html><body><div class="author-bio">{long}</div><span id="author">Kim</span></body></html>"#);
        assert_eq!(doc(&html).extract_byline().as_deref(), Some("Kim"));
        assert_eq!(clean_byline(&long), None);
    }

    #[test]
    fn test_no_byline() {
        assert_eq!(doc(HTML_WITHOUT_META).extract_byline(), None);
    }

    #[test]
    fn test_excerpt_priority() {
        assert_eq!(doc(HTML_WITH_META).extract_excerpt().as_deref(), Some("JSON-LD Description"));

        let og = r#"<html><head><meta property="og:description" content="OG Description"><meta name="description" content="Meta"></head></html>"#;
        assert_eq!(doc(og).extract_excerpt().as_deref(), Some("OG Description"));

        let meta = r#"<html><head><meta name="description" content="Meta only"></head></html>"#;
        assert_eq!(doc(meta).extract_excerpt().as_deref(), Some("Meta only"));

        assert_eq!(doc(HTML_WITHOUT_META).extract_excerpt(), None);
    }

    #[test]
    fn test_site_name() {
        assert_eq!(doc(HTML_WITH_META).extract_site_name().as_deref(), Some("JSON-LD Publisher"));

        let og = r#"<html><head><meta property="og:site_name" content="Example Site"></head></html>"#;
        assert_eq!(doc(og).extract_site_name().as_deref(), Some("Example Site"));
    }

    #[test]
    fn test_excerpt_from_text() {
        assert_eq!(excerpt_from_text("Short one. Second sentence here. Third."), "Short one. Second sentence here.");

        let long_first = format!("{}. Next.", "word ".repeat(25).trim());
        assert_eq!(excerpt_from_text(&long_first), format!("{}.", "word ".repeat(25).trim()));

        assert_eq!(excerpt_from_text("No terminal punctuation"), "No terminal punctuation");
    }

    #[test]
    fn test_excerpt_is_capped() {
        let text = "lorem ipsum ".repeat(60);
        let excerpt = excerpt_from_text(&text);
        assert!(excerpt.chars().count() <= MAX_EXCERPT_CHARS);
        assert!(excerpt.ends_with("..."));
    }
}
