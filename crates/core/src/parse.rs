//! Lenient HTML parsing and DOM navigation.
//!
//! [`Document`] wraps a scraper tree; [`Element`] wraps one element inside it
//! and adds the parent/child traversal the extractor needs.
//!
//! # Example
//!
//! ```rust
//! use jaib_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <h1>Title</h1>
//!             <p class="content">Paragraph</p>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! let paragraphs = doc.select("p.content").unwrap();
//! assert_eq!(paragraphs[0].text(), "Paragraph");
//! assert_eq!(paragraphs[0].parent().unwrap().tag_name(), "body");
//! ```

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::preprocess::{self, PreprocessConfig};
use crate::{JaibError, Result};

/// How much of the payload is inspected for binary content.
const BINARY_SNIFF_BYTES: usize = 1024;

/// A parsed HTML document.
///
/// Parsing is lenient: html5ever repairs malformed markup, so only payloads
/// that are not HTML at all are rejected.
pub struct Document {
    html: Html,
    base_url: Option<Url>,
}

impl Document {
    /// Parses HTML from a string without preprocessing.
    ///
    /// # Errors
    ///
    /// Returns [`JaibError::HtmlParseError`] for empty or whitespace-only input
    /// and for binary payloads (NUL bytes near the start).
    ///
    /// # Example
    ///
    /// ```rust
    /// use jaib_core::parse::Document;
    ///
    /// assert!(Document::parse("<p>Unclosed <b>markup").is_ok());
    /// assert!(Document::parse("   ").is_err());
    /// ```
    pub fn parse(html: &str) -> Result<Self> {
        check_parseable(html)?;
        Ok(Self { html: Html::parse_document(html), base_url: None })
    }

    /// Parses HTML after running the preprocessor over it.
    ///
    /// `base_url` is used both to resolve relative links during preprocessing
    /// and as the document's base for later lookups.
    pub fn parse_with_preprocessing(html: &str, base_url: Option<Url>) -> Result<Self> {
        check_parseable(html)?;

        let config = PreprocessConfig { base_url: base_url.clone(), ..Default::default() };
        let cleaned = preprocess::preprocess_html(html, &config);

        Ok(Self { html: Html::parse_document(&cleaned), base_url })
    }

    /// Attaches a base URL to an already parsed document.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Serializes the whole tree back to HTML.
    pub fn as_string(&self) -> String {
        self.html.html()
    }

    /// Selects elements using a CSS selector, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`JaibError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use jaib_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html).unwrap();
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(|element| Element { element }).collect())
    }

    /// First element matching `selector`, if any.
    pub fn select_first(&self, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).next().map(|element| Element { element }))
    }

    /// Content of the `<title>` element, trimmed.
    pub fn title(&self) -> Option<String> {
        let title = self.select_first("title").ok()??.text();
        let title = title.trim();
        (!title.is_empty()).then(|| title.to_string())
    }

    /// Concatenation of every text node in the document.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }
}

fn check_parseable(html: &str) -> Result<()> {
    if html.trim().is_empty() {
        return Err(JaibError::HtmlParseError("document is empty".to_string()));
    }

    let sniff_len = html.len().min(BINARY_SNIFF_BYTES);
    if html.as_bytes()[..sniff_len].contains(&0) {
        return Err(JaibError::HtmlParseError("payload looks binary, not HTML".to_string()));
    }

    Ok(())
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| JaibError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// A single element of a [`Document`].
///
/// Two `Element`s compare equal when they refer to the same node.
///
/// # Example
///
/// ```rust
/// use jaib_core::parse::Document;
///
/// let html = r#"<a href="https://example.com">Link text</a>"#;
/// let doc = Document::parse(html).unwrap();
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Concatenation of all text nodes under this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Lowercase tag name.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// The parent element, or `None` at the root.
    pub fn parent(&self) -> Option<Element<'a>> {
        self.element
            .parent()
            .and_then(ElementRef::wrap)
            .map(|element| Element { element })
    }

    /// Up to `depth` ancestors, nearest first.
    pub fn ancestors(&self, depth: usize) -> Vec<Element<'a>> {
        let mut ancestors = Vec::new();
        let mut current = self.parent();
        while let Some(ancestor) = current {
            if ancestors.len() == depth {
                break;
            }
            ancestors.push(ancestor);
            current = ancestor.parent();
        }
        ancestors
    }

    /// Whether `ancestor` contains this element.
    pub fn is_within(&self, ancestor: &Element<'a>) -> bool {
        let mut current = self.parent();
        while let Some(parent) = current {
            if parent == *ancestor {
                return true;
            }
            current = parent.parent();
        }
        false
    }

    /// Direct child elements in document order. Text nodes are skipped.
    pub fn children(&self) -> Vec<Element<'a>> {
        self.element
            .children()
            .filter_map(ElementRef::wrap)
            .map(|element| Element { element })
            .collect()
    }

    /// Whether this element has any direct, non-whitespace text node.
    pub fn has_own_text(&self) -> bool {
        self.element
            .children()
            .filter_map(|node| node.value().as_text())
            .any(|text| !text.trim().is_empty())
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`JaibError::HtmlParseError`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(|element| Element { element }).collect())
    }

    pub(crate) fn element_ref(&self) -> ElementRef<'a> {
        self.element
    }
}

impl<'a> From<ElementRef<'a>> for Element<'a> {
    fn from(element: ElementRef<'a>) -> Self {
        Self { element }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Test Page</title>
        </head>
        <body>
            <h1>Heading</h1>
            <div id="wrap">
                <p class="content">Paragraph 1</p>
                <p class="content">Paragraph 2</p>
            </div>
            <a href="https://example.com">Link</a>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.title(), Some("Test Page".to_string()));
    }

    #[test]
    fn test_parse_rejects_empty_input() {
        assert!(matches!(Document::parse(""), Err(JaibError::HtmlParseError(_))));
        assert!(matches!(Document::parse(" \n\t "), Err(JaibError::HtmlParseError(_))));
    }

    #[test]
    fn test_parse_rejects_binary_payload() {
        let payload = "\u{89}PNG\r\n\u{1a}\n\0\0\0\rIHDR";
        assert!(matches!(Document::parse(payload), Err(JaibError::HtmlParseError(_))));
    }

    #[test]
    fn test_parse_accepts_malformed_markup() {
        let doc = Document::parse("<div><p>Unclosed paragraph<div>stray").unwrap();
        assert!(doc.text_content().contains("Unclosed paragraph"));
    }

    #[test]
    fn test_parse_with_preprocessing_rejects_empty_input() {
        assert!(Document::parse_with_preprocessing("", None).is_err());
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text(), "Paragraph 1");
        assert_eq!(elements[1].text(), "Paragraph 2");
    }

    #[test]
    fn test_element_attributes() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("a").unwrap();

        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].attr("href"), Some("https://example.com"));
        assert_eq!(elements[0].text(), "Link");
    }

    #[test]
    fn test_parent_and_children() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let paragraph = doc.select_first("p").unwrap().unwrap();
        let wrap = paragraph.parent().unwrap();

        assert_eq!(wrap.attr("id"), Some("wrap"));
        assert_eq!(wrap.children().len(), 2);
        assert_eq!(wrap.children()[0], paragraph);
        assert!(!wrap.has_own_text());
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let paragraph = doc.select_first("p").unwrap().unwrap();
        let tags: Vec<String> = paragraph.ancestors(3).iter().map(Element::tag_name).collect();

        assert_eq!(tags, vec!["div", "body", "html"]);
        assert_eq!(paragraph.ancestors(1).len(), 1);
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(JaibError::HtmlParseError(_))));
    }

    #[test]
    fn test_text_content() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let text = doc.text_content();

        assert!(text.contains("Heading"));
        assert!(text.contains("Paragraph 1"));
        assert!(text.contains("Paragraph 2"));
    }
}
