use scraper::node::Node;
use scraper::{ElementRef, Html};

use crate::metadata::Metadata;

/// Elements that start a new paragraph in plain text output.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "section", "article", "header", "footer", "aside", "nav", "main", "h1", "h2", "h3", "h4", "h5", "h6",
    "ul", "ol", "li", "dl", "dt", "dd", "blockquote", "figure", "figcaption", "table", "tr", "hr", "address",
];

/// Configuration for plain text output
#[derive(Debug, Clone, Default)]
pub struct TextConfig {
    /// Wrap lines at specified width (0 = no wrapping)
    pub line_width: usize,

    /// Include a title/byline header
    pub include_header: bool,
}

/// Plain text formatter for converting HTML to readable plain text
pub struct TextFormatter {
    config: TextConfig,
}

impl TextFormatter {
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, html: &str, metadata: &Metadata) -> String {
        convert_to_text(html, metadata, &self.config)
    }
}

/// Convert HTML content to plain text with specified configuration
pub fn convert_to_text(html: &str, metadata: &Metadata, config: &TextConfig) -> String {
    let mut output = String::new();

    if config.include_header {
        output.push_str(&generate_header(metadata));
        output.push('\n');
    }

    let text = html_to_plain_text(html);
    if config.line_width > 0 {
        output.push_str(&wrap_text(&text, config.line_width));
    } else {
        output.push_str(&text);
    }

    output.trim().to_string()
}

/// Renders HTML as plain text.
///
/// Block elements become paragraphs separated by a blank line, `<br>` becomes
/// a line break, `<pre>` keeps its whitespace and everything else has its
/// whitespace collapsed.
///
/// # Example
///
/// ```rust
/// use jaib_core::formatters::html_to_plain_text;
///
/// let text = html_to_plain_text("<h2>Intro</h2><p>Hello   <b>world</b>.</p><p>Bye</p>");
/// assert_eq!(text, "Intro\n\nHello world.\n\nBye");
/// ```
pub fn html_to_plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut writer = BlockWriter::default();
    writer.walk(fragment.root_element());
    writer.finish()
}

/// Pending work for [`BlockWriter::walk`], popped in document order.
enum Step<'a> {
    Element(ElementRef<'a>),
    Text(&'a str),
    EndBlock,
}

fn push_children<'a>(stack: &mut Vec<Step<'a>>, parent: ElementRef<'a>) {
    for child in parent.children().rev() {
        match child.value() {
            Node::Text(text) => stack.push(Step::Text(text)),
            Node::Element(_) => stack.extend(ElementRef::wrap(child).map(Step::Element)),
            _ => {}
        }
    }
}

#[derive(Default)]
struct BlockWriter {
    blocks: Vec<String>,
    current: String,
}

impl BlockWriter {
    fn walk(&mut self, root: ElementRef<'_>) {
        let mut stack = Vec::new();
        push_children(&mut stack, root);

        while let Some(step) = stack.pop() {
            match step {
                Step::Text(text) => self.push_inline(text),
                Step::EndBlock => self.flush(),
                Step::Element(element) => match element.value().name() {
                    "script" | "style" | "noscript" | "template" => {}
                    "br" => self.current.push('\n'),
                    "pre" => {
                        self.flush();
                        let raw: String = element.text().collect();
                        let raw = raw.trim_matches('\n');
                        if !raw.trim().is_empty() {
                            self.blocks.push(raw.to_string());
                        }
                    }
                    name => {
                        if BLOCK_ELEMENTS.contains(&name) {
                            self.flush();
                            stack.push(Step::EndBlock);
                        }
                        push_children(&mut stack, element);
                    }
                },
            }
        }
    }

    fn push_inline(&mut self, text: &str) {
        for (i, word) in text.split_whitespace().enumerate() {
            let needs_space = if i == 0 { text.starts_with(char::is_whitespace) } else { true };
            if needs_space && !self.current.is_empty() && !self.current.ends_with(['\n', ' ']) {
                self.current.push(' ');
            }
            self.current.push_str(word);
        }
        if text.ends_with(char::is_whitespace) && !self.current.is_empty() && !self.current.ends_with(['\n', ' ']) {
            self.current.push(' ');
        }
    }

    fn flush(&mut self) {
        let block = self.current.lines().map(str::trim).collect::<Vec<_>>().join("\n");
        let block = block.trim();
        if !block.is_empty() {
            self.blocks.push(block.to_string());
        }
        self.current.clear();
    }

    fn finish(mut self) -> String {
        self.flush();
        self.blocks.join("\n\n")
    }
}

/// Title underlined with `=`, then a `By: ... | Site: ...` line.
fn generate_header(metadata: &Metadata) -> String {
    let mut header = String::new();

    if let Some(title) = &metadata.title {
        header.push_str(title);
        header.push('\n');
        header.push_str(&"=".repeat(title.chars().count()));
        header.push('\n');
    }

    let mut meta_parts = Vec::new();

    if let Some(byline) = &metadata.byline {
        meta_parts.push(format!("By: {}", byline));
    }

    if let Some(site) = &metadata.site_name {
        meta_parts.push(format!("Site: {}", site));
    }

    if !meta_parts.is_empty() {
        header.push_str(&meta_parts.join(" | "));
        header.push('\n');
    }

    header
}

/// Wraps each paragraph to `width` columns. Paragraph breaks are kept.
fn wrap_text(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }

    text.split("\n\n")
        .map(|paragraph| {
            paragraph
                .lines()
                .map(|line| wrap_words(&line.split_whitespace().collect::<Vec<_>>(), width))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn wrap_words(words: &[&str], width: usize) -> String {
    let mut lines = Vec::new();
    let mut current_line: Vec<&str> = Vec::new();
    let mut current_length = 0;

    for &word in words {
        let word_len = word.chars().count();

        if current_length == 0 {
            current_line.push(word);
            current_length = word_len;
        } else if current_length + 1 + word_len <= width {
            current_length += 1 + word_len;
            current_line.push(word);
        } else {
            lines.push(current_line.join(" "));
            current_line = vec![word];
            current_length = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line.join(" "));
    }

    lines.join("\n")
}
