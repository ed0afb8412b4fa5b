//! Cleanup of the extracted article HTML.
//!
//! The extracted fragment is re-parsed and serialized back out, dropping or
//! rewriting nodes on the way. Working on the tree rather than on the markup
//! keeps nesting intact however messy the source was.

use scraper::node::Node;
use scraper::{ElementRef, Html};
use url::Url;

use crate::parse::Element;
use crate::preprocess::absolutize;
use crate::scoring::link_density;

/// Dropped outright, together with their content.
const UNSAFE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "iframe", "object", "embed", "form"];

/// Removed when they carry no text and no media.
const PRUNABLE_WHEN_EMPTY: &[&str] = &[
    "div", "p", "span", "section", "article", "aside", "header", "footer", "nav", "ul", "ol", "li", "blockquote", "h1",
    "h2", "h3", "h4", "h5", "h6", "figure", "figcaption", "table", "tbody", "tr", "td",
];

/// Removed when most of their text is link text.
const PRUNABLE_WHEN_LINKY: &[&str] = &["div", "p", "section", "aside", "nav", "ul", "ol", "li"];

const IMAGE_ELEMENTS: &[&str] = &["img", "picture"];
const MEDIA_ELEMENTS: &[&str] = &["img", "picture", "video", "audio", "source"];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Configuration for HTML post-processing cleanup.
#[derive(Debug, Clone)]
pub struct PostProcessConfig {
    /// Drop containers that end up with no text and no media.
    pub remove_empty_nodes: bool,
    /// Drop blocks whose link density exceeds `max_link_density`.
    pub remove_high_link_density: bool,
    pub max_link_density: f64,
    /// Replace a `div` whose only content is another `div` with that child.
    pub clean_nested_divs: bool,
    /// Drop `img` and `picture` elements.
    pub strip_images: bool,
    /// Keep `class` attributes (default: false).
    pub keep_classes: bool,
    /// Base for resolving relative `href`/`src`.
    pub base_url: Option<Url>,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            remove_empty_nodes: true,
            remove_high_link_density: true,
            max_link_density: 0.5,
            clean_nested_divs: true,
            strip_images: false,
            keep_classes: false,
            base_url: None,
        }
    }
}

/// Elements nested deeper than this are written out as plain text.
const MAX_NESTING_DEPTH: usize = 256;

/// Post-process extracted HTML.
///
/// Comments (IE conditional comments included), scripts, inline styles and
/// event-handler attributes never survive, whatever the configuration.
/// Subtrees nested deeper than [`MAX_NESTING_DEPTH`] are flattened to their
/// text.
pub fn postprocess_html(html: &str, config: &PostProcessConfig) -> String {
    let fragment = Html::parse_fragment(html);
    let mut output = String::with_capacity(html.len());
    let mut stack = Vec::new();
    push_children(&mut stack, fragment.root_element(), 0);

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Text(text) => escape_into(text, false, &mut output),
            Frame::Element(element, depth) => open_element(element, depth, config, &mut stack, &mut output),
            Frame::Close(name) => {
                output.push_str("</");
                output.push_str(name);
                output.push('>');
            }
        }
    }

    output
}

/// Pending serializer work, popped in document order.
enum Frame<'a> {
    Element(ElementRef<'a>, usize),
    Text(&'a str),
    Close(&'a str),
}

fn push_children<'a>(stack: &mut Vec<Frame<'a>>, parent: ElementRef<'a>, depth: usize) {
    for child in parent.children().rev() {
        match child.value() {
            Node::Text(text) => stack.push(Frame::Text(text)),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    stack.push(Frame::Element(element, depth));
                }
            }
            _ => {}
        }
    }
}

fn open_element<'a>(
    element: ElementRef<'a>, depth: usize, config: &PostProcessConfig, stack: &mut Vec<Frame<'a>>, out: &mut String,
) {
    let name = element.value().name();

    if UNSAFE_ELEMENTS.contains(&name) || (config.strip_images && IMAGE_ELEMENTS.contains(&name)) {
        return;
    }
    if depth >= MAX_NESTING_DEPTH {
        write_flattened_text(element, out);
        return;
    }
    if should_prune(element, config) {
        return;
    }
    if config.clean_nested_divs
        && name == "div"
        && let Some(inner) = sole_div_child(element)
    {
        stack.push(Frame::Element(inner, depth + 1));
        return;
    }

    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        if let Some(value) = clean_attribute(attr, value, config) {
            out.push(' ');
            out.push_str(attr);
            out.push_str("=\"");
            escape_into(&value, true, out);
            out.push('"');
        }
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    stack.push(Frame::Close(name));
    push_children(stack, element, depth + 1);
}

/// Text of `element`, minus anything inside unsafe elements.
fn write_flattened_text(element: ElementRef<'_>, out: &mut String) {
    let mut stack = Vec::new();
    push_children(&mut stack, element, 0);

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Text(text) => escape_into(text, false, out),
            Frame::Element(child, _) if !UNSAFE_ELEMENTS.contains(&child.value().name()) => {
                push_children(&mut stack, child, 0);
            }
            _ => {}
        }
    }
}

fn should_prune(element: ElementRef<'_>, config: &PostProcessConfig) -> bool {
    let name = element.value().name();
    let wrapped = Element::from(element);

    if config.remove_empty_nodes
        && PRUNABLE_WHEN_EMPTY.contains(&name)
        && wrapped.text().trim().is_empty()
        && !has_media(element, config)
    {
        return true;
    }

    config.remove_high_link_density
        && PRUNABLE_WHEN_LINKY.contains(&name)
        && link_density(&wrapped) > config.max_link_density
}

fn has_media(element: ElementRef<'_>, config: &PostProcessConfig) -> bool {
    element.descendants().filter_map(ElementRef::wrap).any(|el| {
        let name = el.value().name();
        MEDIA_ELEMENTS.contains(&name) && !(config.strip_images && IMAGE_ELEMENTS.contains(&name))
    })
}

/// The single `div` child of a `div` with no text of its own.
fn sole_div_child(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if Element::from(element).has_own_text() {
        return None;
    }

    let mut children = element.children().filter_map(ElementRef::wrap);
    let only = children.next()?;
    (children.next().is_none() && only.value().name() == "div").then_some(only)
}

fn clean_attribute(attr: &str, value: &str, config: &PostProcessConfig) -> Option<String> {
    let lowered = attr.to_ascii_lowercase();
    if lowered.starts_with("on") || lowered == "style" || (lowered == "class" && !config.keep_classes) {
        return None;
    }

    if matches!(lowered.as_str(), "href" | "src") {
        if value.trim_start().to_ascii_lowercase().starts_with("javascript:") {
            return None;
        }
        if let Some(base) = &config.base_url
            && let Some(absolute) = absolutize(base, value)
        {
            return Some(absolute);
        }
    }

    Some(value.to_string())
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}
