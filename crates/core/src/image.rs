//! Lead image selection.
//!
//! Publisher-declared preview images win over anything found in the body,
//! since they are the ones sized and cropped for cards.

use scraper::Html;
use url::Url;

use crate::Document;
use crate::parse::Element;

/// Meta tags probed for a preview image, highest priority first.
const META_IMAGE_SELECTORS: &[&str] =
    &["meta[property=\"og:image\"]", "meta[name=\"twitter:image\"]", "meta[itemprop=\"image\"]"];

/// Picks one representative image for the article.
///
/// 1. The first non-empty `content` of `og:image`, `twitter:image`, then
///    `itemprop="image"` meta tags.
/// 2. The first `<img>` in the extracted `content` whose `src` is non-empty
///    and not a `data:` URI.
///
/// Candidates that cannot be turned into an absolute URL are logged and
/// skipped. Returns `None` when nothing usable is found.
///
/// # Example
///
/// ```rust
/// use jaib_core::{Document, image::resolve_lead_image};
/// use url::Url;
///
/// let html = r#"<html><head><meta property="og:image" content="/cover.jpg"></head></html>"#;
/// let doc = Document::parse(html).unwrap();
/// let base = Url::parse("https://example.com/posts/1").unwrap();
///
/// assert_eq!(
///     resolve_lead_image(&doc, None, &base).as_deref(),
///     Some("https://example.com/cover.jpg")
/// );
/// ```
pub fn resolve_lead_image(doc: &Document, content: Option<&str>, base: &Url) -> Option<String> {
    let from_meta = META_IMAGE_SELECTORS
        .iter()
        .filter_map(|selector| doc.select(selector).ok())
        .flat_map(|elements| elements.into_iter().filter_map(|el| el.attr("content")));

    if let Some(url) = first_usable(from_meta, base, "meta") {
        return Some(url);
    }

    let fragment = Html::parse_fragment(content?);
    let from_body = Element::from(fragment.root_element())
        .select("img")
        .unwrap_or_default()
        .into_iter()
        .filter_map(|img| img.attr("src"));

    first_usable(from_body, base, "content")
}

fn first_usable<'a>(candidates: impl Iterator<Item = &'a str>, base: &Url, source: &str) -> Option<String> {
    for raw in candidates {
        let raw = raw.trim();
        if raw.is_empty() || is_data_uri(raw) {
            continue;
        }

        match normalize_image_url(raw, base) {
            Some(url) => {
                tracing::debug!(source, url = %url, "Selected lead image");
                return Some(url);
            }
            None => tracing::warn!(source, candidate = raw, "Discarding unresolvable image URL"),
        }
    }
    None
}

/// Turns an image reference into an absolute http(s) URL.
///
/// Protocol-relative references take the page scheme, root-relative ones the
/// page origin, everything else is resolved against the page URL.
///
/// # Example
///
/// ```rust
/// use jaib_core::image::normalize_image_url;
/// use url::Url;
///
/// let base = Url::parse("https://news.example.com/a/b.html").unwrap();
/// assert_eq!(normalize_image_url("//cdn.example.com/x.png", &base).as_deref(), Some("https://cdn.example.com/x.png"));
/// assert_eq!(normalize_image_url("/img/x.png", &base).as_deref(), Some("https://news.example.com/img/x.png"));
/// assert_eq!(normalize_image_url("x.png", &base).as_deref(), Some("https://news.example.com/a/x.png"));
/// ```
pub fn normalize_image_url(raw: &str, base: &Url) -> Option<String> {
    let resolved = if let Some(rest) = raw.strip_prefix("//") {
        Url::parse(&format!("{}://{}", base.scheme(), rest)).ok()?
    } else if raw.starts_with('/') {
        let origin = base.origin();
        if !origin.is_tuple() {
            return None;
        }
        Url::parse(&origin.ascii_serialization()).ok()?.join(raw).ok()?
    } else {
        base.join(raw).ok()?
    };

    let usable = matches!(resolved.scheme(), "http" | "https") && resolved.host_str().is_some_and(|h| !h.is_empty());
    usable.then(|| resolved.to_string())
}

fn is_data_uri(raw: &str) -> bool {
    raw.get(..5).is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"))
}
