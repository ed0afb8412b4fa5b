//! Content scoring heuristics.
//!
//! Scores are additive: a tag-semantics seed, a class/id weight, and a
//! content-density term for prose, scaled down by link density.

use std::sync::LazyLock;

use regex::Regex;

use crate::parse::Element;

/// Class/id fragments that suggest main content.
pub const POSITIVE_CLASSES: &str = r"(?i)(article|body|content|entry|hentry|h-entry|main|page|post|text|blog|story)";

/// Class/id fragments that suggest page chrome.
pub const NEGATIVE_CLASSES: &str = r"(?i)(banner|breadcrumbs?|combx|comment|community|disqus|extra|foot|header|menu|related|remark|rss|share|shoutbox|sidebar|skyscraper|sponsor|ad-break|agegate|pagination|pager|popup|promo|newsletter|subscribe)";

static POSITIVE: LazyLock<Regex> = LazyLock::new(|| Regex::new(POSITIVE_CLASSES).expect("positive pattern is valid"));
static NEGATIVE: LazyLock<Regex> = LazyLock::new(|| Regex::new(NEGATIVE_CLASSES).expect("negative pattern is valid"));

/// Weights for the scoring algorithm.
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    /// Added when class or id matches [`POSITIVE_CLASSES`].
    pub positive_weight: f64,
    /// Added when class or id matches [`NEGATIVE_CLASSES`] only.
    pub negative_weight: f64,
    /// Cap on the text-length term.
    pub max_char_density_score: f64,
    /// Cap on the comma term.
    pub max_comma_density_score: f64,
    /// Characters per point of the text-length term.
    pub chars_per_point: usize,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            positive_weight: 25.0,
            negative_weight: -25.0,
            max_char_density_score: 3.0,
            max_comma_density_score: 3.0,
            chars_per_point: 100,
        }
    }
}

/// Seed score from tag semantics.
///
/// - ARTICLE: +10
/// - SECTION: +8
/// - DIV: +5
/// - TD, BLOCKQUOTE, PRE: +3
/// - FORM, ADDRESS, lists: -3
/// - H1-H6, TH, HEADER, FOOTER, NAV, ASIDE: -5
pub fn base_tag_score(tag_name: &str) -> f64 {
    match tag_name {
        "article" => 10.0,
        "section" => 8.0,
        "div" => 5.0,
        "td" | "blockquote" | "pre" => 3.0,
        "form" | "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" | "header" | "footer" | "nav" | "aside" => -5.0,
        _ => 0.0,
    }
}

/// Class/id weight: positive wins over negative, id is checked before class.
pub fn class_id_weight(element: &Element<'_>, config: &ScoreConfig) -> f64 {
    let id = element.attr("id").into_iter();
    let classes = element.attr("class").into_iter().flat_map(str::split_whitespace);

    for name in id.chain(classes) {
        if POSITIVE.is_match(name) {
            return config.positive_weight;
        }
        if NEGATIVE.is_match(name) {
            return config.negative_weight;
        }
    }

    0.0
}

/// Text-length and comma terms for a run of prose.
pub fn content_density_score(text: &str, config: &ScoreConfig) -> f64 {
    let char_score = ((text.chars().count() / config.chars_per_point) as f64).min(config.max_char_density_score);
    let comma_score = (text.matches(',').count() as f64).min(config.max_comma_density_score);

    char_score + comma_score
}

/// Score a paragraph contributes to its ancestors: one point for existing
/// plus its content density.
pub fn paragraph_score(text: &str, config: &ScoreConfig) -> f64 {
    1.0 + content_density_score(text, config)
}

/// Ratio of link text characters to total text characters.
pub fn link_density(element: &Element<'_>) -> f64 {
    let text_length = element.text().chars().count();
    if text_length == 0 {
        return 0.0;
    }

    let link_text_length = element
        .select("a")
        .unwrap_or_default()
        .iter()
        .map(|link| link.text().chars().count())
        .sum::<usize>();

    (link_text_length as f64 / text_length as f64).min(1.0)
}
