//! Main-content detection.
//!
//! Paragraph-like nodes hand their score up to three ancestor levels (full,
//! half, sixth). Ancestors are seeded with a tag and class/id score the first
//! time they are reached, then scaled by `1 - link_density`. The best
//! ancestor wins and is joined by those of its siblings that look like part
//! of the same article.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use crate::parse::{Document, Element};
use crate::postprocess::{PostProcessConfig, postprocess_html};
use crate::scoring::{ScoreConfig, base_tag_score, class_id_weight, link_density, paragraph_score};
use crate::{JaibError, Result};

/// Nodes whose own text is scored.
const PARAGRAPH_TAGS: &str = "p, pre, td, blockquote";

/// Share of a paragraph's score given to its parent, grandparent and
/// great-grandparent.
const ANCESTOR_DIVIDERS: [f64; 3] = [1.0, 2.0, 6.0];

/// How close to the winner another top candidate must be to count towards a
/// shared-ancestor promotion.
const ALTERNATIVE_RATIO: f64 = 0.75;

/// Number of close alternatives a common ancestor must contain to replace the winner.
const MIN_ALTERNATIVES: usize = 3;

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.( |$)").expect("sentence pattern is valid"));

/// Configuration for content extraction.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Minimum score the winner must reach (default: 20.0).
    pub min_score_threshold: f64,
    /// Paragraphs shorter than this many characters are not scored (default: 25).
    pub min_paragraph_chars: usize,
    /// Candidates considered for shared-ancestor promotion (default: 5).
    pub max_top_candidates: usize,
    /// Paragraph-like nodes scanned, 0 for unlimited.
    pub max_elements: usize,
    /// Sibling score threshold as a fraction of the winner's score (default: 0.2).
    pub sibling_threshold: f64,
    pub scoring: ScoreConfig,
    pub postprocess: PostProcessConfig,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_score_threshold: 20.0,
            min_paragraph_chars: 25,
            max_top_candidates: 5,
            max_elements: 0,
            sibling_threshold: 0.2,
            scoring: ScoreConfig::default(),
            postprocess: PostProcessConfig::default(),
        }
    }
}

/// An ancestor that received paragraph score.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub element: Element<'a>,
    pub score: f64,
}

/// Cleaned article HTML plus diagnostics.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub content: String,
    pub top_score: f64,
    /// Number of top-level elements joined into `content`.
    pub element_count: usize,
}

/// Extracts the main content of `doc` with the default configuration.
pub fn extract_content(doc: &Document) -> Result<ExtractedContent> {
    extract_content_with_config(doc, &ExtractConfig::default())
}

/// Extracts the main content of `doc`.
///
/// # Errors
///
/// [`JaibError::NoContent`] when no paragraph qualifies or the cleaned result
/// has no text, [`JaibError::NotReadable`] when the winner scores below
/// `min_score_threshold`.
pub fn extract_content_with_config(doc: &Document, config: &ExtractConfig) -> Result<ExtractedContent> {
    let mut candidates = score_candidates(doc, config);
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let top = *candidates.first().ok_or(JaibError::NoContent)?;
    tracing::debug!(
        candidates = candidates.len(),
        top_score = top.score,
        top_tag = %top.element.tag_name(),
        "scored candidates"
    );

    if top.score < config.min_score_threshold {
        return Err(JaibError::NotReadable { score: top.score, threshold: config.min_score_threshold });
    }

    let top_count = config.max_top_candidates.max(1).min(candidates.len());
    let winner = promote_shared_ancestor(top, &candidates[..top_count], &candidates);
    let parts = collect_siblings(winner, &candidates, config);

    let mut content = String::from("<div>");
    for part in &parts {
        if part.tag_name() == "body" {
            content.push_str(&part.inner_html());
        } else {
            content.push_str(&part.outer_html());
        }
    }
    content.push_str("</div>");

    let mut postprocess = config.postprocess.clone();
    if postprocess.base_url.is_none() {
        postprocess.base_url = doc.base_url().cloned();
    }
    let content = postprocess_html(&content, &postprocess);

    if !has_text(&content) {
        return Err(JaibError::NoContent);
    }

    Ok(ExtractedContent { content, top_score: winner.score, element_count: parts.len() })
}

/// Scores every paragraph and accumulates the result on its ancestors.
pub fn score_candidates<'a>(doc: &'a Document, config: &ExtractConfig) -> Vec<Candidate<'a>> {
    let limit = if config.max_elements == 0 { usize::MAX } else { config.max_elements };
    let mut candidates: Vec<Candidate<'a>> = Vec::new();
    let mut index = HashMap::new();

    for paragraph in doc.select(PARAGRAPH_TAGS).unwrap_or_default().into_iter().take(limit) {
        let text = paragraph.text();
        let text = text.trim();
        if text.chars().count() < config.min_paragraph_chars {
            continue;
        }

        let score = paragraph_score(text, &config.scoring);
        for (ancestor, divider) in paragraph.ancestors(ANCESTOR_DIVIDERS.len()).into_iter().zip(ANCESTOR_DIVIDERS) {
            if ancestor.tag_name() == "html" {
                break;
            }
            let slot = *index.entry(ancestor.element_ref().id()).or_insert_with(|| {
                candidates.push(Candidate { element: ancestor, score: initial_score(&ancestor, &config.scoring) });
                candidates.len() - 1
            });
            candidates[slot].score += score / divider;
        }
    }

    for candidate in &mut candidates {
        candidate.score *= 1.0 - link_density(&candidate.element);
    }

    candidates
}

fn initial_score(element: &Element<'_>, config: &ScoreConfig) -> f64 {
    base_tag_score(&element.tag_name()) + class_id_weight(element, config)
}

/// When several strong candidates share an ancestor of the winner, the
/// article is probably split across them; use that ancestor instead.
fn promote_shared_ancestor<'a>(
    top: Candidate<'a>, top_candidates: &[Candidate<'a>], all: &[Candidate<'a>],
) -> Candidate<'a> {
    if top.score <= 0.0 {
        return top;
    }

    let alternatives: Vec<Element<'a>> = top_candidates
        .iter()
        .skip(1)
        .filter(|c| c.score / top.score >= ALTERNATIVE_RATIO)
        .map(|c| c.element)
        .collect();
    if alternatives.len() < MIN_ALTERNATIVES {
        return top;
    }

    let mut current = top.element.parent();
    while let Some(ancestor) = current {
        if matches!(ancestor.tag_name().as_str(), "body" | "html") {
            break;
        }
        let contained = alternatives.iter().filter(|alt| alt.is_within(&ancestor)).count();
        if contained >= MIN_ALTERNATIVES {
            let score = all
                .iter()
                .find(|c| c.element == ancestor)
                .map_or(top.score, |c| c.score.max(top.score));
            tracing::debug!(tag = %ancestor.tag_name(), "promoted shared ancestor of top candidates");
            return Candidate { element: ancestor, score };
        }
        current = ancestor.parent();
    }

    top
}

/// The winner plus qualifying siblings, in document order.
fn collect_siblings<'a>(
    winner: Candidate<'a>, candidates: &[Candidate<'a>], config: &ExtractConfig,
) -> Vec<Element<'a>> {
    let parent = match winner.element.parent() {
        Some(parent) if winner.element.tag_name() != "body" => parent,
        _ => return vec![winner.element],
    };

    let threshold = (winner.score * config.sibling_threshold).max(10.0);
    let winner_class = winner.element.attr("class").filter(|c| !c.trim().is_empty());

    parent
        .children()
        .into_iter()
        .filter(|sibling| {
            if *sibling == winner.element {
                return true;
            }

            let bonus = match (winner_class, sibling.attr("class")) {
                (Some(a), Some(b)) if a == b => winner.score * 0.2,
                _ => 0.0,
            };
            if let Some(candidate) = candidates.iter().find(|c| c.element == *sibling)
                && candidate.score + bonus >= threshold
            {
                return true;
            }

            sibling.tag_name() == "p" && is_prose_paragraph(sibling)
        })
        .collect()
}

/// Long paragraphs with few links, or short link-free ones ending a sentence.
fn is_prose_paragraph(paragraph: &Element<'_>) -> bool {
    let text = paragraph.text();
    let text = text.trim();
    let length = text.chars().count();
    let density = link_density(paragraph);

    if length > 80 {
        density < 0.25
    } else {
        length > 0 && density == 0.0 && SENTENCE_END.is_match(text)
    }
}

fn has_text(html: &str) -> bool {
    Html::parse_fragment(html).root_element().text().any(|t| !t.trim().is_empty())
}
