//! Synchronous HTML extraction
//!
//! `scraper::Html` is not `Send`, so every function here parses, extracts and
//! returns owned data without ever crossing an await point.

use crate::types::Chapter;
use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose text never reaches the narration
const NOISE_TAGS: &[&str] = &["script", "style", "nav", "footer", "header"];

/// Chapter extraction additionally drops sidebars
const OUTLINE_NOISE_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];

/// Image selectors in priority order
const IMAGE_SELECTORS: &[&str] = &["article img", "main img", "img"];

/// Attributes that may carry the real image URL (lazy loading)
const IMAGE_SRC_ATTRS: &[&str] = &["src", "data-src", "data-original", "lazy-src"];

/// Maximum entries in a chapter outline
pub const MAX_CHAPTERS: usize = 20;

/// Link texts of common language switchers pointing at Chinese
const CHINESE_LINK_TEXTS: &[&str] = &["中文", "简体中文", "简体", "繁體中文", "CHS"];

/// An image worth downloading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    /// Absolute URL
    pub url: Url,
    /// Declared width, if any
    pub width: Option<u64>,
    /// Declared height, if any
    pub height: Option<u64>,
}

/// Everything the fetch stage needs from one HTML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    /// `<title>` text, if present and non-empty
    pub title: Option<String>,
    /// Visible text, whitespace-collapsed and truncated
    pub text: String,
    /// Image candidates in selector order, deduplicated by URL
    pub images: Vec<ImageCandidate>,
}

/// Parse `html` fetched from `base`
pub fn parse_page(html: &str, base: &Url, max_text_chars: usize, min_image_area: u64) -> ParsedPage {
    let document = Html::parse_document(html);
    ParsedPage {
        title: extract_title(&document),
        text: truncate_chars(&visible_text(&document, NOISE_TAGS), max_text_chars),
        images: image_candidates(&document, base, min_image_area),
    }
}

/// Extract a chapter outline: headings first, numbered paragraphs otherwise
///
/// Returns the page title (if any) and at most [`MAX_CHAPTERS`] entries.
pub fn extract_outline(html: &str) -> (Option<String>, Vec<Chapter>) {
    let document = Html::parse_document(html);
    let title = extract_title(&document);

    let mut chapters = collect_outline(&document, "h1, h2, h3", |el, text| {
        if text.chars().count() <= 2 {
            return None;
        }
        el.value().name()[1..].parse::<u8>().ok()
    });

    if chapters.is_empty() {
        chapters = collect_outline(&document, "p", |_, text| {
            let len = text.chars().count();
            let numbered = text.chars().take(3).any(char::is_numeric);
            (len > 2 && len < 100 && numbered).then_some(4)
        });
    }

    chapters.truncate(MAX_CHAPTERS);
    (title, chapters)
}

/// Link to the Chinese version of a non-Chinese page, if it offers one
///
/// Pages whose `<html lang>` is already Chinese yield `None`. Otherwise the
/// first `link`/`a` element tagged `hreflang`/`data-lang`/`lang` `zh*`, or an
/// anchor reading like a Chinese language switcher, wins.
pub fn chinese_variant(html: &str, base: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    let page_lang = document.root_element().value().attr("lang").unwrap_or_default();
    if page_lang.to_ascii_lowercase().contains("zh") {
        return None;
    }

    let selector = Selector::parse("link[href][hreflang], a[href]").ok()?;
    document.select(&selector).find_map(|el| {
        let element = el.value();
        let tagged = ["hreflang", "data-lang", "lang"]
            .iter()
            .filter_map(|attr| element.attr(attr))
            .any(|lang| lang.trim().to_ascii_lowercase().starts_with("zh"));
        let labelled = element.name() == "a" && {
            let text = stripped_text(el);
            CHINESE_LINK_TEXTS.contains(&text.as_str())
        };
        if !tagged && !labelled {
            return None;
        }

        let href = element.attr("href")?.trim();
        if href.is_empty() || href.starts_with('#') || href.to_ascii_lowercase().starts_with("javascript:") {
            return None;
        }
        let url = base.join(href).ok()?;
        (matches!(url.scheme(), "http" | "https") && url != *base).then_some(url)
    })
}

fn collect_outline<F>(document: &Html, selector: &str, level_of: F) -> Vec<Chapter>
where
    F: Fn(ElementRef, &str) -> Option<u8>,
{
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|el| !inside_noise(*el, OUTLINE_NOISE_TAGS))
        .filter_map(|el| {
            let text = stripped_text(el);
            let level = level_of(el, &text)?;
            Some(Chapter {
                id: uuid::Uuid::new_v4().to_string(),
                text,
                level,
            })
        })
        .collect()
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

/// Text of an element with each text node trimmed and joined without separator
fn stripped_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

fn inside_noise(element: ElementRef, noise: &[&str]) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| noise.contains(&a.value().name()))
}

fn visible_text(document: &Html, noise: &[&str]) -> String {
    let mut parts = Vec::new();
    for child in document.root_element().children() {
        collect_text(child, noise, &mut parts);
    }
    collapse_whitespace(&parts.join(" "))
}

fn collect_text<'a>(node: NodeRef<'a, Node>, noise: &[&str], parts: &mut Vec<&'a str>) {
    match node.value() {
        Node::Text(text) => {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }
        Node::Element(element) => {
            if noise.contains(&element.name()) {
                return;
            }
            for child in node.children() {
                collect_text(child, noise, parts);
            }
        }
        _ => {
            for child in node.children() {
                collect_text(child, noise, parts);
            }
        }
    }
}

fn image_candidates(document: &Html, base: &Url, min_area: u64) -> Vec<ImageCandidate> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for raw in IMAGE_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for img in document.select(&selector) {
            let element = img.value();
            let Some(src) = IMAGE_SRC_ATTRS
                .iter()
                .filter_map(|attr| element.attr(attr))
                .map(str::trim)
                .find(|s| !s.is_empty())
            else {
                continue;
            };
            if src.to_ascii_lowercase().starts_with("data:") {
                continue;
            }
            let Ok(url) = base.join(src) else {
                continue;
            };
            if !matches!(url.scheme(), "http" | "https") {
                continue;
            }

            let width = element.attr("width").and_then(parse_dimension);
            let height = element.attr("height").and_then(parse_dimension);
            if let (Some(w), Some(h)) = (width, height)
                && w > 0
                && h > 0
                && w.saturating_mul(h) < min_area
            {
                continue;
            }

            if seen.insert(url.as_str().to_string()) {
                out.push(ImageCandidate { url, width, height });
            }
        }
    }

    out
}

fn parse_dimension(raw: &str) -> Option<u64> {
    raw.trim().trim_end_matches("px").trim().parse().ok()
}

/// Collapse runs of whitespace into single spaces and trim the ends
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep at most `max` characters
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
