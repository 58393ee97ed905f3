//! Per-page SEO analysis
//!
//! Turns the HTML of one page into a `RawPage`. Everything here is pure so it can be
//! tested without a network.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::crawler::error::CrawlError;
use crate::crawler::{CrawlerConfig, RawPage};

const TITLE_MIN_CHARS: usize = 10;
const TITLE_MAX_CHARS: usize = 70;
const DESCRIPTION_MIN_CHARS: usize = 140;
const DESCRIPTION_MAX_CHARS: usize = 255;
const THIN_CONTENT_WORDS: usize = 300;
const KEYWORD_MIN_CHARS: usize = 3;

/// Elements whose text is never visible
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Metadata collected into `additional_info`: (key, selector, attribute or `None` for text)
const EXTRA_TAGS: &[(&str, &str, Option<&str>)] = &[
    ("title", "head > title", None),
    ("meta_desc", "meta[name='description']", Some("content")),
    ("viewport", "meta[name='viewport']", Some("content")),
    ("charset", "meta[charset]", Some("charset")),
    ("canonical", "link[rel='canonical']", Some("href")),
    ("alt_href", "link[rel='alternate']", Some("href")),
    ("hreflang", "link[hreflang]", Some("hreflang")),
    ("og_title", "meta[property='og:title']", Some("content")),
    ("og_desc", "meta[property='og:description']", Some("content")),
    ("og_url", "meta[property='og:url']", Some("content")),
    ("og_image", "meta[property='og:image']", Some("content")),
];

static STOP_WORDS: OnceLock<HashSet<String>> = OnceLock::new();
static WORD_RE: OnceLock<Regex> = OnceLock::new();

fn get_stop_words() -> &'static HashSet<String> {
    STOP_WORDS.get_or_init(|| {
        stop_words::get(stop_words::LANGUAGE::English)
            .into_iter()
            .map(|x| x.to_string())
            .collect()
    })
}

fn word_re() -> &'static Regex {
    WORD_RE.get_or_init(|| Regex::new(r"[\p{L}\p{N}']+").expect("word pattern is valid"))
}

fn selector(css: &str) -> Result<Selector, CrawlError> {
    Selector::parse(css)
        .map_err(|e| CrawlError::HtmlParse(format!("Failed to parse selector '{}': {}", css, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Values of `attr` (or the text when `attr` is `None`) for every match of `css`
fn collect_values(document: &Html, css: &str, attr: Option<&str>) -> Result<Vec<String>, CrawlError> {
    let selector = selector(css)?;
    Ok(document
        .select(&selector)
        .filter_map(|element| match attr {
            Some(attr) => element.value().attr(attr).map(|v| v.trim().to_string()),
            None => Some(element_text(element)),
        })
        .filter(|v| !v.is_empty())
        .collect())
}

/// Text of the page body with hidden elements removed
fn visible_text(document: &Html) -> Result<String, CrawlError> {
    let body = selector("body")?;
    let root = document
        .select(&body)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut text = String::new();
    for node in root.descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| HIDDEN_TAGS.contains(&e.name()))
        });
        if !hidden {
            text.push_str(fragment);
            text.push(' ');
        }
    }
    Ok(text)
}

/// Lowercased word tokens
fn tokenize(text: &str) -> Vec<String> {
    word_re()
        .find_iter(text)
        .map(|m| m.as_str().trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn is_meaningful(word: &str) -> bool {
    word.chars().count() >= KEYWORD_MIN_CHARS
        && !word.chars().all(|c| c.is_numeric())
        && !get_stop_words().contains(word)
}

/// Sort by descending count, then lexically
fn ranked(counts: HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

fn top_keywords(words: &[String], limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in words {
        *counts.entry(word.clone()).or_default() += 1;
    }
    ranked(counts)
        .into_iter()
        .take(limit)
        .map(|(word, _)| word)
        .collect()
}

/// N-grams seen at least twice, the `limit` most frequent
fn top_ngrams(words: &[String], n: usize, limit: usize) -> BTreeMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for window in words.windows(n) {
        *counts.entry(window.join(" ")).or_default() += 1;
    }
    ranked(counts)
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .take(limit)
        .collect()
}

fn headings(document: &Html) -> Result<BTreeMap<String, Vec<String>>, CrawlError> {
    let mut outline = BTreeMap::new();
    for level in 1..=6 {
        let tag = format!("h{}", level);
        let texts = collect_values(document, &tag, None)?;
        if !texts.is_empty() {
            outline.insert(tag, texts);
        }
    }
    Ok(outline)
}

fn extra_tags(document: &Html) -> Result<BTreeMap<String, Vec<String>>, CrawlError> {
    let mut info = BTreeMap::new();
    for (key, css, attr) in EXTRA_TAGS {
        let values = collect_values(document, css, *attr)?;
        if !values.is_empty() {
            info.insert(key.to_string(), values);
        }
    }
    Ok(info)
}

fn collect_warnings(
    document: &Html,
    title: &str,
    description: &str,
    word_count: usize,
) -> Result<Vec<String>, CrawlError> {
    let mut warnings = Vec::new();

    let title_len = title.chars().count();
    if title.is_empty() {
        warnings.push("Missing title tag".to_string());
    } else if title_len < TITLE_MIN_CHARS {
        warnings.push(format!(
            "Title tag is too short (less than {} characters): {}",
            TITLE_MIN_CHARS, title
        ));
    } else if title_len > TITLE_MAX_CHARS {
        warnings.push(format!(
            "Title tag is too long (more than {} characters): {}",
            TITLE_MAX_CHARS, title
        ));
    }

    let description_len = description.chars().count();
    if description.is_empty() {
        warnings.push("Missing description".to_string());
    } else if description_len < DESCRIPTION_MIN_CHARS {
        warnings.push(format!(
            "Description is too short (less than {} characters): {}",
            DESCRIPTION_MIN_CHARS, description
        ));
    } else if description_len > DESCRIPTION_MAX_CHARS {
        warnings.push(format!(
            "Description is too long (more than {} characters): {}",
            DESCRIPTION_MAX_CHARS, description
        ));
    }

    for (property, label) in [
        ("og:title", "og:title"),
        ("og:description", "og:description"),
        ("og:image", "og:image"),
    ] {
        let css = format!("meta[property='{}']", property);
        if collect_values(document, &css, Some("content"))?.is_empty() {
            warnings.push(format!("Missing {}", label));
        }
    }

    let images = selector("img")?;
    for image in document.select(&images) {
        let alt = image.value().attr("alt").map(str::trim).unwrap_or_default();
        if alt.is_empty() {
            let src = image.value().attr("src").unwrap_or_default();
            warnings.push(format!("Image missing alt tag: {}", src));
        }
    }

    let anchors = selector("a[href]")?;
    for anchor in document.select(&anchors) {
        let labelled = ["title", "aria-label"]
            .iter()
            .any(|attr| anchor.value().attr(attr).is_some_and(|v| !v.trim().is_empty()));
        if element_text(anchor).is_empty() && !labelled {
            let href = anchor.value().attr("href").unwrap_or_default();
            warnings.push(format!("Anchor missing anchor text: {}", href));
        }
    }

    let h1_count = document.select(&selector("h1")?).count();
    if h1_count == 0 {
        warnings.push("Each page should have at least one h1 tag".to_string());
    } else if h1_count > 1 {
        warnings.push(format!("Page has more than one h1 tag ({} found)", h1_count));
    }

    if word_count < THIN_CONTENT_WORDS {
        warnings.push(format!(
            "Thin content: {} words (less than {})",
            word_count, THIN_CONTENT_WORDS
        ));
    }

    Ok(warnings)
}

/// Analyze one page
///
/// # Arguments
///
/// * `url` - The URL of the page
/// * `html` - The HTML of the page
/// * `config` - Crawler configuration, for analysis switches and limits
pub fn analyze_page(url: &str, html: &str, config: &CrawlerConfig) -> Result<RawPage, CrawlError> {
    let document = Html::parse_document(html);

    let title = collect_values(&document, "title", None)?
        .into_iter()
        .next()
        .unwrap_or_default();
    let description = collect_values(&document, "meta[name='description']", Some("content"))?
        .into_iter()
        .next()
        .unwrap_or_default();

    let tokens = tokenize(&visible_text(&document)?);
    let word_count = tokens.len();
    let meaningful: Vec<String> = tokens.into_iter().filter(|w| is_meaningful(w)).collect();

    let warnings = collect_warnings(&document, &title, &description, word_count)?;

    Ok(RawPage {
        url: url.to_string(),
        keywords: top_keywords(&meaningful, config.keyword_limit),
        bigrams: top_ngrams(&meaningful, 2, config.ngram_limit),
        trigrams: top_ngrams(&meaningful, 3, config.ngram_limit),
        headings: if config.analyze_headings {
            Some(headings(&document)?)
        } else {
            None
        },
        additional_info: if config.analyze_extra_tags {
            Some(extra_tags(&document)?)
        } else {
            None
        },
        title,
        description,
        word_count,
        warnings,
    })
}
