//! # Website Crawler Module
//!
//! Produces the raw SEO report for a site: one `RawPage` per crawled URL with its
//! metadata, heading outline, keyword and n-gram statistics and warnings, plus a few
//! crawl-level facts. Link discovery is delegated to `spider`; each page is analyzed
//! with `scraper` by the pure functions in `analysis`.
//!
//! ## Key Components
//!
//! - `CrawlAdapter`: the request/response seam the pipeline depends on
//! - `SpiderCrawler`: the production adapter
//! - `CrawlerConfig`: depth, page limit, politeness and analysis switches
//! - `RawReport` / `RawPage`: the serialized crawl output

mod analysis;
mod config;
mod error;
mod spider_integration;

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use analysis::analyze_page;
pub use config::{CrawlerConfig, CrawlerConfigBuilder};
pub use error::CrawlError;
pub use spider_integration::crawl_website;

/// Number of site-wide keywords kept in a report
const SITE_KEYWORD_LIMIT: usize = 20;

/// One analyzed page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPage {
    pub url: String,
    pub title: String,
    pub description: String,
    pub word_count: usize,

    /// Most frequent meaningful words, most relevant first
    pub keywords: Vec<String>,

    pub bigrams: BTreeMap<String, usize>,
    pub trigrams: BTreeMap<String, usize>,
    pub warnings: Vec<String>,

    /// Heading texts keyed by level tag (`h1`..`h6`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headings: Option<BTreeMap<String, Vec<String>>>,

    /// SEO metadata tag values keyed by tag name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<BTreeMap<String, Vec<String>>>,
}

/// A keyword and the number of pages listing it among their top keywords
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

/// The full crawl output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReport {
    pub pages: Vec<RawPage>,
    pub keywords: Vec<KeywordCount>,
    pub errors: Vec<String>,
    pub total_pages: usize,
    pub duration_secs: f64,
    pub crawled_at: DateTime<Utc>,
}

impl RawReport {
    /// Assemble a report, deriving the site-wide keyword ranking from the pages
    pub fn from_pages(
        pages: Vec<RawPage>,
        errors: Vec<String>,
        duration_secs: f64,
        crawled_at: DateTime<Utc>,
    ) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for page in &pages {
            for word in &page.keywords {
                *counts.entry(word.as_str()).or_default() += 1;
            }
        }

        let mut keywords: Vec<KeywordCount> = counts
            .into_iter()
            .map(|(word, count)| KeywordCount {
                word: word.to_string(),
                count,
            })
            .collect();
        keywords.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
        keywords.truncate(SITE_KEYWORD_LIMIT);

        Self {
            total_pages: pages.len(),
            pages,
            keywords,
            errors,
            duration_secs,
            crawled_at,
        }
    }
}

/// Something that can turn a root URL into a raw report
pub trait CrawlAdapter {
    fn crawl(&self, url: &str) -> impl Future<Output = Result<RawReport, CrawlError>> + Send;
}

/// Crawl adapter backed by `spider`
#[derive(Debug, Clone, Default)]
pub struct SpiderCrawler {
    config: CrawlerConfig,
}

impl SpiderCrawler {
    pub fn new(config: CrawlerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }
}

impl CrawlAdapter for SpiderCrawler {
    async fn crawl(&self, url: &str) -> Result<RawReport, CrawlError> {
        crawl_website(url, self.config.clone()).await
    }
}
