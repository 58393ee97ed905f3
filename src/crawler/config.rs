//! # Crawler Configuration Module
//!
//! Controls how far the crawl reaches and which optional analyses run on every page.
//! The three analysis switches mirror the options of a classic SEO analyzer: follow
//! internal links, collect the heading outline, and collect extra metadata tags.

use std::time::Duration;

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Follow internal links from the root page
    pub follow_links: bool,

    /// Collect `h1`..`h6` texts into `headings`
    pub analyze_headings: bool,

    /// Collect SEO metadata tags into `additional_info`
    pub analyze_extra_tags: bool,

    /// Maximum depth to crawl
    pub max_depth: u32,

    /// Maximum number of pages to crawl
    pub max_pages: u32,

    /// Rate limit in milliseconds between requests
    pub rate_limit_ms: u64,

    /// Whether to respect robots.txt
    pub respect_robots_txt: bool,

    /// User agent to use for requests
    pub user_agent: String,

    /// Number of keywords kept per page
    pub keyword_limit: usize,

    /// Number of bigrams and trigrams kept per page
    pub ngram_limit: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            follow_links: true,
            analyze_headings: true,
            analyze_extra_tags: true,
            max_depth: 2,
            max_pages: 100,
            rate_limit_ms: 250,
            respect_robots_txt: true,
            user_agent: format!("seo-audit/{}", env!("CARGO_PKG_VERSION")),
            keyword_limit: 10,
            ngram_limit: 10,
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    pub fn follow_links(mut self, follow_links: bool) -> Self {
        self.config.follow_links = follow_links;
        self
    }

    pub fn analyze_headings(mut self, analyze_headings: bool) -> Self {
        self.config.analyze_headings = analyze_headings;
        self
    }

    pub fn analyze_extra_tags(mut self, analyze_extra_tags: bool) -> Self {
        self.config.analyze_extra_tags = analyze_extra_tags;
        self
    }

    /// Set the maximum depth to crawl
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Set the maximum number of pages to crawl
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Set the rate limit in milliseconds between requests
    pub fn rate_limit_ms(mut self, rate_limit_ms: u64) -> Self {
        self.config.rate_limit_ms = rate_limit_ms;
        self
    }

    /// Set whether to respect robots.txt
    pub fn respect_robots_txt(mut self, respect_robots_txt: bool) -> Self {
        self.config.respect_robots_txt = respect_robots_txt;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn keyword_limit(mut self, keyword_limit: usize) -> Self {
        self.config.keyword_limit = keyword_limit;
        self
    }

    pub fn ngram_limit(mut self, ngram_limit: usize) -> Self {
        self.config.ngram_limit = ngram_limit;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Get the rate limit as a Duration
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// Page limit actually handed to the crawler
    pub fn effective_page_limit(&self) -> u32 {
        if self.follow_links { self.max_pages.max(1) } else { 1 }
    }

    /// Depth limit actually handed to the crawler
    pub fn effective_depth(&self) -> u32 {
        if self.follow_links { self.max_depth } else { 0 }
    }
}
