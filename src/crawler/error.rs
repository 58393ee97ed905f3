//! Error types for the crawler module

use thiserror::Error;

/// Error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Only http and https sites can be crawled
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// The crawl finished without a single analyzable page
    #[error("No pages could be crawled from {0}")]
    NoPages(String),

    /// HTML parsing error
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
