//! Integration with spider library for web crawling

use std::time::Instant;

use chrono::Utc;
use spider::website::Website;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, info_span, instrument, warn};
use url::Url;

use crate::crawler::analysis::analyze_page;
use crate::crawler::error::CrawlError;
use crate::crawler::{CrawlerConfig, RawReport};

/// Pages buffered between the crawler and the analysis task
const PAGE_CHANNEL_CAPACITY: usize = 64;

/// Crawl a website and analyze every page it yields
///
/// # Arguments
///
/// * `url` - The root URL to crawl
/// * `config` - The crawler configuration
///
/// # Returns
///
/// The raw SEO report, or `CrawlError::NoPages` when nothing could be analyzed
#[instrument(skip(config))]
pub async fn crawl_website(url: &str, config: CrawlerConfig) -> Result<RawReport, CrawlError> {
    let parsed = Url::parse(url)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CrawlError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    info!("Starting crawl for {}", url);
    debug!("Crawler config: {:?}", config);

    let started = Instant::now();
    let crawled_at = Utc::now();

    let mut website = Website::new(url);
    website
        .configuration
        .with_respect_robots_txt(config.respect_robots_txt)
        .with_user_agent(Some(&config.user_agent))
        .with_delay(config.rate_limit_ms)
        .with_depth(config.effective_depth().try_into().unwrap_or(0))
        .with_limit(config.effective_page_limit());

    let rx = website
        .subscribe(PAGE_CHANNEL_CAPACITY)
        .ok_or_else(|| CrawlError::Other("Failed to subscribe to website".to_string()))?;

    let analysis_config = config.clone();
    let handle = tokio::spawn(async move {
        drain_pages(rx, |page| {
            let page_url = page.get_url().to_string();
            let html = page.get_html();
            if html.trim().is_empty() {
                warn!("Skipping page without HTML body: {}", page_url);
                return Err(format!("{}: empty or non-HTML response", page_url));
            }

            info_span!("analyze_page", url = %page_url)
                .in_scope(|| analyze_page(&page_url, &html, &analysis_config))
                .map(|raw_page| {
                    debug!("Analyzed page: {} ({} words)", page_url, raw_page.word_count);
                    raw_page
                })
                .map_err(|e| {
                    error!("Error analyzing page {}: {:?}", page_url, e);
                    format!("{}: {}", page_url, e)
                })
        })
        .await
    });

    website.crawl().await;
    info!("Crawl finished");
    website.unsubscribe();

    let (pages, errors) = handle
        .await
        .map_err(|e| CrawlError::Other(format!("Task join error: {}", e)))?;

    if pages.is_empty() {
        return Err(CrawlError::NoPages(url.to_string()));
    }

    info!("Analyzed {} pages ({} errors)", pages.len(), errors.len());
    Ok(RawReport::from_pages(
        pages,
        errors,
        started.elapsed().as_secs_f64(),
        crawled_at,
    ))
}

/// Receive until the sender closes, collecting analyzed items and per-item errors
///
/// A receiver that falls behind loses the oldest buffered pages. The loss is recorded
/// in the error list and draining carries on with what is still buffered.
async fn drain_pages<T, U, F>(mut rx: broadcast::Receiver<T>, mut analyze: F) -> (Vec<U>, Vec<String>)
where
    T: Clone,
    F: FnMut(T) -> Result<U, String>,
{
    let mut items = Vec::new();
    let mut errors = Vec::new();
    loop {
        match rx.recv().await {
            Ok(item) => match analyze(item) {
                Ok(analyzed) => items.push(analyzed),
                Err(e) => errors.push(e),
            },
            Err(RecvError::Lagged(skipped)) => {
                warn!("Page analysis fell behind the crawl, {} pages skipped", skipped);
                errors.push(format!("{} pages skipped (analysis lagged)", skipped));
            }
            Err(RecvError::Closed) => break,
        }
    }
    (items, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_crawling() {
        let err = crawl_website("not a url", CrawlerConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::UrlParse(_)));
    }

    #[tokio::test]
    async fn test_non_http_scheme_is_rejected() {
        let err = crawl_website("ftp://example.com/", CrawlerConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::UnsupportedScheme(s) if s == "ftp"));
    }

    #[tokio::test]
    async fn test_lagging_analysis_keeps_buffered_pages() {
        let (tx, rx) = broadcast::channel(16);
        for n in 0..20u32 {
            tx.send(n).unwrap();
        }
        drop(tx);

        let (items, errors) = drain_pages(rx, |n| Ok::<_, String>(n)).await;

        assert_eq!(items, (4..20).collect::<Vec<_>>());
        assert_eq!(errors, vec!["4 pages skipped (analysis lagged)".to_string()]);
    }

    #[tokio::test]
    async fn test_drain_collects_analysis_errors() {
        let (tx, rx) = broadcast::channel(4);
        tx.send("https://acme.test/").unwrap();
        tx.send("https://acme.test/empty").unwrap();
        drop(tx);

        let (items, errors) = drain_pages(rx, |url: &str| {
            if url.ends_with("empty") {
                Err(format!("{}: empty or non-HTML response", url))
            } else {
                Ok(url.len())
            }
        })
        .await;

        assert_eq!(items, vec!["https://acme.test/".len()]);
        assert_eq!(errors, vec!["https://acme.test/empty: empty or non-HTML response"]);
    }
}
