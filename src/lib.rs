//! # seo-audit - SEO crawling and LLM-written audit reports
//!
//! This crate crawls a website for SEO metadata, trims the crawl output to the fields
//! worth showing a language model, and asks a hosted chat-completion API for a
//! human-readable audit. It also writes social-media posts and topic suggestions and
//! requests an accompanying image from a hosted image model.
//!
//! ## Features
//!
//! - Website crawling with per-page keyword, n-gram, heading and metadata analysis
//! - Allow-list based field extraction into a compact report
//! - Deterministic prompt assembly from fixed or custom templates
//! - OpenAI-compatible chat client with tagged errors and an optional single retry
//! - Social post prompts, topic suggestion cleanup, and a session that remembers them
//! - Image generation with interchangeable Imagen and OpenAI backends
//! - Terminal rendering of markdown reports
//!
//! ## Example
//!
//! ```rust,no_run
//! use seo_audit::crawler::{CrawlerConfig, SpiderCrawler};
//! use seo_audit::config::Settings;
//! use seo_audit::llm::{ChatClient, ReportGenerator};
//! use seo_audit::pipeline::{AuditOptions, run_audit};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::from_env()?;
//!     let generator = ReportGenerator::new(ChatClient::new(&settings.report_llm()?)?);
//!     let crawler = SpiderCrawler::new(CrawlerConfig::default());
//!
//!     let outcome = run_audit(&crawler, &generator, "https://example.com", &AuditOptions::default()).await?;
//!     println!("{}", outcome.report);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod document;
mod error;
pub mod extract;
pub mod llm;
pub mod pipeline;
pub mod prompt;
mod render;
pub mod social;

pub use error::{Error, Result};
pub use render::{print_report, render_report};

/// Re-export of the most used types
pub mod prelude {
    pub use crate::crawler::{CrawlAdapter, CrawlerConfig, RawReport, SpiderCrawler};
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::extract::{CompactReport, FieldExtractor};
    pub use crate::llm::{ChatClient, GenerationError, LlmConfig, ReportGenerator, TextGenerator};
    pub use crate::prompt::{PromptAssembler, ReportTemplate};
    pub use crate::social::{Platform, PostLength, PostRequest, TopicSession};
}
