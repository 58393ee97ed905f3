//! # seo-audit CLI
//!
//! Command-line front end for the audit pipeline and the social content tools.
//!
//! ## Subcommands
//!
//! - `crawl`: crawl a site and save the raw SEO report
//! - `extract`: trim a raw report down to the compact one
//! - `report`: turn a saved report into an LLM-written audit
//! - `audit`: crawl, extract and report in one go, showing each stage
//! - `topics`: suggest post topics for a category and remember them
//! - `post`: write a social post, optionally with a generated image
//!
//! Every failure ends the run with a short inline message; files written by earlier
//! stages stay on disk.

mod telemetry;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use seo_audit::config::Settings;
use seo_audit::crawler::{CrawlerConfig, SpiderCrawler};
use seo_audit::document::{PROMPT_JSON_INDENT, to_pretty_json, write_text};
use seo_audit::extract::{FieldExtractor, extract_file};
use seo_audit::llm::{ChatClient, ReportGenerator};
use seo_audit::pipeline::{
    AuditOptions, AuditStage, COMPACT_REPORT_FILE, FINAL_REPORT_FILE, RAW_REPORT_FILE,
    crawl_stage, run_audit_with, run_report,
};
use seo_audit::prompt::{PromptAssembler, ReportTemplate};
use seo_audit::social::{
    AnyImageProvider, Platform, PostLength, PostRequest, TopicSession, generate_post,
    image_file_name, image_prompt, post_file_name, request_image,
};
use serde::Serialize;
use telemetry::OtelGuard;
use tracing::{instrument, warn};

/// Characters of report JSON shown before the AI report
const PREVIEW_CHARS: usize = 3000;

const DEFAULT_SESSION_FILE: &str = "topics.json";

#[derive(Parser)]
#[command(author, version, about = "Crawl a website for SEO data and get an AI-written audit", long_about = None)]
struct Cli {
    /// Also write logs to seo-audit.log in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl a website and save the full SEO report
    Crawl(CrawlArgs),

    /// Keep only the important fields of a full SEO report
    Extract(ExtractArgs),

    /// Generate an audit report from a saved SEO report
    Report(ReportArgs),

    /// Crawl, extract and report in one run
    Audit(AuditArgs),

    /// Suggest post topics for a category
    Topics(TopicsArgs),

    /// Write a social media post
    Post(PostArgs),
}

#[derive(Args, Debug)]
struct CrawlOptions {
    /// Only analyze the given page
    #[arg(long)]
    no_follow_links: bool,

    /// Skip the heading outline
    #[arg(long)]
    no_headings: bool,

    /// Skip canonical, Open Graph and other metadata tags
    #[arg(long)]
    no_extra_tags: bool,

    /// Crawl depth
    #[arg(short, long, default_value = "2")]
    depth: u32,

    /// Maximum number of pages to crawl
    #[arg(short = 'p', long, default_value = "100")]
    max_pages: u32,

    /// Delay between requests in milliseconds
    #[arg(short, long, default_value = "250")]
    rate: u64,
}

impl CrawlOptions {
    fn to_config(&self) -> CrawlerConfig {
        CrawlerConfig::builder()
            .follow_links(!self.no_follow_links)
            .analyze_headings(!self.no_headings)
            .analyze_extra_tags(!self.no_extra_tags)
            .max_depth(self.depth)
            .max_pages(self.max_pages)
            .rate_limit_ms(self.rate)
            .build()
    }
}

#[derive(Args, Debug)]
struct TemplateOptions {
    /// Built-in report instructions: detailed or overview
    #[arg(short, long, default_value = "detailed")]
    template: ReportTemplate,

    /// Read the report instructions from a file instead
    #[arg(long, conflicts_with = "template")]
    template_file: Option<PathBuf>,

    /// Model used for the report (overrides SEO_REPORT_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Retry once after a transient remote failure
    #[arg(long)]
    retry: bool,
}

impl TemplateOptions {
    async fn assembler(&self) -> anyhow::Result<PromptAssembler> {
        let template = match &self.template_file {
            Some(path) => ReportTemplate::Custom(
                tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("cannot read template {}", path.display()))?,
            ),
            None => self.template.clone(),
        };
        Ok(PromptAssembler::new(template))
    }

    /// Report generator built from the environment; fails before any network call
    /// when the API key is missing
    fn generator(&self) -> anyhow::Result<ReportGenerator<ChatClient>> {
        let mut settings = Settings::from_env()?;
        if let Some(model) = &self.model {
            settings.report_model = model.clone();
        }
        let client = ChatClient::new(&settings.report_llm()?)?;
        Ok(ReportGenerator::new(client).with_single_retry(self.retry))
    }
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// URL to crawl
    #[arg(required = true)]
    url: String,

    /// Where to save the full report
    #[arg(short, long, default_value = RAW_REPORT_FILE)]
    output: PathBuf,

    #[command(flatten)]
    crawl: CrawlOptions,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Full report to read
    #[arg(short, long, default_value = RAW_REPORT_FILE)]
    input: PathBuf,

    /// Where to save the compact report
    #[arg(short, long, default_value = COMPACT_REPORT_FILE)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Report JSON to send to the model
    #[arg(short, long, default_value = COMPACT_REPORT_FILE)]
    input: PathBuf,

    /// Where to save the audit text
    #[arg(short, long, default_value = FINAL_REPORT_FILE)]
    output: PathBuf,

    #[command(flatten)]
    template: TemplateOptions,
}

#[derive(Args, Debug)]
struct AuditArgs {
    /// URL to audit
    #[arg(required = true)]
    url: String,

    /// Send the compact report to the model instead of the full one
    #[arg(long)]
    compact: bool,

    /// Directory for the report files
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    #[command(flatten)]
    crawl: CrawlOptions,

    #[command(flatten)]
    template: TemplateOptions,
}

#[derive(Args, Debug)]
struct TopicsArgs {
    /// Category to suggest topics for
    #[arg(required = true)]
    category: String,

    /// Session file remembering the suggestions
    #[arg(long, default_value = DEFAULT_SESSION_FILE)]
    session: PathBuf,
}

#[derive(Args, Debug)]
struct PostArgs {
    /// Business category
    #[arg(long)]
    category: Option<String>,

    /// Topic to write about (repeatable)
    #[arg(long = "topic", conflicts_with = "pick")]
    topics: Vec<String>,

    /// Pick suggested topics by number, e.g. 1,3
    #[arg(long, value_delimiter = ',')]
    pick: Vec<usize>,

    /// Facebook, Instagram or LinkedIn
    #[arg(long)]
    platform: Platform,

    /// Short, Medium or Long
    #[arg(long, default_value = "medium")]
    length: PostLength,

    /// Company overview text
    #[arg(long, conflicts_with = "overview_file")]
    overview: Option<String>,

    /// Read the company overview from a file
    #[arg(long)]
    overview_file: Option<PathBuf>,

    /// Session file holding suggested topics
    #[arg(long, default_value = DEFAULT_SESSION_FILE)]
    session: PathBuf,

    /// Also generate an image for the post
    #[arg(long)]
    image: bool,

    /// Directory for the post and image files
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let _ = Cli::parse_from(["seo-audit", "--help"]);
        return Ok(());
    };

    let otel: OtelGuard = telemetry::init_tracing_subscriber(cli.log_dir.as_deref())?;

    let result = match command {
        Commands::Crawl(args) => crawl_command(args).await,
        Commands::Extract(args) => extract_command(args).await,
        Commands::Report(args) => report_command(args).await,
        Commands::Audit(args) => audit_command(args).await,
        Commands::Topics(args) => topics_command(args).await,
        Commands::Post(args) => post_command(args).await,
    };

    if let Err(err) = result {
        eprintln!("Error: {:#}", err);
        drop(otel);
        std::process::exit(1);
    }

    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Print the start of a document as indented JSON
fn print_preview<T: Serialize + ?Sized>(title: &str, document: &T) -> anyhow::Result<()> {
    let json = to_pretty_json(document, PROMPT_JSON_INDENT)?;
    println!("\n== {} ==", title);
    if json.chars().count() > PREVIEW_CHARS {
        let preview: String = json.chars().take(PREVIEW_CHARS).collect();
        println!("{}\n... ({} characters total)", preview, json.chars().count());
    } else {
        println!("{}", json);
    }
    Ok(())
}

#[instrument]
async fn crawl_command(args: CrawlArgs) -> anyhow::Result<()> {
    let crawler = SpiderCrawler::new(args.crawl.to_config());

    let progress = spinner(&format!("Crawling {}...", args.url));
    let result = crawl_stage(&crawler, &args.url, &args.output).await;
    progress.finish_and_clear();
    let raw = result?;

    println!(
        "Crawled {} pages in {:.1}s ({} errors)",
        raw.total_pages,
        raw.duration_secs,
        raw.errors.len()
    );
    println!("Full SEO JSON saved to {}", args.output.display());
    Ok(())
}

#[instrument]
async fn extract_command(args: ExtractArgs) -> anyhow::Result<()> {
    let (compact, stats) = extract_file(&args.input, &args.output, &FieldExtractor::default()).await?;

    println!("Kept {} pages", compact.pages.len());
    if !stats.dropped_fields.is_empty() {
        let dropped: Vec<&str> = stats.dropped_fields.keys().map(|k| k.as_str()).collect();
        println!("Dropped fields: {}", dropped.join(", "));
    }
    if stats.malformed > 0 {
        println!("Skipped {} malformed entries", stats.malformed);
    }
    println!("Optimized SEO JSON saved to {}", args.output.display());
    Ok(())
}

#[instrument]
async fn report_command(args: ReportArgs) -> anyhow::Result<()> {
    let generator = args.template.generator()?;
    let assembler = args.template.assembler().await?;

    let progress = spinner("Generating SEO report...");
    let result = run_report(&generator, &args.input, &args.output, &assembler).await;
    progress.finish_and_clear();
    let report = result?;

    seo_audit::print_report(&report)?;
    println!("\nFinal report saved to {}", args.output.display());
    Ok(())
}

#[instrument]
async fn audit_command(args: AuditArgs) -> anyhow::Result<()> {
    let generator = args.template.generator()?;
    let options = AuditOptions {
        compact: args.compact,
        assembler: args.template.assembler().await?,
        ..AuditOptions::in_dir(&args.out_dir)
    };
    let crawler = SpiderCrawler::new(args.crawl.to_config());

    let compact = options.compact;
    let progress = spinner(&format!("Crawling {}...", args.url));
    let result = run_audit_with(&crawler, &generator, &args.url, &options, |stage| {
        let preview = match stage {
            AuditStage::Crawled(raw) => {
                progress.suspend(|| println!("Crawled {} pages", raw.total_pages));
                progress.set_message("Generating SEO report...");
                if compact {
                    return;
                }
                progress.suspend(|| print_preview("Full SEO JSON", raw))
            }
            AuditStage::Compacted(report, _) => {
                progress.suspend(|| print_preview("Optimized SEO JSON", report))
            }
        };
        if let Err(e) = preview {
            warn!("Could not print the report preview: {}", e);
        }
    })
    .await;
    progress.finish_and_clear();
    let report = result?.report;

    println!("\n== AI SEO Report ==");
    seo_audit::print_report(&report)?;

    println!("\nDownloads:");
    let data_path = if options.compact {
        &options.compact_path
    } else {
        &options.raw_path
    };
    println!("  {}", data_path.display());
    println!("  {}", options.report_path.display());
    Ok(())
}

#[instrument]
async fn topics_command(args: TopicsArgs) -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    let client = ChatClient::new(&settings.social_llm()?)?;
    let mut session = TopicSession::load(&args.session).await?;

    let progress = spinner("Generating topics...");
    let result = session.regenerate(&client, &args.category).await;
    progress.finish_and_clear();
    let topics = result?.to_vec();

    if topics.is_empty() {
        println!("The model returned no usable topics; try again.");
    }
    for (i, topic) in topics.iter().enumerate() {
        println!("{:2}. {}", i + 1, topic);
    }

    session.save(&args.session).await?;
    println!("\nPick topics with: seo-audit post --pick 1,3 ...");
    Ok(())
}

async fn read_overview(args: &PostArgs) -> anyhow::Result<String> {
    match (&args.overview, &args.overview_file) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot read overview {}", path.display())),
        (None, None) => Err(anyhow!("Please provide --overview or --overview-file")),
    }
}

#[instrument]
async fn post_command(args: PostArgs) -> anyhow::Result<()> {
    let session = TopicSession::load(&args.session).await?;

    let topics = if args.pick.is_empty() {
        args.topics.clone()
    } else {
        session.select(&args.pick)?
    };
    let category = args
        .category
        .clone()
        .or_else(|| session.category.clone())
        .unwrap_or_default();

    let request = PostRequest {
        category,
        topics,
        platform: args.platform,
        length: args.length,
        overview: read_overview(&args).await?,
    };
    request.validate()?;

    let settings = Settings::from_env()?;
    let client = ChatClient::new(&settings.social_llm()?)?;
    let image_provider = if args.image {
        Some(AnyImageProvider::from_config(&settings.image()?)?)
    } else {
        None
    };

    let progress = spinner("Generating post...");
    let result = generate_post(&client, &request).await;
    progress.finish_and_clear();
    let post = result?;

    println!("\n== Generated Post ==\n{}\n", post);
    let post_path = args.out_dir.join(post_file_name(&request.topics, request.platform));
    write_text(&post_path, &post).await?;
    println!("Post saved to {}", post_path.display());

    if let Some(provider) = image_provider {
        let progress = spinner("Generating image...");
        let image = request_image(&provider, &image_prompt(&post, request.platform)).await;
        progress.finish_and_clear();

        match image {
            Some(image) => {
                let image_path = args.out_dir.join(image_file_name(&request.topics));
                save_bytes(&image_path, &image.bytes).await?;
                println!("Image ({}) saved to {}", image.mime_type, image_path.display());
            }
            None => println!("Image generation failed (see logs)."),
        }
    }

    Ok(())
}

async fn save_bytes(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("cannot write {}", path.display()))
}
