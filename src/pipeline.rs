//! End-to-end audit flow
//!
//! crawl → raw JSON file → (optional) compact JSON file → prompt → report text file.
//! Each stage writes its file before the next stage starts, so a failure leaves the
//! earlier outputs on disk. A failed generation never writes the report file.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::crawler::{CrawlAdapter, RawReport};
use crate::document::{read_json, write_json, write_text};
use crate::error::Result;
use crate::extract::{CompactReport, ExtractionStats, FieldExtractor};
use crate::llm::TextGenerator;
use crate::prompt::PromptAssembler;

pub const RAW_REPORT_FILE: &str = "seo_report.json";
pub const COMPACT_REPORT_FILE: &str = "seo_report_optimized.json";
pub const FINAL_REPORT_FILE: &str = "FINAL_SEO_REPORT.txt";

/// How an audit run is shaped and where it writes
#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Prompt with the compact report instead of the full crawl output
    pub compact: bool,
    pub extractor: FieldExtractor,
    pub assembler: PromptAssembler,
    pub raw_path: PathBuf,
    pub compact_path: PathBuf,
    pub report_path: PathBuf,
}

impl AuditOptions {
    /// Default file names inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            compact: true,
            extractor: FieldExtractor::default(),
            assembler: PromptAssembler::default(),
            raw_path: dir.join(RAW_REPORT_FILE),
            compact_path: dir.join(COMPACT_REPORT_FILE),
            report_path: dir.join(FINAL_REPORT_FILE),
        }
    }
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self::in_dir(Path::new("."))
    }
}

/// Everything an audit run produced
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub raw: RawReport,
    pub compact: Option<(CompactReport, ExtractionStats)>,
    pub report: String,
}

/// Crawl `url` and save the raw report
#[instrument(skip(crawler))]
pub async fn crawl_stage<C: CrawlAdapter>(crawler: &C, url: &str, path: &Path) -> Result<RawReport> {
    let raw = crawler.crawl(url).await?;
    write_json(path, &raw).await?;
    info!("Full SEO JSON saved to: {}", path.display());
    Ok(raw)
}

/// Filter the raw report and save the compact one
#[instrument(skip(raw, extractor))]
pub async fn compact_stage(
    raw: &RawReport,
    extractor: &FieldExtractor,
    path: &Path,
) -> Result<(CompactReport, ExtractionStats)> {
    let value = serde_json::to_value(raw)?;
    let (compact, stats) = extractor.extract_with_stats(&value);
    stats.log();

    write_json(path, &compact).await?;
    info!("Optimized SEO JSON saved to: {}", path.display());
    Ok((compact, stats))
}

/// Assemble the prompt for `document`, generate the report, and save it
#[instrument(skip(generator, assembler, document))]
pub async fn report_stage<G, T>(
    generator: &G,
    assembler: &PromptAssembler,
    document: &T,
    path: &Path,
) -> Result<String>
where
    G: TextGenerator,
    T: Serialize + ?Sized,
{
    let prompt = assembler.assemble(document)?;
    let report = generator.generate(&prompt).await?;

    write_text(path, &report).await?;
    info!("Final report saved to: {}", path.display());
    Ok(report)
}

/// A document an audit run has saved, reported before the next stage starts
#[derive(Debug, Clone, Copy)]
pub enum AuditStage<'a> {
    Crawled(&'a RawReport),
    Compacted(&'a CompactReport, &'a ExtractionStats),
}

/// Run every stage of an audit for `url`
pub async fn run_audit<C, G>(
    crawler: &C,
    generator: &G,
    url: &str,
    options: &AuditOptions,
) -> Result<AuditOutcome>
where
    C: CrawlAdapter,
    G: TextGenerator,
{
    run_audit_with(crawler, generator, url, options, |_| {}).await
}

/// Run every stage of an audit, calling `on_stage` after each saved document
///
/// The callback runs before the report is requested, so callers can show the crawl
/// results even when generation later fails.
pub async fn run_audit_with<C, G, F>(
    crawler: &C,
    generator: &G,
    url: &str,
    options: &AuditOptions,
    mut on_stage: F,
) -> Result<AuditOutcome>
where
    C: CrawlAdapter,
    G: TextGenerator,
    F: FnMut(AuditStage<'_>),
{
    let raw = crawl_stage(crawler, url, &options.raw_path).await?;
    on_stage(AuditStage::Crawled(&raw));

    let (compact, report) = if options.compact {
        let compact = compact_stage(&raw, &options.extractor, &options.compact_path).await?;
        on_stage(AuditStage::Compacted(&compact.0, &compact.1));
        let report =
            report_stage(generator, &options.assembler, &compact.0, &options.report_path).await?;
        (Some(compact), report)
    } else {
        let report =
            report_stage(generator, &options.assembler, &raw, &options.report_path).await?;
        (None, report)
    };

    Ok(AuditOutcome {
        raw,
        compact,
        report,
    })
}

/// Generate a report from a JSON file already on disk
#[instrument(skip(generator, assembler))]
pub async fn run_report<G: TextGenerator>(
    generator: &G,
    input: &Path,
    output: &Path,
    assembler: &PromptAssembler,
) -> Result<String> {
    let document: Value = read_json(input).await?;
    report_stage(generator, assembler, &document, output).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{CrawlError, RawPage};
    use crate::error::Error;
    use crate::llm::GenerationError;
    use crate::llm::mock::MockGenerator;
    use crate::prompt::ReportTemplate;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    struct FakeCrawler {
        fail: bool,
    }

    impl CrawlAdapter for FakeCrawler {
        async fn crawl(&self, url: &str) -> std::result::Result<RawReport, CrawlError> {
            if self.fail {
                return Err(CrawlError::NoPages(url.to_string()));
            }
            let page = RawPage {
                url: url.to_string(),
                title: "Acme Robots".to_string(),
                description: "Robot arms for small shops".to_string(),
                word_count: 420,
                keywords: vec!["robots".to_string()],
                bigrams: BTreeMap::from([("robot arms".to_string(), 3)]),
                warnings: vec!["Missing H1".to_string()],
                additional_info: Some(BTreeMap::from([
                    ("canonical".to_string(), vec![url.to_string()]),
                    ("robots".to_string(), vec!["index".to_string()]),
                ])),
                ..Default::default()
            };
            Ok(RawReport::from_pages(
                vec![page],
                Vec::new(),
                0.5,
                Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            ))
        }
    }

    fn options(dir: &Path, compact: bool) -> AuditOptions {
        AuditOptions {
            compact,
            assembler: PromptAssembler::new(ReportTemplate::Custom("Audit this:".to_string())),
            ..AuditOptions::in_dir(dir)
        }
    }

    #[tokio::test]
    async fn test_compact_audit_writes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), true);
        let mock = MockGenerator::new();
        mock.push_text("Everything looks fine.");

        let outcome = run_audit(&FakeCrawler { fail: false }, &mock, "https://acme.test/", &opts)
            .await
            .unwrap();

        assert_eq!(outcome.report, "Everything looks fine.");
        assert!(opts.raw_path.exists());
        assert!(opts.compact_path.exists());
        let written = tokio::fs::read_to_string(&opts.report_path).await.unwrap();
        assert_eq!(written, "Everything looks fine.");

        let prompt = &mock.prompts()[0];
        assert!(prompt.starts_with("Audit this:"));
        assert!(prompt.contains("\"canonical\""));
        assert!(!prompt.contains("\"duration_secs\""));
        assert!(!prompt.contains("\"robots\": ["));

        let (compact, stats) = outcome.compact.unwrap();
        assert_eq!(compact.pages.len(), 1);
        assert_eq!(stats.dropped_additional_info.get("robots"), Some(&1));
    }

    #[tokio::test]
    async fn test_full_audit_prompts_with_raw_report() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), false);
        let mock = MockGenerator::new();

        let outcome = run_audit(&FakeCrawler { fail: false }, &mock, "https://acme.test/", &opts)
            .await
            .unwrap();

        assert!(outcome.compact.is_none());
        assert!(!opts.compact_path.exists());
        assert!(mock.prompts()[0].contains("\"duration_secs\""));
        // an empty successful reply is still a report
        assert_eq!(outcome.report, "");
        assert!(opts.report_path.exists());
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_earlier_files() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), true);
        let mock = MockGenerator::new();
        mock.push_error(GenerationError::Api {
            status_code: 502,
            message: "bad gateway".to_string(),
        });

        let err = run_audit(&FakeCrawler { fail: false }, &mock, "https://acme.test/", &opts)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Generation(GenerationError::Api { status_code: 502, .. })));
        assert!(opts.raw_path.exists());
        assert!(opts.compact_path.exists());
        assert!(!opts.report_path.exists());
    }

    #[tokio::test]
    async fn test_stage_callback_sees_documents_before_generation() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), true);
        let mock = MockGenerator::new();
        mock.push_error(GenerationError::Auth("denied".to_string()));

        let mut seen = Vec::new();
        let err = run_audit_with(
            &FakeCrawler { fail: false },
            &mock,
            "https://acme.test/",
            &opts,
            |stage| match stage {
                AuditStage::Crawled(raw) => seen.push(format!("crawled {}", raw.pages.len())),
                AuditStage::Compacted(compact, _) => {
                    seen.push(format!("compacted {}", compact.pages.len()))
                }
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Generation(GenerationError::Auth(_))));
        assert_eq!(seen, vec!["crawled 1", "compacted 1"]);
    }

    #[tokio::test]
    async fn test_full_audit_skips_compacted_stage() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), false);
        let mock = MockGenerator::new();
        mock.push_text("ok");

        let mut stages = 0;
        run_audit_with(&FakeCrawler { fail: false }, &mock, "https://acme.test/", &opts, |stage| {
            assert!(matches!(stage, AuditStage::Crawled(_)));
            stages += 1;
        })
        .await
        .unwrap();

        assert_eq!(stages, 1);
    }

    #[tokio::test]
    async fn test_crawl_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), true);
        let mock = MockGenerator::new();

        let err = run_audit(&FakeCrawler { fail: true }, &mock, "https://down.test/", &opts)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Crawl(CrawlError::NoPages(_))));
        assert!(!opts.raw_path.exists());
        assert!(mock.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_raw_file_uses_four_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RAW_REPORT_FILE);
        crawl_stage(&FakeCrawler { fail: false }, "https://acme.test/", &path)
            .await
            .unwrap();

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(text.starts_with("{\n    \"pages\": ["));
    }

    #[tokio::test]
    async fn test_run_report_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join(COMPACT_REPORT_FILE);
        let output = dir.path().join("out").join(FINAL_REPORT_FILE);
        write_json(&input, &serde_json::json!({"pages": [{"url": "https://acme.test/"}]}))
            .await
            .unwrap();

        let mock = MockGenerator::new();
        mock.push_text("## Summary");
        let assembler = PromptAssembler::new(ReportTemplate::Overview);

        let report = run_report(&mock, &input, &output, &assembler).await.unwrap();
        assert_eq!(report, "## Summary");
        assert_eq!(tokio::fs::read_to_string(&output).await.unwrap(), "## Summary");
        assert!(mock.prompts()[0].ends_with(
            "{\n  \"pages\": [\n    {\n      \"url\": \"https://acme.test/\"\n    }\n  ]\n}"
        ));
    }

    #[tokio::test]
    async fn test_run_report_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockGenerator::new();
        let err = run_report(
            &mock,
            &dir.path().join("nope.json"),
            &dir.path().join("out.txt"),
            &PromptAssembler::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Extract(_)));
        assert!(mock.prompts().is_empty());
    }
}
