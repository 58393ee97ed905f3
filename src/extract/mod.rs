//! # Field Extraction
//!
//! Shrinks a raw crawl report to the fields worth sending to a model. Each page keeps
//! only allow-listed top-level keys, and its `additional_info` keeps only allow-listed
//! tags. Nothing is synthesized: a key missing from the raw page is missing from the
//! compact page too.
//!
//! The transform works on `serde_json::Value` so it accepts any report shape, and
//! keys come out in the order the source page lists them.

mod error;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::document::{read_json, write_json};

pub use error::ExtractError;

/// Page key whose value is filtered instead of copied
pub const ADDITIONAL_INFO_KEY: &str = "additional_info";

/// Top-level page fields kept by default
pub const DEFAULT_TOP_LEVEL_FIELDS: &[&str] = &[
    "url",
    "title",
    "description",
    "word_count",
    "keywords",
    "bigrams",
    "trigrams",
    "warnings",
    "headings",
    ADDITIONAL_INFO_KEY,
];

/// `additional_info` tags kept by default
pub const DEFAULT_ADDITIONAL_INFO_FIELDS: &[&str] = &["title", "canonical", "og_title", "og_desc"];

/// The filtered report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompactReport {
    pub pages: Vec<Map<String, Value>>,
}

/// What an extraction left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Pages in the output
    pub pages: usize,

    /// The source had no usable `pages` array
    pub missing_pages: bool,

    /// Top-level keys dropped, with how many pages carried each
    pub dropped_fields: BTreeMap<String, usize>,

    /// `additional_info` tags dropped, with how many pages carried each
    pub dropped_additional_info: BTreeMap<String, usize>,

    /// Page entries or `additional_info` values that were not JSON objects
    pub malformed: usize,
}

impl ExtractionStats {
    pub fn log(&self) {
        info!(
            pages = self.pages,
            dropped_fields = self.dropped_fields.len(),
            dropped_tags = self.dropped_additional_info.len(),
            malformed = self.malformed,
            "Extraction finished"
        );
        if self.missing_pages {
            warn!("Report has no pages array; produced an empty compact report");
        }
        if !self.dropped_fields.is_empty() {
            debug!("Dropped fields: {:?}", self.dropped_fields);
        }
        if !self.dropped_additional_info.is_empty() {
            debug!("Dropped additional_info tags: {:?}", self.dropped_additional_info);
        }
    }
}

/// Allow-list based page filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldExtractor {
    top_level: BTreeSet<String>,
    additional_info: BTreeSet<String>,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new(
            DEFAULT_TOP_LEVEL_FIELDS.iter().copied(),
            DEFAULT_ADDITIONAL_INFO_FIELDS.iter().copied(),
        )
    }
}

impl FieldExtractor {
    /// Create an extractor from the two allow-lists
    pub fn new<I, J, S, T>(top_level: I, additional_info: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            top_level: top_level.into_iter().map(Into::into).collect(),
            additional_info: additional_info.into_iter().map(Into::into).collect(),
        }
    }

    pub fn top_level(&self) -> &BTreeSet<String> {
        &self.top_level
    }

    pub fn additional_info(&self) -> &BTreeSet<String> {
        &self.additional_info
    }

    /// Filter a raw report
    pub fn extract(&self, raw: &Value) -> CompactReport {
        self.extract_with_stats(raw).0
    }

    /// Filter a raw report and describe what was dropped
    pub fn extract_with_stats(&self, raw: &Value) -> (CompactReport, ExtractionStats) {
        let mut stats = ExtractionStats::default();

        let pages: &[Value] = match raw.get("pages") {
            Some(Value::Array(pages)) => pages.as_slice(),
            _ => {
                stats.missing_pages = true;
                &[]
            }
        };

        let pages: Vec<Map<String, Value>> = pages
            .iter()
            .map(|page| self.extract_page(page, &mut stats))
            .collect();
        stats.pages = pages.len();

        (CompactReport { pages }, stats)
    }

    fn extract_page(&self, page: &Value, stats: &mut ExtractionStats) -> Map<String, Value> {
        let mut compact = Map::new();
        let Some(fields) = page.as_object() else {
            stats.malformed += 1;
            return compact;
        };

        for (key, value) in fields {
            if !self.top_level.contains(key) {
                *stats.dropped_fields.entry(key.clone()).or_default() += 1;
                continue;
            }

            if key == ADDITIONAL_INFO_KEY {
                match value.as_object() {
                    Some(tags) => {
                        compact.insert(key.clone(), Value::Object(self.filter_tags(tags, stats)));
                    }
                    None => stats.malformed += 1,
                }
            } else {
                compact.insert(key.clone(), value.clone());
            }
        }

        compact
    }

    fn filter_tags(&self, tags: &Map<String, Value>, stats: &mut ExtractionStats) -> Map<String, Value> {
        let mut kept = Map::new();
        for (tag, value) in tags {
            if self.additional_info.contains(tag) {
                kept.insert(tag.clone(), value.clone());
            } else {
                *stats.dropped_additional_info.entry(tag.clone()).or_default() += 1;
            }
        }
        kept
    }
}

/// Filter `raw` with explicit allow-lists
pub fn extract(
    raw: &Value,
    top_level: &BTreeSet<String>,
    additional_info: &BTreeSet<String>,
) -> CompactReport {
    FieldExtractor::new(top_level.iter().cloned(), additional_info.iter().cloned()).extract(raw)
}

/// Read a raw report file, filter it, and write the compact report
#[instrument(skip(extractor))]
pub async fn extract_file(
    input: &Path,
    output: &Path,
    extractor: &FieldExtractor,
) -> Result<(CompactReport, ExtractionStats), ExtractError> {
    let raw: Value = read_json(input).await?;
    let (compact, stats) = extractor.extract_with_stats(&raw);
    stats.log();

    write_json(output, &compact).await?;
    info!("Optimized SEO JSON saved to: {}", output.display());
    Ok((compact, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{FILE_JSON_INDENT, to_pretty_json};
    use serde_json::json;

    fn scenario_extractor() -> FieldExtractor {
        FieldExtractor::new(
            ["url", "title", "warnings", "additional_info"],
            ["title", "canonical", "og_title", "og_desc"],
        )
    }

    #[test]
    fn test_scenario_drops_unlisted_tag() {
        let raw = json!({"pages": [{
            "url": "https://x.com",
            "title": "X",
            "warnings": ["missing H1"],
            "additional_info": {
                "title": ["X"],
                "canonical": ["https://x.com/"],
                "internal_only_tag": ["ignored"]
            }
        }]});

        let compact = scenario_extractor().extract(&raw);
        assert_eq!(
            serde_json::to_value(&compact).unwrap(),
            json!({"pages": [{
                "url": "https://x.com",
                "title": "X",
                "warnings": ["missing H1"],
                "additional_info": {"title": ["X"], "canonical": ["https://x.com/"]}
            }]})
        );
    }

    #[test]
    fn test_missing_pages_is_empty_not_error() {
        let (compact, stats) = FieldExtractor::default().extract_with_stats(&json!({}));
        assert_eq!(serde_json::to_value(&compact).unwrap(), json!({"pages": []}));
        assert!(stats.missing_pages);

        let (compact, _) = FieldExtractor::default().extract_with_stats(&json!({"pages": "nope"}));
        assert!(compact.pages.is_empty());

        let compact = FieldExtractor::default().extract(&json!([1, 2, 3]));
        assert!(compact.pages.is_empty());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let raw = json!({"pages": [
            {"url": "a", "content_hash": "abc", "title": "A", "additional_info": {"og_title": ["A"], "viewport": ["w"]}},
            {"word_count": 10, "url": "b", "links": ["x"]}
        ]});
        let extractor = FieldExtractor::default();

        let once = extractor.extract(&raw);
        let twice = extractor.extract(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_output_keys_are_an_allowed_subset_of_input_keys() {
        let raw = json!({"pages": [
            {"url": "a", "description": "d", "links": [], "additional_info": {"og_desc": ["d"], "charset": ["utf-8"]}},
            {"title": "t", "headings": {"h1": ["T"]}}
        ]});
        let extractor = FieldExtractor::default();
        let compact = extractor.extract(&raw);

        for (page, source) in compact.pages.iter().zip(raw["pages"].as_array().unwrap()) {
            let source = source.as_object().unwrap();
            for key in page.keys() {
                assert!(extractor.top_level().contains(key));
                assert!(source.contains_key(key));
            }
            if let Some(info) = page.get(ADDITIONAL_INFO_KEY) {
                let source_info = source[ADDITIONAL_INFO_KEY].as_object().unwrap();
                for tag in info.as_object().unwrap().keys() {
                    assert!(extractor.additional_info().contains(tag));
                    assert!(source_info.contains_key(tag));
                }
            }
        }
        assert!(!compact.pages[1].contains_key("url"));
    }

    #[test]
    fn test_page_order_and_duplicates_are_preserved() {
        let raw = json!({"pages": [{"url": "c"}, {"url": "a"}, {"url": "c"}, {"url": "b"}]});
        let compact = FieldExtractor::default().extract(&raw);
        let urls: Vec<&str> = compact
            .pages
            .iter()
            .map(|p| p["url"].as_str().unwrap())
            .collect();
        assert_eq!(urls, vec!["c", "a", "c", "b"]);
    }

    #[test]
    fn test_key_order_follows_source_page() {
        let raw = json!({"pages": [{"warnings": [], "word_count": 3, "url": "u", "title": "t"}]});
        let compact = FieldExtractor::default().extract(&raw);
        let keys: Vec<&str> = compact.pages[0].keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["warnings", "word_count", "url", "title"]);
    }

    #[test]
    fn test_malformed_entries_keep_their_position() {
        let raw = json!({"pages": [
            "not a page",
            {"url": "u", "additional_info": ["not", "a", "map"]}
        ]});
        let (compact, stats) = FieldExtractor::default().extract_with_stats(&raw);
        assert_eq!(compact.pages.len(), 2);
        assert!(compact.pages[0].is_empty());
        assert_eq!(compact.pages[1].get("url"), Some(&json!("u")));
        assert!(!compact.pages[1].contains_key(ADDITIONAL_INFO_KEY));
        assert_eq!(stats.malformed, 2);
    }

    #[test]
    fn test_stats_count_dropped_keys() {
        let raw = json!({"pages": [
            {"url": "a", "content_hash": "1", "additional_info": {"viewport": ["w"], "title": ["A"]}},
            {"url": "b", "content_hash": "2", "additional_info": {"viewport": ["w"]}}
        ]});
        let (_, stats) = FieldExtractor::default().extract_with_stats(&raw);
        assert_eq!(stats.pages, 2);
        assert_eq!(stats.dropped_fields.get("content_hash"), Some(&2));
        assert_eq!(stats.dropped_additional_info.get("viewport"), Some(&2));
        assert!(!stats.dropped_additional_info.contains_key("title"));
    }

    #[test]
    fn test_free_function_matches_extractor() {
        let raw = json!({"pages": [{"url": "a", "title": "b"}]});
        let top: BTreeSet<String> = ["url".to_string()].into_iter().collect();
        let compact = extract(&raw, &top, &BTreeSet::new());
        assert_eq!(serde_json::to_value(&compact).unwrap(), json!({"pages": [{"url": "a"}]}));
    }

    #[tokio::test]
    async fn test_extract_file_writes_reproducible_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("seo_report.json");
        let output = dir.path().join("seo_report_optimized.json");
        tokio::fs::write(
            &input,
            r#"{"pages": [{"url": "https://x.com", "title": "Ça marche", "links": []}], "total_time": 1.2}"#,
        )
        .await
        .unwrap();

        let (compact, stats) = extract_file(&input, &output, &FieldExtractor::default())
            .await
            .unwrap();
        assert_eq!(stats.dropped_fields.get("links"), Some(&1));

        let written = tokio::fs::read_to_string(&output).await.unwrap();
        assert!(written.contains("Ça marche"));
        assert!(written.starts_with("{\n    \"pages\": ["));

        let decoded: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(to_pretty_json(&decoded, FILE_JSON_INDENT).unwrap(), written);
        assert_eq!(serde_json::to_value(&compact).unwrap(), decoded);
    }

    #[tokio::test]
    async fn test_extract_file_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("seo_report.json");
        let output = dir.path().join("out.json");
        tokio::fs::write(&input, "{\"pages\": [").await.unwrap();

        let err = extract_file(&input, &output, &FieldExtractor::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Decode { .. }));
        assert!(!output.exists());
    }
}
