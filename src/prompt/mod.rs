//! # Prompt Assembly
//!
//! A prompt is an instruction template followed by the report document rendered as
//! indented JSON. Assembly is deterministic: the same template and document always
//! give the same bytes. Nothing is truncated, so a document too large for the model
//! fails at the remote call; a warning is logged when the prompt gets that big.

mod templates;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, warn};

use crate::document::{PROMPT_JSON_INDENT, to_pretty_json};

pub use templates::{DATA_HEADER, DETAILED_TEMPLATE, OVERVIEW_TEMPLATE};

/// Prompt length above which a warning is logged
pub const PROMPT_SIZE_WARNING_CHARS: usize = 400_000;

/// Which instructions precede the report JSON
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReportTemplate {
    /// Structured multi-section audit
    #[default]
    Detailed,
    /// Short overview request
    Overview,
    /// Caller-supplied instructions
    Custom(String),
}

impl ReportTemplate {
    /// Full text placed before the JSON, including the data header
    pub fn preamble(&self) -> Cow<'_, str> {
        match self {
            Self::Detailed => Cow::Owned(format!("{}{}", DETAILED_TEMPLATE, DATA_HEADER)),
            Self::Overview => Cow::Borrowed(OVERVIEW_TEMPLATE),
            Self::Custom(text) => Cow::Owned(format!("{}{}", text, DATA_HEADER)),
        }
    }
}

impl FromStr for ReportTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detailed" => Ok(Self::Detailed),
            "overview" => Ok(Self::Overview),
            other => Err(format!("unknown template '{other}' (expected detailed or overview)")),
        }
    }
}

impl fmt::Display for ReportTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detailed => write!(f, "detailed"),
            Self::Overview => write!(f, "overview"),
            Self::Custom(_) => write!(f, "custom"),
        }
    }
}

/// Concatenate `preamble` and `document` rendered with `PROMPT_JSON_INDENT`
pub fn assemble_prompt<T: Serialize + ?Sized>(preamble: &str, document: &T) -> serde_json::Result<String> {
    let json = to_pretty_json(document, PROMPT_JSON_INDENT)?;
    let mut prompt = String::with_capacity(preamble.len() + json.len());
    prompt.push_str(preamble);
    prompt.push_str(&json);
    Ok(prompt)
}

/// Builds report prompts from a configured template
#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    template: ReportTemplate,
}

impl PromptAssembler {
    pub fn new(template: ReportTemplate) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &ReportTemplate {
        &self.template
    }

    /// Render the prompt for `document`
    pub fn assemble<T: Serialize + ?Sized>(&self, document: &T) -> serde_json::Result<String> {
        let prompt = assemble_prompt(&self.template.preamble(), document)?;
        let chars = prompt.chars().count();
        if chars > PROMPT_SIZE_WARNING_CHARS {
            warn!(
                "Prompt is {} characters; the model may reject it as too large",
                chars
            );
        }
        debug!(template = %self.template, chars, "Assembled prompt");
        Ok(prompt)
    }
}
