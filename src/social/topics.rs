//! Topic suggestions and the session that remembers them

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::document::{read_json, write_json};
use crate::extract::ExtractError;
use crate::llm::TextGenerator;
use crate::social::SocialError;

/// Upper bound on suggestions kept from one reply
pub const MAX_TOPICS: usize = 10;

/// Cleaned lines this short or shorter are discarded
const MIN_TOPIC_CHARS: usize = 3;

/// Leading characters treated as list markers
const LIST_MARKERS: &[char] = &['-', '•', '*', '.', ')'];

/// Instructions asking for ten topics in `category`
pub fn topic_prompt(category: &str) -> String {
    format!(
        "Generate 10 unique, modern, engaging content topics for category:
\"{}\"

Rules:
- No numbering.
- Short, clean, scroll-stopping topics.
- Avoid generic ideas.
- Make every generation 100% different.
",
        category.trim()
    )
}

fn is_marker(c: char) -> bool {
    c.is_ascii_digit() || c.is_whitespace() || LIST_MARKERS.contains(&c)
}

/// Turn a free-form model reply into at most `MAX_TOPICS` topic lines
///
/// Leading bullets, digits, periods and parentheses are stripped from each line, so a
/// topic that itself starts with a number loses it. Lines of `MIN_TOPIC_CHARS` or
/// fewer characters are dropped.
pub fn clean_topics(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| line.trim_start_matches(is_marker).trim())
        .filter(|topic| topic.chars().count() > MIN_TOPIC_CHARS)
        .take(MAX_TOPICS)
        .map(str::to_string)
        .collect()
}

/// The suggestion set of the current interactive session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSession {
    pub category: Option<String>,
    pub suggestions: Vec<String>,
}

impl TopicSession {
    /// Ask for a fresh suggestion set for `category`
    ///
    /// On success the previous suggestions are replaced wholesale. On failure the
    /// session is left untouched.
    #[instrument(skip(self, generator))]
    pub async fn regenerate<G: TextGenerator>(
        &mut self,
        generator: &G,
        category: &str,
    ) -> Result<&[String], SocialError> {
        if category.trim().is_empty() {
            return Err(SocialError::MissingInput("category"));
        }

        let reply = generator.generate(&topic_prompt(category)).await?;
        let suggestions = clean_topics(&reply);
        debug!("Kept {} topics from {} reply lines", suggestions.len(), reply.lines().count());

        self.category = Some(category.trim().to_string());
        self.suggestions = suggestions;
        info!("Stored {} topic suggestions", self.suggestions.len());
        Ok(&self.suggestions)
    }

    /// Pick suggestions by 1-based position
    pub fn select(&self, positions: &[usize]) -> Result<Vec<String>, SocialError> {
        positions
            .iter()
            .map(|&position| {
                position
                    .checked_sub(1)
                    .and_then(|index| self.suggestions.get(index))
                    .cloned()
                    .ok_or(SocialError::InvalidSelection {
                        position,
                        available: self.suggestions.len(),
                    })
            })
            .collect()
    }

    /// Load a saved session, or an empty one if the file does not exist
    pub async fn load(path: &Path) -> Result<Self, ExtractError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(Self::default());
        }
        read_json(path).await
    }

    pub async fn save(&self, path: &Path) -> Result<(), ExtractError> {
        write_json(path, self).await
    }
}
