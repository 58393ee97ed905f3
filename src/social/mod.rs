//! # Social Content Module
//!
//! Builds platform-specific post prompts, asks the text generator for posts and topic
//! suggestions, and requests the accompanying image.
//!
//! ## Key Components
//!
//! - `PostRequest`: the five user selections a post is generated from
//! - `TopicSession`: the suggestion set remembered between interactions
//! - `ImageProvider`: the provider-agnostic image seam, with Imagen and OpenAI backends

mod image;
mod prompt;
mod topics;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::llm::{GenerationError, TextGenerator};

pub use image::{
    AnyImageProvider, Base64Detector, GeneratedImage, HandleDetector, ImageProvider, ImageSource,
    ImagenProvider, OpenAiImageProvider, RawBytesDetector, ShapeDetector, normalize, request_image,
};
pub use prompt::{build_post_prompt, image_prompt};
pub use topics::{MAX_TOPICS, TopicSession, clean_topics, topic_prompt};

/// Characters of the joined topics used in download file names
const FILE_STEM_CHARS: usize = 30;

/// Errors from the social content flow
#[derive(Debug, Error)]
pub enum SocialError {
    #[error("Missing input: {0}")]
    MissingInput(&'static str),

    #[error("No topic at position {position} ({available} available)")]
    InvalidSelection { position: usize, available: usize },

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Target social network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Facebook,
    Instagram,
    LinkedIn,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Facebook, Platform::Instagram, Platform::LinkedIn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
            Platform::LinkedIn => "LinkedIn",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "facebook" => Ok(Platform::Facebook),
            "instagram" => Ok(Platform::Instagram),
            "linkedin" => Ok(Platform::LinkedIn),
            other => Err(format!(
                "unknown platform '{}' (expected Facebook, Instagram or LinkedIn)",
                other
            )),
        }
    }
}

/// Qualitative post length
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl fmt::Display for PostLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PostLength::Short => "Short",
            PostLength::Medium => "Medium",
            PostLength::Long => "Long",
        })
    }
}

impl FromStr for PostLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(PostLength::Short),
            "medium" => Ok(PostLength::Medium),
            "long" => Ok(PostLength::Long),
            other => Err(format!(
                "unknown post length '{}' (expected Short, Medium or Long)",
                other
            )),
        }
    }
}

/// Everything a post is generated from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRequest {
    pub category: String,
    pub topics: Vec<String>,
    pub platform: Platform,
    pub length: PostLength,
    pub overview: String,
}

impl PostRequest {
    pub fn validate(&self) -> Result<(), SocialError> {
        if self.category.trim().is_empty() {
            return Err(SocialError::MissingInput("category"));
        }
        if self.topics.iter().all(|t| t.trim().is_empty()) {
            return Err(SocialError::MissingInput("topic"));
        }
        if self.overview.trim().is_empty() {
            return Err(SocialError::MissingInput("company overview"));
        }
        Ok(())
    }

    /// Selected topics as they appear in the prompt
    pub fn topic_line(&self) -> String {
        self.topics
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Validate the request and ask the generator for the post text
#[instrument(skip(generator, request), fields(platform = %request.platform, length = %request.length))]
pub async fn generate_post<G: TextGenerator>(
    generator: &G,
    request: &PostRequest,
) -> Result<String, SocialError> {
    request.validate()?;
    let prompt = build_post_prompt(request);
    let post = generator.generate(&prompt).await?;
    info!("Generated {} character post", post.chars().count());
    Ok(post)
}

fn file_stem(topics: &[String]) -> String {
    topics
        .join(", ")
        .chars()
        .take(FILE_STEM_CHARS)
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

/// `{stem}_{Platform}_post.txt`
pub fn post_file_name(topics: &[String], platform: Platform) -> String {
    format!("{}_{}_post.txt", file_stem(topics), platform)
}

/// `{stem}_image.png`
pub fn image_file_name(topics: &[String]) -> String {
    format!("{}_image.png", file_stem(topics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockGenerator;

    fn request() -> PostRequest {
        PostRequest {
            category: "Robotics".to_string(),
            topics: vec!["Cobots".to_string()],
            platform: Platform::Facebook,
            length: PostLength::Short,
            overview: "We build robot arms.".to_string(),
        }
    }

    #[test]
    fn test_platform_parsing_is_case_insensitive() {
        assert_eq!("linkedin".parse::<Platform>().unwrap(), Platform::LinkedIn);
        assert_eq!(" INSTAGRAM ".parse::<Platform>().unwrap(), Platform::Instagram);
        assert_eq!(Platform::LinkedIn.to_string(), "LinkedIn");
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn test_length_parsing() {
        assert_eq!("long".parse::<PostLength>().unwrap(), PostLength::Long);
        assert_eq!(PostLength::default().to_string(), "Medium");
        assert!("huge".parse::<PostLength>().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_inputs() {
        let mut req = request();
        req.category = " ".to_string();
        assert!(matches!(req.validate(), Err(SocialError::MissingInput("category"))));

        let mut req = request();
        req.topics = vec![" ".to_string()];
        assert!(matches!(req.validate(), Err(SocialError::MissingInput("topic"))));

        let mut req = request();
        req.overview.clear();
        assert!(matches!(
            req.validate(),
            Err(SocialError::MissingInput("company overview"))
        ));

        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_topic_line_skips_blank_topics() {
        let mut req = request();
        req.topics = vec!["A b".to_string(), "".to_string(), " C ".to_string()];
        assert_eq!(req.topic_line(), "A b, C");
    }

    #[tokio::test]
    async fn test_generate_post_sends_built_prompt() {
        let mock = MockGenerator::new();
        mock.push_text("Robots are here! #robots");

        let post = generate_post(&mock, &request()).await.unwrap();
        assert_eq!(post, "Robots are here! #robots");
        assert_eq!(mock.prompts(), vec![build_post_prompt(&request())]);
    }

    #[tokio::test]
    async fn test_invalid_request_makes_no_call() {
        let mock = MockGenerator::new();
        let mut req = request();
        req.topics.clear();
        assert!(generate_post(&mock, &req).await.is_err());
        assert!(mock.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_is_surfaced() {
        let mock = MockGenerator::new();
        mock.push_error(GenerationError::Auth("bad key".to_string()));
        let err = generate_post(&mock, &request()).await.unwrap_err();
        assert!(matches!(err, SocialError::Generation(GenerationError::Auth(_))));
    }

    #[test]
    fn test_download_file_names() {
        let topics = vec![
            "Cobots on small shop floors".to_string(),
            "Safety/ROI".to_string(),
        ];
        assert_eq!(
            post_file_name(&topics, Platform::LinkedIn),
            "Cobots_on_small_shop_floors,_S_LinkedIn_post.txt"
        );
        assert_eq!(image_file_name(&topics), "Cobots_on_small_shop_floors,_S_image.png");

        let short = vec!["a/b".to_string()];
        assert_eq!(post_file_name(&short, Platform::Facebook), "a_b_Facebook_post.txt");
    }
}
