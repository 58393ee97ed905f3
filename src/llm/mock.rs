//! # Mock Text Generator for Testing
//!
//! Returns queued replies in order and records every prompt it receives. Once the
//! queue is drained it answers with an empty string.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::llm::{GenerationError, TextGenerator};

#[derive(Debug, Clone, Default)]
pub struct MockGenerator {
    replies: Arc<Mutex<VecDeque<Result<String, GenerationError>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    pub fn push_text(&self, text: &str) {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
    }

    /// Queue a failure
    pub fn push_error(&self, err: GenerationError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self.replies.lock().unwrap().pop_front();
        reply.unwrap_or_else(|| Ok(String::new()))
    }
}
