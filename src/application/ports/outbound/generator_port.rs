//! Generator port - Interface to the external proposal generator
//!
//! The generator is a non-deterministic text oracle. This port only promises
//! to return *some* text for a request; everything about shape and content
//! is validated downstream, never assumed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A chat message in a generator conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A request to the external generator
#[derive(Debug, Clone)]
pub struct GeneratorRequest {
    pub messages: Vec<ChatMessage>,
    pub system_prompt: Option<String>,
    pub temperature: f32,
}

impl GeneratorRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            system_prompt: None,
            temperature: 0.7,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Raw response from the external generator
#[derive(Debug, Clone)]
pub struct GeneratorResponse {
    pub content: String,
    pub model: String,
}

/// Port for the external generator
#[async_trait]
pub trait GeneratorPort: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn generate(&self, request: GeneratorRequest) -> Result<GeneratorResponse, Self::Error>;
}
