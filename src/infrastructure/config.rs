//! Application configuration

use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Generator API base URL (OpenAI-compatible)
    pub generator_base_url: String,
    /// Default model for generator requests
    pub generator_model: String,

    /// Path to the monster catalog JSON document
    pub catalog_path: String,

    /// Corrective re-invocations allowed per proposal request
    pub proposal_retry_budget: u32,

    /// HTTP server port
    pub server_port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            generator_base_url: env::var("GENERATOR_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434/v1".to_string()),
            generator_model: env::var("GENERATOR_MODEL")
                .unwrap_or_else(|_| "qwen3:30b".to_string()),

            catalog_path: env::var("CATALOG_PATH")
                .unwrap_or_else(|_| "data/monster_metadata.json".to_string()),

            proposal_retry_budget: env::var("PROPOSAL_RETRY_BUDGET")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .context("PROPOSAL_RETRY_BUDGET must be a non-negative integer")?,

            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
        })
    }
}
