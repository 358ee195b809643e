//! Text Generation Abstraction
//!
//! The dialogue engine treats text generation as an opaque capability:
//! given a prompt and a temperature, return text. This module defines that
//! boundary plus the providers the engine ships with.

pub mod openai;
pub mod stub;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use openai::OpenAILlmProvider;
pub use stub::StubLlmProvider;

/// Errors raised by a text generation provider
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("text generation is unavailable: {0}")]
    Unavailable(String),

    #[error("text generation was rate limited")]
    RateLimited,

    #[error("text generation timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error("provider configuration error: {0}")]
    Config(String),
}

/// Supported provider types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    Stub,   // Deterministic scripted responses
    OpenAI, // Any OpenAI-compatible chat/completions endpoint
}

impl std::str::FromStr for LlmProviderType {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stub" => Ok(LlmProviderType::Stub),
            "openai" | "openrouter" => Ok(LlmProviderType::OpenAI),
            other => Err(LlmError::Config(format!("unknown provider type '{}'", other))),
        }
    }
}

/// Configuration for text generation providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider_type: LlmProviderType,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider_type: LlmProviderType::OpenAI,
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            base_url: None,
            max_tokens: Some(512),
            timeout_seconds: Some(30),
        }
    }
}

/// Information about a provider
#[derive(Debug, Clone)]
pub struct LlmProviderInfo {
    pub name: String,
    pub model: String,
}

/// Abstract interface for text generation providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete `prompt` at the given sampling temperature
    async fn complete(&self, prompt: &str, temperature: f64) -> Result<String, LlmError>;

    /// Get provider information
    fn get_info(&self) -> LlmProviderInfo;
}

/// Factory for creating providers
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create a provider based on configuration
    pub fn create_provider(config: LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
        match config.provider_type {
            LlmProviderType::Stub => Ok(Arc::new(StubLlmProvider::new(Vec::<String>::new()))),
            LlmProviderType::OpenAI => {
                let provider = OpenAILlmProvider::new(config)?;
                Ok(Arc::new(provider))
            }
        }
    }
}

/// Provider built from `OPENAI_API_KEY` (and optional `OPENAI_MODEL` /
/// `OPENAI_BASE_URL`), or `None` when no key is set.
pub fn get_default_llm_provider() -> Option<Arc<dyn LlmProvider>> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let config = LlmConfig {
        provider_type: LlmProviderType::OpenAI,
        model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        api_key: Some(api_key),
        base_url: std::env::var("OPENAI_BASE_URL").ok(),
        ..LlmConfig::default()
    };
    LlmProviderFactory::create_provider(config).ok()
}
