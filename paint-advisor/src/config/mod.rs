//! Engine configuration: TOML file, environment overrides, validation.

pub mod types;

pub use types::{
    AdvisorConfig, ArbiterConfig, DialogueConfig, GenerationConfig, PanelConfig, RetrievalConfig,
};

use std::path::Path;
use std::str::FromStr;

use crate::llm::{LlmConfig, LlmProviderType};

/// Minimum turns a session must remember
pub const MIN_HISTORY_CAPACITY: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl AdvisorConfig {
    /// Load a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AdvisorConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = AdvisorConfig::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `PAINT_ADVISOR_*` / `OPENAI_API_KEY` overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (process env in production, a map in tests)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(limit) = lookup("PAINT_ADVISOR_RETRIEVAL_LIMIT") {
            self.retrieval.limit = parse_var("PAINT_ADVISOR_RETRIEVAL_LIMIT", &limit)?;
        }
        if let Some(min_score) = lookup("PAINT_ADVISOR_MIN_SCORE") {
            self.arbiter.min_score = parse_var("PAINT_ADVISOR_MIN_SCORE", &min_score)?;
        }
        if let Some(idle) = lookup("PAINT_ADVISOR_SESSION_IDLE_SECS") {
            self.dialogue.session_idle_secs = parse_var("PAINT_ADVISOR_SESSION_IDLE_SECS", &idle)?;
        }
        if let Some(timeout) = lookup("PAINT_ADVISOR_SPECIALIST_TIMEOUT_MS") {
            self.panel.specialist_timeout_ms =
                parse_var("PAINT_ADVISOR_SPECIALIST_TIMEOUT_MS", &timeout)?;
        }

        if let Some(provider) = lookup("PAINT_ADVISOR_LLM_PROVIDER") {
            let provider_type = LlmProviderType::from_str(&provider)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            self.llm.get_or_insert_with(LlmConfig::default).provider_type = provider_type;
        }
        if let Some(model) = lookup("PAINT_ADVISOR_LLM_MODEL") {
            self.llm.get_or_insert_with(LlmConfig::default).model = model;
        }
        if let Some(base_url) = lookup("PAINT_ADVISOR_LLM_BASE_URL") {
            self.llm.get_or_insert_with(LlmConfig::default).base_url = Some(base_url);
        }
        // The key alone never enables a provider, it only fills a configured one
        if let (Some(llm), Some(api_key)) = (self.llm.as_mut(), lookup("OPENAI_API_KEY")) {
            if llm.api_key.is_none() {
                llm.api_key = Some(api_key);
            }
        }

        Ok(())
    }

    /// Reject values the engine cannot honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.dialogue.history_capacity < MIN_HISTORY_CAPACITY {
            errors.push(format!(
                "dialogue.history_capacity must be at least {}",
                MIN_HISTORY_CAPACITY
            ));
        }
        if self.dialogue.extraction_window > self.dialogue.history_capacity {
            errors.push("dialogue.extraction_window cannot exceed history_capacity".to_string());
        }
        if self.dialogue.max_utterance_chars == 0 {
            errors.push("dialogue.max_utterance_chars must be positive".to_string());
        }
        if self.dialogue.session_idle_secs == 0 {
            errors.push("dialogue.session_idle_secs must be positive".to_string());
        }
        if self.retrieval.limit == 0 {
            errors.push("retrieval.limit must be positive".to_string());
        }
        if self.panel.specialist_timeout_ms == 0 {
            errors.push("panel.specialist_timeout_ms must be positive".to_string());
        }
        if !self.arbiter.min_score.is_finite() || self.arbiter.min_score < 0.0 {
            errors.push("arbiter.min_score must be a non-negative number".to_string());
        }
        if self.arbiter.rationale_top_k == 0 {
            errors.push("arbiter.rationale_top_k must be positive".to_string());
        }
        for (name, value) in [
            ("extraction_temperature", self.generation.extraction_temperature),
            ("synthesis_temperature", self.generation.synthesis_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                errors.push(format!("generation.{} must be within [0, 2]", name));
            }
        }
        if let Some(llm) = &self.llm {
            if llm.model.trim().is_empty() {
                errors.push("llm.model must not be empty".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors.join("; ")))
        }
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{} has an invalid value '{}'", name, value)))
}
