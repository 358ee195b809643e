// OpenAI-compatible provider (OpenAI, OpenRouter, local gateways)

use super::{LlmConfig, LlmError, LlmProvider, LlmProviderInfo};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAILlmProvider {
    config: LlmConfig,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAILlmProvider {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::Config("API key required for OpenAI provider".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.unwrap_or(30)))
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn endpoint(&self) -> String {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!("{}/chat/completions", base_url)
    }

    async fn make_request(
        &self,
        messages: Vec<OpenAIMessage>,
        temperature: f64,
    ) -> Result<String, LlmError> {
        let request_body = OpenAIRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: Some(temperature),
        };

        let start = Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.config.timeout_seconds.unwrap_or(30))
                } else {
                    LlmError::Unavailable(format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Http {
                status: status.as_u16(),
                message: truncate(&message, 300),
            });
        }

        let body: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("response has no content".to_string()))?;

        if let Some(usage) = body.usage {
            tracing::debug!(
                model = %self.config.model,
                prompt_tokens = ?usage.prompt_tokens,
                completion_tokens = ?usage.completion_tokens,
                latency_ms = start.elapsed().as_millis() as u64,
                "completion received"
            );
        }

        Ok(content)
    }
}

#[async_trait]
impl LlmProvider for OpenAILlmProvider {
    async fn complete(&self, prompt: &str, temperature: f64) -> Result<String, LlmError> {
        let messages = vec![OpenAIMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }];
        self.make_request(messages, temperature).await
    }

    fn get_info(&self) -> LlmProviderInfo {
        LlmProviderInfo {
            name: "openai".to_string(),
            model: self.config.model.clone(),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    temperature: Option<f64>,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Default, Deserialize)]
struct OpenAIUsage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmProviderType;

    fn config(base_url: Option<&str>) -> LlmConfig {
        LlmConfig {
            provider_type: LlmProviderType::OpenAI,
            model: "gpt-4o-mini".to_string(),
            api_key: Some("sk-test".to_string()),
            base_url: base_url.map(str::to_string),
            max_tokens: Some(64),
            timeout_seconds: Some(1),
        }
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider = OpenAILlmProvider::new(config(Some("http://localhost:8080/v1/"))).unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:8080/v1/chat/completions");

        let provider = OpenAILlmProvider::new(config(None)).unwrap();
        assert_eq!(provider.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_blank_api_key_rejected() {
        let mut cfg = config(None);
        cfg.api_key = Some("  ".to_string());
        assert!(matches!(OpenAILlmProvider::new(cfg), Err(LlmError::Config(_))));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
