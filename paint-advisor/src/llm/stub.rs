// Deterministic provider for tests and offline runs

use super::{LlmError, LlmProvider, LlmProviderInfo};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays scripted responses in order.
///
/// Once the script is exhausted (or when built with [`StubLlmProvider::unavailable`])
/// every call fails with `LlmError::Unavailable`, which is how tests simulate
/// a generation outage.
pub struct StubLlmProvider {
    script: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<(String, f64)>>,
    always_unavailable: bool,
}

impl StubLlmProvider {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
            always_unavailable: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            always_unavailable: true,
        }
    }

    /// Queue a failure as the next response
    pub fn push_failure(&self, reason: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(reason.into()));
        }
    }

    /// Queue a response
    pub fn push_response(&self, response: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Ok(response.into()));
        }
    }

    /// Prompts received so far with their temperatures
    pub fn recorded_prompts(&self) -> Vec<(String, f64)> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for StubLlmProvider {
    async fn complete(&self, prompt: &str, temperature: f64) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((prompt.to_string(), temperature));
        }

        if self.always_unavailable {
            return Err(LlmError::Unavailable("stub provider is offline".to_string()));
        }

        let next = self
            .script
            .lock()
            .map_err(|_| LlmError::Unavailable("stub script poisoned".to_string()))?
            .pop_front();

        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(reason)) => Err(LlmError::Unavailable(reason)),
            None => Err(LlmError::Unavailable("stub script exhausted".to_string())),
        }
    }

    fn get_info(&self) -> LlmProviderInfo {
        LlmProviderInfo {
            name: "stub".to_string(),
            model: "scripted".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_script_then_fails() {
        let stub = StubLlmProvider::new(["first", "second"]);
        stub.push_failure("rate limited upstream");

        assert_eq!(stub.complete("a", 0.0).await.unwrap(), "first");
        assert_eq!(stub.complete("b", 0.7).await.unwrap(), "second");
        assert!(stub.complete("c", 0.7).await.is_err());
        assert!(stub.complete("d", 0.7).await.is_err());

        let temperatures: Vec<f64> = stub.recorded_prompts().iter().map(|(_, t)| *t).collect();
        assert_eq!(temperatures, vec![0.0, 0.7, 0.7, 0.7]);
    }

    #[tokio::test]
    async fn test_unavailable_ignores_pushed_responses() {
        let stub = StubLlmProvider::unavailable();
        stub.push_response("never returned");
        assert!(matches!(
            stub.complete("x", 0.0).await,
            Err(LlmError::Unavailable(_))
        ));
    }
}
