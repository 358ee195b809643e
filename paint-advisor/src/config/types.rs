use serde::{Deserialize, Serialize};

use crate::llm::LlmConfig;

/// Configuration for the dialogue engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub dialogue: DialogueConfig,
    pub retrieval: RetrievalConfig,
    pub panel: PanelConfig,
    pub arbiter: ArbiterConfig,
    pub generation: GenerationConfig,
    /// Text generation provider; `None` runs the rule-based paths only
    pub llm: Option<LlmConfig>,
}

/// Conversation memory and input handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Turns kept per session (must be at least 6)
    pub history_capacity: usize,
    /// Turns handed to the extractor as context
    pub extraction_window: usize,
    /// Utterances shorter than this are treated as follow-ups
    pub follow_up_max_chars: usize,
    pub max_utterance_chars: usize,
    /// Sessions untouched for this long are dropped by an idle sweep
    pub session_idle_secs: u64,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            history_capacity: 12,
            extraction_window: 6,
            follow_up_max_chars: 30,
            max_utterance_chars: 2000,
            session_idle_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum candidates requested from the catalog per turn
    pub limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { limit: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Per-specialist deadline; a specialist that misses it abstains
    pub specialist_timeout_ms: u64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            specialist_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// Weighted score below which no product is recommended
    pub min_score: f64,
    /// A specialist contributes its rationale when the winner is in its top-k
    pub rationale_top_k: usize,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            min_score: 1.0,
            rationale_top_k: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub extraction_temperature: f64,
    pub synthesis_temperature: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            extraction_temperature: 0.0,
            synthesis_temperature: 0.7,
        }
    }
}
