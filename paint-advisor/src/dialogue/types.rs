// Core types for the dialogue engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::specialists::SpecialistId;
use crate::catalog::ProductId;
use crate::slots::{SlotName, SlotSet};

/// Opaque key of one logical conversation
pub type SessionId = String;

/// Fresh random session key for callers that do not bring their own
pub fn new_session_id() -> SessionId {
    uuid::Uuid::new_v4().to_string()
}

/// Who is speaking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// A single turn in the conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(message: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Outcome of the completeness gate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    /// A required slot is unknown; ask for it before anything else
    AskFor(SlotName),
    /// All required slots are known
    Proceed,
}

/// Which path produced the slot update
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    Llm,
    Rules,
}

/// Which path produced the reply text
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Generated,
    Template,
}

/// Per-specialist summary exposed with each reply
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpecialistReport {
    pub specialist_id: SpecialistId,
    pub applicable: bool,
    pub confidence: f64,
    pub candidate_count: usize,
}

/// Everything the surrounding layer receives for one user turn
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurnReply {
    pub reply: String,
    pub slots_snapshot: SlotSet,
    pub grounded_product_id: Option<ProductId>,
    pub decision: GateDecision,
    pub follow_up: bool,
    pub extraction_mode: ExtractionMode,
    pub render_mode: RenderMode,
    pub specialists: Vec<SpecialistReport>,
    pub rationales: Vec<String>,
}

/// Errors returned to the caller of `handle_turn`.
///
/// Only input validation fails a turn. Provider, catalog and grounding
/// failures degrade to template replies instead.
#[derive(Debug, thiserror::Error)]
pub enum DialogueError {
    #[error("utterance is empty")]
    EmptyUtterance,

    #[error("utterance has {length} characters, the limit is {max}")]
    UtteranceTooLong { length: usize, max: usize },
}
