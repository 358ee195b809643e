//! Dialogue engine for paint recommendations
//!
//! One conversational turn flows through:
//! - **Extractor**: reads the utterance into a partial slot update
//! - **Gate**: asks for the first missing required slot
//! - **Specialists**: score catalog candidates from independent viewpoints
//! - **Arbiter**: picks one grounded product (or none)
//! - **Synthesizer**: renders the reply and enforces grounding
//!
//! Sessions are kept in an injected [`SessionStore`].

pub mod arbiter;
pub mod engine;
pub mod extractor;
pub mod gate;
pub mod grounding;
pub mod session;
pub mod specialists;
pub mod synthesizer;
pub mod types;

pub use arbiter::{Arbiter, GroundedSelection, NoMatchReason};
pub use engine::DialogueEngine;
pub use extractor::{ContextExtractor, Extraction};
pub use grounding::{GroundingValidator, GroundingViolation, Violation};
pub use session::{ConversationSession, InMemorySessionStore, SessionStore};
pub use specialists::{
    ScoredCandidate, Specialist, SpecialistId, SpecialistOpinion, SpecialistPanel,
};
pub use synthesizer::{RenderContext, Rendered, ResponseSynthesizer};
pub use types::{
    new_session_id, DialogueError, ExtractionMode, GateDecision, RenderMode, SessionId, Speaker,
    SpecialistReport, Turn, TurnReply,
};
