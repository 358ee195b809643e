//! Conversational paint advisor
//!
//! Turns free-text requests about painting a space into grounded product
//! recommendations from a paint catalog.

pub mod catalog;
pub mod config;
pub mod dialogue;
pub mod llm;
pub mod slots;

pub use catalog::{CandidateProduct, CatalogRetriever, InMemoryCatalog};
pub use config::AdvisorConfig;
pub use dialogue::{DialogueEngine, DialogueError, InMemorySessionStore, SessionStore, TurnReply};
pub use llm::{LlmProvider, LlmProviderFactory};
pub use slots::{Environment, Finish, PartialSlotSet, SlotName, SlotSet, Surface};
