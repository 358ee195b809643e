//! Slot model: what the engine has understood about the user's painting job.

pub mod types;
pub mod vocab;

pub use types::{Environment, Finish, PartialSlotSet, SlotName, SlotSet, Surface};
