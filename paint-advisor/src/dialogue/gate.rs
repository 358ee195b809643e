// Completeness gate: ask for the next missing required slot, or proceed

use super::types::GateDecision;
use crate::slots::{SlotName, SlotSet};

/// Decide whether the slots are complete enough to recommend.
///
/// Required slots are checked in `SlotName::REQUIRED` order (environment
/// first, since it decides which specialists apply at all).
pub fn decide(slots: &SlotSet) -> GateDecision {
    SlotName::REQUIRED
        .iter()
        .find(|slot| !slots.is_known(**slot))
        .map(|slot| GateDecision::AskFor(*slot))
        .unwrap_or(GateDecision::Proceed)
}
