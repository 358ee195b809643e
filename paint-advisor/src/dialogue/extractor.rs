// Context extractor: utterance + recent history -> partial slot update
//
// With a text generation provider the utterance is read by the model at a low
// temperature and its JSON answer is normalized through the keyword
// vocabulary; keyword rules then fill whatever the model left out. Without a
// provider, or when it fails, the rules run alone.

use serde::Deserialize;
use std::sync::Arc;

use super::types::{ExtractionMode, Speaker, Turn};
use crate::llm::LlmProvider;
use crate::slots::{vocab, Environment, PartialSlotSet, SlotSet, Surface};

/// Result of reading one utterance
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub update: PartialSlotSet,
    /// Short reactive turn that refines the current request
    pub follow_up: bool,
    pub mode: ExtractionMode,
}

pub struct ContextExtractor {
    llm: Option<Arc<dyn LlmProvider>>,
    temperature: f64,
    follow_up_max_chars: usize,
}

/// Shape the model is asked to answer with. Every field is free text and is
/// normalized before it reaches the slot model.
#[derive(Debug, Default, Deserialize)]
struct RawExtraction {
    #[serde(default)]
    environment: Option<String>,
    #[serde(default)]
    surface: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    finish: Option<String>,
    #[serde(default)]
    room_type: Option<String>,
    #[serde(default)]
    audience_hint: Option<String>,
}

impl ContextExtractor {
    pub fn new(llm: Option<Arc<dyn LlmProvider>>, temperature: f64, follow_up_max_chars: usize) -> Self {
        Self {
            llm,
            temperature,
            follow_up_max_chars,
        }
    }

    /// Rule-only extractor
    pub fn rules_only(follow_up_max_chars: usize) -> Self {
        Self::new(None, 0.0, follow_up_max_chars)
    }

    pub fn is_follow_up(&self, utterance: &str) -> bool {
        vocab::is_follow_up(utterance, self.follow_up_max_chars)
    }

    /// Extract a slot update from `utterance`.
    ///
    /// Never fails: an utterance with nothing interpretable yields an empty
    /// update, which the gate answers by asking again.
    pub async fn extract(
        &self,
        utterance: &str,
        recent_history: &[Turn],
        current_slots: &SlotSet,
    ) -> Extraction {
        let follow_up = self.is_follow_up(utterance);
        let rules = extract_with_rules(utterance);

        if let Some(llm) = &self.llm {
            let prompt = extraction_prompt(utterance, recent_history, current_slots, follow_up);
            match llm.complete(&prompt, self.temperature).await {
                Ok(response) => match parse_model_answer(&response) {
                    Some(update) => {
                        return Extraction {
                            update: update.or(rules),
                            follow_up,
                            mode: ExtractionMode::Llm,
                        };
                    }
                    None => {
                        tracing::warn!("extraction answer was not valid JSON, using keyword rules");
                    }
                },
                Err(e) => {
                    tracing::warn!(error = %e, "extraction model unavailable, using keyword rules");
                }
            }
        }

        Extraction {
            update: rules,
            follow_up,
            mode: ExtractionMode::Rules,
        }
    }
}

/// Keyword extraction over the utterance alone
pub fn extract_with_rules(utterance: &str) -> PartialSlotSet {
    let text = utterance.to_lowercase();
    PartialSlotSet {
        environment: vocab::detect_environment(&text),
        surface: vocab::detect_surface(&text),
        color: vocab::detect_color(&text),
        finish: vocab::detect_finish(&text),
        room_type: vocab::detect_room_type(&text),
        audience_hint: vocab::detect_audience(&text),
    }
}

fn extraction_prompt(
    utterance: &str,
    recent_history: &[Turn],
    current_slots: &SlotSet,
    follow_up: bool,
) -> String {
    let history: Vec<String> = recent_history
        .iter()
        .map(|turn| {
            let who = match turn.speaker {
                Speaker::User => "Customer",
                Speaker::Assistant => "Assistant",
            };
            format!("{}: {}", who, turn.message)
        })
        .collect();
    let known = serde_json::to_string(current_slots).unwrap_or_default();
    let kind = if follow_up {
        "a short follow-up that refines the current request"
    } else {
        "a new statement of the request"
    };

    format!(
        "Extract paint requirements from the customer's latest message.\n\
         Answer with a single JSON object with the keys environment (interior|exterior), \
         surface (wall|wood|metal|tile), color, finish (matte|satin|semi-gloss|gloss), \
         room_type and audience_hint. Use null for anything the latest message does not state. \
         A room never implies interior or exterior.\n\n\
         Conversation so far:\n{history}\n\n\
         Already known: {known}\n\
         Latest message ({kind}): {utterance}\n",
        history = if history.is_empty() {
            "(none)".to_string()
        } else {
            history.join("\n")
        },
        known = known,
        kind = kind,
        utterance = utterance,
    )
}

/// Parse the first JSON object in the model's answer and normalize its values
fn parse_model_answer(response: &str) -> Option<PartialSlotSet> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    let raw: RawExtraction = serde_json::from_str(&response[start..=end]).ok()?;
    Some(normalize(raw))
}

fn meaningful(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty() && !matches!(v.as_str(), "null" | "none" | "unknown" | "n/a"))
}

fn normalize(raw: RawExtraction) -> PartialSlotSet {
    PartialSlotSet {
        environment: meaningful(raw.environment)
            .and_then(|v| vocab::detect_environment(&v))
            .filter(Environment::is_known),
        surface: meaningful(raw.surface)
            .and_then(|v| vocab::detect_surface(&v))
            .filter(Surface::is_known),
        color: meaningful(raw.color).map(|v| vocab::canonical_color(&v)),
        finish: meaningful(raw.finish).and_then(|v| vocab::detect_finish(&v)),
        room_type: meaningful(raw.room_type).map(|v| vocab::detect_room_type(&v).unwrap_or(v)),
        audience_hint: meaningful(raw.audience_hint)
            .map(|v| vocab::detect_audience(&v).unwrap_or(v)),
    }
}
