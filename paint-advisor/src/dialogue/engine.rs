// DialogueEngine: one user turn in, one grounded reply out
//
// Per turn: validate input, lock the session, extract, merge, gate, then either
// ask a question or retrieve -> consult specialists -> arbitrate -> render.
// The session lock is held for the whole turn, so turns of one conversation
// are strictly sequential. Session state (slots, history, last selection) is
// written in one place at the end of the turn, so a turn whose future is
// dropped part way leaves the session as it was.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::arbiter::{Arbiter, GroundedSelection, NoMatchReason};
use super::extractor::ContextExtractor;
use super::gate;
use super::session::SessionStore;
use super::specialists::SpecialistPanel;
use super::synthesizer::{RenderContext, Rendered, ResponseSynthesizer};
use super::types::{
    DialogueError, GateDecision, RenderMode, SpecialistReport, Turn, TurnReply,
};
use crate::catalog::{CandidateProduct, CatalogRetriever, ColorAvailability};
use crate::config::AdvisorConfig;
use crate::llm::LlmProvider;
use crate::slots::{vocab, SlotSet};

pub struct DialogueEngine {
    config: AdvisorConfig,
    retriever: Arc<dyn CatalogRetriever>,
    sessions: Arc<dyn SessionStore>,
    extractor: ContextExtractor,
    panel: SpecialistPanel,
    arbiter: Arbiter,
    synthesizer: ResponseSynthesizer,
}

impl DialogueEngine {
    /// Build an engine. `llm = None` runs the rule-based and template paths only.
    pub fn new(
        config: AdvisorConfig,
        retriever: Arc<dyn CatalogRetriever>,
        sessions: Arc<dyn SessionStore>,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Self {
        let panel = SpecialistPanel::standard(Duration::from_millis(
            config.panel.specialist_timeout_ms,
        ));
        Self::with_panel(config, retriever, sessions, llm, panel)
    }

    /// Build an engine around a custom specialist roster
    pub fn with_panel(
        config: AdvisorConfig,
        retriever: Arc<dyn CatalogRetriever>,
        sessions: Arc<dyn SessionStore>,
        llm: Option<Arc<dyn LlmProvider>>,
        panel: SpecialistPanel,
    ) -> Self {
        let extractor = ContextExtractor::new(
            llm.clone(),
            config.generation.extraction_temperature,
            config.dialogue.follow_up_max_chars,
        );
        let synthesizer = ResponseSynthesizer::new(llm, config.generation.synthesis_temperature);
        let arbiter = Arbiter::new(&config.arbiter);

        Self {
            config,
            retriever,
            sessions,
            extractor,
            panel,
            arbiter,
            synthesizer,
        }
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Clear a conversation. Idempotent.
    pub async fn reset(&self, session_id: &str) {
        self.sessions.reset(session_id).await;
    }

    /// Drop sessions idle for longer than `dialogue.session_idle_secs`
    pub async fn evict_idle_sessions(&self) -> usize {
        let max_idle = i64::try_from(self.config.dialogue.session_idle_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX);
        self.sessions.evict_idle(max_idle).await
    }

    /// Process one user utterance for `session_id`
    pub async fn handle_turn(
        &self,
        session_id: &str,
        utterance: &str,
    ) -> Result<TurnReply, DialogueError> {
        let utterance = self.validate_utterance(utterance)?;
        let started = Instant::now();

        let session = self.sessions.session(session_id).await;
        let mut session = session.lock().await;

        let window = session.recent_turns(self.config.dialogue.extraction_window);
        let extraction = self.extractor.extract(utterance, &window, &session.slots).await;

        let slots = session.slots.merge(&extraction.update);

        let decision = gate::decide(&slots);
        let greeting = extraction.update.is_empty() && vocab::is_greeting(utterance);

        let mut specialists = Vec::new();
        let (selection, rendered) = match decision {
            GateDecision::AskFor(_) => {
                let selection = GroundedSelection::none(NoMatchReason::NoCandidates);
                let ctx = RenderContext {
                    utterance,
                    available_colors: &[],
                    competing_names: &[],
                    greeting,
                };
                let rendered = self.synthesizer.render(&selection, &slots, decision, ctx).await;
                (None, rendered)
            }
            GateDecision::Proceed => {
                let recap = if extraction.update.is_empty() && vocab::wants_visualization(utterance) {
                    session
                        .last_selection
                        .as_ref()
                        .and_then(|last| self.synthesizer.render_recap(last).map(|r| (last.clone(), r)))
                } else {
                    None
                };

                match recap {
                    Some((last, rendered)) => (Some(last), rendered),
                    None => {
                        let (selection, rendered, reports) =
                            self.recommend(&slots, utterance, greeting).await;
                        specialists = reports;
                        (Some(selection), rendered)
                    }
                }
            }
        };

        let grounded_product_id = selection.as_ref().and_then(|s| s.product_ref());
        let rationales = selection
            .as_ref()
            .map(|s| s.supporting_rationales.clone())
            .unwrap_or_default();

        session.slots = slots.clone();
        session.push(Turn::user(utterance));
        session.push(Turn::assistant(rendered.text.clone()));
        session.turn_count += 1;
        if let Some(selection) = selection.filter(|s| s.product.is_some()) {
            session.last_selection = Some(selection);
        }

        tracing::info!(
            session_id,
            turn = session.turn_count,
            extraction = ?extraction.mode,
            follow_up = extraction.follow_up,
            decision = ?decision,
            specialists = %specialists
                .iter()
                .filter(|r: &&SpecialistReport| r.applicable)
                .map(|r| format!("{}:{:.2}", r.specialist_id, r.confidence))
                .collect::<Vec<_>>()
                .join(","),
            product_id = ?grounded_product_id,
            render = ?rendered.mode,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "turn handled"
        );

        Ok(TurnReply {
            reply: rendered.text,
            slots_snapshot: slots,
            grounded_product_id,
            decision,
            follow_up: extraction.follow_up,
            extraction_mode: extraction.mode,
            render_mode: rendered.mode,
            specialists,
            rationales,
        })
    }

    fn validate_utterance<'a>(&self, utterance: &'a str) -> Result<&'a str, DialogueError> {
        let trimmed = utterance.trim();
        if trimmed.is_empty() {
            return Err(DialogueError::EmptyUtterance);
        }
        let length = trimmed.chars().count();
        let max = self.config.dialogue.max_utterance_chars;
        if length > max {
            return Err(DialogueError::UtteranceTooLong { length, max });
        }
        Ok(trimmed)
    }

    async fn recommend(
        &self,
        slots: &SlotSet,
        utterance: &str,
        greeting: bool,
    ) -> (GroundedSelection, Rendered, Vec<SpecialistReport>) {
        let retrieved = self.retrieve(slots).await;
        // The retriever may search loosely; environment and surface stay hard filters
        let candidates: Vec<CandidateProduct> = retrieved
            .iter()
            .filter(|c| meets_required_slots(c, slots))
            .cloned()
            .collect();
        if candidates.len() < retrieved.len() {
            tracing::debug!(
                dropped = retrieved.len() - candidates.len(),
                "retrieved rows outside the known environment or surface"
            );
        }

        let opinions = self.panel.consult(slots, &candidates).await;
        let selection = self.arbiter.select(&opinions, slots, &candidates);

        let reports = opinions
            .iter()
            .map(|o| SpecialistReport {
                specialist_id: o.specialist_id,
                applicable: o.applicable,
                confidence: o.confidence,
                candidate_count: o.candidates.len(),
            })
            .collect();

        let (available_colors, competing_names) = match &selection.product {
            None => (self.available_colors().await, Vec::new()),
            Some(chosen) => {
                let mut names: Vec<String> = retrieved
                    .iter()
                    .filter(|c| c.id != chosen.id)
                    .map(|c| c.name.clone())
                    .collect();
                names.extend(self.catalog_names().await);
                names.retain(|n| !n.eq_ignore_ascii_case(&chosen.name));
                names.sort();
                names.dedup();
                (Vec::new(), names)
            }
        };

        let ctx = RenderContext {
            utterance,
            available_colors: &available_colors,
            competing_names: &competing_names,
            greeting,
        };
        let rendered = self
            .synthesizer
            .render(&selection, slots, GateDecision::Proceed, ctx)
            .await;

        if rendered.mode == RenderMode::Template && selection.product.is_some() {
            tracing::debug!("product reply rendered from template");
        }

        (selection, rendered, reports)
    }

    /// Retrieval failures degrade to an empty candidate list
    async fn retrieve(&self, slots: &SlotSet) -> Vec<CandidateProduct> {
        match self.retriever.retrieve(slots, self.config.retrieval.limit).await {
            Ok(mut candidates) => {
                candidates.truncate(self.config.retrieval.limit);
                candidates
            }
            Err(e) => {
                tracing::warn!(error = %e, "catalog retrieval failed, treating as no candidates");
                Vec::new()
            }
        }
    }

    async fn catalog_names(&self) -> Vec<String> {
        match self.retriever.product_names().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "could not list catalog product names");
                Vec::new()
            }
        }
    }

    async fn available_colors(&self) -> Vec<ColorAvailability> {
        match self.retriever.available_colors().await {
            Ok(colors) => colors,
            Err(e) => {
                tracing::warn!(error = %e, "could not list available colors");
                Vec::new()
            }
        }
    }
}

fn meets_required_slots(product: &CandidateProduct, slots: &SlotSet) -> bool {
    (!slots.environment.is_known() || product.environment.supports(slots.environment))
        && (!slots.surface.is_known() || product.supports_surface(slots.surface))
}
