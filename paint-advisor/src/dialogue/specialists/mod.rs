//! Specialist panel
//!
//! Each specialist owns one axis of paint expertise and scores catalog
//! candidates along it. Specialists never see each other's output, so the
//! panel fans them out concurrently and the arbiter joins the results.

pub mod color;
pub mod exterior;
pub mod interior;
pub mod surface;

pub use color::ColorHarmonySpecialist;
pub use exterior::ExteriorDurabilitySpecialist;
pub use interior::InteriorComfortSpecialist;
pub use surface::SurfaceCompatibilitySpecialist;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{CandidateProduct, ProductId};
use crate::slots::SlotSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialistId {
    SurfaceCompatibility,
    ExteriorDurability,
    InteriorComfort,
    ColorHarmony,
}

impl SpecialistId {
    pub fn label(&self) -> &'static str {
        match self {
            SpecialistId::SurfaceCompatibility => "surface compatibility",
            SpecialistId::ExteriorDurability => "exterior durability",
            SpecialistId::InteriorComfort => "interior comfort",
            SpecialistId::ColorHarmony => "color harmony",
        }
    }

    /// Specialists whose ranking is a hard filter: a product they leave out
    /// must not be recommended, whatever the others say.
    pub fn is_hard_constraint(&self) -> bool {
        !matches!(self, SpecialistId::ColorHarmony)
    }
}

impl fmt::Display for SpecialistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One candidate as ranked by one specialist
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub product_ref: ProductId,
    pub score: f64,
    pub rationale: String,
}

/// Output of one specialist for one turn
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpecialistOpinion {
    pub specialist_id: SpecialistId,
    /// Whether the specialist had enough context to engage
    pub applicable: bool,
    /// Ranked best first; always empty when not applicable
    pub candidates: Vec<ScoredCandidate>,
    /// 0..=1
    pub confidence: f64,
}

impl SpecialistOpinion {
    pub fn abstain(specialist_id: SpecialistId) -> Self {
        Self {
            specialist_id,
            applicable: false,
            candidates: Vec::new(),
            confidence: 0.0,
        }
    }

    /// Build an applicable opinion from raw scores.
    ///
    /// Non-positive scores are dropped, the rest are sorted by score then
    /// catalog id, and confidence grows by `confidence_step` per ranked
    /// candidate up to 1.0.
    pub fn ranked(
        specialist_id: SpecialistId,
        mut candidates: Vec<ScoredCandidate>,
        confidence_step: f64,
    ) -> Self {
        candidates.retain(|c| c.score > 0.0);
        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.product_ref.cmp(&b.product_ref))
        });
        let confidence = (confidence_step * candidates.len() as f64).min(1.0);
        Self {
            specialist_id,
            applicable: true,
            candidates,
            confidence,
        }
    }

    /// Whether `product` is among this opinion's first `k` candidates
    pub fn ranks_in_top(&self, product: ProductId, k: usize) -> Option<&ScoredCandidate> {
        self.candidates
            .iter()
            .take(k)
            .find(|c| c.product_ref == product)
    }
}

/// A scoring function over one domain axis.
///
/// `analyze` is only meaningful when `can_help` returned true for the same
/// slots; the panel never calls it otherwise.
#[async_trait]
pub trait Specialist: Send + Sync {
    fn id(&self) -> SpecialistId;

    /// Whether the slots carry the minimum context this specialist needs
    fn can_help(&self, slots: &SlotSet) -> bool;

    async fn analyze(&self, slots: &SlotSet, candidates: &[CandidateProduct]) -> SpecialistOpinion;
}

/// Fixed roster of specialists consulted on every recommending turn
pub struct SpecialistPanel {
    specialists: Vec<Arc<dyn Specialist>>,
    timeout: Duration,
}

impl SpecialistPanel {
    pub fn new(specialists: Vec<Arc<dyn Specialist>>, timeout: Duration) -> Self {
        Self {
            specialists,
            timeout,
        }
    }

    /// The four canonical specialists
    pub fn standard(timeout: Duration) -> Self {
        let roster: Vec<Arc<dyn Specialist>> = vec![
            Arc::new(SurfaceCompatibilitySpecialist),
            Arc::new(ExteriorDurabilitySpecialist),
            Arc::new(InteriorComfortSpecialist),
            Arc::new(ColorHarmonySpecialist),
        ];
        Self::new(roster, timeout)
    }

    pub fn specialist_ids(&self) -> Vec<SpecialistId> {
        self.specialists.iter().map(|s| s.id()).collect()
    }

    /// Consult every specialist concurrently.
    ///
    /// Returns one opinion per specialist in roster order. Specialists whose
    /// `can_help` is false, or that miss the deadline, abstain.
    pub async fn consult(
        &self,
        slots: &SlotSet,
        candidates: &[CandidateProduct],
    ) -> Vec<SpecialistOpinion> {
        let timeout = self.timeout;
        let calls = self.specialists.iter().map(|specialist| async move {
            let id = specialist.id();
            if !specialist.can_help(slots) {
                tracing::debug!(specialist = %id, "specialist abstains: missing context");
                return SpecialistOpinion::abstain(id);
            }

            match tokio::time::timeout(timeout, specialist.analyze(slots, candidates)).await {
                Ok(mut opinion) => {
                    opinion.specialist_id = id;
                    if !opinion.applicable {
                        opinion.candidates.clear();
                        opinion.confidence = 0.0;
                    }
                    opinion.confidence = opinion.confidence.clamp(0.0, 1.0);
                    opinion
                }
                Err(_) => {
                    tracing::warn!(
                        specialist = %id,
                        timeout_ms = timeout.as_millis() as u64,
                        "specialist timed out, treating as abstained"
                    );
                    SpecialistOpinion::abstain(id)
                }
            }
        });

        join_all(calls).await
    }
}

// ============================================================================
// Scoring helpers shared by the specialists
// ============================================================================

/// Accumulates a score and the record facts that produced it
pub(crate) struct ScoreSheet {
    pub score: f64,
    pub reasons: Vec<String>,
}

impl ScoreSheet {
    pub fn new(base: f64) -> Self {
        Self {
            score: base,
            reasons: Vec::new(),
        }
    }

    pub fn add(&mut self, points: f64, reason: impl Into<String>) {
        self.score += points;
        self.reasons.push(reason.into());
    }

    /// Award `points` when the product lists any of `keywords`, citing the
    /// matching feature verbatim
    pub fn add_feature(&mut self, product: &CandidateProduct, keywords: &[&str], points: f64) -> bool {
        let lowered: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        let matched = product.features.iter().find(|feature| {
            let feature = feature.to_lowercase();
            lowered
                .iter()
                .any(|k| crate::slots::vocab::contains_term(&feature, k))
        });
        match matched {
            Some(feature) => {
                self.add(points, feature.clone());
                true
            }
            None => false,
        }
    }

    pub fn into_candidate(self, product: &CandidateProduct, lead: &str) -> ScoredCandidate {
        let rationale = if self.reasons.is_empty() {
            format!("{} {}.", product.name, lead)
        } else {
            format!("{} {}: {}.", product.name, lead, self.reasons.join(", "))
        };
        ScoredCandidate {
            product_ref: product.id,
            score: self.score,
            rationale,
        }
    }
}
