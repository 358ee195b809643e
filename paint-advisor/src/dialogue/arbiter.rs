// Arbiter: merge specialist opinions into one grounded product, or none

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::specialists::{SpecialistId, SpecialistOpinion};
use crate::catalog::{CandidateProduct, ProductId};
use crate::config::ArbiterConfig;
use crate::slots::{vocab, SlotSet};

/// Why no product was selected
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoMatchReason {
    /// The retriever returned nothing
    NoCandidates,
    /// Every specialist abstained
    NoApplicableSpecialist,
    /// Applicable specialists ranked nothing from the candidate list
    NothingScored,
    /// The best weighted score stayed under the threshold
    BelowThreshold { best_score: f64 },
}

/// The single product (or none) chosen for a turn
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundedSelection {
    pub product: Option<CandidateProduct>,
    pub supporting_rationales: Vec<String>,
    pub score: f64,
    pub contributing: Vec<SpecialistId>,
    pub no_match: Option<NoMatchReason>,
}

impl GroundedSelection {
    pub fn none(reason: NoMatchReason) -> Self {
        Self {
            product: None,
            supporting_rationales: Vec::new(),
            score: 0.0,
            contributing: Vec::new(),
            no_match: Some(reason),
        }
    }

    pub fn product_ref(&self) -> Option<ProductId> {
        self.product.as_ref().map(|p| p.id)
    }
}

struct Ranked<'a> {
    product: &'a CandidateProduct,
    weighted: f64,
    raw: f64,
    optional_matches: usize,
}

#[derive(Debug, Clone)]
pub struct Arbiter {
    min_score: f64,
    rationale_top_k: usize,
}

impl Default for Arbiter {
    fn default() -> Self {
        Self::new(&ArbiterConfig::default())
    }
}

impl Arbiter {
    pub fn new(config: &ArbiterConfig) -> Self {
        Self {
            min_score: config.min_score,
            rationale_top_k: config.rationale_top_k,
        }
    }

    /// Select the best candidate.
    ///
    /// Candidates are ranked by confidence-weighted score sum, then raw score
    /// sum, then the number of optional slots they satisfy, then catalog id.
    /// A product left out by any applicable hard-constraint specialist is
    /// never ranked. References to products outside `candidates` are ignored.
    /// The result is a pure function of the inputs.
    pub fn select(
        &self,
        opinions: &[SpecialistOpinion],
        slots: &SlotSet,
        candidates: &[CandidateProduct],
    ) -> GroundedSelection {
        if candidates.is_empty() {
            return GroundedSelection::none(NoMatchReason::NoCandidates);
        }

        let applicable: Vec<&SpecialistOpinion> = opinions
            .iter()
            .filter(|o| o.applicable && !o.candidates.is_empty())
            .collect();
        if !opinions.iter().any(|o| o.applicable) {
            return GroundedSelection::none(NoMatchReason::NoApplicableSpecialist);
        }

        let by_id: BTreeMap<ProductId, &CandidateProduct> =
            candidates.iter().map(|p| (p.id, p)).collect();

        let vetoes: Vec<&SpecialistOpinion> = opinions
            .iter()
            .filter(|o| o.applicable && o.specialist_id.is_hard_constraint())
            .collect();
        let admitted = |id: ProductId| {
            vetoes
                .iter()
                .all(|o| o.candidates.iter().any(|c| c.product_ref == id))
        };

        let mut totals: BTreeMap<ProductId, (f64, f64)> = BTreeMap::new();
        for opinion in &applicable {
            for scored in &opinion.candidates {
                if !by_id.contains_key(&scored.product_ref) || !admitted(scored.product_ref) {
                    continue;
                }
                let entry = totals.entry(scored.product_ref).or_insert((0.0, 0.0));
                entry.0 += scored.score * opinion.confidence;
                entry.1 += scored.score;
            }
        }

        let mut ranked: Vec<Ranked> = totals
            .into_iter()
            .filter_map(|(id, (weighted, raw))| {
                by_id.get(&id).map(|product| Ranked {
                    product: *product,
                    weighted,
                    raw,
                    optional_matches: optional_matches(product, slots),
                })
            })
            .collect();
        ranked.sort_by(compare_ranked);

        let Some(best) = ranked.first() else {
            return GroundedSelection::none(NoMatchReason::NothingScored);
        };

        if best.weighted < self.min_score {
            tracing::debug!(
                product_id = best.product.id,
                score = best.weighted,
                min_score = self.min_score,
                "best candidate below threshold"
            );
            return GroundedSelection::none(NoMatchReason::BelowThreshold {
                best_score: best.weighted,
            });
        }

        let mut supporting_rationales = Vec::new();
        let mut contributing = Vec::new();
        for opinion in &applicable {
            if let Some(scored) = opinion.ranks_in_top(best.product.id, self.rationale_top_k) {
                contributing.push(opinion.specialist_id);
                if !scored.rationale.is_empty() {
                    supporting_rationales.push(scored.rationale.clone());
                }
            }
        }

        GroundedSelection {
            product: Some(best.product.clone()),
            supporting_rationales,
            score: best.weighted,
            contributing,
            no_match: None,
        }
    }
}

fn compare_ranked(a: &Ranked, b: &Ranked) -> Ordering {
    b.weighted
        .total_cmp(&a.weighted)
        .then_with(|| b.raw.total_cmp(&a.raw))
        .then_with(|| b.optional_matches.cmp(&a.optional_matches))
        .then_with(|| a.product.id.cmp(&b.product.id))
}

/// How many of the user's optional slots the product satisfies
fn optional_matches(product: &CandidateProduct, slots: &SlotSet) -> usize {
    let mut matches = 0;
    if slots.color.as_deref().map_or(false, |c| product.matches_color(c)) {
        matches += 1;
    }
    if slots.finish == Some(product.finish) {
        matches += 1;
    }
    if let Some(room) = &slots.room_type {
        if vocab::contains_term(&product.record_text(), &room.to_lowercase()) {
            matches += 1;
        }
    }
    matches
}
