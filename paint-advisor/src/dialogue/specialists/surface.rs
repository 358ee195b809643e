// Surface compatibility: is the product rated for the surface being painted

use async_trait::async_trait;

use super::{ScoreSheet, Specialist, SpecialistId, SpecialistOpinion};
use crate::catalog::CandidateProduct;
use crate::slots::{SlotSet, Surface};

const COMPATIBLE: f64 = 5.0;
const SURFACE_FEATURE: f64 = 2.0;
const DEDICATED: f64 = 1.0;
const CONFIDENCE_STEP: f64 = 0.33;

pub struct SurfaceCompatibilitySpecialist;

fn surface_keywords(surface: Surface) -> &'static [&'static str] {
    match surface {
        Surface::Wall => &[
            "high coverage", "alta cobertura", "anti-crack", "antifissura", "alto rendimento",
        ],
        Surface::Wood => &[
            "wood protection", "water repellent", "anti-termite", "verniz", "stain",
            "proteção para madeira", "cupim",
        ],
        Surface::Metal => &[
            "anti-rust", "antiferrugem", "rust protection", "corrosion", "anticorrosivo",
        ],
        Surface::Tile => &["ceramic adhesion", "aderência", "epoxy", "epóxi"],
        Surface::Unknown => &[],
    }
}

#[async_trait]
impl Specialist for SurfaceCompatibilitySpecialist {
    fn id(&self) -> SpecialistId {
        SpecialistId::SurfaceCompatibility
    }

    fn can_help(&self, slots: &SlotSet) -> bool {
        slots.surface.is_known()
    }

    async fn analyze(&self, slots: &SlotSet, candidates: &[CandidateProduct]) -> SpecialistOpinion {
        let surface = slots.surface;
        let scored = candidates
            .iter()
            .filter(|p| p.supports_surface(surface))
            .map(|product| {
                let mut sheet = ScoreSheet::new(COMPATIBLE);
                sheet.reasons.push(format!("rated for {} surfaces", surface.label()));
                sheet.add_feature(product, surface_keywords(surface), SURFACE_FEATURE);
                if product.surface_compatibility.len() == 1 {
                    sheet.score += DEDICATED;
                }
                sheet.into_candidate(product, "suits the surface")
            })
            .collect();

        SpecialistOpinion::ranked(self.id(), scored, CONFIDENCE_STEP)
    }
}
