// Exterior durability: weather, sun and moisture resistance

use async_trait::async_trait;

use super::{ScoreSheet, Specialist, SpecialistId, SpecialistOpinion};
use crate::catalog::{CandidateProduct, ProductEnvironment, ProductLine};
use crate::slots::{Environment, SlotSet};

const CONFIDENCE_STEP: f64 = 0.33;

const UV_TERMS: &[&str] = &["uv", "uv protection", "sun protection", "proteção uv", "proteção solar"];
const RAIN_TERMS: &[&str] = &[
    "rain", "rain resistant", "waterproof", "weatherproof", "weather resistant", "chuva",
    "impermeável", "impermeavel",
];
const MOLD_TERMS: &[&str] = &["anti-mold", "antimold", "mildew", "antimofo", "anti-mofo", "fungicide"];
const ACRYLIC_TERMS: &[&str] = &["acrylic", "acrílica", "acrílico", "acrilica"];

pub struct ExteriorDurabilitySpecialist;

#[async_trait]
impl Specialist for ExteriorDurabilitySpecialist {
    fn id(&self) -> SpecialistId {
        SpecialistId::ExteriorDurability
    }

    fn can_help(&self, slots: &SlotSet) -> bool {
        slots.environment == Environment::Exterior
    }

    async fn analyze(&self, _slots: &SlotSet, candidates: &[CandidateProduct]) -> SpecialistOpinion {
        let scored = candidates
            .iter()
            .filter(|p| p.environment.supports(Environment::Exterior))
            .map(|product| {
                let mut sheet = ScoreSheet::new(1.0);
                if product.environment == ProductEnvironment::Exterior {
                    sheet.add(1.0, "made for exterior use");
                }
                sheet.add_feature(product, UV_TERMS, 3.0);
                sheet.add_feature(product, RAIN_TERMS, 3.0);
                sheet.add_feature(product, MOLD_TERMS, 2.0);
                sheet.add_feature(product, ACRYLIC_TERMS, 2.0);
                if product.line == ProductLine::Premium {
                    sheet.add(1.0, "Premium line");
                }
                sheet.into_candidate(product, "holds up outdoors")
            })
            .collect();

        SpecialistOpinion::ranked(self.id(), scored, CONFIDENCE_STEP)
    }
}
