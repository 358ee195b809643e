// Interior comfort: odor, cleanability, and room- and occupant-specific needs

use async_trait::async_trait;

use super::{ScoreSheet, Specialist, SpecialistId, SpecialistOpinion};
use crate::catalog::{CandidateProduct, ProductEnvironment, ProductLine};
use crate::slots::{Environment, Finish, SlotSet};

const CONFIDENCE_STEP: f64 = 0.33;

const WASHABLE_TERMS: &[&str] = &["washable", "scrubbable", "lavável", "lavavel"];
const LOW_ODOR_TERMS: &[&str] = &[
    "low odor", "odorless", "odor-free", "no odor", "sem odor", "low voc", "zero voc",
];
const SAFE_FOR_KIDS_TERMS: &[&str] = &[
    "non-toxic", "nontoxic", "atóxica", "atoxica", "low voc", "zero voc", "hypoallergenic",
];
const MOISTURE_TERMS: &[&str] = &[
    "anti-mold", "antimold", "mildew", "moisture", "antimofo", "anti-mofo", "umidade",
];

pub struct InteriorComfortSpecialist;

fn is_wet_room(room: &str) -> bool {
    matches!(room, "bathroom" | "kitchen")
}

fn is_resting_room(room: &str) -> bool {
    matches!(room, "bedroom" | "living room" | "office")
}

#[async_trait]
impl Specialist for InteriorComfortSpecialist {
    fn id(&self) -> SpecialistId {
        SpecialistId::InteriorComfort
    }

    fn can_help(&self, slots: &SlotSet) -> bool {
        slots.environment == Environment::Interior
    }

    async fn analyze(&self, slots: &SlotSet, candidates: &[CandidateProduct]) -> SpecialistOpinion {
        let room = slots.room_type.as_deref().unwrap_or_default();
        let for_children = slots.audience_hint.as_deref() == Some("child");

        let scored = candidates
            .iter()
            .filter(|p| p.environment.supports(Environment::Interior))
            .map(|product| {
                let mut sheet = ScoreSheet::new(1.0);
                if product.environment == ProductEnvironment::Interior {
                    sheet.add(1.0, "made for indoor use");
                }
                sheet.add_feature(product, WASHABLE_TERMS, 2.0);
                sheet.add_feature(product, LOW_ODOR_TERMS, 2.0);
                if for_children {
                    sheet.add_feature(product, SAFE_FOR_KIDS_TERMS, 2.0);
                }
                if is_wet_room(room) {
                    sheet.add_feature(product, MOISTURE_TERMS, 2.0);
                }
                if is_resting_room(room) && matches!(product.finish, Finish::Matte | Finish::Satin) {
                    sheet.add(1.0, format!("{} finish", product.finish.label()));
                }
                if product.line == ProductLine::Premium {
                    sheet.add(1.0, "Premium line");
                }
                sheet.into_candidate(product, "is comfortable indoors")
            })
            .collect();

        SpecialistOpinion::ranked(self.id(), scored, CONFIDENCE_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::specialists::test_support::product;
    use crate::slots::Surface;

    fn bedroom_for_child() -> SlotSet {
        SlotSet {
            environment: Environment::Interior,
            surface: Surface::Wall,
            room_type: Some("bedroom".to_string()),
            audience_hint: Some("child".to_string()),
            ..SlotSet::default()
        }
    }

    #[tokio::test]
    async fn test_child_room_prefers_safe_washable_paint() {
        let basic = product(1, ProductEnvironment::Interior, &[]);
        let safe = product(2, ProductEnvironment::Interior, &["Washable", "Non-toxic"]);

        let opinion = InteriorComfortSpecialist
            .analyze(&bedroom_for_child(), &[basic, safe])
            .await;

        assert_eq!(opinion.candidates[0].product_ref, 2);
        // base + dedicated + washable + non-toxic + matte in bedroom
        assert_eq!(opinion.candidates[0].score, 1.0 + 1.0 + 2.0 + 2.0 + 1.0);
        assert!(opinion.candidates[0].rationale.contains("Non-toxic"));
    }

    #[tokio::test]
    async fn test_bathroom_rewards_mold_resistance() {
        let mut slots = bedroom_for_child();
        slots.room_type = Some("bathroom".to_string());
        slots.audience_hint = None;

        let plain = product(1, ProductEnvironment::Both, &[]);
        let mold = product(2, ProductEnvironment::Both, &["Anti-mold"]);
        let opinion = InteriorComfortSpecialist.analyze(&slots, &[plain, mold]).await;

        let order: Vec<u64> = opinion.candidates.iter().map(|c| c.product_ref).collect();
        assert_eq!(order, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_exterior_only_products_ignored() {
        let outdoor = product(1, ProductEnvironment::Exterior, &["Washable"]);
        let opinion = InteriorComfortSpecialist
            .analyze(&bedroom_for_child(), &[outdoor])
            .await;
        assert!(opinion.applicable);
        assert!(opinion.candidates.is_empty());
        assert_eq!(opinion.confidence, 0.0);
    }
}
