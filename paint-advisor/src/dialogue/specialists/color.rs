// Color harmony: match the requested color and finish, with a note on the color's mood

use async_trait::async_trait;

use super::{ScoreSheet, Specialist, SpecialistId, SpecialistOpinion};
use crate::catalog::CandidateProduct;
use crate::slots::SlotSet;

const EXACT_COLOR: f64 = 5.0;
const TINTABLE: f64 = 1.0;
const FINISH_MATCH: f64 = 2.0;
const CONFIDENCE_STEP: f64 = 0.2;

pub struct ColorHarmonySpecialist;

/// Short mood note for a canonical color. Mentions no other color.
pub fn color_psychology(color: &str) -> Option<&'static str> {
    let note = match color {
        "blue" => "blue is calming and helps rest",
        "green" => "green feels balanced and natural",
        "yellow" => "yellow is cheerful and energizing",
        "red" => "red is bold and stimulating, best used as an accent",
        "white" => "white is clean and makes spaces feel larger",
        "gray" => "gray is neutral and elegant",
        "pink" => "pink is soft and welcoming",
        "purple" => "purple is creative and cozy",
        "orange" => "orange is warm and sociable",
        "brown" => "brown is earthy and grounding",
        "beige" => "beige is warm and easy to live with",
        "black" => "black is dramatic and sophisticated",
        _ => return None,
    };
    Some(note)
}

#[async_trait]
impl Specialist for ColorHarmonySpecialist {
    fn id(&self) -> SpecialistId {
        SpecialistId::ColorHarmony
    }

    fn can_help(&self, slots: &SlotSet) -> bool {
        slots.color.as_deref().map_or(false, |c| !c.trim().is_empty())
    }

    async fn analyze(&self, slots: &SlotSet, candidates: &[CandidateProduct]) -> SpecialistOpinion {
        let Some(color) = slots.color.as_deref() else {
            return SpecialistOpinion::abstain(self.id());
        };

        let scored = candidates
            .iter()
            .filter(|p| !p.contradicts_color(color))
            .map(|product| {
                let mut sheet = ScoreSheet::new(0.0);
                match product.canonical_color() {
                    Some(stored) => {
                        let note = color_psychology(&stored)
                            .map(|n| format!(" ({})", n))
                            .unwrap_or_default();
                        sheet.add(EXACT_COLOR, format!("{} color{}", stored, note));
                    }
                    None => sheet.add(TINTABLE, "no fixed color"),
                }
                if slots.finish == Some(product.finish) {
                    sheet.add(FINISH_MATCH, format!("{} finish", product.finish.label()));
                }
                sheet.into_candidate(product, "fits the color request")
            })
            .collect();

        SpecialistOpinion::ranked(self.id(), scored, CONFIDENCE_STEP)
    }
}
