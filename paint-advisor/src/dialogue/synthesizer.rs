// ResponseSynthesizer: turns the gate decision and grounded selection into a reply
//
// Questions and no-match replies are always template text. Product replies may
// be generated, but only survive if the grounding validator accepts them;
// otherwise the record-only template is used.

use std::sync::Arc;

use super::arbiter::GroundedSelection;
use super::grounding::GroundingValidator;
use super::specialists::SpecialistId;
use super::types::{GateDecision, RenderMode};
use crate::catalog::{CandidateProduct, ColorAvailability};
use crate::llm::LlmProvider;
use crate::slots::{SlotName, SlotSet};

/// Facts about the turn that shape the wording
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub utterance: &'a str,
    pub available_colors: &'a [ColorAvailability],
    /// Names of other products known this turn, none of which may appear
    pub competing_names: &'a [String],
    pub greeting: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub text: String,
    pub mode: RenderMode,
}

impl Rendered {
    fn template(text: String) -> Self {
        Self {
            text,
            mode: RenderMode::Template,
        }
    }
}

pub struct ResponseSynthesizer {
    llm: Option<Arc<dyn LlmProvider>>,
    temperature: f64,
    validator: GroundingValidator,
}

impl ResponseSynthesizer {
    pub fn new(llm: Option<Arc<dyn LlmProvider>>, temperature: f64) -> Self {
        Self {
            llm,
            temperature,
            validator: GroundingValidator::new(),
        }
    }

    pub async fn render(
        &self,
        selection: &GroundedSelection,
        slots: &SlotSet,
        decision: GateDecision,
        ctx: RenderContext<'_>,
    ) -> Rendered {
        match (decision, &selection.product) {
            (GateDecision::AskFor(slot), _) => {
                Rendered::template(clarifying_question(slot, slots, ctx.greeting))
            }
            (GateDecision::Proceed, None) => {
                Rendered::template(no_match_message(slots, ctx.available_colors))
            }
            (GateDecision::Proceed, Some(product)) => {
                self.render_product(product, selection, slots, ctx).await
            }
        }
    }

    /// Re-present the last selected product when the user asks to see it
    pub fn render_recap(&self, selection: &GroundedSelection) -> Option<Rendered> {
        let product = selection.product.as_ref()?;
        let text = format!(
            "Image previews are not available here, but here is the recommendation again. {}",
            product_template(
                product,
                &selection.supporting_rationales,
                &selection.contributing
            )
        );
        Some(self.grounded_or_minimal(text, product, &[]))
    }

    async fn render_product(
        &self,
        product: &CandidateProduct,
        selection: &GroundedSelection,
        slots: &SlotSet,
        ctx: RenderContext<'_>,
    ) -> Rendered {
        if let Some(llm) = &self.llm {
            let prompt = synthesis_prompt(product, selection, slots, ctx.utterance);
            match llm.complete(&prompt, self.temperature).await {
                Ok(text) => {
                    let text = text.trim().to_string();
                    match self.validator.validate(&text, product, ctx.competing_names) {
                        Ok(()) => {
                            return Rendered {
                                text,
                                mode: RenderMode::Generated,
                            }
                        }
                        Err(violation) => {
                            tracing::warn!(
                                product_id = product.id,
                                error = %violation,
                                "generated reply failed grounding, using template"
                            );
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "reply generation unavailable, using template");
                }
            }
        }

        let text = product_template(
            product,
            &selection.supporting_rationales,
            &selection.contributing,
        );
        self.grounded_or_minimal(text, product, ctx.competing_names)
    }

    fn grounded_or_minimal(
        &self,
        text: String,
        product: &CandidateProduct,
        competing_names: &[String],
    ) -> Rendered {
        match self.validator.validate(&text, product, competing_names) {
            Ok(()) => Rendered::template(text),
            Err(violation) => {
                // Record text itself trips the validator (e.g. a feature naming another color)
                tracing::error!(
                    product_id = product.id,
                    error = %violation,
                    "template reply failed grounding, falling back to name only"
                );
                Rendered::template(format!("I recommend {}.", product.name))
            }
        }
    }
}

fn clarifying_question(slot: SlotName, slots: &SlotSet, greeting: bool) -> String {
    let mut parts = Vec::new();
    if greeting {
        parts.push("Hello! I can help you choose the right paint.".to_string());
    }
    let known = slots.describe();
    if !known.is_empty() {
        parts.push(format!("Got it: {}.", known));
    }
    parts.push(
        match slot {
            SlotName::Environment => "Is this for an interior or an exterior space?",
            SlotName::Surface => "What surface are you painting: wall, wood, metal or tile?",
            SlotName::Color => "Which color do you have in mind?",
            SlotName::Finish => "Which finish do you prefer: matte, satin, semi-gloss or gloss?",
            SlotName::RoomType => "Which room is it for?",
            SlotName::AudienceHint => "Who will be using the space?",
        }
        .to_string(),
    );
    parts.join(" ")
}

fn no_match_message(slots: &SlotSet, available_colors: &[ColorAvailability]) -> String {
    let known = slots.describe();
    let mut message = if known.is_empty() {
        "Sorry, no match found in our catalog.".to_string()
    } else {
        format!("Sorry, no match found in our catalog for {}.", known)
    };

    if !available_colors.is_empty() {
        let listed: Vec<String> = available_colors
            .iter()
            .map(|c| {
                let noun = if c.count == 1 { "option" } else { "options" };
                format!("{} ({} {})", c.color, c.count, noun)
            })
            .collect();
        message.push_str(&format!(" Available colors: {}.", listed.join(", ")));
    }
    message.push_str(" Would you like to adjust the color or finish?");
    message
}

/// Reply built only from the record's own fields and the specialists' rationales,
/// naming the specialists whose ranking backed the pick
pub fn product_template(
    product: &CandidateProduct,
    rationales: &[String],
    consulted: &[SpecialistId],
) -> String {
    let surfaces: Vec<&str> = product
        .surface_compatibility
        .iter()
        .map(|s| s.label())
        .collect();

    let mut text = format!(
        "I recommend {} ({} line), a {} paint for {} use on {}.",
        product.name,
        product.line,
        product.finish.label(),
        product.environment.label(),
        surfaces.join(", ")
    );
    if let Some(color) = &product.color {
        text.push_str(&format!(" Color: {}.", color));
    }
    if !product.features.is_empty() {
        text.push_str(&format!(" Highlights: {}.", product.features.join(", ")));
    }
    text.push_str(&format!(" Price: R$ {:.2}.", product.price));
    if !consulted.is_empty() {
        let labels: Vec<&str> = consulted.iter().map(|id| id.label()).collect();
        text.push_str(&format!(" Consulted: {} specialists.", labels.join(", ")));
    }
    if !rationales.is_empty() {
        text.push_str(&format!(" Why: {}", rationales.join(" ")));
    }
    text
}

fn synthesis_prompt(
    product: &CandidateProduct,
    selection: &GroundedSelection,
    slots: &SlotSet,
    utterance: &str,
) -> String {
    let features = if product.features.is_empty() {
        "none".to_string()
    } else {
        product.features.join(", ")
    };
    format!(
        "You are a paint store assistant. Recommend exactly one product to the customer.\n\
         Use ONLY the facts below. Do not mention any other product, price, number, color, \
         finish, environment or surface. Reply in 2-3 sentences.\n\n\
         Customer said: {utterance}\n\
         Customer needs: {needs}\n\n\
         Product name: {name}\n\
         Line: {line}\n\
         Finish: {finish}\n\
         Environment: {env}\n\
         Surfaces: {surfaces}\n\
         Color: {color}\n\
         Features: {features}\n\
         Price: R$ {price:.2}\n\
         Specialists consulted: {consulted}\n\
         Specialist notes: {notes}\n\
         Name the specialists consulted.\n",
        utterance = utterance,
        needs = slots.describe(),
        name = product.name,
        line = product.line,
        finish = product.finish.label(),
        env = product.environment.label(),
        surfaces = product
            .surface_compatibility
            .iter()
            .map(|s| s.label())
            .collect::<Vec<_>>()
            .join(", "),
        color = product.color.as_deref().unwrap_or("not specified"),
        features = features,
        price = product.price,
        consulted = selection
            .contributing
            .iter()
            .map(|id| id.label())
            .collect::<Vec<_>>()
            .join(", "),
        notes = selection.supporting_rationales.join(" "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ProductEnvironment, ProductLine};
    use crate::dialogue::arbiter::NoMatchReason;
    use crate::llm::StubLlmProvider;
    use crate::slots::{Environment, Finish, Surface};

    fn product() -> CandidateProduct {
        CandidateProduct {
            id: 11,
            name: "Coral Sol & Chuva".to_string(),
            price: 259.9,
            environment: ProductEnvironment::Exterior,
            surface_compatibility: vec![Surface::Wall],
            finish: Finish::Satin,
            features: vec!["UV protection".to_string(), "Rain resistant".to_string()],
            color: Some("Yellow".to_string()),
            line: ProductLine::Premium,
            description: None,
        }
    }

    fn selection() -> GroundedSelection {
        GroundedSelection {
            product: Some(product()),
            supporting_rationales: vec![
                "Coral Sol & Chuva holds up outdoors: made for exterior use, UV protection.".to_string(),
            ],
            score: 9.0,
            contributing: vec![SpecialistId::SurfaceCompatibility, SpecialistId::ExteriorDurability],
            no_match: None,
        }
    }

    fn slots() -> SlotSet {
        SlotSet {
            environment: Environment::Exterior,
            surface: Surface::Wall,
            color: Some("yellow".to_string()),
            ..SlotSet::default()
        }
    }

    fn ctx<'a>(competitors: &'a [String]) -> RenderContext<'a> {
        RenderContext {
            utterance: "yellow for my facade",
            available_colors: &[],
            competing_names: competitors,
            greeting: false,
        }
    }

    #[tokio::test]
    async fn test_question_branch_never_mentions_products() {
        let synthesizer = ResponseSynthesizer::new(None, 0.7);
        let rendered = synthesizer
            .render(
                &selection(),
                &SlotSet::default(),
                GateDecision::AskFor(SlotName::Environment),
                RenderContext { greeting: true, ..ctx(&[]) },
            )
            .await;

        assert_eq!(rendered.mode, RenderMode::Template);
        assert!(rendered.text.starts_with("Hello!"));
        assert!(rendered.text.contains("interior or an exterior"));
        assert!(!rendered.text.contains("Coral"));
    }

    #[tokio::test]
    async fn test_template_is_grounded() {
        let synthesizer = ResponseSynthesizer::new(None, 0.7);
        let rendered = synthesizer
            .render(&selection(), &slots(), GateDecision::Proceed, ctx(&[]))
            .await;

        assert_eq!(rendered.mode, RenderMode::Template);
        assert!(rendered.text.contains("Coral Sol & Chuva"));
        assert!(rendered.text.contains("R$ 259.90"));
        assert!(rendered
            .text
            .contains("Consulted: surface compatibility, exterior durability specialists."));
        assert!(GroundingValidator::new()
            .validate(&rendered.text, &product(), &[])
            .is_ok());
    }

    #[tokio::test]
    async fn test_ungrounded_generation_replaced_by_template() {
        let stub = Arc::new(StubLlmProvider::new([
            "Try Coral Sol & Chuva, or Suvinil Fachada for just R$ 99.",
        ]));
        let llm: Arc<dyn LlmProvider> = stub.clone();
        let synthesizer = ResponseSynthesizer::new(Some(llm), 0.7);
        let competitors = vec!["Suvinil Fachada".to_string()];

        let rendered = synthesizer
            .render(&selection(), &slots(), GateDecision::Proceed, ctx(&competitors))
            .await;

        assert_eq!(rendered.mode, RenderMode::Template);
        assert!(!rendered.text.contains("Suvinil"));
        assert_eq!(stub.recorded_prompts()[0].1, 0.7);
    }

    #[tokio::test]
    async fn test_grounded_generation_kept() {
        let stub = Arc::new(StubLlmProvider::new([
            "Coral Sol & Chuva is a Premium satin paint with UV protection, at R$ 259,90.",
        ]));
        let llm: Arc<dyn LlmProvider> = stub;
        let synthesizer = ResponseSynthesizer::new(Some(llm), 0.7);

        let rendered = synthesizer
            .render(&selection(), &slots(), GateDecision::Proceed, ctx(&[]))
            .await;
        assert_eq!(rendered.mode, RenderMode::Generated);
    }

    #[tokio::test]
    async fn test_no_match_lists_available_colors() {
        let synthesizer = ResponseSynthesizer::new(None, 0.7);
        let colors = vec![
            ColorAvailability { color: "white".to_string(), count: 3 },
            ColorAvailability { color: "gray".to_string(), count: 1 },
        ];
        let none = GroundedSelection::none(NoMatchReason::NoCandidates);

        let rendered = synthesizer
            .render(
                &none,
                &slots(),
                GateDecision::Proceed,
                RenderContext { available_colors: &colors, ..ctx(&[]) },
            )
            .await;

        assert!(rendered.text.contains("no match"));
        assert!(rendered.text.contains("white (3 options), gray (1 option)"));
    }

    #[test]
    fn test_recap_mentions_no_image() {
        let synthesizer = ResponseSynthesizer::new(None, 0.7);
        let rendered = synthesizer.render_recap(&selection()).unwrap();
        assert!(rendered.text.contains("Image previews are not available"));
        assert!(rendered.text.contains("Coral Sol & Chuva"));
        assert!(synthesizer
            .render_recap(&GroundedSelection::none(NoMatchReason::NoCandidates))
            .is_none());
    }
}
