use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use paint_advisor::catalog::{
    CandidateProduct, CatalogRetriever, ColorAvailability, InMemoryCatalog, ProductEnvironment,
    ProductLine, RetrievalError,
};
use paint_advisor::config::AdvisorConfig;
use paint_advisor::dialogue::{
    DialogueEngine, ExtractionMode, GateDecision, GroundingValidator, InMemorySessionStore,
    RenderMode, SessionStore,
};
use paint_advisor::llm::{LlmProvider, StubLlmProvider};
use paint_advisor::slots::{Environment, Finish, SlotName, SlotSet, Surface};

const CATALOG: &str = include_str!("../../data/catalog.json");

fn catalog() -> Arc<InMemoryCatalog> {
    Arc::new(InMemoryCatalog::from_json_str(CATALOG).expect("catalog fixture"))
}

fn offline_engine() -> DialogueEngine {
    DialogueEngine::new(
        AdvisorConfig::default(),
        catalog(),
        Arc::new(InMemorySessionStore::default()),
        None,
    )
}

fn product(catalog: &InMemoryCatalog, id: u64) -> CandidateProduct {
    catalog
        .products()
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .expect("product in fixture")
}

/// Retriever that never finds anything but still knows which colors exist
struct EmptyRetriever;

#[async_trait]
impl CatalogRetriever for EmptyRetriever {
    async fn retrieve(
        &self,
        _slots: &SlotSet,
        _limit: usize,
    ) -> Result<Vec<CandidateProduct>, RetrievalError> {
        Ok(Vec::new())
    }

    async fn available_colors(&self) -> Result<Vec<ColorAvailability>, RetrievalError> {
        Ok(vec![
            ColorAvailability {
                color: "white".to_string(),
                count: 3,
            },
            ColorAvailability {
                color: "gray".to_string(),
                count: 1,
            },
        ])
    }
}

/// Retriever whose backend is down
struct BrokenRetriever;

#[async_trait]
impl CatalogRetriever for BrokenRetriever {
    async fn retrieve(
        &self,
        _slots: &SlotSet,
        _limit: usize,
    ) -> Result<Vec<CandidateProduct>, RetrievalError> {
        Err(RetrievalError::Unavailable("index offline".to_string()))
    }

    async fn available_colors(&self) -> Result<Vec<ColorAvailability>, RetrievalError> {
        Err(RetrievalError::Unavailable("index offline".to_string()))
    }
}

#[tokio::test]
async fn test_scenario_a_asks_for_environment() {
    let engine = offline_engine();
    let reply = engine
        .handle_turn("a", "I want to paint my son's bedroom blue")
        .await
        .unwrap();

    assert_eq!(reply.decision, GateDecision::AskFor(SlotName::Environment));
    assert_eq!(reply.grounded_product_id, None);
    assert_eq!(reply.slots_snapshot.room_type.as_deref(), Some("bedroom"));
    assert_eq!(reply.slots_snapshot.audience_hint.as_deref(), Some("child"));
    assert_eq!(reply.slots_snapshot.color.as_deref(), Some("blue"));
    assert_eq!(reply.slots_snapshot.environment, Environment::Unknown);
    assert_eq!(reply.slots_snapshot.surface, Surface::Unknown);
    assert!(reply.reply.contains("interior or an exterior"));
    assert!(reply.specialists.is_empty());
}

#[tokio::test]
async fn test_scenario_b_grounded_interior_wall_product() {
    let catalog = catalog();
    let engine = DialogueEngine::new(
        AdvisorConfig::default(),
        catalog.clone(),
        Arc::new(InMemorySessionStore::default()),
        None,
    );

    engine
        .handle_turn("b", "I want to paint my son's bedroom blue")
        .await
        .unwrap();
    let second = engine.handle_turn("b", "interior").await.unwrap();
    assert_eq!(second.decision, GateDecision::AskFor(SlotName::Surface));

    let third = engine.handle_turn("b", "wall").await.unwrap();
    assert_eq!(third.decision, GateDecision::Proceed);

    let id = third.grounded_product_id.expect("a product is selected");
    let chosen = product(&catalog, id);
    assert!(chosen.environment.supports(Environment::Interior));
    assert!(chosen.supports_surface(Surface::Wall));
    assert!(chosen.canonical_color().map_or(true, |c| c == "blue"));

    assert_eq!(third.render_mode, RenderMode::Template);
    assert!(third.reply.contains(&chosen.name));
    assert!(GroundingValidator::new()
        .validate(&third.reply, &chosen, &[])
        .is_ok());
    assert!(!third.rationales.is_empty());
    assert!(third.specialists.iter().any(|s| s.applicable));
    assert!(third.reply.contains(" specialists. Why: "));
}

#[tokio::test]
async fn test_scenario_c_correction_keeps_other_slots() {
    let catalog = catalog();
    let engine = DialogueEngine::new(
        AdvisorConfig::default(),
        catalog.clone(),
        Arc::new(InMemorySessionStore::default()),
        None,
    );
    for utterance in ["I want to paint my son's bedroom blue", "interior", "wall"] {
        engine.handle_turn("c", utterance).await.unwrap();
    }

    let reply = engine
        .handle_turn("c", "matte, actually I think green is nicer")
        .await
        .unwrap();

    let slots = &reply.slots_snapshot;
    assert_eq!(slots.color.as_deref(), Some("green"));
    assert_eq!(slots.finish, Some(Finish::Matte));
    assert_eq!(slots.room_type.as_deref(), Some("bedroom"));
    assert_eq!(slots.audience_hint.as_deref(), Some("child"));
    assert_eq!(slots.environment, Environment::Interior);
    assert_eq!(slots.surface, Surface::Wall);

    let chosen = product(&catalog, reply.grounded_product_id.expect("a product"));
    assert!(chosen.canonical_color().map_or(true, |c| c == "green"));
}

#[tokio::test]
async fn test_scenario_d_no_candidates_lists_colors() {
    let engine = DialogueEngine::new(
        AdvisorConfig::default(),
        Arc::new(EmptyRetriever),
        Arc::new(InMemorySessionStore::default()),
        None,
    );

    let reply = engine
        .handle_turn("d", "exterior wall, blue and glossy")
        .await
        .unwrap();

    assert_eq!(reply.decision, GateDecision::Proceed);
    assert_eq!(reply.grounded_product_id, None);
    assert!(reply.rationales.is_empty());
    assert_eq!(
        reply.reply,
        "Sorry, no match found in our catalog for exterior, wall, blue, gloss. \
         Available colors: white (3 options), gray (1 option). \
         Would you like to adjust the color or finish?"
    );
}

#[tokio::test]
async fn test_scenario_d_real_catalog_names_no_products() {
    let catalog = catalog();
    let engine = DialogueEngine::new(
        AdvisorConfig::default(),
        catalog.clone(),
        Arc::new(InMemorySessionStore::default()),
        None,
    );

    let reply = engine.handle_turn("d2", "outdoor tile").await.unwrap();

    assert_eq!(reply.grounded_product_id, None);
    assert!(reply.reply.contains("no match found"));
    assert!(reply.reply.contains("white (4 options)"));
    for product in catalog.products() {
        assert!(!reply.reply.contains(&product.name), "mentions {}", product.name);
    }
}

#[tokio::test]
async fn test_scenario_e_generation_unavailable() {
    let catalog = catalog();
    let llm: Arc<dyn LlmProvider> = Arc::new(StubLlmProvider::unavailable());
    let engine = DialogueEngine::new(
        AdvisorConfig::default(),
        catalog.clone(),
        Arc::new(InMemorySessionStore::default()),
        Some(llm),
    );

    let reply = engine
        .handle_turn("e", "do you have yellow paint for wood, outdoors?")
        .await
        .unwrap();

    assert_eq!(reply.extraction_mode, ExtractionMode::Rules);
    assert_eq!(reply.render_mode, RenderMode::Template);
    assert_eq!(reply.decision, GateDecision::Proceed);

    let chosen = product(&catalog, reply.grounded_product_id.expect("a product"));
    assert!(chosen.environment.supports(Environment::Exterior));
    assert!(chosen.supports_surface(Surface::Wood));
    assert!(chosen.canonical_color().map_or(true, |c| c == "yellow"));
    assert!(reply.reply.starts_with("I recommend"));
}

#[tokio::test]
async fn test_retrieval_failure_degrades_to_no_match() {
    let engine = DialogueEngine::new(
        AdvisorConfig::default(),
        Arc::new(BrokenRetriever),
        Arc::new(InMemorySessionStore::default()),
        None,
    );

    let reply = engine.handle_turn("x", "interior wall").await.unwrap();
    assert_eq!(reply.grounded_product_id, None);
    assert_eq!(
        reply.reply,
        "Sorry, no match found in our catalog for interior, wall. \
         Would you like to adjust the color or finish?"
    );
}

fn seda() -> CandidateProduct {
    CandidateProduct {
        id: 1,
        name: "Suvinil Toque de Seda".to_string(),
        price: 189.9,
        environment: ProductEnvironment::Interior,
        surface_compatibility: vec![Surface::Wall],
        finish: Finish::Satin,
        features: vec!["Washable".to_string(), "Low odor".to_string()],
        color: Some("Azul Sereno".to_string()),
        line: ProductLine::Premium,
        description: None,
    }
}

#[tokio::test]
async fn test_grounded_generated_reply_is_kept() {
    let generated = "Suvinil Toque de Seda is a washable satin paint for interior walls, R$ 189,90.";
    let stub = Arc::new(StubLlmProvider::new([
        r#"{"environment": "interior", "surface": "wall"}"#,
        generated,
    ]));
    let llm: Arc<dyn LlmProvider> = stub.clone();
    let engine = DialogueEngine::new(
        AdvisorConfig::default(),
        Arc::new(InMemoryCatalog::from_products(vec![seda()])),
        Arc::new(InMemorySessionStore::default()),
        Some(llm),
    );

    let reply = engine
        .handle_turn("g", "paint for the walls inside")
        .await
        .unwrap();

    assert_eq!(reply.extraction_mode, ExtractionMode::Llm);
    assert_eq!(reply.render_mode, RenderMode::Generated);
    assert_eq!(reply.reply, generated);

    let prompts = stub.recorded_prompts();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0].1, 0.0);
    assert_eq!(prompts[1].1, 0.7);
}

#[tokio::test]
async fn test_ungrounded_generated_reply_falls_back_to_template() {
    let stub = Arc::new(StubLlmProvider::new([
        r#"{"environment": "interior", "surface": "wall"}"#,
        "Suvinil Toque de Seda is on sale for R$ 99 in green.",
    ]));
    let llm: Arc<dyn LlmProvider> = stub;
    let engine = DialogueEngine::new(
        AdvisorConfig::default(),
        Arc::new(InMemoryCatalog::from_products(vec![seda()])),
        Arc::new(InMemorySessionStore::default()),
        Some(llm),
    );

    let reply = engine
        .handle_turn("g", "paint for the walls inside")
        .await
        .unwrap();

    assert_eq!(reply.render_mode, RenderMode::Template);
    assert!(reply.reply.starts_with("I recommend Suvinil Toque de Seda"));
    assert!(!reply.reply.contains("99 "));
    assert!(GroundingValidator::new()
        .validate(&reply.reply, &seda(), &[])
        .is_ok());
}

/// Retriever that ignores the slots and hands back every row
struct LooseRetriever(Vec<CandidateProduct>);

#[async_trait]
impl CatalogRetriever for LooseRetriever {
    async fn retrieve(
        &self,
        _slots: &SlotSet,
        limit: usize,
    ) -> Result<Vec<CandidateProduct>, RetrievalError> {
        Ok(self.0.iter().take(limit).cloned().collect())
    }

    async fn available_colors(&self) -> Result<Vec<ColorAvailability>, RetrievalError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_loose_retrieval_never_recommends_incompatible_surface() {
    let wood_lacquer = CandidateProduct {
        id: 1,
        name: "Wood Lacquer".to_string(),
        price: 149.9,
        environment: ProductEnvironment::Interior,
        surface_compatibility: vec![Surface::Wood],
        finish: Finish::Matte,
        features: vec!["Washable".to_string()],
        color: Some("Blue".to_string()),
        line: ProductLine::Premium,
        description: None,
    };
    let wall_matte = CandidateProduct {
        id: 2,
        name: "Wall Matte".to_string(),
        price: 99.9,
        environment: ProductEnvironment::Interior,
        surface_compatibility: vec![Surface::Wall],
        finish: Finish::Matte,
        features: vec![],
        color: Some("White".to_string()),
        line: ProductLine::Standard,
        description: None,
    };
    let engine = DialogueEngine::new(
        AdvisorConfig::default(),
        Arc::new(LooseRetriever(vec![wood_lacquer, wall_matte])),
        Arc::new(InMemorySessionStore::default()),
        None,
    );

    let reply = engine
        .handle_turn("l", "interior wall, blue, for the bedroom")
        .await
        .unwrap();

    assert_eq!(reply.decision, GateDecision::Proceed);
    assert_ne!(reply.grounded_product_id, Some(1));
    assert!(!reply.reply.contains("Wood Lacquer"));
    assert!(reply
        .specialists
        .iter()
        .all(|s| s.candidate_count <= 1));
}

#[tokio::test]
async fn test_generated_reply_naming_unknown_product_falls_back() {
    let stub = Arc::new(StubLlmProvider::new([
        r#"{"environment": "interior", "surface": "wall"}"#,
        "Suvinil Toque de Seda is a washable satin paint. If you prefer, \
         Coral Decora Premium is another great pick.",
    ]));
    let llm: Arc<dyn LlmProvider> = stub;
    let engine = DialogueEngine::new(
        AdvisorConfig::default(),
        Arc::new(InMemoryCatalog::from_products(vec![seda()])),
        Arc::new(InMemorySessionStore::default()),
        Some(llm),
    );

    let reply = engine
        .handle_turn("n", "paint for the walls inside")
        .await
        .unwrap();

    assert_eq!(reply.render_mode, RenderMode::Template);
    assert!(reply.reply.starts_with("I recommend Suvinil Toque de Seda"));
    assert!(!reply.reply.contains("Coral"));
}

#[tokio::test]
async fn test_generated_reply_naming_catalog_row_outside_limit_falls_back() {
    let bella = CandidateProduct {
        id: 2,
        name: "Tinta Bella Parede".to_string(),
        ..seda()
    };
    let stub = Arc::new(StubLlmProvider::new([
        r#"{"environment": "interior", "surface": "wall"}"#,
        "Suvinil Toque de Seda is washable, and Tinta Bella Parede is a fine alternative.",
    ]));
    let llm: Arc<dyn LlmProvider> = stub;
    let mut config = AdvisorConfig::default();
    config.retrieval.limit = 1;
    let engine = DialogueEngine::new(
        config,
        Arc::new(InMemoryCatalog::from_products(vec![seda(), bella])),
        Arc::new(InMemorySessionStore::default()),
        Some(llm),
    );

    let reply = engine
        .handle_turn("o", "paint for the walls inside")
        .await
        .unwrap();

    assert_eq!(reply.grounded_product_id, Some(1));
    assert_eq!(reply.render_mode, RenderMode::Template);
    assert!(!reply.reply.contains("Bella"));
}

#[tokio::test]
async fn test_short_follow_up_never_wipes_slots() {
    let engine = offline_engine();
    let first = engine
        .handle_turn("f", "blue paint for the bedroom, interior wall")
        .await
        .unwrap();
    let follow_up = engine.handle_turn("f", "ok, and?").await.unwrap();

    assert!(follow_up.follow_up);
    assert_eq!(follow_up.slots_snapshot, first.slots_snapshot);
}

#[tokio::test]
async fn test_visualization_request_recaps_last_product() {
    let engine = offline_engine();
    let first = engine
        .handle_turn("v", "interior wall in blue for the living room")
        .await
        .unwrap();
    let id = first.grounded_product_id.expect("a product");

    let recap = engine.handle_turn("v", "can I see a picture?").await.unwrap();
    assert_eq!(recap.grounded_product_id, Some(id));
    assert!(recap.reply.starts_with("Image previews are not available here"));
    assert!(recap.specialists.is_empty());
}

#[tokio::test]
async fn test_reset_forgets_everything() {
    let store = Arc::new(InMemorySessionStore::default());
    let engine = DialogueEngine::new(
        AdvisorConfig::default(),
        catalog(),
        store.clone(),
        None,
    );

    engine.handle_turn("r", "interior wall, blue").await.unwrap();
    engine.reset("r").await;
    engine.reset("r").await;
    engine.reset("never-used").await;
    assert_eq!(store.session_count(), 1);

    {
        let session = store.session("r").await;
        let session = session.lock().await;
        assert_eq!(session.turn_count, 0);
        assert_eq!(session.history_len(), 0);
        assert!(session.last_selection.is_none());
    }

    let reply = engine.handle_turn("r", "hi").await.unwrap();
    assert_eq!(reply.decision, GateDecision::AskFor(SlotName::Environment));
    assert_eq!(reply.slots_snapshot, SlotSet::default());
}

#[tokio::test]
async fn test_decisions_are_deterministic() {
    let a = offline_engine();
    let b = offline_engine();
    for utterance in ["bathroom walls, interior", "white please"] {
        let ra = a.handle_turn("s", utterance).await.unwrap();
        let rb = b.handle_turn("s", utterance).await.unwrap();
        assert_eq!(ra.grounded_product_id, rb.grounded_product_id);
        assert_eq!(ra.reply, rb.reply);
        assert_eq!(ra.rationales, rb.rationales);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_turns_serialized_per_session() {
    let store = Arc::new(InMemorySessionStore::default());
    let engine = Arc::new(DialogueEngine::new(
        AdvisorConfig::default(),
        catalog(),
        store.clone(),
        None,
    ));

    let mut handles = Vec::new();
    for i in 0..24 {
        let engine = engine.clone();
        let session_id = format!("session-{}", i % 3);
        handles.push(tokio::spawn(async move {
            engine
                .handle_turn(&session_id, "interior wall, blue")
                .await
                .map(|reply| reply.grounded_product_id)
        }));
    }

    let mut picks = Vec::new();
    for handle in handles {
        picks.push(handle.await.unwrap().unwrap());
    }
    assert!(picks.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(store.session_count(), 3);

    for i in 0..3 {
        let session = store.session(&format!("session-{}", i)).await;
        let session = session.lock().await;
        assert_eq!(session.turn_count, 8);
        // two turns per exchange, bounded by the history capacity
        assert_eq!(session.history_len(), session.capacity().min(16));
    }
}
