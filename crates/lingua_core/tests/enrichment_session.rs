use lingua_core::enrich::parse::parse_enrichment;
use lingua_core::enrich::{ai_enrich, EnrichUnavailable, Enricher, EnrichmentResult, NoopEnricher};
use lingua_core::model::document::{ConceptExtra, RepresentationType};
use lingua_core::service::concept_store::STUB_TAG;
use lingua_core::session::{self, AddTermRequest, SessionContext, DEFAULT_LAYER_ALIAS};
use lingua_core::{ConceptStore, MemoryDocumentRepository, PngRenderer};
use std::cell::Cell;

/// Replies with a fixed model text and counts calls.
struct StubEnricher {
    reply: &'static str,
    calls: Cell<usize>,
}

impl StubEnricher {
    fn new(reply: &'static str) -> Self {
        Self {
            reply,
            calls: Cell::new(0),
        }
    }
}

impl Enricher for StubEnricher {
    fn enrich(&self, _term: &str, _definition: &str) -> Result<EnrichmentResult, EnrichUnavailable> {
        self.calls.set(self.calls.get() + 1);
        Ok(parse_enrichment(self.reply))
    }
}

struct DownEnricher;

impl Enricher for DownEnricher {
    fn enrich(&self, _term: &str, _definition: &str) -> Result<EnrichmentResult, EnrichUnavailable> {
        Err(EnrichUnavailable::Http {
            status: 503,
            body: "overloaded".to_string(),
        })
    }
}

const ENTROPY_REPLY: &str = r#"```json
{
  "representation_type": "state",
  "suggested_layers": ["thermodynamics"],
  "axes": [{"axis": "order", "role": "B", "dual_term": "negentropy"}],
  "tags": ["physics"],
  "links": [{"kind": "antonym", "term": "order"}, {"kind": "related", "term": "heat"}]
}
```"#;

fn empty_store() -> ConceptStore<MemoryDocumentRepository> {
    ConceptStore::open(MemoryDocumentRepository::new()).unwrap()
}

#[test]
fn unparseable_reply_falls_back_to_empty_result() {
    let outcome = ai_enrich(&StubEnricher::new("I cannot help with that."), "x", "");
    assert_eq!(outcome.result, EnrichmentResult::default());
    assert_eq!(outcome.result.representation_type, None);
    assert!(outcome.result.suggested_layers.is_empty());
    assert!(outcome.result.axes.is_empty());
    assert!(outcome.result.tags.is_empty());
    assert!(outcome.result.links.is_empty());
    assert_eq!(outcome.warning, None);
}

#[test]
fn unavailable_collaborator_becomes_warning() {
    let outcome = ai_enrich(&DownEnricher, "x", "");
    assert!(outcome.result.is_empty());
    assert!(outcome.warning.unwrap().contains("503"));

    let outcome = ai_enrich(&NoopEnricher, "x", "");
    assert!(outcome.warning.is_some());
}

#[test]
fn add_term_applies_preview_and_creates_stubs() {
    let mut store = empty_store();
    let order_layer = store.ensure_layer("core", None, None).unwrap();
    store
        .create_concept(&order_layer.id, "Order", "", ConceptExtra::default())
        .unwrap();

    let enricher = StubEnricher::new(ENTROPY_REPLY);
    let mut ctx = SessionContext::new();
    let pending = session::preview_enrichment(&mut ctx, &enricher, "entropy", "disorder");
    assert_eq!(pending.result.suggested_layers, vec!["thermodynamics".to_string()]);

    let outcome = session::add_term(
        &mut ctx,
        &mut store,
        &enricher,
        AddTermRequest {
            term: "Entropy".to_string(),
            definition: "disorder".to_string(),
            use_enrichment: true,
            ..AddTermRequest::default()
        },
    )
    .unwrap();

    assert_eq!(enricher.calls.get(), 1, "preview should be reused");
    assert_eq!(outcome.warning, None);
    let concept = outcome.concept;
    assert_eq!(concept.id, "2.1");
    assert_eq!(concept.representation_type, Some(RepresentationType::State));
    assert_eq!(concept.tags, vec!["physics".to_string()]);
    assert_eq!(concept.axes.len(), 1);
    assert_eq!(concept.refs, vec!["1.1".to_string(), "2.2".to_string()]);

    let (layer, stub) = store.find_concept("2.2").unwrap();
    assert_eq!(layer.alias, "thermodynamics");
    assert_eq!(stub.term, "heat");
    assert_eq!(stub.tags, vec![STUB_TAG.to_string()]);

    assert_eq!(ctx.selected_id.as_deref(), Some("2.1"));
    assert!(ctx.pending_enrichment.is_none());
}

#[test]
fn add_term_without_enrichment_uses_default_layer_and_overrides() {
    let mut store = empty_store();
    let enricher = StubEnricher::new(ENTROPY_REPLY);
    let mut ctx = SessionContext::new();

    let outcome = session::add_term(
        &mut ctx,
        &mut store,
        &enricher,
        AddTermRequest {
            layer_alias: Some("  ".to_string()),
            term: "walk".to_string(),
            representation_type: Some(RepresentationType::Action),
            tags: vec!["motion".to_string()],
            ..AddTermRequest::default()
        },
    )
    .unwrap();

    assert_eq!(enricher.calls.get(), 0);
    let (layer, concept) = store.find_concept(&outcome.concept.id).unwrap();
    assert_eq!(layer.alias, DEFAULT_LAYER_ALIAS);
    assert_eq!(concept.representation_type, Some(RepresentationType::Action));
    assert_eq!(concept.tags, vec!["motion".to_string()]);
    assert!(concept.refs.is_empty());
}

#[test]
fn add_term_survives_unavailable_enrichment() {
    let mut store = empty_store();
    let mut ctx = SessionContext::new();

    let outcome = session::add_term(
        &mut ctx,
        &mut store,
        &DownEnricher,
        AddTermRequest {
            layer_alias: Some("core".to_string()),
            term: "calm".to_string(),
            use_enrichment: true,
            ..AddTermRequest::default()
        },
    )
    .unwrap();

    assert!(outcome.warning.is_some());
    assert!(store.contains_concept(&outcome.concept.id));
}

#[test]
fn sidebar_defaults_and_repairs_selection() {
    let mut store = empty_store();
    let mut ctx = SessionContext::new();
    assert!(session::sidebar(&mut ctx, &store, None).is_empty());
    assert_eq!(ctx.selected_id, None);

    let layer = store.ensure_layer("core", None, None).unwrap();
    for term in ["a", "b"] {
        store
            .create_concept(&layer.id, term, "", ConceptExtra::default())
            .unwrap();
    }

    session::sidebar(&mut ctx, &store, None);
    assert_eq!(ctx.selected_id.as_deref(), Some("1.1"));

    assert!(!session::select(&mut ctx, &store, "9.9"));
    assert!(session::select(&mut ctx, &store, "1.2"));

    store.delete_concept("1.2").unwrap();
    session::sidebar(&mut ctx, &store, None);
    assert_eq!(ctx.selected_id.as_deref(), Some("1.1"));
}

#[test]
fn two_step_delete_confirm_and_cancel() {
    let mut store = empty_store();
    let layer = store.ensure_layer("core", None, None).unwrap();
    for term in ["a", "b"] {
        store
            .create_concept(&layer.id, term, "", ConceptExtra::default())
            .unwrap();
    }
    store.link_symmetric("1.1", "1.2").unwrap();
    let mut ctx = SessionContext::new();
    session::select(&mut ctx, &store, "1.2");

    assert!(!session::request_delete(&mut ctx, &store, "9.9"));
    assert!(session::request_delete(&mut ctx, &store, "1.2"));
    assert!(session::cancel_delete(&mut ctx));
    assert!(store.contains_concept("1.2"));
    assert!(!session::confirm_delete(&mut ctx, &mut store).unwrap());

    session::request_delete(&mut ctx, &store, "1.2");
    assert!(session::confirm_delete(&mut ctx, &mut store).unwrap());
    assert!(!store.contains_concept("1.2"));
    assert_eq!(ctx.selected_id, None);
    assert_eq!(ctx.pending_delete_id, None);
    assert!(store.find_concept("1.1").unwrap().1.refs.is_empty());
}

#[test]
fn delete_layer_clears_selection_inside_it() {
    let mut store = empty_store();
    let first = store.ensure_layer("core", None, None).unwrap();
    let second = store.ensure_layer("extra", None, None).unwrap();
    store
        .create_concept(&first.id, "keep", "", ConceptExtra::default())
        .unwrap();
    let gone = store
        .create_concept(&second.id, "gone", "", ConceptExtra::default())
        .unwrap();

    let mut ctx = SessionContext::new();
    session::select(&mut ctx, &store, &gone.id);
    session::request_delete(&mut ctx, &store, &gone.id);

    assert!(session::delete_layer(&mut ctx, &mut store, &second.id).unwrap());
    assert_eq!(ctx.selected_id, None);
    assert_eq!(ctx.pending_delete_id, None);
}

#[test]
fn link_and_render_follow_selection() {
    let mut store = empty_store();
    let layer = store.ensure_layer("core", None, None).unwrap();
    for term in ["a", "b"] {
        store
            .create_concept(&layer.id, term, "", ConceptExtra::default())
            .unwrap();
    }
    let renderer = PngRenderer::default();
    let mut ctx = SessionContext::new();

    assert!(!session::link_selected(&ctx, &mut store, "1.2").unwrap());
    assert!(session::render_selected(&ctx, &store, &renderer)
        .unwrap()
        .is_none());

    session::select(&mut ctx, &store, "1.1");
    assert!(session::link_selected(&ctx, &mut store, "1.2").unwrap());
    let image = session::render_selected(&ctx, &store, &renderer)
        .unwrap()
        .unwrap();
    assert_eq!(&image.bytes[1..4], b"PNG");
}
