//! Handlers invoked by the UI shell, one per user intent.

use crate::enrich::{ai_enrich, Enricher, EnrichmentResult};
use crate::graph::render::{GraphRenderer, RenderedImage};
use crate::model::document::{Concept, ConceptExtra, RepresentationType};
use crate::repo::document_repo::DocumentRepository;
use crate::service::concept_store::{
    ConceptStore, ConceptSummary, NewConcept, StoreError, StoreResult,
};
use crate::session::{PendingEnrichment, SessionContext, SessionResult};
use log::{debug, info};

/// Layer used when neither the user nor the enrichment names one.
pub const DEFAULT_LAYER_ALIAS: &str = "general";

/// Form submission for a new term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddTermRequest {
    /// Blank means "first suggested layer, else the default layer".
    pub layer_alias: Option<String>,
    pub term: String,
    pub definition: String,
    /// Overrides the suggested representation type.
    pub representation_type: Option<RepresentationType>,
    /// Overrides the suggested tags when non-empty.
    pub tags: Vec<String>,
    pub use_enrichment: bool,
}

/// Result of `add_term`.
#[derive(Debug, Clone, PartialEq)]
pub struct AddTermOutcome {
    pub concept: Concept,
    /// Set when enrichment was requested but unavailable.
    pub warning: Option<String>,
}

/// Lists concepts for the sidebar and repairs the selection.
///
/// A selection pointing at a vanished concept is cleared; an empty selection
/// falls to the first listed concept.
pub fn sidebar<R: DocumentRepository>(
    ctx: &mut SessionContext,
    store: &ConceptStore<R>,
    search: Option<&str>,
) -> Vec<ConceptSummary> {
    if let Some(selected) = ctx.selected_id.as_deref() {
        if !store.contains_concept(selected) {
            debug!("event=sidebar module=session status=ok repaired=stale_selection");
            ctx.selected_id = None;
        }
    }
    if let Some(pending) = ctx.pending_delete_id.as_deref() {
        if !store.contains_concept(pending) {
            ctx.pending_delete_id = None;
        }
    }

    let rows = store.list_concepts(search);
    if ctx.selected_id.is_none() {
        ctx.selected_id = rows.first().map(|row| row.id.clone());
    }
    rows
}

/// Selects `id`; unknown ids are ignored.
pub fn select<R: DocumentRepository>(
    ctx: &mut SessionContext,
    store: &ConceptStore<R>,
    id: &str,
) -> bool {
    if !store.contains_concept(id) {
        debug!("event=select module=session status=skip reason=not_found id={id}");
        return false;
    }
    if ctx.pending_delete_id.as_deref().is_some_and(|pending| pending != id) {
        ctx.pending_delete_id = None;
    }
    ctx.selected_id = Some(id.to_string());
    true
}

/// First step of deletion: remembers `id` until confirmed or cancelled.
pub fn request_delete<R: DocumentRepository>(
    ctx: &mut SessionContext,
    store: &ConceptStore<R>,
    id: &str,
) -> bool {
    if !store.contains_concept(id) {
        return false;
    }
    ctx.pending_delete_id = Some(id.to_string());
    true
}

/// Executes the pending delete.
///
/// Returns `false` when nothing was pending or the concept is already gone.
/// A failed save keeps the request pending.
pub fn confirm_delete<R: DocumentRepository>(
    ctx: &mut SessionContext,
    store: &mut ConceptStore<R>,
) -> StoreResult<bool> {
    let Some(id) = ctx.pending_delete_id.clone() else {
        return Ok(false);
    };
    let removed = store.delete_concept(&id)?;
    ctx.pending_delete_id = None;
    if ctx.selected_id.as_deref() == Some(id.as_str()) {
        ctx.selected_id = None;
    }
    info!("event=confirm_delete module=session status=ok removed={removed}");
    Ok(removed)
}

/// Drops the pending delete, returning whether one existed.
pub fn cancel_delete(ctx: &mut SessionContext) -> bool {
    ctx.pending_delete_id.take().is_some()
}

/// Asks the collaborator about a term and keeps the suggestion for `add_term`.
pub fn preview_enrichment<'a>(
    ctx: &'a mut SessionContext,
    enricher: &dyn Enricher,
    term: &str,
    definition: &str,
) -> &'a PendingEnrichment {
    let outcome = ai_enrich(enricher, term, definition);
    ctx.pending_enrichment.insert(PendingEnrichment {
        term: term.trim().to_string(),
        definition: definition.to_string(),
        result: outcome.result,
        warning: outcome.warning,
    })
}

/// Creates a term, applying enrichment and resolving suggested links.
///
/// With `use_enrichment`, a pending preview for the same term is reused;
/// otherwise the collaborator is asked now. Unknown link targets become
/// stub concepts in the new concept's layer. The new concept is selected.
pub fn add_term<R: DocumentRepository>(
    ctx: &mut SessionContext,
    store: &mut ConceptStore<R>,
    enricher: &dyn Enricher,
    request: AddTermRequest,
) -> StoreResult<AddTermOutcome> {
    if request.term.trim().is_empty() {
        return Err(StoreError::InvalidInput("term is empty"));
    }

    let (enrichment, warning) = if request.use_enrichment {
        match ctx.pending_enrichment.take() {
            Some(pending) if pending.matches(&request.term) => (pending.result, pending.warning),
            _ => {
                let outcome = ai_enrich(enricher, &request.term, &request.definition);
                (outcome.result, outcome.warning)
            }
        }
    } else {
        (EnrichmentResult::default(), None)
    };

    let layer_alias = request
        .layer_alias
        .as_deref()
        .map(str::trim)
        .filter(|alias| !alias.is_empty())
        .or_else(|| {
            enrichment
                .suggested_layers
                .iter()
                .map(|alias| alias.trim())
                .find(|alias| !alias.is_empty())
        })
        .unwrap_or(DEFAULT_LAYER_ALIAS)
        .to_string();

    let tags = if request.tags.is_empty() {
        enrichment.tags
    } else {
        request.tags
    };
    let link_terms = enrichment
        .links
        .into_iter()
        .map(|link| link.term)
        .filter(|term| term.trim().to_lowercase() != request.term.trim().to_lowercase())
        .collect();

    let concept = store.add_concept(NewConcept {
        layer_alias,
        layer_level: None,
        term: request.term,
        definition: request.definition,
        extra: ConceptExtra {
            representation_type: request
                .representation_type
                .or(enrichment.representation_type),
            axes: enrichment.axes,
            tags,
            refs: Vec::new(),
        },
        link_terms,
    })?;

    ctx.selected_id = Some(concept.id.clone());
    ctx.pending_delete_id = None;
    ctx.pending_enrichment = None;
    info!(
        "event=add_term module=session status=ok concept_id={} enriched={} warned={}",
        concept.id,
        request.use_enrichment,
        warning.is_some()
    );
    Ok(AddTermOutcome { concept, warning })
}

/// Links the selected concept with `other_id`.
///
/// Returns `false` with no selection, an unknown id, or an existing link.
pub fn link_selected<R: DocumentRepository>(
    ctx: &SessionContext,
    store: &mut ConceptStore<R>,
    other_id: &str,
) -> StoreResult<bool> {
    match ctx.selected_id.as_deref() {
        Some(selected) => store.link_symmetric(selected, other_id),
        None => Ok(false),
    }
}

/// Deletes a layer and forgets any selection or pending delete inside it.
pub fn delete_layer<R: DocumentRepository>(
    ctx: &mut SessionContext,
    store: &mut ConceptStore<R>,
    layer_id: &str,
) -> StoreResult<bool> {
    let removed = store.delete_layer(layer_id)?;
    if removed {
        if ctx
            .selected_id
            .as_deref()
            .is_some_and(|id| !store.contains_concept(id))
        {
            ctx.selected_id = None;
        }
        if ctx
            .pending_delete_id
            .as_deref()
            .is_some_and(|id| !store.contains_concept(id))
        {
            ctx.pending_delete_id = None;
        }
    }
    Ok(removed)
}

/// Renders the neighborhood of the selected concept.
///
/// Returns `None` when nothing resolvable is selected.
pub fn render_selected<R: DocumentRepository>(
    ctx: &SessionContext,
    store: &ConceptStore<R>,
    renderer: &dyn GraphRenderer,
) -> SessionResult<Option<RenderedImage>> {
    let Some(selected) = ctx.selected_id.as_deref() else {
        return Ok(None);
    };
    let graph = store.neighborhood(selected);
    if graph.is_empty() {
        return Ok(None);
    }
    let image = renderer.render(&graph)?;
    info!(
        "event=render module=session status=ok nodes={} edges={} bytes={}",
        graph.nodes.len(),
        graph.edges.len(),
        image.bytes.len()
    );
    Ok(Some(image))
}
