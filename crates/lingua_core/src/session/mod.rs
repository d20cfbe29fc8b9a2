//! Interaction state threaded through UI handlers.
//!
//! # Responsibility
//! - Hold the per-session selection, pending delete, and pending enrichment.
//! - Translate user intents into `ConceptStore` calls.
//!
//! # Invariants
//! - The context is passed explicitly to every handler; there is no global
//!   interaction state.
//! - `selected_id` and `pending_delete_id` never outlive the concept they name
//!   once a handler has observed its removal.
//! - Collaborator unavailability becomes a warning on the outcome, never an
//!   error.

pub mod handlers;

use crate::enrich::EnrichmentResult;
use crate::graph::render::RenderError;
use crate::model::document::ConceptId;
use crate::service::concept_store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use handlers::{
    add_term, cancel_delete, confirm_delete, delete_layer, link_selected, preview_enrichment,
    render_selected, request_delete, select, sidebar, AddTermOutcome, AddTermRequest,
    DEFAULT_LAYER_ALIAS,
};

/// Enrichment previewed for a term that has not been saved yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingEnrichment {
    pub term: String,
    pub definition: String,
    pub result: EnrichmentResult,
    pub warning: Option<String>,
}

impl PendingEnrichment {
    /// Whether this preview was made for `term` (case-insensitive).
    pub fn matches(&self, term: &str) -> bool {
        self.term.trim().to_lowercase() == term.trim().to_lowercase()
    }
}

/// Session-scoped interaction state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub selected_id: Option<ConceptId>,
    pub pending_delete_id: Option<ConceptId>,
    pub pending_enrichment: Option<PendingEnrichment>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Handler failure.
#[derive(Debug)]
pub enum SessionError {
    Store(StoreError),
    Render(RenderError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Render(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Render(err) => Some(err),
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<RenderError> for SessionError {
    fn from(value: RenderError) -> Self {
        Self::Render(value)
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
