//! Optional term enrichment by a hosted text-generation model.
//!
//! # Responsibility
//! - Define the `Enricher` capability and its result shape.
//! - Recover from every collaborator failure locally.
//!
//! # Invariants
//! - A malformed model reply is "no enrichment", never an error.
//! - An unreachable or unconfigured collaborator surfaces as a warning; manual
//!   term entry never depends on it.

pub mod credentials;
pub mod http;
pub mod parse;
pub mod prompt;

use crate::model::document::{Axis, RepresentationType};
use log::{info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Link suggested by the model, addressed by term rather than id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestedLink {
    /// Free-text relation kind, e.g. `antonym` or `part_of`.
    pub kind: String,
    pub term: String,
}

/// Structured suggestion for a new term. Every field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentResult {
    pub representation_type: Option<RepresentationType>,
    pub suggested_layers: Vec<String>,
    pub axes: Vec<Axis>,
    pub tags: Vec<String>,
    pub links: Vec<SuggestedLink>,
}

impl EnrichmentResult {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Collaborator could not be consulted.
#[derive(Debug)]
pub enum EnrichUnavailable {
    /// Enrichment is switched off for this session.
    Disabled,
    /// No API credential in the environment or the secrets file.
    MissingCredential,
    /// Request could not be sent or timed out.
    Transport(String),
    /// Collaborator answered with a non-success status.
    Http { status: u16, body: String },
    /// Collaborator answered 2xx but without a usable envelope.
    BadEnvelope(String),
}

impl Display for EnrichUnavailable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "enrichment is disabled"),
            Self::MissingCredential => write!(
                f,
                "no API key configured (set {} or add it to the secrets file)",
                credentials::API_KEY_NAME
            ),
            Self::Transport(message) => write!(f, "enrichment request failed: {message}"),
            Self::Http { status, body } => {
                write!(f, "enrichment service returned HTTP {status}: {body}")
            }
            Self::BadEnvelope(message) => {
                write!(f, "enrichment service returned an unexpected payload: {message}")
            }
        }
    }
}

impl Error for EnrichUnavailable {}

/// Enrichment capability; swap for a stub in tests.
pub trait Enricher {
    /// Asks the collaborator about one term.
    ///
    /// Returns `Ok(EnrichmentResult::default())` when the reply is not usable
    /// JSON, and `Err` only when the collaborator could not be consulted.
    fn enrich(&self, term: &str, definition: &str) -> Result<EnrichmentResult, EnrichUnavailable>;
}

/// Enricher that is never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnricher;

impl Enricher for NoopEnricher {
    fn enrich(&self, _term: &str, _definition: &str) -> Result<EnrichmentResult, EnrichUnavailable> {
        Err(EnrichUnavailable::Disabled)
    }
}

/// Outcome of a best-effort enrichment call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichOutcome {
    pub result: EnrichmentResult,
    /// Non-blocking message for the user when the collaborator was unavailable.
    pub warning: Option<String>,
}

/// Runs `enricher`, folding unavailability into an empty result plus warning.
pub fn ai_enrich(enricher: &dyn Enricher, term: &str, definition: &str) -> EnrichOutcome {
    match enricher.enrich(term, definition) {
        Ok(result) => {
            info!(
                "event=enrich module=enrich status=ok empty={} layers={} links={}",
                result.is_empty(),
                result.suggested_layers.len(),
                result.links.len()
            );
            EnrichOutcome {
                result,
                warning: None,
            }
        }
        Err(err) => {
            warn!("event=enrich module=enrich status=skip reason={}", err);
            EnrichOutcome {
                result: EnrichmentResult::default(),
                warning: Some(err.to_string()),
            }
        }
    }
}
