//! Core domain logic for Lingua Layers.
//! This crate is the single source of truth for glossary invariants.

pub mod config;
pub mod enrich;
pub mod graph;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;

pub use config::{AppConfig, ConfigError, EnrichConfig, RenderConfig};
pub use enrich::{ai_enrich, EnrichOutcome, EnrichUnavailable, Enricher, EnrichmentResult};
pub use graph::neighborhood::{neighborhood, NeighborhoodGraph};
pub use graph::render::{GraphRenderer, PngRenderer, RenderError, RenderedImage, SvgRenderer};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::document::{Concept, ConceptExtra, ConceptId, Document, Layer, LayerId};
pub use repo::document_repo::{
    DocumentRepository, JsonDocumentRepository, MemoryDocumentRepository, RepoError, RepoResult,
};
pub use service::concept_store::{ConceptStore, StoreError, StoreResult};
pub use session::{SessionContext, SessionError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
