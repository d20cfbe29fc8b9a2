//! Concept store use-case service.
//!
//! # Responsibility
//! - Hold the loaded document and route every mutation through one commit
//!   path that persists the whole document.
//! - Offer the sidebar listing and term search.
//!
//! # Invariants
//! - Mutations run on a draft; the draft replaces the live document only
//!   after `save` succeeds, so a failed save leaves memory and disk in
//!   agreement.
//! - A mutation that changes nothing (unknown id, repeated link) does not
//!   touch storage.
//! - Unknown ids in delete/link are silent no-ops.

use crate::graph::neighborhood::{neighborhood, NeighborhoodGraph};
use crate::model::document::{Concept, ConceptExtra, ConceptId, Document, Layer, LayerId};
use crate::repo::document_repo::{DocumentRepository, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Tag placed on auto-created placeholder concepts.
pub const STUB_TAG: &str = "stub";

pub type StoreResult<T> = Result<T, StoreError>;

/// Error for store use-cases.
#[derive(Debug)]
pub enum StoreError {
    /// Persistence failure; the operation did not complete.
    Repo(RepoError),
    /// Explicit create into a layer that does not exist.
    LayerNotFound(LayerId),
    /// Input rejected before touching the document.
    InvalidInput(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::LayerNotFound(id) => write!(f, "layer not found: {id}"),
            Self::InvalidInput(details) => write!(f, "invalid input: {details}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Sidebar row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptSummary {
    pub id: ConceptId,
    pub term: String,
}

/// Input for creating a concept in a layer addressed by alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewConcept {
    pub layer_alias: String,
    /// Used only when the layer has to be created.
    pub layer_level: Option<u32>,
    pub term: String,
    pub definition: String,
    pub extra: ConceptExtra,
    /// Terms to link; unknown terms become stub concepts in the same layer.
    pub link_terms: Vec<String>,
}

/// Concept store over a document repository.
pub struct ConceptStore<R: DocumentRepository> {
    repo: R,
    doc: Document,
}

impl<R: DocumentRepository> ConceptStore<R> {
    /// Loads the document through `repo`.
    pub fn open(repo: R) -> StoreResult<Self> {
        let doc = repo.load()?;
        Ok(Self { repo, doc })
    }

    /// Current in-memory document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn find_concept(&self, id: &str) -> Option<(&Layer, &Concept)> {
        self.doc.find_concept(id)
    }

    pub fn contains_concept(&self, id: &str) -> bool {
        self.doc.find_concept(id).is_some()
    }

    /// Lists `(id, term)` in document order, optionally filtered by a
    /// case-insensitive substring of the term.
    pub fn list_concepts(&self, search: Option<&str>) -> Vec<ConceptSummary> {
        let needle = search
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty());
        self.doc
            .concepts()
            .filter(|concept| {
                needle
                    .as_deref()
                    .map_or(true, |needle| concept.term.to_lowercase().contains(needle))
            })
            .map(|concept| ConceptSummary {
                id: concept.id.clone(),
                term: concept.term.clone(),
            })
            .collect()
    }

    /// Returns the layer matching `alias`, creating and persisting it when
    /// absent.
    pub fn ensure_layer(
        &mut self,
        alias: &str,
        level: Option<u32>,
        description: Option<&str>,
    ) -> StoreResult<Layer> {
        if alias.trim().is_empty() {
            return Err(StoreError::InvalidInput("layer alias is empty"));
        }
        let layer = self.commit("ensure_layer", |doc| {
            doc.ensure_layer(alias, level, description).clone()
        })?;
        info!(
            "event=ensure_layer module=store status=ok layer_id={} level={}",
            layer.id, layer.level
        );
        Ok(layer)
    }

    /// Appends a concept to an existing layer and persists.
    pub fn create_concept(
        &mut self,
        layer_id: &str,
        term: &str,
        definition: &str,
        extra: ConceptExtra,
    ) -> StoreResult<Concept> {
        if term.trim().is_empty() {
            return Err(StoreError::InvalidInput("term is empty"));
        }
        if self.doc.layer(layer_id).is_none() {
            return Err(StoreError::LayerNotFound(layer_id.to_string()));
        }

        let concept = self.commit("create_concept", |doc| {
            doc.layer_mut(layer_id)
                .map(|layer| layer.create_concept(term.trim(), definition, extra).clone())
        })?;
        let concept = concept.ok_or_else(|| StoreError::LayerNotFound(layer_id.to_string()))?;
        info!(
            "event=create_concept module=store status=ok concept_id={}",
            concept.id
        );
        Ok(concept)
    }

    /// Ensures the layer, creates the concept, then links every requested
    /// term, creating stubs for unknown ones. Persists once.
    pub fn add_concept(&mut self, request: NewConcept) -> StoreResult<Concept> {
        if request.term.trim().is_empty() {
            return Err(StoreError::InvalidInput("term is empty"));
        }
        if request.layer_alias.trim().is_empty() {
            return Err(StoreError::InvalidInput("layer alias is empty"));
        }

        let NewConcept {
            layer_alias,
            layer_level,
            term,
            definition,
            extra,
            link_terms,
        } = request;

        let (concept, stubs) = self.commit("add_concept", |doc| {
            let layer = doc.ensure_layer(&layer_alias, layer_level, None);
            let layer_id = layer.id.clone();
            let concept_id = layer.create_concept(term.trim(), definition, extra).id.clone();

            let mut stubs = 0usize;
            for link_term in link_terms.iter().map(|value| value.trim()) {
                if link_term.is_empty() {
                    continue;
                }
                let target_id = match doc.find_concept_by_term(link_term) {
                    Some(existing) => Some(existing.id.clone()),
                    None => {
                        stubs += 1;
                        create_stub(doc, &layer_id, link_term)
                    }
                };
                if let Some(target_id) = target_id {
                    doc.link_symmetric(&concept_id, &target_id);
                }
            }

            let concept = doc
                .find_concept(&concept_id)
                .map(|(_, concept)| concept.clone());
            (concept, stubs)
        })?;

        let concept = concept.ok_or(StoreError::InvalidInput("created concept vanished"))?;
        info!(
            "event=add_concept module=store status=ok concept_id={} links={} stubs={}",
            concept.id,
            concept.refs.len(),
            stubs
        );
        Ok(concept)
    }

    /// Deletes a concept and scrubs its id from all refs.
    ///
    /// Returns `false` when the id is unknown.
    pub fn delete_concept(&mut self, id: &str) -> StoreResult<bool> {
        let removed = self.commit("delete_concept", |doc| doc.delete_concept(id))?;
        log_outcome("delete_concept", id, removed);
        Ok(removed)
    }

    /// Deletes a layer with all its concepts and scrubs refs into it.
    ///
    /// Returns `false` when the id is unknown.
    pub fn delete_layer(&mut self, id: &str) -> StoreResult<bool> {
        let removed = self.commit("delete_layer", |doc| doc.delete_layer(id))?;
        log_outcome("delete_layer", id, removed);
        Ok(removed)
    }

    /// Links two concepts in both directions.
    ///
    /// Returns `false` when nothing changed.
    pub fn link_symmetric(&mut self, a: &str, b: &str) -> StoreResult<bool> {
        let linked = self.commit("link_symmetric", |doc| doc.link_symmetric(a, b))?;
        info!(
            "event=link_symmetric module=store status={} a={} b={}",
            if linked { "ok" } else { "skip" },
            a,
            b
        );
        Ok(linked)
    }

    /// One-hop neighborhood of `focal_id` in the current document.
    pub fn neighborhood(&self, focal_id: &str) -> NeighborhoodGraph {
        neighborhood(&self.doc, focal_id)
    }

    fn commit<T>(
        &mut self,
        op: &'static str,
        mutate: impl FnOnce(&mut Document) -> T,
    ) -> StoreResult<T> {
        let mut draft = self.doc.clone();
        let output = mutate(&mut draft);
        if draft == self.doc {
            return Ok(output);
        }

        if let Err(err) = self.repo.save(&draft) {
            warn!(
                "event=commit module=store status=error op={} error_code=save_failed",
                op
            );
            return Err(err.into());
        }
        self.doc = draft;
        Ok(output)
    }
}

fn create_stub(doc: &mut Document, layer_id: &str, term: &str) -> Option<ConceptId> {
    let extra = ConceptExtra {
        tags: vec![STUB_TAG.to_string()],
        ..ConceptExtra::default()
    };
    doc.layer_mut(layer_id)
        .map(|layer| layer.create_concept(term, "", extra).id.clone())
}

fn log_outcome(op: &str, id: &str, applied: bool) {
    if applied {
        info!("event={op} module=store status=ok id={id}");
    } else {
        info!("event={op} module=store status=skip reason=not_found id={id}");
    }
}
