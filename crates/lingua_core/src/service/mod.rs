//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate document mutations and persistence into use-case APIs.
//! - Keep the session and shell layers decoupled from storage details.

pub mod concept_store;
