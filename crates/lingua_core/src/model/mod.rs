//! Glossary document model.
//!
//! # Responsibility
//! - Define the persisted `Document -> Layer -> Concept` shape.
//! - Own the in-memory mutators that keep `refs` symmetric and free of
//!   dangling ids.
//!
//! # Invariants
//! - A concept belongs to exactly one layer for its lifetime.
//! - `refs` never contains the owning concept's own id.
//! - Every mutator that removes concepts also strips their ids from all
//!   remaining `refs`.

pub mod document;
