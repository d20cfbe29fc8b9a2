//! Document persistence.
//!
//! # Responsibility
//! - Define the whole-document load/save contract.
//! - Keep file-system details out of the store and session layers.
//!
//! # Invariants
//! - The document is the sole unit of persistence; there are no partial
//!   writes.

pub mod document_repo;
