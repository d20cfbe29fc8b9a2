//! Neighborhood view and its default rendering collaborator.
//!
//! # Responsibility
//! - Extract the one-hop subgraph around a focal concept.
//! - Lay it out deterministically and turn it into a static image.
//!
//! # Invariants
//! - Extraction never fails; unknown focal ids give an empty graph.
//! - For a fixed node/edge set and config, layout output is identical
//!   across calls.

pub mod layout;
pub mod neighborhood;
pub mod render;
