//! Memory Service & Governance (components C11, C12).
//!
//! Memories live in a project's `{project}_memory` (durable) and
//! `{project}_memory_pending` (quarantine) collections, routed through
//! [`crate::domain::ports::VectorStoreProvider`] like every other piece of
//! durable engine state. Durable and quarantine are two separate
//! collections so quarantine contents are never accidentally recalled by
//! `recall_durable`.

/// `promote`/`reject` governance over quarantined memories.
pub mod governance;
/// `ingest`/`recall_durable`/`recall_quarantine`.
pub mod service;

pub use governance::{GateOutcome, GateRunner, MemoryGovernance, PromoteOptions};
pub use service::{IngestRequest, MemoryService, MemoryStore};
