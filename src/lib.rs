//! A project-namespaced code retrieval engine: an incremental ingestion
//! pipeline over a vector database, plus a hybrid context-pack retrieval
//! builder on top of it.
//!
//! [`engine::Engine`] is the composition root and the crate's main entry
//! point; everything else is reachable through it or usable directly for
//! finer-grained control (e.g. running [`indexer::Indexer`] against a
//! custom [`domain::ports::VectorStoreProvider`]).

/// Anchor text builder (C7).
pub mod anchor;
/// Stable `{project}_{suffix}` collection-naming helpers.
pub mod collection;
/// Layered configuration loading.
pub mod config;
/// Context Pack Builder (C10): hybrid retrieval, rerank, compression.
pub mod context_pack;
/// Data model, error type, and port traits.
pub mod domain;
/// Composition root wiring every component together.
pub mod engine;
/// Quality Gates (C13): typecheck, test, blast_radius.
pub mod gates;
/// Dependency graph store (C6).
pub mod graph_store;
/// Indexer (C8): walk -> hash diff -> parse -> anchor+embed -> upsert.
pub mod indexer;
/// Tracing initialization.
pub mod logging;
/// Memory Service & Governance (C11, C12).
pub mod memory;
/// Source-file parsing and chunk/edge extraction (C3, C4).
pub mod parsing;
/// Concrete provider implementations of the domain ports.
pub mod providers;
/// Zero-Downtime Reindexer (C9).
pub mod reindex;
/// Symbol index (C5).
pub mod symbols;

pub use domain::error::{Error, Result};
pub use engine::Engine;
