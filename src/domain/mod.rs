//! Domain layer: data model, error type, and the port traits that every
//! other layer of the crate is written against.
//!
//! Nothing in this module talks to a network, a filesystem, or a
//! subprocess. Concrete implementations of the ports live under
//! `providers`; orchestration that calls through the ports lives under
//! the top-level pipeline modules (`indexer`, `reindex`, `context_pack`,
//! `memory`, `gates`).

/// Crate-wide error type and [`Result`](error::Result) alias.
pub mod error;
/// Port traits: boundaries the domain depends on but does not implement.
pub mod ports;
/// Core record types shared across the crate.
pub mod types;

pub use error::{Error, Result};
