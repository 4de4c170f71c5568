//! Collection naming: every physical collection this engine owns is
//! `{project}_{suffix}`, per the external interface contract.

use crate::domain::types::ChunkKind;

/// Suffix for a project's symbol-index collection.
pub const SYMBOLS_SUFFIX: &str = "symbols";
/// Suffix for a project's dependency-graph collection.
pub const GRAPH_SUFFIX: &str = "graph";
/// Suffix for a project's durable memory collection.
pub const MEMORY_SUFFIX: &str = "memory";
/// Suffix for a project's quarantined memory collection.
pub const MEMORY_PENDING_SUFFIX: &str = "memory_pending";

/// Typed chunk-kind suffixes, each backed by its own collection.
pub const TYPED_CHUNK_SUFFIXES: &[&str] = &["code", "docs", "config", "contracts"];

/// Build `{project}_{suffix}`.
pub fn named(project: &str, suffix: &str) -> String {
    format!("{project}_{suffix}")
}

/// The typed collection a chunk kind routes to; `None` for
/// [`ChunkKind::Unknown`], which is never written to a typed collection.
pub fn typed_collection(project: &str, kind: ChunkKind) -> Option<String> {
    if kind == ChunkKind::Unknown {
        return None;
    }
    Some(named(project, kind.collection_suffix()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_chunk_kind_has_no_typed_collection() {
        assert_eq!(typed_collection("demo", ChunkKind::Unknown), None);
    }

    #[test]
    fn typed_collection_follows_project_suffix_shape() {
        assert_eq!(typed_collection("demo", ChunkKind::Code), Some("demo_code".to_string()));
    }
}
