//! Step 1 — facet decomposition: deterministic, query-text-driven.

use crate::domain::types::ChunkKind;
use regex::Regex;
use std::sync::LazyLock;

static DOCS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)doc|readme|guide|how to|tutorial|explain").unwrap());
static CONFIG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)config|env|setting|yaml|json|deploy|docker").unwrap());
static CONTRACTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)api|schema|proto|graphql|openapi|swagger|endpoint|contract").unwrap());

/// One retrieval facet: a chunk kind, its typed collection suffix, and how
/// many chunks it contributes before fusion/rerank trims the pack down.
#[derive(Debug, Clone, Copy)]
pub struct FacetSpec {
    /// Facet name, also used as the collection-kind tag on retrieved chunks.
    pub name: &'static str,
    /// Chunk kind backing this facet's typed collection.
    pub chunk_kind: ChunkKind,
    /// Chunks requested for this facet before fusion/rerank/compression.
    pub limit: usize,
}

const CODE: FacetSpec = FacetSpec { name: "code", chunk_kind: ChunkKind::Code, limit: 8 };
const DOCS: FacetSpec = FacetSpec { name: "docs", chunk_kind: ChunkKind::Docs, limit: 4 };
const CONFIG: FacetSpec = FacetSpec { name: "config", chunk_kind: ChunkKind::Config, limit: 3 };
const CONTRACTS: FacetSpec = FacetSpec { name: "contracts", chunk_kind: ChunkKind::Contracts, limit: 4 };

/// Decompose `query` into the facets a retrieval pass should cover. `code`
/// is always present; the rest are added when the query text matches their
/// trigger pattern.
pub fn decompose(query: &str) -> Vec<FacetSpec> {
    let mut facets = vec![CODE];
    if DOCS_RE.is_match(query) {
        facets.push(DOCS);
    }
    if CONFIG_RE.is_match(query) {
        facets.push(CONFIG);
    }
    if CONTRACTS_RE.is_match(query) {
        facets.push(CONTRACTS);
    }
    facets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_query_only_gets_the_code_facet() {
        let facets = decompose("find the retry loop");
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0].name, "code");
    }

    #[test]
    fn doc_keyword_adds_the_docs_facet() {
        let facets = decompose("how to configure the readme generator");
        assert!(facets.iter().any(|f| f.name == "docs"));
        assert!(facets.iter().any(|f| f.name == "config"));
    }

    #[test]
    fn api_keyword_adds_the_contracts_facet() {
        let facets = decompose("what does the openapi schema say about this endpoint");
        assert!(facets.iter().any(|f| f.name == "contracts"));
    }
}
