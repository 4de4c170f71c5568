//! Symbol Index (component C5).
//!
//! Symbols are points in a project's `{project}_symbols` collection, routed
//! through [`VectorStoreProvider`] like every other durable piece of state
//! the engine keeps: nothing survives only in process memory. A [`Symbol`]
//! is encoded into a [`Chunk`] at the storage boundary (see
//! [`symbol_to_chunk`]/[`chunk_to_symbol`]) so the existing upsert/search/
//! scroll surface can carry it without a second point shape.

use crate::collection;
use crate::domain::error::Result;
use crate::domain::ports::vector_store::SearchRequest;
use crate::domain::ports::{EmbeddingProvider, VectorStoreProvider};
use crate::domain::types::{Chunk, ChunkKind, Layer, Symbol, SymbolKind};
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;
const CROSS_FILE_CONTEXT_LIMIT: usize = 10;
const SCROLL_PAGE: usize = 100;

/// Per-project symbol store with embedding-backed name lookup.
pub struct SymbolIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStoreProvider>,
}

impl SymbolIndex {
    /// Create an index backed by `embedder` for [`Self::find_symbol`] and
    /// `vector_store` for storage.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, vector_store: Arc<dyn VectorStoreProvider>) -> Self {
        Self { embedder, vector_store }
    }

    /// Remove every symbol previously indexed for `(project, file)`.
    pub async fn clear_file_symbols(&self, project: &str, file: &str) -> Result<()> {
        let collection = collection::named(project, collection::SYMBOLS_SUFFIX);
        self.vector_store.delete_by_file(&collection, file).await?;
        Ok(())
    }

    /// Replace `(project, file)`'s symbols with `symbols`, embedding each
    /// one's `"{name} {signature}"` text for later semantic lookup.
    pub async fn index_file_symbols(
        &self,
        project: &str,
        file: &str,
        symbols: Vec<Symbol>,
    ) -> Result<()> {
        let collection = collection::named(project, collection::SYMBOLS_SUFFIX);
        self.vector_store
            .ensure_collection(&collection, self.embedder.dimensions(), false)
            .await?;
        self.vector_store.delete_by_file(&collection, file).await?;

        if symbols.is_empty() {
            return Ok(());
        }
        let mut points = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let text = format!("{} {}", symbol.name, symbol.signature);
            let vector = self.embedder.embed(&text).await?;
            points.push((symbol_to_chunk(&symbol), vector, None));
        }
        self.vector_store.upsert(&collection, &points).await
    }

    /// Find symbols matching `name` (substring, case-insensitive), ranked by
    /// cosine similarity of `"{name} {signature}"` against `name` itself,
    /// keeping only scores `>= 0.5`, optionally filtered to `kind`.
    pub async fn find_symbol(
        &self,
        project: &str,
        name: &str,
        kind: Option<SymbolKind>,
        limit: usize,
    ) -> Result<Vec<(Symbol, f32)>> {
        let collection = collection::named(project, collection::SYMBOLS_SUFFIX);
        let query_vector = self.embedder.embed(name).await?;
        let oversample = (limit * 4).max(20);

        let hits = self
            .vector_store
            .search(SearchRequest::dense(collection, query_vector, oversample))
            .await?;

        let needle = name.to_lowercase();
        let mut ranked: Vec<(Symbol, f32)> = hits
            .into_iter()
            .filter_map(|hit| chunk_to_symbol(&hit.chunk.chunk).map(|s| (s, hit.chunk.score)))
            .filter(|(s, _)| kind.is_none_or(|k| s.kind == k))
            .filter(|(s, _)| s.name.to_lowercase().contains(&needle))
            .filter(|(_, score)| *score >= DEFAULT_SCORE_THRESHOLD)
            .collect();

        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(limit);
        Ok(ranked)
    }

    /// Exported symbols defined in `file`.
    pub async fn file_exports(&self, project: &str, file: &str) -> Result<Vec<Symbol>> {
        let collection = collection::named(project, collection::SYMBOLS_SUFFIX);
        let symbols = self.scroll_all(&collection).await?;
        Ok(symbols.into_iter().filter(|s| s.file == file && s.exported).collect())
    }

    /// Build up to [`CROSS_FILE_CONTEXT_LIMIT`] `"// from {file}: {signature}"`
    /// lines describing exported symbols in the files named by `imports`,
    /// for use when composing anchors.
    pub async fn cross_file_context(&self, project: &str, imports: &[String]) -> Result<Vec<String>> {
        let collection = collection::named(project, collection::SYMBOLS_SUFFIX);
        let symbols = self.scroll_all(&collection).await?;

        let mut lines = Vec::new();
        for import in imports {
            for symbol in symbols.iter().filter(|s| s.file.contains(import.as_str()) && s.exported) {
                lines.push(format!("// from {}: {}", symbol.file, symbol.signature));
                if lines.len() >= CROSS_FILE_CONTEXT_LIMIT {
                    return Ok(lines);
                }
            }
        }
        Ok(lines)
    }

    /// Page through every point in `collection`, decoding each into a
    /// [`Symbol`]. There is no filter parameter on
    /// [`VectorStoreProvider::scroll`], so callers that need a subset filter
    /// client-side over this full walk.
    async fn scroll_all(&self, collection: &str) -> Result<Vec<Symbol>> {
        let mut out = Vec::new();
        let mut offset = None;
        loop {
            let (chunks, next) = self.vector_store.scroll(collection, SCROLL_PAGE, offset).await?;
            if chunks.is_empty() {
                break;
            }
            out.extend(chunks.iter().filter_map(chunk_to_symbol));
            match next {
                Some(id) => offset = Some(id),
                None => break,
            }
        }
        Ok(out)
    }
}

/// Encode a [`Symbol`] as a [`Chunk`] point: `name` goes in `symbols[0]`,
/// `kind` in `language` (serde's lowercase rendering), `signature` in
/// `content`, `exported` as the presence of `service`.
fn symbol_to_chunk(symbol: &Symbol) -> Chunk {
    Chunk {
        id: Uuid::new_v4(),
        file: symbol.file.clone(),
        start_line: symbol.start_line,
        end_line: symbol.end_line,
        language: symbol_kind_to_string(symbol.kind),
        content: symbol.signature.clone(),
        chunk_type: ChunkKind::Unknown,
        layer: Layer::Other,
        service: symbol.exported.then(|| "exported".to_string()),
        imports: Vec::new(),
        symbols: vec![symbol.name.clone()],
        chunk_index: 0,
        total_chunks: 1,
        project: symbol.project.clone(),
        indexed_at: symbol.indexed_at,
        file_hash: None,
        git_commit: None,
    }
}

fn chunk_to_symbol(chunk: &Chunk) -> Option<Symbol> {
    let name = chunk.symbols.first()?.clone();
    let kind = symbol_kind_from_string(&chunk.language)?;
    Some(Symbol {
        name,
        kind,
        file: chunk.file.clone(),
        start_line: chunk.start_line,
        end_line: chunk.end_line,
        signature: chunk.content.clone(),
        exported: chunk.service.as_deref() == Some("exported"),
        project: chunk.project.clone(),
        indexed_at: chunk.indexed_at,
    })
}

fn symbol_kind_to_string(kind: SymbolKind) -> String {
    serde_json::to_value(kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn symbol_kind_from_string(s: &str) -> Option<SymbolKind> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).ok()
}

/// Derive a heuristic signature (capped at 200 characters) for a symbol
/// from its surrounding chunk content.
pub fn derive_signature(content: &str, symbol_name: &str) -> String {
    let line = content
        .lines()
        .find(|l| l.contains(symbol_name))
        .unwrap_or(content);
    let mut sig = line.trim().to_string();
    if sig.len() > 200 {
        sig.truncate(200);
    }
    sig
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::embedding::hashing::HashingEmbeddingProvider;
    use crate::providers::vector_store::memory::InMemoryVectorStore;
    use chrono::Utc;

    fn symbol(name: &str, exported: bool) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind: SymbolKind::Function,
            file: "src/lib.rs".to_string(),
            start_line: 1,
            end_line: 3,
            signature: format!("fn {name}()"),
            exported,
            project: "demo".to_string(),
            indexed_at: Utc::now(),
        }
    }

    fn index() -> SymbolIndex {
        SymbolIndex::new(
            Arc::new(HashingEmbeddingProvider::new(32)),
            Arc::new(InMemoryVectorStore::new()),
        )
    }

    #[tokio::test]
    async fn find_symbol_matches_by_substring_and_kind() {
        let idx = index();
        idx.index_file_symbols("demo", "src/lib.rs", vec![symbol("login", true)])
            .await
            .unwrap();
        let hits = idx.find_symbol("demo", "login", Some(SymbolKind::Function), 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.name, "login");
    }

    #[tokio::test]
    async fn clear_file_symbols_removes_all_entries_for_file() {
        let idx = index();
        idx.index_file_symbols("demo", "src/lib.rs", vec![symbol("login", true)])
            .await
            .unwrap();
        idx.clear_file_symbols("demo", "src/lib.rs").await.unwrap();
        assert!(idx.file_exports("demo", "src/lib.rs").await.unwrap().is_empty());
    }

    #[test]
    fn derive_signature_caps_at_200_chars() {
        let content = format!("fn long_fn_{} ", "x".repeat(300));
        let sig = derive_signature(&content, "long_fn_");
        assert!(sig.len() <= 200);
    }
}
