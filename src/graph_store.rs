//! Graph Store (component C6).
//!
//! Edges live in a project's `{project}_graph` collection, routed through
//! [`VectorStoreProvider`] the same way chunks and symbols are. Each edge is
//! embedded by its textual form ([`embedded_text`]) so the graph can be
//! semantically searched later, and encoded into a [`Chunk`] at the storage
//! boundary (see [`edge_to_chunk`]/[`chunk_to_edge`]) rather than inventing a
//! second point shape. BFS queries scroll the whole per-project collection
//! and walk it in memory; there is no persistent adjacency structure beyond
//! the backend.

use crate::collection;
use crate::domain::error::Result;
use crate::domain::ports::{EmbeddingProvider, VectorStoreProvider};
use crate::domain::types::{Chunk, ChunkKind, Edge, EdgeType, Layer};
use chrono::Utc;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use uuid::Uuid;

const MAX_BLAST_RADIUS_DEPTH: u32 = 3;
const SCROLL_PAGE: usize = 100;

/// Result of [`GraphStore::blast_radius`].
#[derive(Debug, Clone, PartialEq)]
pub struct BlastRadius {
    /// Files reachable by following incoming edges from the seed set.
    pub affected_files: Vec<String>,
    /// Deepest hop count actually reached (`<= max_depth`).
    pub depth_reached: u32,
    /// Number of edges traversed while computing this result.
    pub edges_traversed: usize,
}

/// Per-project dependency edge store with BFS expansion.
pub struct GraphStore {
    embedder: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStoreProvider>,
}

impl GraphStore {
    /// Create a graph store backed by `embedder` (for the edge-embedding
    /// upsert path) and `vector_store`.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, vector_store: Arc<dyn VectorStoreProvider>) -> Self {
        Self { embedder, vector_store }
    }

    /// Replace every edge whose `from_file == file` with `edges`, embedding
    /// each edge's [`embedded_text`] so it can be found by semantic search.
    pub async fn index_file_edges(&self, project: &str, file: &str, edges: Vec<Edge>) -> Result<()> {
        let collection = collection::named(project, collection::GRAPH_SUFFIX);
        self.vector_store
            .ensure_collection(&collection, self.embedder.dimensions(), false)
            .await?;
        self.vector_store.delete_by_file(&collection, file).await?;

        if edges.is_empty() {
            return Ok(());
        }
        let mut points = Vec::with_capacity(edges.len());
        for edge in &edges {
            let vector = self.embedder.embed(&embedded_text(edge)).await?;
            points.push((edge_to_chunk(edge), vector, None));
        }
        self.vector_store.upsert(&collection, &points).await
    }

    /// BFS over both outgoing (`from_file`) and incoming (`to_file`) edges,
    /// `hops` deep from `seed_files`. Returns the visited file set, seeds
    /// included.
    pub async fn expand(&self, project: &str, seed_files: &[String], hops: u32) -> Result<HashSet<String>> {
        let edges = self.scroll_all(project).await?;
        if edges.is_empty() {
            return Ok(seed_files.iter().cloned().collect());
        }

        let mut visited: HashSet<String> = seed_files.iter().cloned().collect();
        let mut frontier: VecDeque<(String, u32)> =
            seed_files.iter().map(|f| (f.clone(), 0)).collect();

        while let Some((file, depth)) = frontier.pop_front() {
            if depth >= hops {
                continue;
            }
            for edge in &edges {
                let neighbor = if edge.from_file == file {
                    Some(edge.to_file.clone())
                } else if edge.to_file == file {
                    Some(edge.from_file.clone())
                } else {
                    None
                };
                if let Some(neighbor) = neighbor {
                    if visited.insert(neighbor.clone()) {
                        frontier.push_back((neighbor, depth + 1));
                    }
                }
            }
        }

        Ok(visited)
    }

    /// Files that directly depend on `file` (one hop, incoming edges).
    pub async fn dependents(&self, project: &str, file: &str) -> Result<Vec<String>> {
        let edges = self.scroll_all(project).await?;
        Ok(one_hop(&edges, file, |e, f| (e.to_file == f).then(|| e.from_file.clone())))
    }

    /// Files `file` directly depends on (one hop, outgoing edges).
    pub async fn dependencies(&self, project: &str, file: &str) -> Result<Vec<String>> {
        let edges = self.scroll_all(project).await?;
        Ok(one_hop(&edges, file, |e, f| (e.from_file == f).then(|| e.to_file.clone())))
    }

    /// Follow *incoming* edges only, up to `max_depth` (capped at
    /// [`MAX_BLAST_RADIUS_DEPTH`]), from `files`.
    pub async fn blast_radius(&self, project: &str, files: &[String], max_depth: u32) -> Result<BlastRadius> {
        let max_depth = max_depth.min(MAX_BLAST_RADIUS_DEPTH);
        let edges = self.scroll_all(project).await?;
        if edges.is_empty() {
            return Ok(BlastRadius {
                affected_files: files.to_vec(),
                depth_reached: 0,
                edges_traversed: 0,
            });
        }

        let mut visited: HashSet<String> = files.iter().cloned().collect();
        let mut frontier: VecDeque<(String, u32)> = files.iter().map(|f| (f.clone(), 0)).collect();
        let mut depth_reached = 0u32;
        let mut edges_traversed = 0usize;

        while let Some((file, depth)) = frontier.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for edge in &edges {
                if edge.to_file != file {
                    continue;
                }
                edges_traversed += 1;
                if visited.insert(edge.from_file.clone()) {
                    depth_reached = depth_reached.max(depth + 1);
                    frontier.push_back((edge.from_file.clone(), depth + 1));
                }
            }
        }

        Ok(BlastRadius {
            affected_files: visited.into_iter().collect(),
            depth_reached,
            edges_traversed,
        })
    }

    /// Page through `project`'s whole graph collection, decoding each point
    /// back into an [`Edge`].
    async fn scroll_all(&self, project: &str) -> Result<Vec<Edge>> {
        let collection = collection::named(project, collection::GRAPH_SUFFIX);
        let mut out = Vec::new();
        let mut offset = None;
        loop {
            let (chunks, next) = self.vector_store.scroll(&collection, SCROLL_PAGE, offset).await?;
            if chunks.is_empty() {
                break;
            }
            out.extend(chunks.iter().filter_map(chunk_to_edge));
            match next {
                Some(id) => offset = Some(id),
                None => break,
            }
        }
        Ok(out)
    }
}

fn one_hop(edges: &[Edge], file: &str, pick: impl Fn(&Edge, &str) -> Option<String>) -> Vec<String> {
    let mut out: Vec<String> = edges.iter().filter_map(|e| pick(e, file)).collect();
    out.sort();
    out.dedup();
    out
}

/// Textual form of an edge, used as the embedding input when an edge is
/// upserted.
pub fn embedded_text(edge: &Edge) -> String {
    edge.to_text()
}

/// Encode an [`Edge`] as a [`Chunk`] point: `from_file` is the chunk's
/// `file` (so [`VectorStoreProvider::delete_by_file`] clears a file's
/// outgoing edges), `to_file`/`to_symbol` ride in `imports`, `from_symbol`
/// in `symbols[0]`, and `edge_type` in `language`.
fn edge_to_chunk(edge: &Edge) -> Chunk {
    Chunk {
        id: Uuid::new_v4(),
        file: edge.from_file.clone(),
        start_line: 0,
        end_line: 0,
        language: edge_type_to_string(edge.edge_type),
        content: edge.to_text(),
        chunk_type: ChunkKind::Unknown,
        layer: Layer::Other,
        service: None,
        imports: vec![edge.to_file.clone(), edge.to_symbol.clone().unwrap_or_default()],
        symbols: vec![edge.from_symbol.clone().unwrap_or_default()],
        chunk_index: 0,
        total_chunks: 1,
        project: edge.project.clone(),
        indexed_at: Utc::now(),
        file_hash: None,
        git_commit: None,
    }
}

fn chunk_to_edge(chunk: &Chunk) -> Option<Edge> {
    let edge_type = edge_type_from_string(&chunk.language)?;
    let to_file = chunk.imports.first()?.clone();
    let to_symbol = chunk.imports.get(1).filter(|s| !s.is_empty()).cloned();
    let from_symbol = chunk.symbols.first().filter(|s| !s.is_empty()).cloned();
    Some(Edge {
        from_file: chunk.file.clone(),
        from_symbol,
        to_file,
        to_symbol,
        edge_type,
        project: chunk.project.clone(),
    })
}

fn edge_type_to_string(edge_type: EdgeType) -> String {
    serde_json::to_value(edge_type)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn edge_type_from_string(s: &str) -> Option<EdgeType> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::embedding::hashing::HashingEmbeddingProvider;
    use crate::providers::vector_store::memory::InMemoryVectorStore;

    fn edge(from: &str, to: &str, kind: EdgeType, project: &str) -> Edge {
        Edge {
            from_file: from.to_string(),
            from_symbol: None,
            to_file: to.to_string(),
            to_symbol: None,
            edge_type: kind,
            project: project.to_string(),
        }
    }

    fn store() -> GraphStore {
        GraphStore::new(
            Arc::new(HashingEmbeddingProvider::new(32)),
            Arc::new(InMemoryVectorStore::new()),
        )
    }

    #[tokio::test]
    async fn expand_follows_both_directions() {
        let store = store();
        store
            .index_file_edges("p", "a.rs", vec![edge("a.rs", "b.rs", EdgeType::Import, "p")])
            .await
            .unwrap();
        store
            .index_file_edges("p", "c.rs", vec![edge("c.rs", "a.rs", EdgeType::Import, "p")])
            .await
            .unwrap();

        let visited = store.expand("p", &["a.rs".to_string()], 1).await.unwrap();
        assert!(visited.contains("a.rs"));
        assert!(visited.contains("b.rs"));
        assert!(visited.contains("c.rs"));
    }

    #[tokio::test]
    async fn dependents_and_dependencies_are_one_hop() {
        let store = store();
        store
            .index_file_edges("p", "a.rs", vec![edge("a.rs", "b.rs", EdgeType::Call, "p")])
            .await
            .unwrap();

        assert_eq!(store.dependencies("p", "a.rs").await.unwrap(), vec!["b.rs".to_string()]);
        assert_eq!(store.dependents("p", "b.rs").await.unwrap(), vec!["a.rs".to_string()]);
        assert!(store.dependents("p", "a.rs").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blast_radius_follows_incoming_edges_only() {
        let store = store();
        // a -> b -> c  (b and c each import from "earlier" in the chain)
        store
            .index_file_edges("p", "b.rs", vec![edge("b.rs", "a.rs", EdgeType::Import, "p")])
            .await
            .unwrap();
        store
            .index_file_edges("p", "c.rs", vec![edge("c.rs", "b.rs", EdgeType::Import, "p")])
            .await
            .unwrap();

        let radius = store.blast_radius("p", &["a.rs".to_string()], 3).await.unwrap();
        assert!(radius.affected_files.contains(&"b.rs".to_string()));
        assert!(radius.affected_files.contains(&"c.rs".to_string()));
        assert_eq!(radius.depth_reached, 2);
    }

    #[tokio::test]
    async fn reindexing_a_file_clears_its_old_outgoing_edges() {
        let store = store();
        store
            .index_file_edges("p", "a.rs", vec![edge("a.rs", "old.rs", EdgeType::Import, "p")])
            .await
            .unwrap();
        store
            .index_file_edges("p", "a.rs", vec![edge("a.rs", "new.rs", EdgeType::Import, "p")])
            .await
            .unwrap();

        assert_eq!(store.dependencies("p", "a.rs").await.unwrap(), vec!["new.rs".to_string()]);
    }
}
