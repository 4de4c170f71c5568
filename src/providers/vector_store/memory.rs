//! In-process vector store test double.
//!
//! Implements the full [`VectorStoreProvider`] contract — including client
//! side Reciprocal Rank Fusion, grouped search, recommend, scroll, and
//! alias swap — over plain `DashMap`s, so the crate's own test suite can
//! exercise every retrieval and reindex invariant without a running Qdrant.

use crate::domain::error::Result;
use crate::domain::ports::vector_store::{
    AggregateStats, DuplicateGroup, FusedHit, GroupedHits, RecommendRequest, SearchRequest,
    VectorStoreProvider,
};
use crate::domain::types::{Chunk, DenseVector, ScoredChunk, SparseVector};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;

const RRF_K: f32 = 60.0;
const AGGREGATE_SCAN_CAP: usize = 5_000;

struct Point {
    chunk: Chunk,
    dense: DenseVector,
    sparse: Option<SparseVector>,
}

#[derive(Default)]
struct Collection {
    points: Vec<Point>,
    sparse_enabled: bool,
}

/// An in-memory implementation of [`VectorStoreProvider`], useful for tests
/// and for exercising the indexing/retrieval pipeline without a backend.
#[derive(Default)]
pub struct InMemoryVectorStore {
    collections: DashMap<String, Collection>,
    aliases: DashMap<String, String>,
}

impl InMemoryVectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve(&self, name: &str) -> String {
        self.aliases
            .get(name)
            .map(|target| target.clone())
            .unwrap_or_else(|| name.to_string())
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f32 {
    let mut score = 0.0;
    for (idx, val) in a.indices.iter().zip(&a.values) {
        if let Some(pos) = b.indices.iter().position(|i| i == idx) {
            score += val * b.values[pos];
        }
    }
    score
}

fn matches_filter(chunk: &Chunk, filter: &HashMap<String, String>) -> bool {
    if filter.is_empty() {
        return true;
    }
    let Ok(value) = serde_json::to_value(chunk) else {
        return false;
    };
    filter.iter().all(|(field, expected)| {
        value
            .get(field)
            .map(|v| match v {
                serde_json::Value::String(s) => s == expected,
                other => other.to_string().trim_matches('"') == expected,
            })
            .unwrap_or(false)
    })
}

#[async_trait]
impl VectorStoreProvider for InMemoryVectorStore {
    async fn ensure_collection(
        &self,
        collection: &str,
        _dense_size: usize,
        sparse: bool,
    ) -> Result<()> {
        let mut entry = self.collections.entry(collection.to_string()).or_default();
        entry.sparse_enabled |= sparse;
        Ok(())
    }

    async fn ensure_payload_index(&self, _collection: &str, _field: &str) -> Result<()> {
        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        chunks: &[(Chunk, DenseVector, Option<SparseVector>)],
    ) -> Result<()> {
        let resolved = self.resolve(collection);
        let mut entry = self.collections.entry(resolved).or_default();
        for (chunk, dense, sparse) in chunks {
            entry.points.retain(|p| p.chunk.id != chunk.id);
            entry.points.push(Point {
                chunk: chunk.clone(),
                dense: dense.clone(),
                sparse: sparse.clone(),
            });
        }
        Ok(())
    }

    async fn delete_by_file(&self, collection: &str, file_path: &str) -> Result<usize> {
        let resolved = self.resolve(collection);
        let Some(mut entry) = self.collections.get_mut(&resolved) else {
            return Ok(0);
        };
        let before = entry.points.len();
        entry.points.retain(|p| p.chunk.file != file_path);
        Ok(before - entry.points.len())
    }

    async fn delete_by_ids(&self, collection: &str, ids: &[uuid::Uuid]) -> Result<usize> {
        let resolved = self.resolve(collection);
        let Some(mut entry) = self.collections.get_mut(&resolved) else {
            return Ok(0);
        };
        let before = entry.points.len();
        entry.points.retain(|p| !ids.contains(&p.chunk.id));
        Ok(before - entry.points.len())
    }

    async fn search(&self, request: SearchRequest) -> Result<Vec<FusedHit>> {
        let resolved = self.resolve(&request.collection);
        let Some(entry) = self.collections.get(&resolved) else {
            return Ok(Vec::new());
        };

        let candidates: Vec<&Point> = entry
            .points
            .iter()
            .filter(|p| matches_filter(&p.chunk, &request.filter))
            .collect();

        let dense_ranked: Vec<(usize, f32)> = match &request.dense {
            Some(q) => {
                let mut scored: Vec<(usize, f32)> = candidates
                    .iter()
                    .enumerate()
                    .map(|(i, p)| (i, cosine(q, &p.dense)))
                    .collect();
                scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                scored
            }
            None => Vec::new(),
        };

        let sparse_ranked: Vec<(usize, f32)> = match &request.sparse {
            Some(q) => {
                let mut scored: Vec<(usize, f32)> = candidates
                    .iter()
                    .enumerate()
                    .filter_map(|(i, p)| p.sparse.as_ref().map(|s| (i, sparse_dot(q, s))))
                    .collect();
                scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                scored
            }
            None => Vec::new(),
        };

        let dense_rank_of: HashMap<usize, usize> = dense_ranked
            .iter()
            .enumerate()
            .map(|(rank, (idx, _))| (*idx, rank))
            .collect();
        let sparse_rank_of: HashMap<usize, usize> = sparse_ranked
            .iter()
            .enumerate()
            .map(|(rank, (idx, _))| (*idx, rank))
            .collect();

        let mut indices: Vec<usize> = (0..candidates.len()).collect();
        indices.retain(|i| dense_rank_of.contains_key(i) || sparse_rank_of.contains_key(i));

        let mut hits: Vec<FusedHit> = indices
            .into_iter()
            .map(|i| {
                let dense_rank = dense_rank_of.get(&i).copied();
                let sparse_rank = sparse_rank_of.get(&i).copied();
                let rrf_score = dense_rank.map(|r| 1.0 / (RRF_K + r as f32 + 1.0)).unwrap_or(0.0)
                    + sparse_rank.map(|r| 1.0 / (RRF_K + r as f32 + 1.0)).unwrap_or(0.0);
                let cosine_score = dense_rank
                    .map(|_| cosine(request.dense.as_deref().unwrap_or(&[]), &candidates[i].dense))
                    .unwrap_or(rrf_score);
                FusedHit {
                    chunk: ScoredChunk {
                        id: candidates[i].chunk.id,
                        chunk: candidates[i].chunk.clone(),
                        score: if dense_rank.is_some() && sparse_rank.is_some() {
                            rrf_score
                        } else {
                            cosine_score
                        },
                    },
                    dense_rank,
                    sparse_rank,
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.chunk
                .score
                .partial_cmp(&a.chunk.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        if let Some(threshold) = request.score_threshold {
            hits.retain(|h| h.chunk.score >= threshold);
        }
        hits.truncate(request.limit);
        Ok(hits)
    }

    async fn search_grouped(
        &self,
        request: SearchRequest,
        group_by: &str,
        group_limit: usize,
        groups: usize,
    ) -> Result<Vec<GroupedHits>> {
        let oversampled = SearchRequest {
            limit: request.limit.max(group_limit * groups * 4),
            ..request
        };
        let hits = self.search(oversampled).await?;

        let mut grouped: Vec<GroupedHits> = Vec::new();
        for hit in hits {
            let value = serde_json::to_value(&hit.chunk.chunk)
                .ok()
                .and_then(|v| v.get(group_by).and_then(|f| f.as_str().map(str::to_string)))
                .unwrap_or_default();

            if let Some(group) = grouped.iter_mut().find(|g| g.group_key == value) {
                if group.hits.len() < group_limit {
                    group.hits.push(hit.chunk);
                }
            } else if grouped.len() < groups {
                grouped.push(GroupedHits {
                    group_key: value,
                    hits: vec![hit.chunk],
                });
            }
        }
        Ok(grouped)
    }

    async fn recommend(&self, request: RecommendRequest) -> Result<Vec<ScoredChunk>> {
        let resolved = self.resolve(&request.collection);
        let Some(entry) = self.collections.get(&resolved) else {
            return Ok(Vec::new());
        };

        let positive_vecs: Vec<&DenseVector> = entry
            .points
            .iter()
            .filter(|p| request.positive.contains(&p.chunk.id))
            .map(|p| &p.dense)
            .collect();
        let negative_vecs: Vec<&DenseVector> = entry
            .points
            .iter()
            .filter(|p| request.negative.contains(&p.chunk.id))
            .map(|p| &p.dense)
            .collect();

        if positive_vecs.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<ScoredChunk> = entry
            .points
            .iter()
            .filter(|p| !request.positive.contains(&p.chunk.id))
            .map(|p| {
                let pos_score: f32 =
                    positive_vecs.iter().map(|v| cosine(v, &p.dense)).sum::<f32>() / positive_vecs.len() as f32;
                let neg_score: f32 = if negative_vecs.is_empty() {
                    0.0
                } else {
                    negative_vecs.iter().map(|v| cosine(v, &p.dense)).sum::<f32>() / negative_vecs.len() as f32
                };
                ScoredChunk {
                    id: p.chunk.id,
                    chunk: p.chunk.clone(),
                    score: pos_score - neg_score,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(request.limit);
        Ok(scored)
    }

    async fn scroll(
        &self,
        collection: &str,
        page_size: usize,
        offset: Option<uuid::Uuid>,
    ) -> Result<(Vec<Chunk>, Option<uuid::Uuid>)> {
        let resolved = self.resolve(collection);
        let Some(entry) = self.collections.get(&resolved) else {
            return Ok((Vec::new(), None));
        };
        let page_size = page_size.min(100).max(1);

        let start = match offset {
            Some(id) => entry.points.iter().position(|p| p.chunk.id == id).map(|i| i + 1).unwrap_or(0),
            None => 0,
        };

        let page: Vec<Chunk> = entry.points.iter().skip(start).take(page_size).map(|p| p.chunk.clone()).collect();
        let next = entry.points.get(start + page_size).map(|p| p.chunk.id);
        Ok((page, next))
    }

    async fn find_duplicates(&self, collection: &str, threshold: f32) -> Result<Vec<DuplicateGroup>> {
        let resolved = self.resolve(collection);
        let Some(entry) = self.collections.get(&resolved) else {
            return Ok(Vec::new());
        };

        let mut groups: Vec<DuplicateGroup> = Vec::new();
        let mut assigned = vec![false; entry.points.len()];

        for i in 0..entry.points.len() {
            if assigned[i] {
                continue;
            }
            let mut members = vec![entry.points[i].chunk.id];
            let mut best_sim = 0.0f32;
            for j in (i + 1)..entry.points.len() {
                if assigned[j] {
                    continue;
                }
                let sim = cosine(&entry.points[i].dense, &entry.points[j].dense);
                if sim >= threshold {
                    members.push(entry.points[j].chunk.id);
                    assigned[j] = true;
                    best_sim = best_sim.max(sim);
                }
            }
            if members.len() > 1 {
                assigned[i] = true;
                groups.push(DuplicateGroup {
                    chunk_ids: members,
                    similarity: best_sim,
                });
            }
        }
        Ok(groups)
    }

    async fn swap_alias(&self, alias: &str, collection: &str) -> Result<()> {
        self.aliases.insert(alias.to_string(), collection.to_string());
        Ok(())
    }

    async fn resolve_alias(&self, alias: &str) -> Result<Option<String>> {
        Ok(self.aliases.get(alias).map(|v| v.clone()))
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        self.collections.remove(collection);
        Ok(())
    }

    async fn enable_quantization(&self, _collection: &str) -> Result<()> {
        Ok(())
    }

    async fn disable_quantization(&self, _collection: &str) -> Result<()> {
        Ok(())
    }

    async fn snapshot(&self, collection: &str) -> Result<String> {
        Ok(format!("{collection}-snapshot"))
    }

    async fn list_snapshots(&self, collection: &str) -> Result<Vec<String>> {
        Ok(vec![format!("{collection}-snapshot")])
    }

    async fn delete_snapshot(&self, _collection: &str, _snapshot: &str) -> Result<()> {
        Ok(())
    }

    async fn recover_snapshot(&self, _collection: &str, _snapshot: &str) -> Result<()> {
        Ok(())
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        let resolved = self.resolve(collection);
        Ok(self.collections.contains_key(&resolved))
    }

    async fn count(&self, collection: &str, filter: Option<&HashMap<String, String>>) -> Result<usize> {
        let resolved = self.resolve(collection);
        let Some(entry) = self.collections.get(&resolved) else {
            return Ok(0);
        };
        let empty = HashMap::new();
        let filter = filter.unwrap_or(&empty);
        Ok(entry.points.iter().filter(|p| matches_filter(&p.chunk, filter)).count())
    }

    async fn delete_by_filter(&self, collection: &str, filter: &HashMap<String, String>) -> Result<usize> {
        let resolved = self.resolve(collection);
        let Some(mut entry) = self.collections.get_mut(&resolved) else {
            return Ok(0);
        };
        let before = entry.points.len();
        entry.points.retain(|p| !matches_filter(&p.chunk, filter));
        Ok(before - entry.points.len())
    }

    async fn facet_counts(
        &self,
        collection: &str,
        field: &str,
        candidate_values: &[String],
    ) -> Result<Vec<(String, usize)>> {
        let resolved = self.resolve(collection);
        let Some(entry) = self.collections.get(&resolved) else {
            return Ok(candidate_values.iter().map(|v| (v.clone(), 0)).collect());
        };
        Ok(candidate_values
            .iter()
            .map(|value| {
                let mut filter = HashMap::new();
                filter.insert(field.to_string(), value.clone());
                let count = entry.points.iter().filter(|p| matches_filter(&p.chunk, &filter)).count();
                (value.clone(), count)
            })
            .collect())
    }

    async fn aggregate_stats(&self, collection: &str) -> Result<AggregateStats> {
        let resolved = self.resolve(collection);
        let Some(entry) = self.collections.get(&resolved) else {
            return Ok(AggregateStats {
                total: 0,
                by_language: HashMap::new(),
                unique_files: 0,
                most_recent_indexed_at: None,
                truncated: false,
            });
        };

        let total = entry.points.len();
        let truncated = total > AGGREGATE_SCAN_CAP;
        let scanned = &entry.points[..total.min(AGGREGATE_SCAN_CAP)];

        let mut by_language: HashMap<String, usize> = HashMap::new();
        let mut files: std::collections::HashSet<&str> = std::collections::HashSet::new();
        let mut most_recent = None;
        for point in scanned {
            *by_language.entry(point.chunk.language.clone()).or_insert(0) += 1;
            files.insert(point.chunk.file.as_str());
            most_recent = match most_recent {
                Some(t) if t >= point.chunk.indexed_at => most_recent,
                _ => Some(point.chunk.indexed_at),
            };
        }

        let unique_files = if truncated && !scanned.is_empty() {
            (files.len() as f64 * (total as f64 / scanned.len() as f64)).round() as usize
        } else {
            files.len()
        };

        Ok(AggregateStats {
            total,
            by_language,
            unique_files,
            most_recent_indexed_at: most_recent,
            truncated,
        })
    }

    async fn find_clusters(
        &self,
        collection: &str,
        seed_ids: &[uuid::Uuid],
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<uuid::Uuid>> {
        let resolved = self.resolve(collection);
        let Some(entry) = self.collections.get(&resolved) else {
            return Ok(Vec::new());
        };
        let seeds: Vec<&DenseVector> = entry
            .points
            .iter()
            .filter(|p| seed_ids.contains(&p.chunk.id))
            .map(|p| &p.dense)
            .collect();
        if seeds.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<(uuid::Uuid, f32)> = entry
            .points
            .iter()
            .filter(|p| !seed_ids.contains(&p.chunk.id))
            .filter_map(|p| {
                let best = seeds.iter().map(|s| cosine(s, &p.dense)).fold(0.0f32, f32::max);
                (best >= threshold).then_some((p.chunk.id, best))
            })
            .collect();
        hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits.into_iter().map(|(id, _)| id).collect())
    }

    async fn create_alias(&self, alias: &str, collection: &str) -> Result<()> {
        if self.aliases.contains_key(alias) {
            return Err(crate::domain::error::Error::backend_bad_request(format!(
                "alias '{alias}' already exists"
            )));
        }
        self.aliases.insert(alias.to_string(), collection.to_string());
        Ok(())
    }

    async fn delete_alias(&self, alias: &str) -> Result<()> {
        self.aliases.remove(alias);
        Ok(())
    }

    async fn list_aliases(&self) -> Result<Vec<(String, String)>> {
        Ok(self.aliases.iter().map(|e| (e.key().clone(), e.value().clone())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ChunkKind, Layer};
    use chrono::Utc;

    fn chunk(file: &str) -> Chunk {
        Chunk {
            id: uuid::Uuid::new_v4(),
            file: file.to_string(),
            start_line: 1,
            end_line: 2,
            language: "rust".to_string(),
            content: "fn f() {}".to_string(),
            chunk_type: ChunkKind::Code,
            layer: Layer::Other,
            service: None,
            imports: Vec::new(),
            symbols: Vec::new(),
            chunk_index: 0,
            total_chunks: 1,
            project: "demo".to_string(),
            indexed_at: Utc::now(),
            file_hash: None,
            git_commit: None,
        }
    }

    #[tokio::test]
    async fn upsert_then_search_returns_exact_id() {
        let store = InMemoryVectorStore::new();
        let c = chunk("a.rs");
        let id = c.id;
        store.ensure_collection("demo_code", 4, false).await.unwrap();
        store.upsert("demo_code", &[(c, vec![1.0, 0.0, 0.0, 0.0], None)]).await.unwrap();

        let hits = store
            .search(SearchRequest::dense("demo_code", vec![1.0, 0.0, 0.0, 0.0], 5))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id, id);
    }

    #[tokio::test]
    async fn alias_swap_then_search_never_sees_empty_state() {
        let store = InMemoryVectorStore::new();
        let c = chunk("a.rs");
        store.ensure_collection("demo_v1", 4, false).await.unwrap();
        store.upsert("demo_v1", &[(c, vec![1.0, 0.0, 0.0, 0.0], None)]).await.unwrap();
        store.swap_alias("demo_alias", "demo_v1").await.unwrap();

        let before = store.search(SearchRequest::dense("demo_alias", vec![1.0, 0.0, 0.0, 0.0], 5)).await.unwrap();
        assert_eq!(before.len(), 1);

        let c2 = chunk("b.rs");
        store.ensure_collection("demo_v2", 4, false).await.unwrap();
        store.upsert("demo_v2", &[(c2, vec![0.0, 1.0, 0.0, 0.0], None)]).await.unwrap();
        store.swap_alias("demo_alias", "demo_v2").await.unwrap();

        let after = store.search(SearchRequest::dense("demo_alias", vec![0.0, 1.0, 0.0, 0.0], 5)).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].chunk.chunk.file, "b.rs");
    }

    #[tokio::test]
    async fn delete_by_file_removes_only_that_files_points() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("demo_code", 4, false).await.unwrap();
        store
            .upsert(
                "demo_code",
                &[
                    (chunk("a.rs"), vec![1.0, 0.0, 0.0, 0.0], None),
                    (chunk("b.rs"), vec![0.0, 1.0, 0.0, 0.0], None),
                ],
            )
            .await
            .unwrap();

        let removed = store.delete_by_file("demo_code", "a.rs").await.unwrap();
        assert_eq!(removed, 1);

        let remaining = store.scroll("demo_code", 10, None).await.unwrap().0;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].file, "b.rs");
    }

    #[tokio::test]
    async fn missing_collection_reads_as_empty_not_error() {
        let store = InMemoryVectorStore::new();
        let hits = store.search(SearchRequest::dense("nope", vec![1.0], 5)).await.unwrap();
        assert!(hits.is_empty());
    }
}
