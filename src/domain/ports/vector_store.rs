//! Vector database facade contract (component C1 in the design notes).
//!
//! `VectorStoreProvider` is the one seam every collection/point/alias
//! operation in the engine goes through. It is written against Qdrant's
//! feature surface (named dense+sparse vectors, payload field indexes,
//! aliases, scalar quantization, scroll, recommend, grouped search) but
//! stays backend-agnostic so the in-memory test double can implement it
//! too.

use crate::domain::error::Result;
use crate::domain::types::{Chunk, DenseVector, ScoredChunk, SparseVector};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single hybrid search request against one collection.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Collection (or alias) to search.
    pub collection: String,
    /// Dense query vector.
    pub dense: Option<DenseVector>,
    /// Sparse query vector, used when the collection has a sparse field.
    pub sparse: Option<SparseVector>,
    /// Maximum hits to return.
    pub limit: usize,
    /// Optional payload filter: field name -> required string value.
    pub filter: HashMap<String, String>,
    /// Score threshold below which hits are dropped, if set.
    pub score_threshold: Option<f32>,
}

impl SearchRequest {
    /// A dense-only request against `collection` for the top `limit` hits.
    pub fn dense(collection: impl Into<String>, vector: DenseVector, limit: usize) -> Self {
        Self {
            collection: collection.into(),
            dense: Some(vector),
            sparse: None,
            limit,
            filter: HashMap::new(),
            score_threshold: None,
        }
    }

    /// Attach a payload equality filter.
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter.insert(field.into(), value.into());
        self
    }
}

/// A request to find points similar to a set of positive examples and
/// dissimilar to a set of negative examples (Qdrant's `recommend`).
#[derive(Debug, Clone)]
pub struct RecommendRequest {
    /// Collection (or alias) to search.
    pub collection: String,
    /// Point ids whose vectors pull the result toward them.
    pub positive: Vec<uuid::Uuid>,
    /// Point ids whose vectors push the result away from them.
    pub negative: Vec<uuid::Uuid>,
    /// Maximum hits to return.
    pub limit: usize,
}

/// Hits from a fused dense+sparse search, post Reciprocal Rank Fusion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FusedHit {
    /// The retrieved chunk.
    pub chunk: ScoredChunk,
    /// Rank this chunk held in the dense-only ranking, if retrieved there.
    pub dense_rank: Option<usize>,
    /// Rank this chunk held in the sparse-only ranking, if retrieved there.
    pub sparse_rank: Option<usize>,
}

/// Hits bucketed by a payload field (e.g. one group per `file`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupedHits {
    /// The group key value.
    pub group_key: String,
    /// Hits belonging to this group, best score first.
    pub hits: Vec<ScoredChunk>,
}

/// A cluster of near-duplicate chunks (cosine similarity above threshold).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DuplicateGroup {
    /// Ids of the chunks considered duplicates of one another.
    pub chunk_ids: Vec<uuid::Uuid>,
    /// Pairwise similarity that triggered the grouping.
    pub similarity: f32,
}

/// Collection-wide summary: total point count, a language breakdown, and
/// file coverage. The file count and `most_recent_indexed_at` are computed
/// from a bounded scroll (5 000 points) and extrapolated when truncated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateStats {
    /// Total vectors in the collection.
    pub total: usize,
    /// Point count per `language` payload value.
    pub by_language: HashMap<String, usize>,
    /// Distinct `file` values seen.
    pub unique_files: usize,
    /// Most recent `indexedAt` seen, if any points were scanned.
    pub most_recent_indexed_at: Option<DateTime<Utc>>,
    /// True if the scroll hit its 5 000-point cap before exhausting the
    /// collection, meaning `unique_files` is an extrapolation.
    pub truncated: bool,
}

/// The vector database facade. Every method treats a missing collection as
/// the trigger to create it (lazily, on first write) rather than an error;
/// reads against a missing collection return empty results, not
/// [`crate::domain::error::Error::NotFound`].
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Ensure `collection` exists with the given dense width and, if
    /// `sparse`, a named sparse vector field. Idempotent.
    async fn ensure_collection(&self, collection: &str, dense_size: usize, sparse: bool)
        -> Result<()>;

    /// Create a payload field index (keyword/int/etc) if absent. Idempotent.
    async fn ensure_payload_index(&self, collection: &str, field: &str) -> Result<()>;

    /// Upsert chunks with their dense (and optional sparse) vectors.
    async fn upsert(
        &self,
        collection: &str,
        chunks: &[(Chunk, DenseVector, Option<SparseVector>)],
    ) -> Result<()>;

    /// Delete all points whose payload has `file == file_path`.
    async fn delete_by_file(&self, collection: &str, file_path: &str) -> Result<usize>;

    /// Delete points by id.
    async fn delete_by_ids(&self, collection: &str, ids: &[uuid::Uuid]) -> Result<usize>;

    /// Dense (and, when both the collection and request carry one, sparse)
    /// similarity search with Reciprocal Rank Fusion at k=60 when both
    /// rankings are present.
    async fn search(&self, request: SearchRequest) -> Result<Vec<FusedHit>>;

    /// Search grouped by a payload field, at most `group_limit` hits per
    /// group, at most `groups` groups.
    async fn search_grouped(
        &self,
        request: SearchRequest,
        group_by: &str,
        group_limit: usize,
        groups: usize,
    ) -> Result<Vec<GroupedHits>>;

    /// Recommend points near a set of positives and away from negatives.
    async fn recommend(&self, request: RecommendRequest) -> Result<Vec<ScoredChunk>>;

    /// Page through every point in a collection, `page_size` at a time.
    async fn scroll(
        &self,
        collection: &str,
        page_size: usize,
        offset: Option<uuid::Uuid>,
    ) -> Result<(Vec<Chunk>, Option<uuid::Uuid>)>;

    /// Find clusters of near-duplicate chunks above `threshold` similarity.
    async fn find_duplicates(&self, collection: &str, threshold: f32) -> Result<Vec<DuplicateGroup>>;

    /// Point `alias` at `collection`, atomically replacing any prior target.
    /// This is the zero-downtime swap used by the reindexer.
    async fn swap_alias(&self, alias: &str, collection: &str) -> Result<()>;

    /// Resolve an alias to its current collection name, if the alias exists.
    async fn resolve_alias(&self, alias: &str) -> Result<Option<String>>;

    /// Drop a collection outright. Used to clean up the previous generation
    /// after a reindex's alias swap has settled.
    async fn drop_collection(&self, collection: &str) -> Result<()>;

    /// Enable scalar (int8) quantization on a collection, if the backend
    /// supports it. A no-op on backends (e.g. the in-memory test double)
    /// that have no concept of quantization.
    async fn enable_quantization(&self, collection: &str) -> Result<()>;

    /// Disable scalar quantization on a collection. A no-op on backends with
    /// no concept of quantization.
    async fn disable_quantization(&self, collection: &str) -> Result<()>;

    /// Trigger a backend snapshot of `collection`, returning an opaque
    /// identifier/location string.
    async fn snapshot(&self, collection: &str) -> Result<String>;

    /// List the snapshots previously taken of `collection`.
    async fn list_snapshots(&self, collection: &str) -> Result<Vec<String>>;

    /// Delete one of `collection`'s snapshots by name.
    async fn delete_snapshot(&self, collection: &str, snapshot: &str) -> Result<()>;

    /// Restore `collection` from a previously taken snapshot.
    async fn recover_snapshot(&self, collection: &str, snapshot: &str) -> Result<()>;

    /// True if `collection` currently exists.
    async fn collection_exists(&self, collection: &str) -> Result<bool>;

    /// Count points in `collection`, optionally matching `filter`.
    async fn count(&self, collection: &str, filter: Option<&HashMap<String, String>>)
        -> Result<usize>;

    /// Delete every point in `collection` matching `filter`. Returns the
    /// number of points deleted.
    async fn delete_by_filter(
        &self,
        collection: &str,
        filter: &HashMap<String, String>,
    ) -> Result<usize>;

    /// Parallel filtered counts of `field == value` for each of
    /// `candidate_values`, in the same order.
    async fn facet_counts(
        &self,
        collection: &str,
        field: &str,
        candidate_values: &[String],
    ) -> Result<Vec<(String, usize)>>;

    /// Collection-wide summary: total points, language breakdown, file
    /// coverage, most recent `indexedAt`.
    async fn aggregate_stats(&self, collection: &str) -> Result<AggregateStats>;

    /// Find points near `seed_ids` whose similarity to at least one seed
    /// exceeds `threshold`, excluding the seeds themselves.
    async fn find_clusters(
        &self,
        collection: &str,
        seed_ids: &[uuid::Uuid],
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<uuid::Uuid>>;

    /// Create `alias` pointing at `collection`. Fails if the alias already
    /// exists; use [`Self::swap_alias`] to redirect an existing one.
    async fn create_alias(&self, alias: &str, collection: &str) -> Result<()>;

    /// Remove `alias`, if present. Leaves the backing collection untouched.
    async fn delete_alias(&self, alias: &str) -> Result<()>;

    /// List every known `(alias, collection)` binding.
    async fn list_aliases(&self) -> Result<Vec<(String, String)>>;
}
