//! Qdrant-backed [`VectorStoreProvider`].
//!
//! Named dense+sparse vectors, payload field indexes, atomic alias swap,
//! scalar quantization, and snapshots are all exposed by a single client
//! through the `qdrant-client` crate — see `DESIGN.md` for the grounding
//! note on this choice of backend.

use crate::domain::error::{Error, Result};
use crate::domain::ports::vector_store::{
    AggregateStats, DuplicateGroup, FusedHit, GroupedHits, RecommendRequest, SearchRequest,
    VectorStoreProvider,
};
use crate::domain::types::{Chunk, DenseVector, ScoredChunk, SparseVector};
use async_trait::async_trait;
use qdrant_client::qdrant::{
    quantization_config, AliasOperations, Condition, CountPointsBuilder, CreateAlias,
    CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, DeleteAlias, DeleteCollection,
    DeletePointsBuilder, DeleteSnapshotBuilder, Distance, FieldType, Filter, GetPointsBuilder,
    NamedVectors, PointId, PointStruct, PointsIdsList, PointsSelector, QuantizationConfig,
    QuantizationType, RecommendPointsBuilder, RecoverSnapshotBuilder, ScalarQuantization,
    ScoredPoint, ScrollPointsBuilder, SearchGroupsPointsBuilder, SearchPointsBuilder,
    SparseVectorParamsBuilder, SparseVectorsConfig, UpdateAliasesBuilder, UpdateCollectionBuilder,
    UpsertPointsBuilder, Vector, Vectors, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use futures::future::join_all;
use std::collections::HashMap;

const DENSE_VECTOR_NAME: &str = "dense";
const SPARSE_VECTOR_NAME: &str = "sparse";
const RRF_K: f32 = 60.0;
const PAYLOAD_INDEX_FIELDS: &[&str] = &[
    "language", "file", "chunk_type", "project", "source", "validated", "symbols", "layer",
    "service", "git_commit",
];

/// Qdrant gRPC-backed vector store.
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    /// Connect to a Qdrant instance at `url` (e.g. `http://localhost:6334`).
    pub fn connect(url: &str) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| Error::vector_db(format!("failed to build qdrant client: {e}")))?;
        Ok(Self { client })
    }
}

fn chunk_payload(chunk: &Chunk) -> HashMap<String, qdrant_client::qdrant::Value> {
    let value = serde_json::to_value(chunk).unwrap_or_default();
    let mut payload = HashMap::new();
    if let serde_json::Value::Object(map) = value {
        for (k, v) in map {
            payload.insert(k, json_to_qdrant_value(v));
        }
    }
    payload
}

fn json_to_qdrant_value(v: serde_json::Value) -> qdrant_client::qdrant::Value {
    use qdrant_client::qdrant::value::Kind;
    let kind = match v {
        serde_json::Value::String(s) => Kind::StringValue(s),
        serde_json::Value::Bool(b) => Kind::BoolValue(b),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(Kind::DoubleValue)
            .unwrap_or(Kind::NullValue(0)),
        serde_json::Value::Null => Kind::NullValue(0),
        other => Kind::StringValue(other.to_string()),
    };
    qdrant_client::qdrant::Value { kind: Some(kind) }
}

fn payload_to_chunk(payload: &HashMap<String, qdrant_client::qdrant::Value>) -> Option<Chunk> {
    let mut map = serde_json::Map::new();
    for (k, v) in payload {
        if let Some(kind) = &v.kind {
            use qdrant_client::qdrant::value::Kind;
            let jv = match kind {
                Kind::StringValue(s) => serde_json::Value::String(s.clone()),
                Kind::BoolValue(b) => serde_json::Value::Bool(*b),
                Kind::DoubleValue(d) => serde_json::json!(d),
                Kind::IntegerValue(i) => serde_json::json!(i),
                _ => continue,
            };
            map.insert(k.clone(), jv);
        }
    }
    serde_json::from_value(serde_json::Value::Object(map)).ok()
}

fn build_filter(filter: &HashMap<String, String>) -> Filter {
    let conditions: Vec<Condition> = filter
        .iter()
        .map(|(field, value)| Condition::matches(field.as_str(), value.clone()))
        .collect();
    Filter::must(conditions)
}

fn is_bad_request(e: &qdrant_client::QdrantError) -> bool {
    let msg = e.to_string();
    msg.contains("400") || msg.contains("Bad Request")
}

#[async_trait]
impl VectorStoreProvider for QdrantVectorStore {
    async fn ensure_collection(&self, collection: &str, dense_size: usize, sparse: bool) -> Result<()> {
        if self.client.collection_exists(collection).await? {
            return Ok(());
        }

        let mut builder = CreateCollectionBuilder::new(collection).vectors_config(
            NamedVectors::default()
                .add(DENSE_VECTOR_NAME, VectorParamsBuilder::new(dense_size as u64, Distance::Cosine)),
        );

        if sparse {
            builder = builder.sparse_vectors_config(SparseVectorsConfig::from([(
                SPARSE_VECTOR_NAME.to_string(),
                SparseVectorParamsBuilder::default().build(),
            )]));
        }

        self.client.create_collection(builder).await?;

        for field in PAYLOAD_INDEX_FIELDS {
            self.ensure_payload_index(collection, field).await?;
        }
        Ok(())
    }

    async fn ensure_payload_index(&self, collection: &str, field: &str) -> Result<()> {
        let result = self
            .client
            .create_field_index(CreateFieldIndexCollectionBuilder::new(collection, field, FieldType::Keyword))
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("already exists") => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn upsert(&self, collection: &str, chunks: &[(Chunk, DenseVector, Option<SparseVector>)]) -> Result<()> {
        if !self.client.collection_exists(collection).await? {
            return Err(Error::not_found(format!("collection {collection}")));
        }

        for batch in chunks.chunks(100) {
            let points: Vec<PointStruct> = batch
                .iter()
                .map(|(chunk, dense, _sparse)| {
                    PointStruct::new(
                        PointId::from(chunk.id.to_string()),
                        Vectors::from(Vector::new_dense(dense.clone())),
                        chunk_payload(chunk),
                    )
                })
                .collect();
            self.client
                .upsert_points(UpsertPointsBuilder::new(collection, points))
                .await?;
        }
        Ok(())
    }

    async fn delete_by_file(&self, collection: &str, file_path: &str) -> Result<usize> {
        let filter_map = HashMap::from([("file".to_string(), file_path.to_string())]);
        let before = self.count(collection, Some(&filter_map)).await?;
        let filter = build_filter(&filter_map);
        self.client
            .delete_points(DeletePointsBuilder::new(collection).points(PointsSelector::from(filter)))
            .await?;
        Ok(before)
    }

    async fn delete_by_ids(&self, collection: &str, ids: &[uuid::Uuid]) -> Result<usize> {
        let ids_list: Vec<PointId> = ids.iter().map(|id| PointId::from(id.to_string())).collect();
        let n = ids_list.len();
        self.client
            .delete_points(DeletePointsBuilder::new(collection).points(PointsSelector::from(PointsIdsList {
                ids: ids_list,
            })))
            .await?;
        Ok(n)
    }

    async fn search(&self, request: SearchRequest) -> Result<Vec<FusedHit>> {
        let filter = build_filter(&request.filter);

        let dense_result: Vec<ScoredPoint> = if let Some(dense) = request.dense.clone() {
            let builder = SearchPointsBuilder::new(&request.collection, dense.clone(), request.limit as u64)
                .vector_name(DENSE_VECTOR_NAME)
                .filter(filter.clone())
                .with_payload(true);
            match self.client.search_points(builder).await {
                Ok(r) => r.result,
                Err(e) if is_bad_request(&e) => {
                    // Collection has a single anonymous vector rather than a
                    // named "dense" one; retry without the vector name.
                    let fallback = SearchPointsBuilder::new(&request.collection, dense, request.limit as u64)
                        .filter(filter.clone())
                        .with_payload(true);
                    self.client.search_points(fallback).await?.result
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            Vec::new()
        };

        // A sparse search errors (rather than returning empty) when the
        // collection has no sparse field at all; that degrades to dense-only.
        let sparse_result: Vec<ScoredPoint> = if let Some(sparse) = request.sparse.clone() {
            let vector = Vector::new_sparse(sparse.indices, sparse.values);
            let builder = SearchPointsBuilder::new(&request.collection, vector, request.limit as u64)
                .vector_name(SPARSE_VECTOR_NAME)
                .filter(filter)
                .with_payload(true);
            self.client
                .search_points(builder)
                .await
                .map(|r| r.result)
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        if dense_result.is_empty() && sparse_result.is_empty() {
            return Ok(Vec::new());
        }

        let both_present = !dense_result.is_empty() && !sparse_result.is_empty();
        let mut chunks: HashMap<String, Chunk> = HashMap::new();
        let mut dense_rank: HashMap<String, usize> = HashMap::new();
        let mut sparse_rank: HashMap<String, usize> = HashMap::new();
        let mut raw_score: HashMap<String, f32> = HashMap::new();

        for (rank, point) in dense_result.into_iter().enumerate() {
            if let Some(chunk) = payload_to_chunk(&point.payload) {
                let key = chunk.id.to_string();
                dense_rank.insert(key.clone(), rank);
                raw_score.entry(key.clone()).or_insert(point.score);
                chunks.insert(key, chunk);
            }
        }
        for (rank, point) in sparse_result.into_iter().enumerate() {
            if let Some(chunk) = payload_to_chunk(&point.payload) {
                let key = chunk.id.to_string();
                sparse_rank.insert(key.clone(), rank);
                raw_score.entry(key.clone()).or_insert(point.score);
                chunks.entry(key).or_insert(chunk);
            }
        }

        let mut hits: Vec<FusedHit> = chunks
            .into_iter()
            .map(|(key, chunk)| {
                let d_rank = dense_rank.get(&key).copied();
                let s_rank = sparse_rank.get(&key).copied();
                let score = if both_present {
                    let mut s = 0.0f32;
                    if let Some(r) = d_rank {
                        s += 1.0 / (RRF_K + r as f32 + 1.0);
                    }
                    if let Some(r) = s_rank {
                        s += 1.0 / (RRF_K + r as f32 + 1.0);
                    }
                    s
                } else {
                    raw_score.get(&key).copied().unwrap_or(0.0)
                };
                FusedHit {
                    chunk: ScoredChunk { id: chunk.id, chunk, score },
                    dense_rank: d_rank,
                    sparse_rank: s_rank,
                }
            })
            .collect();

        if let Some(threshold) = request.score_threshold {
            hits.retain(|h| h.chunk.score >= threshold);
        }
        hits.sort_by(|a, b| b.chunk.score.partial_cmp(&a.chunk.score).unwrap_or(std::cmp::Ordering::Equal));
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
        let Some(dense) = request.dense else {
            return Ok(Vec::new());
        };
        let filter = build_filter(&request.filter);
        let builder = SearchGroupsPointsBuilder::new(&request.collection, dense, group_by, group_limit as u32)
            .limit(groups as u32)
            .filter(filter)
            .with_payload(true);

        let response = self.client.search_groups(builder).await?;
        let grouped = response
            .result
            .map(|r| {
                r.groups
                    .into_iter()
                    .filter_map(|g| {
                        let hits: Vec<ScoredChunk> = g
                            .hits
                            .into_iter()
                            .filter_map(|p| payload_to_chunk(&p.payload).map(|chunk| ScoredChunk { id: chunk.id, chunk, score: p.score }))
                            .collect();
                        if hits.is_empty() {
                            return None;
                        }
                        Some(GroupedHits {
                            group_key: g.id.map(|id| format!("{id:?}")).unwrap_or_default(),
                            hits,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(grouped)
    }

    async fn recommend(&self, request: RecommendRequest) -> Result<Vec<ScoredChunk>> {
        let positive: Vec<PointId> = request.positive.iter().map(|id| PointId::from(id.to_string())).collect();
        let negative: Vec<PointId> = request.negative.iter().map(|id| PointId::from(id.to_string())).collect();

        let builder = RecommendPointsBuilder::new(&request.collection, request.limit as u64)
            .add_positive(positive)
            .add_negative(negative)
            .with_payload(true);

        let response = self.client.recommend(builder).await?;
        Ok(response
            .result
            .into_iter()
            .filter_map(|p| payload_to_chunk(&p.payload).map(|chunk| ScoredChunk { id: chunk.id, chunk, score: p.score }))
            .collect())
    }

    async fn scroll(&self, collection: &str, page_size: usize, offset: Option<uuid::Uuid>) -> Result<(Vec<Chunk>, Option<uuid::Uuid>)> {
        let page_size = page_size.min(100).max(1);
        let mut builder = ScrollPointsBuilder::new(collection).limit(page_size as u32).with_payload(true);
        if let Some(id) = offset {
            builder = builder.offset(PointId::from(id.to_string()));
        }

        let response = self.client.scroll(builder).await?;
        let chunks: Vec<Chunk> = response.result.iter().filter_map(payload_to_chunk).collect();
        let next = response.next_page_offset.and_then(|id| match id.point_id_options {
            Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(u)) => uuid::Uuid::parse_str(&u).ok(),
            _ => None,
        });
        Ok((chunks, next))
    }

    async fn find_duplicates(&self, collection: &str, threshold: f32) -> Result<Vec<DuplicateGroup>> {
        const SAMPLE_LIMIT: usize = 1_000;
        let mut sample: Vec<(uuid::Uuid, DenseVector)> = Vec::new();
        let mut offset: Option<PointId> = None;

        while sample.len() < SAMPLE_LIMIT {
            let mut builder = ScrollPointsBuilder::new(collection).limit(100).with_vectors(true);
            if let Some(id) = offset.take() {
                builder = builder.offset(id);
            }
            let response = self.client.scroll(builder).await?;
            if response.result.is_empty() {
                break;
            }
            for point in &response.result {
                let Some(id) = point_id_to_uuid(&point.id) else { continue };
                let Some(vector) = named_dense_vector(&point.vectors) else { continue };
                sample.push((id, vector));
            }
            offset = response.next_page_offset;
            if offset.is_none() {
                break;
            }
        }

        let mut groups = Vec::new();
        let mut assigned = vec![false; sample.len()];
        for i in 0..sample.len() {
            if assigned[i] {
                continue;
            }
            let mut members = vec![sample[i].0];
            let mut best = 0.0f32;
            for j in (i + 1)..sample.len() {
                if assigned[j] {
                    continue;
                }
                let sim = cosine(&sample[i].1, &sample[j].1);
                if sim >= threshold {
                    members.push(sample[j].0);
                    assigned[j] = true;
                    best = best.max(sim);
                }
            }
            if members.len() > 1 {
                assigned[i] = true;
                groups.push(DuplicateGroup { chunk_ids: members, similarity: best });
            }
        }
        Ok(groups)
    }

    async fn swap_alias(&self, alias: &str, collection: &str) -> Result<()> {
        let mut ops = Vec::new();
        if self.resolve_alias(alias).await?.is_some() {
            ops.push(AliasOperations::from(DeleteAlias { alias_name: alias.to_string() }));
        }
        ops.push(AliasOperations::from(CreateAlias {
            collection_name: collection.to_string(),
            alias_name: alias.to_string(),
        }));

        self.client
            .update_aliases(UpdateAliasesBuilder::new(ops))
            .await?;
        Ok(())
    }

    async fn resolve_alias(&self, alias: &str) -> Result<Option<String>> {
        let aliases = self.client.list_collection_aliases(alias).await;
        match aliases {
            Ok(resp) => Ok(resp.aliases.into_iter().next().map(|a| a.collection_name)),
            Err(_) => Ok(None),
        }
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        self.client
            .delete_collection(DeleteCollection { collection_name: collection.to_string(), timeout: None })
            .await?;
        Ok(())
    }

    async fn enable_quantization(&self, collection: &str) -> Result<()> {
        let quantization_config = QuantizationConfig {
            quantization: Some(quantization_config::Quantization::Scalar(ScalarQuantization {
                r#type: QuantizationType::Int8.into(),
                quantile: Some(0.99),
                always_ram: Some(true),
            })),
        };
        self.client
            .update_collection(
                UpdateCollectionBuilder::new(collection).quantization_config(quantization_config),
            )
            .await?;
        Ok(())
    }

    async fn disable_quantization(&self, collection: &str) -> Result<()> {
        self.client
            .update_collection(UpdateCollectionBuilder::new(collection).quantization_config(
                QuantizationConfig { quantization: None },
            ))
            .await?;
        Ok(())
    }

    async fn snapshot(&self, collection: &str) -> Result<String> {
        let response = self.client.create_snapshot(collection).await?;
        Ok(response
            .snapshot_description
            .map(|d| d.name)
            .unwrap_or_else(|| format!("{collection}-snapshot")))
    }

    async fn list_snapshots(&self, collection: &str) -> Result<Vec<String>> {
        let response = self.client.list_snapshots(collection).await?;
        Ok(response.snapshot_descriptions.into_iter().map(|d| d.name).collect())
    }

    async fn delete_snapshot(&self, collection: &str, snapshot: &str) -> Result<()> {
        self.client
            .delete_snapshot(DeleteSnapshotBuilder::new(collection, snapshot))
            .await?;
        Ok(())
    }

    async fn recover_snapshot(&self, collection: &str, snapshot: &str) -> Result<()> {
        let location = format!("file:///qdrant/snapshots/{collection}/{snapshot}");
        self.client
            .recover_snapshot(RecoverSnapshotBuilder::new(collection, location))
            .await?;
        Ok(())
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        Ok(self.client.collection_exists(collection).await?)
    }

    async fn count(&self, collection: &str, filter: Option<&HashMap<String, String>>) -> Result<usize> {
        let empty = HashMap::new();
        let filter = build_filter(filter.unwrap_or(&empty));
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).filter(filter))
            .await?;
        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }

    async fn delete_by_filter(&self, collection: &str, filter: &HashMap<String, String>) -> Result<usize> {
        let before = self.count(collection, Some(filter)).await?;
        let qfilter = build_filter(filter);
        self.client
            .delete_points(DeletePointsBuilder::new(collection).points(PointsSelector::from(qfilter)))
            .await?;
        Ok(before)
    }

    async fn facet_counts(
        &self,
        collection: &str,
        field: &str,
        candidate_values: &[String],
    ) -> Result<Vec<(String, usize)>> {
        let counts = join_all(candidate_values.iter().map(|value| async move {
            let mut filter = HashMap::new();
            filter.insert(field.to_string(), value.clone());
            self.count(collection, Some(&filter)).await.unwrap_or(0)
        }))
        .await;
        Ok(candidate_values.iter().cloned().zip(counts).collect())
    }

    async fn aggregate_stats(&self, collection: &str) -> Result<AggregateStats> {
        const SCAN_CAP: usize = 5_000;
        let total = self.count(collection, None).await?;

        let mut by_language: HashMap<String, usize> = HashMap::new();
        let mut files: std::collections::HashSet<String> = std::collections::HashSet::new();
        let mut most_recent = None;
        let mut scanned = 0usize;
        let mut offset: Option<PointId> = None;

        loop {
            if scanned >= SCAN_CAP {
                break;
            }
            let mut builder = ScrollPointsBuilder::new(collection).limit(200).with_payload(true);
            if let Some(id) = offset.take() {
                builder = builder.offset(id);
            }
            let response = self.client.scroll(builder).await?;
            if response.result.is_empty() {
                break;
            }
            for point in &response.result {
                if let Some(chunk) = payload_to_chunk(&point.payload) {
                    *by_language.entry(chunk.language.clone()).or_insert(0) += 1;
                    files.insert(chunk.file.clone());
                    most_recent = match most_recent {
                        Some(t) if t >= chunk.indexed_at => most_recent,
                        _ => Some(chunk.indexed_at),
                    };
                }
                scanned += 1;
            }
            offset = response.next_page_offset;
            if offset.is_none() {
                break;
            }
        }

        let truncated = total > scanned;
        let unique_files = if truncated && scanned > 0 {
            (files.len() as f64 * (total as f64 / scanned as f64)).round() as usize
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
        if seed_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<PointId> = seed_ids.iter().map(|id| PointId::from(id.to_string())).collect();
        let response = self
            .client
            .get_points(GetPointsBuilder::new(collection, ids).with_vectors(true))
            .await?;

        let seed_vectors: Vec<DenseVector> = response
            .result
            .iter()
            .filter_map(|p| named_dense_vector(&p.vectors))
            .collect();
        if seed_vectors.is_empty() {
            return Ok(Vec::new());
        }

        let mut found: HashMap<uuid::Uuid, f32> = HashMap::new();
        for seed_vector in &seed_vectors {
            let builder = SearchPointsBuilder::new(collection, seed_vector.clone(), (limit * 2) as u64)
                .vector_name(DENSE_VECTOR_NAME)
                .score_threshold(threshold)
                .with_payload(true);
            let hits = self.client.search_points(builder).await?.result;
            for hit in hits {
                let Some(chunk) = payload_to_chunk(&hit.payload) else { continue };
                if seed_ids.contains(&chunk.id) {
                    continue;
                }
                let best = found.entry(chunk.id).or_insert(0.0);
                if hit.score > *best {
                    *best = hit.score;
                }
            }
        }

        let mut hits: Vec<(uuid::Uuid, f32)> = found.into_iter().collect();
        hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits.into_iter().map(|(id, _)| id).collect())
    }

    async fn create_alias(&self, alias: &str, collection: &str) -> Result<()> {
        if self.resolve_alias(alias).await?.is_some() {
            return Err(Error::backend_bad_request(format!("alias '{alias}' already exists")));
        }
        self.client
            .update_aliases(UpdateAliasesBuilder::new(vec![AliasOperations::from(CreateAlias {
                collection_name: collection.to_string(),
                alias_name: alias.to_string(),
            })]))
            .await?;
        Ok(())
    }

    async fn delete_alias(&self, alias: &str) -> Result<()> {
        self.client
            .update_aliases(UpdateAliasesBuilder::new(vec![AliasOperations::from(DeleteAlias {
                alias_name: alias.to_string(),
            })]))
            .await?;
        Ok(())
    }

    async fn list_aliases(&self) -> Result<Vec<(String, String)>> {
        let response = self.client.list_aliases().await?;
        Ok(response
            .aliases
            .into_iter()
            .map(|a| (a.alias_name, a.collection_name))
            .collect())
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

fn point_id_to_uuid(id: &Option<PointId>) -> Option<uuid::Uuid> {
    match id.as_ref()?.point_id_options.as_ref()? {
        qdrant_client::qdrant::point_id::PointIdOptions::Uuid(u) => uuid::Uuid::parse_str(u).ok(),
        _ => None,
    }
}

fn named_dense_vector(vectors: &Option<Vectors>) -> Option<DenseVector> {
    let vectors_options = vectors.as_ref()?.vectors_options.as_ref()?;
    match vectors_options {
        qdrant_client::qdrant::vectors::VectorsOptions::Vector(v) => Some(v.data.clone()),
        qdrant_client::qdrant::vectors::VectorsOptions::Vectors(named) => named
            .vectors
            .get(DENSE_VECTOR_NAME)
            .map(|v| v.data.clone()),
    }
}
