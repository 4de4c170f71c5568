//! Core data model for the code retrieval engine.
//!
//! These are closed record types: the vector database's payload is an open
//! map at the storage boundary, but everywhere else in the crate these
//! structs are what gets passed around. See `providers::vector_store` for
//! the payload <-> struct conversions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A dense embedding vector, fixed width per project.
pub type DenseVector = Vec<f32>;

/// A sparse (lexical/BM25-like) embedding: parallel index/value pairs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SparseVector {
    /// Term indices, in the provider's vocabulary space.
    pub indices: Vec<u32>,
    /// Weight for each index.
    pub values: Vec<f32>,
}

impl SparseVector {
    /// An empty sparse vector.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True if this vector carries no terms.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Kind of a retrievable chunk. Immutable once assigned to a chunk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Source code.
    Code,
    /// Prose documentation (markdown, rst, etc).
    Docs,
    /// Configuration (yaml, toml, json, env, dockerfiles).
    Config,
    /// API/schema contracts (OpenAPI, GraphQL SDL, proto).
    Contracts,
    /// Unrouted chunk kind; not written to a typed collection.
    Unknown,
}

impl ChunkKind {
    /// Collection suffix for this chunk kind (`code`, `docs`, ...).
    pub fn collection_suffix(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Docs => "docs",
            Self::Config => "config",
            Self::Contracts => "contracts",
            Self::Unknown => "unknown",
        }
    }
}

/// Architectural layer a chunk's file appears to belong to, derived from its
/// path. Unlike [`ChunkKind`] this may change across reindexes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// HTTP/RPC/public API surface.
    Api,
    /// Business-logic services.
    Service,
    /// Shared utilities/helpers.
    Util,
    /// Domain/data models.
    Model,
    /// Request middleware/interceptors.
    Middleware,
    /// Test code.
    Test,
    /// Parsers/chunkers.
    Parser,
    /// Type/interface-only modules.
    Types,
    /// Configuration modules.
    Config,
    /// Anything else.
    Other,
}

impl Layer {
    /// Derive a layer from a repository-relative file path using simple
    /// path-component heuristics.
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_lowercase();
        let has = |needle: &str| lower.contains(needle);
        if has("/test/") || has("/tests/") || has("_test.") || has(".test.") || has("/__tests__/")
        {
            Self::Test
        } else if has("/api/") || has("/routes/") || has("/handlers/") || has("/controllers/") {
            Self::Api
        } else if has("/middleware/") || has("/interceptors/") {
            Self::Middleware
        } else if has("/service") || has("/services/") {
            Self::Service
        } else if has("/model") || has("/models/") || has("/entities/") {
            Self::Model
        } else if has("/types/") || has(".d.ts") || has("/interfaces/") {
            Self::Types
        } else if has("/config") || has("/settings/") {
            Self::Config
        } else if has("/parser") || has("/chunking/") || has("/lexer") {
            Self::Parser
        } else if has("/util") || has("/utils/") || has("/helpers/") || has("/lib/") {
            Self::Util
        } else {
            Self::Other
        }
    }
}

/// A unit of retrievable text extracted from a source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Stable identifier, assigned at upsert time.
    pub id: uuid::Uuid,
    /// File this chunk was extracted from, relative path with `/` separators.
    pub file: String,
    /// 1-based inclusive start line.
    pub start_line: u32,
    /// 1-based inclusive end line.
    pub end_line: u32,
    /// Language tag (`"rust"`, `"python"`, ...).
    pub language: String,
    /// Raw content, stored verbatim. Never carries the anchor prefix.
    pub content: String,
    /// Chunk kind; immutable once assigned.
    pub chunk_type: ChunkKind,
    /// Derived architectural layer.
    pub layer: Layer,
    /// Service/class name, if one could be derived from symbols.
    pub service: Option<String>,
    /// Imported identifiers (capped upstream to N).
    pub imports: Vec<String>,
    /// Defined symbols (capped upstream to N).
    pub symbols: Vec<String>,
    /// Index within the originating file (0-based).
    pub chunk_index: u32,
    /// Total chunks produced for the originating file in this run.
    pub total_chunks: u32,
    /// Project this chunk belongs to.
    pub project: String,
    /// When this chunk was (re)indexed.
    pub indexed_at: DateTime<Utc>,
    /// MD5 hex digest of the originating file's content at index time.
    pub file_hash: Option<String>,
    /// Short git commit hash active at index time, if known.
    pub git_commit: Option<String>,
}

/// Kind of a symbol definition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// Function or method.
    Function,
    /// Class.
    Class,
    /// Interface/trait.
    Interface,
    /// Type alias.
    Type,
    /// Enum.
    Enum,
    /// Constant.
    Const,
    /// Variable / field.
    Variable,
}

/// A single exported-or-defined symbol in a file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Symbol {
    /// Symbol name.
    pub name: String,
    /// Symbol kind.
    pub kind: SymbolKind,
    /// Originating file.
    pub file: String,
    /// 1-based inclusive start line.
    pub start_line: u32,
    /// 1-based inclusive end line.
    pub end_line: u32,
    /// Heuristically-extracted signature, capped at 200 characters.
    pub signature: String,
    /// Whether this symbol is exported / publicly visible.
    pub exported: bool,
    /// Project this symbol belongs to.
    pub project: String,
    /// When this symbol was indexed.
    pub indexed_at: DateTime<Utc>,
}

/// Kind of dependency edge between two symbols in two files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    /// Module/file import.
    Import,
    /// Function/method call.
    Call,
    /// Class/struct inheritance.
    Extends,
    /// Interface/trait implementation.
    Implements,
}

/// A directed dependency edge extracted from a file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    /// File the edge originates from.
    pub from_file: String,
    /// Symbol the edge originates from, if known.
    pub from_symbol: Option<String>,
    /// File the edge points to.
    pub to_file: String,
    /// Symbol the edge points to, if known.
    pub to_symbol: Option<String>,
    /// Kind of dependency this edge represents.
    pub edge_type: EdgeType,
    /// Project this edge belongs to.
    pub project: String,
}

impl Edge {
    /// Textual form used to embed the edge for semantic graph search:
    /// `"{fromFile}:{fromSymbol} {edgeType} {toFile}:{toSymbol}"`.
    pub fn to_text(&self) -> String {
        format!(
            "{}:{} {:?} {}:{}",
            self.from_file,
            self.from_symbol.as_deref().unwrap_or("?"),
            self.edge_type,
            self.to_file,
            self.to_symbol.as_deref().unwrap_or("?"),
        )
    }
}

/// Kind of a memory record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    /// An architectural/technical decision.
    Decision,
    /// A non-obvious observation.
    Insight,
    /// Background context for future sessions.
    Context,
    /// A task to be done.
    Todo,
    /// A captured conversation excerpt.
    Conversation,
    /// A free-form note.
    #[default]
    Note,
}

/// Lifecycle status of a todo memory.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    /// Not yet started.
    Pending,
    /// Actively being worked.
    InProgress,
    /// Completed successfully.
    Done,
    /// Abandoned.
    Cancelled,
}

/// One entry in a todo's append-only status history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusHistoryEntry {
    /// Status as of this entry.
    pub status: TodoStatus,
    /// When the transition happened.
    pub at: DateTime<Utc>,
}

/// A durable or quarantined memory record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Memory {
    /// Stable identifier.
    pub id: uuid::Uuid,
    /// Memory type.
    pub memory_type: MemoryType,
    /// Free-form content.
    pub content: String,
    /// Free-form tags used for filtering.
    pub tags: Vec<String>,
    /// Optional related-entity reference (file, symbol, another memory id).
    pub related_to: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Open metadata bag, preserved but never relied upon by the core.
    pub metadata: HashMap<String, serde_json::Value>,
    /// Source tag; `source` values starting with `auto_` route to quarantine.
    pub source: Option<String>,
    /// Confidence in `[0, 1]`, supplied or defaulted.
    pub confidence: Option<f32>,
    /// Whether this memory has been validated (promoted out of quarantine).
    pub validated: bool,
    /// Current status, only meaningful for [`MemoryType::Todo`].
    pub status: Option<TodoStatus>,
    /// Append-only status transition history, only meaningful for todos.
    pub status_history: Vec<StatusHistoryEntry>,
}

impl Memory {
    /// True if this memory's `source` marks it for quarantine routing.
    pub fn is_auto_sourced(&self) -> bool {
        self.source
            .as_deref()
            .is_some_and(|s| s.starts_with("auto_"))
    }
}

/// Reason a quarantined memory is being promoted to durable status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PromoteReason {
    /// A human reviewed and validated the content.
    HumanValidated,
    /// The associated pull request merged.
    PrMerged,
    /// Tests covering the claim passed.
    TestsPassed,
}

/// One entry in the per-project, per-file hash cache used to decide what
/// needs re-embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileHashEntry {
    /// MD5 hex digest of the file's content as of the last index run.
    pub md5: String,
    /// When this file was last (re)indexed.
    pub indexed_at: DateTime<Utc>,
    /// Number of chunks produced for this file in the last index run.
    pub chunk_count: usize,
}

/// Status of an in-progress or completed indexing run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IndexStatus {
    /// No run has started yet.
    Idle,
    /// A run is in progress.
    Indexing,
    /// The last run finished successfully.
    Completed,
    /// The last run ended in error.
    Error,
}

/// Progress/state of a project's indexing runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexProgress {
    /// Current status.
    pub status: IndexStatus,
    /// Total files discovered in the current/last run.
    pub total: usize,
    /// Files processed so far in the current/last run.
    pub processed: usize,
    /// When the current/last run started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the current/last run finished (or last updated, while running).
    pub updated_at: DateTime<Utc>,
    /// Error message from the last run, if it ended in error.
    pub last_error: Option<String>,
}

impl Default for IndexProgress {
    fn default() -> Self {
        Self {
            status: IndexStatus::Idle,
            total: 0,
            processed: 0,
            started_at: None,
            updated_at: Utc::now(),
            last_error: None,
        }
    }
}

/// Outcome of a completed [`crate::indexer::Indexer::index_project`] run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct IndexResult {
    /// Number of files that were (re)indexed this run.
    pub indexed_files: usize,
    /// Number of files removed since the last run.
    pub removed_files: usize,
    /// Total chunks written this run, across all typed collections.
    pub total_chunks: usize,
    /// Chunks skipped due to oversize content or embedding failure.
    pub errors: usize,
}

/// A scored retrieval hit returned from the vector store facade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunk {
    /// The chunk's stable identifier.
    pub id: uuid::Uuid,
    /// The chunk itself.
    pub chunk: Chunk,
    /// Similarity/fused score, not necessarily bounded to `[0, 1]`.
    pub score: f32,
}
