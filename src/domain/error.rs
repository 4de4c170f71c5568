//! Crate-wide error type.
//!
//! One enum carries every failure mode described for the ingestion and
//! retrieval pipeline: missing resources, malformed backend requests,
//! oversize payloads, provider failures, gate timeouts/failures, and the
//! concurrency guard against double-indexing a project.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the code retrieval engine.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// JSON parsing or serialization error.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// A requested resource (collection, point, alias, memory) does not exist.
    ///
    /// Not an error for reads (callers should treat this as "empty"); for
    /// writes it is the trigger to auto-create the missing collection.
    #[error("not found: {resource}")]
    NotFound {
        /// Description of the missing resource.
        resource: String,
    },

    /// The vector database rejected a request shape (e.g. a named-vector
    /// search against a collection that has no matching named vector).
    ///
    /// The facade downgrades once (named vector -> anonymous vector) before
    /// surfacing this.
    #[error("backend rejected request: {message}")]
    BackendBadRequest {
        /// Description of the malformed request.
        message: String,
    },

    /// A chunk exceeded the embeddable size ceiling and was skipped.
    #[error("oversize payload: {detail}")]
    OversizePayload {
        /// Description of what was too large.
        detail: String,
    },

    /// The vector database itself failed (connectivity, backend error).
    #[error("vector database error: {message}")]
    VectorDb {
        /// Description of the vector database failure.
        message: String,
    },

    /// The embedding provider failed to embed text.
    #[error("embedding provider error: {message}")]
    Embedding {
        /// Description of the embedding failure.
        message: String,
    },

    /// The LLM provider failed to complete a prompt.
    #[error("llm provider error: {message}")]
    Llm {
        /// Description of the completion failure.
        message: String,
    },

    /// A subprocess-backed quality gate exceeded its hard timeout.
    ///
    /// Non-blocking: callers report `passed = true` with `"timed out"`
    /// details rather than propagating this variant as a failure. It exists
    /// so gate runners have a typed way to express it.
    #[error("gate '{gate}' timed out after {timeout_secs}s")]
    Timeout {
        /// Name of the gate that timed out.
        gate: String,
        /// The configured timeout, in seconds.
        timeout_secs: u64,
    },

    /// A mandatory quality gate failed; promotion must be aborted.
    #[error("gate '{gate}' failed: {details}")]
    GateFailed {
        /// Name of the failing gate.
        gate: String,
        /// Gate output, truncated to 2000 characters.
        details: String,
    },

    /// An index run was requested for a project that is already indexing.
    #[error("project '{project}' is already indexing")]
    ConcurrentIndex {
        /// The project that rejected the concurrent run.
        project: String,
    },

    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// Catch-all for conditions that do not fit another variant.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Build a [`Error::NotFound`].
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Build a [`Error::BackendBadRequest`].
    pub fn backend_bad_request<S: Into<String>>(message: S) -> Self {
        Self::BackendBadRequest {
            message: message.into(),
        }
    }

    /// Build a [`Error::OversizePayload`].
    pub fn oversize<S: Into<String>>(detail: S) -> Self {
        Self::OversizePayload {
            detail: detail.into(),
        }
    }

    /// Build a [`Error::VectorDb`].
    pub fn vector_db<S: Into<String>>(message: S) -> Self {
        Self::VectorDb {
            message: message.into(),
        }
    }

    /// Build a [`Error::Embedding`].
    pub fn embedding<S: Into<String>>(message: S) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Build a [`Error::Llm`].
    pub fn llm<S: Into<String>>(message: S) -> Self {
        Self::Llm {
            message: message.into(),
        }
    }

    /// Build a [`Error::GateFailed`], truncating details to 2000 chars.
    pub fn gate_failed<S: Into<String>, D: Into<String>>(gate: S, details: D) -> Self {
        let mut details = details.into();
        if details.len() > 2000 {
            details.truncate(2000);
        }
        Self::GateFailed {
            gate: gate.into(),
            details,
        }
    }

    /// Build a [`Error::ConcurrentIndex`].
    pub fn concurrent_index<S: Into<String>>(project: S) -> Self {
        Self::ConcurrentIndex {
            project: project.into(),
        }
    }

    /// Build a [`Error::Config`].
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Build a [`Error::Internal`].
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for errors that mean "treat this read as empty" rather than a
    /// hard failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

impl From<qdrant_client::QdrantError> for Error {
    fn from(err: qdrant_client::QdrantError) -> Self {
        Self::VectorDb {
            message: err.to_string(),
        }
    }
}
