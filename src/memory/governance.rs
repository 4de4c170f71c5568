//! `promote`/`reject` over quarantined memories (component C12).

use super::service::MemoryStore;
use crate::collection;
use crate::domain::error::{Error, Result};
use crate::domain::types::{Memory, PromoteReason};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of a quality-gate run, as far as memory governance needs it.
/// Implemented by [`crate::gates::QualityGates`].
#[async_trait]
pub trait GateRunner: Send + Sync {
    /// Run every required quality gate for `project`, returning whether
    /// they all passed and a joined details string for the failing ones.
    async fn run_gates(&self, project: &str, project_path: &Path, affected_files: &[String]) -> Result<GateOutcome>;
}

/// Pass/fail summary a [`GateRunner`] hands back to [`MemoryGovernance`].
#[derive(Debug, Clone)]
pub struct GateOutcome {
    /// Whether every required gate passed.
    pub passed: bool,
    /// Joined failure details, empty when `passed`.
    pub details: String,
}

/// Options controlling whether `promote` runs quality gates first.
#[derive(Debug, Clone, Default)]
pub struct PromoteOptions {
    /// Run quality gates before promoting.
    pub run_gates: bool,
    /// Project root, required when `run_gates` is set.
    pub project_path: Option<PathBuf>,
    /// Files to scope typecheck/test gates to.
    pub affected_files: Vec<String>,
}

/// `promote`/`reject` governance over [`super::service::MemoryStore`]'s
/// quarantine pool.
pub struct MemoryGovernance {
    store: Arc<MemoryStore>,
    gate_runner: Option<Arc<dyn GateRunner>>,
}

impl MemoryGovernance {
    /// Build governance over `store`, without gate enforcement.
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store, gate_runner: None }
    }

    /// Attach a gate runner, required for any `promote` call that sets
    /// `PromoteOptions::run_gates`.
    pub fn with_gate_runner(mut self, gate_runner: Arc<dyn GateRunner>) -> Self {
        self.gate_runner = Some(gate_runner);
        self
    }

    /// Promote a quarantined memory to durable status.
    ///
    /// 1. If `opts.run_gates`, invoke quality gates; any mandatory failure
    ///    raises [`Error::GateFailed`] with joined details.
    /// 2. Locate the quarantined point by `id`.
    /// 3. Delete it from quarantine; insert a new durable memory carrying
    ///    promotion metadata.
    /// 4. Return the new durable memory.
    pub async fn promote(
        &self,
        project: &str,
        id: Uuid,
        reason: PromoteReason,
        evidence: Option<String>,
        opts: PromoteOptions,
    ) -> Result<Memory> {
        if opts.run_gates {
            let runner = self
                .gate_runner
                .as_ref()
                .ok_or_else(|| Error::config("promote requested run_gates but no GateRunner is configured"))?;
            let project_path = opts
                .project_path
                .as_deref()
                .ok_or_else(|| Error::config("promote requested run_gates but no project_path was given"))?;
            let outcome = runner.run_gates(project, project_path, &opts.affected_files).await?;
            if !outcome.passed {
                return Err(Error::gate_failed("quality_gates", outcome.details));
            }
        }

        let mut memory = self
            .store
            .find_in(collection::MEMORY_PENDING_SUFFIX, project, id)
            .await?
            .ok_or_else(|| Error::not_found(format!("quarantined memory '{id}'")))?;

        let original_source = memory.source.clone();
        let original_confidence = memory.confidence;

        memory.validated = true;
        memory.updated_at = Utc::now();
        memory.metadata.insert("promotedAt".to_string(), json!(memory.updated_at.to_rfc3339()));
        memory.metadata.insert("promoteReason".to_string(), json!(reason));
        memory.metadata.insert("promoteEvidence".to_string(), json!(evidence));
        memory.metadata.insert("originalSource".to_string(), json!(original_source));
        memory.metadata.insert("originalConfidence".to_string(), json!(original_confidence));

        self.store.remove_from(collection::MEMORY_PENDING_SUFFIX, project, id).await?;
        self.store.upsert_into(collection::MEMORY_SUFFIX, project, &memory).await?;

        Ok(memory)
    }

    /// Delete a quarantined memory. Best-effort: a missing id is not an error.
    pub async fn reject(&self, project: &str, id: Uuid) -> Result<()> {
        self.store.remove_from(collection::MEMORY_PENDING_SUFFIX, project, id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::service::{IngestRequest, MemoryService};
    use crate::providers::embedding::hashing::HashingEmbeddingProvider;
    use crate::providers::vector_store::memory::InMemoryVectorStore;
    use crate::domain::types::MemoryType;

    fn setup() -> (MemoryService, MemoryGovernance) {
        let store = Arc::new(MemoryStore::new(
            Arc::new(HashingEmbeddingProvider::new(32)),
            Arc::new(InMemoryVectorStore::new()),
        ));
        (MemoryService::new(store.clone()), MemoryGovernance::new(store))
    }

    #[tokio::test]
    async fn promote_moves_a_memory_from_quarantine_to_durable() {
        let (service, governance) = setup();
        let memory = service
            .ingest(
                "demo",
                IngestRequest {
                    memory_type: MemoryType::Insight,
                    content: "flaky test in checkout flow".to_string(),
                    source: Some("auto_agent".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let promoted = governance
            .promote("demo", memory.id, PromoteReason::HumanValidated, Some("reviewed in PR #42".to_string()), PromoteOptions::default())
            .await
            .unwrap();

        assert!(promoted.validated);
        assert!(service.recall_quarantine("demo", "flaky test", None, None, 10).await.unwrap().is_empty());
        assert_eq!(service.recall_durable("demo", "flaky test", None, None, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn promoting_an_unknown_id_fails_cleanly() {
        let (_, governance) = setup();
        let result = governance.promote("demo", Uuid::new_v4(), PromoteReason::TestsPassed, None, PromoteOptions::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn reject_is_best_effort_for_a_missing_id() {
        let (_, governance) = setup();
        assert!(governance.reject("demo", Uuid::new_v4()).await.is_ok());
    }
}
