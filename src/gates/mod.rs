//! Quality Gates (component C13): `typecheck`, `test`, and `blast_radius`,
//! run ahead of a memory promotion or on demand.
//!
//! `typecheck` and `test` shell out to the project's own toolchain (`tsc`,
//! the detected JS test runner) under a hard timeout rather than
//! reimplementing a type-checker or test runner in-process. A timeout is
//! reported as a passing, non-blocking gate rather than a failure.

use crate::domain::error::Result;
use crate::graph_store::GraphStore;
use crate::memory::governance::{GateOutcome, GateRunner};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, warn};

const TYPECHECK_TIMEOUT_SECS: u64 = 30;
const TEST_TIMEOUT_SECS: u64 = 60;
const MAX_BLAST_RADIUS: usize = 20;
const MAX_DETAILS_CHARS: usize = 2000;
const TIMED_OUT_DETAILS: &str = "timed out";

/// Name of an individual gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateName {
    /// `tsc --noEmit` against the project's TypeScript manifest.
    Typecheck,
    /// The project's detected JS test runner.
    Test,
    /// Files transitively affected by `affected_files`, via the graph store.
    BlastRadius,
}

impl std::fmt::Display for GateName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GateName::Typecheck => "typecheck",
            GateName::Test => "test",
            GateName::BlastRadius => "blast_radius",
        };
        f.write_str(s)
    }
}

/// Result of a single gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    /// Which gate ran.
    pub gate: GateName,
    /// Whether the gate passed.
    pub passed: bool,
    /// Human-readable details, truncated to 2000 chars.
    pub details: String,
    /// Wall-clock runtime of the gate.
    pub duration_ms: u64,
}

/// Options controlling which gates `run_gates` runs and what scope they use.
#[derive(Debug, Clone, Default)]
pub struct RunGatesRequest {
    /// Project name, used to scope the `blast_radius` graph lookup.
    pub project: String,
    /// Project root, used to locate manifests and spawn subprocesses.
    pub project_path: PathBuf,
    /// Files to scope typecheck/test/blast-radius to; empty means unscoped.
    pub affected_files: Vec<String>,
    /// Gate names to skip entirely.
    pub skip: Vec<GateName>,
}

impl RunGatesRequest {
    /// Build a request running every gate, unscoped.
    pub fn new(project: impl Into<String>, project_path: impl Into<PathBuf>) -> Self {
        Self { project: project.into(), project_path: project_path.into(), affected_files: Vec::new(), skip: Vec::new() }
    }
}

/// Full report from a `run_gates` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatesReport {
    /// One result per gate that ran.
    pub results: Vec<GateResult>,
    /// `AND` of every *required* gate's `passed` (`blast_radius` is informational
    /// and is excluded from this reduction even though its result is carried above).
    pub passed: bool,
}

/// Runs the `typecheck`, `test`, and `blast_radius` gates.
pub struct QualityGates {
    graph_store: Arc<GraphStore>,
}

impl QualityGates {
    /// Build gates backed by `graph_store` for the `blast_radius` check.
    pub fn new(graph_store: Arc<GraphStore>) -> Self {
        Self { graph_store }
    }

    /// Run every gate not listed in `request.skip`, in order
    /// typecheck, test, blast_radius.
    pub async fn run_gates(&self, request: &RunGatesRequest) -> Result<GatesReport> {
        let mut results = Vec::with_capacity(3);

        if !request.skip.contains(&GateName::Typecheck) {
            results.push(self.typecheck(&request.project_path, &request.affected_files).await);
        }
        if !request.skip.contains(&GateName::Test) {
            results.push(self.test(&request.project_path, &request.affected_files).await);
        }
        if !request.skip.contains(&GateName::BlastRadius) {
            results.push(self.blast_radius(&request.project, &request.affected_files).await);
        }

        let passed = results.iter().filter(|r| r.gate != GateName::BlastRadius).all(|r| r.passed);

        for r in &results {
            info!(gate = %r.gate, passed = r.passed, duration_ms = r.duration_ms, "quality gate ran");
        }

        Ok(GatesReport { results, passed })
    }

    async fn typecheck(&self, project_path: &Path, affected_files: &[String]) -> GateResult {
        let start = Instant::now();

        if !has_typescript_manifest(project_path) {
            return GateResult {
                gate: GateName::Typecheck,
                passed: true,
                details: "no TypeScript manifest found, skipped".to_string(),
                duration_ms: elapsed_ms(start),
            };
        }

        let outcome = run_with_timeout(
            Command::new("tsc").arg("--noEmit").current_dir(project_path),
            Duration::from_secs(TYPECHECK_TIMEOUT_SECS),
        )
        .await;

        let (passed, details) = match outcome {
            SpawnOutcome::TimedOut => (true, TIMED_OUT_DETAILS.to_string()),
            SpawnOutcome::Finished { success, output } => {
                (success, filter_to_affected(&output, affected_files))
            }
            SpawnOutcome::SpawnFailed(err) => (true, format!("tsc not runnable: {err}")),
        };

        GateResult { gate: GateName::Typecheck, passed, details: truncate(details), duration_ms: elapsed_ms(start) }
    }

    async fn test(&self, project_path: &Path, affected_files: &[String]) -> GateResult {
        let start = Instant::now();

        let Some(runner) = detect_test_runner(project_path) else {
            return GateResult {
                gate: GateName::Test,
                passed: true,
                details: "no test runner detected, skipped".to_string(),
                duration_ms: elapsed_ms(start),
            };
        };

        let mut cmd = Command::new("npx");
        cmd.current_dir(project_path);
        cmd.arg(runner.binary);
        if !affected_files.is_empty() {
            cmd.arg(runner.related_flag);
            cmd.args(affected_files);
        }

        let outcome = run_with_timeout(&mut cmd, Duration::from_secs(TEST_TIMEOUT_SECS)).await;

        let (passed, details) = match outcome {
            SpawnOutcome::TimedOut => (true, TIMED_OUT_DETAILS.to_string()),
            SpawnOutcome::Finished { success, output } => (success, output),
            SpawnOutcome::SpawnFailed(err) => (true, format!("{} not runnable: {err}", runner.binary)),
        };

        GateResult { gate: GateName::Test, passed, details: truncate(details), duration_ms: elapsed_ms(start) }
    }

    async fn blast_radius(&self, project: &str, affected_files: &[String]) -> GateResult {
        let start = Instant::now();
        let radius = match self.graph_store.blast_radius(project, affected_files, 3).await {
            Ok(radius) => radius,
            Err(e) => {
                return GateResult {
                    gate: GateName::BlastRadius,
                    passed: true,
                    details: truncate(format!("blast radius lookup failed: {e}")),
                    duration_ms: elapsed_ms(start),
                };
            }
        };
        let affected = radius.affected_files.len();
        let passed = affected <= MAX_BLAST_RADIUS;

        let details = serde_json::json!({
            "affected_files": radius.affected_files,
            "depth_reached": radius.depth_reached,
            "edges_traversed": radius.edges_traversed,
            "warning": if passed { None } else { Some(format!("blast radius of {affected} files exceeds the {MAX_BLAST_RADIUS}-file threshold")) },
        })
        .to_string();

        GateResult { gate: GateName::BlastRadius, passed, details: truncate(details), duration_ms: elapsed_ms(start) }
    }
}

#[async_trait]
impl GateRunner for QualityGates {
    async fn run_gates(&self, project: &str, project_path: &Path, affected_files: &[String]) -> Result<GateOutcome> {
        let report = self
            .run_gates(&RunGatesRequest {
                project: project.to_string(),
                project_path: project_path.to_path_buf(),
                affected_files: affected_files.to_vec(),
                skip: Vec::new(),
            })
            .await?;

        let details = report
            .results
            .iter()
            .filter(|r| r.gate != GateName::BlastRadius && !r.passed)
            .map(|r| format!("{}: {}", r.gate, r.details))
            .collect::<Vec<_>>()
            .join("; ");

        Ok(GateOutcome { passed: report.passed, details })
    }
}

enum SpawnOutcome {
    Finished { success: bool, output: String },
    TimedOut,
    SpawnFailed(std::io::Error),
}

async fn run_with_timeout(cmd: &mut Command, duration: Duration) -> SpawnOutcome {
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => return SpawnOutcome::SpawnFailed(err),
    };

    match timeout(duration, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            SpawnOutcome::Finished { success: output.status.success(), output: combined }
        }
        Ok(Err(err)) => SpawnOutcome::SpawnFailed(err),
        Err(_) => {
            warn!(timeout_secs = duration.as_secs(), "gate subprocess timed out");
            SpawnOutcome::TimedOut
        }
    }
}

fn has_typescript_manifest(project_path: &Path) -> bool {
    project_path.join("tsconfig.json").is_file()
}

struct TestRunner {
    binary: &'static str,
    related_flag: &'static str,
}

fn detect_test_runner(project_path: &Path) -> Option<TestRunner> {
    let package_json = std::fs::read_to_string(project_path.join("package.json")).ok()?;
    let manifest: serde_json::Value = serde_json::from_str(&package_json).ok()?;

    let has_dep = |name: &str| {
        ["dependencies", "devDependencies"]
            .iter()
            .any(|section| manifest.get(section).and_then(|d| d.get(name)).is_some())
    };

    if has_dep("vitest") {
        Some(TestRunner { binary: "vitest", related_flag: "--related" })
    } else if has_dep("jest") {
        Some(TestRunner { binary: "jest", related_flag: "--findRelatedTests" })
    } else if manifest.get("scripts").and_then(|s| s.get("test")).is_some() {
        Some(TestRunner { binary: "test", related_flag: "--" })
    } else {
        None
    }
}

fn filter_to_affected(output: &str, affected_files: &[String]) -> String {
    if affected_files.is_empty() {
        return output.to_string();
    }
    let filtered: Vec<&str> = output.lines().filter(|line| affected_files.iter().any(|f| line.contains(f.as_str()))).collect();
    if filtered.is_empty() {
        output.to_string()
    } else {
        filtered.join("\n")
    }
}

fn truncate(details: String) -> String {
    if details.len() <= MAX_DETAILS_CHARS {
        details
    } else {
        details.chars().take(MAX_DETAILS_CHARS).collect()
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_caps_at_2000_chars() {
        let long = "x".repeat(5000);
        assert_eq!(truncate(long).len(), MAX_DETAILS_CHARS);
    }

    #[test]
    fn no_manifest_means_typecheck_is_skippable() {
        let dir = std::env::temp_dir().join(format!("codectx-gates-test-{:p}", &0u8));
        std::fs::create_dir_all(&dir).unwrap();
        assert!(!has_typescript_manifest(&dir));
    }

    fn test_graph_store() -> GraphStore {
        GraphStore::new(
            Arc::new(crate::providers::embedding::hashing::HashingEmbeddingProvider::new(32)),
            Arc::new(crate::providers::vector_store::memory::InMemoryVectorStore::new()),
        )
    }

    #[tokio::test]
    async fn blast_radius_passes_when_affected_set_is_small() {
        let gates = QualityGates::new(Arc::new(test_graph_store()));
        let result = gates.blast_radius("demo", &["a.rs".to_string()]).await;
        assert!(result.passed);
        assert_eq!(result.gate, GateName::BlastRadius);
    }

    #[tokio::test]
    async fn typecheck_is_skipped_without_a_tsconfig() {
        let gates = QualityGates::new(Arc::new(test_graph_store()));
        let dir = std::env::temp_dir().join("codectx-gates-no-manifest");
        std::fs::create_dir_all(&dir).unwrap();
        let result = gates.typecheck(&dir, &[]).await;
        assert!(result.passed);
        assert!(result.details.contains("no TypeScript manifest"));
    }
}
