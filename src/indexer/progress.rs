//! Per-project `IndexProgress` cache. `status == Indexing` is the advisory
//! lock that rejects concurrent index runs for the same project.

use crate::domain::types::{IndexProgress, IndexStatus};
use chrono::Utc;
use dashmap::DashMap;

/// Process-wide, per-project index-run progress cache.
#[derive(Default)]
pub struct ProgressStore {
    by_project: DashMap<String, IndexProgress>,
}

impl ProgressStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current progress for `project`, or the idle default if never run.
    pub fn get(&self, project: &str) -> IndexProgress {
        self.by_project.get(project).map(|p| p.clone()).unwrap_or_default()
    }

    /// True if `project` currently has a run in flight.
    pub fn is_indexing(&self, project: &str) -> bool {
        matches!(self.get(project).status, IndexStatus::Indexing)
    }

    /// Mark `project` as indexing, resetting counters for a new run.
    pub fn start(&self, project: &str, total: usize) {
        self.by_project.insert(
            project.to_string(),
            IndexProgress {
                status: IndexStatus::Indexing,
                total,
                processed: 0,
                started_at: Some(Utc::now()),
                updated_at: Utc::now(),
                last_error: None,
            },
        );
    }

    /// Add `delta` processed files to the current run.
    pub fn advance(&self, project: &str, delta: usize) {
        if let Some(mut progress) = self.by_project.get_mut(project) {
            progress.processed += delta;
            progress.updated_at = Utc::now();
        }
    }

    /// Mark the current run for `project` as completed.
    pub fn complete(&self, project: &str) {
        if let Some(mut progress) = self.by_project.get_mut(project) {
            progress.status = IndexStatus::Completed;
            progress.updated_at = Utc::now();
        }
    }

    /// Mark the current run for `project` as failed with `message`.
    pub fn fail(&self, project: &str, message: String) {
        if let Some(mut progress) = self.by_project.get_mut(project) {
            progress.status = IndexStatus::Error;
            progress.last_error = Some(message);
            progress.updated_at = Utc::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_sets_indexing_and_advance_tracks_processed() {
        let store = ProgressStore::new();
        store.start("p", 10);
        assert!(store.is_indexing("p"));
        store.advance("p", 4);
        assert_eq!(store.get("p").processed, 4);
    }

    #[test]
    fn complete_clears_the_indexing_lock() {
        let store = ProgressStore::new();
        store.start("p", 1);
        store.complete("p");
        assert!(!store.is_indexing("p"));
        assert_eq!(store.get("p").status, IndexStatus::Completed);
    }

    #[test]
    fn fail_records_the_error_message() {
        let store = ProgressStore::new();
        store.start("p", 1);
        store.fail("p", "boom".to_string());
        assert_eq!(store.get("p").last_error.as_deref(), Some("boom"));
        assert_eq!(store.get("p").status, IndexStatus::Error);
    }
}
