//! Per-project `FileHashIndex` cache: the process-wide map the indexer
//! diffs against to decide what needs re-embedding.

use crate::domain::types::FileHashEntry;
use dashmap::DashMap;
use std::collections::HashMap;

/// Outcome of comparing a file's current MD5 against the stored index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileDiff {
    /// Hash matches the stored entry; nothing to do.
    Unchanged,
    /// A stored entry exists with a different hash.
    Changed,
    /// No stored entry for this path.
    New,
}

/// Process-wide, per-project file-hash cache.
#[derive(Default)]
pub struct FileHashStore {
    by_project: DashMap<String, HashMap<String, FileHashEntry>>,
}

impl FileHashStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the entire stored map for `project` (used by `force` runs).
    pub fn clear_project(&self, project: &str) {
        self.by_project.remove(project);
    }

    /// Compare `md5` for `relative_path` against the stored entry.
    pub fn diff(&self, project: &str, relative_path: &str, md5: &str) -> FileDiff {
        match self.by_project.get(project).and_then(|m| m.get(relative_path).cloned()) {
            Some(entry) if entry.md5 == md5 => FileDiff::Unchanged,
            Some(_) => FileDiff::Changed,
            None => FileDiff::New,
        }
    }

    /// Relative paths stored for `project` that are absent from `seen`.
    pub fn removed_files(&self, project: &str, seen: &[String]) -> Vec<String> {
        let Some(entries) = self.by_project.get(project) else {
            return Vec::new();
        };
        entries
            .keys()
            .filter(|path| !seen.iter().any(|s| *s == **path))
            .cloned()
            .collect()
    }

    /// Snapshot the currently stored map for `project`, to seed a run's
    /// local staging map before any writes happen.
    pub fn snapshot(&self, project: &str) -> HashMap<String, FileHashEntry> {
        self.by_project.get(project).map(|m| m.clone()).unwrap_or_default()
    }

    /// Replace the entire stored map for `project` in one step. Called once
    /// at the end of a run so the hash index update is atomic with respect
    /// to readers, per the persistence ordering rule.
    pub fn commit(&self, project: &str, entries: HashMap<String, FileHashEntry>) {
        self.by_project.insert(project.to_string(), entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(md5: &str) -> FileHashEntry {
        FileHashEntry { md5: md5.to_string(), indexed_at: Utc::now(), chunk_count: 1 }
    }

    #[test]
    fn diff_reports_new_changed_unchanged() {
        let store = FileHashStore::new();
        assert_eq!(store.diff("p", "a.rs", "abc"), FileDiff::New);

        let mut staged = HashMap::new();
        staged.insert("a.rs".to_string(), entry("abc"));
        store.commit("p", staged);

        assert_eq!(store.diff("p", "a.rs", "abc"), FileDiff::Unchanged);
        assert_eq!(store.diff("p", "a.rs", "def"), FileDiff::Changed);
    }

    #[test]
    fn removed_files_are_those_missing_from_seen() {
        let store = FileHashStore::new();
        let mut staged = HashMap::new();
        staged.insert("a.rs".to_string(), entry("abc"));
        staged.insert("b.rs".to_string(), entry("def"));
        store.commit("p", staged);

        let removed = store.removed_files("p", &["a.rs".to_string()]);
        assert_eq!(removed, vec!["b.rs".to_string()]);
    }

    #[test]
    fn clear_project_drops_every_entry() {
        let store = FileHashStore::new();
        let mut staged = HashMap::new();
        staged.insert("a.rs".to_string(), entry("abc"));
        store.commit("p", staged);
        store.clear_project("p");
        assert_eq!(store.diff("p", "a.rs", "abc"), FileDiff::New);
    }
}
