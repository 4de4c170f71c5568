//! Glob-filtered filesystem walk: `**` crosses path separators, a bare `*`
//! does not, matching the simple semantics called for in the indexer
//! contract rather than full gitignore-style globbing.

use crate::domain::error::{Error, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walk `root`, returning every file whose root-relative, `/`-separated
/// path matches `patterns` (or every file, if `patterns` is empty) and
/// matches none of `exclude_patterns`. Results are sorted for determinism.
pub fn walk_files(root: &Path, patterns: &[String], exclude_patterns: &[String]) -> Result<Vec<(PathBuf, String)>> {
    let include = build_glob_set(patterns)?;
    let exclude = build_glob_set(exclude_patterns)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");

        if !patterns.is_empty() && !include.is_match(&relative) {
            continue;
        }
        if !exclude_patterns.is_empty() && exclude.is_match(&relative) {
            continue;
        }
        files.push((entry.path().to_path_buf(), relative));
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| Error::config(format!("invalid glob pattern '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::config(format!("failed to build glob set: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn star_does_not_cross_separators_but_double_star_does() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::write(dir.path().join("src/a.rs"), "fn a(){}").unwrap();
        fs::write(dir.path().join("src/nested/b.rs"), "fn b(){}").unwrap();

        let shallow = walk_files(dir.path(), &["src/*.rs".to_string()], &[]).unwrap();
        assert_eq!(shallow.len(), 1);
        assert_eq!(shallow[0].1, "src/a.rs");

        let deep = walk_files(dir.path(), &["src/**/*.rs".to_string()], &[]).unwrap();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn exclude_patterns_drop_matching_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("target/build.rs"), "x").unwrap();
        fs::write(dir.path().join("lib.rs"), "x").unwrap();

        let files = walk_files(dir.path(), &[], &["target/**".to_string()]).unwrap();
        let paths: Vec<_> = files.into_iter().map(|(_, rel)| rel).collect();
        assert!(paths.contains(&"lib.rs".to_string()));
        assert!(!paths.iter().any(|p| p.starts_with("target/")));
    }

    #[test]
    fn empty_patterns_match_everything() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        let files = walk_files(dir.path(), &[], &[]).unwrap();
        assert_eq!(files.len(), 1);
    }
}
