//! Finding the Go files to process.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use ignore::WalkBuilder;
use tracing::debug;

fn is_go_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "go")
}

/// Expand `paths` into a sorted, de-duplicated list of files.
///
/// Files named explicitly are taken as they are. Directories are walked
/// for `.go` files, honoring `.gitignore` and skipping hidden entries.
pub fn collect_go_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            bail!("no such file or directory: {}", path.display());
        }

        for entry in WalkBuilder::new(path).build() {
            let entry = entry.with_context(|| format!("failed to walk {}", path.display()))?;
            let is_file = entry.file_type().is_some_and(|t| t.is_file());
            if is_file && is_go_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files.dedup();
    debug!("Collected {} Go files", files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_walks_directories_for_go_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("pkg/sub")).unwrap();
        fs::write(root.join("main.go"), "package main\n").unwrap();
        fs::write(root.join("pkg/sub/a.go"), "package sub\n").unwrap();
        fs::write(root.join("pkg/notes.txt"), "x").unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join(".hidden/skip.go"), "package hidden\n").unwrap();

        let files = collect_go_files(&[root.to_path_buf()]).unwrap();
        assert_eq!(files, vec![root.join("main.go"), root.join("pkg/sub/a.go")]);
    }

    #[test]
    fn test_explicit_files_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.go");
        fs::write(&file, "package x\n").unwrap();

        let files = collect_go_files(&[file.clone(), dir.path().to_path_buf()]).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_missing_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_go_files(&[dir.path().join("absent")]).unwrap_err();
        assert!(err.to_string().contains("absent"));
    }
}
