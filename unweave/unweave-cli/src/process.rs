//! Running the engine over a set of files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info};
use unweave_core::{Report, Uninstrumenter};

/// What to do with the rewritten source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Print it to stdout.
    Print,
    /// Overwrite files that changed.
    Write,
    /// Only report which files would change.
    Check,
}

/// Result of processing one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub source: Option<String>,
}

impl FileOutcome {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Process `files` in parallel. Outcomes come back in input order.
///
/// A failure on one file is recorded in its outcome and does not stop the
/// others.
pub fn process_files(engine: &Uninstrumenter, files: &[PathBuf], mode: Mode) -> Vec<FileOutcome> {
    info!("Processing {} files", files.len());
    files
        .par_iter()
        .map(|path| match process_file(engine, path, mode) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("{}: {:#}", path.display(), e);
                FileOutcome {
                    path: path.clone(),
                    changed: false,
                    report: None,
                    error: Some(format!("{:#}", e)),
                    source: None,
                }
            }
        })
        .collect()
}

fn process_file(engine: &Uninstrumenter, path: &Path, mode: Mode) -> Result<FileOutcome> {
    let input = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path.display().to_string();
    let output = engine.uninstrument_source(&name, &input)?;
    let changed = output.source != input;

    if changed && mode == Mode::Write {
        fs::write(path, &output.source)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Rewrote {}", path.display());
    } else {
        debug!(changed, "{}", output.report);
    }

    Ok(FileOutcome {
        path: path.to_path_buf(),
        changed,
        report: Some(output.report),
        error: None,
        source: (mode == Mode::Print).then_some(output.source),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTRUMENTED: &str = "package main

import (
\t\"net/http\"

\t\"github.com/datadog/orchestrion/instrument\"
)

func main() {
\t//dd:startwrap
\thttp.Handle(\"/\", instrument.WrapHandler(h))
\t//dd:endwrap
\thttp.ListenAndServe(\":8080\", nil)
}
";

    #[test]
    fn test_write_mode_rewrites_changed_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let dirty = dir.path().join("dirty.go");
        let clean = dir.path().join("clean.go");
        fs::write(&dirty, INSTRUMENTED).unwrap();
        fs::write(&clean, "package main\n\nfunc main() {}\n").unwrap();

        let engine = Uninstrumenter::default();
        let outcomes = process_files(&engine, &[clean.clone(), dirty.clone()], Mode::Write);

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].changed);
        assert!(outcomes[1].changed);
        assert!(outcomes.iter().all(|o| o.source.is_none()));

        let rewritten = fs::read_to_string(&dirty).unwrap();
        assert!(!rewritten.contains("dd:"));
        assert!(!rewritten.contains("instrument"));
        assert_eq!(fs::read_to_string(&clean).unwrap(), "package main\n\nfunc main() {}\n");
    }

    #[test]
    fn test_check_mode_leaves_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");
        fs::write(&path, INSTRUMENTED).unwrap();

        let outcomes = process_files(&Uninstrumenter::default(), &[path.clone()], Mode::Check);
        assert!(outcomes[0].changed);
        assert_eq!(outcomes[0].report.as_ref().unwrap().regions, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), INSTRUMENTED);
    }

    #[test]
    fn test_errors_are_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.go");
        let good = dir.path().join("good.go");
        fs::write(&bad, "package main\n\nfunc main() {\n").unwrap();
        fs::write(&good, INSTRUMENTED).unwrap();

        let outcomes = process_files(&Uninstrumenter::default(), &[bad, good], Mode::Print);
        assert!(outcomes[0].is_error());
        assert!(outcomes[0].error.as_ref().unwrap().contains("bad.go"));
        assert!(!outcomes[1].is_error());
        assert!(outcomes[1].source.as_ref().is_some_and(|s| !s.contains("dd:")));
    }
}
