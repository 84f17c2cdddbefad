//! Rendering outcomes for the terminal or for tools.

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

use crate::process::{FileOutcome, Mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Human,
    /// JSON
    Json,
}

/// Totals across all processed files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub files: usize,
    pub changed: usize,
    pub errors: usize,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[FileOutcome]) -> Self {
        Self {
            files: outcomes.len(),
            changed: outcomes.iter().filter(|o| o.changed).count(),
            errors: outcomes.iter().filter(|o| o.is_error()).count(),
        }
    }

    /// Process exit code: 2 on errors, 1 when `--check` found work, else 0.
    pub fn exit_code(&self, mode: Mode) -> i32 {
        if self.errors > 0 {
            2
        } else if mode == Mode::Check && self.changed > 0 {
            1
        } else {
            0
        }
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    summary: Summary,
    files: &'a [FileOutcome],
}

/// Write the results of a run to `out`.
///
/// In print mode with human output the rewritten sources are written as-is,
/// one after another. Otherwise a per-file listing is produced.
pub fn print_outcomes(
    out: &mut impl Write,
    outcomes: &[FileOutcome],
    mode: Mode,
    format: OutputFormat,
) -> Result<()> {
    let summary = Summary::from_outcomes(outcomes);

    match format {
        OutputFormat::Json => {
            let json = JsonOutput {
                summary,
                files: outcomes,
            };
            serde_json::to_writer_pretty(&mut *out, &json)?;
            writeln!(out)?;
        }
        OutputFormat::Human => match mode {
            Mode::Print => {
                for source in outcomes.iter().filter_map(|o| o.source.as_deref()) {
                    out.write_all(source.as_bytes())?;
                }
            }
            Mode::Check => {
                for outcome in outcomes.iter().filter(|o| o.changed) {
                    writeln!(out, "{}", outcome.path.display())?;
                }
            }
            Mode::Write => {
                for report in outcomes
                    .iter()
                    .filter(|o| o.changed)
                    .filter_map(|o| o.report.as_ref())
                {
                    writeln!(out, "{}", report)?;
                }
                writeln!(
                    out,
                    "{} files, {} rewritten, {} errors",
                    summary.files, summary.changed, summary.errors
                )?;
            }
        },
    }

    out.flush()?;
    Ok(())
}
