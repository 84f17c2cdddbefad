//! Removal of tracing instrumentation from rewritten Go source.
//!
//! An instrumentation pass rewrites Go files: it inserts statements between
//! marker comments, wraps expressions in calls into an instrumentation
//! package and adds middleware registrations. This crate undoes those edits
//! and leaves everything else byte for byte as it was.
//!
//! ```
//! use unweave_core::Uninstrumenter;
//!
//! # fn main() -> unweave_core::Result<()> {
//! let source = "package main\n\nfunc main() {\n\t//dd:startwrap\n\tspan := start() //dd:endwrap\n\trun()\n}\n";
//! let out = Uninstrumenter::default().uninstrument_source("main.go", source)?;
//! assert_eq!(out.source, "package main\n\nfunc main() {\n\trun()\n}\n");
//! assert_eq!(out.report.regions, 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Pipeline
//!
//! For every function declaration:
//! 1. [`region`] deletes `//dd:startwrap` .. `//dd:endwrap` regions. The
//!    statement rules of [`rules::remove`] and the unwrap rules see each
//!    region's statements as it goes.
//! 2. [`span`] deletes `//dd:startinstrument` .. `//dd:endinstrument` spans
//!    and strips `//dd:instrumented` tags.
//! 3. Steps 1 and 2 run again on function literal bodies one level down.
//!
//! Code outside markers is never touched.
//!
//! The file is then printed, instrumentation imports nothing uses any more
//! are dropped, and the result is re-parsed as a check.

pub mod config;
pub mod driver;
pub mod error;
pub mod markers;
pub mod region;
pub mod report;
pub mod rules;
pub mod span;

pub use config::{DEFAULT_INSTRUMENT_PACKAGE, EngineConfig};
pub use driver::{Stage, Uninstrumented, Uninstrumenter, UninstrumenterBuilder, uninstrument_file};
pub use error::{Result, UninstrumentError};
pub use markers::MarkerKind;
pub use report::Report;
pub use rules::{
    NodeMut, RuleContext, StatementRule, UnwrapRule, default_statement_rules, default_unwrap_rules,
};
pub use span::SpanStats;
