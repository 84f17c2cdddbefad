//! Library side of the `unweave` command: file discovery, parallel
//! processing and result output.

pub mod files;
pub mod output;
pub mod process;

pub use files::collect_go_files;
pub use output::{OutputFormat, Summary, print_outcomes};
pub use process::{FileOutcome, Mode, process_files};
