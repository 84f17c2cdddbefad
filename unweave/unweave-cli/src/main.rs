//! unweave - strip orchestrion instrumentation from Go source files.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use unweave_cli::{Mode, OutputFormat, Summary, collect_go_files, print_outcomes, process_files};
use unweave_core::{EngineConfig, Uninstrumenter};

#[derive(Parser)]
#[command(name = "unweave")]
#[command(about = "Remove orchestrion instrumentation from Go source files", long_about = None)]
#[command(version)]
struct Cli {
    /// Files or directories to process; reads stdin when omitted
    paths: Vec<PathBuf>,

    /// Rewrite changed files in place
    #[arg(short, long, conflicts_with = "check")]
    write: bool,

    /// Exit with status 1 if any file would change
    #[arg(long)]
    check: bool,

    /// Configuration file (defaults to ./unweave.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.write {
            Mode::Write
        } else if self.check {
            Mode::Check
        } else {
            Mode::Print
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    debug!(?config, "Loaded configuration");
    let engine = Uninstrumenter::builder().config(config).build()?;

    if cli.paths.is_empty() {
        return run_stdin(&engine);
    }

    let mode = cli.mode();
    let files = collect_go_files(&cli.paths)?;
    let outcomes = process_files(&engine, &files, mode);

    let mut stdout = io::stdout().lock();
    print_outcomes(&mut stdout, &outcomes, mode, cli.format)?;

    let code = Summary::from_outcomes(&outcomes).exit_code(mode);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load_from_path(path)?,
        None => {
            let cwd = std::env::current_dir().context("failed to read current directory")?;
            EngineConfig::discover(&cwd)?
        }
    };
    Ok(config)
}

fn run_stdin(engine: &Uninstrumenter) -> Result<()> {
    let output = engine.uninstrument_reader("<stdin>", io::stdin().lock())?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(output.get_ref())?;
    stdout.flush()?;
    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = if verbose {
        EnvFilter::new("unweave=debug,unweave_cli=debug,unweave_core=debug,warn")
    } else {
        EnvFilter::try_from_env("UNWEAVE_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("unweave_cli=warn,unweave_core=warn,error"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}
