//! Optic - Data collection, processing and aggregation agent
//!
//! # Usage
//!
//! ```bash
//! # Run the agent
//! optic
//! optic --config /etc/optic/optic.conf
//!
//! # Gather once from every source and print the events
//! optic test
//!
//! # Print version information
//! optic version
//! ```
//!
//! Signals: SIGINT shuts the agent down gracefully; SIGHUP reloads the
//! configuration and rebuilds the pipeline.

mod cmd;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Data collection, processing and aggregation agent
#[derive(Parser, Debug)]
#[command(name = "optic")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Log errors only
    #[arg(long, global = true)]
    quiet: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Profiling listen address (accepted for compatibility, unused)
    #[arg(long, global = true)]
    pprof_addr: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Gather once from every source and print the events
    Test,

    /// Print version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Command::Version)) {
        println!("optic {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    if let Err(e) = init_logging(&cli) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("optic failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => optic_config::default_config_path()?,
    };

    // thread_count must be known before the runtime exists, so only the
    // [agent] table is read here; the full load happens in the reload loop
    let settings = optic_config::load_agent_settings(&config_path)
        .context("failed to read agent settings")?;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(threads) = settings.thread_count {
        tracing::debug!(threads, "limiting runtime worker threads");
        builder.worker_threads(threads.max(1));
    }
    let runtime = builder.build().context("failed to build runtime")?;

    match cli.command {
        Some(Command::Test) => runtime.block_on(cmd::test::run(&config_path)),
        Some(Command::Version) => unreachable!("handled before runtime setup"),
        None => runtime.block_on(cmd::run::run(&config_path)),
    }
}

/// Initialize the tracing subscriber. Precedence: `--debug` / `--quiet`
/// flags, then `OPTIC_LOGLEVEL`, then `info`. `--log-file` (or
/// `OPTIC_LOGFILE`) routes output to a file.
fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.debug {
        "debug".to_string()
    } else if cli.quiet {
        "error".to_string()
    } else {
        std::env::var("OPTIC_LOGLEVEL").unwrap_or_else(|_| "info".to_string())
    };

    let filter = EnvFilter::try_new(&level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let log_file = cli
        .log_file
        .clone()
        .or_else(|| std::env::var("OPTIC_LOGFILE").ok().map(PathBuf::from));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    }

    Ok(())
}
