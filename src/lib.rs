pub mod ai;
pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod extract;
pub mod models;
pub mod naming;
pub mod planner;
pub mod report;

use ai::ollama::OllamaBackend;
use clap::Parser;
use cli::Cli;
use config::OrganizerConfig;
use execution::{ExecutionEngine, RunContext, RunOutcome};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Binary entry point: parse flags, run, report
pub async fn run() -> anyhow::Result<ExitCode> {
    // Load .env from the working directory if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut report_sink = init_tracing(&cli)?;

    let outcome = match execute(&cli).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("[Organizer] Run aborted: {:#}", e);
            return match report_sink.as_mut() {
                Some(log) => {
                    writeln!(log, "Error: {:#}", e)?;
                    Ok(ExitCode::FAILURE)
                }
                None => Err(e),
            };
        }
    };

    let text = if cli.json {
        report::to_json(&outcome)?
    } else {
        report::render(&outcome)
    };

    match report_sink.as_mut() {
        Some(log) => writeln!(log, "{}", text)?,
        None => println!("{}", text),
    }

    Ok(if outcome.summary.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn execute(cli: &Cli) -> anyhow::Result<RunOutcome> {
    let config = OrganizerConfig::load(cli.config.as_deref())?;
    let request = cli.to_request(&config)?;

    tracing::info!(
        input = %request.input.root().display(),
        output = %request.output_root.display(),
        mode = %request.mode,
        dry_run = request.dry_run,
        "[Organizer] Starting run"
    );

    let backend = Arc::new(OllamaBackend::new(&config)?);
    let context = Arc::new(if cli.silent {
        RunContext::silent()
    } else {
        RunContext::new(
            false,
            Some(Box::new(|done: usize, total: usize, path: &Path| {
                eprintln!("[{}/{}] {}", done, total, path.display());
            })),
        )
    });

    let engine = ExecutionEngine::new(&config, backend, context);
    Ok(engine.run(&request).await?)
}

/// Interactive: logs to stderr. Silent: logs and report to the run log file,
/// whose second handle is returned for the report.
fn init_tracing(cli: &Cli) -> anyhow::Result<Option<File>> {
    // Default: warn for most crates, info for ours. RUST_LOG overrides.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,file_organizer_lib=info"));

    if !cli.silent {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    }

    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cli.log_file)?;
    let report_sink = log.try_clone()?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(log))
        .init();

    Ok(Some(report_sink))
}
