#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that grades a nanobot trace against its models.

mod report;
mod snapshot_transfer;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use nanobot_core::Matrix;
use nanobot_world::{Emulator, EmulatorConfig, Status};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::{report::LogFileObserver, snapshot_transfer::SessionSnapshot};

/// Runs a binary nanobot trace and reports the energy it spends.
#[derive(Debug, Parser)]
#[command(name = "nanobot-emulator", version, about)]
struct Args {
    /// Source model (`.mdl`); omitted for assembly problems.
    #[arg(long)]
    source: Option<PathBuf>,
    /// Target model (`.mdl`); omitted for disassembly problems.
    #[arg(long)]
    target: Option<PathBuf>,
    /// Binary trace (`.nbt`).
    #[arg(long)]
    trace: PathBuf,
    /// TOML file with emulator rules.
    #[arg(long)]
    config: Option<PathBuf>,
    /// File that receives one report entry per run.
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Problem name written to the report; defaults to the target or source file stem.
    #[arg(long)]
    problem: Option<String>,
    /// Solution name written to the report; defaults to the trace file stem.
    #[arg(long)]
    solution: Option<String>,
    /// Resume from a snapshot written by `--save-snapshot`.
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Write a snapshot of the final state to this file.
    #[arg(long)]
    save_snapshot: Option<PathBuf>,
    /// Execute at most this many steps instead of running to completion.
    #[arg(long)]
    steps: Option<u64>,
}

/// Entry point for the nanobot emulator command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EmulatorConfig::default(),
    };
    let source = args.source.as_deref().map(load_model).transpose()?;
    let target = args.target.as_deref().map(load_model).transpose()?;
    let trace = fs::read(&args.trace)
        .with_context(|| format!("failed to read trace at {}", args.trace.display()))?;

    let mut emulator = Emulator::with_config(source, target, config)
        .context("source and target models are incompatible")?;

    let mut trace_offset = 0;
    let mut steps_before = 0;
    if let Some(path) = &args.resume {
        let snapshot = load_snapshot(path)?;
        if snapshot.trace_offset > trace.len() {
            bail!(
                "snapshot resumes at byte {} but the trace is only {} bytes long",
                snapshot.trace_offset,
                trace.len()
            );
        }
        trace_offset = snapshot.trace_offset;
        steps_before = snapshot.steps;
        emulator
            .set_state(snapshot.state)
            .context("snapshot holds an invalid state")?;
    }
    emulator.set_trace(trace[trace_offset..].to_vec());

    emulator.set_problem_name(args.problem.clone().unwrap_or_else(|| {
        args.target
            .as_deref()
            .or(args.source.as_deref())
            .map(file_stem)
            .unwrap_or_default()
    }));
    emulator.set_solution_name(args.solution.clone().unwrap_or_else(|| file_stem(&args.trace)));
    if let Some(path) = &args.log_file {
        emulator.set_observer(Box::new(LogFileObserver::new(path)));
    }

    let outcome = run(&mut emulator, args.steps);

    if let Some(path) = &args.save_snapshot {
        let snapshot = SessionSnapshot {
            trace_offset: trace_offset + emulator.trace_offset(),
            steps: steps_before + emulator.step_count(),
            state: emulator.snapshot(),
        };
        let encoded = snapshot
            .encode()
            .context("failed to encode simulation snapshot")?;
        fs::write(path, encoded + "\n")
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        info!(path = %path.display(), "snapshot saved");
    }

    outcome?;
    println!("energy: {}", emulator.energy());
    println!("status: {}", emulator.status());
    Ok(())
}

fn run(emulator: &mut Emulator, limit: Option<u64>) -> Result<()> {
    match limit {
        None => {
            let _ = emulator.run_full().context("trace failed")?;
        }
        Some(limit) => {
            for _ in 0..limit {
                if emulator.run_one_step().context("trace failed")? == Status::Halted {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_model(path: &Path) -> Result<Matrix> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read model at {}", path.display()))?;
    Matrix::parse(&bytes).with_context(|| format!("failed to parse model at {}", path.display()))
}

fn load_config(path: &Path) -> Result<EmulatorConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    toml::from_str(&contents).context("failed to parse emulator config toml contents")
}

fn load_snapshot(path: &Path) -> Result<SessionSnapshot> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot at {}", path.display()))?;
    SessionSnapshot::decode(&contents)
        .with_context(|| format!("failed to decode snapshot at {}", path.display()))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
