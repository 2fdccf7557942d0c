use std::{
    fmt::Write as _,
    fs::OpenOptions,
    io::Write as _,
    path::PathBuf,
};

use nanobot_world::{Outcome, RunObserver, RunReport};
use tracing::warn;

/// Appends one entry per finished run to a plain-text log file.
#[derive(Clone, Debug)]
pub(crate) struct LogFileObserver {
    path: PathBuf,
}

impl LogFileObserver {
    /// Creates an observer writing to `path`. The file is opened on demand.
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append(&self, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())
    }
}

impl RunObserver for LogFileObserver {
    fn run_finished(&mut self, report: &RunReport) {
        if let Err(error) = self.append(&render_report(report)) {
            warn!(path = %self.path.display(), %error, "failed to append run report");
        }
    }
}

/// Formats a report as a log entry, terminated by a blank line.
pub(crate) fn render_report(report: &RunReport) -> String {
    let mut entry = String::new();
    let _ = writeln!(entry, "Problem:  {}", report.labels.problem);
    let _ = writeln!(entry, "Solution: {}", report.labels.solution);
    let _ = writeln!(entry, "Mode:     {}", report.mode);
    let _ = writeln!(
        entry,
        "time elapsed: {} microseconds",
        report.elapsed.as_micros()
    );
    match &report.outcome {
        Outcome::Success { energy } => {
            let _ = writeln!(entry, "SUCCESS : {energy}");
        }
        Outcome::Failure { kind, message } => {
            let _ = writeln!(entry, "ERROR : {kind}: {message}");
        }
    }
    entry.push('\n');
    entry
}
