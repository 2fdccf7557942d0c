//! Side channel that receives one report per finished run.

use std::{fmt, time::Duration};

use crate::error::ErrorKind;

/// How the run was driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// The whole trace was executed in one call.
    Auto,
    /// Steps were supplied piecemeal.
    Interactive,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Interactive => f.write_str("interactive"),
        }
    }
}

/// Names identifying the problem and the solution being graded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RunLabels {
    /// Problem name.
    pub problem: String,
    /// Solution name.
    pub solution: String,
}

/// How a run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The trace halted.
    Success {
        /// Total energy spent.
        energy: i64,
    },
    /// A step failed.
    Failure {
        /// Class of the failure.
        kind: ErrorKind,
        /// Rendered error.
        message: String,
    },
}

/// Summary handed to a [`RunObserver`] when a run halts or aborts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    /// Problem and solution names.
    pub labels: RunLabels,
    /// How the run was driven.
    pub mode: RunMode,
    /// Wall time since the first step of the run.
    pub elapsed: Duration,
    /// Steps completed.
    pub steps: u64,
    /// Result of the run.
    pub outcome: Outcome,
}

/// Receives run reports.
pub trait RunObserver {
    /// Called once when a run halts or aborts.
    fn run_finished(&mut self, report: &RunReport);
}

impl<F> RunObserver for F
where
    F: FnMut(&RunReport),
{
    fn run_finished(&mut self, report: &RunReport) {
        self(report);
    }
}
