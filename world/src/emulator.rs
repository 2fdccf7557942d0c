//! The emulator driver: owns one state, one trace cursor and the run status.

use std::{fmt, time::Instant};

use nanobot_core::{Command, Matrix, TraceReader};
use tracing::{info, warn};

use crate::{
    config::EmulatorConfig,
    error::{SetupError, SimulationError},
    execution::{check_with, Pairing, StepPlan},
    observer::{Outcome, RunLabels, RunMode, RunObserver, RunReport},
    state::State,
    step::{find_interference, resolve_step, run_step, CommandList, CommandSource, StepReport},
};

/// Lifecycle of an emulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// Steps may still execute.
    Running,
    /// `Halt` executed.
    Halted,
    /// A step failed.
    Aborted,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Running => "running",
            Self::Halted => "halted",
            Self::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Copy, Debug)]
struct RunClock {
    started: Instant,
    mode: RunMode,
}

/// Steps a [`State`] through commands from a trace, a list or staging.
///
/// Once halted or aborted the emulator performs no further work until a new
/// state is installed with [`Emulator::set_state`].
pub struct Emulator {
    state: State,
    config: EmulatorConfig,
    trace: TraceReader,
    status: Status,
    step_count: u64,
    labels: RunLabels,
    observer: Option<Box<dyn RunObserver>>,
    run: Option<RunClock>,
    staged: StepPlan,
}

impl fmt::Debug for Emulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emulator")
            .field("status", &self.status)
            .field("step_count", &self.step_count)
            .field("energy", &self.state.energy())
            .field("trace_offset", &self.trace.offset())
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

impl Emulator {
    /// Creates an emulator with the default rules.
    pub fn new(source: Option<Matrix>, target: Option<Matrix>) -> Result<Self, SetupError> {
        Self::with_config(source, target, EmulatorConfig::default())
    }

    /// Creates an emulator with explicit rules.
    pub fn with_config(
        source: Option<Matrix>,
        target: Option<Matrix>,
        config: EmulatorConfig,
    ) -> Result<Self, SetupError> {
        Ok(Self {
            state: State::new(source, target)?,
            config,
            trace: TraceReader::default(),
            status: Status::Running,
            step_count: 0,
            labels: RunLabels::default(),
            observer: None,
            run: None,
            staged: StepPlan::new(),
        })
    }

    /// Rules in effect.
    #[must_use]
    pub const fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Replaces the trace and rewinds the cursor.
    pub fn set_trace(&mut self, bytes: Vec<u8>) {
        self.trace = TraceReader::new(bytes);
        self.staged.clear();
    }

    /// Byte offset of the next unread trace command.
    #[must_use]
    pub const fn trace_offset(&self) -> usize {
        self.trace.offset()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> State {
        self.state.clone()
    }

    /// Installs a new state after validating it.
    ///
    /// The status follows the state's halt flag, the step counter restarts
    /// and staged commands are dropped. The trace cursor is left alone so a
    /// snapshot can be resumed against the rest of a trace.
    pub fn set_state(&mut self, state: State) -> Result<(), SetupError> {
        state.check_well_formed()?;
        self.status = if state.is_halted() {
            Status::Halted
        } else {
            Status::Running
        };
        self.state = state;
        self.step_count = 0;
        self.run = None;
        self.staged.clear();
        Ok(())
    }

    /// Total energy spent.
    #[must_use]
    pub const fn energy(&self) -> i64 {
        self.state.energy()
    }

    /// Reports whether a step failed.
    #[must_use]
    pub fn aborted(&self) -> bool {
        self.status == Status::Aborted
    }

    /// Current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Steps completed since the emulator was created or its state replaced.
    #[must_use]
    pub const fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Problem and solution names attached to reports.
    #[must_use]
    pub const fn labels(&self) -> &RunLabels {
        &self.labels
    }

    /// Names the problem being solved.
    pub fn set_problem_name(&mut self, name: impl Into<String>) {
        self.labels.problem = name.into();
    }

    /// Names the solution being graded.
    pub fn set_solution_name(&mut self, name: impl Into<String>) {
        self.labels.solution = name.into();
    }

    /// Registers the observer that receives run reports.
    pub fn set_observer(&mut self, observer: Box<dyn RunObserver>) {
        self.observer = Some(observer);
    }

    /// Executes one step from the trace.
    pub fn run_one_step(&mut self) -> Result<Status, SimulationError> {
        let mut trace = std::mem::take(&mut self.trace);
        let result = self.advance(RunMode::Interactive, &mut trace);
        self.trace = trace;
        result
    }

    /// Executes the trace until `Halt`, returning the total energy.
    pub fn run_full(&mut self) -> Result<i64, SimulationError> {
        if self.status == Status::Aborted {
            return Err(SimulationError::NotRunning {
                status: self.status,
            });
        }

        let mut trace = std::mem::take(&mut self.trace);
        let result = self.drive(RunMode::Auto, &mut trace, |_| true);
        self.trace = trace;
        result.map(|_| self.energy())
    }

    /// Executes steps from `commands`, one per active bot per step, until
    /// `Halt` or until the list runs out on a step boundary.
    pub fn run_commands(&mut self, commands: &[Command]) -> Result<Status, SimulationError> {
        let mut source = CommandList::new(commands);
        self.drive(RunMode::Interactive, &mut source, |source| {
            !source.is_exhausted()
        })
    }

    /// Checks `command` as the next staged command without staging it.
    ///
    /// The command is checked against the state and against the commands
    /// already staged; fusion partners and group completeness are only
    /// checked on commit.
    pub fn check_command(&self, command: Command) -> Result<(), SimulationError> {
        self.ensure_running()?;
        let active = self.state.active_bot_ids();
        let staged = self.staged.len();
        let bid = *active
            .get(staged)
            .ok_or(SimulationError::StepAlreadyComplete)?;

        command
            .validate()
            .map_err(|source| SimulationError::InvalidCommand { bid, source })?;
        let mut plan = self.staged.clone();
        plan.assign(bid, command);
        check_with(
            &self.state,
            &self.config,
            &plan,
            bid,
            command,
            Pairing::Deferred,
        )
        .map_err(|source| SimulationError::Precondition {
            bid,
            command,
            source,
        })?;
        find_interference(&self.state, &plan, &active[..=staged])
    }

    /// Checks `command` and stages it for the next bot without a command.
    pub fn stage_command(&mut self, command: Command) -> Result<(), SimulationError> {
        self.check_command(command)?;
        let active = self.state.active_bot_ids();
        if let Some(&bid) = active.get(self.staged.len()) {
            self.staged.assign(bid, command);
        }
        Ok(())
    }

    /// Reports whether every active bot has a staged command.
    #[must_use]
    pub fn step_is_complete(&self) -> bool {
        self.staged.len() == self.state.num_active()
    }

    /// Runs the staged commands as one step.
    pub fn commit_staged_step(&mut self) -> Result<Status, SimulationError> {
        if self.status != Status::Running {
            return Ok(self.status);
        }
        self.begin_run(RunMode::Interactive);
        let plan = std::mem::take(&mut self.staged);
        let active = self.state.active_bot_ids();
        let result = resolve_step(&mut self.state, &self.config, &plan, &active);
        self.conclude(result)
    }

    fn drive<S, F>(
        &mut self,
        mode: RunMode,
        source: &mut S,
        mut more: F,
    ) -> Result<Status, SimulationError>
    where
        S: CommandSource,
        F: FnMut(&S) -> bool,
    {
        while self.status == Status::Running && more(source) {
            let _ = self.advance(mode, source)?;
        }
        Ok(self.status)
    }

    fn advance<S>(&mut self, mode: RunMode, source: &mut S) -> Result<Status, SimulationError>
    where
        S: CommandSource + ?Sized,
    {
        if self.status != Status::Running {
            return Ok(self.status);
        }
        self.begin_run(mode);
        self.staged.clear();
        let result = run_step(&mut self.state, &self.config, source);
        self.conclude(result)
    }

    fn ensure_running(&self) -> Result<(), SimulationError> {
        if self.status == Status::Running {
            Ok(())
        } else {
            Err(SimulationError::NotRunning {
                status: self.status,
            })
        }
    }

    fn begin_run(&mut self, mode: RunMode) {
        if self.run.is_none() {
            self.run = Some(RunClock {
                started: Instant::now(),
                mode,
            });
        }
    }

    fn conclude(
        &mut self,
        result: Result<StepReport, SimulationError>,
    ) -> Result<Status, SimulationError> {
        match result {
            Ok(report) => {
                self.step_count += 1;
                if report.halted {
                    self.status = Status::Halted;
                    info!(
                        energy = self.state.energy(),
                        steps = self.step_count,
                        "simulation halted"
                    );
                    self.publish(Outcome::Success {
                        energy: self.state.energy(),
                    });
                }
                Ok(self.status)
            }
            Err(error) => {
                self.status = Status::Aborted;
                warn!(
                    kind = %error.kind(),
                    error = %error,
                    step = self.step_count,
                    "simulation aborted"
                );
                self.publish(Outcome::Failure {
                    kind: error.kind(),
                    message: error.to_string(),
                });
                Err(error)
            }
        }
    }

    fn publish(&mut self, outcome: Outcome) {
        let Some(clock) = self.run.take() else {
            return;
        };
        if let Some(observer) = self.observer.as_mut() {
            observer.run_finished(&RunReport {
                labels: self.labels.clone(),
                mode: clock.mode,
                elapsed: clock.started.elapsed(),
                steps: self.step_count,
                outcome,
            });
        }
    }
}
