//! The per-step pipeline shared by traces, command lists and staging.

use std::collections::HashMap;

use nanobot_core::{BotId, Command, Harmonics, Pos, TraceError, TraceReader};
use tracing::debug;

use crate::{
    config::{EmulatorConfig, GroundingPolicy},
    error::SimulationError,
    execution::{check_preconditions, execute, volatiles, StepPlan},
    state::State,
};

/// Supplies one command at a time, in the order bots consume them.
pub trait CommandSource {
    /// Produces the next command.
    fn next_command(&mut self) -> Result<Command, TraceError>;
}

impl CommandSource for TraceReader {
    fn next_command(&mut self) -> Result<Command, TraceError> {
        TraceReader::next_command(self)
    }
}

/// Cursor over a caller-supplied list of already decoded commands.
#[derive(Clone, Debug)]
pub struct CommandList<'a> {
    commands: &'a [Command],
    offset: usize,
}

impl<'a> CommandList<'a> {
    /// Creates a cursor at the start of `commands`.
    #[must_use]
    pub const fn new(commands: &'a [Command]) -> Self {
        Self {
            commands,
            offset: 0,
        }
    }

    /// Reports whether every command has been consumed.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.offset >= self.commands.len()
    }
}

impl CommandSource for CommandList<'_> {
    fn next_command(&mut self) -> Result<Command, TraceError> {
        let command = self
            .commands
            .get(self.offset)
            .copied()
            .ok_or(TraceError::EndOfTrace {
                offset: self.offset,
            })?;
        self.offset += 1;
        Ok(command)
    }
}

/// Summary of a step that completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepReport {
    /// Bots that executed a command.
    pub active: usize,
    /// Energy charged by the step, passive cost included.
    pub energy: i64,
    /// Whether the step executed `Halt`.
    pub halted: bool,
}

/// Reads one command per active bot from `source` and runs the step.
///
/// Nothing is mutated unless decoding, precondition and interference checks
/// all pass.
pub fn run_step<S>(
    state: &mut State,
    config: &EmulatorConfig,
    source: &mut S,
) -> Result<StepReport, SimulationError>
where
    S: CommandSource + ?Sized,
{
    let active = state.active_bot_ids();
    let mut plan = StepPlan::new();
    for &bid in &active {
        plan.assign(bid, source.next_command()?);
    }
    resolve_step(state, config, &plan, &active)
}

/// Checks and executes `plan` for the bots in `active`, ascending.
pub(crate) fn resolve_step(
    state: &mut State,
    config: &EmulatorConfig,
    plan: &StepPlan,
    active: &[BotId],
) -> Result<StepReport, SimulationError> {
    for &bid in active {
        let command = command_for(plan, bid)?;
        command
            .validate()
            .map_err(|source| SimulationError::InvalidCommand { bid, source })?;
        check_preconditions(state, config, plan, bid, command).map_err(|source| {
            SimulationError::Precondition {
                bid,
                command,
                source,
            }
        })?;
    }
    find_interference(state, plan, active)?;

    let energy_before = state.energy();
    let harmonics_before = state.harmonics();
    state.add_energy(passive_energy(state, active.len()));

    let mut matrix_changed = false;
    for &bid in active {
        let command = command_for(plan, bid)?;
        matrix_changed |= execute(state, plan, bid, command);
    }

    let check_grounding = match config.grounding {
        GroundingPolicy::EveryStep => {
            state.harmonics() == Harmonics::Low
                && (matrix_changed || state.harmonics() != harmonics_before)
        }
        GroundingPolicy::AtHalt => state.is_halted(),
        GroundingPolicy::Never => false,
    };
    if check_grounding {
        let matrix = state.matrix();
        let floating = matrix.num_full() - matrix.num_grounded_voxels();
        if floating > 0 {
            return Err(SimulationError::Ungrounded { floating });
        }
    }

    let report = StepReport {
        active: active.len(),
        energy: state.energy() - energy_before,
        halted: state.is_halted(),
    };
    debug!(
        active = report.active,
        step_energy = report.energy,
        energy = state.energy(),
        "step executed"
    );
    Ok(report)
}

/// Reports the first voxel claimed by two different bots, scanning bots in
/// ascending order.
pub(crate) fn find_interference(
    state: &State,
    plan: &StepPlan,
    active: &[BotId],
) -> Result<(), SimulationError> {
    let mut claimed: HashMap<Pos, BotId> = HashMap::new();
    for &bid in active {
        let Some(command) = plan.command(bid) else {
            continue;
        };
        for pos in volatiles(state, plan, bid, command) {
            let first = *claimed.entry(pos).or_insert(bid);
            if first != bid {
                return Err(SimulationError::Interference {
                    pos,
                    first,
                    second: bid,
                });
            }
        }
    }
    Ok(())
}

fn command_for(plan: &StepPlan, bid: BotId) -> Result<Command, SimulationError> {
    plan.command(bid)
        .ok_or(SimulationError::MissingCommand { bid })
}

fn passive_energy(state: &State, active: usize) -> i64 {
    let side = i64::from(state.resolution());
    active as i64 * 20 + side * side * side * state.harmonics().cost_per_voxel()
}
