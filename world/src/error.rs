//! Failures raised while building or stepping a simulation.

use std::fmt;

use nanobot_core::{BotId, Command, CommandError, Pos, TraceError};
use thiserror::Error;

use crate::Status;

/// Broad classification of a [`SimulationError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The command stream could not be decoded.
    Parse,
    /// A command was illegal in the current state.
    Emulation,
    /// Two commands touched the same voxel in one step.
    Interference,
    /// The emulator was driven inconsistently.
    Malfunction,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Parse => "Parser error",
            Self::Emulation => "Emulation error",
            Self::Interference => "Interference error",
            Self::Malfunction => "Emulator malfunction",
        };
        f.write_str(label)
    }
}

/// Why a single command cannot execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PreconditionError {
    /// A voxel the command needs lies outside the grid.
    #[error("{pos} is out of bounds")]
    OutOfBounds {
        /// Offending voxel.
        pos: Pos,
    },
    /// A voxel the command needs void is full.
    #[error("{pos} is full")]
    Blocked {
        /// Offending voxel.
        pos: Pos,
    },
    /// No bot at the partner position issued the matching fusion command.
    #[error("no fusion partner at {pos}")]
    NoFusionPartner {
        /// Position the partner was expected at.
        pos: Pos,
    },
    /// The bot does not hold enough seeds for the requested fission.
    #[error("fission needs {required} seeds, bot holds {available}")]
    InsufficientSeeds {
        /// Seeds required, the new bot's identifier included.
        required: usize,
        /// Seeds held.
        available: usize,
    },
    /// Halt was issued while other bots are still active.
    #[error("halt requires a single active bot, found {active}")]
    HaltWithCompanions {
        /// Number of active bots.
        active: usize,
    },
    /// Halt was issued by a bot other than the first.
    #[error("halt must be issued by bot #1")]
    HaltByWrongBot,
    /// Halt was issued away from the origin.
    #[error("halt must be issued at the origin, not {pos}")]
    HaltAwayFromOrigin {
        /// Position of the halting bot.
        pos: Pos,
    },
    /// Halt was issued with high harmonics.
    #[error("halt requires low harmonics")]
    HaltInHighHarmonics,
    /// Halt was issued before the matrix matches the target model.
    #[error("halt requires the matrix to match the target model")]
    HaltBeforeTarget,
    /// A group command does not have the number of members its box requires.
    #[error("group over {region_min}..{region_max} has {members} members, needs {required}")]
    IncompleteGroup {
        /// Lowest corner of the box.
        region_min: Pos,
        /// Highest corner of the box.
        region_max: Pos,
        /// Bots issuing the command over this box.
        members: usize,
        /// Corners of the box.
        required: usize,
    },
    /// Two group members named the same corner.
    #[error("two group members share the corner {pos}")]
    SharedCorner {
        /// Corner named twice.
        pos: Pos,
    },
    /// A group member stands inside the box the group fills or voids.
    #[error("group member {bid} stands inside its box at {pos}")]
    MemberInsideGroup {
        /// Offending member.
        bid: BotId,
        /// Its position.
        pos: Pos,
    },
}

/// Failure of a simulation step. Every variant aborts the run.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// The trace could not be decoded.
    #[error(transparent)]
    Parse(#[from] TraceError),
    /// A caller-built command carried an argument outside its class.
    #[error("bot {bid}: {source}")]
    InvalidCommand {
        /// Bot the command was assigned to.
        bid: BotId,
        /// Construction failure.
        source: CommandError,
    },
    /// A command's preconditions do not hold.
    #[error("bot {bid} cannot execute {command}: {source}")]
    Precondition {
        /// Bot that issued the command.
        bid: BotId,
        /// Rejected command.
        command: Command,
        /// Failed precondition.
        source: PreconditionError,
    },
    /// Two footprints overlap.
    #[error("bots {first} and {second} both touch {pos}")]
    Interference {
        /// Shared voxel.
        pos: Pos,
        /// Lower bot identifier.
        first: BotId,
        /// Higher bot identifier.
        second: BotId,
    },
    /// Low harmonics with full voxels that are not connected to the ground.
    #[error("{floating} full voxels are not grounded")]
    Ungrounded {
        /// Number of full voxels that float.
        floating: usize,
    },
    /// An active bot reached execution without a command.
    #[error("bot {bid} is active but has no command")]
    MissingCommand {
        /// Bot without a command.
        bid: BotId,
    },
    /// A command was staged although every active bot already has one.
    #[error("every active bot already has a staged command")]
    StepAlreadyComplete,
    /// The emulator is no longer running.
    #[error("emulator is {status}")]
    NotRunning {
        /// Terminal status.
        status: Status,
    },
}

impl SimulationError {
    /// Classifies the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(TraceError::IllFormed { .. }) => ErrorKind::Emulation,
            Self::Parse(_) => ErrorKind::Parse,
            Self::InvalidCommand { .. } | Self::Precondition { .. } | Self::Ungrounded { .. } => {
                ErrorKind::Emulation
            }
            Self::Interference { .. } => ErrorKind::Interference,
            Self::MissingCommand { .. }
            | Self::StepAlreadyComplete
            | Self::NotRunning { .. } => ErrorKind::Malfunction,
        }
    }
}

/// Reasons an emulator cannot be built or a state cannot be installed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SetupError {
    /// Neither a source nor a target model was supplied.
    #[error("at least one of the source and target models is required")]
    MissingModels,
    /// Source and target disagree on the grid size.
    #[error(
        "source resolution {source_resolution} differs from target resolution {target_resolution}"
    )]
    ResolutionMismatch {
        /// Side of the source matrix.
        source_resolution: u32,
        /// Side of the target matrix.
        target_resolution: u32,
    },
    /// The bot table does not have one slot per identifier.
    #[error("expected {expected} bot slots, found {actual}")]
    SlotCount {
        /// Required number of slots.
        expected: usize,
        /// Slots present.
        actual: usize,
    },
    /// A slot holds a bot with a different identifier.
    #[error("slot {slot} holds bot {bid}")]
    SlotMismatch {
        /// Slot index.
        slot: usize,
        /// Identifier stored in the slot.
        bid: BotId,
    },
    /// A bot carries an identifier outside `1..=40`.
    #[error("bot identifier {bid} is outside the valid range")]
    InvalidIdentifier {
        /// Offending identifier.
        bid: BotId,
    },
    /// Slot 0 is reserved and must stay inactive.
    #[error("bot identifier 0 is reserved")]
    ReservedSlotActive,
    /// An active bot stands outside the grid.
    #[error("bot {bid} at {pos} is out of bounds")]
    BotOutOfBounds {
        /// Bot identifier.
        bid: BotId,
        /// Its position.
        pos: Pos,
    },
    /// An active bot stands inside a full voxel.
    #[error("bot {bid} at {pos} is inside a full voxel")]
    BotInsideMatter {
        /// Bot identifier.
        bid: BotId,
        /// Its position.
        pos: Pos,
    },
    /// Two active bots share a position.
    #[error("bots {first} and {second} share {pos}")]
    SharedPosition {
        /// Lower bot identifier.
        first: BotId,
        /// Higher bot identifier.
        second: BotId,
        /// Shared position.
        pos: Pos,
    },
    /// A seed is outside `1..=40`.
    #[error("bot {bid} holds invalid seed {seed}")]
    InvalidSeed {
        /// Holder of the seed.
        bid: BotId,
        /// Offending seed.
        seed: BotId,
    },
    /// An identifier is active, or held as a seed, more than once.
    #[error("bot identifier {bid} is claimed more than once")]
    DuplicateIdentifier {
        /// Identifier claimed twice.
        bid: BotId,
    },
    /// A running state has no active bots left to issue commands.
    #[error("running state has no active bots")]
    NoActiveBots,
    /// A halted state still has active bots.
    #[error("halted state still has {active} active bots")]
    ActiveAfterHalt {
        /// Number of active bots.
        active: usize,
    },
    /// Low harmonics with floating matter.
    #[error("{floating} full voxels are not grounded under low harmonics")]
    Ungrounded {
        /// Number of floating voxels.
        floating: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_variants() {
        let parse = SimulationError::from(TraceError::EndOfTrace { offset: 3 });
        assert_eq!(parse.kind(), ErrorKind::Parse);
        assert_eq!(parse.to_string(), "unexpected end of trace at byte 3");

        let interference = SimulationError::Interference {
            pos: Pos::new(1, 0, 0),
            first: BotId::new(1),
            second: BotId::new(2),
        };
        assert_eq!(interference.kind(), ErrorKind::Interference);
        assert_eq!(interference.to_string(), "bots #1 and #2 both touch (1, 0, 0)");

        let missing = SimulationError::MissingCommand { bid: BotId::new(4) };
        assert_eq!(missing.kind(), ErrorKind::Malfunction);
        assert_eq!(ErrorKind::Emulation.to_string(), "Emulation error");
    }

    #[test]
    fn precondition_messages_name_the_command() {
        let error = SimulationError::Precondition {
            bid: BotId::new(1),
            command: Command::Halt,
            source: PreconditionError::HaltInHighHarmonics,
        };
        assert_eq!(error.kind(), ErrorKind::Emulation);
        assert_eq!(
            error.to_string(),
            "bot #1 cannot execute Halt: halt requires low harmonics"
        );
    }
}
