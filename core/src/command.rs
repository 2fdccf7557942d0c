//! The closed nanobot instruction set.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::{CommandError, DiffClass},
    geometry::Diff,
};

/// One instruction executed by a single bot during a step.
///
/// Variants carry their geometric arguments as public fields so callers can
/// pattern-match on them; the checked constructors (and [`Command::validate`],
/// which the emulator runs before every use) enforce the argument classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Ends the simulation; only the last bot may issue it, at the origin.
    Halt,
    /// Does nothing for one step.
    Wait,
    /// Toggles the global harmonics mode.
    Flip,
    /// Straight move along one axis.
    SMove {
        /// Long linear displacement.
        lld: Diff,
    },
    /// Two consecutive short straight moves.
    LMove {
        /// First short linear displacement.
        sld1: Diff,
        /// Second short linear displacement.
        sld2: Diff,
    },
    /// Primary side of a fusion; absorbs the bot at `pos + nd`.
    FusionP {
        /// Near displacement of the secondary bot.
        nd: Diff,
    },
    /// Secondary side of a fusion; merges into the bot at `pos + nd`.
    FusionS {
        /// Near displacement of the primary bot.
        nd: Diff,
    },
    /// Spawns a bot at `pos + nd` handing it `m` seeds besides its own id.
    Fission {
        /// Near displacement of the new bot.
        nd: Diff,
        /// Number of seeds handed to the new bot.
        m: u8,
    },
    /// Fills the voxel at `pos + nd`.
    Fill {
        /// Near displacement of the target voxel.
        nd: Diff,
    },
    /// Voids the voxel at `pos + nd`.
    Void {
        /// Near displacement of the target voxel.
        nd: Diff,
    },
    /// Group fill of the box with corners `pos + nd` and `pos + nd + fd`.
    GFill {
        /// Near displacement of this bot's corner.
        nd: Diff,
        /// Far displacement to the opposite corner.
        fd: Diff,
    },
    /// Group void of the box with corners `pos + nd` and `pos + nd + fd`.
    GVoid {
        /// Near displacement of this bot's corner.
        nd: Diff,
        /// Far displacement to the opposite corner.
        fd: Diff,
    },
}

impl Command {
    /// Builds an [`Command::SMove`], checking that `lld` is long linear.
    pub fn smove(lld: Diff) -> Result<Self, CommandError> {
        let command = Self::SMove { lld };
        command.validate().map(|()| command)
    }

    /// Builds an [`Command::LMove`], checking that both legs are short linear.
    pub fn lmove(sld1: Diff, sld2: Diff) -> Result<Self, CommandError> {
        let command = Self::LMove { sld1, sld2 };
        command.validate().map(|()| command)
    }

    /// Builds a [`Command::FusionP`], checking that `nd` is near.
    pub fn fusion_p(nd: Diff) -> Result<Self, CommandError> {
        let command = Self::FusionP { nd };
        command.validate().map(|()| command)
    }

    /// Builds a [`Command::FusionS`], checking that `nd` is near.
    pub fn fusion_s(nd: Diff) -> Result<Self, CommandError> {
        let command = Self::FusionS { nd };
        command.validate().map(|()| command)
    }

    /// Builds a [`Command::Fission`], checking that `nd` is near.
    pub fn fission(nd: Diff, m: u8) -> Result<Self, CommandError> {
        let command = Self::Fission { nd, m };
        command.validate().map(|()| command)
    }

    /// Builds a [`Command::Fill`], checking that `nd` is near.
    pub fn fill(nd: Diff) -> Result<Self, CommandError> {
        let command = Self::Fill { nd };
        command.validate().map(|()| command)
    }

    /// Builds a [`Command::Void`], checking that `nd` is near.
    pub fn void(nd: Diff) -> Result<Self, CommandError> {
        let command = Self::Void { nd };
        command.validate().map(|()| command)
    }

    /// Builds a [`Command::GFill`], checking that `nd` is near and `fd` far.
    pub fn gfill(nd: Diff, fd: Diff) -> Result<Self, CommandError> {
        let command = Self::GFill { nd, fd };
        command.validate().map(|()| command)
    }

    /// Builds a [`Command::GVoid`], checking that `nd` is near and `fd` far.
    pub fn gvoid(nd: Diff, fd: Diff) -> Result<Self, CommandError> {
        let command = Self::GVoid { nd, fd };
        command.validate().map(|()| command)
    }

    /// Checks every geometric argument against its class.
    pub fn validate(&self) -> Result<(), CommandError> {
        let name = self.name();
        match *self {
            Self::Halt | Self::Wait | Self::Flip => Ok(()),
            Self::SMove { lld } => require(name, lld, DiffClass::LongLinear),
            Self::LMove { sld1, sld2 } => {
                require(name, sld1, DiffClass::ShortLinear)?;
                require(name, sld2, DiffClass::ShortLinear)
            }
            Self::FusionP { nd }
            | Self::FusionS { nd }
            | Self::Fission { nd, .. }
            | Self::Fill { nd }
            | Self::Void { nd } => require(name, nd, DiffClass::Near),
            Self::GFill { nd, fd } | Self::GVoid { nd, fd } => {
                require(name, nd, DiffClass::Near)?;
                require(name, fd, DiffClass::Far)
            }
        }
    }

    /// Mnemonic used in traces and diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Halt => "Halt",
            Self::Wait => "Wait",
            Self::Flip => "Flip",
            Self::SMove { .. } => "SMove",
            Self::LMove { .. } => "LMove",
            Self::FusionP { .. } => "FusionP",
            Self::FusionS { .. } => "FusionS",
            Self::Fission { .. } => "Fission",
            Self::Fill { .. } => "Fill",
            Self::Void { .. } => "Void",
            Self::GFill { .. } => "GFill",
            Self::GVoid { .. } => "GVoid",
        }
    }

    /// Total displacement of a move command, `None` for everything else.
    #[must_use]
    pub fn move_offset(&self) -> Option<Diff> {
        match *self {
            Self::SMove { lld } => Some(lld),
            Self::LMove { sld1, sld2 } => Some(sld1 + sld2),
            _ => None,
        }
    }
}

fn require(command: &'static str, diff: Diff, expected: DiffClass) -> Result<(), CommandError> {
    let valid = match expected {
        DiffClass::ShortLinear => diff.is_short_linear(),
        DiffClass::LongLinear => diff.is_long_linear(),
        DiffClass::Near => diff.is_near(),
        DiffClass::Far => diff.is_far(),
    };

    if valid {
        Ok(())
    } else {
        Err(CommandError {
            command,
            expected,
            diff,
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            Self::Halt | Self::Wait | Self::Flip => f.write_str(name),
            Self::SMove { lld } => write!(f, "{name} {lld}"),
            Self::LMove { sld1, sld2 } => write!(f, "{name} {sld1} {sld2}"),
            Self::FusionP { nd } | Self::FusionS { nd } | Self::Fill { nd } | Self::Void { nd } => {
                write!(f, "{name} {nd}")
            }
            Self::Fission { nd, m } => write!(f, "{name} {nd} {m}"),
            Self::GFill { nd, fd } | Self::GVoid { nd, fd } => write!(f, "{name} {nd} {fd}"),
        }
    }
}
