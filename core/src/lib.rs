#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core value types shared across the nanobot emulator.
//!
//! This crate owns everything that does not depend on a running simulation:
//! integer geometry, the bit-packed voxel [`Matrix`], the closed [`Command`]
//! instruction set and its binary trace [`codec`]. The world crate builds the
//! authoritative state and the step pipeline on top of these types, while
//! systems and adapters consume them read-only.

pub mod codec;
pub mod command;
pub mod error;
pub mod geometry;
pub mod matrix;

use serde::{Deserialize, Serialize};

pub use codec::{decode_trace, encode_command, encode_trace, TraceReader};
pub use command::Command;
pub use error::{CommandError, DiffClass, ModelError, TraceError};
pub use geometry::{
    region_dimension, Axis, Diff, Pos, Region, FACE_DIRECTIONS, FAR_DISTANCE, LONG_DISTANCE,
    SHORT_DISTANCE,
};
pub use matrix::{Matrix, MAX_RESOLUTION};

/// Highest bot identifier; identifier 0 is reserved and never active.
pub const MAX_BOTS: u8 = 40;

/// Identifier of a nanobot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BotId(u8);

impl BotId {
    /// The bot that is active when a simulation starts.
    pub const FIRST: BotId = BotId(1);

    /// Creates a new bot identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Slot index of the bot in a dense per-bot table.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Reports whether the identifier lies in `1..=MAX_BOTS`.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.0 >= 1 && self.0 <= MAX_BOTS
    }
}

impl std::fmt::Display for BotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Global field mode that decides whether floating voxels are permitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Harmonics {
    /// Every full voxel must stay grounded.
    #[default]
    Low,
    /// Floating voxels are allowed, at a tenfold passive cost.
    High,
}

impl Harmonics {
    /// Returns the opposite mode.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }

    /// Passive energy charged per voxel of the grid each step.
    #[must_use]
    pub const fn cost_per_voxel(self) -> i64 {
        match self {
            Self::Low => 3,
            Self::High => 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + for<'de> Deserialize<'de> + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value, "value should survive a bincode round trip");
    }

    #[test]
    fn bot_id_validity_covers_one_to_forty() {
        assert!(!BotId::new(0).is_valid());
        assert!(BotId::FIRST.is_valid());
        assert!(BotId::new(MAX_BOTS).is_valid());
        assert!(!BotId::new(MAX_BOTS + 1).is_valid());
        assert_eq!(BotId::new(7).index(), 7);
        assert_eq!(BotId::new(7).to_string(), "#7");
    }

    #[test]
    fn harmonics_flip_and_cost() {
        assert_eq!(Harmonics::default(), Harmonics::Low);
        assert_eq!(Harmonics::Low.flipped(), Harmonics::High);
        assert_eq!(Harmonics::High.flipped().cost_per_voxel(), 3);
        assert_eq!(Harmonics::High.cost_per_voxel(), 30);
    }

    #[test]
    fn shared_types_round_trip() {
        assert_round_trip(&BotId::new(12));
        assert_round_trip(&Harmonics::High);
        assert_round_trip(&Command::Fission {
            nd: Diff::new(0, 0, 1),
            m: 3,
        });
    }
}
