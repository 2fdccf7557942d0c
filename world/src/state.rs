//! Authoritative simulation state.

use std::collections::HashMap;

use nanobot_core::{BotId, Harmonics, Matrix, Pos, MAX_BOTS};
use serde::{Deserialize, Serialize};

use crate::{bot::Bot, error::SetupError};

/// Number of bot slots, including the reserved slot 0.
pub const BOT_SLOTS: usize = MAX_BOTS as usize + 1;

/// Everything a step reads or mutates.
///
/// Bots live in a dense table indexed by identifier so lookups by id never
/// search. The grid side is the resolution of `matrix`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    matrix: Matrix,
    target: Matrix,
    bots: Vec<Bot>,
    energy: i64,
    harmonics: Harmonics,
    halted: bool,
}

impl State {
    /// Creates the initial state for an assembly, disassembly or reassembly.
    ///
    /// A missing source starts from an empty grid; a missing target means
    /// the grid must be cleared. Bot 1 starts at the origin holding every
    /// other identifier as a seed.
    pub fn new(source: Option<Matrix>, target: Option<Matrix>) -> Result<Self, SetupError> {
        let (matrix, target) = match (source, target) {
            (None, None) => return Err(SetupError::MissingModels),
            (Some(source), None) => {
                let target = Matrix::new(source.resolution());
                (source, target)
            }
            (None, Some(target)) => (Matrix::new(target.resolution()), target),
            (Some(source), Some(target)) => {
                ensure_same_resolution(&source, &target)?;
                (source, target)
            }
        };

        let mut bots: Vec<Bot> = (0..BOT_SLOTS)
            .map(|slot| Bot::inactive(BotId::new(slot as u8)))
            .collect();
        let seeds = (2..=MAX_BOTS).map(BotId::new).collect();
        bots[BotId::FIRST.index()] = Bot::new(BotId::FIRST, Pos::ORIGIN, seeds);

        Ok(Self {
            matrix,
            target,
            bots,
            energy: 0,
            harmonics: Harmonics::Low,
            halted: false,
        })
    }

    /// Assembles a state from its parts and checks it with
    /// [`State::check_well_formed`].
    pub fn from_parts<I>(
        matrix: Matrix,
        target: Matrix,
        bots: I,
        energy: i64,
        harmonics: Harmonics,
        halted: bool,
    ) -> Result<Self, SetupError>
    where
        I: IntoIterator<Item = Bot>,
    {
        let mut slots: Vec<Bot> = (0..BOT_SLOTS)
            .map(|slot| Bot::inactive(BotId::new(slot as u8)))
            .collect();
        let mut claimed = [false; BOT_SLOTS];
        for bot in bots {
            let bid = bot.bid();
            if !bid.is_valid() {
                return Err(SetupError::InvalidIdentifier { bid });
            }
            if std::mem::replace(&mut claimed[bid.index()], true) {
                return Err(SetupError::DuplicateIdentifier { bid });
            }
            slots[bid.index()] = bot;
        }

        let state = Self {
            matrix,
            target,
            bots: slots,
            energy,
            harmonics,
            halted,
        };
        state.check_well_formed()?;
        Ok(state)
    }

    /// Side length of the grid.
    #[must_use]
    pub const fn resolution(&self) -> u32 {
        self.matrix.resolution()
    }

    /// Current voxel matrix.
    #[must_use]
    pub const fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Model the trace is expected to produce.
    #[must_use]
    pub const fn target(&self) -> &Matrix {
        &self.target
    }

    /// Energy spent so far.
    #[must_use]
    pub const fn energy(&self) -> i64 {
        self.energy
    }

    /// Current harmonics mode.
    #[must_use]
    pub const fn harmonics(&self) -> Harmonics {
        self.harmonics
    }

    /// Reports whether a `Halt` has executed.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Reports whether the matrix equals the target model.
    #[must_use]
    pub fn target_reached(&self) -> bool {
        self.matrix == self.target
    }

    /// Slot of the bot with identifier `bid`, active or not.
    #[must_use]
    pub fn bot(&self, bid: BotId) -> Option<&Bot> {
        self.bots.get(bid.index())
    }

    /// Active bots in ascending identifier order.
    pub fn active_bots(&self) -> impl Iterator<Item = &Bot> + '_ {
        self.bots.iter().filter(|bot| bot.is_active())
    }

    /// Identifiers of the active bots, ascending.
    #[must_use]
    pub fn active_bot_ids(&self) -> Vec<BotId> {
        self.active_bots().map(Bot::bid).collect()
    }

    /// Number of active bots.
    #[must_use]
    pub fn num_active(&self) -> usize {
        self.active_bots().count()
    }

    /// Identifier of the active bot standing at `pos`.
    #[must_use]
    pub fn bot_at(&self, pos: Pos) -> Option<BotId> {
        self.active_bots()
            .find(|bot| bot.position() == pos)
            .map(Bot::bid)
    }

    /// Validates the invariants every reachable state satisfies.
    ///
    /// Active bots stand on distinct, void, in-bounds voxels; every
    /// identifier in `1..=40` is claimed at most once, either as an active
    /// bot or as a seed; a state has active bots exactly when it is not
    /// halted; and under low harmonics every full voxel is grounded.
    pub fn check_well_formed(&self) -> Result<(), SetupError> {
        if self.bots.len() != BOT_SLOTS {
            return Err(SetupError::SlotCount {
                expected: BOT_SLOTS,
                actual: self.bots.len(),
            });
        }
        for (slot, bot) in self.bots.iter().enumerate() {
            if bot.bid().index() != slot {
                return Err(SetupError::SlotMismatch {
                    slot,
                    bid: bot.bid(),
                });
            }
        }
        if self.bots[0].is_active() {
            return Err(SetupError::ReservedSlotActive);
        }
        ensure_same_resolution(&self.matrix, &self.target)?;

        let mut claimed = [false; BOT_SLOTS];
        let mut occupied: HashMap<Pos, BotId> = HashMap::new();
        for bot in self.active_bots() {
            let (bid, pos) = (bot.bid(), bot.position());
            claimed[bid.index()] = true;
            if !self.matrix.contains(pos) {
                return Err(SetupError::BotOutOfBounds { bid, pos });
            }
            if self.matrix.get(pos) {
                return Err(SetupError::BotInsideMatter { bid, pos });
            }
            if let Some(first) = occupied.insert(pos, bid) {
                return Err(SetupError::SharedPosition {
                    first,
                    second: bid,
                    pos,
                });
            }
        }

        for bot in self.active_bots() {
            for &seed in bot.seeds() {
                if !seed.is_valid() {
                    return Err(SetupError::InvalidSeed {
                        bid: bot.bid(),
                        seed,
                    });
                }
                if std::mem::replace(&mut claimed[seed.index()], true) {
                    return Err(SetupError::DuplicateIdentifier { bid: seed });
                }
            }
        }

        let active = occupied.len();
        if self.halted && active > 0 {
            return Err(SetupError::ActiveAfterHalt { active });
        }
        if !self.halted && active == 0 {
            return Err(SetupError::NoActiveBots);
        }

        if self.harmonics == Harmonics::Low {
            let floating = self.matrix.num_full() - self.matrix.num_grounded_voxels();
            if floating > 0 {
                return Err(SetupError::Ungrounded { floating });
            }
        }

        Ok(())
    }

    pub(crate) fn matrix_mut(&mut self) -> &mut Matrix {
        &mut self.matrix
    }

    pub(crate) fn bot_mut(&mut self, bid: BotId) -> Option<&mut Bot> {
        self.bots.get_mut(bid.index())
    }

    pub(crate) fn install_bot(&mut self, bot: Bot) {
        if let Some(slot) = self.bots.get_mut(bot.bid().index()) {
            *slot = bot;
        }
    }

    pub(crate) fn add_energy(&mut self, delta: i64) {
        self.energy += delta;
    }

    pub(crate) fn flip_harmonics(&mut self) {
        self.harmonics = self.harmonics.flipped();
    }

    pub(crate) fn halt(&mut self) {
        self.halted = true;
    }
}

fn ensure_same_resolution(source: &Matrix, target: &Matrix) -> Result<(), SetupError> {
    if source.resolution() == target.resolution() {
        Ok(())
    } else {
        Err(SetupError::ResolutionMismatch {
            source_resolution: source.resolution(),
            target_resolution: target.resolution(),
        })
    }
}
