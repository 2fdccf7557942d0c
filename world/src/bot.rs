//! Per-bot state stored inside the simulation.

use nanobot_core::{BotId, Pos};
use serde::{Deserialize, Serialize};

/// A nanobot slot.
///
/// Inactive slots keep their identifier; their position and seeds are
/// meaningless until a fission activates them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bot {
    bid: BotId,
    position: Pos,
    seeds: Vec<BotId>,
    active: bool,
}

impl Bot {
    /// Creates an active bot at `position` holding `seeds`.
    #[must_use]
    pub fn new(bid: BotId, position: Pos, mut seeds: Vec<BotId>) -> Self {
        seeds.sort_unstable();
        Self {
            bid,
            position,
            seeds,
            active: true,
        }
    }

    /// Creates an inactive slot for `bid`.
    #[must_use]
    pub const fn inactive(bid: BotId) -> Self {
        Self {
            bid,
            position: Pos::ORIGIN,
            seeds: Vec::new(),
            active: false,
        }
    }

    /// Identifier of the bot.
    #[must_use]
    pub const fn bid(&self) -> BotId {
        self.bid
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Pos {
        self.position
    }

    /// Identifiers this bot may hand out through fission, ascending.
    #[must_use]
    pub fn seeds(&self) -> &[BotId] {
        &self.seeds
    }

    /// Reports whether the bot takes part in the current step.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_position(&mut self, position: Pos) {
        self.position = position;
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
        self.seeds.clear();
    }

    /// Splits off the seeds for a child: the child takes the first seed as
    /// its identifier and the next `m` seeds as its own.
    ///
    /// Callers check that at least `m + 1` seeds are held.
    pub(crate) fn split_seeds(&mut self, m: usize) -> (BotId, Vec<BotId>) {
        let mut handed: Vec<BotId> = self.seeds.drain(..=m).collect();
        let child = handed.remove(0);
        (child, handed)
    }

    pub(crate) fn absorb(&mut self, other: BotId, seeds: &[BotId]) {
        self.seeds.push(other);
        self.seeds.extend_from_slice(seeds);
        self.seeds.sort_unstable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[u8]) -> Vec<BotId> {
        values.iter().copied().map(BotId::new).collect()
    }

    #[test]
    fn seeds_are_kept_sorted() {
        let bot = Bot::new(BotId::new(1), Pos::ORIGIN, ids(&[5, 2, 9]));
        assert_eq!(bot.seeds(), ids(&[2, 5, 9]).as_slice());
        assert!(bot.is_active());
        assert!(!Bot::inactive(BotId::new(3)).is_active());
    }

    #[test]
    fn split_then_absorb_restores_seeds() {
        let mut bot = Bot::new(BotId::new(1), Pos::ORIGIN, ids(&[2, 3, 4, 5, 6]));
        let (child, handed) = bot.split_seeds(2);
        assert_eq!(child, BotId::new(2));
        assert_eq!(handed, ids(&[3, 4]));
        assert_eq!(bot.seeds(), ids(&[5, 6]).as_slice());

        bot.absorb(child, &handed);
        assert_eq!(bot.seeds(), ids(&[2, 3, 4, 5, 6]).as_slice());
    }

    #[test]
    fn split_with_zero_seeds_hands_out_only_the_identifier() {
        let mut bot = Bot::new(BotId::new(1), Pos::ORIGIN, ids(&[7, 8]));
        let (child, handed) = bot.split_seeds(0);
        assert_eq!(child, BotId::new(7));
        assert!(handed.is_empty());
        assert_eq!(bot.seeds(), ids(&[8]).as_slice());
    }
}
