//! Per-command semantics: preconditions, volatile footprints and effects.
//!
//! Every function takes the whole step plan because fusions and group
//! commands depend on what the other bots issued in the same step.

use nanobot_core::{BotId, Command, Diff, Harmonics, Pos, Region};

use crate::{
    config::EmulatorConfig,
    error::PreconditionError,
    state::{State, BOT_SLOTS},
    Bot,
};

const FUSION_ENERGY: i64 = -24;
const FISSION_ENERGY: i64 = 24;
const FILL_ENERGY: i64 = 12;
const FILL_FULL_ENERGY: i64 = 6;
const VOID_ENERGY: i64 = -12;
const VOID_EMPTY_ENERGY: i64 = 3;

/// Commands issued for one step, indexed by bot identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepPlan {
    commands: Vec<Option<Command>>,
}

impl Default for StepPlan {
    fn default() -> Self {
        Self {
            commands: vec![None; BOT_SLOTS],
        }
    }
}

impl StepPlan {
    /// Creates a plan with no commands assigned.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `command` to `bid`, replacing any earlier assignment.
    pub fn assign(&mut self, bid: BotId, command: Command) {
        if let Some(slot) = self.commands.get_mut(bid.index()) {
            *slot = Some(command);
        }
    }

    /// Command assigned to `bid`.
    #[must_use]
    pub fn command(&self, bid: BotId) -> Option<Command> {
        self.commands.get(bid.index()).copied().flatten()
    }

    /// Number of assigned commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.iter().filter(|slot| slot.is_some()).count()
    }

    /// Reports whether no command is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.iter().all(Option::is_none)
    }

    /// Removes every assignment.
    pub fn clear(&mut self) {
        self.commands.fill(None);
    }
}

/// Whether checks that need the complete plan are performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Pairing {
    Required,
    Deferred,
}

/// Checks whether `bid` may execute `command` in `state`.
///
/// The command's argument classes must already be validated. Fusion and
/// group commands look up their partners in `plan`.
pub fn check_preconditions(
    state: &State,
    config: &EmulatorConfig,
    plan: &StepPlan,
    bid: BotId,
    command: Command,
) -> Result<(), PreconditionError> {
    check_with(state, config, plan, bid, command, Pairing::Required)
}

pub(crate) fn check_with(
    state: &State,
    config: &EmulatorConfig,
    plan: &StepPlan,
    bid: BotId,
    command: Command,
    pairing: Pairing,
) -> Result<(), PreconditionError> {
    let pos = position_of(state, bid);
    let matrix = state.matrix();
    let in_bounds = |target: Pos| {
        if matrix.contains(target) {
            Ok(())
        } else {
            Err(PreconditionError::OutOfBounds { pos: target })
        }
    };

    match command {
        Command::Halt => {
            let active = state.num_active();
            if active != 1 {
                return Err(PreconditionError::HaltWithCompanions { active });
            }
            if bid != BotId::FIRST {
                return Err(PreconditionError::HaltByWrongBot);
            }
            if pos != Pos::ORIGIN {
                return Err(PreconditionError::HaltAwayFromOrigin { pos });
            }
            if state.harmonics() == Harmonics::High {
                return Err(PreconditionError::HaltInHighHarmonics);
            }
            if config.require_target_on_halt && !state.target_reached() {
                return Err(PreconditionError::HaltBeforeTarget);
            }
            Ok(())
        }
        Command::Wait | Command::Flip => Ok(()),
        Command::SMove { lld } => check_segment(state, pos, lld),
        Command::LMove { sld1, sld2 } => {
            check_segment(state, pos, sld1)?;
            check_segment(state, pos + sld1, sld2)
        }
        Command::FusionP { nd } | Command::FusionS { nd } => {
            let partner = pos + nd;
            in_bounds(partner)?;
            if pairing == Pairing::Deferred {
                return Ok(());
            }
            let primary = matches!(command, Command::FusionS { .. });
            fusion_partner(state, plan, pos, nd, primary)
                .map(|_| ())
                .ok_or(PreconditionError::NoFusionPartner { pos: partner })
        }
        Command::Fission { nd, m } => {
            let target = pos + nd;
            in_bounds(target)?;
            if matrix.get(target) {
                return Err(PreconditionError::Blocked { pos: target });
            }
            let available = state.bot(bid).map_or(0, |bot| bot.seeds().len());
            let required = usize::from(m) + 1;
            if available < required {
                return Err(PreconditionError::InsufficientSeeds {
                    required,
                    available,
                });
            }
            Ok(())
        }
        Command::Fill { nd } | Command::Void { nd } => in_bounds(pos + nd),
        Command::GFill { nd, fd } | Command::GVoid { nd, fd } => {
            let corner = pos + nd;
            in_bounds(corner)?;
            in_bounds(corner + fd)?;
            let region = Region::new(corner, corner + fd);
            // the leader's own position is part of its footprint, so
            // interference alone would not catch it standing in the box
            if region.contains(pos) {
                return Err(PreconditionError::MemberInsideGroup { bid, pos });
            }
            if pairing == Pairing::Deferred {
                return Ok(());
            }
            check_group(state, plan, command, region)
        }
    }
}

/// Voxels `bid` touches while executing `command`.
///
/// A group command's box is attributed to the member with the lowest
/// identifier; the other members only claim their own position.
#[must_use]
pub fn volatiles(state: &State, plan: &StepPlan, bid: BotId, command: Command) -> Vec<Pos> {
    let pos = position_of(state, bid);
    match command {
        Command::Halt
        | Command::Wait
        | Command::Flip
        | Command::FusionP { .. }
        | Command::FusionS { .. } => vec![pos],
        Command::SMove { lld } => segment(pos, lld).collect(),
        Command::LMove { sld1, sld2 } => segment(pos, sld1)
            .chain(segment(pos + sld1, sld2).skip(1))
            .collect(),
        Command::Fission { nd, .. } | Command::Fill { nd } | Command::Void { nd } => {
            vec![pos, pos + nd]
        }
        Command::GFill { nd, fd } | Command::GVoid { nd, fd } => {
            let corner = pos + nd;
            let region = Region::new(corner, corner + fd);
            let mut footprint = vec![pos];
            let leader = group_members(state, plan, command, region)
                .first()
                .map(|&(member, _)| member);
            if leader == Some(bid) {
                footprint.extend(region.iter());
            }
            footprint
        }
    }
}

/// Applies `command` for `bid`, returning whether the matrix changed.
///
/// Preconditions must hold; nothing is re-checked here.
pub fn execute(state: &mut State, plan: &StepPlan, bid: BotId, command: Command) -> bool {
    let pos = position_of(state, bid);
    match command {
        Command::Halt => {
            if let Some(bot) = state.bot_mut(bid) {
                bot.deactivate();
            }
            state.halt();
            false
        }
        Command::Wait => false,
        Command::Flip => {
            state.flip_harmonics();
            false
        }
        Command::SMove { lld } => {
            move_bot(state, bid, pos + lld);
            state.add_energy(2 * i64::from(lld.mlen()));
            false
        }
        Command::LMove { sld1, sld2 } => {
            move_bot(state, bid, pos + sld1 + sld2);
            state.add_energy(2 * i64::from(sld1.mlen() + 2 + sld2.mlen()));
            false
        }
        Command::FusionP { nd } => {
            let Some(secondary) = fusion_partner(state, plan, pos, nd, false) else {
                return false;
            };
            let Some(absorbed) = state.bot_mut(secondary).map(|bot| {
                let seeds = bot.seeds().to_vec();
                bot.deactivate();
                seeds
            }) else {
                return false;
            };
            if let Some(primary) = state.bot_mut(bid) {
                primary.absorb(secondary, &absorbed);
            }
            state.add_energy(FUSION_ENERGY);
            false
        }
        Command::FusionS { .. } => false,
        Command::Fission { nd, m } => {
            let Some((child, seeds)) = state.bot_mut(bid).map(|bot| bot.split_seeds(usize::from(m)))
            else {
                return false;
            };
            state.install_bot(Bot::new(child, pos + nd, seeds));
            state.add_energy(FISSION_ENERGY);
            false
        }
        Command::Fill { nd } => fill(state, pos + nd),
        Command::Void { nd } => void(state, pos + nd),
        Command::GFill { nd, fd } | Command::GVoid { nd, fd } => {
            let corner = pos + nd;
            let region = Region::new(corner, corner + fd);
            let leader = group_members(state, plan, command, region)
                .first()
                .map(|&(member, _)| member);
            if leader != Some(bid) {
                return false;
            }

            let mut changed = false;
            for voxel in region.iter() {
                changed |= if matches!(command, Command::GFill { .. }) {
                    fill(state, voxel)
                } else {
                    void(state, voxel)
                };
            }
            changed
        }
    }
}

fn position_of(state: &State, bid: BotId) -> Pos {
    state.bot(bid).map_or(Pos::ORIGIN, Bot::position)
}

fn move_bot(state: &mut State, bid: BotId, destination: Pos) {
    if let Some(bot) = state.bot_mut(bid) {
        bot.set_position(destination);
    }
}

fn fill(state: &mut State, voxel: Pos) -> bool {
    if state.matrix().get(voxel) {
        state.add_energy(FILL_FULL_ENERGY);
        false
    } else {
        state.matrix_mut().set(voxel, true);
        state.add_energy(FILL_ENERGY);
        true
    }
}

fn void(state: &mut State, voxel: Pos) -> bool {
    if state.matrix().get(voxel) {
        state.matrix_mut().set(voxel, false);
        state.add_energy(VOID_ENERGY);
        true
    } else {
        state.add_energy(VOID_EMPTY_ENERGY);
        false
    }
}

/// Voxels of the straight segment from `start` to `start + diff`, inclusive.
fn segment(start: Pos, diff: Diff) -> impl Iterator<Item = Pos> {
    let step = diff.signum();
    (0..=diff.mlen()).map(move |i| start + step * i)
}

fn check_segment(state: &State, start: Pos, diff: Diff) -> Result<(), PreconditionError> {
    let matrix = state.matrix();
    for pos in segment(start, diff) {
        if !matrix.contains(pos) {
            return Err(PreconditionError::OutOfBounds { pos });
        }
        if matrix.get(pos) {
            return Err(PreconditionError::Blocked { pos });
        }
    }
    Ok(())
}

/// First active bot at `pos + nd` whose command points back at `pos`.
///
/// With `want_primary` the partner must have issued `FusionP`, otherwise
/// `FusionS`.
fn fusion_partner(
    state: &State,
    plan: &StepPlan,
    pos: Pos,
    nd: Diff,
    want_primary: bool,
) -> Option<BotId> {
    let partner_pos = pos + nd;
    state.active_bots().find_map(|other| {
        if other.position() != partner_pos {
            return None;
        }
        let back = match plan.command(other.bid())? {
            Command::FusionP { nd } if want_primary => nd,
            Command::FusionS { nd } if !want_primary => nd,
            _ => return None,
        };
        (partner_pos + back == pos).then_some(other.bid())
    })
}

/// Bots issuing the same kind of group command over `region`, ascending,
/// with the corner each of them names.
fn group_members(
    state: &State,
    plan: &StepPlan,
    command: Command,
    region: Region,
) -> Vec<(BotId, Pos)> {
    let filling = matches!(command, Command::GFill { .. });
    state
        .active_bots()
        .filter_map(|bot| {
            let (nd, fd) = match plan.command(bot.bid())? {
                Command::GFill { nd, fd } if filling => (nd, fd),
                Command::GVoid { nd, fd } if !filling => (nd, fd),
                _ => return None,
            };
            let corner = bot.position() + nd;
            (Region::new(corner, corner + fd) == region).then_some((bot.bid(), corner))
        })
        .collect()
}

fn check_group(
    state: &State,
    plan: &StepPlan,
    command: Command,
    region: Region,
) -> Result<(), PreconditionError> {
    let members = group_members(state, plan, command, region);
    let required = region.corners().len();
    if members.len() != required {
        return Err(PreconditionError::IncompleteGroup {
            region_min: region.min_corner(),
            region_max: region.max_corner(),
            members: members.len(),
            required,
        });
    }

    let mut corners: Vec<Pos> = members.iter().map(|&(_, corner)| corner).collect();
    corners.sort_unstable();
    if let Some(pair) = corners.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(PreconditionError::SharedCorner { pos: pair[0] });
    }
    Ok(())
}
