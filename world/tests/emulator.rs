use nanobot_core::{encode_trace, BotId, Command, Diff, Harmonics, Matrix, Pos};
use nanobot_world::{
    Bot, Emulator, EmulatorConfig, ErrorKind, PreconditionError, SimulationError, State, Status,
};

fn d(dx: i32, dy: i32, dz: i32) -> Diff {
    Diff::new(dx, dy, dz)
}

fn assembly(resolution: u32) -> Emulator {
    Emulator::new(None, Some(Matrix::new(resolution))).expect("valid setup")
}

fn position(emulator: &Emulator, bid: u8) -> Option<Pos> {
    emulator
        .state()
        .bot(BotId::new(bid))
        .filter(|bot| bot.is_active())
        .map(Bot::position)
}

#[test]
fn halting_immediately_costs_one_passive_step() {
    let mut emulator = assembly(1);
    emulator.set_trace(encode_trace(&[Command::Halt]).expect("valid trace"));
    assert_eq!(emulator.run_full(), Ok(23));
    assert_eq!(emulator.status(), Status::Halted);
    assert!(emulator.state().is_halted());
}

#[test]
fn straight_move_charges_twice_its_length() {
    let mut emulator = assembly(6);
    let status = emulator
        .run_commands(&[Command::SMove { lld: d(5, 0, 0) }])
        .expect("move is legal");
    assert_eq!(status, Status::Running);
    assert_eq!(position(&emulator, 1), Some(Pos::new(5, 0, 0)));
    assert_eq!(emulator.energy(), 10 + 20 + 216 * 3);
}

#[test]
fn filling_twice_does_not_double_count() {
    let mut emulator = assembly(3);
    let fill = Command::Fill { nd: d(1, 0, 0) };
    emulator.run_commands(&[fill]).expect("first fill");
    assert_eq!(emulator.energy(), 12 + 101);
    emulator.run_commands(&[fill]).expect("second fill");
    assert_eq!(emulator.energy(), 12 + 101 + 6 + 101);
    assert_eq!(emulator.state().matrix().num_full(), 1);
}

#[test]
fn filling_the_same_voxel_twice_in_one_step_interferes() {
    let mut emulator = assembly(3);
    emulator
        .run_commands(&[Command::Fission { nd: d(1, 0, 0), m: 0 }])
        .expect("fission");
    let before = emulator.snapshot();

    let error = emulator
        .run_commands(&[Command::Fill { nd: d(1, 0, 1) }, Command::Fill { nd: d(0, 0, 1) }])
        .expect_err("both bots fill (1, 0, 1)");
    assert_eq!(
        error,
        SimulationError::Interference {
            pos: Pos::new(1, 0, 1),
            first: BotId::new(1),
            second: BotId::new(2),
        }
    );
    assert_eq!(error.kind(), ErrorKind::Interference);
    assert!(emulator.aborted());
    assert_eq!(emulator.snapshot(), before, "checks never mutate the state");
}

#[test]
fn disjoint_fills_execute_together() {
    let mut emulator = assembly(3);
    emulator
        .run_commands(&[
            Command::Fission { nd: d(1, 0, 0), m: 0 },
            Command::Fill { nd: d(0, 0, 1) },
            Command::Fill { nd: d(0, 0, 1) },
        ])
        .expect("fills are disjoint");
    let matrix = emulator.state().matrix();
    assert!(matrix.get(Pos::new(0, 0, 1)));
    assert!(matrix.get(Pos::new(1, 0, 1)));
}

#[test]
fn moving_into_a_neighbour_interferes() {
    let mut emulator = assembly(4);
    let error = emulator
        .run_commands(&[
            Command::Fission { nd: d(0, 0, 1), m: 0 },
            Command::SMove { lld: d(0, 0, 2) },
            Command::Wait,
        ])
        .expect_err("bot 1 sweeps through bot 2");
    assert_eq!(
        error,
        SimulationError::Interference {
            pos: Pos::new(0, 0, 1),
            first: BotId::new(1),
            second: BotId::new(2),
        }
    );
}

#[test]
fn fission_then_fusion_restores_the_seed_list() {
    let mut emulator = assembly(3);
    let initial_seeds = emulator
        .state()
        .bot(BotId::FIRST)
        .map(|bot| bot.seeds().to_vec())
        .expect("bot 1 exists");

    emulator
        .run_commands(&[Command::Fission { nd: d(1, 0, 0), m: 5 }])
        .expect("fission");
    let child = emulator.state().bot(BotId::new(2)).expect("slot exists");
    assert!(child.is_active());
    assert_eq!(child.position(), Pos::new(1, 0, 0));
    assert_eq!(
        child.seeds(),
        (3..=7).map(BotId::new).collect::<Vec<_>>().as_slice()
    );

    emulator
        .run_commands(&[
            Command::FusionP { nd: d(1, 0, 0) },
            Command::FusionS { nd: d(-1, 0, 0) },
            Command::Halt,
        ])
        .expect("fusion then halt");
    assert_eq!(emulator.status(), Status::Halted);
    assert_eq!(
        emulator.state().bot(BotId::FIRST).map(|bot| bot.seeds().to_vec()),
        Some(Vec::new()),
        "halting clears the last bot"
    );
    assert_eq!(emulator.energy(), (20 + 81 + 24) + (40 + 81 - 24) + (20 + 81));

    let mut replay = assembly(3);
    replay
        .run_commands(&[
            Command::Fission { nd: d(1, 0, 0), m: 5 },
            Command::FusionP { nd: d(1, 0, 0) },
            Command::FusionS { nd: d(-1, 0, 0) },
        ])
        .expect("fission then fusion");
    let seeds = replay
        .state()
        .bot(BotId::FIRST)
        .map(|bot| bot.seeds().to_vec());
    assert_eq!(seeds, Some(initial_seeds));
    assert!(!replay.state().bot(BotId::new(2)).is_some_and(Bot::is_active));
}

#[test]
fn secondary_with_lower_id_still_fuses() {
    let mut emulator = assembly(3);
    emulator
        .run_commands(&[
            Command::Fission { nd: d(1, 0, 0), m: 0 },
            Command::FusionS { nd: d(1, 0, 0) },
            Command::FusionP { nd: d(-1, 0, 0) },
        ])
        .expect("bot 2 absorbs bot 1");
    assert_eq!(emulator.state().active_bot_ids(), vec![BotId::new(2)]);
    let survivor = emulator.state().bot(BotId::new(2)).expect("slot exists");
    assert_eq!(survivor.seeds().len(), 39);
}

fn group_state() -> State {
    let bots = vec![
        Bot::new(BotId::new(1), Pos::new(1, 1, 1), Vec::new()),
        Bot::new(BotId::new(2), Pos::new(2, 1, 1), Vec::new()),
        Bot::new(BotId::new(3), Pos::new(1, 1, 2), Vec::new()),
        Bot::new(BotId::new(4), Pos::new(2, 1, 2), Vec::new()),
    ];
    State::from_parts(Matrix::new(4), Matrix::new(4), bots, 0, Harmonics::Low, false)
        .expect("well-formed state")
}

fn group_commands(fill: bool) -> Vec<Command> {
    let down = d(0, -1, 0);
    [d(1, 0, 1), d(-1, 0, 1), d(1, 0, -1), d(-1, 0, -1)]
        .into_iter()
        .map(|fd| {
            if fill {
                Command::GFill { nd: down, fd }
            } else {
                Command::GVoid { nd: down, fd }
            }
        })
        .collect()
}

#[test]
fn group_fill_covers_the_box_once() {
    let mut emulator = assembly(4);
    emulator.set_state(group_state()).expect("state installs");

    emulator
        .run_commands(&group_commands(true))
        .expect("complete group");
    let matrix = emulator.state().matrix();
    assert_eq!(matrix.num_full(), 4);
    assert_eq!(matrix.count_inside_region(Pos::new(1, 0, 1), Pos::new(2, 0, 2)), 4);
    assert_eq!(emulator.energy(), 4 * 12 + 4 * 20 + 64 * 3);

    emulator
        .run_commands(&group_commands(false))
        .expect("complete group");
    assert_eq!(emulator.state().matrix().num_full(), 0);
    assert_eq!(emulator.energy(), 4 * 12 - 4 * 12 + 2 * (4 * 20 + 64 * 3));
}

#[test]
fn group_member_inside_its_own_box_is_rejected() {
    let bots = vec![
        Bot::new(BotId::new(1), Pos::new(1, 0, 0), Vec::new()),
        Bot::new(BotId::new(2), Pos::new(3, 0, 0), Vec::new()),
    ];
    let state = State::from_parts(Matrix::new(4), Matrix::new(4), bots, 0, Harmonics::Low, false)
        .expect("well-formed state");
    let mut emulator = assembly(4);
    emulator.set_state(state.clone()).expect("state installs");

    let commands = [
        Command::GFill {
            nd: d(-1, 0, 0),
            fd: d(2, 0, 0),
        },
        Command::GFill {
            nd: d(-1, 0, 0),
            fd: d(-2, 0, 0),
        },
    ];
    let error = emulator
        .run_commands(&commands)
        .expect_err("leader stands in the box");
    assert_eq!(
        error,
        SimulationError::Precondition {
            bid: BotId::new(1),
            command: commands[0],
            source: PreconditionError::MemberInsideGroup {
                bid: BotId::new(1),
                pos: Pos::new(1, 0, 0),
            },
        }
    );
    assert_eq!(emulator.state(), &state);
    assert!(emulator.state().check_well_formed().is_ok());
}

#[test]
fn incomplete_group_fails_its_precondition() {
    let mut emulator = assembly(4);
    emulator.set_state(group_state()).expect("state installs");

    let mut commands = group_commands(true);
    commands[3] = Command::Wait;
    let error = emulator
        .run_commands(&commands)
        .expect_err("only three corners");
    assert_eq!(
        error,
        SimulationError::Precondition {
            bid: BotId::new(1),
            command: commands[0],
            source: PreconditionError::IncompleteGroup {
                region_min: Pos::new(1, 0, 1),
                region_max: Pos::new(2, 0, 2),
                members: 3,
                required: 4,
            },
        }
    );
}

#[test]
fn floating_fill_aborts_under_low_harmonics_but_not_high() {
    let mut emulator = assembly(3);
    let error = emulator
        .run_commands(&[Command::Fill { nd: d(0, 1, 1) }])
        .expect_err("voxel floats");
    assert_eq!(error.kind(), ErrorKind::Emulation);

    let mut emulator = assembly(3);
    emulator
        .run_commands(&[
            Command::Flip,
            Command::Fill { nd: d(0, 1, 1) },
            Command::Fill { nd: d(0, 0, 1) },
            Command::Flip,
            Command::Halt,
        ])
        .expect("support is added before returning to low harmonics");
    assert_eq!(emulator.status(), Status::Halted);
}

#[test]
fn strict_halt_waits_for_the_target() {
    let mut target = Matrix::new(3);
    target.set(Pos::new(0, 0, 1), true);
    let config = EmulatorConfig {
        require_target_on_halt: true,
        ..EmulatorConfig::default()
    };

    let mut early = Emulator::with_config(None, Some(target.clone()), config).expect("valid setup");
    let error = early
        .run_commands(&[Command::Halt])
        .expect_err("target not built");
    assert!(matches!(
        error,
        SimulationError::Precondition {
            source: PreconditionError::HaltBeforeTarget,
            ..
        }
    ));

    let mut built = Emulator::with_config(None, Some(target), config).expect("valid setup");
    built
        .run_commands(&[Command::Fill { nd: d(0, 0, 1) }, Command::Halt])
        .expect("target built");
    assert!(built.state().target_reached());
    assert_eq!(built.status(), Status::Halted);
}
