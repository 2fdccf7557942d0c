use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use nanobot_core::{encode_trace, Command, Diff, Matrix};
use nanobot_world::{Emulator, State, Status};

#[test]
fn deterministic_replay_produces_identical_outcomes() {
    let first = replay(&scripted_commands());
    let second = replay(&scripted_commands());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.status, Status::Halted);
    assert_eq!(first.energy, 2470, "energy mismatch: {}", first.energy);
    assert_eq!(first.steps, 6);
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn changing_one_command_changes_the_fingerprint() {
    let baseline = replay(&scripted_commands());

    let mut altered_commands = scripted_commands();
    altered_commands[4] = Command::Fill {
        nd: Diff::new(1, 0, 0),
    };
    let altered = replay(&altered_commands);

    assert_eq!(altered.status, Status::Halted);
    assert_eq!(altered.energy, baseline.energy);
    assert_ne!(
        altered.fingerprint(),
        baseline.fingerprint(),
        "fingerprint should capture the matrix"
    );
}

fn scripted_commands() -> Vec<Command> {
    vec![
        Command::Fission {
            nd: Diff::new(1, 0, 0),
            m: 1,
        },
        Command::Fill {
            nd: Diff::new(0, 0, 1),
        },
        Command::SMove {
            lld: Diff::new(0, 0, 2),
        },
        Command::Wait,
        Command::Fill {
            nd: Diff::new(0, 0, 1),
        },
        Command::Void {
            nd: Diff::new(0, 0, 1),
        },
        Command::SMove {
            lld: Diff::new(0, 0, -2),
        },
        Command::FusionP {
            nd: Diff::new(1, 0, 0),
        },
        Command::FusionS {
            nd: Diff::new(-1, 0, 0),
        },
        Command::Halt,
    ]
}

fn replay(commands: &[Command]) -> ReplayOutcome {
    let mut emulator = Emulator::new(None, Some(Matrix::new(5))).expect("valid setup");
    emulator.set_trace(encode_trace(commands).expect("valid trace"));
    let energy = emulator.run_full().expect("trace halts");

    ReplayOutcome {
        status: emulator.status(),
        energy,
        steps: emulator.step_count(),
        state: emulator.snapshot(),
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    status: Status,
    energy: i64,
    steps: u64,
    state: State,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
