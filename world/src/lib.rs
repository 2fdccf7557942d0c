#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative simulation state and the step pipeline for the nanobot
//! emulator.
//!
//! A step decodes one command per active bot in ascending identifier order,
//! checks every precondition, rejects overlapping voxel footprints, charges
//! the passive energy and only then executes the commands. Nothing is
//! mutated until every command has passed its checks. Grounding is the one
//! exception: it can only be judged on the resulting matrix, so a step that
//! leaves matter floating stays applied and the emulator aborts.

mod bot;
mod config;
mod emulator;
mod error;
pub mod execution;
mod observer;
mod state;
mod step;

pub use bot::Bot;
pub use config::{EmulatorConfig, GroundingPolicy};
pub use emulator::{Emulator, Status};
pub use error::{ErrorKind, PreconditionError, SetupError, SimulationError};
pub use execution::StepPlan;
pub use observer::{Outcome, RunLabels, RunMode, RunObserver, RunReport};
pub use state::{State, BOT_SLOTS};
pub use step::{run_step, CommandList, CommandSource, StepReport};
