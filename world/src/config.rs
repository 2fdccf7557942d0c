//! Tunable emulator rules.

use serde::{Deserialize, Serialize};

/// When the emulator insists that every full voxel is grounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundingPolicy {
    /// After every step that changed the matrix or the harmonics, while
    /// harmonics are low.
    #[default]
    EveryStep,
    /// Only on the step that halts the simulation.
    AtHalt,
    /// Never.
    Never,
}

/// Rules applied by an [`crate::Emulator`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmulatorConfig {
    /// Grounding check timing.
    pub grounding: GroundingPolicy,
    /// Refuse `Halt` unless the matrix equals the target model.
    pub require_target_on_halt: bool,
}
