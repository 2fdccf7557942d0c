//! Errors raised while reading models, building commands and decoding traces.

use thiserror::Error;

use crate::geometry::Diff;

/// Reasons a model file cannot be parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The model contained no bytes at all.
    #[error("model is empty")]
    Empty,
    /// The declared side length exceeds the supported maximum.
    #[error("model resolution {resolution} exceeds the supported maximum")]
    ResolutionTooLarge {
        /// Declared side length.
        resolution: u32,
    },
    /// The voxel payload does not match the declared side length.
    #[error("model payload holds {actual} bytes, expected {expected}")]
    LengthMismatch {
        /// Payload length implied by the side length.
        expected: usize,
        /// Payload length actually provided.
        actual: usize,
    },
    /// Bits past the last voxel are set.
    #[error("padding bits past the last voxel are set")]
    PaddingBitsSet,
    /// The recorded full-voxel count disagrees with the payload.
    #[error("matrix records {recorded} full voxels but holds {counted}")]
    CountMismatch {
        /// Count stored alongside the voxels.
        recorded: usize,
        /// Set bits in the payload.
        counted: usize,
    },
}

/// Geometric classes a command argument must belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiffClass {
    /// Linear with Manhattan length at most 5.
    ShortLinear,
    /// Linear with Manhattan length at most 15.
    LongLinear,
    /// Adjacent or face-diagonal.
    Near,
    /// Non-zero with Chebyshev length at most 30.
    Far,
}

impl std::fmt::Display for DiffClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ShortLinear => "short linear",
            Self::LongLinear => "long linear",
            Self::Near => "near",
            Self::Far => "far",
        };
        f.write_str(name)
    }
}

/// A command argument failed its geometric class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("{command} requires a {expected} displacement, got {diff}")]
pub struct CommandError {
    /// Name of the command being constructed.
    pub command: &'static str,
    /// Class the argument must satisfy.
    pub expected: DiffClass,
    /// Offending argument.
    pub diff: Diff,
}

/// Reasons the trace decoder cannot produce the next command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TraceError {
    /// The trace ended in the middle of, or before, a command.
    #[error("unexpected end of trace at byte {offset}")]
    EndOfTrace {
        /// Offset of the first missing byte.
        offset: usize,
    },
    /// A linear displacement used the reserved axis selector 0.
    #[error("invalid axis selector in byte {byte:#010b} at offset {offset}")]
    InvalidAxis {
        /// Offset of the command's first byte.
        offset: usize,
        /// Byte carrying the selector.
        byte: u8,
    },
    /// The bytes decoded into an argument outside its class.
    #[error("ill-formed command at offset {offset}: {source}")]
    IllFormed {
        /// Offset of the command's first byte.
        offset: usize,
        /// Construction failure.
        source: CommandError,
    },
}
