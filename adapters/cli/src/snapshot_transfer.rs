use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use nanobot_world::State;
use serde::{Deserialize, Serialize};

const SNAPSHOT_DOMAIN: &str = "nanobot";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "nanobot:v1";
/// Delimiter used to separate the prefix, resolution and payload.
const FIELD_DELIMITER: char = ':';

/// Simulation state together with the trace position it was taken at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SessionSnapshot {
    /// Byte offset into the trace of the next command to decode.
    pub(crate) trace_offset: usize,
    /// Steps completed before the snapshot was taken.
    pub(crate) steps: u64,
    /// Full simulation state.
    pub(crate) state: State,
}

impl SessionSnapshot {
    /// Encodes the snapshot into a single line of text.
    pub(crate) fn encode(&self) -> Result<String, SnapshotTransferError> {
        let json = serde_json::to_vec(self).map_err(SnapshotTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{SNAPSHOT_HEADER}:{}:{encoded}",
            self.state.resolution()
        ))
    }

    /// Decodes a snapshot from its text representation.
    ///
    /// The state is not checked for well-formedness here; installing it in
    /// an emulator does that.
    pub(crate) fn decode(value: &str) -> Result<Self, SnapshotTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SnapshotTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(SnapshotTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(SnapshotTransferError::MissingVersion)?;
        let resolution = parts
            .next()
            .ok_or(SnapshotTransferError::MissingResolution)?;
        let payload = parts.next().ok_or(SnapshotTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(SnapshotTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(SnapshotTransferError::UnsupportedVersion(
                version.to_owned(),
            ));
        }

        let declared = parse_resolution(resolution)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(SnapshotTransferError::InvalidEncoding)?;
        let snapshot: Self =
            serde_json::from_slice(&bytes).map_err(SnapshotTransferError::InvalidPayload)?;

        let actual = snapshot.state.resolution();
        if actual != declared {
            return Err(SnapshotTransferError::ResolutionMismatch { declared, actual });
        }
        Ok(snapshot)
    }
}

/// Errors that can occur while encoding or decoding snapshot strings.
#[derive(Debug)]
pub(crate) enum SnapshotTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing.
    MissingPrefix,
    /// The version segment was missing.
    MissingVersion,
    /// The resolution segment was missing.
    MissingResolution,
    /// The payload segment was missing.
    MissingPayload,
    /// The prefix segment was not `nanobot`.
    InvalidPrefix(String),
    /// The version identifier is not supported.
    UnsupportedVersion(String),
    /// The resolution segment was not a number.
    InvalidResolution(String),
    /// The resolution segment disagrees with the decoded state.
    ResolutionMismatch {
        /// Resolution written in the header.
        declared: u32,
        /// Resolution of the decoded matrix.
        actual: u32,
    },
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for SnapshotTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "snapshot was empty"),
            Self::MissingPrefix => write!(f, "snapshot is missing the prefix"),
            Self::MissingVersion => write!(f, "snapshot is missing the version"),
            Self::MissingResolution => write!(f, "snapshot is missing the resolution"),
            Self::MissingPayload => write!(f, "snapshot is missing the payload"),
            Self::InvalidPrefix(prefix) => {
                write!(f, "snapshot prefix '{prefix}' is not supported")
            }
            Self::UnsupportedVersion(version) => {
                write!(f, "snapshot version '{version}' is not supported")
            }
            Self::InvalidResolution(resolution) => {
                write!(f, "could not parse resolution '{resolution}'")
            }
            Self::ResolutionMismatch { declared, actual } => write!(
                f,
                "snapshot declares resolution {declared} but holds a {actual}-voxel matrix"
            ),
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode snapshot payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not process snapshot payload: {error}")
            }
        }
    }
}

impl Error for SnapshotTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_resolution(resolution: &str) -> Result<u32, SnapshotTransferError> {
    resolution
        .trim()
        .parse::<u32>()
        .map_err(|_| SnapshotTransferError::InvalidResolution(resolution.to_owned()))
}

#[cfg(test)]
mod tests {
    use nanobot_core::{Matrix, Pos};

    use super::*;

    fn sample_state() -> State {
        let mut target = Matrix::new(4);
        target.set(Pos::new(1, 0, 1), true);
        State::new(None, Some(target)).expect("valid models")
    }

    #[test]
    fn round_trip_initial_state() {
        let snapshot = SessionSnapshot {
            trace_offset: 0,
            steps: 0,
            state: sample_state(),
        };

        let encoded = snapshot.encode().expect("snapshot encodes");
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:4:")));

        let decoded = SessionSnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn rejects_foreign_prefix_and_version() {
        assert!(matches!(
            SessionSnapshot::decode("layout:v1:4:e30"),
            Err(SnapshotTransferError::InvalidPrefix(prefix)) if prefix == "layout"
        ));
        assert!(matches!(
            SessionSnapshot::decode("nanobot:v9:4:e30"),
            Err(SnapshotTransferError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            SessionSnapshot::decode("   "),
            Err(SnapshotTransferError::EmptyPayload)
        ));
        assert!(matches!(
            SessionSnapshot::decode("nanobot:v1:4"),
            Err(SnapshotTransferError::MissingPayload)
        ));
    }

    #[test]
    fn rejects_resolution_disagreeing_with_payload() {
        let snapshot = SessionSnapshot {
            trace_offset: 3,
            steps: 2,
            state: sample_state(),
        };
        let encoded = snapshot.encode().expect("snapshot encodes");
        let tampered = encoded.replacen(":4:", ":5:", 1);

        assert!(matches!(
            SessionSnapshot::decode(&tampered),
            Err(SnapshotTransferError::ResolutionMismatch {
                declared: 5,
                actual: 4
            })
        ));
        assert!(matches!(
            SessionSnapshot::decode("nanobot:v1:four:e30"),
            Err(SnapshotTransferError::InvalidResolution(_))
        ));
    }

    #[test]
    fn rejects_a_matrix_with_missing_voxel_bytes() {
        let snapshot = SessionSnapshot {
            trace_offset: 0,
            steps: 0,
            state: sample_state(),
        };
        let mut value = serde_json::to_value(&snapshot).expect("snapshot serializes");
        value["state"]["matrix"]["data"] = serde_json::json!([]);
        let payload = STANDARD_NO_PAD.encode(serde_json::to_vec(&value).expect("json"));
        let tampered = format!("{SNAPSHOT_HEADER}:4:{payload}");

        assert!(matches!(
            SessionSnapshot::decode(&tampered),
            Err(SnapshotTransferError::InvalidPayload(_))
        ));
    }
}
