//! Binary trace encoding.
//!
//! Every command starts with one byte whose low three bits (the tail)
//! select the instruction. Near displacements are packed as three base-3
//! digits above the tail; linear displacements carry a two-bit axis selector
//! and a biased magnitude in the following byte. `Halt`, `Wait` and `Flip`
//! occupy the reserved values 255, 254 and 253.

use crate::{
    command::Command,
    error::{CommandError, TraceError},
    geometry::{Axis, Diff, FAR_DISTANCE, LONG_DISTANCE, SHORT_DISTANCE},
};

const HALT: u8 = 0b1111_1111;
const WAIT: u8 = 0b1111_1110;
const FLIP: u8 = 0b1111_1101;

const TAIL_MASK: u8 = 0b111;
const TAIL_GVOID: u8 = 0b000;
const TAIL_GFILL: u8 = 0b001;
const TAIL_VOID: u8 = 0b010;
const TAIL_FILL: u8 = 0b011;
const TAIL_MOVE: u8 = 0b100;
const TAIL_FISSION: u8 = 0b101;
const TAIL_FUSION_S: u8 = 0b110;
const TAIL_FUSION_P: u8 = 0b111;
const LMOVE_FLAG: u8 = 0b1000;

/// Cursor over an owned byte trace that yields one command at a time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceReader {
    bytes: Vec<u8>,
    offset: usize,
}

impl TraceReader {
    /// Creates a reader positioned at the start of `bytes`.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Offset of the next unread byte.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Total length of the trace in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Reports whether the trace holds no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reports whether every byte has been consumed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    /// Rewinds the cursor to the start of the trace.
    pub fn rewind(&mut self) {
        self.offset = 0;
    }

    /// Decodes the next command.
    ///
    /// On failure the cursor is left after the bytes that were consumed; a
    /// trace that fails to decode is not meant to be resumed.
    pub fn next_command(&mut self) -> Result<Command, TraceError> {
        let start = self.offset;
        let byte = self.take()?;

        let command = match byte {
            HALT => Command::Halt,
            WAIT => Command::Wait,
            FLIP => Command::Flip,
            _ => match byte & TAIL_MASK {
                TAIL_FILL => Command::Fill {
                    nd: decode_near(byte),
                },
                TAIL_VOID => Command::Void {
                    nd: decode_near(byte),
                },
                TAIL_FUSION_S => Command::FusionS {
                    nd: decode_near(byte),
                },
                TAIL_FUSION_P => Command::FusionP {
                    nd: decode_near(byte),
                },
                TAIL_FISSION => Command::Fission {
                    nd: decode_near(byte),
                    m: self.take()?,
                },
                TAIL_MOVE => {
                    let second = self.take()?;
                    if byte & LMOVE_FLAG == 0 {
                        Command::SMove {
                            lld: decode_linear(
                                start,
                                byte,
                                byte >> 4,
                                second & 0b1_1111,
                                LONG_DISTANCE,
                            )?,
                        }
                    } else {
                        Command::LMove {
                            sld1: decode_linear(
                                start,
                                byte,
                                byte >> 4,
                                second & 0b1111,
                                SHORT_DISTANCE,
                            )?,
                            sld2: decode_linear(
                                start,
                                byte,
                                byte >> 6,
                                second >> 4,
                                SHORT_DISTANCE,
                            )?,
                        }
                    }
                }
                TAIL_GFILL => Command::GFill {
                    nd: decode_near(byte),
                    fd: self.take_far()?,
                },
                _ => Command::GVoid {
                    nd: decode_near(byte),
                    fd: self.take_far()?,
                },
            },
        };

        command
            .validate()
            .map_err(|source| TraceError::IllFormed {
                offset: start,
                source,
            })?;
        Ok(command)
    }

    fn take(&mut self) -> Result<u8, TraceError> {
        let byte = self
            .bytes
            .get(self.offset)
            .copied()
            .ok_or(TraceError::EndOfTrace {
                offset: self.offset,
            })?;
        self.offset += 1;
        Ok(byte)
    }

    fn take_far(&mut self) -> Result<Diff, TraceError> {
        let dx = i32::from(self.take()?) - FAR_DISTANCE;
        let dy = i32::from(self.take()?) - FAR_DISTANCE;
        let dz = i32::from(self.take()?) - FAR_DISTANCE;
        Ok(Diff::new(dx, dy, dz))
    }
}

/// Decodes a complete trace into its command sequence.
pub fn decode_trace(bytes: &[u8]) -> Result<Vec<Command>, TraceError> {
    let mut reader = TraceReader::new(bytes.to_vec());
    let mut commands = Vec::new();
    while !reader.is_exhausted() {
        commands.push(reader.next_command()?);
    }
    Ok(commands)
}

/// Appends the encoding of `command` to `out`.
pub fn encode_command(command: &Command, out: &mut Vec<u8>) -> Result<(), CommandError> {
    command.validate()?;

    match *command {
        Command::Halt => out.push(HALT),
        Command::Wait => out.push(WAIT),
        Command::Flip => out.push(FLIP),
        Command::SMove { lld } => {
            let (axis, magnitude) = encode_linear(lld, LONG_DISTANCE);
            out.extend_from_slice(&[axis << 4 | TAIL_MOVE, magnitude]);
        }
        Command::LMove { sld1, sld2 } => {
            let (axis1, magnitude1) = encode_linear(sld1, SHORT_DISTANCE);
            let (axis2, magnitude2) = encode_linear(sld2, SHORT_DISTANCE);
            out.extend_from_slice(&[
                axis2 << 6 | axis1 << 4 | LMOVE_FLAG | TAIL_MOVE,
                magnitude2 << 4 | magnitude1,
            ]);
        }
        Command::FusionP { nd } => out.push(encode_near(nd) << 3 | TAIL_FUSION_P),
        Command::FusionS { nd } => out.push(encode_near(nd) << 3 | TAIL_FUSION_S),
        Command::Fission { nd, m } => {
            out.extend_from_slice(&[encode_near(nd) << 3 | TAIL_FISSION, m]);
        }
        Command::Fill { nd } => out.push(encode_near(nd) << 3 | TAIL_FILL),
        Command::Void { nd } => out.push(encode_near(nd) << 3 | TAIL_VOID),
        Command::GFill { nd, fd } => {
            out.push(encode_near(nd) << 3 | TAIL_GFILL);
            out.extend_from_slice(&encode_far(fd));
        }
        Command::GVoid { nd, fd } => {
            out.push(encode_near(nd) << 3 | TAIL_GVOID);
            out.extend_from_slice(&encode_far(fd));
        }
    }
    Ok(())
}

/// Encodes a command sequence into a trace.
pub fn encode_trace(commands: &[Command]) -> Result<Vec<u8>, CommandError> {
    let mut out = Vec::with_capacity(commands.len() * 2);
    for command in commands {
        encode_command(command, &mut out)?;
    }
    Ok(out)
}

fn decode_near(byte: u8) -> Diff {
    let digits = i32::from(byte >> 3);
    Diff::new(digits / 9 - 1, digits / 3 % 3 - 1, digits % 3 - 1)
}

fn encode_near(nd: Diff) -> u8 {
    ((nd.dx() + 1) * 9 + (nd.dy() + 1) * 3 + (nd.dz() + 1)) as u8
}

fn decode_linear(
    offset: usize,
    byte: u8,
    selector: u8,
    magnitude: u8,
    bias: i32,
) -> Result<Diff, TraceError> {
    let axis = match selector & 0b11 {
        1 => Axis::X,
        2 => Axis::Y,
        3 => Axis::Z,
        _ => return Err(TraceError::InvalidAxis { offset, byte }),
    };
    Ok(Diff::along(axis, i32::from(magnitude) - bias))
}

fn encode_linear(diff: Diff, bias: i32) -> (u8, u8) {
    let Some(axis) = diff.linear_axis() else {
        return (0, 0);
    };
    let selector = match axis {
        Axis::X => 1,
        Axis::Y => 2,
        Axis::Z => 3,
    };
    (selector, (diff.axis_value(axis) + bias) as u8)
}

fn encode_far(fd: Diff) -> [u8; 3] {
    [
        (fd.dx() + FAR_DISTANCE) as u8,
        (fd.dy() + FAR_DISTANCE) as u8,
        (fd.dz() + FAR_DISTANCE) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiffClass;

    fn decode(bytes: &[u8]) -> Result<Command, TraceError> {
        TraceReader::new(bytes.to_vec()).next_command()
    }

    fn d(dx: i32, dy: i32, dz: i32) -> Diff {
        Diff::new(dx, dy, dz)
    }

    #[test]
    fn decodes_reference_vectors() {
        let cases: Vec<(Vec<u8>, Command)> = vec![
            (vec![0b1111_1111], Command::Halt),
            (vec![0b1111_1110], Command::Wait),
            (vec![0b1111_1101], Command::Flip),
            (vec![0b0001_0100, 0b0001_1011], Command::SMove { lld: d(12, 0, 0) }),
            (vec![0b0011_0100, 0b0000_1011], Command::SMove { lld: d(0, 0, -4) }),
            (
                vec![0b1001_1100, 0b0000_1000],
                Command::LMove {
                    sld1: d(3, 0, 0),
                    sld2: d(0, -5, 0),
                },
            ),
            (
                vec![0b1110_1100, 0b0111_0011],
                Command::LMove {
                    sld1: d(0, -2, 0),
                    sld2: d(0, 0, 2),
                },
            ),
            (vec![0b0011_1111], Command::FusionP { nd: d(-1, 1, 0) }),
            (vec![0b1001_1110], Command::FusionS { nd: d(1, -1, 0) }),
            (
                vec![0b0111_0101, 0b0000_0101],
                Command::Fission {
                    nd: d(0, 0, 1),
                    m: 5,
                },
            ),
            (vec![0b0101_0011], Command::Fill { nd: d(0, -1, 0) }),
            (vec![0b1011_1010], Command::Void { nd: d(1, 0, 1) }),
            (
                vec![0b0101_0001, 0b0010_1000, 0b0000_1111, 0b0011_0010],
                Command::GFill {
                    nd: d(0, -1, 0),
                    fd: d(10, -15, 20),
                },
            ),
            (
                vec![0b1011_0000, 0b0010_0011, 0b0010_0011, 0b0001_1001],
                Command::GVoid {
                    nd: d(1, 0, 0),
                    fd: d(5, 5, -5),
                },
            ),
        ];

        for (bytes, expected) in cases {
            assert_eq!(decode(&bytes), Ok(expected), "decoding {bytes:?}");
            let mut encoded = Vec::new();
            encode_command(&expected, &mut encoded).expect("valid command encodes");
            assert_eq!(encoded, bytes, "encoding {expected}");
        }
    }

    #[test]
    fn truncated_command_reports_end_of_trace() {
        assert_eq!(
            decode(&[0b0001_0100]),
            Err(TraceError::EndOfTrace { offset: 1 })
        );
        assert_eq!(decode(&[]), Err(TraceError::EndOfTrace { offset: 0 }));
    }

    #[test]
    fn out_of_class_arguments_are_ill_formed() {
        match decode(&[0b1111_1100, 0b1111_1100]) {
            Err(TraceError::IllFormed { offset: 0, source }) => {
                assert_eq!(source.command, "LMove");
                assert_eq!(source.expected, DiffClass::ShortLinear);
            }
            other => panic!("unexpected decode result: {other:?}"),
        }

        match decode(&[0b1111_0110]) {
            Err(TraceError::IllFormed { source, .. }) => {
                assert_eq!(source.command, "FusionS");
                assert_eq!(source.expected, DiffClass::Near);
            }
            other => panic!("unexpected decode result: {other:?}"),
        }
    }

    #[test]
    fn zero_axis_selector_is_rejected() {
        assert_eq!(
            decode(&[0b0000_0100, 0b0000_1111]),
            Err(TraceError::InvalidAxis {
                offset: 0,
                byte: 0b0000_0100
            })
        );
    }

    #[test]
    fn every_command_shape_survives_a_trace_round_trip() {
        let near: Vec<Diff> = (-1..=1)
            .flat_map(|dx| (-1..=1).flat_map(move |dy| (-1..=1).map(move |dz| d(dx, dy, dz))))
            .filter(Diff::is_near)
            .collect();
        let linear = |limit: i32| -> Vec<Diff> {
            Axis::ALL
                .into_iter()
                .flat_map(|axis| {
                    (1..=limit).flat_map(move |i| [Diff::along(axis, i), Diff::along(axis, -i)])
                })
                .collect()
        };
        let short = linear(SHORT_DISTANCE);
        let long = linear(LONG_DISTANCE);

        let mut commands = vec![Command::Halt, Command::Wait, Command::Flip];
        commands.extend(long.iter().map(|&lld| Command::SMove { lld }));
        for &sld1 in &short {
            commands.extend(short.iter().map(|&sld2| Command::LMove { sld1, sld2 }));
        }
        for &nd in &near {
            commands.push(Command::FusionP { nd });
            commands.push(Command::FusionS { nd });
            commands.push(Command::Fission { nd, m: 0 });
            commands.push(Command::Fission { nd, m: 255 });
            commands.push(Command::Fill { nd });
            commands.push(Command::Void { nd });
            commands.push(Command::GFill {
                nd,
                fd: d(10, 20, 30),
            });
            commands.push(Command::GVoid {
                nd,
                fd: d(-30, -20, -10),
            });
        }

        let trace = encode_trace(&commands).expect("all commands are valid");
        assert_eq!(decode_trace(&trace), Ok(commands));
    }

    #[test]
    fn encoder_refuses_invalid_commands() {
        let mut out = Vec::new();
        assert!(encode_command(&Command::Fill { nd: d(0, 0, 0) }, &mut out).is_err());
        assert!(out.is_empty());
    }
}
