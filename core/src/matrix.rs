//! Bit-packed voxel matrix and the model binary format.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{
    error::ModelError,
    geometry::{Pos, Region},
};

/// Largest grid side accepted by the model format.
pub const MAX_RESOLUTION: u32 = 250;

/// Cubic grid of voxels, each either full or void.
///
/// Voxel `(x, y, z)` lives at linear index `x*R*R + y*R + z`; bit `i` is
/// stored as `1 << (i % 8)` of byte `i / 8`, which is also the layout of the
/// model files. Out-of-bounds access panics: the emulator validates every
/// position before touching the matrix. Deserialized matrices are checked
/// for a consistent size and voxel count before they can be used.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PackedMatrix")]
pub struct Matrix {
    resolution: u32,
    num_full: usize,
    data: Vec<u8>,
}

impl Matrix {
    /// Creates an empty matrix of side `resolution`.
    #[must_use]
    pub fn new(resolution: u32) -> Self {
        Self {
            resolution,
            num_full: 0,
            data: vec![0; byte_len(resolution)],
        }
    }

    /// Parses a model file: the side length followed by the packed voxels.
    pub fn parse(bytes: &[u8]) -> Result<Self, ModelError> {
        let (&side, payload) = bytes.split_first().ok_or(ModelError::Empty)?;
        let resolution = u32::from(side);
        if resolution > MAX_RESOLUTION {
            return Err(ModelError::ResolutionTooLarge { resolution });
        }

        let expected = byte_len(resolution);
        if payload.len() != expected {
            return Err(ModelError::LengthMismatch {
                expected,
                actual: payload.len(),
            });
        }

        let mut data = payload.to_vec();
        let tail_bits = volume(resolution) % 8;
        if tail_bits != 0 {
            if let Some(last) = data.last_mut() {
                *last &= (1u8 << tail_bits) - 1;
            }
        }
        let num_full = data.iter().map(|byte| byte.count_ones() as usize).sum();

        Ok(Self {
            resolution,
            num_full,
            data,
        })
    }

    /// Encodes the matrix in the model file format.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.data.len() + 1);
        bytes.push(self.resolution as u8);
        bytes.extend_from_slice(&self.data);
        bytes
    }

    /// Side length of the grid.
    #[must_use]
    pub const fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Number of full voxels.
    #[must_use]
    pub const fn num_full(&self) -> usize {
        self.num_full
    }

    /// Reports whether `pos` lies within the grid.
    #[must_use]
    pub const fn contains(&self, pos: Pos) -> bool {
        pos.is_inside(self.resolution)
    }

    /// Reads the voxel at `pos`.
    #[must_use]
    pub fn get(&self, pos: Pos) -> bool {
        let (byte, mask) = self.locate(pos);
        self.data[byte] & mask != 0
    }

    /// Writes the voxel at `pos`, keeping the full-voxel count in sync.
    pub fn set(&mut self, pos: Pos, value: bool) {
        let (byte, mask) = self.locate(pos);
        let previous = self.data[byte] & mask != 0;
        if previous == value {
            return;
        }

        if value {
            self.data[byte] |= mask;
            self.num_full += 1;
        } else {
            self.data[byte] &= !mask;
            self.num_full -= 1;
        }
    }

    /// Iterates over every full voxel in index order.
    pub fn full_voxels(&self) -> impl Iterator<Item = Pos> + '_ {
        let resolution = self.resolution;
        (0..volume(resolution))
            .filter(move |&index| self.data[index / 8] & (1 << (index % 8)) != 0)
            .map(move |index| Pos::unpack(resolution, index))
    }

    /// Full voxels connected to the ground plane through face-adjacent full voxels.
    ///
    /// The traversal is seeded from the `y = 0` plane in x-major order and is
    /// breadth-first, so repeated calls on the same matrix return the same
    /// sequence.
    #[must_use]
    pub fn grounded_voxels(&self) -> Vec<Pos> {
        let mut grounded = Vec::new();
        self.flood_from_ground(|pos| grounded.push(pos));
        grounded
    }

    /// Number of grounded voxels.
    #[must_use]
    pub fn num_grounded_voxels(&self) -> usize {
        let mut count = 0;
        self.flood_from_ground(|_| count += 1);
        count
    }

    /// Every full voxel is grounded.
    #[must_use]
    pub fn is_grounded(&self) -> bool {
        self.num_full == 0 || self.num_grounded_voxels() == self.num_full
    }

    /// Number of full voxels in the box spanned by two in-bounds corners.
    #[must_use]
    pub fn count_inside_region(&self, a: Pos, b: Pos) -> usize {
        Region::new(a, b).iter().filter(|&pos| self.get(pos)).count()
    }

    fn flood_from_ground<F>(&self, mut visit: F)
    where
        F: FnMut(Pos),
    {
        if self.num_full == 0 {
            return;
        }

        let resolution = self.resolution as i32;
        let mut visited = Matrix::new(self.resolution);
        let mut queue = VecDeque::new();

        for x in 0..resolution {
            for z in 0..resolution {
                let seed = Pos::new(x, 0, z);
                if !self.get(seed) || visited.get(seed) {
                    continue;
                }

                visited.set(seed, true);
                queue.push_back(seed);

                while let Some(pos) = queue.pop_front() {
                    visit(pos);
                    for neighbor in pos.adjacent(self.resolution) {
                        if self.get(neighbor) && !visited.get(neighbor) {
                            visited.set(neighbor, true);
                            queue.push_back(neighbor);
                        }
                    }
                }
            }
        }
    }

    fn locate(&self, pos: Pos) -> (usize, u8) {
        assert!(
            pos.is_inside(self.resolution),
            "voxel {pos} outside a matrix of resolution {}",
            self.resolution
        );
        let index = pos.pack(self.resolution);
        (index / 8, 1 << (index % 8))
    }
}

#[derive(Deserialize)]
struct PackedMatrix {
    resolution: u32,
    num_full: usize,
    data: Vec<u8>,
}

impl TryFrom<PackedMatrix> for Matrix {
    type Error = ModelError;

    fn try_from(packed: PackedMatrix) -> Result<Self, Self::Error> {
        let PackedMatrix {
            resolution,
            num_full,
            data,
        } = packed;
        if resolution > MAX_RESOLUTION {
            return Err(ModelError::ResolutionTooLarge { resolution });
        }
        let expected = byte_len(resolution);
        if data.len() != expected {
            return Err(ModelError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        let tail_bits = volume(resolution) % 8;
        if tail_bits != 0 && data.last().is_some_and(|last| last >> tail_bits != 0) {
            return Err(ModelError::PaddingBitsSet);
        }
        let counted: usize = data.iter().map(|byte| byte.count_ones() as usize).sum();
        if counted != num_full {
            return Err(ModelError::CountMismatch {
                recorded: num_full,
                counted,
            });
        }

        Ok(Self {
            resolution,
            num_full,
            data,
        })
    }
}

fn volume(resolution: u32) -> usize {
    let r = resolution as usize;
    r * r * r
}

fn byte_len(resolution: u32) -> usize {
    volume(resolution).div_ceil(8)
}
