//! Grid coordinates, displacement vectors and axis-aligned regions.

use std::{
    fmt,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};

/// Largest Manhattan length of a short linear displacement.
pub const SHORT_DISTANCE: i32 = 5;
/// Largest Manhattan length of a long linear displacement.
pub const LONG_DISTANCE: i32 = 15;
/// Largest Chebyshev length of a far displacement.
pub const FAR_DISTANCE: i32 = 30;

/// The six face-adjacent unit displacements in the order -x, -y, -z, +x, +y, +z.
pub const FACE_DIRECTIONS: [Diff; 6] = [
    Diff::new(-1, 0, 0),
    Diff::new(0, -1, 0),
    Diff::new(0, 0, -1),
    Diff::new(1, 0, 0),
    Diff::new(0, 1, 0),
    Diff::new(0, 0, 1),
];

/// One of the three axes of the voxel grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    /// The x axis.
    X,
    /// The y axis; `y = 0` is the ground plane.
    Y,
    /// The z axis.
    Z,
}

impl Axis {
    /// All axes in x, y, z order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

/// Displacement between two grid positions.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Diff {
    dx: i32,
    dy: i32,
    dz: i32,
}

impl Diff {
    /// The zero displacement.
    pub const ZERO: Diff = Diff::new(0, 0, 0);

    /// Creates a displacement from its components.
    #[must_use]
    pub const fn new(dx: i32, dy: i32, dz: i32) -> Self {
        Self { dx, dy, dz }
    }

    /// Creates a linear displacement of `value` along `axis`.
    #[must_use]
    pub const fn along(axis: Axis, value: i32) -> Self {
        match axis {
            Axis::X => Self::new(value, 0, 0),
            Axis::Y => Self::new(0, value, 0),
            Axis::Z => Self::new(0, 0, value),
        }
    }

    /// X component.
    #[must_use]
    pub const fn dx(&self) -> i32 {
        self.dx
    }

    /// Y component.
    #[must_use]
    pub const fn dy(&self) -> i32 {
        self.dy
    }

    /// Z component.
    #[must_use]
    pub const fn dz(&self) -> i32 {
        self.dz
    }

    /// Component along the provided axis.
    #[must_use]
    pub const fn axis_value(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.dx,
            Axis::Y => self.dy,
            Axis::Z => self.dz,
        }
    }

    /// Manhattan length.
    #[must_use]
    pub const fn mlen(&self) -> i32 {
        self.dx.abs() + self.dy.abs() + self.dz.abs()
    }

    /// Chebyshev length.
    #[must_use]
    pub fn clen(&self) -> i32 {
        self.dx.abs().max(self.dy.abs()).max(self.dz.abs())
    }

    /// Number of non-zero components.
    #[must_use]
    pub const fn dimension(&self) -> u32 {
        (self.dx != 0) as u32 + (self.dy != 0) as u32 + (self.dz != 0) as u32
    }

    /// Exactly one component is non-zero.
    #[must_use]
    pub const fn is_linear(&self) -> bool {
        self.dimension() == 1
    }

    /// Axis of a linear displacement, `None` otherwise.
    #[must_use]
    pub const fn linear_axis(&self) -> Option<Axis> {
        if !self.is_linear() {
            None
        } else if self.dx != 0 {
            Some(Axis::X)
        } else if self.dy != 0 {
            Some(Axis::Y)
        } else {
            Some(Axis::Z)
        }
    }

    /// Linear with a Manhattan length of at most [`SHORT_DISTANCE`].
    #[must_use]
    pub const fn is_short_linear(&self) -> bool {
        self.is_linear() && self.mlen() <= SHORT_DISTANCE
    }

    /// Linear with a Manhattan length of at most [`LONG_DISTANCE`].
    #[must_use]
    pub const fn is_long_linear(&self) -> bool {
        self.is_linear() && self.mlen() <= LONG_DISTANCE
    }

    /// Face-adjacent displacement (Manhattan length 1).
    #[must_use]
    pub const fn is_adjacent(&self) -> bool {
        self.mlen() == 1
    }

    /// Adjacent or face-diagonal displacement.
    #[must_use]
    pub fn is_near(&self) -> bool {
        let mlen = self.mlen();
        self.clen() == 1 && (mlen == 1 || mlen == 2)
    }

    /// Non-zero displacement whose Chebyshev length is at most [`FAR_DISTANCE`].
    #[must_use]
    pub fn is_far(&self) -> bool {
        let clen = self.clen();
        clen > 0 && clen <= FAR_DISTANCE
    }

    /// Component-wise sign.
    #[must_use]
    pub const fn signum(&self) -> Self {
        Self::new(self.dx.signum(), self.dy.signum(), self.dz.signum())
    }
}

impl Add for Diff {
    type Output = Diff;

    fn add(self, other: Diff) -> Diff {
        Diff::new(self.dx + other.dx, self.dy + other.dy, self.dz + other.dz)
    }
}

impl Neg for Diff {
    type Output = Diff;

    fn neg(self) -> Diff {
        Diff::new(-self.dx, -self.dy, -self.dz)
    }
}

impl Mul<i32> for Diff {
    type Output = Diff;

    fn mul(self, factor: i32) -> Diff {
        Diff::new(self.dx * factor, self.dy * factor, self.dz * factor)
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}, {}>", self.dx, self.dy, self.dz)
    }
}

/// Location of a single voxel.
///
/// Coordinates are signed so that `pos + diff` can step outside the grid and
/// be rejected by [`Pos::is_inside`] rather than wrapping.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Pos {
    x: i32,
    y: i32,
    z: i32,
}

impl Pos {
    /// The origin, where the first bot starts and must halt.
    pub const ORIGIN: Pos = Pos::new(0, 0, 0);

    /// Creates a position from its coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// X coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Y coordinate (height above the ground plane).
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Z coordinate.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.z
    }

    /// Reports whether every coordinate lies in `[0, resolution)`.
    #[must_use]
    pub const fn is_inside(&self, resolution: u32) -> bool {
        let r = resolution as i64;
        let (x, y, z) = (self.x as i64, self.y as i64, self.z as i64);
        x >= 0 && x < r && y >= 0 && y < r && z >= 0 && z < r
    }

    /// Linear row-major index `x*R*R + y*R + z` of an in-bounds position.
    #[must_use]
    pub const fn pack(&self, resolution: u32) -> usize {
        let r = resolution as usize;
        (self.x as usize * r + self.y as usize) * r + self.z as usize
    }

    /// Inverse of [`Pos::pack`].
    #[must_use]
    pub const fn unpack(resolution: u32, index: usize) -> Self {
        let r = resolution as usize;
        Self::new(
            (index / (r * r)) as i32,
            (index / r % r) as i32,
            (index % r) as i32,
        )
    }

    /// In-bounds face neighbours in the order -x, -y, -z, +x, +y, +z.
    pub fn adjacent(self, resolution: u32) -> impl Iterator<Item = Pos> {
        FACE_DIRECTIONS
            .into_iter()
            .map(move |direction| self + direction)
            .filter(move |neighbor| neighbor.is_inside(resolution))
    }
}

impl Add<Diff> for Pos {
    type Output = Pos;

    fn add(self, d: Diff) -> Pos {
        Pos::new(self.x + d.dx, self.y + d.dy, self.z + d.dz)
    }
}

impl Sub<Diff> for Pos {
    type Output = Pos;

    fn sub(self, d: Diff) -> Pos {
        Pos::new(self.x - d.dx, self.y - d.dy, self.z - d.dz)
    }
}

impl Sub for Pos {
    type Output = Diff;

    fn sub(self, other: Pos) -> Diff {
        Diff::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl AddAssign<Diff> for Pos {
    fn add_assign(&mut self, d: Diff) {
        *self = *self + d;
    }
}

impl SubAssign<Diff> for Pos {
    fn sub_assign(&mut self, d: Diff) {
        *self = *self - d;
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Number of axes along which `a` and `b` differ.
#[must_use]
pub const fn region_dimension(a: Pos, b: Pos) -> u32 {
    Diff::new(b.x - a.x, b.y - a.y, b.z - a.z).dimension()
}

/// Inclusive axis-aligned box of voxels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    min: Pos,
    max: Pos,
}

impl Region {
    /// Creates the region spanned by two corners given in any order.
    #[must_use]
    pub fn new(a: Pos, b: Pos) -> Self {
        Self {
            min: Pos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Pos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Corner with the smallest coordinates.
    #[must_use]
    pub const fn min_corner(&self) -> Pos {
        self.min
    }

    /// Corner with the largest coordinates.
    #[must_use]
    pub const fn max_corner(&self) -> Pos {
        self.max
    }

    /// Number of axes with an extent larger than one voxel.
    #[must_use]
    pub const fn dimension(&self) -> u32 {
        region_dimension(self.min, self.max)
    }

    /// Reports whether `pos` lies within the region.
    #[must_use]
    pub const fn contains(&self, pos: Pos) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.min.z
            && pos.z <= self.max.z
    }

    /// Distinct corners of the region, `2^dimension` of them.
    #[must_use]
    pub fn corners(&self) -> Vec<Pos> {
        let mut corners = Vec::with_capacity(8);
        for x in [self.min.x, self.max.x] {
            for y in [self.min.y, self.max.y] {
                for z in [self.min.z, self.max.z] {
                    let corner = Pos::new(x, y, z);
                    if !corners.contains(&corner) {
                        corners.push(corner);
                    }
                }
            }
        }
        corners
    }

    /// Every voxel of the region in x-major, then y, then z order.
    pub fn iter(&self) -> impl Iterator<Item = Pos> {
        let (min, max) = (self.min, self.max);
        (min.x..=max.x).flat_map(move |x| {
            (min.y..=max.y).flat_map(move |y| (min.z..=max.z).map(move |z| Pos::new(x, y, z)))
        })
    }
}
