//! Local and global checks that a full voxel can be voided without leaving
//! matter floating.

use nanobot_core::{Matrix, Pos, FACE_DIRECTIONS};

/// Occupancy of the 3×3×3 cube around a voxel, indexed by [`cube_index`].
pub type Neighborhood = [bool; 27];

/// Index of the centre cell of a [`Neighborhood`].
pub const CUBE_CENTER: usize = 13;

/// Index of the cell at offset `(dx, dy, dz)` from the centre, each in `-1..=1`.
#[must_use]
pub const fn cube_index(dx: i32, dy: i32, dz: i32) -> usize {
    ((dx + 1) * 9 + (dy + 1) * 3 + (dz + 1)) as usize
}

const fn cube_offset(index: usize) -> (i32, i32, i32) {
    let index = index as i32;
    (index / 9 - 1, index / 3 % 3 - 1, index % 3 - 1)
}

/// Number of face-connected components formed by the set cells.
#[must_use]
pub fn cubic_num_components(cube: &Neighborhood) -> usize {
    let mut visited = [false; 27];
    let mut stack = Vec::with_capacity(27);
    let mut components = 0;

    for seed in 0..cube.len() {
        if !cube[seed] || visited[seed] {
            continue;
        }
        components += 1;
        visited[seed] = true;
        stack.push(seed);

        while let Some(cell) = stack.pop() {
            let (x, y, z) = cube_offset(cell);
            for direction in FACE_DIRECTIONS {
                let (nx, ny, nz) = (x + direction.dx(), y + direction.dy(), z + direction.dz());
                if [nx, ny, nz].iter().any(|c| !(-1..=1).contains(c)) {
                    continue;
                }
                let next = cube_index(nx, ny, nz);
                if cube[next] && !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }
    }
    components
}

/// Clearing the centre cell keeps the component count unchanged.
///
/// An empty centre is trivially safe. A lone centre is not, since clearing it
/// removes its component.
#[must_use]
pub fn can_safely_remove_center(cube: &Neighborhood) -> bool {
    if !cube[CUBE_CENTER] {
        return true;
    }
    let before = cubic_num_components(cube);
    let mut cleared = *cube;
    cleared[CUBE_CENTER] = false;
    cubic_num_components(&cleared) == before
}

/// Occupancy cube centred on `pos`.
///
/// Cells below the floor count as occupied, since the ground supports
/// everything resting on it. Any other cell outside the grid is empty.
#[must_use]
pub fn neighborhood_cube(matrix: &Matrix, pos: Pos) -> Neighborhood {
    let mut cube = [false; 27];
    for (index, cell) in cube.iter_mut().enumerate() {
        let (dx, dy, dz) = cube_offset(index);
        let neighbor = Pos::new(pos.x() + dx, pos.y() + dy, pos.z() + dz);
        *cell = if neighbor.y() < 0 {
            true
        } else {
            matrix.contains(neighbor) && matrix.get(neighbor)
        };
    }
    cube
}

/// Voiding `pos` strands no other full voxel.
///
/// A void voxel is always safe. A full voxel is first tested against its
/// local cube; when that is inconclusive the voxel is cleared temporarily
/// and the grounded-voxel counts compared. The matrix is left as it was.
pub fn safe_to_change(matrix: &mut Matrix, pos: Pos) -> bool {
    if !matrix.get(pos) {
        return true;
    }
    if can_safely_remove_center(&neighborhood_cube(matrix, pos)) {
        return true;
    }

    let before = matrix.num_grounded_voxels();
    matrix.set(pos, false);
    let after = matrix.num_grounded_voxels();
    matrix.set(pos, true);
    // only `pos` itself may leave the grounded set
    before - after <= 1
}
