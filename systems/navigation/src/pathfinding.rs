//! Breadth-first search over single-bot moves.

use std::collections::{HashSet, VecDeque};

use nanobot_core::{Command, Diff, Matrix, Pos, FACE_DIRECTIONS, LONG_DISTANCE, SHORT_DISTANCE};

const UNVISITED: u32 = u32::MAX;

/// Destination reached by a search and the commands that lead there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    /// Position the route ends at.
    pub destination: Pos,
    /// Moves from the start to the destination, one command per step.
    pub commands: Vec<Command>,
}

/// Offsets reachable from `start` in a straight line through void voxels.
///
/// Each of the six directions is walked outward until the grid edge, a full
/// voxel or `max_distance` stops it.
#[must_use]
pub fn reachable_linear_offsets(matrix: &Matrix, start: Pos, max_distance: i32) -> Vec<Diff> {
    let mut offsets = Vec::new();
    for direction in FACE_DIRECTIONS {
        for distance in 1..=max_distance {
            let offset = direction * distance;
            let pos = start + offset;
            if !matrix.contains(pos) || matrix.get(pos) {
                break;
            }
            offsets.push(offset);
        }
    }
    offsets
}

/// Every offset a single `SMove` or `LMove` can take from `start`.
///
/// Straight moves come first, followed by two perpendicular short legs, each
/// offset listed once in the order it is first found.
#[must_use]
pub fn move_offsets(matrix: &Matrix, start: Pos) -> Vec<Diff> {
    let mut offsets = reachable_linear_offsets(matrix, start, LONG_DISTANCE);
    let mut seen: HashSet<Diff> = offsets.iter().copied().collect();

    for first in reachable_linear_offsets(matrix, start, SHORT_DISTANCE) {
        let corner = start + first;
        for second in reachable_linear_offsets(matrix, corner, SHORT_DISTANCE) {
            if second.linear_axis() == first.linear_axis() {
                continue;
            }
            let total = first + second;
            if seen.insert(total) {
                offsets.push(total);
            }
        }
    }
    offsets
}

/// Recovers a move command from `from` to `to` whose swept voxels are void.
///
/// A straight move is preferred over an L-shaped one.
#[must_use]
pub fn move_command(matrix: &Matrix, from: Pos, to: Pos) -> Option<Command> {
    let diff = to - from;
    if diff.is_long_linear() && segment_is_void(matrix, from, diff) {
        return Some(Command::SMove { lld: diff });
    }

    let legs: Vec<Diff> = nanobot_core::Axis::ALL
        .into_iter()
        .map(|axis| Diff::along(axis, diff.axis_value(axis)))
        .filter(|leg| *leg != Diff::ZERO)
        .collect();
    let [a, b] = legs.as_slice() else {
        return None;
    };

    [(*a, *b), (*b, *a)].into_iter().find_map(|(sld1, sld2)| {
        let legal = sld1.is_short_linear()
            && sld2.is_short_linear()
            && segment_is_void(matrix, from, sld1)
            && segment_is_void(matrix, from + sld1, sld2);
        legal.then_some(Command::LMove { sld1, sld2 })
    })
}

/// Reusable breadth-first search workspace.
///
/// The predecessor table is dense over the grid and keeps its allocation
/// between searches on grids of the same size.
#[derive(Clone, Debug, Default)]
pub struct Navigator {
    resolution: u32,
    predecessors: Vec<u32>,
}

impl Navigator {
    /// Creates an empty workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shortest route, in commands, from `start` to the first position
    /// accepted by `is_goal`.
    ///
    /// The start itself is a valid goal and yields an empty route. Returns
    /// `None` when no accepted position is reachable.
    pub fn shortest_path_where<F>(
        &mut self,
        matrix: &Matrix,
        start: Pos,
        mut is_goal: F,
    ) -> Option<Route>
    where
        F: FnMut(Pos) -> bool,
    {
        if !matrix.contains(start) {
            return None;
        }
        if is_goal(start) {
            return Some(Route {
                destination: start,
                commands: Vec::new(),
            });
        }

        let resolution = matrix.resolution();
        self.prepare(resolution);
        let start_index = start.pack(resolution);
        self.predecessors[start_index] = start_index as u32;

        let mut queue = VecDeque::new();
        queue.push_back(start);
        while let Some(pos) = queue.pop_front() {
            let index = pos.pack(resolution) as u32;
            for offset in move_offsets(matrix, pos) {
                let next = pos + offset;
                let next_index = next.pack(resolution);
                if self.predecessors[next_index] != UNVISITED {
                    continue;
                }
                self.predecessors[next_index] = index;
                if is_goal(next) {
                    return self.reconstruct(matrix, start, next);
                }
                queue.push_back(next);
            }
        }
        None
    }

    /// Shortest route to whichever of `targets` is reached first.
    pub fn path_to_nearest_of(
        &mut self,
        matrix: &Matrix,
        start: Pos,
        targets: &[Pos],
    ) -> Option<Route> {
        let mut sorted: Vec<Pos> = targets
            .iter()
            .copied()
            .filter(|&target| matrix.contains(target))
            .collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_unstable();
        sorted.dedup();
        self.shortest_path_where(matrix, start, |pos| sorted.binary_search(&pos).is_ok())
    }

    fn prepare(&mut self, resolution: u32) {
        let side = resolution as usize;
        let cells = side * side * side;
        if self.resolution != resolution || self.predecessors.len() != cells {
            self.predecessors = vec![UNVISITED; cells];
            self.resolution = resolution;
        } else {
            self.predecessors.fill(UNVISITED);
        }
    }

    fn reconstruct(&self, matrix: &Matrix, start: Pos, goal: Pos) -> Option<Route> {
        let resolution = matrix.resolution();
        let start_index = start.pack(resolution);
        let mut waypoints = vec![goal];
        let mut index = goal.pack(resolution);
        while index != start_index {
            index = self.predecessors[index] as usize;
            waypoints.push(Pos::unpack(resolution, index));
        }
        waypoints.reverse();

        let commands = waypoints
            .windows(2)
            .map(|hop| move_command(matrix, hop[0], hop[1]))
            .collect::<Option<Vec<_>>>()?;
        Some(Route {
            destination: goal,
            commands,
        })
    }
}

/// Convenience wrapper around [`Navigator::path_to_nearest_of`] with a fresh
/// workspace.
#[must_use]
pub fn path_to_nearest_of(matrix: &Matrix, start: Pos, targets: &[Pos]) -> Option<Route> {
    Navigator::new().path_to_nearest_of(matrix, start, targets)
}

fn segment_is_void(matrix: &Matrix, from: Pos, diff: Diff) -> bool {
    let step = diff.signum();
    (1..=diff.mlen()).all(|i| {
        let pos = from + step * i;
        matrix.contains(pos) && !matrix.get(pos)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_offsets_stop_at_walls_and_edges() {
        let mut matrix = Matrix::new(4);
        matrix.set(Pos::new(2, 0, 0), true);
        let offsets = reachable_linear_offsets(&matrix, Pos::ORIGIN, 15);
        assert_eq!(
            offsets,
            vec![
                Diff::new(1, 0, 0),
                Diff::new(0, 1, 0),
                Diff::new(0, 2, 0),
                Diff::new(0, 3, 0),
                Diff::new(0, 0, 1),
                Diff::new(0, 0, 2),
                Diff::new(0, 0, 3),
            ]
        );
    }

    #[test]
    fn move_offsets_are_unique_and_include_l_moves() {
        let matrix = Matrix::new(3);
        let offsets = move_offsets(&matrix, Pos::ORIGIN);
        let unique: HashSet<Diff> = offsets.iter().copied().collect();
        assert_eq!(unique.len(), offsets.len());
        // 6 straight offsets plus the 12 in-grid combinations of two
        // perpendicular legs.
        assert_eq!(offsets.len(), 6 + 12);
        assert!(offsets.contains(&Diff::new(2, 0, 1)));
        assert!(!offsets.contains(&Diff::new(1, 1, 1)));
    }

    #[test]
    fn move_command_prefers_straight_moves() {
        let mut matrix = Matrix::new(4);
        assert_eq!(
            move_command(&matrix, Pos::ORIGIN, Pos::new(0, 3, 0)),
            Some(Command::SMove {
                lld: Diff::new(0, 3, 0)
            })
        );

        matrix.set(Pos::new(1, 0, 0), true);
        assert_eq!(
            move_command(&matrix, Pos::ORIGIN, Pos::new(1, 0, 2)),
            Some(Command::LMove {
                sld1: Diff::new(0, 0, 2),
                sld2: Diff::new(1, 0, 0)
            })
        );
        assert_eq!(move_command(&matrix, Pos::ORIGIN, Pos::new(1, 1, 1)), None);
    }

    #[test]
    fn navigator_reuses_its_workspace() {
        let matrix = Matrix::new(5);
        let mut navigator = Navigator::new();
        let first = navigator
            .path_to_nearest_of(&matrix, Pos::ORIGIN, &[Pos::new(4, 4, 4)])
            .expect("open grid is connected");
        let second = navigator
            .path_to_nearest_of(&matrix, Pos::ORIGIN, &[Pos::new(4, 4, 4)])
            .expect("open grid is connected");
        assert_eq!(first, second);
        assert_eq!(first.commands.len(), 2);
    }
}
