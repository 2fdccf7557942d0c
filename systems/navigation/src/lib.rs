#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Read-only planning helpers for trace generators.
//!
//! Pathfinding searches the move graph of a single bot over the void voxels
//! of a matrix and turns the result into concrete `SMove`/`LMove` commands.
//! Connectivity helpers decide whether a full voxel can be voided without
//! disconnecting other matter from the ground.

mod connectivity;
mod pathfinding;

pub use connectivity::{
    can_safely_remove_center, cube_index, cubic_num_components, neighborhood_cube,
    safe_to_change, Neighborhood, CUBE_CENTER,
};
pub use pathfinding::{
    move_command, move_offsets, path_to_nearest_of, reachable_linear_offsets, Navigator, Route,
};
