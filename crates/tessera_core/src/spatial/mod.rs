//! Spatial acceleration structures.
//!
//! The uniform grid is the collision broad phase and the candidate source
//! for raycasts. It knows nothing about components: callers push AABBs in.

mod grid;

pub use grid::{GridCell, SpatialGrid, DEFAULT_CELL_SIZE};
