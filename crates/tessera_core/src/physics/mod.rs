//! AABB collision detection with trigger enter/exit tracking.
//!
//! Each tick the [`PhysicsSystem`] pushes every enabled collider's world
//! AABB into the spatial grid, tests the grid's candidate pairs exactly, and
//! turns changes in trigger contact sets into `on_trigger_enter` /
//! `on_trigger_exit` calls on the entities' behaviors. Collision response is
//! not computed; solid overlaps are only counted and queryable.

mod components;
mod stats;
mod system;

pub use components::{BoxCollider, Transform, ALL_LAYERS, DEFAULT_LAYER};
pub use stats::PhysicsStats;
pub use system::PhysicsSystem;
