//! Tessera Engine Core
//!
//! Contains the fundamental simulation systems:
//! - Entity Component System (registry, sparse component pools, scheduler)
//! - Uniform spatial grid (collision broad phase)
//! - AABB physics with trigger enter/exit detection
//! - Grid-accelerated raycasting
//! - Behavior objects attached to entities
//! - Render command translation for the presentation side
//! - Fixed-step time, math, configuration and input snapshots

pub mod behavior;
pub mod camera;
pub mod config;
pub mod ecs;
pub mod input;
pub mod math;
pub mod physics;
pub mod raycast;
pub mod render;
pub mod spatial;
pub mod time;

pub use glam;

pub use behavior::{Behavior, BehaviorContext, BehaviorError, BehaviorResult, BehaviorSystem, Script};
pub use camera::Camera;
pub use config::{ConfigError, EngineConfig, PhysicsConfig, PipelineConfig, RaycastConfig};
pub use ecs::{Component, Entity, Signature, System, SystemDescriptor, SystemHandle, World};
pub use input::{InputState, KeyCode, MouseButton};
pub use math::{Aabb, Ray};
pub use physics::{BoxCollider, PhysicsStats, PhysicsSystem, Transform};
pub use raycast::{DebugRay, RaycastHit};
pub use render::{
    FrameData, GpuInstance, MaterialId, MeshId, MeshRenderer, RenderCommand, RenderCommandSystem,
    ShaderId,
};
pub use spatial::{GridCell, SpatialGrid};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
