//! Render command translation
//!
//! At the end of each tick [`RenderCommandSystem`] snapshots every entity
//! with a [`Transform`] and a [`MeshRenderer`] into an immutable
//! [`FrameData`]. The presentation side only ever sees these snapshots; it
//! never touches the World.

use crate::ecs::{Entity, System, SystemDescriptor, World};
use crate::math::Mat4;
use crate::physics::Transform;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MeshId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ShaderId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MaterialId(pub u32);

/// Marks an entity as drawable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshRenderer {
    pub mesh: MeshId,
    pub shader: ShaderId,
    pub material: MaterialId,
    /// Linear RGBA.
    pub color: [f32; 4],
    pub visible: bool,
}

impl MeshRenderer {
    pub fn new(mesh: MeshId, shader: ShaderId, material: MaterialId) -> Self {
        Self {
            mesh,
            shader,
            material,
            color: [1.0; 4],
            visible: true,
        }
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }
}

/// Immutable draw intent for one entity in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCommand {
    pub entity: Entity,
    pub mesh: MeshId,
    pub shader: ShaderId,
    pub material: MaterialId,
    pub transform: Mat4,
    pub color: [f32; 4],
    pub visible: bool,
}

/// Per-instance data laid out for direct upload into a GPU instance buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuInstance {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub mesh: u32,
    pub material: u32,
    _padding: [u32; 2],
}

impl From<&RenderCommand> for GpuInstance {
    fn from(command: &RenderCommand) -> Self {
        Self {
            model: command.transform.to_cols_array_2d(),
            color: command.color,
            mesh: command.mesh.0,
            material: command.material.0,
            _padding: [0; 2],
        }
    }
}

/// Everything the presentation side needs for one simulated frame.
#[derive(Debug, Clone, Default)]
pub struct FrameData {
    /// Sequence number assigned by the producing [`RenderCommandSystem`].
    pub frame: u64,
    /// Simulation tick the snapshot was taken at.
    pub tick: u64,
    pub sim_time: Duration,
    /// Sorted by entity. Invisible entities are included with `visible == false`.
    pub commands: Vec<RenderCommand>,
}

impl FrameData {
    pub fn visible(&self) -> impl Iterator<Item = &RenderCommand> + '_ {
        self.commands.iter().filter(|command| command.visible)
    }

    /// Instance data for every visible command.
    pub fn gpu_instances(&self) -> Vec<GpuInstance> {
        self.visible().map(GpuInstance::from).collect()
    }

    /// Raw bytes of [`gpu_instances`](Self::gpu_instances), ready to upload.
    pub fn instance_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.gpu_instances()).to_vec()
    }
}

/// Builds a [`FrameData`] each tick and hands it to the World's frame output.
///
/// Register it after every system that moves or recolors entities.
#[derive(Debug, Default)]
pub struct RenderCommandSystem {
    frames: u64,
}

impl RenderCommandSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn descriptor() -> SystemDescriptor {
        SystemDescriptor::new("render_commands")
            .require::<Transform>()
            .require::<MeshRenderer>()
    }

    pub fn frames_produced(&self) -> u64 {
        self.frames
    }
}

impl System for RenderCommandSystem {
    fn update(&mut self, world: &mut World, entities: &[Entity], _dt: f32) {
        let mut commands: Vec<RenderCommand> = entities
            .iter()
            .filter_map(|&entity| {
                let transform = world.get_component::<Transform>(entity)?;
                let renderer = world.get_component::<MeshRenderer>(entity)?;
                Some(RenderCommand {
                    entity,
                    mesh: renderer.mesh,
                    shader: renderer.shader,
                    material: renderer.material,
                    transform: transform.matrix(),
                    color: renderer.color,
                    visible: renderer.visible,
                })
            })
            .collect();
        commands.sort_unstable_by_key(|command| command.entity);

        self.frames += 1;
        let frame = FrameData {
            frame: self.frames,
            tick: world.time().tick_count(),
            sim_time: world.time().total_time(),
            commands,
        };
        world.publish_frame(Arc::new(frame));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn world_with_renderer() -> World {
        let mut world = World::new();
        world
            .register_system(RenderCommandSystem::new(), RenderCommandSystem::descriptor())
            .unwrap();
        world
    }

    fn cube() -> MeshRenderer {
        MeshRenderer::new(MeshId(1), ShaderId(2), MaterialId(3))
    }

    #[test]
    fn snapshots_every_renderable_entity() {
        let mut world = world_with_renderer();
        let a = world.create_entity();
        world.add_component(a, Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));
        world.add_component(a, cube().with_color([1.0, 0.0, 0.0, 1.0]));

        let hidden = world.create_entity();
        world.add_component(hidden, Transform::default());
        world.add_component(hidden, cube()).unwrap().visible = false;

        // No transform: not renderable.
        let loose = world.create_entity();
        world.add_component(loose, cube());

        world.update(1.0 / 60.0);
        let frame = world.take_frame().unwrap();

        assert_eq!(frame.frame, 1);
        assert_eq!(frame.tick, 1);
        assert_eq!(frame.commands.len(), 2);
        assert_eq!(frame.commands[0].entity, a);
        assert_eq!(
            frame.commands[0].transform.w_axis.truncate(),
            Vec3::new(1.0, 2.0, 3.0)
        );
        assert!(!frame.commands[1].visible);
        assert_eq!(frame.visible().count(), 1);
        assert!(world.take_frame().is_none());
    }

    #[test]
    fn snapshot_is_unaffected_by_later_ticks() {
        let mut world = world_with_renderer();
        let e = world.create_entity();
        world.add_component(e, Transform::default());
        world.add_component(e, cube());

        world.update(1.0 / 60.0);
        let first = world.take_frame().unwrap();

        world.get_component_mut::<Transform>(e).unwrap().position = Vec3::X;
        world.update(1.0 / 60.0);
        let second = world.take_frame().unwrap();

        assert_eq!(first.commands[0].transform, Mat4::IDENTITY);
        assert_eq!(second.commands[0].transform.w_axis.truncate(), Vec3::X);
        assert_eq!(second.frame, 2);
    }

    #[test]
    fn gpu_instances_are_tightly_packed() {
        assert_eq!(std::mem::size_of::<GpuInstance>(), 96);

        let command = RenderCommand {
            entity: Entity::INVALID,
            mesh: MeshId(4),
            shader: ShaderId(0),
            material: MaterialId(9),
            transform: Mat4::IDENTITY,
            color: [0.5; 4],
            visible: true,
        };
        let frame = FrameData {
            commands: vec![command, RenderCommand { visible: false, ..command }],
            ..FrameData::default()
        };

        let instances = frame.gpu_instances();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].mesh, 4);
        assert_eq!(instances[0].material, 9);
        assert_eq!(frame.instance_bytes().len(), 96);
    }
}
