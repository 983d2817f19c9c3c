// world.rs - ECS World: registry, component pools, scheduler and the
// per-simulation context (grid, camera, input, time, frame output).

use crate::behavior::{self, BehaviorSystem, Script};
use crate::camera::Camera;
use crate::config::{ConfigError, EngineConfig};
use crate::ecs::{
    Component, ComponentError, ComponentStorage, ComponentType, Entity, EntityRegistry, Scheduler,
    Signature, System, SystemDescriptor, SystemHandle, SystemRegistrationError,
};
use crate::input::InputState;
use crate::physics::{PhysicsStats, PhysicsSystem};
use crate::raycast::DebugRayLog;
use crate::render::{FrameData, RenderCommandSystem};
use crate::spatial::SpatialGrid;
use crate::time::SimulationTime;
use std::any::TypeId;
use std::sync::Arc;
use tessera_metrics::SystemProfiler;
use tracing::{info, trace, warn};

/// The simulation context owned by the simulation thread.
///
/// There is no ambient global state: the camera, input snapshot, grid and
/// configuration all live here and are reached through `&World`.
pub struct World {
    entities: EntityRegistry,
    components: ComponentStorage,
    scheduler: Scheduler,
    profiler: SystemProfiler,
    grid: SpatialGrid,
    config: EngineConfig,
    camera: Camera,
    input: InputState,
    previous_input: InputState,
    time: SimulationTime,
    pub(crate) debug_rays: DebugRayLog,
    frame_output: Option<Arc<FrameData>>,
    shutdown_requested: bool,
    updating: bool,
}

impl World {
    /// Create an empty world with default configuration and no systems.
    pub fn new() -> Self {
        // Defaults are always valid.
        let config = EngineConfig::default();
        Self::build(config)
    }

    /// Create an empty world from a validated configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Create a world with physics, behaviors and render-command translation
    /// registered in that order.
    pub fn with_builtin_systems(config: EngineConfig) -> Result<Self, ConfigError> {
        let mut world = Self::with_config(config)?;
        // Fresh world: the three built-ins cannot collide or exhaust the mask.
        if let Err(err) = world.register_builtin_systems() {
            warn!(%err, "built-in system registration failed");
        }
        Ok(world)
    }

    fn build(config: EngineConfig) -> Self {
        let grid = SpatialGrid::new(config.physics.cell_size);
        let debug_rays = DebugRayLog::new(config.raycast.max_debug_rays);
        Self {
            entities: EntityRegistry::new(),
            components: ComponentStorage::new(),
            scheduler: Scheduler::new(),
            profiler: SystemProfiler::default(),
            grid,
            config,
            camera: Camera::default(),
            input: InputState::default(),
            previous_input: InputState::default(),
            time: SimulationTime::new(),
            debug_rays,
            frame_output: None,
            shutdown_requested: false,
            updating: false,
        }
    }

    /// Register [`PhysicsSystem`], [`BehaviorSystem`] and
    /// [`RenderCommandSystem`]. Physics must run before behaviors see the
    /// tick's trigger events, and render translation must run last.
    pub fn register_builtin_systems(&mut self) -> Result<(), SystemRegistrationError> {
        self.register_system(PhysicsSystem::new(), PhysicsSystem::descriptor())?;
        self.register_system(BehaviorSystem::new(), BehaviorSystem::descriptor())?;
        self.register_system(RenderCommandSystem::new(), RenderCommandSystem::descriptor())?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    pub fn create_entity(&mut self) -> Entity {
        self.entities.create()
    }

    /// Destroy `entity`: its script's `on_destroy` runs first, then every
    /// component is released and the entity leaves every system.
    ///
    /// Returns `false` for stale or never-issued handles.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.entities.is_valid(entity) {
            return false;
        }

        behavior::retire(self, entity);
        // on_destroy may have destroyed the entity itself.
        if !self.entities.is_valid(entity) {
            return true;
        }

        let released = self.components.remove_all(entity);
        self.grid.remove(entity);
        self.scheduler.entity_destroyed(entity);
        self.entities.destroy(entity);
        trace!(%entity, released, "components released");
        true
    }

    pub fn is_valid(&self, entity: Entity) -> bool {
        self.entities.is_valid(entity)
    }

    /// Component mask of a live entity.
    pub fn entity_mask(&self, entity: Entity) -> Option<Signature> {
        self.entities.mask(entity)
    }

    pub fn alive_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Every live entity in slot order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter_alive()
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Register `T` without attaching it. Idempotent.
    pub fn register_component<T: Component>(&mut self) -> Result<ComponentType, ComponentError> {
        self.components.register::<T>()
    }

    pub fn component_type<T: Component>(&self) -> Option<ComponentType> {
        self.components.component_type::<T>()
    }

    /// Attach `component` to `entity`, replacing any existing `T`.
    ///
    /// Returns `None` if the entity is stale or the component type could not
    /// be registered. Replacing a [`Script`] runs the old behavior's
    /// `on_destroy` first.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Option<&mut T> {
        if !self.entities.is_valid(entity) {
            return None;
        }

        if is_script::<T>() {
            behavior::retire(self, entity);
            if !self.entities.is_valid(entity) {
                return None;
            }
        }

        let ty = match self.components.insert(entity, component) {
            Ok((ty, _replaced)) => ty,
            Err(err) => {
                warn!(%err, %entity, "component rejected");
                return None;
            }
        };

        if let Some(mask) = self.entities.set_component_bit(entity, ty, true) {
            self.scheduler.entity_signature_changed(entity, mask);
        }
        self.components.get_mut::<T>(entity)
    }

    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.entities.is_valid(entity) {
            return None;
        }
        self.components.get::<T>(entity)
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.entities.is_valid(entity) {
            return None;
        }
        self.components.get_mut::<T>(entity)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.get_component::<T>(entity).is_some()
    }

    /// Detach and drop `T` from `entity`. Returns whether it was present.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> bool {
        if !self.has_component::<T>(entity) {
            return false;
        }

        if is_script::<T>() {
            behavior::retire(self, entity);
        }

        let Some(ty) = self.components.component_type::<T>() else {
            return true;
        };
        if self.components.take::<T>(entity).is_some() {
            if let Some(mask) = self.entities.set_component_bit(entity, ty, false) {
                self.scheduler.entity_signature_changed(entity, mask);
            }
        }
        true
    }

    /// Live entities holding `T`, with the component.
    pub fn query<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.components.iter::<T>().filter_map(|(index, value)| {
            self.entities
                .entity_at(index)
                .map(|entity| (entity, value))
        })
    }

    /// Number of live `T` instances.
    pub fn component_count<T: Component>(&self) -> usize {
        self.components.count::<T>()
    }

    // ------------------------------------------------------------------
    // Systems
    // ------------------------------------------------------------------

    /// Register `system` with the signature derived from `descriptor`.
    ///
    /// Required component types are registered on demand. Entities that
    /// already match are added to the system straight away.
    pub fn register_system<S: System>(
        &mut self,
        system: S,
        descriptor: SystemDescriptor,
    ) -> Result<SystemHandle, SystemRegistrationError> {
        let signature = descriptor
            .resolve(&mut self.components)
            .map_err(|source| SystemRegistrationError::Component {
                name: descriptor.name().to_string(),
                source,
            })?;

        let handle = self.scheduler.register(descriptor.name(), signature, system)?;
        self.resync_system(handle);
        Ok(handle)
    }

    /// Replace a system's signature and re-evaluate every live entity.
    pub fn set_system_signature(
        &mut self,
        handle: SystemHandle,
        signature: Signature,
    ) -> Result<(), SystemRegistrationError> {
        self.scheduler.set_signature(handle, signature)?;
        self.resync_system(handle);
        Ok(())
    }

    fn resync_system(&mut self, handle: SystemHandle) {
        for entity in self.entities.iter_alive() {
            if let Some(mask) = self.entities.mask(entity) {
                self.scheduler.sync_entity(handle, entity, mask);
            }
        }
    }

    pub fn system_signature(&self, handle: SystemHandle) -> Option<Signature> {
        self.scheduler.signature(handle)
    }

    pub fn system_name(&self, handle: SystemHandle) -> Option<&str> {
        self.scheduler.name(handle)
    }

    pub fn system_handle<S: System>(&self) -> Option<SystemHandle> {
        self.scheduler.handle_of::<S>()
    }

    /// Look up a registered system by concrete type.
    ///
    /// `None` if it was never registered, and also while that system is
    /// executing its own `update`.
    pub fn system<S: System>(&self) -> Option<&S> {
        self.scheduler.get::<S>()
    }

    pub fn system_mut<S: System>(&mut self) -> Option<&mut S> {
        self.scheduler.get_mut::<S>()
    }

    /// Whether `entity` is currently tracked by the system.
    pub fn system_contains(&self, handle: SystemHandle, entity: Entity) -> bool {
        self.scheduler.contains(handle, entity)
    }

    /// Snapshot of a system's tracked entities.
    pub fn system_entities(&self, handle: SystemHandle) -> Vec<Entity> {
        self.scheduler.members(handle)
    }

    pub fn system_count(&self) -> usize {
        self.scheduler.len()
    }

    /// Per-system update timings.
    pub fn profiler(&self) -> &SystemProfiler {
        &self.profiler
    }

    /// Advance the simulation by `dt` seconds: every system runs once, in
    /// registration order.
    pub fn update(&mut self, dt: f32) {
        if self.updating {
            warn!("World::update re-entered from inside a system; ignored");
            return;
        }
        self.updating = true;
        self.time.advance(dt);

        let mut profiler = std::mem::take(&mut self.profiler);
        // Systems registered mid-tick first run on the next tick.
        for index in 0..self.scheduler.len() {
            let Some(mut run) = self.scheduler.begin_run(index) else {
                continue;
            };
            tessera_metrics::time_scope!(profiler, &run.name, {
                run.logic.update(self, &run.entities, dt)
            });
            self.scheduler.end_run(index, run.logic);
        }
        self.profiler = profiler;

        self.updating = false;
    }

    // ------------------------------------------------------------------
    // Simulation context
    // ------------------------------------------------------------------

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub(crate) fn grid_mut(&mut self) -> &mut SpatialGrid {
        &mut self.grid
    }

    /// Change the grid cell size. Invalid sizes are rejected with a warning
    /// and the previous size is kept; the grid is emptied otherwise and
    /// repopulated by the next physics tick.
    pub fn set_grid_cell_size(&mut self, cell_size: f32) -> Result<(), ConfigError> {
        self.grid.set_cell_size(cell_size)?;
        self.config.physics.cell_size = cell_size;
        Ok(())
    }

    pub fn set_physics_debug(&mut self, enabled: bool) {
        self.config.physics.debug = enabled;
    }

    pub fn set_raycast_debug(&mut self, enabled: bool) {
        self.config.raycast.debug = enabled;
        if !enabled {
            self.debug_rays.clear();
        }
    }

    /// Resize the debug ray history, dropping the oldest entries if needed.
    pub fn set_max_debug_rays(&mut self, max: usize) {
        self.config.raycast.max_debug_rays = max;
        self.debug_rays.set_capacity(max);
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// Input snapshot for the current tick.
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Input snapshot of the previous tick, for edge detection.
    pub fn previous_input(&self) -> &InputState {
        &self.previous_input
    }

    /// Install this tick's input snapshot; the old one becomes "previous".
    pub fn set_input(&mut self, input: InputState) {
        self.previous_input = std::mem::replace(&mut self.input, input);
    }

    pub fn time(&self) -> &SimulationTime {
        &self.time
    }

    /// Statistics of the last physics tick, if physics is registered.
    pub fn physics_stats(&self) -> Option<PhysicsStats> {
        self.system::<PhysicsSystem>().map(|physics| physics.stats().clone())
    }

    pub(crate) fn publish_frame(&mut self, frame: Arc<FrameData>) {
        self.frame_output = Some(frame);
    }

    /// Latest frame produced by [`RenderCommandSystem`], if not yet taken.
    pub fn take_frame(&mut self) -> Option<Arc<FrameData>> {
        self.frame_output.take()
    }

    /// Ask the driving loop to stop after the current tick.
    pub fn request_shutdown(&mut self) {
        if !self.shutdown_requested {
            info!("shutdown requested from simulation");
        }
        self.shutdown_requested = true;
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn is_script<T: Component>() -> bool {
    TypeId::of::<T>() == TypeId::of::<Script>()
}
