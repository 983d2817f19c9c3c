//! Behavior objects attached to entities
//!
//! Gameplay logic implements [`Behavior`] and is attached through the
//! [`Script`] component. Hooks run on the simulation thread with a
//! [`BehaviorContext`] that hands out the World, so a hook may create and
//! destroy entities, edit components or cast rays.
//!
//! Lifecycle:
//! - `start` runs exactly once, lazily, before the first other hook
//!   (normally at the entity's first [`BehaviorSystem`] tick).
//! - `update` runs every tick.
//! - `on_trigger_enter` / `on_trigger_exit` run from the physics tick.
//! - `on_destroy` runs once when the Script is removed or replaced, or the
//!   entity is destroyed.
//!
//! A hook that returns `Err` or panics is logged with the entity and hook
//! name and otherwise ignored; the tick carries on for everyone else.

use crate::camera::Camera;
use crate::ecs::{Component, Entity, System, SystemDescriptor, World};
use crate::input::InputState;
use crate::math::{Ray, Vec3};
use crate::raycast::RaycastHit;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;
use tracing::{debug, error};

/// Error returned from a behavior hook.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct BehaviorError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl BehaviorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type BehaviorResult = Result<(), BehaviorError>;

/// User gameplay logic driven by the engine. Every hook defaults to a no-op.
pub trait Behavior: Send {
    fn start(&mut self, _ctx: &mut BehaviorContext<'_>) -> BehaviorResult {
        Ok(())
    }

    fn update(&mut self, _ctx: &mut BehaviorContext<'_>, _dt: f32) -> BehaviorResult {
        Ok(())
    }

    fn on_destroy(&mut self, _ctx: &mut BehaviorContext<'_>) -> BehaviorResult {
        Ok(())
    }

    fn on_trigger_enter(&mut self, _ctx: &mut BehaviorContext<'_>, _other: Entity) -> BehaviorResult {
        Ok(())
    }

    fn on_trigger_exit(&mut self, _ctx: &mut BehaviorContext<'_>, _other: Entity) -> BehaviorResult {
        Ok(())
    }
}

/// What a hook sees: its own entity plus the World.
pub struct BehaviorContext<'w> {
    entity: Entity,
    world: &'w mut World,
}

impl<'w> BehaviorContext<'w> {
    pub(crate) fn new(entity: Entity, world: &'w mut World) -> Self {
        Self { entity, world }
    }

    /// The entity this behavior is attached to.
    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn world(&self) -> &World {
        &*self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut *self.world
    }

    /// A component of this entity.
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.world.get_component::<T>(self.entity)
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.world.get_component_mut::<T>(self.entity)
    }

    /// Attach a component to this entity.
    pub fn insert<T: Component>(&mut self, component: T) -> Option<&mut T> {
        self.world.add_component(self.entity, component)
    }

    pub fn remove<T: Component>(&mut self) -> bool {
        self.world.remove_component::<T>(self.entity)
    }

    pub fn spawn(&mut self) -> Entity {
        self.world.create_entity()
    }

    pub fn destroy(&mut self, entity: Entity) -> bool {
        self.world.destroy_entity(entity)
    }

    /// Destroy this entity. Its own `on_destroy` runs once the current hook
    /// has returned.
    pub fn destroy_self(&mut self) -> bool {
        self.world.destroy_entity(self.entity)
    }

    pub fn raycast(&self, ray: &Ray, layer_mask: u32) -> Option<RaycastHit> {
        self.world.raycast(ray, layer_mask, true)
    }

    pub fn raycast_all(&self, ray: &Ray, layer_mask: u32) -> Vec<RaycastHit> {
        self.world.raycast_all(ray, layer_mask)
    }

    pub fn line_of_sight(&self, from: Vec3, to: Vec3, layer_mask: u32) -> bool {
        self.world.line_of_sight(from, to, layer_mask)
    }

    pub fn input(&self) -> &InputState {
        self.world.input()
    }

    pub fn previous_input(&self) -> &InputState {
        self.world.previous_input()
    }

    pub fn camera(&self) -> &Camera {
        self.world.camera()
    }
}

/// Component owning an entity's behavior.
///
/// While one of its hooks runs the behavior is moved out, so `behavior` is
/// `None` for the duration of the call.
pub struct Script {
    behavior: Option<Box<dyn Behavior>>,
    started: bool,
}

impl Script {
    pub fn new(behavior: impl Behavior + 'static) -> Self {
        Self::from_boxed(Box::new(behavior))
    }

    pub fn from_boxed(behavior: Box<dyn Behavior>) -> Self {
        Self {
            behavior: Some(behavior),
            started: false,
        }
    }

    pub fn has_started(&self) -> bool {
        self.started
    }
}

impl std::fmt::Debug for Script {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Script")
            .field("attached", &self.behavior.is_some())
            .field("started", &self.started)
            .finish()
    }
}

/// Which side of a trigger contact changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TriggerEdge {
    Enter,
    Exit,
}

#[derive(Debug, Clone, Copy)]
enum Hook {
    Start,
    Update(f32),
    Destroy,
    TriggerEnter(Entity),
    TriggerExit(Entity),
}

impl Hook {
    fn name(&self) -> &'static str {
        match self {
            Hook::Start => "start",
            Hook::Update(_) => "update",
            Hook::Destroy => "on_destroy",
            Hook::TriggerEnter(_) => "on_trigger_enter",
            Hook::TriggerExit(_) => "on_trigger_exit",
        }
    }

    fn call(self, behavior: &mut dyn Behavior, ctx: &mut BehaviorContext<'_>) -> BehaviorResult {
        match self {
            Hook::Start => behavior.start(ctx),
            Hook::Update(dt) => behavior.update(ctx, dt),
            Hook::Destroy => behavior.on_destroy(ctx),
            Hook::TriggerEnter(other) => behavior.on_trigger_enter(ctx, other),
            Hook::TriggerExit(other) => behavior.on_trigger_exit(ctx, other),
        }
    }
}

/// Run `hook` with errors and panics contained.
fn run_guarded(world: &mut World, entity: Entity, behavior: &mut dyn Behavior, hook: Hook) {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let mut ctx = BehaviorContext::new(entity, world);
        hook.call(behavior, &mut ctx)
    }));

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            error!(%entity, hook = hook.name(), error = %err, "behavior hook failed");
        }
        Err(payload) => {
            error!(
                %entity,
                hook = hook.name(),
                panic = panic_message(payload.as_ref()),
                "behavior hook panicked"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Run one hook on `entity`'s behavior. No-op without an attached behavior.
///
/// The behavior is moved out of its Script for the call and put back
/// afterwards, unless the hook removed or replaced the Script (or destroyed
/// the entity); in that case the detached behavior is retired instead.
fn invoke(world: &mut World, entity: Entity, hook: Hook) {
    let Some(script) = world.get_component_mut::<Script>(entity) else {
        return;
    };
    let Some(mut behavior) = script.behavior.take() else {
        return;
    };
    if matches!(hook, Hook::Start) {
        script.started = true;
    }

    run_guarded(world, entity, behavior.as_mut(), hook);

    match world.get_component_mut::<Script>(entity) {
        Some(script) if script.behavior.is_none() => script.behavior = Some(behavior),
        _ => run_guarded(world, entity, behavior.as_mut(), Hook::Destroy),
    }
}

fn ensure_started(world: &mut World, entity: Entity) {
    let pending = world
        .get_component::<Script>(entity)
        .is_some_and(|script| !script.started && script.behavior.is_some());
    if pending {
        invoke(world, entity, Hook::Start);
    }
}

/// Detach `entity`'s behavior and run its `on_destroy`. Called before a
/// Script is removed or replaced and before the entity is destroyed.
pub(crate) fn retire(world: &mut World, entity: Entity) {
    let Some(mut behavior) = world
        .get_component_mut::<Script>(entity)
        .and_then(|script| script.behavior.take())
    else {
        return;
    };
    run_guarded(world, entity, behavior.as_mut(), Hook::Destroy);
}

/// Deliver a trigger edge to `entity`'s behavior, starting it first if it
/// has not run yet.
pub(crate) fn dispatch_trigger(world: &mut World, entity: Entity, other: Entity, edge: TriggerEdge) {
    if !world.has_component::<Script>(entity) {
        return;
    }
    debug!(%entity, %other, ?edge, "trigger event");
    ensure_started(world, entity);
    let hook = match edge {
        TriggerEdge::Enter => Hook::TriggerEnter(other),
        TriggerEdge::Exit => Hook::TriggerExit(other),
    };
    invoke(world, entity, hook);
}

/// Runs `start` (once) and `update` on every entity with a [`Script`].
#[derive(Debug, Default)]
pub struct BehaviorSystem;

impl BehaviorSystem {
    pub fn new() -> Self {
        Self
    }

    pub fn descriptor() -> SystemDescriptor {
        SystemDescriptor::new("behaviors").require::<Script>()
    }
}

impl System for BehaviorSystem {
    fn update(&mut self, world: &mut World, entities: &[Entity], dt: f32) {
        for &entity in entities {
            // Earlier behaviors may have destroyed this one.
            if !world.is_valid(entity) {
                continue;
            }
            ensure_started(world, entity);
            invoke(world, entity, Hook::Update(dt));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Start,
        Update,
        Destroy,
        Enter(Entity),
        Exit(Entity),
    }

    type Log = Arc<Mutex<Vec<Call>>>;

    struct Recorder {
        log: Log,
    }

    impl Behavior for Recorder {
        fn start(&mut self, _ctx: &mut BehaviorContext<'_>) -> BehaviorResult {
            self.log.lock().push(Call::Start);
            Ok(())
        }

        fn update(&mut self, _ctx: &mut BehaviorContext<'_>, _dt: f32) -> BehaviorResult {
            self.log.lock().push(Call::Update);
            Ok(())
        }

        fn on_destroy(&mut self, _ctx: &mut BehaviorContext<'_>) -> BehaviorResult {
            self.log.lock().push(Call::Destroy);
            Ok(())
        }

        fn on_trigger_enter(&mut self, _ctx: &mut BehaviorContext<'_>, other: Entity) -> BehaviorResult {
            self.log.lock().push(Call::Enter(other));
            Ok(())
        }

        fn on_trigger_exit(&mut self, _ctx: &mut BehaviorContext<'_>, other: Entity) -> BehaviorResult {
            self.log.lock().push(Call::Exit(other));
            Ok(())
        }
    }

    fn world_with_behaviors() -> World {
        let mut world = World::new();
        world
            .register_system(BehaviorSystem::new(), BehaviorSystem::descriptor())
            .unwrap();
        world
    }

    fn attach_recorder(world: &mut World) -> (Entity, Log) {
        let log = Log::default();
        let e = world.create_entity();
        world.add_component(e, Script::new(Recorder { log: log.clone() }));
        (e, log)
    }

    fn calls(log: &Log) -> Vec<Call> {
        log.lock().clone()
    }

    #[test]
    fn start_is_deferred_and_runs_once() {
        let mut world = world_with_behaviors();
        let (e, log) = attach_recorder(&mut world);
        assert!(calls(&log).is_empty());

        world.update(0.1);
        world.update(0.1);

        assert_eq!(calls(&log), vec![Call::Start, Call::Update, Call::Update]);
        assert!(world.get_component::<Script>(e).unwrap().has_started());
    }

    #[test]
    fn destroy_runs_on_destroy_once() {
        let mut world = world_with_behaviors();
        let (e, log) = attach_recorder(&mut world);
        world.update(0.1);

        world.destroy_entity(e);
        world.destroy_entity(e);

        assert_eq!(calls(&log), vec![Call::Start, Call::Update, Call::Destroy]);
    }

    #[test]
    fn removing_or_replacing_script_retires_behavior() {
        let mut world = world_with_behaviors();
        let (e, first) = attach_recorder(&mut world);
        let second = Log::default();
        world.add_component(e, Script::new(Recorder { log: second.clone() }));
        assert_eq!(calls(&first), vec![Call::Destroy]);

        assert!(world.remove_component::<Script>(e));
        assert_eq!(calls(&second), vec![Call::Destroy]);
        assert!(world.is_valid(e));
    }

    #[test]
    fn trigger_before_first_update_starts_behavior() {
        let mut world = world_with_behaviors();
        let (e, log) = attach_recorder(&mut world);
        let other = world.create_entity();

        dispatch_trigger(&mut world, e, other, TriggerEdge::Enter);
        dispatch_trigger(&mut world, e, other, TriggerEdge::Exit);
        world.update(0.1);

        assert_eq!(
            calls(&log),
            vec![Call::Start, Call::Enter(other), Call::Exit(other), Call::Update]
        );
    }

    struct Faulty;

    impl Behavior for Faulty {
        fn start(&mut self, _ctx: &mut BehaviorContext<'_>) -> BehaviorResult {
            Err(BehaviorError::new("missing config"))
        }

        fn update(&mut self, _ctx: &mut BehaviorContext<'_>, _dt: f32) -> BehaviorResult {
            panic!("gameplay bug");
        }
    }

    #[test]
    fn faults_are_contained() {
        let mut world = world_with_behaviors();
        let bad = world.create_entity();
        world.add_component(bad, Script::new(Faulty));
        let (_good, log) = attach_recorder(&mut world);

        world.update(0.1);
        world.update(0.1);

        assert_eq!(calls(&log), vec![Call::Start, Call::Update, Call::Update]);
        // The faulty behavior is still attached and keeps being driven.
        assert!(world.get_component::<Script>(bad).unwrap().has_started());
        assert!(world.get_component::<Script>(bad).unwrap().behavior.is_some());
    }

    /// Destroys itself on its first update.
    struct SelfDestruct {
        log: Log,
    }

    impl Behavior for SelfDestruct {
        fn update(&mut self, ctx: &mut BehaviorContext<'_>, _dt: f32) -> BehaviorResult {
            ctx.destroy_self();
            self.log.lock().push(Call::Update);
            Ok(())
        }

        fn on_destroy(&mut self, ctx: &mut BehaviorContext<'_>) -> BehaviorResult {
            assert!(!ctx.world().is_valid(ctx.entity()));
            self.log.lock().push(Call::Destroy);
            Ok(())
        }
    }

    #[test]
    fn self_destruction_retires_after_hook_returns() {
        let mut world = world_with_behaviors();
        let log = Log::default();
        let e = world.create_entity();
        world.add_component(e, Script::new(SelfDestruct { log: log.clone() }));

        world.update(0.1);

        assert!(!world.is_valid(e));
        assert_eq!(calls(&log), vec![Call::Update, Call::Destroy]);
    }

    /// Spawns a child with its own script on start.
    struct Spawner {
        child: Log,
    }

    impl Behavior for Spawner {
        fn start(&mut self, ctx: &mut BehaviorContext<'_>) -> BehaviorResult {
            let child = ctx.spawn();
            ctx.world_mut()
                .add_component(child, Script::new(Recorder { log: self.child.clone() }));
            Ok(())
        }
    }

    #[test]
    fn entities_spawned_in_hooks_start_next_tick() {
        let mut world = world_with_behaviors();
        let child = Log::default();
        let e = world.create_entity();
        world.add_component(e, Script::new(Spawner { child: child.clone() }));

        world.update(0.1);
        assert!(calls(&child).is_empty());
        assert_eq!(world.alive_count(), 2);

        world.update(0.1);
        assert_eq!(calls(&child), vec![Call::Start, Call::Update]);
    }

    #[test]
    fn behavior_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "level.json");
        let err = BehaviorError::with_source("could not load level", io);
        assert_eq!(err.to_string(), "could not load level");
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.message(), "could not load level");
    }
}
