//! The `System` trait implemented by every unit of per-tick logic.

use crate::ecs::{Entity, World};
use std::any::Any;

/// Object-safe access to `Any` so systems can be looked up by concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Logic run once per tick over the entities matching the system's signature.
///
/// While `update` runs the system is detached from the scheduler, so it may
/// freely mutate the World it is handed. Membership changes that concern the
/// running system are delivered to its hooks once `update` returns.
pub trait System: AsAny + Send {
    /// Run one tick. `entities` is a snapshot of the system's membership
    /// taken before the call; entities may be destroyed while iterating, so
    /// check validity before touching them.
    fn update(&mut self, world: &mut World, entities: &[Entity], dt: f32);

    /// `entity` started matching this system's signature.
    fn on_entity_added(&mut self, _entity: Entity) {}

    /// `entity` stopped matching, or was destroyed.
    fn on_entity_removed(&mut self, _entity: Entity) {}
}
