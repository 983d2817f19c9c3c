use crate::ecs::{Entity, Signature, System, SystemHandle, SystemRegistrationError};
use indexmap::IndexSet;
use std::any::TypeId;
use std::collections::HashMap;
use tracing::info;

/// Ordered set of registered systems plus the entity membership of each.
///
/// Membership (signature + entity set) stays in the scheduler at all times.
/// The system logic is detached while it runs so it can receive `&mut World`;
/// hook calls aimed at a detached system are queued until it is reattached.
pub(crate) struct Scheduler {
    systems: Vec<SystemSlot>,
    by_type: HashMap<TypeId, SystemHandle>,
}

struct SystemSlot {
    name: String,
    signature: Signature,
    members: IndexSet<Entity>,
    logic: Option<Box<dyn System>>,
    pending: Vec<Membership>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Membership {
    Added(Entity),
    Removed(Entity),
}

impl Membership {
    fn deliver(self, system: &mut dyn System) {
        match self {
            Membership::Added(entity) => system.on_entity_added(entity),
            Membership::Removed(entity) => system.on_entity_removed(entity),
        }
    }
}

impl SystemSlot {
    fn notify(&mut self, event: Membership) {
        match self.logic.as_deref_mut() {
            Some(logic) => event.deliver(logic),
            None => self.pending.push(event),
        }
    }

    fn sync(&mut self, entity: Entity, mask: Signature) {
        let should_contain = self.signature.matches(mask);
        let contains = self.members.contains(&entity);

        if should_contain && !contains {
            self.members.insert(entity);
            self.notify(Membership::Added(entity));
        } else if !should_contain && contains {
            self.members.swap_remove(&entity);
            self.notify(Membership::Removed(entity));
        }
    }

    fn drop_entity(&mut self, entity: Entity) {
        if self.members.swap_remove(&entity) {
            self.notify(Membership::Removed(entity));
        }
    }
}

/// A system detached for its `update` call.
pub(crate) struct SystemRun {
    pub logic: Box<dyn System>,
    pub entities: Vec<Entity>,
    pub name: String,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            by_type: HashMap::new(),
        }
    }

    pub fn register<S: System>(
        &mut self,
        name: &str,
        signature: Signature,
        system: S,
    ) -> Result<SystemHandle, SystemRegistrationError> {
        let type_id = TypeId::of::<S>();
        if let Some(&existing) = self.by_type.get(&type_id) {
            return Err(SystemRegistrationError::AlreadyRegistered {
                name: name.to_string(),
                existing,
            });
        }

        let handle = SystemHandle::new(self.systems.len() as u32);
        self.systems.push(SystemSlot {
            name: name.to_string(),
            signature,
            members: IndexSet::new(),
            logic: Some(Box::new(system)),
            pending: Vec::new(),
        });
        self.by_type.insert(type_id, handle);

        info!(system = name, handle = handle.index(), signature = signature.bits(), "system registered");
        Ok(handle)
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn handle_of<S: System>(&self) -> Option<SystemHandle> {
        self.by_type.get(&TypeId::of::<S>()).copied()
    }

    pub fn get<S: System>(&self) -> Option<&S> {
        let handle = self.handle_of::<S>()?;
        let logic = self.systems[handle.index() as usize].logic.as_deref()?;
        logic.as_any().downcast_ref::<S>()
    }

    pub fn get_mut<S: System>(&mut self) -> Option<&mut S> {
        let handle = self.handle_of::<S>()?;
        let logic = self.systems[handle.index() as usize].logic.as_deref_mut()?;
        logic.as_any_mut().downcast_mut::<S>()
    }

    pub fn name(&self, handle: SystemHandle) -> Option<&str> {
        self.slot(handle).map(|slot| slot.name.as_str())
    }

    pub fn signature(&self, handle: SystemHandle) -> Option<Signature> {
        self.slot(handle).map(|slot| slot.signature)
    }

    pub fn set_signature(
        &mut self,
        handle: SystemHandle,
        signature: Signature,
    ) -> Result<(), SystemRegistrationError> {
        let slot = self
            .systems
            .get_mut(handle.index() as usize)
            .ok_or(SystemRegistrationError::UnknownSystem(handle))?;
        slot.signature = signature;
        Ok(())
    }

    pub fn contains(&self, handle: SystemHandle, entity: Entity) -> bool {
        self.slot(handle)
            .is_some_and(|slot| slot.members.contains(&entity))
    }

    pub fn members(&self, handle: SystemHandle) -> Vec<Entity> {
        self.slot(handle)
            .map(|slot| slot.members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Re-evaluate `entity` against every system after its mask changed.
    pub fn entity_signature_changed(&mut self, entity: Entity, mask: Signature) {
        for slot in &mut self.systems {
            slot.sync(entity, mask);
        }
    }

    /// Re-evaluate `entity` against a single system.
    pub fn sync_entity(&mut self, handle: SystemHandle, entity: Entity, mask: Signature) {
        if let Some(slot) = self.systems.get_mut(handle.index() as usize) {
            slot.sync(entity, mask);
        }
    }

    /// Drop `entity` from every system unconditionally.
    pub fn entity_destroyed(&mut self, entity: Entity) {
        for slot in &mut self.systems {
            slot.drop_entity(entity);
        }
    }

    /// Detach system `index` for its update. `None` if it is already detached.
    pub fn begin_run(&mut self, index: usize) -> Option<SystemRun> {
        let slot = self.systems.get_mut(index)?;
        let logic = slot.logic.take()?;
        Some(SystemRun {
            logic,
            entities: slot.members.iter().copied().collect(),
            name: slot.name.clone(),
        })
    }

    /// Reattach a system and deliver the membership events queued meanwhile.
    pub fn end_run(&mut self, index: usize, mut logic: Box<dyn System>) {
        let Some(slot) = self.systems.get_mut(index) else {
            return;
        };
        for event in slot.pending.drain(..) {
            event.deliver(logic.as_mut());
        }
        slot.logic = Some(logic);
    }

    fn slot(&self, handle: SystemHandle) -> Option<&SystemSlot> {
        self.systems.get(handle.index() as usize)
    }
}
