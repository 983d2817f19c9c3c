//! Entity handles and the registry that issues them
//!
//! Entities are lightweight handles (8 bytes) that reference slots in the
//! World. The generation counter prevents a recycled slot from aliasing a
//! stale handle held by gameplay code.

use super::component::{ComponentType, Signature};
use tracing::trace;

/// Entity handle (generation-indexed for safety)
///
/// Format: [32-bit index | 32-bit generation]
/// - Index: Slot in the registry; index 0 is reserved and never issued
/// - Generation: Incremented when the slot is destroyed
///
/// Example:
/// ```ignore
/// let entity = world.create_entity();
/// world.destroy_entity(entity);
/// assert!(!world.is_valid(entity)); // generation mismatch
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// The reserved "no entity" handle. Never issued by a registry.
    pub const INVALID: Entity = Entity::new(0, 0);

    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn is_null(&self) -> bool {
        self.index == 0
    }

    /// Serialize to 64-bit integer (non-zero for every issued handle)
    pub fn to_bits(&self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }

    /// Deserialize from 64-bit integer
    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::INVALID
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    generation: u32,
    alive: bool,
    mask: Signature,
}

/// Issues, validates and recycles entity handles, and tracks each live
/// entity's component mask.
#[derive(Debug)]
pub struct EntityRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    alive: usize,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            // Slot 0 backs Entity::INVALID and is never handed out.
            slots: vec![Slot::default()],
            free: Vec::new(),
            alive: 0,
        }
    }

    /// Issue a handle, reusing a destroyed slot when one is available.
    pub fn create(&mut self) -> Entity {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot::default());
                index
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.alive = true;
        slot.mask = Signature::EMPTY;
        self.alive += 1;

        let entity = Entity::new(index, slot.generation);
        trace!(%entity, "entity created");
        entity
    }

    /// Mark `entity` dead and queue its slot for reuse. Returns `false` for
    /// stale or never-issued handles.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.is_valid(entity) {
            return false;
        }

        let slot = &mut self.slots[entity.index as usize];
        slot.alive = false;
        slot.mask = Signature::EMPTY;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(entity.index);
        self.alive -= 1;

        trace!(%entity, "entity destroyed");
        true
    }

    pub fn is_valid(&self, entity: Entity) -> bool {
        if entity.is_null() {
            return false;
        }
        self.slots
            .get(entity.index as usize)
            .is_some_and(|slot| slot.alive && slot.generation == entity.generation)
    }

    /// Component mask of a live entity.
    pub fn mask(&self, entity: Entity) -> Option<Signature> {
        if !self.is_valid(entity) {
            return None;
        }
        Some(self.slots[entity.index as usize].mask)
    }

    /// Set or clear one component bit; returns the updated mask.
    pub fn set_component_bit(
        &mut self,
        entity: Entity,
        component: ComponentType,
        present: bool,
    ) -> Option<Signature> {
        if !self.is_valid(entity) {
            return None;
        }
        let slot = &mut self.slots[entity.index as usize];
        slot.mask = if present {
            slot.mask.with(component)
        } else {
            slot.mask.without(component)
        };
        Some(slot.mask)
    }

    pub fn alive_count(&self) -> usize {
        self.alive
    }

    /// Live entities in slot order.
    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, slot)| slot.alive)
            .map(|(index, slot)| Entity::new(index as u32, slot.generation))
    }

    /// Handle of the live entity occupying slot `index`, if any.
    pub fn entity_at(&self, index: u32) -> Option<Entity> {
        if index == 0 {
            return None;
        }
        let slot = self.slots.get(index as usize)?;
        slot.alive.then(|| Entity::new(index, slot.generation))
    }

    /// Number of slots ever allocated (excluding the reserved slot).
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
