// storage.rs - Type-erased sparse component pools
//
// One pool per registered component type, addressed by entity slot index.
// Pools own their values; removing a component drops it immediately.
// Liveness/generation checks are the World's job, pools only see indices.

use super::component::{Component, ComponentError, ComponentType, MAX_COMPONENT_TYPES};
use super::entity::Entity;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use tracing::debug;

/// Object-safe view of a pool so heterogenous pools can live in one Vec.
trait ErasedPool: Send {
    fn remove_index(&mut self, index: u32) -> bool;
    fn contains_index(&self, index: u32) -> bool;
    fn len(&self) -> usize;
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dense-by-index, sparse-by-occupancy storage for one component type.
struct SparsePool<T> {
    slots: Vec<Option<T>>,
    len: usize,
}

impl<T: Component> SparsePool<T> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
        }
    }

    fn insert(&mut self, index: u32, value: T) -> Option<T> {
        let index = index as usize;
        if index >= self.slots.len() {
            let target = (index + 1).max(self.slots.len() * 2);
            self.slots.resize_with(target, || None);
        }
        let previous = self.slots[index].replace(value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    fn take(&mut self, index: u32) -> Option<T> {
        let value = self.slots.get_mut(index as usize)?.take();
        if value.is_some() {
            self.len -= 1;
        }
        value
    }

    fn get(&self, index: u32) -> Option<&T> {
        self.slots.get(index as usize)?.as_ref()
    }

    fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.slots.get_mut(index as usize)?.as_mut()
    }

    fn iter(&self) -> impl Iterator<Item = (u32, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|value| (index as u32, value)))
    }
}

impl<T: Component> ErasedPool for SparsePool<T> {
    fn remove_index(&mut self, index: u32) -> bool {
        self.take(index).is_some()
    }

    fn contains_index(&self, index: u32) -> bool {
        self.get(index).is_some()
    }

    fn len(&self) -> usize {
        self.len
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// All component pools of a World, keyed by component type tag.
pub struct ComponentStorage {
    pools: Vec<Box<dyn ErasedPool>>,
    types: HashMap<TypeId, ComponentType>,
}

impl ComponentStorage {
    pub fn new() -> Self {
        Self {
            pools: Vec::new(),
            types: HashMap::new(),
        }
    }

    /// Register `T`, assigning its tag on first call. Idempotent.
    pub fn register<T: Component>(&mut self) -> Result<ComponentType, ComponentError> {
        if let Some(&ty) = self.types.get(&TypeId::of::<T>()) {
            return Ok(ty);
        }
        if self.pools.len() >= MAX_COMPONENT_TYPES {
            return Err(ComponentError::TooManyComponentTypes {
                limit: MAX_COMPONENT_TYPES,
                type_name: type_name::<T>(),
            });
        }

        let ty = ComponentType::new(self.pools.len() as u8);
        self.pools.push(Box::new(SparsePool::<T>::new()));
        self.types.insert(TypeId::of::<T>(), ty);
        debug!(component = type_name::<T>(), tag = ty.raw(), "component type registered");
        Ok(ty)
    }

    /// Tag of `T` if it has been registered.
    pub fn component_type<T: Component>(&self) -> Option<ComponentType> {
        self.types.get(&TypeId::of::<T>()).copied()
    }

    pub fn registered_count(&self) -> usize {
        self.pools.len()
    }

    /// Store `value` for `entity`, registering `T` on demand. Returns the
    /// tag and the value it replaced, if any.
    pub fn insert<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<(ComponentType, Option<T>), ComponentError> {
        let ty = self.register::<T>()?;
        let previous = self.pool_mut::<T>(ty).and_then(|pool| pool.insert(entity.index(), value));
        Ok((ty, previous))
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        let ty = self.component_type::<T>()?;
        self.pool::<T>(ty)?.get(entity.index())
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let ty = self.component_type::<T>()?;
        self.pool_mut::<T>(ty)?.get_mut(entity.index())
    }

    pub fn contains<T: Component>(&self, entity: Entity) -> bool {
        self.get::<T>(entity).is_some()
    }

    /// Remove and return `T` for `entity`.
    pub fn take<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let ty = self.component_type::<T>()?;
        self.pool_mut::<T>(ty)?.take(entity.index())
    }

    /// Drop every component `entity` holds. Returns how many were removed.
    pub fn remove_all(&mut self, entity: Entity) -> usize {
        self.pools
            .iter_mut()
            .map(|pool| pool.remove_index(entity.index()))
            .filter(|&removed| removed)
            .count()
    }

    /// Whether the pool for `ty` holds a value at `entity`'s slot.
    pub fn contains_type(&self, ty: ComponentType, entity: Entity) -> bool {
        self.pools
            .get(ty.index())
            .is_some_and(|pool| pool.contains_index(entity.index()))
    }

    /// Number of live instances of `T`.
    pub fn count<T: Component>(&self) -> usize {
        self.component_type::<T>()
            .and_then(|ty| self.pools.get(ty.index()))
            .map_or(0, |pool| pool.len())
    }

    /// Occupied slots of `T` as `(slot index, value)`, in index order.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (u32, &T)> + '_ {
        self.component_type::<T>()
            .and_then(|ty| self.pool::<T>(ty))
            .into_iter()
            .flat_map(|pool| pool.iter())
    }

    /// Registered component type names in tag order (diagnostics).
    pub fn type_names(&self) -> Vec<&'static str> {
        self.pools.iter().map(|pool| pool.type_name()).collect()
    }

    fn pool<T: Component>(&self, ty: ComponentType) -> Option<&SparsePool<T>> {
        self.pools.get(ty.index())?.as_any().downcast_ref()
    }

    fn pool_mut<T: Component>(&mut self, ty: ComponentType) -> Option<&mut SparsePool<T>> {
        self.pools.get_mut(ty.index())?.as_any_mut().downcast_mut()
    }
}

impl Default for ComponentStorage {
    fn default() -> Self {
        Self::new()
    }
}
