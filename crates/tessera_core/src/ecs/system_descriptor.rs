use crate::ecs::{Component, ComponentError, ComponentStorage, ComponentType, Signature};
use std::any::{type_name, TypeId};

type RegisterFn = fn(&mut ComponentStorage) -> Result<ComponentType, ComponentError>;

#[derive(Clone, Copy)]
struct RequiredComponent {
    type_id: TypeId,
    type_name: &'static str,
    register: RegisterFn,
}

/// Name and required component set of a system, resolved into a
/// [`Signature`] when the system is registered with a World.
#[derive(Clone)]
pub struct SystemDescriptor {
    name: String,
    requires: Vec<RequiredComponent>,
}

impl SystemDescriptor {
    /// Create a new descriptor with the provided name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requires: Vec::new(),
        }
    }

    /// Require component `T` for membership.
    pub fn require<T: Component>(mut self) -> Self {
        let type_id = TypeId::of::<T>();
        if !self.requires.iter().any(|c| c.type_id == type_id) {
            self.requires.push(RequiredComponent {
                type_id,
                type_name: type_name::<T>(),
                register: ComponentStorage::register::<T>,
            });
        }
        self
    }

    /// Unique system name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type names of the required components, in declaration order.
    pub fn required_component_names(&self) -> Vec<&'static str> {
        self.requires.iter().map(|c| c.type_name).collect()
    }

    /// Register every required component type and build the signature.
    pub(crate) fn resolve(
        &self,
        components: &mut ComponentStorage,
    ) -> Result<Signature, ComponentError> {
        self.requires
            .iter()
            .map(|c| (c.register)(components))
            .collect::<Result<Signature, _>>()
    }
}

impl std::fmt::Debug for SystemDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemDescriptor")
            .field("name", &self.name)
            .field("requires", &self.required_component_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position;
    struct Velocity;

    #[test]
    fn duplicate_requirements_collapse() {
        let descriptor = SystemDescriptor::new("movement")
            .require::<Position>()
            .require::<Velocity>()
            .require::<Position>();
        assert_eq!(descriptor.required_component_names().len(), 2);
    }

    #[test]
    fn resolve_registers_on_demand() {
        let mut storage = ComponentStorage::new();
        let signature = SystemDescriptor::new("movement")
            .require::<Position>()
            .require::<Velocity>()
            .resolve(&mut storage)
            .unwrap();

        let position = storage.component_type::<Position>().unwrap();
        let velocity = storage.component_type::<Velocity>().unwrap();
        assert_eq!(signature, Signature::EMPTY.with(position).with(velocity));
    }
}
