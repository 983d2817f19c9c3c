//! Entity Component System core types.
//!
//! Entities are generational handles issued by an [`EntityRegistry`].
//! Components live in type-erased sparse pools ([`ComponentStorage`]), one
//! per registered type, and each type owns one bit of the entity's
//! [`Signature`]. Systems declare the components they need through a
//! [`SystemDescriptor`]; the scheduler keeps their entity lists in sync with
//! mask changes and runs them in registration order from [`World::update`].

mod component;
mod entity;
mod macros;
mod scheduler;
mod storage;
mod system;
mod system_descriptor;
mod system_handle;
mod system_registration_error;
mod world;

pub use component::{Component, ComponentError, ComponentType, Signature, MAX_COMPONENT_TYPES};
pub use entity::{Entity, EntityRegistry};
pub use storage::ComponentStorage;
pub use system::{AsAny, System};
pub use system_descriptor::SystemDescriptor;
pub use system_handle::SystemHandle;
pub use system_registration_error::SystemRegistrationError;
pub use world::World;

pub(crate) use scheduler::Scheduler;
