// component.rs - Component type tags and signatures
//
// Each component type gets a small integer tag the first time a World sees
// it. The tag is the pool key and the bit position in entity masks, so the
// mask width bounds how many component types a World can hold.

use std::fmt;
use thiserror::Error;

/// Number of bits in a component mask.
pub const MAX_COMPONENT_TYPES: usize = 32;

/// Anything stored in a component pool.
///
/// Blanket-implemented: components are plain owned Rust values. `Send` is
/// required because the World moves to the simulation thread.
pub trait Component: Send + 'static {}

impl<T: Send + 'static> Component for T {}

/// Per-World tag assigned to a component type at registration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentType(u8);

impl ComponentType {
    pub(crate) const fn new(raw: u8) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bitmask of component types. Used both as an entity's component mask and
/// as a system's required set.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Signature(u32);

impl Signature {
    pub const EMPTY: Signature = Signature(0);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn with(self, component: ComponentType) -> Self {
        Self(self.0 | (1 << component.0))
    }

    #[must_use]
    pub const fn without(self, component: ComponentType) -> Self {
        Self(self.0 & !(1 << component.0))
    }

    pub const fn contains(self, component: ComponentType) -> bool {
        self.0 & (1 << component.0) != 0
    }

    /// Whether an entity holding `mask` satisfies this signature.
    pub const fn matches(self, mask: Signature) -> bool {
        mask.0 & self.0 == self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<ComponentType> for Signature {
    fn from_iter<I: IntoIterator<Item = ComponentType>>(iter: I) -> Self {
        iter.into_iter().fold(Signature::EMPTY, Signature::with)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComponentError {
    #[error("cannot register component '{type_name}': all {limit} component type slots are in use")]
    TooManyComponentTypes {
        limit: usize,
        type_name: &'static str,
    },
}
