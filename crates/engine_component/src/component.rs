//! Core [`Component`] trait, component identity and per-entity storage.
//!
//! [`ComponentTypeId`] is derived from the component's **string name** using
//! the FNV-1a 64-bit hash, so a system can declare its required data types
//! without holding the concrete Rust types.

use std::any::Any;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A unique identifier for a component type, derived from its string name
/// using the FNV-1a 64-bit hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the [`ComponentTypeId`] for a component name.
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325
    /// for each byte in name.as_bytes():
    ///     hash = (hash XOR byte) * 0x00000100000001b3
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// The [`ComponentTypeId`] of a Rust component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self::from_name(T::type_name())
    }
}

/// The core component trait.
///
/// Components are plain data attached to an entity. They must be
/// `Send + Sync` because the entity manager may hand entity data to
/// systems running on any thread.
///
/// # Examples
///
/// ```rust
/// use engine_component::Component;
///
/// #[derive(Debug, Clone)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component: Send + Sync + 'static {
    /// A human-readable name for this component type.
    fn type_name() -> &'static str;

    /// Returns the [`ComponentTypeId`] for this component.
    fn component_type_id() -> ComponentTypeId {
        ComponentTypeId::from_name(Self::type_name())
    }
}

/// The components carried by a single entity, keyed by [`ComponentTypeId`].
///
/// At most one component of each type is stored. Values are type-erased and
/// recovered with [`ComponentSet::get`] / [`ComponentSet::get_mut`].
#[derive(Default)]
pub struct ComponentSet {
    components: HashMap<ComponentTypeId, Box<dyn Any + Send + Sync>>,
}

impl ComponentSet {
    /// Create an empty component set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with<T: Component>(mut self, component: T) -> Self {
        self.insert(component);
        self
    }

    /// Insert or replace the component of type `T`.
    ///
    /// Returns `true` if a component of this type was already present.
    pub fn insert<T: Component>(&mut self, component: T) -> bool {
        self.components
            .insert(T::component_type_id(), Box::new(component))
            .is_some()
    }

    /// Remove the component of type `T`, returning it if present.
    pub fn remove<T: Component>(&mut self) -> Option<T> {
        self.components
            .remove(&T::component_type_id())
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Borrow the component of type `T`.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.components
            .get(&T::component_type_id())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    /// Mutably borrow the component of type `T`.
    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .get_mut(&T::component_type_id())
            .and_then(|boxed| boxed.downcast_mut::<T>())
    }

    /// Returns `true` if a component with this type ID is present.
    #[must_use]
    pub fn contains(&self, type_id: ComponentTypeId) -> bool {
        self.components.contains_key(&type_id)
    }

    /// Iterate over the type IDs of all carried components.
    pub fn type_ids(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.components.keys().copied()
    }

    /// Number of components carried.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if the set carries no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl std::fmt::Debug for ComponentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.components.keys()).finish()
    }
}
