//! The global entity: one shared bag of components for cross-system state.

use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;
use engine_component::{Component, ComponentTypeId, Entity};

/// A cloneable handle to the entity manager's singleton global entity.
///
/// Every system receives a clone of the same handle. Components stored here
/// are visible to all systems and can be read or written from any thread.
/// Access goes through closures so no shard lock escapes the call.
#[derive(Clone)]
pub struct GlobalEntity {
    entity: Entity,
    components: Arc<DashMap<ComponentTypeId, Box<dyn Any + Send + Sync>>>,
}

impl GlobalEntity {
    #[must_use]
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            components: Arc::new(DashMap::new()),
        }
    }

    /// The entity ID reserved for global state.
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Insert or replace the component of type `T`. Returns `true` if one
    /// was already present.
    pub fn insert<T: Component>(&self, component: T) -> bool {
        self.components
            .insert(T::component_type_id(), Box::new(component))
            .is_some()
    }

    pub fn remove<T: Component>(&self) -> Option<T> {
        self.components
            .remove(&T::component_type_id())
            .and_then(|(_, boxed)| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    #[must_use]
    pub fn contains<T: Component>(&self) -> bool {
        self.components.contains_key(&T::component_type_id())
    }

    /// Run `f` against the component of type `T`, if present.
    pub fn read<T: Component, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let entry = self.components.get(&T::component_type_id())?;
        entry.downcast_ref::<T>().map(f)
    }

    /// Run `f` against the component of type `T` mutably, if present.
    pub fn write<T: Component, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut entry = self.components.get_mut(&T::component_type_id())?;
        entry.downcast_mut::<T>().map(f)
    }

    /// Clone out the component of type `T`.
    #[must_use]
    pub fn get_cloned<T: Component + Clone>(&self) -> Option<T> {
        self.read(T::clone)
    }
}

impl std::fmt::Debug for GlobalEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalEntity")
            .field("entity", &self.entity)
            .field("components", &self.components.len())
            .finish()
    }
}
