//! Borrowed views of one entity, handed to system callbacks.

use crate::component::{Component, ComponentSet};
use crate::entity::Entity;

/// Read-only access to an entity and its components.
#[derive(Debug, Clone, Copy)]
pub struct EntityRef<'a> {
    entity: Entity,
    components: &'a ComponentSet,
}

impl<'a> EntityRef<'a> {
    #[must_use]
    pub fn new(entity: Entity, components: &'a ComponentSet) -> Self {
        Self { entity, components }
    }

    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    #[must_use]
    pub fn get<T: Component>(&self) -> Option<&'a T> {
        self.components.get::<T>()
    }

    #[must_use]
    pub fn has<T: Component>(&self) -> bool {
        self.components.contains(T::component_type_id())
    }

    #[must_use]
    pub fn components(&self) -> &'a ComponentSet {
        self.components
    }
}

/// Mutable access to an entity's existing components.
///
/// Components cannot be added or removed through this view, so filter
/// membership is stable while a callback runs. Every successful
/// [`EntityMut::get_mut`] marks the entity as touched; the entity manager
/// turns touched entities into modification notifications.
#[derive(Debug)]
pub struct EntityMut<'a> {
    entity: Entity,
    components: &'a mut ComponentSet,
    touched: bool,
}

impl<'a> EntityMut<'a> {
    #[must_use]
    pub fn new(entity: Entity, components: &'a mut ComponentSet) -> Self {
        Self {
            entity,
            components,
            touched: false,
        }
    }

    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    #[must_use]
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.components.get::<T>()
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        let component = self.components.get_mut::<T>();
        if component.is_some() {
            self.touched = true;
        }
        component
    }

    #[must_use]
    pub fn has<T: Component>(&self) -> bool {
        self.components.contains(T::component_type_id())
    }

    /// Returns `true` once any component was borrowed mutably.
    #[must_use]
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    #[must_use]
    pub fn as_entity_ref(&self) -> EntityRef<'_> {
        EntityRef::new(self.entity, &*self.components)
    }
}
