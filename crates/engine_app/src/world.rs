//! World state and system lifecycle driving.
//!
//! The [`World`] owns every entity's components, the registered systems, the
//! event bus and the global entity. Every structural change goes through it,
//! so it can keep each system's filter membership current and fire the
//! matching `on_added` / `on_removed` / `on_modified` callbacks.

use std::collections::{BTreeMap, BTreeSet};

use engine_component::{Component, ComponentSet, Entity, EntityAllocator, EntityMut, EntityRef};
use engine_event::{DispatchStats, EventBus, EventDispatcher};
use engine_system::{GlobalEntity, InputEvent, System, SystemRegistration};
use tracing::{debug, info, trace};

use crate::error::EngineError;
use crate::registry::{SystemRegistry, SystemSlot};

/// Counters for one [`World::update`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// `on_update` calls made.
    pub updates: usize,
    /// `on_modified` calls caused by mutations during updates.
    pub modified: usize,
    /// What the end-of-frame dispatch delivered.
    pub dispatch: DispatchStats,
}

/// The entity manager.
#[derive(Debug)]
pub struct World {
    allocator: EntityAllocator,
    entities: BTreeMap<Entity, ComponentSet>,
    registry: SystemRegistry,
    bus: EventBus,
    global: GlobalEntity,
}

impl World {
    /// Create an empty world. The global entity takes [`Entity::GLOBAL`];
    /// spawned entities are numbered after it.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            entities: BTreeMap::new(),
            registry: SystemRegistry::new(),
            bus: EventBus::new(),
            global: GlobalEntity::new(Entity::GLOBAL),
        }
    }

    /// The shared global entity.
    #[must_use]
    pub fn global(&self) -> &GlobalEntity {
        &self.global
    }

    /// A submit/subscribe view of the world's event bus.
    #[must_use]
    pub fn events(&self) -> EventDispatcher {
        self.bus.dispatcher()
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    #[must_use]
    pub fn registry(&self) -> &SystemRegistry {
        &self.registry
    }

    /// Register a system.
    ///
    /// Injects the event dispatcher and global entity, probes capabilities,
    /// and fires `on_added` for every existing entity that already passes
    /// the system's filter.
    pub fn register_system(&mut self, mut system: Box<dyn System>) -> &SystemRegistration {
        system.set_event_dispatcher(self.bus.dispatcher());
        system.set_global_entity(self.global.clone());
        let registration = SystemRegistration::probe(system.as_mut());

        info!(
            system = registration.name,
            capabilities = %registration.capabilities,
            "registered system"
        );

        let mut slot = SystemSlot::new(system, registration);
        if slot.registration.has_filter() {
            for (&entity, components) in &self.entities {
                admit(&mut slot, entity, components);
            }
        }

        &self.registry.push(slot).registration
    }

    /// Spawn an entity carrying `components`.
    pub fn spawn(&mut self, components: ComponentSet) -> Entity {
        let entity = self.allocator.allocate();
        debug!(%entity, components = components.len(), "spawned entity");

        for slot in self.registry.iter_mut() {
            if slot.registration.has_filter() {
                admit(slot, entity, &components);
            }
        }
        self.entities.insert(entity, components);
        entity
    }

    /// Despawn `entity`, firing `on_removed` for every system it passed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownEntity`] if the entity does not exist.
    pub fn despawn(&mut self, entity: Entity) -> Result<ComponentSet, EngineError> {
        let components = self
            .entities
            .remove(&entity)
            .ok_or(EngineError::UnknownEntity(entity))?;

        for slot in self.registry.iter_mut() {
            if slot.members.remove(&entity)
                && let Some(cap) = slot.system.as_removed()
            {
                cap.on_removed(EntityRef::new(entity, &components));
            }
        }
        debug!(%entity, "despawned entity");
        Ok(components)
    }

    /// Insert or replace a component on `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownEntity`] if the entity does not exist.
    pub fn insert_component<T: Component>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<(), EngineError> {
        let components = self
            .entities
            .get_mut(&entity)
            .ok_or(EngineError::UnknownEntity(entity))?;
        components.insert(component);
        self.refresh(entity);
        Ok(())
    }

    /// Remove a component from `entity`, returning it if present.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownEntity`] if the entity does not exist.
    pub fn remove_component<T: Component>(
        &mut self,
        entity: Entity,
    ) -> Result<Option<T>, EngineError> {
        let components = self
            .entities
            .get_mut(&entity)
            .ok_or(EngineError::UnknownEntity(entity))?;
        let removed = components.remove::<T>();
        if removed.is_some() {
            self.refresh(entity);
        }
        Ok(removed)
    }

    /// Mutate a component on `entity` in place, firing `on_modified` for
    /// every system the entity passes. Returns `None` if the entity does
    /// not carry a `T`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownEntity`] if the entity does not exist.
    pub fn modify<T: Component, R>(
        &mut self,
        entity: Entity,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<Option<R>, EngineError> {
        let components = self
            .entities
            .get_mut(&entity)
            .ok_or(EngineError::UnknownEntity(entity))?;
        let Some(component) = components.get_mut::<T>() else {
            return Ok(None);
        };
        let result = f(component);
        self.notify_modified(&BTreeSet::from([entity]));
        Ok(Some(result))
    }

    /// Borrow one component of `entity`.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.entities.get(&entity)?.get::<T>()
    }

    /// Returns the number of live entities, excluding the global entity.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Deliver one input.
    ///
    /// For each system in registration order that declared the input type:
    /// `on_global_input` once, then `on_input` for every passing entity.
    /// Mutations made by `on_input` are reported through `on_modified`.
    pub fn deliver_input(&mut self, input: &InputEvent) {
        let mut touched = BTreeSet::new();

        for slot in self.registry.iter_mut() {
            if !slot.registration.accepts_input(input.type_id()) {
                continue;
            }
            let SystemSlot { system, members, .. } = slot;

            if let Some(cap) = system.as_global_input() {
                cap.on_global_input(input);
            }
            if let Some(cap) = system.as_input() {
                for &entity in members.iter() {
                    if let Some(components) = self.entities.get_mut(&entity) {
                        let mut view = EntityMut::new(entity, components);
                        cap.on_input(input, &mut view);
                        if view.is_touched() {
                            touched.insert(entity);
                        }
                    }
                }
            }
        }

        trace!(input = input.type_name(), touched = touched.len(), "delivered input");
        self.notify_modified(&touched);
    }

    /// Run one frame.
    ///
    /// For each system in registration order: `on_global_pre_update`, then
    /// `on_update` for every passing entity in ascending ID order, then
    /// `on_global_post_update`. Entities mutated during updates are then
    /// reported through `on_modified`, and finally the event bus is
    /// dispatched once.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Event`] if the dispatch fails.
    pub fn update(&mut self) -> Result<FrameReport, EngineError> {
        let mut report = FrameReport::default();
        let mut touched = BTreeSet::new();

        for slot in self.registry.iter_mut() {
            let SystemSlot { system, members, .. } = slot;

            if let Some(cap) = system.as_global_pre_update() {
                cap.on_global_pre_update();
            }
            if let Some(cap) = system.as_update() {
                for &entity in members.iter() {
                    if let Some(components) = self.entities.get_mut(&entity) {
                        let mut view = EntityMut::new(entity, components);
                        cap.on_update(&mut view);
                        report.updates += 1;
                        if view.is_touched() {
                            touched.insert(entity);
                        }
                    }
                }
            }
            if let Some(cap) = system.as_global_post_update() {
                cap.on_global_post_update();
            }
        }

        report.modified = self.notify_modified(&touched);
        report.dispatch = self.bus.dispatch()?;
        Ok(report)
    }

    /// Re-evaluate every filter for `entity` after a component was added,
    /// replaced or removed.
    fn refresh(&mut self, entity: Entity) {
        let Some(components) = self.entities.get(&entity) else {
            return;
        };

        for slot in self.registry.iter_mut() {
            if !slot.registration.has_filter() {
                continue;
            }
            let was = slot.members.contains(&entity);
            let now = slot.registration.admits(components);
            let view = EntityRef::new(entity, components);

            match (was, now) {
                (false, true) => admit(slot, entity, components),
                (true, false) => {
                    slot.members.remove(&entity);
                    trace!(%entity, system = slot.registration.name, "left filter");
                    if let Some(cap) = slot.system.as_removed() {
                        cap.on_removed(view);
                    }
                }
                (true, true) => {
                    if let Some(cap) = slot.system.as_modified() {
                        cap.on_modified(view);
                    }
                }
                (false, false) => {}
            }
        }
    }

    /// Fire `on_modified` for each entity in `touched` on every system it
    /// passes. Returns the number of calls made.
    fn notify_modified(&mut self, touched: &BTreeSet<Entity>) -> usize {
        if touched.is_empty() {
            return 0;
        }
        let mut calls = 0;
        for slot in self.registry.iter_mut() {
            let SystemSlot { system, members, .. } = slot;
            let Some(cap) = system.as_modified() else {
                continue;
            };
            for entity in touched.intersection(members) {
                if let Some(components) = self.entities.get(entity) {
                    cap.on_modified(EntityRef::new(*entity, components));
                    calls += 1;
                }
            }
        }
        calls
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Add `entity` to `slot`'s members if it passes, firing `on_added`.
fn admit(slot: &mut SystemSlot, entity: Entity, components: &ComponentSet) {
    if !slot.registration.admits(components) || !slot.members.insert(entity) {
        return;
    }
    trace!(%entity, system = slot.registration.name, "entered filter");
    if let Some(cap) = slot.system.as_added() {
        cap.on_added(EntityRef::new(entity, components));
    }
}
