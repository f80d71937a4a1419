//! The base [`System`] trait and the capability traits it can expose.

use engine_component::{DataTypeSet, EntityMut, EntityRef};
use engine_event::EventDispatcher;

use crate::global::GlobalEntity;
use crate::input::{InputEvent, InputTypeSet};

/// Declares which entities a filter-bearing capability sees.
///
/// Read once at registration; later changes to the returned set are not
/// observed.
pub trait FilterProvider {
    /// The component types an entity must carry. An empty set admits every
    /// entity.
    fn required_data_types(&self) -> DataTypeSet;
}

/// Declares which input types an input-bearing capability receives.
///
/// Read once at registration.
pub trait InputProvider {
    /// The input types this system wants delivered.
    fn input_types(&self) -> InputTypeSet;
}

/// Fires once when an entity starts passing the system's filter.
pub trait OnAdded: FilterProvider {
    fn on_added(&mut self, entity: EntityRef<'_>);
}

/// Fires once when an entity stops passing the system's filter, including
/// when it is despawned. The entity's components are still readable.
pub trait OnRemoved: FilterProvider {
    fn on_removed(&mut self, entity: EntityRef<'_>);
}

/// Fires when a passing entity's data changes and it keeps passing.
pub trait OnModified: FilterProvider {
    fn on_modified(&mut self, entity: EntityRef<'_>);
}

/// Fires once per frame for every passing entity.
pub trait OnUpdate: FilterProvider {
    fn on_update(&mut self, entity: &mut EntityMut<'_>);
}

/// Fires once per frame before this system's per-entity updates.
pub trait OnGlobalPreUpdate {
    fn on_global_pre_update(&mut self);
}

/// Fires once per frame after this system's per-entity updates.
pub trait OnGlobalPostUpdate {
    fn on_global_post_update(&mut self);
}

/// Fires for every passing entity when an input of a declared type arrives.
pub trait OnInput: FilterProvider + InputProvider {
    fn on_input(&mut self, input: &InputEvent, entity: &mut EntityMut<'_>);
}

/// Fires once when an input of a declared type arrives.
pub trait OnGlobalInput: InputProvider {
    fn on_global_input(&mut self, input: &InputEvent);
}

/// The base contract every system implements.
///
/// The entity manager calls both setters exactly once, before any
/// capability callback. Capabilities are exposed through the `as_*`
/// accessors: a system opts in by returning `Some(self)` from the accessor
/// and implementing the matching trait. The accessors are probed once at
/// registration.
pub trait System: Send {
    /// Name used in logs and registration records.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Receive the submit/subscribe view of the entity manager's event bus.
    fn set_event_dispatcher(&mut self, dispatcher: EventDispatcher);

    /// Receive the shared global entity.
    fn set_global_entity(&mut self, global: GlobalEntity);

    /// The `OnAdded` capability, if implemented.
    fn as_added(&mut self) -> Option<&mut dyn OnAdded> {
        None
    }

    /// The `OnRemoved` capability, if implemented.
    fn as_removed(&mut self) -> Option<&mut dyn OnRemoved> {
        None
    }

    /// The `OnModified` capability, if implemented.
    fn as_modified(&mut self) -> Option<&mut dyn OnModified> {
        None
    }

    /// The `OnUpdate` capability, if implemented.
    fn as_update(&mut self) -> Option<&mut dyn OnUpdate> {
        None
    }

    /// The `OnGlobalPreUpdate` capability, if implemented.
    fn as_global_pre_update(&mut self) -> Option<&mut dyn OnGlobalPreUpdate> {
        None
    }

    /// The `OnGlobalPostUpdate` capability, if implemented.
    fn as_global_post_update(&mut self) -> Option<&mut dyn OnGlobalPostUpdate> {
        None
    }

    /// The `OnInput` capability, if implemented.
    fn as_input(&mut self) -> Option<&mut dyn OnInput> {
        None
    }

    /// The `OnGlobalInput` capability, if implemented.
    fn as_global_input(&mut self) -> Option<&mut dyn OnGlobalInput> {
        None
    }
}
