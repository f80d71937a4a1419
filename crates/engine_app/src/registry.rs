//! System registry: registered systems, their probe results and the
//! entities currently passing each system's filter.
//!
//! Systems are kept in registration order, which is also the order the
//! frame loop drives them in.

use std::collections::BTreeSet;

use engine_component::Entity;
use engine_system::{System, SystemRegistration};

/// One registered system.
pub struct SystemSlot {
    /// The system itself.
    pub system: Box<dyn System>,
    /// What the system declared at registration.
    pub registration: SystemRegistration,
    /// Entities passing the filter. Always empty for systems without a
    /// filter-bearing capability.
    pub members: BTreeSet<Entity>,
}

impl SystemSlot {
    #[must_use]
    pub fn new(system: Box<dyn System>, registration: SystemRegistration) -> Self {
        Self {
            system,
            registration,
            members: BTreeSet::new(),
        }
    }
}

impl std::fmt::Debug for SystemSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemSlot")
            .field("registration", &self.registration)
            .field("members", &self.members.len())
            .finish_non_exhaustive()
    }
}

/// Registry of all systems known to the world.
#[derive(Debug, Default)]
pub struct SystemRegistry {
    slots: Vec<SystemSlot>,
}

impl SystemRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Append a slot and return it.
    pub fn push(&mut self, slot: SystemSlot) -> &SystemSlot {
        self.slots.push(slot);
        &self.slots[self.slots.len() - 1]
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SystemSlot> {
        self.slots.iter_mut()
    }

    /// Returns an iterator over every registration record.
    pub fn registrations(&self) -> impl Iterator<Item = &SystemRegistration> {
        self.slots.iter().map(|slot| &slot.registration)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total filter memberships across all systems.
    #[must_use]
    pub fn total_members(&self) -> usize {
        self.slots.iter().map(|slot| slot.members.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use engine_event::EventDispatcher;
    use engine_system::GlobalEntity;

    use super::*;

    struct Named(&'static str);

    impl System for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn set_event_dispatcher(&mut self, _: EventDispatcher) {}
        fn set_global_entity(&mut self, _: GlobalEntity) {}
    }

    fn slot(name: &'static str) -> SystemSlot {
        let mut system = Named(name);
        let registration = SystemRegistration::probe(&mut system);
        SystemSlot::new(Box::new(system), registration)
    }

    #[test]
    fn test_push_preserves_order() {
        let mut registry = SystemRegistry::new();
        assert_eq!(registry.push(slot("physics")).registration.name, "physics");
        registry.push(slot("ai"));
        let names: Vec<_> = registry.registrations().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["physics", "ai"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_total_members() {
        let mut registry = SystemRegistry::new();
        registry.push(slot("a"));
        registry.push(slot("b"));
        for slot in registry.iter_mut() {
            slot.members.insert(Entity::from_raw(2));
        }
        assert_eq!(registry.total_members(), 2);
        assert!(!registry.is_empty());
    }
}
