//! Entity identifiers.
//!
//! IDs are plain `u64`s. Two of them are fixed: `0` never names an entity
//! and `1` is the world's singleton global entity. Everything else comes
//! from an [`EntityAllocator`], which starts above the fixed IDs and never
//! reuses one.

use serde::{Deserialize, Serialize};

/// Identifies one entity in a world.
///
/// Which systems see an entity depends only on the components stored
/// against this ID; the ID itself carries nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(pub u64);

impl Entity {
    /// Placeholder for "no entity", e.g. in a reset event.
    pub const INVALID: Entity = Entity(0);

    /// The singleton entity that holds cross-system state.
    pub const GLOBAL: Entity = Entity(1);

    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Hands out IDs for spawned entities.
#[derive(Debug)]
pub struct EntityAllocator {
    next: u64,
}

impl EntityAllocator {
    /// First ID an allocator hands out.
    pub const FIRST: u64 = Entity::GLOBAL.0 + 1;

    #[must_use]
    pub fn new() -> Self {
        Self { next: Self::FIRST }
    }

    /// Take the next unused ID.
    pub fn allocate(&mut self) -> Entity {
        let entity = Entity(self.next);
        self.next += 1;
        entity
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
