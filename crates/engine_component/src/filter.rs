//! Required-data-type declarations for system filters.
//!
//! A [`DataTypeSet`] lists the component types an entity must carry to be
//! visible to a system. Filters only exclude: an empty set admits every
//! entity, and an entity is rejected only when it lacks one of the listed
//! types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentSet, ComponentTypeId};

/// The set of component types a system requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTypeSet {
    types: BTreeSet<ComponentTypeId>,
}

impl DataTypeSet {
    /// An empty requirement set, which every entity passes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require component type `T`.
    #[must_use]
    pub fn with<T: Component>(self) -> Self {
        self.with_id(T::component_type_id())
    }

    /// Require a component by type ID.
    #[must_use]
    pub fn with_id(mut self, type_id: ComponentTypeId) -> Self {
        self.types.insert(type_id);
        self
    }

    /// Returns `true` if `type_id` is one of the required types.
    #[must_use]
    pub fn contains(&self, type_id: ComponentTypeId) -> bool {
        self.types.contains(&type_id)
    }

    /// Returns `true` if nothing is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Number of required types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Iterate over the required type IDs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.types.iter().copied()
    }

    /// Returns `true` if an entity carrying `components` passes this filter.
    #[must_use]
    pub fn matches(&self, components: &ComponentSet) -> bool {
        self.types.iter().all(|ty| components.contains(*ty))
    }
}

impl FromIterator<ComponentTypeId> for DataTypeSet {
    fn from_iter<I: IntoIterator<Item = ComponentTypeId>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position;
    impl Component for Position {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    struct Velocity;
    impl Component for Velocity {
        fn type_name() -> &'static str {
            "Velocity"
        }
    }

    #[test]
    fn test_empty_set_matches_everything() {
        let filter = DataTypeSet::new();
        assert!(filter.matches(&ComponentSet::new()));
        assert!(filter.matches(&ComponentSet::new().with(Position)));
    }

    #[test]
    fn test_missing_type_fails() {
        let filter = DataTypeSet::new().with::<Position>();
        assert!(!filter.matches(&ComponentSet::new()));
        assert!(!filter.matches(&ComponentSet::new().with(Velocity)));
    }

    #[test]
    fn test_all_required_types_present_passes() {
        let filter = DataTypeSet::new().with::<Position>().with::<Velocity>();
        let both = ComponentSet::new().with(Position).with(Velocity);
        let one = ComponentSet::new().with(Position);
        assert!(filter.matches(&both));
        assert!(!filter.matches(&one));
    }

    #[test]
    fn test_duplicate_requirements_collapse() {
        let filter: DataTypeSet = [
            Position::component_type_id(),
            Position::component_type_id(),
        ]
        .into_iter()
        .collect();
        assert_eq!(filter.len(), 1);
        assert!(filter.contains(Position::component_type_id()));
    }
}
