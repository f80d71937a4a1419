//! Input payloads and input type declarations.
//!
//! Which inputs exist and when they arrive is decided by the input pipeline
//! outside this crate. Systems only declare the input types they care
//! about and receive matching [`InputEvent`]s.

use std::any::Any;
use std::collections::BTreeSet;

use engine_component::ComponentTypeId;
use serde::{Deserialize, Serialize};

/// Identifier of an input type, derived from its name with the same FNV-1a
/// hash used for [`ComponentTypeId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InputTypeId(pub u64);

impl InputTypeId {
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        Self(ComponentTypeId::from_name(name).0)
    }

    #[must_use]
    pub fn of<T: Input>() -> Self {
        Self::from_name(T::type_name())
    }
}

/// A payload the input pipeline can deliver.
pub trait Input: Send + Sync + 'static {
    fn type_name() -> &'static str;
}

/// One delivered input: its type tag plus the type-erased payload.
pub struct InputEvent {
    type_id: InputTypeId,
    type_name: &'static str,
    payload: Box<dyn Any + Send + Sync>,
}

impl InputEvent {
    #[must_use]
    pub fn new<T: Input>(input: T) -> Self {
        Self {
            type_id: InputTypeId::of::<T>(),
            type_name: T::type_name(),
            payload: Box::new(input),
        }
    }

    #[must_use]
    pub fn type_id(&self) -> InputTypeId {
        self.type_id
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn is<T: Input>(&self) -> bool {
        self.payload.is::<T>()
    }

    /// Borrow the payload as `T`, if that is what it holds.
    #[must_use]
    pub fn downcast_ref<T: Input>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for InputEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputEvent")
            .field("type_name", &self.type_name)
            .field("type_id", &self.type_id)
            .finish_non_exhaustive()
    }
}

/// The input types a system declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputTypeSet {
    types: BTreeSet<InputTypeId>,
}

impl InputTypeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<T: Input>(self) -> Self {
        self.with_id(InputTypeId::of::<T>())
    }

    #[must_use]
    pub fn with_id(mut self, type_id: InputTypeId) -> Self {
        self.types.insert(type_id);
        self
    }

    #[must_use]
    pub fn contains(&self, type_id: InputTypeId) -> bool {
        self.types.contains(&type_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = InputTypeId> + '_ {
        self.types.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct KeyDown(char);
    impl Input for KeyDown {
        fn type_name() -> &'static str {
            "KeyDown"
        }
    }

    #[derive(Debug)]
    struct MouseMove;
    impl Input for MouseMove {
        fn type_name() -> &'static str {
            "MouseMove"
        }
    }

    #[test]
    fn test_input_type_id_shares_component_hash() {
        assert_eq!(
            InputTypeId::of::<KeyDown>().0,
            ComponentTypeId::from_name("KeyDown").0
        );
        assert_ne!(InputTypeId::of::<KeyDown>(), InputTypeId::of::<MouseMove>());
    }

    #[test]
    fn test_input_event_downcast() {
        let input = InputEvent::new(KeyDown('w'));
        assert_eq!(input.type_id(), InputTypeId::of::<KeyDown>());
        assert_eq!(input.type_name(), "KeyDown");
        assert!(input.is::<KeyDown>());
        assert_eq!(input.downcast_ref::<KeyDown>(), Some(&KeyDown('w')));
        assert!(input.downcast_ref::<MouseMove>().is_none());
    }

    #[test]
    fn test_input_type_set_membership() {
        let set = InputTypeSet::new().with::<KeyDown>();
        assert!(set.contains(InputTypeId::of::<KeyDown>()));
        assert!(!set.contains(InputTypeId::of::<MouseMove>()));
        assert_eq!(set.len(), 1);
    }
}
