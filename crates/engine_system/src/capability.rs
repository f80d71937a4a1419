//! Capability tags and the flag set built by probing a [`System`].

use serde::{Deserialize, Serialize};

use crate::system::System;

/// One of the eight optional callback contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    Added,
    Removed,
    Modified,
    Update,
    GlobalPreUpdate,
    GlobalPostUpdate,
    Input,
    GlobalInput,
}

impl Capability {
    /// All capabilities, in declaration order.
    pub const ALL: [Capability; 8] = [
        Capability::Added,
        Capability::Removed,
        Capability::Modified,
        Capability::Update,
        Capability::GlobalPreUpdate,
        Capability::GlobalPostUpdate,
        Capability::Input,
        Capability::GlobalInput,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Whether this capability only sees entities passing the system's filter.
    #[must_use]
    pub const fn is_filter_bearing(self) -> bool {
        matches!(
            self,
            Capability::Added
                | Capability::Removed
                | Capability::Modified
                | Capability::Update
                | Capability::Input
        )
    }

    /// Whether this capability receives input events.
    #[must_use]
    pub const fn is_input_bearing(self) -> bool {
        matches!(self, Capability::Input | Capability::GlobalInput)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// A set of [`Capability`] tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Capability>", into = "Vec<Capability>")]
pub struct Capabilities(u8);

impl Capabilities {
    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Add a capability.
    #[must_use]
    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    #[must_use]
    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate over the contained capabilities in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |cap| self.contains(*cap))
    }

    /// `true` if any contained capability is filter-bearing.
    #[must_use]
    pub fn has_filter(self) -> bool {
        self.iter().any(Capability::is_filter_bearing)
    }

    /// `true` if any contained capability is input-bearing.
    #[must_use]
    pub fn has_inputs(self) -> bool {
        self.iter().any(Capability::is_input_bearing)
    }

    /// Build the set by asking each of `system`'s `as_*` accessors.
    pub fn probe(system: &mut dyn System) -> Self {
        let mut caps = Self::empty();
        if system.as_added().is_some() {
            caps = caps.with(Capability::Added);
        }
        if system.as_removed().is_some() {
            caps = caps.with(Capability::Removed);
        }
        if system.as_modified().is_some() {
            caps = caps.with(Capability::Modified);
        }
        if system.as_update().is_some() {
            caps = caps.with(Capability::Update);
        }
        if system.as_global_pre_update().is_some() {
            caps = caps.with(Capability::GlobalPreUpdate);
        }
        if system.as_global_post_update().is_some() {
            caps = caps.with(Capability::GlobalPostUpdate);
        }
        if system.as_input().is_some() {
            caps = caps.with(Capability::Input);
        }
        if system.as_global_input().is_some() {
            caps = caps.with(Capability::GlobalInput);
        }
        caps
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl From<Vec<Capability>> for Capabilities {
    fn from(caps: Vec<Capability>) -> Self {
        caps.into_iter().collect()
    }
}

impl From<Capabilities> for Vec<Capability> {
    fn from(caps: Capabilities) -> Self {
        caps.iter().collect()
    }
}

impl std::fmt::Display for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for cap in self.iter() {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "{cap}")?;
            first = false;
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use engine_component::{DataTypeSet, EntityMut};
    use engine_event::EventDispatcher;

    use super::*;
    use crate::global::GlobalEntity;
    use crate::system::{FilterProvider, OnGlobalPreUpdate, OnUpdate};

    struct Bare;

    impl System for Bare {
        fn set_event_dispatcher(&mut self, _: EventDispatcher) {}
        fn set_global_entity(&mut self, _: GlobalEntity) {}
    }

    struct Mover;

    impl System for Mover {
        fn set_event_dispatcher(&mut self, _: EventDispatcher) {}
        fn set_global_entity(&mut self, _: GlobalEntity) {}
        fn as_update(&mut self) -> Option<&mut dyn OnUpdate> {
            Some(self)
        }
        fn as_global_pre_update(&mut self) -> Option<&mut dyn OnGlobalPreUpdate> {
            Some(self)
        }
    }

    impl FilterProvider for Mover {
        fn required_data_types(&self) -> DataTypeSet {
            DataTypeSet::new()
        }
    }

    impl OnUpdate for Mover {
        fn on_update(&mut self, _: &mut EntityMut<'_>) {}
    }

    impl OnGlobalPreUpdate for Mover {
        fn on_global_pre_update(&mut self) {}
    }

    #[test]
    fn test_probe_bare_system_is_empty() {
        let caps = Capabilities::probe(&mut Bare);
        assert!(caps.is_empty());
        assert!(!caps.has_filter());
        assert_eq!(caps.to_string(), "none");
    }

    #[test]
    fn test_probe_reports_implemented_capabilities() {
        let caps = Capabilities::probe(&mut Mover);
        assert_eq!(caps.len(), 2);
        assert!(caps.contains(Capability::Update));
        assert!(caps.contains(Capability::GlobalPreUpdate));
        assert!(!caps.contains(Capability::Added));
        assert!(caps.has_filter());
        assert!(!caps.has_inputs());
        assert_eq!(caps.to_string(), "Update|GlobalPreUpdate");
    }

    #[test]
    fn test_filter_and_input_classification() {
        let filtered: Vec<_> = Capability::ALL
            .into_iter()
            .filter(|c| c.is_filter_bearing())
            .collect();
        assert_eq!(
            filtered,
            vec![
                Capability::Added,
                Capability::Removed,
                Capability::Modified,
                Capability::Update,
                Capability::Input
            ]
        );
        assert!(Capability::GlobalInput.is_input_bearing());
        assert!(!Capability::GlobalInput.is_filter_bearing());
    }

    #[test]
    fn test_serializes_as_list() {
        let caps: Capabilities = [Capability::Removed, Capability::GlobalInput]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&caps).unwrap();
        assert_eq!(json, r#"["Removed","GlobalInput"]"#);
        let back: Capabilities = serde_json::from_str(&json).unwrap();
        assert_eq!(back, caps);
    }
}
