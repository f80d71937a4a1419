//! The registration record the entity manager keeps per system.

use engine_component::{ComponentSet, DataTypeSet};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::capability::{Capabilities, Capability};
use crate::input::{InputTypeId, InputTypeSet};
use crate::system::System;

/// What the entity manager learned about a system when it registered.
///
/// Built once by [`SystemRegistration::probe`]. The declared filter and
/// input sets are snapshots; the system is not asked again.
#[derive(Debug, Clone, Serialize)]
pub struct SystemRegistration {
    /// The system's name, from [`System::name`].
    pub name: String,
    /// Unique ID of this registration.
    pub instance_id: String,
    /// The capabilities the system exposes.
    pub capabilities: Capabilities,
    /// Required data types. Empty when no filter-bearing capability exists.
    pub required_data_types: DataTypeSet,
    /// Declared input types. Empty when no input-bearing capability exists.
    pub input_types: InputTypeSet,
}

impl SystemRegistration {
    /// Probe `system` for its capabilities and read its declarations.
    pub fn probe(system: &mut dyn System) -> Self {
        let capabilities = Capabilities::probe(system);
        let required_data_types = required_data_types(system).unwrap_or_default();
        let input_types = input_types(system).unwrap_or_default();

        let registration = Self {
            name: system.name().to_string(),
            instance_id: Uuid::new_v4().to_string(),
            capabilities,
            required_data_types,
            input_types,
        };
        debug!(
            system = registration.name,
            capabilities = %registration.capabilities,
            required = registration.required_data_types.len(),
            inputs = registration.input_types.len(),
            "probed system"
        );
        registration
    }

    #[must_use]
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    /// Whether the entity manager must track filter membership for this system.
    #[must_use]
    pub fn has_filter(&self) -> bool {
        self.capabilities.has_filter()
    }

    /// Whether an entity carrying `components` passes this system's filter.
    #[must_use]
    pub fn admits(&self, components: &ComponentSet) -> bool {
        self.required_data_types.matches(components)
    }

    /// Whether this system declared `input_type`.
    #[must_use]
    pub fn accepts_input(&self, input_type: InputTypeId) -> bool {
        self.input_types.contains(input_type)
    }
}

fn required_data_types(system: &mut dyn System) -> Option<DataTypeSet> {
    if let Some(cap) = system.as_added() {
        return Some(cap.required_data_types());
    }
    if let Some(cap) = system.as_removed() {
        return Some(cap.required_data_types());
    }
    if let Some(cap) = system.as_modified() {
        return Some(cap.required_data_types());
    }
    if let Some(cap) = system.as_update() {
        return Some(cap.required_data_types());
    }
    system.as_input().map(|cap| cap.required_data_types())
}

fn input_types(system: &mut dyn System) -> Option<InputTypeSet> {
    if let Some(cap) = system.as_input() {
        return Some(cap.input_types());
    }
    system.as_global_input().map(|cap| cap.input_types())
}
