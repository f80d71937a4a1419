//! # engine_system
//!
//! The contract surface between the entity manager and the systems it drives.
//!
//! A system implements the base [`System`] trait and any subset of eight
//! capability traits. The entity manager probes those capabilities once at
//! registration and then only invokes what was declared:
//!
//! | Capability | Filter | Callback |
//! |---|---|---|
//! | [`OnAdded`] | yes | entity starts passing the filter |
//! | [`OnRemoved`] | yes | entity stops passing the filter |
//! | [`OnModified`] | yes | a passing entity's data changed |
//! | [`OnUpdate`] | yes | every passing entity, once per frame |
//! | [`OnGlobalPreUpdate`] | no | once per frame, before updates |
//! | [`OnGlobalPostUpdate`] | no | once per frame, after updates |
//! | [`OnInput`] | yes | declared input, per passing entity |
//! | [`OnGlobalInput`] | no | declared input, once |
//!
//! ## Usage
//!
//! ```rust
//! use engine_component::{Component, DataTypeSet, EntityMut};
//! use engine_event::EventDispatcher;
//! use engine_system::{
//!     Capability, FilterProvider, GlobalEntity, OnUpdate, System, SystemBase, SystemRegistration,
//! };
//!
//! struct Position(f32);
//! impl Component for Position {
//!     fn type_name() -> &'static str { "Position" }
//! }
//!
//! #[derive(Default)]
//! struct Drift {
//!     base: SystemBase,
//! }
//!
//! impl System for Drift {
//!     fn set_event_dispatcher(&mut self, dispatcher: EventDispatcher) {
//!         self.base.set_event_dispatcher(dispatcher);
//!     }
//!     fn set_global_entity(&mut self, global: GlobalEntity) {
//!         self.base.set_global_entity(global);
//!     }
//!     fn as_update(&mut self) -> Option<&mut dyn OnUpdate> {
//!         Some(self)
//!     }
//! }
//!
//! impl FilterProvider for Drift {
//!     fn required_data_types(&self) -> DataTypeSet {
//!         DataTypeSet::new().with::<Position>()
//!     }
//! }
//!
//! impl OnUpdate for Drift {
//!     fn on_update(&mut self, entity: &mut EntityMut<'_>) {
//!         if let Some(p) = entity.get_mut::<Position>() {
//!             p.0 += 1.0;
//!         }
//!     }
//! }
//!
//! let registration = SystemRegistration::probe(&mut Drift::default());
//! assert!(registration.capabilities.contains(Capability::Update));
//! assert_eq!(registration.required_data_types.len(), 1);
//! ```

pub mod base;
pub mod capability;
pub mod global;
pub mod input;
pub mod registration;
pub mod system;

pub use base::SystemBase;
pub use capability::{Capabilities, Capability};
pub use global::GlobalEntity;
pub use input::{Input, InputEvent, InputTypeId, InputTypeSet};
pub use registration::SystemRegistration;
pub use system::{
    FilterProvider, InputProvider, OnAdded, OnGlobalInput, OnGlobalPostUpdate, OnGlobalPreUpdate,
    OnInput, OnModified, OnRemoved, OnUpdate, System,
};
