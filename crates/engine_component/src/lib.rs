//! # engine_component
//!
//! The "E" and "C" in ECS: entity identity, component identity, and the
//! typed component storage attached to each entity.
//!
//! This crate provides:
//!
//! - [`Component`] trait: the contract all entity data must satisfy.
//! - [`Entity`]: lightweight `u64` entity identifiers.
//! - [`EntityAllocator`]: hands out IDs above the fixed invalid and global IDs.
//! - [`ComponentSet`]: the components carried by one entity.
//! - [`DataTypeSet`]: the data types a system requires an entity to carry.
//! - [`EntityRef`] / [`EntityMut`]: borrowed entity views for system callbacks.

pub mod access;
pub mod component;
pub mod entity;
pub mod filter;

pub use access::{EntityMut, EntityRef};
pub use component::{Component, ComponentSet, ComponentTypeId};
pub use entity::{Entity, EntityAllocator};
pub use filter::DataTypeSet;
