//! # engine_event
//!
//! A deferred event bus. Producers submit typed events from any thread; the
//! entity manager drains and delivers them once per frame by calling
//! [`EventBus::dispatch`] on its own thread.
//!
//! This crate provides:
//!
//! - [`Event`]: the contract every event payload satisfies (a `reset` hook).
//! - [`EventBus`]: the owning side, the only place `dispatch` lives.
//! - [`EventDispatcher`]: a cloneable submit/subscribe view handed to systems.
//! - [`EventPool`]: a free list that reset events are returned to.
//! - [`EventError`]: reentrancy and handler failures.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! use engine_event::{Event, EventBus};
//!
//! struct Damage(u32);
//! impl Event for Damage {}
//!
//! let bus = EventBus::new();
//! let total = Arc::new(AtomicU32::new(0));
//!
//! let sink = Arc::clone(&total);
//! bus.on_event(move |d: &Damage| {
//!     sink.fetch_add(d.0, Ordering::Relaxed);
//! });
//!
//! let dispatcher = bus.dispatcher();
//! dispatcher.submit(Damage(3));
//! dispatcher.submit(Damage(4));
//!
//! bus.dispatch().unwrap();
//! assert_eq!(total.load(Ordering::Relaxed), 7);
//! ```

pub mod bus;
pub mod dispatcher;
pub mod error;
pub mod event;

pub use bus::{DispatchStats, EventBus};
pub use dispatcher::EventDispatcher;
pub use error::{EventError, HandlerError};
pub use event::{Event, EventPool};
