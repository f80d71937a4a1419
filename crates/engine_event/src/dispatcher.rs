//! [`EventDispatcher`]: the view of an [`EventBus`](crate::EventBus) that
//! systems receive.

use std::any::Any;
use std::sync::Arc;

use crate::bus::{ErasedHandler, Shared};
use crate::error::HandlerError;
use crate::event::Event;

/// A cloneable handle for submitting events and registering handlers.
///
/// Dispatchers cannot drain the queue. Only the owning
/// [`EventBus`](crate::EventBus) can, which keeps delivery under the control
/// of the frame loop.
#[derive(Clone)]
pub struct EventDispatcher {
    shared: Arc<Shared>,
}

impl EventDispatcher {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Queue `event` for the next dispatch cycle.
    ///
    /// Safe to call from any thread, including while the bus is dispatching
    /// and from inside a handler. Events submitted in sequence from one
    /// thread are delivered in that sequence.
    pub fn submit<E: Event>(&self, event: E) {
        self.shared.submit(event);
    }

    /// Register `handler` for events of exact type `E`.
    ///
    /// Handlers run in registration order and live until the bus shuts
    /// down. A handler registered during a dispatch cycle does not see the
    /// event currently being delivered, but sees every later one.
    pub fn on_event<E, F>(&self, handler: F)
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.try_on_event(move |event: &E| {
            handler(event);
            Ok(())
        });
    }

    /// Register a fallible handler for events of exact type `E`.
    ///
    /// An `Err` stops the current dispatch cycle and is returned from
    /// [`EventBus::dispatch`](crate::EventBus::dispatch).
    pub fn try_on_event<E, F>(&self, handler: F)
    where
        E: Event,
        F: Fn(&E) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let erased: Arc<ErasedHandler> = Arc::new(move |event: &dyn Any| {
            match event.downcast_ref::<E>() {
                Some(event) => handler(event),
                // Registry entries are keyed by `TypeId::of::<E>()`.
                None => Ok(()),
            }
        });
        self.shared.register::<E>(erased);
    }

    #[cfg(test)]
    pub(crate) fn strong_count(&self) -> usize {
        Arc::strong_count(&self.shared)
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::EventBus;

    use super::*;

    struct Ping(u32);
    impl Event for Ping {}

    #[test]
    fn test_dispatcher_submissions_reach_bus() {
        let bus = EventBus::new();
        let sum = Arc::new(AtomicU32::new(0));
        let sink = Arc::clone(&sum);
        bus.on_event(move |p: &Ping| {
            sink.fetch_add(p.0, Ordering::Relaxed);
        });

        let dispatcher = bus.dispatcher();
        let clone = dispatcher.clone();
        dispatcher.submit(Ping(2));
        clone.submit(Ping(5));

        assert_eq!(bus.pending_len(), 2);
        bus.dispatch().unwrap();
        assert_eq!(sum.load(Ordering::Relaxed), 7);
    }

    #[test]
    fn test_dispatcher_registered_handlers_are_shared() {
        let bus = EventBus::new();
        let dispatcher = bus.dispatcher();
        dispatcher.on_event(|_: &Ping| {});
        dispatcher.try_on_event(|_: &Ping| Ok(()));
        assert_eq!(bus.handler_count::<Ping>(), 2);
    }
}
