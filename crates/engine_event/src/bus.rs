//! The [`EventBus`]: double-buffered queueing and synchronous delivery.
//!
//! Submitters append to the *pending* buffer under a short lock. A dispatch
//! cycle swaps the pending buffer with the bus's private *dispatch* buffer
//! under that same lock, then delivers the swapped-out batch with no lock
//! held. Events submitted while handlers run land in the fresh pending
//! buffer and wait for the next cycle.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::dispatcher::EventDispatcher;
use crate::error::{EventError, HandlerError};
use crate::event::{AnyEvent, Event, EventPool};

pub(crate) type ErasedHandler = dyn Fn(&dyn Any) -> Result<(), HandlerError> + Send + Sync;
type Recycler = dyn Fn(Box<dyn Any + Send>) + Send + Sync;

/// An event waiting in one of the two buffers.
pub(crate) struct Queued {
    type_id: TypeId,
    event: Box<dyn AnyEvent>,
}

/// Everything submitters and registrants touch. One lock guards it all and
/// is never held while handler code runs.
#[derive(Default)]
struct State {
    pending: Vec<Queued>,
    handlers: HashMap<TypeId, Arc<Vec<Arc<ErasedHandler>>>>,
    recyclers: HashMap<TypeId, Arc<Recycler>>,
}

/// State shared between the [`EventBus`] and every [`EventDispatcher`].
#[derive(Default)]
pub(crate) struct Shared {
    state: Mutex<State>,
}

impl Shared {
    pub(crate) fn submit<E: Event>(&self, event: E) {
        let queued = Queued {
            type_id: TypeId::of::<E>(),
            event: Box::new(event),
        };
        self.state.lock().pending.push(queued);
    }

    pub(crate) fn register<E: Event>(&self, handler: Arc<ErasedHandler>) {
        let mut state = self.state.lock();
        let list = state.handlers.entry(TypeId::of::<E>()).or_default();
        // Copy-on-write: a cycle holding the old list keeps its snapshot.
        Arc::make_mut(list).push(handler);
    }

    fn handler_count(&self, type_id: TypeId) -> usize {
        self.state
            .lock()
            .handlers
            .get(&type_id)
            .map_or(0, |list| list.len())
    }

    fn swap_pending(&self, batch: &mut Vec<Queued>) {
        std::mem::swap(&mut self.state.lock().pending, batch);
    }

    fn lookup(&self, type_id: TypeId) -> (Option<Arc<Vec<Arc<ErasedHandler>>>>, Option<Arc<Recycler>>) {
        let state = self.state.lock();
        (
            state.handlers.get(&type_id).cloned(),
            state.recyclers.get(&type_id).cloned(),
        )
    }
}

/// Counters for one completed dispatch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events taken from the pending buffer and delivered.
    pub events: usize,
    /// Total handler calls across all events.
    pub invocations: usize,
}

/// The process-side owner of an event queue.
///
/// One bus belongs to one entity manager and lives as long as it does.
/// Systems never see the bus itself, only [`EventDispatcher`] views of it,
/// so [`EventBus::dispatch`] stays with whoever drives the frame loop.
///
/// Dropping the bus clears all handlers, which breaks any reference cycle
/// formed by handlers that captured a dispatcher.
pub struct EventBus {
    shared: Arc<Shared>,
    /// The read-side buffer, empty between cycles. Kept to reuse its capacity.
    dispatch_buffer: Mutex<Vec<Queued>>,
    dispatching: AtomicBool,
    cycles: AtomicU64,
}

impl EventBus {
    /// Create a bus with no handlers and nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            dispatch_buffer: Mutex::new(Vec::new()),
            dispatching: AtomicBool::new(false),
            cycles: AtomicU64::new(0),
        }
    }

    /// A submit/subscribe handle for systems. It cannot dispatch.
    #[must_use]
    pub fn dispatcher(&self) -> EventDispatcher {
        EventDispatcher::new(Arc::clone(&self.shared))
    }

    /// Queue `event` for the next dispatch cycle. See [`EventDispatcher::submit`].
    pub fn submit<E: Event>(&self, event: E) {
        self.shared.submit(event);
    }

    /// Register an infallible handler. See [`EventDispatcher::on_event`].
    pub fn on_event<E, F>(&self, handler: F)
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.dispatcher().on_event(handler);
    }

    /// Register a fallible handler. See [`EventDispatcher::try_on_event`].
    pub fn try_on_event<E, F>(&self, handler: F)
    where
        E: Event,
        F: Fn(&E) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.dispatcher().try_on_event(handler);
    }

    /// Send every delivered, reset `E` back to `pool` instead of dropping it.
    ///
    /// Registering a second pool for the same type replaces the first.
    pub fn recycle_into<E: Event + Default>(&self, pool: EventPool<E>) {
        let recycler: Arc<Recycler> = Arc::new(move |event: Box<dyn Any + Send>| {
            if let Ok(event) = event.downcast::<E>() {
                pool.put_back(*event);
            }
        });
        self.shared
            .state
            .lock()
            .recyclers
            .insert(TypeId::of::<E>(), recycler);
    }

    /// Number of handlers registered for `E`.
    #[must_use]
    pub fn handler_count<E: Event>(&self) -> usize {
        self.shared.handler_count(TypeId::of::<E>())
    }

    /// Number of events waiting for the next cycle.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    /// Number of dispatch cycles that have completed successfully.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Drain the pending buffer and deliver every event in it.
    ///
    /// Events are delivered in buffer order. For each event, the handlers
    /// registered for its exact type run in registration order, then the
    /// event is reset and either recycled or dropped. Events submitted from
    /// inside a handler are held for the next cycle.
    ///
    /// Call this from one place only, typically once per frame.
    ///
    /// # Errors
    ///
    /// - [`EventError::Reentrancy`] if another `dispatch` on this bus has not
    ///   returned yet. Nothing is drained in that case.
    /// - [`EventError::Handler`] if a handler fails. The failing event is
    ///   dropped without reset and the rest of the batch is discarded.
    pub fn dispatch(&self) -> Result<DispatchStats, EventError> {
        let _guard = DispatchGuard::acquire(&self.dispatching).ok_or(EventError::Reentrancy)?;

        let mut batch = std::mem::take(&mut *self.dispatch_buffer.lock());
        self.shared.swap_pending(&mut batch);

        let result = self.deliver(&mut batch);

        batch.clear();
        *self.dispatch_buffer.lock() = batch;

        if let Ok(stats) = &result {
            let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
            if stats.events > 0 {
                debug!(
                    cycle,
                    events = stats.events,
                    invocations = stats.invocations,
                    "dispatched events"
                );
            }
        }
        result
    }

    fn deliver(&self, batch: &mut Vec<Queued>) -> Result<DispatchStats, EventError> {
        let total = batch.len();
        let mut stats = DispatchStats::default();

        for (index, mut queued) in batch.drain(..).enumerate() {
            let (handlers, recycler) = self.shared.lookup(queued.type_id);
            let event_type = queued.event.type_name();

            if let Some(handlers) = handlers {
                trace!(event_type, handlers = handlers.len(), "delivering event");
                for handler in handlers.iter() {
                    handler(queued.event.as_any()).map_err(|source| EventError::Handler {
                        event_type,
                        undispatched: total - index - 1,
                        source,
                    })?;
                    stats.invocations += 1;
                }
            }

            queued.event.reset();
            if let Some(recycler) = recycler {
                recycler(queued.event.into_any());
            }
            stats.events += 1;
        }

        Ok(stats)
    }

    /// Drop every handler, recycler and pending event.
    ///
    /// Runs automatically when the bus is dropped. Dispatchers that outlive
    /// the bus can still submit, but nothing will ever deliver.
    pub fn shutdown(&self) {
        let mut state = self.shared.state.lock();
        state.handlers.clear();
        state.recyclers.clear();
        state.pending.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("EventBus")
            .field("pending", &state.pending.len())
            .field("event_types", &state.handlers.len())
            .field("dispatching", &self.dispatching.load(Ordering::Relaxed))
            .field("cycles", &self.cycles.load(Ordering::Relaxed))
            .finish()
    }
}

/// Holds the reentrancy flag for the duration of one cycle, releasing it on
/// return, on error and on unwind.
struct DispatchGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> DispatchGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Barrier, Weak};

    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct A(u32);
    impl Event for A {}

    #[derive(Debug, Default, Clone, PartialEq)]
    struct B(u32);
    impl Event for B {}

    /// An event whose reset hook writes into a shared log.
    struct Sentinel {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Event for Sentinel {
        fn reset(&mut self) {
            self.log.lock().push("reset");
        }
    }

    fn recorder<E: Clone + Send + 'static>() -> (Arc<Mutex<Vec<E>>>, impl Fn(&E) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |e: &E| sink.lock().push(e.clone()))
    }

    #[test]
    fn test_no_handlers_drains_queue() {
        let bus = EventBus::new();
        bus.submit(A(1));
        bus.submit(B(1));
        bus.submit(A(2));
        assert_eq!(bus.pending_len(), 3);

        let stats = bus.dispatch().unwrap();
        assert_eq!(stats, DispatchStats { events: 3, invocations: 0 });
        assert_eq!(bus.pending_len(), 0);
    }

    #[test]
    fn test_single_handler_invoked_once() {
        let bus = EventBus::new();
        let (seen, handler) = recorder::<A>();
        bus.on_event::<A, _>(handler);

        bus.submit(A(1));
        bus.dispatch().unwrap();
        assert_eq!(*seen.lock(), vec![A(1)]);

        let stats = bus.dispatch().unwrap();
        assert_eq!(stats.invocations, 0);
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_exact_type_routing_preserves_order() {
        let bus = EventBus::new();
        let (seen_a, handler_a) = recorder::<A>();
        let (seen_b, handler_b) = recorder::<B>();
        bus.on_event::<A, _>(handler_a);
        bus.on_event::<B, _>(handler_b);

        bus.submit(A(1));
        bus.submit(B(1));
        bus.submit(A(2));
        let stats = bus.dispatch().unwrap();

        assert_eq!(*seen_a.lock(), vec![A(1), A(2)]);
        assert_eq!(*seen_b.lock(), vec![B(1)]);
        assert_eq!(stats, DispatchStats { events: 3, invocations: 3 });
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let l1 = Arc::clone(&log);
        bus.on_event(move |_: &A| {
            l1.lock().push("h1 start");
            l1.lock().push("h1 end");
        });
        let l2 = Arc::clone(&log);
        bus.on_event(move |_: &A| {
            l2.lock().push("h2 start");
            l2.lock().push("h2 end");
        });

        bus.submit(A(0));
        bus.dispatch().unwrap();
        assert_eq!(*log.lock(), vec!["h1 start", "h1 end", "h2 start", "h2 end"]);
        assert_eq!(bus.handler_count::<A>(), 2);
    }

    #[test]
    fn test_events_submitted_during_dispatch_wait_for_next_cycle() {
        let bus = EventBus::new();
        let dispatcher = bus.dispatcher();
        let (seen_b, handler_b) = recorder::<B>();

        bus.on_event(move |a: &A| dispatcher.submit(B(a.0 * 10)));
        bus.on_event::<B, _>(handler_b);

        bus.submit(A(1));
        bus.dispatch().unwrap();
        assert!(seen_b.lock().is_empty());
        assert_eq!(bus.pending_len(), 1);

        bus.dispatch().unwrap();
        assert_eq!(*seen_b.lock(), vec![B(10)]);
    }

    #[test]
    fn test_reset_runs_after_handlers_before_return() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.on_event(|s: &Sentinel| s.log.lock().push("h1"));
        bus.on_event(|s: &Sentinel| s.log.lock().push("h2"));

        bus.submit(Sentinel {
            log: Arc::clone(&log),
        });
        bus.submit(Sentinel {
            log: Arc::clone(&log),
        });
        bus.dispatch().unwrap();

        assert_eq!(
            *log.lock(),
            vec!["h1", "h2", "reset", "h1", "h2", "reset"]
        );
    }

    #[test]
    fn test_reentrant_dispatch_is_rejected() {
        let bus = Arc::new(EventBus::new());
        let weak: Weak<EventBus> = Arc::downgrade(&bus);
        let outcome = Arc::new(Mutex::new(None));
        let (seen_b, handler_b) = recorder::<B>();

        let slot = Arc::clone(&outcome);
        bus.on_event(move |_: &A| {
            if let Some(bus) = weak.upgrade() {
                *slot.lock() = Some(bus.dispatch().map(|_| ()));
            }
        });
        bus.on_event::<B, _>(handler_b);

        bus.submit(A(1));
        bus.submit(B(1));
        bus.dispatch().unwrap();

        let inner = outcome.lock().take().unwrap();
        assert!(matches!(inner, Err(EventError::Reentrancy)));
        // The outer cycle still delivered B exactly once.
        assert_eq!(*seen_b.lock(), vec![B(1)]);
        // The flag is released once the outer call returns.
        assert!(bus.dispatch().is_ok());
    }

    #[test]
    fn test_reentrant_dispatch_leaves_new_submissions_queued() {
        let bus = Arc::new(EventBus::new());
        let weak = Arc::downgrade(&bus);
        let dispatcher = bus.dispatcher();

        bus.on_event(move |_: &A| {
            dispatcher.submit(B(7));
            if let Some(bus) = weak.upgrade() {
                let _ = bus.dispatch();
            }
        });

        bus.submit(A(1));
        bus.dispatch().unwrap();
        assert_eq!(bus.pending_len(), 1);
    }

    #[test]
    fn test_overlapping_dispatch_from_another_thread_is_rejected() {
        let bus = EventBus::new();
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));

        let (e, r) = (Arc::clone(&entered), Arc::clone(&release));
        bus.on_event(move |_: &A| {
            e.wait();
            r.wait();
        });
        bus.submit(A(1));

        std::thread::scope(|scope| {
            let outer = scope.spawn(|| bus.dispatch());

            entered.wait();
            bus.submit(B(1));
            assert_eq!(bus.pending_len(), 1);
            assert!(matches!(bus.dispatch(), Err(EventError::Reentrancy)));
            assert_eq!(bus.pending_len(), 1);
            release.wait();

            let stats = outer.join().unwrap().unwrap();
            assert_eq!(stats.events, 1);
        });

        assert_eq!(bus.dispatch().unwrap().events, 1);
    }

    /// Fails in its handler when `fail` is set; logs its `id` on reset.
    struct Fragile {
        id: u32,
        fail: bool,
        resets: Arc<Mutex<Vec<u32>>>,
    }

    impl Event for Fragile {
        fn reset(&mut self) {
            self.resets.lock().push(self.id);
        }
    }

    #[test]
    fn test_handler_failure_aborts_cycle() {
        let bus = EventBus::new();
        let (seen_b, handler_b) = recorder::<B>();
        let resets = Arc::new(Mutex::new(Vec::new()));

        bus.try_on_event(|f: &Fragile| {
            if f.fail {
                Err("fragile broke".into())
            } else {
                Ok(())
            }
        });
        bus.on_event::<B, _>(handler_b);

        let fragile = |id, fail| Fragile {
            id,
            fail,
            resets: Arc::clone(&resets),
        };
        bus.submit(fragile(1, false));
        bus.submit(fragile(2, true));
        bus.submit(B(1));
        bus.submit(fragile(3, false));

        let err = bus.dispatch().unwrap_err();
        match err {
            EventError::Handler {
                event_type,
                undispatched,
                ..
            } => {
                assert!(event_type.ends_with("Fragile"));
                assert_eq!(undispatched, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        // Only the event delivered before the failure was reset.
        assert_eq!(*resets.lock(), vec![1]);
        assert!(seen_b.lock().is_empty());

        // The discarded tail is not retried.
        bus.dispatch().unwrap();
        assert!(seen_b.lock().is_empty());
        assert_eq!(*resets.lock(), vec![1]);
    }

    #[test]
    fn test_handler_registered_mid_cycle_sees_future_events() {
        let bus = EventBus::new();
        let dispatcher = bus.dispatcher();
        let late_calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&late_calls);
        let registered = AtomicBool::new(false);
        bus.on_event(move |_: &A| {
            if !registered.swap(true, Ordering::Relaxed) {
                let counter = Arc::clone(&counter);
                dispatcher.on_event(move |_: &A| {
                    counter.fetch_add(1, Ordering::Relaxed);
                });
            }
        });

        bus.submit(A(1));
        bus.dispatch().unwrap();
        assert_eq!(late_calls.load(Ordering::Relaxed), 0);

        bus.submit(A(2));
        bus.dispatch().unwrap();
        assert_eq!(late_calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_recycled_events_return_to_pool() {
        #[derive(Debug, Default)]
        struct Pooled {
            payload: Vec<u8>,
        }
        impl Event for Pooled {
            fn reset(&mut self) {
                self.payload.clear();
            }
        }

        let bus = EventBus::new();
        let pool = EventPool::<Pooled>::new();
        bus.recycle_into(pool.clone());

        let lengths = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lengths);
        bus.on_event(move |p: &Pooled| sink.lock().push(p.payload.len()));

        let mut event = pool.acquire();
        event.payload.extend_from_slice(&[1, 2, 3]);
        bus.submit(event);
        bus.dispatch().unwrap();

        assert_eq!(*lengths.lock(), vec![3]);
        assert_eq!(pool.len(), 1);
        let reused = pool.acquire();
        assert!(reused.payload.is_empty());
        assert!(reused.payload.capacity() >= 3);
    }

    #[test]
    fn test_concurrent_submitters_lose_nothing() {
        let bus = EventBus::new();
        let (seen, handler) = recorder::<A>();
        bus.on_event::<A, _>(handler);

        std::thread::scope(|scope| {
            for t in 0..4u32 {
                let dispatcher = bus.dispatcher();
                scope.spawn(move || {
                    for i in 0..250u32 {
                        dispatcher.submit(A(t * 1000 + i));
                    }
                });
            }
        });

        let stats = bus.dispatch().unwrap();
        assert_eq!(stats.events, 1000);

        let seen = seen.lock();
        // Per-thread submission order survives.
        for t in 0..4u32 {
            let from_thread: Vec<u32> = seen
                .iter()
                .map(|a| a.0)
                .filter(|v| v / 1000 == t)
                .collect();
            let expected: Vec<u32> = (0..250).map(|i| t * 1000 + i).collect();
            assert_eq!(from_thread, expected);
        }
    }

    #[test]
    fn test_submit_while_dispatching_on_other_thread() {
        let bus = EventBus::new();
        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&delivered);
        bus.on_event(move |_: &A| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        std::thread::scope(|scope| {
            let dispatcher = bus.dispatcher();
            let producer = scope.spawn(move || {
                for i in 0..500 {
                    dispatcher.submit(A(i));
                }
            });
            while !producer.is_finished() {
                bus.dispatch().unwrap();
            }
        });
        bus.dispatch().unwrap();

        assert_eq!(delivered.load(Ordering::Relaxed), 500);
    }

    #[test]
    fn test_shutdown_clears_everything() {
        let bus = EventBus::new();
        let (seen, handler) = recorder::<A>();
        bus.on_event::<A, _>(handler);
        bus.submit(A(1));

        bus.shutdown();
        assert_eq!(bus.pending_len(), 0);
        assert_eq!(bus.handler_count::<A>(), 0);

        bus.submit(A(2));
        bus.dispatch().unwrap();
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_drop_breaks_dispatcher_cycle() {
        let bus = EventBus::new();
        let dispatcher = bus.dispatcher();
        let captured = dispatcher.clone();
        bus.on_event(move |a: &A| captured.submit(B(a.0)));

        assert_eq!(dispatcher.strong_count(), 3);
        drop(bus);
        assert_eq!(dispatcher.strong_count(), 1);
    }

    #[test]
    fn test_cycle_counter() {
        let bus = EventBus::new();
        assert_eq!(bus.cycles(), 0);
        bus.dispatch().unwrap();
        bus.dispatch().unwrap();
        assert_eq!(bus.cycles(), 2);
    }
}
