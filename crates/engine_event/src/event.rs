//! The [`Event`] contract and pooled event recycling.

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

/// A payload that can travel through the [`EventBus`](crate::EventBus).
///
/// The bus calls [`Event::reset`] exactly once per delivered instance, right
/// after the last handler for that instance returns. Types recycled through an
/// [`EventPool`] should restore their default state there; the default
/// implementation does nothing.
pub trait Event: Any + Send + 'static {
    /// Return the instance to a reusable state.
    fn reset(&mut self) {}
}

/// Object-safe view of a queued event.
pub(crate) trait AnyEvent: Send {
    fn as_any(&self) -> &dyn Any;
    fn reset(&mut self);
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
    fn type_name(&self) -> &'static str;
}

impl<T: Event> AnyEvent for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn reset(&mut self) {
        Event::reset(self);
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A thread-safe free list of reusable events.
///
/// Clones share the same list. Register a pool with
/// [`EventBus::recycle_into`](crate::EventBus::recycle_into) and the bus
/// returns every delivered, reset `T` here.
pub struct EventPool<T> {
    free: Arc<Mutex<Vec<T>>>,
    limit: usize,
}

impl<T: Event + Default> EventPool<T> {
    /// Create an unbounded pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(usize::MAX)
    }

    /// Create a pool that keeps at most `limit` idle instances. Anything
    /// returned past the limit is dropped.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            free: Arc::new(Mutex::new(Vec::new())),
            limit,
        }
    }

    /// Take an idle instance, or build a default one if the pool is empty.
    #[must_use]
    pub fn acquire(&self) -> T {
        self.free.lock().pop().unwrap_or_default()
    }

    /// Reset `event` and return it to the pool. For instances that were never
    /// submitted; delivered events come back through the bus.
    pub fn release(&self, mut event: T) {
        Event::reset(&mut event);
        self.put_back(event);
    }

    /// Number of idle instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.free.lock().len()
    }

    /// Returns `true` if no idle instances are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store an already-reset instance.
    pub(crate) fn put_back(&self, event: T) {
        let mut free = self.free.lock();
        if free.len() < self.limit {
            free.push(event);
        }
    }
}

impl<T: Event + Default> Default for EventPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EventPool<T> {
    fn clone(&self) -> Self {
        Self {
            free: Arc::clone(&self.free),
            limit: self.limit,
        }
    }
}

impl<T> std::fmt::Debug for EventPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPool")
            .field("event_type", &std::any::type_name::<T>())
            .field("idle", &self.free.lock().len())
            .field("limit", &self.limit)
            .finish()
    }
}
