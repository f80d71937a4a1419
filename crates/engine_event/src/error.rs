//! Event bus error types.

/// The error type a fallible handler returns.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by [`EventBus::dispatch`](crate::EventBus::dispatch).
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// `dispatch` was called while another `dispatch` on the same bus was
    /// still delivering events. This is a programming error in the caller,
    /// typically a handler that tries to drive the bus itself.
    #[error("event dispatch re-entered while a previous cycle is still running")]
    Reentrancy,

    /// A handler failed. Delivery stopped at the failing event and the rest
    /// of the cycle's batch was discarded.
    #[error("handler for `{event_type}` failed ({undispatched} events left undispatched): {source}")]
    Handler {
        /// Rust type name of the event being delivered.
        event_type: &'static str,
        /// Number of events in the batch after the failing one.
        undispatched: usize,
        /// The handler's error.
        #[source]
        source: HandlerError,
    },
}

impl EventError {
    /// Returns `true` for [`EventError::Reentrancy`].
    #[must_use]
    pub fn is_reentrancy(&self) -> bool {
        matches!(self, Self::Reentrancy)
    }
}
