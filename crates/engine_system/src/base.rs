//! Write-once storage for the handles injected into every system.

use engine_event::EventDispatcher;
use tracing::warn;

use crate::global::GlobalEntity;

/// Holds the [`EventDispatcher`] and [`GlobalEntity`] a system is given at
/// registration. Embed it in a system and forward the two
/// [`System`](crate::System) setters to it.
///
/// The first injection of each handle wins. Later ones are ignored and
/// logged.
#[derive(Debug, Default)]
pub struct SystemBase {
    dispatcher: Option<EventDispatcher>,
    global: Option<GlobalEntity>,
}

impl SystemBase {
    /// Create an empty base with neither handle injected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the dispatcher unless one was already injected.
    pub fn set_event_dispatcher(&mut self, dispatcher: EventDispatcher) {
        if self.dispatcher.is_some() {
            warn!("event dispatcher injected twice; keeping the first");
            return;
        }
        self.dispatcher = Some(dispatcher);
    }

    /// Store the global entity unless one was already injected.
    pub fn set_global_entity(&mut self, global: GlobalEntity) {
        if self.global.is_some() {
            warn!("global entity injected twice; keeping the first");
            return;
        }
        self.global = Some(global);
    }

    /// The injected dispatcher, or `None` before registration.
    #[must_use]
    pub fn events(&self) -> Option<&EventDispatcher> {
        self.dispatcher.as_ref()
    }

    /// The injected global entity, or `None` before registration.
    #[must_use]
    pub fn global(&self) -> Option<&GlobalEntity> {
        self.global.as_ref()
    }
}
