use crate::event::{CrawlEvent, EventHandler};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tracing::{debug, error, warn};

/// Central event bus. Handlers are stored name-keyed so a handler can be
/// unregistered by name after `Engine::stop`; `publish` dispatches to every
/// registered handler synchronously, catching panics so one faulty handler
/// cannot take down the publishing worker.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<Vec<(String, Arc<dyn EventHandler>)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handler: Arc<dyn EventHandler>) {
        let name = handler.name().to_string();
        let mut handlers = self.handlers.write().expect("event bus lock poisoned");
        handlers.retain(|(existing, _)| existing != &name);
        handlers.push((name.clone(), handler));
        debug!(handler = %name, "registered event handler");
    }

    pub fn unregister(&self, name: &str) {
        let mut handlers = self.handlers.write().expect("event bus lock poisoned");
        handlers.retain(|(existing, _)| existing != name);
        debug!(handler = %name, "unregistered event handler");
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().expect("event bus lock poisoned").len()
    }

    /// Publish an event to every registered handler on the calling thread.
    /// A handler that panics is caught and logged; it never propagates.
    pub fn publish(&self, event: CrawlEvent) {
        let handlers = self.handlers.read().expect("event bus lock poisoned").clone();
        for (name, handler) in &handlers {
            let result = catch_unwind(AssertUnwindSafe(|| handler.handle(&event)));
            if let Err(panic) = result {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(handler = %name, event = event.kind(), %message, "event handler panicked");
            }
        }
        if handlers.is_empty() {
            warn!(event = event.kind(), "published event with no registered handlers");
        }
    }
}
