//! In-process publish/subscribe event bus.
//!
//! Re-architected from the source's framework observer pattern (spec §9):
//! a list of registered handler callbacks invoked synchronously on the
//! publishing worker's thread, no reflection. Handlers are registered
//! before `Engine::start` and unregistered after `Engine::stop`.

mod bus;
mod event;

pub use bus::EventBus;
pub use event::{CrawlEvent, EventHandler};
