//! Crawl lifecycle controller (spec §4.1): the `Engine` owns the status
//! state machine and worker pool, and composes the scheduler, downloader,
//! parser and storage crates into the worker loop described in spec §4.1
//! step 1-10.

mod engine;
mod error;
mod memory_monitor;
mod status;
mod worker;

pub use engine::Engine;
pub use error::EngineError;
