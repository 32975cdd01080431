//! Frontier management: priority queue, de-duplication, per-domain rate
//! limiting and adaptive priority from observed domain performance.

mod domain;
mod filter;
mod scheduler;

pub use domain::DomainRecord;
pub use filter::UrlFilter;
pub use scheduler::{Scheduler, SchedulerConfig};
