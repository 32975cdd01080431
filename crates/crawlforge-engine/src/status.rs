use crawlforge_events::{CrawlEvent, EventBus};
use crawlforge_types::CrawlerStatus;
use std::sync::RwLock;
use tracing::warn;

/// Apply a status transition if legal, publishing `StatusChanged` before
/// returning `true`. Illegal transitions are no-ops that return `false`
/// (spec §8 property 6), shared between `Engine`'s public methods and the
/// worker loop's own `Running -> Completed` trigger.
pub(crate) fn transition(status: &RwLock<CrawlerStatus>, events: &EventBus, to: CrawlerStatus, message: &str) -> bool {
    let previous = {
        let mut guard = status.write().expect("status lock poisoned");
        if !guard.can_transition_to(to) {
            warn!(current = ?guard, ?to, "ignoring illegal status transition");
            return false;
        }
        let previous = *guard;
        *guard = to;
        previous
    };
    events.publish(CrawlEvent::StatusChanged {
        previous,
        current: to,
        message: message.to_string(),
    });
    true
}
