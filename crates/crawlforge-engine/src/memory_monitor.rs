use std::sync::Arc;
use std::time::Duration;
use sysinfo::System;
use tokio::sync::watch;
use tracing::warn;

const SAMPLE_INTERVAL: Duration = Duration::from_secs(5);

/// Advisory memory sampler (spec §9 Open Question: "engine MAY pause when
/// exceeded"). Runs until `cancel` flips; when resident memory crosses
/// `limit_mb` it invokes `on_exceeded` once per excursion above the limit.
pub async fn watch_memory(
    limit_mb: u64,
    mut cancel: watch::Receiver<bool>,
    on_exceeded: Arc<dyn Fn() + Send + Sync>,
) {
    let mut system = System::new();
    let mut was_over = false;
    loop {
        tokio::select! {
            _ = tokio::time::sleep(SAMPLE_INTERVAL) => {}
            _ = cancel.changed() => {
                if *cancel.borrow() {
                    return;
                }
            }
        }
        if *cancel.borrow() {
            return;
        }

        system.refresh_memory();
        let used_mb = system.used_memory() / (1024 * 1024);
        if used_mb >= limit_mb {
            if !was_over {
                warn!(used_mb, limit_mb, "memory limit exceeded, pausing crawl");
                on_exceeded();
            }
            was_over = true;
        } else {
            was_over = false;
        }
    }
}
