use crate::error::EngineError;
use crate::memory_monitor::watch_memory;
use crate::worker::{run_worker, WorkerContext};
use crawlforge_config::CrawlConfiguration;
use crawlforge_events::{CrawlEvent, EventBus, EventHandler};
use crawlforge_extraction::Parser;
use crawlforge_fetch::Downloader;
use crawlforge_scheduler::{Scheduler, SchedulerConfig};
use crawlforge_storage::Storage;
use crawlforge_types::{CrawlState, CrawlerStatus, JobId, Request, Statistics};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Bounded window `Engine::stop(graceful=true)` waits for in-flight
/// requests to finish before forcing termination (spec §5).
const DRAIN_WINDOW: Duration = Duration::from_secs(30);

/// Interval workers poll the scheduler when the queue is momentarily empty.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lifecycle controller and worker pool orchestrator (spec §4.1). Owns the
/// status variable, the job id, and the worker pool exclusively; the
/// scheduler, downloader, parser, storage and event bus are shared by
/// reference with every worker.
pub struct Engine {
    config: CrawlConfiguration,
    scheduler: Arc<Scheduler>,
    downloader: Arc<Downloader>,
    parser: Arc<Parser>,
    storage: Arc<dyn Storage>,
    events: Arc<EventBus>,
    status: Arc<RwLock<CrawlerStatus>>,
    job_id: Arc<RwLock<Option<JobId>>>,
    stats: Arc<Mutex<Statistics>>,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
    resume_notify: Arc<Notify>,
    in_flight: Arc<AtomicUsize>,
    completing: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    memory_task: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Build a new engine from a validated configuration. Fails with
    /// `EngineError::Config` if `config` does not validate.
    pub fn new(config: CrawlConfiguration, storage: Arc<dyn Storage>) -> Result<Self, EngineError> {
        config.validate()?;

        let scheduler = Arc::new(Scheduler::new(SchedulerConfig {
            allowed_domains: config.allowed_domains.clone(),
            blocked_patterns: config.blocked_patterns.clone(),
            max_depth: config.max_depth,
            request_delay: config.request_delay,
            worker_count: config.max_concurrent_tasks,
            max_queue_size: config.max_queue_size,
        }));
        let downloader = Arc::new(Downloader::new(&config)?);
        let parser = Arc::new(Parser::default());
        let (cancel_tx, cancel_rx) = watch::channel(false);

        Ok(Self {
            config,
            scheduler,
            downloader,
            parser,
            storage,
            events: Arc::new(EventBus::new()),
            status: Arc::new(RwLock::new(CrawlerStatus::Idle)),
            job_id: Arc::new(RwLock::new(None)),
            stats: Arc::new(Mutex::new(Statistics::new(JobId::new()))),
            cancel_tx,
            cancel_rx,
            resume_notify: Arc::new(Notify::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            completing: Arc::new(AtomicBool::new(false)),
            workers: Mutex::new(Vec::new()),
            memory_task: Mutex::new(None),
        })
    }

    /// Register an event handler. Handlers must be registered before
    /// `start` and unregistered after `stop` (spec §6).
    pub fn register_handler(&self, handler: Arc<dyn EventHandler>) {
        self.events.register(handler);
    }

    pub fn unregister_handler(&self, name: &str) {
        self.events.unregister(name);
    }

    pub fn status(&self) -> CrawlerStatus {
        *self.status.read().expect("status lock poisoned")
    }

    pub fn job_id(&self) -> Option<JobId> {
        *self.job_id.read().expect("job id lock poisoned")
    }

    /// Initializes the seen-set, transitions `Idle -> Running`, assigns a
    /// fresh job id and spawns `MaxConcurrentTasks` workers (spec §4.1).
    /// Idempotent while already `Running` (no-op, warns).
    pub async fn start(&self) -> Result<JobId, EngineError> {
        self.config.validate()?;

        let current = self.status();
        if current == CrawlerStatus::Running {
            warn!("Engine::start called while already running, ignoring");
            return Ok(self.job_id().expect("job id set while running"));
        }
        if current != CrawlerStatus::Idle {
            return Err(EngineError::InvalidStartState(current));
        }

        self.scheduler.reset();
        self.cancel_tx.send_replace(false);
        self.completing.store(false, Ordering::SeqCst);
        self.in_flight.store(0, Ordering::SeqCst);

        let job_id = JobId::new();
        *self.job_id.write().expect("job id lock poisoned") = Some(job_id);
        *self.stats.lock().await = Statistics::new(job_id);

        self.transition(CrawlerStatus::Running, "engine started");

        let mut workers = self.workers.lock().await;
        workers.clear();
        for worker_id in 0..self.config.max_concurrent_tasks {
            let ctx = WorkerContext {
                job_id,
                worker_id,
                scheduler: self.scheduler.clone(),
                downloader: self.downloader.clone(),
                parser: self.parser.clone(),
                storage: self.storage.clone(),
                events: self.events.clone(),
                status: self.status.clone(),
                resume_notify: self.resume_notify.clone(),
                cancel_rx: self.cancel_rx.clone(),
                stats: self.stats.clone(),
                in_flight: self.in_flight.clone(),
                completing: self.completing.clone(),
                max_pages: self.config.max_pages,
                poll_interval: POLL_INTERVAL,
            };
            workers.push(tokio::spawn(run_worker(ctx)));
        }
        drop(workers);

        if let Some(limit_mb) = self.config.memory_limit_mb {
            let status = self.status.clone();
            let events = self.events.clone();
            let cancel_rx = self.cancel_rx.clone();
            let handle = tokio::spawn(watch_memory(
                limit_mb,
                cancel_rx,
                Arc::new(move || {
                    let current = *status.read().expect("status lock poisoned");
                    if current == CrawlerStatus::Running {
                        let mut guard = status.write().expect("status lock poisoned");
                        *guard = CrawlerStatus::Paused;
                        events.publish(CrawlEvent::StatusChanged {
                            previous: CrawlerStatus::Running,
                            current: CrawlerStatus::Paused,
                            message: "paused: memory limit exceeded".to_string(),
                        });
                    }
                }),
            ));
            *self.memory_task.lock().await = Some(handle);
        }

        info!(job_id = %job_id, workers = self.config.max_concurrent_tasks, "engine started");
        Ok(job_id)
    }

    /// `Running <-> Paused`. No-op on any other current status.
    pub fn pause(&self) {
        self.transition(CrawlerStatus::Paused, "paused by caller");
    }

    /// `Paused -> Running`, wakes every worker blocked on the pause signal.
    pub fn resume(&self) {
        if self.transition(CrawlerStatus::Running, "resumed by caller") {
            self.resume_notify.notify_waiters();
        }
    }

    /// Signals cancellation; if `graceful`, waits up to `DRAIN_WINDOW` for
    /// workers to finish in-flight requests before forcing termination.
    /// Emits terminal statistics and returns the engine to `Idle`.
    pub async fn stop(&self, graceful: bool) {
        let current = self.status();
        if current != CrawlerStatus::Running && current != CrawlerStatus::Paused {
            warn!(?current, "Engine::stop called from non-running state, ignoring");
            return;
        }

        self.transition(CrawlerStatus::Stopping, "stop requested");
        self.cancel_tx.send_replace(true);
        self.resume_notify.notify_waiters();

        let mut workers = self.workers.lock().await;
        let handles = std::mem::take(&mut *workers);
        drop(workers);

        if graceful {
            let drain = futures::future::join_all(handles);
            if tokio::time::timeout(DRAIN_WINDOW, drain).await.is_err() {
                warn!("drain window elapsed before all workers exited");
            }
        } else {
            for handle in handles {
                handle.abort();
            }
        }

        if let Some(handle) = self.memory_task.lock().await.take() {
            handle.abort();
        }

        {
            let mut stats = self.stats.lock().await;
            stats.ended_at = Some(chrono::Utc::now());
            info!(
                processed = stats.processed,
                success = stats.success,
                error = stats.error,
                "engine stopped, terminal statistics"
            );
        }

        self.transition(CrawlerStatus::Stopped, "workers drained");
        self.transition(CrawlerStatus::Idle, "ready for restart");
    }

    /// Normalizes `urls` into depth-0 seed requests and submits them to the
    /// scheduler. Returns the count actually enqueued.
    pub fn add_seed_urls(&self, urls: Vec<String>) -> usize {
        let mut accepted = 0;
        for url in urls {
            if self.scheduler.add(Request::seed(url)) {
                accepted += 1;
            }
        }
        accepted
    }

    pub async fn get_statistics(&self) -> Statistics {
        self.stats.lock().await.clone()
    }

    pub async fn get_current_crawl_state(&self) -> Option<CrawlState> {
        let job_id = self.job_id()?;
        let stats = self.get_statistics().await;
        Some(CrawlState { job_id, stats })
    }

    fn transition(&self, to: CrawlerStatus, message: &str) -> bool {
        crate::status::transition(&self.status, &self.events, to, message)
    }
}
