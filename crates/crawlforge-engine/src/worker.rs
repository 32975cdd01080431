use crawlforge_events::{CrawlEvent, EventBus};
use crawlforge_extraction::Parser;
use crawlforge_fetch::Downloader;
use crawlforge_scheduler::Scheduler;
use crawlforge_storage::Storage;
use crawlforge_types::{CrawlResult, CrawlerStatus, ErrorKind, JobId, Request, Statistics, UrlState};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{watch, Mutex, Notify};
use tracing::{debug, error, instrument, warn};
use url::Url;

pub(crate) struct WorkerContext {
    pub job_id: JobId,
    pub worker_id: usize,
    pub scheduler: Arc<Scheduler>,
    pub downloader: Arc<Downloader>,
    pub parser: Arc<Parser>,
    pub storage: Arc<dyn Storage>,
    pub events: Arc<EventBus>,
    pub status: Arc<RwLock<CrawlerStatus>>,
    pub resume_notify: Arc<Notify>,
    pub cancel_rx: watch::Receiver<bool>,
    pub stats: Arc<Mutex<Statistics>>,
    pub in_flight: Arc<AtomicUsize>,
    pub completing: Arc<AtomicBool>,
    pub max_pages: u64,
    pub poll_interval: Duration,
}

/// One worker's iteration of the loop in spec §4.1. Each of the
/// `MaxConcurrentTasks` spawned copies runs this until cancelled or the
/// crawl completes.
#[instrument(skip(ctx), fields(worker_id = ctx.worker_id, job_id = %ctx.job_id))]
pub(crate) async fn run_worker(ctx: WorkerContext) {
    loop {
        if *ctx.cancel_rx.borrow() {
            debug!("worker exiting: cancelled");
            return;
        }

        let current_status = *ctx.status.read().expect("status lock poisoned");
        if current_status == CrawlerStatus::Paused {
            let mut cancel_rx = ctx.cancel_rx.clone();
            tokio::select! {
                _ = ctx.resume_notify.notified() => {}
                _ = cancel_rx.changed() => {}
            }
            continue;
        }
        if current_status == CrawlerStatus::Stopping
            || current_status == CrawlerStatus::Stopped
            || current_status == CrawlerStatus::Completed
            || current_status == CrawlerStatus::Error
        {
            debug!(?current_status, "worker exiting: terminal status");
            return;
        }

        let Some(request) = ctx.scheduler.next() else {
            if try_complete(&ctx).await {
                return;
            }
            let mut cancel_rx = ctx.cancel_rx.clone();
            tokio::select! {
                _ = tokio::time::sleep(ctx.poll_interval) => {}
                _ = cancel_rx.changed() => {}
            }
            continue;
        };

        ctx.in_flight.fetch_add(1, Ordering::SeqCst);
        process_request(&ctx, request).await;
        ctx.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Download, parse, persist a single request and fan its discovered links
/// back into the scheduler. Steps numbered per spec §4.1.
async fn process_request(ctx: &WorkerContext, mut request: Request) {
    request.mark_started();
    let host = Url::parse(&request.url).ok().and_then(|u| u.host_str().map(str::to_string));

    let download = ctx.downloader.download(&request, &ctx.cancel_rx).await;

    if let Some(host) = &host {
        ctx.scheduler
            .record_domain_performance(host, download.download_time_ms as f64, download.success);
    }

    if !download.success {
        handle_failed_download(ctx, request, &download).await;
        return;
    }

    let parse = ctx.parser.parse(&download).await;

    for link in &parse.links {
        let child = Request::child(&request, link.clone());
        if ctx.scheduler.add(child.clone()) {
            ctx.stats.lock().await.discovered += 1;
            ctx.events.publish(CrawlEvent::UrlDiscovered { request: Box::new(child) });
        }
    }

    let processed_at = chrono::Utc::now();
    let total_time_ms = download.download_time_ms + parse.parse_time_ms;
    let url_state = UrlState {
        url: request.url.clone(),
        discovered_at: request.queued_at,
        processed_at: Some(processed_at),
        status_code: Some(download.status),
        content_length: Some(download.raw_bytes.len() as u64),
        content_type: download.content_type.clone(),
        download_time_ms: Some(download.download_time_ms),
        error_message: None,
        retry_count: request.retry_count,
    };
    if let Err(err) = ctx.storage.save_url_state(url_state).await {
        error!(%err, url = %request.url, "storage error recording url state");
    }

    let domain = host.unwrap_or_else(|| "unknown".to_string());
    ctx.stats
        .lock()
        .await
        .record(&domain, download.raw_bytes.len() as u64, download.download_time_ms, true);

    let result = CrawlResult {
        request,
        download,
        parse,
        processed_at,
        total_time_ms,
    };
    if let Err(err) = ctx.storage.save_result(ctx.job_id, result.clone()).await {
        error!(%err, url = %request.url, "storage error saving crawl result");
        ctx.events.publish(CrawlEvent::CrawlError {
            url: request.url.clone(),
            error_kind: ErrorKind::StorageError.to_string(),
            message: err.to_string(),
        });
    }

    ctx.events.publish(CrawlEvent::CrawlCompleted { result: Box::new(result) });
}

/// On download failure: retryable failures are re-submitted through the
/// scheduler's retry-re-entry path until `max_retries` is exhausted;
/// everything else (including exhausted retries) is recorded as an error.
async fn handle_failed_download(ctx: &WorkerContext, request: Request, download: &crawlforge_types::DownloadResult) {
    let kind = download.error_kind.unwrap_or(ErrorKind::Network);

    if kind.is_retryable() && request.can_retry() {
        let retry = request.next_attempt();
        debug!(url = %request.url, retry_count = retry.retry_count, "re-submitting retryable failure");
        ctx.scheduler.add_retry(retry);
        return;
    }

    let domain = Url::parse(&request.url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string());
    ctx.stats.lock().await.record(&domain, 0, download.download_time_ms, false);
    ctx.scheduler.record_error();

    let url_state = UrlState {
        url: request.url.clone(),
        discovered_at: request.queued_at,
        processed_at: Some(chrono::Utc::now()),
        status_code: Some(download.status),
        content_length: None,
        content_type: None,
        download_time_ms: Some(download.download_time_ms),
        error_message: download.error_message.clone(),
        retry_count: request.retry_count,
    };
    if let Err(err) = ctx.storage.save_url_state(url_state).await {
        error!(%err, url = %request.url, "storage error recording failed url state");
    }

    ctx.events.publish(CrawlEvent::CrawlError {
        url: request.url.clone(),
        error_kind: kind.to_string(),
        message: download.error_message.clone().unwrap_or_default(),
    });
}

/// First worker to observe an exhausted frontier with nothing in flight
/// transitions the engine to `Completed`. Returns `true` if this worker
/// should exit as a result (either it completed the crawl or another
/// worker already did).
async fn try_complete(ctx: &WorkerContext) -> bool {
    if *ctx.status.read().expect("status lock poisoned") != CrawlerStatus::Running {
        return false;
    }
    if ctx.in_flight.load(Ordering::SeqCst) != 0 {
        return false;
    }
    let processed = ctx.stats.lock().await.processed;
    let exhausted = ctx.scheduler.is_empty() || processed >= ctx.max_pages;
    if !exhausted {
        return false;
    }

    if ctx
        .completing
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
    {
        crate::status::transition(&ctx.status, &ctx.events, CrawlerStatus::Completed, "queue exhausted");
        warn!("crawl completed: queue exhausted with no in-flight requests");
    }
    true
}
