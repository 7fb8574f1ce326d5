// src/ingest/queue.rs
// Bounded in-process work queue. Each queue entry is `(fetcher, page)`;
// successors are only enqueued after their predecessor finished persisting,
// which keeps pages within one lineage strictly ordered while distinct
// lineages interleave freely across the worker pool.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::QueueConfig;
use crate::ingest::aggregate::{run_job, AggregateJob};
use crate::store::ArticleStore;

/// Aggregate outcome of a full queue drain.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub lineages: usize,
    pub pages: u64,
    pub stored: u64,
    pub skipped: u64,
    pub saturated: u64,
    pub failed_jobs: u64,
}

struct JobOutcome {
    successor: Option<AggregateJob>,
    stored: u64,
    skipped: u64,
    saturated: bool,
    failed: bool,
}

/// Drain the queue: run every initial job and every successor it spawns,
/// with at most `config.workers` jobs in flight.
pub async fn run_to_completion(
    store: Arc<dyn ArticleStore>,
    initial: Vec<AggregateJob>,
    config: &QueueConfig,
) -> RunSummary {
    crate::ingest::ensure_metrics_described();

    let mut summary = RunSummary {
        lineages: initial.len(),
        ..Default::default()
    };
    let mut pending: VecDeque<AggregateJob> = initial.into();
    let mut running: JoinSet<JobOutcome> = JoinSet::new();
    let workers = config.workers.max(1);

    loop {
        while running.len() < workers {
            let Some(job) = pending.pop_front() else {
                break;
            };
            let store = Arc::clone(&store);
            let config = *config;
            running.spawn(async move { execute_with_retry(job, store, &config).await });
        }

        match running.join_next().await {
            Some(Ok(outcome)) => {
                if outcome.failed {
                    summary.failed_jobs += 1;
                } else if outcome.saturated {
                    summary.saturated += 1;
                } else {
                    summary.pages += 1;
                }
                summary.stored += outcome.stored;
                summary.skipped += outcome.skipped;
                if let Some(next) = outcome.successor {
                    pending.push_back(next);
                }
            }
            Some(Err(join_err)) => {
                error!(error = ?join_err, "aggregation task panicked");
                summary.failed_jobs += 1;
            }
            // Nothing running; the spawn loop above found pending empty too.
            None => break,
        }
    }

    info!(
        lineages = summary.lineages,
        pages = summary.pages,
        stored = summary.stored,
        skipped = summary.skipped,
        saturated = summary.saturated,
        failed_jobs = summary.failed_jobs,
        "aggregation run complete"
    );
    summary
}

/// Run one job with the standard retry policy: linear backoff, bounded
/// attempts, then the job is marked failed and its lineage ends. Saturation
/// and normal completion never retry.
async fn execute_with_retry(
    job: AggregateJob,
    store: Arc<dyn ArticleStore>,
    config: &QueueConfig,
) -> JobOutcome {
    let max_attempts = config.max_attempts.max(1);
    let backoff = Duration::from_secs(config.retry_backoff_secs);
    let mut attempt = 1u32;

    loop {
        match run_job(&job, store.as_ref()).await {
            Ok(report) => {
                return JobOutcome {
                    successor: job.next_from(&report),
                    stored: report.stored,
                    skipped: report.skipped,
                    saturated: report.saturated,
                    failed: false,
                };
            }
            Err(err) if attempt < max_attempts => {
                warn!(
                    source = %job.fetcher.name(),
                    page = job.page,
                    attempt,
                    error = ?err,
                    "aggregation attempt failed, retrying"
                );
                tokio::time::sleep(backoff * attempt).await;
                attempt += 1;
            }
            Err(err) => {
                error!(
                    source = %job.fetcher.name(),
                    page = job.page,
                    attempts = attempt,
                    error = ?err,
                    "aggregation job failed, lineage ends"
                );
                counter!("aggregate_jobs_failed_total").increment(1);
                return JobOutcome {
                    successor: None,
                    stored: 0,
                    skipped: 0,
                    saturated: false,
                    failed: true,
                };
            }
        }
    }
}
