// tests/queue_drain.rs
// The worker pool: lineage chaining, strict page ordering within a lineage,
// independence across lineages, and the bounded retry policy.

mod support;

use std::sync::Arc;

use newswire_aggregator::config::QueueConfig;
use newswire_aggregator::error::FetchError;
use newswire_aggregator::ingest::aggregate::AggregateJob;
use newswire_aggregator::ingest::queue::run_to_completion;
use newswire_aggregator::store::ArticleStore;
use support::{article, batch, MemoryStore, ScriptedFetcher};

fn fast_queue() -> QueueConfig {
    QueueConfig {
        workers: 2,
        max_attempts: 2,
        retry_backoff_secs: 0,
    }
}

#[tokio::test]
async fn drains_a_three_page_lineage_in_order() {
    let store = Arc::new(MemoryStore::default().with_alias("bbc-news", 7, None));
    let fetcher = Arc::new(ScriptedFetcher::new(
        "newsapi",
        vec![
            Ok(batch(
                vec![article("A", "BBC News", "https://example.com/1", None, &[])],
                false,
            )),
            Ok(batch(
                vec![article("B", "BBC News", "https://example.com/2", None, &[])],
                false,
            )),
            Ok(batch(
                vec![article("C", "BBC News", "https://example.com/3", None, &[])],
                true,
            )),
        ],
    ));

    let jobs = vec![AggregateJob::first(
        Arc::clone(&fetcher) as Arc<dyn newswire_aggregator::ArticleFetcher>
    )];
    let summary = run_to_completion(
        Arc::clone(&store) as Arc<dyn ArticleStore>,
        jobs,
        &fast_queue(),
    )
    .await;

    assert_eq!(summary.lineages, 1);
    assert_eq!(summary.pages, 3);
    assert_eq!(summary.stored, 3);
    assert_eq!(summary.failed_jobs, 0);
    assert_eq!(store.articles().len(), 3);
    // Successors were dispatched strictly in increasing page order.
    assert_eq!(fetcher.requested_pages(), vec![1, 2, 3]);
}

#[tokio::test]
async fn transient_failure_is_retried_then_succeeds() {
    let store = Arc::new(MemoryStore::default().with_alias("bbc-news", 7, None));
    let fetcher = Arc::new(ScriptedFetcher::new(
        "newsapi",
        vec![
            Err(FetchError::Upstream("502 from upstream".to_string())),
            Ok(batch(
                vec![article("A", "BBC News", "https://example.com/1", None, &[])],
                true,
            )),
        ],
    ));

    let jobs = vec![AggregateJob::first(
        Arc::clone(&fetcher) as Arc<dyn newswire_aggregator::ArticleFetcher>
    )];
    let summary = run_to_completion(
        Arc::clone(&store) as Arc<dyn ArticleStore>,
        jobs,
        &fast_queue(),
    )
    .await;

    assert_eq!(summary.pages, 1);
    assert_eq!(summary.stored, 1);
    assert_eq!(summary.failed_jobs, 0);
}

#[tokio::test]
async fn exhausted_retries_mark_the_job_failed() {
    let store = Arc::new(MemoryStore::default());
    let fetcher = Arc::new(ScriptedFetcher::new(
        "newsapi",
        vec![
            Err(FetchError::Upstream("down".to_string())),
            Err(FetchError::Upstream("still down".to_string())),
        ],
    ));

    let jobs = vec![AggregateJob::first(
        Arc::clone(&fetcher) as Arc<dyn newswire_aggregator::ArticleFetcher>
    )];
    let summary = run_to_completion(
        Arc::clone(&store) as Arc<dyn ArticleStore>,
        jobs,
        &fast_queue(),
    )
    .await;

    assert_eq!(summary.failed_jobs, 1);
    assert_eq!(summary.pages, 0);
    assert_eq!(summary.stored, 0);
}

#[tokio::test]
async fn saturated_lineage_is_not_a_failure() {
    let store = Arc::new(MemoryStore::default());
    let fetcher = Arc::new(ScriptedFetcher::new(
        "newsapi",
        vec![Err(FetchError::Saturated)],
    ));

    let jobs = vec![AggregateJob::first(
        Arc::clone(&fetcher) as Arc<dyn newswire_aggregator::ArticleFetcher>
    )];
    let summary = run_to_completion(
        Arc::clone(&store) as Arc<dyn ArticleStore>,
        jobs,
        &fast_queue(),
    )
    .await;

    assert_eq!(summary.saturated, 1);
    assert_eq!(summary.failed_jobs, 0);
}

#[tokio::test]
async fn lineages_fail_and_succeed_independently() {
    let store = Arc::new(MemoryStore::default().with_alias("bbc-news", 7, None));
    let healthy = Arc::new(ScriptedFetcher::new(
        "guardian",
        vec![Ok(batch(
            vec![article("A", "BBC News", "https://example.com/1", None, &[])],
            true,
        ))],
    ));
    let broken = Arc::new(ScriptedFetcher::new(
        "nytimes",
        vec![
            Err(FetchError::Upstream("down".to_string())),
            Err(FetchError::Upstream("down".to_string())),
        ],
    ));

    let jobs = vec![
        AggregateJob::first(Arc::clone(&healthy) as Arc<dyn newswire_aggregator::ArticleFetcher>),
        AggregateJob::first(Arc::clone(&broken) as Arc<dyn newswire_aggregator::ArticleFetcher>),
    ];
    let summary = run_to_completion(
        Arc::clone(&store) as Arc<dyn ArticleStore>,
        jobs,
        &fast_queue(),
    )
    .await;

    assert_eq!(summary.lineages, 2);
    assert_eq!(summary.pages, 1);
    assert_eq!(summary.stored, 1);
    assert_eq!(summary.failed_jobs, 1);
}
